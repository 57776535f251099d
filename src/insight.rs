//! Insight payload types and the content budget handed to the
//! generation service.

use serde::{Deserialize, Serialize};

/// What kind of enrichment a tile wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    /// Prose commentary on a single metric.
    Narrative,
    /// Prose plus a comparison against peer metrics.
    Comparative,
    /// Feed-style tile: short ordered items instead of a chart.
    Feed,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Narrative => "narrative",
            InsightKind::Comparative => "comparative",
            InsightKind::Feed => "feed",
        }
    }

    /// Feed tiles carry item lists; they are exempt from chart synthesis.
    pub fn is_feed(&self) -> bool {
        matches!(self, InsightKind::Feed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Donut,
}

/// Ordered (label, value) points for the charting library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub kind: ChartKind,
    pub points: Vec<(String, f64)>,
}

/// Externally generated content for one tile. Read-only once cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightPayload {
    pub prose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub special_items: Vec<String>,
}

impl InsightPayload {
    pub fn prose_only(prose: impl Into<String>) -> Self {
        Self {
            prose: prose.into(),
            chart: None,
            special_items: Vec::new(),
        }
    }
}

/// Approximate ceiling for returned prose, derived from the tile's
/// rendered pixel footprint so text fits without overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBudget {
    pub chars: usize,
    pub words: usize,
}

// Fixed estimates for the dashboard's tile typography.
const PX_PER_CHAR: u32 = 8;
const PX_PER_LINE: u32 = 22;
// Title bar and padding eat into the cell before prose starts.
const CHROME_PX_H: u32 = 48;
const AVG_WORD_CHARS: usize = 6;

/// Chars-per-line x lines-per-tile estimate from rendered dimensions.
pub fn compute_content_budget(rendered_w: u32, rendered_h: u32) -> ContentBudget {
    let chars_per_line = (rendered_w / PX_PER_CHAR).max(10) as usize;
    let lines = (rendered_h.saturating_sub(CHROME_PX_H) / PX_PER_LINE).max(1) as usize;
    let chars = chars_per_line * lines;
    ContentBudget {
        chars,
        words: (chars / AVG_WORD_CHARS).max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_monotone_in_footprint() {
        let small = compute_content_budget(180, 180);
        let wide = compute_content_budget(376, 180);
        let large = compute_content_budget(376, 376);
        assert!(wide.chars > small.chars);
        assert!(large.chars > wide.chars);
        assert!(large.words > small.words);
    }

    #[test]
    fn test_budget_floor() {
        // Degenerate dimensions still yield a usable budget.
        let b = compute_content_budget(1, 1);
        assert!(b.chars >= 10);
        assert!(b.words >= 1);
    }

    #[test]
    fn test_kind_feed_marker() {
        assert!(InsightKind::Feed.is_feed());
        assert!(!InsightKind::Narrative.is_feed());
        assert!(!InsightKind::Comparative.is_feed());
    }

    #[test]
    fn test_payload_roundtrip_optional_fields() {
        let p = InsightPayload::prose_only("stable cash conversion");
        let json = serde_json::to_string(&p).unwrap();
        assert!(!json.contains("chart"));
        let back: InsightPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}

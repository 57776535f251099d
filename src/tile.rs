//! Tile catalog types: what the layout recommender hands us.
//!
//! A tile is one dashboard cell for a valuation metric. The numbers
//! themselves are computed elsewhere; a tile only carries the rendered
//! display value plus layout and enrichment hints.

use serde::{Deserialize, Serialize};

use crate::insight::InsightKind;

/// Size class in grid-cell units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    /// 1x1
    Square,
    /// 2x1 (wide)
    Horizontal,
    /// 1x2 (tall)
    Vertical,
    /// 2x2
    Large,
}

impl SizeClass {
    pub fn width(&self) -> u32 {
        match self {
            SizeClass::Square | SizeClass::Vertical => 1,
            SizeClass::Horizontal | SizeClass::Large => 2,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            SizeClass::Square | SizeClass::Horizontal => 1,
            SizeClass::Vertical | SizeClass::Large => 2,
        }
    }

    /// Cells occupied.
    pub fn footprint(&self) -> u32 {
        self.width() * self.height()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeClass::Square => "square",
            SizeClass::Horizontal => "horizontal",
            SizeClass::Vertical => "vertical",
            SizeClass::Large => "large",
        }
    }
}

/// Placement hint: land directly below another tile when possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferredPosition {
    pub below: String,
}

/// One dashboard tile. Created fresh each layout generation, immutable
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub id: String,
    pub size: SizeClass,
    pub title: String,
    pub display_value: String,
    pub color: String,
    /// Absent means a static tile: no enrichment fetch.
    pub insight: Option<InsightKind>,
    pub preferred: Option<PreferredPosition>,
}

impl Tile {
    pub fn new(id: impl Into<String>, size: SizeClass, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            size,
            title: title.into(),
            display_value: String::new(),
            color: "#4a6fa5".to_string(),
            insight: None,
            preferred: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.display_value = value.into();
        self
    }

    pub fn with_insight(mut self, kind: InsightKind) -> Self {
        self.insight = Some(kind);
        self
    }

    pub fn below(mut self, target: impl Into<String>) -> Self {
        self.preferred = Some(PreferredPosition { below: target.into() });
        self
    }

    /// Cache key for this tile's enrichment, or None for static tiles.
    pub fn cache_key(&self) -> Option<String> {
        self.insight.map(|kind| format!("{}:{}", self.id, kind.as_str()))
    }
}

/// Fixed grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    pub columns: u32,
    pub rows: u32,
}

impl GridDims {
    pub fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    pub fn capacity(&self) -> u32 {
        self.columns * self.rows
    }
}

/// A tile with assigned grid coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedTile {
    pub tile: Tile,
    pub column_start: u32,
    pub row_start: u32,
}

impl PlacedTile {
    /// Every (column, row) cell this placement occupies.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let w = self.tile.size.width();
        let h = self.tile.size.height();
        let c0 = self.column_start;
        let r0 = self.row_start;
        (0..h).flat_map(move |dr| (0..w).map(move |dc| (c0 + dc, r0 + dr)))
    }

    pub fn fits(&self, dims: GridDims) -> bool {
        self.column_start + self.tile.size.width() <= dims.columns
            && self.row_start + self.tile.size.height() <= dims.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_class_geometry() {
        assert_eq!(SizeClass::Square.footprint(), 1);
        assert_eq!(SizeClass::Horizontal.footprint(), 2);
        assert_eq!(SizeClass::Vertical.footprint(), 2);
        assert_eq!(SizeClass::Large.footprint(), 4);
        assert_eq!(SizeClass::Horizontal.width(), 2);
        assert_eq!(SizeClass::Vertical.height(), 2);
    }

    #[test]
    fn test_placed_tile_cells() {
        let placed = PlacedTile {
            tile: Tile::new("t", SizeClass::Large, "T"),
            column_start: 1,
            row_start: 2,
        };
        let cells: Vec<_> = placed.cells().collect();
        assert_eq!(cells, vec![(1, 2), (2, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_fits_bounds() {
        let dims = GridDims::new(4, 4);
        let inside = PlacedTile {
            tile: Tile::new("a", SizeClass::Large, "A"),
            column_start: 2,
            row_start: 2,
        };
        assert!(inside.fits(dims));
        let outside = PlacedTile {
            tile: Tile::new("b", SizeClass::Large, "B"),
            column_start: 3,
            row_start: 0,
        };
        assert!(!outside.fits(dims));
    }

    #[test]
    fn test_cache_key_static_tile() {
        let tile = Tile::new("npv", SizeClass::Square, "NPV");
        assert!(tile.cache_key().is_none());
        let enriched = tile.with_insight(InsightKind::Narrative);
        assert_eq!(enriched.cache_key().unwrap(), "npv:narrative");
    }
}

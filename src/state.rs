//! Runtime configuration and the opaque model snapshot the dashboard
//! consumes. Valuation numbers are computed elsewhere; this core only
//! forwards them to the generation service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tile::{GridDims, SizeClass};

#[derive(Clone, Debug)]
pub struct Config {
    pub grid_columns: u32,
    pub grid_rows: u32,
    /// Tiles fetched concurrently per batch.
    pub batch_size: usize,
    /// Fixed pause between batches, honoring the service's rate limit.
    pub batch_delay_ms: u64,
    pub insight_base: String,
    pub insight_timeout_secs: u64,
    /// Rendered pixel size of one grid cell, for content budgets.
    pub cell_px_w: u32,
    pub cell_px_h: u32,
    /// Gap between adjacent cells; multi-cell tiles span it.
    pub cell_gap_px: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            grid_columns: std::env::var("GRID_COLS").ok().and_then(|v| v.parse().ok()).unwrap_or(4),
            grid_rows: std::env::var("GRID_ROWS").ok().and_then(|v| v.parse().ok()).unwrap_or(4),
            batch_size: std::env::var("BATCH_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(4),
            batch_delay_ms: std::env::var("BATCH_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(650),
            insight_base: std::env::var("INSIGHT_BASE").unwrap_or_else(|_| "http://localhost:8787".to_string()),
            insight_timeout_secs: std::env::var("INSIGHT_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            cell_px_w: std::env::var("TILE_CELL_PX_W").ok().and_then(|v| v.parse().ok()).unwrap_or(180),
            cell_px_h: std::env::var("TILE_CELL_PX_H").ok().and_then(|v| v.parse().ok()).unwrap_or(180),
            cell_gap_px: std::env::var("TILE_CELL_GAP_PX").ok().and_then(|v| v.parse().ok()).unwrap_or(16),
        }
    }

    pub fn grid_dims(&self) -> GridDims {
        GridDims::new(self.grid_columns, self.grid_rows)
    }

    /// Rendered pixel footprint of a tile of the given size class.
    pub fn rendered_px(&self, size: SizeClass) -> (u32, u32) {
        let span = |cells: u32, cell_px: u32| cells * cell_px + (cells - 1) * self.cell_gap_px;
        (span(size.width(), self.cell_px_w), span(size.height(), self.cell_px_h))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Opaque snapshot of the active valuation model's computed data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelData(pub Value);

impl ModelData {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Null model data means there is nothing to narrate against.
    pub fn is_usable(&self) -> bool {
        !self.0.is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed_config() -> Config {
        Config {
            grid_columns: 4,
            grid_rows: 4,
            batch_size: 4,
            batch_delay_ms: 650,
            insight_base: String::new(),
            insight_timeout_secs: 30,
            cell_px_w: 180,
            cell_px_h: 180,
            cell_gap_px: 16,
        }
    }

    #[test]
    fn test_rendered_px_spans_gap() {
        let cfg = fixed_config();
        assert_eq!(cfg.rendered_px(SizeClass::Square), (180, 180));
        assert_eq!(cfg.rendered_px(SizeClass::Horizontal), (376, 180));
        assert_eq!(cfg.rendered_px(SizeClass::Large), (376, 376));
    }

    #[test]
    fn test_grid_dims() {
        let cfg = fixed_config();
        assert_eq!(cfg.grid_dims().capacity(), 16);
    }

    #[test]
    fn test_from_env_defaults() {
        for key in [
            "GRID_COLS",
            "GRID_ROWS",
            "BATCH_SIZE",
            "BATCH_DELAY_MS",
            "INSIGHT_TIMEOUT_SECS",
            "TILE_CELL_PX_W",
            "TILE_CELL_PX_H",
            "TILE_CELL_GAP_PX",
        ] {
            std::env::remove_var(key);
        }
        let cfg = Config::from_env();
        assert_eq!((cfg.grid_columns, cfg.grid_rows), (4, 4));
        assert_eq!(cfg.batch_size, 4);
        assert_eq!(cfg.batch_delay_ms, 650);
        assert_eq!(cfg.insight_timeout_secs, 30);
        assert_eq!((cfg.cell_px_w, cfg.cell_px_h, cfg.cell_gap_px), (180, 180, 16));
    }

    #[test]
    fn test_model_data_usability() {
        assert!(!ModelData::new(Value::Null).is_usable());
        assert!(ModelData::new(json!({"ev": 120.0})).is_usable());
    }
}

//! Per-model insight cache.
//!
//! One sub-map per model id, keyed by `tile_id:kind`. Narrative content is
//! model-data-dependent, so a model switch drops the whole sub-map rather
//! than risking cross-model reuse. The write path also applies the one
//! coordination rule between cache and renderer: a non-feed payload that
//! arrived without a chart gets a minimal illustrative one synthesized
//! deterministically from the tile's displayed value, once, at write time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::insight::{ChartData, ChartKind, InsightKind, InsightPayload};
use crate::logging::{log, obj, params_hash, v_num, v_str, Domain, Level};
use crate::tile::Tile;

type ModelMap = HashMap<String, InsightPayload>;

/// Cloneable handle; all clones share the same store.
#[derive(Clone, Default)]
pub struct InsightCache {
    inner: Arc<Mutex<HashMap<String, ModelMap>>>,
}

impl InsightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blocking lookup; returns a clone of the stored payload.
    pub fn get(&self, model_id: &str, key: &str) -> Option<InsightPayload> {
        let store = self.inner.lock().ok()?;
        store.get(model_id)?.get(key).cloned()
    }

    /// Store a payload, synthesizing a chart first when the tile warrants one.
    pub fn put(&self, model_id: &str, key: &str, mut payload: InsightPayload, tile: &Tile) {
        if payload.chart.is_none() && !tile.insight.map(|k| k.is_feed()).unwrap_or(false) {
            payload.chart = Some(synthesize_chart(tile));
            log(
                Level::Debug,
                Domain::Cache,
                "chart_synthesized",
                obj(&[("tile_id", v_str(&tile.id)), ("model_id", v_str(model_id))]),
            );
        }
        if let Ok(mut store) = self.inner.lock() {
            store
                .entry(model_id.to_string())
                .or_default()
                .insert(key.to_string(), payload);
        }
    }

    /// Drop everything cached for one model. Called on model switch.
    pub fn invalidate(&self, model_id: &str) {
        if let Ok(mut store) = self.inner.lock() {
            let dropped = store.remove(model_id).map(|m| m.len()).unwrap_or(0);
            log(
                Level::Info,
                Domain::Cache,
                "model_invalidated",
                obj(&[
                    ("model_id", v_str(model_id)),
                    ("dropped_entries", v_num(dropped as f64)),
                ]),
            );
        }
    }

    /// Number of entries cached for a model.
    pub fn model_len(&self, model_id: &str) -> usize {
        self.inner
            .lock()
            .ok()
            .and_then(|store| store.get(model_id).map(|m| m.len()))
            .unwrap_or(0)
    }
}

/// Pull the leading scalar out of a rendered display value like
/// "$1,234.5M" or "-3.2%".
fn parse_scalar(display: &str) -> Option<f64> {
    let cleaned: String = display
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse().ok()
}

/// Minimal illustrative series: a short deterministic walk ending at the
/// tile's displayed value, seeded from the tile id so re-synthesis is
/// byte-identical.
fn synthesize_chart(tile: &Tile) -> ChartData {
    let target = parse_scalar(&tile.display_value).unwrap_or(1.0);
    let mut seed = u64::from_str_radix(&params_hash(&tile.id), 16).unwrap_or(0x9e3779b9);

    const POINTS: usize = 8;
    let mut points = Vec::with_capacity(POINTS);
    for i in 0..POINTS {
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        // Uniform in [-1, 1)
        let noise = ((seed >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0;
        let progress = i as f64 / (POINTS - 1) as f64;
        // Converge on the displayed value; wobble fades toward the end.
        let base = target * (0.82 + 0.18 * progress);
        let value = base + target.abs() * 0.06 * noise * (1.0 - progress);
        points.push((format!("t-{}", POINTS - 1 - i), value));
    }
    // Last point is exactly what the tile shows.
    if let Some(last) = points.last_mut() {
        last.1 = target;
    }

    let kind = match tile.insight {
        Some(InsightKind::Comparative) => ChartKind::Bar,
        _ => ChartKind::Line,
    };
    ChartData { kind, points }
}

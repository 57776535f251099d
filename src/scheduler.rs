//! Insight Load Scheduler: fetch enrichment for every placed tile that
//! misses the cache, without overwhelming the rate-limited service and
//! without blocking fast tiles on slow ones.
//!
//! Batches of a fixed size run sequentially with a fixed pause between
//! them; tiles inside a batch fetch concurrently. One run per loader may
//! be in flight; concurrent callers share it. Per-tile failures are
//! swallowed here and surfaced to the renderer as "no insight". A model
//! switch cancels the run's token: later batches stop and late
//! resolutions write nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::{join_all, BoxFuture, FutureExt, Shared};
use tokio::time::{sleep, Duration};

use crate::cache::InsightCache;
use crate::insight::{compute_content_budget, InsightPayload};
use crate::logging::{log, obj, v_num, v_str, Domain, Level};
use crate::source::{InsightRequest, InsightSource};
use crate::state::{Config, ModelData};
use crate::tile::{PlacedTile, Tile};

/// Renderer callback: one call per resolved tile, `None` on failure.
pub type OnResolved = Arc<dyn Fn(&str, Option<&InsightPayload>) + Send + Sync>;

/// Cancellation handle for in-flight work. Cloned into every run; a model
/// switch flips it so stale fetches discard their results on arrival.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What one scheduler run did. Coalesced callers all observe the shared
/// run's summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Fetched from the service and cached.
    pub fetched: usize,
    /// Already cached; no request issued.
    pub cached: usize,
    /// Fetch failed; tile left unenriched.
    pub failed: usize,
    /// Static tiles with no enrichment type.
    pub skipped: usize,
    /// Resolved after cancellation; result discarded.
    pub suppressed: usize,
}

type SharedRun = Shared<BoxFuture<'static, LoadSummary>>;

struct LoaderInner {
    source: Arc<dyn InsightSource>,
    cache: InsightCache,
    config: Config,
    in_flight: Mutex<Option<SharedRun>>,
}

pub struct InsightLoader {
    inner: Arc<LoaderInner>,
}

impl InsightLoader {
    pub fn new(source: Arc<dyn InsightSource>, cache: InsightCache, config: Config) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                source,
                cache,
                config,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Ensure every enrichable tile in `placed` has a cached payload for
    /// `model_id`, fetching misses in rate-limited batches and invoking
    /// `on_resolved` per tile as results land.
    pub async fn load_all(
        &self,
        placed: &[PlacedTile],
        model: &ModelData,
        model_id: &str,
        token: CancelToken,
        on_resolved: OnResolved,
    ) -> LoadSummary {
        if model_id.is_empty() || !model.is_usable() {
            log(
                Level::Debug,
                Domain::Insight,
                "load_noop",
                obj(&[("reason", v_str("missing model context"))]),
            );
            return LoadSummary::default();
        }

        let run = {
            let mut guard = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match guard.as_ref() {
                Some(existing) => {
                    // Single-flight: a concurrent caller joins the run
                    // already going instead of issuing its own fetches.
                    log(
                        Level::Debug,
                        Domain::Insight,
                        "load_coalesced",
                        obj(&[("model_id", v_str(model_id))]),
                    );
                    existing.clone()
                }
                None => {
                    let fut = run_load(
                        self.inner.clone(),
                        placed.to_vec(),
                        model.clone(),
                        model_id.to_string(),
                        token,
                        on_resolved,
                    )
                    .boxed()
                    .shared();
                    *guard = Some(fut.clone());
                    fut
                }
            }
        };

        let summary = run.clone().await;

        // Reset the guard, but only if it still holds this run.
        let mut guard = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if guard.as_ref().map(|f| f.ptr_eq(&run)).unwrap_or(false) {
            *guard = None;
        }

        summary
    }
}

async fn run_load(
    inner: Arc<LoaderInner>,
    placed: Vec<PlacedTile>,
    model: ModelData,
    model_id: String,
    token: CancelToken,
    on_resolved: OnResolved,
) -> LoadSummary {
    let mut summary = LoadSummary::default();

    // Partition: static tiles, cache hits, and the fetch queue.
    let mut pending: Vec<(Tile, String)> = Vec::new();
    for placement in &placed {
        match placement.tile.cache_key() {
            None => summary.skipped += 1,
            Some(key) => {
                if inner.cache.get(&model_id, &key).is_some() {
                    summary.cached += 1;
                } else {
                    pending.push((placement.tile.clone(), key));
                }
            }
        }
    }

    if pending.is_empty() {
        log(
            Level::Debug,
            Domain::Insight,
            "all_cached",
            obj(&[
                ("model_id", v_str(&model_id)),
                ("cached", v_num(summary.cached as f64)),
            ]),
        );
        return summary;
    }

    let batch_size = inner.config.batch_size.max(1);
    log(
        Level::Info,
        Domain::Insight,
        "run_started",
        obj(&[
            ("model_id", v_str(&model_id)),
            ("pending", v_num(pending.len() as f64)),
            ("batch_size", v_num(batch_size as f64)),
            ("batches", v_num(pending.len().div_ceil(batch_size) as f64)),
        ]),
    );

    for (batch_idx, batch) in pending.chunks(batch_size).enumerate() {
        if batch_idx > 0 {
            sleep(Duration::from_millis(inner.config.batch_delay_ms)).await;
        }
        if token.is_cancelled() {
            log(
                Level::Info,
                Domain::Insight,
                "run_cancelled",
                obj(&[
                    ("model_id", v_str(&model_id)),
                    ("after_batches", v_num(batch_idx as f64)),
                ]),
            );
            break;
        }

        let results = join_all(batch.iter().map(|(tile, key)| {
            fetch_one(&inner, tile, key, &model, &model_id, &token, &on_resolved)
        }))
        .await;

        for outcome in results {
            match outcome {
                FetchOutcome::Fetched => summary.fetched += 1,
                FetchOutcome::Failed => summary.failed += 1,
                FetchOutcome::Suppressed => summary.suppressed += 1,
            }
        }
    }

    log(
        Level::Info,
        Domain::Insight,
        "run_settled",
        obj(&[
            ("model_id", v_str(&model_id)),
            ("fetched", v_num(summary.fetched as f64)),
            ("cached", v_num(summary.cached as f64)),
            ("failed", v_num(summary.failed as f64)),
            ("suppressed", v_num(summary.suppressed as f64)),
        ]),
    );

    summary
}

enum FetchOutcome {
    Fetched,
    Failed,
    Suppressed,
}

async fn fetch_one(
    inner: &LoaderInner,
    tile: &Tile,
    key: &str,
    model: &ModelData,
    model_id: &str,
    token: &CancelToken,
    on_resolved: &OnResolved,
) -> FetchOutcome {
    let (px_w, px_h) = inner.config.rendered_px(tile.size);
    let request = InsightRequest {
        tile_id: tile.id.clone(),
        title: tile.title.clone(),
        display_value: tile.display_value.clone(),
        size_class: tile.size,
        budget: compute_content_budget(px_w, px_h),
        model_data: model.clone(),
    };

    match inner.source.fetch_insight(&request).await {
        Ok(payload) => {
            if token.is_cancelled() {
                // The model moved on while this request was in the air.
                log(
                    Level::Debug,
                    Domain::Insight,
                    "stale_result_discarded",
                    obj(&[("tile_id", v_str(&tile.id)), ("model_id", v_str(model_id))]),
                );
                return FetchOutcome::Suppressed;
            }
            inner.cache.put(model_id, key, payload, tile);
            // Render the augmented payload the cache actually stored.
            let stored = inner.cache.get(model_id, key);
            on_resolved(&tile.id, stored.as_ref());
            FetchOutcome::Fetched
        }
        Err(err) => {
            if token.is_cancelled() {
                // Same as the success path: the model moved on, so the
                // renderer must not hear about this tile at all.
                log(
                    Level::Debug,
                    Domain::Insight,
                    "stale_result_discarded",
                    obj(&[("tile_id", v_str(&tile.id)), ("model_id", v_str(model_id))]),
                );
                return FetchOutcome::Suppressed;
            }
            log(
                Level::Warn,
                Domain::Insight,
                "fetch_failed",
                obj(&[
                    ("tile_id", v_str(&tile.id)),
                    ("model_id", v_str(model_id)),
                    ("error", v_str(&err.to_string())),
                ]),
            );
            on_resolved(&tile.id, None);
            FetchOutcome::Failed
        }
    }
}

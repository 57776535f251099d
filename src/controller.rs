//! Dashboard controller: owns the cache, the loader and the active-model
//! cancellation token, scoped to one dashboard instance. No process-wide
//! singletons; two controllers never share state.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;

use crate::cache::InsightCache;
use crate::insight::InsightPayload;
use crate::layout::{generate_layout, Layout};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::scheduler::{CancelToken, InsightLoader, LoadSummary, OnResolved};
use crate::source::{InsightSource, SourceKind};
use crate::state::{Config, ModelData};
use crate::tile::Tile;

struct ActiveModel {
    id: String,
    token: CancelToken,
}

pub struct DashboardController {
    config: Config,
    cache: InsightCache,
    loader: InsightLoader,
    active: Mutex<ActiveModel>,
}

impl DashboardController {
    pub fn new(config: Config, source: Arc<dyn InsightSource>) -> Self {
        let cache = InsightCache::new();
        let loader = InsightLoader::new(source, cache.clone(), config.clone());
        Self {
            config,
            cache,
            loader,
            active: Mutex::new(ActiveModel {
                id: String::new(),
                token: CancelToken::new(),
            }),
        }
    }

    /// Wire up from environment: config plus the selected source backend.
    pub fn from_env() -> Result<Self> {
        let config = Config::from_env();
        let source: Arc<dyn InsightSource> = SourceKind::from_env().build(&config)?.into();
        Ok(Self::new(config, source))
    }

    /// Pack a tile catalog into this dashboard's grid.
    pub fn generate_layout(&self, tiles: &[Tile]) -> Layout {
        generate_layout(tiles, self.config.grid_dims())
    }

    /// Cache lookup for the initial render pass: hits paint immediately,
    /// before any fetching starts.
    pub fn cached_payload(&self, model_id: &str, tile: &Tile) -> Option<InsightPayload> {
        let key = tile.cache_key()?;
        self.cache.get(model_id, &key)
    }

    /// Fetch enrichment for every placed tile missing a cache hit. See
    /// `InsightLoader::load_all` for batching and single-flight semantics.
    pub async fn load_all(
        &self,
        layout: &Layout,
        model: &ModelData,
        model_id: &str,
        on_resolved: OnResolved,
    ) -> LoadSummary {
        let token = {
            let guard = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            guard.token.clone()
        };
        self.loader
            .load_all(&layout.placed, model, model_id, token, on_resolved)
            .await
    }

    /// Make `new_model_id` the active model: cancel in-flight work for the
    /// outgoing model and drop its cached narratives, which are only valid
    /// against that model's data.
    pub fn switch_model(&self, new_model_id: &str) {
        let outgoing = {
            let mut guard = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            if guard.id == new_model_id {
                return;
            }
            guard.token.cancel();
            let outgoing = std::mem::take(&mut guard.id);
            guard.id = new_model_id.to_string();
            guard.token = CancelToken::new();
            outgoing
        };

        if !outgoing.is_empty() {
            self.cache.invalidate(&outgoing);
        }
        log(
            Level::Info,
            Domain::System,
            "model_switched",
            obj(&[("from", v_str(&outgoing)), ("to", v_str(new_model_id))]),
        );
    }

    /// Drop one model's cached payloads without touching in-flight state.
    pub fn invalidate_model(&self, model_id: &str) {
        self.cache.invalidate(model_id);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

//! gridsight: core of a valuation-tile dashboard.
//!
//! Two engineering problems live here. The Grid Packer fits an
//! unpredictable catalog of sized tiles into a fixed grid without overlap,
//! honoring below-tile placement hints. The Insight Load Scheduler fills
//! those tiles with narrative content from a slow, rate-limited generation
//! service: cached per model, batched, single-flight, progressively
//! rendered. Valuation math and chart painting happen elsewhere.

pub mod cache;
pub mod controller;
pub mod insight;
pub mod layout;
pub mod logging;
pub mod scheduler;
pub mod source;
pub mod state;
pub mod tile;

pub use cache::InsightCache;
pub use controller::DashboardController;
pub use insight::{compute_content_budget, ChartData, ChartKind, ContentBudget, InsightKind, InsightPayload};
pub use layout::{generate_layout, Layout};
pub use scheduler::{CancelToken, InsightLoader, LoadSummary, OnResolved};
pub use source::{InsightRequest, InsightSource, SourceKind};
pub use state::{Config, ModelData};
pub use tile::{GridDims, PlacedTile, PreferredPosition, SizeClass, Tile};

//! Boundary to the external content-generation service.
//!
//! The service is slow and rate-limited; everything above this module
//! assumes a fetch can take seconds and can fail. Transport is abstract:
//! the scheduler only sees the `InsightSource` trait.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::insight::{ContentBudget, InsightPayload};
use crate::state::{Config, ModelData};
use crate::tile::SizeClass;

pub mod http;
pub mod stub;

/// Everything the service needs to generate content for one tile. The
/// budget is derived from the tile's rendered pixel footprint so the
/// returned prose fits without overflow.
#[derive(Debug, Clone, Serialize)]
pub struct InsightRequest {
    pub tile_id: String,
    pub title: String,
    pub display_value: String,
    pub size_class: SizeClass,
    pub budget: ContentBudget,
    pub model_data: ModelData,
}

#[async_trait]
pub trait InsightSource: Send + Sync {
    async fn fetch_insight(&self, req: &InsightRequest) -> Result<InsightPayload>;
}

#[derive(Clone, Copy, Debug)]
pub enum SourceKind {
    Http,
    Stub,
}

impl SourceKind {
    pub fn from_env() -> Self {
        match std::env::var("INSIGHT_SOURCE").unwrap_or_else(|_| "http".to_string()).as_str() {
            "stub" => SourceKind::Stub,
            _ => SourceKind::Http,
        }
    }

    pub fn build(self, cfg: &Config) -> Result<Box<dyn InsightSource>> {
        match self {
            SourceKind::Http => Ok(Box::new(http::HttpInsightSource::new(cfg)?)),
            SourceKind::Stub => Ok(Box::new(stub::StubInsightSource::new())),
        }
    }
}

//! Deterministic offline source for the demo bin and tests. No network,
//! no latency unless asked for one.

use anyhow::Result;
use tokio::time::{sleep, Duration};

use super::{InsightRequest, InsightSource};
use crate::insight::InsightPayload;

pub struct StubInsightSource {
    latency_ms: u64,
}

impl StubInsightSource {
    pub fn new() -> Self {
        Self { latency_ms: 0 }
    }

    pub fn with_latency(latency_ms: u64) -> Self {
        Self { latency_ms }
    }
}

impl Default for StubInsightSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl InsightSource for StubInsightSource {
    async fn fetch_insight(&self, req: &InsightRequest) -> Result<InsightPayload> {
        if self.latency_ms > 0 {
            sleep(Duration::from_millis(self.latency_ms)).await;
        }
        let mut prose = format!(
            "{} currently reads {}. The figure is consistent with the active model's assumptions.",
            req.title, req.display_value
        );
        prose.truncate(prose.char_indices().map(|(i, _)| i).nth(req.budget.chars).unwrap_or(prose.len()));
        Ok(InsightPayload::prose_only(prose))
    }
}

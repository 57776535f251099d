//! HTTP implementation of the generation-service boundary.

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{InsightRequest, InsightSource};
use crate::insight::{ChartData, ChartKind, InsightPayload};
use crate::logging::{log, obj, params_hash, v_num, v_str, Domain, Level};
use crate::state::Config;

// Service response types (camelCase wire format).
#[derive(Deserialize, Debug)]
struct InsightResponse {
    prose: String,
    chart: Option<ChartResponse>,
    #[serde(rename = "specialItems")]
    special_items: Option<Vec<String>>,
}

#[derive(Deserialize, Debug)]
struct ChartResponse {
    kind: String,
    points: Vec<PointResponse>,
}

#[derive(Deserialize, Debug)]
struct PointResponse {
    label: String,
    value: f64,
}

pub struct HttpInsightSource {
    client: Client,
    base: String,
}

impl HttpInsightSource {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.insight_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base: cfg.insight_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl InsightSource for HttpInsightSource {
    async fn fetch_insight(&self, req: &InsightRequest) -> Result<InsightPayload> {
        let url = format!("{}/v1/insights", self.base);
        let started = std::time::Instant::now();

        let resp = self.client.post(&url).json(req).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow::anyhow!(
                "insight service returned {} for tile {}",
                resp.status(),
                req.tile_id
            ));
        }
        let body: InsightResponse = resp.json().await?;

        log(
            Level::Debug,
            Domain::Source,
            "insight_fetched",
            obj(&[
                ("tile", v_str(&params_hash(&req.tile_id))),
                ("elapsed_ms", v_num(started.elapsed().as_secs_f64() * 1000.0)),
                ("prose_chars", v_num(body.prose.len() as f64)),
            ]),
        );

        Ok(InsightPayload {
            prose: body.prose,
            chart: body.chart.map(|c| ChartData {
                kind: parse_chart_kind(&c.kind),
                points: c.points.into_iter().map(|p| (p.label, p.value)).collect(),
            }),
            special_items: body.special_items.unwrap_or_default(),
        })
    }
}

fn parse_chart_kind(kind: &str) -> ChartKind {
    match kind {
        "bar" => ChartKind::Bar,
        "donut" => ChartKind::Donut,
        _ => ChartKind::Line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart_kind_defaults_to_line() {
        assert_eq!(parse_chart_kind("bar"), ChartKind::Bar);
        assert_eq!(parse_chart_kind("donut"), ChartKind::Donut);
        assert_eq!(parse_chart_kind("sparkline"), ChartKind::Line);
    }

    #[test]
    fn test_response_deserializes_wire_format() {
        let raw = r#"{
            "prose": "levered free cash flow is improving",
            "chart": {"kind": "line", "points": [{"label": "q1", "value": 3.1}]},
            "specialItems": null
        }"#;
        let body: InsightResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.prose, "levered free cash flow is improving");
        assert_eq!(body.chart.unwrap().points[0].value, 3.1);
        assert!(body.special_items.is_none());
    }
}

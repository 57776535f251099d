use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use gridsight::logging::{log, obj, v_num, v_str, Domain, Level};
use gridsight::source::stub::StubInsightSource;
use gridsight::{Config, DashboardController, InsightKind, ModelData, SizeClass, Tile};

/// Sample catalog standing in for the layout recommender: the shape mix of
/// a typical valuation dashboard (one hero metric, a couple of charts, a
/// feed, and a row of scalars).
fn sample_catalog() -> Vec<Tile> {
    vec![
        Tile::new("enterprise-value", SizeClass::Large, "Enterprise Value")
            .with_value("$412M")
            .with_insight(InsightKind::Narrative),
        Tile::new("revenue-trend", SizeClass::Vertical, "Revenue Trend")
            .with_value("$96M")
            .with_insight(InsightKind::Comparative),
        Tile::new("news-feed", SizeClass::Vertical, "Developments")
            .with_value("5 items")
            .with_insight(InsightKind::Feed),
        Tile::new("wacc", SizeClass::Horizontal, "WACC")
            .with_value("8.4%")
            .with_insight(InsightKind::Narrative)
            .below("enterprise-value"),
        Tile::new("irr", SizeClass::Square, "IRR").with_value("18.2%").with_insight(InsightKind::Narrative),
        Tile::new("npv", SizeClass::Square, "NPV").with_value("$58M").with_insight(InsightKind::Narrative),
        Tile::new("payback", SizeClass::Square, "Payback").with_value("4.1y"),
        Tile::new("margin", SizeClass::Square, "EBITDA Margin")
            .with_value("31%")
            .with_insight(InsightKind::Comparative),
        Tile::new("leverage", SizeClass::Square, "Net Leverage").with_value("2.3x"),
        Tile::new("runway", SizeClass::Square, "Runway").with_value("29mo"),
        Tile::new("beta", SizeClass::Square, "Beta").with_value("1.12"),
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    // Offline demo: stub source with a little latency so the progressive
    // per-batch rendering is visible in the log stream.
    let controller = DashboardController::new(
        Config::from_env(),
        Arc::new(StubInsightSource::with_latency(120)),
    );
    controller.switch_model("demo-model");

    let tiles = sample_catalog();
    let layout = controller.generate_layout(&tiles);
    for placed in &layout.placed {
        log(
            Level::Info,
            Domain::Layout,
            "tile_placed",
            obj(&[
                ("tile_id", v_str(&placed.tile.id)),
                ("size", v_str(placed.tile.size.as_str())),
                ("col", v_num(placed.column_start as f64)),
                ("row", v_num(placed.row_start as f64)),
            ]),
        );
    }

    let model = ModelData::new(json!({
        "model_id": "demo-model",
        "enterprise_value": 412.0e6,
        "wacc": 0.084,
        "irr": 0.182,
    }));

    let on_resolved: gridsight::OnResolved = Arc::new(|tile_id, payload| {
        log(
            Level::Info,
            Domain::Insight,
            "tile_rendered",
            obj(&[
                ("tile_id", v_str(tile_id)),
                ("enriched", json!(payload.is_some())),
            ]),
        );
    });

    let summary = controller
        .load_all(&layout, &model, "demo-model", on_resolved)
        .await;

    log(
        Level::Info,
        Domain::System,
        "demo_complete",
        obj(&[
            ("placed", v_num(layout.placed.len() as f64)),
            ("unplaced", v_num(layout.unplaced.len() as f64)),
            ("fetched", v_num(summary.fetched as f64)),
            ("failed", v_num(summary.failed as f64)),
        ]),
    );

    Ok(())
}

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, CounterVec, GaugeVec,
    HistogramVec,
};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::models::{season::Season, user::Role};
use crate::services::{facts::{FactService, Scope}, rollup};

lazy_static! {
    // ── Request counters ────────────────────────────────────────────────────
    pub static ref DASHBOARD_REQUESTS: CounterVec = register_counter_vec!(
        "dashboard_requests_total",
        "Dashboard pages served, by page",
        &["page"]
    ).unwrap();

    pub static ref SECTION_FAILURES: CounterVec = register_counter_vec!(
        "report_section_failures_total",
        "Dashboard sections that failed to load, by section",
        &["section"]
    ).unwrap();

    pub static ref QUERY_DURATION: HistogramVec = register_histogram_vec!(
        "report_query_duration_seconds",
        "Fact query latency, by query",
        &["query"]
    ).unwrap();

    // ── Federation metrics ──────────────────────────────────────────────────
    pub static ref ACTIVE_MEMBERS_GAUGE: GaugeVec = register_gauge_vec!(
        "federation_active_members",
        "Active members who joined in the current season, by role",
        &["role"]
    ).unwrap();
}

/// Spawn the background metrics collector (refreshes every 5 minutes).
pub fn start(pool: PgPool) {
    lazy_static::initialize(&DASHBOARD_REQUESTS);
    lazy_static::initialize(&SECTION_FAILURES);
    lazy_static::initialize(&QUERY_DURATION);

    tokio::spawn(async move {
        if let Err(e) = collect(&pool).await {
            warn!("Metrics: initial collection failed: {}", e);
        }
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
            if let Err(e) = collect(&pool).await {
                warn!("Metrics: collection failed: {}", e);
            }
        }
    });
}

async fn collect(pool: &PgPool) -> anyhow::Result<()> {
    let season = Season::current();
    let facts = FactService::load_season(pool, season, &Scope::national()).await?;

    let totals = rollup::national_summaries(&facts)
        .into_iter()
        .find(|n| n.season == season);

    let (coaches, parents, skiers) = totals
        .map(|n| (n.total_coaches, n.total_parents, n.total_skiers))
        .unwrap_or_default();

    ACTIVE_MEMBERS_GAUGE.with_label_values(&[&Role::Coach.to_string()]).set(coaches as f64);
    ACTIVE_MEMBERS_GAUGE.with_label_values(&[&Role::Parent.to_string()]).set(parents as f64);
    ACTIVE_MEMBERS_GAUGE.with_label_values(&[&Role::Skier.to_string()]).set(skiers as f64);

    info!("Metrics: collected for season {}", season);
    Ok(())
}

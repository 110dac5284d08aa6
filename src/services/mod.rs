pub mod dashboards;
pub mod export;
pub mod facts;
pub mod kpi;
pub mod metrics;
pub mod rollup;

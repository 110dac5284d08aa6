use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use strive_dashboard::{
    config::Config,
    db,
    routes,
    services::metrics,
    AppState,
};

/// Allow the app base URL, its subdomains, and localhost for development.
fn origin_allowed(origin: &str, base: &str) -> bool {
    if origin.starts_with("http://localhost") || origin.starts_with("http://127.0.0.1") {
        return true;
    }
    if origin == base {
        return true;
    }
    if let Some(idx) = base.find("://") {
        let after_scheme = &base[idx + 3..];
        let domain = after_scheme.split('/').next().unwrap_or(after_scheme);
        let domain_clean = domain.split(':').next().unwrap_or(domain);
        if origin.ends_with(&format!(".{domain_clean}")) {
            return true;
        }
    }
    false
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let pool = db::create_pool(&config).await?;
    db::check_connection(&pool).await?;
    info!("Database connected");

    if config.install_views {
        db::views::install(&pool).await?;
        info!("Reporting views installed");
    } else {
        warn!("INSTALL_VIEWS disabled; reporting views left as they are");
    }

    metrics::start(pool.clone());

    let state = AppState {
        db: pool,
        config: config.clone(),
    };

    let base_url = config.app_base_url.clone();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin.to_str().is_ok_and(|o| origin_allowed(o, &base_url))
        }));

    let app = routes::router(state).layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Strive dashboard API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::origin_allowed;

    #[test]
    fn cors_allows_base_domain_and_subdomains() {
        let base = "https://strive.example.org";
        assert!(origin_allowed("https://strive.example.org", base));
        assert!(origin_allowed("https://bc.strive.example.org", base));
        assert!(origin_allowed("http://localhost:5173", base));
        assert!(!origin_allowed("https://strive.example.org.evil.com", base));
        assert!(!origin_allowed("https://example.org", base));
    }
}

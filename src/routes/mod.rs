pub mod dashboard;
pub mod health;
pub mod metrics;
pub mod reports;
pub mod seasons;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::{
    error::AppError,
    middleware::auth::JwtSecret,
    models::{
        auth::AuthenticatedUser,
        club::Club,
        filter::{ClubFilter, ReportQuery},
        season::Season,
        user::Role,
    },
    AppState,
};

/// All API routes, with the JWT secret and request tracing attached.
pub fn router(state: AppState) -> Router {
    let jwt_secret = JwtSecret(state.config.jwt_secret.clone());

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/seasons", get(seasons::list_seasons))
        // Dashboards
        .route("/dashboard", get(dashboard::role_dashboard))
        .route("/dashboards/national", get(dashboard::national_dashboard))
        .route("/dashboards/ptso", get(dashboard::ptso_dashboard))
        .route("/dashboards/club/{club_id}", get(dashboard::club_dashboard))
        // Reports
        .route("/reports/clubs", get(reports::club_table))
        .route("/reports/clubs.csv", get(reports::club_table_csv))
        .route("/reports/filters", get(reports::filter_options))
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Season and club filter from the query string. Malformed values are a 400.
pub(crate) fn season_and_filter(query: &ReportQuery) -> Result<(Season, ClubFilter), AppError> {
    let season = query.season().map_err(|e| AppError::BadRequest(e.to_string()))?;
    let filter = query.filter().map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok((season, filter))
}

/// Applies PTSO scoping: ACA users see everything, PTSO admins only their own PTSO.
pub(crate) fn pin_ptso(user: &AuthenticatedUser, mut filter: ClubFilter) -> Result<ClubFilter, AppError> {
    match user.role {
        Role::Aca => Ok(filter),
        Role::PtsoAdmin => {
            let own = user
                .ptso
                .clone()
                .ok_or_else(|| AppError::Forbidden("No PTSO assigned to this account".into()))?;
            if filter.ptso.as_deref().is_some_and(|p| p != own) {
                return Err(AppError::Forbidden("Access limited to your own PTSO".into()));
            }
            filter.ptso = Some(own);
            Ok(filter)
        }
        Role::ClubAdmin | Role::Coach | Role::Parent | Role::Skier => {
            Err(AppError::Forbidden("Access denied".into()))
        }
    }
}

pub(crate) fn require_club_access(user: &AuthenticatedUser, club: &Club) -> Result<(), AppError> {
    let allowed = match user.role {
        Role::Aca => true,
        Role::PtsoAdmin => user.ptso.is_some() && user.ptso == club.ptso,
        Role::ClubAdmin | Role::Coach => user.club_id == Some(club.id),
        Role::Parent | Role::Skier => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden("Access denied".into()))
    }
}

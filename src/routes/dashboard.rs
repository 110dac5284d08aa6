use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use crate::{
    error::AppError,
    models::{
        auth::AuthenticatedUser,
        club::Club,
        filter::{ClubFilter, ReportQuery},
        page::{ClubDashboard, Dashboard, NationalDashboard, Page, PtsoDashboard},
        user::Role,
    },
    routes::{pin_ptso, require_club_access, season_and_filter},
    services::{dashboards::DashboardService, facts::FactService, metrics::DASHBOARD_REQUESTS},
    AppState,
};

async fn load_club(state: &AppState, club_id: i64) -> Result<Club, AppError> {
    FactService::find_club(&state.db, club_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Club {club_id} not found")))
}

fn served(page: Page) {
    DASHBOARD_REQUESTS.with_label_values(&[page.as_str()]).inc();
}

/// GET /dashboard: the landing page for the caller's role.
pub async fn role_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Dashboard>, AppError> {
    let page = Page::for_role(user.role)
        .ok_or_else(|| AppError::Forbidden("No dashboard is available for this role".into()))?;
    let (season, filter) = season_and_filter(&query)?;
    info!(user = %user.user_id, role = %user.role, page = page.as_str(), %season, "Dashboard requested");

    let dashboard = match page {
        Page::National => Dashboard::National(DashboardService::national(&state.db, season).await),
        Page::Ptso => {
            let filter = pin_ptso(&user, filter)?;
            Dashboard::Ptso(
                DashboardService::ptso(&state.db, season, &filter, state.config.trend_seasons).await,
            )
        }
        Page::Club => {
            let club_id = user
                .club_id
                .ok_or_else(|| AppError::Forbidden("No club assigned to this account".into()))?;
            let club = load_club(&state, club_id).await?;
            Dashboard::Club(
                DashboardService::club(&state.db, season, &club, state.config.trend_seasons).await,
            )
        }
    };

    served(page);
    Ok(Json(dashboard))
}

/// GET /dashboards/national
pub async fn national_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> Result<Json<NationalDashboard>, AppError> {
    if user.role != Role::Aca {
        return Err(AppError::Forbidden("National dashboard is limited to ACA users".into()));
    }
    let (season, _) = season_and_filter(&query)?;

    let dashboard = DashboardService::national(&state.db, season).await;
    served(Page::National);
    Ok(Json(dashboard))
}

/// GET /dashboards/ptso
pub async fn ptso_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> Result<Json<PtsoDashboard>, AppError> {
    let (season, filter) = season_and_filter(&query)?;
    let filter: ClubFilter = pin_ptso(&user, filter)?;

    let dashboard =
        DashboardService::ptso(&state.db, season, &filter, state.config.trend_seasons).await;
    served(Page::Ptso);
    Ok(Json(dashboard))
}

/// GET /dashboards/club/{club_id}
pub async fn club_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(club_id): Path<i64>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ClubDashboard>, AppError> {
    let (season, _) = season_and_filter(&query)?;
    let club = load_club(&state, club_id).await?;
    require_club_access(&user, &club)?;

    let dashboard =
        DashboardService::club(&state.db, season, &club, state.config.trend_seasons).await;
    served(Page::Club);
    Ok(Json(dashboard))
}

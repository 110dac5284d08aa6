use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};

use crate::{
    error::AppError,
    models::{
        auth::AuthenticatedUser,
        filter::ReportQuery,
        report::{ClubSeasonSummary, FilterOptions},
    },
    routes::{pin_ptso, season_and_filter},
    services::{dashboards::DashboardService, export},
    AppState,
};

/// GET /reports/clubs: the filtered club table as JSON.
pub async fn club_table(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<ClubSeasonSummary>>, AppError> {
    let (season, filter) = season_and_filter(&query)?;
    let filter = pin_ptso(&user, filter)?;

    let rows = DashboardService::club_table(&state.db, season, &filter).await?;
    Ok(Json(rows))
}

/// GET /reports/clubs.csv: same rows, as a download.
pub async fn club_table_csv(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let (season, filter) = season_and_filter(&query)?;
    let filter = pin_ptso(&user, filter)?;

    let rows = DashboardService::club_table(&state.db, season, &filter).await?;
    let data = export::clubs_csv(&rows)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export::clubs_filename(season)),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// GET /reports/filters: dropdown values for the selected season.
pub async fn filter_options(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> Result<Json<FilterOptions>, AppError> {
    let (season, _) = season_and_filter(&query)?;
    let scope = pin_ptso(&user, Default::default())?;

    let options = DashboardService::filter_options(&state.db, season, scope.ptso.as_deref()).await?;
    Ok(Json(options))
}

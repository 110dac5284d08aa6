use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{
    error::AppError, models::auth::AuthenticatedUser, models::season::Season,
    services::facts::FactService, AppState,
};

/// GET /seasons: seasons that have any activity, newest first.
pub async fn list_seasons(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Value>, AppError> {
    let seasons = FactService::seasons(&state.db).await?;
    Ok(Json(json!({
        "current": Season::current(),
        "seasons": seasons,
    })))
}

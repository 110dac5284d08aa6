use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Club {
    pub id: i64,
    pub name: String,
    pub ptso: Option<String>,
}

/// One coach evaluation, attributed to the evaluating coach's club.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Evaluation {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub passed: bool,
    pub level_id: Option<i64>,
    pub level_name: Option<String>,
    pub level_sort: Option<i32>,
    pub club_id: Option<i64>,
    pub club_name: Option<String>,
    pub ptso: Option<String>,
}

/// One drill share, attributed to the sharing coach's club.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DrillShare {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub club_id: Option<i64>,
    pub club_name: Option<String>,
    pub ptso: Option<String>,
}

/// Everything the rollup engine needs for a season range, loaded in one go.
#[derive(Debug, Clone, Default)]
pub struct Facts {
    pub members: Vec<crate::models::user::Member>,
    pub evaluations: Vec<Evaluation>,
    pub drill_shares: Vec<DrillShare>,
}

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    db::views::COUNTED_ROLES,
    models::{
        club::{Club, DrillShare, Evaluation, Facts},
        season::{sql_start_year, Season},
        user::Member,
    },
    services::metrics::QUERY_DURATION,
};

/// Narrows fact queries to one PTSO and/or one club. The default scope is
/// national and includes users without a club.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    pub ptso: Option<String>,
    pub club_id: Option<i64>,
}

impl Scope {
    pub fn national() -> Self {
        Self::default()
    }

    pub fn ptso(ptso: impl Into<String>) -> Self {
        Self { ptso: Some(ptso.into()), club_id: None }
    }

    pub fn club(club_id: i64) -> Self {
        Self { ptso: None, club_id: Some(club_id) }
    }
}

const MEMBERS_SQL: &str = r#"
SELECT u.id::BIGINT                  AS id,
       COALESCE(u.firstname, '')     AS first_name,
       COALESCE(u.lastname, '')      AS last_name,
       COALESCE(u.email, '')         AS email,
       lower(u.role::TEXT)           AS role,
       u.club_id::BIGINT             AS club_id,
       c.name                        AS club_name,
       c.ptso                        AS ptso,
       u.created_at                  AS created_at,
       u.current_level::BIGINT       AS current_level,
       l.name                        AS level_name,
       l.sort_order::INT             AS level_sort
FROM users u
LEFT JOIN clubs  c ON c.id = u.club_id
LEFT JOIN levels l ON l.id::TEXT = u.current_level::TEXT
WHERE u.active IS TRUE
  AND u.created_at >= $1 AND u.created_at < $2
  AND ($3::TEXT   IS NULL OR c.ptso    = $3)
  AND ($4::BIGINT IS NULL OR u.club_id = $4)
"#;

const EVALUATIONS_SQL: &str = r#"
SELECT cr.id::BIGINT                 AS id,
       cr.created_at                 AS created_at,
       COALESCE(cr.passed, FALSE)    AS passed,
       cr.level_id::BIGINT           AS level_id,
       l.name                        AS level_name,
       l.sort_order::INT             AS level_sort,
       u.club_id::BIGINT             AS club_id,
       c.name                        AS club_name,
       c.ptso                        AS ptso
FROM coach_rankings cr
LEFT JOIN users  u ON u.id = cr.coach_id
LEFT JOIN clubs  c ON c.id = u.club_id
LEFT JOIN levels l ON l.id = cr.level_id
WHERE cr.created_at >= $1 AND cr.created_at < $2
  AND ($3::TEXT   IS NULL OR c.ptso    = $3)
  AND ($4::BIGINT IS NULL OR u.club_id = $4)
"#;

const DRILL_SHARES_SQL: &str = r#"
SELECT sd.id::BIGINT                 AS id,
       sd.created_at                 AS created_at,
       u.club_id::BIGINT             AS club_id,
       c.name                        AS club_name,
       c.ptso                        AS ptso
FROM share_drills sd
LEFT JOIN users u ON u.id = sd.coach_id
LEFT JOIN clubs c ON c.id = u.club_id
WHERE sd.created_at >= $1 AND sd.created_at < $2
  AND ($3::TEXT   IS NULL OR c.ptso    = $3)
  AND ($4::BIGINT IS NULL OR u.club_id = $4)
"#;

/// Only members the rollups count can open a season; admin-only seasons would be empty.
fn seasons_sql() -> String {
    let start = sql_start_year("created_at");
    format!(
        "SELECT {start} AS start_year FROM users
         WHERE active IS TRUE AND lower(role::TEXT) IN {COUNTED_ROLES}
         UNION
         SELECT {start} FROM coach_rankings
         UNION
         SELECT {start} FROM share_drills
         ORDER BY 1 DESC"
    )
}

pub struct FactService;

impl FactService {
    /// Loads all facts created between the start of `first` and the end of
    /// `last` (inclusive seasons) within `scope`.
    pub async fn load(
        pool: &PgPool,
        first: Season,
        last: Season,
        scope: &Scope,
    ) -> anyhow::Result<Facts> {
        let (from, _) = first.bounds();
        let (_, to) = last.bounds();

        let (members, evaluations, drill_shares) = tokio::try_join!(
            Self::members(pool, from, to, scope),
            Self::evaluations(pool, from, to, scope),
            Self::drill_shares(pool, from, to, scope),
        )?;

        tracing::debug!(
            members = members.len(),
            evaluations = evaluations.len(),
            drill_shares = drill_shares.len(),
            %first,
            %last,
            "Loaded facts"
        );

        Ok(Facts { members, evaluations, drill_shares })
    }

    pub async fn load_season(pool: &PgPool, season: Season, scope: &Scope) -> anyhow::Result<Facts> {
        Self::load(pool, season, season, scope).await
    }

    async fn members(
        pool: &PgPool,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        scope: &Scope,
    ) -> anyhow::Result<Vec<Member>> {
        let _timer = QUERY_DURATION.with_label_values(&["members"]).start_timer();
        let rows = sqlx::query_as::<_, Member>(MEMBERS_SQL)
            .bind(from)
            .bind(to)
            .bind(&scope.ptso)
            .bind(scope.club_id)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    async fn evaluations(
        pool: &PgPool,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        scope: &Scope,
    ) -> anyhow::Result<Vec<Evaluation>> {
        let _timer = QUERY_DURATION.with_label_values(&["evaluations"]).start_timer();
        let rows = sqlx::query_as::<_, Evaluation>(EVALUATIONS_SQL)
            .bind(from)
            .bind(to)
            .bind(&scope.ptso)
            .bind(scope.club_id)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    async fn drill_shares(
        pool: &PgPool,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        scope: &Scope,
    ) -> anyhow::Result<Vec<DrillShare>> {
        let _timer = QUERY_DURATION.with_label_values(&["drill_shares"]).start_timer();
        let rows = sqlx::query_as::<_, DrillShare>(DRILL_SHARES_SQL)
            .bind(from)
            .bind(to)
            .bind(&scope.ptso)
            .bind(scope.club_id)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    /// Seasons that have any activity, newest first.
    pub async fn seasons(pool: &PgPool) -> anyhow::Result<Vec<Season>> {
        let _timer = QUERY_DURATION.with_label_values(&["seasons"]).start_timer();
        let sql = seasons_sql();
        let years: Vec<i32> = sqlx::query_scalar(&sql).fetch_all(pool).await?;
        Ok(years.into_iter().map(Season::starting).collect())
    }

    pub async fn find_club(pool: &PgPool, club_id: i64) -> anyhow::Result<Option<Club>> {
        let club = sqlx::query_as::<_, Club>(
            "SELECT id::BIGINT AS id, name, ptso FROM clubs WHERE id = $1",
        )
        .bind(club_id)
        .fetch_optional(pool)
        .await?;
        Ok(club)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes() {
        assert_eq!(Scope::national(), Scope { ptso: None, club_id: None });
        assert_eq!(Scope::ptso("ON").ptso.as_deref(), Some("ON"));
        assert_eq!(Scope::club(4).club_id, Some(4));
    }

    #[test]
    fn fact_queries_share_scope_parameters() {
        for sql in [MEMBERS_SQL, EVALUATIONS_SQL, DRILL_SHARES_SQL] {
            assert!(sql.contains("$3::TEXT   IS NULL"));
            assert!(sql.contains("$4::BIGINT IS NULL"));
            assert!(sql.contains(">= $1 AND"));
        }
        assert!(MEMBERS_SQL.contains("u.active IS TRUE"));
    }

    #[test]
    fn seasons_ignore_admin_only_signups() {
        let sql = seasons_sql();
        assert!(sql.contains("lower(role::TEXT) IN ('coach', 'parent', 'guardian', 'skier')"));
        assert!(!sql.contains("club_admin"));
        assert!(sql.trim_end().ends_with("ORDER BY 1 DESC"));
    }
}

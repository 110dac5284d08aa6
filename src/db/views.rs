//! Reporting views for external BI consumers.
//!
//! Column names are a contract with downstream dashboards. Every season
//! column is produced by [`sql_label`], the same bucketing the API uses.

use sqlx::PgPool;
use tracing::info;

use crate::models::season::sql_label;

/// Role filter shared by every member count. `guardian` is the legacy spelling of `parent`.
pub(crate) const COUNTED_ROLES: &str = "('coach', 'parent', 'guardian', 'skier')";
const PARENT_ROLES: &str = "('parent', 'guardian')";

#[derive(Debug, Clone)]
pub struct ViewDef {
    pub name: &'static str,
    pub body: String,
}

impl ViewDef {
    pub fn ddl(&self) -> String {
        format!(
            "DROP VIEW IF EXISTS public.{name} CASCADE;\nCREATE VIEW public.{name} AS\n{body};\n",
            name = self.name,
            body = self.body.trim_end(),
        )
    }
}

fn club_summary() -> ViewDef {
    let member_season = sql_label("u.created_at");
    let ranking_season = sql_label("cr.created_at");
    let drill_season = sql_label("sd.created_at");

    ViewDef {
        name: "vw_club_summary_by_season",
        body: format!(
            r#"WITH
  member_facts AS (
    SELECT u.club_id, {member_season} AS season, lower(u.role::TEXT) AS role
    FROM users u
    WHERE u.active IS TRUE
      AND u.club_id IS NOT NULL
      AND lower(u.role::TEXT) IN {COUNTED_ROLES}
  ),
  member_cte AS (
    SELECT club_id, season,
           COUNT(*) FILTER (WHERE role = 'coach')          AS coaches,
           COUNT(*) FILTER (WHERE role IN {PARENT_ROLES})   AS parents,
           COUNT(*) FILTER (WHERE role = 'skier')          AS skiers
    FROM member_facts
    GROUP BY club_id, season
  ),
  eval_cte AS (
    SELECT u.club_id, {ranking_season} AS season,
           COUNT(*)                                   AS evaluations_completed,
           COUNT(*) FILTER (WHERE cr.passed IS TRUE)  AS eval_passed
    FROM coach_rankings cr
    JOIN users u ON u.id = cr.coach_id
    WHERE u.club_id IS NOT NULL
    GROUP BY u.club_id, season
  ),
  drill_cte AS (
    SELECT u.club_id, {drill_season} AS season, COUNT(*) AS drills_shared
    FROM share_drills sd
    JOIN users u ON u.id = sd.coach_id
    WHERE u.club_id IS NOT NULL
    GROUP BY u.club_id, season
  ),
  contact_cte AS (
    SELECT club_id, season, primary_contact, primary_contact_email
    FROM (
      SELECT u.club_id,
             {member_season} AS season,
             COALESCE(u.firstname, '') || ' ' || COALESCE(u.lastname, '') AS primary_contact,
             COALESCE(u.email, '') AS primary_contact_email,
             ROW_NUMBER() OVER (
               PARTITION BY u.club_id, {member_season}
               ORDER BY u.created_at, u.id
             ) AS rn
      FROM users u
      WHERE lower(u.role::TEXT) = 'coach'
        AND u.active IS TRUE
        AND u.club_id IS NOT NULL
    ) ranked
    WHERE rn = 1
  ),
  club_seasons AS (
    SELECT club_id, season FROM member_cte
    UNION
    SELECT club_id, season FROM eval_cte
    UNION
    SELECT club_id, season FROM drill_cte
  )
SELECT
  c.id                                            AS club_id,
  cs.season,
  c.name                                          AS club_name,
  c.id                                            AS sr_id,
  c.ptso                                          AS ptso,
  COALESCE(m.coaches, 0)                          AS coaches,
  COALESCE(m.parents, 0)                          AS parents,
  COALESCE(m.skiers, 0)                           AS skiers,
  COALESCE(e.evaluations_completed, 0)            AS evaluations_completed,
  COALESCE(e.eval_passed, 0)                      AS eval_passed,
  COALESCE(d.drills_shared, 0)                    AS drills_shared,
  COALESCE(ct.primary_contact, '')                AS primary_contact,
  COALESCE(ct.primary_contact_email, '')          AS primary_contact_email,
  CASE WHEN COALESCE(m.coaches, 0) + COALESCE(m.skiers, 0) > 0
       THEN 'Active' ELSE 'Inactive' END          AS status
FROM clubs c
JOIN club_seasons cs      ON cs.club_id = c.id
LEFT JOIN member_cte m    ON m.club_id  = c.id AND m.season  = cs.season
LEFT JOIN eval_cte e      ON e.club_id  = c.id AND e.season  = cs.season
LEFT JOIN drill_cte d     ON d.club_id  = c.id AND d.season  = cs.season
LEFT JOIN contact_cte ct  ON ct.club_id = c.id AND ct.season = cs.season
ORDER BY cs.season, c.name"#
        ),
    }
}

/// Summed from the club view so the two levels cannot disagree.
fn ptso_summary() -> ViewDef {
    ViewDef {
        name: "vw_ptso_summary_by_season",
        body: r#"SELECT
  season,
  ptso,
  COUNT(*)::BIGINT                    AS clubs,
  SUM(coaches)::BIGINT                AS coaches,
  SUM(parents)::BIGINT                AS parents,
  SUM(skiers)::BIGINT                 AS skiers,
  SUM(evaluations_completed)::BIGINT  AS evaluations_completed,
  SUM(eval_passed)::BIGINT            AS eval_passed,
  SUM(drills_shared)::BIGINT          AS drills_shared
FROM public.vw_club_summary_by_season
WHERE ptso IS NOT NULL
GROUP BY season, ptso
ORDER BY season, ptso"#
            .to_string(),
    }
}

fn national_summary() -> ViewDef {
    let member_season = sql_label("created_at");

    ViewDef {
        name: "vw_national_summary_by_season",
        body: format!(
            r#"WITH
  member_cte AS (
    SELECT season,
           COUNT(*) FILTER (WHERE role = 'coach')          AS coaches,
           COUNT(*) FILTER (WHERE role IN {PARENT_ROLES})   AS parents,
           COUNT(*) FILTER (WHERE role = 'skier')          AS skiers
    FROM (
      SELECT {member_season} AS season, lower(role::TEXT) AS role
      FROM users
      WHERE active IS TRUE
    ) m
    WHERE role IN {COUNTED_ROLES}
    GROUP BY season
  ),
  eval_cte AS (
    SELECT {member_season} AS season,
           COUNT(*)                                AS evaluations_completed,
           COUNT(*) FILTER (WHERE passed IS TRUE)  AS eval_passed
    FROM coach_rankings
    GROUP BY season
  ),
  drill_cte AS (
    SELECT {member_season} AS season, COUNT(*) AS drills_shared
    FROM share_drills
    GROUP BY season
  ),
  seasons AS (
    SELECT season FROM member_cte
    UNION
    SELECT season FROM eval_cte
    UNION
    SELECT season FROM drill_cte
  )
SELECT
  s.season,
  COALESCE(m.coaches, 0)                AS total_coaches,
  COALESCE(m.parents, 0)                AS total_parents,
  COALESCE(m.skiers, 0)                 AS total_skiers,
  COALESCE(e.evaluations_completed, 0)  AS evaluations_completed,
  COALESCE(e.eval_passed, 0)            AS eval_passed,
  COALESCE(d.drills_shared, 0)          AS drills_shared
FROM seasons s
LEFT JOIN member_cte m ON m.season = s.season
LEFT JOIN eval_cte   e ON e.season = s.season
LEFT JOIN drill_cte  d ON d.season = s.season
ORDER BY s.season"#
        ),
    }
}

fn evaluations_by_level() -> ViewDef {
    let season = sql_label("cr.created_at");

    ViewDef {
        name: "vw_evaluations_by_level_by_season",
        body: format!(
            r#"SELECT
  {season}                                          AS season,
  u.club_id                                         AS club_id,
  c.name                                            AS club_name,
  c.ptso                                            AS ptso,
  cr.level_id                                       AS level_id,
  COALESCE(l.name, 'Level ' || cr.level_id::TEXT, 'Unknown level') AS level_name,
  l.sort_order                                      AS sort_order,
  COUNT(*)                                          AS eval_count,
  COUNT(*) FILTER (WHERE cr.passed IS TRUE)         AS eval_passed,
  COUNT(*)                                          AS eval_total
FROM coach_rankings cr
LEFT JOIN users  u ON u.id = cr.coach_id
LEFT JOIN clubs  c ON c.id = u.club_id
LEFT JOIN levels l ON l.id = cr.level_id
GROUP BY 1, u.club_id, c.name, c.ptso, cr.level_id, l.name, l.sort_order
ORDER BY 1, l.sort_order NULLS LAST, cr.level_id"#
        ),
    }
}

fn skier_level_distribution() -> ViewDef {
    let season = sql_label("u.created_at");

    ViewDef {
        name: "vw_skier_level_distribution_by_season",
        body: format!(
            r#"WITH base AS (
  SELECT
    u.club_id,
    {season}                                                AS season,
    u.current_level                                         AS level_id,
    COALESCE(l.name, 'Level ' || u.current_level::TEXT)     AS level_name
  FROM users u
  LEFT JOIN levels l ON l.id::TEXT = u.current_level::TEXT
  WHERE lower(u.role::TEXT) = 'skier'
    AND u.active IS TRUE
    AND u.current_level IS NOT NULL
)
SELECT
  b.season,
  c.name     AS club_name,
  c.ptso     AS ptso,
  b.level_id,
  b.level_name,
  COUNT(*)   AS skier_count
FROM base b
JOIN clubs c ON c.id = b.club_id
GROUP BY b.season, c.name, c.ptso, b.level_id, b.level_name
ORDER BY b.season, c.name, c.ptso, b.level_id"#
        ),
    }
}

/// All views, in dependency order.
pub fn definitions() -> Vec<ViewDef> {
    vec![
        club_summary(),
        ptso_summary(),
        national_summary(),
        evaluations_by_level(),
        skier_level_distribution(),
    ]
}

/// Drop and recreate every view in one transaction. Idempotent.
pub async fn install(pool: &PgPool) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;
    for view in definitions() {
        sqlx::raw_sql(&view.ddl()).execute(&mut *tx).await?;
        info!("Installed view: public.{}", view.name);
    }
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_install_club_summary_before_ptso_summary() {
        let names: Vec<&str> = definitions().iter().map(|v| v.name).collect();
        let club = names.iter().position(|n| *n == "vw_club_summary_by_season").unwrap();
        let ptso = names.iter().position(|n| *n == "vw_ptso_summary_by_season").unwrap();
        assert!(club < ptso);
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn every_season_column_uses_the_shared_expression() {
        for view in definitions() {
            let month_checks = view.body.matches("EXTRACT(MONTH").count();
            let labels = ["u.created_at", "cr.created_at", "sd.created_at", "created_at"]
                .iter()
                .map(|col| view.body.matches(&sql_label(col)).count())
                .max()
                .unwrap_or(0);
            if view.name == "vw_ptso_summary_by_season" {
                assert_eq!(month_checks, 0);
            } else {
                assert!(labels > 0, "{} has no season label", view.name);
            }
        }
    }

    #[test]
    fn parents_include_legacy_guardian_role() {
        for view in [club_summary(), national_summary()] {
            assert!(view.body.contains("role IN ('parent', 'guardian')"), "{}", view.name);
        }
    }

    #[test]
    fn ddl_drops_then_creates() {
        let ddl = ptso_summary().ddl();
        assert!(ddl.starts_with("DROP VIEW IF EXISTS public.vw_ptso_summary_by_season CASCADE;"));
        assert!(ddl.contains("CREATE VIEW public.vw_ptso_summary_by_season AS"));
        assert!(ddl.trim_end().ends_with(';'));
    }

    #[test]
    fn club_view_exposes_contract_columns() {
        let body = club_summary().body;
        for column in [
            "AS club_id", "cs.season", "AS club_name", "AS sr_id", "AS ptso", "AS coaches",
            "AS parents", "AS skiers", "AS evaluations_completed", "AS eval_passed",
            "AS drills_shared", "AS primary_contact", "AS primary_contact_email", "AS status",
        ] {
            assert!(body.contains(column), "missing {column}");
        }
    }
}

use std::collections::BTreeSet;

use sqlx::PgPool;
use tracing::warn;

use crate::{
    models::{
        club::{Club, Facts},
        filter::ClubFilter,
        page::{ClubDashboard, NationalDashboard, PtsoDashboard, Section},
        report::{ClubSeasonSummary, ClubStatus, FilterOptions},
        season::Season,
    },
    services::{
        facts::{FactService, Scope},
        kpi::{self, TOP_CLUBS},
        metrics::SECTION_FAILURES,
        rollup,
    },
};

/// Facts for a page, or the warning to show in every section that needed them.
type Loaded = Result<Facts, String>;

fn loaded(what: &str, season: Season, result: anyhow::Result<Facts>) -> Loaded {
    result.map_err(|e| {
        warn!(error = %e, %season, "Failed to load {}", what);
        format!("Could not load {what} for season {season}.")
    })
}

/// Runs `build` against loaded facts. `None` from the builder means "no data".
fn section<T>(
    name: &'static str,
    facts: &Loaded,
    empty: impl FnOnce() -> String,
    build: impl FnOnce(&Facts) -> Option<T>,
) -> Section<T> {
    match facts {
        Ok(f) => match build(f) {
            Some(data) => Section::Ready { data },
            None => Section::Empty { message: empty() },
        },
        Err(warning) => {
            SECTION_FAILURES.with_label_values(&[name]).inc();
            Section::Failed { warning: warning.clone() }
        }
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn season_rows(facts: &Facts, season: Season) -> Vec<ClubSeasonSummary> {
    rollup::club_summaries(facts)
        .into_iter()
        .filter(|r| r.season == season)
        .collect()
}

/// Dropdown values for a season, from clubs that have activity in it.
pub fn filter_options(rows: &[ClubSeasonSummary]) -> FilterOptions {
    let ptsos: BTreeSet<String> = rows.iter().filter_map(|r| r.ptso.clone()).collect();
    let club_names: BTreeSet<String> = rows.iter().map(|r| r.club_name.clone()).collect();
    FilterOptions {
        ptsos: ptsos.into_iter().collect(),
        club_names: club_names.into_iter().collect(),
        statuses: vec![ClubStatus::Active, ClubStatus::Inactive],
    }
}

fn evaluations_match(filter: &ClubFilter, club_name: Option<&str>, ptso: Option<&str>) -> bool {
    let ptso_ok = filter.ptso.as_deref().map_or(true, |p| ptso == Some(p));
    let name_ok = filter.club_name.as_deref().map_or(true, |n| club_name == Some(n));
    ptso_ok && name_ok
}

pub fn national_page(season: Season, facts: &Loaded) -> NationalDashboard {
    NationalDashboard {
        season,
        summary: section(
            "national.summary",
            facts,
            || format!("No summary data found for season {season}."),
            |f| rollup::national_summaries(f).into_iter().find(|n| n.season == season),
        ),
        ptso_breakdown: section(
            "national.ptso_breakdown",
            facts,
            || format!("No PTSO data for season {season}."),
            |f| {
                non_empty(
                    rollup::ptso_summaries(f)
                        .into_iter()
                        .filter(|p| p.season == season)
                        .collect(),
                )
            },
        ),
        pass_rate_by_level: section(
            "national.pass_rate_by_level",
            facts,
            || format!("No evaluations recorded in season {season}."),
            |f| {
                non_empty(rollup::pass_rates_by_level(
                    f.evaluations
                        .iter()
                        .filter(|e| Season::from_timestamp(e.created_at) == season),
                ))
            },
        ),
        skier_levels: section(
            "national.skier_levels",
            facts,
            || format!("No skier levels recorded in season {season}."),
            |f| non_empty(rollup::skier_levels(&f.members, season, false)),
        ),
    }
}

pub fn ptso_page(
    season: Season,
    filter: &ClubFilter,
    trend_seasons: &[Season],
    facts: &Loaded,
    trend_facts: &Loaded,
) -> PtsoDashboard {
    let no_match = || format!("No data found for season {season} with the selected filters.");

    PtsoDashboard {
        season,
        filters: section(
            "ptso.filters",
            facts,
            no_match,
            |f| {
                let rows: Vec<ClubSeasonSummary> = season_rows(f, season)
                    .into_iter()
                    .filter(|r| filter.ptso.is_none() || r.ptso == filter.ptso)
                    .collect();
                Some(filter_options(&rows))
            },
        ),
        kpis: section("ptso.kpis", facts, no_match, |f| {
            let rows = filter.apply(season_rows(f, season));
            (!rows.is_empty()).then(|| kpi::provincial_kpis(&rows))
        }),
        top_clubs: section(
            "ptso.top_clubs",
            facts,
            || "No club data for the selected filters.".to_string(),
            |f| {
                let rows = filter.apply(season_rows(f, season));
                non_empty(kpi::top_clubs_by_skiers(&rows, TOP_CLUBS))
            },
        ),
        eval_completion: section(
            "ptso.eval_completion",
            facts,
            || "No evaluation data for the selected filters.".to_string(),
            |f| {
                let rows = filter.apply(season_rows(f, season));
                non_empty(kpi::completion_rates(&rows, TOP_CLUBS))
            },
        ),
        skier_trend: section(
            "ptso.skier_trend",
            trend_facts,
            || "No skier trend for the selected filters.".to_string(),
            |f| {
                // Club-name and search filters are not applied to the trend.
                let trend_filter = ClubFilter {
                    ptso: filter.ptso.clone(),
                    status: filter.status,
                    ..Default::default()
                };
                let rows = trend_filter.apply(rollup::club_summaries(f));
                Some(kpi::skier_trend(&rows, trend_seasons))
            },
        ),
        pass_rate_by_level: section(
            "ptso.pass_rate_by_level",
            facts,
            || "No pass-rate data for the selected filters.".to_string(),
            |f| {
                non_empty(rollup::pass_rates_by_level(f.evaluations.iter().filter(|e| {
                    Season::from_timestamp(e.created_at) == season
                        && evaluations_match(filter, e.club_name.as_deref(), e.ptso.as_deref())
                })))
            },
        ),
        clubs: section(
            "ptso.clubs",
            facts,
            || "No clubs data for this season.".to_string(),
            |f| non_empty(filter.apply(season_rows(f, season))),
        ),
    }
}

pub fn club_page(
    season: Season,
    club: &Club,
    trend_seasons: &[Season],
    facts: &Loaded,
    trend_facts: &Loaded,
) -> ClubDashboard {
    ClubDashboard {
        season,
        club_id: club.id,
        summary: section(
            "club.summary",
            facts,
            || format!("No activity for {} in season {season}.", club.name),
            |f| season_rows(f, season).into_iter().find(|r| r.club_id == club.id),
        ),
        skier_levels: section(
            "club.skier_levels",
            facts,
            || format!("No skier levels recorded for {} in season {season}.", club.name),
            |f| {
                let members = f.members.iter().filter(|m| m.club_id == Some(club.id));
                non_empty(rollup::skier_levels(members, season, true))
            },
        ),
        pass_rate_by_level: section(
            "club.pass_rate_by_level",
            facts,
            || format!("No evaluations recorded for {} in season {season}.", club.name),
            |f| {
                non_empty(rollup::pass_rates_by_level(f.evaluations.iter().filter(|e| {
                    e.club_id == Some(club.id) && Season::from_timestamp(e.created_at) == season
                })))
            },
        ),
        skier_trend: section(
            "club.skier_trend",
            trend_facts,
            || format!("No skier trend for {}.", club.name),
            |f| {
                let rows: Vec<ClubSeasonSummary> = rollup::club_summaries(f)
                    .into_iter()
                    .filter(|r| r.club_id == club.id)
                    .collect();
                Some(kpi::skier_trend(&rows, trend_seasons))
            },
        ),
    }
}

pub struct DashboardService;

impl DashboardService {
    pub async fn national(pool: &PgPool, season: Season) -> NationalDashboard {
        let facts = FactService::load_season(pool, season, &Scope::national()).await;
        national_page(season, &loaded("national facts", season, facts))
    }

    pub async fn ptso(
        pool: &PgPool,
        season: Season,
        filter: &ClubFilter,
        trend_len: usize,
    ) -> PtsoDashboard {
        let trend_seasons = season.trailing(trend_len);
        let first = trend_seasons.first().copied().unwrap_or(season);
        let scope = Scope { ptso: filter.ptso.clone(), club_id: None };

        let (facts, trend_facts) = tokio::join!(
            FactService::load_season(pool, season, &scope),
            FactService::load(pool, first, season, &scope),
        );

        ptso_page(
            season,
            filter,
            &trend_seasons,
            &loaded("club summaries", season, facts),
            &loaded("the skier trend", season, trend_facts),
        )
    }

    pub async fn club(pool: &PgPool, season: Season, club: &Club, trend_len: usize) -> ClubDashboard {
        let trend_seasons = season.trailing(trend_len);
        let first = trend_seasons.first().copied().unwrap_or(season);
        let scope = Scope::club(club.id);

        let (facts, trend_facts) = tokio::join!(
            FactService::load_season(pool, season, &scope),
            FactService::load(pool, first, season, &scope),
        );

        club_page(
            season,
            club,
            &trend_seasons,
            &loaded("club activity", season, facts),
            &loaded("the skier trend", season, trend_facts),
        )
    }

    /// Club table for exports: every club row in `season` that passes `filter`.
    pub async fn club_table(
        pool: &PgPool,
        season: Season,
        filter: &ClubFilter,
    ) -> anyhow::Result<Vec<ClubSeasonSummary>> {
        let scope = Scope { ptso: filter.ptso.clone(), club_id: None };
        let facts = FactService::load_season(pool, season, &scope).await?;
        Ok(filter.apply(season_rows(&facts, season)))
    }

    /// Dropdown values, limited to one PTSO when the caller is pinned to it.
    pub async fn filter_options(
        pool: &PgPool,
        season: Season,
        ptso: Option<&str>,
    ) -> anyhow::Result<FilterOptions> {
        let scope = Scope { ptso: ptso.map(str::to_string), club_id: None };
        let facts = FactService::load_season(pool, season, &scope).await?;
        Ok(filter_options(&season_rows(&facts, season)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::rollup::fixtures::*;

    const WHISTLER: (i64, &str, &str) = (10, "Whistler", "BC");
    const GROUSE: (i64, &str, &str) = (11, "Grouse", "BC");
    const NAKISKA: (i64, &str, &str) = (20, "Nakiska", "AB");

    fn facts() -> Facts {
        Facts {
            members: vec![
                member(1, "coach", Some(WHISTLER), at(2024, 8, 1)),
                member(2, "skier", Some(WHISTLER), at(2024, 9, 1)),
                member(3, "skier", Some(WHISTLER), at(2024, 9, 5)),
                member(4, "coach", Some(GROUSE), at(2024, 10, 1)),
                member(5, "skier", Some(NAKISKA), at(2024, 11, 1)),
                member(6, "skier", Some(NAKISKA), at(2023, 11, 1)),
            ],
            evaluations: vec![
                evaluation(1, true, 1, Some(WHISTLER), at(2024, 12, 1)),
                evaluation(2, false, 1, Some(NAKISKA), at(2024, 12, 2)),
            ],
            drill_shares: vec![drill(1, Some(GROUSE), at(2024, 12, 3))],
        }
    }

    fn season() -> Season {
        Season::starting(2024)
    }

    #[test]
    fn national_page_sections_are_ready() {
        let page = national_page(season(), &Ok(facts()));
        let summary = page.summary.data().unwrap();
        assert_eq!(summary.total_coaches, 2);
        assert_eq!(summary.total_skiers, 3);
        assert_eq!(page.ptso_breakdown.data().unwrap().len(), 2);
        assert_eq!(page.pass_rate_by_level.data().unwrap()[0].pass_pct, Some(50.0));
        assert!(matches!(page.skier_levels, Section::Empty { .. }));
    }

    #[test]
    fn national_page_for_empty_season() {
        let page = national_page(Season::starting(2019), &Ok(facts()));
        match page.summary {
            Section::Empty { message } => {
                assert_eq!(message, "No summary data found for season 2019/2020.")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn failed_load_only_fails_dependent_sections() {
        let trend_failed: Loaded = Err("Could not load the skier trend for season 2024/2025.".into());
        let page = ptso_page(
            season(),
            &ClubFilter::default(),
            &season().trailing(5),
            &Ok(facts()),
            &trend_failed,
        );
        assert!(page.kpis.is_ready());
        assert!(page.clubs.is_ready());
        match page.skier_trend {
            Section::Failed { warning } => assert!(warning.contains("skier trend")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ptso_page_applies_filters() {
        let filter = ClubFilter { ptso: Some("BC".into()), ..Default::default() };
        let all = Ok(facts());
        let page = ptso_page(season(), &filter, &season().trailing(2), &all, &all);

        let kpis = page.kpis.data().unwrap();
        assert_eq!(kpis.active_clubs, 2);
        assert_eq!(kpis.total_skiers, 2);
        assert_eq!(kpis.total_coaches, 2);
        assert_eq!(kpis.drills_per_coach, 0.5);

        let options = page.filters.data().unwrap();
        assert_eq!(options.ptsos, vec!["BC"]);
        assert!(options.club_names.iter().all(|n| n != NAKISKA.1));

        let top = page.top_clubs.data().unwrap();
        assert_eq!(top[0].club_name, "Whistler");
        assert_eq!(top[1].skier_total, 0);

        let rates = page.pass_rate_by_level.data().unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].pass_pct, Some(100.0));

        let trend = page.skier_trend.data().unwrap();
        assert_eq!(trend.iter().map(|t| t.total_skiers).collect::<Vec<_>>(), vec![0, 2]);

        let clubs = page.clubs.data().unwrap();
        assert!(clubs.iter().all(|c| c.ptso.as_deref() == Some("BC")));
    }

    #[test]
    fn ptso_page_with_no_matching_clubs() {
        let filter = ClubFilter { ptso: Some("NU".into()), ..Default::default() };
        let all = Ok(facts());
        let page = ptso_page(season(), &filter, &season().trailing(1), &all, &all);
        assert!(matches!(page.kpis, Section::Empty { .. }));
        assert!(matches!(page.clubs, Section::Empty { .. }));
        assert!(page.filters.is_ready());
    }

    #[test]
    fn club_page_summary_and_trend() {
        let club = Club { id: WHISTLER.0, name: WHISTLER.1.into(), ptso: Some("BC".into()) };
        let all = Ok(facts());
        let page = club_page(season(), &club, &season().trailing(2), &all, &all);
        let summary = page.summary.data().unwrap();
        assert_eq!(summary.counts.coaches, 1);
        assert_eq!(summary.counts.skiers, 2);
        assert_eq!(summary.primary_contact, "First1 Last1");
        let trend = page.skier_trend.data().unwrap();
        assert_eq!(trend.iter().map(|t| t.total_skiers).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn filter_options_are_sorted_and_distinct() {
        let rows = season_rows(&facts(), season());
        let options = filter_options(&rows);
        assert_eq!(options.club_names, vec!["Grouse", "Nakiska", "Whistler"]);
        assert_eq!(options.statuses, vec![ClubStatus::Active, ClubStatus::Inactive]);
    }
}

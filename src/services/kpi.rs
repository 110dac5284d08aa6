use std::collections::{BTreeMap, BTreeSet};

use crate::models::{
    report::{
        ClubCompletionRate, ClubSeasonSummary, ClubSkierTotal, Counts, ProvincialKpis,
        SeasonTotal,
    },
    season::Season,
};

pub const TOP_CLUBS: usize = 10;

/// `num / den`, or `0.0` when there is nothing to divide by.
pub fn ratio(num: i64, den: i64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentage of passed evaluations, one decimal. `None` when nothing was evaluated.
pub fn pass_rate(passed: i64, total: i64) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(round1(passed as f64 / total as f64 * 100.0))
    }
}

pub fn provincial_kpis(rows: &[ClubSeasonSummary]) -> ProvincialKpis {
    let active_clubs = rows.iter().map(|r| r.club_id).collect::<BTreeSet<_>>().len() as i64;
    let totals: Counts = rows.iter().map(|r| r.counts).sum();

    ProvincialKpis {
        active_clubs,
        total_skiers: totals.skiers,
        total_coaches: totals.coaches,
        coach_skier_ratio: ratio(totals.coaches, totals.skiers),
        eval_completion: ratio(totals.evaluations_completed, totals.skiers),
        drills_per_coach: ratio(totals.drills_shared, totals.coaches),
    }
}

/// Clubs with the most skiers, largest first; ties by name.
pub fn top_clubs_by_skiers(rows: &[ClubSeasonSummary], limit: usize) -> Vec<ClubSkierTotal> {
    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for r in rows {
        *totals.entry(r.club_name.as_str()).or_default() += r.counts.skiers;
    }

    let mut out: Vec<ClubSkierTotal> = totals
        .into_iter()
        .map(|(name, skier_total)| ClubSkierTotal { club_name: name.to_string(), skier_total })
        .collect();
    out.sort_by(|a, b| b.skier_total.cmp(&a.skier_total).then_with(|| a.club_name.cmp(&b.club_name)));
    out.truncate(limit);
    out
}

/// Evaluations per skier as a percentage, for clubs that have skiers.
pub fn completion_rates(rows: &[ClubSeasonSummary], limit: usize) -> Vec<ClubCompletionRate> {
    let mut totals: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
    for r in rows {
        let entry = totals.entry(r.club_name.as_str()).or_default();
        entry.0 += r.counts.evaluations_completed;
        entry.1 += r.counts.skiers;
    }

    let mut out: Vec<ClubCompletionRate> = totals
        .into_iter()
        .filter(|(_, (_, skiers))| *skiers > 0)
        .map(|(name, (evals_done, skiers))| ClubCompletionRate {
            club_name: name.to_string(),
            evals_done,
            skiers,
            pct: round1(ratio(evals_done, skiers) * 100.0),
        })
        .collect();
    out.sort_by(|a, b| {
        ratio(b.evals_done, b.skiers)
            .total_cmp(&ratio(a.evals_done, a.skiers))
            .then_with(|| a.club_name.cmp(&b.club_name))
    });
    out.truncate(limit);
    out
}

/// Skier totals for each season in `seasons`, zero when a season has no rows.
pub fn skier_trend(rows: &[ClubSeasonSummary], seasons: &[Season]) -> Vec<SeasonTotal> {
    seasons
        .iter()
        .map(|season| SeasonTotal {
            season: *season,
            total_skiers: rows
                .iter()
                .filter(|r| r.season == *season)
                .map(|r| r.counts.skiers)
                .sum(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::ClubStatus;

    fn club(id: i64, name: &str, season: i32, coaches: i64, skiers: i64, evals: i64, drills: i64) -> ClubSeasonSummary {
        ClubSeasonSummary {
            club_id: id,
            season: Season::starting(season),
            club_name: name.into(),
            sr_id: id,
            ptso: Some("BC".into()),
            counts: Counts {
                coaches,
                skiers,
                evaluations_completed: evals,
                drills_shared: drills,
                ..Default::default()
            },
            primary_contact: String::new(),
            primary_contact_email: String::new(),
            status: ClubStatus::Active,
        }
    }

    #[test]
    fn ratio_with_zero_denominator_is_zero() {
        assert_eq!(ratio(5, 0), 0.0);
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(1, 4), 0.25);
    }

    #[test]
    fn pass_rate_rounds_to_one_decimal() {
        assert_eq!(pass_rate(1, 3), Some(33.3));
        assert_eq!(pass_rate(2, 3), Some(66.7));
        assert_eq!(pass_rate(0, 5), Some(0.0));
        assert_eq!(pass_rate(0, 0), None);
    }

    #[test]
    fn provincial_kpis_sum_clubs() {
        let rows = vec![club(1, "A", 2024, 2, 10, 5, 4), club(2, "B", 2024, 2, 10, 15, 0)];
        let kpis = provincial_kpis(&rows);
        assert_eq!(kpis.active_clubs, 2);
        assert_eq!(kpis.total_skiers, 20);
        assert_eq!(kpis.total_coaches, 4);
        assert_eq!(kpis.coach_skier_ratio, 0.2);
        assert_eq!(kpis.eval_completion, 1.0);
        assert_eq!(kpis.drills_per_coach, 1.0);
    }

    #[test]
    fn provincial_kpis_without_skiers_or_coaches() {
        let kpis = provincial_kpis(&[]);
        assert_eq!(kpis.active_clubs, 0);
        assert_eq!(kpis.coach_skier_ratio, 0.0);
        assert_eq!(kpis.eval_completion, 0.0);
        assert_eq!(kpis.drills_per_coach, 0.0);
    }

    #[test]
    fn top_clubs_sorted_and_limited() {
        let rows: Vec<_> = (0..12)
            .map(|i| club(i, &format!("Club {i:02}"), 2024, 1, i, 0, 0))
            .collect();
        let top = top_clubs_by_skiers(&rows, TOP_CLUBS);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].club_name, "Club 11");
        assert_eq!(top[0].skier_total, 11);
        assert_eq!(top[9].skier_total, 2);
    }

    #[test]
    fn completion_rates_skip_clubs_without_skiers() {
        let rows = vec![
            club(1, "A", 2024, 1, 4, 1, 0),
            club(2, "B", 2024, 1, 0, 9, 0),
            club(3, "C", 2024, 1, 3, 3, 0),
        ];
        let rates = completion_rates(&rows, TOP_CLUBS);
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].club_name, "C");
        assert_eq!(rates[0].pct, 100.0);
        assert_eq!(rates[1].club_name, "A");
        assert_eq!(rates[1].pct, 25.0);
    }

    #[test]
    fn trend_fills_missing_seasons_with_zero() {
        let rows = vec![club(1, "A", 2022, 1, 5, 0, 0), club(2, "B", 2024, 1, 7, 0, 0), club(3, "C", 2024, 1, 1, 0, 0)];
        let seasons = Season::starting(2024).trailing(3);
        let trend = skier_trend(&rows, &seasons);
        let totals: Vec<i64> = trend.iter().map(|t| t.total_skiers).collect();
        assert_eq!(totals, vec![5, 0, 8]);
        assert_eq!(trend[2].season, Season::starting(2024));
    }
}

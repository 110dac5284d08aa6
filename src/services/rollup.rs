//! In-process season rollups over fact rows.
//!
//! Club, PTSO and national summaries all go through [`rollup`] with a
//! different grouping key, so summing a lower level always reproduces the
//! level above it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{
    club::{Evaluation, Facts},
    report::{
        ClubSeasonSummary, ClubStatus, Counts, LevelPassRate, NationalSeasonSummary,
        PtsoSeasonSummary, SkierLevelCount,
    },
    season::Season,
    user::{Member, Role},
};
use crate::services::kpi::pass_rate;

/// Where a fact lands in the federation hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct Attribution<'a> {
    pub club_id: Option<i64>,
    pub ptso: Option<&'a str>,
}

pub fn by_club(at: Attribution<'_>) -> Option<i64> {
    at.club_id
}

pub fn by_ptso(at: Attribution<'_>) -> Option<String> {
    at.ptso.map(str::to_string)
}

pub fn national(_: Attribution<'_>) -> Option<()> {
    Some(())
}

/// Counts every fact into its `(season, key)` bucket. Facts whose key is
/// `None` are left out of this level. Buckets are created by whichever fact
/// kind shows up first, so all other counts in them default to zero.
pub fn rollup<K, F>(facts: &Facts, key: F) -> BTreeMap<(Season, K), Counts>
where
    K: Ord,
    F: Fn(Attribution<'_>) -> Option<K>,
{
    let mut out: BTreeMap<(Season, K), Counts> = BTreeMap::new();

    for m in &facts.members {
        let Some(role) = m.role() else { continue };
        let at = Attribution { club_id: m.club_id, ptso: m.ptso.as_deref() };
        let Some(k) = key(at) else { continue };
        let counts = out.entry((Season::from_timestamp(m.created_at), k)).or_default();
        match role {
            Role::Coach => counts.coaches += 1,
            Role::Parent => counts.parents += 1,
            Role::Skier => counts.skiers += 1,
            Role::ClubAdmin | Role::PtsoAdmin | Role::Aca => {}
        }
    }

    for e in &facts.evaluations {
        let at = Attribution { club_id: e.club_id, ptso: e.ptso.as_deref() };
        let Some(k) = key(at) else { continue };
        let counts = out.entry((Season::from_timestamp(e.created_at), k)).or_default();
        counts.evaluations_completed += 1;
        if e.passed {
            counts.evaluations_passed += 1;
        }
    }

    for d in &facts.drill_shares {
        let at = Attribution { club_id: d.club_id, ptso: d.ptso.as_deref() };
        let Some(k) = key(at) else { continue };
        out.entry((Season::from_timestamp(d.created_at), k))
            .or_default()
            .drills_shared += 1;
    }

    // Admin-only buckets carry nothing reportable.
    out.retain(|_, c| *c != Counts::default());
    out
}

/// Earliest-created active coach per (club, season). Ties on `created_at`
/// go to the lower user id.
pub fn primary_contacts(members: &[Member]) -> HashMap<(i64, Season), &Member> {
    let mut contacts: HashMap<(i64, Season), &Member> = HashMap::new();
    for m in members {
        if m.role() != Some(Role::Coach) {
            continue;
        }
        let Some(club_id) = m.club_id else { continue };
        let key = (club_id, Season::from_timestamp(m.created_at));
        contacts
            .entry(key)
            .and_modify(|current| {
                if (m.created_at, m.id) < (current.created_at, current.id) {
                    *current = m;
                }
            })
            .or_insert(m);
    }
    contacts
}

#[derive(Debug, Clone, Default)]
struct ClubInfo {
    name: String,
    ptso: Option<String>,
}

fn club_directory(facts: &Facts) -> HashMap<i64, ClubInfo> {
    let mut dir: HashMap<i64, ClubInfo> = HashMap::new();
    let rows = facts
        .members
        .iter()
        .map(|m| (m.club_id, &m.club_name, &m.ptso))
        .chain(facts.evaluations.iter().map(|e| (e.club_id, &e.club_name, &e.ptso)))
        .chain(facts.drill_shares.iter().map(|d| (d.club_id, &d.club_name, &d.ptso)));
    for (club_id, name, ptso) in rows {
        let Some(id) = club_id else { continue };
        dir.entry(id).or_insert_with(|| ClubInfo {
            name: name.clone().unwrap_or_else(|| format!("Club {id}")),
            ptso: ptso.clone(),
        });
    }
    dir
}

/// One row per (club, season) with any activity, ordered by season then club name.
pub fn club_summaries(facts: &Facts) -> Vec<ClubSeasonSummary> {
    let directory = club_directory(facts);
    let contacts = primary_contacts(&facts.members);

    let mut rows: Vec<ClubSeasonSummary> = rollup(facts, by_club)
        .into_iter()
        .map(|((season, club_id), counts)| {
            let info = directory.get(&club_id).cloned().unwrap_or_default();
            let contact = contacts.get(&(club_id, season));
            let status = if counts.coaches + counts.skiers > 0 {
                ClubStatus::Active
            } else {
                ClubStatus::Inactive
            };
            ClubSeasonSummary {
                club_id,
                season,
                club_name: info.name,
                sr_id: club_id,
                ptso: info.ptso,
                counts,
                primary_contact: contact.map(|c| c.full_name()).unwrap_or_default(),
                primary_contact_email: contact.map(|c| c.email.clone()).unwrap_or_default(),
                status,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        (a.season, &a.club_name, a.club_id).cmp(&(b.season, &b.club_name, b.club_id))
    });
    rows
}

pub fn ptso_summaries(facts: &Facts) -> Vec<PtsoSeasonSummary> {
    let mut clubs_per_ptso: HashMap<(Season, String), BTreeSet<i64>> = HashMap::new();
    for row in club_summaries(facts) {
        if let Some(ptso) = row.ptso {
            clubs_per_ptso.entry((row.season, ptso)).or_default().insert(row.club_id);
        }
    }

    rollup(facts, by_ptso)
        .into_iter()
        .map(|((season, ptso), counts)| {
            let clubs = clubs_per_ptso
                .get(&(season, ptso.clone()))
                .map(|set| set.len() as i64)
                .unwrap_or(0);
            PtsoSeasonSummary { season, ptso, clubs, counts }
        })
        .collect()
}

pub fn national_summaries(facts: &Facts) -> Vec<NationalSeasonSummary> {
    rollup(facts, national)
        .into_iter()
        .map(|((season, ()), counts)| NationalSeasonSummary::new(season, counts))
        .collect()
}

pub const UNKNOWN_LEVEL: &str = "Unknown level";

/// Pass rate per level, ordered by the level's sort order (unsorted last), then
/// id. Evaluations without a level are grouped last as [`UNKNOWN_LEVEL`].
pub fn pass_rates_by_level<'a, I>(evaluations: I) -> Vec<LevelPassRate>
where
    I: IntoIterator<Item = &'a Evaluation>,
{
    type Key = (i32, bool, Option<i64>);
    let mut levels: BTreeMap<Key, (String, i64, i64)> = BTreeMap::new();
    for e in evaluations {
        let sort = e.level_sort.unwrap_or(i32::MAX);
        let key = (sort, e.level_id.is_none(), e.level_id);
        let entry = levels.entry(key).or_insert_with(|| {
            let name = match (&e.level_name, e.level_id) {
                (Some(name), _) => name.clone(),
                (None, Some(id)) => format!("Level {id}"),
                (None, None) => UNKNOWN_LEVEL.to_string(),
            };
            (name, 0, 0)
        });
        entry.1 += 1;
        if e.passed {
            entry.2 += 1;
        }
    }

    levels
        .into_iter()
        .map(|((_, _, level_id), (level_name, total, passed))| LevelPassRate {
            level_id,
            level_name,
            eval_total: total,
            eval_passed: passed,
            pass_pct: pass_rate(passed, total),
        })
        .collect()
}

/// Active skiers with a current level in `season`, per club or summed nationally.
pub fn skier_levels<'a, I>(members: I, season: Season, per_club: bool) -> Vec<SkierLevelCount>
where
    I: IntoIterator<Item = &'a Member>,
{
    type Key = (Option<String>, Option<String>, i32, i64);
    let mut groups: BTreeMap<Key, (String, i64)> = BTreeMap::new();

    for m in members {
        if m.role() != Some(Role::Skier) || Season::from_timestamp(m.created_at) != season {
            continue;
        }
        let Some(level_id) = m.current_level else { continue };
        if per_club && m.club_id.is_none() {
            continue;
        }
        let (club, ptso) = if per_club {
            (m.club_name.clone(), m.ptso.clone())
        } else {
            (None, None)
        };
        let sort = m.level_sort.unwrap_or(i32::MAX);
        let entry = groups.entry((club, ptso, sort, level_id)).or_insert_with(|| {
            let name = m.level_name.clone().unwrap_or_else(|| format!("Level {level_id}"));
            (name, 0)
        });
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((club_name, ptso, _, level_id), (level_name, skier_count))| SkierLevelCount {
            season,
            club_name,
            ptso,
            level_id,
            level_name,
            skier_count,
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::models::club::{DrillShare, Evaluation};
    use crate::models::user::Member;

    pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    pub fn member(id: i64, role: &str, club: Option<(i64, &str, &str)>, created: DateTime<Utc>) -> Member {
        Member {
            id,
            first_name: format!("First{id}"),
            last_name: format!("Last{id}"),
            email: format!("user{id}@example.org"),
            role: role.into(),
            club_id: club.map(|c| c.0),
            club_name: club.map(|c| c.1.to_string()),
            ptso: club.map(|c| c.2.to_string()),
            created_at: created,
            current_level: None,
            level_name: None,
            level_sort: None,
        }
    }

    pub fn evaluation(id: i64, passed: bool, level: i64, club: Option<(i64, &str, &str)>, created: DateTime<Utc>) -> Evaluation {
        Evaluation {
            id,
            created_at: created,
            passed,
            level_id: Some(level),
            level_name: Some(format!("Level {level}")),
            level_sort: Some(level as i32),
            club_id: club.map(|c| c.0),
            club_name: club.map(|c| c.1.to_string()),
            ptso: club.map(|c| c.2.to_string()),
        }
    }

    pub fn drill(id: i64, club: Option<(i64, &str, &str)>, created: DateTime<Utc>) -> DrillShare {
        DrillShare {
            id,
            created_at: created,
            club_id: club.map(|c| c.0),
            club_name: club.map(|c| c.1.to_string()),
            ptso: club.map(|c| c.2.to_string()),
        }
    }
}

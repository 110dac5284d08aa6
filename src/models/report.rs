use serde::{Deserialize, Serialize};

use super::season::Season;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ClubStatus {
    Active,
    Inactive,
}

impl std::fmt::Display for ClubStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClubStatus::Active => write!(f, "Active"),
            ClubStatus::Inactive => write!(f, "Inactive"),
        }
    }
}

impl std::str::FromStr for ClubStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ClubStatus::Active),
            "inactive" => Ok(ClubStatus::Inactive),
            _ => Err(anyhow::anyhow!("Unknown club status: {s}")),
        }
    }
}

/// Per-group tallies. Every field starts at zero, so a group with no skiers
/// reports `skiers = 0` instead of disappearing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub coaches: i64,
    pub parents: i64,
    pub skiers: i64,
    pub evaluations_completed: i64,
    pub evaluations_passed: i64,
    pub drills_shared: i64,
}

impl Counts {
    pub fn evaluations_failed(&self) -> i64 {
        self.evaluations_completed - self.evaluations_passed
    }
}

impl std::ops::AddAssign for Counts {
    fn add_assign(&mut self, rhs: Self) {
        self.coaches += rhs.coaches;
        self.parents += rhs.parents;
        self.skiers += rhs.skiers;
        self.evaluations_completed += rhs.evaluations_completed;
        self.evaluations_passed += rhs.evaluations_passed;
        self.drills_shared += rhs.drills_shared;
    }
}

impl std::iter::Sum for Counts {
    fn sum<I: Iterator<Item = Counts>>(iter: I) -> Self {
        iter.fold(Counts::default(), |mut acc, c| {
            acc += c;
            acc
        })
    }
}

/// Row shape of `vw_club_summary_by_season`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubSeasonSummary {
    pub club_id: i64,
    pub season: Season,
    pub club_name: String,
    pub sr_id: i64,
    pub ptso: Option<String>,
    #[serde(flatten)]
    pub counts: Counts,
    pub primary_contact: String,
    pub primary_contact_email: String,
    pub status: ClubStatus,
}

/// Row shape of `vw_ptso_summary_by_season`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PtsoSeasonSummary {
    pub season: Season,
    pub ptso: String,
    pub clubs: i64,
    #[serde(flatten)]
    pub counts: Counts,
}

/// Row shape of `vw_national_summary_by_season`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalSeasonSummary {
    pub season: Season,
    pub total_coaches: i64,
    pub total_parents: i64,
    pub total_skiers: i64,
    pub evaluations_completed: i64,
    pub evaluations_passed: i64,
    pub drills_shared: i64,
}

impl NationalSeasonSummary {
    pub fn new(season: Season, counts: Counts) -> Self {
        Self {
            season,
            total_coaches: counts.coaches,
            total_parents: counts.parents,
            total_skiers: counts.skiers,
            evaluations_completed: counts.evaluations_completed,
            evaluations_passed: counts.evaluations_passed,
            drills_shared: counts.drills_shared,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelPassRate {
    pub level_id: Option<i64>,
    pub level_name: String,
    pub eval_total: i64,
    pub eval_passed: i64,
    pub pass_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkierLevelCount {
    pub season: Season,
    pub club_name: Option<String>,
    pub ptso: Option<String>,
    pub level_id: i64,
    pub level_name: String,
    pub skier_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvincialKpis {
    pub active_clubs: i64,
    pub total_skiers: i64,
    pub total_coaches: i64,
    pub coach_skier_ratio: f64,
    pub eval_completion: f64,
    pub drills_per_coach: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubSkierTotal {
    pub club_name: String,
    pub skier_total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubCompletionRate {
    pub club_name: String,
    pub evals_done: i64,
    pub skiers: i64,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonTotal {
    pub season: Season,
    pub total_skiers: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    pub ptsos: Vec<String>,
    pub club_names: Vec<String>,
    pub statuses: Vec<ClubStatus>,
}

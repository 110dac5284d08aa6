use serde::Serialize;

use super::report::{
    ClubCompletionRate, ClubSeasonSummary, ClubSkierTotal, FilterOptions, LevelPassRate,
    NationalSeasonSummary, ProvincialKpis, PtsoSeasonSummary, SeasonTotal, SkierLevelCount,
};
use super::season::Season;
use super::user::Role;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    National,
    Ptso,
    Club,
}

impl Page {
    /// Landing page for a role. Parents and skiers have no dashboard.
    pub fn for_role(role: Role) -> Option<Page> {
        match role {
            Role::Aca => Some(Page::National),
            Role::PtsoAdmin => Some(Page::Ptso),
            Role::ClubAdmin | Role::Coach => Some(Page::Club),
            Role::Parent | Role::Skier => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::National => "national",
            Page::Ptso => "ptso",
            Page::Club => "club",
        }
    }
}

/// One widget's worth of data. A failed query only blanks its own section.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Section<T> {
    Ready { data: T },
    Empty { message: String },
    Failed { warning: String },
}

impl<T> Section<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Section::Ready { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Section::Ready { data } => Some(data),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NationalDashboard {
    pub season: Season,
    pub summary: Section<NationalSeasonSummary>,
    pub ptso_breakdown: Section<Vec<PtsoSeasonSummary>>,
    pub pass_rate_by_level: Section<Vec<LevelPassRate>>,
    pub skier_levels: Section<Vec<SkierLevelCount>>,
}

#[derive(Debug, Serialize)]
pub struct PtsoDashboard {
    pub season: Season,
    pub filters: Section<FilterOptions>,
    pub kpis: Section<ProvincialKpis>,
    pub top_clubs: Section<Vec<ClubSkierTotal>>,
    pub eval_completion: Section<Vec<ClubCompletionRate>>,
    pub skier_trend: Section<Vec<SeasonTotal>>,
    pub pass_rate_by_level: Section<Vec<LevelPassRate>>,
    pub clubs: Section<Vec<ClubSeasonSummary>>,
}

#[derive(Debug, Serialize)]
pub struct ClubDashboard {
    pub season: Season,
    pub club_id: i64,
    pub summary: Section<ClubSeasonSummary>,
    pub skier_levels: Section<Vec<SkierLevelCount>>,
    pub pass_rate_by_level: Section<Vec<LevelPassRate>>,
    pub skier_trend: Section<Vec<SeasonTotal>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum Dashboard {
    National(NationalDashboard),
    Ptso(PtsoDashboard),
    Club(ClubDashboard),
}

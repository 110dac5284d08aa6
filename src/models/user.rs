use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Coach,
    #[serde(alias = "guardian")]
    Parent,
    Skier,
    ClubAdmin,
    PtsoAdmin,
    Aca,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Coach,
        Role::Parent,
        Role::Skier,
        Role::ClubAdmin,
        Role::PtsoAdmin,
        Role::Aca,
    ];
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Coach => "coach",
            Role::Parent => "parent",
            Role::Skier => "skier",
            Role::ClubAdmin => "club_admin",
            Role::PtsoAdmin => "ptso_admin",
            Role::Aca => "aca",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Role {
    type Err = anyhow::Error;

    /// Case-insensitive. `guardian` is the legacy name for `parent`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coach" => Ok(Role::Coach),
            "parent" | "guardian" => Ok(Role::Parent),
            "skier" => Ok(Role::Skier),
            "club_admin" => Ok(Role::ClubAdmin),
            "ptso_admin" => Ok(Role::PtsoAdmin),
            "aca" => Ok(Role::Aca),
            _ => Err(anyhow::anyhow!("Unknown role: {s}")),
        }
    }
}

/// An active user with their club affiliation, as loaded for rollups.
/// Role is fetched as TEXT and parsed on use so unknown roles are skipped, not fatal.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub club_id: Option<i64>,
    pub club_name: Option<String>,
    pub ptso: Option<String>,
    pub created_at: DateTime<Utc>,
    pub current_level: Option<i64>,
    pub level_name: Option<String>,
    pub level_sort: Option<i32>,
}

impl Member {
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

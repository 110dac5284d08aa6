use serde::Deserialize;

use super::report::{ClubSeasonSummary, ClubStatus};
use super::season::Season;

/// Raw query string for dashboard and report endpoints. Dropdown values of
/// `"All"` (or empty) mean "no filter".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    pub season: Option<String>,
    pub ptso: Option<String>,
    pub status: Option<String>,
    pub club: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClubFilter {
    pub ptso: Option<String>,
    pub status: Option<ClubStatus>,
    pub club_name: Option<String>,
    pub search: Option<String>,
}

fn selected(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
        .map(str::to_string)
}

impl ReportQuery {
    /// The requested season, or the current one when absent.
    pub fn season(&self) -> anyhow::Result<Season> {
        match selected(&self.season) {
            Some(raw) => Ok(raw.parse()?),
            None => Ok(Season::current()),
        }
    }

    pub fn filter(&self) -> anyhow::Result<ClubFilter> {
        let status = selected(&self.status).map(|s| s.parse::<ClubStatus>()).transpose()?;
        Ok(ClubFilter {
            ptso: selected(&self.ptso),
            status,
            club_name: selected(&self.club),
            search: selected(&self.search).map(|s| s.to_lowercase()),
        })
    }
}

impl ClubFilter {
    pub fn matches(&self, row: &ClubSeasonSummary) -> bool {
        if let Some(ptso) = &self.ptso {
            if row.ptso.as_deref() != Some(ptso.as_str()) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if row.status != status {
                return false;
            }
        }
        if let Some(name) = &self.club_name {
            if &row.club_name != name {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            if !row.club_name.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, rows: Vec<ClubSeasonSummary>) -> Vec<ClubSeasonSummary> {
        rows.into_iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::Counts;

    fn row(name: &str, ptso: &str, status: ClubStatus) -> ClubSeasonSummary {
        ClubSeasonSummary {
            club_id: 1,
            season: Season::starting(2024),
            club_name: name.into(),
            sr_id: 1,
            ptso: Some(ptso.into()),
            counts: Counts::default(),
            primary_contact: String::new(),
            primary_contact_email: String::new(),
            status,
        }
    }

    #[test]
    fn all_means_no_filter() {
        let query = ReportQuery {
            season: Some("2024/2025".into()),
            ptso: Some("All".into()),
            status: Some("all".into()),
            club: Some("".into()),
            search: None,
        };
        assert_eq!(query.filter().unwrap(), ClubFilter::default());
        assert_eq!(query.season().unwrap(), Season::starting(2024));
    }

    #[test]
    fn bad_season_and_status_are_errors() {
        let query = ReportQuery { season: Some("2024-2025".into()), ..Default::default() };
        assert!(query.season().is_err());
        let query = ReportQuery { status: Some("dormant".into()), ..Default::default() };
        assert!(query.filter().is_err());
    }

    #[test]
    fn filters_combine() {
        let filter = ClubFilter {
            ptso: Some("BC".into()),
            status: Some(ClubStatus::Active),
            club_name: None,
            search: Some("whistler".into()),
        };
        assert!(filter.matches(&row("Whistler Mountain Ski Club", "BC", ClubStatus::Active)));
        assert!(!filter.matches(&row("Whistler Mountain Ski Club", "AB", ClubStatus::Active)));
        assert!(!filter.matches(&row("Whistler Mountain Ski Club", "BC", ClubStatus::Inactive)));
        assert!(!filter.matches(&row("Grouse Mountain", "BC", ClubStatus::Active)));
    }

    #[test]
    fn club_name_is_exact() {
        let filter = ClubFilter { club_name: Some("Red Mountain".into()), ..Default::default() };
        assert!(filter.matches(&row("Red Mountain", "BC", ClubStatus::Active)));
        assert!(!filter.matches(&row("Red Mountain Racers", "BC", ClubStatus::Active)));
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// First calendar month of a season (July).
pub const SEASON_START_MONTH: u32 = 7;

const MIN_START_YEAR: i32 = 1900;
const MAX_START_YEAR: i32 = 9998;

/// A July-to-June reporting season, labeled `"2024/2025"`.
///
/// Every place that buckets a timestamp into a season goes through
/// [`Season::from_timestamp`] (in Rust) or [`sql_label`] (in SQL), so the two
/// can never disagree about where a date lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Season {
    start_year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeasonParseError {
    #[error("season must look like YYYY/YYYY, got {0:?}")]
    Format(String),
    #[error("season {0:?} must span consecutive years")]
    NotConsecutive(String),
    #[error("season start year {0} is out of range")]
    OutOfRange(i32),
}

impl Season {
    pub fn starting(start_year: i32) -> Self {
        Self { start_year }
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn end_year(&self) -> i32 {
        self.start_year + 1
    }

    /// July onward belongs to the season starting this year; January to June
    /// belongs to the season that started the year before.
    pub fn from_date(date: NaiveDate) -> Self {
        let year = date.year();
        if date.month() >= SEASON_START_MONTH {
            Self::starting(year)
        } else {
            Self::starting(year - 1)
        }
    }

    /// Buckets a timestamp using its UTC calendar date.
    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        Self::from_date(ts.date_naive())
    }

    pub fn current() -> Self {
        Self::from_timestamp(Utc::now())
    }

    pub fn previous(&self) -> Self {
        Self::starting(self.start_year - 1)
    }

    pub fn next(&self) -> Self {
        Self::starting(self.start_year + 1)
    }

    /// Half-open UTC range `[July 1 start_year, July 1 end_year)`.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (season_start(self.start_year), season_start(self.end_year()))
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        let (start, end) = self.bounds();
        ts >= start && ts < end
    }

    /// The `count` seasons ending with this one, oldest first.
    pub fn trailing(&self, count: usize) -> Vec<Season> {
        let count = count as i32;
        (0..count)
            .rev()
            .map(|back| Self::starting(self.start_year - back))
            .collect()
    }
}

fn season_start(year: i32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, SEASON_START_MONTH, 1)
        .unwrap_or(NaiveDate::MAX)
        .and_time(NaiveTime::default())
        .and_utc()
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start_year, self.end_year())
    }
}

impl FromStr for Season {
    type Err = SeasonParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (start, end) = trimmed
            .split_once('/')
            .ok_or_else(|| SeasonParseError::Format(s.to_string()))?;

        let parse_year = |part: &str| -> Result<i32, SeasonParseError> {
            if part.len() != 4 || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(SeasonParseError::Format(s.to_string()));
            }
            part.parse().map_err(|_| SeasonParseError::Format(s.to_string()))
        };

        let start = parse_year(start)?;
        let end = parse_year(end)?;
        if end != start + 1 {
            return Err(SeasonParseError::NotConsecutive(s.to_string()));
        }
        if !(MIN_START_YEAR..=MAX_START_YEAR).contains(&start) {
            return Err(SeasonParseError::OutOfRange(start));
        }
        Ok(Self::starting(start))
    }
}

impl Serialize for Season {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Season {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// SQL expression for the season start year of a `TIMESTAMPTZ` column.
pub fn sql_start_year(column: &str) -> String {
    format!(
        "(EXTRACT(YEAR FROM ({column} AT TIME ZONE 'UTC'))::INT - \
         CASE WHEN EXTRACT(MONTH FROM ({column} AT TIME ZONE 'UTC')) >= {SEASON_START_MONTH} \
         THEN 0 ELSE 1 END)"
    )
}

/// SQL expression producing the same `"Y/Y+1"` label as [`Season`]'s `Display`.
pub fn sql_label(column: &str) -> String {
    let start = sql_start_year(column);
    format!("CONCAT({start}, '/', {start} + 1)")
}

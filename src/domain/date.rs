use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const DATE_TIME_SECONDS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The day a transaction happened, optionally with a minute-precision time.
///
/// Stored as `YYYY-MM-DD` or `YYYY-MM-DD HH:MM`. The derived ordering compares
/// the date first and sorts a bare date before any time on that day, which is
/// the same order the stored strings sort in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryDate {
    date: NaiveDate,
    time: Option<NaiveTime>,
}

impl EntryDate {
    pub fn from_date(date: NaiveDate) -> Self {
        Self { date, time: None }
    }

    /// Seconds are dropped: entries only carry minute precision.
    pub fn from_date_time(date_time: NaiveDateTime) -> Self {
        let time = date_time.time();
        Self {
            date: date_time.date(),
            time: NaiveTime::from_hms_opt(time.hour(), time.minute(), 0),
        }
    }

    /// Parse `YYYY-MM-DD` or `YYYY-MM-DD HH:MM` (a trailing `:SS` is accepted
    /// and discarded).
    pub fn parse(input: &str) -> Result<Self, ParseDateError> {
        let input = input.trim();

        if let Ok(date) = NaiveDate::parse_from_str(input, DATE_FORMAT) {
            return Ok(Self::from_date(date));
        }

        NaiveDateTime::parse_from_str(input, DATE_TIME_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(input, DATE_TIME_SECONDS_FORMAT))
            .map(Self::from_date_time)
            .map_err(|_| ParseDateError::InvalidDate(input.to_string()))
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time(&self) -> Option<NaiveTime> {
        self.time
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth {
            year: self.date.year(),
            month: self.date.month(),
        }
    }
}

impl fmt::Display for EntryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time {
            Some(time) => write!(
                f,
                "{} {}",
                self.date.format(DATE_FORMAT),
                time.format("%H:%M")
            ),
            None => write!(f, "{}", self.date.format(DATE_FORMAT)),
        }
    }
}

impl FromStr for EntryDate {
    type Err = ParseDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for EntryDate {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl Serialize for EntryDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        EntryDate::parse(&raw).map_err(D::Error::custom)
    }
}

/// A calendar month, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, ParseDateError> {
        if !(0..=9999).contains(&year) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ParseDateError::InvalidYearMonth(format!(
                "{}-{}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    /// Parse user-entered year and month strings. A blank field falls back to
    /// the year/month of `today`; the month may be given as `1` or `01`.
    pub fn parse(year: &str, month: &str, today: NaiveDate) -> Result<Self, ParseDateError> {
        let year = year.trim();
        let month = month.trim();
        let invalid = || ParseDateError::InvalidYearMonth(format!("{}-{}", year, month));

        let year_value = if year.is_empty() {
            today.year()
        } else if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
            year.parse().map_err(|_| invalid())?
        } else {
            return Err(invalid());
        };

        let month_value = if month.is_empty() {
            today.month()
        } else if (1..=2).contains(&month.len()) && month.chars().all(|c| c.is_ascii_digit()) {
            month.parse().map_err(|_| invalid())?
        } else {
            return Err(invalid());
        };

        Self::new(year_value, month_value).map_err(|_| invalid())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn contains(&self, date: &EntryDate) -> bool {
        date.year_month() == *self
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let (year, month) = raw
            .split_once('-')
            .ok_or_else(|| D::Error::custom(format!("invalid year/month '{}'", raw)))?;
        let year: i32 = year.parse().map_err(D::Error::custom)?;
        let month: u32 = month.parse().map_err(D::Error::custom)?;
        YearMonth::new(year, month).map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseDateError {
    InvalidDate(String),
    InvalidYearMonth(String),
}

impl fmt::Display for ParseDateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseDateError::InvalidDate(input) => write!(
                f,
                "invalid date '{}', expected YYYY-MM-DD or YYYY-MM-DD HH:MM",
                input
            ),
            ParseDateError::InvalidYearMonth(input) => {
                write!(f, "invalid year/month '{}'", input)
            }
        }
    }
}

impl std::error::Error for ParseDateError {}

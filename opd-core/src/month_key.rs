//! `Mon-YY` month keys used by the SWR yearly pivot.

use chrono::{Datelike, NaiveDate};
use opd_utils::dates::{
    expand_two_digit_year, mid_month, month_abbreviation, month_from_abbreviation,
    two_digit_year,
};
use opd_utils::error::DateError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A calendar month rendered as `Mon-YY` ("Jan-25").
///
/// Ordering is chronological, so a `BTreeMap<MonthKey, _>` iterates
/// January to December.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn from_date(date: &NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The twelve keys of a calendar year, January first.
    pub fn year_keys(year: i32) -> impl Iterator<Item = MonthKey> {
        (1..=12).map(move |month| MonthKey { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Short month label without the year ("Jan").
    pub fn label(&self) -> &'static str {
        month_abbreviation(self.month).unwrap_or("???")
    }

    /// The same month moved into `year`, when both share the two digit
    /// suffix that `Mon-YY` keeps.
    pub fn in_year(self, year: i32) -> Option<MonthKey> {
        if two_digit_year(self.year) == two_digit_year(year) {
            Some(MonthKey { year, month: self.month })
        } else {
            None
        }
    }

    /// Parse a `Mon-YY` key that belongs to `year`. The suffix must match
    /// the last two digits of `year`; the full year is taken from `year`.
    pub fn parse_in_year(raw: &str, year: i32) -> Result<MonthKey, DateError> {
        let key: MonthKey = raw.parse()?;
        key.in_year(year)
            .ok_or_else(|| DateError(format!("month key '{}' is not in {}", raw.trim(), year)))
    }

    /// The 15th of this month.
    pub fn mid_month(&self) -> NaiveDate {
        // month is validated on construction, day 15 exists in every month
        mid_month(self.year, self.month).unwrap_or_default()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.label(), two_digit_year(self.year))
    }
}

impl FromStr for MonthKey {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (abbr, yy) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| DateError(format!("month key '{}' is not Mon-YY", s)))?;
        let month = month_from_abbreviation(abbr)
            .ok_or_else(|| DateError(format!("unknown month '{}' in '{}'", abbr, s)))?;
        if yy.len() != 2 {
            return Err(DateError(format!("year in '{}' must have two digits", s)));
        }
        let yy: u32 = yy
            .parse()
            .map_err(|_| DateError(format!("bad year in month key '{}'", s)))?;
        Ok(MonthKey {
            year: expand_two_digit_year(yy),
            month,
        })
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn display_and_parse() {
        let key = MonthKey::new(2025, 1).unwrap();
        assert_eq!(key.to_string(), "Jan-25");
        assert_eq!("Jan-25".parse::<MonthKey>().unwrap(), key);
        assert_eq!("dec-09".parse::<MonthKey>().unwrap().to_string(), "Dec-09");
        assert!("Jan-2025".parse::<MonthKey>().is_err());
        assert!("Foo-25".parse::<MonthKey>().is_err());
        assert!("Jan25".parse::<MonthKey>().is_err());
    }

    #[test]
    fn year_keys_are_ordered() {
        let keys: Vec<String> = MonthKey::year_keys(2024).map(|k| k.to_string()).collect();
        assert_eq!(keys.len(), 12);
        assert_eq!(keys.first().map(String::as_str), Some("Jan-24"));
        assert_eq!(keys.last().map(String::as_str), Some("Dec-24"));
    }

    #[test]
    fn from_date_and_mid_month() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 31).unwrap();
        let key = MonthKey::from_date(&date);
        assert_eq!(key.to_string(), "Jul-25");
        assert_eq!(key.mid_month(), NaiveDate::from_ymd_opt(2025, 7, 15).unwrap());
    }

    #[test]
    fn keys_resolve_against_the_selected_year() {
        let feb_99 = MonthKey::parse_in_year("Feb-99", 1999).unwrap();
        assert_eq!(feb_99, MonthKey::new(1999, 2).unwrap());
        assert_eq!(feb_99.to_string(), "Feb-99");
        assert_eq!(
            MonthKey::parse_in_year("Dec-00", 2100).unwrap(),
            MonthKey::new(2100, 12).unwrap()
        );
        assert!(MonthKey::parse_in_year("Feb-98", 1999).is_err());
        assert!(MonthKey::parse_in_year("Feb-1999", 1999).is_err());
        assert_eq!(MonthKey::new(2025, 3).unwrap().in_year(1925), MonthKey::new(1925, 3));
        assert_eq!(MonthKey::new(2025, 3).unwrap().in_year(2024), None);
    }

    #[test]
    fn serializes_as_map_key() {
        let mut map = BTreeMap::new();
        map.insert(MonthKey::new(2025, 3).unwrap(), 1.2);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"Mar-25":1.2}"#);
        let back: BTreeMap<MonthKey, f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}

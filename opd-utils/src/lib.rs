//! Shared utility functions for OPD crates.

/// Date utility functions
pub mod dates {
    use chrono::NaiveDate;

    /// Canonical English month abbreviations, January first.
    pub const MONTH_ABBREVIATIONS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
    }

    /// Parse a backend timestamp, accepting either a plain date or an
    /// RFC 3339 / ISO datetime ("2025-03-15T00:00:00Z"). Only the date part is kept.
    pub fn parse_backend_date(s: &str) -> anyhow::Result<NaiveDate> {
        let trimmed = s.trim();
        let date_part = trimmed.split(['T', ' ']).next().unwrap_or(trimmed);
        parse_date(date_part)
    }

    /// Three-letter abbreviation for a 1-based month number.
    pub fn month_abbreviation(month: u32) -> Option<&'static str> {
        if (1..=12).contains(&month) {
            Some(MONTH_ABBREVIATIONS[(month - 1) as usize])
        } else {
            None
        }
    }

    /// 1-based month number for a three-letter abbreviation (case-insensitive).
    pub fn month_from_abbreviation(abbr: &str) -> Option<u32> {
        MONTH_ABBREVIATIONS
            .iter()
            .position(|m| m.eq_ignore_ascii_case(abbr.trim()))
            .map(|idx| idx as u32 + 1)
    }

    /// Last two digits of a year, e.g. 2025 -> 25.
    pub fn two_digit_year(year: i32) -> u32 {
        year.rem_euclid(100) as u32
    }

    /// Expand a two digit year into the 2000s.
    pub fn expand_two_digit_year(yy: u32) -> i32 {
        2000 + (yy % 100) as i32
    }

    /// The 15th day of the given month. New monthly records are dated here.
    pub fn mid_month(year: i32, month: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, month, 15)
    }

}

/// Error types
pub mod error {
    use std::fmt;

    #[derive(Debug)]
    pub struct DateError(pub String);

    impl fmt::Display for DateError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Date error: {}", self.0)
        }
    }

    impl std::error::Error for DateError {}
}

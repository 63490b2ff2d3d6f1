//! Month bucket keys for the ledger ("Dec-24", "Jan-25", ...).

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A calendar month/year pair used as the ledger's primary bucket key.
///
/// Ordering is chronological (year, then month), so a `BTreeMap` keyed by
/// `MonthKey` iterates buckets in calendar order even when documents are
/// ingested out of sequence. The textual form is `Mon-YY`, matching the
/// durable ledger file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    /// 1-based calendar month.
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

    /// Derive the bucket key for a transaction date. Pure calendar
    /// arithmetic; no timezone involved.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:02}",
            MONTH_ABBREVS[(self.month - 1) as usize],
            self.year.rem_euclid(100)
        )
    }
}

impl FromStr for MonthKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (abbrev, yy) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("invalid month key: {s}"))?;

        let month = MONTH_ABBREVS
            .iter()
            .position(|m| m.eq_ignore_ascii_case(abbrev))
            .ok_or_else(|| format!("invalid month abbreviation: {abbrev}"))?
            as u32
            + 1;

        let yy: i32 = yy
            .parse()
            .map_err(|_| format!("invalid two-digit year: {yy}"))?;
        if !(0..=99).contains(&yy) {
            return Err(format!("invalid two-digit year: {yy}"));
        }

        // Same pivot strftime-era tooling uses: 00-68 => 2000s, 69-99 => 1900s.
        let year = if yy < 69 { 2000 + yy } else { 1900 + yy };

        Ok(Self { year, month })
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

//! The normalized statement-line record stored in the ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::month::MonthKey;

/// One statement line, validated and immutable once built.
///
/// Serialized with the durable ledger file's exact field names and a
/// `DD-MM-YYYY` date. `deposit`/`withdrawal`/`balance` keep the
/// null-vs-zero distinction: `None` is "not reported on this line",
/// `Some(0.0)` is a recorded zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "Date", with = "date_format")]
    pub date: NaiveDate,
    #[serde(rename = "Particulars", default)]
    pub particulars: String,
    #[serde(rename = "Deposit")]
    pub deposit: Option<f64>,
    #[serde(rename = "Withdrawal")]
    pub withdrawal: Option<f64>,
    #[serde(rename = "Balance")]
    pub balance: Option<f64>,
}

impl Transaction {
    /// The ledger bucket this transaction belongs to.
    pub fn month_key(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }
}

/// Serde adapter for statement-style `DD-MM-YYYY` dates.
pub mod date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub const FORMAT: &str = "%d-%m-%Y";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&s, FORMAT).map_err(de::Error::custom)
    }
}

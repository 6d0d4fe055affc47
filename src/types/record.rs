//! The raw daily observations as delivered by a series source.

use crate::types::partition::PartitionKey;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A single daily observation from a source document.
///
/// Source documents are JSON arrays of `{"t": "YYYY-MM-DD", "v": number}`
/// objects in no particular order.
///
/// # Examples
///
/// ```
/// use meteochart::RawRecord;
///
/// let records: Vec<RawRecord> =
///     serde_json::from_str(r#"[{"t": "1881-01-01", "v": -7.3}]"#).unwrap();
/// assert_eq!(records[0].value, -7.3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "t")]
    pub date: NaiveDate,
    #[serde(rename = "v")]
    pub value: f64,
}

impl RawRecord {
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey::of_date(self.date)
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }
}

use crate::utils::days_in_month;
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Identifies one store partition: the days of a single month of a single year.
///
/// The dataset is implied by the store the key is used with. Displays as
/// `"{year}_{zero-padded month}"`, which is also the partition's name on disk.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct PartitionKey {
    year: i32,
    month: u32,
}

impl PartitionKey {
    /// Returns `None` unless `month` is in `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The partition a calendar date falls into.
    pub fn of_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// Number of days in this month, leap years included.
    pub fn days(self) -> u32 {
        // month is validated on construction
        days_in_month(self.year, self.month).unwrap_or(0)
    }

    /// The twelve partitions of `year`, January first.
    pub fn months_of(year: i32) -> impl Iterator<Item = PartitionKey> {
        (1..=12).map(move |month| PartitionKey { year, month })
    }
}

impl Display for PartitionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_name_is_zero_padded() {
        let key = PartitionKey::new(1881, 3).unwrap();
        assert_eq!(key.to_string(), "1881_03");
        assert_eq!(PartitionKey::new(2006, 12).unwrap().to_string(), "2006_12");
        assert!(PartitionKey::new(2006, 0).is_none());
    }

    #[test]
    fn test_months_of_year_in_order() {
        let months: Vec<u32> = PartitionKey::months_of(1900).map(|k| k.month()).collect();
        assert_eq!(months, (1..=12).collect::<Vec<_>>());
        let days: u32 = PartitionKey::months_of(1900).map(|k| k.days()).sum();
        assert_eq!(days, 365);
    }
}

//! Defines the two historical series that can be charted and how each one is
//! combined when several days fall into one chart point.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the daily time series available for charting.
///
/// The dataset decides both where the raw data lives (see [`Dataset::path_segment`])
/// and how daily values are folded into a group: temperatures are averaged,
/// precipitation is summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    /// Daily mean temperature. Groups hold the arithmetic mean of their days.
    Temperature,
    /// Daily precipitation. Groups hold the sum of their days and are always yearly.
    Precipitation,
}

impl Dataset {
    /// All known datasets, in selector order.
    pub const ALL: [Dataset; 2] = [Dataset::Temperature, Dataset::Precipitation];

    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            Dataset::Temperature => "temperature",
            Dataset::Precipitation => "precipitation",
        }
    }

    /// Name of the source document for this dataset, e.g. `temperature.json`.
    pub(crate) fn source_file_name(&self) -> String {
        format!("{}.json", self.path_segment())
    }

    /// Folds the values of one group into the single value plotted for it.
    ///
    /// Returns `None` for an empty group, since neither a mean nor a
    /// meaningful sum exists for it.
    pub fn combine(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        match self {
            Dataset::Temperature => Some(sum / values.len() as f64),
            Dataset::Precipitation => Some(sum),
        }
    }
}

/// Formats a `Dataset` using its path segment.
///
/// # Examples
///
/// ```
/// use meteochart::Dataset;
///
/// assert_eq!(Dataset::Temperature.to_string(), "temperature");
/// assert_eq!(format!("{}", Dataset::Precipitation), "precipitation");
/// ```
impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

/// Error returned when a selector string names no known dataset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dataset selector '{0}'")]
pub struct UnknownDataset(pub String);

impl FromStr for Dataset {
    type Err = UnknownDataset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dataset::ALL
            .into_iter()
            .find(|dataset| dataset.path_segment() == s)
            .ok_or_else(|| UnknownDataset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_selectors() {
        assert_eq!("temperature".parse(), Ok(Dataset::Temperature));
        assert_eq!("precipitation".parse(), Ok(Dataset::Precipitation));
        assert_eq!(
            "Temperature".parse::<Dataset>(),
            Err(UnknownDataset("Temperature".to_string()))
        );
    }

    #[test]
    fn test_combine_mean_and_sum() {
        let values = [1.0, 2.0, 6.0];
        assert_eq!(Dataset::Temperature.combine(&values), Some(3.0));
        assert_eq!(Dataset::Precipitation.combine(&values), Some(9.0));
        assert_eq!(Dataset::Temperature.combine(&[]), None);
    }
}

//! Messages exchanged between the UI side and a worker context.
//!
//! Every message serialises to a single JSON line of the form
//! `{"action": "...", "data": ...}`.

use crate::engine::axis::AxisMarker;
use crate::types::bounds::{Viewport, YearBounds, YearRange};
use crate::types::dataset::Dataset;
use crate::worker::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Worker to UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "kebab-case")]
pub enum WorkerMessage {
    /// The cache check (and fill, if one was needed) is complete.
    BaseOk,
    /// Discard everything drawn so far.
    Clear,
    /// Flat `x, y, x, y, ...` sequence continuing the current polyline.
    Draw(Vec<f64>),
    DrawAxis(Vec<AxisMarker>),
    /// The run is complete.
    DrawFinish,
    /// Store or fetch failure. No further messages follow for this request.
    Failed(WorkerFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    StoreUnavailable,
    FetchFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl WorkerMessage {
    /// Renders the message as one line of JSON, without the trailing newline.
    ///
    /// # Examples
    ///
    /// ```
    /// use meteochart::WorkerMessage;
    ///
    /// assert_eq!(WorkerMessage::BaseOk.to_line(), r#"{"action":"base-ok"}"#);
    /// assert_eq!(
    ///     WorkerMessage::Draw(vec![0.0, 1.5]).to_line(),
    ///     r#"{"action":"draw","data":[0.0,1.5]}"#
    /// );
    /// ```
    pub fn to_line(&self) -> String {
        // every variant holds plain data, so this cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim_end())
    }
}

/// UI to worker: draw `dataset` from `year_from` to `year_to` on a surface
/// of `width` x `height` pixels.
///
/// The year bounds travel as the raw selector text and are only interpreted
/// by [`ComputeRequest::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRequest {
    pub dataset: String,
    pub year_from: String,
    pub year_to: String,
    pub width: u32,
    pub height: u32,
}

/// A request that passed validation, clamped to the dataset bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidRequest {
    pub dataset: Dataset,
    pub range: YearRange,
    pub viewport: Viewport,
}

impl ComputeRequest {
    pub fn new(dataset: Dataset, from: i32, to: i32, viewport: Viewport) -> Self {
        Self {
            dataset: dataset.to_string(),
            year_from: from.to_string(),
            year_to: to.to_string(),
            width: viewport.width,
            height: viewport.height,
        }
    }

    /// Checks the request against `bounds` and clamps it into them.
    ///
    /// # Errors
    ///
    /// Rejects an unknown dataset, bounds that are not numbers, a reversed
    /// range, and a range sharing no year with `bounds`.
    ///
    /// # Examples
    ///
    /// ```
    /// use meteochart::{ComputeRequest, Dataset, Viewport, YearBounds, YearRange};
    ///
    /// let bounds = YearBounds::default();
    /// let request = ComputeRequest::new(Dataset::Temperature, 1850, 1890, Viewport::new(800, 200));
    /// let valid = request.validate(bounds).unwrap();
    /// assert_eq!(valid.range, YearRange { from: 1881, to: 1890 });
    ///
    /// let beyond = ComputeRequest::new(Dataset::Temperature, 2010, 2020, Viewport::new(800, 200));
    /// assert!(beyond.validate(bounds).is_err());
    /// ```
    pub fn validate(&self, bounds: YearBounds) -> Result<ValidRequest, ValidationError> {
        let dataset: Dataset = self
            .dataset
            .parse()
            .map_err(|_| ValidationError::UnknownDataset(self.dataset.clone()))?;
        let from = parse_year(&self.year_from)?;
        let to = parse_year(&self.year_to)?;
        if from > to {
            return Err(ValidationError::Reversed { from, to });
        }
        if !bounds.intersects(from, to) {
            return Err(ValidationError::OutOfBounds {
                from,
                to,
                min_year: bounds.min_year(),
                max_year: bounds.max_year(),
            });
        }
        Ok(ValidRequest {
            dataset,
            range: bounds.clamp(from, to),
            viewport: Viewport::new(self.width, self.height),
        })
    }
}

fn parse_year(text: &str) -> Result<i32, ValidationError> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| ValidationError::NotANumber(text.to_string()))?;
    if !value.is_finite() {
        return Err(ValidationError::NotANumber(text.to_string()));
    }
    // fractional years fall back to the year they start in
    Ok(value.floor().clamp(i32::MIN as f64, i32::MAX as f64) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(dataset: &str, from: &str, to: &str) -> ComputeRequest {
        ComputeRequest {
            dataset: dataset.to_string(),
            year_from: from.to_string(),
            year_to: to.to_string(),
            width: 800,
            height: 200,
        }
    }

    #[test]
    fn test_validation_rejections() {
        let bounds = YearBounds::default();
        assert_eq!(
            request("snow", "1900", "1901").validate(bounds),
            Err(ValidationError::UnknownDataset("snow".to_string()))
        );
        assert_eq!(
            request("temperature", "abc", "1901").validate(bounds),
            Err(ValidationError::NotANumber("abc".to_string()))
        );
        assert_eq!(
            request("temperature", "1900", "NaN").validate(bounds),
            Err(ValidationError::NotANumber("NaN".to_string()))
        );
        assert_eq!(
            request("precipitation", "1950", "1940").validate(bounds),
            Err(ValidationError::Reversed {
                from: 1950,
                to: 1940
            })
        );
        assert!(matches!(
            request("temperature", "2010", "2020").validate(bounds),
            Err(ValidationError::OutOfBounds { .. })
        ));
        assert!(matches!(
            request("temperature", "1700", "1880").validate(bounds),
            Err(ValidationError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_valid_request_is_clamped() {
        let valid = request("precipitation", "1870", "2100")
            .validate(YearBounds::default())
            .unwrap();
        assert_eq!(valid.dataset, Dataset::Precipitation);
        assert_eq!(valid.range, YearRange { from: 1881, to: 2006 });
        assert_eq!(valid.viewport, Viewport::new(800, 200));

        let edge = request("temperature", "2006", "2006")
            .validate(YearBounds::default())
            .unwrap();
        assert_eq!(edge.range.year_count(), 1);
    }

    #[test]
    fn test_message_lines() -> Result<(), serde_json::Error> {
        assert_eq!(WorkerMessage::DrawFinish.to_line(), r#"{"action":"draw-finish"}"#);

        let axis = WorkerMessage::DrawAxis(vec![
            AxisMarker::Value { value: 10, y: 5.0 },
            AxisMarker::Year { year: 1990, x: 100.0 },
        ]);
        assert_eq!(
            axis.to_line(),
            r#"{"action":"draw-axis","data":[{"axis":"value","value":10,"y":5.0},{"axis":"year","year":1990,"x":100.0}]}"#
        );

        let failed = WorkerMessage::from_line(
            "{\"action\":\"failed\",\"data\":{\"kind\":\"fetch-failed\",\"message\":\"HTTP 404\"}}\n",
        )?;
        assert_eq!(
            failed,
            WorkerMessage::Failed(WorkerFailure {
                kind: FailureKind::FetchFailed,
                message: "HTTP 404".to_string()
            })
        );
        Ok(())
    }
}

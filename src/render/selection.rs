use crate::types::bounds::{Viewport, YearBounds};
use crate::types::dataset::Dataset;
use crate::worker::protocol::ComputeRequest;

/// A change made through the UI controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    SelectDataset(Dataset),
    /// New text of the "from" year selector.
    SelectFrom(String),
    /// New text of the "to" year selector.
    SelectTo(String),
    Shutdown,
}

/// What the user currently has selected.
///
/// Years are kept as the selector text; they are interpreted only when a
/// request is validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSelection {
    pub dataset: Dataset,
    pub from: String,
    pub to: String,
}

impl ChartSelection {
    /// Temperature over the full range of `bounds`.
    pub fn new(bounds: YearBounds) -> Self {
        Self {
            dataset: Dataset::Temperature,
            from: bounds.min_year().to_string(),
            to: bounds.max_year().to_string(),
        }
    }

    /// Applies `event` and reports whether the selection actually changed.
    /// Selecting the value that is already selected is not a change.
    pub fn apply(&mut self, event: UiEvent) -> bool {
        match event {
            UiEvent::SelectDataset(dataset) => replace_if_changed(&mut self.dataset, dataset),
            UiEvent::SelectFrom(from) => replace_if_changed(&mut self.from, from),
            UiEvent::SelectTo(to) => replace_if_changed(&mut self.to, to),
            UiEvent::Shutdown => false,
        }
    }

    pub fn to_request(&self, viewport: Viewport) -> ComputeRequest {
        ComputeRequest {
            dataset: self.dataset.to_string(),
            year_from: self.from.clone(),
            year_to: self.to.clone(),
            width: viewport.width,
            height: viewport.height,
        }
    }
}

impl Default for ChartSelection {
    fn default() -> Self {
        Self::new(YearBounds::default())
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_real_changes_count() {
        let mut selection = ChartSelection::default();
        assert_eq!(selection.from, "1881");
        assert_eq!(selection.to, "2006");

        assert!(!selection.apply(UiEvent::SelectDataset(Dataset::Temperature)));
        assert!(selection.apply(UiEvent::SelectDataset(Dataset::Precipitation)));
        assert!(!selection.apply(UiEvent::SelectTo("2006".to_string())));
        assert!(selection.apply(UiEvent::SelectFrom("1990".to_string())));
        assert!(!selection.apply(UiEvent::Shutdown));

        let request = selection.to_request(Viewport::new(800, 200));
        assert_eq!(request.dataset, "precipitation");
        assert_eq!(request.year_from, "1990");
        assert_eq!(request.year_to, "2006");
        assert_eq!(request.width, 800);
    }
}

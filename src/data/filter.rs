use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{SalesDataset, SalesRecord};

// ---------------------------------------------------------------------------
// Filter predicate: date window plus selected categories and regions
// ---------------------------------------------------------------------------

/// The user's current selection.
///
/// An empty category or region set means nothing is selected, so nothing
/// passes. `date_range = None` disables the date predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub categories: BTreeSet<String>,
    pub regions: BTreeSet<String>,
}

impl FilterState {
    /// Whether `rec` passes every active predicate. Both date bounds are
    /// inclusive; an inverted range matches nothing.
    pub fn matches(&self, rec: &SalesRecord) -> bool {
        if let Some((from, to)) = self.date_range {
            if rec.date < from || rec.date > to {
                return false;
            }
        }
        self.categories.contains(&rec.category) && self.regions.contains(&rec.region)
    }

    pub fn is_date_range_inverted(&self) -> bool {
        matches!(self.date_range, Some((from, to)) if from > to)
    }
}

/// Initialise a [`FilterState`] with everything selected (i.e., show all).
pub fn init_filter_state(dataset: &SalesDataset) -> FilterState {
    FilterState {
        date_range: dataset.date_bounds,
        categories: dataset.categories.iter().cloned().collect(),
        regions: dataset.regions.iter().cloned().collect(),
    }
}

/// Return indices of records that pass the filters, in ascending order.
pub fn filtered_indices(dataset: &SalesDataset, filters: &FilterState) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| filters.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

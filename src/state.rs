use std::path::PathBuf;

use chrono::NaiveDate;

use crate::color::ColorMap;
use crate::data::aggregate::DashboardView;
use crate::data::filter::{filtered_indices, init_filter_state, FilterState};
use crate::data::model::{SalesDataset, SalesRecord};

// ---------------------------------------------------------------------------
// View options
// ---------------------------------------------------------------------------

/// What the data table at the bottom of the dashboard shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// One row per (date, category, region).
    #[default]
    Summary,
    /// Every visible record.
    Detail,
}

/// Tabs of the detailed-analysis section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalysisTab {
    #[default]
    ByRegion,
    TopProducts,
    Margins,
}

/// The multi-select filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Category,
    Region,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until a file or sample is loaded).
    pub dataset: Option<SalesDataset>,

    /// Date, category and region selections.
    pub filters: FilterState,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Aggregates over `visible_indices` (cached).
    pub view: Option<DashboardView>,

    pub view_mode: ViewMode,
    pub analysis_tab: AnalysisTab,

    pub category_colors: Option<ColorMap>,
    pub region_colors: Option<ColorMap>,

    /// Error message shown in the UI.
    pub status_message: Option<String>,

    /// Non-fatal notice, e.g. that sample data replaced a missing file.
    pub warning: Option<String>,

    /// Where the export dialog starts.
    pub export_dir: Option<PathBuf>,
}

impl AppState {
    /// Ingest a newly loaded dataset, initialise filters and colours.
    pub fn set_dataset(&mut self, dataset: SalesDataset) {
        self.filters = init_filter_state(&dataset);
        self.category_colors = Some(ColorMap::new(&dataset.categories));
        self.region_colors = Some(ColorMap::new(&dataset.regions));

        self.dataset = Some(dataset);
        self.status_message = None;
        self.warning = None;
        self.refilter();
    }

    /// Recompute `visible_indices` and the cached view after a filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.filters);
            self.view = Some(DashboardView::build(ds, &self.visible_indices));
            log::debug!(
                "filters matched {} of {} records",
                self.visible_indices.len(),
                ds.len()
            );
        }
    }

    /// Records passing the current filters, in dataset order.
    pub fn visible_records(&self) -> impl Iterator<Item = &SalesRecord> {
        let records = self.dataset.as_ref().map(|ds| ds.records.as_slice()).unwrap_or(&[]);
        self.visible_indices.iter().map(move |&i| &records[i])
    }

    fn selection_mut(&mut self, field: FilterField) -> &mut std::collections::BTreeSet<String> {
        match field {
            FilterField::Category => &mut self.filters.categories,
            FilterField::Region => &mut self.filters.regions,
        }
    }

    pub fn is_selected(&self, field: FilterField, value: &str) -> bool {
        match field {
            FilterField::Category => self.filters.categories.contains(value),
            FilterField::Region => self.filters.regions.contains(value),
        }
    }

    /// Options offered for `field`, in first-appearance order.
    pub fn options(&self, field: FilterField) -> &[String] {
        match (&self.dataset, field) {
            (Some(ds), FilterField::Category) => &ds.categories,
            (Some(ds), FilterField::Region) => &ds.regions,
            (None, _) => &[],
        }
    }

    /// Toggle a single value in a multi-select filter.
    pub fn toggle_filter_value(&mut self, field: FilterField, value: &str) {
        let selected = self.selection_mut(field);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select all values of a multi-select filter.
    pub fn select_all(&mut self, field: FilterField) {
        let all: Vec<String> = self.options(field).to_vec();
        self.selection_mut(field).extend(all);
        self.refilter();
    }

    /// Deselect all values of a multi-select filter.
    pub fn select_none(&mut self, field: FilterField) {
        self.selection_mut(field).clear();
        self.refilter();
    }

    /// Set the date window. Both bounds are clamped into the dataset's range.
    pub fn set_date_range(&mut self, from: NaiveDate, to: NaiveDate) {
        let clamp = |d: NaiveDate| match self.dataset.as_ref().and_then(|ds| ds.date_bounds) {
            Some((lo, hi)) => d.clamp(lo, hi),
            None => d,
        };
        let range = Some((clamp(from), clamp(to)));
        if range != self.filters.date_range {
            self.filters.date_range = range;
            self.refilter();
        }
    }

    /// Reset the date window to the full dataset range.
    pub fn reset_date_range(&mut self) {
        if let Some(bounds) = self.dataset.as_ref().and_then(|ds| ds.date_bounds) {
            self.set_date_range(bounds.0, bounds.1);
        }
    }
}

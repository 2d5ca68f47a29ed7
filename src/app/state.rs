// SuburbExplorer - app/state.rs
//
// Explorer session state. Holds the sheet names, active table, filter
// criteria, chart focus, and detail-table sort.
// Owned by the front end; turned into a `DashboardRequest` each cycle.

use crate::app::dashboard::DashboardRequest;
use crate::core::export::SortKey;
use crate::core::filter::{FilterCriteria, ValueRange};
use crate::core::loader::SheetNames;
use crate::core::model::{Granularity, Metric, TableKind};

/// Top-level explorer state.
#[derive(Debug)]
pub struct ExplorerState {
    /// Sheet names to read from the workbook.
    pub sheets: SheetNames,

    /// Table the dashboard is showing.
    pub table: TableKind,

    /// Current filter configuration.
    pub criteria: FilterCriteria,

    /// Entity shown on the radar chart.
    pub radar_target: Option<String>,

    /// Metric examined by the distribution chart.
    pub focus_metric: Metric,

    /// Sort of the detail table and export.
    pub sort: Option<SortKey>,

    /// Status message for the status line.
    pub status_message: String,

    /// Non-fatal config warnings, carried into every snapshot.
    pub warnings: Vec<String>,
}

impl ExplorerState {
    pub fn new(sheets: SheetNames) -> Self {
        Self {
            sheets,
            table: TableKind::default(),
            criteria: FilterCriteria::default(),
            radar_target: None,
            focus_metric: Metric::default(),
            sort: None,
            status_message: "Ready. Open a workbook to begin.".to_string(),
            warnings: Vec::new(),
        }
    }

    /// Switch the selection level. A selection made at another level means
    /// nothing at the new one, so it is cleared.
    pub fn set_granularity(&mut self, granularity: Granularity) {
        if self.criteria.granularity != granularity {
            self.criteria.granularity = granularity;
            self.criteria.selected.clear();
        }
    }

    /// Add every value to the selection. Values already selected stay.
    pub fn select<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.criteria
            .selected
            .extend(values.into_iter().map(Into::into));
    }

    /// Add `value` to the selection, or remove it if already selected.
    pub fn toggle_selection(&mut self, value: &str) {
        if !self.criteria.selected.remove(value) {
            self.criteria.selected.insert(value.to_string());
        }
    }

    /// Set the price range from optional bounds. A missing or non-finite
    /// bound is open.
    pub fn set_price_bounds(&mut self, min: Option<f64>, max: Option<f64>) {
        self.criteria.price_range = range_from_bounds(min, max);
    }

    /// Set the yield range from optional bounds. A missing or non-finite
    /// bound is open.
    pub fn set_yield_bounds(&mut self, min: Option<f64>, max: Option<f64>) {
        self.criteria.yield_range = range_from_bounds(min, max);
    }

    /// The request for the next dashboard cycle.
    pub fn request(&self) -> DashboardRequest {
        DashboardRequest {
            table: self.table,
            criteria: self.criteria.clone(),
            radar: self.radar_target.clone(),
            metric: self.focus_metric,
            sort: self.sort,
            config_warnings: self.warnings.clone(),
        }
    }

    /// Reset filters and chart focus, keeping the sheets and table.
    pub fn clear_filters(&mut self) {
        self.criteria = FilterCriteria::default();
        self.radar_target = None;
        self.sort = None;
        self.status_message = "Filters cleared.".to_string();
    }
}

fn range_from_bounds(min: Option<f64>, max: Option<f64>) -> Option<ValueRange> {
    match (min.filter(|v| v.is_finite()), max.filter(|v| v.is_finite())) {
        (None, None) => None,
        (lo, hi) => Some(ValueRange::new(
            lo.unwrap_or(f64::NEG_INFINITY),
            hi.unwrap_or(f64::INFINITY),
        )),
    }
}

// SuburbExplorer - core/filter.rs
//
// Filter engine for region and suburb tables.
// The identifier selection and both numeric ranges are AND-combined.
// Core layer: pure logic, no I/O.

use crate::core::model::{Granularity, Metric, Record, Table};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Inclusive numeric interval. An infinite bound is open and is left out
/// of the serialised form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    #[serde(skip_serializing_if = "is_open")]
    pub min: f64,
    #[serde(skip_serializing_if = "is_open")]
    pub max: f64,
}

impl ValueRange {
    /// Build a range, swapping the bounds if they arrive reversed.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

fn is_open(bound: &f64) -> bool {
    !bound.is_finite()
}

/// Complete filter state. All parts are AND-combined when applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterCriteria {
    /// Level the selection applies to.
    pub granularity: Granularity,

    /// Identifiers to include (empty = all).
    pub selected: BTreeSet<String>,

    /// Inclusive bounds on the median price. None = no price filter.
    pub price_range: Option<ValueRange>,

    /// Inclusive bounds on the yield. None = no yield filter.
    pub yield_range: Option<ValueRange>,
}

impl FilterCriteria {
    /// Returns true if no filters are active.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.price_range.is_none() && self.yield_range.is_none()
    }

    /// Criteria selecting the given identifiers at one granularity.
    pub fn select<I, S>(granularity: Granularity, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granularity,
            selected: values.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Non-fatal conditions attached to a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewWarning {
    /// No row passed the filters.
    EmptyView,
    /// A suburb selection was ignored because the table has no membership
    /// data; the selection step passed every row.
    NoSuburbIndex,
}

impl fmt::Display for ViewWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyView => f.write_str("No rows match the current filters"),
            Self::NoSuburbIndex => f.write_str(
                "Suburb filter ignored: the sheet has no suburb membership column",
            ),
        }
    }
}

/// Read-only subset of one source table, in table order.
///
/// Holds indices into the table rather than copies, so deriving a view is
/// cheap and the source rows are never touched.
#[derive(Debug, Clone)]
pub struct FilteredView<'a, R> {
    table: &'a Table<R>,
    indices: Vec<usize>,
    warnings: Vec<ViewWarning>,
}

impl<'a, R: Record> FilteredView<'a, R> {
    /// A view over every row of `table`.
    pub fn all(table: &'a Table<R>) -> Self {
        let mut warnings = Vec::new();
        if table.is_empty() {
            warnings.push(ViewWarning::EmptyView);
        }
        Self {
            table,
            indices: (0..table.len()).collect(),
            warnings,
        }
    }

    /// Rows of the view, in source table order.
    pub fn rows(&self) -> impl Iterator<Item = &'a R> + '_ {
        let table = self.table;
        self.indices.iter().filter_map(move |&i| table.get(i))
    }

    /// Indices into the source table.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn table(&self) -> &'a Table<R> {
        self.table
    }

    pub fn warnings(&self) -> &[ViewWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Apply `criteria` to `table`, returning a fresh view.
///
/// The same table and criteria always produce the same rows in the same
/// order; the engine never re-sorts.
pub fn apply<'a, R: Record>(
    table: &'a Table<R>,
    criteria: &FilterCriteria,
) -> FilteredView<'a, R> {
    let mut warnings = Vec::new();

    let mut use_selection = !criteria.selected.is_empty();
    if use_selection && criteria.granularity == Granularity::Suburb && !table.has_membership() {
        tracing::warn!(
            table = R::TABLE,
            selected = criteria.selected.len(),
            "Suburb filter requested but the table has no membership data; ignoring selection"
        );
        warnings.push(ViewWarning::NoSuburbIndex);
        use_selection = false;
    }

    let indices: Vec<usize> = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| !use_selection || matches_selection(*row, criteria))
        .filter(|(_, row)| matches_ranges(*row, criteria))
        .map(|(idx, _)| idx)
        .collect();

    if indices.is_empty() {
        warnings.push(ViewWarning::EmptyView);
    }

    tracing::debug!(
        table = R::TABLE,
        granularity = %criteria.granularity,
        selected = criteria.selected.len(),
        total = table.len(),
        matched = indices.len(),
        "Filters applied"
    );

    FilteredView {
        table,
        indices,
        warnings,
    }
}

/// Check a row against a non-empty identifier selection.
fn matches_selection<R: Record>(row: &R, criteria: &FilterCriteria) -> bool {
    match criteria.granularity {
        // Exact token match against the split membership list, so that
        // "Spring" never selects a region that only lists "Springvale".
        Granularity::Suburb => row
            .members()
            .iter()
            .any(|member| criteria.selected.contains(member)),
        level => row
            .identifier(level)
            .is_some_and(|id| criteria.selected.contains(id)),
    }
}

/// Check a row against both ranges. Rows missing a ranged value are out.
fn matches_ranges<R: Record>(row: &R, criteria: &FilterCriteria) -> bool {
    in_range(row.metric(Metric::Median), criteria.price_range)
        && in_range(row.metric(Metric::Yield), criteria.yield_range)
}

fn in_range(value: Option<f64>, range: Option<ValueRange>) -> bool {
    match (range, value) {
        (None, _) => true,
        (Some(r), Some(v)) => r.contains(v),
        (Some(_), None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{
        split_members, Metrics, RegionRecord, RegionTable, SuburbRecord, SuburbTable,
    };

    fn region(
        name: &str,
        parent: &str,
        median: Option<f64>,
        yld: Option<f64>,
        suburbs: &str,
    ) -> RegionRecord {
        let mut metrics = Metrics::default();
        metrics.set(Metric::Median, median);
        metrics.set(Metric::Yield, yld);
        RegionRecord {
            name: name.to_string(),
            parent: parent.to_string(),
            metrics,
            suburbs: split_members(suburbs),
        }
    }

    fn sample_table() -> RegionTable {
        RegionTable::new(
            vec![],
            vec![
                region(
                    "Belconnen",
                    "Capital Region",
                    Some(720_000.0),
                    Some(4.1),
                    "Page, Bruce, Springvale",
                ),
                region("Gungahlin", "Capital Region", Some(650_000.0), None, "Amaroo, Ngunnawal"),
                region("Queanbeyan", "Southern Highlands", None, Some(3.9), "Spring Range"),
                region("Goulburn", "Southern Highlands", Some(480_000.0), Some(5.2), "Spring"),
            ],
        )
    }

    #[test]
    fn test_empty_filter_returns_all() {
        let table = sample_table();
        let view = apply(&table, &FilterCriteria::default());
        assert_eq!(view.indices(), &[0, 1, 2, 3]);
        assert!(view.warnings().is_empty());
    }

    #[test]
    fn test_empty_selection_is_no_filter_at_every_level() {
        let table = sample_table();
        for granularity in [Granularity::Region, Granularity::SubRegion, Granularity::Suburb] {
            let criteria = FilterCriteria {
                granularity,
                ..Default::default()
            };
            assert_eq!(apply(&table, &criteria).len(), 4, "{granularity}");
        }
    }

    #[test]
    fn test_region_selection_matches_parent() {
        let table = sample_table();
        let view = apply(
            &table,
            &FilterCriteria::select(Granularity::Region, ["Southern Highlands"]),
        );
        assert_eq!(view.indices(), &[2, 3]);
    }

    #[test]
    fn test_sub_region_selection_matches_name() {
        let table = sample_table();
        let view = apply(
            &table,
            &FilterCriteria::select(Granularity::SubRegion, ["Goulburn", "Belconnen"]),
        );
        // Table order, not selection order.
        assert_eq!(view.indices(), &[0, 3]);
    }

    #[test]
    fn test_suburb_selection_is_exact_token_match() {
        let table = sample_table();
        let view = apply(&table, &FilterCriteria::select(Granularity::Suburb, ["Spring"]));
        assert_eq!(view.indices(), &[3], "must not match Springvale or Spring Range");
    }

    #[test]
    fn test_suburb_selection_matches_any() {
        let table = sample_table();
        let view = apply(
            &table,
            &FilterCriteria::select(Granularity::Suburb, ["Bruce", "Amaroo", "Nowhere"]),
        );
        assert_eq!(view.indices(), &[0, 1]);
    }

    #[test]
    fn test_suburb_selection_without_membership_falls_back() {
        let table = RegionTable::new(
            vec![],
            vec![
                region("A", "X", Some(1.0), Some(1.0), ""),
                region("B", "X", Some(2.0), Some(2.0), ""),
            ],
        );
        let view = apply(&table, &FilterCriteria::select(Granularity::Suburb, ["Page"]));
        assert_eq!(view.len(), 2);
        assert_eq!(view.warnings(), &[ViewWarning::NoSuburbIndex]);
    }

    #[test]
    fn test_price_range_excludes_nulls() {
        let table = sample_table();
        let criteria = FilterCriteria {
            price_range: Some(ValueRange::new(400_000.0, 700_000.0)),
            ..Default::default()
        };
        let view = apply(&table, &criteria);
        // Queanbeyan has no median and is dropped.
        assert_eq!(view.indices(), &[1, 3]);
        for row in view.rows() {
            let price = row.metric(Metric::Median).unwrap();
            assert!((400_000.0..=700_000.0).contains(&price));
        }
    }

    #[test]
    fn test_ranges_are_and_combined() {
        let table = sample_table();
        let criteria = FilterCriteria {
            price_range: Some(ValueRange::new(400_000.0, 800_000.0)),
            yield_range: Some(ValueRange::new(4.0, 6.0)),
            ..Default::default()
        };
        let view = apply(&table, &criteria);
        assert_eq!(view.indices(), &[0, 3]);
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let table = sample_table();
        let criteria = FilterCriteria {
            yield_range: Some(ValueRange::new(4.1, 5.2)),
            ..Default::default()
        };
        assert_eq!(apply(&table, &criteria).indices(), &[0, 3]);
    }

    #[test]
    fn test_reversed_range_bounds_are_swapped() {
        let r = ValueRange::new(10.0, 2.0);
        assert_eq!(r.min, 2.0);
        assert_eq!(r.max, 10.0);
        assert!(r.contains(10.0));
    }

    #[test]
    fn test_empty_result_carries_warning() {
        let table = sample_table();
        let view = apply(&table, &FilterCriteria::select(Granularity::SubRegion, ["Nowhere"]));
        assert!(view.is_empty());
        assert_eq!(view.warnings(), &[ViewWarning::EmptyView]);
    }

    #[test]
    fn test_apply_is_deterministic() {
        let table = sample_table();
        let criteria = FilterCriteria {
            granularity: Granularity::Suburb,
            selected: ["Page", "Spring", "Amaroo"].into_iter().map(String::from).collect(),
            yield_range: Some(ValueRange::new(0.0, 10.0)),
            ..Default::default()
        };
        let first = apply(&table, &criteria);
        for _ in 0..5 {
            assert_eq!(apply(&table, &criteria).indices(), first.indices());
        }
    }

    #[test]
    fn test_suburb_table_selection() {
        let table = SuburbTable::new(
            vec![],
            vec![
                SuburbRecord::new(
                    "Page",
                    Some("Belconnen".into()),
                    Some("Capital Region".into()),
                    Metrics::default(),
                ),
                SuburbRecord::new("Amaroo", Some("Gungahlin".into()), None, Metrics::default()),
            ],
        );
        let by_suburb = apply(&table, &FilterCriteria::select(Granularity::Suburb, ["Amaroo"]));
        assert_eq!(by_suburb.indices(), &[1]);

        let by_sa3 = apply(&table, &FilterCriteria::select(Granularity::SubRegion, ["Belconnen"]));
        assert_eq!(by_sa3.indices(), &[0]);

        // Amaroo has no SA4 and cannot match a region selection.
        let by_sa4 = apply(
            &table,
            &FilterCriteria::select(Granularity::Region, ["Capital Region"]),
        );
        assert_eq!(by_sa4.indices(), &[0]);
    }

    #[test]
    fn test_open_range_end_is_omitted_from_json() {
        let lower_only = ValueRange::new(500_000.0, f64::INFINITY);
        assert_eq!(
            serde_json::to_value(lower_only).unwrap(),
            serde_json::json!({ "min": 500_000.0 })
        );
        let upper_only = ValueRange::new(f64::NEG_INFINITY, 5.0);
        assert_eq!(
            serde_json::to_value(upper_only).unwrap(),
            serde_json::json!({ "max": 5.0 })
        );
        assert_eq!(
            serde_json::to_value(ValueRange::new(3.0, 5.0)).unwrap(),
            serde_json::json!({ "min": 3.0, "max": 5.0 })
        );
    }
}

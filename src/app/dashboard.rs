// SuburbExplorer - app/dashboard.rs
//
// One render cycle of the explorer: filter the chosen table, compute the
// headline cards and descriptive statistics, and prepare every chart series.
// The result is a plain serialisable snapshot, so any front end (the CLI
// prints it as JSON) can draw it without touching the source tables.

use crate::core::charts::{
    self, BarPoint, HistogramBin, RadarVector, ScatterPoint, TimeSeries, TopN, TreemapNode,
};
use crate::core::export::{self, SortKey};
use crate::core::filter::{self, FilterCriteria, FilteredView, ViewWarning};
use crate::core::metrics::{self, Headline, Summary};
use crate::core::model::{Dataset, Field, LoadReport, Metric, Record, Table, TableKind};
use crate::util::constants;
use crate::util::error::ExportError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

/// Chart sizing knobs. Validated by the config layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartSettings {
    pub top_n: usize,
    pub series_limit: usize,
    pub histogram_bins: usize,
    /// Rows shown in the detail-table preview.
    pub detail_rows: usize,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            top_n: constants::DEFAULT_TOP_N,
            series_limit: constants::DEFAULT_SERIES_LIMIT,
            histogram_bins: constants::DEFAULT_HISTOGRAM_BINS,
            detail_rows: constants::DEFAULT_DETAIL_ROWS,
        }
    }
}

/// What the user asked for in this cycle.
#[derive(Debug, Clone, Default)]
pub struct DashboardRequest {
    pub table: TableKind,
    pub criteria: FilterCriteria,
    /// Entity drawn on the radar chart, if any.
    pub radar: Option<String>,
    /// Metric examined by the distribution chart.
    pub metric: Metric,
    /// Sort of the detail table, shared by the preview and export.
    pub sort: Option<SortKey>,
    /// Config warnings to show alongside the dashboard.
    pub config_warnings: Vec<String>,
}

/// First rows of the detail table, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailPreview {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Field<'static>>>,
    /// Rows in the whole view; `rows` holds at most the preview length.
    pub total: usize,
}

/// Radar chart section. Either the vector or the reason it is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RadarPanel {
    Ready(RadarVector),
    NotFound { identifier: String, message: String },
}

/// Everything one front-end render needs.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub table: TableKind,
    pub criteria: FilterCriteria,
    pub loaded_at: DateTime<Utc>,
    pub total_rows: usize,
    pub warnings: Vec<ViewWarning>,
    pub config_warnings: Vec<String>,
    /// Trimmed header row of the source sheet.
    pub columns: Vec<String>,
    /// Names for the suburb selector.
    pub suburb_options: Vec<String>,
    pub headline: Headline,
    pub detail: DetailPreview,
    /// One entry per metric that has at least one value in the view.
    pub summaries: Vec<Summary>,
    pub price_change: Vec<BarPoint>,
    pub top_by_price: TopN,
    pub price_vs_yield: Vec<ScatterPoint>,
    pub treemap: Vec<TreemapNode>,
    pub radar: Option<RadarPanel>,
    pub price_history: Vec<TimeSeries>,
    pub distribution_metric: Metric,
    pub distribution: Vec<HistogramBin>,
    pub load_report: LoadReport,
}

/// A loaded dataset plus chart settings; produces snapshots on demand.
#[derive(Debug, Clone)]
pub struct Dashboard {
    dataset: Arc<Dataset>,
    loaded_at: DateTime<Utc>,
    settings: ChartSettings,
}

impl Dashboard {
    pub fn new(dataset: Arc<Dataset>, loaded_at: DateTime<Utc>, settings: ChartSettings) -> Self {
        Self {
            dataset,
            loaded_at,
            settings,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn settings(&self) -> ChartSettings {
        self.settings
    }

    /// Run one filter → aggregate → chart cycle.
    pub fn snapshot(&self, request: &DashboardRequest) -> DashboardSnapshot {
        match request.table {
            TableKind::Region => self.snapshot_of(&self.dataset.regions, request),
            TableKind::Suburb => self.snapshot_of(&self.dataset.suburbs, request),
        }
    }

    /// Write the detail table of the requested view to a CSV file at `path`,
    /// in the request's sort order.
    ///
    /// `columns` are names as typed by the user; empty means every column.
    pub fn export_csv(
        &self,
        request: &DashboardRequest,
        columns: &[String],
        max_rows: usize,
        path: &Path,
    ) -> Result<usize, ExportError> {
        match request.table {
            TableKind::Region => {
                export_view(&self.dataset.regions, request, columns, max_rows, path)
            }
            TableKind::Suburb => {
                export_view(&self.dataset.suburbs, request, columns, max_rows, path)
            }
        }
    }

    fn snapshot_of<R: Record>(
        &self,
        table: &Table<R>,
        request: &DashboardRequest,
    ) -> DashboardSnapshot {
        let view = filter::apply(table, &request.criteria);
        let s = self.settings;

        let snapshot = DashboardSnapshot {
            table: request.table,
            criteria: request.criteria.clone(),
            loaded_at: self.loaded_at,
            total_rows: table.len(),
            warnings: view.warnings().to_vec(),
            config_warnings: request.config_warnings.clone(),
            columns: table.headers().to_vec(),
            suburb_options: self.dataset.suburb_index.names().to_vec(),
            headline: metrics::headline(&view),
            detail: detail_preview(&view, request.sort.as_ref(), s.detail_rows),
            summaries: Metric::all()
                .iter()
                .filter_map(|&m| metrics::describe(&view, m))
                .collect(),
            price_change: charts::bar_series(&view, Metric::PriceChange12m),
            top_by_price: charts::top_n(&view, Metric::Median, s.top_n),
            price_vs_yield: charts::scatter(&view, Metric::Median, Metric::Yield),
            treemap: charts::treemap(&view, Metric::Median),
            radar: request.radar.as_deref().map(|id| radar_panel(&view, id)),
            price_history: charts::time_series(&view, s.series_limit),
            distribution_metric: request.metric,
            distribution: charts::histogram(&view, request.metric, s.histogram_bins),
            load_report: self.dataset.report.clone(),
        };

        tracing::debug!(
            table = %request.table,
            rows = snapshot.headline.rows,
            total = snapshot.total_rows,
            warnings = snapshot.warnings.len(),
            "Dashboard snapshot built"
        );
        snapshot
    }
}

fn detail_preview<R: Record>(
    view: &FilteredView<'_, R>,
    sort: Option<&SortKey>,
    limit: usize,
) -> DetailPreview {
    let table = view.table();
    let rows = export::sorted_indices(view, sort)
        .into_iter()
        .filter_map(|idx| table.get(idx))
        .take(limit)
        .map(|row| {
            R::COLUMNS
                .iter()
                .map(|&c| row.field(c).unwrap_or(Field::Null).into_owned())
                .collect()
        })
        .collect();
    DetailPreview {
        columns: R::COLUMNS.iter().map(|c| c.header()).collect(),
        rows,
        total: view.len(),
    }
}

fn export_view<R: Record>(
    table: &Table<R>,
    request: &DashboardRequest,
    columns: &[String],
    max_rows: usize,
    path: &Path,
) -> Result<usize, ExportError> {
    let columns = export::resolve_columns::<R>(columns)?;
    let view = filter::apply(table, &request.criteria);
    let file = File::create(path).map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let writer = BufWriter::new(file);
    export::export_csv(&view, &columns, request.sort.as_ref(), max_rows, writer, path)
}

fn radar_panel<R: Record>(view: &FilteredView<'_, R>, identifier: &str) -> RadarPanel {
    match charts::radar_vector(view, identifier) {
        Ok(vector) => RadarPanel::Ready(vector),
        Err(e) => {
            tracing::info!(identifier, "Radar entity not in the current view");
            RadarPanel::NotFound {
                identifier: identifier.to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::ValueRange;
    use crate::core::model::{
        Column, Granularity, Metrics, RegionRecord, RegionTable, SuburbNameIndex, SuburbRecord,
        SuburbTable,
    };

    fn dataset() -> Arc<Dataset> {
        let regions = vec![
            RegionRecord {
                name: "Belconnen".into(),
                parent: "Capital Region".into(),
                metrics: Metrics::default()
                    .with(Metric::Median, 720_000.0)
                    .with(Metric::Yield, 4.1)
                    .with(Metric::PriceChange12m, 3.5),
                suburbs: vec!["Page".into(), "Bruce".into()],
            },
            RegionRecord {
                name: "Goulburn".into(),
                parent: "Southern Highlands".into(),
                metrics: Metrics::default()
                    .with(Metric::Median, 480_000.0)
                    .with(Metric::Yield, 5.2),
                suburbs: vec!["Goulburn".into()],
            },
        ];
        let suburbs = vec![SuburbRecord::new(
            "Page",
            Some("Belconnen".into()),
            Some("Capital Region".into()),
            Metrics::default().with(Metric::Median, 800_000.0),
        )];
        let suburb_index = SuburbNameIndex::from_regions(&regions);
        Arc::new(Dataset {
            regions: RegionTable::new(vec!["SA3".into(), "Sa4".into()], regions),
            suburbs: SuburbTable::new(vec!["Suburb".into()], suburbs),
            suburb_index,
            report: LoadReport::default(),
        })
    }

    fn dashboard() -> Dashboard {
        Dashboard::new(dataset(), Utc::now(), ChartSettings::default())
    }

    #[test]
    fn test_unfiltered_region_snapshot() {
        let snap = dashboard().snapshot(&DashboardRequest::default());
        assert_eq!(snap.total_rows, 2);
        assert_eq!(snap.headline.rows, 2);
        assert_eq!(snap.headline.median_price, Some(600_000.0));
        assert_eq!(snap.top_by_price.bars[0].label, "Belconnen");
        assert_eq!(snap.price_change.len(), 2);
        assert_eq!(snap.price_vs_yield.len(), 2);
        assert_eq!(snap.suburb_options, ["Bruce", "Goulburn", "Page"]);
        assert_eq!(snap.columns, ["SA3", "Sa4"]);
        assert!(snap.radar.is_none());
        assert!(snap.warnings.is_empty());
    }

    #[test]
    fn test_filtered_snapshot_and_radar_lookup() {
        let request = DashboardRequest {
            criteria: FilterCriteria {
                price_range: Some(ValueRange::new(400_000.0, 500_000.0)),
                ..Default::default()
            },
            radar: Some("Belconnen".into()),
            ..Default::default()
        };
        let snap = dashboard().snapshot(&request);
        assert_eq!(snap.headline.rows, 1);
        assert!(matches!(snap.radar, Some(RadarPanel::NotFound { .. })));

        let request = DashboardRequest {
            radar: Some("Goulburn".into()),
            ..request
        };
        let snap = dashboard().snapshot(&request);
        match snap.radar {
            Some(RadarPanel::Ready(v)) => assert_eq!(v.axes[1].value, Some(5.2)),
            other => panic!("expected radar vector, got {other:?}"),
        }
    }

    #[test]
    fn test_suburb_table_snapshot() {
        let request = DashboardRequest {
            table: TableKind::Suburb,
            criteria: FilterCriteria::select(Granularity::SubRegion, ["Belconnen"]),
            ..Default::default()
        };
        let snap = dashboard().snapshot(&request);
        assert_eq!(snap.table, TableKind::Suburb);
        assert_eq!(snap.headline.rows, 1);
        assert_eq!(snap.treemap[0].id, "Belconnen");
    }

    #[test]
    fn test_empty_view_snapshot_is_well_formed() {
        let request = DashboardRequest {
            criteria: FilterCriteria::select(Granularity::Region, ["Nowhere"]),
            ..Default::default()
        };
        let snap = dashboard().snapshot(&request);
        assert_eq!(snap.warnings, [ViewWarning::EmptyView]);
        assert_eq!(snap.headline.median_price, None);
        assert!(snap.summaries.is_empty());
        assert!(snap.distribution.is_empty());
        assert!(snap.top_by_price.bars.is_empty());

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["warnings"][0], "empty_view");
        assert!(json["headline"]["median_price"].is_null());
    }

    #[test]
    fn test_export_writes_filtered_view() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.csv");
        let request = DashboardRequest {
            criteria: FilterCriteria::select(Granularity::Suburb, ["Bruce"]),
            ..Default::default()
        };
        let columns = vec!["sa3".to_string(), "median".to_string()];
        let written = dashboard()
            .export_csv(&request, &columns, 10, &path)
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "SA3,Median\nBelconnen,720000\n"
        );

        let bad = vec!["Suburb".to_string()];
        let err = dashboard()
            .export_csv(&request, &bad, 10, &path)
            .unwrap_err();
        assert!(matches!(err, ExportError::UnknownColumn { .. }));
    }

    #[test]
    fn test_chart_settings_are_applied() {
        let settings = ChartSettings {
            top_n: 1,
            series_limit: 1,
            histogram_bins: 4,
            detail_rows: 1,
        };
        let snap = Dashboard::new(dataset(), Utc::now(), settings)
            .snapshot(&DashboardRequest::default());
        assert_eq!(snap.top_by_price.bars.len(), 1);
        assert_eq!(snap.price_history.len(), 1);
        assert_eq!(snap.distribution.len(), 4);
        assert_eq!(snap.detail.rows.len(), 1);
        assert_eq!(snap.detail.total, 2);
    }

    #[test]
    fn test_detail_preview_follows_sort() {
        let request = DashboardRequest {
            sort: Some(SortKey {
                column: Column::Metric(Metric::Median),
                descending: false,
            }),
            ..Default::default()
        };
        let snap = dashboard().snapshot(&request);
        let headers: Vec<&str> = RegionRecord::COLUMNS.iter().map(|c| c.header()).collect();
        assert_eq!(snap.detail.columns, headers);
        let names: Vec<&Field<'_>> = snap.detail.rows.iter().map(|r| &r[0]).collect();
        assert_eq!(
            names,
            [&Field::Text("Goulburn".into()), &Field::Text("Belconnen".into())]
        );

        let median = snap.detail.columns.iter().position(|&c| c == "Median").unwrap();
        let json = serde_json::to_value(&snap.detail).unwrap();
        assert_eq!(json["rows"][0][median], 480_000.0);
        assert_eq!(json["rows"][1][0], "Belconnen");
        assert_eq!(json["total"], 2);

        let unsorted = dashboard().snapshot(&DashboardRequest::default());
        assert_eq!(unsorted.detail.rows[0][0], Field::Text("Belconnen".into()));
    }

    #[test]
    fn test_config_warnings_reach_snapshot() {
        let request = DashboardRequest {
            config_warnings: vec!["charts.top_n out of range. Using default (20).".into()],
            ..Default::default()
        };
        let snap = dashboard().snapshot(&request);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["config_warnings"][0], "charts.top_n out of range. Using default (20).");
    }

    #[test]
    fn test_export_uses_request_sort() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.csv");
        let request = DashboardRequest {
            sort: Some(SortKey {
                column: Column::Sa3,
                descending: true,
            }),
            ..Default::default()
        };
        dashboard()
            .export_csv(&request, &["sa3".to_string()], 10, &path)
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "SA3\nGoulburn\nBelconnen\n"
        );
    }
}

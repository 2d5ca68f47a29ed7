// SuburbExplorer - core/loader.rs
//
// Workbook loading: reads the region and suburb sheets, trims headers,
// validates required columns once, and coerces metric cells to numbers.
//
// Coercion is total. A cell that cannot be read as a number becomes null
// and is counted; it never aborts the load or drops the row. The only
// fatal conditions are a missing/unreadable file, a missing sheet, or a
// missing required column.

use crate::core::model::{
    split_members, Dataset, LoadReport, Metric, Metrics, RegionRecord, RegionTable,
    SheetReport, SuburbNameIndex, SuburbRecord, SuburbTable,
};
use crate::util::constants;
use crate::util::error::LoadError;
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::io::{Read, Seek};
use std::path::Path;

/// Names of the two sheets to read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetNames {
    pub region: String,
    pub suburb: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            region: constants::DEFAULT_REGION_SHEET.to_string(),
            suburb: constants::DEFAULT_SUBURB_SHEET.to_string(),
        }
    }
}

/// Load both sheets of the workbook at `path`.
pub fn load_workbook(path: &Path, sheets: &SheetNames) -> Result<Dataset, LoadError> {
    match std::fs::metadata(path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    }

    tracing::info!(path = %path.display(), "Opening workbook");

    let mut workbook = open_workbook_auto(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let region_range = read_sheet(&mut workbook, path, &sheets.region)?;
    let suburb_range = read_sheet(&mut workbook, path, &sheets.suburb)?;

    tables_from_ranges(&region_range, &suburb_range, sheets)
}

fn read_sheet<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    path: &Path,
    sheet: &str,
) -> Result<Range<Data>, LoadError> {
    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == sheet) {
        return Err(LoadError::MissingSheet {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            available,
        });
    }

    workbook
        .worksheet_range(sheet)
        .map_err(|source| LoadError::Sheet {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            source,
        })
}

/// Build a dataset from two already-read sheet ranges.
///
/// The first row of each range is the header row.
pub fn tables_from_ranges(
    region_range: &Range<Data>,
    suburb_range: &Range<Data>,
    sheets: &SheetNames,
) -> Result<Dataset, LoadError> {
    let (regions, region_report) = parse_region_sheet(region_range, &sheets.region)?;
    let (suburbs, suburb_report) = parse_suburb_sheet(suburb_range, &sheets.suburb)?;

    let suburb_index = SuburbNameIndex::from_regions(regions.rows());
    if suburb_index.is_empty() {
        tracing::info!(
            sheet = %sheets.region,
            "No suburb membership data; suburb-level filtering is unavailable"
        );
    }

    tracing::info!(
        regions = regions.len(),
        suburbs = suburbs.len(),
        suburb_names = suburb_index.len(),
        null_cells = region_report.null_coercions + suburb_report.null_coercions,
        "Workbook loaded"
    );

    Ok(Dataset {
        regions,
        suburbs,
        suburb_index,
        report: LoadReport {
            regions: region_report,
            suburbs: suburb_report,
        },
    })
}

/// Build a range from rows of cells, top-left anchored at (0, 0).
///
/// Lets callers feed grids that did not come from a workbook file.
pub fn sheet_from_rows(rows: Vec<Vec<Data>>) -> Range<Data> {
    let height = rows.len();
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if height == 0 || width == 0 {
        return Range::empty();
    }

    let mut range = Range::new((0, 0), ((height - 1) as u32, (width - 1) as u32));
    for (r, row) in rows.into_iter().enumerate() {
        for (c, cell) in row.into_iter().enumerate() {
            range.set_value((r as u32, c as u32), cell);
        }
    }
    range
}

// =============================================================================
// Sheet parsing
// =============================================================================

/// Column positions resolved from a trimmed header row.
struct Layout {
    headers: Vec<String>,
    metrics: Vec<(Metric, Option<usize>)>,
}

impl Layout {
    fn position(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    fn require(&self, sheet: &str, header: &'static str) -> Result<usize, LoadError> {
        self.position(header).ok_or_else(|| LoadError::MissingColumn {
            sheet: sheet.to_string(),
            column: header,
        })
    }
}

/// Read and validate the header row, resolving every metric column.
fn read_layout(
    range: &Range<Data>,
    sheet: &str,
    report: &mut SheetReport,
) -> Result<Layout, LoadError> {
    let header_row = range.rows().next().ok_or_else(|| LoadError::EmptySheet {
        sheet: sheet.to_string(),
    })?;

    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell_text(cell).unwrap_or_default())
        .collect();

    let mut layout = Layout {
        headers,
        metrics: Vec::with_capacity(Metric::COUNT),
    };

    for &metric in Metric::all() {
        let position = layout.position(metric.header());
        if position.is_none() {
            if metric.is_required() {
                return Err(LoadError::MissingColumn {
                    sheet: sheet.to_string(),
                    column: metric.header(),
                });
            }
            tracing::warn!(
                sheet,
                column = metric.header(),
                "Optional column missing; values will be empty"
            );
            report.missing_columns.push(metric.header().to_string());
        }
        layout.metrics.push((metric, position));
    }

    Ok(layout)
}

fn parse_region_sheet(
    range: &Range<Data>,
    sheet: &str,
) -> Result<(RegionTable, SheetReport), LoadError> {
    let mut report = SheetReport {
        sheet: sheet.to_string(),
        ..Default::default()
    };
    let layout = read_layout(range, sheet, &mut report)?;
    let name_col = layout.require(sheet, constants::COLUMN_SA3)?;
    let parent_col = layout.require(sheet, constants::COLUMN_SA4)?;
    let members_col = layout.position(constants::COLUMN_SUBURB_LIST);
    if members_col.is_none() {
        report
            .missing_columns
            .push(constants::COLUMN_SUBURB_LIST.to_string());
    }

    let mut rows = Vec::new();
    for (row_idx, row) in range.rows().enumerate().skip(1) {
        let Some(name) = row.get(name_col).and_then(cell_text) else {
            report.skipped_rows += 1;
            continue;
        };

        let metrics = read_metrics(row, row_idx, &layout, &mut report);
        let parent = row.get(parent_col).and_then(cell_text).unwrap_or_default();
        let suburbs = members_col
            .and_then(|c| row.get(c))
            .and_then(cell_text)
            .map(|raw| split_members(&raw))
            .unwrap_or_default();

        rows.push(RegionRecord {
            name,
            parent,
            metrics,
            suburbs,
        });
    }

    report.rows = rows.len();
    Ok((RegionTable::new(layout.headers, rows), report))
}

fn parse_suburb_sheet(
    range: &Range<Data>,
    sheet: &str,
) -> Result<(SuburbTable, SheetReport), LoadError> {
    let mut report = SheetReport {
        sheet: sheet.to_string(),
        ..Default::default()
    };
    let layout = read_layout(range, sheet, &mut report)?;
    let name_col = layout.require(sheet, constants::COLUMN_SUBURB)?;
    let region_col = layout.position(constants::COLUMN_SA3);
    let parent_col = layout.position(constants::COLUMN_SA4);

    let mut rows = Vec::new();
    for (row_idx, row) in range.rows().enumerate().skip(1) {
        let Some(name) = row.get(name_col).and_then(cell_text) else {
            report.skipped_rows += 1;
            continue;
        };

        let metrics = read_metrics(row, row_idx, &layout, &mut report);
        let region = region_col.and_then(|c| row.get(c)).and_then(cell_text);
        let parent = parent_col.and_then(|c| row.get(c)).and_then(cell_text);

        rows.push(SuburbRecord::new(name, region, parent, metrics));
    }

    report.rows = rows.len();
    Ok((SuburbTable::new(layout.headers, rows), report))
}

fn read_metrics(
    row: &[Data],
    row_idx: usize,
    layout: &Layout,
    report: &mut SheetReport,
) -> Metrics {
    let mut metrics = Metrics::default();
    for &(metric, position) in &layout.metrics {
        let Some(col) = position else { continue };
        match coerce_number(row.get(col)) {
            Numeric::Value(v) => metrics.set(metric, Some(v)),
            Numeric::Blank => {}
            Numeric::Invalid => {
                report.null_coercions += 1;
                if report.null_coercions <= constants::MAX_COERCION_LOGS_PER_SHEET {
                    tracing::debug!(
                        sheet = %report.sheet,
                        row = row_idx + 1,
                        column = metric.header(),
                        cell = ?row.get(col),
                        "Non-numeric cell treated as empty"
                    );
                }
            }
        }
    }
    metrics
}

// =============================================================================
// Cell coercion
// =============================================================================

/// Outcome of reading a cell as a number.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Numeric {
    Value(f64),
    Blank,
    Invalid,
}

/// Read a metric cell. Text cells may carry `$`, thousands separators, or a
/// trailing `%`; the percent sign is dropped without rescaling because the
/// sheet stores percentages as whole numbers (4.2 means 4.2%).
fn coerce_number(cell: Option<&Data>) -> Numeric {
    match cell {
        None | Some(Data::Empty) => Numeric::Blank,
        Some(Data::Float(f)) if f.is_finite() => Numeric::Value(*f),
        Some(Data::Int(i)) => Numeric::Value(*i as f64),
        Some(Data::String(s)) => parse_numeric_text(s),
        Some(_) => Numeric::Invalid,
    }
}

fn parse_numeric_text(raw: &str) -> Numeric {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Numeric::Blank;
    }
    let cleaned: String = trimmed
        .trim_end_matches('%')
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Numeric::Value(v),
        _ => Numeric::Invalid,
    }
}

/// Read a cell as trimmed, non-empty text.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.is_finite() => Some(f.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Record;

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn region_sheet() -> Range<Data> {
        sheet_from_rows(vec![
            vec![
                s(" SA3 "),
                s("Sa4"),
                s("Median "),
                s("Yield"),
                s("12M Price Change"),
                s("Suburbs"),
            ],
            vec![
                s("Belconnen"),
                s("Capital Region"),
                Data::Float(720_000.0),
                Data::Float(4.1),
                s("3.5%"),
                s("Page, Bruce"),
            ],
            vec![
                s("Gungahlin"),
                s("Capital Region"),
                s("$650,000"),
                s("n/a"),
                Data::Empty,
                s("Amaroo, Bruce"),
            ],
            vec![Data::Empty; 6],
            vec![
                s("Goulburn"),
                s("Southern Highlands"),
                Data::Int(480_000),
                Data::Bool(true),
                Data::Float(f64::NAN),
                Data::Empty,
            ],
        ])
    }

    fn suburb_sheet() -> Range<Data> {
        sheet_from_rows(vec![
            vec![s("Suburb"), s("SA3"), s("Median"), s("Yield")],
            vec![s("Page"), s("Belconnen"), Data::Float(700_000.0), Data::Float(4.0)],
            vec![s("Amaroo"), Data::Empty, Data::Empty, Data::Float(3.8)],
        ])
    }

    fn dataset() -> Dataset {
        tables_from_ranges(&region_sheet(), &suburb_sheet(), &SheetNames::default()).unwrap()
    }

    #[test]
    fn test_headers_are_trimmed() {
        let ds = dataset();
        assert_eq!(ds.regions.headers()[0], "SA3");
        assert_eq!(ds.regions.headers()[2], "Median");
    }

    #[test]
    fn test_coercion_is_total() {
        let ds = dataset();
        let rows = ds.regions.rows();
        assert_eq!(rows.len(), 3, "blank row skipped, bad cells kept");

        assert_eq!(rows[0].metric(Metric::Median), Some(720_000.0));
        assert_eq!(rows[0].metric(Metric::PriceChange12m), Some(3.5));
        assert_eq!(rows[1].metric(Metric::Median), Some(650_000.0));
        assert_eq!(rows[1].metric(Metric::Yield), None);
        assert_eq!(rows[2].metric(Metric::Median), Some(480_000.0));
        assert_eq!(rows[2].metric(Metric::Yield), None);
        assert_eq!(rows[2].metric(Metric::PriceChange12m), None);

        // "n/a", TRUE and NaN; the blank cell is not a coercion failure.
        assert_eq!(ds.report.regions.null_coercions, 3);
        assert_eq!(ds.report.regions.skipped_rows, 1);
    }

    #[test]
    fn test_optional_columns_are_reported() {
        let ds = dataset();
        let missing = &ds.report.regions.missing_columns;
        assert!(missing.contains(&"Growth Gap".to_string()));
        assert!(!missing.contains(&"Suburbs".to_string()));
        assert!(ds.report.suburbs.missing_columns.contains(&"Growth Gap".to_string()));
        assert!(ds.regions.rows()[0].metric(Metric::GrowthGap).is_none());
    }

    #[test]
    fn test_suburb_index_is_built_from_regions() {
        let ds = dataset();
        assert_eq!(ds.suburb_index.names(), ["Amaroo", "Bruce", "Page"]);
        assert!(ds.regions.rows()[2].suburbs.is_empty());
    }

    #[test]
    fn test_missing_membership_column_gives_empty_index() {
        let regions = sheet_from_rows(vec![
            vec![s("SA3"), s("Sa4"), s("Median"), s("Yield")],
            vec![s("Belconnen"), s("Capital Region"), Data::Float(1.0), Data::Float(1.0)],
        ]);
        let ds = tables_from_ranges(&regions, &suburb_sheet(), &SheetNames::default()).unwrap();
        assert!(ds.suburb_index.is_empty());
        assert!(!ds.regions.has_membership());
        assert!(ds.report.regions.missing_columns.contains(&"Suburbs".to_string()));
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let regions = sheet_from_rows(vec![
            vec![s("SA3"), s("Median"), s("Yield")],
            vec![s("Belconnen"), Data::Float(1.0), Data::Float(1.0)],
        ]);
        let err =
            tables_from_ranges(&regions, &suburb_sheet(), &SheetNames::default()).unwrap_err();
        assert!(
            matches!(err, LoadError::MissingColumn { column: "Sa4", .. }),
            "got {err:?}"
        );

        let suburbs = sheet_from_rows(vec![vec![s("Suburb"), s("Median")]]);
        let err =
            tables_from_ranges(&region_sheet(), &suburbs, &SheetNames::default()).unwrap_err();
        assert!(
            matches!(err, LoadError::MissingColumn { column: "Yield", .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn test_empty_sheet_is_fatal() {
        let err = tables_from_ranges(&Range::empty(), &suburb_sheet(), &SheetNames::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::EmptySheet { .. }), "got {err:?}");
    }

    #[test]
    fn test_suburb_rows_keep_optional_parents() {
        let ds = dataset();
        let rows = ds.suburbs.rows();
        assert_eq!(rows[0].region.as_deref(), Some("Belconnen"));
        assert_eq!(rows[0].parent_region, None);
        assert_eq!(rows[1].region, None);
        assert_eq!(rows[1].metric(Metric::Median), None);
    }

    #[test]
    fn test_parse_numeric_text() {
        assert_eq!(parse_numeric_text(" $1,250,000 "), Numeric::Value(1_250_000.0));
        assert_eq!(parse_numeric_text("-2.5%"), Numeric::Value(-2.5));
        assert_eq!(parse_numeric_text("   "), Numeric::Blank);
        assert_eq!(parse_numeric_text("N/A"), Numeric::Invalid);
        assert_eq!(parse_numeric_text("inf"), Numeric::Invalid);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = load_workbook(
            Path::new("/nonexistent/suburb-explorer/market.xlsx"),
            &SheetNames::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }), "got {err:?}");
    }
}

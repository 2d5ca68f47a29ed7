// SuburbExplorer - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies.
//
// These types are the shared vocabulary across all layers.

use crate::util::constants;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Metric
// =============================================================================

/// A numeric market metric carried by both region and suburb rows.
///
/// The discriminant doubles as the slot index inside [`Metrics`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Median,
    PriceChange12m,
    SalesTurnover,
    Yield,
    BuyAffordability,
    RentAffordability,
    GrowthGap,
    PriceNow,
    Price2mAgo,
    Price12mAgo,
}

/// Axes of the radar chart, in drawing order.
pub const RADAR_METRICS: [Metric; 5] = [
    Metric::SalesTurnover,
    Metric::Yield,
    Metric::BuyAffordability,
    Metric::RentAffordability,
    Metric::GrowthGap,
];

/// Price snapshots of the line chart, oldest first. Aligned with
/// [`constants::PRICE_HISTORY_PERIODS`].
pub const PRICE_HISTORY_METRICS: [Metric; 3] =
    [Metric::Price12mAgo, Metric::Price2mAgo, Metric::PriceNow];

impl Metric {
    /// Number of metric variants.
    pub const COUNT: usize = 10;

    /// Returns all variants in sheet column order.
    pub fn all() -> &'static [Metric] {
        &[
            Metric::Median,
            Metric::PriceChange12m,
            Metric::SalesTurnover,
            Metric::Yield,
            Metric::BuyAffordability,
            Metric::RentAffordability,
            Metric::GrowthGap,
            Metric::PriceNow,
            Metric::Price2mAgo,
            Metric::Price12mAgo,
        ]
    }

    /// Slot index inside [`Metrics`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Exact column header in the workbook (case-sensitive, after trimming).
    pub fn header(self) -> &'static str {
        match self {
            Metric::Median => "Median",
            Metric::PriceChange12m => "12M Price Change",
            Metric::SalesTurnover => "Sales Turnover",
            Metric::Yield => "Yield",
            Metric::BuyAffordability => "Buy Affordability",
            Metric::RentAffordability => "Rent Affordability",
            Metric::GrowthGap => "Growth Gap",
            Metric::PriceNow => "Price Now",
            Metric::Price2mAgo => "Price 2M Ago",
            Metric::Price12mAgo => "Price 12M Ago",
        }
    }

    /// Machine-friendly key used on the command line and in JSON.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Median => "median",
            Metric::PriceChange12m => "price_change_12m",
            Metric::SalesTurnover => "sales_turnover",
            Metric::Yield => "yield",
            Metric::BuyAffordability => "buy_affordability",
            Metric::RentAffordability => "rent_affordability",
            Metric::GrowthGap => "growth_gap",
            Metric::PriceNow => "price_now",
            Metric::Price2mAgo => "price_2m_ago",
            Metric::Price12mAgo => "price_12m_ago",
        }
    }

    /// Whether a sheet must carry this column to load at all.
    ///
    /// Price and yield drive the range filters, so a sheet without them
    /// cannot be filtered meaningfully.
    pub fn is_required(self) -> bool {
        matches!(self, Metric::Median | Metric::Yield)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for Metric {
    type Err = String;

    /// Accepts either the key (`price_change_12m`) or the sheet header
    /// (`12M Price Change`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Metric::all()
            .iter()
            .copied()
            .find(|m| m.key().eq_ignore_ascii_case(s) || m.header().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let keys: Vec<&str> = Metric::all().iter().map(|m| m.key()).collect();
                format!("unknown metric '{s}' (expected one of: {})", keys.join(", "))
            })
    }
}

/// Fixed-size block of nullable metric values, indexed by [`Metric`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    values: [Option<f64>; Metric::COUNT],
}

impl Metrics {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values[metric.index()]
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        self.values[metric.index()] = value;
    }

    /// Builder-style setter, mostly for tests and fixtures.
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, Some(value));
        self
    }
}

// =============================================================================
// Granularity / table selection
// =============================================================================

/// Level at which the user selects geographic identifiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    /// SA4 parent regions.
    #[default]
    Region,
    /// SA3 regions.
    SubRegion,
    /// Individual suburbs.
    Suburb,
}

impl Granularity {
    pub fn label(&self) -> &'static str {
        match self {
            Granularity::Region => "region",
            Granularity::SubRegion => "sub-region",
            Granularity::Suburb => "suburb",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "region" | "sa4" => Ok(Granularity::Region),
            "sub-region" | "subregion" | "sa3" => Ok(Granularity::SubRegion),
            "suburb" => Ok(Granularity::Suburb),
            other => Err(format!(
                "unknown granularity '{other}' (expected region, sub-region or suburb)"
            )),
        }
    }
}

/// Which source table a view is derived from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    #[default]
    Region,
    Suburb,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TableKind::Region => "region",
            TableKind::Suburb => "suburb",
        })
    }
}

impl FromStr for TableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "region" | "sa3" => Ok(TableKind::Region),
            "suburb" => Ok(TableKind::Suburb),
            other => Err(format!("unknown table '{other}' (expected region or suburb)")),
        }
    }
}

// =============================================================================
// Columns and cell values (detail table / export)
// =============================================================================

/// A column of the detail table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Suburb,
    Sa3,
    Sa4,
    SuburbList,
    Metric(Metric),
}

impl Column {
    /// Header written to exports; matches the workbook header.
    pub fn header(self) -> &'static str {
        match self {
            Column::Suburb => constants::COLUMN_SUBURB,
            Column::Sa3 => constants::COLUMN_SA3,
            Column::Sa4 => constants::COLUMN_SA4,
            Column::SuburbList => constants::COLUMN_SUBURB_LIST,
            Column::Metric(m) => m.header(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "suburb" => return Ok(Column::Suburb),
            "sa3" => return Ok(Column::Sa3),
            "sa4" => return Ok(Column::Sa4),
            "suburbs" | "suburb_list" => return Ok(Column::SuburbList),
            _ => {}
        }
        trimmed
            .parse::<Metric>()
            .map(Column::Metric)
            .map_err(|_| format!("unknown column '{trimmed}'"))
    }
}

/// A single cell value as seen by the detail table and export.
///
/// Serialises as a bare string, number, or null.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field<'a> {
    Text(Cow<'a, str>),
    Number(f64),
    Null,
}

impl Field<'_> {
    /// Textual form used in CSV output. Null is an empty field; numbers use
    /// the shortest representation that round-trips.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Field::Text(s) => Cow::Borrowed(s.as_ref()),
            Field::Number(v) => Cow::Owned(v.to_string()),
            Field::Null => Cow::Borrowed(""),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    /// Detach the value from the row it was read from.
    pub fn into_owned(self) -> Field<'static> {
        match self {
            Field::Text(s) => Field::Text(Cow::Owned(s.into_owned())),
            Field::Number(v) => Field::Number(v),
            Field::Null => Field::Null,
        }
    }
}

fn number(value: Option<f64>) -> Field<'static> {
    value.map_or(Field::Null, Field::Number)
}

fn text(value: Option<&str>) -> Field<'_> {
    value.map_or(Field::Null, |s| Field::Text(Cow::Borrowed(s)))
}

// =============================================================================
// Records
// =============================================================================

/// Behaviour shared by region and suburb rows so that filtering, metrics,
/// charts, and export are written once for both tables.
pub trait Record {
    /// Table name for messages.
    const TABLE: &'static str;

    /// Columns available on this record type, in default display order.
    const COLUMNS: &'static [Column];

    /// Finest-grained identifier (SA3 name for regions, suburb name for suburbs).
    fn name(&self) -> &str;

    /// Identifier compared against a region or sub-region selection.
    /// Always `None` for [`Granularity::Suburb`]; suburb selections are
    /// matched against [`Record::members`].
    fn identifier(&self, granularity: Granularity) -> Option<&str>;

    /// Suburb names this row covers.
    fn members(&self) -> &[String];

    /// Parent label used to group rows in the treemap.
    fn group(&self) -> Option<&str>;

    fn metrics(&self) -> &Metrics;

    fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics().get(metric)
    }

    /// Cell value for `column`, or `None` when the column does not exist on
    /// this record type.
    fn field(&self, column: Column) -> Option<Field<'_>>;
}

/// One row of the region-level (SA3) sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecord {
    /// SA3 name.
    pub name: String,
    /// SA4 name. Empty when the sheet cell was blank.
    pub parent: String,
    pub metrics: Metrics,
    /// Member suburbs split from the comma-separated `Suburbs` column.
    pub suburbs: Vec<String>,
}

impl Record for RegionRecord {
    const TABLE: &'static str = "region";

    const COLUMNS: &'static [Column] = &[
        Column::Sa3,
        Column::Sa4,
        Column::Metric(Metric::Median),
        Column::Metric(Metric::PriceChange12m),
        Column::Metric(Metric::SalesTurnover),
        Column::Metric(Metric::Yield),
        Column::Metric(Metric::BuyAffordability),
        Column::Metric(Metric::RentAffordability),
        Column::Metric(Metric::GrowthGap),
        Column::Metric(Metric::PriceNow),
        Column::Metric(Metric::Price2mAgo),
        Column::Metric(Metric::Price12mAgo),
        Column::SuburbList,
    ];

    fn name(&self) -> &str {
        &self.name
    }

    fn identifier(&self, granularity: Granularity) -> Option<&str> {
        match granularity {
            Granularity::Region => self.group(),
            Granularity::SubRegion => Some(&self.name),
            Granularity::Suburb => None,
        }
    }

    fn members(&self) -> &[String] {
        &self.suburbs
    }

    fn group(&self) -> Option<&str> {
        (!self.parent.is_empty()).then_some(self.parent.as_str())
    }

    fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn field(&self, column: Column) -> Option<Field<'_>> {
        match column {
            Column::Sa3 => Some(Field::Text(Cow::Borrowed(&self.name))),
            Column::Sa4 => Some(Field::Text(Cow::Borrowed(&self.parent))),
            Column::SuburbList => {
                if self.suburbs.is_empty() {
                    Some(Field::Null)
                } else {
                    let joined = self.suburbs.join(", ");
                    Some(Field::Text(Cow::Owned(joined)))
                }
            }
            Column::Metric(m) => Some(number(self.metrics.get(m))),
            Column::Suburb => None,
        }
    }
}

/// One row of the suburb-level sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SuburbRecord {
    /// Suburb name. Stored as a one-element list so it can be matched as
    /// the row's own membership.
    name: [String; 1],
    /// Parent SA3 region, when the sheet carries one.
    pub region: Option<String>,
    /// Parent SA4 region, when the sheet carries one.
    pub parent_region: Option<String>,
    pub metrics: Metrics,
}

impl SuburbRecord {
    pub fn new(
        name: impl Into<String>,
        region: Option<String>,
        parent_region: Option<String>,
        metrics: Metrics,
    ) -> Self {
        Self {
            name: [name.into()],
            region,
            parent_region,
            metrics,
        }
    }
}

impl Record for SuburbRecord {
    const TABLE: &'static str = "suburb";

    const COLUMNS: &'static [Column] = &[
        Column::Suburb,
        Column::Sa3,
        Column::Sa4,
        Column::Metric(Metric::Median),
        Column::Metric(Metric::PriceChange12m),
        Column::Metric(Metric::SalesTurnover),
        Column::Metric(Metric::Yield),
        Column::Metric(Metric::BuyAffordability),
        Column::Metric(Metric::RentAffordability),
        Column::Metric(Metric::GrowthGap),
        Column::Metric(Metric::PriceNow),
        Column::Metric(Metric::Price2mAgo),
        Column::Metric(Metric::Price12mAgo),
    ];

    fn name(&self) -> &str {
        &self.name[0]
    }

    fn identifier(&self, granularity: Granularity) -> Option<&str> {
        match granularity {
            Granularity::Region => self.parent_region.as_deref(),
            Granularity::SubRegion => self.region.as_deref(),
            Granularity::Suburb => None,
        }
    }

    fn members(&self) -> &[String] {
        &self.name
    }

    fn group(&self) -> Option<&str> {
        self.region.as_deref()
    }

    fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn field(&self, column: Column) -> Option<Field<'_>> {
        match column {
            Column::Suburb => Some(Field::Text(Cow::Borrowed(&self.name[0]))),
            Column::Sa3 => Some(text(self.region.as_deref())),
            Column::Sa4 => Some(text(self.parent_region.as_deref())),
            Column::Metric(m) => Some(number(self.metrics.get(m))),
            Column::SuburbList => None,
        }
    }
}

// =============================================================================
// Tables
// =============================================================================

/// An immutable source table. Built once by the loader.
#[derive(Debug, Clone)]
pub struct Table<R> {
    headers: Vec<String>,
    rows: Vec<R>,
    has_membership: bool,
}

impl<R: Record> Table<R> {
    pub fn new(headers: Vec<String>, rows: Vec<R>) -> Self {
        let has_membership = rows.iter().any(|r| !r.members().is_empty());
        Self {
            headers,
            rows,
            has_membership,
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&R> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Trimmed header row as read from the sheet, including columns the
    /// crate does not interpret.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Whether any row carries suburb membership data.
    pub fn has_membership(&self) -> bool {
        self.has_membership
    }
}

pub type RegionTable = Table<RegionRecord>;
pub type SuburbTable = Table<SuburbRecord>;

/// Split a comma-separated membership string into trimmed, non-empty names.
pub fn split_members(raw: &str) -> Vec<String> {
    raw.split(constants::SUBURB_LIST_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Sorted, deduplicated list of every suburb named in the region sheet's
/// membership column. Feeds the suburb selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuburbNameIndex(Vec<String>);

impl SuburbNameIndex {
    pub fn from_regions(rows: &[RegionRecord]) -> Self {
        let names: BTreeSet<&str> = rows
            .iter()
            .flat_map(|r| r.suburbs.iter().map(String::as_str))
            .collect();
        Self(names.into_iter().map(str::to_string).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0
            .binary_search_by(|entry| entry.as_str().cmp(name))
            .is_ok()
    }
}

// =============================================================================
// Load summary
// =============================================================================

/// What the loader found on one sheet.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SheetReport {
    /// Sheet name.
    pub sheet: String,
    /// Rows loaded.
    pub rows: usize,
    /// Rows skipped because their identifier cell was empty.
    pub skipped_rows: usize,
    /// Optional columns absent from the header row (metrics all-null).
    pub missing_columns: Vec<String>,
    /// Cells in metric columns that could not be read as numbers.
    pub null_coercions: usize,
}

/// Summary of a workbook load.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub regions: SheetReport,
    pub suburbs: SheetReport,
}

/// Everything the loader produces. Shared read-only for the session.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub regions: RegionTable,
    pub suburbs: SuburbTable,
    pub suburb_index: SuburbNameIndex,
    pub report: LoadReport,
}

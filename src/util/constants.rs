// SuburbExplorer - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "SuburbExplorer";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "SuburbExplorer";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Workbook layout
// =============================================================================

/// Default name of the region-level (SA3) sheet.
pub const DEFAULT_REGION_SHEET: &str = "SA3";

/// Default name of the suburb-level sheet.
pub const DEFAULT_SUBURB_SHEET: &str = "Suburb";

/// Excel refuses sheet names longer than this, so anything longer in
/// config.toml can never match.
pub const MAX_SHEET_NAME_LENGTH: usize = 31;

/// Header of the SA3 identifier column (region name on the region sheet,
/// parent region on the suburb sheet).
pub const COLUMN_SA3: &str = "SA3";

/// Header of the SA4 identifier column (parent region).
pub const COLUMN_SA4: &str = "Sa4";

/// Header of the suburb name column on the suburb sheet.
pub const COLUMN_SUBURB: &str = "Suburb";

/// Header of the comma-separated member-suburb column on the region sheet.
pub const COLUMN_SUBURB_LIST: &str = "Suburbs";

/// Separator used inside the member-suburb column.
pub const SUBURB_LIST_SEPARATOR: char = ',';

/// Maximum number of individual numeric coercion failures logged at debug
/// level per sheet. The total is always reported in the load summary.
pub const MAX_COERCION_LOGS_PER_SHEET: usize = 20;

// =============================================================================
// Chart defaults
// =============================================================================

/// Default number of bars in the top-N chart.
pub const DEFAULT_TOP_N: usize = 20;

/// Minimum user-configurable top-N size.
pub const MIN_TOP_N: usize = 1;

/// Maximum user-configurable top-N size.
pub const MAX_TOP_N: usize = 500;

/// Default number of entities drawn in the price-history line chart.
pub const DEFAULT_SERIES_LIMIT: usize = 10;

/// Minimum user-configurable line chart entity count.
pub const MIN_SERIES_LIMIT: usize = 1;

/// Maximum user-configurable line chart entity count. Beyond this the chart
/// legend becomes unreadable.
pub const MAX_SERIES_LIMIT: usize = 100;

/// Default number of histogram bins.
pub const DEFAULT_HISTOGRAM_BINS: usize = 30;

/// Minimum user-configurable histogram bin count.
pub const MIN_HISTOGRAM_BINS: usize = 1;

/// Maximum user-configurable histogram bin count.
pub const MAX_HISTOGRAM_BINS: usize = 500;

/// Default number of rows in the detail-table preview.
pub const DEFAULT_DETAIL_ROWS: usize = 20;

/// Minimum user-configurable detail-table preview length.
pub const MIN_DETAIL_ROWS: usize = 1;

/// Maximum user-configurable detail-table preview length.
pub const MAX_DETAIL_ROWS: usize = 1_000;

/// Period labels of the price-history line chart, oldest first.
pub const PRICE_HISTORY_PERIODS: [&str; 3] = ["12M Ago", "2M Ago", "Now"];

/// Treemap group used for rows that carry no parent region.
pub const UNASSIGNED_GROUP: &str = "(unassigned)";

// =============================================================================
// Export
// =============================================================================

/// Default maximum number of rows written in a single CSV export.
pub const DEFAULT_MAX_EXPORT_ROWS: usize = 1_000_000;

/// Hard upper bound on the export row limit (prevents configuration mistakes).
pub const ABSOLUTE_MAX_EXPORT_ROWS: usize = 5_000_000;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

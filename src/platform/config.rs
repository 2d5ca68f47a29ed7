// SuburbExplorer - platform/config.rs
//
// Platform-specific configuration directory resolution and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for SuburbExplorer configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/suburbexplorer/ or %APPDATA%\SuburbExplorer\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored, so a newer config file can be used
/// with an older binary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[workbook]` section.
    pub workbook: WorkbookSection,
    /// `[charts]` section.
    pub charts: ChartsSection,
    /// `[export]` section.
    pub export: ExportSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[workbook]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct WorkbookSection {
    /// Name of the region-level (SA3) sheet.
    pub region_sheet: Option<String>,
    /// Name of the suburb-level sheet.
    pub suburb_sheet: Option<String>,
}

/// `[charts]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ChartsSection {
    /// Bars in the top-N chart.
    pub top_n: Option<usize>,
    /// Entities in the price-history line chart.
    pub series_limit: Option<usize>,
    /// Histogram bin count.
    pub histogram_bins: Option<usize>,
    /// Rows in the detail-table preview.
    pub detail_rows: Option<usize>,
}

/// `[export]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// Refuse exports larger than this many rows.
    pub max_rows: Option<usize>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    // -- Workbook --
    pub region_sheet: String,
    pub suburb_sheet: String,

    // -- Charts --
    pub top_n: usize,
    pub series_limit: usize,
    pub histogram_bins: usize,
    pub detail_rows: usize,

    // -- Export --
    pub max_export_rows: usize,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            region_sheet: constants::DEFAULT_REGION_SHEET.to_string(),
            suburb_sheet: constants::DEFAULT_SUBURB_SHEET.to_string(),
            top_n: constants::DEFAULT_TOP_N,
            series_limit: constants::DEFAULT_SERIES_LIMIT,
            histogram_bins: constants::DEFAULT_HISTOGRAM_BINS,
            detail_rows: constants::DEFAULT_DETAIL_ROWS,
            max_export_rows: constants::DEFAULT_MAX_EXPORT_ROWS,
            log_level: None,
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Load and validate `config.toml` from the platform config directory.
///
/// If the file does not exist, returns defaults with no warnings (first run).
pub fn load_config(paths: &PlatformPaths) -> (AppConfig, Vec<String>) {
    load_config_file(&paths.config_file())
}

/// Load and validate the config file at `path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// A missing file gives defaults silently; an unreadable or unparseable file
/// gives defaults plus a warning, so the application still starts but the
/// user is informed.
pub fn load_config_file(path: &Path) -> (AppConfig, Vec<String>) {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    match read_raw(path) {
        Ok(raw) => validate(raw),
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            (AppConfig::default(), vec![msg])
        }
    }
}

/// Load a config file the user named explicitly. Unlike the default
/// location, it must exist and parse.
pub fn load_explicit_config(path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    read_raw(path).map(validate)
}

fn read_raw(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let raw = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::info!(path = %path.display(), "Loaded config.toml");
    Ok(raw)
}

/// Validate each field against named constants, accumulating all problems.
fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings: Vec<String> = Vec::new();

    // -- Workbook: sheet names --
    if let Some(name) = raw.workbook.region_sheet {
        match check_sheet_name("workbook.region_sheet", name) {
            Ok(name) => config.region_sheet = name,
            Err(e) => warnings.push(fallback(e, constants::DEFAULT_REGION_SHEET)),
        }
    }
    if let Some(name) = raw.workbook.suburb_sheet {
        match check_sheet_name("workbook.suburb_sheet", name) {
            Ok(name) => config.suburb_sheet = name,
            Err(e) => warnings.push(fallback(e, constants::DEFAULT_SUBURB_SHEET)),
        }
    }

    // -- Charts --
    if let Some(n) = raw.charts.top_n {
        match check_range("charts.top_n", n, constants::MIN_TOP_N, constants::MAX_TOP_N) {
            Ok(n) => config.top_n = n,
            Err(e) => warnings.push(fallback(e, constants::DEFAULT_TOP_N)),
        }
    }
    if let Some(n) = raw.charts.series_limit {
        match check_range(
            "charts.series_limit",
            n,
            constants::MIN_SERIES_LIMIT,
            constants::MAX_SERIES_LIMIT,
        ) {
            Ok(n) => config.series_limit = n,
            Err(e) => warnings.push(fallback(e, constants::DEFAULT_SERIES_LIMIT)),
        }
    }
    if let Some(n) = raw.charts.histogram_bins {
        match check_range(
            "charts.histogram_bins",
            n,
            constants::MIN_HISTOGRAM_BINS,
            constants::MAX_HISTOGRAM_BINS,
        ) {
            Ok(n) => config.histogram_bins = n,
            Err(e) => warnings.push(fallback(e, constants::DEFAULT_HISTOGRAM_BINS)),
        }
    }
    if let Some(n) = raw.charts.detail_rows {
        match check_range(
            "charts.detail_rows",
            n,
            constants::MIN_DETAIL_ROWS,
            constants::MAX_DETAIL_ROWS,
        ) {
            Ok(n) => config.detail_rows = n,
            Err(e) => warnings.push(fallback(e, constants::DEFAULT_DETAIL_ROWS)),
        }
    }

    // -- Export: max_rows --
    if let Some(n) = raw.export.max_rows {
        match check_range("export.max_rows", n, 1, constants::ABSOLUTE_MAX_EXPORT_ROWS) {
            Ok(n) => config.max_export_rows = n,
            Err(e) => warnings.push(fallback(e, constants::DEFAULT_MAX_EXPORT_ROWS)),
        }
    }

    // -- Logging: level --
    if let Some(level) = raw.logging.level {
        let lower = level.trim().to_lowercase();
        if LOG_LEVELS.contains(&lower.as_str()) {
            config.log_level = Some(lower);
        } else {
            let e = ConfigError::ValueOutOfRange {
                field: "logging.level".to_string(),
                value: level,
                expected: LOG_LEVELS.join(", "),
            };
            warnings.push(fallback(e, constants::DEFAULT_LOG_LEVEL));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

fn check_range(field: &str, value: usize, min: usize, max: usize) -> Result<usize, ConfigError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::ValueOutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            expected: format!("{min}-{max}"),
        })
    }
}

fn check_sheet_name(field: &str, name: String) -> Result<String, ConfigError> {
    let trimmed = name.trim();
    if !trimmed.is_empty() && trimmed.chars().count() <= constants::MAX_SHEET_NAME_LENGTH {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::ValueOutOfRange {
            field: field.to_string(),
            value: name,
            expected: format!(
                "a sheet name of 1-{} characters",
                constants::MAX_SHEET_NAME_LENGTH
            ),
        })
    }
}

fn fallback(e: ConfigError, default: impl std::fmt::Display) -> String {
    format!("{e}. Using default ({default}).")
}

// SuburbExplorer - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors preserve the causal chain for diagnostic logging.
//
// Only `LoadError` is fatal to the pipeline. Everything downstream of a
// successful load degrades to empty / null results instead of erroring,
// except export I/O and writing the snapshot out. Single-entity lookups
// (`LookupError`) are shown in place and never reach the top level.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all SuburbExplorer operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum ExplorerError {
    /// Workbook loading or validation failed.
    Load(LoadError),

    /// Export operation failed.
    Export(ExportError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// The dashboard snapshot could not be written as JSON.
    Snapshot(serde_json::Error),
}

impl fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => write!(f, "Load error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Snapshot(e) => write!(f, "Snapshot output error: {e}"),
        }
    }
}

impl std::error::Error for ExplorerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Snapshot(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Load errors
// ---------------------------------------------------------------------------

/// Errors raised while reading the source workbook. All of them are fatal.
#[derive(Debug)]
pub enum LoadError {
    /// The workbook file does not exist.
    NotFound { path: PathBuf },

    /// The workbook exists but its metadata could not be read.
    Io { path: PathBuf, source: io::Error },

    /// The file could not be opened as a workbook (corrupt or unsupported).
    Open {
        path: PathBuf,
        source: calamine::Error,
    },

    /// A required sheet is not present in the workbook.
    MissingSheet {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },

    /// A sheet exists but its cells could not be read.
    Sheet {
        path: PathBuf,
        sheet: String,
        source: calamine::Error,
    },

    /// A sheet has no header row.
    EmptySheet { sheet: String },

    /// A required column is missing from a sheet's header row.
    MissingColumn {
        sheet: String,
        column: &'static str,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => {
                write!(f, "Workbook '{}' does not exist", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Cannot access workbook '{}': {source}", path.display())
            }
            Self::Open { path, source } => {
                write!(f, "Cannot open workbook '{}': {source}", path.display())
            }
            Self::MissingSheet {
                path,
                sheet,
                available,
            } => write!(
                f,
                "Workbook '{}' has no sheet named '{sheet}' (available: {})",
                path.display(),
                available.join(", ")
            ),
            Self::Sheet {
                path,
                sheet,
                source,
            } => write!(
                f,
                "Cannot read sheet '{sheet}' of '{}': {source}",
                path.display()
            ),
            Self::EmptySheet { sheet } => {
                write!(f, "Sheet '{sheet}' is empty (no header row)")
            }
            Self::MissingColumn { sheet, column } => {
                write!(f, "Sheet '{sheet}' is missing required column '{column}'")
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Open { source, .. } => Some(source),
            Self::Sheet { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<LoadError> for ExplorerError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

// ---------------------------------------------------------------------------
// Lookup errors
// ---------------------------------------------------------------------------

/// Errors from single-entity lookups. Recoverable: callers show a
/// placeholder state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No row in the current view carries this identifier.
    EntityNotFound { identifier: String },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntityNotFound { identifier } => {
                write!(f, "No row named '{identifier}' in the current view")
            }
        }
    }
}

impl std::error::Error for LookupError {}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// A requested column does not exist on the exported table.
    UnknownColumn { column: String, table: &'static str },

    /// Export would exceed maximum row count.
    TooManyRows { count: usize, max: usize },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::UnknownColumn { column, table } => {
                write!(f, "Column '{column}' does not exist on the {table} table")
            }
            Self::TooManyRows { count, max } => write!(
                f,
                "Export of {count} rows exceeds maximum of {max}. \
                 Apply filters to reduce the result set."
            ),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ExportError> for ExplorerError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors from reading config.toml. At the default location these only
/// become warnings; a file named with `--config` fails the run.
#[derive(Debug)]
pub enum ConfigError {
    /// The file is not valid TOML or a value has the wrong type.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A value is outside its allowed range or set.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// The file could not be read.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for ExplorerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Snapshot(e)
    }
}

/// Convenience type alias for SuburbExplorer results.
pub type Result<T> = std::result::Result<T, ExplorerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_missing_sheet_lists_available_sheets() {
        let err = LoadError::MissingSheet {
            path: PathBuf::from("market.xlsx"),
            sheet: "SA3".to_string(),
            available: vec!["Suburb".to_string(), "Notes".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'SA3'"), "{msg}");
        assert!(msg.contains("Suburb, Notes"), "{msg}");
    }

    #[test]
    fn test_top_level_error_preserves_source() {
        let inner = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: ExplorerError = LoadError::Io {
            path: PathBuf::from("market.xlsx"),
            source: inner,
        }
        .into();
        let load = err.source().expect("load error as source");
        assert!(load.source().is_some(), "io error should be chained");
        assert!(err.to_string().starts_with("Load error:"));
    }

    #[test]
    fn test_entity_not_found_message() {
        let err = LookupError::EntityNotFound {
            identifier: "Belconnen".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No row named 'Belconnen' in the current view"
        );
    }

    #[test]
    fn test_snapshot_write_failure_is_an_error() {
        struct Closed;
        impl io::Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let e = serde_json::to_writer_pretty(Closed, &vec!["Page"]).unwrap_err();
        let err: ExplorerError = e.into();
        assert!(matches!(err, ExplorerError::Snapshot(_)));
        assert!(err.to_string().starts_with("Snapshot output error:"), "{err}");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_result_alias_converts_with_question_mark() {
        fn read() -> Result<()> {
            Err(ConfigError::Io {
                path: PathBuf::from("config.toml"),
                source: io::Error::new(io::ErrorKind::NotFound, "missing"),
            })?;
            Ok(())
        }
        let err = read().unwrap_err();
        assert!(matches!(err, ExplorerError::Config(ConfigError::Io { .. })));
        assert!(err.to_string().starts_with("Configuration error:"), "{err}");
    }
}

// SuburbExplorer - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Configuration loading (platform config dir or --config)
// 3. Logging initialisation (debug mode support)
// 4. Workbook loading through the load cache
// 5. One dashboard cycle, printed as JSON, plus optional CSV export

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use suburb_explorer::app::cache::LoadCache;
use suburb_explorer::app::dashboard::{ChartSettings, Dashboard, DashboardSnapshot};
use suburb_explorer::app::state::ExplorerState;
use suburb_explorer::core::export::SortKey;
use suburb_explorer::core::loader::SheetNames;
use suburb_explorer::core::model::{Column, Granularity, Metric, TableKind};
use suburb_explorer::platform::config::{self, AppConfig, PlatformPaths};
use suburb_explorer::util::error::{ExplorerError, Result};
use suburb_explorer::util::{self, constants};

/// SuburbExplorer - suburb and SA3 real-estate market explorer.
///
/// Loads the region and suburb sheets of a market workbook, applies the
/// given filters, and prints headline metrics and chart series as JSON.
#[derive(Parser, Debug)]
#[command(name = "suburb-explorer", version, about)]
struct Cli {
    /// Workbook to load (.xlsx, .xls, .xlsb or .ods).
    workbook: PathBuf,

    /// Table to explore: region or suburb.
    #[arg(short = 't', long, default_value = "region")]
    table: TableKind,

    /// Level the --select values apply to: region, sub-region or suburb.
    #[arg(short = 'l', long, default_value = "region")]
    level: Granularity,

    /// Identifier to include (repeatable). None selects everything.
    #[arg(short = 's', long = "select")]
    select: Vec<String>,

    /// Lower bound on the median price.
    #[arg(long, value_parser = parse_bound)]
    price_min: Option<f64>,

    /// Upper bound on the median price.
    #[arg(long, value_parser = parse_bound)]
    price_max: Option<f64>,

    /// Lower bound on the yield.
    #[arg(long, value_parser = parse_bound)]
    yield_min: Option<f64>,

    /// Upper bound on the yield.
    #[arg(long, value_parser = parse_bound)]
    yield_max: Option<f64>,

    /// Entity to draw on the radar chart.
    #[arg(long)]
    radar: Option<String>,

    /// Metric for the distribution chart.
    #[arg(short = 'm', long, default_value = "median")]
    metric: Metric,

    /// Bars in the top-N chart (overrides config).
    #[arg(long)]
    top: Option<usize>,

    /// Entities in the price-history chart (overrides config).
    #[arg(long)]
    series: Option<usize>,

    /// Histogram bins (overrides config).
    #[arg(long)]
    bins: Option<usize>,

    /// Write the filtered detail table to this CSV file.
    #[arg(short = 'e', long)]
    export: Option<PathBuf>,

    /// Columns to export, comma-separated. Defaults to every column.
    #[arg(long, value_delimiter = ',', requires = "export")]
    columns: Vec<String>,

    /// Column to sort the detail table and export by.
    #[arg(long)]
    sort: Option<Column>,

    /// Sort descending.
    #[arg(long, requires = "sort")]
    desc: bool,

    /// Config file to use instead of the platform default.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // Config is read before logging so its level can take effect.
    let (app_config, config_warnings) = match &cli.config {
        Some(path) => match config::load_explicit_config(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                util::logging::init(cli.debug, None);
                fail(&ExplorerError::Config(e));
            }
        },
        None => config::load_config(&PlatformPaths::resolve()),
    };

    util::logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "SuburbExplorer starting"
    );
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Configuration warning");
    }

    if let Err(e) = run(&cli, &app_config, config_warnings) {
        fail(&e);
    }
}

fn run(cli: &Cli, app_config: &AppConfig, config_warnings: Vec<String>) -> Result<()> {
    let sheets = SheetNames {
        region: app_config.region_sheet.clone(),
        suburb: app_config.suburb_sheet.clone(),
    };

    let mut state = ExplorerState::new(sheets);
    state.warnings = config_warnings;
    state.table = cli.table;
    state.focus_metric = cli.metric;
    state.radar_target = cli.radar.clone();
    state.set_granularity(cli.level);
    state.select(cli.select.iter().cloned());
    state.set_price_bounds(cli.price_min, cli.price_max);
    state.set_yield_bounds(cli.yield_min, cli.yield_max);
    state.sort = cli.sort.map(|column| SortKey {
        column,
        descending: cli.desc,
    });

    let settings = ChartSettings {
        top_n: clamp_arg(
            "--top",
            cli.top,
            app_config.top_n,
            constants::MIN_TOP_N,
            constants::MAX_TOP_N,
        ),
        series_limit: clamp_arg(
            "--series",
            cli.series,
            app_config.series_limit,
            constants::MIN_SERIES_LIMIT,
            constants::MAX_SERIES_LIMIT,
        ),
        histogram_bins: clamp_arg(
            "--bins",
            cli.bins,
            app_config.histogram_bins,
            constants::MIN_HISTOGRAM_BINS,
            constants::MAX_HISTOGRAM_BINS,
        ),
        detail_rows: app_config.detail_rows,
    };

    let cache = LoadCache::new();
    let loaded = cache.get_or_load(&cli.workbook, &state.sheets)?;
    state.status_message = format!(
        "Loaded {} regions and {} suburbs",
        loaded.dataset.regions.len(),
        loaded.dataset.suburbs.len()
    );
    tracing::info!(status = %state.status_message, "Workbook ready");

    let dashboard = Dashboard::new(loaded.dataset, loaded.loaded_at, settings);
    let request = state.request();
    let snapshot = dashboard.snapshot(&request);

    for warning in &snapshot.warnings {
        tracing::warn!(warning = %warning, "View warning");
    }

    write_snapshot(std::io::stdout().lock(), &snapshot)?;

    if let Some(path) = &cli.export {
        let written =
            dashboard.export_csv(&request, &cli.columns, app_config.max_export_rows, path)?;
        eprintln!("Exported {written} rows to {}", path.display());
    }

    Ok(())
}

fn write_snapshot<W: Write>(mut out: W, snapshot: &DashboardSnapshot) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, snapshot)?;
    writeln!(out).map_err(serde_json::Error::io)?;
    Ok(())
}

/// Parse a range bound, refusing NaN and infinities.
fn parse_bound(value: &str) -> std::result::Result<f64, String> {
    let bound: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if bound.is_finite() {
        Ok(bound)
    } else {
        Err(format!("'{value}' is not a finite number"))
    }
}

/// Pick the CLI value if given and in range, else the configured value.
fn clamp_arg(
    flag: &str,
    value: Option<usize>,
    configured: usize,
    min: usize,
    max: usize,
) -> usize {
    match value {
        Some(v) if (min..=max).contains(&v) => v,
        Some(v) => {
            tracing::warn!(flag, value = v, min, max, "Out of range; using configured value");
            configured
        }
        None => configured,
    }
}

fn fail(e: &ExplorerError) -> ! {
    tracing::error!(error = %e, "SuburbExplorer failed");
    eprintln!("Error: {e}");
    std::process::exit(1);
}

//! OpenFOAM Residual Plot CLI
//!
//! Command-line front end for the residual-log-parser library. It adds:
//! - Chart appearance configuration (TOML)
//! - PNG rendering of the final residuals on a log scale
//! - User-facing error and success messages

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

mod config;
mod plot;

use config::ChartConfig;

/// Default solver log read from the working directory
const DEFAULT_LOG: &str = "log.foamRun";
/// Default chart written to the working directory
const DEFAULT_OUTPUT: &str = "residuals_plot.png";

/// Residual Plot - Chart OpenFOAM final residuals over time
#[derive(Parser, Debug)]
#[command(name = "residual-plot")]
#[command(about = "Plot final residuals from an OpenFOAM solver log", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the solver log
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_LOG)]
    log: PathBuf,

    /// Output PNG file (overwritten if it exists)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Path to chart configuration file (chart.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress log output except errors (the saved-plot line is still printed)
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Residual Plot CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using parser library v{}", residual_log_parser::VERSION);

    let chart_config = match &args.config {
        Some(path) => {
            log::info!("Loading chart configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => ChartConfig::default(),
    };

    plot_residuals(&args.log, &args.output, &chart_config)?;

    println!("Residual plot saved to '{}'", args.output.display());

    Ok(())
}

/// Extract residuals from `log_path` and render them to `output`
fn plot_residuals(log_path: &Path, output: &Path, chart_config: &ChartConfig) -> Result<()> {
    let table = residual_log_parser::extract_file(log_path)?;

    for (variable, len) in table.misaligned_series() {
        log::warn!(
            "{} has {} residual(s) for {} time step(s); lines may be misaligned",
            variable.series_key(),
            len,
            table.time().len()
        );
    }

    plot::render(&table, output, chart_config)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

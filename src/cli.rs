//! Command-line interface components.

use crate::config::CorrectionConfig;
use crate::events::{EventCorrector, ManifestDecoder, collect_events, improved_catalog_path};
use crate::models::{IntegrityWarning, StreamStats};
use crate::reference::{CorrectionMode, ReferenceTrackLoader};
use crate::stream::StreamCorrector;
use crate::table::Table;
use crate::time::TimeNormalizer;
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "gnss_matcher")]
#[command(about = "Replace field-instrument positions with post-processed GNSS fixes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Correct a continuous magnaprobe logger file
    Magnaprobe(StreamArgs),
    /// Correct a catalog of snow micro-penetrometer profiles
    Smp(EventArgs),
}

/// Options shared by every command
#[derive(ClapArgs, Debug, Clone)]
pub struct CommonArgs {
    /// GPS to UTC leap second offset
    #[arg(long, value_name = "SECONDS", allow_hyphen_values = true)]
    pub leap_seconds: Option<i64>,

    /// Preamble lines before the column titles of the correction file
    #[arg(long, value_name = "LINES")]
    pub reference_skip_lines: Option<usize>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl CommonArgs {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Build and validate the run configuration
    pub fn to_config(&self, mode: CorrectionMode) -> Result<CorrectionConfig> {
        let mut config = CorrectionConfig::default();
        if let Some(seconds) = self.leap_seconds {
            config = config.with_leap_seconds(seconds);
        }
        if let Some(lines) = self.reference_skip_lines {
            match mode {
                CorrectionMode::FixedColumn => config.fixed_column.skip_lines = lines,
                CorrectionMode::WhitespaceReport => config.whitespace_report.skip_lines = lines,
            }
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct StreamArgs {
    /// Magnaprobe logger file
    #[arg(short = 'm', long = "filemagna", value_name = "FILE")]
    pub stream_path: PathBuf,

    /// Post-processed GNSS position file
    #[arg(short = 'p', long = "filepos", value_name = "FILE")]
    pub reference_path: PathBuf,

    /// Corrected output file
    #[arg(short = 'n', long = "newfile", value_name = "FILE")]
    pub output_path: PathBuf,

    /// Correction file type (PPK_correction or PPP_correction)
    #[arg(short = 'c', long = "correction", value_name = "TYPE")]
    pub correction: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EventArgs {
    /// Directory of profile files
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub profile_dir: PathBuf,

    /// Post-processed GNSS position file
    #[arg(short = 'p', long = "filepos", value_name = "FILE")]
    pub reference_path: PathBuf,

    /// Catalog of expected profiles with a `file` column
    #[arg(short = 'e', long = "catalog", alias = "excel", value_name = "FILE")]
    pub catalog_path: PathBuf,

    /// Decoded profile manifest (name,timestamp,latitude,longitude)
    #[arg(long = "decoded", value_name = "FILE")]
    pub manifest_path: PathBuf,

    /// Correction file type (PPK_correction or PPP_correction)
    #[arg(short = 'c', long = "correction", value_name = "TYPE")]
    pub correction: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl Command {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Command::Magnaprobe(args) => &args.common,
            Command::Smp(args) => &args.common,
        }
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(common: &CommonArgs) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = common.get_log_level();

    // Create filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gnss_matcher={}", log_level)));

    // Set up subscriber based on output format preference
    if common.quiet {
        // Minimal logging for quiet mode
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        // Standard logging with timestamps
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}

/// Dispatch the parsed command
pub fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Magnaprobe(stream_args) => run_stream(&stream_args).map(|_| ()),
        Command::Smp(event_args) => run_events(&event_args).map(|_| ()),
    }
}

/// Correct a logger file and write the corrected table
pub fn run_stream(args: &StreamArgs) -> Result<StreamStats> {
    let mode: CorrectionMode = args.correction.parse()?;
    let config = args.common.to_config(mode)?;

    println!(
        "{} {}",
        "Processing logger file".bright_green().bold(),
        args.stream_path.display()
    );

    let track = ReferenceTrackLoader::new(&config)
        .load(&args.reference_path, mode)
        .with_context(|| format!("Cannot build reference track from {}", args.reference_path.display()))?;

    let table = StreamCorrector::read_stream(&args.stream_path, &config.stream)
        .with_context(|| format!("Cannot read logger file {}", args.stream_path.display()))?;

    let outcome = StreamCorrector::new(&track, &config.stream, TimeNormalizer::new(config.leap_seconds))
        .with_source(&args.stream_path)
        .correct(&table)
        .with_context(|| format!("Cannot correct {}", args.stream_path.display()))?;

    outcome.table.write_csv_atomic(&args.output_path)?;

    println!(
        "  {} {} of {} rows ({} outside the GNSS time span)",
        "Corrected".bright_cyan(),
        outcome.stats.rows_retained.to_string().bright_white().bold(),
        outcome.stats.rows_read,
        outcome.stats.rows_outside_track
    );
    println!("  {} {}", "Output:".bright_cyan(), args.output_path.display());

    Ok(outcome.stats)
}

/// Correct a profile catalog and write `<catalog>_improved`
pub fn run_events(args: &EventArgs) -> Result<Vec<IntegrityWarning>> {
    let mode: CorrectionMode = args.correction.parse()?;
    let config = args.common.to_config(mode)?;

    println!(
        "{} {}",
        "Processing profile directory".bright_green().bold(),
        args.profile_dir.display()
    );

    let decoder = ManifestDecoder::from_path(&args.manifest_path)?;
    let events = collect_events(
        &args.profile_dir,
        &config.events,
        &decoder,
        TimeNormalizer::new(config.leap_seconds),
    )?;

    let track = ReferenceTrackLoader::new(&config)
        .load(&args.reference_path, mode)
        .with_context(|| format!("Cannot build reference track from {}", args.reference_path.display()))?;

    let catalog = Table::read_csv(&args.catalog_path, 0)
        .with_context(|| format!("Cannot read catalog {}", args.catalog_path.display()))?;

    let outcome = EventCorrector::new(&track, &config.events)
        .with_source(&args.catalog_path)
        .correct(&catalog, &events)?;

    let output_path = improved_catalog_path(&args.catalog_path, &config.events.output_suffix);
    outcome.table.write_csv_atomic(&output_path)?;

    println!(
        "  {} {} of {} catalog rows",
        "Mapped".bright_cyan(),
        outcome.mapped_count().to_string().bright_white().bold(),
        catalog.len()
    );
    for warning in &outcome.warnings {
        println!("  {} {}", "Warning:".bright_yellow(), warning);
    }
    println!("  {} {}", "Output:".bright_cyan(), output_path.display());

    Ok(outcome.warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_magnaprobe_command() {
        let args = Args::try_parse_from([
            "gnss_matcher",
            "magnaprobe",
            "-m",
            "magna.dat",
            "-p",
            "rover.pos",
            "-n",
            "out.csv",
            "-c",
            "PPK_correction",
            "-vv",
        ])
        .unwrap();

        match &args.command {
            Command::Magnaprobe(stream) => {
                assert_eq!(stream.stream_path, PathBuf::from("magna.dat"));
                assert_eq!(stream.correction, "PPK_correction");
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(args.command.common().get_log_level(), "debug");
    }

    #[test]
    fn test_parse_smp_command_with_excel_alias() {
        let args = Args::try_parse_from([
            "gnss_matcher",
            "smp",
            "-d",
            "profiles",
            "-p",
            "rover.sum",
            "--excel",
            "records.csv",
            "--decoded",
            "profiles.csv",
            "-c",
            "PPP_correction",
            "--leap-seconds",
            "19",
        ])
        .unwrap();

        let Command::Smp(events) = &args.command else {
            panic!("expected smp command");
        };
        assert_eq!(events.catalog_path, PathBuf::from("records.csv"));
        let config = events.common.to_config(CorrectionMode::WhitespaceReport).unwrap();
        assert_eq!(config.leap_seconds.0, 19);
    }

    #[test]
    fn test_missing_required_flag() {
        let result = Args::try_parse_from(["gnss_matcher", "magnaprobe", "-m", "magna.dat"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_skip_lines_override_follows_mode() {
        let common = CommonArgs {
            leap_seconds: None,
            reference_skip_lines: Some(12),
            verbose: 0,
            quiet: false,
        };

        let config = common.to_config(CorrectionMode::FixedColumn).unwrap();
        assert_eq!(config.fixed_column.skip_lines, 12);
        assert_eq!(config.whitespace_report.skip_lines, 3);
    }
}

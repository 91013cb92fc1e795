use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use period_engine::{
    build_channel_table, merge_periods, parse_reference_now, percentage_change,
    previous_period, previous_period_from_str, range_from_query, resolve_frame, CategoryMetrics,
    CategoryTotals, ChannelTable, DateRange, PercentChange, ResolveOptions, TimeFrame,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

mod config;

use config::Config;

#[derive(Parser)]
#[command(
    name = "periods",
    version,
    about = "Resolve dashboard date ranges and compare sales channel periods"
)]
struct Cli {
    /// TOML configuration file ([resolve], [table], [logging])
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a range token to concrete dates
    Resolve {
        #[command(flatten)]
        window: WindowArgs,

        /// Also print the previous period of equal length
        #[arg(long)]
        compare: bool,
    },
    /// Print the period of equal length preceding START..END
    Previous {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        end: String,
    },
    /// Percentage change from PREVIOUS to CURRENT
    Change {
        #[arg(allow_hyphen_values = true)]
        current: Decimal,
        #[arg(allow_hyphen_values = true)]
        previous: Decimal,
    },
    /// Merge per-channel totals of two periods and render the channel table
    Channels {
        #[command(flatten)]
        window: WindowArgs,

        /// JSON rows for the current period
        #[arg(long)]
        current: PathBuf,

        /// JSON rows for the previous period
        #[arg(long)]
        previous: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

#[derive(clap::Args)]
struct WindowArgs {
    /// Range token, e.g. last-30-days (unknown tokens use the default)
    #[arg(long, conflicts_with = "query")]
    range: Option<String>,

    /// URL query string carrying a `range` parameter
    #[arg(long)]
    query: Option<String>,

    /// Reference instant: RFC 3339 or YYYY-MM-DD (default: now)
    #[arg(long)]
    now: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Serialize)]
struct ResolveOutput {
    range: TimeFrame,
    current: DateRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous: Option<DateRange>,
}

#[derive(Serialize)]
struct ChangeOutput {
    change: PercentChange,
    indicator: String,
}

#[derive(Serialize)]
struct ChannelsOutput {
    range: TimeFrame,
    current: DateRange,
    previous: DateRange,
    metrics: Vec<CategoryMetrics>,
    table: ChannelTable,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    config.logging.init();

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &Config) -> Result<()> {
    let options = config.resolve_options()?;

    match command {
        Command::Resolve { window, compare } => {
            let (frame, current) = resolve_window(&window, &options)?;
            let previous = compare.then(|| previous_period(current.start_date, current.end_date));
            print_json(&ResolveOutput {
                range: frame,
                current,
                previous,
            })
        }
        Command::Previous { start, end } => print_json(&previous_period_from_str(&start, &end)?),
        Command::Change { current, previous } => {
            let change = percentage_change(current, previous);
            print_json(&ChangeOutput {
                change,
                indicator: change.to_string(),
            })
        }
        Command::Channels {
            window,
            current,
            previous,
            format,
        } => {
            let (frame, current_range) = resolve_window(&window, &options)?;
            let previous_range = previous_period(current_range.start_date, current_range.end_date);
            info!(
                range = %frame,
                start = %current_range.formatted_start_date,
                end = %current_range.formatted_end_date,
                "comparing channel periods"
            );

            let (current_rows, previous_rows) = read_both(&current, &previous)?;
            let metrics = merge_periods(
                &current_range,
                &current_rows,
                &previous_range,
                &previous_rows,
            );
            let table = build_channel_table(&metrics, &config.table_options())?;

            match format {
                OutputFormat::Json => print_json(&ChannelsOutput {
                    range: frame,
                    current: current_range,
                    previous: previous_range,
                    metrics,
                    table,
                }),
                OutputFormat::Table => {
                    println!("{}", current_range.display_text);
                    println!("vs {}", previous_range.display_text);
                    println!();
                    println!("{}", table.render_text());
                    Ok(())
                }
            }
        }
    }
}

/// Pick the range token from `--range` or `--query` and resolve it.
fn resolve_window(
    window: &WindowArgs,
    options: &ResolveOptions,
) -> Result<(TimeFrame, DateRange)> {
    let token = match (&window.range, &window.query) {
        (Some(range), _) => Some(range.clone()),
        (None, Some(query)) => range_from_query(query),
        (None, None) => None,
    };
    let now = reference_now(window.now.as_deref())?;
    let frame = TimeFrame::from_token_or(token.as_deref(), options.default_frame);
    debug!(token = ?token, frame = %frame, now = %now, "resolving window");
    Ok((frame, resolve_frame(frame, now, options)))
}

fn reference_now(arg: Option<&str>) -> Result<DateTime<Utc>> {
    match arg {
        Some(s) => parse_reference_now(s).context("invalid --now"),
        None => Ok(Utc::now()),
    }
}

/// Read the two period inputs in parallel; either failure fails the command.
fn read_both(
    current: &Path,
    previous: &Path,
) -> Result<(Vec<CategoryTotals>, Vec<CategoryTotals>)> {
    std::thread::scope(|scope| {
        let previous_rows = scope.spawn(|| read_totals(previous));
        let current_rows = read_totals(current);
        let previous_rows = previous_rows
            .join()
            .map_err(|_| anyhow::anyhow!("reader thread panicked"))?;
        Ok((current_rows?, previous_rows?))
    })
}

fn read_totals(path: &Path) -> Result<Vec<CategoryTotals>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let rows: Vec<CategoryTotals> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    debug!(path = %path.display(), rows = rows.len(), "loaded period totals");
    Ok(rows)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

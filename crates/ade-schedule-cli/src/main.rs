//! ade-schedule CLI
//!
//! Reads an ADE iCalendar export from a file or stdin, applies the schedule
//! filters and prints the chosen pipeline stage as JSON.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use ade_schedule::{FilterConfig, Pipeline};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Extract class schedules from ADE iCalendar exports
#[derive(Parser, Debug)]
#[command(name = "ade-schedule")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// ICS file to read (`-` or omitted for stdin)
    input: Option<PathBuf>,

    /// Pipeline stage to print
    #[arg(short, long, value_enum, default_value_t = Stage::Merged)]
    stage: Stage,

    /// Keep events starting and ending at or after this instant
    /// (RFC 3339, or YYYY-MM-DD for the start of that day)
    #[arg(long)]
    from: Option<String>,

    /// Keep events starting and ending at or before this instant
    /// (RFC 3339, or YYYY-MM-DD for the end of that day)
    #[arg(long)]
    to: Option<String>,

    /// Class code used to recognise group lines (inferred when omitted)
    #[arg(short, long)]
    class: Option<String>,

    /// Keep only events attended by this group letter
    #[arg(short, long)]
    group: Option<String>,

    /// Keep only events held in this room
    #[arg(short, long)]
    location: Option<String>,

    /// IANA timezone for floating event times and plain dates
    #[arg(short, long, default_value = "UTC", value_parser = parse_timezone)]
    timezone: Tz,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Verbosity level (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Stage {
    Raw,
    Parsed,
    Merged,
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Start,
    End,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let text = read_input(cli.input.as_ref())?;
    let config = build_config(&cli)?;
    tracing::info!(?config, stage = ?cli.stage, "running pipeline");

    let mut pipeline = Pipeline::from_source(text)?;
    pipeline.configure(config);

    let json = match cli.stage {
        Stage::Raw => render(&pipeline.raw_events(), cli.pretty)?,
        Stage::Parsed => render(&pipeline.parsed_events()?, cli.pretty)?,
        Stage::Merged => render(&pipeline.merged_events()?, cli.pretty)?,
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}").context("failed to write output")?;
    Ok(())
}

/// `RUST_LOG` wins; otherwise each `-v` raises the level one step from `warn`.
fn log_filter_from_verbosity(verbose: u8) -> EnvFilter {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn init_tracing(verbose: u8) {
    tracing_subscriber::registry()
        .with(log_filter_from_verbosity(verbose))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

fn build_config(cli: &Cli) -> Result<FilterConfig> {
    let tz = cli.timezone;
    Ok(FilterConfig {
        from: cli
            .from
            .as_deref()
            .map(|s| parse_bound(s, tz, Bound::Start))
            .transpose()
            .context("invalid --from")?,
        to: cli
            .to
            .as_deref()
            .map(|s| parse_bound(s, tz, Bound::End))
            .transpose()
            .context("invalid --to")?,
        class: cli.class.clone(),
        group: cli.group.clone(),
        location: cli.location.clone(),
        timezone: tz,
    })
}

fn parse_timezone(s: &str) -> std::result::Result<Tz, String> {
    s.parse::<Tz>()
        .map_err(|_| format!("unknown IANA timezone '{s}'"))
}

/// RFC 3339 instant, or a plain date widened to the start or end of that day in `tz`.
fn parse_bound(s: &str, tz: Tz, bound: Bound) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("expected RFC 3339 or YYYY-MM-DD, got '{s}'"))?;
    let time = match bound {
        Bound::Start => NaiveTime::MIN,
        Bound::End => NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
    };
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("'{s}' has no such local time in {tz}"))
}

fn render<T: serde::Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("failed to serialize output")
}

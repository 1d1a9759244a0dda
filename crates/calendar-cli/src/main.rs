//! `calsvc` CLI — list and create calendar events, and compute free time.
//!
//! ## Usage
//!
//! ```sh
//! # Authorize (opens the consent flow on first run, refreshes afterwards)
//! calsvc auth
//!
//! # Events from the past week
//! calsvc events
//!
//! # Create a one-hour meeting and invite someone
//! calsvc create --summary "Test Meeting" --start 2026-03-03T10:00:00Z \
//!     --duration 60 --attendee example@example.com
//!
//! # Free slots tomorrow between 09:00 and 17:00 (configured timezone)
//! calsvc availability --from 2026-03-03T09:00:00 --to 2026-03-03T17:00:00
//!
//! # Offline: free slots from a busy list on stdin
//! echo '[{"start":"2026-03-03T10:00:00Z","end":"2026-03-03T11:00:00Z"}]' \
//!     | calsvc slots --from 2026-03-03T09:00:00Z --to 2026-03-03T12:00:00Z
//! ```
//!
//! Settings come from `--config` (a `KEY=VALUE` file) and `CALENDAR_*` environment
//! variables; see `calendar_backend::config`.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use availability_engine::{
    availability_report, format_timestamp, parse_timestamp, AvailabilityReport, TimeInterval,
};
use calendar_backend::models::BusyPeriod;
use calendar_backend::service::parse_in_zone;
use calendar_backend::{
    Authenticator, BackendConfig, CalendarService, CreateEventRequest, EventRequest,
    GoogleCalendarClient,
};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "calsvc",
    version,
    about = "Calendar events and free/busy availability"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// KEY=VALUE settings file (CALENDAR_CREDENTIALS, CALENDAR_TIMEZONE, ...)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize access and cache the token
    Auth,
    /// List events (default: the past seven days)
    Events {
        /// Window start (default: seven days ago)
        #[arg(long)]
        from: Option<String>,
        /// Window end (default: now)
        #[arg(long)]
        to: Option<String>,
        /// Calendar to read (default: the configured calendar)
        #[arg(long)]
        calendar: Option<String>,
        /// Maximum number of events
        #[arg(long)]
        max: Option<u32>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Create an event and notify attendees
    Create {
        #[arg(long)]
        summary: String,
        /// Start time; values without an offset use the configured timezone
        #[arg(long)]
        start: String,
        /// Length in minutes
        #[arg(long, default_value_t = 30)]
        duration: i64,
        #[arg(long, default_value = "")]
        description: String,
        /// Attendee email (repeatable)
        #[arg(long = "attendee")]
        attendees: Vec<String>,
    },
    /// Free slots of a calendar, from the free/busy API
    Availability {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        calendar: Option<String>,
        /// Only show slots at least this many minutes long
        #[arg(long)]
        min_duration: Option<i64>,
        /// Print the full busy/free report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Free slots from a busy list in a file or on stdin (no network)
    Slots {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// JSON busy list (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Only show slots at least this many minutes long
        #[arg(long)]
        min_duration: Option<i64>,
        /// Print the full busy/free report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Accepted busy list shapes: a bare array, or the per-calendar object of a free/busy
/// response (`{"busy": [...]}`).
#[derive(Deserialize)]
#[serde(untagged)]
enum BusyInput {
    List(Vec<BusyPeriod>),
    Calendar { busy: Vec<BusyPeriod> },
}

impl BusyInput {
    fn into_periods(self) -> Vec<BusyPeriod> {
        match self {
            BusyInput::List(periods) | BusyInput::Calendar { busy: periods } => periods,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Slots {
            from,
            to,
            input,
            min_duration,
            json,
        } => run_slots(&from, &to, input, min_duration, json),
        command => run_online(command, cli.config).await,
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Ignore the error if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

async fn run_online(command: Commands, config_file: Option<PathBuf>) -> Result<()> {
    let config = BackendConfig::load(config_file.as_deref()).context("Failed to load configuration")?;
    debug!(
        credentials = %config.credentials_path.display(),
        token = %config.token_path.display(),
        timezone = %config.timezone,
        "configuration_loaded"
    );
    let auth = Authenticator::from_config(&config).context("Failed to set up authentication")?;
    let client = GoogleCalendarClient::new(config.api_base.clone(), auth);
    let service = CalendarService::from_config(client, &config)?;
    let zone = service.timezone();

    match command {
        Commands::Auth => {
            let token = service
                .backend()
                .tokens()
                .authenticate()
                .await
                .context("Authentication failed")?;
            let expiry = token
                .expiry
                .map(|e| format_timestamp(&e))
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "Authenticated. Token saved to {} (expires {}).",
                config.token_path.display(),
                expiry
            );
        }
        Commands::Events {
            from,
            to,
            calendar,
            max,
            json,
        } => {
            let request = EventRequest {
                time_min: from.as_deref().map(|s| parse_in_zone(s, zone)).transpose()?,
                time_max: to.as_deref().map(|s| parse_in_zone(s, zone)).transpose()?,
                calendar_id: calendar,
                max_results: max,
            };
            let events = service.get_events(&request).await.context("Failed to list events")?;
            let summaries = service.get_event_summaries(&events);

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else if summaries.is_empty() {
                println!("No events found.");
            } else {
                for event in &summaries {
                    println!("Summary: {}", event.summary);
                    println!("Start: {}", event.start);
                    println!("End: {}\n", event.end);
                }
            }
        }
        Commands::Create {
            summary,
            start,
            duration,
            description,
            attendees,
        } => {
            let request = CreateEventRequest {
                duration_minutes: duration,
                description,
                attendees,
                ..CreateEventRequest::new(summary, start)
            };
            let created = service
                .create_event(&request)
                .await
                .context("Failed to create event")?;
            println!(
                "Event created: {}",
                created.html_link.as_deref().unwrap_or("(no link)")
            );
        }
        Commands::Availability {
            from,
            to,
            calendar,
            min_duration,
            json,
        } => {
            let report = service
                .availability_report(&from, &to, calendar.as_deref())
                .await
                .context("Failed to compute availability")?;
            print_report(report, min_duration, json)?;
        }
        Commands::Slots { .. } => unreachable!("handled without network access"),
    }

    Ok(())
}

fn run_slots(
    from: &str,
    to: &str,
    input: Option<PathBuf>,
    min_duration: Option<i64>,
    json: bool,
) -> Result<()> {
    let time_min = parse_timestamp(from).with_context(|| format!("Invalid --from: {from}"))?;
    let time_max = parse_timestamp(to).with_context(|| format!("Invalid --to: {to}"))?;

    let raw = read_input(input)?;
    let parsed: BusyInput = serde_json::from_str(&raw).context("Failed to parse busy list JSON")?;
    let busy = parsed
        .into_periods()
        .iter()
        .map(BusyPeriod::to_interval)
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid busy interval")?;

    let report = availability_report(time_min, time_max, &busy)
        .context("Failed to compute free slots")?;
    print_report(report, min_duration, json)
}

/// `--min-duration` drops short free slots from both the text and the JSON output.
fn print_report(
    mut report: AvailabilityReport,
    min_duration: Option<i64>,
    json: bool,
) -> Result<()> {
    if let Some(min) = min_duration {
        report.free = report.free_at_least(min);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_slots(&report.free);
    }
    Ok(())
}

fn print_slots(slots: &[TimeInterval]) {
    if slots.is_empty() {
        println!("No free time in range.");
        return;
    }
    for slot in slots {
        println!(
            "{} - {} ({} min)",
            format_timestamp(&slot.start),
            format_timestamp(&slot.end),
            slot.duration_minutes()
        );
    }
}

fn read_input(path: Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

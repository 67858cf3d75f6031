use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tutor_schedule::{
    model::parse_timezone, parse_time_label, partition_by_conflict, slots_for_snapshot,
    AvailabilitySnapshot, Frequency, Occurrence, RecurrencePlan, Resolution,
};

mod settings;

use settings::Settings;

#[derive(Parser)]
#[command(
    name = "tutor-schedule",
    version,
    about = "Compute bookable tutor slots and preview recurring bookings"
)]
struct Cli {
    /// TOML configuration file (defaults to ./tutor-schedule.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List bookable start times on a date
    Slots {
        /// Availability snapshot JSON file, or "-" for stdin
        #[arg(short, long)]
        input: String,

        /// Calendar date (YYYY-MM-DD) in the tutor's zone
        #[arg(short, long)]
        date: NaiveDate,

        /// Session length in minutes
        #[arg(long)]
        duration: Option<u32>,

        /// Reference instant (RFC 3339); defaults to the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },

    /// Expand a booking into occurrences and check them for conflicts
    Plan {
        /// First session's date (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,

        /// Start time label, e.g. "2:00 PM"
        #[arg(short, long)]
        time: String,

        /// once, weekly or biweekly
        #[arg(short, long, default_value = "once")]
        frequency: Frequency,

        /// Number of occurrences
        #[arg(short, long, default_value_t = 1)]
        count: u32,

        /// Session length in minutes
        #[arg(long)]
        duration: Option<u32>,

        /// IANA zone; overrides the snapshot's and the configured zone
        #[arg(long)]
        timezone: Option<String>,

        /// Availability snapshot JSON file, or "-" for stdin, to check conflicts against
        #[arg(short, long)]
        input: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanReport {
    occurrences: Vec<Occurrence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    conflicts: Option<Vec<Occurrence>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_sessions: Option<Vec<Occurrence>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<Resolution>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    init_tracing(&settings.log_level);

    let output = match cli.command {
        Command::Slots {
            input,
            date,
            duration,
            now,
        } => {
            let snapshot = read_snapshot(&input)?;
            let duration = duration.unwrap_or(settings.scheduling.default_duration_minutes);
            let now = now.unwrap_or_else(Utc::now);
            let slots = slots_for_snapshot(&snapshot, date, duration, now, &settings.scheduling)?;
            tracing::info!(%date, duration, slots = slots.len(), "slots computed");
            serde_json::to_string_pretty(&slots)?
        }
        Command::Plan {
            date,
            time,
            frequency,
            count,
            duration,
            timezone,
            input,
        } => {
            let snapshot = input.as_deref().map(read_snapshot).transpose()?;
            let tz = match (&timezone, &snapshot) {
                (Some(tz), _) => parse_timezone(tz)?,
                (None, Some(snap)) => snap.timezone_or(&settings.scheduling.timezone)?,
                (None, None) => parse_timezone(&settings.scheduling.timezone)?,
            };
            let duration = duration.unwrap_or(settings.scheduling.default_duration_minutes);

            let plan = RecurrencePlan::with_max(
                date,
                parse_time_label(&time)?,
                frequency,
                count,
                settings.scheduling.max_occurrences,
            )?;
            let occurrences = plan.expand(&tz);

            let report = match snapshot {
                Some(snap) => {
                    let set = partition_by_conflict(&occurrences, &snap.occupied(), duration);
                    let resolution = set.resolution();
                    PlanReport {
                        occurrences,
                        conflicts: Some(set.conflicts),
                        valid_sessions: Some(set.valid_sessions),
                        resolution: Some(resolution),
                    }
                }
                None => PlanReport {
                    occurrences,
                    conflicts: None,
                    valid_sessions: None,
                    resolution: None,
                },
            };
            serde_json::to_string_pretty(&report)?
        }
    };

    println!("{output}");
    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_snapshot(source: &str) -> Result<AvailabilitySnapshot> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read snapshot from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("failed to read snapshot file '{source}'"))?
    };
    serde_json::from_str(&raw).context("invalid availability snapshot JSON")
}

//! Offline inspector for the cadence state file.
//!
//! Reads the persisted reminder record directly, without a running daemon,
//! and reports the phase, the next fire in local time, the countdown, and
//! whether the daemon will have to self-heal when it next looks.

mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use colored::Colorize;

use cadence::api_client::types::format_countdown;
use cadence::clock::{Clock, SystemClock};
use cadence::config::DaemonConfig;
use cadence::store::{FileStore, StateStore};
use cadence::types::{AlarmPhase, SoundSelection};

use report::{Timing, assess, format_instant};

#[derive(Parser, Debug)]
#[command(name = "cadence-inspect")]
#[command(about = "Inspect the persisted state of the cadence reminder")]
struct Args {
    /// State file to read. Defaults to the daemon's, per CADENCE_STATE_DIR.
    file: Option<PathBuf>,

    /// Show times in 12-hour format
    #[arg(long = "12h")]
    twelve_hour: bool,

    /// Seconds past the fire instant before the record counts as stale
    #[arg(long, default_value_t = 30)]
    grace_secs: u64,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    let path = match args.file {
        Some(path) => path,
        None => DaemonConfig::from_env()?.state_file(),
    };
    let store = FileStore::at(&path);

    let state = store
        .load()
        .with_context(|| format!("failed to read {}", path.display()))?;
    let preferences = store.load_preferences()?;

    let now_ms = SystemClock::new().now_millis();
    let grace_ms = i64::try_from(args.grace_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
    let report = assess(&state, now_ms, grace_ms);

    println!("{} {}", "State file:".bold(), path.display());

    let phase = match report.phase {
        AlarmPhase::Idle => "idle".dimmed(),
        AlarmPhase::Armed => "armed".green().bold(),
        AlarmPhase::Ringing => "ringing".yellow().bold(),
    };
    println!("{} {}", "Phase:     ".bold(), phase);
    println!("{} {} min", "Interval:  ".bold(), report.interval_minutes);

    if let Some(next) = report.next_fire_ms {
        println!(
            "{} {}",
            "Next fire: ".bold(),
            format_instant(next, &Local, args.twelve_hour)
        );
    }

    match report.timing {
        Timing::Idle => {}
        Timing::Pending { remaining_secs } => {
            println!("{} {}", "Remaining: ".bold(), format_countdown(remaining_secs));
        }
        Timing::Due { late_secs } => {
            println!(
                "{} due {} ago, delivery may be in flight",
                "Remaining: ".bold(),
                format_countdown(late_secs)
            );
        }
        Timing::Stale { late_secs } => {
            println!(
                "{} {}",
                "Warning:   ".red().bold(),
                format!(
                    "fire missed by {}; the daemon will reschedule it",
                    format_countdown(late_secs)
                )
                .red()
            );
        }
        Timing::Ringing => {
            println!("{} alert window open", "Remaining: ".bold());
        }
    }

    if report.inconsistent {
        println!(
            "{} {}",
            "Warning:   ".red().bold(),
            "record is inconsistent; the daemon repairs it on start".red()
        );
    }

    let sound = match &preferences.sound {
        SoundSelection::Default => "default".to_string(),
        SoundSelection::Silent => "silent".to_string(),
        SoundSelection::Uri(uri) => uri.clone(),
    };
    println!("{} {}", "Sound:     ".bold(), sound);
    println!(
        "{} {}",
        "Vibration: ".bold(),
        if preferences.vibration_enabled { "on" } else { "off" }
    );

    Ok(())
}

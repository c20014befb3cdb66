//! Command-line interface for cadence.
//!
//! This binary provides a CLI for controlling and monitoring the reminder
//! daemon via the HTTP API.

use std::env;

use anyhow::{Context, Result, bail};
use time::UtcOffset;

use cadence::api_client::{
    self,
    types::{AlertPreferences, ArmRequest, ReminderState},
};
use cadence::clock::{format_time_of_day, from_epoch_millis};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        usage();
        std::process::exit(1);
    }

    // Resolved before the runtime starts any threads.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?
        .block_on(dispatch(&args[1], &args[2..], offset))
}

fn usage() {
    eprintln!("Usage: cadence-cli <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  status [--12h]                  Show reminder state and countdown");
    eprintln!("  arm <minutes> [--at HH:MM]      Start the reminder");
    eprintln!("  disarm                          Stop the reminder");
    eprintln!("  ack                             Dismiss the ringing alert");
    eprintln!("  reconcile                       Run the self-heal check now");
    eprintln!("  test                            Show a test alert");
    eprintln!("  prefs [--sound S] [--vibrate on|off]");
    eprintln!("                                  Show or change alert preferences");
    eprintln!("                                  (S: default, silent, or a sound URI)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CADENCE_API_URL    API base URL (default: http://127.0.0.1:7786)");
}

async fn dispatch(command: &str, args: &[String], offset: UtcOffset) -> Result<()> {
    match command {
        "status" => cmd_status(args, offset).await,
        "arm" => cmd_arm(args, offset).await,
        "disarm" => {
            let state = make_client().disarm().await?;
            print_state(&state, offset, false);
            Ok(())
        }
        "ack" => {
            let state = make_client().acknowledge().await?;
            print_state(&state, offset, false);
            Ok(())
        }
        "reconcile" => {
            let resp = make_client().reconcile().await?;
            println!("Outcome: {}", resp.outcome);
            print_state(&resp.state, offset, false);
            Ok(())
        }
        "test" => {
            make_client().test_alert().await?;
            println!("Test alert shown");
            Ok(())
        }
        "prefs" => cmd_prefs(args).await,
        _ => {
            eprintln!("Unknown command: {}", command);
            eprintln!("Run without arguments to see usage.");
            std::process::exit(1);
        }
    }
}

/// Build an API client, honoring CADENCE_API_URL if set.
fn make_client() -> api_client::Client {
    match env::var("CADENCE_API_URL") {
        Ok(url) => api_client::Client::with_base_url(url),
        Err(_) => api_client::Client::new(),
    }
}

/// Value following `flag`, if the flag is present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>> {
    match args.iter().position(|a| a == flag) {
        Some(i) => match args.get(i + 1) {
            Some(value) => Ok(Some(value.as_str())),
            None => bail!("{flag} needs a value"),
        },
        None => Ok(None),
    }
}

async fn cmd_status(args: &[String], offset: UtcOffset) -> Result<()> {
    let twelve_hour = args.iter().any(|a| a == "--12h");
    let state = make_client().get_reminder().await?;
    print_state(&state, offset, twelve_hour);
    Ok(())
}

async fn cmd_arm(args: &[String], offset: UtcOffset) -> Result<()> {
    let Some(minutes) = args.first() else {
        bail!("arm needs an interval in minutes");
    };
    let interval_minutes = minutes
        .parse()
        .with_context(|| format!("not a number of minutes: {minutes}"))?;
    let start_at = flag_value(args, "--at")?.map(str::to_string);

    let state = make_client()
        .arm(&ArmRequest {
            interval_minutes,
            start_at,
        })
        .await?;
    print_state(&state, offset, false);
    Ok(())
}

async fn cmd_prefs(args: &[String]) -> Result<()> {
    let client = make_client();
    let mut prefs = client.get_preferences().await?;

    let sound = flag_value(args, "--sound")?;
    let vibrate = flag_value(args, "--vibrate")?;
    if sound.is_some() || vibrate.is_some() {
        if let Some(sound) = sound {
            prefs.sound = sound.to_string();
        }
        if let Some(vibrate) = vibrate {
            prefs.vibration_enabled = match vibrate {
                "on" | "true" | "yes" => true,
                "off" | "false" | "no" => false,
                other => bail!("--vibrate expects on or off, got {other}"),
            };
        }
        prefs = client.put_preferences(&prefs).await?;
    }

    print_prefs(&prefs);
    Ok(())
}

fn print_state(state: &ReminderState, offset: UtcOffset, twelve_hour: bool) {
    println!("Phase:     {}", state.phase);
    println!("Interval:  {} min", state.interval_minutes);

    if let Some(next) = state.next_fire_epoch_millis {
        let next = from_epoch_millis(next, offset);
        println!("Next fire: {}", format_time_of_day(next, twelve_hour));
    }
    if let Some(countdown) = state.countdown() {
        println!("Remaining: {countdown}");
    }
}

fn print_prefs(prefs: &AlertPreferences) {
    println!("Sound:     {}", prefs.sound);
    println!(
        "Vibration: {}",
        if prefs.vibration_enabled { "on" } else { "off" }
    );
}

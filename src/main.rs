//! stormwatch - terminal monitor for active weather alerts
//!
//! Polls the National Weather Service active-alerts feed and shows the alerts
//! in a two-pane terminal UI. New alerts are added to the top of the list and
//! announced with a sound.
//!
//! ## Usage
//!
//! ```bash
//! # Watch every active land alert
//! stormwatch
//!
//! # Only Pennsylvania and New Mexico, polling every 30 seconds
//! stormwatch --area PA --area NM --interval 30
//!
//! # Only tornado watches, no sound
//! stormwatch --event "Tornado Watch" --no-sound
//!
//! # With verbose logging to a custom directory
//! stormwatch -v --log-dir /tmp/stormwatch-logs
//! ```

use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use stormwatch_config::StormConfig;
use stormwatch_core::{LogGuard, StormError, init_logging};
use stormwatch_fetch::{FetchConfig, NwsClient};
use stormwatch_tui::{App, Palette, PollSettings, PollerHandle, notifier_from_config};
use tracing::{error, info};

/// Terminal monitor for active National Weather Service alerts
#[derive(Parser, Debug)]
#[command(name = "stormwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.stormwatch/config.yaml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seconds between polls
    #[arg(short, long, value_name = "SECS")]
    interval: Option<u64>,

    /// Maximum alerts per request (1-500)
    #[arg(long)]
    limit: Option<u32>,

    /// Restrict to a state/territory code; repeatable
    #[arg(short, long = "area", value_name = "CODE")]
    areas: Vec<String>,

    /// Restrict to an event type such as "Tornado Watch"; repeatable
    #[arg(short, long = "event", value_name = "EVENT")]
    events: Vec<String>,

    /// Do not play a sound for new alerts
    #[arg(long)]
    no_sound: bool,

    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files (defaults to ~/.stormwatch/logs/)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Also log to stderr
    #[arg(long)]
    log_stderr: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let _guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::from(1);
        }
    };

    // Install panic hook to ensure terminal cleanup
    install_panic_hook();

    info!(version = env!("CARGO_PKG_VERSION"), "starting stormwatch");

    match run_app(&cli) {
        Ok(()) => {
            info!("stormwatch exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("stormwatch error: {:#}", e);
            eprintln!("Error: {:#}", e);
            if let Some(hint) = e.downcast_ref::<StormError>().and_then(StormError::guidance) {
                eprintln!("\n{}", hint);
            }
            ExitCode::from(1)
        }
    }
}

/// Install a panic hook that restores the terminal before printing the panic message.
fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Restore terminal to its normal state.
fn restore_terminal() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();

    let _ = crossterm::terminal::disable_raw_mode();

    crossterm::execute!(
        stdout,
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::event::DisableMouseCapture,
        crossterm::cursor::Show
    )?;

    stdout.flush()
}

/// Set up logging based on CLI arguments.
fn setup_logging(cli: &Cli) -> stormwatch_core::Result<LogGuard> {
    init_logging(cli.log_dir.clone(), cli.verbose > 0, cli.log_stderr)
}

/// Load the config file and apply command-line overrides.
fn load_config(cli: &Cli) -> stormwatch_core::Result<StormConfig> {
    let mut config = StormConfig::load(cli.config.as_deref())?;

    if let Some(secs) = cli.interval {
        config = config.with_update_time(secs);
    }
    if let Some(limit) = cli.limit {
        config = config.with_limit(limit);
    }
    if !cli.areas.is_empty() {
        config = config.with_areas(cli.areas.clone());
    }
    if !cli.events.is_empty() {
        config = config.with_events(cli.events.clone());
    }
    if cli.no_sound {
        config = config.without_sound();
    }

    config.validate()?;
    Ok(config)
}

/// Wire the fetcher, poller, and UI together and run until quit.
fn run_app(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    info!(
        interval_secs = config.update_time_secs,
        limit = config.limit,
        areas = ?config.areas,
        events = ?config.events,
        "configuration loaded"
    );

    let palette = Palette::from_config(&config.colors)
        .map_err(|e| StormError::config_validation(e.to_string()))?;

    let client = NwsClient::new(FetchConfig {
        base_url: config.api_base_url.clone(),
        user_agent: config.user_agent.clone(),
        limit: config.limit,
        timeout: Duration::from_secs(config.request_timeout_secs),
    })
    .context("failed to set up the alert API client")?;

    let poller = PollerHandle::spawn(
        Arc::new(client),
        PollSettings {
            interval: Duration::from_secs(config.update_time_secs),
            areas: config.areas.clone(),
            events: config.events.clone(),
        },
    )
    .context("failed to start the poller")?;

    let notifier = notifier_from_config(&config.sound);
    let mut app = App::new(&config, palette, notifier).with_poller(poller);

    app.run().map_err(|e| StormError::TerminalInit {
        message: e.to_string(),
    })?;
    Ok(())
}

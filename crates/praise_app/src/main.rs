use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use praise_app::{connect_session, AppConfig, ConsolePresenter, DEFAULT_CONFIG_FILE};
use praise_engine::{Presenter, RunMode, Selectors, WorkerEvent, WorkerHandle};
use scan_logging::{scan_info, scan_warn};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(
    name = "praise_counter",
    about = "Mirrors praise messages from the team chat into the recognition store"
)]
struct Cli {
    /// Path to the RON config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Run a single pass, then exit
    #[arg(long)]
    once: bool,
    /// Debug-level logging
    #[arg(long)]
    verbose: bool,
}

enum Command {
    Refresh,
    Status,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim() {
        "r" | "refresh" => Some(Command::Refresh),
        "s" | "status" => Some(Command::Status),
        "q" | "quit" => Some(Command::Quit),
        _ => None,
    }
}

fn init_logging(config: &AppConfig, verbose: bool) {
    let (destination, level) = config.log_target(verbose);
    scan_logging::initialize(destination, level, config.log_file.as_deref());
}

/// Forwards console commands to the async loop. Runs on a plain thread so a
/// pending read never holds up shutdown.
fn spawn_stdin_reader(tx: mpsc::UnboundedSender<Command>) {
    let spawned = std::thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if let Some(command) = parse_command(&line) {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
            }
        });
    if let Err(err) = spawned {
        scan_warn!("console commands unavailable: {}", err);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = AppConfig::load(&cli.config)?;
    let config = loaded.clone().unwrap_or_default();
    init_logging(&config, cli.verbose);
    if loaded.is_none() {
        scan_warn!("config file {:?} not found; using defaults", cli.config);
    }

    let mode = if cli.once {
        RunMode::Once
    } else {
        RunMode::Continuous
    };
    let settings = config.worker_settings(mode)?;
    let webdriver = config.webdriver_settings();
    let token = config.token_source()?;
    let sync = config.sync_settings()?;
    let selectors = Selectors::default();

    let presenter = Arc::new(ConsolePresenter::stdout());
    let handle = WorkerHandle::spawn(settings, presenter.clone(), move |reporter| {
        connect_session(webdriver, selectors, token, sync, reporter)
    })
    .context("failed to start worker thread")?;
    scan_info!("worker started ({:?})", mode);

    let (command_tx, mut commands) = mpsc::unbounded_channel();
    if mode == RunMode::Continuous {
        presenter.log("Commands: r = refresh now, s = status, q = quit", false);
        spawn_stdin_reader(command_tx);
    } else {
        drop(command_tx);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stopping = false;
    let mut commands_open = true;
    let mut poll = tokio::time::interval(Duration::from_millis(200));
    let mut failure = None;

    loop {
        tokio::select! {
            _ = &mut ctrl_c, if !stopping => {
                scan_info!("interrupt received; stopping");
                stopping = true;
                presenter.shut_down();
                handle.stop();
            }
            command = commands.recv(), if commands_open => match command {
                Some(Command::Refresh) => {
                    if !handle.force_refresh() {
                        presenter.log("No countdown is running; refresh ignored.", true);
                    }
                }
                Some(Command::Status) => {
                    let remaining = handle.countdown().seconds_remaining();
                    let text = if handle.is_pass_active() {
                        "Pass in progress.".to_string()
                    } else {
                        format!("Next refresh in {remaining} seconds")
                    };
                    presenter.log(&text, true);
                }
                Some(Command::Quit) => {
                    stopping = true;
                    handle.stop();
                }
                None => commands_open = false,
            },
            _ = poll.tick() => {
                let mut stopped = false;
                while let Some(event) = handle.try_recv() {
                    match event {
                        WorkerEvent::PassCompleted(summary) => {
                            presenter.log(&format!("Summary: {summary}"), true);
                        }
                        WorkerEvent::PassFailed { reason } if mode == RunMode::Once => {
                            failure = Some(reason);
                        }
                        WorkerEvent::PassFailed { .. } => {}
                        WorkerEvent::PassAborted { reason } => failure = Some(reason),
                        WorkerEvent::Stopped => stopped = true,
                    }
                }
                if stopped {
                    break;
                }
            }
        }
    }

    handle.join();
    if let Some(reason) = failure {
        bail!("run failed: {reason}");
    }
    Ok(())
}

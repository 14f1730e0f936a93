use std::time::Duration;

use clap::Parser;
use homeward_cli::adapter::{Clock, EngineAdapter};
use homeward_cli::delegate::{format_distance, run_listener, LogDelegate, RunSummary};
use homeward_cli::error::HostError;
use homeward_cli::replay::{Pacing, Replay};
use homeward_cli::{settings, track, Cli, Command, VERSION};
use homeward_core::{TrackingEngine, UnitSystem};
use log::info;
use miette::{IntoDiagnostic, Result};
use tokio_graceful_shutdown::{SubsystemBuilder, SubsystemHandle, Toplevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let mut logger = env_logger::Builder::new();
    logger.filter_level(args.verbose.log_level_filter());
    logger.init();

    info!("Homeward {} starting", VERSION);

    let mut config = settings::load_config(args.config.as_deref()).into_diagnostic()?;

    match args.command {
        Command::Replay {
            file,
            target,
            speed,
            instant,
            units,
        } => {
            if let Some(units) = units {
                config.units = units.into();
            }
            let records = track::read_track(&file).into_diagnostic()?;
            let pacing = if instant {
                Pacing::Instant
            } else {
                Pacing::Recorded { speed }
            };

            Toplevel::new(move |s: SubsystemHandle| async move {
                let clock = match (pacing, records.first()) {
                    (Pacing::Recorded { speed }, Some(first)) => {
                        Clock::replay(first.timestamp(), speed)
                    }
                    _ => Clock::Follow,
                };
                let units = config.units;
                let radius = config.alerts.effective_radius();
                let (adapter, handle) = EngineAdapter::new(TrackingEngine::new(config), clock);
                let events = adapter.subscribe();
                let replay = Replay::new(records, target, pacing, handle);

                s.start(SubsystemBuilder::new("Listener", move |_subsys| async move {
                    let mut delegate = LogDelegate::new(units, radius);
                    run_listener(events, &mut delegate).await;
                    log_summary(delegate.summary(), units);
                    Ok::<(), HostError>(())
                }));
                s.start(SubsystemBuilder::new("Engine", |subsys| adapter.run(subsys)));
                s.start(SubsystemBuilder::new("Replay", |subsys| replay.run(subsys)));
            })
            .catch_signals()
            .handle_shutdown_requests(Duration::from_secs(5))
            .await
            .map_err(Into::into)
        }
    }
}

fn log_summary(summary: &RunSummary, units: UnitSystem) {
    info!(
        "{} fixes, {} indications, {} signal losses, {} standing still",
        summary.positions, summary.indications, summary.signal_losses, summary.standing_still
    );
    info!(
        "{} proximity alerts, {} ETA alerts{}",
        summary.proximity_alerts,
        summary.eta_alerts,
        if summary.stopped { ", stopped on arrival" } else { "" }
    );
    if let Some(distance) = summary.last_distance {
        info!(
            "Last distance {}, progress {}",
            format_distance(distance, units),
            summary
                .last_progress
                .map_or_else(|| "-".to_string(), |p| format!("{:.0}%", p * 100.0))
        );
    }
}

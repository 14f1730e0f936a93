//! Tokio wrapper around homeward-core's TrackingEngine.
//!
//! The engine is sync and clock-free. This adapter owns it inside a tokio
//! task, serialises every input through one command queue, supplies the
//! current time and publishes the resulting events.
//!
//! # Architecture
//!
//! ```text
//!  EngineHandle (clone per producer)
//!        │ mpsc<EngineCommand>
//!        ▼
//! ┌────────────────────────────────────────────────────┐
//! │ EngineAdapter (this module)                        │
//! │  - Runs in a tokio-graceful-shutdown subsystem     │
//! │  - Applies commands one at a time                  │
//! │  - Ticks check_signal every signalCheckInterval    │
//! │  - Stops the engine after an auto-stop arrival     │
//! └────────────────────────────────────────────────────┘
//!        │ broadcast<EngineEvent>
//!        ▼
//!  listeners (LogDelegate, ...)
//! ```

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use homeward_core::{
    Authorization, ConfigError, DesiredAccuracy, EngineEvent, HeadingSample, Indication,
    PositionSample, RunState, StartError, TargetPoint, TrackingConfig, TrackingEngine,
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tokio_graceful_shutdown::SubsystemHandle;

use crate::error::HostError;

const COMMAND_QUEUE: usize = 64;
const EVENT_QUEUE: usize = 1024;

/// Source of "now" for the periodic signal check
#[derive(Debug, Clone)]
pub enum Clock {
    /// Wall clock
    System,
    /// Recorded time: `origin_ms` plus wall time since `started`, scaled by `speed`
    Replay {
        origin_ms: u64,
        started: Instant,
        speed: f64,
    },
    /// The latest `now_ms` pushed with a position
    Follow,
}

impl Clock {
    pub fn replay(origin_ms: u64, speed: f64) -> Self {
        Clock::Replay {
            origin_ms,
            started: Instant::now(),
            speed,
        }
    }

    fn now_ms(&self, last_pushed: u64) -> u64 {
        match self {
            Clock::System => system_now_ms(),
            Clock::Replay {
                origin_ms,
                started,
                speed,
            } => origin_ms + (started.elapsed().as_millis() as f64 * speed) as u64,
            Clock::Follow => last_pushed,
        }
    }
}

pub fn system_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Engine state reported back to a handle
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub run_state: RunState,
    pub update_count: u32,
    pub signal_lost: bool,
    pub standing_still: bool,
    pub desired_accuracy: DesiredAccuracy,
    pub last_indication: Option<Indication>,
}

impl EngineSnapshot {
    fn of(engine: &TrackingEngine) -> Self {
        EngineSnapshot {
            run_state: engine.run_state(),
            update_count: engine.update_count(),
            signal_lost: engine.is_signal_lost(),
            standing_still: engine.is_standing_still(),
            desired_accuracy: engine.desired_accuracy(),
            last_indication: engine.last_indication().cloned(),
        }
    }
}

/// Inputs to the engine task
#[derive(Debug)]
pub enum EngineCommand {
    Start {
        reply: oneshot::Sender<Result<(), StartError>>,
    },
    Stop {
        terminate: bool,
    },
    PushPosition {
        sample: PositionSample,
        now_ms: u64,
    },
    PushHeading(HeadingSample),
    RelaxAccuracy {
        now_ms: u64,
    },
    IncreaseAccuracy,
    SetTarget(Option<TargetPoint>),
    SetHeadingEnabled(bool),
    SetAuthorization(Authorization),
    UpdateConfig {
        config: TrackingConfig,
        reply: oneshot::Sender<Result<(), ConfigError>>,
    },
    Snapshot {
        reply: oneshot::Sender<EngineSnapshot>,
    },
}

/// Sender side of the engine task
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    async fn send(&self, command: EngineCommand) -> Result<(), HostError> {
        self.tx.send(command).await.map_err(|_| HostError::EngineGone)
    }

    pub async fn start(&self) -> Result<(), HostError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Start { reply }).await?;
        rx.await.map_err(|_| HostError::EngineGone)??;
        Ok(())
    }

    pub async fn stop(&self, terminate: bool) -> Result<(), HostError> {
        self.send(EngineCommand::Stop { terminate }).await
    }

    pub async fn push_position(
        &self,
        sample: PositionSample,
        now_ms: u64,
    ) -> Result<(), HostError> {
        self.send(EngineCommand::PushPosition { sample, now_ms })
            .await
    }

    pub async fn push_heading(&self, heading: HeadingSample) -> Result<(), HostError> {
        self.send(EngineCommand::PushHeading(heading)).await
    }

    pub async fn relax_accuracy(&self, now_ms: u64) -> Result<(), HostError> {
        self.send(EngineCommand::RelaxAccuracy { now_ms }).await
    }

    pub async fn increase_accuracy(&self) -> Result<(), HostError> {
        self.send(EngineCommand::IncreaseAccuracy).await
    }

    pub async fn set_target(&self, target: Option<TargetPoint>) -> Result<(), HostError> {
        self.send(EngineCommand::SetTarget(target)).await
    }

    pub async fn set_heading_enabled(&self, enabled: bool) -> Result<(), HostError> {
        self.send(EngineCommand::SetHeadingEnabled(enabled)).await
    }

    pub async fn set_authorization(&self, authorization: Authorization) -> Result<(), HostError> {
        self.send(EngineCommand::SetAuthorization(authorization)).await
    }

    pub async fn update_config(&self, config: TrackingConfig) -> Result<(), HostError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::UpdateConfig { config, reply }).await?;
        rx.await.map_err(|_| HostError::EngineGone)??;
        Ok(())
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot, HostError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| HostError::EngineGone)
    }
}

/// Owns a [`TrackingEngine`] inside a tokio task.
pub struct EngineAdapter {
    engine: TrackingEngine,
    clock: Clock,
    commands: mpsc::Receiver<EngineCommand>,
    events: broadcast::Sender<EngineEvent>,
    /// `now_ms` of the latest pushed position
    last_pushed: u64,
}

impl EngineAdapter {
    pub fn new(engine: TrackingEngine, clock: Clock) -> (Self, EngineHandle) {
        let (tx, commands) = mpsc::channel(COMMAND_QUEUE);
        let (events, _) = broadcast::channel(EVENT_QUEUE);
        let adapter = EngineAdapter {
            engine,
            clock,
            commands,
            events,
            last_pushed: 0,
        };
        (adapter, EngineHandle { tx })
    }

    /// Listen to engine events. Subscribe before the task starts to see everything.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    fn publish(&mut self, events: Vec<EngineEvent>) {
        for event in events {
            let auto_stop =
                matches!(&event, EngineEvent::ProximityAlert { alert } if alert.auto_stop);
            if let Err(e) = self.events.send(event) {
                log::trace!("No listeners for engine event: {}", e);
            }
            if auto_stop {
                let stopped = self.engine.stop_for_alert();
                self.publish(stopped);
                // The rest of the batch belongs to the episode that just ended
                break;
            }
        }
    }

    fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Start { reply } => {
                let result = self.engine.start().map(|events| self.publish(events));
                if let Err(e) = &result {
                    log::warn!("EngineAdapter: Start refused: {}", e);
                }
                let _ = reply.send(result);
            }
            EngineCommand::Stop { terminate } => self.engine.stop(terminate),
            EngineCommand::PushPosition { sample, now_ms } => {
                self.last_pushed = now_ms;
                let events = self.engine.push_position(sample, now_ms);
                self.publish(events);
            }
            EngineCommand::PushHeading(heading) => {
                let events = self.engine.push_heading(heading);
                self.publish(events);
            }
            EngineCommand::RelaxAccuracy { now_ms } => {
                let events = self.engine.relax_accuracy(now_ms);
                self.publish(events);
            }
            EngineCommand::IncreaseAccuracy => {
                let events = self.engine.increase_accuracy();
                self.publish(events);
            }
            EngineCommand::SetTarget(target) => self.engine.set_target(target),
            EngineCommand::SetHeadingEnabled(enabled) => {
                let events = self.engine.set_heading_enabled(enabled);
                self.publish(events);
            }
            EngineCommand::SetAuthorization(authorization) => {
                self.engine.set_authorization(authorization)
            }
            EngineCommand::UpdateConfig { config, reply } => {
                let result = self.engine.update_config(config);
                if let Err(e) = &result {
                    log::warn!("EngineAdapter: Rejected configuration: {}", e);
                }
                let _ = reply.send(result);
            }
            EngineCommand::Snapshot { reply } => {
                let _ = reply.send(EngineSnapshot::of(&self.engine));
            }
        }
    }

    /// Run the engine as an async task until shutdown is requested.
    pub async fn run(
        mut self,
        subsys: SubsystemHandle,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        log::info!("EngineAdapter: Starting engine task");

        let period_ms = self.engine.config().signal_check_interval_ms().max(1);
        let mut signal_timer = interval(Duration::from_millis(period_ms));
        signal_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    log::info!("EngineAdapter: Shutdown requested");
                    break;
                }
                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => {
                            log::debug!("EngineAdapter: All handles dropped");
                            break;
                        }
                    }
                }
                _ = signal_timer.tick() => {
                    let now = self.clock.now_ms(self.last_pushed);
                    let events = self.engine.check_signal(now);
                    self.publish(events);
                }
            }
        }

        // Commands queued before the shutdown request still apply
        while let Ok(command) = self.commands.try_recv() {
            self.handle_command(command);
        }
        self.engine.stop(true);
        log::info!("EngineAdapter: Engine task finished");
        Ok(())
    }
}

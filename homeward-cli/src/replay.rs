//! Feeding a recorded track into the engine task.
//!
//! With [`Pacing::Recorded`] records are released at their recorded spacing,
//! divided by the speed factor. Every fix is pushed with its own timestamp as
//! "now", so staleness checks see recorded time, not wall time.

use std::time::{Duration, Instant};

use homeward_core::{Authorization, TargetPoint};
use log::{debug, info};
use tokio_graceful_shutdown::SubsystemHandle;

use crate::adapter::EngineHandle;
use crate::error::HostError;
use crate::track::TrackRecord;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pacing {
    /// As fast as the engine accepts commands
    Instant,
    /// Recorded spacing divided by `speed`
    Recorded { speed: f64 },
}

pub struct Replay {
    records: Vec<TrackRecord>,
    target: Option<TargetPoint>,
    pacing: Pacing,
    handle: EngineHandle,
}

impl Replay {
    pub fn new(
        records: Vec<TrackRecord>,
        target: Option<TargetPoint>,
        pacing: Pacing,
        handle: EngineHandle,
    ) -> Self {
        Replay {
            records,
            target,
            pacing,
            handle,
        }
    }

    async fn feed(&self, record: TrackRecord) -> Result<(), HostError> {
        match record {
            TrackRecord::Position(sample) => self.handle.push_position(sample, sample.timestamp).await,
            TrackRecord::Heading(heading) => self.handle.push_heading(heading).await,
            TrackRecord::Background { timestamp } => {
                debug!("Replay: app to background at {}", timestamp);
                self.handle.relax_accuracy(timestamp).await
            }
            TrackRecord::Foreground { timestamp } => {
                debug!("Replay: app to foreground at {}", timestamp);
                self.handle.increase_accuracy().await
            }
        }
    }

    /// Start tracking, feed every record, then stop and request shutdown.
    pub async fn run(mut self, subsys: SubsystemHandle) -> Result<(), HostError> {
        let records = std::mem::take(&mut self.records);
        info!("Replay: {} records, {:?}", records.len(), self.pacing);

        self.handle.set_target(self.target.clone()).await?;
        self.handle.set_authorization(Authorization::WhenInUse).await?;
        self.handle.start().await?;

        let playback_start = Instant::now();
        let first_ts = records.first().map_or(0, TrackRecord::timestamp);

        for record in records {
            if subsys.is_shutdown_requested() {
                info!("Replay: Interrupted");
                return Ok(());
            }
            if let Pacing::Recorded { speed } = self.pacing {
                let relative_ts = record.timestamp().saturating_sub(first_ts);
                let target_elapsed = Duration::from_millis((relative_ts as f64 / speed) as u64);
                let actual_elapsed = playback_start.elapsed();
                if target_elapsed > actual_elapsed {
                    tokio::select! {
                        _ = subsys.on_shutdown_requested() => {
                            info!("Replay: Interrupted");
                            return Ok(());
                        }
                        _ = tokio::time::sleep(target_elapsed - actual_elapsed) => {}
                    }
                }
            }
            self.feed(record).await?;
        }

        // Round trip so every queued record has been applied
        let snapshot = self.handle.snapshot().await?;
        info!(
            "Replay: Finished after {} fixes, state {:?}, accuracy {:?}",
            snapshot.update_count, snapshot.run_state, snapshot.desired_accuracy
        );
        self.handle.stop(false).await?;
        subsys.request_shutdown();
        Ok(())
    }
}

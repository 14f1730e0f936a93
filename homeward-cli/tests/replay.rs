//! Engine task and replay, end to end through tokio-graceful-shutdown

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use homeward_cli::adapter::{Clock, EngineAdapter, EngineHandle};
use homeward_cli::delegate::{run_listener, LogDelegate, RunSummary};
use homeward_cli::error::HostError;
use homeward_cli::replay::{Pacing, Replay};
use homeward_cli::track::{read_track, TrackRecord};
use homeward_core::{
    Authorization, DesiredAccuracy, EngineEvent, PositionSample, RunState, StartError,
    TargetPoint, TrackingConfig, TrackingEngine, UnitSystem,
};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio_graceful_shutdown::{SubsystemBuilder, SubsystemHandle, Toplevel};

const LAT_PER_METER: f64 = 1.0 / 111_195.0;
const T0: u64 = 1_700_000_000_000;

fn fix(meters_north: f64, ts: u64) -> TrackRecord {
    TrackRecord::Position(PositionSample::new(
        45.0 + meters_north * LAT_PER_METER,
        7.0,
        5.0,
        ts,
    ))
}

fn write_track(path: &Path, records: &[TrackRecord]) {
    let mut file = File::create(path).unwrap();
    for record in records {
        writeln!(file, "{}", serde_json::to_string(record).unwrap()).unwrap();
    }
}

fn collect(mut rx: broadcast::Receiver<EngineEvent>) -> JoinHandle<Vec<EngineEvent>> {
    tokio::spawn(async move {
        let mut events = Vec::new();
        while let Ok(event) = rx.recv().await {
            events.push(event);
        }
        events
    })
}

async fn replay(
    config: TrackingConfig,
    records: Vec<TrackRecord>,
    target: TargetPoint,
) -> Vec<EngineEvent> {
    let (adapter, handle) = EngineAdapter::new(TrackingEngine::new(config), Clock::Follow);
    let collector = collect(adapter.subscribe());
    let replay = Replay::new(records, Some(target), Pacing::Instant, handle);

    let result = Toplevel::new(move |s: SubsystemHandle| async move {
        s.start(SubsystemBuilder::new("Engine", |subsys| adapter.run(subsys)));
        s.start(SubsystemBuilder::new("Replay", |subsys| replay.run(subsys)));
    })
    .handle_shutdown_requests(Duration::from_secs(2))
    .await;
    assert!(result.is_ok(), "{:?}", result);

    collector.await.unwrap()
}

#[tokio::test]
async fn test_instant_replay_stops_on_arrival() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("walk.jsonl");
    let records: Vec<TrackRecord> = (0..20u64)
        .map(|i| fix(20.0 * i as f64, T0 + i * 5_000))
        .collect();
    write_track(&path, &records);
    let records = read_track(&path).unwrap();
    assert_eq!(records.len(), 20);

    let mut config = TrackingConfig::default();
    config.alerts.enabled = true;
    let target = TargetPoint::named(45.0 + 300.0 * LAT_PER_METER, 7.0, "Hut");
    let events = replay(config, records, target).await;

    let positions = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::PositionReceived { .. }))
        .count();
    assert_eq!(positions, 20);

    let alert_at = events
        .iter()
        .position(|e| matches!(e, EngineEvent::ProximityAlert { .. }))
        .expect("proximity alert");
    match &events[alert_at] {
        EngineEvent::ProximityAlert { alert } => {
            assert!(alert.auto_stop);
            assert!(alert.distance <= 100.0);
            assert_eq!(alert.destination.name.as_deref(), Some("Hut"));
        }
        _ => unreachable!(),
    }
    assert_eq!(events[alert_at + 1], EngineEvent::Stopped);

    // nothing but raw positions once stopped
    assert!(events[alert_at + 2..]
        .iter()
        .all(|e| matches!(e, EngineEvent::PositionReceived { .. })));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, EngineEvent::ProximityAlert { .. }))
            .count(),
        1
    );
}

#[tokio::test]
async fn test_auto_stop_ends_the_batch() {
    // Relaxation active and 400-900 m out, then one fix inside the radius
    let mut records: Vec<TrackRecord> = (0..16u64)
        .map(|i| fix(100.0 + i as f64 * 500.0 / 15.0, T0 + i * 10_000))
        .collect();
    records.insert(1, TrackRecord::Background { timestamp: T0 });
    records.push(fix(960.0, T0 + 160_000));

    let mut config = TrackingConfig::default();
    config.battery_saving = true;
    config.alerts.enabled = true;
    let target = TargetPoint::new(45.0 + 1_000.0 * LAT_PER_METER, 7.0);
    let events = replay(config, records, target).await;

    let stopped_at = events
        .iter()
        .position(|e| *e == EngineEvent::Stopped)
        .expect("stopped");
    assert!(matches!(
        events[stopped_at - 1],
        EngineEvent::ProximityAlert { .. }
    ));
    assert!(
        events[stopped_at + 1..].is_empty(),
        "{:?}",
        &events[stopped_at + 1..]
    );

    let changes: Vec<DesiredAccuracy> = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::DesiredAccuracyChanged { accuracy } => Some(*accuracy),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![DesiredAccuracy::TenMeters]);
}

#[tokio::test]
async fn test_listener_subsystem_tallies_replay() {
    let records: Vec<TrackRecord> = (0..20u64)
        .map(|i| fix(20.0 * i as f64, T0 + i * 5_000))
        .collect();
    let mut config = TrackingConfig::default();
    config.alerts.enabled = true;
    let radius = config.alerts.effective_radius();
    let target = TargetPoint::new(45.0 + 300.0 * LAT_PER_METER, 7.0);

    let (adapter, handle) = EngineAdapter::new(TrackingEngine::new(config), Clock::Follow);
    let events = adapter.subscribe();
    let replay = Replay::new(records, Some(target), Pacing::Instant, handle);
    let (summary_tx, summary_rx) = oneshot::channel::<RunSummary>();

    let result = Toplevel::new(move |s: SubsystemHandle| async move {
        s.start(SubsystemBuilder::new("Listener", move |_subsys| async move {
            let mut delegate = LogDelegate::new(UnitSystem::Metric, radius);
            run_listener(events, &mut delegate).await;
            let _ = summary_tx.send(delegate.summary().clone());
            Ok::<(), HostError>(())
        }));
        s.start(SubsystemBuilder::new("Engine", |subsys| adapter.run(subsys)));
        s.start(SubsystemBuilder::new("Replay", |subsys| replay.run(subsys)));
    })
    .handle_shutdown_requests(Duration::from_secs(2))
    .await;
    assert!(result.is_ok(), "{:?}", result);

    let summary = summary_rx.await.unwrap();
    assert_eq!(summary.positions, 20);
    assert_eq!(summary.proximity_alerts, 1);
    assert!(summary.stopped);
    assert!(summary.last_distance.unwrap() <= 100.0);
}

#[tokio::test]
async fn test_background_relaxes_accuracy() {
    let mut records: Vec<TrackRecord> = (0..20u64)
        .map(|i| fix(10.0 * i as f64, T0 + i * 10_000))
        .collect();
    records.insert(7, TrackRecord::Background { timestamp: T0 + 60_000 });
    records.push(TrackRecord::Foreground { timestamp: T0 + 200_000 });

    let mut config = TrackingConfig::default();
    config.battery_saving = true;
    let target = TargetPoint::new(45.0 + 5_000.0 * LAT_PER_METER, 7.0);
    let events = replay(config, records, target).await;

    let changes: Vec<DesiredAccuracy> = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::DesiredAccuracyChanged { accuracy } => Some(*accuracy),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![DesiredAccuracy::Kilometer, DesiredAccuracy::Best]);
}

#[tokio::test]
async fn test_handle_round_trips() {
    let (adapter, handle) = EngineAdapter::new(
        TrackingEngine::new(TrackingConfig::default()),
        Clock::System,
    );

    async fn exercise(handle: EngineHandle, subsys: SubsystemHandle) -> Result<(), HostError> {
        assert!(matches!(
            handle.start().await,
            Err(HostError::Start(StartError::NotAuthorized))
        ));
        handle.set_authorization(Authorization::Always).await?;
        handle.start().await?;
        assert!(matches!(
            handle.start().await,
            Err(HostError::Start(StartError::AlreadyRunning))
        ));

        let mut bad = TrackingConfig::default();
        bad.relaxed_eta_tolerance = 2.0;
        assert!(matches!(
            handle.update_config(bad).await,
            Err(HostError::Config(_))
        ));

        let snapshot = handle.snapshot().await?;
        assert_eq!(snapshot.run_state, RunState::Running);
        assert_eq!(snapshot.update_count, 0);

        handle.stop(false).await?;
        assert_eq!(handle.snapshot().await?.run_state, RunState::Idle);
        subsys.request_shutdown();
        Ok(())
    }

    let result = Toplevel::new(move |s: SubsystemHandle| async move {
        s.start(SubsystemBuilder::new("Engine", |subsys| adapter.run(subsys)));
        s.start(SubsystemBuilder::new("Test", |subsys| exercise(handle, subsys)));
    })
    .handle_shutdown_requests(Duration::from_secs(2))
    .await;
    assert!(result.is_ok(), "{:?}", result);
}

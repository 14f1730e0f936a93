//! Logging delegate and event listener.
//!
//! [`LogDelegate`] renders engine callbacks as log lines and keeps a tally
//! for the end-of-run summary. [`run_listener`] feeds it from the adapter's
//! broadcast channel.

use homeward_core::{
    CompassPoint, DesiredAccuracy, DistanceTier, EngineEvent, EtaAlert, Indication,
    PositionSample, ProgressTracker, ProximityAlert, TrackingDelegate, UnitSystem,
};
use homeward_core::tiers::METERS_PER_MILE;
use log::{debug, info, warn};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

const YARDS_PER_METER: f64 = 1.0936133;

/// Counters collected over one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub positions: usize,
    pub indications: usize,
    pub signal_losses: usize,
    pub standing_still: usize,
    pub proximity_alerts: usize,
    pub eta_alerts: usize,
    pub stopped: bool,
    /// Distance on the last indication, meters
    pub last_distance: Option<f64>,
    pub last_progress: Option<f64>,
}

pub struct LogDelegate {
    units: UnitSystem,
    alert_radius: f64,
    progress: ProgressTracker,
    summary: RunSummary,
}

impl LogDelegate {
    pub fn new(units: UnitSystem, alert_radius: f64) -> Self {
        LogDelegate {
            units,
            alert_radius,
            progress: ProgressTracker::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }
}

impl TrackingDelegate for LogDelegate {
    fn on_position_received(&mut self, sample: &PositionSample) {
        self.summary.positions += 1;
        debug!(
            "Fix {:.6}, {:.6} ±{:.0} m",
            sample.latitude, sample.longitude, sample.horizontal_accuracy
        );
    }

    fn on_indication(&mut self, indication: &Indication) {
        self.summary.indications += 1;
        let heading = indication
            .course()
            .and_then(CompassPoint::from_course)
            .map_or("-", |c| c.as_str());
        let speed = format_speed(indication.speed(), self.units);

        if indication.is_compass_mode() {
            info!("Heading {}, speed {}", heading, speed);
            return;
        }

        self.summary.last_distance = Some(indication.distance());
        let progress = self.progress.update(indication, self.alert_radius);
        if progress.is_some() {
            self.summary.last_progress = progress;
        }
        info!(
            "{} to go, bearing {:.0}, heading {}, speed {}, ETA {}, progress {}",
            format_distance(indication.distance(), self.units),
            indication.bearing_to_target(),
            heading,
            speed,
            indication.eta().map_or_else(|| "-".to_string(), format_eta),
            progress.map_or_else(|| "-".to_string(), |p| format!("{:.0}%", p * 100.0)),
        );
    }

    fn on_signal_lost(&mut self) {
        self.summary.signal_losses += 1;
        warn!("GPS signal lost");
    }

    fn on_standing_still(&mut self) {
        self.summary.standing_still += 1;
        debug!("Standing still");
    }

    fn on_stopped(&mut self) {
        self.summary.stopped = true;
        info!("Tracking stopped on arrival");
    }

    fn on_heading_updated(&mut self, heading: f64) {
        debug!("Compass heading {:.0}", heading);
    }

    fn on_proximity_alert(&mut self, alert: &ProximityAlert) {
        self.summary.proximity_alerts += 1;
        info!(
            "Arrived: {} is {} away [{}]",
            destination_name(alert.destination.name.as_deref()),
            format_distance(alert.distance, self.units),
            alert.correlation_id
        );
    }

    fn on_eta_alert(&mut self, alert: &EtaAlert) {
        self.summary.eta_alerts += 1;
        info!(
            "Almost there: {} in {} [{}]",
            destination_name(alert.destination.name.as_deref()),
            format_eta(alert.eta),
            alert.correlation_id
        );
    }

    fn on_desired_accuracy_changed(&mut self, accuracy: DesiredAccuracy) {
        info!(
            "Requesting {:?} accuracy ({:.0} m)",
            accuracy,
            accuracy.nominal_radius()
        );
    }
}

fn destination_name(name: Option<&str>) -> &str {
    name.unwrap_or("destination")
}

/// Distance rounded for display in the given unit system
pub fn format_distance(meters: f64, units: UnitSystem) -> String {
    match DistanceTier::from_meters(meters, units) {
        DistanceTier::Uni => match units {
            UnitSystem::Metric => format!("{:.0} m", meters),
            UnitSystem::Imperial => format!("{:.0} yd", meters * YARDS_PER_METER),
        },
        tier => {
            let digits = tier.fraction_digits(false);
            let large = meters / units.multiplier();
            match units {
                UnitSystem::Metric => format!("{:.*} km", digits, large),
                UnitSystem::Imperial => format!("{:.*} mi", digits, large),
            }
        }
    }
}

/// Speed in km/h or mph; unknown speeds render as "-"
pub fn format_speed(speed: f64, units: UnitSystem) -> String {
    if speed < 0.0 {
        return "-".to_string();
    }
    let digits = units.speed_fraction_digits(speed);
    match units {
        UnitSystem::Metric => format!("{:.*} km/h", digits, speed * 3.6),
        UnitSystem::Imperial => format!("{:.*} mph", digits, speed * 3600.0 / METERS_PER_MILE),
    }
}

/// Seconds as `h:mm:ss`, or `m:ss` under an hour
pub fn format_eta(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// Deliver broadcast events to `delegate` until the channel closes
pub async fn run_listener(
    mut rx: broadcast::Receiver<EngineEvent>,
    delegate: &mut (dyn TrackingDelegate + Send),
) -> usize {
    let mut delivered = 0;
    loop {
        match rx.recv().await {
            Ok(event) => {
                event.dispatch(&mut *delegate);
                delivered += 1;
            }
            Err(RecvError::Lagged(n)) => {
                warn!("Event listener lagged, skipped {} events", n);
            }
            Err(RecvError::Closed) => break,
        }
    }
    debug!("Event listener finished after {} events", delivered);
    delivered
}

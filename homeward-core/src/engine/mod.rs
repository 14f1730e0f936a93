//! TrackingEngine - position-processing state machine
//!
//! The engine turns a stream of raw fixes into [`Indication`]s, detects
//! signal loss and standing still, estimates the ETA and decides when
//! proximity and ETA alerts fire. It never reads a clock and never performs
//! I/O: every transition takes the current time in milliseconds and returns
//! the events the host should deliver.
//!
//! ```text
//!              start()                 stop(false)
//!   ┌──────┐ ─────────► ┌─────────┐ ─────────────► ┌──────┐
//!   │ Idle │            │ Running │                │ Idle │
//!   └──────┘ ◄───────── └─────────┘                └──────┘
//!            stop_for_alert()  │
//!                              │ stop(true)
//!                              ▼
//!                       ┌────────────┐
//!                       │ Terminated │  (emits nothing, cannot restart)
//!                       └────────────┘
//! ```
//!
//! Per fix while running:
//!
//! ```text
//! fix ─► validity ─► PositionReceived ─► warm-up ─► signal loss ─► standing still
//!                                                                      │
//!     DesiredAccuracy ◄─ relaxation ◄─ alerts ◄─ emission gate ◄─ ETA ◄─ build
//! ```

mod events;
mod state;

pub use events::{EngineEvent, TrackingDelegate};

use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::alerts::AlertGate;
use crate::config::TrackingConfig;
use crate::error::{ConfigError, StartError};
use crate::indication::{Indication, IndicationBuilder};
use crate::relax::{DesiredAccuracy, RelaxationState};
use crate::sample::{HeadingSample, PositionSample, TargetPoint};
use crate::tiers::AccuracyTier;
use state::SessionState;

/// Lifecycle of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    /// Torn down for good
    Terminated,
}

/// Location permission as reported by the host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authorization {
    #[default]
    NotDetermined,
    Denied,
    Restricted,
    WhenInUse,
    Always,
}

impl Authorization {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Authorization::WhenInUse | Authorization::Always)
    }

    /// The user has not been asked yet
    pub fn needs_request(&self) -> bool {
        *self == Authorization::NotDetermined
    }
}

/// The position-processing engine. One instance per host.
#[derive(Debug)]
pub struct TrackingEngine {
    config: TrackingConfig,
    builder: IndicationBuilder,
    run_state: RunState,
    authorization: Authorization,
    target: Option<TargetPoint>,
    session: SessionState,
    alerts: AlertGate,
    desired_accuracy: DesiredAccuracy,
    /// Latest valid fix, kept across episodes
    last_fix: Option<PositionSample>,
}

impl TrackingEngine {
    pub fn new(config: TrackingConfig) -> Self {
        TrackingEngine {
            builder: IndicationBuilder::new(config.max_accuracy_difference, config.min_course_speed),
            session: SessionState::new(&config),
            alerts: AlertGate::new(config.eta_alert_rearm_ms()),
            config,
            run_state: RunState::Idle,
            authorization: Authorization::NotDetermined,
            target: None,
            desired_accuracy: DesiredAccuracy::Best,
            last_fix: None,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Begin a tracking episode, resetting all episode state
    pub fn start(&mut self) -> Result<Vec<EngineEvent>, StartError> {
        if self.run_state == RunState::Terminated {
            return Err(StartError::Terminated);
        }
        if !self.authorization.is_authorized() {
            warn!("Start refused: location {:?}", self.authorization);
            return Err(StartError::NotAuthorized);
        }
        if self.run_state == RunState::Running {
            return Err(StartError::AlreadyRunning);
        }

        self.session = SessionState::new(&self.config);
        self.alerts.reset();
        self.run_state = RunState::Running;
        info!(
            "Tracking started ({})",
            match &self.target {
                Some(t) => format!("target {:.5}, {:.5}", t.latitude, t.longitude),
                None => "compass mode".to_string(),
            }
        );

        Ok(self.set_desired_accuracy(DesiredAccuracy::Best))
    }

    /// Stop tracking. With `terminate` the engine is torn down for good.
    pub fn stop(&mut self, terminate: bool) {
        match (self.run_state, terminate) {
            (RunState::Terminated, _) => {}
            (_, true) => {
                self.run_state = RunState::Terminated;
                info!("Tracking engine terminated");
            }
            (RunState::Running, false) => {
                self.run_state = RunState::Idle;
                info!("Tracking stopped");
            }
            (RunState::Idle, false) => {}
        }
    }

    /// Stop on behalf of a delivered proximity alert
    pub fn stop_for_alert(&mut self) -> Vec<EngineEvent> {
        if self.run_state != RunState::Running {
            return Vec::new();
        }
        self.stop(false);
        vec![EngineEvent::Stopped]
    }

    pub fn set_authorization(&mut self, authorization: Authorization) {
        if self.authorization != authorization {
            debug!("Location authorization: {:?}", authorization);
            self.authorization = authorization;
        }
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Process one fix
    pub fn push_position(&mut self, sample: PositionSample, now_ms: u64) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if self.run_state == RunState::Terminated {
            return events;
        }

        self.session.last_sample = Some(sample);
        if !sample.is_valid() {
            error!(
                "Dropping invalid fix (accuracy {} m) at {}",
                sample.horizontal_accuracy, sample.timestamp
            );
            return events;
        }
        self.last_fix = Some(sample);
        events.push(EngineEvent::PositionReceived { sample });

        if self.run_state != RunState::Running {
            return events;
        }

        let session = &mut self.session;
        session.update_count = session.update_count.saturating_add(1);
        let min_updates = self.config.min_updates_before_indications;
        if session.update_count < min_updates {
            trace!("Warming up ({}/{})", session.update_count, min_updates);
            return events;
        }

        session.signal_lost = sample.age_ms(now_ms) > self.config.signal_lost_ms();
        if session.signal_lost {
            debug!("Stale fix, {} ms old", sample.age_ms(now_ms));
            events.push(EngineEvent::SignalLost);
            return events;
        }

        session.motion.push(sample, now_ms);
        session.standing_still = session.motion.is_standing(now_ms);
        if session.standing_still && !self.config.heading_enabled {
            debug!("Standing still");
            events.push(EngineEvent::StandingStill);
            return events;
        }

        let Some(mut indication) = self.builder.build(
            &sample,
            self.target.as_ref(),
            session.last_indication.as_ref(),
            &mut session.bearing_buffer,
        ) else {
            error!("Could not build an indication from a valid fix");
            return events;
        };

        let radius = self.config.alerts.effective_radius();
        if session.update_count >= min_updates.saturating_mul(2) {
            if let Some(previous) = &session.last_indication {
                let relaxed = session.relaxation.is_active();
                let eta = session.eta.estimate(&indication, previous, relaxed, radius);
                indication = indication.with_eta(eta);
            }
        }

        let good = indication.accuracy_tier() == AccuracyTier::Good;
        let deliver = session.relaxation.is_active()
            || good
            || session.grace_expired(sample.timestamp, self.config.good_accuracy_grace_ms());
        if deliver {
            let alerts = self
                .alerts
                .evaluate(&indication, &self.config.alerts, now_ms);
            events.push(EngineEvent::Indication {
                indication: indication.clone(),
            });
            events.extend(alerts.into_iter().map(EngineEvent::from));
            session.last_indication = Some(indication);
        } else {
            trace!(
                "Holding back {:?} indication",
                indication.accuracy_tier()
            );
        }
        if good {
            session.last_good_at = Some(sample.timestamp);
        }

        if self.session.relaxation.is_engaged() {
            events.extend(self.assess_accuracy(now_ms));
        }
        events
    }

    /// Forward a compass reading
    pub fn push_heading(&mut self, heading: HeadingSample) -> Vec<EngineEvent> {
        if self.run_state != RunState::Running
            || !self.config.heading_enabled
            || self.session.signal_lost
            || heading.true_heading < 0.0
        {
            return Vec::new();
        }
        vec![EngineEvent::HeadingUpdated {
            heading: heading.true_heading,
        }]
    }

    /// Periodic check for a fix that has gone stale without a successor
    pub fn check_signal(&mut self, now_ms: u64) -> Vec<EngineEvent> {
        if self.run_state != RunState::Running || self.session.signal_lost {
            return Vec::new();
        }
        let Some(last) = self.session.last_sample else {
            return Vec::new();
        };
        if last.age_ms(now_ms) > self.config.signal_lost_ms() {
            info!("Signal lost, last fix {} ms old", last.age_ms(now_ms));
            self.session.signal_lost = true;
            return vec![EngineEvent::SignalLost];
        }
        Vec::new()
    }

    // =========================================================================
    // Accuracy relaxation
    // =========================================================================

    /// Host went to background: trade precision for battery after a delay
    pub fn relax_accuracy(&mut self, now_ms: u64) -> Vec<EngineEvent> {
        if !self.config.battery_saving || self.run_state != RunState::Running {
            return Vec::new();
        }
        debug!("Accuracy relaxation engaged");
        self.session.relaxation.engage(now_ms);
        self.assess_accuracy(now_ms)
    }

    /// Host came to foreground: back to best precision now
    pub fn increase_accuracy(&mut self) -> Vec<EngineEvent> {
        self.session.relaxation.release();
        self.set_desired_accuracy(DesiredAccuracy::Best)
    }

    fn assess_accuracy(&mut self, now_ms: u64) -> Vec<EngineEvent> {
        let was_active = self.session.relaxation.is_active();
        let desired = self.session.relaxation.assess(
            now_ms,
            self.config.relax_enable_delay_ms(),
            self.session.last_indication.as_ref(),
            self.config.alerts.effective_radius(),
        );
        if !was_active && self.session.relaxation.is_active() {
            info!("Relaxed accuracy mode active");
        }
        match desired {
            Some(accuracy) => self.set_desired_accuracy(accuracy),
            None => Vec::new(),
        }
    }

    fn set_desired_accuracy(&mut self, accuracy: DesiredAccuracy) -> Vec<EngineEvent> {
        if self.desired_accuracy == accuracy {
            return Vec::new();
        }
        debug!(
            "Desired accuracy {:?} -> {:?}",
            self.desired_accuracy, accuracy
        );
        self.desired_accuracy = accuracy;
        vec![EngineEvent::DesiredAccuracyChanged { accuracy }]
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Navigate toward `target`, or toward north with `None`
    pub fn set_target(&mut self, target: Option<TargetPoint>) {
        self.target = target;
    }

    pub fn set_heading_enabled(&mut self, enabled: bool) -> Vec<EngineEvent> {
        self.config.heading_enabled = enabled;
        // Without headings a UI still waiting for the first indication has nothing to show
        if !enabled && self.run_state == RunState::Running && self.session.last_indication.is_none()
        {
            return vec![EngineEvent::SignalLost];
        }
        Vec::new()
    }

    /// Replace the configuration.
    ///
    /// Buffer sizes and the standing-still window apply from the next `start()`.
    pub fn update_config(&mut self, config: TrackingConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.builder =
            IndicationBuilder::new(config.max_accuracy_difference, config.min_course_speed);
        self.alerts.set_rearm_delay(config.eta_alert_rearm_ms());
        self.config = config;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn authorization(&self) -> Authorization {
        self.authorization
    }

    pub fn target(&self) -> Option<&TargetPoint> {
        self.target.as_ref()
    }

    pub fn last_indication(&self) -> Option<&Indication> {
        self.session.last_indication.as_ref()
    }

    pub fn update_count(&self) -> u32 {
        self.session.update_count
    }

    pub fn is_signal_lost(&self) -> bool {
        self.session.signal_lost
    }

    pub fn is_standing_still(&self) -> bool {
        self.session.standing_still
    }

    pub fn relaxation_state(&self) -> RelaxationState {
        self.session.relaxation.state()
    }

    pub fn desired_accuracy(&self) -> DesiredAccuracy {
        self.desired_accuracy
    }

    pub fn alerts(&self) -> &AlertGate {
        &self.alerts
    }

    /// Latest valid fix, if location access is granted
    pub fn convenience_position(&self) -> Option<&PositionSample> {
        if !self.authorization.is_authorized() {
            return None;
        }
        self.last_fix.as_ref()
    }
}

//! Engine output: events and the delegate capability trait

use serde::{Deserialize, Serialize};

use crate::alerts::{EtaAlert, NavigationAlert, ProximityAlert};
use crate::indication::Indication;
use crate::relax::DesiredAccuracy;
use crate::sample::PositionSample;

/// Something the host should react to, returned by every engine transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A valid fix arrived (also emitted while idle)
    PositionReceived { sample: PositionSample },
    /// New navigation snapshot passed the emission gate
    Indication { indication: Indication },
    /// The latest fix is too old
    SignalLost,
    /// Not moving and heading navigation is off
    StandingStill,
    /// The engine stopped itself
    Stopped,
    /// Compass heading in degrees
    HeadingUpdated { heading: f64 },
    ProximityAlert { alert: ProximityAlert },
    EtaAlert { alert: EtaAlert },
    /// The host should reconfigure its location provider
    DesiredAccuracyChanged { accuracy: DesiredAccuracy },
}

impl From<NavigationAlert> for EngineEvent {
    fn from(alert: NavigationAlert) -> Self {
        match alert {
            NavigationAlert::Proximity(alert) => EngineEvent::ProximityAlert { alert },
            NavigationAlert::Eta(alert) => EngineEvent::EtaAlert { alert },
        }
    }
}

impl EngineEvent {
    /// Route this event to the matching delegate callback
    pub fn dispatch(&self, delegate: &mut dyn TrackingDelegate) {
        match self {
            EngineEvent::PositionReceived { sample } => delegate.on_position_received(sample),
            EngineEvent::Indication { indication } => delegate.on_indication(indication),
            EngineEvent::SignalLost => delegate.on_signal_lost(),
            EngineEvent::StandingStill => delegate.on_standing_still(),
            EngineEvent::Stopped => delegate.on_stopped(),
            EngineEvent::HeadingUpdated { heading } => delegate.on_heading_updated(*heading),
            EngineEvent::ProximityAlert { alert } => delegate.on_proximity_alert(alert),
            EngineEvent::EtaAlert { alert } => delegate.on_eta_alert(alert),
            EngineEvent::DesiredAccuracyChanged { accuracy } => {
                delegate.on_desired_accuracy_changed(*accuracy)
            }
        }
    }
}

/// Callbacks a host can implement; every method defaults to doing nothing
pub trait TrackingDelegate {
    fn on_indication(&mut self, _indication: &Indication) {}
    fn on_position_received(&mut self, _sample: &PositionSample) {}
    fn on_signal_lost(&mut self) {}
    fn on_standing_still(&mut self) {}
    fn on_stopped(&mut self) {}
    fn on_heading_updated(&mut self, _heading: f64) {}
    fn on_proximity_alert(&mut self, _alert: &ProximityAlert) {}
    fn on_eta_alert(&mut self, _alert: &EtaAlert) {}
    fn on_desired_accuracy_changed(&mut self, _accuracy: DesiredAccuracy) {}
}

//! Proximity and ETA alert gating
//!
//! Each alert fires at most once per tracking episode. The ETA alert may
//! re-arm when the user drifts away again; the proximity alert only re-arms
//! when the gate is reset at the next `start()`.
//!
//! Every alert carries a correlation id. A fresh id is drawn whenever an
//! alert's "sent" flag is cleared, so a delivery layer can deduplicate
//! repeated requests for the same firing.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AlertSettings;
use crate::indication::Indication;
use crate::sample::TargetPoint;

/// Destination reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityAlert {
    pub correlation_id: Uuid,
    pub destination: TargetPoint,
    /// Distance when the alert fired, meters
    pub distance: f64,
    /// Tracking should stop once this alert is delivered
    pub auto_stop: bool,
    pub timestamp: u64,
}

/// Destination about to be reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtaAlert {
    pub correlation_id: Uuid,
    pub destination: TargetPoint,
    /// ETA when the alert fired, seconds
    pub eta: f64,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavigationAlert {
    Proximity(ProximityAlert),
    Eta(EtaAlert),
}

/// Sent flag plus the id the next firing will carry
#[derive(Debug, Clone)]
struct AlertSlot {
    sent_at: Option<u64>,
    next_id: Uuid,
}

impl Default for AlertSlot {
    fn default() -> Self {
        AlertSlot {
            sent_at: None,
            next_id: Uuid::new_v4(),
        }
    }
}

impl AlertSlot {
    fn is_sent(&self) -> bool {
        self.sent_at.is_some()
    }

    fn fire(&mut self, now_ms: u64) -> Uuid {
        self.sent_at = Some(now_ms);
        self.next_id
    }

    fn clear(&mut self) {
        *self = AlertSlot::default();
    }
}

/// Per-episode alert state
#[derive(Debug, Clone, Default)]
pub struct AlertGate {
    proximity: AlertSlot,
    eta: AlertSlot,
    rearm_delay_ms: u64,
}

impl AlertGate {
    pub fn new(rearm_delay_ms: u64) -> Self {
        AlertGate {
            rearm_delay_ms,
            ..Default::default()
        }
    }

    pub fn set_rearm_delay(&mut self, rearm_delay_ms: u64) {
        self.rearm_delay_ms = rearm_delay_ms;
    }

    /// Clear both alerts, drawing new correlation ids
    pub fn reset(&mut self) {
        self.proximity.clear();
        self.eta.clear();
    }

    pub fn proximity_sent(&self) -> bool {
        self.proximity.is_sent()
    }

    pub fn eta_sent(&self) -> bool {
        self.eta.is_sent()
    }

    /// Id the next proximity alert will carry
    pub fn next_proximity_id(&self) -> Uuid {
        self.proximity.next_id
    }

    /// Id the next ETA alert will carry
    pub fn next_eta_id(&self) -> Uuid {
        self.eta.next_id
    }

    /// Evaluate a delivered indication.
    ///
    /// The ETA alert is checked before the proximity alert, so both may fire
    /// for the same indication.
    pub fn evaluate(
        &mut self,
        indication: &Indication,
        settings: &AlertSettings,
        now_ms: u64,
    ) -> Vec<NavigationAlert> {
        let mut alerts = Vec::new();
        if !settings.enabled {
            return alerts;
        }

        let destination = indication.target();

        match (self.eta.sent_at, destination) {
            (None, Some(destination)) => {
                let threshold = settings.eta_threshold;
                if let Some(eta) = indication.eta() {
                    if threshold > 0.0 && eta > 0.0 && eta < threshold {
                        let correlation_id = self.eta.fire(now_ms);
                        info!("ETA alert: {:.0} s to destination", eta);
                        alerts.push(NavigationAlert::Eta(EtaAlert {
                            correlation_id,
                            destination: destination.clone(),
                            eta,
                            timestamp: now_ms,
                        }));
                    }
                }
            }
            (Some(sent_at), _) => {
                // Moved away again after the alert: allow it to fire once more
                let waited = now_ms > sent_at.saturating_add(self.rearm_delay_ms);
                if waited && indication.eta().is_some_and(|eta| eta > settings.eta_threshold) {
                    debug!("ETA alert re-armed");
                    self.eta.clear();
                }
            }
            (None, None) => {}
        }

        if self.proximity.is_sent() {
            return alerts;
        }
        let Some(destination) = destination else {
            return alerts;
        };
        if indication.distance() <= settings.proximity_radius {
            let correlation_id = self.proximity.fire(now_ms);
            info!(
                "Proximity alert: {:.0} m from destination (radius {:.0} m)",
                indication.distance(),
                settings.proximity_radius
            );
            alerts.push(NavigationAlert::Proximity(ProximityAlert {
                correlation_id,
                destination: destination.clone(),
                distance: indication.distance(),
                auto_stop: settings.stop_on_proximity,
                timestamp: now_ms,
            }));
        }

        alerts
    }
}

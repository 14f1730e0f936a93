//! # Homeward Core
//!
//! Platform-independent position-processing engine for "big arrow" style
//! navigation: point toward a destination, tell how far it is and when the
//! user will get there.
//!
//! This crate contains pure computation with **zero I/O dependencies**. It
//! never reads a clock, spawns a thread or touches the network; the host
//! feeds it fixes and timestamps and delivers the events it returns.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  homeward-core (no tokio/async deps)                        │
//! │  ├── engine/      (TrackingEngine state machine, events)    │
//! │  ├── indication   (IndicationBuilder, derived snapshot)     │
//! │  ├── eta          (closing speed, ETA estimate)             │
//! │  ├── alerts       (proximity / ETA alert gating)            │
//! │  ├── relax        (battery-saving accuracy relaxation)      │
//! │  ├── buffers/     (StatBuffer, MotionWindow)                │
//! │  └── tiers, geo   (classification, geodesy)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              ▲
//!                 ┌────────────┴────────────┐
//!                 │  homeward-cli           │
//!                 │  (tokio EngineAdapter)  │
//!                 └─────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use homeward_core::{
//!     Authorization, EngineEvent, PositionSample, TargetPoint, TrackingConfig, TrackingEngine,
//! };
//!
//! let mut engine = TrackingEngine::new(TrackingConfig::default());
//! engine.set_authorization(Authorization::WhenInUse);
//! engine.set_target(Some(TargetPoint::new(45.01, 7.0)));
//! engine.start().unwrap();
//!
//! for i in 0..5u64 {
//!     let ts = i * 1_000;
//!     let fix = PositionSample::new(45.0 + i as f64 * 1e-5, 7.0, 5.0, ts);
//!     for event in engine.push_position(fix, ts) {
//!         if let EngineEvent::Indication { indication } = event {
//!             println!("{:.0} m to go", indication.distance());
//!         }
//!     }
//! }
//! ```

pub mod alerts;
pub mod buffers;
pub mod config;
pub mod engine;
pub mod error;
pub mod eta;
pub mod geo;
pub mod indication;
pub mod progress;
pub mod relax;
pub mod sample;
pub mod tiers;

pub use alerts::{AlertGate, EtaAlert, NavigationAlert, ProximityAlert};
pub use buffers::{MotionWindow, StatBuffer};
pub use config::{AlertSettings, TrackingConfig};
pub use engine::{Authorization, EngineEvent, RunState, TrackingDelegate, TrackingEngine};
pub use error::{ConfigError, StartError};
pub use eta::EtaEstimator;
pub use geo::CompassPoint;
pub use indication::{Indication, IndicationBuilder};
pub use progress::ProgressTracker;
pub use relax::{AccuracyRelaxation, DesiredAccuracy, RelaxationState};
pub use sample::{HeadingSample, PositionSample, TargetPoint};
pub use tiers::{AccuracyTier, DistanceTier, UnitSystem};

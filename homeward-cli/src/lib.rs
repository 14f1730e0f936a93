//! # Homeward CLI
//!
//! Tokio host for [`homeward_core`]: runs the tracking engine in a task,
//! feeds it recorded tracks and logs what a UI would show.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     homeward (bin)                      │
//! │  ┌─────────────┐   ┌──────────────┐   ┌──────────────┐  │
//! │  │ Replay      │──►│ EngineAdapter│──►│ Listener     │  │
//! │  │ (track.rs)  │   │ (adapter.rs) │   │ (LogDelegate)│  │
//! │  └─────────────┘   └──────┬───────┘   └──────────────┘  │
//! │       mpsc commands       │        broadcast events     │
//! │                           ▼                             │
//! │                homeward_core::TrackingEngine            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Each box is a `tokio-graceful-shutdown` subsystem, so Ctrl-C stops the
//! replay and tears the engine down cleanly.
//!
//! ## Command-Line Interface
//!
//! ```text
//! homeward replay track.jsonl --target 45.01,7.0,Cabin --speed 10
//! homeward -vv --config my.json replay track.jsonl --instant
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use homeward_core::{TargetPoint, UnitSystem};

pub mod adapter;
pub mod delegate;
pub mod error;
pub mod replay;
pub mod settings;
pub mod track;

use error::HostError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Units {
    Metric,
    Imperial,
}

impl From<Units> for UnitSystem {
    fn from(units: Units) -> Self {
        match units {
            Units::Metric => UnitSystem::Metric,
            Units::Imperial => UnitSystem::Imperial,
        }
    }
}

#[derive(Parser, Clone, Debug)]
#[command(name = "homeward", version, about = "Replay GPS tracks through the Homeward engine")]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

    /// Configuration file, defaults to config.json in the user config directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Feed a JSON-lines track through the engine
    Replay {
        /// Track file
        file: PathBuf,

        /// Destination as `lat,lon` or `lat,lon,name`; compass mode without it
        #[arg(short, long, value_parser = parse_target)]
        target: Option<TargetPoint>,

        /// Replay speed factor
        #[arg(short, long, default_value_t = 1.0, value_parser = parse_speed)]
        speed: f64,

        /// Ignore recorded timing and replay as fast as possible
        #[arg(long, default_value_t = false)]
        instant: bool,

        /// Display units, overriding the configuration
        #[arg(short, long, value_enum)]
        units: Option<Units>,
    },
}

/// Parse `lat,lon[,name]`
pub fn parse_target(s: &str) -> Result<TargetPoint, HostError> {
    let invalid = || HostError::InvalidTarget(s.to_string());
    let mut parts = s.splitn(3, ',');
    let mut coordinate = |range: f64| {
        parts
            .next()
            .and_then(|p| p.trim().parse::<f64>().ok())
            .filter(|v| v.abs() <= range)
            .ok_or_else(invalid)
    };
    let latitude = coordinate(90.0)?;
    let longitude = coordinate(180.0)?;
    let target = match parts.next().map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => TargetPoint::named(latitude, longitude, name),
        None => TargetPoint::new(latitude, longitude),
    };
    Ok(target)
}

fn parse_speed(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(speed) if speed.is_finite() && speed > 0.0 => Ok(speed),
        _ => Err(format!("'{}' is not a positive number", s)),
    }
}

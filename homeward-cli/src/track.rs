//! Recorded track files.
//!
//! A track is a JSON-lines file, one record per line:
//!
//! ```text
//! {"type":"position","latitude":45.0,"longitude":7.0,"horizontalAccuracy":5.0,"timestamp":1700000000000}
//! {"type":"heading","trueHeading":12.5,"timestamp":1700000000400}
//! {"type":"background","timestamp":1700000060000}
//! {"type":"foreground","timestamp":1700000300000}
//! ```
//!
//! `background`/`foreground` mark the app leaving and returning to the
//! screen, which is what drives accuracy relaxation.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use homeward_core::{HeadingSample, PositionSample};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::HostError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackRecord {
    Position(PositionSample),
    Heading(HeadingSample),
    Background { timestamp: u64 },
    Foreground { timestamp: u64 },
}

impl TrackRecord {
    /// Time the record was captured (Unix ms)
    pub fn timestamp(&self) -> u64 {
        match self {
            TrackRecord::Position(p) => p.timestamp,
            TrackRecord::Heading(h) => h.timestamp,
            TrackRecord::Background { timestamp } | TrackRecord::Foreground { timestamp } => {
                *timestamp
            }
        }
    }
}

/// Read a whole track file
pub fn read_track(path: &Path) -> Result<Vec<TrackRecord>, HostError> {
    let file = File::open(path)?;
    let records = parse_track(BufReader::new(file))?;
    debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Parse JSON-lines records, skipping blank lines
pub fn parse_track<R: Read>(reader: BufReader<R>) -> Result<Vec<TrackRecord>, HostError> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|e| HostError::Parse {
            line: index + 1,
            message: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}

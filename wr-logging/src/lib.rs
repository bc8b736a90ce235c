//! wr-logging: append-only NDJSON session history.
//!
//! One JSON object per line, so a torn tail from a crashed session costs at
//! most the last line. Event structs are versioned; readers should skip
//! unknown events rather than fail.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use wr_core::observe::Observation;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Error)]
pub enum SessionLogError {
    #[error("session log io: {0}")]
    Io(#[from] std::io::Error),
    #[error("session log encode: {0}")]
    Json(#[from] serde_json::Error),
}

/// One recorded round trip and the observation reported after it.
#[derive(Debug, Clone, Serialize)]
pub struct JumpEventV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub session_id: String,

    pub action_key: String,
    pub observation: Observation,
    /// Cumulative mass after this round trip.
    pub mass_used: f64,
    /// Total-mass belief after folding the observation in.
    pub belief_min: f64,
    pub belief_max: f64,
}

impl JumpEventV1 {
    pub const EVENT: &'static str = "jump";
}

/// Summary of one planner invocation.
#[derive(Debug, Clone, Serialize)]
pub struct PlanEventV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub session_id: String,

    pub belief_min: f64,
    pub belief_max: f64,
    pub mass_used: f64,
    pub iterations: u32,
    pub tree_nodes: usize,

    pub best_key: Option<String>,
    pub best_success_rate: Option<f64>,
}

impl PlanEventV1 {
    pub const EVENT: &'static str = "plan";
}

/// Buffered append-only NDJSON writer.
///
/// Contract: each `write_event` emits exactly one JSON object followed by a
/// newline. Buffered output is not durable until `flush`.
pub struct SessionLog {
    w: BufWriter<File>,
}

impl SessionLog {
    /// Open a file for append, creating it if needed.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self, SessionLogError> {
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { w: BufWriter::new(f) })
    }

    pub fn write_event<T: Serialize>(&mut self, event: &T) -> Result<(), SessionLogError> {
        let mut buf = serde_json::to_vec(event)?;
        buf.push(b'\n');
        self.w.write_all(&buf)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SessionLogError> {
        self.w.flush()?;
        Ok(())
    }
}

//! # Telemetry Module
//!
//! Optional recording of the robot state to JSONL files with rotation.
//!
//! This module handles:
//! - Sampling ticks at the configured interval
//! - Formatting each sample as one JSON line
//! - Rotating to a new file after N records
//! - Retaining only the last M files

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::control::RobotState;
use crate::error::Result;

const FILE_PREFIX: &str = "telemetry_";
const FILE_EXTENSION: &str = "jsonl";

/// One sampled tick
#[derive(Debug, Clone, Serialize)]
pub struct TickRecord {
    pub timestamp: DateTime<Utc>,
    pub tick: u64,
    pub connected: bool,
    pub state: RobotState,
}

impl TickRecord {
    pub fn new(tick: u64, connected: bool, state: RobotState) -> Self {
        Self {
            timestamp: Utc::now(),
            tick,
            connected,
            state,
        }
    }
}

/// Rotating JSONL writer
#[derive(Debug)]
pub struct TelemetryRecorder {
    log_dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    log_interval: Duration,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    files_opened: u64,
    last_sample: Option<Instant>,
}

impl TelemetryRecorder {
    /// Create the log directory if needed
    ///
    /// # Errors
    ///
    /// Returns `Io` error if the directory cannot be created.
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let log_dir = PathBuf::from(&config.log_dir);
        fs::create_dir_all(&log_dir)?;
        info!("Telemetry enabled, writing to {}", log_dir.display());

        Ok(Self {
            log_dir,
            max_records_per_file: config.max_records_per_file,
            max_files_to_keep: config.max_files_to_keep,
            log_interval: Duration::from_millis(config.log_interval_ms),
            writer: None,
            records_in_file: 0,
            files_opened: 0,
            last_sample: None,
        })
    }

    /// True if a full interval has passed since the last sample
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_sample {
            Some(last) => now.saturating_duration_since(last) >= self.log_interval,
            None => true,
        }
    }

    /// Record `record` if the sampling interval has elapsed
    ///
    /// Returns whether a line was written.
    pub fn sample(&mut self, now: Instant, record: &TickRecord) -> Result<bool> {
        if !self.is_due(now) {
            return Ok(false);
        }
        self.last_sample = Some(now);
        self.write_record(record)?;
        Ok(true)
    }

    /// Append one line, rotating first if the current file is full
    pub fn write_record(&mut self, record: &TickRecord) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            self.records_in_file += 1;
        }
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%d_%H%M%S"),
            self.files_opened,
            FILE_EXTENSION
        );
        let path = self.log_dir.join(name);
        let file = File::create(&path)?;
        debug!("Opened telemetry file {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.records_in_file = 0;
        self.files_opened += 1;

        self.prune()
    }

    /// Delete the oldest telemetry files beyond the retention limit
    fn prune(&self) -> Result<()> {
        let mut files = telemetry_files(&self.log_dir)?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for old in files.into_iter().take(excess) {
            if let Err(e) = fs::remove_file(&old) {
                warn!("Failed to remove old telemetry file {}: {}", old.display(), e);
            } else {
                debug!("Removed old telemetry file {}", old.display());
            }
        }
        Ok(())
    }
}

fn telemetry_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(FILE_PREFIX))
            .unwrap_or(false)
            && path.extension().and_then(|ext| ext.to_str()) == Some(FILE_EXTENSION);
        if matches {
            files.push(path);
        }
    }
    Ok(files)
}

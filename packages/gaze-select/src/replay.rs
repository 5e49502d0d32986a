//! Offline replay of recorded tracker samples
//!
//! Recordings are JSON lines, one sample per line, tagged by channel:
//!
//! ```text
//! {"channel":"gaze","x":0.45,"y":0.5,"timestamp":12.01}
//! {"channel":"blink","kind":"onset","timestamp":12.40}
//! {"channel":"head","x":0.31,"y":0.52,"timestamp":12.41}
//! ```
//!
//! Samples are posted to a [`SampleMailbox`] as a virtual clock advances at
//! the engine tick rate, so the engine sees the same lossy, latest-sample
//! view it gets from the live feed.

use crate::engine::{SelectionEngine, TickOutput};
use crate::error::{Result, SelectError};
use crate::mailbox::SampleMailbox;
use crate::types::{BlinkEvent, BlinkKind, ConfirmedSelection, Sample};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum ReplayRecord {
    Gaze {
        x: f64,
        y: f64,
        timestamp: f64,
        #[serde(default = "default_confidence")]
        confidence: f64,
    },
    Blink {
        kind: BlinkKind,
        timestamp: f64,
    },
    Head {
        x: f64,
        y: f64,
        timestamp: f64,
    },
}

fn default_confidence() -> f64 {
    1.0
}

impl ReplayRecord {
    pub fn timestamp(&self) -> f64 {
        match self {
            Self::Gaze { timestamp, .. } | Self::Blink { timestamp, .. } | Self::Head { timestamp, .. } => {
                *timestamp
            }
        }
    }

    fn post(&self, mailbox: &SampleMailbox) {
        match *self {
            Self::Gaze {
                x,
                y,
                timestamp,
                confidence,
            } => mailbox.post_gaze(Sample::new(x, y, timestamp).with_confidence(confidence)),
            Self::Blink { kind, timestamp } => mailbox.post_blink(BlinkEvent { kind, timestamp }),
            Self::Head { x, y, timestamp } => mailbox.post_head(Sample::new(x, y, timestamp)),
        }
    }
}

/// Parse JSON-lines records. Blank lines and lines starting with `#` are
/// skipped.
pub fn parse_records<R: BufRead>(reader: R) -> Result<Vec<ReplayRecord>> {
    let mut records = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record: ReplayRecord = serde_json::from_str(trimmed)
            .map_err(|e| SelectError::Decode(format!("line {}: {}", number + 1, e)))?;
        if !record.timestamp().is_finite() {
            return Err(SelectError::Decode(format!(
                "line {}: timestamp is not finite",
                number + 1
            )));
        }
        records.push(record);
    }
    Ok(records)
}

pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<ReplayRecord>> {
    let file = std::fs::File::open(path.as_ref())?;
    let records = parse_records(std::io::BufReader::new(file))?;
    log::info!("Loaded {} records from {}", records.len(), path.as_ref().display());
    Ok(records)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplaySummary {
    pub ticks: u64,
    pub records: usize,
    pub candidates: usize,
    pub selections: Vec<ConfirmedSelection>,
    pub gaze_path_length: f64,
}

/// Drive `engine` through `records` on a virtual clock. `on_tick` runs after
/// every tick and may drain or act on a confirmation; anything it leaves
/// pending is drained before the next tick.
pub fn replay<F>(engine: &mut SelectionEngine, mut records: Vec<ReplayRecord>, mut on_tick: F) -> ReplaySummary
where
    F: FnMut(&mut SelectionEngine, &TickOutput, f64),
{
    records.sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));

    let mut summary = ReplaySummary {
        records: records.len(),
        ..Default::default()
    };
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return summary;
    };
    let end = last.timestamp();

    let mailbox = SampleMailbox::new();
    let mut pending = records.iter().peekable();
    let mut now = first.timestamp();
    let mut tick = 0u64;

    loop {
        while let Some(record) = pending.next_if(|r| r.timestamp() <= now) {
            record.post(&mailbox);
        }

        let out = engine.tick(now, mailbox.snapshot());
        if out.promoted.is_some() {
            summary.candidates += 1;
        }
        if let Some(selection) = out.confirmed {
            summary.selections.push(selection);
        }
        on_tick(engine, &out, now);
        engine.take_confirmed();

        tick += 1;
        if now >= end && pending.peek().is_none() {
            break;
        }
        // `on_tick` may change the tick rate
        now += engine.config().frame_budget();
    }

    summary.ticks = tick;
    summary.gaze_path_length = engine.gaze_path_length();
    log::info!(
        "Replayed {} records over {} ticks: {} candidate(s), {} selection(s)",
        summary.records,
        summary.ticks,
        summary.candidates,
        summary.selections.len()
    );
    summary
}

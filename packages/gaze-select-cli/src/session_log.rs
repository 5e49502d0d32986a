//! CSV session logs
//!
//! One event log and one Fitts log per participant and session. Both files
//! are rewritten in full on every [`SessionLogger::save`], so a crash loses
//! at most the event being written.

use chrono::{DateTime, Local};
use gaze_select::{Cell, GameMode, SelectError, StrategyKind};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventType {
    #[serde(rename = "highlighted_cell")]
    HighlightedCell,
    TaskCompleted,
}

/// One row of the event log. Field order is the column order.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub event_type: EventType,
    pub timestamp: DateTime<Local>,
    pub participant: String,
    pub task_index: u32,
    pub index: usize,
    pub result: Option<String>,
    pub target: Option<String>,
    pub highlighted_cell: Option<String>,
    pub correct_res: Option<bool>,
    pub elapsed_task_time: Option<f64>,
    pub from_highlighted_to_selected: Option<f64>,
    pub gaze_movement_pr_task: f64,
    pub method: StrategyKind,
    pub game_mode: GameMode,
    pub use_less: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FittsEntry {
    pub timestamp: DateTime<Local>,
    pub participant: String,
    pub task_index: u32,
    pub start_dist_to_target: f64,
    pub elapsed_task_time: f64,
    pub method: StrategyKind,
    pub game_mode: GameMode,
}

/// Event as reported by the session
#[derive(Debug, Clone, Copy)]
pub struct TaskEvent {
    pub event_type: EventType,
    pub result: Option<Cell>,
    pub target: Option<Cell>,
    pub highlighted: Option<Cell>,
    pub elapsed_task_time: Option<f64>,
    pub from_highlighted_to_selected: Option<f64>,
    pub gaze_movement: f64,
    pub method: StrategyKind,
    pub game_mode: GameMode,
}

pub struct SessionLogger {
    participant: String,
    path: PathBuf,
    fitts_path: PathBuf,
    task_index: u32,
    events: Vec<LogEntry>,
    fitts: Vec<FittsEntry>,
}

impl SessionLogger {
    /// `<data dir>/gaze-select/logs`, or `./logs` when the platform has no
    /// data directory
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("gaze-select"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("logs")
    }

    pub fn create(dir: &Path, participant: &str) -> Result<Self, SelectError> {
        std::fs::create_dir_all(dir)?;
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = dir.join(format!("{}_{}.csv", participant, stamp));
        let fitts_path = dir.join(format!("fitts_{}_FITTS_{}.csv", participant, stamp));
        log::info!("Session log: {}", path.display());

        Ok(Self {
            participant: participant.to_string(),
            path,
            fitts_path,
            task_index: 0,
            events: Vec::new(),
            fitts: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fitts_path(&self) -> &Path {
        &self.fitts_path
    }

    pub fn events(&self) -> &[LogEntry] {
        &self.events
    }

    pub fn fitts(&self) -> &[FittsEntry] {
        &self.fitts
    }

    pub fn log_event(&mut self, event: TaskEvent) {
        let correct_res = match event.event_type {
            EventType::HighlightedCell => None,
            EventType::TaskCompleted => Some(event.result.is_some() && event.result == event.target),
        };
        let entry = LogEntry {
            event_type: event.event_type,
            timestamp: Local::now(),
            participant: self.participant.clone(),
            task_index: self.task_index,
            index: self.events.len(),
            result: event.result.map(|c| c.to_string()),
            target: event.target.map(|c| c.to_string()),
            highlighted_cell: event.highlighted.map(|c| c.to_string()),
            correct_res,
            elapsed_task_time: event.elapsed_task_time,
            from_highlighted_to_selected: event.from_highlighted_to_selected,
            gaze_movement_pr_task: event.gaze_movement,
            method: event.method,
            game_mode: event.game_mode,
            use_less: false,
        };
        if event.event_type == EventType::TaskCompleted {
            self.task_index += 1;
        }
        self.events.push(entry);
    }

    pub fn log_fitts(
        &mut self,
        start_dist_to_target: f64,
        elapsed_task_time: f64,
        method: StrategyKind,
        game_mode: GameMode,
    ) {
        self.fitts.push(FittsEntry {
            timestamp: Local::now(),
            participant: self.participant.clone(),
            task_index: self.task_index,
            start_dist_to_target,
            elapsed_task_time,
            method,
            game_mode,
        });
    }

    /// Flag the most recent completed task as unusable. Returns false when
    /// no task has completed yet.
    pub fn mark_last_useless(&mut self) -> bool {
        match self
            .events
            .iter_mut()
            .rev()
            .find(|e| e.event_type == EventType::TaskCompleted)
        {
            Some(entry) => {
                entry.use_less = true;
                log::info!("Task {} marked as unusable", entry.task_index);
                true
            }
            None => false,
        }
    }

    pub fn save(&self) -> Result<(), SelectError> {
        if self.events.is_empty() {
            return Ok(());
        }
        write_csv(&self.path, &self.events)?;
        if !self.fitts.is_empty() {
            write_csv(&self.fitts_path, &self.fitts)?;
        }
        log::trace!("Saved {} event(s) to {}", self.events.len(), self.path.display());
        Ok(())
    }
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), SelectError> {
    let mut writer = csv::Writer::from_path(path).map_err(std::io::Error::from)?;
    for row in rows {
        writer.serialize(row).map_err(std::io::Error::from)?;
    }
    writer.flush()?;
    Ok(())
}

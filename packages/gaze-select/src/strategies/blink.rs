use super::ModalitySignal;
use crate::error::{Result, SelectError};
use crate::types::{Action, BlinkKind, CandidateCell, Cell, ConfirmedSelection};
use serde::{Deserialize, Serialize};

/// Blink duration class that confirms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlinkTarget {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlinkClass {
    Short,
    Medium,
    Long,
}

impl BlinkClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }

    fn matches(&self, target: BlinkTarget) -> bool {
        matches!(
            (self, target),
            (Self::Long, BlinkTarget::Long) | (Self::Short, BlinkTarget::Short)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlinkConfig {
    #[serde(default = "default_dwell_time")]
    pub dwell_time: f64,

    /// Blinks longer than this are long (seconds)
    #[serde(default = "default_long_threshold")]
    pub long_threshold: f64,

    /// Blinks shorter than this are short (seconds)
    #[serde(default = "default_short_threshold")]
    pub short_threshold: f64,

    #[serde(default = "default_target")]
    pub target: BlinkTarget,

    /// Give up on an onset with no offset after this long. Unset waits forever.
    #[serde(default)]
    pub onset_timeout: Option<f64>,
}

fn default_dwell_time() -> f64 {
    0.2
}
fn default_long_threshold() -> f64 {
    0.4
}
fn default_short_threshold() -> f64 {
    0.2
}
fn default_target() -> BlinkTarget {
    BlinkTarget::Long
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            dwell_time: default_dwell_time(),
            long_threshold: default_long_threshold(),
            short_threshold: default_short_threshold(),
            target: default_target(),
            onset_timeout: None,
        }
    }
}

impl BlinkConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.short_threshold > 0.0 && self.short_threshold <= self.long_threshold) {
            return Err(SelectError::InvalidConfig(format!(
                "Blink thresholds must satisfy 0 < short ({}) <= long ({})",
                self.short_threshold, self.long_threshold
            )));
        }
        if let Some(timeout) = self.onset_timeout {
            if timeout <= self.long_threshold {
                return Err(SelectError::InvalidConfig(format!(
                    "Blink onset timeout ({}) would cut off long blinks (> {})",
                    timeout, self.long_threshold
                )));
            }
        }
        Ok(())
    }

    pub fn classify(&self, duration: f64) -> BlinkClass {
        if duration > self.long_threshold {
            BlinkClass::Long
        } else if duration < self.short_threshold {
            BlinkClass::Short
        } else {
            BlinkClass::Medium
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlinkState {
    WaitOnset,
    /// `start_time` is the onset event timestamp, `entered_at` the engine time
    InProgress { start_time: f64, entered_at: f64 },
}

/// Dwell, then blink with the configured duration class
#[derive(Debug, Clone)]
pub struct BlinkStrategy {
    config: BlinkConfig,
    state: BlinkState,
    last_class: Option<BlinkClass>,
}

impl BlinkStrategy {
    pub fn new(config: BlinkConfig) -> Self {
        Self {
            config,
            state: BlinkState::WaitOnset,
            last_class: None,
        }
    }

    pub fn state(&self) -> BlinkState {
        self.state
    }

    /// Class of the most recently completed blink
    pub fn last_class(&self) -> Option<BlinkClass> {
        self.last_class
    }

    pub fn evaluate(
        &mut self,
        candidate: Option<CandidateCell>,
        signal: &ModalitySignal,
        confirmed: Option<&ConfirmedSelection>,
    ) -> Option<(Cell, Action)> {
        if let (Some(timeout), BlinkState::InProgress { entered_at, .. }) = (self.config.onset_timeout, self.state) {
            if signal.now - entered_at >= timeout {
                log::warn!("Blink offset never arrived within {:.2}s, dropping onset", timeout);
                self.state = BlinkState::WaitOnset;
            }
        }

        let event = signal.blink?;
        match (event.kind, self.state) {
            (BlinkKind::Onset, BlinkState::WaitOnset) => {
                log::debug!("Blink onset at {:.3}", event.timestamp);
                self.state = BlinkState::InProgress {
                    start_time: event.timestamp,
                    entered_at: signal.now,
                };
                None
            }
            (BlinkKind::Onset, BlinkState::InProgress { .. }) => None,
            (BlinkKind::Offset, BlinkState::WaitOnset) => None,
            (BlinkKind::Offset, BlinkState::InProgress { start_time, .. }) => {
                self.state = BlinkState::WaitOnset;
                let duration = event.timestamp - start_time;
                let class = self.config.classify(duration);
                self.last_class = Some(class);
                log::debug!("{} blink, {:.4}s", class.as_str(), duration);

                if !class.matches(self.config.target) || confirmed.is_some() {
                    return None;
                }
                let candidate = candidate?;
                log::info!("Blink confirmed {}", candidate.cell);
                Some((candidate.cell, Action::Select))
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = BlinkState::WaitOnset;
        self.last_class = None;
    }
}

use super::ModalitySignal;
use crate::config::GridConfig;
use crate::error::{Result, SelectError};
use crate::types::{Action, CandidateCell, Cell, ConfirmedSelection, Point};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotCornerConfig {
    #[serde(default = "default_dwell_time")]
    pub dwell_time: f64,

    /// Trigger point as fractions of screen width/height
    #[serde(default = "default_trigger_point")]
    pub trigger_point: Point,

    /// Gaze must be strictly closer than this (pixels)
    #[serde(default = "default_trigger_radius")]
    pub trigger_radius: f64,

    /// Seconds after arming during which the corner confirms
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// No re-arming this long after a confirmation
    #[serde(default = "default_rearm_delay")]
    pub rearm_delay: f64,

    /// Optional cancel point, same units as `trigger_point`
    #[serde(default)]
    pub cancel_point: Option<Point>,
}

fn default_dwell_time() -> f64 {
    0.2
}
fn default_trigger_point() -> Point {
    Point::new(0.75, 0.2)
}
fn default_trigger_radius() -> f64 {
    200.0
}
fn default_timeout() -> f64 {
    1.5
}
fn default_rearm_delay() -> f64 {
    0.3
}

impl Default for HotCornerConfig {
    fn default() -> Self {
        Self {
            dwell_time: default_dwell_time(),
            trigger_point: default_trigger_point(),
            trigger_radius: default_trigger_radius(),
            timeout: default_timeout(),
            rearm_delay: default_rearm_delay(),
            cancel_point: None,
        }
    }
}

impl HotCornerConfig {
    pub fn validate(&self) -> Result<()> {
        let in_unit = |p: &Point| (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y);
        if !in_unit(&self.trigger_point) || !self.cancel_point.as_ref().map_or(true, in_unit) {
            return Err(SelectError::InvalidConfig(
                "Hot corner points are screen fractions and must lie in [0, 1]".to_string(),
            ));
        }
        if self.trigger_radius <= 0.0 || self.timeout <= 0.0 || self.rearm_delay < 0.0 {
            return Err(SelectError::InvalidConfig(format!(
                "Hot corner radius ({}) and timeout ({}) must be positive",
                self.trigger_radius, self.timeout
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HotCornerState {
    Idle,
    Armed { cell: Cell, armed_at: f64, deadline: f64 },
}

/// Dwell, then glance at the trigger corner before the deadline
#[derive(Debug, Clone)]
pub struct HotCornerStrategy {
    config: HotCornerConfig,
    trigger: Point,
    cancel: Option<Point>,
    state: HotCornerState,
    last_armed_for: Option<CandidateCell>,
    rearm_after: f64,
}

impl HotCornerStrategy {
    pub fn new(config: HotCornerConfig, grid: &GridConfig) -> Self {
        let trigger = grid.fraction_to_screen(config.trigger_point);
        let cancel = config.cancel_point.map(|p| grid.fraction_to_screen(p));
        Self {
            config,
            trigger,
            cancel,
            state: HotCornerState::Idle,
            last_armed_for: None,
            rearm_after: f64::NEG_INFINITY,
        }
    }

    pub fn state(&self) -> HotCornerState {
        self.state
    }

    /// Trigger point in screen pixels
    pub fn trigger_point(&self) -> Point {
        self.trigger
    }

    pub fn evaluate(
        &mut self,
        candidate: Option<CandidateCell>,
        signal: &ModalitySignal,
        confirmed: Option<&ConfirmedSelection>,
    ) -> Option<(Cell, Action)> {
        if confirmed.is_some() {
            return None;
        }
        let now = signal.now;

        let Some(candidate) = candidate else {
            if let HotCornerState::Armed { cell, .. } = self.state {
                log::debug!("Hot corner disarmed, candidate {} went away", cell);
                self.state = HotCornerState::Idle;
            }
            return None;
        };

        if self.last_armed_for != Some(candidate) && now >= self.rearm_after {
            let deadline = now + self.config.timeout;
            log::debug!("Hot corner armed for {} until {:.3}", candidate.cell, deadline);
            self.state = HotCornerState::Armed {
                cell: candidate.cell,
                armed_at: now,
                deadline,
            };
            self.last_armed_for = Some(candidate);
        }

        let HotCornerState::Armed { cell, deadline, .. } = self.state else {
            return None;
        };

        if now >= deadline {
            log::debug!("Hot corner timed out for {}", cell);
            self.state = HotCornerState::Idle;
            return None;
        }

        let gaze = signal.raw_gaze?;
        if gaze.distance(&self.trigger) < self.config.trigger_radius {
            log::info!("Hot corner confirmed {}", cell);
            self.state = HotCornerState::Idle;
            self.rearm_after = now + self.config.rearm_delay;
            return Some((cell, Action::Select));
        }
        if let Some(cancel) = self.cancel {
            if gaze.distance(&cancel) < self.config.trigger_radius {
                log::info!("Hot corner cancelled {}", cell);
                self.state = HotCornerState::Idle;
                return Some((cell, Action::Cancel));
            }
        }
        None
    }

    pub fn reset(&mut self) {
        self.state = HotCornerState::Idle;
        self.last_armed_for = None;
        self.rearm_after = f64::NEG_INFINITY;
    }
}

use super::ModalitySignal;
use crate::error::{Result, SelectError};
use crate::types::{Action, CandidateCell, Cell, ConfirmedSelection, Point};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadTurnConfig {
    #[serde(default = "default_dwell_time")]
    pub dwell_time: f64,

    /// Maximum direction change between successive movements (degrees)
    #[serde(default = "default_angle_threshold")]
    pub angle_threshold: f64,

    /// How long the movement must stay smooth (seconds)
    #[serde(default = "default_duration")]
    pub duration: f64,

    /// Displacements shorter than this count as standing still
    #[serde(default = "default_min_movement")]
    pub min_movement: f64,
}

fn default_dwell_time() -> f64 {
    0.4
}
fn default_angle_threshold() -> f64 {
    30.0
}
fn default_duration() -> f64 {
    0.3
}
fn default_min_movement() -> f64 {
    1e-6
}

impl Default for HeadTurnConfig {
    fn default() -> Self {
        Self {
            dwell_time: default_dwell_time(),
            angle_threshold: default_angle_threshold(),
            duration: default_duration(),
            min_movement: default_min_movement(),
        }
    }
}

impl HeadTurnConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.angle_threshold > 0.0 && self.angle_threshold <= 180.0) {
            return Err(SelectError::InvalidConfig(format!(
                "Head turn angle threshold must be in (0, 180], got {}",
                self.angle_threshold
            )));
        }
        if self.duration < 0.0 || self.min_movement < 0.0 {
            return Err(SelectError::InvalidConfig(
                "Head turn duration and minimum movement must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Angle between two vectors in degrees
fn angle_between(a: &Point, b: &Point) -> f64 {
    let cos = (a.dot(b) / (a.norm() * b.norm())).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Dwell, then keep the head moving in a steady direction
#[derive(Debug, Clone)]
pub struct HeadTurnStrategy {
    config: HeadTurnConfig,
    prev_pos: Option<Point>,
    prev_vector: Option<Point>,
    tracking_since: Option<f64>,
    smooth: bool,
}

impl HeadTurnStrategy {
    pub fn new(config: HeadTurnConfig) -> Self {
        Self {
            config,
            prev_pos: None,
            prev_vector: None,
            tracking_since: None,
            smooth: false,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking_since.is_some()
    }

    pub fn is_smooth(&self) -> bool {
        self.smooth
    }

    fn advance(&mut self, position: Point, now: f64) {
        let Some(prev_pos) = self.prev_pos else {
            self.prev_pos = Some(position);
            return;
        };

        let movement = position.sub(&prev_pos);
        if movement.norm() < self.config.min_movement {
            self.prev_vector = None;
            self.tracking_since = None;
            self.smooth = false;
            return;
        }

        match self.prev_vector {
            Some(prev_vector) => {
                let angle = angle_between(&movement, &prev_vector);
                if angle < self.config.angle_threshold {
                    match self.tracking_since {
                        None => self.tracking_since = Some(now),
                        Some(start) if now - start >= self.config.duration => {
                            if !self.smooth {
                                log::debug!("Smooth head movement confirmed (angle {:.2})", angle);
                            }
                            self.smooth = true;
                        }
                        Some(_) => {}
                    }
                } else {
                    log::debug!("Head direction changed too much: {:.2} degrees", angle);
                    self.tracking_since = None;
                    self.smooth = false;
                }
            }
            None => self.tracking_since = Some(now),
        }

        self.prev_pos = Some(position);
        self.prev_vector = Some(movement);
    }

    pub fn evaluate(
        &mut self,
        candidate: Option<CandidateCell>,
        signal: &ModalitySignal,
        confirmed: Option<&ConfirmedSelection>,
    ) -> Option<(Cell, Action)> {
        if let Some(head) = signal.head {
            self.advance(head.position, signal.now);
        }

        if !self.smooth || confirmed.is_some() {
            return None;
        }
        let candidate = candidate?;
        log::info!("Head turn confirmed {}", candidate.cell);
        Some((candidate.cell, Action::Select))
    }

    pub fn reset(&mut self) {
        self.prev_pos = None;
        self.prev_vector = None;
        self.tracking_since = None;
        self.smooth = false;
    }
}

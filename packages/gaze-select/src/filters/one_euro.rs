use crate::types::Point;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneEuroParams {
    /// Initial sampling rate estimate (Hz)
    #[serde(default = "default_frequency")]
    pub frequency: f64,

    #[serde(default = "default_min_cutoff")]
    pub min_cutoff: f64,

    /// Speed coefficient
    #[serde(default = "default_beta")]
    pub beta: f64,

    /// Cutoff for the derivative low-pass
    #[serde(default = "default_d_cutoff")]
    pub d_cutoff: f64,
}

fn default_frequency() -> f64 {
    120.0
}
fn default_min_cutoff() -> f64 {
    1.0
}
fn default_beta() -> f64 {
    0.05
}
fn default_d_cutoff() -> f64 {
    1.0
}

impl Default for OneEuroParams {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
            min_cutoff: default_min_cutoff(),
            beta: default_beta(),
            d_cutoff: default_d_cutoff(),
        }
    }
}

fn smoothing_factor(cutoff: f64, frequency: f64) -> f64 {
    let tau = 1.0 / (2.0 * PI * cutoff);
    let te = 1.0 / frequency;
    1.0 / (1.0 + tau / te)
}

#[derive(Debug, Clone, Default)]
struct LowPass {
    last: Option<f64>,
}

impl LowPass {
    fn apply(&mut self, value: f64, alpha: f64) -> f64 {
        let out = match self.last {
            Some(prev) => alpha * value + (1.0 - alpha) * prev,
            None => value,
        };
        self.last = Some(out);
        out
    }
}

#[derive(Debug, Clone)]
struct Axis {
    frequency: f64,
    value: LowPass,
    derivative: LowPass,
    last_time: Option<f64>,
}

impl Axis {
    fn new(frequency: f64) -> Self {
        Self {
            frequency,
            value: LowPass::default(),
            derivative: LowPass::default(),
            last_time: None,
        }
    }

    fn filter(&mut self, x: f64, t: f64, params: &OneEuroParams) -> f64 {
        if let Some(last) = self.last_time {
            let dt = t - last;
            if dt > 0.0 {
                self.frequency = 1.0 / dt;
            }
        }
        self.last_time = Some(t);

        let dx = match self.value.last {
            Some(prev) => (x - prev) * self.frequency,
            None => 0.0,
        };
        let edx = self
            .derivative
            .apply(dx, smoothing_factor(params.d_cutoff, self.frequency));
        let cutoff = params.min_cutoff + params.beta * edx.abs();
        self.value.apply(x, smoothing_factor(cutoff, self.frequency))
    }
}

/// One Euro filter, one independent instance per axis
#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    params: OneEuroParams,
    x: Axis,
    y: Axis,
}

impl OneEuroFilter {
    pub fn new(params: OneEuroParams) -> Self {
        let frequency = params.frequency;
        Self {
            params,
            x: Axis::new(frequency),
            y: Axis::new(frequency),
        }
    }

    pub fn update(&mut self, raw: Point, timestamp: f64) -> Point {
        Point::new(
            self.x.filter(raw.x, timestamp, &self.params),
            self.y.filter(raw.y, timestamp, &self.params),
        )
    }

    pub fn reset(&mut self) {
        self.x = Axis::new(self.params.frequency);
        self.y = Axis::new(self.params.frequency);
    }
}

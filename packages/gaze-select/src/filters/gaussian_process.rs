use crate::types::Point;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianProcessParams {
    /// Samples kept for the fit
    #[serde(default = "default_window")]
    pub window: usize,

    /// Below this many samples the raw input is passed through
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    /// Prediction horizon past the newest sample (seconds)
    #[serde(default = "default_horizon")]
    pub horizon: f64,

    /// RBF length scale (seconds)
    #[serde(default = "default_length_scale")]
    pub length_scale: f64,

    /// Observation noise as a fraction of the signal variance
    #[serde(default = "default_noise")]
    pub noise: f64,
}

fn default_window() -> usize {
    10
}
fn default_min_samples() -> usize {
    5
}
fn default_horizon() -> f64 {
    0.1
}
fn default_length_scale() -> f64 {
    0.1
}
fn default_noise() -> f64 {
    1e-4
}

impl Default for GaussianProcessParams {
    fn default() -> Self {
        Self {
            window: default_window(),
            min_samples: default_min_samples(),
            horizon: default_horizon(),
            length_scale: default_length_scale(),
            noise: default_noise(),
        }
    }
}

/// Gaussian-process regression over a sliding window, evaluated one
/// horizon ahead of the newest sample. One GP per axis, shared kernel.
#[derive(Debug, Clone)]
pub struct GaussianProcessFilter {
    params: GaussianProcessParams,
    history: VecDeque<(Point, f64)>,
}

impl GaussianProcessFilter {
    pub fn new(params: GaussianProcessParams) -> Self {
        let capacity = params.window;
        Self {
            params,
            history: VecDeque::with_capacity(capacity),
        }
    }

    pub fn update(&mut self, raw: Point, timestamp: f64) -> Point {
        if self.history.len() == self.params.window {
            self.history.pop_front();
        }
        self.history.push_back((raw, timestamp));

        if self.history.len() < self.params.min_samples {
            return raw;
        }

        // Times relative to the newest sample keep the kernel well scaled
        let times: Vec<f64> = self.history.iter().map(|(_, t)| t - timestamp).collect();
        let xs: Vec<f64> = self.history.iter().map(|(p, _)| p.x).collect();
        let ys: Vec<f64> = self.history.iter().map(|(p, _)| p.y).collect();

        match (
            self.predict_axis(&times, &xs),
            self.predict_axis(&times, &ys),
        ) {
            (Some(x), Some(y)) => Point::new(x, y),
            _ => raw,
        }
    }

    fn kernel(&self, a: f64, b: f64, variance: f64) -> f64 {
        let d = a - b;
        variance * (-(d * d) / (2.0 * self.params.length_scale * self.params.length_scale)).exp()
    }

    fn predict_axis(&self, times: &[f64], values: &[f64]) -> Option<f64> {
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        if variance < 1e-12 {
            // Flat signal; the fit would be degenerate
            return Some(values[n - 1]);
        }

        let noise = self.params.noise * variance;
        let k = DMatrix::from_fn(n, n, |i, j| {
            self.kernel(times[i], times[j], variance) + if i == j { noise } else { 0.0 }
        });
        let centred = DVector::from_iterator(n, values.iter().map(|v| v - mean));

        let Some(cholesky) = k.cholesky() else {
            log::debug!("GP kernel matrix is not positive definite, passing raw sample");
            return None;
        };
        let alpha = cholesky.solve(&centred);

        let target = self.params.horizon;
        let k_star = DVector::from_iterator(n, times.iter().map(|t| self.kernel(target, *t, variance)));
        let prediction = mean + k_star.dot(&alpha);
        prediction.is_finite().then_some(prediction)
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

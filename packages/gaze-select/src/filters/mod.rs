//! Gaze smoothing and prediction filters
//!
//! Every filter maps a raw `(position, timestamp)` sample to a smoothed or
//! predicted position. Filters never fail: whenever a fit is impossible
//! (too few samples, singular system, non-finite input) they fall back to the
//! raw input or their last good output.
//!
//! The set of filters is closed; [`SmoothingFilter`] dispatches over it
//! explicitly.

mod autoregressive;
mod gaussian_process;
mod kalman;
mod linear;
mod one_euro;

pub use autoregressive::{AutoRegressiveFilter, AutoRegressiveParams};
pub use gaussian_process::{GaussianProcessFilter, GaussianProcessParams};
pub use kalman::{KalmanFilter, KalmanParams};
pub use linear::{LinearExtrapolationFilter, LinearParams};
pub use one_euro::{OneEuroFilter, OneEuroParams};

use crate::error::{Result, SelectError};
use crate::types::Point;
use serde::{Deserialize, Serialize};

/// Filter variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    OneEuro,
    Kalman,
    Linear,
    GaussianProcess,
    Autoregressive,
}

impl FilterKind {
    pub const ALL: [FilterKind; 5] = [
        Self::OneEuro,
        Self::Kalman,
        Self::Linear,
        Self::GaussianProcess,
        Self::Autoregressive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneEuro => "one_euro",
            Self::Kalman => "kalman",
            Self::Linear => "linear",
            Self::GaussianProcess => "gaussian_process",
            Self::Autoregressive => "autoregressive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "one_euro" | "oneeuro" => Some(Self::OneEuro),
            "kalman" => Some(Self::Kalman),
            "linear" => Some(Self::Linear),
            "gaussian_process" | "gp" => Some(Self::GaussianProcess),
            "autoregressive" | "ar" => Some(Self::Autoregressive),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::OneEuro => "Adaptive low-pass; cutoff rises with signal speed",
            Self::Kalman => "Constant-velocity Kalman filter over (x, y, vx, vy)",
            Self::Linear => "Finite-difference extrapolation 100 ms ahead",
            Self::GaussianProcess => "RBF Gaussian process over the last 10 samples, 100 ms ahead (most expensive)",
            Self::Autoregressive => "Yule-Walker AR(lag) one-step forecast per axis",
        }
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter selection plus the parameters of every variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_kind")]
    pub kind: FilterKind,

    #[serde(default)]
    pub one_euro: OneEuroParams,

    #[serde(default)]
    pub kalman: KalmanParams,

    #[serde(default)]
    pub linear: LinearParams,

    #[serde(default)]
    pub gaussian_process: GaussianProcessParams,

    #[serde(default)]
    pub autoregressive: AutoRegressiveParams,
}

fn default_kind() -> FilterKind {
    FilterKind::OneEuro
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            one_euro: OneEuroParams::default(),
            kalman: KalmanParams::default(),
            linear: LinearParams::default(),
            gaussian_process: GaussianProcessParams::default(),
            autoregressive: AutoRegressiveParams::default(),
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        let p = &self.one_euro;
        if !(p.frequency > 0.0 && p.min_cutoff > 0.0 && p.d_cutoff > 0.0 && p.beta >= 0.0) {
            return Err(SelectError::InvalidConfig(
                "One Euro frequency and cutoffs must be positive, beta non-negative".to_string(),
            ));
        }
        if self.kalman.measurement_noise <= 0.0 || self.kalman.process_noise.iter().any(|q| *q < 0.0) {
            return Err(SelectError::InvalidConfig(
                "Kalman noise covariances must be non-negative (measurement noise positive)".to_string(),
            ));
        }
        let gp = &self.gaussian_process;
        if gp.min_samples < 2 || gp.window < gp.min_samples {
            return Err(SelectError::InvalidConfig(format!(
                "Gaussian process needs 2 <= min_samples ({}) <= window ({})",
                gp.min_samples, gp.window
            )));
        }
        if gp.length_scale <= 0.0 || gp.noise < 0.0 {
            return Err(SelectError::InvalidConfig(
                "Gaussian process length scale must be positive".to_string(),
            ));
        }
        if self.autoregressive.lag < 1 {
            return Err(SelectError::InvalidConfig(
                "Autoregressive lag must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Closed set of smoothing filters
#[derive(Debug, Clone)]
pub enum SmoothingFilter {
    OneEuro(OneEuroFilter),
    Kalman(KalmanFilter),
    Linear(LinearExtrapolationFilter),
    GaussianProcess(GaussianProcessFilter),
    Autoregressive(AutoRegressiveFilter),
}

impl SmoothingFilter {
    /// Build the filter selected by `config.kind`
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::build(config.kind, config)
    }

    pub fn build(kind: FilterKind, config: &FilterConfig) -> Self {
        match kind {
            FilterKind::OneEuro => Self::OneEuro(OneEuroFilter::new(config.one_euro.clone())),
            FilterKind::Kalman => Self::Kalman(KalmanFilter::new(config.kalman.clone())),
            FilterKind::Linear => Self::Linear(LinearExtrapolationFilter::new(config.linear.clone())),
            FilterKind::GaussianProcess => {
                Self::GaussianProcess(GaussianProcessFilter::new(config.gaussian_process.clone()))
            }
            FilterKind::Autoregressive => {
                Self::Autoregressive(AutoRegressiveFilter::new(config.autoregressive.clone()))
            }
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Self::OneEuro(_) => FilterKind::OneEuro,
            Self::Kalman(_) => FilterKind::Kalman,
            Self::Linear(_) => FilterKind::Linear,
            Self::GaussianProcess(_) => FilterKind::GaussianProcess,
            Self::Autoregressive(_) => FilterKind::Autoregressive,
        }
    }

    /// Feed one raw sample and get the filtered position back
    pub fn update(&mut self, raw: Point, timestamp: f64) -> Point {
        if !raw.is_finite() {
            return raw;
        }
        let out = match self {
            Self::OneEuro(f) => f.update(raw, timestamp),
            Self::Kalman(f) => f.update(raw),
            Self::Linear(f) => f.update(raw, timestamp),
            Self::GaussianProcess(f) => f.update(raw, timestamp),
            Self::Autoregressive(f) => f.update(raw),
        };
        if out.is_finite() {
            out
        } else {
            log::debug!("{} produced a non-finite output, passing raw sample", self.kind());
            raw
        }
    }

    /// Drop all history
    pub fn reset(&mut self) {
        match self {
            Self::OneEuro(f) => f.reset(),
            Self::Kalman(f) => f.reset(),
            Self::Linear(f) => f.reset(),
            Self::GaussianProcess(f) => f.reset(),
            Self::Autoregressive(f) => f.reset(),
        }
    }
}

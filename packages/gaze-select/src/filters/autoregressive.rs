use crate::types::Point;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoRegressiveParams {
    /// Model order; also the history length
    #[serde(default = "default_lag")]
    pub lag: usize,
}

fn default_lag() -> usize {
    5
}

impl Default for AutoRegressiveParams {
    fn default() -> Self {
        Self { lag: default_lag() }
    }
}

/// Per-axis AR(lag) one-step forecast, refit on every sample
#[derive(Debug, Clone)]
pub struct AutoRegressiveFilter {
    params: AutoRegressiveParams,
    history: VecDeque<Point>,
}

impl AutoRegressiveFilter {
    pub fn new(params: AutoRegressiveParams) -> Self {
        let capacity = params.lag;
        Self {
            params,
            history: VecDeque::with_capacity(capacity),
        }
    }

    pub fn update(&mut self, raw: Point) -> Point {
        if self.history.len() == self.params.lag {
            self.history.pop_front();
        }
        self.history.push_back(raw);

        if self.history.len() < self.params.lag {
            return raw;
        }

        let xs: Vec<f64> = self.history.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = self.history.iter().map(|p| p.y).collect();
        Point::new(
            forecast(&xs, self.params.lag).unwrap_or(raw.x),
            forecast(&ys, self.params.lag).unwrap_or(raw.y),
        )
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

/// Biased sample autocovariance at lags 0..=order
fn autocovariance(centred: &[f64], order: usize) -> Vec<f64> {
    let n = centred.len();
    (0..=order)
        .map(|k| {
            if k >= n {
                return 0.0;
            }
            centred[..n - k]
                .iter()
                .zip(&centred[k..])
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / n as f64
        })
        .collect()
}

/// Yule-Walker fit and one-step forecast. `None` when the series is flat or
/// the Toeplitz system cannot be solved.
fn forecast(series: &[f64], order: usize) -> Option<f64> {
    let n = series.len();
    let mean = series.iter().sum::<f64>() / n as f64;
    let centred: Vec<f64> = series.iter().map(|v| v - mean).collect();

    let r = autocovariance(&centred, order);
    if r[0] < 1e-12 {
        return None;
    }

    let toeplitz = DMatrix::from_fn(order, order, |i, j| r[i.abs_diff(j)]);
    let rhs = DVector::from_iterator(order, r[1..=order].iter().copied());
    let phi = toeplitz.lu().solve(&rhs)?;

    let prediction = mean
        + (0..order)
            .map(|i| phi[i] * centred[n - 1 - i])
            .sum::<f64>();
    prediction.is_finite().then_some(prediction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autocovariance_of_ramp() {
        let r = autocovariance(&[-2.0, -1.0, 0.0, 1.0, 2.0], 2);
        assert!((r[0] - 2.0).abs() < 1e-12);
        assert!((r[1] - 0.8).abs() < 1e-12);
        assert!((r[2] + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_passes_raw_until_lag_samples() {
        let mut filter = AutoRegressiveFilter::new(AutoRegressiveParams::default());
        for i in 0..4 {
            let p = Point::new(i as f64, 0.0);
            assert_eq!(filter.update(p), p);
        }
        let out = filter.update(Point::new(4.0, 0.0));
        assert!(out.is_finite());
        assert!((out.x - 4.0).abs() > 1e-9, "expected a forecast on the fifth sample");
        assert_eq!(out.y, 0.0);
    }

    #[test]
    fn test_flat_series_has_no_forecast() {
        assert_eq!(forecast(&[3.0; 5], 5), None);
    }
}

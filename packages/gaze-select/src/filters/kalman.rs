use crate::types::Point;
use nalgebra::{Matrix2, Matrix2x4, Matrix4, Vector2, Vector4};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KalmanParams {
    /// Diagonal of Q for (x, y, vx, vy)
    #[serde(default = "default_process_noise")]
    pub process_noise: [f64; 4],

    /// Isotropic measurement noise R
    #[serde(default = "default_measurement_noise")]
    pub measurement_noise: f64,

    /// Initial covariance scale, P0 = s * I
    #[serde(default = "default_initial_covariance")]
    pub initial_covariance: f64,

    /// Prediction step; one step per sample
    #[serde(default = "default_dt")]
    pub dt: f64,
}

fn default_process_noise() -> [f64; 4] {
    [0.05, 0.05, 0.02, 0.02]
}
fn default_measurement_noise() -> f64 {
    0.5
}
fn default_initial_covariance() -> f64 {
    100.0
}
fn default_dt() -> f64 {
    1.0
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self {
            process_noise: default_process_noise(),
            measurement_noise: default_measurement_noise(),
            initial_covariance: default_initial_covariance(),
            dt: default_dt(),
        }
    }
}

/// Constant-velocity Kalman filter on (x, y, vx, vy)
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    params: KalmanParams,
    transition: Matrix4<f64>,
    observation: Matrix2x4<f64>,
    process: Matrix4<f64>,
    measurement: Matrix2<f64>,
    state: Option<(Vector4<f64>, Matrix4<f64>)>,
}

impl KalmanFilter {
    pub fn new(params: KalmanParams) -> Self {
        let dt = params.dt;
        #[rustfmt::skip]
        let transition = Matrix4::new(
            1.0, 0.0, dt,  0.0,
            0.0, 1.0, 0.0, dt,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        #[rustfmt::skip]
        let observation = Matrix2x4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
        );
        let q = params.process_noise;
        let process = Matrix4::from_diagonal(&Vector4::new(q[0], q[1], q[2], q[3]));
        let measurement = Matrix2::identity() * params.measurement_noise;

        Self {
            params,
            transition,
            observation,
            process,
            measurement,
            state: None,
        }
    }

    pub fn update(&mut self, raw: Point) -> Point {
        let z = Vector2::new(raw.x, raw.y);

        let Some((x, p)) = self.state.as_ref() else {
            let x0 = Vector4::new(raw.x, raw.y, 0.0, 0.0);
            let p0 = Matrix4::identity() * self.params.initial_covariance;
            self.state = Some((x0, p0));
            return raw;
        };

        // Predict
        let x_pred = self.transition * x;
        let p_pred = self.transition * p * self.transition.transpose() + self.process;

        // Update
        let innovation = z - self.observation * x_pred;
        let s = self.observation * p_pred * self.observation.transpose() + self.measurement;
        let (x_new, p_new) = match s.try_inverse() {
            Some(s_inv) => {
                let gain = p_pred * self.observation.transpose() * s_inv;
                let x_new = x_pred + gain * innovation;
                let p_new = (Matrix4::identity() - gain * self.observation) * p_pred;
                (x_new, p_new)
            }
            None => {
                log::debug!("Kalman innovation covariance is singular, keeping prediction");
                (x_pred, p_pred)
            }
        };

        self.state = Some((x_new, p_new));
        Point::new(x_new[0], x_new[1])
    }

    /// Current velocity estimate in units per step
    pub fn velocity(&self) -> Option<Point> {
        self.state.as_ref().map(|(x, _)| Point::new(x[2], x[3]))
    }

    pub fn reset(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_constant_velocity() {
        let mut filter = KalmanFilter::new(KalmanParams::default());
        let mut out = Point::default();
        for i in 0..200 {
            out = filter.update(Point::new(i as f64 * 2.0, 100.0 - i as f64));
        }
        assert!((out.x - 398.0).abs() < 1.0, "x = {}", out.x);
        assert!((out.y - (-99.0)).abs() < 1.0, "y = {}", out.y);

        let v = filter.velocity().unwrap();
        assert!((v.x - 2.0).abs() < 0.1);
        assert!((v.y + 1.0).abs() < 0.1);
    }

    #[test]
    fn test_measurement_noise_is_attenuated() {
        let mut filter = KalmanFilter::new(KalmanParams::default());
        for _ in 0..50 {
            filter.update(Point::new(500.0, 500.0));
        }
        // Single outlier moves the estimate only part of the way
        let out = filter.update(Point::new(600.0, 500.0));
        assert!(out.x > 500.0 && out.x < 600.0);
    }

    #[test]
    fn test_reset_reseeds_from_next_measurement() {
        let mut filter = KalmanFilter::new(KalmanParams::default());
        filter.update(Point::new(1.0, 1.0));
        filter.update(Point::new(2.0, 2.0));
        filter.reset();
        assert!(filter.velocity().is_none());
        assert_eq!(filter.update(Point::new(9.0, 9.0)), Point::new(9.0, 9.0));
    }
}

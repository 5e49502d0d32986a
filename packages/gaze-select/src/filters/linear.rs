use crate::types::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearParams {
    /// How far ahead to extrapolate (seconds)
    #[serde(default = "default_horizon")]
    pub horizon: f64,
}

fn default_horizon() -> f64 {
    0.1
}

impl Default for LinearParams {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
        }
    }
}

/// Extrapolates along the velocity of the last two samples
#[derive(Debug, Clone)]
pub struct LinearExtrapolationFilter {
    params: LinearParams,
    previous: Option<(Point, f64)>,
}

impl LinearExtrapolationFilter {
    pub fn new(params: LinearParams) -> Self {
        Self {
            params,
            previous: None,
        }
    }

    pub fn update(&mut self, raw: Point, timestamp: f64) -> Point {
        let previous = self.previous.replace((raw, timestamp));
        let Some((prev, prev_t)) = previous else {
            return raw;
        };

        let dt = timestamp - prev_t;
        if dt <= 0.0 {
            return raw;
        }

        let vx = (raw.x - prev.x) / dt;
        let vy = (raw.y - prev.y) / dt;
        Point::new(
            raw.x + vx * self.params.horizon,
            raw.y + vy * self.params.horizon,
        )
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

//! Confirmation strategies
//!
//! Each strategy is a small state machine that looks at the current
//! candidate cell plus its own modality signal and decides whether the
//! candidate is confirmed. The engine owns one instance of every kind in a
//! [`StrategySet`] and advances only the active one.

mod blink;
mod head_turn;
mod hot_corner;

pub use blink::{BlinkClass, BlinkConfig, BlinkState, BlinkStrategy, BlinkTarget};
pub use head_turn::{HeadTurnConfig, HeadTurnStrategy};
pub use hot_corner::{HotCornerConfig, HotCornerState, HotCornerStrategy};

use crate::config::SelectorConfig;
use crate::types::{Action, BlinkEvent, CandidateCell, Cell, ConfirmedSelection, Point, Sample, StrategyKind};

/// Per-tick input for the strategies
#[derive(Debug, Clone, Copy, Default)]
pub struct ModalitySignal {
    /// Engine time (seconds)
    pub now: f64,
    /// Unfiltered gaze in screen pixels, if a fresh sample arrived
    pub raw_gaze: Option<Point>,
    pub blink: Option<BlinkEvent>,
    /// Head/pupil position in normalised eye-camera coordinates
    pub head: Option<Sample>,
}

impl ModalitySignal {
    pub fn at(now: f64) -> Self {
        Self {
            now,
            ..Default::default()
        }
    }
}

/// One state machine per strategy kind
#[derive(Debug, Clone)]
pub struct StrategySet {
    pub hot_corner: HotCornerStrategy,
    pub blink: BlinkStrategy,
    pub head_turn: HeadTurnStrategy,
}

impl StrategySet {
    pub fn new(config: &SelectorConfig) -> Self {
        Self {
            hot_corner: HotCornerStrategy::new(config.hot_corner.clone(), &config.grid),
            blink: BlinkStrategy::new(config.blink.clone()),
            head_turn: HeadTurnStrategy::new(config.head_turn.clone()),
        }
    }

    /// Advance the strategy of the given kind. The others are left untouched.
    pub fn evaluate(
        &mut self,
        kind: StrategyKind,
        candidate: Option<CandidateCell>,
        signal: &ModalitySignal,
        confirmed: Option<&ConfirmedSelection>,
    ) -> Option<(Cell, Action)> {
        match kind {
            StrategyKind::HotCorner => self.hot_corner.evaluate(candidate, signal, confirmed),
            StrategyKind::Blink => self.blink.evaluate(candidate, signal, confirmed),
            StrategyKind::HeadTurn => self.head_turn.evaluate(candidate, signal, confirmed),
        }
    }

    pub fn reset_all(&mut self) {
        self.hot_corner.reset();
        self.blink.reset();
        self.head_turn.reset();
    }
}

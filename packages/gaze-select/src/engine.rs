//! Per-tick selection pipeline
//!
//! [`SelectionEngine::tick`] runs one pass of
//! snapshot → filter → dwell → active strategy. It holds no clock of its own;
//! the caller passes `now`, so the same engine serves the live loop and the
//! offline replay.

use crate::config::{check_tick_rate, SelectorConfig};
use crate::dwell::DwellDetector;
use crate::error::Result;
use crate::filters::{FilterKind, SmoothingFilter};
use crate::mailbox::MailboxSnapshot;
use crate::profile_scope;
use crate::strategies::{ModalitySignal, StrategySet};
use crate::types::{Action, CandidateCell, Cell, ConfirmedSelection, Point, StrategyKind};
use serde::Serialize;

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TickOutput {
    /// Smoothed gaze in screen pixels, when a fresh gaze sample arrived
    pub filtered_gaze: Option<Point>,
    /// Candidate after this tick
    pub candidate: Option<CandidateCell>,
    /// Set on the tick a candidate is promoted
    pub promoted: Option<CandidateCell>,
    /// Raw strategy decision, including cancellations
    pub action: Option<(Cell, Action)>,
    /// Set on the tick a selection is confirmed
    pub confirmed: Option<ConfirmedSelection>,
}

pub struct SelectionEngine {
    config: SelectorConfig,
    method: StrategyKind,
    filter: SmoothingFilter,
    dwell: DwellDetector,
    strategies: StrategySet,
    pending: Option<ConfirmedSelection>,
    last_gaze: Option<Point>,
    gaze_path: f64,
}

impl SelectionEngine {
    pub fn new(config: SelectorConfig) -> Result<Self> {
        config.validate()?;
        let method = config.method;
        let filter = SmoothingFilter::from_config(&config.filter);
        let dwell = DwellDetector::new(config.grid.clone(), config.dwell_time(method));
        let strategies = StrategySet::new(&config);

        log::info!(
            "Selection engine ready: method={}, filter={}, {} Hz",
            method,
            filter.kind(),
            config.tick_rate_hz
        );

        Ok(Self {
            config,
            method,
            filter,
            dwell,
            strategies,
            pending: None,
            last_gaze: None,
            gaze_path: 0.0,
        })
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn method(&self) -> StrategyKind {
        self.method
    }

    pub fn filter_kind(&self) -> FilterKind {
        self.filter.kind()
    }

    pub fn strategies(&self) -> &StrategySet {
        &self.strategies
    }

    pub fn candidate(&self) -> Option<CandidateCell> {
        self.dwell.candidate()
    }

    /// Selection waiting to be drained by the trial lifecycle
    pub fn pending(&self) -> Option<&ConfirmedSelection> {
        self.pending.as_ref()
    }

    pub fn take_confirmed(&mut self) -> Option<ConfirmedSelection> {
        self.pending.take()
    }

    /// Accumulated smoothed gaze path length in pixels
    pub fn gaze_path_length(&self) -> f64 {
        self.gaze_path
    }

    pub fn reset_gaze_path(&mut self) {
        self.gaze_path = 0.0;
    }

    /// Run one tick
    pub fn tick(&mut self, now: f64, snapshot: MailboxSnapshot) -> TickOutput {
        profile_scope!("engine tick", self.config.frame_budget());
        let mut out = TickOutput::default();

        let gaze = snapshot
            .gaze
            .filter(|s| s.position.is_finite() && s.timestamp.is_finite());
        if snapshot.gaze.is_some() && gaze.is_none() {
            log::debug!("Dropping non-finite gaze sample");
        }
        let raw_gaze = gaze.map(|s| self.config.grid.to_screen(s.position));

        if let (Some(sample), Some(raw)) = (gaze, raw_gaze) {
            let smoothed = self.filter.update(raw, sample.timestamp);
            if let Some(prev) = self.last_gaze {
                self.gaze_path += smoothed.distance(&prev);
            }
            self.last_gaze = Some(smoothed);
            out.filtered_gaze = Some(smoothed);
            out.promoted = self.dwell.update(smoothed, now, self.pending.is_some());
        }

        let signal = ModalitySignal {
            now,
            raw_gaze,
            blink: snapshot.blink,
            head: snapshot.head,
        };
        out.action = self
            .strategies
            .evaluate(self.method, self.dwell.candidate(), &signal, self.pending.as_ref());

        match out.action {
            Some((cell, Action::Select)) => {
                let selection = ConfirmedSelection {
                    cell,
                    method: self.method,
                    timestamp: now,
                };
                self.pending = Some(selection);
                self.dwell.consume();
                out.confirmed = Some(selection);
            }
            Some((_, Action::Cancel)) => self.dwell.consume(),
            None => {}
        }

        out.candidate = self.dwell.candidate();
        out
    }

    /// Switch the active method. Every strategy, the dwell detector and the
    /// filter start over.
    pub fn set_method(&mut self, method: StrategyKind) {
        log::info!("Selection method {} -> {}", self.method, method);
        self.method = method;
        self.dwell.set_dwell_time(self.config.dwell_time(method));
        self.reset();
    }

    pub fn set_filter(&mut self, kind: FilterKind) {
        log::info!("Filter {} -> {}", self.filter.kind(), kind);
        self.config.filter.kind = kind;
        self.filter = SmoothingFilter::build(kind, &self.config.filter);
        self.reset();
    }

    pub fn set_tick_rate(&mut self, hz: f64) -> Result<()> {
        check_tick_rate(hz)?;
        self.config.tick_rate_hz = hz;
        self.reset();
        Ok(())
    }

    /// Drop all per-selection state. A pending selection survives.
    pub fn reset(&mut self) {
        self.strategies.reset_all();
        self.dwell.reset();
        self.filter.reset();
        self.last_gaze = None;
    }
}

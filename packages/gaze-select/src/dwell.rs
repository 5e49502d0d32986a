// Dwell-based candidate detection
//
// A cell becomes the candidate once the smoothed gaze has stayed on it for
// the active dwell time. Leaving the valid region is debounced by the same
// interval so a short excursion does not drop the candidate.

use crate::config::GridConfig;
use crate::types::{CandidateCell, Cell, Point};

#[derive(Debug, Clone)]
pub struct DwellDetector {
    grid: GridConfig,
    dwell_time: f64,
    last_observed: Option<Cell>,
    dwell_start: Option<f64>,
    out_of_bounds_since: Option<f64>,
    candidate: Option<CandidateCell>,
    promoted: bool,
}

impl DwellDetector {
    pub fn new(grid: GridConfig, dwell_time: f64) -> Self {
        Self {
            grid,
            dwell_time,
            last_observed: None,
            dwell_start: None,
            out_of_bounds_since: None,
            candidate: None,
            promoted: false,
        }
    }

    pub fn dwell_time(&self) -> f64 {
        self.dwell_time
    }

    /// Change the dwell time and drop all state
    pub fn set_dwell_time(&mut self, dwell_time: f64) {
        self.dwell_time = dwell_time;
        self.reset();
    }

    pub fn candidate(&self) -> Option<CandidateCell> {
        self.candidate
    }

    /// Most recent in-bounds cell under the gaze
    pub fn observed_cell(&self) -> Option<Cell> {
        self.last_observed
    }

    /// Feed one smoothed position. Returns the candidate only on the tick it
    /// is promoted.
    pub fn update(&mut self, position: Point, now: f64, selection_pending: bool) -> Option<CandidateCell> {
        let cell = self.grid.cell_at(position);

        if !self.grid.in_valid_region(cell) {
            let since = *self.out_of_bounds_since.get_or_insert(now);
            if now - since >= self.dwell_time && (self.candidate.is_some() || self.dwell_start.is_some()) {
                log::debug!("Gaze left the grid for {:.2}s, clearing dwell", now - since);
                self.clear_dwell();
            }
            return None;
        }
        self.out_of_bounds_since = None;

        if selection_pending {
            self.candidate = None;
            return None;
        }

        if self.last_observed != Some(cell) {
            self.last_observed = Some(cell);
            self.dwell_start = Some(now);
            self.candidate = None;
            self.promoted = false;
            return None;
        }

        let start = *self.dwell_start.get_or_insert(now);
        if !self.promoted && now - start >= self.dwell_time {
            let candidate = CandidateCell { cell, since: now };
            log::debug!("Candidate {} after {:.3}s dwell", cell, now - start);
            self.candidate = Some(candidate);
            self.promoted = true;
            return Some(candidate);
        }
        None
    }

    /// A confirmation used the candidate; the next one needs a fresh dwell
    pub fn consume(&mut self) {
        self.clear_dwell();
    }

    pub fn reset(&mut self) {
        self.clear_dwell();
        self.out_of_bounds_since = None;
    }

    fn clear_dwell(&mut self) {
        self.candidate = None;
        self.last_observed = None;
        self.dwell_start = None;
        self.promoted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> DwellDetector {
        DwellDetector::new(GridConfig::default(), 0.2)
    }

    // Centre of cell (2, 4) and (2, 5) on the default 1920x1080 grid
    const CELL_A: Point = Point::new(864.0, 540.0);
    const CELL_B: Point = Point::new(1056.0, 540.0);
    const OUTSIDE: Point = Point::new(50.0, 50.0);

    fn feed(d: &mut DwellDetector, position: Point, from: f64, to: f64) -> Vec<CandidateCell> {
        let mut promoted = Vec::new();
        let mut t = from;
        while t <= to + 1e-9 {
            if let Some(c) = d.update(position, t, false) {
                promoted.push(c);
            }
            t += 1.0 / 60.0;
        }
        promoted
    }

    #[test]
    fn test_promotes_once_per_continuous_run() {
        let mut d = detector();
        let promoted = feed(&mut d, CELL_A, 0.0, 1.0);
        assert_eq!(promoted.len(), 1);
        assert_eq!(promoted[0].cell, Cell::new(2, 4));
        assert!(promoted[0].since >= 0.2);
        assert_eq!(d.candidate().map(|c| c.cell), Some(Cell::new(2, 4)));
    }

    #[test]
    fn test_short_dwell_does_not_promote() {
        let mut d = detector();
        assert!(feed(&mut d, CELL_A, 0.0, 0.15).is_empty());
        assert!(d.candidate().is_none());
    }

    #[test]
    fn test_cell_change_destroys_candidate() {
        let mut d = detector();
        feed(&mut d, CELL_A, 0.0, 0.5);
        assert!(d.candidate().is_some());
        d.update(CELL_B, 0.52, false);
        assert!(d.candidate().is_none());
        assert_eq!(d.observed_cell(), Some(Cell::new(2, 5)));

        let promoted = feed(&mut d, CELL_B, 0.54, 1.0);
        assert_eq!(promoted.len(), 1);
        assert_eq!(promoted[0].cell, Cell::new(2, 5));
    }

    #[test]
    fn test_short_excursion_keeps_candidate() {
        let mut d = detector();
        feed(&mut d, CELL_A, 0.0, 0.5);
        d.update(OUTSIDE, 0.55, false);
        d.update(OUTSIDE, 0.65, false);
        assert!(d.candidate().is_some());

        // Returning to the same cell neither re-promotes nor drops it
        assert!(d.update(CELL_A, 0.7, false).is_none());
        assert!(d.candidate().is_some());
    }

    #[test]
    fn test_long_excursion_clears_candidate() {
        let mut d = detector();
        feed(&mut d, CELL_A, 0.0, 0.5);
        d.update(OUTSIDE, 0.55, false);
        d.update(OUTSIDE, 0.76, false);
        assert!(d.candidate().is_none());
        assert!(d.observed_cell().is_none());
    }

    #[test]
    fn test_pending_selection_forces_no_candidate() {
        let mut d = detector();
        feed(&mut d, CELL_A, 0.0, 0.5);
        assert!(d.update(CELL_A, 0.6, true).is_none());
        assert!(d.candidate().is_none());
    }

    #[test]
    fn test_consume_requires_fresh_dwell() {
        let mut d = detector();
        feed(&mut d, CELL_A, 0.0, 0.5);
        d.consume();
        assert!(d.update(CELL_A, 0.6, false).is_none());
        assert!(d.update(CELL_A, 0.7, false).is_none());
        assert!(d.update(CELL_A, 0.81, false).is_some());
    }
}

//! Target bookkeeping for the two game modes
//!
//! Chase walks a shuffled, cyclic list of the valid cells. Memory places a
//! set of images on the valid cells and asks for the image at the head of a
//! rotating queue; the layout is reshuffled after every selection.

use crate::config::GridConfig;
use crate::types::{Cell, GameMode};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::VecDeque;

/// Number of distinct images in memory mode
pub const MEMORY_IMAGES: usize = 9;

pub struct TrialLifecycle {
    rng: StdRng,
    chase_order: Vec<Cell>,
    index: usize,
    layout: Vec<Cell>,
    image_queue: VecDeque<usize>,
}

impl TrialLifecycle {
    pub fn new(grid: &GridConfig) -> Self {
        Self::with_rng(grid, StdRng::from_os_rng())
    }

    pub fn with_seed(grid: &GridConfig, seed: u64) -> Self {
        Self::with_rng(grid, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(grid: &GridConfig, mut rng: StdRng) -> Self {
        let mut chase_order = grid.valid_cells();
        chase_order.shuffle(&mut rng);
        log::debug!("Chase order: {:?}", chase_order);

        let images = MEMORY_IMAGES.min(chase_order.len());
        let mut queue: Vec<usize> = (0..images).collect();
        queue.shuffle(&mut rng);

        let mut layout = grid.valid_cells();
        layout.shuffle(&mut rng);

        Self {
            rng,
            chase_order,
            index: 0,
            layout,
            image_queue: queue.into(),
        }
    }

    /// Cell the participant should select next
    pub fn current_target(&self, mode: GameMode) -> Option<Cell> {
        match mode {
            GameMode::Chase => {
                if self.chase_order.is_empty() {
                    return None;
                }
                Some(self.chase_order[self.index % self.chase_order.len()])
            }
            GameMode::Memory => {
                let image = *self.image_queue.front()?;
                self.layout.get(image).copied()
            }
        }
    }

    /// Image shown in `cell` in memory mode
    pub fn image_at(&self, cell: Cell) -> Option<usize> {
        self.layout
            .iter()
            .take(self.image_queue.len())
            .position(|c| *c == cell)
    }

    /// Image the participant is asked to find
    pub fn target_image(&self) -> Option<usize> {
        self.image_queue.front().copied()
    }

    /// Number of selections made so far
    pub fn completed(&self) -> usize {
        self.index
    }

    /// Score a confirmed selection and move on to the next target.
    /// Advances whether or not the selection matched.
    pub fn on_confirmed(&mut self, mode: GameMode, cell: Cell) -> bool {
        let matched = self.current_target(mode) == Some(cell);
        log::info!(
            "[{}] confirmed {} target {:?}: {}",
            mode,
            cell,
            self.current_target(mode),
            if matched { "match" } else { "no match" }
        );

        self.index += 1;
        self.image_queue.rotate_left(1.min(self.image_queue.len()));
        self.layout.shuffle(&mut self.rng);
        matched
    }
}

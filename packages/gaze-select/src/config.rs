//! Selector configuration
//!
//! Everything the engine needs is fixed at construction and carried by
//! [`SelectorConfig`]. All fields have serde defaults so a partial JSON file
//! (or none at all) yields the stock study setup.

use crate::error::{Result, SelectError};
use crate::filters::FilterConfig;
use crate::strategies::{BlinkConfig, HeadTurnConfig, HotCornerConfig};
use crate::types::{Cell, Point, StrategyKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Half-open index range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub start: i32,
    pub end: i32,
}

impl CellRange {
    pub const fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, value: i32) -> bool {
        self.start <= value && value < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn len(&self) -> usize {
        (self.end - self.start).max(0) as usize
    }
}

/// Screen and grid geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,

    #[serde(default = "default_screen_height")]
    pub screen_height: u32,

    #[serde(default = "default_rows")]
    pub rows: u32,

    #[serde(default = "default_cols")]
    pub cols: u32,

    /// Rows in which gaze may promote a candidate
    #[serde(default = "default_valid_rows")]
    pub valid_rows: CellRange,

    /// Columns in which gaze may promote a candidate
    #[serde(default = "default_valid_cols")]
    pub valid_cols: CellRange,
}

fn default_screen_width() -> u32 {
    1920
}
fn default_screen_height() -> u32 {
    1080
}
fn default_rows() -> u32 {
    5
}
fn default_cols() -> u32 {
    10
}
fn default_valid_rows() -> CellRange {
    CellRange::new(1, 4)
}
fn default_valid_cols() -> CellRange {
    CellRange::new(3, 6)
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            rows: default_rows(),
            cols: default_cols(),
            valid_rows: default_valid_rows(),
            valid_cols: default_valid_cols(),
        }
    }
}

impl GridConfig {
    /// Cell width in whole pixels
    pub fn cell_width(&self) -> f64 {
        (self.screen_width / self.cols.max(1)) as f64
    }

    /// Cell height in whole pixels
    pub fn cell_height(&self) -> f64 {
        (self.screen_height / self.rows.max(1)) as f64
    }

    /// Map a pixel position onto the grid. Positions left of or above the
    /// screen map to negative cells rather than saturating.
    pub fn cell_at(&self, position: Point) -> Cell {
        Cell::new(
            (position.y / self.cell_height()).floor() as i32,
            (position.x / self.cell_width()).floor() as i32,
        )
    }

    pub fn in_valid_region(&self, cell: Cell) -> bool {
        self.valid_rows.contains(cell.row) && self.valid_cols.contains(cell.col)
    }

    /// All valid-region cells in row-major order
    pub fn valid_cells(&self) -> Vec<Cell> {
        (self.valid_rows.start..self.valid_rows.end)
            .flat_map(|row| (self.valid_cols.start..self.valid_cols.end).map(move |col| Cell::new(row, col)))
            .collect()
    }

    pub fn cell_center(&self, cell: Cell) -> Point {
        Point::new(
            cell.col as f64 * self.cell_width() + self.cell_width() / 2.0,
            cell.row as f64 * self.cell_height() + self.cell_height() / 2.0,
        )
    }

    /// Convert a normalised surface position (origin bottom-left) into screen
    /// pixels (origin top-left)
    pub fn to_screen(&self, normalized: Point) -> Point {
        Point::new(
            normalized.x * self.screen_width as f64,
            (1.0 - normalized.y) * self.screen_height as f64,
        )
    }

    /// Screen point given as fractions of width/height
    pub fn fraction_to_screen(&self, fraction: Point) -> Point {
        Point::new(
            fraction.x * self.screen_width as f64,
            fraction.y * self.screen_height as f64,
        )
    }

    fn validate(&self) -> Result<()> {
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(SelectError::InvalidConfig(format!(
                "Screen size must be non-zero, got {}x{}",
                self.screen_width, self.screen_height
            )));
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(SelectError::InvalidConfig(format!(
                "Grid must have at least one row and column, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.rows > self.screen_height || self.cols > self.screen_width {
            return Err(SelectError::InvalidConfig(
                "Grid is finer than one pixel per cell".to_string(),
            ));
        }
        if self.valid_rows.is_empty() || self.valid_cols.is_empty() {
            return Err(SelectError::InvalidConfig(
                "Valid region must contain at least one cell".to_string(),
            ));
        }
        if self.valid_rows.start < 0
            || self.valid_cols.start < 0
            || self.valid_rows.end > self.rows as i32
            || self.valid_cols.end > self.cols as i32
        {
            return Err(SelectError::InvalidConfig(format!(
                "Valid region rows {:?} cols {:?} exceeds {}x{} grid",
                self.valid_rows, self.valid_cols, self.rows, self.cols
            )));
        }
        Ok(())
    }
}

/// Accepted engine tick rates (Hz)
pub const MIN_TICK_RATE_HZ: f64 = 1.0;
pub const MAX_TICK_RATE_HZ: f64 = 1000.0;

/// Reject tick rates whose frame budget is not a usable timer period
pub fn check_tick_rate(hz: f64) -> Result<()> {
    if !(MIN_TICK_RATE_HZ..=MAX_TICK_RATE_HZ).contains(&hz) {
        return Err(SelectError::InvalidConfig(format!(
            "Tick rate must be between {} and {} Hz, got {}",
            MIN_TICK_RATE_HZ, MAX_TICK_RATE_HZ, hz
        )));
    }
    Ok(())
}

/// Complete selector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default)]
    pub grid: GridConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub hot_corner: HotCornerConfig,

    #[serde(default)]
    pub blink: BlinkConfig,

    #[serde(default)]
    pub head_turn: HeadTurnConfig,

    /// Engine tick rate (Hz)
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: f64,

    /// Method active when the engine starts
    #[serde(default = "default_method")]
    pub method: StrategyKind,
}

fn default_tick_rate() -> f64 {
    60.0
}
fn default_method() -> StrategyKind {
    StrategyKind::HotCorner
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            filter: FilterConfig::default(),
            hot_corner: HotCornerConfig::default(),
            blink: BlinkConfig::default(),
            head_turn: HeadTurnConfig::default(),
            tick_rate_hz: default_tick_rate(),
            method: default_method(),
        }
    }
}

impl SelectorConfig {
    /// Load a JSON configuration file; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: SelectorConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        log::info!("Loaded selector configuration from {}", path.display());
        Ok(config)
    }

    /// Dwell time required before a candidate is promoted, per method
    pub fn dwell_time(&self, method: StrategyKind) -> f64 {
        match method {
            StrategyKind::HotCorner => self.hot_corner.dwell_time,
            StrategyKind::Blink => self.blink.dwell_time,
            StrategyKind::HeadTurn => self.head_turn.dwell_time,
        }
    }

    /// Nominal duration of one tick (seconds)
    pub fn frame_budget(&self) -> f64 {
        1.0 / self.tick_rate_hz
    }

    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.filter.validate()?;

        check_tick_rate(self.tick_rate_hz)?;

        for method in StrategyKind::ALL {
            let dwell = self.dwell_time(method);
            if !(dwell.is_finite() && dwell >= 0.0) {
                return Err(SelectError::InvalidConfig(format!(
                    "Dwell time for {} must be non-negative, got {}",
                    method, dwell
                )));
            }
        }

        self.hot_corner.validate()?;
        self.blink.validate()?;
        self.head_turn.validate()?;
        Ok(())
    }
}

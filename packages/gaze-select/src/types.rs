use serde::{Deserialize, Serialize};

/// A 2D position, either normalised tracker coordinates or screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn sub(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One tracker sample (gaze or head/pupil position)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub position: Point,
    pub timestamp: f64,
    /// Tracker confidence in [0, 1]; only meaningful for gaze
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

impl Sample {
    pub fn new(x: f64, y: f64, timestamp: f64) -> Self {
        Self {
            position: Point::new(x, y),
            timestamp,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlinkKind {
    Onset,
    Offset,
}

impl BlinkKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "onset" => Some(Self::Onset),
            "offset" => Some(Self::Offset),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlinkEvent {
    pub kind: BlinkKind,
    pub timestamp: f64,
}

impl BlinkEvent {
    pub fn onset(timestamp: f64) -> Self {
        Self {
            kind: BlinkKind::Onset,
            timestamp,
        }
    }

    pub fn offset(timestamp: f64) -> Self {
        Self {
            kind: BlinkKind::Offset,
            timestamp,
        }
    }
}

/// Grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The cell currently eligible for confirmation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateCell {
    pub cell: Cell,
    /// Engine time at which the dwell promoted this cell
    pub since: f64,
}

/// Selection methods under evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[serde(rename = "hotcorner")]
    HotCorner,
    Blink,
    HeadTurn,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [Self::HotCorner, Self::Blink, Self::HeadTurn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HotCorner => "hotcorner",
            Self::Blink => "blink",
            Self::HeadTurn => "head_turn",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "hotcorner" | "hot_corner" => Some(Self::HotCorner),
            "blink" => Some(Self::Blink),
            "head_turn" | "headturn" => Some(Self::HeadTurn),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::HotCorner => "Dwell on a cell, then glance at the trigger corner before the deadline",
            Self::Blink => "Dwell on a cell, then blink with the configured duration class",
            Self::HeadTurn => "Dwell on a cell, then sustain a smooth head/pupil movement",
        }
    }

    /// The method after this one in evaluation order
    pub fn next(&self) -> Self {
        match self {
            Self::HotCorner => Self::Blink,
            Self::Blink => Self::HeadTurn,
            Self::HeadTurn => Self::HotCorner,
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a strategy decided for the candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Select,
    Cancel,
}

/// Final, accepted selection for a trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedSelection {
    pub cell: Cell,
    pub method: StrategyKind,
    pub timestamp: f64,
}

/// Trial target layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Chase,
    Memory,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chase => "chase",
            Self::Memory => "memory",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "chase" => Some(Self::Chase),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Self::Chase => Self::Memory,
            Self::Memory => Self::Chase,
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

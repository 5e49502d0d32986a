pub mod config;
pub mod dwell;
pub mod engine;
pub mod error;
pub mod filters;
pub mod ingest;
pub mod mailbox;
pub mod profiling;
pub mod replay;
pub mod strategies;
pub mod trial;
pub mod types;

pub use config::{CellRange, GridConfig, SelectorConfig};
pub use dwell::DwellDetector;
pub use engine::{SelectionEngine, TickOutput};
pub use error::{Result, SelectError};
pub use filters::{FilterConfig, FilterKind, SmoothingFilter};
pub use ingest::{IngestConfig, PupilSource};
pub use mailbox::{MailboxSnapshot, SampleMailbox};
pub use replay::{ReplayRecord, ReplaySummary};
pub use strategies::{ModalitySignal, StrategySet};
pub use trial::TrialLifecycle;
pub use types::*;

use clap::{Args, Parser, Subcommand};
use gaze_select::{FilterKind, GameMode, SelectError, SelectorConfig, StrategyKind};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gazeselect",
    version,
    about = "Gaze, blink and head-turn selection study host",
    long_about = "Run gaze selection sessions against a live Pupil Capture feed, or replay\n\
                  recorded samples through the same selection engine offline."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a live session against Pupil Capture
    Run(RunArgs),
    /// Replay recorded samples through the selection engine
    Replay(ReplayArgs),
    /// List selection methods
    Methods(ListArgs),
    /// List smoothing filters
    Filters(ListArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

/// Options shared by every command that builds an engine
#[derive(Args, Clone, Default)]
pub struct SelectorArgs {
    /// JSON configuration file
    #[arg(long, env = "GAZESELECT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Selection method (hotcorner, blink, head_turn)
    #[arg(long)]
    pub method: Option<String>,

    /// Smoothing filter (one_euro, kalman, linear, gaussian_process, autoregressive)
    #[arg(long)]
    pub filter: Option<String>,

    /// Engine tick rate in Hz
    #[arg(long)]
    pub tick_rate: Option<f64>,
}

impl SelectorArgs {
    /// Load the configuration file (or defaults) and apply flag overrides
    pub fn resolve(&self) -> Result<SelectorConfig, SelectError> {
        let mut config = match &self.config {
            Some(path) => SelectorConfig::load(path)?,
            None => SelectorConfig::default(),
        };
        if let Some(method) = &self.method {
            config.method = parse_method(method)?;
        }
        if let Some(filter) = &self.filter {
            config.filter.kind =
                FilterKind::from_str(filter).ok_or_else(|| SelectError::UnknownFilter(filter.clone()))?;
        }
        if let Some(rate) = self.tick_rate {
            config.tick_rate_hz = rate;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args)]
pub struct RunArgs {
    /// Participant identifier, used in log file names
    pub participant: String,

    #[command(flatten)]
    pub selector: SelectorArgs,

    /// Ask Pupil Capture to start recording
    #[arg(long, short = 'R', default_value_t = false)]
    pub start_recording: bool,

    /// Pupil Capture host
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Pupil Remote port
    #[arg(long, default_value_t = 50020)]
    pub port: u16,

    /// Surface the gaze is mapped onto
    #[arg(long, default_value = "monitor_overlay")]
    pub surface: String,

    /// Session log directory (default: <data dir>/gaze-select/logs)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    #[command(flatten)]
    pub protocol: ProtocolArgs,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<f64>,
}

/// Study protocol options
#[derive(Args, Clone)]
pub struct ProtocolArgs {
    /// Confirmed selections before switching to the next method
    #[arg(long, default_value_t = 9)]
    pub selections_per_method: u32,

    /// Method order; the session starts with --method or the first entry
    #[arg(long, num_args = 1.., default_values_t = vec!["hotcorner".to_string(), "blink".to_string(), "head_turn".to_string()])]
    pub methods: Vec<String>,

    /// Initial game mode (chase, memory)
    #[arg(long, default_value = "chase")]
    pub game_mode: String,

    /// Seed for target shuffling
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ProtocolArgs {
    pub fn method_order(&self) -> Result<Vec<StrategyKind>, SelectError> {
        let methods = self
            .methods
            .iter()
            .map(|m| parse_method(m))
            .collect::<Result<Vec<_>, _>>()?;
        if methods.is_empty() {
            return Err(SelectError::InvalidConfig("--methods must not be empty".to_string()));
        }
        Ok(methods)
    }

    pub fn initial_game_mode(&self) -> Result<GameMode, SelectError> {
        GameMode::from_str(&self.game_mode)
            .ok_or_else(|| SelectError::InvalidConfig(format!("Unknown game mode '{}'", self.game_mode)))
    }
}

#[derive(Args)]
pub struct ReplayArgs {
    /// Participant identifier
    pub participant: String,

    /// JSON-lines recording
    #[arg(long, short)]
    pub input: PathBuf,

    #[command(flatten)]
    pub selector: SelectorArgs,

    #[command(flatten)]
    pub protocol: ProtocolArgs,

    /// Also write the CSV session log to this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub selector: SelectorArgs,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,
}

pub fn parse_method(s: &str) -> Result<StrategyKind, SelectError> {
    StrategyKind::from_str(s).ok_or_else(|| SelectError::UnknownMethod(s.to_string()))
}

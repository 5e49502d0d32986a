pub mod config;
pub mod filters;
pub mod methods;
pub mod replay;
pub mod run;

use crate::cli::{ProtocolArgs, SelectorArgs};
use crate::exit_codes;
use crate::session::{StudyProtocol, StudySession};
use crate::session_log::SessionLogger;
use gaze_select::{SelectError, SelectionEngine, TrialLifecycle};
use std::path::PathBuf;

/// Engine plus study session, ready to be ticked
pub struct Prepared {
    pub engine: SelectionEngine,
    pub session: StudySession,
}

/// Build the engine and session shared by `run` and `replay`. Errors come
/// back as exit codes with the message already printed.
pub fn prepare(
    participant: &str,
    selector: &SelectorArgs,
    protocol: &ProtocolArgs,
    log_dir: Option<PathBuf>,
) -> Result<Prepared, i32> {
    let built = build(participant, selector, protocol, log_dir);
    built.map_err(|e| {
        eprintln!("Error: {}", e);
        exit_codes::for_error(&e)
    })
}

fn build(
    participant: &str,
    selector: &SelectorArgs,
    protocol: &ProtocolArgs,
    log_dir: Option<PathBuf>,
) -> Result<Prepared, SelectError> {
    if participant.trim().is_empty() {
        return Err(SelectError::InvalidConfig("participant must not be empty".to_string()));
    }
    if protocol.selections_per_method == 0 {
        return Err(SelectError::InvalidConfig(
            "--selections-per-method must be at least 1".to_string(),
        ));
    }

    let config = selector.resolve()?;
    let methods = protocol.method_order()?;
    let game_mode = protocol.initial_game_mode()?;

    let mut engine = SelectionEngine::new(config)?;
    if selector.method.is_none() {
        engine.set_method(methods[0]);
    }

    let trial = match protocol.seed {
        Some(seed) => TrialLifecycle::with_seed(&engine.config().grid, seed),
        None => TrialLifecycle::new(&engine.config().grid),
    };
    let logger = match log_dir {
        Some(dir) => Some(SessionLogger::create(&dir, participant)?),
        None => None,
    };

    let session = StudySession::new(
        &mut engine,
        trial,
        logger,
        StudyProtocol {
            methods,
            selections_per_method: protocol.selections_per_method,
            game_mode,
        },
    );
    Ok(Prepared { engine, session })
}

use crate::cli::ReplayArgs;
use crate::commands::{prepare, Prepared};
use crate::exit_codes;
use crate::output;
use crate::session::TrialResult;
use gaze_select::replay::{load_records, replay};
use gaze_select::{GameMode, ReplaySummary, SelectError, StrategyKind};
use serde::Serialize;

#[derive(Serialize)]
struct ReplayReport {
    participant: String,
    method: StrategyKind,
    game_mode: GameMode,
    summary: ReplaySummary,
    trials: Vec<TrialResult>,
    correct: usize,
    log_file: Option<String>,
}

pub fn execute(args: ReplayArgs) -> i32 {
    let records = match load_records(&args.input) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: failed to read '{}': {}", args.input.display(), e);
            return exit_codes::INPUT_ERROR;
        }
    };

    let Prepared {
        mut engine,
        mut session,
    } = match prepare(&args.participant, &args.selector, &args.protocol, args.log_dir.clone()) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let mut session_error: Option<SelectError> = None;
    let summary = replay(&mut engine, records, |engine, out, now| {
        if session_error.is_some() {
            return;
        }
        if let Err(e) = session.on_tick(engine, out, now) {
            session_error = Some(e);
        }
    });
    if let Some(e) = session_error {
        eprintln!("Error: {}", e);
        return exit_codes::for_error(&e);
    }

    let trials = session.results().to_vec();
    let report = ReplayReport {
        participant: args.participant,
        method: engine.method(),
        game_mode: session.game_mode(),
        correct: trials.iter().filter(|t| t.correct).count(),
        summary,
        trials,
        log_file: session.logger().map(|l| l.path().display().to_string()),
    };
    output::emit(&report, args.compact, args.output.as_deref())
}

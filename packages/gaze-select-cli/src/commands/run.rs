use crate::cli::RunArgs;
use crate::commands::{prepare, Prepared};
use crate::exit_codes;
use crate::session::StudySession;
use crate::session_log::SessionLogger;
use gaze_select::{IngestConfig, PupilSource, SampleMailbox, SelectionEngine};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// How long shutdown waits for the ingestion task after cancelling it
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Keyboard commands read from stdin, one per line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    NextMethod,
    NextGameMode,
    MarkUseless,
    Quit,
}

impl Control {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "m" => Some(Self::NextMethod),
            "n" => Some(Self::NextGameMode),
            "u" => Some(Self::MarkUseless),
            "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

pub async fn execute(args: RunArgs) -> i32 {
    let log_dir = args.log_dir.clone().unwrap_or_else(SessionLogger::default_dir);
    let Prepared {
        mut engine,
        mut session,
    } = match prepare(&args.participant, &args.selector, &args.protocol, Some(log_dir)) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let ingest = IngestConfig {
        host: args.host.clone(),
        request_port: args.port,
        surface_name: args.surface.clone(),
        start_recording: args.start_recording,
        ..Default::default()
    };
    eprintln!("Connecting to Pupil Capture at {}", ingest.request_endpoint());
    if let Some(logger) = session.logger() {
        eprintln!("Logging to {}", logger.path().display());
    }
    eprintln!("Commands: m = next method, n = next game mode, u = mark last task unusable, q = quit");

    let mailbox = Arc::new(SampleMailbox::new());
    let cancel = CancellationToken::new();
    let source = PupilSource::new(ingest);
    let mut ingest_task = tokio::spawn(source.run(Arc::clone(&mailbox), cancel.clone()));

    let mut interval = tokio::time::interval(Duration::from_secs_f64(engine.config().frame_budget()));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let clock = Instant::now();
    let mut ingest_finished = false;
    let mut code = exit_codes::SUCCESS;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                log::info!("Interrupted");
                break;
            }
            joined = &mut ingest_task => {
                ingest_finished = true;
                code = match joined {
                    Ok(Ok(stats)) => {
                        log::warn!("Tracker feed ended after {} message(s)", stats.messages);
                        exit_codes::SUCCESS
                    }
                    Ok(Err(e)) => {
                        eprintln!("Error: {}", e);
                        exit_codes::for_error(&e)
                    }
                    Err(e) => {
                        eprintln!("Error: ingestion task failed: {}", e);
                        exit_codes::EXECUTION_ERROR
                    }
                };
                break;
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => match Control::parse(&line) {
                        Some(Control::Quit) => break,
                        Some(control) => apply(control, &mut session, &mut engine),
                        None if line.trim().is_empty() => {}
                        None => log::warn!("Unknown command '{}'", line.trim()),
                    },
                    Ok(None) => {
                        log::debug!("stdin closed");
                        stdin_open = false;
                    }
                    Err(e) => {
                        log::warn!("Failed to read stdin: {}", e);
                        stdin_open = false;
                    }
                }
            }
            _ = interval.tick() => {
                let now = clock.elapsed().as_secs_f64();
                if args.duration.is_some_and(|limit| now >= limit) {
                    log::info!("Session duration reached");
                    break;
                }
                let out = engine.tick(now, mailbox.snapshot());
                if let Some(selection) = out.confirmed {
                    eprintln!("Selected {} with {}", selection.cell, selection.method);
                }
                if let Err(e) = session.on_tick(&mut engine, &out, now) {
                    eprintln!("Error: {}", e);
                    code = exit_codes::for_error(&e);
                    break;
                }
            }
        }
    }

    cancel.cancel();
    if !ingest_finished {
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut ingest_task).await {
            Ok(Ok(Ok(stats))) => log::info!(
                "Ingestion stopped: {} message(s), {} decode error(s)",
                stats.messages,
                stats.decode_errors
            ),
            Ok(Ok(Err(e))) => log::warn!("Ingestion stopped with error: {}", e),
            Ok(Err(e)) => log::warn!("Ingestion task failed: {}", e),
            Err(_) => {
                log::warn!("Ingestion did not stop within {:?}, aborting", SHUTDOWN_GRACE);
                ingest_task.abort();
            }
        }
    }

    let results = session.results();
    eprintln!(
        "{} selection(s), {} correct",
        results.len(),
        results.iter().filter(|r| r.correct).count()
    );
    code
}

fn apply(control: Control, session: &mut StudySession, engine: &mut SelectionEngine) {
    match control {
        Control::NextMethod => {
            session.next_method(engine);
            eprintln!("Method: {}", engine.method());
        }
        Control::NextGameMode => {
            session.next_game_mode();
            eprintln!("Game mode: {}", session.game_mode());
        }
        Control::MarkUseless => match session.mark_useless() {
            Ok(true) => eprintln!("Last task marked as unusable"),
            Ok(false) => eprintln!("No completed task to mark"),
            Err(e) => log::error!("Failed to save session log: {}", e),
        },
        Control::Quit => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_parse() {
        assert_eq!(Control::parse("m"), Some(Control::NextMethod));
        assert_eq!(Control::parse(" n \n"), Some(Control::NextGameMode));
        assert_eq!(Control::parse("u"), Some(Control::MarkUseless));
        assert_eq!(Control::parse("q"), Some(Control::Quit));
        assert_eq!(Control::parse("x"), None);
    }
}

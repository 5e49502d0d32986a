//! Study protocol driven by engine ticks
//!
//! Scores confirmations against the trial target, writes the session log and
//! rotates methods and game modes. Used by both the live loop and replay.

use crate::session_log::{EventType, SessionLogger, TaskEvent};
use gaze_select::{
    Cell, ConfirmedSelection, GameMode, GridConfig, Point, SelectError, SelectionEngine, StrategyKind,
    TickOutput, TrialLifecycle,
};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct StudyProtocol {
    pub methods: Vec<StrategyKind>,
    pub selections_per_method: u32,
    pub game_mode: GameMode,
}

impl Default for StudyProtocol {
    fn default() -> Self {
        Self {
            methods: StrategyKind::ALL.to_vec(),
            selections_per_method: 9,
            game_mode: GameMode::Chase,
        }
    }
}

/// A scored selection
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrialResult {
    pub task_index: usize,
    pub selection: ConfirmedSelection,
    pub target: Option<Cell>,
    pub correct: bool,
    pub game_mode: GameMode,
    pub task_time: f64,
    pub highlight_to_select: Option<f64>,
    pub gaze_path_length: f64,
}

pub struct StudySession {
    grid: GridConfig,
    trial: TrialLifecycle,
    logger: Option<SessionLogger>,
    protocol: StudyProtocol,
    method_index: usize,
    selection_counter: u32,
    game_mode: GameMode,
    highlighted: Option<(Cell, f64)>,
    task_started: Option<f64>,
    start_distance: Option<f64>,
    last_gaze: Option<Point>,
    results: Vec<TrialResult>,
}

impl StudySession {
    /// Start a session. The engine's current method is kept when it is part
    /// of the protocol, otherwise the first protocol method is selected.
    pub fn new(
        engine: &mut SelectionEngine,
        trial: TrialLifecycle,
        logger: Option<SessionLogger>,
        mut protocol: StudyProtocol,
    ) -> Self {
        if protocol.methods.is_empty() {
            protocol.methods.push(engine.method());
        }
        let method_index = match protocol.methods.iter().position(|m| *m == engine.method()) {
            Some(index) => index,
            None => {
                engine.set_method(protocol.methods[0]);
                0
            }
        };
        let game_mode = protocol.game_mode;

        Self {
            grid: engine.config().grid.clone(),
            trial,
            logger,
            protocol,
            method_index,
            selection_counter: 0,
            game_mode,
            highlighted: None,
            task_started: None,
            start_distance: None,
            last_gaze: None,
            results: Vec::new(),
        }
    }

    pub fn game_mode(&self) -> GameMode {
        self.game_mode
    }

    pub fn current_target(&self) -> Option<Cell> {
        self.trial.current_target(self.game_mode)
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    pub fn logger(&self) -> Option<&SessionLogger> {
        self.logger.as_ref()
    }

    /// React to one engine tick. A confirmation is consumed from the engine.
    pub fn on_tick(&mut self, engine: &mut SelectionEngine, out: &TickOutput, now: f64) -> Result<(), SelectError> {
        let task_started = *self.task_started.get_or_insert(now);
        if let Some(gaze) = out.filtered_gaze {
            self.last_gaze = Some(gaze);
        }

        if let Some(promoted) = out.promoted {
            if self.highlighted.map(|(cell, _)| cell) != Some(promoted.cell) {
                self.highlighted = Some((promoted.cell, now));
                self.log(
                    TaskEvent {
                        event_type: EventType::HighlightedCell,
                        result: None,
                        target: self.current_target(),
                        highlighted: Some(promoted.cell),
                        elapsed_task_time: None,
                        from_highlighted_to_selected: None,
                        gaze_movement: engine.gaze_path_length(),
                        method: engine.method(),
                        game_mode: self.game_mode,
                    },
                    None,
                )?;
            }
        }

        let Some(selection) = out.confirmed else {
            return Ok(());
        };
        engine.take_confirmed();

        let target = self.current_target();
        let correct = target == Some(selection.cell);
        let task_time = now - task_started;
        let highlight_to_select = self
            .highlighted
            .filter(|(cell, _)| *cell == selection.cell)
            .map(|(_, since)| now - since);
        let gaze_path_length = engine.gaze_path_length();

        let fitts = if correct { self.start_distance } else { None };
        self.log(
            TaskEvent {
                event_type: EventType::TaskCompleted,
                result: Some(selection.cell),
                target,
                highlighted: self.highlighted.map(|(cell, _)| cell),
                elapsed_task_time: Some(task_time),
                from_highlighted_to_selected: highlight_to_select,
                gaze_movement: gaze_path_length,
                method: selection.method,
                game_mode: self.game_mode,
            },
            fitts.map(|distance| (distance, task_time)),
        )?;

        self.results.push(TrialResult {
            task_index: self.trial.completed(),
            selection,
            target,
            correct,
            game_mode: self.game_mode,
            task_time,
            highlight_to_select,
            gaze_path_length,
        });
        self.trial.on_confirmed(self.game_mode, selection.cell);
        engine.reset_gaze_path();
        self.highlighted = None;
        self.task_started = Some(now);

        self.selection_counter += 1;
        if self.selection_counter >= self.protocol.selections_per_method {
            self.advance_protocol(engine);
        }

        // Distance the participant has to cover for the next target
        self.start_distance = match (self.last_gaze, self.current_target()) {
            (Some(gaze), Some(next)) => Some(gaze.distance(&self.grid.cell_center(next))),
            _ => None,
        };
        Ok(())
    }

    /// Switch to the next protocol method. After the last method the game
    /// mode advances.
    fn advance_protocol(&mut self, engine: &mut SelectionEngine) {
        self.selection_counter = 0;
        self.method_index += 1;
        if self.method_index >= self.protocol.methods.len() {
            self.method_index = 0;
            self.game_mode = self.game_mode.next();
            log::info!("All methods done, game mode is now {}", self.game_mode);
        }
        let method = self.protocol.methods[self.method_index];
        log::info!("Switching to method {}", method);
        engine.set_method(method);
    }

    /// Manual method switch
    pub fn next_method(&mut self, engine: &mut SelectionEngine) {
        self.selection_counter = 0;
        self.method_index = (self.method_index + 1) % self.protocol.methods.len();
        let method = self.protocol.methods[self.method_index];
        log::info!("Method switched to {}", method);
        engine.set_method(method);
    }

    /// Manual game mode switch
    pub fn next_game_mode(&mut self) {
        self.game_mode = self.game_mode.next();
        log::info!("Game mode switched to {}", self.game_mode);
    }

    /// Flag the last completed task as unusable
    pub fn mark_useless(&mut self) -> Result<bool, SelectError> {
        let Some(logger) = self.logger.as_mut() else {
            return Ok(false);
        };
        let marked = logger.mark_last_useless();
        if marked {
            logger.save()?;
        }
        Ok(marked)
    }

    fn log(&mut self, event: TaskEvent, fitts: Option<(f64, f64)>) -> Result<(), SelectError> {
        let Some(logger) = self.logger.as_mut() else {
            return Ok(());
        };
        logger.log_event(event);
        if let Some((distance, task_time)) = fitts {
            logger.log_fitts(distance, task_time, event.method, event.game_mode);
        }
        logger.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaze_select::SelectorConfig;

    fn engine(method: StrategyKind) -> SelectionEngine {
        SelectionEngine::new(SelectorConfig {
            method,
            ..Default::default()
        })
        .unwrap()
    }

    fn confirmation(cell: Cell, method: StrategyKind, now: f64) -> TickOutput {
        TickOutput {
            confirmed: Some(ConfirmedSelection {
                cell,
                method,
                timestamp: now,
            }),
            ..Default::default()
        }
    }

    fn session(engine: &mut SelectionEngine, protocol: StudyProtocol) -> StudySession {
        let trial = TrialLifecycle::with_seed(&engine.config().grid, 3);
        StudySession::new(engine, trial, None, protocol)
    }

    #[test]
    fn test_unknown_engine_method_falls_back_to_first() {
        let mut engine = engine(StrategyKind::HeadTurn);
        let protocol = StudyProtocol {
            methods: vec![StrategyKind::Blink, StrategyKind::HotCorner],
            ..Default::default()
        };
        session(&mut engine, protocol);
        assert_eq!(engine.method(), StrategyKind::Blink);
    }

    #[test]
    fn test_scores_against_current_target() {
        let mut engine = engine(StrategyKind::Blink);
        let mut session = session(&mut engine, StudyProtocol::default());

        let target = session.current_target().unwrap();
        session
            .on_tick(&mut engine, &confirmation(target, StrategyKind::Blink, 2.0), 2.0)
            .unwrap();
        let wrong = Cell::new(target.row, target.col + 100);
        session
            .on_tick(&mut engine, &confirmation(wrong, StrategyKind::Blink, 3.0), 3.0)
            .unwrap();

        let results = session.results();
        assert_eq!(results.len(), 2);
        assert!(results[0].correct);
        assert_eq!(results[0].task_time, 0.0);
        assert!(!results[1].correct);
        assert_eq!(results[1].task_time, 1.0);
    }

    #[test]
    fn test_method_rotation_and_game_mode_advance() {
        let mut engine = engine(StrategyKind::HotCorner);
        let protocol = StudyProtocol {
            methods: vec![StrategyKind::HotCorner, StrategyKind::Blink],
            selections_per_method: 2,
            game_mode: GameMode::Chase,
        };
        let mut session = session(&mut engine, protocol);

        let mut now = 0.0;
        let mut confirm = |session: &mut StudySession, engine: &mut SelectionEngine| {
            now += 1.0;
            let method = engine.method();
            session
                .on_tick(engine, &confirmation(Cell::new(2, 4), method, now), now)
                .unwrap();
        };

        confirm(&mut session, &mut engine);
        assert_eq!(engine.method(), StrategyKind::HotCorner);
        confirm(&mut session, &mut engine);
        assert_eq!(engine.method(), StrategyKind::Blink);
        assert_eq!(session.game_mode(), GameMode::Chase);

        confirm(&mut session, &mut engine);
        confirm(&mut session, &mut engine);
        assert_eq!(engine.method(), StrategyKind::HotCorner);
        assert_eq!(session.game_mode(), GameMode::Memory);
        assert_eq!(session.results().len(), 4);
    }

    #[test]
    fn test_manual_switches() {
        let mut engine = engine(StrategyKind::HotCorner);
        let mut session = session(&mut engine, StudyProtocol::default());
        session.next_method(&mut engine);
        assert_eq!(engine.method(), StrategyKind::Blink);
        session.next_game_mode();
        assert_eq!(session.game_mode(), GameMode::Memory);
        assert!(!session.mark_useless().unwrap());
    }

    #[test]
    fn test_logs_highlight_once_per_cell() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut engine = engine(StrategyKind::Blink);
        let trial = TrialLifecycle::with_seed(&engine.config().grid, 3);
        let logger = SessionLogger::create(dir.path(), "p03").unwrap();
        let mut session = StudySession::new(&mut engine, trial, Some(logger), StudyProtocol::default());

        let promoted = TickOutput {
            promoted: Some(gaze_select::CandidateCell {
                cell: Cell::new(2, 4),
                since: 0.5,
            }),
            ..Default::default()
        };
        session.on_tick(&mut engine, &promoted, 0.5).unwrap();
        session.on_tick(&mut engine, &promoted, 0.6).unwrap();
        session
            .on_tick(&mut engine, &confirmation(Cell::new(2, 4), StrategyKind::Blink, 0.9), 0.9)
            .unwrap();

        let logger = session.logger().unwrap();
        let events = logger.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::HighlightedCell);
        assert_eq!(events[1].event_type, EventType::TaskCompleted);
        let latency = events[1].from_highlighted_to_selected.unwrap();
        assert!((latency - 0.4).abs() < 1e-9);
        assert!(logger.path().exists());
        assert!(session.mark_useless().unwrap());
    }
}

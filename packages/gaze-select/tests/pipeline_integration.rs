use gaze_select::replay::replay;
use gaze_select::{
    BlinkKind, Cell, FilterKind, GameMode, ReplayRecord, SampleMailbox, SelectionEngine, SelectorConfig,
    StrategyKind, TrialLifecycle,
};
use std::sync::Arc;

const CELL_2_4: (f64, f64) = (0.45, 0.5);
const CELL_1_3: (f64, f64) = (0.35, 0.7);
const HOT_CORNER: (f64, f64) = (0.75, 0.8);

/// Gaze records at 120 Hz on one spot for `[from, to)`
fn gaze_run((x, y): (f64, f64), from: f64, to: f64) -> Vec<ReplayRecord> {
    let mut records = Vec::new();
    let mut i = 0;
    loop {
        let timestamp = from + i as f64 / 120.0;
        if timestamp >= to {
            break;
        }
        records.push(ReplayRecord::Gaze {
            x,
            y,
            timestamp,
            confidence: 0.95,
        });
        i += 1;
    }
    records
}

fn engine_for(method: StrategyKind) -> SelectionEngine {
    let config = SelectorConfig {
        method,
        ..Default::default()
    };
    SelectionEngine::new(config).expect("default config is valid")
}

#[test]
fn test_hot_corner_replay_selects_dwelled_cell() {
    let mut records = gaze_run(CELL_2_4, 0.0, 0.5);
    records.extend(gaze_run(HOT_CORNER, 0.5, 0.6));

    let mut engine = engine_for(StrategyKind::HotCorner);
    let summary = replay(&mut engine, records, |_, _, _| {});

    assert_eq!(summary.selections.len(), 1);
    assert_eq!(summary.selections[0].cell, Cell::new(2, 4));
    assert!(summary.selections[0].timestamp >= 0.5);
}

#[test]
fn test_hot_corner_glance_after_timeout_does_nothing() {
    let mut records = gaze_run(CELL_2_4, 0.0, 2.0);
    records.extend(gaze_run(HOT_CORNER, 2.0, 2.1));

    let mut engine = engine_for(StrategyKind::HotCorner);
    let summary = replay(&mut engine, records, |_, _, _| {});
    assert!(summary.selections.is_empty());
}

#[test]
fn test_hot_corner_without_dwell_does_nothing() {
    let mut records = gaze_run(CELL_2_4, 0.0, 0.1);
    records.extend(gaze_run(HOT_CORNER, 0.1, 0.4));

    let mut engine = engine_for(StrategyKind::HotCorner);
    let summary = replay(&mut engine, records, |_, _, _| {});
    assert!(summary.selections.is_empty());
    assert_eq!(summary.candidates, 0);
}

#[test]
fn test_blink_selection_with_every_filter() {
    for kind in FilterKind::ALL {
        let mut config = SelectorConfig {
            method: StrategyKind::Blink,
            ..Default::default()
        };
        config.filter.kind = kind;
        let mut engine = SelectionEngine::new(config).unwrap();

        let mut records = gaze_run(CELL_1_3, 0.0, 1.0);
        records.push(ReplayRecord::Blink {
            kind: BlinkKind::Onset,
            timestamp: 0.4,
        });
        records.push(ReplayRecord::Blink {
            kind: BlinkKind::Offset,
            timestamp: 0.9,
        });

        let summary = replay(&mut engine, records, |_, _, _| {});
        assert_eq!(summary.selections.len(), 1, "filter {}", kind);
        assert_eq!(summary.selections[0].cell, Cell::new(1, 3), "filter {}", kind);
    }
}

#[test]
fn test_short_blink_ignored_when_long_is_required() {
    let mut records = gaze_run(CELL_1_3, 0.0, 1.0);
    records.push(ReplayRecord::Blink {
        kind: BlinkKind::Onset,
        timestamp: 0.4,
    });
    records.push(ReplayRecord::Blink {
        kind: BlinkKind::Offset,
        timestamp: 0.5,
    });

    let mut engine = engine_for(StrategyKind::Blink);
    let summary = replay(&mut engine, records, |_, _, _| {});
    assert!(summary.selections.is_empty());
}

#[test]
fn test_head_turn_replay() {
    let mut records = gaze_run(CELL_2_4, 0.0, 1.0);
    records.extend((0..100).map(|i| ReplayRecord::Head {
        x: 0.3 + i as f64 * 0.002,
        y: 0.5,
        timestamp: i as f64 / 100.0,
    }));

    let mut engine = engine_for(StrategyKind::HeadTurn);
    let summary = replay(&mut engine, records, |_, _, _| {});

    assert!(!summary.selections.is_empty());
    let first = summary.selections[0];
    assert_eq!(first.cell, Cell::new(2, 4));
    assert_eq!(first.method, StrategyKind::HeadTurn);
    assert!(first.timestamp >= 0.4, "head turn dwell is 0.4 s, got {}", first.timestamp);
}

#[test]
fn test_chase_trial_scores_replayed_selections() {
    let grid = SelectorConfig::default().grid;
    let mut trial = TrialLifecycle::with_seed(&grid, 42);
    let target = trial.current_target(GameMode::Chase).unwrap();

    // Look at the target cell's centre, then glance at the corner
    let centre = grid.cell_center(target);
    let normalised = (
        centre.x / grid.screen_width as f64,
        1.0 - centre.y / grid.screen_height as f64,
    );
    let mut records = gaze_run(normalised, 0.0, 0.5);
    records.extend(gaze_run(HOT_CORNER, 0.5, 0.6));

    let mut engine = engine_for(StrategyKind::HotCorner);
    let mut results = Vec::new();
    replay(&mut engine, records, |_, out, _| {
        if let Some(selection) = out.confirmed {
            results.push(trial.on_confirmed(GameMode::Chase, selection.cell));
        }
    });

    assert_eq!(results, vec![true]);
    assert_eq!(trial.completed(), 1);
}

#[test]
fn test_mailbox_feeds_engine_across_threads() {
    let mailbox = Arc::new(SampleMailbox::new());
    let writer = Arc::clone(&mailbox);
    std::thread::spawn(move || {
        for i in 0..10 {
            writer.post_gaze(gaze_select::Sample::new(CELL_2_4.0, CELL_2_4.1, i as f64 / 120.0));
        }
    })
    .join()
    .unwrap();

    let mut engine = engine_for(StrategyKind::Blink);
    let out = engine.tick(0.1, mailbox.snapshot());
    assert!(out.filtered_gaze.is_some());
    assert_eq!(mailbox.stats()[0], (10, 9));

    // Nothing new on the next tick
    let out = engine.tick(0.1 + 1.0 / 60.0, mailbox.snapshot());
    assert!(out.filtered_gaze.is_none());
}

use lanesync::app::{tick_budget, Driver, LogSink, Session};
use lanesync::game::autoplay::Autoplay;
use lanesync::game::chart::ChartError;
use lanesync::{Chart, EngineConfig, Lane};
use std::fs;
use std::path::PathBuf;

#[test]
fn converted_chart_file_plays_through() {
    let dir = tempfile::tempdir().expect("scratch dir");
    let path = dir.path().join("game_notes.json");
    fs::write(
        &path,
        r#"[
            {"position": 0, "appearance_time": 0, "speed": 5.0},
            {"position": 1, "appearance_time": 120, "speed": 4.0},
            {"position": 2, "appearance_time": 240, "speed": 6.0},
            {"position": 3, "appearance_time": 360, "speed": 5.5}
        ]"#,
    )
    .expect("write chart");

    let chart = Chart::load_json(&path).expect("load chart");
    assert_eq!(chart.notes_in_lane(Lane::K), 1);

    let config = EngineConfig::default();
    let budget = tick_budget(&chart, &config);
    let mut session = Session::new(chart, config, Driver::Autoplay(Autoplay::perfect()), LogSink::default());
    let summary = session.run(budget);
    assert!(summary.finished);
    assert_eq!(summary.score.judged(), 4);
    assert_eq!(summary.score.misses, 0);
    assert!(summary.full_combo);

    let json = serde_json::to_value(&summary).expect("summary serializes");
    assert_eq!(json["notes"], 4);
    assert_eq!(json["score"]["combo"], 4);
}

#[test]
fn missing_chart_file_is_an_io_error() {
    let err = Chart::load_json(&PathBuf::from("no/such/chart.json")).unwrap_err();
    assert!(matches!(err, ChartError::Io(_)));
}

#[test]
fn config_file_changes_the_windows() {
    let dir = tempfile::tempdir().expect("scratch dir");
    let path = dir.path().join("engine.ini");
    fs::write(&path, "[judgment]\nWindowSize = 10\nPerfectRatio = 0.1\n").expect("write config");
    let config = EngineConfig::load_or_default(&path);
    assert_eq!(config.window_size, 10.0);

    // At speed 3 the note steps from 499 to 502, so the bot presses 2 units
    // past the line: Perfect under the defaults, only Great with a 10-unit window.
    let chart = Chart::metronome(1, 0.0, Lane::F, 3.0).expect("valid");
    let budget = tick_budget(&chart, &config);
    let mut session = Session::new(chart, config, Driver::Autoplay(Autoplay::new(1, 0.0, 0.0)), LogSink::default());
    let summary = session.run(budget);
    assert_eq!(summary.score.perfects, 0);
    assert_eq!(summary.score.greats, 1);
}

#[test]
fn tick_limit_stops_early() {
    let chart = Chart::builtin();
    let mut session = Session::new(chart, EngineConfig::default(), Driver::Idle, LogSink::default());
    let summary = session.run(10);
    assert!(!summary.finished);
    assert_eq!(summary.ticks, 10);
    assert_eq!(session.sink().frames, 10);
}

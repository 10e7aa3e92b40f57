use crate::config::{EngineConfig, STATUS_LOG_INTERVAL_MS};
use crate::core::clock::{Clock, PlaybackSource};
use crate::core::input::{InputEdge, Lane};
use crate::error::EngineError;
use crate::game::chart::Chart;
use crate::game::judgment::{JudgmentOutcome, JudgmentWindows, ScoreValues};
use crate::game::lane::{ActiveNote, LaneState};
use crate::game::scores::ScoreState;
use log::{debug, info, warn};
use std::collections::VecDeque;

/// Sent to the presentation layer whenever a press consumes a note.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HitFeedbackEvent {
    pub lane: Lane,
    pub outcome: JudgmentOutcome,
    /// The note's track position at the moment it was judged.
    pub position: f64,
    pub note_index: usize,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PressResult {
    Judged(HitFeedbackEvent),
    /// The head note is outside every window; nothing was consumed.
    Inert,
}

impl PressResult {
    pub fn outcome(&self) -> JudgmentOutcome {
        match self {
            PressResult::Judged(event) => event.outcome,
            PressResult::Inert => JudgmentOutcome::NoHit,
        }
    }
}

/// Terminal state of a chart note.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoteFate {
    Judged(JudgmentOutcome),
    Expired,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoteState {
    Pending,
    InFlight,
    Judged(JudgmentOutcome),
    Expired,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NoteView {
    pub lane: Lane,
    pub vertical_offset: f64,
    pub note_index: usize,
}

/// Everything the presentation layer needs for one tick.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub notes: Vec<NoteView>,
    pub feedback: Vec<HitFeedbackEvent>,
    pub score: ScoreState,
    pub music_time_ms: f64,
}

#[derive(Clone, Debug, Default)]
pub struct TickReport {
    pub presses: Vec<(Lane, Result<PressResult, EngineError>)>,
    pub spawned: usize,
    pub expired: usize,
}

pub struct TimingEngine {
    chart: Chart,
    windows: JudgmentWindows,
    score_values: ScoreValues,
    spawn_offset: f64,
    judgment_line_offset: f64,
    tick_interval_ms: f64,

    spawn_cursor: usize,
    lanes: LaneState,
    score: ScoreState,
    fates: Vec<Option<NoteFate>>,
    pending_edges: VecDeque<InputEdge>,
    feedback: Vec<HitFeedbackEvent>,

    current_time_ms: f64,
    ticks: u64,
    next_status_log_ms: f64,
}

impl TimingEngine {
    pub fn new(chart: Chart, config: EngineConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("Engine config failed validation ({}); replacing bad values with defaults.", e);
                config.sanitized()
            }
        };
        if chart.is_empty() {
            info!("Chart has no notes; the engine will never spawn.");
        } else {
            info!(
                "Timing engine ready: {} notes, window {} (perfect ratio {}), line at {}.",
                chart.len(),
                config.window_size,
                config.perfect_ratio,
                config.judgment_line_offset
            );
        }
        let fates = vec![None; chart.len()];
        Self {
            chart,
            windows: JudgmentWindows::from_config(&config),
            score_values: ScoreValues::from_config(&config),
            spawn_offset: config.spawn_offset,
            judgment_line_offset: config.judgment_line_offset,
            tick_interval_ms: config.tick_interval_ms,
            spawn_cursor: 0,
            lanes: LaneState::new(),
            score: ScoreState::new(),
            fates,
            pending_edges: VecDeque::new(),
            feedback: Vec::new(),
            current_time_ms: 0.0,
            ticks: 0,
            next_status_log_ms: STATUS_LOG_INTERVAL_MS,
        }
    }

    /// Spawns every chart note whose appearance time has been reached,
    /// resuming from where the previous call stopped. Returns how many spawned.
    pub fn advance_spawns(&mut self, current_time_ms: f64) -> usize {
        if !current_time_ms.is_finite() {
            return 0;
        }
        let start = self.spawn_cursor;
        while let Some(event) = self.chart.get(self.spawn_cursor) {
            if event.appearance_time_ms > current_time_ms {
                break;
            }
            self.lanes.push(ActiveNote {
                lane: event.lane,
                vertical_offset: self.spawn_offset,
                speed: event.speed,
                note_index: self.spawn_cursor,
            });
            self.spawn_cursor += 1;
        }
        self.spawn_cursor - start
    }

    /// Integrates every in-flight note by `delta_ms` and expires anything
    /// that fell past the miss window. Expiry is scored exactly like a
    /// pressed Miss but emits no feedback event. Returns how many expired.
    pub fn advance_positions(&mut self, delta_ms: f64) -> usize {
        if !delta_ms.is_finite() || delta_ms <= 0.0 {
            return 0;
        }
        let ticks = delta_ms / self.tick_interval_ms;
        let expiry_offset = self.judgment_line_offset + self.windows.expiry_distance();
        let expired = self.lanes.advance(ticks, expiry_offset);
        for note in &expired {
            self.score
                .record_expiry(self.score_values.miss, self.score_values.perfect);
            self.settle(note.note_index, NoteFate::Expired);
            debug!(
                "EXPIRED: note {}, lane {}, offset {:.2}",
                note.note_index, note.lane, note.vertical_offset
            );
        }
        expired.len()
    }

    /// Judges the head of `lane` against its current position. On a chart
    /// with no notes every press reports `EmptyChart`.
    pub fn on_key_press(&mut self, lane: Lane) -> Result<PressResult, EngineError> {
        if self.chart.is_empty() {
            return Err(EngineError::EmptyChart);
        }
        let Some(head) = self.lanes.head(lane) else {
            debug!("Press on lane {} with no active note.", lane);
            return Err(EngineError::NoActiveNote);
        };
        let position = head.vertical_offset;
        let outcome = self.windows.classify(head.distance_from(self.judgment_line_offset));
        if !outcome.consumes_note() {
            return Ok(PressResult::Inert);
        }

        let Some(note) = self.lanes.pop_head(lane) else {
            return Err(EngineError::NoActiveNote);
        };
        self.score.record(
            outcome,
            self.score_values.points_for(outcome),
            self.score_values.perfect,
        );
        self.settle(note.note_index, NoteFate::Judged(outcome));

        let event = HitFeedbackEvent {
            lane,
            outcome,
            position,
            note_index: note.note_index,
        };
        self.feedback.push(event);
        debug!(
            "JUDGED: note {}, lane {}, offset {:.2}, {:?}, combo {}",
            note.note_index,
            lane,
            position - self.judgment_line_offset,
            outcome,
            self.score.combo
        );
        Ok(PressResult::Judged(event))
    }

    pub fn on_key_press_index(&mut self, lane: usize) -> Result<PressResult, EngineError> {
        let lane = Lane::from_index(lane)?;
        self.on_key_press(lane)
    }

    /// Queues a press to be applied at the start of the next tick.
    pub fn queue_press(&mut self, lane: Lane) {
        self.pending_edges.push_back(InputEdge { lane, pressed: true });
    }

    pub fn queue_press_index(&mut self, lane: usize) -> Result<(), EngineError> {
        self.queue_press(Lane::from_index(lane)?);
        Ok(())
    }

    pub fn queue_edge(&mut self, edge: InputEdge) {
        self.pending_edges.push_back(edge);
    }

    /// One simulation step. Queued presses are applied first, against the
    /// positions left by the previous tick; then spawns; then motion.
    pub fn tick(&mut self, current_time_ms: f64, delta_ms: f64) -> TickReport {
        let mut report = TickReport::default();

        while let Some(edge) = self.pending_edges.pop_front() {
            if edge.pressed {
                report.presses.push((edge.lane, self.on_key_press(edge.lane)));
            }
        }

        self.current_time_ms = self.current_time_ms.max(current_time_ms);
        report.spawned = self.advance_spawns(self.current_time_ms);
        report.expired = self.advance_positions(delta_ms);
        self.ticks += 1;

        if self.current_time_ms >= self.next_status_log_ms {
            info!(
                "Time: {:.0}ms, Score: {}, Combo: {}, Misses: {}, Active Notes: {}",
                self.current_time_ms,
                self.score.total_score,
                self.score.combo,
                self.score.misses,
                self.lanes.len()
            );
            while self.next_status_log_ms <= self.current_time_ms {
                self.next_status_log_ms += STATUS_LOG_INTERVAL_MS;
            }
        }

        report
    }

    pub fn tick_with<S: PlaybackSource>(&mut self, clock: &mut Clock<S>) -> TickReport {
        let now = clock.current_time_ms();
        self.tick(now, clock.tick_interval_ms())
    }

    pub fn drain_feedback(&mut self) -> Vec<HitFeedbackEvent> {
        std::mem::take(&mut self.feedback)
    }

    /// Snapshot for rendering. Hands over any feedback queued since the last frame.
    pub fn take_frame(&mut self) -> Frame {
        Frame {
            notes: self.active_notes().collect(),
            feedback: self.drain_feedback(),
            score: self.score,
            music_time_ms: self.current_time_ms,
        }
    }

    pub fn active_notes(&self) -> impl Iterator<Item = NoteView> + '_ {
        self.lanes.iter().map(|n| NoteView {
            lane: n.lane,
            vertical_offset: n.vertical_offset,
            note_index: n.note_index,
        })
    }

    pub fn head(&self, lane: Lane) -> Option<&ActiveNote> {
        self.lanes.head(lane)
    }

    pub fn lanes(&self) -> &LaneState {
        &self.lanes
    }

    pub fn score(&self) -> ScoreState {
        self.score
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn judgment_line_offset(&self) -> f64 {
        self.judgment_line_offset
    }

    pub fn windows(&self) -> JudgmentWindows {
        self.windows
    }

    pub fn current_time_ms(&self) -> f64 {
        self.current_time_ms
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn spawned_count(&self) -> usize {
        self.spawn_cursor
    }

    pub fn note_state(&self, note_index: usize) -> Option<NoteState> {
        let fate = self.fates.get(note_index)?;
        Some(match fate {
            Some(NoteFate::Judged(outcome)) => NoteState::Judged(*outcome),
            Some(NoteFate::Expired) => NoteState::Expired,
            None if note_index < self.spawn_cursor => NoteState::InFlight,
            None => NoteState::Pending,
        })
    }

    pub fn fates(&self) -> &[Option<NoteFate>] {
        &self.fates
    }

    /// Every chart note has spawned and left the field.
    pub fn is_finished(&self) -> bool {
        self.spawn_cursor >= self.chart.len() && self.lanes.is_empty()
    }

    fn settle(&mut self, note_index: usize, fate: NoteFate) {
        if let Some(slot) = self.fates.get_mut(note_index) {
            debug_assert!(slot.is_none(), "note {} reached a second terminal state", note_index);
            *slot = Some(fate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::chart::NoteEvent;

    fn single_note_engine(lane: Lane, speed: f64) -> TimingEngine {
        let chart = Chart::new(vec![NoteEvent {
            lane,
            appearance_time_ms: 0.0,
            speed,
        }])
        .expect("valid chart");
        TimingEngine::new(chart, EngineConfig::default())
    }

    fn step(engine: &mut TimingEngine, n: usize) {
        let interval = EngineConfig::default().tick_interval_ms;
        for _ in 0..n {
            let now = engine.current_time_ms() + interval;
            engine.tick(now, interval);
        }
    }

    #[test]
    fn spawns_are_idempotent_for_the_same_time() {
        let chart = Chart::metronome(5, 100.0, Lane::F, 1.0).expect("valid");
        let mut engine = TimingEngine::new(chart, EngineConfig::default());
        assert_eq!(engine.advance_spawns(250.0), 3);
        assert_eq!(engine.advance_spawns(250.0), 0);
        assert_eq!(engine.lanes().len(), 3);
        assert_eq!(engine.advance_spawns(400.0), 2);
        assert_eq!(engine.advance_spawns(10_000.0), 0);
        assert_eq!(engine.note_state(4), Some(NoteState::InFlight));
    }

    #[test]
    fn press_on_empty_lane_is_a_no_op() {
        let mut engine = single_note_engine(Lane::D, 5.0);
        engine.advance_spawns(0.0);
        let before = engine.score();
        assert_eq!(engine.on_key_press(Lane::K), Err(EngineError::NoActiveNote));
        assert_eq!(engine.score(), before);
        assert_eq!(engine.lanes().len(), 1);
    }

    #[test]
    fn invalid_lane_is_rejected_without_mutation() {
        let mut engine = single_note_engine(Lane::D, 5.0);
        engine.advance_spawns(0.0);
        assert_eq!(engine.on_key_press_index(7), Err(EngineError::InvalidLane(7)));
        assert_eq!(engine.queue_press_index(4), Err(EngineError::InvalidLane(4)));
        assert_eq!(engine.lanes().len(), 1);
        assert_eq!(engine.score(), ScoreState::default());
    }

    #[test]
    fn unreachable_note_makes_press_inert() {
        let mut engine = single_note_engine(Lane::J, 5.0);
        engine.advance_spawns(0.0);
        // Spawned at -50, 550 above the line: outside every window.
        assert_eq!(engine.on_key_press(Lane::J), Ok(PressResult::Inert));
        assert_eq!(engine.lanes().len(), 1);
        assert_eq!(engine.note_state(0), Some(NoteState::InFlight));
        assert!(engine.drain_feedback().is_empty());
    }

    #[test]
    fn second_press_finds_nothing() {
        let mut engine = single_note_engine(Lane::D, 5.0);
        step(&mut engine, 110);
        let first = engine.on_key_press(Lane::D).expect("note in lane");
        assert_eq!(first.outcome(), JudgmentOutcome::Perfect);
        assert_eq!(engine.on_key_press(Lane::D), Err(EngineError::NoActiveNote));
        assert_eq!(engine.score().perfects, 1);
        assert_eq!(engine.fates(), &[Some(NoteFate::Judged(JudgmentOutcome::Perfect))]);
    }

    #[test]
    fn late_press_is_a_miss_and_consumes() {
        let mut engine = single_note_engine(Lane::F, 5.0);
        step(&mut engine, 110);
        assert_eq!(engine.on_key_press(Lane::F).map(|r| r.outcome()), Ok(JudgmentOutcome::Perfect));

        let mut engine = single_note_engine(Lane::F, 5.0);
        // 110 ticks to the line, 30 more puts it 150 below.
        step(&mut engine, 140);
        let result = engine.on_key_press(Lane::F).expect("still in flight");
        assert_eq!(result.outcome(), JudgmentOutcome::Miss);
        assert!(engine.lanes().is_empty());
        assert_eq!(engine.score().combo, 0);
        let feedback = engine.drain_feedback();
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].position, 650.0);
    }

    #[test]
    fn expiry_happens_once_past_the_boundary() {
        let mut engine = single_note_engine(Lane::K, 5.0);
        // Exactly on the boundary (700) after 150 ticks: still present.
        step(&mut engine, 150);
        assert_eq!(engine.lanes().len(), 1);
        step(&mut engine, 1);
        assert!(engine.lanes().is_empty());
        assert_eq!(engine.score().misses, 1);
        assert_eq!(engine.score().expired, 1);
        assert_eq!(engine.note_state(0), Some(NoteState::Expired));
        assert!(engine.is_finished());
        step(&mut engine, 10);
        assert_eq!(engine.score().misses, 1);
    }

    #[test]
    fn queued_press_judges_previous_tick_position() {
        let mut engine = single_note_engine(Lane::D, 5.0);
        step(&mut engine, 110);
        assert_eq!(engine.head(Lane::D).map(|n| n.vertical_offset), Some(500.0));
        engine.queue_press(Lane::D);
        let interval = EngineConfig::default().tick_interval_ms;
        let report = engine.tick(engine.current_time_ms() + interval, interval);
        assert_eq!(report.presses.len(), 1);
        assert_eq!(report.presses[0].1.map(|r| r.outcome()), Ok(JudgmentOutcome::Perfect));
        let score = engine.score();
        assert_eq!((score.total_score, score.combo), (10, 1));
    }

    #[test]
    fn frame_hands_over_feedback_once() {
        let mut engine = single_note_engine(Lane::D, 5.0);
        step(&mut engine, 110);
        engine.on_key_press(Lane::D).expect("judged");
        let frame = engine.take_frame();
        assert_eq!(frame.feedback.len(), 1);
        assert!(frame.notes.is_empty());
        assert_eq!(frame.score.total_score, 10);
        assert!(engine.take_frame().feedback.is_empty());
    }

    #[test]
    fn empty_chart_never_spawns() {
        let mut engine = TimingEngine::new(Chart::default(), EngineConfig::default());
        assert!(engine.is_finished());
        let report = engine.tick(1_000_000.0, 8.0);
        assert_eq!(report.spawned, 0);
        assert_eq!(engine.on_key_press(Lane::D), Err(EngineError::EmptyChart));
        assert_eq!(engine.score(), ScoreState::default());
    }

    #[test]
    fn queued_press_is_judged_before_the_tick_moves_notes() {
        let mut engine = single_note_engine(Lane::D, 5.0);
        // 40 above the line: the edge of Perfect. One more step would make it Great.
        step(&mut engine, 118);
        assert_eq!(engine.head(Lane::D).map(|n| n.vertical_offset), Some(540.0));
        engine.queue_press(Lane::D);
        let interval = EngineConfig::default().tick_interval_ms;
        let report = engine.tick(engine.current_time_ms() + interval, interval);
        assert_eq!(report.presses[0].1.map(|r| r.outcome()), Ok(JudgmentOutcome::Perfect));
        assert_eq!(engine.score().total_score, 10);
    }

    #[test]
    fn non_finite_spawn_time_spawns_nothing() {
        let mut engine = TimingEngine::new(Chart::builtin(), EngineConfig::default());
        assert_eq!(engine.advance_spawns(f64::NAN), 0);
        assert_eq!(engine.advance_spawns(f64::INFINITY), 0);
        assert_eq!(engine.lanes().len(), 0);
        assert_eq!(engine.advance_spawns(0.0), 1);
    }

    #[test]
    fn zero_tick_interval_falls_back_to_the_default() {
        let config = EngineConfig {
            tick_interval_ms: 0.0,
            ..EngineConfig::default()
        };
        let chart = Chart::new(vec![NoteEvent {
            lane: Lane::J,
            appearance_time_ms: 0.0,
            speed: 5.0,
        }])
        .expect("valid chart");
        let mut engine = TimingEngine::new(chart, config);
        let interval = EngineConfig::default().tick_interval_ms;
        let report = engine.tick(0.0, interval);
        assert_eq!((report.spawned, report.expired), (1, 0));
        assert_eq!(engine.head(Lane::J).map(|n| n.vertical_offset), Some(-45.0));
        assert_eq!(engine.score().misses, 0);
    }

    #[test]
    fn nan_window_falls_back_to_the_default() {
        let config = EngineConfig {
            window_size: f64::NAN,
            ..EngineConfig::default()
        };
        let chart = Chart::new(vec![NoteEvent {
            lane: Lane::F,
            appearance_time_ms: 0.0,
            speed: 5.0,
        }])
        .expect("valid chart");
        let mut engine = TimingEngine::new(chart, config);
        assert_eq!(engine.windows(), JudgmentWindows::from_config(&EngineConfig::default()));
        step(&mut engine, 110);
        assert_eq!(engine.on_key_press(Lane::F).map(|r| r.outcome()), Ok(JudgmentOutcome::Perfect));

        let mut idle = TimingEngine::new(Chart::metronome(1, 0.0, Lane::F, 5.0).expect("valid"), config);
        step(&mut idle, 1000);
        assert!(idle.is_finished());
        assert_eq!(idle.score().expired, 1);
    }
}

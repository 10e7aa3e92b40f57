use crate::config::EngineConfig;
use crate::core::clock::{Clock, SteppedSource};
use crate::core::input::{Lane, PressDebouncer};
use crate::game::autoplay::Autoplay;
use crate::game::chart::Chart;
use crate::game::gameplay::{Frame, TimingEngine};
use crate::game::scores::{ComboTier, ScoreState};
use log::{debug, info};
use serde::Serialize;
use winit::event::KeyEvent;
use winit::keyboard::KeyCode;

/// Receives one frame per tick. Read-only: engine state can't be reached from here.
pub trait PresentationSink {
    fn present(&mut self, frame: &Frame);
}

/// Logs feedback events; stands in for a renderer when running headless.
#[derive(Debug, Default)]
pub struct LogSink {
    last_tier: Option<ComboTier>,
    pub frames: u64,
}

impl PresentationSink for LogSink {
    fn present(&mut self, frame: &Frame) {
        self.frames += 1;
        for event in &frame.feedback {
            debug!(
                "{} on {} at {:.1} (combo {})",
                event.outcome, event.lane, event.position, frame.score.combo
            );
        }
        let tier = frame.score.combo_tier();
        if self.last_tier.is_some_and(|t| t != tier) {
            debug!("Combo tier now {:?} at combo {}.", tier, frame.score.combo);
        }
        self.last_tier = Some(tier);
    }
}

/// Keeps every frame. Handy for tests and replays.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub frames: Vec<Frame>,
}

impl PresentationSink for RecordingSink {
    fn present(&mut self, frame: &Frame) {
        self.frames.push(frame.clone());
    }
}

/// Time-ordered presses, each fed in on the first tick at or after its time.
#[derive(Debug, Clone, Default)]
pub struct InputScript {
    presses: Vec<(f64, Lane)>,
    cursor: usize,
}

impl InputScript {
    pub fn new(mut presses: Vec<(f64, Lane)>) -> Self {
        presses.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { presses, cursor: 0 }
    }

    fn due(&mut self, now_ms: f64) -> Vec<Lane> {
        let mut lanes = Vec::new();
        while let Some(&(at, lane)) = self.presses.get(self.cursor) {
            if at > now_ms {
                break;
            }
            lanes.push(lane);
            self.cursor += 1;
        }
        lanes
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.presses.len()
    }
}

pub enum Driver {
    Idle,
    Autoplay(Autoplay),
    Script(InputScript),
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub notes: usize,
    pub ticks: u64,
    pub music_time_ms: f64,
    pub score: ScoreState,
    pub accuracy: f64,
    pub full_combo: bool,
    pub finished: bool,
}

/// The external fixed-step loop: advances the playback position one tick at
/// a time, feeds input, ticks the engine and presents the result.
pub struct Session<P: PresentationSink> {
    engine: TimingEngine,
    playback: SteppedSource,
    clock: Clock<SteppedSource>,
    driver: Driver,
    debouncer: PressDebouncer,
    sink: P,
}

impl<P: PresentationSink> Session<P> {
    pub fn new(chart: Chart, config: EngineConfig, driver: Driver, sink: P) -> Self {
        let playback = SteppedSource::new();
        let clock = Clock::new(playback.clone(), config.tick_interval_ms);
        Self {
            engine: TimingEngine::new(chart, config),
            playback,
            clock,
            driver,
            debouncer: PressDebouncer::new(),
            sink,
        }
    }

    /// Feeds a keyboard edge in. Fresh presses are queued for the next tick;
    /// auto-repeat and presses on an already-held lane are dropped.
    pub fn key_input(&mut self, code: KeyCode, pressed: bool, repeat: bool) -> bool {
        match self.debouncer.key(code, pressed, repeat) {
            Some(edge) => {
                self.engine.queue_edge(edge);
                true
            }
            None => false,
        }
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent) -> bool {
        match self.debouncer.handle_key_event(event) {
            Some(edge) => {
                self.engine.queue_edge(edge);
                true
            }
            None => false,
        }
    }

    /// Runs one tick. The clock reads the position left by the previous step.
    pub fn step(&mut self) {
        let now = self.clock.current_time_ms();
        let lanes = match &mut self.driver {
            Driver::Idle => Vec::new(),
            Driver::Autoplay(bot) => bot.decide(&self.engine),
            Driver::Script(script) => script.due(now),
        };
        for lane in lanes {
            self.engine.queue_press(lane);
        }

        self.engine.tick_with(&mut self.clock);
        let frame = self.engine.take_frame();
        self.sink.present(&frame);
        self.playback.advance(self.clock.tick_interval_ms());
    }

    /// Plays until the chart is done or `max_ticks` have run.
    pub fn run(&mut self, max_ticks: u64) -> SessionSummary {
        info!("Starting playback ({} notes).", self.engine.chart().len());
        self.playback.start();
        let mut ran = 0;
        while ran < max_ticks && !self.engine.is_finished() {
            self.step();
            ran += 1;
        }
        if self.engine.is_finished() {
            info!("Chart finished after {} ticks.", self.engine.ticks());
        } else {
            info!("Stopped after {} ticks with notes remaining.", ran);
        }
        self.summary()
    }

    pub fn summary(&self) -> SessionSummary {
        let score = self.engine.score();
        SessionSummary {
            notes: self.engine.chart().len(),
            ticks: self.engine.ticks(),
            music_time_ms: self.engine.current_time_ms(),
            score,
            accuracy: score.accuracy(),
            full_combo: score.is_full_combo(),
            finished: self.engine.is_finished(),
        }
    }

    pub fn engine(&self) -> &TimingEngine {
        &self.engine
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    pub fn into_sink(self) -> P {
        self.sink
    }
}

/// Upper bound on ticks for a chart: last spawn plus the time the slowest
/// note needs to fall past the miss window, with a little slack.
pub fn tick_budget(chart: &Chart, config: &EngineConfig) -> u64 {
    let Some(last_ms) = chart.last_appearance_ms() else { return 1; };
    let slowest = chart
        .notes()
        .iter()
        .map(|n| n.speed)
        .fold(f64::INFINITY, f64::min);
    let travel = config.judgment_line_offset + 2.0 * config.window_size - config.spawn_offset;
    let fall_ticks = (travel / slowest).ceil();
    let spawn_ticks = (last_ms / config.tick_interval_ms).ceil();
    (spawn_ticks + fall_ticks) as u64 + 2 * crate::config::TICKS_PER_SECOND as u64
}

use std::cell::Cell;
use std::rc::Rc;

/// Where the engine's notion of "now" comes from: the music track's
/// playback position, not the wall clock.
pub trait PlaybackSource {
    /// Current playback position in milliseconds, or `None` when the track
    /// can't report one yet (e.g. playback hasn't started).
    fn position_ms(&self) -> Option<f64>;
}

impl<F> PlaybackSource for F
where
    F: Fn() -> Option<f64>,
{
    fn position_ms(&self) -> Option<f64> {
        self()
    }
}

/// Wraps a playback source together with the fixed simulation step.
#[derive(Debug)]
pub struct Clock<S> {
    source: S,
    tick_interval_ms: f64,
    last_read_ms: f64,
}

impl<S: PlaybackSource> Clock<S> {
    pub fn new(source: S, tick_interval_ms: f64) -> Self {
        Self {
            source,
            tick_interval_ms,
            last_read_ms: 0.0,
        }
    }

    pub fn from_rate(source: S, ticks_per_second: u32) -> Self {
        Self::new(source, 1000.0 / ticks_per_second.max(1) as f64)
    }

    /// Never goes backwards. An unavailable or non-finite reading keeps the
    /// previous instant, which starts out at 0.
    pub fn current_time_ms(&mut self) -> f64 {
        if let Some(pos) = self.source.position_ms().filter(|p| p.is_finite()) {
            if pos > self.last_read_ms {
                self.last_read_ms = pos;
            }
        }
        self.last_read_ms
    }

    #[inline(always)]
    pub fn tick_interval_ms(&self) -> f64 {
        self.tick_interval_ms
    }

    pub fn last_read_ms(&self) -> f64 {
        self.last_read_ms
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

/// A playback position that only moves when told to. Cloned handles share
/// the same position, so a runner can drive time while the clock reads it.
#[derive(Debug, Clone, Default)]
pub struct SteppedSource {
    position: Rc<Cell<Option<f64>>>,
}

impl SteppedSource {
    /// Starts out "not playing": `position_ms` reports `None` until `start`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        if self.position.get().is_none() {
            self.position.set(Some(0.0));
        }
    }

    pub fn advance(&self, delta_ms: f64) {
        let pos = self.position.get().unwrap_or(0.0);
        self.position.set(Some(pos + delta_ms));
    }

    pub fn set(&self, position_ms: f64) {
        self.position.set(Some(position_ms));
    }

    pub fn stop(&self) {
        self.position.set(None);
    }
}

impl PlaybackSource for SteppedSource {
    fn position_ms(&self) -> Option<f64> {
        self.position.get()
    }
}

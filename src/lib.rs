//! Timing-and-judgment core for a four-lane falling-note rhythm game.
//!
//! The music playback position drives everything: notes spawn when the
//! track reaches their appearance time, fall a fixed amount per tick, and
//! are judged against the judgment line when their lane's key is pressed.

pub mod app;
pub mod config;
pub mod core;
pub mod error;
pub mod game;

pub use crate::config::EngineConfig;
pub use crate::core::input::Lane;
pub use crate::error::EngineError;
pub use crate::game::chart::{Chart, ChartError, NoteEvent};
pub use crate::game::gameplay::{HitFeedbackEvent, PressResult, TimingEngine};
pub use crate::game::judgment::{classify, JudgmentOutcome};
pub use crate::game::scores::ScoreState;

use std::fmt;

/// Local, non-fatal conditions the engine reports back to its caller.
///
/// None of these abort a tick; a dropped tick would desync note positions
/// from the music, so every runtime path hands one of these back instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Lane index outside 0..4. Rejected before any state is touched.
    InvalidLane(usize),
    /// Press on a lane with nothing in flight.
    NoActiveNote,
    /// Chart with zero notes. Valid, the engine just never spawns.
    EmptyChart,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidLane(lane) => write!(f, "lane {} is outside 0..4", lane),
            EngineError::NoActiveNote => write!(f, "no active note in lane"),
            EngineError::EmptyChart => write!(f, "chart has no notes"),
        }
    }
}

impl std::error::Error for EngineError {}

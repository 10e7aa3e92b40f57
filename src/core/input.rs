use crate::error::EngineError;
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

pub const LANE_COUNT: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Lane {
    D = 0,
    F = 1,
    J = 2,
    K = 3,
}

impl Lane {
    pub const ALL: [Lane; LANE_COUNT] = [Lane::D, Lane::F, Lane::J, Lane::K];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Result<Lane, EngineError> {
        Lane::ALL.get(index).copied().ok_or(EngineError::InvalidLane(index))
    }

    pub const fn label(self) -> char {
        match self {
            Lane::D => 'D',
            Lane::F => 'F',
            Lane::J => 'J',
            Lane::K => 'K',
        }
    }
}

impl TryFrom<u8> for Lane {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Lane::from_index(value as usize)
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputEdge {
    pub lane: Lane,
    pub pressed: bool,
}

#[inline(always)]
pub fn lane_from_keycode(code: KeyCode) -> Option<Lane> {
    match code {
        KeyCode::KeyD | KeyCode::ArrowLeft => Some(Lane::D),
        KeyCode::KeyF | KeyCode::ArrowDown => Some(Lane::F),
        KeyCode::KeyJ | KeyCode::ArrowUp => Some(Lane::J),
        KeyCode::KeyK | KeyCode::ArrowRight => Some(Lane::K),
        _ => None,
    }
}

pub fn lane_from_char(c: char) -> Option<Lane> {
    match c.to_ascii_lowercase() {
        'd' => Some(Lane::D),
        'f' => Some(Lane::F),
        'j' => Some(Lane::J),
        'k' => Some(Lane::K),
        _ => None,
    }
}

/// Turns raw key edges into the discrete presses the engine consumes.
///
/// OS auto-repeat and a second key-down on a lane that is already held both
/// get swallowed; the lane re-arms on release.
#[derive(Debug, Default)]
pub struct PressDebouncer {
    held: [bool; LANE_COUNT],
}

impl PressDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lane when this edge is a fresh press.
    pub fn edge(&mut self, lane: Lane, pressed: bool, repeat: bool) -> Option<InputEdge> {
        let slot = &mut self.held[lane.index()];
        if !pressed {
            *slot = false;
            return None;
        }
        if repeat || *slot {
            return None;
        }
        *slot = true;
        Some(InputEdge { lane, pressed: true })
    }

    pub fn key(&mut self, code: KeyCode, pressed: bool, repeat: bool) -> Option<InputEdge> {
        let lane = lane_from_keycode(code)?;
        self.edge(lane, pressed, repeat)
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent) -> Option<InputEdge> {
        let PhysicalKey::Code(code) = event.physical_key else { return None; };
        self.key(code, event.state == ElementState::Pressed, event.repeat)
    }

    pub fn is_held(&self, lane: Lane) -> bool {
        self.held[lane.index()]
    }
}

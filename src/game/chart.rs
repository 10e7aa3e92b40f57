use crate::config::{METRONOME_INTERVAL_MS, METRONOME_NOTE_COUNT, METRONOME_SPEED};
use crate::core::input::{Lane, LANE_COUNT};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One note as authored: which lane, when it appears, how fast it falls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteEvent {
    pub lane: Lane,
    pub appearance_time_ms: f64,
    /// Position units per tick.
    pub speed: f64,
}

/// On-disk record. Accepts the field names the chart converter writes
/// (`position`, `appearance_time`) as well as the canonical ones.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NoteRecord {
    #[serde(alias = "position")]
    pub lane: i64,
    #[serde(alias = "appearance_time")]
    pub appearance_time_ms: f64,
    pub speed: f64,
}

#[derive(Debug)]
pub enum ChartError {
    InvalidLane { index: usize, lane: i64 },
    InvalidTime { index: usize, time_ms: f64 },
    InvalidSpeed { index: usize, speed: f64 },
    Empty,
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartError::InvalidLane { index, lane } => {
                write!(f, "note {}: lane {} is outside 0..{}", index, lane, LANE_COUNT)
            }
            ChartError::InvalidTime { index, time_ms } => {
                write!(f, "note {}: appearance time {} must be finite and >= 0", index, time_ms)
            }
            ChartError::InvalidSpeed { index, speed } => {
                write!(f, "note {}: speed {} must be finite and > 0", index, speed)
            }
            ChartError::Empty => write!(f, "chart contains no notes"),
            ChartError::Json(e) => write!(f, "chart JSON error: {}", e),
            ChartError::Io(e) => write!(f, "chart I/O error: {}", e),
        }
    }
}

impl std::error::Error for ChartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChartError::Json(e) => Some(e),
            ChartError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ChartError {
    fn from(e: serde_json::Error) -> Self {
        ChartError::Json(e)
    }
}

impl From<std::io::Error> for ChartError {
    fn from(e: std::io::Error) -> Self {
        ChartError::Io(e)
    }
}

/// Immutable, validated note sequence in authored order.
#[derive(Clone, Debug, Default)]
pub struct Chart {
    notes: Vec<NoteEvent>,
}

impl Chart {
    pub fn new(notes: Vec<NoteEvent>) -> Result<Self, ChartError> {
        for (index, note) in notes.iter().enumerate() {
            validate_timing(index, note.appearance_time_ms, note.speed)?;
        }
        let unsorted = notes
            .windows(2)
            .position(|w| w[1].appearance_time_ms < w[0].appearance_time_ms);
        if let Some(at) = unsorted {
            warn!(
                "Chart is not sorted by appearance time (note {} precedes note {}); spawn order within a tick is undefined.",
                at + 1,
                at
            );
        }
        Ok(Self { notes })
    }

    pub fn from_records(records: Vec<NoteRecord>) -> Result<Self, ChartError> {
        let notes = records
            .into_iter()
            .enumerate()
            .map(|(index, r)| {
                let lane = usize::try_from(r.lane)
                    .ok()
                    .and_then(|l| Lane::from_index(l).ok())
                    .ok_or(ChartError::InvalidLane { index, lane: r.lane })?;
                Ok(NoteEvent {
                    lane,
                    appearance_time_ms: r.appearance_time_ms,
                    speed: r.speed,
                })
            })
            .collect::<Result<Vec<_>, ChartError>>()?;
        Self::new(notes)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ChartError> {
        let records: Vec<NoteRecord> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    pub fn load_json(path: &Path) -> Result<Self, ChartError> {
        let contents = std::fs::read_to_string(path)?;
        let chart = Self::from_json_str(&contents)?;
        info!("Loaded {} notes from '{}'.", chart.len(), path.display());
        Ok(chart)
    }

    /// Evenly spaced notes on a single lane.
    pub fn metronome(count: usize, interval_ms: f64, lane: Lane, speed: f64) -> Result<Self, ChartError> {
        Self::new(
            (0..count)
                .map(|i| NoteEvent {
                    lane,
                    appearance_time_ms: i as f64 * interval_ms,
                    speed,
                })
                .collect(),
        )
    }

    /// The built-in practice pattern: a note every 200 ms on D for 36 seconds.
    pub fn builtin() -> Self {
        let notes = (0..METRONOME_NOTE_COUNT)
            .map(|i| NoteEvent {
                lane: Lane::D,
                appearance_time_ms: i as f64 * METRONOME_INTERVAL_MS,
                speed: METRONOME_SPEED,
            })
            .collect();
        Self { notes }
    }

    pub fn ensure_playable(&self) -> Result<(), ChartError> {
        if self.notes.is_empty() {
            Err(ChartError::Empty)
        } else {
            Ok(())
        }
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn get(&self, index: usize) -> Option<&NoteEvent> {
        self.notes.get(index)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn notes_in_lane(&self, lane: Lane) -> usize {
        self.notes.iter().filter(|n| n.lane == lane).count()
    }

    pub fn last_appearance_ms(&self) -> Option<f64> {
        self.notes
            .iter()
            .map(|n| n.appearance_time_ms)
            .fold(None, |acc, t| Some(acc.map_or(t, |a: f64| a.max(t))))
    }

    pub fn to_records(&self) -> Vec<NoteRecord> {
        self.notes
            .iter()
            .map(|n| NoteRecord {
                lane: n.lane.index() as i64,
                appearance_time_ms: n.appearance_time_ms,
                speed: n.speed,
            })
            .collect()
    }
}

fn validate_timing(index: usize, time_ms: f64, speed: f64) -> Result<(), ChartError> {
    if !time_ms.is_finite() || time_ms < 0.0 {
        return Err(ChartError::InvalidTime { index, time_ms });
    }
    if !speed.is_finite() || speed <= 0.0 {
        return Err(ChartError::InvalidSpeed { index, speed });
    }
    Ok(())
}

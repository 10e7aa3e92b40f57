use crate::config::{EngineConfig, JUDGMENT_WINDOW_SIZE, PERFECT_RATIO, SCORE_GREAT, SCORE_MISS, SCORE_PERFECT};
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JudgmentOutcome {
    Perfect,
    Great,
    Miss,
    /// Outside every window. The press is inert and nothing is consumed.
    NoHit,
}

impl JudgmentOutcome {
    #[inline(always)]
    pub fn is_hit(self) -> bool {
        matches!(self, JudgmentOutcome::Perfect | JudgmentOutcome::Great)
    }

    /// Whether this outcome consumes the note it was computed for.
    #[inline(always)]
    pub fn consumes_note(self) -> bool {
        !matches!(self, JudgmentOutcome::NoHit)
    }
}

impl fmt::Display for JudgmentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            JudgmentOutcome::Perfect => "PERFECT",
            JudgmentOutcome::Great => "GREAT",
            JudgmentOutcome::Miss => "MISS",
            JudgmentOutcome::NoHit => "",
        };
        f.write_str(text)
    }
}

/// Maps a signed distance from the judgment line to an outcome.
///
/// Checked strictly in Perfect -> Great -> Miss order with inclusive bounds,
/// so a distance sitting exactly on a boundary gets the stricter outcome.
pub fn classify(offset: f64, window_size: f64, perfect_ratio: f64) -> JudgmentOutcome {
    let distance = offset.abs();
    if distance <= window_size * perfect_ratio {
        JudgmentOutcome::Perfect
    } else if distance <= window_size {
        JudgmentOutcome::Great
    } else if distance <= window_size * 2.0 {
        JudgmentOutcome::Miss
    } else {
        JudgmentOutcome::NoHit
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JudgmentWindows {
    pub window_size: f64,
    pub perfect_ratio: f64,
}

impl Default for JudgmentWindows {
    fn default() -> Self {
        Self {
            window_size: JUDGMENT_WINDOW_SIZE,
            perfect_ratio: PERFECT_RATIO,
        }
    }
}

impl JudgmentWindows {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            window_size: config.window_size,
            perfect_ratio: config.perfect_ratio,
        }
    }

    #[inline(always)]
    pub fn classify(&self, offset: f64) -> JudgmentOutcome {
        classify(offset, self.window_size, self.perfect_ratio)
    }

    /// Distance past the judgment line beyond which an unpressed note expires.
    #[inline(always)]
    pub fn expiry_distance(&self) -> f64 {
        self.window_size * 2.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScoreValues {
    pub perfect: u32,
    pub great: u32,
    pub miss: u32,
}

impl Default for ScoreValues {
    fn default() -> Self {
        Self {
            perfect: SCORE_PERFECT,
            great: SCORE_GREAT,
            miss: SCORE_MISS,
        }
    }
}

impl ScoreValues {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            perfect: config.score_perfect,
            great: config.score_great,
            miss: config.score_miss,
        }
    }

    pub fn points_for(&self, outcome: JudgmentOutcome) -> u32 {
        match outcome {
            JudgmentOutcome::Perfect => self.perfect,
            JudgmentOutcome::Great => self.great,
            JudgmentOutcome::Miss => self.miss,
            JudgmentOutcome::NoHit => 0,
        }
    }
}

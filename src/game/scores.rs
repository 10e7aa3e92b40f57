use crate::config::{COMBO_TIER_LOW_MAX, COMBO_TIER_MID_MAX};
use crate::game::judgment::JudgmentOutcome;
use serde::Serialize;

/// How the combo counter should be drawn: white up to 20, yellow up to 100,
/// red beyond.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ComboTier {
    Low,
    Mid,
    High,
}

impl ComboTier {
    pub fn for_combo(combo: u32) -> Self {
        if combo <= COMBO_TIER_LOW_MAX {
            ComboTier::Low
        } else if combo <= COMBO_TIER_MID_MAX {
            ComboTier::Mid
        } else {
            ComboTier::High
        }
    }
}

/// Score and combo. Only the engine writes to this; everyone else gets a copy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScoreState {
    pub total_score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub perfects: u32,
    pub greats: u32,
    /// All misses, pressed or expired.
    pub misses: u32,
    /// The subset of `misses` that came from notes falling past the window.
    pub expired: u32,
    /// Best possible score for the notes judged so far.
    pub possible_score: u64,
}

impl ScoreState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one judged outcome. NoHit is not a judgment and is ignored.
    pub fn record(&mut self, outcome: JudgmentOutcome, points: u32, best_points: u32) {
        match outcome {
            JudgmentOutcome::Perfect => self.perfects += 1,
            JudgmentOutcome::Great => self.greats += 1,
            JudgmentOutcome::Miss => self.misses += 1,
            JudgmentOutcome::NoHit => return,
        }
        if outcome.is_hit() {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        } else {
            self.combo = 0;
        }
        self.total_score += points as u64;
        self.possible_score += best_points as u64;
    }

    /// A note that fell past the miss window without a press.
    pub fn record_expiry(&mut self, miss_points: u32, best_points: u32) {
        self.record(JudgmentOutcome::Miss, miss_points, best_points);
        self.expired += 1;
    }

    pub fn judged(&self) -> u32 {
        self.perfects + self.greats + self.misses
    }

    pub fn combo_tier(&self) -> ComboTier {
        ComboTier::for_combo(self.combo)
    }

    /// Earned over best possible for what's been judged so far, 0..=1.
    pub fn accuracy(&self) -> f64 {
        if self.possible_score == 0 {
            return 0.0;
        }
        (self.total_score as f64 / self.possible_score as f64).clamp(0.0, 1.0)
    }

    pub fn is_full_combo(&self) -> bool {
        self.judged() > 0 && self.misses == 0
    }
}

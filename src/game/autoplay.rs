use crate::core::input::{Lane, LANE_COUNT};
use crate::game::gameplay::TimingEngine;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A bot that presses each lane's head note as it reaches the judgment line.
///
/// `jitter` spreads the press point uniformly over `line ± jitter` (position
/// units) and `skip_rate` is the chance of ignoring a note entirely, letting
/// it fall through and expire.
#[derive(Debug)]
pub struct Autoplay {
    rng: StdRng,
    jitter: f64,
    skip_rate: f64,
    /// Per lane: which chart note we've planned for and where we'll press it.
    plans: [Option<Plan>; LANE_COUNT],
}

#[derive(Copy, Clone, Debug)]
struct Plan {
    note_index: usize,
    /// `None` means this note is being skipped.
    press_at: Option<f64>,
}

impl Autoplay {
    /// Presses every note dead on the line.
    pub fn perfect() -> Self {
        Self::new(0, 0.0, 0.0)
    }

    pub fn new(seed: u64, jitter: f64, skip_rate: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            jitter: if jitter.is_finite() { jitter.abs() } else { 0.0 },
            skip_rate: if skip_rate.is_finite() { skip_rate.clamp(0.0, 1.0) } else { 0.0 },
            plans: [None; LANE_COUNT],
        }
    }

    /// Looks at every lane head and returns the lanes to press before the
    /// next tick. Pressing is decided on the position the engine will judge.
    pub fn decide(&mut self, engine: &TimingEngine) -> Vec<Lane> {
        let line = engine.judgment_line_offset();
        let mut presses = Vec::new();
        for lane in Lane::ALL {
            let slot = &mut self.plans[lane.index()];
            let Some(head) = engine.head(lane) else {
                *slot = None;
                continue;
            };

            let plan = match *slot {
                Some(plan) if plan.note_index == head.note_index => plan,
                _ => {
                    let skip = self.skip_rate > 0.0 && self.rng.random_bool(self.skip_rate);
                    let press_at = if skip {
                        debug!("Autoplay skipping note {} in lane {}.", head.note_index, lane);
                        None
                    } else if self.jitter > 0.0 {
                        Some(line + self.rng.random_range(-self.jitter..=self.jitter))
                    } else {
                        Some(line)
                    };
                    let plan = Plan {
                        note_index: head.note_index,
                        press_at,
                    };
                    *slot = Some(plan);
                    plan
                }
            };

            if let Some(target) = plan.press_at {
                if head.vertical_offset >= target {
                    presses.push(lane);
                }
            }
        }
        presses
    }
}

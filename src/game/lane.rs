use crate::core::input::{Lane, LANE_COUNT};
use std::collections::VecDeque;

/// A note in flight. Only ever owned by its lane's queue.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveNote {
    pub lane: Lane,
    /// Track position; spawns above the line (negative) and grows downward.
    pub vertical_offset: f64,
    pub speed: f64,
    /// Index of the chart entry this note was spawned from.
    pub note_index: usize,
}

impl ActiveNote {
    #[inline(always)]
    pub fn distance_from(&self, judgment_line_offset: f64) -> f64 {
        self.vertical_offset - judgment_line_offset
    }
}

/// Per-lane FIFO queues. The head of a queue is always the earliest spawned
/// note in that lane that hasn't been judged or expired.
#[derive(Debug, Default)]
pub struct LaneState {
    lanes: [VecDeque<ActiveNote>; LANE_COUNT],
}

impl LaneState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, note: ActiveNote) {
        self.lanes[note.lane.index()].push_back(note);
    }

    pub fn head(&self, lane: Lane) -> Option<&ActiveNote> {
        self.lanes[lane.index()].front()
    }

    pub fn pop_head(&mut self, lane: Lane) -> Option<ActiveNote> {
        self.lanes[lane.index()].pop_front()
    }

    /// Moves every note down by `speed * ticks` and pulls out any note whose
    /// position is now past `expiry_offset`. Expired notes come back in lane
    /// order, oldest first within a lane.
    pub fn advance(&mut self, ticks: f64, expiry_offset: f64) -> Vec<ActiveNote> {
        let mut expired = Vec::new();
        for queue in &mut self.lanes {
            for note in queue.iter_mut() {
                note.vertical_offset += note.speed * ticks;
            }
            queue.retain(|note| {
                if note.vertical_offset > expiry_offset {
                    expired.push(*note);
                    false
                } else {
                    true
                }
            });
        }
        expired
    }

    pub fn lane(&self, lane: Lane) -> &VecDeque<ActiveNote> {
        &self.lanes[lane.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveNote> {
        self.lanes.iter().flat_map(|q| q.iter())
    }

    pub fn len(&self) -> usize {
        self.lanes.iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(VecDeque::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(lane: Lane, offset: f64, speed: f64, note_index: usize) -> ActiveNote {
        ActiveNote {
            lane,
            vertical_offset: offset,
            speed,
            note_index,
        }
    }

    #[test]
    fn queues_are_fifo_per_lane() {
        let mut lanes = LaneState::new();
        lanes.push(note(Lane::D, -50.0, 5.0, 0));
        lanes.push(note(Lane::J, -50.0, 5.0, 1));
        lanes.push(note(Lane::D, -50.0, 5.0, 2));
        assert_eq!(lanes.len(), 3);
        assert_eq!(lanes.head(Lane::D).map(|n| n.note_index), Some(0));
        assert_eq!(lanes.pop_head(Lane::D).map(|n| n.note_index), Some(0));
        assert_eq!(lanes.head(Lane::D).map(|n| n.note_index), Some(2));
        assert_eq!(lanes.head(Lane::J).map(|n| n.note_index), Some(1));
        assert!(lanes.head(Lane::F).is_none());
        assert!(lanes.pop_head(Lane::K).is_none());
    }

    #[test]
    fn advance_scales_by_tick_fraction_and_expires_past_boundary() {
        let mut lanes = LaneState::new();
        lanes.push(note(Lane::F, 690.0, 10.0, 0));
        lanes.push(note(Lane::F, 100.0, 10.0, 1));
        lanes.push(note(Lane::K, 695.0, 10.0, 2));

        let expired = lanes.advance(0.5, 700.0);
        assert!(expired.is_empty(), "695 and 700 are not past 700");
        assert_eq!(lanes.head(Lane::F).map(|n| n.vertical_offset), Some(695.0));
        assert_eq!(lanes.head(Lane::K).map(|n| n.vertical_offset), Some(700.0));

        let expired = lanes.advance(1.0, 700.0);
        let indices: Vec<_> = expired.iter().map(|n| n.note_index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(lanes.len(), 1);
        assert_eq!(lanes.head(Lane::F).map(|n| n.vertical_offset), Some(115.0));
    }

    #[test]
    fn distance_is_signed() {
        let n = note(Lane::D, 460.0, 1.0, 0);
        assert_eq!(n.distance_from(500.0), -40.0);
    }
}

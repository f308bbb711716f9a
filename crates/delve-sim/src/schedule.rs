//! Delayed flow entries: phase transitions and enemy spawns.
//!
//! Delays are effective milliseconds, decremented by the Flow system.

use delve_core::enums::GamePhase;

/// A phase change that fires once its delay elapses.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTransition {
    pub target: GamePhase,
    pub remaining_ms: f64,
}

/// The next enemy spawn of the current floor.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledSpawn {
    pub remaining_ms: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FlowSchedule {
    pub transitions: Vec<ScheduledTransition>,
    pub spawns: Vec<ScheduledSpawn>,
}

impl FlowSchedule {
    pub fn schedule_transition(&mut self, target: GamePhase, delay_ms: f64) {
        self.transitions.push(ScheduledTransition {
            target,
            remaining_ms: delay_ms.max(0.0),
        });
    }

    pub fn schedule_spawn(&mut self, delay_ms: f64) {
        self.spawns.push(ScheduledSpawn {
            remaining_ms: delay_ms.max(0.0),
        });
    }

    pub fn clear(&mut self) {
        self.transitions.clear();
        self.spawns.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty() && self.spawns.is_empty()
    }

    /// Advance transitions by `dt_ms` and return the ones that came due, in order.
    pub fn advance_transitions(&mut self, dt_ms: f64) -> Vec<GamePhase> {
        advance(&mut self.transitions, dt_ms, |t| &mut t.remaining_ms)
            .into_iter()
            .map(|t| t.target)
            .collect()
    }

    /// Advance spawns by `dt_ms` and return how many came due.
    pub fn advance_spawns(&mut self, dt_ms: f64) -> usize {
        advance(&mut self.spawns, dt_ms, |s| &mut s.remaining_ms).len()
    }
}

fn advance<T>(entries: &mut Vec<T>, dt_ms: f64, remaining: impl Fn(&mut T) -> &mut f64) -> Vec<T> {
    let mut due = Vec::new();
    let mut i = 0;
    while i < entries.len() {
        let left = remaining(&mut entries[i]);
        *left -= dt_ms;
        if *left <= 0.0 {
            due.push(entries.remove(i));
        } else {
            i += 1;
        }
    }
    due
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_fire_in_order_once() {
        let mut schedule = FlowSchedule::default();
        schedule.schedule_transition(GamePhase::Defeat, 32.0);
        schedule.schedule_transition(GamePhase::FloorComplete, 16.0);

        assert_eq!(schedule.advance_transitions(16.0), vec![GamePhase::FloorComplete]);
        assert_eq!(schedule.advance_transitions(16.0), vec![GamePhase::Defeat]);
        assert!(schedule.advance_transitions(16.0).is_empty());
        assert!(schedule.is_empty());
    }

    #[test]
    fn negative_delay_fires_next_advance() {
        let mut schedule = FlowSchedule::default();
        schedule.schedule_spawn(-100.0);
        assert_eq!(schedule.advance_spawns(0.0), 1);
    }
}

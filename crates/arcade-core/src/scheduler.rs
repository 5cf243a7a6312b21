//! Deterministic sub-step timing. A session drives exactly one
//! `update(dt)` per host callback; games derive their slower cadences
//! (spawn, AI, combat stepping) from these accumulators instead of
//! registering independent wall-clock timers, so the order of sub-steps
//! within a frame is fixed and tests can step time explicitly.

use serde::{Deserialize, Serialize};

/// Fires every `period` seconds of accumulated elapsed time. A large
/// `dt` can yield several fires in one call; callers loop over the count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalTimer {
    period: f32,
    acc: f32,
}

impl IntervalTimer {
    pub fn new(period: f32) -> Self {
        Self {
            period: period.max(f32::EPSILON),
            acc: 0.0,
        }
    }

    /// Advance by `dt` seconds, returning how many times the interval
    /// elapsed.
    pub fn tick(&mut self, dt: f32) -> u32 {
        self.acc += dt.max(0.0);
        let mut fires = 0;
        while self.acc >= self.period {
            self.acc -= self.period;
            fires += 1;
        }
        fires
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    /// Retarget the interval. The accumulator carries over so shortening
    /// a period mid-wave never loses progress toward the next fire.
    pub fn set_period(&mut self, period: f32) {
        self.period = period.max(f32::EPSILON);
    }

    pub fn reset(&mut self) {
        self.acc = 0.0;
    }
}

/// Count-down gate for actions with a minimum interval between uses
/// (tower shots, blaster fire, special attacks).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Cooldown {
    remaining: f32,
}

impl Cooldown {
    /// A cooldown that is ready immediately.
    pub fn ready_now() -> Self {
        Self { remaining: 0.0 }
    }

    pub fn is_ready(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn tick(&mut self, dt: f32) {
        if self.remaining > 0.0 {
            self.remaining -= dt;
        }
    }

    /// Consume the cooldown for `period` seconds.
    pub fn trigger(&mut self, period: f32) {
        self.remaining = period;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_accumulate_across_small_steps() {
        let mut timer = IntervalTimer::new(0.1);
        let mut fires = 0;
        for _ in 0..10 {
            fires += timer.tick(0.016);
        }
        // 160 ms of 100 ms period: exactly one fire, 60 ms accumulated.
        assert_eq!(fires, 1);
        assert_eq!(timer.tick(0.04), 1);
    }

    #[test]
    fn large_step_fires_multiple_times() {
        let mut timer = IntervalTimer::new(0.25);
        assert_eq!(timer.tick(1.0), 4);
    }

    #[test]
    fn negative_dt_is_ignored() {
        let mut timer = IntervalTimer::new(0.1);
        assert_eq!(timer.tick(-5.0), 0);
        assert_eq!(timer.tick(0.1), 1);
    }

    #[test]
    fn cooldown_gates_until_elapsed() {
        let mut cd = Cooldown::ready_now();
        assert!(cd.is_ready());
        cd.trigger(0.6);
        assert!(!cd.is_ready());
        cd.tick(0.3);
        assert!(!cd.is_ready());
        cd.tick(0.3);
        assert!(cd.is_ready());
    }
}

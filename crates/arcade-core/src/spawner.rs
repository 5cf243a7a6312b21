//! Timer-driven entity creation with escalating difficulty. Two
//! orthogonal rules, used separately or together per game: rate
//! escalation (spawn delay shrinks with a difficulty metric, floored)
//! and wave composition (count/strength grow with the wave index).

use serde::{Deserialize, Serialize};

use crate::scheduler::IntervalTimer;

/// Continuous spawn source whose delay shrinks as difficulty grows:
/// `delay = max(min_delay, base_delay - k * difficulty)`.
///
/// The difficulty metric is game-defined (elapsed seconds, speed,
/// score). Delay never drops below `min_delay`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnTimer {
    base_delay: f32,
    min_delay: f32,
    k: f32,
    acc: f32,
}

impl SpawnTimer {
    pub fn new(base_delay: f32, min_delay: f32, k: f32) -> Self {
        Self {
            base_delay,
            min_delay: min_delay.max(f32::EPSILON),
            k,
            acc: 0.0,
        }
    }

    /// Current delay in seconds for a given difficulty metric.
    pub fn delay_for(&self, difficulty: f32) -> f32 {
        (self.base_delay - self.k * difficulty).max(self.min_delay)
    }

    /// Advance by `dt` seconds at the given difficulty; returns how many
    /// entities to spawn this frame.
    pub fn tick(&mut self, dt: f32, difficulty: f32) -> u32 {
        self.acc += dt.max(0.0);
        let delay = self.delay_for(difficulty);
        let mut fires = 0;
        while self.acc >= delay {
            self.acc -= delay;
            fires += 1;
        }
        fires
    }
}

/// Wave escalation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Enemies in wave 1; wave `n` spawns `base_count + n` enemies.
    pub base_count: u32,
    pub base_hp: i32,
    pub hp_per_wave: i32,
    /// Completion reward: `base_reward + wave * reward_per_wave`.
    pub base_reward: u64,
    pub reward_per_wave: u64,
    /// Seconds between spawns within a wave, shrinking `gap_step` per
    /// wave down to `min_spawn_gap`.
    pub spawn_gap: f32,
    pub min_spawn_gap: f32,
    pub gap_step: f32,
    /// Pause between waves.
    pub breather: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            base_count: 2,
            base_hp: 80,
            hp_per_wave: 15,
            base_reward: 20,
            reward_per_wave: 10,
            spawn_gap: 1.2,
            min_spawn_gap: 0.4,
            gap_step: 0.05,
            breather: 3.0,
        }
    }
}

/// Reward granted when a wave is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveReward {
    pub wave: u32,
    pub reward: u64,
}

/// What happened during one director tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaveTick {
    /// Enemies to spawn this frame.
    pub spawns: u32,
    /// Set when a new wave just started.
    pub started: Option<u32>,
    /// Set when the previous wave was cleared (no live enemies and no
    /// pending spawns).
    pub completed: Option<WaveReward>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Breather { remaining: f32 },
    Spawning,
    Clearing,
}

/// Drives wave progression for one session. The caller spawns the
/// entities it is told to, and reports kills/leaks back so the director
/// can detect wave completion.
#[derive(Debug, Clone)]
pub struct WaveDirector {
    config: WaveConfig,
    wave: u32,
    pending: u32,
    live: u32,
    gap: IntervalTimer,
    phase: Phase,
}

impl WaveDirector {
    /// The first wave starts on the first tick (no initial breather).
    pub fn new(config: WaveConfig) -> Self {
        let gap = IntervalTimer::new(config.spawn_gap);
        Self {
            config,
            wave: 0,
            pending: 0,
            live: 0,
            gap,
            phase: Phase::Breather { remaining: 0.0 },
        }
    }

    /// Current wave index, strictly increasing over a session. Zero
    /// before the first wave starts.
    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn live(&self) -> u32 {
        self.live
    }

    pub fn pending(&self) -> u32 {
        self.pending
    }

    /// Hp for an enemy spawned in the given wave.
    pub fn enemy_hp(&self, wave: u32) -> i32 {
        self.config.base_hp + wave as i32 * self.config.hp_per_wave
    }

    pub fn enemy_count(&self, wave: u32) -> u32 {
        self.config.base_count + wave
    }

    pub fn completion_reward(&self, wave: u32) -> u64 {
        self.config.base_reward + u64::from(wave) * self.config.reward_per_wave
    }

    /// Within-wave spawn gap, never below the floor and never growing
    /// with the wave index.
    pub fn spawn_gap_for(&self, wave: u32) -> f32 {
        (self.config.spawn_gap - self.config.gap_step * wave.saturating_sub(1) as f32)
            .max(self.config.min_spawn_gap)
    }

    /// Report an enemy removed from play (killed or leaked out).
    pub fn enemy_gone(&mut self) {
        self.live = self.live.saturating_sub(1);
    }

    pub fn tick(&mut self, dt: f32) -> WaveTick {
        let mut out = WaveTick::default();
        match self.phase {
            Phase::Breather { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.wave += 1;
                    self.pending = self.enemy_count(self.wave);
                    self.gap.set_period(self.spawn_gap_for(self.wave));
                    self.gap.reset();
                    self.phase = Phase::Spawning;
                    out.started = Some(self.wave);
                    // Lead enemy spawns with the wave itself.
                    self.pending -= 1;
                    self.live += 1;
                    out.spawns = 1;
                } else {
                    self.phase = Phase::Breather { remaining };
                }
            },
            Phase::Spawning => {
                let fires = self.gap.tick(dt).min(self.pending);
                self.pending -= fires;
                self.live += fires;
                out.spawns = fires;
                if self.pending == 0 {
                    self.phase = Phase::Clearing;
                }
            },
            Phase::Clearing => {
                if self.live == 0 {
                    out.completed = Some(WaveReward {
                        wave: self.wave,
                        reward: self.completion_reward(self.wave),
                    });
                    self.phase = Phase::Breather {
                        remaining: self.config.breather,
                    };
                }
            },
        }
        out
    }
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use arcade_core::entity::{Entity, EntityKind, EntityRegistry, Shape, Vec2};
use arcade_core::game_trait::{
    ArcadeGame, GameConfig, GameEvent, GameId, GameMetadata, GameResult, ScoreOrdering,
};
use arcade_core::input::Intent;

/// Number of pads.
const PADS: u32 = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub field_width: f32,
    pub field_height: f32,
    /// Seconds each pad stays lit during playback, round 1.
    pub show_secs: f32,
    /// Playback speeds up by this factor per round...
    pub speedup: f32,
    /// ...down to this floor.
    pub min_show_secs: f32,
    /// Dark gap between lit pads.
    pub gap_secs: f32,
    /// Seconds the player has to tap each step before failing.
    pub input_timeout: f32,
    /// Pause between a completed round and the next playback.
    pub round_gap: f32,
    pub coins_per_round: u64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            field_width: 800.0,
            field_height: 600.0,
            show_secs: 0.6,
            speedup: 0.95,
            min_show_secs: 0.25,
            gap_secs: 0.2,
            input_timeout: 5.0,
            round_gap: 0.8,
            coins_per_round: 2,
        }
    }
}

impl SequenceConfig {
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ARCADE_SEQUENCE_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/sequence.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    /// Showing `sequence[step]`; pad lit for the remaining seconds.
    Showing { step: usize, remaining: f32 },
    /// Dark gap before showing the next step.
    Gap { next: usize, remaining: f32 },
    /// Waiting for the player to repeat step `progress`.
    Awaiting { progress: usize, remaining: f32 },
    /// Round completed; breather before the next playback.
    RoundGap { remaining: f32 },
}

/// Simon-style memory game: watch the pad sequence, repeat it by
/// tapping. One mistake or a timeout ends the run; the score is the
/// longest sequence completed.
pub struct MemorySequence {
    config: SequenceConfig,
    registry: EntityRegistry,
    rng: StdRng,
    sequence: Vec<u32>,
    phase: Phase,
    cursor: (f32, f32),
    /// Events produced by taps, drained by the next update.
    pending_events: Vec<GameEvent>,
    score: i64,
    over: bool,
}

impl Default for MemorySequence {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySequence {
    pub fn new() -> Self {
        Self::with_config(SequenceConfig::load())
    }

    pub fn with_config(config: SequenceConfig) -> Self {
        Self {
            config,
            registry: EntityRegistry::new(),
            rng: StdRng::seed_from_u64(0),
            sequence: Vec::new(),
            phase: Phase::RoundGap { remaining: 0.0 },
            cursor: (0.0, 0.0),
            pending_events: Vec::new(),
            score: 0,
            over: false,
        }
    }

    /// The sequence being played back, for UI/debug display.
    pub fn sequence(&self) -> &[u32] {
        &self.sequence
    }

    fn show_secs(&self) -> f32 {
        let round = self.sequence.len().saturating_sub(1) as i32;
        (self.config.show_secs * self.config.speedup.powi(round)).max(self.config.min_show_secs)
    }

    /// Pad centers: one per quadrant.
    fn pad_center(&self, pad: u32) -> Vec2 {
        let qx = self.config.field_width / 4.0;
        let qy = self.config.field_height / 4.0;
        match pad {
            0 => Vec2::new(qx, qy),
            1 => Vec2::new(3.0 * qx, qy),
            2 => Vec2::new(qx, 3.0 * qy),
            _ => Vec2::new(3.0 * qx, 3.0 * qy),
        }
    }

    fn pad_at(&self, x: f32, y: f32) -> Option<u32> {
        let half_w = self.config.field_width / 4.0 - 10.0;
        let half_h = self.config.field_height / 4.0 - 10.0;
        (0..PADS).find(|pad| {
            let c = self.pad_center(*pad);
            (x - c.x).abs() < half_w && (y - c.y).abs() < half_h
        })
    }

    /// Light exactly the given pad (or none). Pads expose lit state to
    /// the UI sink through `attrs.hp` (1 = lit).
    fn light(&mut self, pad: Option<u32>) {
        for e in self.registry.all_mut() {
            e.attrs.hp = i32::from(pad == Some(e.attrs.tag));
        }
    }

    fn extend_sequence(&mut self) {
        let next = self.rng.random_range(0..PADS);
        self.sequence.push(next);
    }

    fn fail(&mut self, events: &mut Vec<GameEvent>) {
        self.over = true;
        self.light(None);
        let earned = self.result().currency_earned;
        if earned > 0 {
            events.push(GameEvent::CurrencyEarned { amount: earned });
        }
        events.push(GameEvent::GameOver);
    }

    fn tap(&mut self, pad: u32, events: &mut Vec<GameEvent>) {
        let Phase::Awaiting { progress, .. } = self.phase else {
            // Taps during playback are ignored, not punished.
            return;
        };
        if self.sequence.get(progress) != Some(&pad) {
            self.fail(events);
            return;
        }
        let progress = progress + 1;
        if progress == self.sequence.len() {
            self.score = self.sequence.len() as i64;
            events.push(GameEvent::ScoreChanged { score: self.score });
            self.light(None);
            self.phase = Phase::RoundGap {
                remaining: self.config.round_gap,
            };
        } else {
            self.phase = Phase::Awaiting {
                progress,
                remaining: self.config.input_timeout,
            };
        }
    }
}

impl ArcadeGame for MemorySequence {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            id: GameId::Sequence,
            name: "Token Recall".to_string(),
            ordering: ScoreOrdering::HigherIsBetter,
            tick_hz: 30.0,
        }
    }

    fn init(&mut self, config: &GameConfig) {
        self.rng = StdRng::seed_from_u64(config.seed);
        for pad in 0..PADS {
            let _ = self.registry.add(
                Entity::new(
                    EntityKind::Target,
                    self.pad_center(pad),
                    Shape::Box {
                        half_w: self.config.field_width / 4.0 - 10.0,
                        half_h: self.config.field_height / 4.0 - 10.0,
                    },
                )
                .with_tag(pad),
            );
        }
    }

    fn handle(&mut self, intent: Intent) {
        if self.over || intent != Intent::Attack {
            return;
        }
        let (x, y) = self.cursor;
        if let Some(pad) = self.pad_at(x, y) {
            let mut events = std::mem::take(&mut self.pending_events);
            self.tap(pad, &mut events);
            self.pending_events = events;
        }
    }

    fn pointer(&mut self, x: f32, y: f32) {
        if self.over {
            return;
        }
        self.cursor = (x, y);
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.over {
            return Vec::new();
        }
        let mut events = std::mem::take(&mut self.pending_events);
        match self.phase {
            Phase::Showing { step, remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.light(None);
                    let next = step + 1;
                    if next == self.sequence.len() {
                        self.phase = Phase::Awaiting {
                            progress: 0,
                            remaining: self.config.input_timeout,
                        };
                    } else {
                        self.phase = Phase::Gap {
                            next,
                            remaining: self.config.gap_secs,
                        };
                    }
                } else {
                    self.phase = Phase::Showing { step, remaining };
                }
            },
            Phase::Gap { next, remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.light(Some(self.sequence[next]));
                    self.phase = Phase::Showing {
                        step: next,
                        remaining: self.show_secs(),
                    };
                } else {
                    self.phase = Phase::Gap { next, remaining };
                }
            },
            Phase::Awaiting { progress, remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.fail(&mut events);
                } else {
                    self.phase = Phase::Awaiting { progress, remaining };
                }
            },
            Phase::RoundGap { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.extend_sequence();
                    self.light(Some(self.sequence[0]));
                    self.phase = Phase::Showing {
                        step: 0,
                        remaining: self.show_secs(),
                    };
                } else {
                    self.phase = Phase::RoundGap { remaining };
                }
            },
        }
        events
    }

    fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    fn is_over(&self) -> bool {
        self.over
    }

    fn result(&self) -> GameResult {
        GameResult {
            score: self.score,
            currency_earned: self.score.max(0) as u64 * self.config.coins_per_round,
            currency_spent: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_core::test_helpers::{
        contract_ends_without_input, contract_frozen_once_over, contract_init_then_update_runs,
        contract_metadata_sane, test_config,
    };

    fn game() -> MemorySequence {
        MemorySequence::with_config(SequenceConfig::default())
    }

    /// Step until the game is waiting for input.
    fn play_back(g: &mut MemorySequence) {
        for _ in 0..600 {
            if matches!(g.phase, Phase::Awaiting { .. }) {
                return;
            }
            let _ = g.update(0.016);
        }
        panic!("playback never finished");
    }

    fn tap_pad(g: &mut MemorySequence, pad: u32) {
        let c = g.pad_center(pad);
        g.pointer(c.x, c.y);
        g.handle(Intent::Attack);
        let _ = g.update(0.001);
    }

    #[test]
    fn satisfies_game_contracts() {
        contract_metadata_sane(&game(), GameId::Sequence);
        let mut g = game();
        contract_init_then_update_runs(&mut g);
        let mut g = game();
        contract_ends_without_input(&mut g, 10.0);
        contract_frozen_once_over(&mut g);
    }

    #[test]
    fn correct_taps_complete_the_round() {
        let mut g = game();
        g.init(&test_config(9));
        play_back(&mut g);
        let sequence = g.sequence().to_vec();
        assert_eq!(sequence.len(), 1);
        tap_pad(&mut g, sequence[0]);
        assert_eq!(g.result().score, 1);
        assert!(!g.is_over());
    }

    #[test]
    fn wrong_tap_ends_the_run() {
        let mut g = game();
        g.init(&test_config(9));
        play_back(&mut g);
        let right = g.sequence()[0];
        let wrong = (right + 1) % PADS;
        tap_pad(&mut g, wrong);
        assert!(g.is_over());
        assert_eq!(g.result().score, 0);
    }

    #[test]
    fn sequence_grows_each_round() {
        let mut g = game();
        g.init(&test_config(12));
        for round in 1..=3 {
            play_back(&mut g);
            let sequence = g.sequence().to_vec();
            assert_eq!(sequence.len(), round);
            for pad in sequence {
                tap_pad(&mut g, pad);
            }
            assert!(!g.is_over(), "correct round {round} must not end the run");
        }
        assert_eq!(g.result().score, 3);
    }

    #[test]
    fn playback_speeds_up_but_is_floored() {
        let mut g = game();
        g.init(&test_config(3));
        let first = g.show_secs();
        g.sequence = vec![0; 10];
        let later = g.show_secs();
        assert!(later < first);
        g.sequence = vec![0; 500];
        assert_eq!(g.show_secs(), g.config.min_show_secs);
    }

    #[test]
    fn taps_during_playback_are_ignored() {
        let mut g = game();
        g.init(&test_config(9));
        // Round starts; first pad is lit during playback.
        for _ in 0..5 {
            let _ = g.update(0.3);
            if matches!(g.phase, Phase::Showing { .. }) {
                break;
            }
        }
        tap_pad(&mut g, 0);
        tap_pad(&mut g, 3);
        assert!(!g.is_over());
    }
}

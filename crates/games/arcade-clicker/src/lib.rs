use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use arcade_core::entity::{Entity, EntityId, EntityKind, EntityRegistry, Shape, Vec2};
use arcade_core::game_trait::{
    ArcadeGame, GameConfig, GameEvent, GameId, GameMetadata, GameResult, ScoreOrdering,
};
use arcade_core::input::Intent;
use arcade_core::spawner::SpawnTimer;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickerConfig {
    pub field_width: f32,
    pub field_height: f32,
    pub target_radius: f32,
    /// Seconds a fresh target lives, round 1 difficulty.
    pub base_lifetime: f32,
    pub min_lifetime: f32,
    /// Lifetime lost per point of score.
    pub lifetime_k: f32,
    pub base_spawn_delay: f32,
    pub min_spawn_delay: f32,
    /// Spawn delay lost per point of score.
    pub spawn_k: f32,
    pub run_secs: f32,
    /// Score per coin at the end of the run.
    pub score_per_coin: i64,
}

impl Default for ClickerConfig {
    fn default() -> Self {
        Self {
            field_width: 800.0,
            field_height: 600.0,
            target_radius: 28.0,
            base_lifetime: 2.5,
            min_lifetime: 0.8,
            lifetime_k: 0.004,
            base_spawn_delay: 1.0,
            min_spawn_delay: 0.35,
            spawn_k: 0.002,
            run_secs: 45.0,
            score_per_coin: 30,
        }
    }
}

impl ClickerConfig {
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ARCADE_CLICKER_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/clicker.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }
}

/// Whack-a-mole clicker: targets pop up at random spots and shrink
/// their lifetime as the score climbs. A tap inside a target scores
/// `10 * combo`; letting one expire resets the combo.
pub struct TargetClicker {
    config: ClickerConfig,
    registry: EntityRegistry,
    rng: StdRng,
    spawn: SpawnTimer,
    /// Remaining lifetime per live target, registration order.
    lifetimes: Vec<(EntityId, f32)>,
    cursor: (f32, f32),
    pending_events: Vec<GameEvent>,
    combo: i64,
    score: i64,
    elapsed: f32,
    over: bool,
}

impl Default for TargetClicker {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetClicker {
    pub fn new() -> Self {
        Self::with_config(ClickerConfig::load())
    }

    pub fn with_config(config: ClickerConfig) -> Self {
        let spawn = SpawnTimer::new(
            config.base_spawn_delay,
            config.min_spawn_delay,
            config.spawn_k,
        );
        Self {
            config,
            registry: EntityRegistry::new(),
            rng: StdRng::seed_from_u64(0),
            spawn,
            lifetimes: Vec::new(),
            cursor: (0.0, 0.0),
            pending_events: Vec::new(),
            combo: 0,
            score: 0,
            elapsed: 0.0,
            over: false,
        }
    }

    pub fn combo(&self) -> i64 {
        self.combo
    }

    fn lifetime_now(&self) -> f32 {
        (self.config.base_lifetime - self.config.lifetime_k * self.score as f32)
            .max(self.config.min_lifetime)
    }

    fn spawn_target(&mut self) {
        let r = self.config.target_radius;
        let x = self.rng.random_range(r..self.config.field_width - r);
        let y = self.rng.random_range(r..self.config.field_height - r);
        let id = self.registry.add(Entity::new(
            EntityKind::Target,
            Vec2::new(x, y),
            Shape::Circle { radius: r },
        ));
        self.lifetimes.push((id, self.lifetime_now()));
    }

    fn tap(&mut self) {
        let (x, y) = self.cursor;
        let tap = Vec2::new(x, y);
        let hit = self
            .registry
            .of_kind(EntityKind::Target)
            .find(|t| {
                let Shape::Circle { radius } = t.shape else {
                    return false;
                };
                t.pos.distance(&tap) < radius
            })
            .map(|t| t.id);
        let Some(id) = hit else {
            return;
        };
        let _ = self.registry.remove(id);
        self.lifetimes.retain(|(t, _)| *t != id);
        self.combo += 1;
        self.score += 10 * self.combo;
        self.pending_events.push(GameEvent::EntityRemoved { id });
        self.pending_events.push(GameEvent::ScoreChanged { score: self.score });
    }
}

impl ArcadeGame for TargetClicker {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            id: GameId::Clicker,
            name: "Token Tap".to_string(),
            ordering: ScoreOrdering::HigherIsBetter,
            tick_hz: 60.0,
        }
    }

    fn init(&mut self, config: &GameConfig) {
        self.rng = StdRng::seed_from_u64(config.seed);
        self.spawn_target();
    }

    fn handle(&mut self, intent: Intent) {
        if self.over || intent != Intent::Attack {
            return;
        }
        self.tap();
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
        self.elapsed += dt;

        // Expire old targets; any expiry resets the combo.
        let mut expired = Vec::new();
        for (id, remaining) in &mut self.lifetimes {
            *remaining -= dt;
            if *remaining <= 0.0 {
                expired.push(*id);
            }
        }
        for id in expired {
            let _ = self.registry.remove(id);
            self.lifetimes.retain(|(t, _)| *t != id);
            self.combo = 0;
            events.push(GameEvent::EntityRemoved { id });
        }

        for _ in 0..self.spawn.tick(dt, self.score as f32) {
            self.spawn_target();
        }

        if self.elapsed >= self.config.run_secs {
            self.over = true;
            let earned = self.result().currency_earned;
            if earned > 0 {
                events.push(GameEvent::CurrencyEarned { amount: earned });
            }
            events.push(GameEvent::GameOver);
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
            // Divisor clamped: a config file may set it to zero.
            currency_earned: (self.score / self.config.score_per_coin.max(1)).max(0) as u64,
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

    fn game() -> TargetClicker {
        TargetClicker::with_config(ClickerConfig::default())
    }

    fn tap_first_target(g: &mut TargetClicker) {
        let pos = g
            .registry()
            .of_kind(EntityKind::Target)
            .next()
            .expect("a target must be live")
            .pos;
        g.pointer(pos.x, pos.y);
        g.handle(Intent::Attack);
        let _ = g.update(0.001);
    }

    #[test]
    fn satisfies_game_contracts() {
        contract_metadata_sane(&game(), GameId::Clicker);
        let mut g = game();
        contract_init_then_update_runs(&mut g);
        let mut g = game();
        contract_ends_without_input(&mut g, 50.0);
        contract_frozen_once_over(&mut g);
    }

    #[test]
    fn hits_score_with_growing_combo() {
        let mut g = game();
        g.init(&test_config(4));
        tap_first_target(&mut g);
        assert_eq!(g.result().score, 10, "first hit is 10 * combo 1");
        let _ = g.update(0.1);
        tap_first_target(&mut g);
        assert_eq!(g.result().score, 30, "second hit adds 10 * combo 2");
        assert_eq!(g.combo(), 2);
    }

    #[test]
    fn missed_tap_does_not_score() {
        let mut g = game();
        g.init(&test_config(4));
        let pos = g.registry().of_kind(EntityKind::Target).next().unwrap().pos;
        g.pointer(pos.x + 200.0, pos.y);
        g.handle(Intent::Attack);
        let _ = g.update(0.001);
        assert_eq!(g.result().score, 0);
        assert_eq!(g.registry().count_of_kind(EntityKind::Target), 1);
    }

    #[test]
    fn expiry_removes_target_and_resets_combo() {
        let mut g = game();
        g.init(&test_config(4));
        tap_first_target(&mut g);
        assert_eq!(g.combo(), 1);
        // Wait out every live target's lifetime.
        for _ in 0..80 {
            let _ = g.update(0.05);
        }
        assert_eq!(g.combo(), 0, "an expired target must reset the combo");
    }

    #[test]
    fn lifetime_and_spawn_delay_shrink_with_score() {
        let mut g = game();
        g.init(&test_config(4));
        let fresh = g.lifetime_now();
        g.score = 300;
        assert!(g.lifetime_now() < fresh);
        g.score = 1_000_000;
        assert_eq!(g.lifetime_now(), g.config.min_lifetime);
        assert_eq!(
            g.spawn.delay_for(1_000_000.0),
            g.config.min_spawn_delay,
        );
    }

    #[test]
    fn zero_coin_divisor_is_tolerated() {
        let mut g = TargetClicker::with_config(ClickerConfig {
            score_per_coin: 0,
            ..ClickerConfig::default()
        });
        g.init(&test_config(4));
        g.score = 90;
        assert_eq!(g.result().currency_earned, 90, "divisor clamps to 1");
    }

    #[test]
    fn run_ends_at_time_cap_with_coins() {
        let mut g = game();
        g.init(&test_config(4));
        g.score = 90;
        for _ in 0..1000 {
            let _ = g.update(0.05);
        }
        assert!(g.is_over());
        assert!(g.result().currency_earned >= 3);
    }
}

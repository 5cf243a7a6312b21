use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use arcade_core::collision::{collide_pairs, overlaps};
use arcade_core::entity::{Entity, EntityKind, EntityRegistry, Shape, Vec2};
use arcade_core::game_trait::{
    ArcadeGame, GameConfig, GameEvent, GameId, GameMetadata, GameResult, ScoreOrdering,
};
use arcade_core::input::Intent;
use arcade_core::spawner::SpawnTimer;

/// Entity tag marking a rare (high-value) token.
const TAG_RARE: u32 = 1;

/// Data-driven configuration for the catcher game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatcherConfig {
    pub field_width: f32,
    pub field_height: f32,
    pub paddle_half_width: f32,
    /// Keyboard paddle speed (units/s); pointer control overrides it.
    pub paddle_speed: f32,
    /// Spawn delay starts here (seconds)...
    pub spawn_base_delay: f32,
    /// ...and never drops below this floor.
    pub spawn_min_delay: f32,
    /// Delay reduction per second of elapsed play.
    pub spawn_escalation: f32,
    /// Probability a spawn is an obstacle instead of a token.
    pub obstacle_chance: f64,
    /// Probability a token spawn is the rare, high-value kind.
    pub rare_chance: f64,
    pub token_value: i64,
    pub rare_value: i64,
    pub base_fall_speed: f32,
    /// Fall speed gained per second of elapsed play.
    pub fall_accel: f32,
    pub max_fall_speed: f32,
    pub lives: u32,
    /// Run length cap in seconds.
    pub run_secs: f32,
    /// Score per coin of end-of-run currency.
    pub score_per_coin: i64,
}

impl Default for CatcherConfig {
    fn default() -> Self {
        Self {
            field_width: 800.0,
            field_height: 600.0,
            paddle_half_width: 40.0,
            paddle_speed: 420.0,
            spawn_base_delay: 1.2,
            spawn_min_delay: 0.35,
            spawn_escalation: 0.014,
            obstacle_chance: 0.25,
            rare_chance: 0.125,
            token_value: 10,
            rare_value: 50,
            base_fall_speed: 120.0,
            fall_accel: 3.5,
            max_fall_speed: 340.0,
            lives: 3,
            run_secs: 60.0,
            score_per_coin: 50,
        }
    }
}

impl CatcherConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ARCADE_CATCHER_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/catcher.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }
}

/// The token catcher: move the paddle, catch tokens, dodge obstacles.
pub struct TokenCatcher {
    config: CatcherConfig,
    registry: EntityRegistry,
    rng: StdRng,
    spawner: SpawnTimer,
    paddle: Option<arcade_core::entity::EntityId>,
    elapsed: f32,
    score: i64,
    lives: u32,
    /// Keyboard steering direction for this frame: -1, 0, or 1.
    steer: f32,
    over: bool,
}

impl Default for TokenCatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCatcher {
    pub fn new() -> Self {
        Self::with_config(CatcherConfig::load())
    }

    pub fn with_config(config: CatcherConfig) -> Self {
        let spawner = SpawnTimer::new(
            config.spawn_base_delay,
            config.spawn_min_delay,
            config.spawn_escalation,
        );
        Self {
            config,
            registry: EntityRegistry::new(),
            rng: StdRng::seed_from_u64(0),
            spawner,
            paddle: None,
            elapsed: 0.0,
            score: 0,
            lives: 0,
            steer: 0.0,
            over: false,
        }
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    fn fall_speed(&self) -> f32 {
        (self.config.base_fall_speed + self.config.fall_accel * self.elapsed)
            .min(self.config.max_fall_speed)
    }

    fn spawn_item(&mut self) {
        let x = self
            .rng
            .random_range(20.0..self.config.field_width - 20.0);
        let vel = Vec2::new(0.0, self.fall_speed());
        if self.rng.random_bool(self.config.obstacle_chance) {
            let _ = self.registry.add(
                Entity::new(
                    EntityKind::Obstacle,
                    Vec2::new(x, -10.0),
                    Shape::Box {
                        half_w: 12.0,
                        half_h: 12.0,
                    },
                )
                .with_vel(vel),
            );
        } else {
            let rare = self.rng.random_bool(self.config.rare_chance);
            let _ = self.registry.add(
                Entity::new(
                    EntityKind::Token,
                    Vec2::new(x, -10.0),
                    Shape::Circle { radius: 9.0 },
                )
                .with_vel(vel)
                .with_tag(if rare { TAG_RARE } else { 0 }),
            );
        }
    }

    fn move_paddle(&mut self, dt: f32) {
        let Some(paddle) = self.paddle else { return };
        let steer = self.steer;
        let speed = self.config.paddle_speed;
        let half = self.config.paddle_half_width;
        let width = self.config.field_width;
        let _ = self.registry.update(paddle, |p| {
            p.pos.x = (p.pos.x + steer * speed * dt).clamp(half, width - half);
        });
        self.steer = 0.0;
    }
}

impl ArcadeGame for TokenCatcher {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            id: GameId::Catcher,
            name: "Token Catcher".to_string(),
            ordering: ScoreOrdering::HigherIsBetter,
            tick_hz: 60.0,
        }
    }

    fn init(&mut self, config: &GameConfig) {
        self.rng = StdRng::seed_from_u64(config.seed);
        self.lives = self.config.lives;
        let paddle = self.registry.add(Entity::new(
            EntityKind::Player,
            Vec2::new(
                self.config.field_width / 2.0,
                self.config.field_height - 20.0,
            ),
            Shape::Box {
                half_w: self.config.paddle_half_width,
                half_h: 8.0,
            },
        ));
        self.paddle = Some(paddle);
    }

    fn handle(&mut self, intent: Intent) {
        if self.over {
            return;
        }
        match intent {
            Intent::MoveLeft => self.steer = -1.0,
            Intent::MoveRight => self.steer = 1.0,
            _ => {},
        }
    }

    fn pointer(&mut self, x: f32, _y: f32) {
        if self.over {
            return;
        }
        let Some(paddle) = self.paddle else { return };
        let half = self.config.paddle_half_width;
        let width = self.config.field_width;
        let _ = self.registry.update(paddle, |p| {
            p.pos.x = x.clamp(half, width - half);
        });
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.over {
            return Vec::new();
        }
        let mut events = Vec::new();
        self.elapsed += dt;

        // Movement.
        self.move_paddle(dt);
        for e in self.registry.all_mut() {
            e.pos.y += e.vel.y * dt;
        }

        // Spawning, escalating with elapsed time.
        for _ in 0..self.spawner.tick(dt, self.elapsed) {
            self.spawn_item();
        }

        // Missed items leave the field.
        let floor = self.config.field_height + 15.0;
        let gone: Vec<_> = self
            .registry
            .all()
            .filter(|e| e.kind != EntityKind::Player && e.pos.y > floor)
            .map(|e| e.id)
            .collect();
        for id in gone {
            let _ = self.registry.remove(id);
            events.push(GameEvent::EntityRemoved { id });
        }

        // Catches. Tokens shrink slightly at the edges so grazes miss.
        let caught = collide_pairs(
            &self.registry,
            EntityKind::Player,
            EntityKind::Token,
            |paddle, token| overlaps(paddle, token, 0.0, 2.0),
        );
        for (_, token) in caught {
            let rare = self
                .registry
                .get(token)
                .is_some_and(|t| t.attrs.tag == TAG_RARE);
            let _ = self.registry.remove(token);
            self.score += if rare {
                self.config.rare_value
            } else {
                self.config.token_value
            };
            events.push(GameEvent::EntityRemoved { id: token });
            events.push(GameEvent::ScoreChanged { score: self.score });
        }

        // Obstacle hits cost a life.
        let hits = collide_pairs(
            &self.registry,
            EntityKind::Player,
            EntityKind::Obstacle,
            |paddle, obstacle| overlaps(paddle, obstacle, 0.0, 0.0),
        );
        for (_, obstacle) in hits {
            let _ = self.registry.remove(obstacle);
            events.push(GameEvent::EntityRemoved { id: obstacle });
            self.lives = self.lives.saturating_sub(1);
        }

        if self.lives == 0 || self.elapsed >= self.config.run_secs {
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
        contract_frozen_once_over, contract_init_then_update_runs, contract_metadata_sane,
        drive_until_over, test_config,
    };

    fn game() -> TokenCatcher {
        TokenCatcher::with_config(CatcherConfig::default())
    }

    #[test]
    fn satisfies_game_contracts() {
        contract_metadata_sane(&game(), GameId::Catcher);
        let mut g = game();
        contract_init_then_update_runs(&mut g);
        let mut g = game();
        g.init(&test_config(42));
        assert!(drive_until_over(&mut g, 70.0, 0.05), "run cap must end it");
        contract_frozen_once_over(&mut g);
    }

    #[test]
    fn pointer_clamps_paddle_to_field() {
        let mut g = game();
        g.init(&test_config(1));
        g.pointer(-500.0, 0.0);
        let paddle = g.registry().of_kind(EntityKind::Player).next().unwrap();
        assert_eq!(paddle.pos.x, g.config.paddle_half_width);
        g.pointer(5000.0, 0.0);
        let paddle = g.registry().of_kind(EntityKind::Player).next().unwrap();
        assert_eq!(
            paddle.pos.x,
            g.config.field_width - g.config.paddle_half_width
        );
    }

    #[test]
    fn catching_a_token_scores_and_removes_it() {
        let mut g = game();
        g.init(&test_config(1));
        let paddle_pos = {
            let p = g.registry().of_kind(EntityKind::Player).next().unwrap();
            p.pos
        };
        let token = g.registry.add(
            Entity::new(
                EntityKind::Token,
                Vec2::new(paddle_pos.x, paddle_pos.y - 2.0),
                Shape::Circle { radius: 9.0 },
            )
            .with_vel(Vec2::new(0.0, 10.0)),
        );
        let events = g.update(0.016);
        assert!(events.contains(&GameEvent::EntityRemoved { id: token }));
        assert_eq!(g.result().score, g.config.token_value);
        assert!(!g.registry().contains(token));
    }

    #[test]
    fn rare_token_is_worth_more() {
        let mut g = game();
        g.init(&test_config(1));
        let paddle_pos = {
            let p = g.registry().of_kind(EntityKind::Player).next().unwrap();
            p.pos
        };
        let _ = g.registry.add(
            Entity::new(
                EntityKind::Token,
                Vec2::new(paddle_pos.x, paddle_pos.y),
                Shape::Circle { radius: 9.0 },
            )
            .with_tag(TAG_RARE),
        );
        let _ = g.update(0.016);
        assert_eq!(g.result().score, g.config.rare_value);
    }

    #[test]
    fn three_obstacle_hits_end_the_run() {
        let mut g = game();
        g.init(&test_config(1));
        for _ in 0..3 {
            let paddle_pos = {
                let p = g.registry().of_kind(EntityKind::Player).next().unwrap();
                p.pos
            };
            let _ = g.registry.add(Entity::new(
                EntityKind::Obstacle,
                Vec2::new(paddle_pos.x, paddle_pos.y),
                Shape::Box {
                    half_w: 12.0,
                    half_h: 12.0,
                },
            ));
            let _ = g.update(0.016);
        }
        assert_eq!(g.lives(), 0);
        assert!(g.is_over());
    }

    #[test]
    fn missed_tokens_despawn_without_scoring() {
        let mut g = game();
        g.init(&test_config(1));
        let token = g.registry.add(
            Entity::new(
                EntityKind::Token,
                Vec2::new(100.0, g.config.field_height + 20.0),
                Shape::Circle { radius: 9.0 },
            )
            .with_vel(Vec2::new(0.0, 100.0)),
        );
        let events = g.update(0.016);
        assert!(events.contains(&GameEvent::EntityRemoved { id: token }));
        assert_eq!(g.result().score, 0);
    }

    #[test]
    fn zero_coin_divisor_is_tolerated() {
        let mut g = TokenCatcher::with_config(CatcherConfig {
            score_per_coin: 0,
            ..CatcherConfig::default()
        });
        g.init(&test_config(1));
        g.score = 120;
        assert_eq!(g.result().currency_earned, 120, "divisor clamps to 1");
    }

    #[test]
    fn spawn_rate_grows_but_is_floored() {
        let cfg = CatcherConfig::default();
        let timer = SpawnTimer::new(
            cfg.spawn_base_delay,
            cfg.spawn_min_delay,
            cfg.spawn_escalation,
        );
        assert!(timer.delay_for(30.0) < timer.delay_for(0.0));
        assert!(timer.delay_for(10_000.0) >= cfg.spawn_min_delay);
    }
}

pub mod collision;
pub mod entity;
pub mod game_trait;
pub mod input;
pub mod persistence;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod spawner;
pub mod ui;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::collections::HashMap;

    use crate::entity::{Entity, EntityKind, EntityRegistry, Shape, Vec2};
    use crate::game_trait::{
        ArcadeGame, GameConfig, GameEvent, GameId, GameMetadata, GameResult, ScoreOrdering,
    };
    use crate::input::Intent;

    /// A deterministic GameConfig with the given seed and no economy.
    pub fn test_config(seed: u64) -> GameConfig {
        GameConfig {
            seed,
            currency: 0,
            upgrades: HashMap::new(),
            custom: HashMap::new(),
        }
    }

    /// A config with a starting balance, for games that spend in-run.
    pub fn funded_config(seed: u64, currency: u64) -> GameConfig {
        GameConfig {
            currency,
            ..test_config(seed)
        }
    }

    /// Run `n` frames of `dt` seconds with no input, returning every
    /// event emitted.
    pub fn run_ticks(game: &mut dyn ArcadeGame, n: usize, dt: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..n {
            events.extend(game.update(dt));
        }
        events
    }

    /// Step the game until it reports over or `max_secs` of simulated
    /// time elapse. Returns whether it ended.
    pub fn drive_until_over(game: &mut dyn ArcadeGame, max_secs: f32, dt: f32) -> bool {
        let mut elapsed = 0.0;
        while elapsed < max_secs {
            if game.is_over() {
                return true;
            }
            let _ = game.update(dt);
            elapsed += dt;
        }
        game.is_over()
    }

    // ================================================================
    // Game trait contract tests
    // ================================================================
    // A generic suite every ArcadeGame implementation must pass. Game
    // crates call these from their own #[cfg(test)] modules.

    /// Metadata must be self-consistent and the tick rate positive.
    pub fn contract_metadata_sane(game: &dyn ArcadeGame, expected_id: GameId) {
        let meta = game.metadata();
        assert_eq!(meta.id, expected_id);
        assert!(!meta.name.is_empty(), "game must have a display name");
        assert!(meta.tick_hz > 0.0, "tick rate hint must be positive");
    }

    /// After init, the game must not already be over and must survive a
    /// burst of no-input frames.
    pub fn contract_init_then_update_runs(game: &mut dyn ArcadeGame) {
        game.init(&test_config(42));
        assert!(!game.is_over(), "game must not be over right after init");
        let _ = run_ticks(game, 30, 0.016);
        let result = game.result();
        assert!(result.score >= 0, "partial score must never be negative");
    }

    /// Left to run with no input, the game must end within `max_secs`.
    /// Only called for games whose rules guarantee an unattended end.
    pub fn contract_ends_without_input(game: &mut dyn ArcadeGame, max_secs: f32) {
        game.init(&test_config(42));
        assert!(
            drive_until_over(game, max_secs, 0.05),
            "game must end without input within {max_secs} seconds"
        );
    }

    /// Once over, the game must be inert: updates return no events and
    /// neither result nor entity set changes, regardless of input.
    /// Requires `game.is_over()` already true.
    pub fn contract_frozen_once_over(game: &mut dyn ArcadeGame) {
        assert!(game.is_over(), "contract requires an ended game");
        let result = game.result();
        let entities = game.registry().len();
        game.handle(Intent::Attack);
        game.handle(Intent::MoveLeft);
        game.pointer(10.0, 10.0);
        for _ in 0..10 {
            assert!(
                game.update(0.1).is_empty(),
                "updates after game over must emit nothing"
            );
        }
        assert_eq!(game.result(), result, "result frozen after game over");
        assert_eq!(game.registry().len(), entities, "entities frozen after game over");
    }

    /// Scriptable stand-in game for session-layer tests: lives a fixed
    /// number of seconds, scores one point per frame, and reports a
    /// configurable economy delta.
    pub struct ScriptedGame {
        lifetime: f32,
        elapsed: f32,
        per_tick: i64,
        earn: u64,
        spend: u64,
        score: i64,
        over: bool,
        registry: EntityRegistry,
    }

    impl ScriptedGame {
        pub fn new(lifetime: f32) -> Self {
            Self {
                lifetime,
                elapsed: 0.0,
                per_tick: 1,
                earn: 0,
                spend: 0,
                score: 0,
                over: false,
                registry: EntityRegistry::new(),
            }
        }

        pub fn scoring_per_tick(mut self, per_tick: i64) -> Self {
            self.per_tick = per_tick;
            self
        }

        pub fn with_economy(mut self, earn: u64, spend: u64) -> Self {
            self.earn = earn;
            self.spend = spend;
            self
        }
    }

    impl ArcadeGame for ScriptedGame {
        fn metadata(&self) -> GameMetadata {
            GameMetadata {
                id: GameId::Clicker,
                name: "Scripted".to_string(),
                ordering: ScoreOrdering::HigherIsBetter,
                tick_hz: 60.0,
            }
        }

        fn init(&mut self, _config: &GameConfig) {
            for i in 0..3 {
                let _ = self.registry.add(Entity::new(
                    EntityKind::Token,
                    Vec2::new(i as f32 * 10.0, 0.0),
                    Shape::Circle { radius: 4.0 },
                ));
            }
        }

        fn handle(&mut self, _intent: Intent) {}

        fn pointer(&mut self, _x: f32, _y: f32) {}

        fn update(&mut self, dt: f32) -> Vec<GameEvent> {
            if self.over {
                return Vec::new();
            }
            self.elapsed += dt;
            self.score += self.per_tick;
            let mut events = vec![GameEvent::ScoreChanged { score: self.score }];
            if self.elapsed >= self.lifetime {
                self.over = true;
                if self.spend > 0 {
                    events.push(GameEvent::CurrencySpent { amount: self.spend });
                }
                if self.earn > 0 {
                    events.push(GameEvent::CurrencyEarned { amount: self.earn });
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
                currency_earned: self.earn,
                currency_spent: self.spend,
            }
        }
    }
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use arcade_core::collision::overlaps;
use arcade_core::entity::{Entity, EntityId, EntityKind, EntityRegistry, Shape, Vec2};
use arcade_core::game_trait::{
    ArcadeGame, GameConfig, GameEvent, GameId, GameMetadata, GameResult, ScoreOrdering,
};
use arcade_core::input::Intent;
use arcade_core::spawner::SpawnTimer;

/// Lane count is fixed; lane index is the entity tag.
const LANES: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RacerConfig {
    pub field_width: f32,
    pub field_height: f32,
    /// Player's fixed y near the bottom of the field.
    pub player_y: f32,
    pub base_speed: f32,
    pub max_speed: f32,
    /// Speed gained per unit of distance travelled.
    pub accel_k: f32,
    pub base_spawn_delay: f32,
    pub min_spawn_delay: f32,
    /// Spawn delay lost per unit of speed.
    pub spawn_k: f32,
    /// Seconds a jump clears obstacles.
    pub jump_secs: f32,
    /// Hitbox shrink applied to both sides before a fatal collision.
    pub collision_margin: f32,
    pub distance_per_coin: f32,
}

impl Default for RacerConfig {
    fn default() -> Self {
        Self {
            field_width: 600.0,
            field_height: 600.0,
            player_y: 520.0,
            base_speed: 200.0,
            max_speed: 620.0,
            accel_k: 0.04,
            base_spawn_delay: 1.4,
            min_spawn_delay: 0.45,
            spawn_k: 0.002,
            jump_secs: 0.5,
            collision_margin: 4.0,
            distance_per_coin: 400.0,
        }
    }
}

impl RacerConfig {
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ARCADE_RACER_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/racer.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }
}

/// Endless lane racer. The world scrolls past the player at a speed
/// that grows with distance; obstacles occupy lanes and end the run on
/// contact unless the player is mid-jump. Score is distance travelled.
pub struct LaneRacer {
    config: RacerConfig,
    registry: EntityRegistry,
    rng: StdRng,
    spawn: SpawnTimer,
    player: EntityId,
    lane: u32,
    airborne_left: f32,
    distance: f32,
    pending_events: Vec<GameEvent>,
    over: bool,
}

impl Default for LaneRacer {
    fn default() -> Self {
        Self::new()
    }
}

impl LaneRacer {
    pub fn new() -> Self {
        Self::with_config(RacerConfig::load())
    }

    pub fn with_config(config: RacerConfig) -> Self {
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
            player: EntityId(0),
            lane: 1,
            airborne_left: 0.0,
            distance: 0.0,
            pending_events: Vec::new(),
            over: false,
        }
    }

    pub fn lane(&self) -> u32 {
        self.lane
    }

    pub fn speed(&self) -> f32 {
        (self.config.base_speed + self.config.accel_k * self.distance).min(self.config.max_speed)
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne_left > 0.0
    }

    fn lane_x(&self, lane: u32) -> f32 {
        let lane_w = self.config.field_width / LANES as f32;
        (lane as f32 + 0.5) * lane_w
    }

    fn switch_lane(&mut self, delta: i32) {
        let lane = self.lane as i32 + delta;
        if !(0..LANES as i32).contains(&lane) {
            return;
        }
        self.lane = lane as u32;
        let x = self.lane_x(self.lane);
        let lane_tag = self.lane;
        let _ = self.registry.update(self.player, |p| {
            p.pos.x = x;
            p.attrs.tag = lane_tag;
        });
    }

    fn spawn_obstacle(&mut self) {
        let lane = self.rng.random_range(0..LANES);
        let _ = self.registry.add(
            Entity::new(
                EntityKind::Obstacle,
                Vec2::new(self.lane_x(lane), -30.0),
                Shape::Box {
                    half_w: 26.0,
                    half_h: 18.0,
                },
            )
            .with_tag(lane),
        );
    }
}

impl ArcadeGame for LaneRacer {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            id: GameId::Racer,
            name: "Token Run".to_string(),
            ordering: ScoreOrdering::HigherIsBetter,
            tick_hz: 60.0,
        }
    }

    fn init(&mut self, config: &GameConfig) {
        self.rng = StdRng::seed_from_u64(config.seed);
        self.player = self.registry.add(
            Entity::new(
                EntityKind::Player,
                Vec2::new(self.lane_x(self.lane), self.config.player_y),
                Shape::Box {
                    half_w: 22.0,
                    half_h: 30.0,
                },
            )
            .with_tag(self.lane),
        );
    }

    fn handle(&mut self, intent: Intent) {
        if self.over {
            return;
        }
        match intent {
            Intent::MoveLeft => self.switch_lane(-1),
            Intent::MoveRight => self.switch_lane(1),
            Intent::Jump => self.airborne_left = self.config.jump_secs,
            _ => {},
        }
    }

    fn pointer(&mut self, _x: f32, _y: f32) {}

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.over {
            return Vec::new();
        }
        let mut events = std::mem::take(&mut self.pending_events);
        let speed = self.speed();
        self.distance += speed * dt;
        self.airborne_left = (self.airborne_left - dt).max(0.0);

        // The world scrolls down past the player.
        for e in self.registry.all_mut() {
            if e.kind == EntityKind::Obstacle {
                e.pos.y += speed * dt;
            }
        }

        // Obstacles gone off the bottom are cleared.
        let bottom = self.config.field_height + 40.0;
        for id in self.registry.ids_of_kind(EntityKind::Obstacle) {
            if self.registry.get(id).is_some_and(|e| e.pos.y > bottom) {
                let _ = self.registry.remove(id);
                events.push(GameEvent::EntityRemoved { id });
            }
        }

        for _ in 0..self.spawn.tick(dt, speed) {
            self.spawn_obstacle();
        }

        events.push(GameEvent::ScoreChanged {
            score: self.distance as i64,
        });

        if !self.is_airborne() {
            let margin = self.config.collision_margin;
            let crashed = self.registry.get(self.player).is_some_and(|p| {
                self.registry
                    .of_kind(EntityKind::Obstacle)
                    .any(|o| o.attrs.tag == p.attrs.tag && overlaps(p, o, margin, margin))
            });
            if crashed {
                self.over = true;
                let earned = self.result().currency_earned;
                if earned > 0 {
                    events.push(GameEvent::CurrencyEarned { amount: earned });
                }
                events.push(GameEvent::GameOver);
            }
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
            score: self.distance as i64,
            // Divisor clamped: a config file may set it to zero.
            currency_earned: (self.distance / self.config.distance_per_coin.max(1.0)) as u64,
            currency_spent: 0,
        }
    }
}

use serde::{Deserialize, Serialize};

use arcade_core::entity::{Entity, EntityId, EntityKind, EntityRegistry, Shape, Vec2};
use arcade_core::game_trait::{
    ArcadeGame, GameConfig, GameEvent, GameId, GameMetadata, GameResult, ScoreOrdering,
};
use arcade_core::input::Intent;
use arcade_core::scheduler::{Cooldown, IntervalTimer};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FighterConfig {
    pub field_width: f32,
    pub floor_y: f32,
    pub player_hp: i32,
    pub player_damage: i32,
    pub player_speed: f32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    /// Special attack multiplies player damage by three.
    pub special_cooldown: f32,
    /// AI decisions run on this cadence.
    pub ai_period: f32,
    pub enemy_base_hp: i32,
    pub enemy_hp_per_wave: i32,
    pub enemy_damage: i32,
    pub enemy_speed: f32,
    /// Gold for a kill: `base + wave * per_wave`.
    pub reward_base: u64,
    pub reward_per_wave: u64,
    /// Seconds a Block press dampens incoming hits.
    pub block_window: f32,
    /// Seconds a dodge (Jump) negates incoming hits entirely.
    pub dodge_window: f32,
    /// Pause between a kill and the next opponent.
    pub wave_gap: f32,
    pub score_per_kill: i64,
}

impl Default for FighterConfig {
    fn default() -> Self {
        Self {
            field_width: 800.0,
            floor_y: 500.0,
            player_hp: 100,
            player_damage: 12,
            player_speed: 220.0,
            attack_range: 70.0,
            attack_cooldown: 0.4,
            special_cooldown: 6.0,
            ai_period: 0.5,
            enemy_base_hp: 40,
            enemy_hp_per_wave: 15,
            enemy_damage: 10,
            enemy_speed: 120.0,
            reward_base: 10,
            reward_per_wave: 5,
            block_window: 0.6,
            dodge_window: 0.25,
            wave_gap: 1.5,
            score_per_kill: 100,
        }
    }
}

impl FighterConfig {
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ARCADE_FIGHTER_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/fighter.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }
}

/// One opponent per wave. The AI closes distance while out of attack
/// range and swings while inside it; blocking takes hits at 20% damage
/// and a well-timed dodge at none. Each kill brings a tougher opponent.
pub struct WaveFighter {
    config: FighterConfig,
    registry: EntityRegistry,
    player: EntityId,
    enemy: Option<EntityId>,
    wave: u32,
    ai: IntervalTimer,
    attack: Cooldown,
    special: Cooldown,
    block_left: f32,
    dodge_left: f32,
    /// Countdown to the next opponent; None while one is alive.
    next_wave_in: Option<f32>,
    move_dir: f32,
    pending_events: Vec<GameEvent>,
    kills: u32,
    gold: u64,
    over: bool,
}

impl Default for WaveFighter {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveFighter {
    pub fn new() -> Self {
        Self::with_config(FighterConfig::load())
    }

    pub fn with_config(config: FighterConfig) -> Self {
        let ai = IntervalTimer::new(config.ai_period);
        Self {
            config,
            registry: EntityRegistry::new(),
            player: EntityId(0),
            enemy: None,
            wave: 0,
            ai,
            attack: Cooldown::ready_now(),
            special: Cooldown::ready_now(),
            block_left: 0.0,
            dodge_left: 0.0,
            next_wave_in: Some(0.0),
            move_dir: 0.0,
            pending_events: Vec::new(),
            kills: 0,
            gold: 0,
            over: false,
        }
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn player_hp(&self) -> i32 {
        self.registry.get(self.player).map_or(0, |p| p.attrs.hp)
    }

    fn enemy_hp_for(&self, wave: u32) -> i32 {
        self.config.enemy_base_hp + wave as i32 * self.config.enemy_hp_per_wave
    }

    fn kill_reward(&self, wave: u32) -> u64 {
        self.config.reward_base + u64::from(wave) * self.config.reward_per_wave
    }

    fn spawn_opponent(&mut self) {
        self.wave += 1;
        let hp = self.enemy_hp_for(self.wave);
        let x = if self.player_x() < self.config.field_width / 2.0 {
            self.config.field_width - 60.0
        } else {
            60.0
        };
        let id = self.registry.add(
            Entity::new(
                EntityKind::Enemy,
                Vec2::new(x, self.config.floor_y),
                Shape::Box {
                    half_w: 18.0,
                    half_h: 40.0,
                },
            )
            .with_hp(hp)
            .with_damage(self.config.enemy_damage),
        );
        self.enemy = Some(id);
        self.pending_events
            .push(GameEvent::WaveStarted { wave: self.wave });
    }

    fn player_x(&self) -> f32 {
        self.registry.get(self.player).map_or(0.0, |p| p.pos.x)
    }

    fn strike(&mut self, damage: i32) {
        let Some(enemy) = self.enemy else {
            return;
        };
        let in_range = self
            .registry
            .get(enemy)
            .is_some_and(|e| (e.pos.x - self.player_x()).abs() < self.config.attack_range);
        if !in_range {
            return;
        }
        let mut dead = false;
        let _ = self.registry.update(enemy, |e| {
            e.attrs.hp -= damage;
            dead = e.attrs.hp <= 0;
        });
        if dead {
            let _ = self.registry.remove(enemy);
            self.enemy = None;
            self.kills += 1;
            let reward = self.kill_reward(self.wave);
            self.gold += reward;
            self.next_wave_in = Some(self.config.wave_gap);
            self.pending_events.push(GameEvent::EntityRemoved { id: enemy });
            self.pending_events.push(GameEvent::ScoreChanged {
                score: self.score(),
            });
            self.pending_events
                .push(GameEvent::CurrencyEarned { amount: reward });
        }
    }

    /// Incoming damage multiplier from the current defensive stance.
    fn defense_multiplier(&self) -> f32 {
        if self.dodge_left > 0.0 {
            0.0
        } else if self.block_left > 0.0 {
            0.2
        } else {
            1.0
        }
    }

    fn enemy_swing(&mut self, events: &mut Vec<GameEvent>) {
        let Some(enemy) = self.enemy else {
            return;
        };
        let Some(e) = self.registry.get(enemy) else {
            return;
        };
        if (e.pos.x - self.player_x()).abs() >= self.config.attack_range {
            return;
        }
        let damage = (e.attrs.damage as f32 * self.defense_multiplier()) as i32;
        let mut dead = false;
        let _ = self.registry.update(self.player, |p| {
            p.attrs.hp -= damage;
            dead = p.attrs.hp <= 0;
        });
        if dead {
            // Kill rewards were already emitted as they happened;
            // re-emitting the total here would double the preview.
            self.over = true;
            events.push(GameEvent::GameOver);
        }
    }

    fn score(&self) -> i64 {
        i64::from(self.kills) * self.config.score_per_kill
    }
}

impl ArcadeGame for WaveFighter {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            id: GameId::Fighter,
            name: "Token Brawl".to_string(),
            ordering: ScoreOrdering::HigherIsBetter,
            tick_hz: 60.0,
        }
    }

    fn init(&mut self, _config: &GameConfig) {
        self.player = self.registry.add(
            Entity::new(
                EntityKind::Player,
                Vec2::new(self.config.field_width / 4.0, self.config.floor_y),
                Shape::Box {
                    half_w: 18.0,
                    half_h: 40.0,
                },
            )
            .with_hp(self.config.player_hp)
            .with_damage(self.config.player_damage),
        );
    }

    fn handle(&mut self, intent: Intent) {
        if self.over {
            return;
        }
        match intent {
            Intent::MoveLeft => self.move_dir = -1.0,
            Intent::MoveRight => self.move_dir = 1.0,
            Intent::Jump => self.dodge_left = self.config.dodge_window,
            Intent::Block => self.block_left = self.config.block_window,
            Intent::Attack => {
                if self.attack.is_ready() {
                    self.attack.trigger(self.config.attack_cooldown);
                    self.strike(self.config.player_damage);
                }
            },
            Intent::SpecialAttack => {
                if self.special.is_ready() {
                    self.special.trigger(self.config.special_cooldown);
                    self.strike(self.config.player_damage * 3);
                }
            },
        }
    }

    fn pointer(&mut self, _x: f32, _y: f32) {}

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.over {
            return Vec::new();
        }
        let mut events = std::mem::take(&mut self.pending_events);

        self.attack.tick(dt);
        self.special.tick(dt);
        self.block_left = (self.block_left - dt).max(0.0);
        self.dodge_left = (self.dodge_left - dt).max(0.0);

        // Player movement, one impulse per queued intent repeat.
        if self.move_dir != 0.0 {
            let step = self.move_dir * self.config.player_speed * dt;
            let width = self.config.field_width;
            let _ = self.registry.update(self.player, |p| {
                p.pos.x = (p.pos.x + step).clamp(20.0, width - 20.0);
            });
            self.move_dir = 0.0;
        }

        if let Some(remaining) = self.next_wave_in {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                self.next_wave_in = None;
                self.spawn_opponent();
                events.append(&mut self.pending_events);
            } else {
                self.next_wave_in = Some(remaining);
            }
        }

        // Enemy approach is continuous; decisions to swing run on the
        // slower AI cadence.
        let ai_fires = self.ai.tick(dt);
        if let Some(enemy) = self.enemy {
            let px = self.player_x();
            let range = self.config.attack_range;
            let step = self.config.enemy_speed * dt;
            let mut in_range = false;
            let _ = self.registry.update(enemy, |e| {
                let gap = px - e.pos.x;
                if gap.abs() >= range {
                    e.pos.x += step * gap.signum();
                } else {
                    in_range = true;
                }
            });
            if in_range {
                for _ in 0..ai_fires {
                    self.enemy_swing(&mut events);
                    if self.over {
                        break;
                    }
                }
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
            score: self.score(),
            currency_earned: self.gold,
            currency_spent: 0,
        }
    }
}

pub mod path;
pub mod towers;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use arcade_core::entity::{Entity, EntityId, EntityKind, EntityRegistry, Shape, Vec2};
use arcade_core::game_trait::{
    ArcadeGame, GameConfig, GameEvent, GameId, GameMetadata, GameResult, ScoreOrdering,
};
use arcade_core::input::Intent;
use arcade_core::scheduler::{Cooldown, IntervalTimer};
use arcade_core::scoring::Wallet;
use arcade_core::spawner::{WaveConfig, WaveDirector};

use crate::path::{cell_at, cell_center, generate_path, Cell};
use crate::towers::{select_target, TowerKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseConfig {
    pub cell_size: f32,
    pub starting_gold: u64,
    pub lives: u32,
    /// Gold for a kill: `base + wave * per_wave`.
    pub kill_gold_base: u64,
    pub kill_gold_per_wave: u64,
    pub score_per_kill: i64,
    pub score_per_wave: i64,
    /// Seconds between enemy path steps. Slowed enemies step at half
    /// this rate.
    pub move_period: f32,
    /// Meta-currency paid out per cleared wave at the end of the run.
    pub coins_per_wave: u64,
    pub waves: WaveConfig,
}

impl Default for DefenseConfig {
    fn default() -> Self {
        Self {
            cell_size: 100.0,
            starting_gold: 120,
            lives: 10,
            kill_gold_base: 8,
            kill_gold_per_wave: 2,
            score_per_kill: 10,
            score_per_wave: 50,
            move_period: 0.5,
            coins_per_wave: 5,
            waves: WaveConfig::default(),
        }
    }
}

impl DefenseConfig {
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ARCADE_DEFENSE_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/defense.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }
}

/// Tower defense on an 8x6 grid. Enemies march a seeded random-walk
/// path toward the treasury; towers placed on free cells auto-fire at
/// the nearest enemy strictly inside range. A leaked enemy costs a
/// life; ten leaks end the run.
pub struct TowerDefense {
    config: DefenseConfig,
    registry: EntityRegistry,
    path: Vec<Cell>,
    waypoints: Vec<Vec2>,
    director: WaveDirector,
    movement: IntervalTimer,
    move_steps: u64,
    /// Fire gates per tower, registration order.
    cooldowns: Vec<(EntityId, Cooldown)>,
    selected: TowerKind,
    gold: Wallet,
    lives: u32,
    kills: u32,
    waves_cleared: u32,
    cursor: (f32, f32),
    pending_events: Vec<GameEvent>,
    over: bool,
}

impl Default for TowerDefense {
    fn default() -> Self {
        Self::new()
    }
}

impl TowerDefense {
    pub fn new() -> Self {
        Self::with_config(DefenseConfig::load())
    }

    pub fn with_config(config: DefenseConfig) -> Self {
        let director = WaveDirector::new(config.waves.clone());
        let movement = IntervalTimer::new(config.move_period);
        Self {
            config,
            registry: EntityRegistry::new(),
            path: Vec::new(),
            waypoints: Vec::new(),
            director,
            movement,
            move_steps: 0,
            cooldowns: Vec::new(),
            selected: TowerKind::Fire,
            gold: Wallet::default(),
            lives: 0,
            kills: 0,
            waves_cleared: 0,
            cursor: (0.0, 0.0),
            pending_events: Vec::new(),
            over: false,
        }
    }

    pub fn gold(&self) -> u64 {
        self.gold.balance()
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn wave(&self) -> u32 {
        self.director.wave()
    }

    pub fn path(&self) -> &[Cell] {
        &self.path
    }

    pub fn selected_tower(&self) -> TowerKind {
        self.selected
    }

    fn kill_gold(&self, wave: u32) -> u64 {
        self.config.kill_gold_base + u64::from(wave) * self.config.kill_gold_per_wave
    }

    fn score(&self) -> i64 {
        i64::from(self.kills) * self.config.score_per_kill
            + i64::from(self.waves_cleared) * self.config.score_per_wave
    }

    fn tower_in(&self, cell: Cell) -> bool {
        let center = cell_center(cell, self.config.cell_size);
        self.registry
            .of_kind(EntityKind::Tower)
            .any(|t| t.pos == center)
    }

    /// Place the selected tower at the cursor cell. Refused without
    /// side effects when the cell is off-grid, on the path, occupied,
    /// or unaffordable.
    fn place_tower(&mut self) {
        let (x, y) = self.cursor;
        let Some(cell) = cell_at(x, y, self.config.cell_size) else {
            return;
        };
        if self.path.contains(&cell) || self.tower_in(cell) {
            return;
        }
        let stats = self.selected.stats();
        if !self.gold.spend(stats.cost) {
            return;
        }
        let half = self.config.cell_size / 2.0;
        let id = self.registry.add(
            Entity::new(
                EntityKind::Tower,
                cell_center(cell, self.config.cell_size),
                Shape::Box {
                    half_w: half,
                    half_h: half,
                },
            )
            .with_tag(self.selected.tag())
            .with_damage(stats.damage),
        );
        self.cooldowns.push((id, Cooldown::ready_now()));
    }

    fn spawn_enemy(&mut self) {
        let hp = self.director.enemy_hp(self.director.wave());
        let Some(&start) = self.waypoints.first() else {
            return;
        };
        let _ = self.registry.add(
            Entity::new(EntityKind::Enemy, start, Shape::Circle { radius: 14.0 }).with_hp(hp),
        );
    }

    fn step_enemies(&mut self, events: &mut Vec<GameEvent>) {
        self.move_steps += 1;
        // Slowed enemies only advance on even steps, halving their
        // effective speed.
        let slow_gate = self.move_steps % 2 == 0;
        for id in self.registry.ids_of_kind(EntityKind::Enemy) {
            let Some(enemy) = self.registry.get(id) else {
                continue;
            };
            if enemy.attrs.slow_remaining > 0.0 && !slow_gate {
                continue;
            }
            let next = enemy.path_index + 1;
            if next >= self.waypoints.len() {
                // Reached the treasury.
                let _ = self.registry.remove(id);
                self.director.enemy_gone();
                self.lives = self.lives.saturating_sub(1);
                events.push(GameEvent::EntityRemoved { id });
            } else {
                let pos = self.waypoints[next];
                let _ = self.registry.update(id, |e| {
                    e.path_index = next;
                    e.pos = pos;
                });
            }
        }
    }

    fn fire_towers(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        for i in 0..self.cooldowns.len() {
            self.cooldowns[i].1.tick(dt);
            if !self.cooldowns[i].1.is_ready() {
                continue;
            }
            let tower_id = self.cooldowns[i].0;
            let Some((kind, target)) = self.registry.get(tower_id).and_then(|tower| {
                let kind = TowerKind::from_tag(tower.attrs.tag)?;
                let target = select_target(
                    tower,
                    self.registry.of_kind(EntityKind::Enemy),
                    kind.stats().range,
                )?;
                Some((kind, target))
            }) else {
                continue;
            };
            let stats = kind.stats();
            self.cooldowns[i].1.trigger(stats.fire_secs);
            let mut dead = false;
            let _ = self.registry.update(target, |e| {
                e.attrs.hp -= stats.damage;
                if stats.slow_secs > 0.0 {
                    e.attrs.slow_remaining = stats.slow_secs;
                }
                dead = e.attrs.hp <= 0;
            });
            if dead {
                let _ = self.registry.remove(target);
                self.director.enemy_gone();
                self.kills += 1;
                self.gold.earn(self.kill_gold(self.director.wave()));
                events.push(GameEvent::EntityRemoved { id: target });
                events.push(GameEvent::ScoreChanged { score: self.score() });
            }
        }
    }
}

impl ArcadeGame for TowerDefense {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            id: GameId::Defense,
            name: "Token Keep".to_string(),
            ordering: ScoreOrdering::HigherIsBetter,
            tick_hz: 30.0,
        }
    }

    fn init(&mut self, config: &GameConfig) {
        let mut rng = StdRng::seed_from_u64(config.seed);
        self.path = generate_path(&mut rng);
        self.waypoints = self
            .path
            .iter()
            .map(|&cell| cell_center(cell, self.config.cell_size))
            .collect();
        self.gold = Wallet::new(self.config.starting_gold);
        self.lives = self.config.lives;
    }

    fn handle(&mut self, intent: Intent) {
        if self.over {
            return;
        }
        match intent {
            Intent::Attack => self.place_tower(),
            Intent::SpecialAttack => self.selected = self.selected.next(),
            _ => {},
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

        for _ in 0..self.movement.tick(dt) {
            self.step_enemies(&mut events);
        }
        for e in self.registry.all_mut() {
            if e.kind == EntityKind::Enemy {
                e.attrs.slow_remaining = (e.attrs.slow_remaining - dt).max(0.0);
            }
        }

        let tick = self.director.tick(dt);
        if let Some(wave) = tick.started {
            events.push(GameEvent::WaveStarted { wave });
        }
        for _ in 0..tick.spawns {
            self.spawn_enemy();
        }
        if let Some(reward) = tick.completed {
            self.gold.earn(reward.reward);
            self.waves_cleared += 1;
            events.push(GameEvent::ScoreChanged { score: self.score() });
        }

        self.fire_towers(dt, &mut events);

        if self.lives == 0 {
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
            score: self.score(),
            currency_earned: u64::from(self.waves_cleared) * self.config.coins_per_wave,
            currency_spent: 0,
        }
    }
}

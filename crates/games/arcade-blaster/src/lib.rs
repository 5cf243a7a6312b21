use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use arcade_core::collision::{collide_pairs, overlaps};
use arcade_core::entity::{Entity, EntityId, EntityKind, EntityRegistry, Shape, Vec2};
use arcade_core::game_trait::{
    ArcadeGame, GameConfig, GameEvent, GameId, GameMetadata, GameResult, ScoreOrdering,
};
use arcade_core::input::Intent;
use arcade_core::scheduler::Cooldown;
use arcade_core::spawner::{WaveConfig, WaveDirector};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlasterConfig {
    pub field_width: f32,
    pub field_height: f32,
    pub ship_y: f32,
    pub fire_cooldown: f32,
    pub projectile_speed: f32,
    pub projectile_damage: i32,
    pub enemy_speed: f32,
    pub lives: u32,
    pub score_per_kill: i64,
    pub waves: WaveConfig,
}

impl Default for BlasterConfig {
    fn default() -> Self {
        Self {
            field_width: 800.0,
            field_height: 600.0,
            ship_y: 560.0,
            fire_cooldown: 0.25,
            projectile_speed: 520.0,
            projectile_damage: 34,
            enemy_speed: 55.0,
            lives: 3,
            score_per_kill: 25,
            waves: WaveConfig {
                base_hp: 60,
                hp_per_wave: 12,
                ..WaveConfig::default()
            },
        }
    }
}

impl BlasterConfig {
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ARCADE_BLASTER_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/blaster.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }
}

/// Fixed shooter. The ship tracks the pointer along the bottom edge and
/// fires upward on a cooldown; enemies descend in waves and cost a life
/// when they slip past. Hits resolve in registration order, so the
/// oldest projectile claims a shared target.
pub struct WaveBlaster {
    config: BlasterConfig,
    registry: EntityRegistry,
    rng: StdRng,
    director: WaveDirector,
    ship: EntityId,
    fire: Cooldown,
    lives: u32,
    kills: u32,
    gold: u64,
    pending_events: Vec<GameEvent>,
    over: bool,
}

impl Default for WaveBlaster {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveBlaster {
    pub fn new() -> Self {
        Self::with_config(BlasterConfig::load())
    }

    pub fn with_config(config: BlasterConfig) -> Self {
        let director = WaveDirector::new(config.waves.clone());
        Self {
            config,
            registry: EntityRegistry::new(),
            rng: StdRng::seed_from_u64(0),
            director,
            ship: EntityId(0),
            fire: Cooldown::ready_now(),
            lives: 0,
            kills: 0,
            gold: 0,
            pending_events: Vec::new(),
            over: false,
        }
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn wave(&self) -> u32 {
        self.director.wave()
    }

    fn spawn_enemy(&mut self) {
        let hp = self.director.enemy_hp(self.director.wave());
        let x = self.rng.random_range(30.0..self.config.field_width - 30.0);
        let _ = self.registry.add(
            Entity::new(
                EntityKind::Enemy,
                Vec2::new(x, -20.0),
                Shape::Box {
                    half_w: 20.0,
                    half_h: 16.0,
                },
            )
            .with_vel(Vec2::new(0.0, self.config.enemy_speed))
            .with_hp(hp),
        );
    }

    fn fire_projectile(&mut self) {
        let Some(ship) = self.registry.get(self.ship) else {
            return;
        };
        let pos = Vec2::new(ship.pos.x, ship.pos.y - 20.0);
        let _ = self.registry.add(
            Entity::new(
                EntityKind::Projectile,
                pos,
                Shape::Box {
                    half_w: 3.0,
                    half_h: 10.0,
                },
            )
            .with_vel(Vec2::new(0.0, -self.config.projectile_speed))
            .with_damage(self.config.projectile_damage),
        );
    }

    fn lose_life(&mut self, events: &mut Vec<GameEvent>) {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            // Wave rewards were already emitted as they were paid;
            // re-emitting the total here would double the preview.
            self.over = true;
            events.push(GameEvent::GameOver);
        }
    }
}

impl ArcadeGame for WaveBlaster {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            id: GameId::Blaster,
            name: "Token Blast".to_string(),
            ordering: ScoreOrdering::HigherIsBetter,
            tick_hz: 60.0,
        }
    }

    fn init(&mut self, config: &GameConfig) {
        self.rng = StdRng::seed_from_u64(config.seed);
        self.lives = self.config.lives;
        self.ship = self.registry.add(Entity::new(
            EntityKind::Player,
            Vec2::new(self.config.field_width / 2.0, self.config.ship_y),
            Shape::Box {
                half_w: 20.0,
                half_h: 14.0,
            },
        ));
    }

    fn handle(&mut self, intent: Intent) {
        if self.over || intent != Intent::Attack {
            return;
        }
        if self.fire.is_ready() {
            self.fire.trigger(self.config.fire_cooldown);
            self.fire_projectile();
        }
    }

    fn pointer(&mut self, x: f32, _y: f32) {
        if self.over {
            return;
        }
        let clamped = x.clamp(20.0, self.config.field_width - 20.0);
        let _ = self.registry.update(self.ship, |ship| {
            ship.pos.x = clamped;
        });
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.over {
            return Vec::new();
        }
        let mut events = std::mem::take(&mut self.pending_events);
        self.fire.tick(dt);

        // Movement first, then spawning, then combat resolution.
        for e in self.registry.all_mut() {
            e.pos.x += e.vel.x * dt;
            e.pos.y += e.vel.y * dt;
        }

        let tick = self.director.tick(dt);
        if let Some(wave) = tick.started {
            events.push(GameEvent::WaveStarted { wave });
        }
        for _ in 0..tick.spawns {
            self.spawn_enemy();
        }
        if let Some(reward) = tick.completed {
            self.gold += reward.reward;
            events.push(GameEvent::CurrencyEarned {
                amount: reward.reward,
            });
        }

        // Spent projectiles vanish off the top.
        for id in self.registry.ids_of_kind(EntityKind::Projectile) {
            if self.registry.get(id).is_some_and(|p| p.pos.y < -20.0) {
                let _ = self.registry.remove(id);
            }
        }

        // Each projectile lands on at most one enemy; registration order
        // decides who claims a shared target.
        let hits = collide_pairs(
            &self.registry,
            EntityKind::Enemy,
            EntityKind::Projectile,
            |enemy, shot| overlaps(enemy, shot, 0.0, 0.0),
        );
        for (enemy, shot) in hits {
            let damage = self.registry.get(shot).map_or(0, |s| s.attrs.damage);
            let _ = self.registry.remove(shot);
            events.push(GameEvent::EntityRemoved { id: shot });
            let mut dead = false;
            let _ = self.registry.update(enemy, |e| {
                e.attrs.hp -= damage;
                dead = e.attrs.hp <= 0;
            });
            if dead {
                let _ = self.registry.remove(enemy);
                self.director.enemy_gone();
                self.kills += 1;
                events.push(GameEvent::EntityRemoved { id: enemy });
                events.push(GameEvent::ScoreChanged {
                    score: self.result().score,
                });
            }
        }

        // Enemies past the bottom edge cost a life.
        let bottom = self.config.field_height;
        for id in self.registry.ids_of_kind(EntityKind::Enemy) {
            if self.registry.get(id).is_some_and(|e| e.pos.y > bottom) {
                let _ = self.registry.remove(id);
                self.director.enemy_gone();
                events.push(GameEvent::EntityRemoved { id });
                self.lose_life(&mut events);
                if self.over {
                    break;
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
            score: i64::from(self.kills) * self.config.score_per_kill,
            currency_earned: self.gold,
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

    fn game() -> WaveBlaster {
        WaveBlaster::with_config(BlasterConfig::default())
    }

    fn spawn_enemy_at(g: &mut WaveBlaster, x: f32, y: f32, hp: i32) -> EntityId {
        g.registry.add(
            Entity::new(
                EntityKind::Enemy,
                Vec2::new(x, y),
                Shape::Box {
                    half_w: 20.0,
                    half_h: 16.0,
                },
            )
            .with_hp(hp),
        )
    }

    #[test]
    fn satisfies_game_contracts() {
        contract_metadata_sane(&game(), GameId::Blaster);
        let mut g = game();
        contract_init_then_update_runs(&mut g);
        // Unattended, enemies leak through and burn the three lives.
        let mut g = game();
        contract_ends_without_input(&mut g, 120.0);
        contract_frozen_once_over(&mut g);
    }

    #[test]
    fn fire_is_cooldown_gated() {
        let mut g = game();
        g.init(&test_config(6));
        g.handle(Intent::Attack);
        g.handle(Intent::Attack);
        assert_eq!(
            g.registry().count_of_kind(EntityKind::Projectile),
            1,
            "second shot inside the cooldown must not fire"
        );
        let _ = g.update(g.config.fire_cooldown + 0.01);
        g.handle(Intent::Attack);
        assert_eq!(g.registry().count_of_kind(EntityKind::Projectile), 2);
    }

    #[test]
    fn projectile_hits_damage_then_kill() {
        let mut g = game();
        g.init(&test_config(6));
        let hp = g.config.projectile_damage * 2 - 1;
        let enemy = spawn_enemy_at(&mut g, 400.0, 300.0, hp);

        g.pointer(400.0, 0.0);
        g.handle(Intent::Attack);
        // Enough frames for the shot to climb 260 px.
        for _ in 0..40 {
            let _ = g.update(0.016);
        }
        assert!(g.registry().contains(enemy), "one hit must not kill");
        assert!(g.registry().get(enemy).unwrap().attrs.hp < hp);

        g.handle(Intent::Attack);
        for _ in 0..40 {
            let _ = g.update(0.016);
        }
        assert!(!g.registry().contains(enemy), "second hit finishes it");
        assert_eq!(g.result().score, g.config.score_per_kill);
    }

    #[test]
    fn leaked_enemy_costs_a_life() {
        let mut g = game();
        g.init(&test_config(6));
        let lives = g.lives();
        let y = g.config.field_height + 10.0;
        let _ = spawn_enemy_at(&mut g, 100.0, y, 50);
        let _ = g.update(0.016);
        assert_eq!(g.lives(), lives - 1);
        assert!(!g.is_over());
    }

    #[test]
    fn run_ends_when_lives_run_out() {
        let mut g = WaveBlaster::with_config(BlasterConfig {
            lives: 1,
            ..BlasterConfig::default()
        });
        g.init(&test_config(6));
        let y = g.config.field_height + 10.0;
        let _ = spawn_enemy_at(&mut g, 100.0, y, 50);
        let events = g.update(0.016);
        assert!(g.is_over());
        assert!(events.contains(&GameEvent::GameOver));
    }

    #[test]
    fn wave_escalation_raises_enemy_hp() {
        let g = game();
        assert_eq!(g.director.enemy_hp(1), 60 + 12);
        assert_eq!(g.director.enemy_hp(4), 60 + 4 * 12);
        assert!(g.director.spawn_gap_for(9) >= g.config.waves.min_spawn_gap);
    }

    #[test]
    fn clearing_a_wave_pays_the_reward() {
        let mut g = game();
        g.init(&test_config(6));
        // Start wave 1 and let its spawns arrive.
        let mut spawned = 0;
        for _ in 0..600 {
            let before = g.registry().count_of_kind(EntityKind::Enemy);
            let _ = g.update(0.05);
            let after = g.registry().count_of_kind(EntityKind::Enemy);
            spawned += after.saturating_sub(before);
            if g.director.pending() == 0 && g.wave() == 1 && spawned > 0 {
                break;
            }
        }
        // Clear the field by hand and report the kills.
        for id in g.registry.ids_of_kind(EntityKind::Enemy) {
            let _ = g.registry.remove(id);
            g.director.enemy_gone();
        }
        let mut paid = 0;
        for _ in 0..5 {
            for event in g.update(0.05) {
                if let GameEvent::CurrencyEarned { amount } = event {
                    paid += amount;
                }
            }
        }
        assert_eq!(paid, g.director.completion_reward(1));
    }

    #[test]
    fn currency_events_sum_to_the_reported_total() {
        let mut g = WaveBlaster::with_config(BlasterConfig {
            lives: 1,
            ..BlasterConfig::default()
        });
        g.init(&test_config(6));
        let mut paid = 0u64;

        // Let wave 1 spawn, then clear it by hand so its reward pays.
        let mut spawned = 0;
        for _ in 0..600 {
            let before = g.registry().count_of_kind(EntityKind::Enemy);
            for event in g.update(0.05) {
                if let GameEvent::CurrencyEarned { amount } = event {
                    paid += amount;
                }
            }
            let after = g.registry().count_of_kind(EntityKind::Enemy);
            spawned += after.saturating_sub(before);
            if g.director.pending() == 0 && g.wave() == 1 && spawned > 0 {
                break;
            }
        }
        for id in g.registry.ids_of_kind(EntityKind::Enemy) {
            let _ = g.registry.remove(id);
            g.director.enemy_gone();
        }
        for _ in 0..5 {
            for event in g.update(0.05) {
                if let GameEvent::CurrencyEarned { amount } = event {
                    paid += amount;
                }
            }
        }

        // A leaked enemy burns the single life and ends the run.
        let y = g.config.field_height + 10.0;
        let _ = spawn_enemy_at(&mut g, 100.0, y, 50);
        for event in g.update(0.016) {
            if let GameEvent::CurrencyEarned { amount } = event {
                paid += amount;
            }
        }
        assert!(g.is_over());
        assert!(paid > 0, "the cleared wave must have paid out");
        assert_eq!(
            paid,
            g.result().currency_earned,
            "per-wave events must account for the whole reported total"
        );
    }
}

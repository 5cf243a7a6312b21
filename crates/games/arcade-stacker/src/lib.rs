use serde::{Deserialize, Serialize};

use arcade_core::entity::{Entity, EntityId, EntityKind, EntityRegistry, Shape, Vec2};
use arcade_core::game_trait::{
    ArcadeGame, GameConfig, GameEvent, GameId, GameMetadata, GameResult, ScoreOrdering,
};
use arcade_core::input::Intent;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StackerConfig {
    pub field_width: f32,
    pub field_height: f32,
    pub block_half_w: f32,
    pub block_half_h: f32,
    pub base_sweep_speed: f32,
    /// Sweep speed gained per placed block.
    pub sweep_step: f32,
    /// Overlap fraction at or above which a drop counts as perfect:
    /// the block snaps into line and does not shrink.
    pub perfect_fraction: f32,
    pub score_per_block: i64,
    pub perfect_bonus: i64,
    pub blocks_per_coin: u32,
}

impl Default for StackerConfig {
    fn default() -> Self {
        Self {
            field_width: 480.0,
            field_height: 640.0,
            block_half_w: 70.0,
            block_half_h: 14.0,
            base_sweep_speed: 140.0,
            sweep_step: 9.0,
            perfect_fraction: 0.95,
            score_per_block: 10,
            perfect_bonus: 5,
            blocks_per_coin: 4,
        }
    }
}

impl StackerConfig {
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ARCADE_STACKER_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/stacker.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }
}

/// Horizontal slice kept after a drop.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Landing {
    /// Drop aligned within the perfect fraction: no shrink, bonus.
    Perfect,
    /// Partial overlap: the block is trimmed to `half_w` around `x`.
    Trimmed { x: f32, half_w: f32 },
    Missed,
}

/// Classify a drop of a block centered at `x` with `half_w` onto a base
/// block at `base_x` with `base_half_w`.
fn resolve_landing(x: f32, half_w: f32, base_x: f32, base_half_w: f32, perfect: f32) -> Landing {
    let left = (x - half_w).max(base_x - base_half_w);
    let right = (x + half_w).min(base_x + base_half_w);
    let overlap = right - left;
    if overlap <= 0.0 {
        return Landing::Missed;
    }
    if overlap >= perfect * 2.0 * half_w {
        return Landing::Perfect;
    }
    Landing::Trimmed {
        x: (left + right) / 2.0,
        half_w: overlap / 2.0,
    }
}

/// Timing stacker: the active block sweeps back and forth above the
/// tower and a drop trims it to the overlap with the block below.
/// Sweeps get faster with every placed block; score is tower height.
/// The game only ends on a missed drop, never on its own.
pub struct BlockStacker {
    config: StackerConfig,
    registry: EntityRegistry,
    /// Top of the settled tower.
    top: EntityId,
    /// The sweeping block awaiting a drop.
    active: EntityId,
    sweep_dir: f32,
    height: u32,
    perfects: u32,
    pending_events: Vec<GameEvent>,
    over: bool,
}

impl Default for BlockStacker {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStacker {
    pub fn new() -> Self {
        Self::with_config(StackerConfig::load())
    }

    pub fn with_config(config: StackerConfig) -> Self {
        Self {
            config,
            registry: EntityRegistry::new(),
            top: EntityId(0),
            active: EntityId(0),
            sweep_dir: 1.0,
            height: 0,
            perfects: 0,
            pending_events: Vec::new(),
            over: false,
        }
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn sweep_speed(&self) -> f32 {
        self.config.base_sweep_speed + self.config.sweep_step * self.height as f32
    }

    fn row_y(&self, row: u32) -> f32 {
        self.config.field_height - (row as f32 + 0.5) * self.config.block_half_h * 2.0
    }

    fn spawn_active(&mut self, half_w: f32) {
        let y = self.row_y(self.height + 1);
        self.active = self.registry.add(
            Entity::new(
                EntityKind::Block,
                Vec2::new(half_w, y),
                Shape::Box {
                    half_w,
                    half_h: self.config.block_half_h,
                },
            )
            .with_tag(self.height + 1),
        );
        self.sweep_dir = 1.0;
    }

    /// Position and half width of a block entity.
    fn block_parts(&self, id: EntityId) -> Option<(Vec2, f32)> {
        let e = self.registry.get(id)?;
        Some((e.pos, e.shape.half_extents().0))
    }

    fn drop_block(&mut self) {
        let (Some((active_pos, active_half)), Some((top_pos, top_half))) =
            (self.block_parts(self.active), self.block_parts(self.top))
        else {
            return;
        };
        let landing = resolve_landing(
            active_pos.x,
            active_half,
            top_pos.x,
            top_half,
            self.config.perfect_fraction,
        );
        match landing {
            Landing::Missed => {
                let id = self.active;
                let _ = self.registry.remove(id);
                self.pending_events.push(GameEvent::EntityRemoved { id });
                self.over = true;
                let earned = self.result().currency_earned;
                if earned > 0 {
                    self.pending_events
                        .push(GameEvent::CurrencyEarned { amount: earned });
                }
                self.pending_events.push(GameEvent::GameOver);
            },
            Landing::Perfect => {
                self.height += 1;
                self.perfects += 1;
                let y = self.row_y(self.height);
                let base_x = top_pos.x;
                let _ = self.registry.update(self.active, |e| {
                    e.pos = Vec2::new(base_x, y);
                });
                self.top = self.active;
                self.pending_events.push(GameEvent::ScoreChanged {
                    score: self.result().score,
                });
                self.spawn_active(active_half);
            },
            Landing::Trimmed { x, half_w } => {
                self.height += 1;
                let y = self.row_y(self.height);
                let half_h = self.config.block_half_h;
                let _ = self.registry.update(self.active, |e| {
                    e.pos = Vec2::new(x, y);
                    e.shape = Shape::Box { half_w, half_h };
                });
                self.top = self.active;
                self.pending_events.push(GameEvent::ScoreChanged {
                    score: self.result().score,
                });
                self.spawn_active(half_w);
            },
        }
    }
}

impl ArcadeGame for BlockStacker {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            id: GameId::Stacker,
            name: "Token Tower".to_string(),
            ordering: ScoreOrdering::HigherIsBetter,
            tick_hz: 60.0,
        }
    }

    fn init(&mut self, _config: &GameConfig) {
        // Fixed base block at the bottom center.
        self.top = self.registry.add(Entity::new(
            EntityKind::Block,
            Vec2::new(self.config.field_width / 2.0, self.row_y(0)),
            Shape::Box {
                half_w: self.config.block_half_w,
                half_h: self.config.block_half_h,
            },
        ));
        self.spawn_active(self.config.block_half_w);
    }

    fn handle(&mut self, intent: Intent) {
        if self.over || intent != Intent::Attack {
            return;
        }
        self.drop_block();
    }

    fn pointer(&mut self, _x: f32, _y: f32) {}

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.over {
            return Vec::new();
        }
        let events = std::mem::take(&mut self.pending_events);
        let speed = self.sweep_speed() * self.sweep_dir;
        let width = self.config.field_width;
        let mut bounced: Option<f32> = None;
        let _ = self.registry.update(self.active, |e| {
            let (half_w, _) = e.shape.half_extents();
            e.pos.x += speed * dt;
            if e.pos.x - half_w < 0.0 {
                e.pos.x = half_w;
                bounced = Some(1.0);
            } else if e.pos.x + half_w > width {
                e.pos.x = width - half_w;
                bounced = Some(-1.0);
            }
        });
        if let Some(dir) = bounced {
            self.sweep_dir = dir;
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
            score: i64::from(self.height) * self.config.score_per_block
                + i64::from(self.perfects) * self.config.perfect_bonus,
            // Divisor clamped: a config file may set it to zero.
            currency_earned: u64::from(self.height / self.config.blocks_per_coin.max(1)),
            currency_spent: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_core::test_helpers::{
        contract_frozen_once_over, contract_init_then_update_runs, contract_metadata_sane,
        run_ticks, test_config,
    };

    fn game() -> BlockStacker {
        BlockStacker::with_config(StackerConfig::default())
    }

    fn top_half_w(g: &BlockStacker) -> f32 {
        g.registry().get(g.top).unwrap().shape.half_extents().0
    }

    fn set_active_x(g: &mut BlockStacker, x: f32) {
        let _ = g.registry.update(g.active, |e| e.pos.x = x);
    }

    #[test]
    fn satisfies_game_contracts() {
        contract_metadata_sane(&game(), GameId::Stacker);
        let mut g = game();
        contract_init_then_update_runs(&mut g);
        // The stacker never ends unattended; only a missed drop ends it.
        let mut g = game();
        g.init(&test_config(2));
        let _ = run_ticks(&mut g, 2_000, 0.016);
        assert!(!g.is_over());

        set_active_x(&mut g, 1.0e6);
        g.handle(Intent::Attack);
        let _ = g.update(0.016);
        assert!(g.is_over());
        contract_frozen_once_over(&mut g);
    }

    #[test]
    fn landing_resolution_cases() {
        // Full alignment.
        assert_eq!(resolve_landing(100.0, 50.0, 100.0, 50.0, 0.95), Landing::Perfect);
        // Within the perfect window (98% overlap).
        assert_eq!(resolve_landing(102.0, 50.0, 100.0, 50.0, 0.95), Landing::Perfect);
        // Half overlap trims to the shared slice.
        let Landing::Trimmed { x, half_w } = resolve_landing(150.0, 50.0, 100.0, 50.0, 0.95)
        else {
            panic!("expected a trim");
        };
        assert_eq!(x, 125.0);
        assert_eq!(half_w, 25.0);
        // No overlap at all.
        assert_eq!(resolve_landing(300.0, 50.0, 100.0, 50.0, 0.95), Landing::Missed);
    }

    #[test]
    fn trimmed_drop_shrinks_the_next_block() {
        let mut g = game();
        g.init(&test_config(2));
        let base_x = g.registry().get(g.top).unwrap().pos.x;
        let x = base_x + g.config.block_half_w;
        set_active_x(&mut g, x);
        g.handle(Intent::Attack);
        assert_eq!(g.height(), 1);
        assert_eq!(top_half_w(&g), g.config.block_half_w / 2.0);
        // The fresh sweeping block inherits the trimmed width.
        let active_w = g.registry().get(g.active).unwrap().shape.half_extents().0;
        assert_eq!(active_w, g.config.block_half_w / 2.0);
    }

    #[test]
    fn perfect_drop_snaps_without_shrinking() {
        let mut g = game();
        g.init(&test_config(2));
        let base_x = g.registry().get(g.top).unwrap().pos.x;
        // 2 px off on a 140 px wide block is inside the 95% window.
        set_active_x(&mut g, base_x + 2.0);
        g.handle(Intent::Attack);
        assert_eq!(g.height(), 1);
        assert_eq!(top_half_w(&g), g.config.block_half_w);
        let top = g.registry().get(g.top).unwrap();
        assert_eq!(top.pos.x, base_x, "perfect drops snap into line");
        assert_eq!(
            g.result().score,
            g.config.score_per_block + g.config.perfect_bonus
        );
    }

    #[test]
    fn missed_drop_ends_the_run() {
        let mut g = game();
        g.init(&test_config(2));
        set_active_x(&mut g, -1.0e4);
        g.handle(Intent::Attack);
        let events = g.update(0.016);
        assert!(g.is_over());
        assert!(events.contains(&GameEvent::GameOver));
        assert_eq!(g.result().score, 0);
    }

    #[test]
    fn sweep_speeds_up_and_bounces_at_walls() {
        let mut g = game();
        g.init(&test_config(2));
        let slow = g.sweep_speed();
        g.height = 5;
        assert!(g.sweep_speed() > slow);
        g.height = 0;

        // Sweep to the right wall and back.
        let mut saw_left = false;
        let mut saw_right = false;
        for _ in 0..600 {
            let _ = g.update(0.016);
            let x = g.registry().get(g.active).unwrap().pos.x;
            let half = g.config.block_half_w;
            if x <= half + 0.5 {
                saw_left = true;
            }
            if x >= g.config.field_width - half - 0.5 {
                saw_right = true;
            }
        }
        assert!(saw_left && saw_right, "block must bounce between both walls");
    }

    #[test]
    fn coins_follow_tower_height() {
        let mut g = game();
        g.init(&test_config(2));
        for _ in 0..8 {
            let base_x = g.registry().get(g.top).unwrap().pos.x;
            set_active_x(&mut g, base_x);
            g.handle(Intent::Attack);
        }
        assert_eq!(g.height(), 8);
        assert_eq!(g.result().currency_earned, 2);
    }

    #[test]
    fn zero_coin_divisor_is_tolerated() {
        let mut g = BlockStacker::with_config(StackerConfig {
            blocks_per_coin: 0,
            ..StackerConfig::default()
        });
        g.init(&test_config(2));
        g.height = 8;
        assert_eq!(g.result().currency_earned, 8, "divisor clamps to 1");
    }
}

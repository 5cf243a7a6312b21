use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use arcade_core::entity::{Entity, EntityId, EntityKind, EntityRegistry, Shape, Vec2};
use arcade_core::game_trait::{
    ArcadeGame, GameConfig, GameEvent, GameId, GameMetadata, GameResult, ScoreOrdering,
};
use arcade_core::input::Intent;

/// Grid is 4x4: eight pairs.
const COLS: u32 = 4;
const ROWS: u32 = 4;
const PAIRS: u32 = COLS * ROWS / 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub field_width: f32,
    pub field_height: f32,
    /// How long two revealed cards stay visible before resolving.
    pub reveal_secs: f32,
    /// Run cap; hitting it ends the game with the cap as the time.
    pub time_cap_secs: f32,
    /// Coins awarded for finishing under the cap.
    pub completion_coins: u64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            field_width: 800.0,
            field_height: 600.0,
            reveal_secs: 0.7,
            time_cap_secs: 180.0,
            completion_coins: 5,
        }
    }
}

impl MatchingConfig {
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ARCADE_MATCHING_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/matching.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }
}

/// Pair-matching game. The score is elapsed milliseconds, so lower is
/// better; an unfinished board scores the time cap, whether it ran out
/// of time or was abandoned mid-run.
///
/// Cards are entities: `attrs.tag` is the face value, `attrs.hp` the
/// face-up flag (1 = revealed) for the UI sink. Matched cards are
/// removed from the registry.
pub struct PairMatching {
    config: MatchingConfig,
    registry: EntityRegistry,
    revealed: Vec<EntityId>,
    /// Countdown while two mismatched cards sit face up.
    resolve_in: Option<f32>,
    cursor: (f32, f32),
    pending_events: Vec<GameEvent>,
    elapsed: f32,
    completed: bool,
    over: bool,
}

impl Default for PairMatching {
    fn default() -> Self {
        Self::new()
    }
}

impl PairMatching {
    pub fn new() -> Self {
        Self::with_config(MatchingConfig::load())
    }

    pub fn with_config(config: MatchingConfig) -> Self {
        Self {
            config,
            registry: EntityRegistry::new(),
            revealed: Vec::new(),
            resolve_in: None,
            cursor: (0.0, 0.0),
            pending_events: Vec::new(),
            elapsed: 0.0,
            completed: false,
            over: false,
        }
    }

    pub fn pairs_left(&self) -> usize {
        self.registry.len() / 2
    }

    fn cell_center(&self, col: u32, row: u32) -> Vec2 {
        let cell_w = self.config.field_width / COLS as f32;
        let cell_h = self.config.field_height / ROWS as f32;
        Vec2::new(
            (col as f32 + 0.5) * cell_w,
            (row as f32 + 0.5) * cell_h,
        )
    }

    fn card_at(&self, x: f32, y: f32) -> Option<EntityId> {
        self.registry
            .of_kind(EntityKind::Card)
            .find(|card| {
                let (hw, hh) = card.shape.half_extents();
                (x - card.pos.x).abs() < hw && (y - card.pos.y).abs() < hh
            })
            .map(|card| card.id)
    }

    fn reveal(&mut self, id: EntityId) {
        if self.resolve_in.is_some() || self.revealed.contains(&id) || self.revealed.len() >= 2 {
            return;
        }
        if self.registry.update(id, |card| card.attrs.hp = 1) {
            self.revealed.push(id);
            if self.revealed.len() == 2 {
                self.resolve_in = Some(self.config.reveal_secs);
            }
        }
    }

    fn resolve(&mut self, events: &mut Vec<GameEvent>) {
        let [a, b] = self.revealed[..] else {
            self.revealed.clear();
            return;
        };
        let face_a = self.registry.get(a).map(|c| c.attrs.tag);
        let face_b = self.registry.get(b).map(|c| c.attrs.tag);
        if face_a.is_some() && face_a == face_b {
            let _ = self.registry.remove(a);
            let _ = self.registry.remove(b);
            events.push(GameEvent::EntityRemoved { id: a });
            events.push(GameEvent::EntityRemoved { id: b });
        } else {
            let _ = self.registry.update(a, |c| c.attrs.hp = 0);
            let _ = self.registry.update(b, |c| c.attrs.hp = 0);
        }
        self.revealed.clear();
    }

    fn finish(&mut self, completed: bool, events: &mut Vec<GameEvent>) {
        self.over = true;
        self.completed = completed;
        events.push(GameEvent::ScoreChanged {
            score: self.result().score,
        });
        let earned = self.result().currency_earned;
        if earned > 0 {
            events.push(GameEvent::CurrencyEarned { amount: earned });
        }
        events.push(GameEvent::GameOver);
    }
}

impl ArcadeGame for PairMatching {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            id: GameId::Matching,
            name: "Token Pairs".to_string(),
            ordering: ScoreOrdering::LowerIsBetter,
            tick_hz: 30.0,
        }
    }

    fn init(&mut self, config: &GameConfig) {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut faces: Vec<u32> = (0..PAIRS).chain(0..PAIRS).collect();
        faces.shuffle(&mut rng);
        let cell_w = self.config.field_width / COLS as f32;
        let cell_h = self.config.field_height / ROWS as f32;
        for row in 0..ROWS {
            for col in 0..COLS {
                let face = faces[(row * COLS + col) as usize];
                let _ = self.registry.add(
                    Entity::new(
                        EntityKind::Card,
                        self.cell_center(col, row),
                        Shape::Box {
                            half_w: cell_w / 2.0 - 8.0,
                            half_h: cell_h / 2.0 - 8.0,
                        },
                    )
                    .with_tag(face),
                );
            }
        }
    }

    fn handle(&mut self, intent: Intent) {
        if self.over || intent != Intent::Attack {
            return;
        }
        let (x, y) = self.cursor;
        if let Some(card) = self.card_at(x, y) {
            self.reveal(card);
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
        self.elapsed += dt;

        if let Some(remaining) = self.resolve_in {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                self.resolve_in = None;
                self.resolve(&mut events);
            } else {
                self.resolve_in = Some(remaining);
            }
        }

        if self.registry.is_empty() {
            self.finish(true, &mut events);
        } else if self.elapsed >= self.config.time_cap_secs {
            self.finish(false, &mut events);
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
        // Only a cleared board scores its real time. An unfinished run
        // (time cap, or a session stopped early) scores the cap, so
        // quitting can never record a better time than playing.
        let secs = if self.completed {
            self.elapsed.min(self.config.time_cap_secs)
        } else {
            self.config.time_cap_secs
        };
        GameResult {
            score: (secs * 1000.0) as i64,
            currency_earned: if self.completed {
                self.config.completion_coins
            } else {
                0
            },
            currency_spent: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_core::test_helpers::{
        contract_frozen_once_over, contract_init_then_update_runs, contract_metadata_sane,
        test_config,
    };

    fn game() -> PairMatching {
        PairMatching::with_config(MatchingConfig::default())
    }

    fn tap(g: &mut PairMatching, id: EntityId) {
        let pos = g.registry().get(id).unwrap().pos;
        g.pointer(pos.x, pos.y);
        g.handle(Intent::Attack);
    }

    /// Ids of one matching pair and one card of a different face.
    fn find_pair(g: &PairMatching) -> (EntityId, EntityId, EntityId) {
        let cards: Vec<(EntityId, u32)> = g
            .registry()
            .of_kind(EntityKind::Card)
            .map(|c| (c.id, c.attrs.tag))
            .collect();
        let (a, face) = cards[0];
        let b = cards[1..]
            .iter()
            .find(|(_, f)| *f == face)
            .map(|(id, _)| *id)
            .unwrap();
        let other = cards
            .iter()
            .find(|(_, f)| *f != face)
            .map(|(id, _)| *id)
            .unwrap();
        (a, b, other)
    }

    #[test]
    fn satisfies_game_contracts() {
        contract_metadata_sane(&game(), GameId::Matching);
        let mut g = game();
        contract_init_then_update_runs(&mut g);

        // Time cap ends an untouched board.
        let mut g = PairMatching::with_config(MatchingConfig {
            time_cap_secs: 2.0,
            ..MatchingConfig::default()
        });
        g.init(&test_config(5));
        for _ in 0..50 {
            let _ = g.update(0.05);
        }
        assert!(g.is_over());
        assert_eq!(g.result().score, 2000);
        contract_frozen_once_over(&mut g);
    }

    #[test]
    fn board_has_eight_shuffled_pairs() {
        let mut g = game();
        g.init(&test_config(5));
        assert_eq!(g.registry().len(), 16);
        let mut counts = std::collections::HashMap::new();
        for card in g.registry().of_kind(EntityKind::Card) {
            *counts.entry(card.attrs.tag).or_insert(0u32) += 1;
        }
        assert_eq!(counts.len(), PAIRS as usize);
        assert!(counts.values().all(|&c| c == 2));
    }

    #[test]
    fn matched_pair_is_removed() {
        let mut g = game();
        g.init(&test_config(5));
        let (a, b, _) = find_pair(&g);
        tap(&mut g, a);
        tap(&mut g, b);
        // Resolution happens after the reveal delay.
        let _ = g.update(g.config.reveal_secs + 0.05);
        assert!(!g.registry().contains(a));
        assert!(!g.registry().contains(b));
        assert_eq!(g.pairs_left(), PAIRS as usize - 1);
    }

    #[test]
    fn mismatch_flips_cards_back() {
        let mut g = game();
        g.init(&test_config(5));
        let (a, _, other) = find_pair(&g);
        tap(&mut g, a);
        tap(&mut g, other);
        assert_eq!(g.registry().get(a).unwrap().attrs.hp, 1);
        let _ = g.update(g.config.reveal_secs + 0.05);
        assert!(g.registry().contains(a));
        assert!(g.registry().contains(other));
        assert_eq!(g.registry().get(a).unwrap().attrs.hp, 0);
        assert_eq!(g.registry().get(other).unwrap().attrs.hp, 0);
    }

    #[test]
    fn third_tap_during_reveal_is_ignored() {
        let mut g = game();
        g.init(&test_config(5));
        let (a, _, other) = find_pair(&g);
        tap(&mut g, a);
        tap(&mut g, other);
        let cards: Vec<EntityId> = g.registry().ids_of_kind(EntityKind::Card);
        let third = cards
            .iter()
            .copied()
            .find(|id| *id != a && *id != other)
            .unwrap();
        tap(&mut g, third);
        assert_eq!(g.registry().get(third).unwrap().attrs.hp, 0);
    }

    #[test]
    fn clearing_the_board_ends_with_elapsed_time() {
        let mut g = game();
        g.init(&test_config(5));
        while !g.registry().is_empty() {
            let (a, b, _) = find_pair(&g);
            tap(&mut g, a);
            tap(&mut g, b);
            let _ = g.update(g.config.reveal_secs + 0.05);
        }
        assert!(g.is_over());
        assert!(g.completed);
        assert_eq!(
            g.result().currency_earned,
            g.config.completion_coins
        );
        assert!(g.result().score > 0);
        assert!(
            g.result().score < (g.config.time_cap_secs * 1000.0) as i64,
            "a genuine clear beats every unfinished run"
        );
    }

    #[test]
    fn abandoned_run_scores_the_time_cap() {
        let mut g = game();
        g.init(&test_config(5));
        // ~2 seconds of play, then the session stops early.
        for _ in 0..120 {
            let _ = g.update(1.0 / 60.0);
        }
        assert!(!g.is_over());
        assert_eq!(
            g.result().score,
            (g.config.time_cap_secs * 1000.0) as i64,
            "an early quit must never record a beatable-only-by-quitting time"
        );
    }

    #[test]
    fn same_seed_same_board() {
        let mut g1 = game();
        let mut g2 = game();
        g1.init(&test_config(77));
        g2.init(&test_config(77));
        let faces1: Vec<u32> = g1.registry().all().map(|c| c.attrs.tag).collect();
        let faces2: Vec<u32> = g2.registry().all().map(|c| c.attrs.tag).collect();
        assert_eq!(faces1, faces2);
    }
}

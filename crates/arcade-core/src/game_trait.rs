use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityRegistry};
use crate::input::Intent;

/// Identifier for each mini-game in the arcade catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameId {
    Catcher,
    Sequence,
    Matching,
    Clicker,
    Fighter,
    Racer,
    Blaster,
    Defense,
    Stacker,
}

impl GameId {
    /// All known game ids, in catalog order.
    pub const ALL: &[GameId] = &[
        GameId::Catcher,
        GameId::Sequence,
        GameId::Matching,
        GameId::Clicker,
        GameId::Fighter,
        GameId::Racer,
        GameId::Blaster,
        GameId::Defense,
        GameId::Stacker,
    ];

    /// Stable key used for persisted high scores and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameId::Catcher => "catcher",
            GameId::Sequence => "sequence",
            GameId::Matching => "matching",
            GameId::Clicker => "clicker",
            GameId::Fighter => "fighter",
            GameId::Racer => "racer",
            GameId::Blaster => "blaster",
            GameId::Defense => "defense",
            GameId::Stacker => "stacker",
        }
    }

    /// Parse a persisted key back into a game id.
    pub fn parse(key: &str) -> Option<GameId> {
        GameId::ALL.iter().copied().find(|id| id.as_str() == key)
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a larger or smaller stored value counts as the better score.
/// Timed games (matching) are lower-is-better; everything else is higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreOrdering {
    HigherIsBetter,
    LowerIsBetter,
}

/// Game metadata for the arcade selection screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub id: GameId,
    pub name: String,
    pub ordering: ScoreOrdering,
    /// Suggested host callback rate in Hz. The engine integrates against
    /// elapsed time, so this is a smoothness hint, not a correctness knob.
    pub tick_hz: f32,
}

/// Snapshot of player state handed to a game at session start.
///
/// Sessions read this snapshot once and apply the game's reported deltas at
/// end-of-game; games never touch the persisted record directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Seed for the game's RNG. Sessions pick a fresh one; tests pin it.
    pub seed: u64,
    /// Currency balance at session start (spendable in-game, e.g. towers).
    pub currency: u64,
    /// Owned upgrade levels by upgrade name.
    pub upgrades: HashMap<String, u32>,
    /// Free-form per-launch options.
    pub custom: HashMap<String, serde_json::Value>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            currency: 0,
            upgrades: HashMap::new(),
            custom: HashMap::new(),
        }
    }
}

/// Events emitted by a game during update, consumed by the session layer
/// (UI sink forwarding, economy bookkeeping, end-of-game detection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreChanged { score: i64 },
    CurrencyEarned { amount: u64 },
    CurrencySpent { amount: u64 },
    WaveStarted { wave: u32 },
    EntityRemoved { id: EntityId },
    GameOver,
}

/// Final outcome of a single run, reported by the game once it is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub score: i64,
    pub currency_earned: u64,
    pub currency_spent: u64,
}

impl Default for GameResult {
    fn default() -> Self {
        Self {
            score: 0,
            currency_earned: 0,
            currency_spent: 0,
        }
    }
}

/// Core trait every arcade mini-game implements.
///
/// The session layer owns the host callback, input routing, persistence,
/// and the UI sink; a game only advances its own simulation. Execution is
/// single-threaded and cooperative: `update` runs to completion and must
/// be a strict no-op once `is_over` returns true.
pub trait ArcadeGame {
    /// Metadata for the selection screen and score ordering.
    fn metadata(&self) -> GameMetadata;

    /// Called once when the session starts, with the player snapshot.
    fn init(&mut self, config: &GameConfig);

    /// Apply a discrete input intent (move/jump/block/attack).
    fn handle(&mut self, intent: Intent);

    /// Apply a continuous pointer sample in field coordinates.
    fn pointer(&mut self, x: f32, y: f32);

    /// Advance the simulation by `dt` seconds. Returns events in the order
    /// they occurred within the frame.
    fn update(&mut self, dt: f32) -> Vec<GameEvent>;

    /// Live entities for UI snapshots. Registration order is stable.
    fn registry(&self) -> &EntityRegistry;

    /// Whether the run has ended.
    fn is_over(&self) -> bool;

    /// Final score and currency deltas. Only meaningful once over, but
    /// must also report the current partial totals for early stops.
    fn result(&self) -> GameResult;
}

//! Validated load/store of the per-player game-state record.
//!
//! The record is the canonical copy of high scores, currency, and
//! upgrades. Every field of a loaded record is range-checked before it
//! is trusted; any violation discards the whole record, clears the
//! backing entry, and substitutes schema-correct defaults. A bad record
//! is never partially trusted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game_trait::GameId;
use crate::scoring::MAX_CURRENCY;

/// Largest magnitude a persisted score may have.
pub const MAX_SCORE_ABS: i64 = 1_000_000_000;
/// Highest persisted upgrade level.
pub const MAX_UPGRADE_LEVEL: u32 = 100;

/// Per-player persisted state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerRecord {
    /// Best score per game, keyed by [`GameId::as_str`].
    pub high_scores: HashMap<String, i64>,
    pub currency: u64,
    /// Owned upgrade levels by upgrade name.
    pub upgrades: HashMap<String, u32>,
}

/// Why a persisted record was rejected. Only ever logged; the caller
/// always falls back to defaults.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("currency {0} exceeds {MAX_CURRENCY}")]
    CurrencyOutOfRange(u64),
    #[error("high score key {0:?} is not a known game")]
    UnknownGame(String),
    #[error("score {value} for {game} outside ±{MAX_SCORE_ABS}")]
    ScoreOutOfRange { game: String, value: i64 },
    #[error("upgrade name must not be empty")]
    EmptyUpgradeName,
    #[error("upgrade {name} level {level} exceeds {MAX_UPGRADE_LEVEL}")]
    UpgradeOutOfRange { name: String, level: u32 },
}

impl PlayerRecord {
    /// Field-by-field range validation.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.currency > MAX_CURRENCY {
            return Err(RecordError::CurrencyOutOfRange(self.currency));
        }
        for (key, value) in &self.high_scores {
            if GameId::parse(key).is_none() {
                return Err(RecordError::UnknownGame(key.clone()));
            }
            if value.abs() > MAX_SCORE_ABS {
                return Err(RecordError::ScoreOutOfRange {
                    game: key.clone(),
                    value: *value,
                });
            }
        }
        for (name, level) in &self.upgrades {
            if name.is_empty() {
                return Err(RecordError::EmptyUpgradeName);
            }
            if *level > MAX_UPGRADE_LEVEL {
                return Err(RecordError::UpgradeOutOfRange {
                    name: name.clone(),
                    level: *level,
                });
            }
        }
        Ok(())
    }

    pub fn high_score(&self, id: GameId) -> Option<i64> {
        self.high_scores.get(id.as_str()).copied()
    }

    pub fn set_high_score(&mut self, id: GameId, value: i64) {
        let _ = self.high_scores.insert(id.as_str().to_string(), value);
    }
}

/// Backing storage for the raw serialized record. The host provides a
/// file-backed implementation; tests use [`MemoryStore`].
pub trait RecordStore {
    fn load_raw(&self) -> Option<String>;
    fn save_raw(&mut self, json: &str);
    fn clear(&mut self);
}

/// In-memory store for tests and headless runs without persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the slot with raw JSON (tests feeding corrupt data).
    pub fn seeded(raw: &str) -> Self {
        Self {
            slot: Some(raw.to_string()),
        }
    }
}

impl RecordStore for MemoryStore {
    fn load_raw(&self) -> Option<String> {
        self.slot.clone()
    }

    fn save_raw(&mut self, json: &str) {
        self.slot = Some(json.to_string());
    }

    fn clear(&mut self) {
        self.slot = None;
    }
}

fn decode(raw: &str) -> Result<PlayerRecord, RecordError> {
    let record: PlayerRecord = serde_json::from_str(raw)?;
    record.validate()?;
    Ok(record)
}

/// Load the player record, degrading to defaults on any failure. A
/// rejected record is also cleared from the store so it is not re-parsed
/// on every launch.
pub fn load_record(store: &mut dyn RecordStore) -> PlayerRecord {
    let Some(raw) = store.load_raw() else {
        return PlayerRecord::default();
    };
    match decode(&raw) {
        Ok(record) => record,
        Err(err) => {
            tracing::warn!(error = %err, "Discarding corrupt player record");
            store.clear();
            PlayerRecord::default()
        },
    }
}

/// Persist the record. Serialization of a validated record cannot fail;
/// a failure would indicate a bug, so it is logged and skipped rather
/// than propagated.
pub fn save_record(store: &mut dyn RecordStore, record: &PlayerRecord) {
    match serde_json::to_string(record) {
        Ok(json) => store.save_raw(&json),
        Err(err) => tracing::error!(error = %err, "Failed to encode player record"),
    }
}

//! Per-game session lifecycle: Idle → Active → Ended, with total
//! teardown. Each session exclusively owns its game instance (and with
//! it every entity and timer); nothing outlives `stop`/`reset`, and
//! both are idempotent. The manager is also where end-of-game results
//! meet persistence and the badge/XP listeners.

use std::collections::HashMap;

use rand::Rng;
use uuid::Uuid;

use crate::game_trait::{ArcadeGame, GameConfig, GameEvent, GameId};
use crate::input::{InputRouter, RawEvent};
use crate::persistence::{MAX_SCORE_ABS, PlayerRecord, RecordStore, load_record, save_record};
use crate::scoring::{Wallet, improves, record_best};
use crate::ui::UiSink;

/// Lifecycle state of one game id's session slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Active,
    Ended,
}

/// Factory for creating a fresh game instance per `start`.
pub type GameFactory = fn() -> Box<dyn ArcadeGame>;

/// Maps game ids to factories. The host registers the games it was
/// built with.
#[derive(Default)]
pub struct GameCatalog {
    factories: HashMap<GameId, GameFactory>,
}

impl GameCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: GameId, factory: GameFactory) {
        let _ = self.factories.insert(id, factory);
    }

    pub fn create(&self, id: GameId) -> Option<Box<dyn ArcadeGame>> {
        self.factories.get(&id).map(|f| f())
    }

    /// Registered ids in catalog order.
    pub fn ids(&self) -> Vec<GameId> {
        GameId::ALL
            .iter()
            .copied()
            .filter(|id| self.factories.contains_key(id))
            .collect()
    }
}

/// End-of-game notification payload for external collaborators
/// (badge/XP system). The core does not depend on what they do with it.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub run: Uuid,
    pub game: GameId,
    pub score: i64,
    pub new_best: bool,
    pub currency_earned: u64,
    pub currency_spent: u64,
}

type EndListener = Box<dyn FnMut(&SessionOutcome)>;

struct Session {
    run: Uuid,
    status: SessionStatus,
    game: Option<Box<dyn ArcadeGame>>,
    router: InputRouter,
    /// Running currency delta, for economy display previews only; the
    /// persisted balance moves once, at finalization.
    currency_delta: i64,
}

/// Owns every session slot, the canonical player record, the optional
/// UI sink, and the end-of-game listeners. Single-threaded and
/// cooperative: the host calls `advance` from its frame callback; all
/// other entry points are event-driven.
pub struct SessionManager {
    catalog: GameCatalog,
    store: Box<dyn RecordStore>,
    record: PlayerRecord,
    sessions: HashMap<GameId, Session>,
    sink: Option<Box<dyn UiSink>>,
    listeners: Vec<EndListener>,
}

impl SessionManager {
    pub fn new(catalog: GameCatalog, mut store: Box<dyn RecordStore>) -> Self {
        let record = load_record(store.as_mut());
        Self {
            catalog,
            store,
            record,
            sessions: HashMap::new(),
            sink: None,
            listeners: Vec::new(),
        }
    }

    /// Attach a UI sink. Absent sink means headless: every display call
    /// becomes a no-op.
    pub fn set_sink(&mut self, sink: Box<dyn UiSink>) {
        self.sink = Some(sink);
    }

    /// Register an end-of-game listener (badge/XP collaborator).
    pub fn on_game_end(&mut self, listener: impl FnMut(&SessionOutcome) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// The canonical persisted record (already validated on load).
    pub fn record(&self) -> &PlayerRecord {
        &self.record
    }

    pub fn status(&self, id: GameId) -> SessionStatus {
        self.sessions
            .get(&id)
            .map_or(SessionStatus::Idle, |s| s.status)
    }

    /// Live entity count for a session's game, if one is running.
    pub fn entity_count(&self, id: GameId) -> usize {
        self.sessions
            .get(&id)
            .and_then(|s| s.game.as_ref())
            .map_or(0, |g| g.registry().len())
    }

    /// Start a session with a fresh seed and the current player
    /// snapshot. No-op (returning false) while that id is Active.
    pub fn start(&mut self, id: GameId) -> bool {
        let config = GameConfig {
            seed: rand::rng().random(),
            currency: self.record.currency,
            upgrades: self.record.upgrades.clone(),
            custom: HashMap::new(),
        };
        self.start_with_config(id, config)
    }

    /// Start with an explicit config (pinned seeds in tests, launch
    /// options from the host).
    pub fn start_with_config(&mut self, id: GameId, config: GameConfig) -> bool {
        if self.status(id) == SessionStatus::Active {
            tracing::debug!(game = %id, "Session already active, start ignored");
            return false;
        }
        let Some(mut game) = self.catalog.create(id) else {
            tracing::warn!(game = %id, "No factory registered for game");
            return false;
        };
        game.init(&config);
        let run = Uuid::new_v4();
        tracing::info!(game = %id, run = %run, seed = config.seed, "Session started");
        let _ = self.sessions.insert(
            id,
            Session {
                run,
                status: SessionStatus::Active,
                game: Some(game),
                router: InputRouter::default(),
                currency_delta: 0,
            },
        );
        true
    }

    /// Route a raw input event to a session. Dropped unless Active.
    pub fn route(&mut self, id: GameId, event: RawEvent) {
        if let Some(session) = self.sessions.get_mut(&id)
            && session.status == SessionStatus::Active
        {
            session.router.push(event);
        }
    }

    /// One host frame: drain input, step every active game, forward
    /// events and snapshots to the sink, finalize games that ended.
    /// Sessions step in catalog order, so co-active games resolve in a
    /// deterministic order rather than hash order.
    pub fn advance(&mut self, dt: f32) {
        for id in GameId::ALL {
            let id = *id;
            let Some(session) = self.sessions.get_mut(&id) else {
                continue;
            };
            if session.status != SessionStatus::Active {
                continue;
            }
            let Some(game) = session.game.as_mut() else {
                continue;
            };
            if let Some((x, y)) = session.router.take_pointer() {
                game.pointer(x, y);
            }
            for intent in session.router.drain() {
                game.handle(intent);
            }
            let events = game.update(dt);
            let over = game.is_over();
            self.forward(id, &events);
            if over {
                self.finalize(id);
            }
        }
    }

    /// End a session. Idempotent: stopping an already-stopped or
    /// unknown session performs cleanup only. A stop while Active
    /// finalizes the run (the score counts, even on early quit).
    pub fn stop(&mut self, id: GameId) {
        if self.status(id) == SessionStatus::Active {
            self.finalize(id);
            return;
        }
        if let Some(session) = self.sessions.get_mut(&id) {
            session.router.detach();
            session.game = None;
        }
        tracing::debug!(game = %id, "Session already stopped");
    }

    /// Discard a session and return the slot to Idle. The run is not
    /// recorded. Idempotent; resetting an Idle slot is a no-op.
    pub fn reset(&mut self, id: GameId) {
        match self.sessions.remove(&id) {
            Some(mut session) => {
                session.router.detach();
                session.game = None;
                tracing::info!(game = %id, run = %session.run, "Session reset, run discarded");
            },
            None => tracing::debug!(game = %id, "Reset of idle session ignored"),
        }
    }

    fn forward(&mut self, id: GameId, events: &[GameEvent]) {
        let Some(session) = self.sessions.get_mut(&id) else {
            return;
        };
        for event in events {
            match event {
                GameEvent::CurrencyEarned { amount } => {
                    session.currency_delta += i64::try_from(*amount).unwrap_or(i64::MAX);
                },
                GameEvent::CurrencySpent { amount } => {
                    session.currency_delta -= i64::try_from(*amount).unwrap_or(i64::MAX);
                },
                GameEvent::WaveStarted { wave } => {
                    tracing::debug!(game = %id, wave, "Wave started");
                },
                _ => {},
            }
        }
        let Some(sink) = self.sink.as_deref_mut() else {
            return;
        };
        for event in events {
            match event {
                GameEvent::ScoreChanged { score } => sink.update_score(*score),
                GameEvent::EntityRemoved { id } => sink.remove_entity(*id),
                GameEvent::CurrencyEarned { .. } | GameEvent::CurrencySpent { .. } => {
                    let preview = i64::try_from(self.record.currency)
                        .unwrap_or(i64::MAX)
                        .saturating_add(session.currency_delta)
                        .max(0);
                    sink.update_economy(preview as u64);
                },
                GameEvent::WaveStarted { .. } | GameEvent::GameOver => {},
            }
        }
        if let Some(game) = session.game.as_ref() {
            for entity in game.registry().all() {
                sink.render_entity(entity);
            }
        }
    }

    /// Record the result, persist, notify, and tear the session down.
    /// Runs at most once per session; the Active check is the guard.
    fn finalize(&mut self, id: GameId) {
        let Some(session) = self.sessions.get_mut(&id) else {
            return;
        };
        if session.status != SessionStatus::Active {
            return;
        }
        let Some(game) = session.game.as_mut() else {
            session.status = SessionStatus::Ended;
            return;
        };
        let meta = game.metadata();
        let result = game.result();
        let run = session.run;

        // Total teardown before any bookkeeping: drop the game (and with
        // it entities and pending timers), detach input.
        session.status = SessionStatus::Ended;
        session.router.detach();
        session.game = None;

        let score = result.score.clamp(-MAX_SCORE_ABS, MAX_SCORE_ABS);
        let previous = self.record.high_score(id);
        let new_best = improves(meta.ordering, previous, score);
        let stored = record_best(meta.ordering, previous, score);
        self.record.set_high_score(id, stored);

        let mut wallet = Wallet::new(self.record.currency);
        if result.currency_spent > 0 && !wallet.spend(result.currency_spent) {
            // In-game wallets are seeded from this balance, so an
            // unaffordable spend here indicates a game bug; keep the
            // record consistent and move on.
            tracing::warn!(game = %id, spent = result.currency_spent, "Reported spend exceeds balance, ignored");
        }
        wallet.earn(result.currency_earned);
        self.record.currency = wallet.balance();

        save_record(self.store.as_mut(), &self.record);
        tracing::info!(
            game = %id,
            run = %run,
            score,
            new_best,
            earned = result.currency_earned,
            spent = result.currency_spent,
            "Session ended"
        );

        let outcome = SessionOutcome {
            run,
            game: id,
            score,
            new_best,
            currency_earned: result.currency_earned,
            currency_spent: result.currency_spent,
        };
        for listener in &mut self.listeners {
            listener(&outcome);
        }
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.update_score(score);
            sink.update_economy(self.record.currency);
        }
    }
}

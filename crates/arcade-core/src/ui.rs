//! The rendering seam. Core logic never touches a display surface; it
//! pushes validated values through this trait, and every call site
//! guards for an absent sink so games run headless (tests, autoplay).

use crate::entity::{Entity, EntityId};

/// Consumes entity snapshots and score/economy values for display.
/// Implementations live outside the core (canvas renderer, TUI); the
/// core only promises to call these with validated values.
pub trait UiSink {
    fn render_entity(&mut self, entity: &Entity);
    fn remove_entity(&mut self, id: EntityId);
    fn update_score(&mut self, score: i64);
    fn update_economy(&mut self, balance: u64);
}

/// Sink that renders nothing. Used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl UiSink for NullSink {
    fn render_entity(&mut self, _entity: &Entity) {}
    fn remove_entity(&mut self, _id: EntityId) {}
    fn update_score(&mut self, _score: i64) {}
    fn update_economy(&mut self, _balance: u64) {}
}

#[cfg(any(test, feature = "test-helpers"))]
pub use recording::{RecordingSink, SinkLog};

#[cfg(any(test, feature = "test-helpers"))]
mod recording {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Everything a [`RecordingSink`] has been asked to display.
    #[derive(Debug, Default)]
    pub struct SinkLog {
        pub rendered: Vec<EntityId>,
        pub removed: Vec<EntityId>,
        pub scores: Vec<i64>,
        pub balances: Vec<u64>,
    }

    /// Test sink that records every call. Clones share the same log, so
    /// a test can hand one clone to the session manager and inspect the
    /// other. Single-threaded, like the engine itself.
    #[derive(Debug, Default, Clone)]
    pub struct RecordingSink {
        log: Rc<RefCell<SinkLog>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn log(&self) -> std::cell::Ref<'_, SinkLog> {
            self.log.borrow()
        }
    }

    impl UiSink for RecordingSink {
        fn render_entity(&mut self, entity: &Entity) {
            self.log.borrow_mut().rendered.push(entity.id);
        }

        fn remove_entity(&mut self, id: EntityId) {
            self.log.borrow_mut().removed.push(id);
        }

        fn update_score(&mut self, score: i64) {
            self.log.borrow_mut().scores.push(score);
        }

        fn update_economy(&mut self, balance: u64) {
            self.log.borrow_mut().balances.push(balance);
        }
    }
}

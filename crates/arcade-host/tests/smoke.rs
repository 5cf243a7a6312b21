//! End-to-end smoke: seeded autoplay through the real session manager
//! and a file-backed record store.

use std::path::PathBuf;

use arcade_core::game_trait::GameId;
use arcade_core::persistence::load_record;
use arcade_core::session::{SessionManager, SessionStatus};
use arcade_host::autoplay;
use arcade_host::catalog::build_catalog;
use arcade_host::store::FileStore;

fn scratch_path() -> PathBuf {
    std::env::temp_dir().join(format!("arcade-smoke-{}.json", uuid::Uuid::new_v4()))
}

#[test]
fn clicker_autoplay_ends_and_persists_a_record() {
    let path = scratch_path();
    let mut manager =
        SessionManager::new(build_catalog(), Box::new(FileStore::new(path.clone())));

    // 45 second run cap at 60 fps; the budget leaves headroom.
    let ended = autoplay::run(&mut manager, GameId::Clicker, 7, 3_500, 1.0 / 60.0);
    assert!(ended, "the clicker must end on its own time cap");
    assert_eq!(manager.status(GameId::Clicker), SessionStatus::Ended);
    assert_eq!(manager.entity_count(GameId::Clicker), 0);

    let mut store = FileStore::new(path.clone());
    let record = load_record(&mut store);
    assert!(
        record.high_score(GameId::Clicker).is_some(),
        "the finished run must be on disk"
    );
    let _ = std::fs::remove_file(path);
}

#[test]
fn endless_game_is_stopped_at_the_frame_budget_and_still_recorded() {
    let path = scratch_path();
    let mut manager =
        SessionManager::new(build_catalog(), Box::new(FileStore::new(path.clone())));

    let ended = autoplay::run(&mut manager, GameId::Defense, 7, 120, 1.0 / 60.0);
    assert!(!ended, "two seconds is not enough to lose ten lives");
    // Stop finalizes the run, so even a budget-bound run is recorded.
    assert_eq!(manager.status(GameId::Defense), SessionStatus::Ended);
    assert!(manager.record().high_score(GameId::Defense).is_some());
    let _ = std::fs::remove_file(path);
}

#[test]
fn every_cataloged_game_survives_a_short_scripted_burst() {
    let path = scratch_path();
    let mut manager =
        SessionManager::new(build_catalog(), Box::new(FileStore::new(path.clone())));

    for id in GameId::ALL {
        let _ = autoplay::run(&mut manager, *id, 11, 240, 1.0 / 60.0);
        assert_eq!(
            manager.status(*id),
            SessionStatus::Ended,
            "{id} must finalize one way or the other"
        );
    }
    let _ = std::fs::remove_file(path);
}

//! Scripted smoke input. Not an AI: a fixed pattern of pointer sweeps,
//! taps, and key presses that exercises every input path of a game so
//! the session layer can be soaked end to end without a browser.

use arcade_core::game_trait::{GameConfig, GameId};
use arcade_core::input::{Key, RawEvent};
use arcade_core::session::{SessionManager, SessionStatus};

/// Drive one seeded autoplay run: start the game, feed the input
/// script for up to `max_frames` frames of `dt`, stop if it is still
/// going. Returns whether the game ended on its own.
pub fn run(
    manager: &mut SessionManager,
    id: GameId,
    seed: u64,
    max_frames: u32,
    dt: f32,
) -> bool {
    let config = GameConfig {
        seed,
        currency: manager.record().currency,
        upgrades: manager.record().upgrades.clone(),
        custom: Default::default(),
    };
    if !manager.start_with_config(id, config) {
        return false;
    }
    for frame in 0..max_frames {
        for event in script(frame, dt) {
            manager.route(id, event);
        }
        manager.advance(dt);
        if manager.status(id) == SessionStatus::Ended {
            return true;
        }
    }
    manager.stop(id);
    false
}

/// The input pattern for one frame: a pointer sweeping the field, a tap
/// every half second, a movement key toggled every second, and the
/// occasional jump and special.
fn script(frame: u32, dt: f32) -> Vec<RawEvent> {
    let t = frame as f32 * dt;
    let sweep = 400.0 + 360.0 * (t * 0.7).sin();
    let mut events = vec![RawEvent::PointerMove { x: sweep, y: 300.0 }];
    if frame % 30 == 15 {
        events.push(RawEvent::PointerDown { x: sweep, y: 300.0 });
    }
    match frame % 120 {
        0 => events.push(RawEvent::KeyDown(Key::ArrowLeft)),
        59 => {
            events.push(RawEvent::KeyUp(Key::ArrowLeft));
            events.push(RawEvent::KeyDown(Key::ArrowRight));
        },
        119 => events.push(RawEvent::KeyUp(Key::ArrowRight)),
        _ => {},
    }
    if frame % 90 == 45 {
        events.push(RawEvent::KeyDown(Key::ArrowUp));
        events.push(RawEvent::KeyUp(Key::ArrowUp));
    }
    if frame % 300 == 150 {
        events.push(RawEvent::KeyDown(Key::Enter));
        events.push(RawEvent::KeyUp(Key::Enter));
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_is_deterministic_and_always_moves_the_pointer() {
        for frame in 0..600 {
            let a = script(frame, 1.0 / 60.0);
            let b = script(frame, 1.0 / 60.0);
            assert_eq!(a, b);
            assert!(matches!(a[0], RawEvent::PointerMove { .. }));
        }
    }
}

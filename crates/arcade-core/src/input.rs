//! Normalizes raw keyboard/pointer/touch events into the per-game intent
//! vocabulary. The router is owned by a session and detached on
//! teardown, after which it silently drops everything it is fed.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Discrete input intents shared by all games. Pointer-driven games
/// additionally consume the continuous pointer sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    Jump,
    Block,
    Attack,
    SpecialAttack,
}

/// Physical keys the router understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    KeyA,
    KeyD,
    KeyW,
    KeyS,
    Space,
    Shift,
    Enter,
}

/// Raw device events as the host environment delivers them. Coordinates
/// are field units (the host scales from CSS pixels before routing).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RawEvent {
    KeyDown(Key),
    KeyUp(Key),
    PointerMove { x: f32, y: f32 },
    PointerDown { x: f32, y: f32 },
    TouchStart { x: f32, y: f32 },
}

/// Remappable key-to-intent bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    bindings: Vec<(Key, Intent)>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            bindings: vec![
                (Key::ArrowLeft, Intent::MoveLeft),
                (Key::KeyA, Intent::MoveLeft),
                (Key::ArrowRight, Intent::MoveRight),
                (Key::KeyD, Intent::MoveRight),
                (Key::ArrowUp, Intent::Jump),
                (Key::KeyW, Intent::Jump),
                (Key::ArrowDown, Intent::Block),
                (Key::KeyS, Intent::Block),
                (Key::Space, Intent::Attack),
                (Key::Shift, Intent::Block),
                (Key::Enter, Intent::SpecialAttack),
            ],
        }
    }
}

impl KeyBindings {
    pub fn intent_for(&self, key: Key) -> Option<Intent> {
        self.bindings
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, intent)| *intent)
    }

    /// Rebind a key, replacing any existing binding for it.
    pub fn bind(&mut self, key: Key, intent: Intent) {
        self.bindings.retain(|(k, _)| *k != key);
        self.bindings.push((key, intent));
    }
}

/// Per-session input router. Key presses enqueue their bound intent once;
/// held movement keys re-emit their intent on every drain so paddles and
/// fighters keep moving while the key is down. Pointer-down and touch
/// events both update the pointer sample and enqueue `Attack`, which is
/// what the tap-driven games treat as "tap here".
#[derive(Debug)]
pub struct InputRouter {
    bindings: KeyBindings,
    queue: VecDeque<Intent>,
    held: Vec<Key>,
    pointer: Option<(f32, f32)>,
    attached: bool,
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new(KeyBindings::default())
    }
}

impl InputRouter {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            queue: VecDeque::new(),
            held: Vec::new(),
            pointer: None,
            attached: true,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Stop accepting events and drop anything queued. Part of session
    /// teardown; push/drain are no-ops afterwards.
    pub fn detach(&mut self) {
        self.attached = false;
        self.queue.clear();
        self.held.clear();
        self.pointer = None;
    }

    pub fn push(&mut self, event: RawEvent) {
        if !self.attached {
            return;
        }
        match event {
            RawEvent::KeyDown(key) => {
                if let Some(intent) = self.bindings.intent_for(key) {
                    self.queue.push_back(intent);
                }
                if !self.held.contains(&key) {
                    self.held.push(key);
                }
            },
            RawEvent::KeyUp(key) => {
                self.held.retain(|k| *k != key);
            },
            RawEvent::PointerMove { x, y } => {
                self.pointer = Some((x, y));
            },
            RawEvent::PointerDown { x, y } | RawEvent::TouchStart { x, y } => {
                self.pointer = Some((x, y));
                self.queue.push_back(Intent::Attack);
            },
        }
    }

    /// Latest pointer sample, if any arrived since the last take.
    pub fn take_pointer(&mut self) -> Option<(f32, f32)> {
        self.pointer.take()
    }

    /// Drain queued intents plus one repeat per held movement key.
    pub fn drain(&mut self) -> Vec<Intent> {
        if !self.attached {
            return Vec::new();
        }
        let mut intents: Vec<Intent> = self.queue.drain(..).collect();
        for key in &self.held {
            if let Some(intent @ (Intent::MoveLeft | Intent::MoveRight)) =
                self.bindings.intent_for(*key)
                && !intents.contains(&intent)
            {
                intents.push(intent);
            }
        }
        intents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_down_maps_to_bound_intent() {
        let mut router = InputRouter::default();
        router.push(RawEvent::KeyDown(Key::Space));
        assert_eq!(router.drain(), vec![Intent::Attack]);
        assert!(router.drain().is_empty());
    }

    #[test]
    fn held_movement_repeats_until_key_up() {
        let mut router = InputRouter::default();
        router.push(RawEvent::KeyDown(Key::ArrowLeft));
        assert_eq!(router.drain(), vec![Intent::MoveLeft]);
        assert_eq!(router.drain(), vec![Intent::MoveLeft]);
        router.push(RawEvent::KeyUp(Key::ArrowLeft));
        assert!(router.drain().is_empty());
    }

    #[test]
    fn tap_updates_pointer_and_queues_attack() {
        let mut router = InputRouter::default();
        router.push(RawEvent::TouchStart { x: 120.0, y: 80.0 });
        assert_eq!(router.take_pointer(), Some((120.0, 80.0)));
        assert_eq!(router.take_pointer(), None);
        assert_eq!(router.drain(), vec![Intent::Attack]);
    }

    #[test]
    fn detached_router_drops_everything() {
        let mut router = InputRouter::default();
        router.push(RawEvent::KeyDown(Key::ArrowRight));
        router.detach();
        router.push(RawEvent::KeyDown(Key::Space));
        router.push(RawEvent::PointerMove { x: 1.0, y: 2.0 });
        assert!(router.drain().is_empty());
        assert_eq!(router.take_pointer(), None);
    }

    #[test]
    fn rebinding_replaces_old_binding() {
        let mut bindings = KeyBindings::default();
        bindings.bind(Key::Space, Intent::Jump);
        assert_eq!(bindings.intent_for(Key::Space), Some(Intent::Jump));
    }
}

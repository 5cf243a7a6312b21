use serde::{Deserialize, Serialize};

/// Registry-scoped entity identifier. Monotonically increasing per
/// registry, so id order doubles as registration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntityId(pub u64);

/// What a live game object is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Token,
    Obstacle,
    Enemy,
    Projectile,
    Tower,
    Block,
    Player,
    Card,
    Target,
}

/// 2D position/velocity in field units. Origin top-left, y grows down,
/// matching the browser canvas the UI sink renders to.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Collision footprint: axis-aligned box (half extents) or circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Box { half_w: f32, half_h: f32 },
    Circle { radius: f32 },
}

impl Shape {
    /// Bounding half extents; a circle's box is its enclosing square.
    pub fn half_extents(&self) -> (f32, f32) {
        match self {
            Shape::Box { half_w, half_h } => (*half_w, *half_h),
            Shape::Circle { radius } => (*radius, *radius),
        }
    }
}

/// Gameplay attributes. Games use the fields they need and leave the
/// rest at defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Attrs {
    pub hp: i32,
    pub damage: i32,
    /// Seconds remaining on a slow effect (tower defense frost shots).
    pub slow_remaining: f32,
    /// Game-specific discriminator (lane index, card face, tower kind...).
    pub tag: u32,
}

/// A live game object owned by its session's registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub shape: Shape,
    pub vel: Vec2,
    /// Index into a precomputed path, for path-following enemies.
    pub path_index: usize,
    pub attrs: Attrs,
}

impl Entity {
    /// Build an entity; the registry assigns the real id on `add`.
    pub fn new(kind: EntityKind, pos: Vec2, shape: Shape) -> Self {
        Self {
            id: EntityId(0),
            kind,
            pos,
            shape,
            vel: Vec2::ZERO,
            path_index: 0,
            attrs: Attrs::default(),
        }
    }

    pub fn with_vel(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.attrs.hp = hp;
        self
    }

    pub fn with_damage(mut self, damage: i32) -> Self {
        self.attrs.damage = damage;
        self
    }

    pub fn with_tag(mut self, tag: u32) -> Self {
        self.attrs.tag = tag;
        self
    }
}

/// The live set of game objects for one session instance.
///
/// Iteration order is registration order, and removed entities are gone
/// immediately: a collision pass that removed an entity never sees it
/// again within the same pass. Instance-scoped by construction; nothing
/// here is shared across sessions.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    next_id: u64,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
        }
    }

    /// Insert an entity, assigning the next id. Returns the assigned id.
    pub fn add(&mut self, mut entity: Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        entity.id = id;
        self.entities.push(entity);
        id
    }

    /// Remove and return an entity. Safe to call twice; the second call
    /// is a no-op returning None.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(idx))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Apply a patch to an entity in place. Returns false if it is gone.
    pub fn update(&mut self, id: EntityId, patch: impl FnOnce(&mut Entity)) -> bool {
        match self.get_mut(id) {
            Some(entity) => {
                patch(entity);
                true
            },
            None => false,
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.iter().any(|e| e.id == id)
    }

    /// All live entities in registration order.
    pub fn all(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    /// Ids of one kind, snapshot for loops that mutate while iterating.
    pub fn ids_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        self.of_kind(kind).map(|e| e.id).collect()
    }

    pub fn count_of_kind(&self, kind: EntityKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Drop every entity. Ids are not reused afterwards.
    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_at(x: f32) -> Entity {
        Entity::new(
            EntityKind::Token,
            Vec2::new(x, 0.0),
            Shape::Circle { radius: 5.0 },
        )
    }

    #[test]
    fn ids_are_monotonic_registration_order() {
        let mut reg = EntityRegistry::new();
        let a = reg.add(token_at(1.0));
        let b = reg.add(token_at(2.0));
        let c = reg.add(token_at(3.0));
        assert!(a < b && b < c);
        let order: Vec<EntityId> = reg.all().map(|e| e.id).collect();
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn removed_entity_is_not_yielded_again() {
        let mut reg = EntityRegistry::new();
        let a = reg.add(token_at(1.0));
        let b = reg.add(token_at(2.0));
        assert!(reg.remove(a).is_some());
        assert!(reg.remove(a).is_none(), "double remove must be a no-op");
        assert!(!reg.contains(a));
        assert_eq!(reg.all().count(), 1);
        assert!(reg.contains(b));
    }

    #[test]
    fn ids_not_reused_after_clear() {
        let mut reg = EntityRegistry::new();
        let a = reg.add(token_at(1.0));
        reg.clear();
        let b = reg.add(token_at(2.0));
        assert!(b > a);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn update_patches_in_place() {
        let mut reg = EntityRegistry::new();
        let a = reg.add(token_at(1.0).with_hp(10));
        assert!(reg.update(a, |e| e.attrs.hp -= 4));
        assert_eq!(reg.get(a).unwrap().attrs.hp, 6);
        reg.remove(a);
        assert!(!reg.update(a, |e| e.attrs.hp = 0));
    }
}

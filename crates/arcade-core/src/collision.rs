//! Pure collision math shared by every game. No game state in here;
//! callers decide what a hit means.

use crate::entity::{Entity, EntityId, EntityKind, EntityRegistry};

/// Axis-aligned box overlap on raw centers and half extents, with each
/// box's edges shrunk inward by its margin before comparing. Symmetric in
/// its two operands.
pub fn aabb_overlap(
    ax: f32,
    ay: f32,
    a_half_w: f32,
    a_half_h: f32,
    bx: f32,
    by: f32,
    b_half_w: f32,
    b_half_h: f32,
    margin_a: f32,
    margin_b: f32,
) -> bool {
    let aw = (a_half_w - margin_a).max(0.0);
    let ah = (a_half_h - margin_a).max(0.0);
    let bw = (b_half_w - margin_b).max(0.0);
    let bh = (b_half_h - margin_b).max(0.0);
    (ax - bx).abs() < aw + bw && (ay - by).abs() < ah + bh
}

/// Whether two entities' bounding boxes overlap after shrinking each by
/// its margin. Circles use their enclosing square.
pub fn overlaps(a: &Entity, b: &Entity, margin_a: f32, margin_b: f32) -> bool {
    let (aw, ah) = a.shape.half_extents();
    let (bw, bh) = b.shape.half_extents();
    aabb_overlap(
        a.pos.x, a.pos.y, aw, ah, b.pos.x, b.pos.y, bw, bh, margin_a, margin_b,
    )
}

/// Whether `b`'s center is strictly inside `range` of `a`'s center.
/// Used for circular proximity (tower range, tap targets).
pub fn within_range(a: &Entity, b: &Entity, range: f32) -> bool {
    a.pos.distance(&b.pos) < range
}

/// One frame's collision pass between two entity kinds.
///
/// Walks both sides in registration order and emits at most one pair per
/// `right` entity (the side that resolution removes), so a caller that
/// removes each reported right entity never double-counts it. The `left`
/// side may appear in several pairs (a paddle catches every token it
/// touches in the same frame).
pub fn collide_pairs(
    registry: &EntityRegistry,
    left: EntityKind,
    right: EntityKind,
    mut hit: impl FnMut(&Entity, &Entity) -> bool,
) -> Vec<(EntityId, EntityId)> {
    let mut pairs = Vec::new();
    let mut consumed: Vec<EntityId> = Vec::new();
    for l in registry.of_kind(left) {
        for r in registry.of_kind(right) {
            if consumed.contains(&r.id) {
                continue;
            }
            if hit(l, r) {
                consumed.push(r.id);
                pairs.push((l.id, r.id));
            }
        }
    }
    pairs
}

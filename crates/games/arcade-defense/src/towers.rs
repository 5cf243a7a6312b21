//! Tower catalog and targeting.

use serde::{Deserialize, Serialize};

use arcade_core::collision::within_range;
use arcade_core::entity::{Entity, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TowerKind {
    Fire,
    Frost,
    Cannon,
}

/// Per-kind combat numbers. The catalog is fixed; balance lives here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TowerStats {
    pub damage: i32,
    pub range: f32,
    pub fire_secs: f32,
    pub cost: u64,
    /// Seconds of slow applied on hit; zero for non-frost towers.
    pub slow_secs: f32,
}

impl TowerKind {
    pub const ALL: [TowerKind; 3] = [TowerKind::Fire, TowerKind::Frost, TowerKind::Cannon];

    pub fn stats(self) -> TowerStats {
        match self {
            TowerKind::Fire => TowerStats {
                damage: 25,
                range: 80.0,
                fire_secs: 0.6,
                cost: 50,
                slow_secs: 0.0,
            },
            TowerKind::Frost => TowerStats {
                damage: 10,
                range: 70.0,
                fire_secs: 0.9,
                cost: 75,
                slow_secs: 2.0,
            },
            TowerKind::Cannon => TowerStats {
                damage: 60,
                range: 120.0,
                fire_secs: 1.5,
                cost: 110,
                slow_secs: 0.0,
            },
        }
    }

    /// Stable tag stored on the tower entity.
    pub fn tag(self) -> u32 {
        match self {
            TowerKind::Fire => 0,
            TowerKind::Frost => 1,
            TowerKind::Cannon => 2,
        }
    }

    pub fn from_tag(tag: u32) -> Option<TowerKind> {
        TowerKind::ALL.into_iter().find(|k| k.tag() == tag)
    }

    pub fn next(self) -> TowerKind {
        match self {
            TowerKind::Fire => TowerKind::Frost,
            TowerKind::Frost => TowerKind::Cannon,
            TowerKind::Cannon => TowerKind::Fire,
        }
    }
}

/// Pick the tower's target: the nearest enemy strictly inside `range`,
/// ties broken by lowest entity id so the choice is deterministic for a
/// given registry state.
pub fn select_target<'a>(
    tower: &Entity,
    enemies: impl Iterator<Item = &'a Entity>,
    range: f32,
) -> Option<EntityId> {
    let mut best: Option<(f32, EntityId)> = None;
    for enemy in enemies {
        if !within_range(tower, enemy, range) {
            continue;
        }
        let dist = tower.pos.distance(&enemy.pos);
        let better = match best {
            None => true,
            Some((best_dist, best_id)) => {
                dist < best_dist || (dist == best_dist && enemy.id < best_id)
            },
        };
        if better {
            best = Some((dist, enemy.id));
        }
    }
    best.map(|(_, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_core::entity::{EntityKind, EntityRegistry, Shape, Vec2};

    fn enemy_at(reg: &mut EntityRegistry, x: f32, y: f32) -> EntityId {
        reg.add(
            Entity::new(
                EntityKind::Enemy,
                Vec2::new(x, y),
                Shape::Circle { radius: 10.0 },
            )
            .with_hp(50),
        )
    }

    fn tower_at(x: f32, y: f32) -> Entity {
        Entity::new(
            EntityKind::Tower,
            Vec2::new(x, y),
            Shape::Box {
                half_w: 40.0,
                half_h: 40.0,
            },
        )
    }

    #[test]
    fn catalog_matches_the_balance_sheet() {
        let fire = TowerKind::Fire.stats();
        assert_eq!((fire.damage, fire.cost), (25, 50));
        assert_eq!(fire.range, 80.0);
        let frost = TowerKind::Frost.stats();
        assert_eq!(frost.slow_secs, 2.0);
        let cannon = TowerKind::Cannon.stats();
        assert_eq!((cannon.damage, cannon.cost), (60, 110));
        for kind in TowerKind::ALL {
            assert_eq!(TowerKind::from_tag(kind.tag()), Some(kind));
        }
    }

    #[test]
    fn nearest_enemy_wins() {
        let mut reg = EntityRegistry::new();
        let far = enemy_at(&mut reg, 70.0, 0.0);
        let near = enemy_at(&mut reg, 30.0, 0.0);
        let tower = tower_at(0.0, 0.0);
        assert_eq!(
            select_target(&tower, reg.of_kind(EntityKind::Enemy), 80.0),
            Some(near)
        );
        let _ = far;
    }

    #[test]
    fn range_boundary_is_exclusive() {
        let mut reg = EntityRegistry::new();
        let _ = enemy_at(&mut reg, 80.0, 0.0);
        let tower = tower_at(0.0, 0.0);
        assert_eq!(
            select_target(&tower, reg.of_kind(EntityKind::Enemy), 80.0),
            None,
            "an enemy exactly at range is not strictly inside"
        );
        let inside = enemy_at(&mut reg, 79.9, 0.0);
        assert_eq!(
            select_target(&tower, reg.of_kind(EntityKind::Enemy), 80.0),
            Some(inside)
        );
    }

    #[test]
    fn distance_tie_goes_to_lowest_id() {
        let mut reg = EntityRegistry::new();
        let first = enemy_at(&mut reg, 50.0, 0.0);
        let second = enemy_at(&mut reg, -50.0, 0.0);
        let tower = tower_at(0.0, 0.0);
        assert!(first < second);
        assert_eq!(
            select_target(&tower, reg.of_kind(EntityKind::Enemy), 80.0),
            Some(first)
        );
    }
}

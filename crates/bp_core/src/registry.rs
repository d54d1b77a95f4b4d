//! Structure storage and spatial queries.
//!
//! Stands in for the host game's entity registry: the economy only needs
//! id lookup, deterministic iteration, and "everything within a radius".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Structure};
use crate::math::{saturating_coord, Fixed, Vec3Fixed};

/// Storage for all structures in the world.
///
/// Uses a `HashMap` for O(1) lookup by ID, with deterministic
/// iteration via sorted keys when processing systems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructureRegistry {
    /// Map of entity ID to structure data.
    structures: HashMap<EntityId, Structure>,
    /// Next entity ID to assign.
    next_id: EntityId,
}

impl StructureRegistry {
    /// Create empty structure storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            structures: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new structure and return its assigned ID.
    pub fn insert(&mut self, mut structure: Structure) -> EntityId {
        // Deserialized or defaulted registries may start at zero
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        structure.id = id;
        self.structures.insert(id, structure);
        id
    }

    /// Remove a structure by ID.
    pub fn remove(&mut self, id: EntityId) -> Option<Structure> {
        self.structures.remove(&id)
    }

    /// Get a structure by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Structure> {
        self.structures.get(&id)
    }

    /// Get a mutable reference to a structure by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Structure> {
        self.structures.get_mut(&id)
    }

    /// Check if a structure exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.structures.contains_key(&id)
    }

    /// Get the number of structures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.structures.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    /// Get sorted entity IDs for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.structures.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all structures (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = &Structure> {
        self.structures.values()
    }

    /// Iterate over structures within `radius` of `center` (inclusive).
    ///
    /// Order is unspecified. Each call starts a fresh query.
    pub fn within_radius(&self, center: Vec3Fixed, radius: f32) -> impl Iterator<Item = &Structure> {
        let radius: Fixed = saturating_coord(radius.max(0.0));
        self.structures
            .values()
            .filter(move |s| center.within_radius(s.position, radius))
    }

    /// IDs of active mining structures within `radius` of `center`,
    /// excluding `exclude`, in ascending ID order.
    ///
    /// Sorted so repeated float products come out bit-identical.
    #[must_use]
    pub fn active_miners_near(
        &self,
        center: Vec3Fixed,
        radius: f32,
        exclude: Option<EntityId>,
    ) -> Vec<EntityId> {
        let mut ids: Vec<_> = self
            .within_radius(center, radius)
            .filter(|s| Some(s.id) != exclude && s.is_active_miner())
            .map(|s| s.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::StructureKind;

    fn drill_at(x: i32) -> Structure {
        let mut s = Structure::new(0, StructureKind::Drill, Vec3Fixed::from_units(x, 0, 0), 100);
        s.spawned = true;
        s
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut registry = StructureRegistry::new();
        let a = registry.insert(drill_at(0));
        let b = registry.insert(drill_at(10));
        assert_eq!((a, b), (1, 2));
        assert_eq!(registry.get(b).map(|s| s.id), Some(2));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_default_registry_never_assigns_zero() {
        let mut registry = StructureRegistry::default();
        assert_eq!(registry.insert(drill_at(0)), 1);
    }

    #[test]
    fn test_sorted_ids_after_removal() {
        let mut registry = StructureRegistry::new();
        for x in 0..5 {
            registry.insert(drill_at(x));
        }
        registry.remove(3);
        assert_eq!(registry.sorted_ids(), vec![1, 2, 4, 5]);
        assert!(!registry.contains(3));
    }

    #[test]
    fn test_within_radius_inclusive() {
        let mut registry = StructureRegistry::new();
        registry.insert(drill_at(0));
        registry.insert(drill_at(100));
        registry.insert(drill_at(101));

        let mut found: Vec<_> = registry
            .within_radius(Vec3Fixed::ZERO, 100.0)
            .map(|s| s.id)
            .collect();
        found.sort_unstable();
        assert_eq!(found, vec![1, 2]);
    }

    #[test]
    fn test_active_miners_near_excludes_self_and_inactive() {
        let mut registry = StructureRegistry::new();
        let me = registry.insert(drill_at(0));
        let active = registry.insert(drill_at(10));
        let mut unpowered = drill_at(20);
        unpowered.powered = false;
        registry.insert(unpowered);
        let mut reactor = drill_at(30);
        reactor.kind = StructureKind::Reactor;
        registry.insert(reactor);

        let near = registry.active_miners_near(Vec3Fixed::ZERO, 1000.0, Some(me));
        assert_eq!(near, vec![active]);
    }
}

//! Model-space vertex snapshots for solids under vertex editing.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::solid::read_positions;

/// One record per position-buffer entry, per registered solid.
///
/// A solid is registered lazily the first time it is picked for vertex
/// editing, never again afterwards. The record count and order are fixed at
/// registration, so selection indices stay aligned with the mesh buffer for
/// the rest of the session. Only the positions themselves change, through
/// [`VertexStore::positions_mut`] and [`VertexStore::refresh`].
#[derive(Resource, Default)]
pub struct VertexStore {
    records: HashMap<Entity, Vec<Vec3>>,
}

impl VertexStore {
    /// Snapshot `mesh` for `solid` unless it is already registered.
    ///
    /// Returns false when the mesh carries no position data, in which case
    /// nothing is stored and the solid stays unregistered.
    pub fn register(&mut self, solid: Entity, mesh: &Mesh) -> bool {
        if self.records.contains_key(&solid) {
            return true;
        }
        let Some(positions) = read_positions(mesh) else {
            return false;
        };
        if positions.is_empty() {
            return false;
        }
        debug!("registered {} vertex records for {solid}", positions.len());
        self.records.insert(solid, positions);
        true
    }

    /// Register from an explicit position list. Same first-wins rule as
    /// [`VertexStore::register`].
    pub fn register_positions(&mut self, solid: Entity, positions: Vec<Vec3>) -> bool {
        if self.records.contains_key(&solid) {
            return true;
        }
        if positions.is_empty() {
            return false;
        }
        self.records.insert(solid, positions);
        true
    }

    pub fn contains(&self, solid: Entity) -> bool {
        self.records.contains_key(&solid)
    }

    pub fn positions(&self, solid: Entity) -> Option<&[Vec3]> {
        self.records.get(&solid).map(Vec::as_slice)
    }

    pub fn positions_mut(&mut self, solid: Entity) -> Option<&mut Vec<Vec3>> {
        self.records.get_mut(&solid)
    }

    /// Replace a solid's records with freshly baked positions. Count and
    /// order must match the registered buffer.
    pub fn refresh(&mut self, solid: Entity, positions: Vec<Vec3>) {
        if let Some(records) = self.records.get_mut(&solid) {
            debug_assert_eq!(records.len(), positions.len());
            *records = positions;
        }
    }

    /// Drop a despawned solid's records.
    pub fn forget(&mut self, solid: Entity) {
        self.records.remove(&solid);
    }
}

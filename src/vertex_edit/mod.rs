//! Vertex-cluster editing of solids.
//!
//! Clicking a solid snapshots it into the [`VertexStore`] (first pick only),
//! selects every record strictly within the selection radius of the hit
//! point, marks each selected record with a sphere, and attaches the
//! translate handle at the hit point. Releasing a handle drag applies the
//! world-space delta to the selected records, rewrites the mesh buffer, and
//! bakes the solid's transform back to identity so record positions remain
//! world positions.

mod interaction;
mod markers;

use bevy::prelude::*;

pub use markers::VertexMarker;

use crate::handle::{DragHandle, HandleSet};
use crate::highlight::{release_solid, HighlightRegistry};
use crate::modes::EditorMode;
use crate::solid::Solid;
use crate::vertex_store::VertexStore;

/// World-space selection radius around the picked point.
#[derive(Resource)]
pub struct SelectionRadius(pub f32);

impl Default for SelectionRadius {
    fn default() -> Self {
        Self(0.5)
    }
}

impl SelectionRadius {
    pub const MIN: f32 = 0.1;
    pub const MAX: f32 = 5.0;
    pub const STEP: f32 = 0.1;
}

/// Optional restriction of selection to bounding-box corner vertices.
#[derive(Resource, Default)]
pub struct SelectionConfig {
    pub corners_only: bool,
}

/// The active solid plus the indices of its selected records.
///
/// Replaced wholesale on every pick; indices are always sorted ascending
/// because selection walks the records in order.
#[derive(Resource, Default)]
pub struct VertexSelection {
    pub solid: Option<Entity>,
    pub indices: Vec<usize>,
    /// Drag reference point. Advances by the applied delta on drag end so
    /// consecutive drags compose.
    pub anchor: Vec3,
    /// Last pick point, kept so a radius change can re-run the selection.
    pub last_hit: Option<Vec3>,
}

impl VertexSelection {
    pub fn is_empty(&self) -> bool {
        self.solid.is_none() || self.indices.is_empty()
    }

    pub fn clear(&mut self) {
        self.solid = None;
        self.indices.clear();
        self.anchor = Vec3::ZERO;
        self.last_hit = None;
    }
}

// ---------------------------------------------------------------------------
// Selection and drag cores
// ---------------------------------------------------------------------------

/// Indices of records whose world position lies strictly within `radius` of
/// `point`. Records exactly at the radius are excluded.
pub fn vertices_within(
    records: &[Vec3],
    world: &GlobalTransform,
    point: Vec3,
    radius: f32,
) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| world.transform_point(**record).distance(point) < radius)
        .map(|(index, _)| index)
        .collect()
}

/// Keep only indices whose record sits on a corner of the records' bounding
/// box, every coordinate at an extreme.
pub fn retain_corner_indices(indices: &mut Vec<usize>, records: &[Vec3]) {
    let Some(first) = records.first() else {
        indices.clear();
        return;
    };
    let mut min = *first;
    let mut max = *first;
    for record in records {
        min = min.min(*record);
        max = max.max(*record);
    }
    let tol = 1e-4;
    indices.retain(|&i| {
        let p = records[i];
        ((p.x - min.x).abs() < tol || (p.x - max.x).abs() < tol)
            && ((p.y - min.y).abs() < tol || (p.y - max.y).abs() < tol)
            && ((p.z - min.z).abs() < tol || (p.z - max.z).abs() < tol)
    });
}

/// Apply a world-space delta to the selected records in place. Unknown
/// indices are skipped.
pub fn apply_delta(records: &mut [Vec3], indices: &[usize], delta: Vec3) {
    for &index in indices {
        if let Some(record) = records.get_mut(index) {
            *record += delta;
        }
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct VertexEditPlugin;

impl Plugin for VertexEditPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VertexStore>()
            .init_resource::<VertexSelection>()
            .init_resource::<SelectionRadius>()
            .init_resource::<SelectionConfig>()
            .add_systems(Startup, markers::setup_marker_assets)
            .add_systems(
                Update,
                (
                    interaction::adjust_radius,
                    interaction::handle_vertex_pick,
                    interaction::reselect_on_radius_change,
                    interaction::apply_drag_on_release,
                )
                    .chain()
                    .after(HandleSet)
                    .run_if(in_state(EditorMode::EditVertex)),
            )
            .add_systems(OnExit(EditorMode::EditVertex), deactivate)
            .add_observer(on_solid_removed);
    }
}

/// Tear down everything the tool put in the scene. The store keeps its
/// records so re-entering the mode resumes from the edited positions.
pub(crate) fn deactivate(
    mut commands: Commands,
    marker_query: Query<Entity, With<VertexMarker>>,
    handles: Query<Entity, With<DragHandle>>,
    mut selection: ResMut<VertexSelection>,
    mut registry: ResMut<HighlightRegistry>,
    solids: Query<&MeshMaterial3d<StandardMaterial>, With<Solid>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if let Some(solid) = selection.solid {
        release_solid(&mut registry, &mut materials, solids.get(solid).ok(), solid);
    }
    selection.clear();
    markers::clear_markers(&mut commands, &marker_query);
    crate::handle::despawn_handles(&mut commands, &handles);
}

/// Drop a despawned solid's records, highlights, selection, and markers.
fn on_solid_removed(
    trigger: On<Remove, Solid>,
    mut store: ResMut<VertexStore>,
    mut registry: ResMut<HighlightRegistry>,
    mut selection: ResMut<VertexSelection>,
    marker_query: Query<(Entity, &VertexMarker)>,
    mut commands: Commands,
) {
    let solid = trigger.event_target();
    store.forget(solid);
    registry.forget_solid(solid);
    if selection.solid == Some(solid) {
        selection.clear();
    }
    for (entity, marker) in &marker_query {
        if marker.solid == solid
            && let Ok(mut entity_commands) = commands.get_entity(entity)
        {
            entity_commands.despawn();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Input systems for the vertex editing tool.

use bevy::picking::mesh_picking::ray_cast::{MeshRayCast, MeshRayCastSettings, RayCastVisibility};
use bevy::prelude::*;

use crate::handle::{self, DragHandle, HandleDragEnded, HandleDragState};
use crate::highlight::{grab_solid, release_solid, HighlightRegistry};
use crate::solid::{bake_transform, read_positions, write_positions, Solid};
use crate::vertex_store::VertexStore;

use super::markers::{self, MarkerAssets, VertexMarker};
use super::{
    apply_delta, retain_corner_indices, vertices_within, SelectionConfig, SelectionRadius,
    VertexSelection,
};

// ---------------------------------------------------------------------------
// Radius control
// ---------------------------------------------------------------------------

pub(super) fn adjust_radius(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut radius: ResMut<SelectionRadius>,
) {
    let mut value = radius.0;
    if keyboard.just_pressed(KeyCode::BracketLeft) {
        value -= SelectionRadius::STEP;
    }
    if keyboard.just_pressed(KeyCode::BracketRight) {
        value += SelectionRadius::STEP;
    }
    let value = value.clamp(SelectionRadius::MIN, SelectionRadius::MAX);
    if (value - radius.0).abs() > f32::EPSILON {
        radius.0 = value;
        info!("selection radius: {value:.1}");
    }
}

// ---------------------------------------------------------------------------
// Picking
// ---------------------------------------------------------------------------

fn clear_selection(
    selection: &mut VertexSelection,
    registry: &mut HighlightRegistry,
    materials: &mut Assets<StandardMaterial>,
    material: Option<&MeshMaterial3d<StandardMaterial>>,
    commands: &mut Commands,
    marker_query: &Query<Entity, With<VertexMarker>>,
    handles: &Query<Entity, With<DragHandle>>,
) {
    if let Some(solid) = selection.solid.take() {
        release_solid(registry, materials, material, solid);
    }
    selection.clear();
    markers::clear_markers(commands, marker_query);
    handle::despawn_handles(commands, handles);
}

/// Replace the selection with the records around `hit_point`, respawning
/// markers and the drag handle to match.
#[allow(clippy::too_many_arguments)]
fn rebuild_selection(
    commands: &mut Commands,
    marker_assets: &MarkerAssets,
    marker_query: &Query<Entity, With<VertexMarker>>,
    handles: &Query<Entity, With<DragHandle>>,
    store: &VertexStore,
    selection: &mut VertexSelection,
    solid: Entity,
    world: &GlobalTransform,
    hit_point: Vec3,
    radius: f32,
    corners_only: bool,
) {
    let Some(records) = store.positions(solid) else {
        return;
    };
    let mut indices = vertices_within(records, world, hit_point, radius);
    if corners_only {
        retain_corner_indices(&mut indices, records);
    }

    markers::clear_markers(commands, marker_query);
    handle::despawn_handles(commands, handles);
    for &index in &indices {
        markers::spawn_marker(
            commands,
            marker_assets,
            solid,
            index,
            world.transform_point(records[index]),
        );
    }
    if !indices.is_empty() {
        handle::spawn_handle(commands, hit_point);
    }

    debug!("selected {} vertices on {solid}", indices.len());
    selection.solid = Some(solid);
    selection.indices = indices;
    selection.anchor = hit_point;
    selection.last_hit = Some(hit_point);
}

pub(super) fn handle_vertex_pick(
    mouse: Res<ButtonInput<MouseButton>>,
    drag_state: Res<HandleDragState>,
    windows: Query<&Window>,
    camera_query: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    solids: Query<(&GlobalTransform, &Mesh3d, &MeshMaterial3d<StandardMaterial>), With<Solid>>,
    meshes: Res<Assets<Mesh>>,
    marker_assets: Res<MarkerAssets>,
    marker_query: Query<Entity, With<VertexMarker>>,
    handles: Query<Entity, With<DragHandle>>,
    radius: Res<SelectionRadius>,
    config: Res<SelectionConfig>,
    mut store: ResMut<VertexStore>,
    mut selection: ResMut<VertexSelection>,
    mut registry: ResMut<HighlightRegistry>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut ray_cast: MeshRayCast,
    mut commands: Commands,
) {
    let current_material = |entity: Option<Entity>| {
        entity.and_then(|e| solids.get(e).ok()).map(|(_, _, material)| material)
    };

    if mouse.just_pressed(MouseButton::Right) {
        let material = current_material(selection.solid);
        clear_selection(
            &mut selection, &mut registry, &mut materials, material,
            &mut commands, &marker_query, &handles,
        );
        return;
    }
    if !mouse.just_pressed(MouseButton::Left) || drag_state.consumes_click() {
        return;
    }

    let mut picked = None;
    if let Ok(window) = windows.single()
        && let Some(cursor) = window.cursor_position()
        && let Ok((camera, camera_transform)) = camera_query.single()
        && let Ok(ray) = camera.viewport_to_world(camera_transform, cursor)
    {
        let settings = MeshRayCastSettings::default().with_visibility(RayCastVisibility::Any);
        picked = ray_cast
            .cast_ray(ray, &settings)
            .iter()
            .find(|(entity, _)| solids.contains(*entity))
            .map(|(entity, hit)| (*entity, hit.point));
    }

    let Some((solid, hit_point)) = picked else {
        let material = current_material(selection.solid);
        clear_selection(
            &mut selection, &mut registry, &mut materials, material,
            &mut commands, &marker_query, &handles,
        );
        return;
    };
    let Ok((world, mesh3d, material)) = solids.get(solid) else {
        return;
    };
    let Some(mesh) = meshes.get(&mesh3d.0) else {
        return;
    };
    if !store.register(solid, mesh) {
        warn!("solid {solid} has no position data, cannot vertex-edit");
        return;
    }

    if selection.solid != Some(solid) {
        if let Some(previous) = selection.solid.take() {
            let previous_material = current_material(Some(previous));
            release_solid(&mut registry, &mut materials, previous_material, previous);
        }
        grab_solid(&mut registry, &mut materials, Some(material), solid);
    }

    rebuild_selection(
        &mut commands,
        &marker_assets,
        &marker_query,
        &handles,
        &store,
        &mut selection,
        solid,
        world,
        hit_point,
        radius.0,
        config.corners_only,
    );
}

/// Re-run the last pick when the radius changes, so the marker set tracks
/// the slider immediately.
pub(super) fn reselect_on_radius_change(
    radius: Res<SelectionRadius>,
    config: Res<SelectionConfig>,
    drag_state: Res<HandleDragState>,
    solids: Query<&GlobalTransform, With<Solid>>,
    marker_assets: Res<MarkerAssets>,
    marker_query: Query<Entity, With<VertexMarker>>,
    handles: Query<Entity, With<DragHandle>>,
    store: Res<VertexStore>,
    mut selection: ResMut<VertexSelection>,
    mut commands: Commands,
) {
    if !radius.is_changed() || radius.is_added() || drag_state.active {
        return;
    }
    let (Some(solid), Some(hit_point)) = (selection.solid, selection.last_hit) else {
        return;
    };
    let Ok(world) = solids.get(solid) else {
        return;
    };
    rebuild_selection(
        &mut commands,
        &marker_assets,
        &marker_query,
        &handles,
        &store,
        &mut selection,
        solid,
        world,
        hit_point,
        radius.0,
        config.corners_only,
    );
}

// ---------------------------------------------------------------------------
// Drag application
// ---------------------------------------------------------------------------

/// On drag release: move the selected records by the handle's delta, rewrite
/// the mesh with the entity transform folded in, and reset the transform to
/// identity. Records therefore always hold world positions, and a later
/// whole-solid move composes correctly with vertex edits.
pub(super) fn apply_drag_on_release(
    mut drag_ended: MessageReader<HandleDragEnded>,
    handles: Query<(), With<DragHandle>>,
    mut selection: ResMut<VertexSelection>,
    mut store: ResMut<VertexStore>,
    mut solids: Query<(&mut Transform, &Mesh3d), With<Solid>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut marker_query: Query<(&VertexMarker, &mut Transform), Without<Solid>>,
) {
    for ended in drag_ended.read() {
        // A message can outlive its handle across a mode switch; only drags
        // from the handle this tool currently owns may edit vertices.
        if handles.get(ended.handle).is_err() {
            continue;
        }
        if selection.is_empty() {
            continue;
        }
        let Some(solid) = selection.solid else {
            continue;
        };
        let delta = ended.translation - selection.anchor;
        if delta == Vec3::ZERO {
            continue;
        }
        let Ok((mut transform, mesh3d)) = solids.get_mut(solid) else {
            continue;
        };
        let Some(mesh) = meshes.get_mut(&mesh3d.0) else {
            continue;
        };

        {
            let Some(records) = store.positions_mut(solid) else {
                continue;
            };
            apply_delta(records, &selection.indices, delta);
            write_positions(mesh, records);
        }
        bake_transform(mesh, &transform);
        mesh.compute_normals();
        *transform = Transform::IDENTITY;
        let Some(baked) = read_positions(mesh) else {
            continue;
        };
        store.refresh(solid, baked);

        selection.anchor += delta;
        if let Some(hit) = selection.last_hit.as_mut() {
            *hit += delta;
        }

        let Some(records) = store.positions(solid) else {
            continue;
        };
        for (marker, mut marker_transform) in &mut marker_query {
            if marker.solid == solid
                && let Some(position) = records.get(marker.index)
            {
                marker_transform.translation = *position;
            }
        }
        info!("moved {} vertices by {delta} on {solid}", selection.indices.len());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex_edit::VertexMarker;
    use approx::assert_relative_eq;
    use bevy::mesh::{Indices, PrimitiveTopology};

    fn triangle_mesh() -> Mesh {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, default());
        mesh.insert_attribute(
            Mesh::ATTRIBUTE_POSITION,
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
        );
        mesh.insert_indices(Indices::U32(vec![0, 1, 2]));
        mesh
    }

    fn drag_test_app() -> App {
        let mut app = App::new();
        app.init_resource::<Assets<Mesh>>()
            .init_resource::<VertexStore>()
            .init_resource::<VertexSelection>()
            .add_message::<HandleDragEnded>()
            .add_systems(Update, apply_drag_on_release);
        app
    }

    fn send_drag_ended(app: &mut App, handle: Entity, translation: Vec3) {
        app.world_mut()
            .resource_mut::<Messages<HandleDragEnded>>()
            .write(HandleDragEnded { handle, translation });
    }

    #[test]
    fn drag_release_bakes_the_transform_to_identity() {
        let mut app = drag_test_app();

        let mesh_handle = app
            .world_mut()
            .resource_mut::<Assets<Mesh>>()
            .add(triangle_mesh());
        let solid = app
            .world_mut()
            .spawn((
                Solid,
                Mesh3d(mesh_handle.clone()),
                Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)),
            ))
            .id();
        let handle = app.world_mut().spawn((DragHandle, Transform::default())).id();
        let marker = app
            .world_mut()
            .spawn((VertexMarker { solid, index: 0 }, Transform::default()))
            .id();

        app.world_mut()
            .resource_mut::<VertexStore>()
            .register_positions(solid, vec![Vec3::ZERO, Vec3::X, Vec3::Z]);
        {
            let mut selection = app.world_mut().resource_mut::<VertexSelection>();
            selection.solid = Some(solid);
            selection.indices = vec![0];
            selection.anchor = Vec3::new(1.0, 0.0, 0.0);
            selection.last_hit = Some(Vec3::new(1.0, 0.0, 0.0));
        }

        // Drag the handle from the anchor to (3, 0, 0): a (2, 0, 0) delta.
        send_drag_ended(&mut app, handle, Vec3::new(3.0, 0.0, 0.0));
        app.update();

        // The entity transform is folded into the buffer and reset.
        assert_eq!(
            *app.world().entity(solid).get::<Transform>().unwrap(),
            Transform::IDENTITY
        );
        let positions = {
            let meshes = app.world().resource::<Assets<Mesh>>();
            read_positions(meshes.get(&mesh_handle).unwrap()).unwrap()
        };
        // Record 0 moved by the delta, all records carry the old translation.
        assert_relative_eq!(positions[0].x, 3.0, epsilon = 1e-5);
        assert_relative_eq!(positions[1].x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(positions[2].x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(positions[2].z, 1.0, epsilon = 1e-5);

        // Records refreshed to the baked buffer, anchor advanced, marker synced.
        let store = app.world().resource::<VertexStore>();
        assert_eq!(store.positions(solid).unwrap(), positions.as_slice());
        let selection = app.world().resource::<VertexSelection>();
        assert_eq!(selection.anchor, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(selection.last_hit, Some(Vec3::new(3.0, 0.0, 0.0)));
        assert_eq!(
            app.world().entity(marker).get::<Transform>().unwrap().translation,
            Vec3::new(3.0, 0.0, 0.0)
        );
    }

    #[test]
    fn drag_messages_from_a_dead_handle_are_ignored() {
        let mut app = drag_test_app();

        let mesh_handle = app
            .world_mut()
            .resource_mut::<Assets<Mesh>>()
            .add(triangle_mesh());
        let solid = app
            .world_mut()
            .spawn((Solid, Mesh3d(mesh_handle), Transform::IDENTITY))
            .id();
        app.world_mut()
            .resource_mut::<VertexStore>()
            .register_positions(solid, vec![Vec3::ZERO, Vec3::X, Vec3::Z]);
        {
            let mut selection = app.world_mut().resource_mut::<VertexSelection>();
            selection.solid = Some(solid);
            selection.indices = vec![0];
            selection.anchor = Vec3::ZERO;
            selection.last_hit = Some(Vec3::ZERO);
        }

        // A handle from a previous mode, despawned before the message is read.
        let stale = app.world_mut().spawn((DragHandle, Transform::default())).id();
        app.world_mut().despawn(stale);
        send_drag_ended(&mut app, stale, Vec3::ONE);
        app.update();

        let store = app.world().resource::<VertexStore>();
        assert_eq!(store.positions(solid).unwrap()[0], Vec3::ZERO);
        assert_eq!(app.world().resource::<VertexSelection>().anchor, Vec3::ZERO);
    }

    fn reselect_test_app() -> App {
        let mut app = App::new();
        app.init_resource::<VertexStore>()
            .init_resource::<VertexSelection>()
            .init_resource::<SelectionRadius>()
            .init_resource::<SelectionConfig>()
            .init_resource::<HandleDragState>()
            .insert_resource(MarkerAssets {
                mesh: Handle::default(),
                material: Handle::default(),
            })
            .add_systems(Update, reselect_on_radius_change);
        app
    }

    /// Seed a registered solid with a two-record selection around the origin;
    /// record 2 only falls inside once the radius grows past 0.9.
    fn seed_reselect_scene(app: &mut App) -> Entity {
        let solid = app.world_mut().spawn((Solid, Transform::IDENTITY)).id();
        app.world_mut().resource_mut::<VertexStore>().register_positions(
            solid,
            vec![Vec3::ZERO, Vec3::new(0.4, 0.0, 0.0), Vec3::new(0.9, 0.0, 0.0)],
        );
        {
            let mut selection = app.world_mut().resource_mut::<VertexSelection>();
            selection.solid = Some(solid);
            selection.indices = vec![0, 1];
            selection.anchor = Vec3::splat(9.0);
            selection.last_hit = Some(Vec3::ZERO);
        }
        for index in [0, 1] {
            app.world_mut()
                .spawn((VertexMarker { solid, index }, Transform::default()));
        }
        solid
    }

    fn marker_count(app: &mut App) -> usize {
        app.world_mut()
            .query_filtered::<Entity, With<VertexMarker>>()
            .iter(app.world())
            .count()
    }

    #[test]
    fn radius_change_reruns_the_last_pick() {
        let mut app = reselect_test_app();
        let _solid = seed_reselect_scene(&mut app);
        // Consume the resource-added change tick.
        app.update();

        app.world_mut().resource_mut::<SelectionRadius>().0 = 1.0;
        app.update();

        let selection = app.world().resource::<VertexSelection>();
        assert_eq!(selection.indices, vec![0, 1, 2]);
        // The anchor snaps back to the stored pick point.
        assert_eq!(selection.anchor, Vec3::ZERO);
        assert_eq!(marker_count(&mut app), 3);
    }

    #[test]
    fn no_reselect_while_a_drag_is_active() {
        let mut app = reselect_test_app();
        let _solid = seed_reselect_scene(&mut app);
        app.update();

        app.world_mut().resource_mut::<HandleDragState>().active = true;
        app.world_mut().resource_mut::<SelectionRadius>().0 = 1.0;
        app.update();

        let selection = app.world().resource::<VertexSelection>();
        assert_eq!(selection.indices, vec![0, 1]);
        assert_eq!(marker_count(&mut app), 2);
    }

    #[test]
    fn bracket_keys_step_and_clamp_the_radius() {
        let mut app = App::new();
        app.init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<SelectionRadius>()
            .add_systems(Update, adjust_radius);

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::BracketRight);
        app.update();
        assert_relative_eq!(
            app.world().resource::<SelectionRadius>().0,
            0.5 + SelectionRadius::STEP,
            epsilon = 1e-5
        );

        // Stepping below the minimum clamps.
        app.world_mut().resource_mut::<SelectionRadius>().0 = SelectionRadius::MIN;
        {
            let mut keyboard = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keyboard.release(KeyCode::BracketRight);
            keyboard.clear();
            keyboard.press(KeyCode::BracketLeft);
        }
        app.update();
        assert_relative_eq!(
            app.world().resource::<SelectionRadius>().0,
            SelectionRadius::MIN,
            epsilon = 1e-6
        );
    }
}

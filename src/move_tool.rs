//! Whole-solid translation.
//!
//! Clicking a solid attaches the translate handle at its origin; the solid
//! follows the handle live while an axis is dragged. Clicking empty space,
//! right-clicking, or leaving the mode detaches the handle and restores the
//! solid's hover highlights. Moving never touches the mesh's vertex data,
//! only the entity transform.

use bevy::picking::mesh_picking::ray_cast::{MeshRayCast, MeshRayCastSettings, RayCastVisibility};
use bevy::prelude::*;

use crate::handle::{self, DragHandle, HandleDragState, HandleSet};
use crate::highlight::{grab_solid, release_solid, HighlightRegistry};
use crate::modes::EditorMode;
use crate::solid::Solid;

#[derive(Resource, Default)]
pub struct MoveSelection {
    pub solid: Option<Entity>,
}

pub struct MoveToolPlugin;

impl Plugin for MoveToolPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MoveSelection>()
            .add_systems(
                Update,
                (handle_move_click, follow_handle)
                    .chain()
                    .after(HandleSet)
                    .run_if(in_state(EditorMode::Move)),
            )
            .add_systems(OnExit(EditorMode::Move), deactivate);
    }
}

fn deselect(
    selection: &mut MoveSelection,
    registry: &mut HighlightRegistry,
    materials: &mut Assets<StandardMaterial>,
    solids: &Query<&MeshMaterial3d<StandardMaterial>, With<Solid>>,
    commands: &mut Commands,
    handles: &Query<Entity, With<DragHandle>>,
) {
    if let Some(solid) = selection.solid.take() {
        release_solid(registry, materials, solids.get(solid).ok(), solid);
    }
    handle::despawn_handles(commands, handles);
}

fn handle_move_click(
    mouse: Res<ButtonInput<MouseButton>>,
    drag_state: Res<HandleDragState>,
    windows: Query<&Window>,
    camera_query: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    solids: Query<&MeshMaterial3d<StandardMaterial>, With<Solid>>,
    transforms: Query<&Transform, With<Solid>>,
    handles: Query<Entity, With<DragHandle>>,
    mut selection: ResMut<MoveSelection>,
    mut registry: ResMut<HighlightRegistry>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut ray_cast: MeshRayCast,
    mut commands: Commands,
) {
    if mouse.just_pressed(MouseButton::Right) {
        deselect(&mut selection, &mut registry, &mut materials, &solids, &mut commands, &handles);
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
            .map(|(entity, _)| *entity)
            .find(|entity| solids.contains(*entity));
    }

    let Some(solid) = picked else {
        deselect(&mut selection, &mut registry, &mut materials, &solids, &mut commands, &handles);
        return;
    };
    if selection.solid == Some(solid) {
        return;
    }

    deselect(&mut selection, &mut registry, &mut materials, &solids, &mut commands, &handles);
    grab_solid(&mut registry, &mut materials, solids.get(solid).ok(), solid);
    selection.solid = Some(solid);
    let origin = transforms.get(solid).map(|t| t.translation).unwrap_or_default();
    handle::spawn_handle(&mut commands, origin);
    info!("move: selected solid {solid}");
}

/// Keep the selected solid glued to the handle while it is dragged.
fn follow_handle(
    selection: Res<MoveSelection>,
    handles: Query<&Transform, (With<DragHandle>, Without<Solid>)>,
    mut solids: Query<&mut Transform, With<Solid>>,
) {
    let Some(solid) = selection.solid else {
        return;
    };
    let Ok(handle_transform) = handles.single() else {
        return;
    };
    let Ok(mut solid_transform) = solids.get_mut(solid) else {
        return;
    };
    if solid_transform.translation != handle_transform.translation {
        solid_transform.translation = handle_transform.translation;
    }
}

pub(crate) fn deactivate(
    mut selection: ResMut<MoveSelection>,
    mut registry: ResMut<HighlightRegistry>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    solids: Query<&MeshMaterial3d<StandardMaterial>, With<Solid>>,
    handles: Query<Entity, With<DragHandle>>,
    mut commands: Commands,
) {
    deselect(&mut selection, &mut registry, &mut materials, &solids, &mut commands, &handles);
}

//! Sphere markers over selected vertex records.

use bevy::prelude::*;

use crate::EditorEntity;

const MARKER_RADIUS: f32 = 0.08;
const MARKER_COLOR: Color = Color::srgb(1.0, 0.35, 0.2);

/// One marker per selected record. `index` points into the owning solid's
/// records and the mesh position buffer alike.
#[derive(Component)]
pub struct VertexMarker {
    pub solid: Entity,
    pub index: usize,
}

/// Mesh and material shared by every marker.
#[derive(Resource)]
pub struct MarkerAssets {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

pub(super) fn setup_marker_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(MarkerAssets {
        mesh: meshes.add(Sphere::new(MARKER_RADIUS)),
        material: materials.add(StandardMaterial {
            base_color: MARKER_COLOR,
            unlit: true,
            ..default()
        }),
    });
}

pub(super) fn spawn_marker(
    commands: &mut Commands,
    assets: &MarkerAssets,
    solid: Entity,
    index: usize,
    position: Vec3,
) {
    commands.spawn((
        Name::new("VertexMarker"),
        VertexMarker { solid, index },
        EditorEntity,
        Mesh3d(assets.mesh.clone()),
        MeshMaterial3d(assets.material.clone()),
        Transform::from_translation(position),
    ));
}

pub(super) fn clear_markers(commands: &mut Commands, markers: &Query<Entity, With<VertexMarker>>) {
    for entity in markers.iter() {
        if let Ok(mut entity_commands) = commands.get_entity(entity) {
            entity_commands.despawn();
        }
    }
}

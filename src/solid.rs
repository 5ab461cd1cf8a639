//! Scene scaffolding and mesh position-buffer access.
//!
//! Extruded meshes carry the [`Solid`] tag; everything the tools do (hover,
//! move, vertex editing) is scoped to tagged entities so the ground plane and
//! helper geometry stay inert.

use bevy::mesh::VertexAttributeValues;
use bevy::prelude::*;
use bevy_infinite_grid::{InfiniteGrid, InfiniteGridPlugin};

use crate::EditorEntity;

/// Side length of the drawable ground plane.
pub const GROUND_SIZE: f32 = 24.0;

/// Tag for extruded, editable meshes.
#[derive(Component)]
pub struct Solid;

/// Tag for the ground plane footprints are sketched on.
#[derive(Component)]
pub struct GroundPlane;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(InfiniteGridPlugin)
            .add_systems(Startup, setup_ground);
    }
}

fn setup_ground(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((Name::new("Grid"), InfiniteGrid, EditorEntity));
    commands.spawn((
        Name::new("Ground"),
        GroundPlane,
        EditorEntity,
        Mesh3d(meshes.add(Plane3d::default().mesh().size(GROUND_SIZE, GROUND_SIZE))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.38, 0.38, 0.42),
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::IDENTITY,
    ));
}

// ---------------------------------------------------------------------------
// Position buffer helpers
// ---------------------------------------------------------------------------

/// Copy of a mesh's position attribute, or `None` when the mesh has no
/// float3 position data.
pub fn read_positions(mesh: &Mesh) -> Option<Vec<Vec3>> {
    let Some(VertexAttributeValues::Float32x3(raw)) = mesh.attribute(Mesh::ATTRIBUTE_POSITION)
    else {
        return None;
    };
    Some(raw.iter().copied().map(Vec3::from_array).collect())
}

/// Overwrite the mesh's position attribute. The caller keeps count and order
/// identical to the existing buffer so indices stay valid.
pub fn write_positions(mesh: &mut Mesh, positions: &[Vec3]) {
    let raw: Vec<[f32; 3]> = positions.iter().map(|p| p.to_array()).collect();
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, raw);
}

/// Fold `transform` into the mesh's vertex data, so the mesh reads the same
/// once its entity transform is reset to identity. Positions get the full
/// affine map, normals only the rotation.
pub fn bake_transform(mesh: &mut Mesh, transform: &Transform) {
    if let Some(positions) = read_positions(mesh) {
        let baked: Vec<Vec3> = positions.iter().map(|p| transform.transform_point(*p)).collect();
        write_positions(mesh, &baked);
    }

    let rotated = match mesh.attribute(Mesh::ATTRIBUTE_NORMAL) {
        Some(VertexAttributeValues::Float32x3(normals)) => Some(
            normals
                .iter()
                .map(|n| (transform.rotation * Vec3::from_array(*n)).normalize_or_zero().to_array())
                .collect::<Vec<[f32; 3]>>(),
        ),
        _ => None,
    };
    if let Some(rotated) = rotated {
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, rotated);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bevy::mesh::PrimitiveTopology;

    fn triangle_mesh() -> Mesh {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, default());
        mesh.insert_attribute(
            Mesh::ATTRIBUTE_POSITION,
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
        );
        mesh.insert_attribute(
            Mesh::ATTRIBUTE_NORMAL,
            vec![[0.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        );
        mesh
    }

    #[test]
    fn read_write_round_trip_preserves_order() {
        let mut mesh = triangle_mesh();
        let original = read_positions(&mesh).unwrap();
        write_positions(&mut mesh, &original);
        assert_eq!(read_positions(&mesh).unwrap(), original);
    }

    #[test]
    fn bake_translation_shifts_positions_and_keeps_normals() {
        let mut mesh = triangle_mesh();
        let transform = Transform::from_translation(Vec3::new(2.0, 0.5, -1.0));
        bake_transform(&mut mesh, &transform);

        let positions = read_positions(&mesh).unwrap();
        assert_relative_eq!(positions[1].x, 3.0, epsilon = 1e-6);
        assert_relative_eq!(positions[1].y, 0.5, epsilon = 1e-6);
        assert_relative_eq!(positions[2].z, 0.0, epsilon = 1e-6);

        let Some(VertexAttributeValues::Float32x3(normals)) =
            mesh.attribute(Mesh::ATTRIBUTE_NORMAL)
        else {
            panic!("normals missing");
        };
        assert_relative_eq!(normals[0][1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn bake_with_identity_is_a_no_op() {
        let mut mesh = triangle_mesh();
        let before = read_positions(&mesh).unwrap();
        bake_transform(&mut mesh, &Transform::IDENTITY);
        bake_transform(&mut mesh, &Transform::IDENTITY);
        assert_eq!(read_positions(&mesh).unwrap(), before);
    }

    #[test]
    fn bake_rotation_rotates_normals() {
        let mut mesh = triangle_mesh();
        let transform = Transform::from_rotation(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2));
        bake_transform(&mut mesh, &transform);

        let Some(VertexAttributeValues::Float32x3(normals)) =
            mesh.attribute(Mesh::ATTRIBUTE_NORMAL)
        else {
            panic!("normals missing");
        };
        // +Y rotated a quarter turn around X points toward +Z.
        assert_relative_eq!(normals[0][2], 1.0, epsilon = 1e-5);
        assert_relative_eq!(normals[0][1], 0.0, epsilon = 1e-5);
    }
}

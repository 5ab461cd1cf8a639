//! Extrusion of drawn footprints into solids.
//!
//! Clicking near a footprint outline sweeps it up into a prism, spawns the
//! solid with default hover highlights, and removes the consumed outline.
//! Outlines are gizmo lines with no mesh, so picking works in screen space:
//! the outline whose nearest segment sits under the cursor wins.

use bevy::prelude::*;

use crate::draw_tool::PolygonOutline;
use crate::geometry;
use crate::handle::point_to_segment_dist;
use crate::highlight::{self, HighlightAction, HighlightRegistry, HoverTrigger};
use crate::modes::EditorMode;
use crate::solid::Solid;

/// Height of every extruded prism.
pub const EXTRUDE_DEPTH: f32 = 2.0;

const PICK_THRESHOLD_PX: f32 = 20.0;

pub struct ExtrudeToolPlugin;

impl Plugin for ExtrudeToolPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            extrude_on_click.run_if(in_state(EditorMode::Extrude)),
        );
    }
}

/// Smallest screen-space distance from `cursor` to the outline's segments.
fn outline_screen_distance(
    cursor: Vec2,
    camera: &Camera,
    camera_transform: &GlobalTransform,
    outline: &PolygonOutline,
) -> Option<f32> {
    let points = &outline.points;
    let mut best: Option<f32> = None;
    for i in 0..points.len() {
        let next = points[(i + 1) % points.len()];
        let (Ok(a), Ok(b)) = (
            camera.world_to_viewport(camera_transform, points[i]),
            camera.world_to_viewport(camera_transform, next),
        ) else {
            continue;
        };
        let dist = point_to_segment_dist(cursor, a, b);
        if best.is_none_or(|d| dist < d) {
            best = Some(dist);
        }
    }
    best
}

fn extrude_on_click(
    mouse: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window>,
    camera_query: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    outlines: Query<(Entity, &PolygonOutline)>,
    mut registry: ResMut<HighlightRegistry>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut commands: Commands,
) {
    if !mouse.just_pressed(MouseButton::Left) {
        return;
    }
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };

    let mut best: Option<(Entity, &PolygonOutline, f32)> = None;
    for (entity, outline) in &outlines {
        let Some(dist) = outline_screen_distance(cursor, camera, camera_transform, outline) else {
            continue;
        };
        if dist < PICK_THRESHOLD_PX && best.is_none_or(|(_, _, d)| dist < d) {
            best = Some((entity, outline, dist));
        }
    }
    let Some((outline_entity, outline, _)) = best else {
        return;
    };

    let footprint: Vec<Vec2> = outline.points.iter().map(|p| Vec2::new(p.x, p.z)).collect();
    match geometry::extrude_polygon(&footprint, EXTRUDE_DEPTH) {
        Ok(mesh) => {
            let solid = commands
                .spawn((
                    Name::new("Solid"),
                    Solid,
                    Mesh3d(meshes.add(mesh)),
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: highlight::BASE_COLOR,
                        perceptual_roughness: 0.8,
                        ..default()
                    })),
                    Transform::IDENTITY,
                ))
                .id();
            registry.install(solid, HoverTrigger::Over, HighlightAction { color: highlight::HOVER_COLOR });
            registry.install(solid, HoverTrigger::Out, HighlightAction { color: highlight::BASE_COLOR });
            commands.entity(outline_entity).despawn();
            info!("extruded footprint into solid {solid}");
        }
        Err(err) => {
            // Keep the outline so the user can redraw or retry.
            warn!("extrusion failed: {err:#}");
        }
    }
}

//! Polygon footprint sketching on the ground plane.
//!
//! Left click drops a vertex where the cursor ray meets the ground. A click
//! back on the first vertex, or a right click, closes the loop once three or
//! more vertices exist. Closed footprints persist as [`PolygonOutline`]
//! entities until the extrude tool consumes them.

use bevy::prelude::*;

use crate::modes::EditorMode;
use crate::solid::GROUND_SIZE;

/// Clicking within this distance of the first vertex closes the loop.
const CLOSE_DISTANCE: f32 = 0.35;

const PREVIEW_COLOR: Color = Color::srgb(0.95, 0.35, 0.3);
const OUTLINE_COLOR: Color = Color::srgb(0.1, 0.1, 0.1);

const DASH_LENGTH: f32 = 0.18;
const GAP_LENGTH: f32 = 0.12;

/// A closed footprint ring on the ground plane. The first point is not
/// repeated at the end.
#[derive(Component)]
pub struct PolygonOutline {
    pub points: Vec<Vec3>,
}

#[derive(Resource, Default)]
pub struct DrawState {
    pub points: Vec<Vec3>,
    pub cursor_point: Option<Vec3>,
}

pub struct DrawToolPlugin;

impl Plugin for DrawToolPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DrawState>()
            .add_systems(
                Update,
                (track_cursor, handle_draw_clicks, draw_preview)
                    .chain()
                    .run_if(in_state(EditorMode::Draw)),
            )
            .add_systems(Update, draw_outlines)
            .add_systems(OnExit(EditorMode::Draw), reset_draw_state);
    }
}

// ---------------------------------------------------------------------------
// Picking
// ---------------------------------------------------------------------------

fn ray_plane_intersection(ray: Ray3d, plane_point: Vec3, plane_normal: Vec3) -> Option<Vec3> {
    let denom = plane_normal.dot(*ray.direction);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = (plane_point - ray.origin).dot(plane_normal) / denom;
    if t < 0.0 {
        return None;
    }
    Some(ray.origin + *ray.direction * t)
}

/// Cursor point on the ground plane, or `None` when the ray misses the
/// drawable area.
fn cursor_ground_point(
    windows: &Query<&Window>,
    camera_query: &Query<(&Camera, &GlobalTransform), With<Camera3d>>,
) -> Option<Vec3> {
    let window = windows.single().ok()?;
    let cursor = window.cursor_position()?;
    let (camera, camera_transform) = camera_query.single().ok()?;
    let ray = camera.viewport_to_world(camera_transform, cursor).ok()?;
    let point = ray_plane_intersection(ray, Vec3::ZERO, Vec3::Y)?;
    let half = GROUND_SIZE / 2.0;
    if point.x.abs() > half || point.z.abs() > half {
        return None;
    }
    Some(point)
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn track_cursor(
    windows: Query<&Window>,
    camera_query: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut draw_state: ResMut<DrawState>,
) {
    draw_state.cursor_point = cursor_ground_point(&windows, &camera_query);
}

fn handle_draw_clicks(
    mouse: Res<ButtonInput<MouseButton>>,
    mut draw_state: ResMut<DrawState>,
    mut commands: Commands,
) {
    if mouse.just_pressed(MouseButton::Left) {
        let Some(point) = draw_state.cursor_point else {
            return;
        };
        let closes = draw_state.points.len() >= 3
            && draw_state
                .points
                .first()
                .is_some_and(|first| first.distance(point) < CLOSE_DISTANCE);
        if closes {
            close_polygon(&mut draw_state, &mut commands);
        } else {
            draw_state.points.push(point);
        }
    } else if mouse.just_pressed(MouseButton::Right) {
        close_polygon(&mut draw_state, &mut commands);
    }
}

/// Spawn an outline from the in-progress points. Fewer than three points
/// just discards the sketch, matching a cancelled stroke.
fn close_polygon(draw_state: &mut DrawState, commands: &mut Commands) {
    let points = std::mem::take(&mut draw_state.points);
    if points.len() < 3 {
        return;
    }
    info!("closed footprint with {} vertices", points.len());
    commands.spawn((
        Name::new("PolygonOutline"),
        PolygonOutline { points },
        Transform::IDENTITY,
    ));
}

fn reset_draw_state(mut draw_state: ResMut<DrawState>) {
    draw_state.points.clear();
    draw_state.cursor_point = None;
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn dashed_line(gizmos: &mut Gizmos, from: Vec3, to: Vec3, color: Color) {
    let length = from.distance(to);
    if length < 1e-4 {
        return;
    }
    let direction = (to - from) / length;
    let step = DASH_LENGTH + GAP_LENGTH;
    let mut travelled = 0.0;
    while travelled < length {
        let end = (travelled + DASH_LENGTH).min(length);
        gizmos.line(from + direction * travelled, from + direction * end, color);
        travelled += step;
    }
}

fn draw_preview(draw_state: Res<DrawState>, mut gizmos: Gizmos) {
    for pair in draw_state.points.windows(2) {
        dashed_line(&mut gizmos, pair[0], pair[1], PREVIEW_COLOR);
    }
    if let Some(last) = draw_state.points.last()
        && let Some(cursor) = draw_state.cursor_point
    {
        dashed_line(&mut gizmos, *last, cursor, PREVIEW_COLOR);
    }
    for point in &draw_state.points {
        gizmos.sphere(Isometry3d::from_translation(*point), 0.06, PREVIEW_COLOR);
    }
    if let Some(first) = draw_state.points.first()
        && draw_state.points.len() >= 3
    {
        // Hint that clicking the first vertex closes the loop.
        gizmos.circle(
            Isometry3d::new(*first, Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)),
            CLOSE_DISTANCE,
            PREVIEW_COLOR,
        );
    }
}

fn draw_outlines(outlines: Query<&PolygonOutline>, mut gizmos: Gizmos) {
    for outline in &outlines {
        let points = &outline.points;
        for i in 0..points.len() {
            let next = points[(i + 1) % points.len()];
            gizmos.line(points[i], next, OUTLINE_COLOR);
        }
    }
}

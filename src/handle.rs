//! Screen-space translate handle.
//!
//! Tools spawn a single [`DragHandle`] entity at the point they want dragged.
//! The handle renders as three world-axis arrows, hovers by screen distance,
//! and drags by projecting mouse motion onto the screen-projected axis. Its
//! `Transform` carries the dragged value; a [`HandleDragEnded`] message fires
//! on release with the final translation.

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;

use crate::EditorEntity;

const ARROW_LENGTH: f32 = 1.4;
const ARROW_TIP_LENGTH: f32 = 0.25;
const PICK_THRESHOLD_PX: f32 = 16.0;
const DRAG_SPEED: f32 = 0.003;

const X_COLOR: Color = Color::srgb(0.9, 0.2, 0.2);
const Y_COLOR: Color = Color::srgb(0.2, 0.9, 0.2);
const Z_COLOR: Color = Color::srgb(0.2, 0.4, 0.9);
const ACTIVE_COLOR: Color = Color::srgb(1.0, 1.0, 0.3);

/// The dragged entity. Tools keep at most one alive at a time.
#[derive(Component)]
pub struct DragHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleAxis {
    X,
    Y,
    Z,
}

impl HandleAxis {
    pub fn direction(self) -> Vec3 {
        match self {
            HandleAxis::X => Vec3::X,
            HandleAxis::Y => Vec3::Y,
            HandleAxis::Z => Vec3::Z,
        }
    }

    fn color(self) -> Color {
        match self {
            HandleAxis::X => X_COLOR,
            HandleAxis::Y => Y_COLOR,
            HandleAxis::Z => Z_COLOR,
        }
    }
}

const AXES: [HandleAxis; 3] = [HandleAxis::X, HandleAxis::Y, HandleAxis::Z];

#[derive(Resource, Default)]
pub struct HandleDragState {
    pub active: bool,
    pub axis: Option<HandleAxis>,
    pub hovered_axis: Option<HandleAxis>,
    drag_start_screen: Vec2,
    drag_start_translation: Vec3,
    accumulated_screen: Vec2,
}

impl HandleDragState {
    /// True while a press on the handle should not be treated as a scene
    /// click by the owning tool.
    pub fn consumes_click(&self) -> bool {
        self.active || self.hovered_axis.is_some()
    }
}

#[derive(Message)]
pub struct HandleDragEnded {
    pub handle: Entity,
    pub translation: Vec3,
}

/// Handle systems run in this set; tool click systems order after it so a
/// drag grab wins over a scene pick on the same frame.
#[derive(SystemSet, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandleSet;

pub struct DragHandlePlugin;

impl Plugin for DragHandlePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HandleDragState>()
            .add_message::<HandleDragEnded>()
            .add_systems(
                Update,
                (handle_hover, handle_drag, draw_handle).chain().in_set(HandleSet),
            );
    }
}

pub fn spawn_handle(commands: &mut Commands, at: Vec3) -> Entity {
    commands
        .spawn((
            Name::new("DragHandle"),
            DragHandle,
            EditorEntity,
            Transform::from_translation(at),
        ))
        .id()
}

pub fn despawn_handles(commands: &mut Commands, handles: &Query<Entity, With<DragHandle>>) {
    for entity in handles.iter() {
        if let Ok(mut entity_commands) = commands.get_entity(entity) {
            entity_commands.despawn();
        }
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn axis_screen_segment(
    camera: &Camera,
    camera_transform: &GlobalTransform,
    origin: Vec3,
    axis: HandleAxis,
) -> Option<(Vec2, Vec2)> {
    let start = camera.world_to_viewport(camera_transform, origin).ok()?;
    let end = camera
        .world_to_viewport(camera_transform, origin + axis.direction() * ARROW_LENGTH)
        .ok()?;
    Some((start, end))
}

pub(crate) fn point_to_segment_dist(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-6 {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

fn handle_hover(
    windows: Query<&Window>,
    camera_query: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    handles: Query<&Transform, With<DragHandle>>,
    mut drag_state: ResMut<HandleDragState>,
) {
    if drag_state.active {
        return;
    }
    drag_state.hovered_axis = None;

    let Ok(transform) = handles.single() else {
        return;
    };
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };

    let mut best: Option<(HandleAxis, f32)> = None;
    for axis in AXES {
        let Some((a, b)) = axis_screen_segment(camera, camera_transform, transform.translation, axis)
        else {
            continue;
        };
        let dist = point_to_segment_dist(cursor, a, b);
        if dist < PICK_THRESHOLD_PX && best.is_none_or(|(_, d)| dist < d) {
            best = Some((axis, dist));
        }
    }
    drag_state.hovered_axis = best.map(|(axis, _)| axis);
}

fn handle_drag(
    mouse: Res<ButtonInput<MouseButton>>,
    mut motion: MessageReader<MouseMotion>,
    windows: Query<&Window>,
    camera_query: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut handles: Query<(Entity, &mut Transform), With<DragHandle>>,
    mut drag_state: ResMut<HandleDragState>,
    mut drag_ended: MessageWriter<HandleDragEnded>,
) {
    let Ok((handle_entity, mut transform)) = handles.single_mut() else {
        // The owning tool despawned the handle mid-drag.
        if drag_state.active || drag_state.hovered_axis.is_some() {
            *drag_state = HandleDragState::default();
        }
        motion.clear();
        return;
    };

    if !drag_state.active {
        if mouse.just_pressed(MouseButton::Left)
            && let Some(axis) = drag_state.hovered_axis
            && let Ok(window) = windows.single()
            && let Some(cursor) = window.cursor_position()
        {
            drag_state.active = true;
            drag_state.axis = Some(axis);
            drag_state.drag_start_screen = cursor;
            drag_state.drag_start_translation = transform.translation;
            drag_state.accumulated_screen = Vec2::ZERO;
        }
        motion.clear();
        return;
    }

    if mouse.just_released(MouseButton::Left) || !mouse.pressed(MouseButton::Left) {
        drag_ended.write(HandleDragEnded {
            handle: handle_entity,
            translation: transform.translation,
        });
        drag_state.active = false;
        drag_state.axis = None;
        motion.clear();
        return;
    }

    let mut delta = Vec2::ZERO;
    for ev in motion.read() {
        delta += ev.delta;
    }
    if delta == Vec2::ZERO {
        return;
    }
    drag_state.accumulated_screen += delta;

    let Some(axis) = drag_state.axis else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let origin = drag_state.drag_start_translation;
    let Some((a, b)) = axis_screen_segment(camera, camera_transform, origin, axis) else {
        return;
    };
    let screen_axis = (b - a).normalize_or_zero();
    if screen_axis == Vec2::ZERO {
        return;
    }

    // Mouse travel along the projected axis, scaled by camera distance so
    // the handle tracks the cursor at any zoom.
    let along = drag_state.accumulated_screen.dot(screen_axis);
    let camera_distance = camera_transform.translation().distance(origin);
    transform.translation = origin + axis.direction() * along * camera_distance * DRAG_SPEED;
}

fn draw_handle(
    handles: Query<&Transform, With<DragHandle>>,
    drag_state: Res<HandleDragState>,
    mut gizmos: Gizmos,
) {
    let Ok(transform) = handles.single() else {
        return;
    };
    let origin = transform.translation;
    for axis in AXES {
        let highlighted = drag_state.axis == Some(axis)
            || (!drag_state.active && drag_state.hovered_axis == Some(axis));
        let color = if highlighted { ACTIVE_COLOR } else { axis.color() };
        gizmos
            .arrow(origin, origin + axis.direction() * ARROW_LENGTH, color)
            .with_tip_length(ARROW_TIP_LENGTH);
    }
    gizmos.sphere(Isometry3d::from_translation(origin), 0.06, Color::WHITE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert_relative_eq!(point_to_segment_dist(Vec2::new(5.0, 3.0), a, b), 3.0);
        assert_relative_eq!(point_to_segment_dist(Vec2::new(-4.0, 0.0), a, b), 4.0);
        assert_relative_eq!(point_to_segment_dist(Vec2::new(13.0, 4.0), a, b), 5.0);
    }

    #[test]
    fn degenerate_segment_falls_back_to_point_distance() {
        let a = Vec2::new(2.0, 2.0);
        assert_relative_eq!(point_to_segment_dist(Vec2::new(2.0, 5.0), a, a), 3.0);
    }
}

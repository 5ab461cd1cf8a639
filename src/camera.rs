//! Free-flying editor camera.
//!
//! Controls:
//! - Right-click + drag: look around (yaw/pitch)
//! - WASD: move forward/back/left/right (view-relative)
//! - Q / E: move up / down (world-space Y)
//! - Scroll wheel: move forward/back along the view direction
//! - Shift (held): run speed multiplier

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;

use crate::EditorEntity;

#[derive(Component)]
pub struct FlyCamera {
    /// Mouse look sensitivity (radians per pixel).
    pub sensitivity: f32,
    /// Base movement speed (units per second).
    pub speed: f32,
    /// Speed multiplier when Shift is held.
    pub run_multiplier: f32,
    /// Scroll movement speed (units per scroll line).
    pub scroll_speed: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            sensitivity: 0.003,
            speed: 6.0,
            run_multiplier: 2.0,
            scroll_speed: 1.2,
        }
    }
}

pub struct FlyCameraPlugin;

impl Plugin for FlyCameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera)
            .add_systems(Update, fly_camera_controls);
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("EditorCamera"),
        Camera3d::default(),
        EditorEntity,
        FlyCamera::default(),
        Transform::from_xyz(12.0, 10.0, 12.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn fly_camera_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut scroll_events: MessageReader<MouseWheel>,
    time: Res<Time>,
    mut camera_query: Query<(&FlyCamera, &mut Transform)>,
) {
    let Ok((settings, mut transform)) = camera_query.single_mut() else {
        mouse_motion.clear();
        scroll_events.clear();
        return;
    };

    let right_held = mouse.pressed(MouseButton::Right);

    // Mouse look, only while right-click is held so the tools keep plain
    // mouse motion to themselves.
    if right_held {
        let mut mouse_delta = Vec2::ZERO;
        for motion in mouse_motion.read() {
            mouse_delta += motion.delta;
        }
        if mouse_delta != Vec2::ZERO {
            let (mut yaw, mut pitch, _) = transform.rotation.to_euler(EulerRot::YXZ);
            yaw -= mouse_delta.x * settings.sensitivity;
            pitch -= mouse_delta.y * settings.sensitivity;
            pitch = pitch.clamp(
                -std::f32::consts::FRAC_PI_2 + 0.01,
                std::f32::consts::FRAC_PI_2 - 0.01,
            );
            transform.rotation = Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0);
        }
    } else {
        mouse_motion.clear();
    }

    for event in scroll_events.read() {
        let delta = match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y * 0.01,
        };
        let forward = transform.forward().as_vec3();
        transform.translation += forward * delta * settings.scroll_speed;
    }

    let mut movement = Vec3::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        movement += transform.forward().as_vec3();
    }
    if keyboard.pressed(KeyCode::KeyS) {
        movement -= transform.forward().as_vec3();
    }
    if keyboard.pressed(KeyCode::KeyA) {
        movement -= transform.right().as_vec3();
    }
    if keyboard.pressed(KeyCode::KeyD) {
        movement += transform.right().as_vec3();
    }
    if keyboard.pressed(KeyCode::KeyQ) {
        movement += Vec3::Y;
    }
    if keyboard.pressed(KeyCode::KeyE) {
        movement -= Vec3::Y;
    }

    if movement != Vec3::ZERO {
        let shift = keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
        let speed_mult = if shift { settings.run_multiplier } else { 1.0 };
        transform.translation += movement.normalize() * settings.speed * speed_mult * time.delta_secs();
    }
}

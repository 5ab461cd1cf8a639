pub mod camera;
pub mod draw_tool;
pub mod extrude_tool;
pub mod geometry;
pub mod handle;
pub mod highlight;
pub mod modes;
pub mod move_tool;
pub mod solid;
pub mod vertex_edit;
pub mod vertex_store;

use bevy::prelude::*;

/// Marker component for entities owned by the editor itself (camera, ground,
/// markers, drag handles), as opposed to the outlines and solids that make
/// up the user's scene.
#[derive(Component, Default)]
pub struct EditorEntity;

/// Top-level plugin wiring the whole editor together.
///
/// Add this after `DefaultPlugins`:
/// ```no_run
/// use bevy::prelude::*;
/// use plover::EditorPlugin;
///
/// App::new()
///     .add_plugins((DefaultPlugins, EditorPlugin))
///     .run();
/// ```
pub struct EditorPlugin;

impl Plugin for EditorPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            camera::FlyCameraPlugin,
            modes::ModesPlugin,
            solid::ScenePlugin,
            highlight::HighlightPlugin,
            handle::DragHandlePlugin,
            draw_tool::DrawToolPlugin,
            extrude_tool::ExtrudeToolPlugin,
            move_tool::MoveToolPlugin,
            vertex_edit::VertexEditPlugin,
        ));
    }
}

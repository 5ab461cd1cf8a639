//! Editor mode state machine.
//!
//! Exactly one mode is active at a time. Each tool registers its input
//! systems behind `in_state(..)` and its teardown in `OnExit(..)`, so the
//! state transition guarantees the outgoing tool is torn down before the
//! incoming tool sees any input.

use bevy::prelude::*;

#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditorMode {
    /// Passive camera navigation. Always the fallback.
    #[default]
    View,
    /// Sketch a closed polygon footprint on the ground plane.
    Draw,
    /// Click a footprint outline to extrude it into a solid.
    Extrude,
    /// Drag whole solids around with a translate handle.
    Move,
    /// Select vertex clusters on a solid and drag them.
    EditVertex,
}

impl EditorMode {
    pub fn label(self) -> &'static str {
        match self {
            EditorMode::View => "view",
            EditorMode::Draw => "draw",
            EditorMode::Extrude => "extrude",
            EditorMode::Move => "move",
            EditorMode::EditVertex => "edit vertex",
        }
    }

    /// Background tint shown while the mode is active.
    pub fn indicator(self) -> Color {
        match self {
            EditorMode::View => Color::srgb(0.13, 0.13, 0.15),
            EditorMode::Draw => Color::srgb(0.19, 0.10, 0.10),
            EditorMode::Extrude => Color::srgb(0.09, 0.12, 0.20),
            EditorMode::Move => Color::srgb(0.09, 0.17, 0.11),
            EditorMode::EditVertex => Color::srgb(0.20, 0.14, 0.07),
        }
    }
}

pub struct ModesPlugin;

impl Plugin for ModesPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<EditorMode>()
            .init_resource::<ClearColor>()
            .add_systems(Update, (handle_mode_keys, update_mode_indicator));
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn handle_mode_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    state: Res<State<EditorMode>>,
    mut next_state: ResMut<NextState<EditorMode>>,
) {
    let requested = if keyboard.just_pressed(KeyCode::Escape) {
        Some(EditorMode::View)
    } else if keyboard.just_pressed(KeyCode::Digit1) {
        Some(EditorMode::View)
    } else if keyboard.just_pressed(KeyCode::Digit2) {
        Some(EditorMode::Draw)
    } else if keyboard.just_pressed(KeyCode::Digit3) {
        Some(EditorMode::Extrude)
    } else if keyboard.just_pressed(KeyCode::Digit4) {
        Some(EditorMode::Move)
    } else if keyboard.just_pressed(KeyCode::Digit5) {
        Some(EditorMode::EditVertex)
    } else {
        None
    };

    if let Some(mode) = requested
        && mode != *state.get()
    {
        info!("mode -> {}", mode.label());
        next_state.set(mode);
    }
}

fn update_mode_indicator(state: Res<State<EditorMode>>, mut clear_color: ResMut<ClearColor>) {
    if state.is_changed() {
        clear_color.0 = state.get().indicator();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::DragHandle;
    use crate::highlight::HighlightRegistry;
    use crate::move_tool::{self, MoveSelection};
    use crate::solid::Solid;
    use crate::vertex_edit::{self, VertexMarker, VertexSelection};
    use crate::vertex_store::VertexStore;

    /// Minimal headless app with the real state machine and the real
    /// teardown systems, but none of the input or rendering systems.
    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(bevy::state::app::StatesPlugin)
            .init_state::<EditorMode>()
            .init_resource::<VertexStore>()
            .init_resource::<VertexSelection>()
            .init_resource::<MoveSelection>()
            .init_resource::<HighlightRegistry>()
            .init_resource::<Assets<StandardMaterial>>()
            .add_systems(OnExit(EditorMode::EditVertex), vertex_edit::deactivate)
            .add_systems(OnExit(EditorMode::Move), move_tool::deactivate);
        app
    }

    fn set_mode(app: &mut App, mode: EditorMode) {
        app.world_mut()
            .resource_mut::<NextState<EditorMode>>()
            .set(mode);
        app.update();
    }

    fn marker_count(app: &mut App) -> usize {
        app.world_mut()
            .query_filtered::<Entity, With<VertexMarker>>()
            .iter(app.world())
            .count()
    }

    fn handle_count(app: &mut App) -> usize {
        app.world_mut()
            .query_filtered::<Entity, With<DragHandle>>()
            .iter(app.world())
            .count()
    }

    #[test]
    fn starts_in_view_mode() {
        let mut app = test_app();
        app.update();
        assert_eq!(*app.world().resource::<State<EditorMode>>().get(), EditorMode::View);
    }

    #[test]
    fn leaving_edit_vertex_clears_markers_and_selection_but_not_store() {
        let mut app = test_app();
        set_mode(&mut app, EditorMode::EditVertex);

        let solid = app.world_mut().spawn(Solid).id();
        for i in 0..3 {
            app.world_mut().spawn((
                VertexMarker { solid, index: i },
                Transform::default(),
            ));
        }
        app.world_mut().spawn((DragHandle, Transform::default()));
        {
            let mut selection = app.world_mut().resource_mut::<VertexSelection>();
            selection.solid = Some(solid);
            selection.indices = vec![0, 1, 2];
            selection.anchor = Vec3::ONE;
            selection.last_hit = Some(Vec3::ONE);
        }
        app.world_mut()
            .resource_mut::<VertexStore>()
            .register_positions(solid, vec![Vec3::ZERO, Vec3::X, Vec3::Y]);

        set_mode(&mut app, EditorMode::Move);

        assert_eq!(marker_count(&mut app), 0);
        assert_eq!(handle_count(&mut app), 0);
        assert!(app.world().resource::<VertexSelection>().is_empty());
        // Registered vertex snapshots survive mode switches.
        assert!(app.world().resource::<VertexStore>().contains(solid));
    }

    #[test]
    fn leaving_move_drops_handle_and_selection() {
        let mut app = test_app();
        set_mode(&mut app, EditorMode::Move);

        let solid = app.world_mut().spawn(Solid).id();
        app.world_mut().spawn((DragHandle, Transform::default()));
        app.world_mut().resource_mut::<MoveSelection>().solid = Some(solid);

        set_mode(&mut app, EditorMode::View);

        assert_eq!(handle_count(&mut app), 0);
        assert!(app.world().resource::<MoveSelection>().solid.is_none());
    }

    #[test]
    fn repeated_mode_switching_leaves_no_tool_residue() {
        let mut app = test_app();
        let cycle = [
            EditorMode::Draw,
            EditorMode::EditVertex,
            EditorMode::Move,
            EditorMode::Extrude,
            EditorMode::EditVertex,
            EditorMode::View,
        ];
        for _ in 0..4 {
            for mode in cycle {
                set_mode(&mut app, mode);
            }
        }
        assert_eq!(marker_count(&mut app), 0);
        assert_eq!(handle_count(&mut app), 0);
        assert!(app.world().resource::<VertexSelection>().is_empty());
        assert!(app.world().resource::<MoveSelection>().solid.is_none());
    }
}

//! Hover highlighting for solids.
//!
//! Each solid gets a default pair of highlight actions when it is spawned:
//! pointer-over tints it, pointer-out restores the base color. Tools that
//! select a solid suspend both actions so the selection tint is not fought
//! over by hover churn, and restore them on deselect.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use bevy::picking::mesh_picking::ray_cast::{MeshRayCast, MeshRayCastSettings, RayCastVisibility};
use bevy::prelude::*;

use crate::solid::Solid;

pub const BASE_COLOR: Color = Color::srgb(0.92, 0.92, 0.92);
pub const HOVER_COLOR: Color = Color::srgb(0.30, 0.45, 0.95);
pub const SELECTED_COLOR: Color = Color::srgb(0.95, 0.60, 0.15);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HoverTrigger {
    Over,
    Out,
}

/// What firing a trigger does to the solid's material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightAction {
    pub color: Color,
}

/// Session-wide table of highlight actions, at most one per
/// (solid, trigger) key.
#[derive(Resource, Default)]
pub struct HighlightRegistry {
    actions: HashMap<(Entity, HoverTrigger), HighlightAction>,
}

impl HighlightRegistry {
    /// Install an action for a key. Installing over an existing entry is a
    /// caller bug; the second install is ignored so the key keeps a single
    /// action.
    pub fn install(&mut self, solid: Entity, trigger: HoverTrigger, action: HighlightAction) -> bool {
        match self.actions.entry((solid, trigger)) {
            Entry::Occupied(_) => {
                warn!("highlight action already installed for {solid} {trigger:?}");
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(action);
                true
            }
        }
    }

    /// Remove and return the action for a key, leaving the trigger inert.
    pub fn suspend(&mut self, solid: Entity, trigger: HoverTrigger) -> Option<HighlightAction> {
        self.actions.remove(&(solid, trigger))
    }

    /// Install `default` only if the key has no action. Returns true when the
    /// default was installed, signalling the caller to reset the solid's
    /// visible color as well.
    pub fn restore(&mut self, solid: Entity, trigger: HoverTrigger, default: HighlightAction) -> bool {
        match self.actions.entry((solid, trigger)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(default);
                true
            }
        }
    }

    pub fn get(&self, solid: Entity, trigger: HoverTrigger) -> Option<HighlightAction> {
        self.actions.get(&(solid, trigger)).copied()
    }

    pub fn is_registered(&self, solid: Entity, trigger: HoverTrigger) -> bool {
        self.actions.contains_key(&(solid, trigger))
    }

    pub fn forget_solid(&mut self, solid: Entity) {
        self.actions.retain(|(entity, _), _| *entity != solid);
    }
}

// ---------------------------------------------------------------------------
// Selection styling helpers shared by the move and vertex tools
// ---------------------------------------------------------------------------

pub fn tint_solid(
    materials: &mut Assets<StandardMaterial>,
    handle: &Handle<StandardMaterial>,
    color: Color,
) {
    if let Some(material) = materials.get_mut(handle) {
        material.base_color = color;
    }
}

/// Suspend both hover triggers and paint the selection tint.
pub fn grab_solid(
    registry: &mut HighlightRegistry,
    materials: &mut Assets<StandardMaterial>,
    material: Option<&MeshMaterial3d<StandardMaterial>>,
    solid: Entity,
) {
    registry.suspend(solid, HoverTrigger::Over);
    registry.suspend(solid, HoverTrigger::Out);
    if let Some(material_handle) = material {
        tint_solid(materials, &material_handle.0, SELECTED_COLOR);
    }
}

/// Reinstall the default hover actions and drop back to the base color.
pub fn release_solid(
    registry: &mut HighlightRegistry,
    materials: &mut Assets<StandardMaterial>,
    material: Option<&MeshMaterial3d<StandardMaterial>>,
    solid: Entity,
) {
    let over = registry.restore(solid, HoverTrigger::Over, HighlightAction { color: HOVER_COLOR });
    let out = registry.restore(solid, HoverTrigger::Out, HighlightAction { color: BASE_COLOR });
    if (over || out)
        && let Some(material_handle) = material
    {
        tint_solid(materials, &material_handle.0, BASE_COLOR);
    }
}

// ---------------------------------------------------------------------------
// Hover tracking
// ---------------------------------------------------------------------------

#[derive(Resource, Default)]
pub struct HoverState {
    pub current: Option<Entity>,
}

pub struct HighlightPlugin;

impl Plugin for HighlightPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HighlightRegistry>()
            .init_resource::<HoverState>()
            .add_systems(Update, update_hover);
    }
}

/// Per-frame cursor raycast. Fires the registry's over/out actions when the
/// hovered solid changes; suspended triggers fire nothing.
fn update_hover(
    windows: Query<&Window>,
    camera_query: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    solids: Query<&MeshMaterial3d<StandardMaterial>, With<Solid>>,
    registry: Res<HighlightRegistry>,
    mut hover: ResMut<HoverState>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut ray_cast: MeshRayCast,
) {
    let mut hovered = None;
    if let Ok(window) = windows.single()
        && let Some(cursor) = window.cursor_position()
        && let Ok((camera, camera_transform)) = camera_query.single()
        && let Ok(ray) = camera.viewport_to_world(camera_transform, cursor)
    {
        let settings = MeshRayCastSettings::default().with_visibility(RayCastVisibility::Any);
        hovered = ray_cast
            .cast_ray(ray, &settings)
            .iter()
            .map(|(entity, _)| *entity)
            .find(|entity| solids.contains(*entity));
    }

    if hovered == hover.current {
        return;
    }

    if let Some(previous) = hover.current.take()
        && let Some(action) = registry.get(previous, HoverTrigger::Out)
        && let Ok(material) = solids.get(previous)
    {
        tint_solid(&mut materials, &material.0, action.color);
    }
    if let Some(entered) = hovered
        && let Some(action) = registry.get(entered, HoverTrigger::Over)
        && let Ok(material) = solids.get(entered)
    {
        tint_solid(&mut materials, &material.0, action.color);
    }
    hover.current = hovered;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_keeps_a_single_action_per_key() {
        let mut registry = HighlightRegistry::default();
        let solid = Entity::PLACEHOLDER;

        assert!(registry.install(solid, HoverTrigger::Over, HighlightAction { color: HOVER_COLOR }));
        assert!(!registry.install(solid, HoverTrigger::Over, HighlightAction { color: BASE_COLOR }));

        // First install wins.
        assert_eq!(
            registry.get(solid, HoverTrigger::Over),
            Some(HighlightAction { color: HOVER_COLOR })
        );
    }

    #[test]
    fn triggers_are_independent_keys() {
        let mut registry = HighlightRegistry::default();
        let solid = Entity::PLACEHOLDER;

        assert!(registry.install(solid, HoverTrigger::Over, HighlightAction { color: HOVER_COLOR }));
        assert!(registry.install(solid, HoverTrigger::Out, HighlightAction { color: BASE_COLOR }));
        assert!(registry.is_registered(solid, HoverTrigger::Over));
        assert!(registry.is_registered(solid, HoverTrigger::Out));
    }

    #[test]
    fn suspend_then_restore_round_trips() {
        let mut registry = HighlightRegistry::default();
        let solid = Entity::PLACEHOLDER;
        registry.install(solid, HoverTrigger::Out, HighlightAction { color: BASE_COLOR });

        let suspended = registry.suspend(solid, HoverTrigger::Out);
        assert_eq!(suspended, Some(HighlightAction { color: BASE_COLOR }));
        assert!(!registry.is_registered(solid, HoverTrigger::Out));

        assert!(registry.restore(solid, HoverTrigger::Out, HighlightAction { color: BASE_COLOR }));
        assert!(registry.is_registered(solid, HoverTrigger::Out));
    }

    #[test]
    fn restore_is_a_no_op_when_an_action_exists() {
        let mut registry = HighlightRegistry::default();
        let solid = Entity::PLACEHOLDER;
        registry.install(solid, HoverTrigger::Out, HighlightAction { color: BASE_COLOR });

        assert!(!registry.restore(solid, HoverTrigger::Out, HighlightAction { color: HOVER_COLOR }));
        assert_eq!(
            registry.get(solid, HoverTrigger::Out),
            Some(HighlightAction { color: BASE_COLOR })
        );
    }

    #[test]
    fn forget_solid_drops_both_triggers() {
        let mut registry = HighlightRegistry::default();
        let solid = Entity::PLACEHOLDER;
        registry.install(solid, HoverTrigger::Over, HighlightAction { color: HOVER_COLOR });
        registry.install(solid, HoverTrigger::Out, HighlightAction { color: BASE_COLOR });

        registry.forget_solid(solid);
        assert!(!registry.is_registered(solid, HoverTrigger::Over));
        assert!(!registry.is_registered(solid, HoverTrigger::Out));
    }
}

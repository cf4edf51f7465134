use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReleaseMode {
    /// Let go in place.
    Drop,
    /// Hand the velocity of the final drag tick to the piece's body.
    #[default]
    Throw,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragSettings {
    pub release: ReleaseMode,
    /// Linear drag applied to thrown pieces, per second.
    pub throw_drag: f32,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            release: ReleaseMode::Throw,
            throw_drag: 4.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickHit<H> {
    pub handle: H,
    pub interactable: bool,
}

/// What the controller needs from the scene that owns the pieces.
///
/// Screen positions carry the view depth in `z`, so `screen_to_world` inverts
/// `world_to_screen` exactly.
pub trait PointerScene {
    type Handle: Copy + Eq + Debug;

    /// Nearest piece under the pointer.
    fn pick(&self, pointer: Vec2) -> Option<PickHit<Self::Handle>>;
    fn world_to_screen(&self, world: Vec3) -> Option<Vec3>;
    fn screen_to_world(&self, screen: Vec3) -> Option<Vec3>;
    fn position(&self, handle: Self::Handle) -> Option<Vec3>;
    fn set_position(&mut self, handle: Self::Handle, position: Vec3);
    fn has_highlight(&self, handle: Self::Handle) -> bool;
    fn set_highlight(&mut self, handle: Self::Handle, on: bool);
    /// Returns false when the piece has no body to carry the velocity.
    fn throw(&mut self, handle: Self::Handle, velocity: Vec3) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragState<H> {
    pub selected: Option<H>,
    pub drag_offset: Vec3,
    pub is_dragging: bool,
    pub last_highlighted: Option<H>,
}

impl<H> Default for DragState<H> {
    fn default() -> Self {
        Self {
            selected: None,
            drag_offset: Vec3::ZERO,
            is_dragging: false,
            last_highlighted: None,
        }
    }
}

/// Pointer selection, lateral dragging and hover highlighting of pieces.
#[derive(Clone, Debug)]
pub struct DragSelect<H> {
    pub settings: DragSettings,
    state: DragState<H>,
    last_position: Vec3,
    velocity: Vec3,
}

impl<H: Copy + Eq + Debug> DragSelect<H> {
    pub fn new(settings: DragSettings) -> Self {
        Self {
            settings,
            state: DragState::default(),
            last_position: Vec3::ZERO,
            velocity: Vec3::ZERO,
        }
    }

    pub fn state(&self) -> &DragState<H> {
        &self.state
    }

    pub fn press<S>(&mut self, scene: &S, pointer: Vec2)
    where
        S: PointerScene<Handle = H>,
    {
        let Some(hit) = scene.pick(pointer) else {
            return;
        };
        if !hit.interactable {
            return;
        }
        let Some(position) = scene.position(hit.handle) else {
            return;
        };
        let Some(depth) = scene.world_to_screen(position).map(|s| s.z) else {
            return;
        };
        let Some(grab) = scene.screen_to_world(pointer.extend(depth)) else {
            return;
        };

        self.state.selected = Some(hit.handle);
        self.state.drag_offset = grab - position;
        self.state.is_dragging = true;
        self.last_position = position;
        self.velocity = Vec3::ZERO;
    }

    /// Ends a drag. Returns the velocity handed to the piece, if it was thrown.
    pub fn release<S>(&mut self, scene: &mut S) -> Option<Vec3>
    where
        S: PointerScene<Handle = H>,
    {
        let held = self.state.selected.take();
        let was_dragging = std::mem::replace(&mut self.state.is_dragging, false);

        let thrown = match (held, self.settings.release) {
            (Some(handle), ReleaseMode::Throw) if was_dragging => {
                scene.throw(handle, self.velocity).then_some(self.velocity)
            }
            _ => None,
        };
        self.velocity = Vec3::ZERO;
        thrown
    }

    pub fn tick<S>(&mut self, scene: &mut S, pointer: Option<Vec2>, dt: f32)
    where
        S: PointerScene<Handle = H>,
    {
        if let (true, Some(pointer)) = (self.state.is_dragging, pointer) {
            self.move_selected(scene, pointer, dt);
        }
        self.refresh_highlight(scene, pointer);
    }

    pub fn reset(&mut self) {
        self.state = DragState::default();
        self.last_position = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
    }

    fn move_selected<S>(&mut self, scene: &mut S, pointer: Vec2, dt: f32)
    where
        S: PointerScene<Handle = H>,
    {
        let Some(handle) = self.state.selected else {
            return;
        };
        let Some(position) = scene.position(handle) else {
            return;
        };
        let Some(depth) = scene.world_to_screen(position).map(|s| s.z) else {
            return;
        };
        let Some(under_pointer) = scene.screen_to_world(pointer.extend(depth)) else {
            return;
        };

        // The offset lies in the view plane, so `next` keeps the piece's depth.
        let next = under_pointer - self.state.drag_offset;
        scene.set_position(handle, next);

        if dt > 0.0 {
            self.velocity = (next - self.last_position) / dt;
        }
        self.last_position = next;
    }

    fn holding_highlighted(&self) -> bool {
        self.state.is_dragging
            && self.state.selected.is_some()
            && self.state.selected == self.state.last_highlighted
    }

    fn refresh_highlight<S>(&mut self, scene: &mut S, pointer: Option<Vec2>)
    where
        S: PointerScene<Handle = H>,
    {
        if self.holding_highlighted() {
            return;
        }

        let hovered = pointer
            .and_then(|p| scene.pick(p))
            .filter(|hit| hit.interactable && scene.has_highlight(hit.handle))
            .map(|hit| hit.handle);

        match hovered {
            Some(handle) if self.state.last_highlighted == Some(handle) => {}
            Some(handle) => {
                self.clear_highlight(scene);
                scene.set_highlight(handle, true);
                self.state.last_highlighted = Some(handle);
            }
            None => self.clear_highlight(scene),
        }
    }

    fn clear_highlight<S>(&mut self, scene: &mut S)
    where
        S: PointerScene<Handle = H>,
    {
        if let Some(previous) = self.state.last_highlighted.take() {
            scene.set_highlight(previous, false);
        }
    }
}

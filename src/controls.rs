use crate::camera::RotateRequest;
use crate::config::TabletopConfig;
use bevy::prelude::*;
use bevy_egui::EguiContexts;

pub struct ControlsPlugin;
impl Plugin for ControlsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<InteractEvent>()
            .add_event::<RotateRequest>()
            .add_systems(Update, (interact_buttons, rotate_keys));
    }
}

/// Press and release of the interact button.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractEvent {
    Pressed,
    Released,
}

// Releases always go through so a drag can't outlive the button.
fn interact_buttons(buttons: Res<ButtonInput<MouseButton>>, mut events: EventWriter<InteractEvent>) {
    if buttons.just_pressed(MouseButton::Left) {
        events.send(InteractEvent::Pressed);
    }
    if buttons.just_released(MouseButton::Left) {
        events.send(InteractEvent::Released);
    }
}

fn rotate_keys(
    keys: Res<ButtonInput<KeyCode>>,
    config: Res<TabletopConfig>,
    mut requests: EventWriter<RotateRequest>,
    mut egui: EguiContexts,
) {
    if egui.ctx_mut().wants_keyboard_input() {
        return;
    }

    if keys.just_pressed(config.controls.rotate_left) {
        requests.send(RotateRequest::Left);
    }
    if keys.just_pressed(config.controls.rotate_right) {
        requests.send(RotateRequest::Right);
    }
}

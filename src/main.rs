mod camera;
mod config;
mod controls;
mod drag;
mod easing;
mod loader;
mod orbit;
mod picking;
mod scene_loading;
mod tabletop;
mod ui;

use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use camera::CameraPlugin;
use config::CONFIG_PATH;
use controls::ControlsPlugin;
use picking::DragPlugin;
use scene_loading::SceneLoadingPlugin;
use ui::UiPlugin;

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, EguiPlugin))
        .insert_resource(config::load_or_default(CONFIG_PATH))
        .add_plugins((
            CameraPlugin,
            ControlsPlugin,
            DragPlugin,
            SceneLoadingPlugin,
            UiPlugin,
        ))
        .add_systems(Startup, setup_light)
        .run();
}

fn setup_light(mut commands: Commands) {
    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            illuminance: 12_000.0,
            shadows_enabled: true,
            ..default()
        },
        transform: Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -1.0, -0.6, 0.0)),
        ..default()
    });
}

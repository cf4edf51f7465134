use crate::config::TabletopConfig;
use crate::orbit::OrbitRig;
use crate::scene_loading::SceneActivated;
use bevy::prelude::*;

pub struct CameraPlugin;
impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<RotateRequest>()
            .add_event::<SceneActivated>()
            .add_systems(Startup, spawn_camera)
            .add_systems(
                Update,
                (reset_on_scene_change, apply_rotate_requests, animate_orbit).chain(),
            );
    }
}

#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotateRequest {
    Left,
    Right,
}

#[derive(Component)]
pub struct TableCamera;

fn spawn_camera(mut commands: Commands, config: Res<TabletopConfig>) {
    let rig = OrbitRig::new(config.orbit.clone());

    commands.spawn((
        Camera3dBundle {
            transform: rig.camera_transform(),
            ..default()
        },
        rig,
        TableCamera,
        Name::new("TableCamera"),
    ));
}

fn apply_rotate_requests(
    mut requests: EventReader<RotateRequest>,
    mut rigs: Query<&mut OrbitRig, With<TableCamera>>,
) {
    for request in requests.read() {
        for mut rig in &mut rigs {
            let started = match request {
                RotateRequest::Left => rig.rotate_left(),
                RotateRequest::Right => rig.rotate_right(),
            };
            if !started {
                debug!(?request, "Orbit transition in progress, request dropped");
            }
        }
    }
}

fn animate_orbit(
    mut rigs: Query<(&mut OrbitRig, &mut Transform), With<TableCamera>>,
    time: Res<Time>,
) {
    let dt = time.delta_seconds();
    for (mut rig, mut transform) in &mut rigs {
        if rig.advance(dt) {
            *transform = rig.camera_transform();
        }
    }
}

fn reset_on_scene_change(
    mut activated: EventReader<SceneActivated>,
    mut rigs: Query<(&mut OrbitRig, &mut Transform), With<TableCamera>>,
) {
    if activated.read().last().is_none() {
        return;
    }
    for (mut rig, mut transform) in &mut rigs {
        rig.reset();
        *transform = rig.camera_transform();
    }
}

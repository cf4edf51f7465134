use crate::config::TabletopConfig;
use crate::loader::{ACTIVATION_THRESHOLD, LoadingOverlay, ProgressLoader, SceneLoad};
use crate::tabletop::{self, SceneMember};
use bevy::asset::LoadState;
use bevy::prelude::*;

pub struct SceneLoadingPlugin;
impl Plugin for SceneLoadingPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<LoadSceneRequest>()
            .add_event::<SceneActivated>()
            .init_resource::<SceneLoader>()
            .init_resource::<LoadingOverlayState>()
            .add_systems(Startup, request_initial_scene)
            .add_systems(
                Update,
                (start_scene_loads, activate_settled_scene, report_load_progress).chain(),
            );
    }
}

/// Asks for a scene from the configured catalog by name.
#[derive(Event, Clone, Debug, PartialEq, Eq)]
pub struct LoadSceneRequest(pub String);

/// Sent once a scene has replaced the previous one.
#[derive(Event, Clone, Debug, PartialEq, Eq)]
pub struct SceneActivated {
    pub name: String,
}

#[derive(Debug)]
struct PendingScene {
    name: String,
    handles: Vec<Handle<Scene>>,
    activated: bool,
}

#[derive(Resource, Default)]
pub struct SceneLoader {
    progress: ProgressLoader,
    pending: Option<PendingScene>,
}

impl SceneLoader {
    pub fn is_loading(&self) -> bool {
        self.progress.is_loading()
    }

    pub fn scene(&self) -> Option<&str> {
        self.progress.scene()
    }
}

/// What the egui overlay draws.
#[derive(Resource, Clone, Debug, Default, PartialEq)]
pub struct LoadingOverlayState {
    pub visible: bool,
    pub progress: f32,
    pub label: String,
}

impl LoadingOverlay for LoadingOverlayState {
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn set_progress(&mut self, fraction: f32) {
        self.progress = fraction;
    }

    fn set_label(&mut self, text: &str) {
        self.label.clear();
        self.label.push_str(text);
    }
}

/// Raw progress of a scene whose assets have partly settled. Everything past
/// [`ACTIVATION_THRESHOLD`] belongs to activation.
pub fn raw_progress(settled: usize, total: usize) -> f32 {
    if total == 0 {
        return ACTIVATION_THRESHOLD;
    }
    ACTIVATION_THRESHOLD * (settled.min(total) as f32 / total as f32)
}

#[derive(Clone, Copy, Debug)]
struct LoadStatus {
    settled: usize,
    total: usize,
    activated: bool,
}

impl LoadStatus {
    fn of(pending: &PendingScene, server: &AssetServer) -> Self {
        Self {
            settled: pending
                .handles
                .iter()
                .filter(|handle| is_settled(server, handle))
                .count(),
            total: pending.handles.len(),
            activated: pending.activated,
        }
    }
}

impl SceneLoad for LoadStatus {
    fn progress(&self) -> f32 {
        if self.activated {
            return 1.0;
        }
        raw_progress(self.settled, self.total)
    }

    fn is_done(&self) -> bool {
        self.activated
    }
}

// Failed assets count as settled so one bad path cannot stall the load.
fn is_settled(server: &AssetServer, handle: &Handle<Scene>) -> bool {
    matches!(
        server.get_load_state(handle.id()),
        Some(LoadState::Loaded | LoadState::Failed(_))
    )
}

fn request_initial_scene(config: Res<TabletopConfig>, mut requests: EventWriter<LoadSceneRequest>) {
    if let Some(name) = &config.initial_scene {
        requests.send(LoadSceneRequest(name.clone()));
    }
}

fn start_scene_loads(
    mut requests: EventReader<LoadSceneRequest>,
    config: Res<TabletopConfig>,
    asset_server: Res<AssetServer>,
    mut loader: ResMut<SceneLoader>,
    mut overlay: ResMut<LoadingOverlayState>,
) {
    for LoadSceneRequest(name) in requests.read() {
        let Some(entry) = config.scenes.get(name) else {
            warn!(scene = %name, "Unknown scene requested");
            continue;
        };
        if loader.is_loading() {
            warn!(
                scene = %name,
                loading = ?loader.scene(),
                "Scene load already in progress, request ignored"
            );
            continue;
        }

        let pending = PendingScene {
            name: name.clone(),
            handles: entry
                .assets
                .iter()
                .map(|path| asset_server.load(path.clone()))
                .collect(),
            activated: false,
        };
        let status = LoadStatus::of(&pending, &asset_server);

        if loader.progress.load_scene(name, &status, &mut *overlay) {
            info!(scene = %name, assets = pending.handles.len(), "Loading scene");
            loader.pending = Some(pending);
        }
    }
}

fn activate_settled_scene(
    mut commands: Commands,
    mut loader: ResMut<SceneLoader>,
    asset_server: Res<AssetServer>,
    members: Query<Entity, With<SceneMember>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(pending) = loader.pending.as_mut() else {
        return;
    };
    if pending.activated {
        return;
    }
    let status = LoadStatus::of(pending, &asset_server);
    if status.settled < status.total {
        return;
    }

    for entity in &members {
        commands.entity(entity).despawn_recursive();
    }

    tabletop::spawn_tabletop(&mut commands, &mut meshes, &mut materials);

    for handle in &pending.handles {
        if let Some(LoadState::Failed(err)) = asset_server.get_load_state(handle.id()) {
            error!(scene = %pending.name, %err, "Scene asset failed to load, skipping");
            continue;
        }
        commands.spawn((
            SceneBundle {
                scene: handle.clone(),
                ..default()
            },
            SceneMember,
        ));
    }

    pending.activated = true;
}

fn report_load_progress(
    mut loader: ResMut<SceneLoader>,
    asset_server: Res<AssetServer>,
    mut overlay: ResMut<LoadingOverlayState>,
    mut activated: EventWriter<SceneActivated>,
) {
    let loader = &mut *loader;
    let Some(pending) = &loader.pending else {
        return;
    };
    let status = LoadStatus::of(pending, &asset_server);

    if let Some(name) = loader.progress.tick(&status, &mut *overlay) {
        loader.pending = None;
        info!(scene = %name, "Scene activated");
        activated.send(SceneActivated { name });
    }
}

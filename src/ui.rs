use crate::camera::{RotateRequest, TableCamera};
use crate::config::{CONFIG_PATH, TabletopConfig, save_config};
use crate::orbit::OrbitRig;
use crate::scene_loading::{LoadSceneRequest, LoadingOverlayState, SceneLoader};
use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (ui_panel, loading_overlay).chain());
    }
}

fn ui_panel(
    mut egui_ctx: EguiContexts,
    mut config: ResMut<TabletopConfig>,
    mut rigs: Query<&mut OrbitRig, With<TableCamera>>,
    mut rotate: EventWriter<RotateRequest>,
    mut load: EventWriter<LoadSceneRequest>,
    loader: Res<SceneLoader>,
) {
    egui::TopBottomPanel::top("toolbar").show(egui_ctx.ctx_mut(), |ui| {
        ui.horizontal(|ui| {
            if ui.button("Rotate Left").clicked() {
                rotate.send(RotateRequest::Left);
            }
            if ui.button("Rotate Right").clicked() {
                rotate.send(RotateRequest::Right);
            }

            ui.separator();
            let mut step = config.orbit.step_degrees;
            let mut duration = config.orbit.duration_secs;
            let step_changed = ui
                .add(egui::Slider::new(&mut step, 5.0..=180.0).text("Step °"))
                .changed();
            let duration_changed = ui
                .add(egui::Slider::new(&mut duration, 0.1..=5.0).text("Duration s"))
                .changed();
            if step_changed || duration_changed {
                config.orbit.step_degrees = step;
                config.orbit.duration_secs = duration;
                for mut rig in &mut rigs {
                    rig.settings.step_degrees = step;
                    rig.settings.duration_secs = duration;
                }
            }

            ui.separator();
            if ui.button("Save").clicked() {
                match save_config(CONFIG_PATH, &config) {
                    Ok(()) => info!(path = CONFIG_PATH, "Saved config"),
                    Err(err) => error!("{err:#}"),
                }
            }

            ui.separator();
            ui.label("Scene:");
            for name in config.scenes.keys() {
                let button = egui::Button::new(name.as_str())
                    .selected(loader.scene() == Some(name.as_str()));
                if ui.add_enabled(!loader.is_loading(), button).clicked() {
                    load.send(LoadSceneRequest(name.clone()));
                }
            }
        });
    });
}

fn loading_overlay(
    mut egui_ctx: EguiContexts,
    overlay: Res<LoadingOverlayState>,
    loader: Res<SceneLoader>,
) {
    if !overlay.visible {
        return;
    }

    egui::Window::new("Loading")
        .title_bar(false)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(egui_ctx.ctx_mut(), |ui| {
            if let Some(scene) = loader.scene() {
                ui.heading(scene);
            }
            ui.add(egui::ProgressBar::new(overlay.progress).desired_width(240.0));
            ui.label(overlay.label.as_str());
        });
}

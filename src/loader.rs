/// Raw progress at which the host has finished loading and only activation
/// remains.
pub const ACTIVATION_THRESHOLD: f32 = 0.9;

pub trait SceneLoad {
    /// Raw progress in `[0, 1]`, with the final tenth reserved for activation.
    fn progress(&self) -> f32;
    fn is_done(&self) -> bool;
}

pub trait LoadingOverlay {
    fn set_visible(&mut self, visible: bool);
    fn set_progress(&mut self, fraction: f32);
    fn set_label(&mut self, text: &str);
}

pub fn displayed_fraction(raw: f32) -> f32 {
    (raw / ACTIVATION_THRESHOLD).clamp(0.0, 1.0)
}

pub fn percent_label(fraction: f32) -> String {
    format!("{:.0}%", fraction * 100.0)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoadProgress {
    pub fraction: f32,
    pub is_complete: bool,
}

#[derive(Debug)]
struct ActiveLoad {
    scene: String,
    progress: LoadProgress,
}

/// Drives the loading overlay for one scene transition at a time.
#[derive(Debug, Default)]
pub struct ProgressLoader {
    active: Option<ActiveLoad>,
}

impl ProgressLoader {
    pub fn is_loading(&self) -> bool {
        self.active.is_some()
    }

    pub fn scene(&self) -> Option<&str> {
        self.active.as_ref().map(|load| load.scene.as_str())
    }

    pub fn progress(&self) -> Option<LoadProgress> {
        self.active.as_ref().map(|load| load.progress)
    }

    /// Starts tracking `op`, shows the overlay and writes the initial progress.
    /// Completion is only reported by [`ProgressLoader::tick`]. Returns false,
    /// leaving the running load untouched, if one is already in flight.
    pub fn load_scene(
        &mut self,
        scene: &str,
        op: &impl SceneLoad,
        overlay: &mut impl LoadingOverlay,
    ) -> bool {
        if self.active.is_some() {
            return false;
        }
        let fraction = displayed_fraction(op.progress());
        overlay.set_visible(true);
        write_progress(overlay, fraction);
        self.active = Some(ActiveLoad {
            scene: scene.to_owned(),
            progress: LoadProgress {
                fraction,
                is_complete: false,
            },
        });
        true
    }

    /// Writes the current progress. Returns the scene name once the load has
    /// finished and the overlay is hidden.
    pub fn tick(
        &mut self,
        op: &impl SceneLoad,
        overlay: &mut impl LoadingOverlay,
    ) -> Option<String> {
        let load = self.active.as_mut()?;

        if op.is_done() {
            load.progress = LoadProgress {
                fraction: 1.0,
                is_complete: true,
            };
            write_progress(overlay, 1.0);
            overlay.set_visible(false);
            return self.active.take().map(|load| load.scene);
        }

        let fraction = displayed_fraction(op.progress()).max(load.progress.fraction);
        load.progress.fraction = fraction;
        write_progress(overlay, fraction);
        None
    }
}

fn write_progress(overlay: &mut impl LoadingOverlay, fraction: f32) {
    overlay.set_progress(fraction);
    overlay.set_label(&percent_label(fraction));
}

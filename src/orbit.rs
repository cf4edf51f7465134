use crate::easing::TransitionCurve;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    pub step_degrees: f32,
    pub duration_secs: f32,
    pub radius: f32,
    pub height: f32,
    pub pivot: Vec3,
    pub start_angle_degrees: f32,
    pub curve: TransitionCurve,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            step_degrees: 45.0,
            duration_secs: 1.0,
            radius: 5.0,
            height: 3.0,
            pivot: Vec3::ZERO,
            start_angle_degrees: 0.0,
            curve: TransitionCurve::SmoothStep,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitState {
    pub current_angle_degrees: f32,
    pub target_angle_degrees: f32,
    pub is_transitioning: bool,
}

#[derive(Clone, Copy, Debug)]
struct Transition {
    start: f32,
    elapsed: f32,
}

/// Camera orbit around a fixed pivot, moved in discrete eased steps.
///
/// At most one transition runs at a time; step requests made while one is in
/// flight are dropped.
#[derive(Component, Clone, Debug)]
pub struct OrbitRig {
    pub settings: OrbitSettings,
    state: OrbitState,
    transition: Option<Transition>,
}

impl OrbitRig {
    pub fn new(settings: OrbitSettings) -> Self {
        let angle = settings.start_angle_degrees;
        Self {
            settings,
            state: OrbitState {
                current_angle_degrees: angle,
                target_angle_degrees: angle,
                is_transitioning: false,
            },
            transition: None,
        }
    }

    pub fn state(&self) -> OrbitState {
        self.state
    }

    pub fn rotate_left(&mut self) -> bool {
        self.begin(-self.settings.step_degrees)
    }

    pub fn rotate_right(&mut self) -> bool {
        self.begin(self.settings.step_degrees)
    }

    fn begin(&mut self, delta_degrees: f32) -> bool {
        if self.state.is_transitioning {
            return false;
        }
        let start = self.state.current_angle_degrees;
        self.state.target_angle_degrees = start + delta_degrees;
        self.state.is_transitioning = true;
        self.transition = Some(Transition { start, elapsed: 0.0 });
        true
    }

    /// Steps the running transition by `dt` seconds. Returns whether the angle
    /// moved.
    pub fn advance(&mut self, dt: f32) -> bool {
        let Some(transition) = self.transition.as_mut() else {
            return false;
        };
        transition.elapsed += dt.max(0.0);

        let duration = self.settings.duration_secs;
        let target = self.state.target_angle_degrees;
        if duration <= 0.0 || transition.elapsed >= duration {
            // Snap to remove accumulated interpolation error.
            let settled = target.rem_euclid(360.0);
            self.state = OrbitState {
                current_angle_degrees: settled,
                target_angle_degrees: settled,
                is_transitioning: false,
            };
            self.transition = None;
            return true;
        }

        let eased = self.settings.curve.evaluate(transition.elapsed / duration);
        self.state.current_angle_degrees = transition.start + (target - transition.start) * eased;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.settings.clone());
    }

    pub fn eye_position(&self) -> Vec3 {
        let radians = self.state.current_angle_degrees.to_radians();
        let pivot = self.settings.pivot;
        Vec3::new(
            pivot.x + self.settings.radius * radians.cos(),
            self.settings.height,
            pivot.z + self.settings.radius * radians.sin(),
        )
    }

    pub fn camera_transform(&self) -> Transform {
        Transform::from_translation(self.eye_position()).looking_at(self.settings.pivot, Vec3::Y)
    }
}

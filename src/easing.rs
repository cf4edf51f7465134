use serde::{Deserialize, Serialize};

/// Maps normalized transition time onto normalized progress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum TransitionCurve {
    Linear,
    /// Ease in and out, zero slope at both ends.
    #[default]
    SmoothStep,
    /// Piecewise-linear through `[time, value]` keys sorted by time.
    Keyframes(Vec<[f32; 2]>),
}

impl TransitionCurve {
    /// Input is clamped to `[0, 1]`. Keyframe curves hold their first and last
    /// values outside the keyed range.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            TransitionCurve::Linear => t,
            TransitionCurve::SmoothStep => t * t * (3.0 - 2.0 * t),
            TransitionCurve::Keyframes(keys) => sample_keys(keys, t),
        }
    }
}

fn sample_keys(keys: &[[f32; 2]], t: f32) -> f32 {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return t;
    };
    if t <= first[0] {
        return first[1];
    }
    if t >= last[0] {
        return last[1];
    }

    for pair in keys.windows(2) {
        let [t0, v0] = pair[0];
        let [t1, v1] = pair[1];
        if t <= t1 {
            let span = t1 - t0;
            if span <= f32::EPSILON {
                return v1;
            }
            return v0 + (v1 - v0) * ((t - t0) / span);
        }
    }

    last[1]
}

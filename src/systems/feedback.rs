//! Feedback channel: camera shake, gauge colors and display strings.
//!
//! A pure function of stage, parameters and simulated time. The system just
//! writes the result into the `Feedback` resource for the camera, gauges and
//! annotations to read.

use super::stage::{Stage, StageMachine};
use crate::clock::SimClock;
use crate::config::{FeedbackConfig, SimConfig};
use crate::params::VolcanoParams;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Crater light bounds.
pub const GLOW_MIN: f32 = 2.0;
pub const GLOW_MAX: f32 = 3.5;

/// Color band of the pressure gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GaugeBand {
    #[default]
    Amber,
    Orange,
    Red,
}

impl GaugeBand {
    pub fn for_pressure(pressure: f32, config: &FeedbackConfig) -> Self {
        if pressure < config.amber_below {
            GaugeBand::Amber
        } else if pressure >= config.red_from {
            GaugeBand::Red
        } else {
            GaugeBand::Orange
        }
    }

    pub fn rgb(self) -> [f32; 3] {
        match self {
            GaugeBand::Amber => [1.0, 0.75, 0.0],
            GaugeBand::Orange => [1.0, 0.5, 0.0],
            GaugeBand::Red => [1.0, 0.0, 0.0],
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            GaugeBand::Amber => "#FFBF00",
            GaugeBand::Orange => "#FF8000",
            GaugeBand::Red => "#FF0000",
        }
    }
}

/// Values the presentation layer reads each frame.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Camera shake magnitude, never negative.
    pub shake_intensity: f32,
    pub pressure_band: GaugeBand,
    pub pressure_label: String,
    pub temperature_label: String,
    pub intensity_label: String,
    pub stage_label: String,
    /// Crater point-light intensity in `[GLOW_MIN, GLOW_MAX]`.
    pub crater_glow: f32,
}

/// Camera shake for a stage and pressure at time `t`.
pub fn shake_intensity(stage: Stage, pressure: f32, t: f32, config: &FeedbackConfig) -> f32 {
    if !matches!(stage, Stage::MagmaRising | Stage::Erupting) {
        return 0.0;
    }
    let jitter = config.jitter.clamp(0.0, 1.0) * (config.jitter_frequency * t).sin();
    let shake = (pressure / 100.0) * config.max_shake * (1.0 + jitter);
    if shake.is_finite() {
        shake.max(0.0)
    } else {
        0.0
    }
}

/// Flickering crater light, two incommensurate sines mapped onto the glow range.
pub fn crater_glow(t: f32) -> f32 {
    let wave = 0.6 * (1.7 * t).sin() + 0.4 * (4.3 * t).sin();
    let mid = (GLOW_MIN + GLOW_MAX) * 0.5;
    let half = (GLOW_MAX - GLOW_MIN) * 0.5;
    let glow = mid + half * wave;
    if glow.is_finite() {
        glow.clamp(GLOW_MIN, GLOW_MAX)
    } else {
        mid
    }
}

pub fn compute_feedback(
    stage: Stage,
    params: &VolcanoParams,
    t: f32,
    config: &FeedbackConfig,
) -> Feedback {
    let pressure = params.pressure();
    Feedback {
        shake_intensity: shake_intensity(stage, pressure, t, config),
        pressure_band: GaugeBand::for_pressure(pressure, config),
        pressure_label: format!("{:.0}%", pressure),
        temperature_label: format!("{:.0}°C", params.temperature()),
        intensity_label: format!("{:.0}%", params.eruption_intensity()),
        stage_label: stage.label().to_string(),
        crater_glow: crater_glow(t),
    }
}

/// ## Data Access
/// - Reads: SimClock, SimConfig, StageMachine, VolcanoParams
/// - Writes: Feedback
pub fn feedback_system(
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    machine: Res<StageMachine>,
    params: Res<VolcanoParams>,
    mut feedback: ResMut<Feedback>,
) {
    *feedback = compute_feedback(machine.stage(), &params, clock.elapsed(), &config.feedback);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Param;

    #[test]
    fn test_no_shake_outside_active_stages() {
        let config = FeedbackConfig::default();
        for stage in [Stage::Dormant, Stage::PressureBuilding, Stage::PostEruption] {
            assert_eq!(shake_intensity(stage, 100.0, 1.3, &config), 0.0);
        }
    }

    #[test]
    fn test_shake_bounded_and_non_negative() {
        let config = FeedbackConfig::default();
        for i in 0..500 {
            let t = i as f32 * 0.013;
            let s = shake_intensity(Stage::Erupting, 100.0, t, &config);
            assert!(s >= 0.0);
            assert!(s <= config.max_shake * (1.0 + config.jitter) + 1e-5);
        }
    }

    #[test]
    fn test_shake_scales_with_pressure() {
        let config = FeedbackConfig {
            jitter: 0.0,
            ..FeedbackConfig::default()
        };
        let half = shake_intensity(Stage::MagmaRising, 50.0, 0.0, &config);
        assert!((half - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_gauge_bands() {
        let config = FeedbackConfig::default();
        assert_eq!(GaugeBand::for_pressure(29.9, &config), GaugeBand::Amber);
        assert_eq!(GaugeBand::for_pressure(30.0, &config), GaugeBand::Orange);
        assert_eq!(GaugeBand::for_pressure(69.9, &config), GaugeBand::Orange);
        assert_eq!(GaugeBand::for_pressure(70.0, &config), GaugeBand::Red);
    }

    #[test]
    fn test_glow_within_bounds() {
        for i in 0..1000 {
            let g = crater_glow(i as f32 * 0.037);
            assert!((GLOW_MIN..=GLOW_MAX).contains(&g));
        }
    }

    #[test]
    fn test_labels() {
        let mut params = VolcanoParams::default();
        params.set(Param::Pressure, 72.4);
        let fb = compute_feedback(Stage::Erupting, &params, 0.0, &FeedbackConfig::default());
        assert_eq!(fb.pressure_label, "72%");
        assert_eq!(fb.temperature_label, "950°C");
        assert_eq!(fb.stage_label, "Erupting");
        assert_eq!(fb.pressure_band, GaugeBand::Red);
    }
}

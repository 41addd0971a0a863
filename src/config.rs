//! Simulation configuration.
//!
//! Every threshold, ramp rate, duration, baseline and pool size is a named
//! value here rather than a literal in the systems that use it. `SimConfig`
//! is inserted into the ECS world as a resource; all sections default
//! independently so a partial TOML file only overrides what it names.

use crate::error::{Result, SimError};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Top-level configuration for a `VolcanoSim`.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for every particle RNG. Each subsystem mixes in its own salt.
    pub seed: u64,
    /// Upper bound on a single frame delta in seconds.
    pub max_frame_delta: f32,
    pub stages: StageConfig,
    pub baseline: ParamBaseline,
    pub geometry: VolcanoGeometry,
    pub pools: PoolSizes,
    pub feedback: FeedbackConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED_1A7A,
            max_frame_delta: 0.1,
            stages: StageConfig::default(),
            baseline: ParamBaseline::default(),
            geometry: VolcanoGeometry::default(),
            pools: PoolSizes::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}

/// Timing and threshold values for the eruption cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Seconds spent dormant before pressure starts building (auto-demo only).
    pub dormant_delay: f32,
    /// Seconds between pressure ramp steps.
    pub ramp_interval: f32,
    /// Pressure added per ramp step while building.
    pub building_step: f32,
    /// Pressure at which building gives way to magma rising (T1).
    pub rising_threshold: f32,
    /// Pressure added per ramp step while magma rises.
    pub rising_step: f32,
    /// Pressure at which the volcano erupts (T2).
    pub eruption_threshold: f32,
    /// Intensity set on entering the eruption.
    pub peak_intensity: f32,
    /// Seconds the eruption lasts.
    pub eruption_duration: f32,
    /// Seconds of aftermath before returning to dormancy.
    pub aftermath_duration: f32,
    pub post_eruption_intensity: f32,
    pub post_eruption_pressure: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            dormant_delay: 3.0,
            ramp_interval: 0.2,
            building_step: 2.0,
            rising_threshold: 60.0,
            rising_step: 2.0,
            eruption_threshold: 90.0,
            peak_intensity: 100.0,
            eruption_duration: 10.0,
            aftermath_duration: 8.0,
            post_eruption_intensity: 30.0,
            post_eruption_pressure: 20.0,
        }
    }
}

/// Parameter values at start-up and after an auto-demo reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamBaseline {
    pub pressure: f32,
    pub temperature: f32,
    pub gas_content: f32,
    pub magma_viscosity: f32,
    pub eruption_intensity: f32,
}

impl Default for ParamBaseline {
    fn default() -> Self {
        Self {
            pressure: 10.0,
            temperature: 950.0,
            gas_content: 50.0,
            magma_viscosity: 50.0,
            eruption_intensity: 0.0,
        }
    }
}

/// Scene geometry in world units (Y up, crater centred on the Y axis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolcanoGeometry {
    pub ground_level: f32,
    pub crater_height: f32,
    pub crater_radius: f32,
    /// Bottom of the conduit channel.
    pub chamber_height: f32,
    pub conduit_radius: f32,
}

impl Default for VolcanoGeometry {
    fn default() -> Self {
        Self {
            ground_level: -10.0,
            crater_height: 40.0,
            crater_radius: 5.0,
            chamber_height: -5.0,
            conduit_radius: 1.5,
        }
    }
}

/// Fixed pool capacities. Zero leaves a subsystem out entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSizes {
    pub lava: usize,
    pub smoke: usize,
    pub ash: usize,
    pub debris: usize,
    pub conduit: usize,
}

impl Default for PoolSizes {
    fn default() -> Self {
        Self {
            lava: 2000,
            smoke: 1000,
            ash: 1500,
            debris: 200,
            conduit: 300,
        }
    }
}

/// Camera shake and gauge settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub max_shake: f32,
    /// Relative amplitude of the shake oscillation (0-1).
    pub jitter: f32,
    /// Angular frequency of the shake oscillation in rad/s.
    pub jitter_frequency: f32,
    /// Pressure at which the gauge turns from amber to orange.
    pub amber_below: f32,
    /// Pressure at which the gauge turns red.
    pub red_from: f32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            max_shake: 0.5,
            jitter: 0.3,
            jitter_frequency: 25.0,
            amber_below: 30.0,
            red_from: 70.0,
        }
    }
}

impl SimConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Reject configurations the stage machine or particle kinematics cannot run.
    pub fn validate(&self) -> Result<()> {
        let check = |ok: bool, message: &str| -> Result<()> {
            if ok {
                Ok(())
            } else {
                warn!(reason = message, "rejecting simulation config");
                Err(SimError::InvalidConfig(message.to_string()))
            }
        };

        check(
            self.max_frame_delta.is_finite() && self.max_frame_delta > 0.0,
            "max_frame_delta must be positive",
        )?;

        let s = &self.stages;
        for (name, value) in [
            ("stages.dormant_delay", s.dormant_delay),
            ("stages.ramp_interval", s.ramp_interval),
            ("stages.building_step", s.building_step),
            ("stages.rising_step", s.rising_step),
            ("stages.eruption_duration", s.eruption_duration),
            ("stages.aftermath_duration", s.aftermath_duration),
        ] {
            check(
                value.is_finite() && value > 0.0,
                &format!("{name} must be positive"),
            )?;
        }
        check(
            s.rising_threshold > 0.0
                && s.rising_threshold < s.eruption_threshold
                && s.eruption_threshold <= 100.0,
            "pressure thresholds must satisfy 0 < rising < eruption <= 100",
        )?;

        let g = &self.geometry;
        check(
            g.crater_height > g.chamber_height && g.crater_height > g.ground_level,
            "crater must sit above the chamber and the ground",
        )?;
        check(
            g.crater_radius > 0.0 && g.conduit_radius >= 0.0,
            "crater_radius must be positive",
        )?;

        let f = &self.feedback;
        check(
            f.max_shake >= 0.0 && (0.0..=1.0).contains(&f.jitter),
            "max_shake must be non-negative and jitter within 0-1",
        )?;
        check(
            f.amber_below <= f.red_from,
            "gauge bands must be ordered (amber_below <= red_from)",
        )?;

        Ok(())
    }
}

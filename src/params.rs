//! Parameter store - the shared scalar state of the volcano.
//!
//! Every subsystem reads these values each tick; the stage machine and the
//! operator's control input write them. All writes clamp to the field's
//! declared range, so readers never see an out-of-range value.

use crate::config::ParamBaseline;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// A field of the parameter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Param {
    /// Magma chamber pressure (0-100).
    Pressure,
    /// Magma temperature in degrees Celsius (0-1500).
    Temperature,
    /// Dissolved gas content (0-100).
    GasContent,
    /// Magma viscosity (0-100).
    MagmaViscosity,
    /// Eruption intensity (0-100).
    EruptionIntensity,
}

impl Param {
    pub const ALL: [Param; 5] = [
        Param::Pressure,
        Param::Temperature,
        Param::GasContent,
        Param::MagmaViscosity,
        Param::EruptionIntensity,
    ];

    /// Inclusive `(min, max)` range for this field.
    pub fn range(self) -> (f32, f32) {
        match self {
            Param::Temperature => (0.0, 1500.0),
            Param::Pressure
            | Param::GasContent
            | Param::MagmaViscosity
            | Param::EruptionIntensity => (0.0, 100.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Param::Pressure => "Pressure",
            Param::Temperature => "Temperature",
            Param::GasContent => "Gas Content",
            Param::MagmaViscosity => "Magma Viscosity",
            Param::EruptionIntensity => "Eruption Intensity",
        }
    }

    /// Clamp a value into this field's range.
    ///
    /// Returns `None` for NaN, which has no meaningful clamped value.
    #[inline]
    pub fn clamp(self, value: f32) -> Option<f32> {
        if value.is_nan() {
            return None;
        }
        let (min, max) = self.range();
        Some(value.clamp(min, max))
    }
}

/// The shared parameter record.
///
/// Deserialization reads the raw values and routes each one through `set`,
/// so decoded records obey the same ranges as live writes.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ParamBaseline")]
pub struct VolcanoParams {
    pressure: f32,
    temperature: f32,
    gas_content: f32,
    magma_viscosity: f32,
    eruption_intensity: f32,
}

impl Default for VolcanoParams {
    fn default() -> Self {
        Self::from_baseline(&ParamBaseline::default())
    }
}

impl From<ParamBaseline> for VolcanoParams {
    fn from(raw: ParamBaseline) -> Self {
        Self::from_baseline(&raw)
    }
}

impl VolcanoParams {
    /// Build a store from configured baselines. Each value is clamped.
    pub fn from_baseline(baseline: &ParamBaseline) -> Self {
        let mut params = Self {
            pressure: 0.0,
            temperature: 0.0,
            gas_content: 0.0,
            magma_viscosity: 0.0,
            eruption_intensity: 0.0,
        };
        params.set(Param::Pressure, baseline.pressure);
        params.set(Param::Temperature, baseline.temperature);
        params.set(Param::GasContent, baseline.gas_content);
        params.set(Param::MagmaViscosity, baseline.magma_viscosity);
        params.set(Param::EruptionIntensity, baseline.eruption_intensity);
        params
    }

    pub fn get(&self, param: Param) -> f32 {
        match param {
            Param::Pressure => self.pressure,
            Param::Temperature => self.temperature,
            Param::GasContent => self.gas_content,
            Param::MagmaViscosity => self.magma_viscosity,
            Param::EruptionIntensity => self.eruption_intensity,
        }
    }

    /// Write a field, clamping to its range. NaN writes are ignored.
    pub fn set(&mut self, param: Param, value: f32) {
        let Some(value) = param.clamp(value) else {
            return;
        };
        let slot = match param {
            Param::Pressure => &mut self.pressure,
            Param::Temperature => &mut self.temperature,
            Param::GasContent => &mut self.gas_content,
            Param::MagmaViscosity => &mut self.magma_viscosity,
            Param::EruptionIntensity => &mut self.eruption_intensity,
        };
        *slot = value;
    }

    /// Equivalent to `set(param, get(param) + delta)`.
    pub fn adjust(&mut self, param: Param, delta: f32) {
        self.set(param, self.get(param) + delta);
    }

    #[inline]
    pub fn pressure(&self) -> f32 {
        self.pressure
    }

    #[inline]
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    #[inline]
    pub fn gas_content(&self) -> f32 {
        self.gas_content
    }

    #[inline]
    pub fn magma_viscosity(&self) -> f32 {
        self.magma_viscosity
    }

    #[inline]
    pub fn eruption_intensity(&self) -> f32 {
        self.eruption_intensity
    }
}

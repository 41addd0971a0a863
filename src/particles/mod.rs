//! Pooled particle subsystems.
//!
//! Each subsystem is an ECS resource owning a fixed-size `ParticlePool` plus
//! its own per-particle extras and RNG. A particle that leaves its bounds is
//! respawned in place, so pools never grow or shrink after construction.
//!
//! ## Tick order
//!
//! Subsystems are mutually independent; the schedule runs them in the order
//! lava, smoke, ash, debris, conduit after activation sync.

pub mod ash;
pub mod conduit;
pub mod debris;
pub mod lava;
pub mod pool;
pub mod smoke;

pub use ash::AshCloud;
pub use conduit::ConduitFlow;
pub use debris::RockDebris;
pub use lava::LavaFountain;
pub use pool::ParticlePool;
pub use smoke::SmokeDrift;

use crate::clock::SimClock;
use crate::params::VolcanoParams;
use crate::systems::activation::SubsystemKind;
use bevy_ecs::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Downward acceleration shared by the ballistic subsystems (units/s^2).
pub const GRAVITY: f32 = 18.0;

/// Contract shared by the five particle kinds.
pub trait ParticleSubsystem: Resource {
    const KIND: SubsystemKind;

    fn pool(&self) -> &ParticlePool;

    fn pool_mut(&mut self) -> &mut ParticlePool;

    /// Move every particle forward by `dt`. Only called while active.
    fn advance(&mut self, elapsed: f32, dt: f32, params: &VolcanoParams);

    fn is_active(&self) -> bool {
        self.pool().is_visible()
    }

    fn activate(&mut self) {
        self.pool_mut().visible = true;
    }

    fn deactivate(&mut self) {
        self.pool_mut().visible = false;
    }

    /// Re-launch the pool from current parameters. Called when a hidden
    /// subsystem becomes active; the default keeps particles where they are.
    fn relaunch(&mut self, _params: &VolcanoParams) {}

    fn set_active(&mut self, active: bool, params: &VolcanoParams) {
        if active {
            if !self.is_active() {
                self.relaunch(params);
            }
            self.activate();
        } else {
            self.deactivate();
        }
    }

    /// Advance the pool unless the subsystem is hidden or time did not move.
    fn tick(&mut self, elapsed: f32, dt: f32, params: &VolcanoParams) {
        if !self.is_active() || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.advance(elapsed, dt, params);
    }
}

/// Ticks subsystem `S` with the current clock and parameters.
///
/// ## Data Access
/// - Reads: SimClock, VolcanoParams
/// - Writes: S (when available)
pub fn particle_tick_system<S: ParticleSubsystem>(
    clock: Res<SimClock>,
    params: Res<VolcanoParams>,
    subsystem: Option<ResMut<S>>,
) {
    if let Some(mut subsystem) = subsystem {
        subsystem.tick(clock.elapsed(), clock.delta, &params);
    }
}

/// Uniform sample in `[0, 1)`.
#[inline]
pub(crate) fn unit(rng: &mut ChaCha8Rng) -> f32 {
    rng.gen::<f32>()
}

/// Uniform sample in `[lo, hi)`. Safe for `lo == hi`.
#[inline]
pub(crate) fn range(rng: &mut ChaCha8Rng, lo: f32, hi: f32) -> f32 {
    lo + (hi - lo) * unit(rng)
}

/// Launch-speed multiplier from eruption intensity, floored so a quiet
/// fountain still clears the crater rim.
#[inline]
pub(crate) fn intensity_factor(params: &VolcanoParams, floor: f32) -> f32 {
    (params.eruption_intensity() / 100.0).max(floor)
}

/// Buoyancy multiplier from gas content, in `[0.5, 1.5]`.
#[inline]
pub(crate) fn gas_factor(params: &VolcanoParams) -> f32 {
    0.5 + params.gas_content() / 100.0
}

/// Mobility multiplier from viscosity, in `[0.5, 1.5]`. Thick magma moves less.
#[inline]
pub(crate) fn viscosity_factor(params: &VolcanoParams) -> f32 {
    1.5 - params.magma_viscosity() / 100.0
}

//! Conduit flow: magma rising through the vertical channel from the chamber
//! to the crater. Flow speed follows pressure and drops with viscosity.

use super::{range, viscosity_factor, ParticlePool, ParticleSubsystem};
use crate::config::VolcanoGeometry;
use crate::params::VolcanoParams;
use crate::systems::activation::SubsystemKind;
use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;

/// Rise speed at full pressure, mid viscosity (units/s).
pub const MAX_RISE_SPEED: f32 = 12.0;
/// Share of the full speed kept at zero pressure.
const MIN_PRESSURE_FACTOR: f32 = 0.2;

const DEEP: Vec3 = Vec3::new(0.7, 0.08, 0.0);
const BRIGHT: Vec3 = Vec3::new(1.0, 0.6, 0.1);

#[derive(Resource, Debug, Clone)]
pub struct ConduitFlow {
    pool: ParticlePool,
    /// Position along the channel, 0 at the chamber and 1 at the crater.
    progress: Vec<f32>,
    rates: Vec<f32>,
    offsets: Vec<(f32, f32)>,
    bottom: f32,
    length: f32,
    radius: f32,
    rng: ChaCha8Rng,
}

impl ConduitFlow {
    pub fn new(capacity: usize, seed: u64, geometry: &VolcanoGeometry) -> Self {
        let mut conduit = Self {
            pool: ParticlePool::new(capacity),
            progress: vec![0.0; capacity],
            rates: vec![1.0; capacity],
            offsets: vec![(0.0, 0.0); capacity],
            bottom: geometry.chamber_height,
            length: (geometry.crater_height - geometry.chamber_height).max(f32::EPSILON),
            radius: geometry.conduit_radius,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        for i in 0..capacity {
            conduit.respawn(i);
            // Fill the whole channel on start.
            conduit.progress[i] = range(&mut conduit.rng, 0.0, 1.0);
            conduit.place(i, 0.0);
        }
        conduit
    }

    pub fn progress(&self) -> &[f32] {
        &self.progress
    }

    /// Current rise speed for a particle with rate 1.
    pub fn rise_speed(params: &VolcanoParams) -> f32 {
        let pressure = params.pressure() / 100.0;
        MAX_RISE_SPEED
            * (MIN_PRESSURE_FACTOR + (1.0 - MIN_PRESSURE_FACTOR) * pressure)
            * viscosity_factor(params)
    }

    fn respawn(&mut self, i: usize) {
        let rng = &mut self.rng;
        let angle = range(rng, 0.0, TAU);
        let r = self.radius * range(rng, 0.0, 1.0).sqrt();
        self.offsets[i] = (r * angle.cos(), r * angle.sin());
        self.rates[i] = range(rng, 0.7, 1.3);
        self.pool.sizes[i] = range(rng, 0.3, 0.6);
        self.progress[i] = 0.0;
        self.place(i, 0.0);
    }

    fn place(&mut self, i: usize, speed: f32) {
        let t = self.progress[i];
        let (x, z) = self.offsets[i];
        self.pool.positions[i] = Vec3::new(x, self.bottom + t * self.length, z);
        self.pool.velocities[i] = Vec3::new(0.0, speed, 0.0);
        self.pool.colors[i] = DEEP.lerp(BRIGHT, t);
        self.pool.opacities[i] = 0.9;
    }
}

impl ParticleSubsystem for ConduitFlow {
    const KIND: SubsystemKind = SubsystemKind::Conduit;

    fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    fn pool_mut(&mut self) -> &mut ParticlePool {
        &mut self.pool
    }

    fn advance(&mut self, _elapsed: f32, dt: f32, params: &VolcanoParams) {
        let base = Self::rise_speed(params);
        for i in 0..self.pool.capacity() {
            let speed = base * self.rates[i];
            let next = self.progress[i] + speed * dt / self.length;
            if next >= 1.0 || !next.is_finite() {
                self.respawn(i);
                self.pool.respawns += 1;
                continue;
            }
            self.progress[i] = next;
            self.place(i, speed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Param;

    fn channel(capacity: usize) -> ConduitFlow {
        ConduitFlow::new(capacity, 44, &VolcanoGeometry::default())
    }

    #[test]
    fn test_particles_stay_inside_channel() {
        let mut conduit = channel(64);
        conduit.activate();
        let geometry = VolcanoGeometry::default();
        let mut params = VolcanoParams::default();
        params.set(Param::Pressure, 100.0);
        for _ in 0..300 {
            conduit.tick(0.0, 0.05, &params);
        }
        assert!(conduit.pool().respawn_count() > 0);
        for p in conduit.pool().positions() {
            assert!(p.y >= geometry.chamber_height - 1e-4);
            assert!(p.y < geometry.crater_height);
            assert!((p.x * p.x + p.z * p.z).sqrt() <= geometry.conduit_radius + 1e-4);
        }
    }

    #[test]
    fn test_pressure_speeds_flow() {
        let mut low = VolcanoParams::default();
        low.set(Param::Pressure, 0.0);
        let mut high = VolcanoParams::default();
        high.set(Param::Pressure, 100.0);
        assert!(ConduitFlow::rise_speed(&high) > ConduitFlow::rise_speed(&low));
        assert!(ConduitFlow::rise_speed(&low) > 0.0);
    }

    #[test]
    fn test_viscosity_slows_flow() {
        let mut runny = VolcanoParams::default();
        runny.set(Param::MagmaViscosity, 0.0);
        let mut thick = VolcanoParams::default();
        thick.set(Param::MagmaViscosity, 100.0);
        assert!(ConduitFlow::rise_speed(&runny) > ConduitFlow::rise_speed(&thick));
    }

    #[test]
    fn test_reaching_crater_restarts_at_chamber() {
        let mut conduit = channel(1);
        conduit.activate();
        conduit.progress[0] = 0.999;
        conduit.tick(0.0, 0.1, &VolcanoParams::default());
        assert_eq!(conduit.progress()[0], 0.0);
        let chamber = VolcanoGeometry::default().chamber_height;
        assert!((conduit.pool().positions()[0].y - chamber).abs() < 1e-4);
    }
}

//! Ash cloud: a cone of fine ash diffusing up and out of the crater,
//! drifting on a shared wind, bouncing off a ceiling and recycled once it
//! has dispersed too far.

use super::{gas_factor, range, ParticlePool, ParticleSubsystem};
use crate::config::VolcanoGeometry;
use crate::params::VolcanoParams;
use crate::systems::activation::SubsystemKind;
use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;

const SPAWN_OFFSET: f32 = 2.0;
/// Ceiling above the crater rim.
pub const MAX_HEIGHT_OFFSET: f32 = 80.0;
/// Horizontal distance from the vent axis beyond which ash is recycled.
pub const MAX_DISPERSION: f32 = 150.0;
/// Slow settling pull on the vertical velocity.
const SETTLE: f32 = 0.5;

#[derive(Resource, Debug, Clone)]
pub struct AshCloud {
    pool: ParticlePool,
    spawn_height: f32,
    ceiling: f32,
    ground: f32,
    vent_radius: f32,
    rng: ChaCha8Rng,
}

impl AshCloud {
    pub fn new(capacity: usize, seed: u64, geometry: &VolcanoGeometry, params: &VolcanoParams) -> Self {
        let mut ash = Self {
            pool: ParticlePool::new(capacity),
            spawn_height: geometry.crater_height + SPAWN_OFFSET,
            ceiling: geometry.crater_height + MAX_HEIGHT_OFFSET,
            ground: geometry.ground_level,
            vent_radius: geometry.crater_radius,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        for i in 0..capacity {
            ash.spawn(i, params);
        }
        ash
    }

    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    fn spawn(&mut self, i: usize, params: &VolcanoParams) {
        let rng = &mut self.rng;
        let angle = range(rng, 0.0, TAU);
        let (sin, cos) = angle.sin_cos();
        let r = self.vent_radius * range(rng, 0.0, 1.0);
        let outward = range(rng, 1.0, 4.0);
        let up = range(rng, 6.0, 12.0) * gas_factor(params);

        self.pool.positions[i] = Vec3::new(r * cos, self.spawn_height, r * sin);
        self.pool.velocities[i] = Vec3::new(outward * cos, up, outward * sin);
        self.pool.sizes[i] = range(rng, 0.5, 1.5);
        self.pool.colors[i] = Vec3::splat(range(rng, 0.15, 0.3));
        self.pool.opacities[i] = 0.6;
    }
}

/// Shared wind at simulated time `t`.
#[inline]
fn wind(t: f32) -> Vec3 {
    Vec3::new((t * 0.4).sin() * 2.0, 0.0, (t * 0.25).cos() * 1.5)
}

impl ParticleSubsystem for AshCloud {
    const KIND: SubsystemKind = SubsystemKind::Ash;

    fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    fn pool_mut(&mut self) -> &mut ParticlePool {
        &mut self.pool
    }

    fn advance(&mut self, elapsed: f32, dt: f32, params: &VolcanoParams) {
        let drift = wind(elapsed);
        for i in 0..self.pool.capacity() {
            let mut v = self.pool.velocities[i];
            v.y -= SETTLE * dt;
            let mut p = self.pool.positions[i] + (v + drift) * dt;

            if p.y > self.ceiling {
                p.y = self.ceiling;
                v.y = -v.y.abs();
            }

            let radial = (p.x * p.x + p.z * p.z).sqrt();
            if radial > MAX_DISPERSION || p.y < self.ground || !p.is_finite() || !v.is_finite() {
                self.spawn(i, params);
                self.pool.respawns += 1;
                continue;
            }

            self.pool.positions[i] = p;
            self.pool.velocities[i] = v;
        }
    }
}

//! Lava fountain: ballistic blobs thrown up from the crater ring.
//!
//! Launch speed follows eruption intensity, horizontal spread narrows with
//! viscosity, and color cools from bright orange to dark crust with distance
//! from the emission point.

use super::{intensity_factor, range, viscosity_factor, ParticlePool, ParticleSubsystem, GRAVITY};
use crate::config::VolcanoGeometry;
use crate::params::VolcanoParams;
use crate::systems::activation::SubsystemKind;
use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;

pub const MIN_LAUNCH_SPEED: f32 = 18.0;
pub const MAX_LAUNCH_SPEED: f32 = 32.0;
/// Horizontal share of the launch speed at mid viscosity.
const SPREAD: f32 = 0.35;
/// Distance over which a blob cools fully.
const COOL_DISTANCE: f32 = 40.0;
const MIN_INTENSITY_FACTOR: f32 = 0.15;
/// Deepest start below the rim when the whole pool relaunches.
const STAGGER_DEPTH: f32 = 6.0;

pub const HOT: Vec3 = Vec3::new(1.0, 0.85, 0.3);
pub const COOL: Vec3 = Vec3::new(0.25, 0.03, 0.0);

#[derive(Resource, Debug, Clone)]
pub struct LavaFountain {
    pool: ParticlePool,
    origins: Vec<Vec3>,
    geometry: VolcanoGeometry,
    rng: ChaCha8Rng,
}

impl LavaFountain {
    pub fn new(capacity: usize, seed: u64, geometry: &VolcanoGeometry, params: &VolcanoParams) -> Self {
        let mut lava = Self {
            pool: ParticlePool::new(capacity),
            origins: vec![Vec3::ZERO; capacity],
            geometry: geometry.clone(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        for i in 0..capacity {
            lava.spawn(i, params);
        }
        lava
    }

    /// Emission point of each particle.
    pub fn origins(&self) -> &[Vec3] {
        &self.origins
    }

    fn spawn(&mut self, i: usize, params: &VolcanoParams) {
        let rng = &mut self.rng;
        let angle = range(rng, 0.0, TAU);
        let ring = self.geometry.crater_radius * range(rng, 0.3, 1.0);
        let (sin, cos) = angle.sin_cos();
        let origin = Vec3::new(ring * cos, self.geometry.crater_height, ring * sin);

        let speed = range(rng, MIN_LAUNCH_SPEED, MAX_LAUNCH_SPEED)
            * intensity_factor(params, MIN_INTENSITY_FACTOR);
        let lateral = speed * SPREAD * viscosity_factor(params) * range(rng, 0.2, 1.0);

        self.origins[i] = origin;
        self.pool.positions[i] = origin;
        self.pool.velocities[i] = Vec3::new(lateral * cos, speed, lateral * sin);
        self.pool.colors[i] = HOT;
        self.pool.sizes[i] = range(rng, 0.3, 0.7);
        self.pool.opacities[i] = 1.0;
    }
}

impl ParticleSubsystem for LavaFountain {
    const KIND: SubsystemKind = SubsystemKind::Lava;

    fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    fn pool_mut(&mut self) -> &mut ParticlePool {
        &mut self.pool
    }

    /// Fresh volley at current intensity. Start points sink into the throat
    /// by a random depth so blobs clear the rim over several frames.
    fn relaunch(&mut self, params: &VolcanoParams) {
        let depth =
            STAGGER_DEPTH.min(0.5 * (self.geometry.crater_height - self.geometry.ground_level));
        for i in 0..self.pool.capacity() {
            self.spawn(i, params);
            let sink = range(&mut self.rng, 0.0, depth);
            self.origins[i].y -= sink;
            self.pool.positions[i].y -= sink;
        }
    }

    fn advance(&mut self, _elapsed: f32, dt: f32, params: &VolcanoParams) {
        let ground = self.geometry.ground_level;
        for i in 0..self.pool.capacity() {
            let mut v = self.pool.velocities[i];
            v.y -= GRAVITY * dt;
            let p = self.pool.positions[i] + v * dt;

            if p.y < ground || !p.is_finite() || !v.is_finite() {
                self.spawn(i, params);
                self.pool.respawns += 1;
                continue;
            }

            let cooled = (p.distance(self.origins[i]) / COOL_DISTANCE).min(1.0);
            self.pool.positions[i] = p;
            self.pool.velocities[i] = v;
            self.pool.colors[i] = HOT.lerp(COOL, cooled);
            self.pool.opacities[i] = 1.0 - 0.6 * cooled;
        }
    }
}

//! Smoke drift: buoyant puffs above the crater pushed around by an
//! oscillating wind. Puffs swell and fade with height.

use super::{gas_factor, range, ParticlePool, ParticleSubsystem};
use crate::config::VolcanoGeometry;
use crate::params::VolcanoParams;
use crate::systems::activation::SubsystemKind;
use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;

/// Spawn height above the crater rim.
const SPAWN_OFFSET: f32 = 5.0;
/// Puffs above this height over the rim are recycled.
const CEILING_OFFSET: f32 = 40.0;
const SPAWN_RADIUS: f32 = 8.0;
/// Height over the spawn plane at which a puff has fully faded.
const FADE_HEIGHT: f32 = 30.0;
/// Height over which a puff doubles its size.
const GROWTH_HEIGHT: f32 = 15.0;
const MAX_OPACITY: f32 = 0.5;
const MIN_OPACITY: f32 = 0.02;
const WIND_STRENGTH: f32 = 1.5;

const BASE_GREY: f32 = 0.35;

#[derive(Resource, Debug, Clone)]
pub struct SmokeDrift {
    pool: ParticlePool,
    base_sizes: Vec<f32>,
    phases: Vec<f32>,
    spawn_height: f32,
    ceiling: f32,
    rng: ChaCha8Rng,
}

impl SmokeDrift {
    pub fn new(capacity: usize, seed: u64, geometry: &VolcanoGeometry, params: &VolcanoParams) -> Self {
        let mut smoke = Self {
            pool: ParticlePool::new(capacity),
            base_sizes: vec![1.0; capacity],
            phases: vec![0.0; capacity],
            spawn_height: geometry.crater_height + SPAWN_OFFSET,
            ceiling: geometry.crater_height + CEILING_OFFSET,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        for i in 0..capacity {
            smoke.spawn(i, params);
            // Stagger the first column so it does not rise as one sheet.
            let lift = range(&mut smoke.rng, 0.0, FADE_HEIGHT * 0.8);
            smoke.pool.positions[i].y += lift;
            smoke.shade(i);
        }
        smoke
    }

    pub fn spawn_height(&self) -> f32 {
        self.spawn_height
    }

    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    fn spawn(&mut self, i: usize, params: &VolcanoParams) {
        let rng = &mut self.rng;
        let angle = range(rng, 0.0, TAU);
        let r = SPAWN_RADIUS * range(rng, 0.0, 1.0).sqrt();
        self.pool.positions[i] = Vec3::new(r * angle.cos(), self.spawn_height, r * angle.sin());
        self.pool.velocities[i] = Vec3::new(0.0, range(rng, 4.0, 8.0) * gas_factor(params), 0.0);
        self.base_sizes[i] = range(rng, 2.0, 4.0);
        self.phases[i] = range(rng, 0.0, TAU);
        self.shade(i);
    }

    /// Recompute size, opacity and color from the particle's height.
    fn shade(&mut self, i: usize) {
        let h = (self.pool.positions[i].y - self.spawn_height).max(0.0);
        self.pool.sizes[i] = self.base_sizes[i] * (1.0 + h / GROWTH_HEIGHT);
        self.pool.opacities[i] = MAX_OPACITY * (1.0 - h / FADE_HEIGHT).max(0.0);
        let grey = BASE_GREY + 0.3 * (h / FADE_HEIGHT).min(1.0);
        self.pool.colors[i] = Vec3::splat(grey);
    }
}

impl ParticleSubsystem for SmokeDrift {
    const KIND: SubsystemKind = SubsystemKind::Smoke;

    fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    fn pool_mut(&mut self) -> &mut ParticlePool {
        &mut self.pool
    }

    fn advance(&mut self, elapsed: f32, dt: f32, params: &VolcanoParams) {
        for i in 0..self.pool.capacity() {
            let phase = self.phases[i];
            let wind = Vec3::new(
                (elapsed * 0.5 + phase).sin() * WIND_STRENGTH,
                0.0,
                (elapsed * 0.3 + phase).cos() * WIND_STRENGTH * 0.7,
            );
            let p = self.pool.positions[i] + (self.pool.velocities[i] + wind) * dt;
            self.pool.positions[i] = p;
            self.shade(i);

            if self.pool.opacities[i] < MIN_OPACITY || p.y > self.ceiling || !p.is_finite() {
                self.spawn(i, params);
                self.pool.respawns += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Param;

    fn drift(capacity: usize) -> SmokeDrift {
        SmokeDrift::new(capacity, 5, &VolcanoGeometry::default(), &VolcanoParams::default())
    }

    #[test]
    fn test_initial_column_is_staggered_and_visible() {
        let smoke = drift(64);
        let min = smoke.pool().positions().iter().map(|p| p.y).fold(f32::MAX, f32::min);
        let max = smoke.pool().positions().iter().map(|p| p.y).fold(f32::MIN, f32::max);
        assert!(max - min > 1.0);
        assert!(smoke.pool().opacities().iter().all(|o| *o >= MIN_OPACITY));
    }

    #[test]
    fn test_fades_and_grows_with_height() {
        let mut smoke = drift(1);
        smoke.pool.positions[0].y = smoke.spawn_height();
        smoke.shade(0);
        let low = (smoke.pool().sizes()[0], smoke.pool().opacities()[0]);

        smoke.pool.positions[0].y = smoke.spawn_height() + 20.0;
        smoke.shade(0);
        let high = (smoke.pool().sizes()[0], smoke.pool().opacities()[0]);

        assert!(high.0 > low.0);
        assert!(high.1 < low.1);
    }

    #[test]
    fn test_respawns_when_faded() {
        let mut smoke = drift(32);
        smoke.activate();
        let params = VolcanoParams::default();
        let mut t = 0.0;
        for _ in 0..400 {
            t += 0.05;
            smoke.tick(t, 0.05, &params);
        }
        assert!(smoke.pool().respawn_count() > 0);
        for p in smoke.pool().positions() {
            assert!(p.y <= smoke.ceiling());
        }
        assert!(smoke.pool().is_finite());
    }

    #[test]
    fn test_gas_speeds_up_rise() {
        let mut thin = VolcanoParams::default();
        thin.set(Param::GasContent, 0.0);
        let mut rich = VolcanoParams::default();
        rich.set(Param::GasContent, 100.0);

        let a = SmokeDrift::new(16, 9, &VolcanoGeometry::default(), &thin);
        let b = SmokeDrift::new(16, 9, &VolcanoGeometry::default(), &rich);
        let sum = |s: &SmokeDrift| s.pool().velocities().iter().map(|v| v.y).sum::<f32>();
        assert!(sum(&b) > sum(&a));
    }
}

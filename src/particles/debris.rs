//! Rock debris: tumbling ballistic rocks exported as instance transforms.

use super::{range, ParticlePool, ParticleSubsystem, GRAVITY};
use crate::config::VolcanoGeometry;
use crate::params::VolcanoParams;
use crate::systems::activation::SubsystemKind;
use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::f32::consts::{FRAC_PI_4, TAU};

pub const MIN_LAUNCH_SPEED: f32 = 15.0;
/// Upper bound on any launch speed, whatever the intensity.
pub const MAX_LAUNCH_SPEED: f32 = 35.0;
const MIN_ELEVATION: f32 = FRAC_PI_4;
const MAX_ELEVATION: f32 = 1.4;
/// Spin rate bound per axis (rad/s).
const MAX_SPIN: f32 = 4.0;

const ROCK: Vec3 = Vec3::new(0.25, 0.2, 0.18);

#[derive(Resource, Debug, Clone)]
pub struct RockDebris {
    pool: ParticlePool,
    rotations: Vec<Vec3>,
    spins: Vec<Vec3>,
    vent: Vec3,
    vent_radius: f32,
    ground: f32,
    rng: ChaCha8Rng,
}

impl RockDebris {
    pub fn new(capacity: usize, seed: u64, geometry: &VolcanoGeometry, params: &VolcanoParams) -> Self {
        let mut debris = Self {
            pool: ParticlePool::new(capacity),
            rotations: vec![Vec3::ZERO; capacity],
            spins: vec![Vec3::ZERO; capacity],
            vent: Vec3::new(0.0, geometry.crater_height, 0.0),
            vent_radius: geometry.crater_radius * 0.5,
            ground: geometry.ground_level,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        for i in 0..capacity {
            debris.launch(i, params);
        }
        debris
    }

    /// Euler rotation of each rock, each axis in `[0, TAU)`.
    pub fn rotations(&self) -> &[Vec3] {
        &self.rotations
    }

    pub fn spins(&self) -> &[Vec3] {
        &self.spins
    }

    /// Crater point rocks are launched from.
    pub fn vent(&self) -> Vec3 {
        self.vent
    }

    fn launch(&mut self, i: usize, params: &VolcanoParams) {
        let rng = &mut self.rng;
        let azimuth = range(rng, 0.0, TAU);
        let elevation = range(rng, MIN_ELEVATION, MAX_ELEVATION);
        let scale = 0.5 + 0.5 * params.eruption_intensity() / 100.0;
        let speed = (range(rng, MIN_LAUNCH_SPEED, MAX_LAUNCH_SPEED) * scale).min(MAX_LAUNCH_SPEED);

        let (sin_el, cos_el) = elevation.sin_cos();
        let (sin_az, cos_az) = azimuth.sin_cos();
        let direction = Vec3::new(cos_el * cos_az, sin_el, cos_el * sin_az);
        let offset = range(rng, 0.0, self.vent_radius);

        self.pool.positions[i] = self.vent + Vec3::new(offset * cos_az, 0.0, offset * sin_az);
        self.pool.velocities[i] = direction * speed;
        self.pool.sizes[i] = range(rng, 0.4, 1.2);
        self.pool.colors[i] = ROCK;
        self.pool.opacities[i] = 1.0;
        self.rotations[i] = Vec3::new(
            range(rng, 0.0, TAU),
            range(rng, 0.0, TAU),
            range(rng, 0.0, TAU),
        );
        self.spins[i] = Vec3::new(
            range(rng, -MAX_SPIN, MAX_SPIN),
            range(rng, -MAX_SPIN, MAX_SPIN),
            range(rng, -MAX_SPIN, MAX_SPIN),
        );
    }
}

#[inline]
fn wrap_angles(r: Vec3) -> Vec3 {
    Vec3::new(r.x.rem_euclid(TAU), r.y.rem_euclid(TAU), r.z.rem_euclid(TAU))
}

impl ParticleSubsystem for RockDebris {
    const KIND: SubsystemKind = SubsystemKind::Debris;

    fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    fn pool_mut(&mut self) -> &mut ParticlePool {
        &mut self.pool
    }

    fn relaunch(&mut self, params: &VolcanoParams) {
        for i in 0..self.pool.capacity() {
            self.launch(i, params);
        }
    }

    fn advance(&mut self, _elapsed: f32, dt: f32, params: &VolcanoParams) {
        for i in 0..self.pool.capacity() {
            let mut v = self.pool.velocities[i];
            v.y -= GRAVITY * dt;
            let p = self.pool.positions[i] + v * dt;

            if p.y < self.ground || !p.is_finite() || !v.is_finite() {
                self.launch(i, params);
                self.pool.respawns += 1;
                continue;
            }

            self.pool.positions[i] = p;
            self.pool.velocities[i] = v;
            self.rotations[i] = wrap_angles(self.rotations[i] + self.spins[i] * dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Param;

    fn rocks(capacity: usize) -> RockDebris {
        let mut params = VolcanoParams::default();
        params.set(Param::EruptionIntensity, 100.0);
        RockDebris::new(capacity, 33, &VolcanoGeometry::default(), &params)
    }

    #[test]
    fn test_crossing_ground_respawns_same_tick() {
        let mut debris = rocks(8);
        debris.activate();
        let ground = VolcanoGeometry::default().ground_level;
        debris.pool.positions[3] = Vec3::new(12.0, ground + 0.05, -4.0);
        debris.pool.velocities[3] = Vec3::new(1.0, -30.0, 0.0);

        let mut params = VolcanoParams::default();
        params.set(Param::EruptionIntensity, 100.0);
        debris.tick(1.0, 1.0 / 60.0, &params);

        assert_eq!(debris.pool().respawn_count(), 1);
        assert_eq!(debris.pool().capacity(), 8);

        let p = debris.pool().positions()[3];
        let vent = debris.vent();
        assert!((p.y - vent.y).abs() < 1e-4);
        let radial = ((p.x - vent.x).powi(2) + (p.z - vent.z).powi(2)).sqrt();
        assert!(radial <= VolcanoGeometry::default().crater_radius);

        let v = debris.pool().velocities()[3];
        assert!(v.y > 0.0);
        assert!(v.length() <= MAX_LAUNCH_SPEED + 1e-3);
    }

    #[test]
    fn test_rotation_stays_wrapped() {
        let mut debris = rocks(32);
        debris.activate();
        let params = VolcanoParams::default();
        for _ in 0..500 {
            debris.tick(0.0, 0.05, &params);
        }
        for r in debris.rotations() {
            for a in [r.x, r.y, r.z] {
                assert!((0.0..TAU).contains(&a) || (a - TAU).abs() < 1e-5);
            }
        }
        assert!(debris.pool().is_finite());
    }

    #[test]
    fn test_launch_speed_bounded() {
        let debris = rocks(128);
        for v in debris.pool().velocities() {
            assert!(v.length() <= MAX_LAUNCH_SPEED + 1e-3);
            assert!(v.y > 0.0);
        }
    }

    #[test]
    fn test_relaunch_uses_current_intensity() {
        let mut debris = RockDebris::new(64, 33, &VolcanoGeometry::default(), &VolcanoParams::default());
        let mut params = VolcanoParams::default();
        params.set(Param::EruptionIntensity, 100.0);
        debris.set_active(true, &params);

        assert!(debris.is_active());
        for v in debris.pool().velocities() {
            assert!(v.length() >= MIN_LAUNCH_SPEED - 1e-3);
            assert!(v.length() <= MAX_LAUNCH_SPEED + 1e-3);
        }
    }
}

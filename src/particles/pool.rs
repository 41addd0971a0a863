//! Fixed-size particle storage as parallel arrays indexed by particle id.

use glam::Vec3;

#[derive(Debug, Clone)]
pub struct ParticlePool {
    pub(crate) visible: bool,
    pub(crate) positions: Vec<Vec3>,
    pub(crate) velocities: Vec<Vec3>,
    pub(crate) colors: Vec<Vec3>,
    pub(crate) sizes: Vec<f32>,
    pub(crate) opacities: Vec<f32>,
    pub(crate) respawns: u64,
}

impl ParticlePool {
    /// Allocate a hidden pool of `capacity` particles.
    pub fn new(capacity: usize) -> Self {
        Self {
            visible: false,
            positions: vec![Vec3::ZERO; capacity],
            velocities: vec![Vec3::ZERO; capacity],
            colors: vec![Vec3::ONE; capacity],
            sizes: vec![1.0; capacity],
            opacities: vec![1.0; capacity],
            respawns: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn opacities(&self) -> &[f32] {
        &self.opacities
    }

    /// Particles recycled since construction (initial spawn not counted).
    pub fn respawn_count(&self) -> u64 {
        self.respawns
    }

    /// Every exported field of every particle is finite.
    pub fn is_finite(&self) -> bool {
        self.positions.iter().all(|p| p.is_finite())
            && self.velocities.iter().all(|v| v.is_finite())
            && self.colors.iter().all(|c| c.is_finite())
            && self.sizes.iter().all(|s| s.is_finite())
            && self.opacities.iter().all(|o| o.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pool_is_hidden_and_sized() {
        let pool = ParticlePool::new(16);
        assert_eq!(pool.capacity(), 16);
        assert_eq!(pool.sizes().len(), 16);
        assert!(!pool.is_visible());
        assert!(pool.is_finite());
    }

    #[test]
    fn test_detects_non_finite() {
        let mut pool = ParticlePool::new(4);
        pool.positions[2] = Vec3::new(f32::NAN, 0.0, 0.0);
        assert!(!pool.is_finite());
    }
}

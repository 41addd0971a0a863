//! Renderer Integration Bridge
//!
//! This module converts particle pools into flat `f32` buffers an external
//! renderer can upload without further processing (point sprites for the
//! particle subsystems, instance transforms for rock debris).
//!
//! # Stable Buffer Contract
//!
//! Both layouts are contiguous `Vec<f32>` with a fixed header and a fixed
//! stride per particle:
//! - **Efficiency**: one upload per subsystem per frame
//! - **Simplicity**: fixed stride, predictable offsets
//! - **Stability**: field order and count are documented below
//!
//! # Particle Buffer Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ HEADER (2 elements)                                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ [0] visible   - 1.0 when the subsystem is active, else 0.0      │
//! │ [1] count     - particle count (as f32)                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ For each particle i (offset = 2 + i * PARTICLE_STRIDE):         │
//! │   [+0] x        - X position (world units)                      │
//! │   [+1] y        - Y position (world units, up)                  │
//! │   [+2] z        - Z position (world units)                      │
//! │   [+3] size     - Sprite size (world units)                     │
//! │   [+4] r        - Red (0.0-1.0)                                 │
//! │   [+5] g        - Green (0.0-1.0)                               │
//! │   [+6] b        - Blue (0.0-1.0)                                │
//! │   [+7] opacity  - Alpha (0.0-1.0)                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Instance Buffer Layout (rock debris)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ HEADER (2 elements): [0] visible, [1] count                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ For each rock i (offset = 2 + i * INSTANCE_STRIDE):             │
//! │   [+0] x      [+1] y      [+2] z     - translation              │
//! │   [+3] rx     [+4] ry     [+5] rz    - Euler rotation (radians) │
//! │   [+6] scale                          - uniform scale           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Unavailable Subsystems
//!
//! A subsystem configured with an empty pool does not exist in the world.
//! Its buffer is just the header `[0.0, 0.0]`.
//!
//! # Determinism
//!
//! The same pool always produces the same buffer. Particles are written in
//! pool index order.

use crate::particles::{ParticlePool, RockDebris};

// ============================================================================
// CONSTANTS - STABLE BUFFER CONTRACT
// ============================================================================

/// Number of f32 values in the buffer header: visible flag, count.
pub const HEADER_SIZE: usize = 2;

/// Number of f32 values per particle in a particle buffer.
///
/// Fields (in order): 0. x, 1. y, 2. z, 3. size, 4. r, 5. g, 6. b, 7. opacity
pub const PARTICLE_STRIDE: usize = 8;

/// Number of f32 values per rock in an instance buffer.
///
/// Fields (in order): 0. x, 1. y, 2. z, 3. rx, 4. ry, 5. rz, 6. scale
pub const INSTANCE_STRIDE: usize = 7;

/// Header offset: visible flag.
pub const HEADER_VISIBLE: usize = 0;
/// Header offset: particle count.
pub const HEADER_COUNT: usize = 1;

// ============================================================================
// PARTICLE BUFFER
// ============================================================================

/// Write a pool into `buffer`, replacing its contents.
///
/// Reusing the same `Vec` across frames avoids reallocating once it has
/// grown to the pool's size. `None` writes the unavailable header `[0, 0]`.
pub fn write_particle_buffer(pool: Option<&ParticlePool>, buffer: &mut Vec<f32>) {
    buffer.clear();
    let Some(pool) = pool else {
        buffer.extend_from_slice(&[0.0, 0.0]);
        return;
    };

    let count = pool.capacity();
    buffer.reserve(calculate_buffer_size(count));
    buffer.push(if pool.is_visible() { 1.0 } else { 0.0 });
    buffer.push(count as f32);

    for i in 0..count {
        let p = pool.positions[i];
        let c = pool.colors[i];
        // [+0..+2] position
        buffer.extend_from_slice(&[p.x, p.y, p.z]);
        // [+3] size
        buffer.push(pool.sizes[i]);
        // [+4..+6] color
        buffer.extend_from_slice(&[c.x, c.y, c.z]);
        // [+7] opacity
        buffer.push(pool.opacities[i]);
    }

    debug_assert_eq!(buffer.len(), calculate_buffer_size(count), "Buffer size mismatch");
}

/// Convert a pool to a freshly allocated particle buffer.
///
/// # Example
///
/// ```rust
/// use volcano_sim::VolcanoSim;
/// use volcano_sim::render_bridge::{pool_to_flatbuffer, HEADER_SIZE, PARTICLE_STRIDE};
/// use volcano_sim::SubsystemKind;
///
/// let sim = VolcanoSim::new();
/// let buffer = pool_to_flatbuffer(sim.subsystem_pool(SubsystemKind::Smoke));
/// let count = buffer[1] as usize;
/// assert_eq!(buffer.len(), HEADER_SIZE + count * PARTICLE_STRIDE);
/// ```
pub fn pool_to_flatbuffer(pool: Option<&ParticlePool>) -> Vec<f32> {
    let mut buffer = Vec::new();
    write_particle_buffer(pool, &mut buffer);
    buffer
}

/// Calculate the particle buffer size for a given count.
///
/// # Formula
/// `HEADER_SIZE + count * PARTICLE_STRIDE`
#[inline]
pub fn calculate_buffer_size(count: usize) -> usize {
    HEADER_SIZE + count * PARTICLE_STRIDE
}

/// Buffer offset of particle `index` in a particle buffer.
#[inline]
pub const fn particle_offset(index: usize) -> usize {
    HEADER_SIZE + index * PARTICLE_STRIDE
}

// ============================================================================
// INSTANCE BUFFER (ROCK DEBRIS)
// ============================================================================

/// Write rock debris instance transforms into `buffer`, replacing its contents.
pub fn write_instance_buffer(debris: Option<&RockDebris>, buffer: &mut Vec<f32>) {
    use crate::particles::ParticleSubsystem;

    buffer.clear();
    let Some(debris) = debris else {
        buffer.extend_from_slice(&[0.0, 0.0]);
        return;
    };

    let pool = debris.pool();
    let count = pool.capacity();
    buffer.reserve(calculate_instance_buffer_size(count));
    buffer.push(if pool.is_visible() { 1.0 } else { 0.0 });
    buffer.push(count as f32);

    for (i, r) in debris.rotations().iter().enumerate() {
        let p = pool.positions[i];
        buffer.extend_from_slice(&[p.x, p.y, p.z, r.x, r.y, r.z, pool.sizes[i]]);
    }

    debug_assert_eq!(buffer.len(), calculate_instance_buffer_size(count), "Buffer size mismatch");
}

pub fn debris_to_instance_buffer(debris: Option<&RockDebris>) -> Vec<f32> {
    let mut buffer = Vec::new();
    write_instance_buffer(debris, &mut buffer);
    buffer
}

/// `HEADER_SIZE + count * INSTANCE_STRIDE`
#[inline]
pub fn calculate_instance_buffer_size(count: usize) -> usize {
    HEADER_SIZE + count * INSTANCE_STRIDE
}

#[inline]
pub const fn instance_offset(index: usize) -> usize {
    HEADER_SIZE + index * INSTANCE_STRIDE
}

// ============================================================================
// HEADER PARSING
// ============================================================================

/// Parse `(visible, count)` from either buffer layout.
///
/// Returns `None` if the buffer is shorter than the header.
#[inline]
pub fn parse_header(buffer: &[f32]) -> Option<(bool, usize)> {
    if buffer.len() < HEADER_SIZE {
        return None;
    }
    Some((buffer[HEADER_VISIBLE] > 0.5, buffer[HEADER_COUNT] as usize))
}

// ============================================================================
// FIELD OFFSET CONSTANTS
// ============================================================================

/// Offset within particle data for: X position
pub const FIELD_X: usize = 0;
/// Offset within particle data for: Y position
pub const FIELD_Y: usize = 1;
/// Offset within particle data for: Z position
pub const FIELD_Z: usize = 2;
/// Offset within particle data for: Size
pub const FIELD_SIZE: usize = 3;
/// Offset within particle data for: Red
pub const FIELD_R: usize = 4;
/// Offset within particle data for: Green
pub const FIELD_G: usize = 5;
/// Offset within particle data for: Blue
pub const FIELD_B: usize = 6;
/// Offset within particle data for: Opacity
pub const FIELD_OPACITY: usize = 7;

/// Offset within instance data for: X rotation
pub const FIELD_RX: usize = 3;
/// Offset within instance data for: Y rotation
pub const FIELD_RY: usize = 4;
/// Offset within instance data for: Z rotation
pub const FIELD_RZ: usize = 5;
/// Offset within instance data for: Uniform scale
pub const FIELD_SCALE: usize = 6;

// ============================================================================
// TESTS
// ============================================================================

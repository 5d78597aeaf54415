//! The snowfall particle field.
//!
//! A [`ParticleField`] is a fixed-capacity, flat `[x, y, z, x, y, z, ...]`
//! buffer of snowflake positions. It is built whole by
//! [`ParticleField::regenerate`] and stepped in place once per frame by
//! [`ParticleField::advance`]:
//!
//! ```ignore
//! use rand::{rngs::SmallRng, SeedableRng};
//! use snowfall::{ParticleField, SnowParams};
//!
//! let mut rng = SmallRng::seed_from_u64(7);
//! let mut field = ParticleField::regenerate(1000, &SnowParams::default(), &mut rng)?;
//!
//! // In your frame loop:
//! field.advance(&mut rng);
//! if let Some(positions) = field.take_dirty() {
//!     // upload `positions` to the GPU
//! }
//! ```
//!
//! # Motion
//!
//! Flakes have no velocity. Each advance subtracts `fall_speed` from every
//! `y`; a flake that drops below the ground (`y < 0`) is re-seeded at a fresh
//! height in the same step, directly above where it started. `x` and `z` are
//! chosen once at regeneration and never move.
//!
//! The decrement is per call, not per second, so the apparent fall rate
//! follows the frame rate.

use std::ops::Range;

use glam::Vec3;
use rand::Rng;

use crate::error::FieldError;
use crate::params::SnowParams;

/// Heights new and re-seeded flakes are drawn from.
pub const SPAWN_HEIGHT: Range<f32> = 1.0..6.0;

/// Horizontal extent (both `x` and `z`) flakes are drawn from.
pub const SPAWN_SPREAD: Range<f32> = -5.0..5.0;

/// Floats per particle in the position buffer.
pub const STRIDE: usize = 3;

/// Draw a fresh spawn height in [`SPAWN_HEIGHT`].
#[inline]
pub fn sample_height<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(SPAWN_HEIGHT)
}

/// Draw a horizontal coordinate in [`SPAWN_SPREAD`].
#[inline]
pub fn sample_horizontal<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(SPAWN_SPREAD)
}

/// Flat buffer of snowflake positions plus the point style they are drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleField {
    positions: Vec<f32>,
    size: f32,
    opacity: f32,
    fall_speed: f32,
    dirty: bool,
}

impl ParticleField {
    /// Allocate a new field of `capacity` flakes at freshly sampled positions.
    ///
    /// Point style and fall speed are taken from `params`; `params.count` is
    /// ignored in favour of `capacity`. The returned field is marked dirty so
    /// the first upload happens without an intervening [`advance`](Self::advance).
    pub fn regenerate<R: Rng + ?Sized>(
        capacity: usize,
        params: &SnowParams,
        rng: &mut R,
    ) -> Result<Self, FieldError> {
        if capacity == 0 {
            return Err(FieldError::InvalidCapacity { requested: capacity });
        }

        let mut positions = Vec::with_capacity(capacity * STRIDE);
        for _ in 0..capacity {
            // Sampled in x, y, z order.
            let x = sample_horizontal(rng);
            let y = sample_height(rng);
            let z = sample_horizontal(rng);
            positions.extend_from_slice(&[x, y, z]);
        }

        Ok(Self {
            positions,
            size: params.size,
            opacity: params.opacity,
            fall_speed: params.fall_speed,
            dirty: true,
        })
    }

    /// Build a field around existing positions.
    ///
    /// `positions` must be a non-empty whole number of `[x, y, z]` triples.
    pub fn from_positions(positions: Vec<f32>, params: &SnowParams) -> Result<Self, FieldError> {
        if positions.is_empty() {
            return Err(FieldError::InvalidCapacity { requested: 0 });
        }
        if positions.len() % STRIDE != 0 {
            return Err(FieldError::MisalignedBuffer {
                len: positions.len(),
            });
        }

        Ok(Self {
            positions,
            size: params.size,
            opacity: params.opacity,
            fall_speed: params.fall_speed,
            dirty: true,
        })
    }

    /// Step every flake down by `fall_speed`, re-seeding any that land below 0.
    ///
    /// Mutates the buffer in place and marks it dirty. Does nothing on an
    /// empty field.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.positions.is_empty() {
            return;
        }

        let fall_speed = self.fall_speed;
        for flake in self.positions.chunks_exact_mut(STRIDE) {
            flake[1] -= fall_speed;
            if flake[1] < 0.0 {
                flake[1] = sample_height(rng);
            }
        }
        self.dirty = true;
    }

    /// Number of flakes in the field.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.positions.len() / STRIDE
    }

    /// Whether the field holds no flakes (the uninitialized state).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The flat position buffer, `capacity * 3` floats long.
    #[inline]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Position of flake `index`, if it exists.
    pub fn position(&self, index: usize) -> Option<Vec3> {
        let start = index.checked_mul(STRIDE)?;
        let end = start.checked_add(STRIDE)?;
        self.positions.get(start..end).map(Vec3::from_slice)
    }

    /// Iterate flake positions in index order.
    pub fn iter(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.positions.chunks_exact(STRIDE).map(Vec3::from_slice)
    }

    /// Point sprite size.
    #[inline]
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Point sprite opacity.
    #[inline]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Units each flake drops per advance.
    #[inline]
    pub fn fall_speed(&self) -> f32 {
        self.fall_speed
    }

    /// Change the sprite size. Positions are untouched.
    pub fn set_size(&mut self, size: f32) {
        self.size = size;
    }

    /// Change the sprite opacity. Positions are untouched.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    /// Change the per-advance drop; applies from the next advance on.
    pub fn set_fall_speed(&mut self, fall_speed: f32) {
        self.fall_speed = fall_speed;
    }

    /// Whether positions changed since the last [`take_dirty`](Self::take_dirty).
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag, returning the buffer if it needed uploading.
    pub fn take_dirty(&mut self) -> Option<&[f32]> {
        if std::mem::take(&mut self.dirty) {
            Some(&self.positions)
        } else {
            None
        }
    }
}

impl Default for ParticleField {
    /// An empty, uninitialized field with the default point style.
    fn default() -> Self {
        let params = SnowParams::default();
        Self {
            positions: Vec::new(),
            size: params.size,
            opacity: params.opacity,
            fall_speed: params.fall_speed,
            dirty: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(0x5eed)
    }

    fn params_with_speed(fall_speed: f32) -> SnowParams {
        SnowParams {
            fall_speed,
            ..SnowParams::default()
        }
    }

    #[test]
    fn test_regenerate_shape_and_bounds() {
        let mut rng = rng();
        for capacity in [1, 2, 100, 1000, 5000] {
            let field = ParticleField::regenerate(capacity, &SnowParams::default(), &mut rng).unwrap();
            assert_eq!(field.capacity(), capacity);
            assert_eq!(field.positions().len(), capacity * 3);
            for p in field.iter() {
                assert!(SPAWN_SPREAD.contains(&p.x), "x out of range: {}", p.x);
                assert!(SPAWN_HEIGHT.contains(&p.y), "y out of range: {}", p.y);
                assert!(SPAWN_SPREAD.contains(&p.z), "z out of range: {}", p.z);
            }
        }
    }

    #[test]
    fn test_regenerate_zero_capacity_fails() {
        let err = ParticleField::regenerate(0, &SnowParams::default(), &mut rng()).unwrap_err();
        assert_eq!(err, FieldError::InvalidCapacity { requested: 0 });
    }

    #[test]
    fn test_regenerate_copies_style() {
        let params = SnowParams {
            count: 10,
            size: 0.5,
            opacity: 0.25,
            fall_speed: 0.07,
        };
        let field = ParticleField::regenerate(3, &params, &mut rng()).unwrap();
        assert_eq!(field.capacity(), 3);
        assert_eq!(field.size(), 0.5);
        assert_eq!(field.opacity(), 0.25);
        assert_eq!(field.fall_speed(), 0.07);
        assert!(field.is_dirty());
    }

    #[test]
    fn test_same_seed_same_field() {
        let a = ParticleField::regenerate(50, &SnowParams::default(), &mut rng()).unwrap();
        let b = ParticleField::regenerate(50, &SnowParams::default(), &mut rng()).unwrap();
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn test_advance_drops_and_resets() {
        let mut rng = rng();
        let mut field =
            ParticleField::from_positions(vec![0.0, 2.5, 0.0], &params_with_speed(1.0)).unwrap();

        field.advance(&mut rng);
        assert_eq!(field.position(0).unwrap().y, 1.5);
        field.advance(&mut rng);
        assert_eq!(field.position(0).unwrap().y, 0.5);
        field.advance(&mut rng);
        let y = field.position(0).unwrap().y;
        assert!(SPAWN_HEIGHT.contains(&y), "reset height out of range: {}", y);
    }

    #[test]
    fn test_landing_exactly_on_ground_is_kept() {
        let mut field =
            ParticleField::from_positions(vec![1.0, 1.0, 1.0], &params_with_speed(1.0)).unwrap();
        field.advance(&mut rng());
        assert_eq!(field.position(0).unwrap().y, 0.0);
    }

    #[test]
    fn test_advance_keeps_horizontal() {
        let mut rng = rng();
        let mut field = ParticleField::regenerate(200, &params_with_speed(0.1), &mut rng).unwrap();
        let before: Vec<(f32, f32)> = field.iter().map(|p| (p.x, p.z)).collect();

        for _ in 0..500 {
            field.advance(&mut rng);
        }

        let after: Vec<(f32, f32)> = field.iter().map(|p| (p.x, p.z)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_advance_step_rule() {
        let mut rng = rng();
        let mut field = ParticleField::regenerate(300, &params_with_speed(0.07), &mut rng).unwrap();

        for _ in 0..200 {
            let before: Vec<f32> = field.iter().map(|p| p.y).collect();
            field.advance(&mut rng);
            for (prev, p) in before.iter().zip(field.iter()) {
                let dropped = prev - 0.07;
                if dropped >= 0.0 {
                    assert_eq!(p.y, dropped);
                } else {
                    assert!(SPAWN_HEIGHT.contains(&p.y));
                }
                assert!(p.y >= 0.0);
            }
        }
    }

    #[test]
    fn test_zero_fall_speed_is_static() {
        let mut rng = rng();
        let mut field = ParticleField::regenerate(100, &params_with_speed(0.0), &mut rng).unwrap();
        let before = field.positions().to_vec();
        for _ in 0..100 {
            field.advance(&mut rng);
        }
        assert_eq!(field.positions(), before.as_slice());
    }

    #[test]
    fn test_advance_on_empty_field_is_noop() {
        let mut field = ParticleField::default();
        field.advance(&mut rng());
        assert!(field.is_empty());
        assert!(!field.is_dirty());
    }

    #[test]
    fn test_dirty_flag_cycle() {
        let mut rng = rng();
        let mut field = ParticleField::regenerate(4, &SnowParams::default(), &mut rng).unwrap();

        assert_eq!(field.take_dirty().map(|p| p.len()), Some(12));
        assert!(field.take_dirty().is_none());

        field.advance(&mut rng);
        assert!(field.is_dirty());
        assert!(field.take_dirty().is_some());
    }

    #[test]
    fn test_style_setters_leave_positions() {
        let mut field = ParticleField::regenerate(20, &SnowParams::default(), &mut rng()).unwrap();
        field.take_dirty();
        let before = field.positions().to_vec();

        field.set_size(0.9);
        field.set_opacity(0.1);

        assert_eq!(field.positions(), before.as_slice());
        assert!(!field.is_dirty());
        assert_eq!(field.size(), 0.9);
        assert_eq!(field.opacity(), 0.1);
    }

    #[test]
    fn test_from_positions_validation() {
        let params = SnowParams::default();
        assert_eq!(
            ParticleField::from_positions(Vec::new(), &params).unwrap_err(),
            FieldError::InvalidCapacity { requested: 0 }
        );
        assert_eq!(
            ParticleField::from_positions(vec![1.0, 2.0], &params).unwrap_err(),
            FieldError::MisalignedBuffer { len: 2 }
        );
    }

    #[test]
    fn test_position_out_of_range() {
        let field = ParticleField::regenerate(2, &SnowParams::default(), &mut rng()).unwrap();
        assert!(field.position(1).is_some());
        assert!(field.position(2).is_none());
        assert!(field.position(usize::MAX).is_none());
    }
}

//! Tunable parameters for the snowfall and the stage lighting.
//!
//! Both structs are plain data with sensible defaults. The [`ParamRange`]
//! constants describe the limits the debug panel enforces; anything reaching
//! the particle field is expected to already lie inside them.
//!
//! ```ignore
//! let params = SnowParams {
//!     count: 2500,
//!     ..SnowParams::default()
//! };
//! ```

use glam::Vec3;

/// Inclusive slider limits plus the step the panel snaps to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    /// Smallest accepted value.
    pub min: f32,
    /// Largest accepted value.
    pub max: f32,
    /// Increment between adjacent slider positions.
    pub step: f32,
}

impl ParamRange {
    /// Create a new range.
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    /// Clamp `value` into `[min, max]`.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Clamp `value` and round it to the nearest step above `min`.
    pub fn snap(&self, value: f32) -> f32 {
        let clamped = self.clamp(value);
        if self.step <= 0.0 {
            return clamped;
        }
        let steps = ((clamped - self.min) / self.step).round();
        self.clamp(self.min + steps * self.step)
    }

    /// Whether `value` lies inside the range.
    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Snowfall configuration, mirrored by the "Snow Particles" panel folder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnowParams {
    /// Number of particles in the field.
    pub count: u32,
    /// World-space size of each point sprite.
    pub size: f32,
    /// Sprite opacity in `[0, 1]`.
    pub opacity: f32,
    /// World units each particle drops per tick.
    pub fall_speed: f32,
}

impl SnowParams {
    /// Panel limits for [`SnowParams::count`].
    pub const COUNT_RANGE: ParamRange = ParamRange::new(100.0, 5000.0, 100.0);
    /// Panel limits for [`SnowParams::size`].
    pub const SIZE_RANGE: ParamRange = ParamRange::new(0.01, 1.0, 0.01);
    /// Panel limits for [`SnowParams::opacity`].
    pub const OPACITY_RANGE: ParamRange = ParamRange::new(0.0, 1.0, 0.01);
    /// Panel limits for [`SnowParams::fall_speed`].
    pub const FALL_SPEED_RANGE: ParamRange = ParamRange::new(0.001, 0.1, 0.001);

    /// Return a copy with every value pulled inside its panel range.
    pub fn clamped(&self) -> Self {
        Self {
            count: Self::COUNT_RANGE.snap(self.count as f32) as u32,
            size: Self::SIZE_RANGE.clamp(self.size),
            opacity: Self::OPACITY_RANGE.clamp(self.opacity),
            fall_speed: Self::FALL_SPEED_RANGE.clamp(self.fall_speed),
        }
    }
}

impl Default for SnowParams {
    fn default() -> Self {
        Self {
            count: 1000,
            size: 0.1,
            opacity: 0.8,
            fall_speed: 0.03,
        }
    }
}

/// Ambient plus a single directional light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightParams {
    /// Ambient light colour (linear RGB).
    pub ambient_color: Vec3,
    /// Ambient light intensity.
    pub ambient_intensity: f32,
    /// Directional light colour (linear RGB).
    pub sun_color: Vec3,
    /// Directional light intensity.
    pub sun_intensity: f32,
    /// Directional light position; it shines towards the origin.
    pub sun_position: Vec3,
}

impl LightParams {
    /// Panel limits for each axis of [`LightParams::sun_position`].
    pub const POSITION_RANGE: ParamRange = ParamRange::new(-10.0, 10.0, 0.1);
    /// Panel limits for [`LightParams::sun_intensity`].
    pub const INTENSITY_RANGE: ParamRange = ParamRange::new(0.0, 10.0, 0.1);

    /// Unit vector pointing from a lit surface towards the light.
    ///
    /// Falls back to straight up when the light sits at the origin.
    pub fn sun_direction(&self) -> Vec3 {
        self.sun_position.try_normalize().unwrap_or(Vec3::Y)
    }

    /// Place the directional light at a fixed offset from `anchor`.
    pub fn follow(&mut self, anchor: Vec3, offset: Vec3) {
        self.sun_position = anchor + offset;
    }
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::ONE,
            ambient_intensity: 0.5,
            sun_color: Vec3::ONE,
            sun_intensity: 0.9,
            sun_position: Vec3::new(0.0, 5.0, 5.0),
        }
    }
}

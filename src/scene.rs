//! Scene context tying the particle field to a rendering backend.
//!
//! [`SnowScene`] owns everything the snowfall needs between frames: the
//! [`ParticleField`], the current [`SnowParams`], the random source used for
//! sampling, and the [`PointBackend`] that draws the flakes. Hosts drive it
//! with two kinds of input:
//!
//! - [`SnowScene::tick`], once per rendered frame;
//! - parameter changes, either through the `set_*` methods or as
//!   [`ParamEvent`]s passed to [`SnowScene::apply`].
//!
//! Both run on the host's frame thread, so a regeneration always completes
//! before the next advance.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::error::FieldError;
use crate::field::ParticleField;
use crate::params::SnowParams;

/// Colour every flake is drawn with.
pub const SNOW_COLOR: Vec3 = Vec3::ONE;

/// Draw parameters for the point cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMaterial {
    /// World-space sprite size.
    pub size: f32,
    /// Sprite opacity in `[0, 1]`.
    pub opacity: f32,
    /// Sprite colour (linear RGB).
    pub color: Vec3,
    /// Shrink sprites with distance from the camera.
    pub size_attenuation: bool,
}

impl PointMaterial {
    /// Material matching the field's current point style.
    pub fn from_field(field: &ParticleField) -> Self {
        Self {
            size: field.size(),
            opacity: field.opacity(),
            color: SNOW_COLOR,
            size_attenuation: true,
        }
    }
}

/// A renderer that can display one point cloud.
///
/// Geometry is replaced, never resized: a new field is always delivered as
/// [`detach_points`](Self::detach_points) followed by
/// [`attach_points`](Self::attach_points).
pub trait PointBackend {
    /// Bind a new position buffer with the given material.
    fn attach_points(&mut self, positions: &[f32], material: PointMaterial);

    /// Drop the currently bound position buffer, if any.
    fn detach_points(&mut self);

    /// Update draw parameters without touching geometry.
    fn set_material(&mut self, material: PointMaterial);

    /// Re-upload the contents of the bound buffer. Length is unchanged.
    fn upload_positions(&mut self, positions: &[f32]);
}

/// A single change coming from the debug panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEvent {
    /// New particle count; regenerates the field.
    Count(u32),
    /// New sprite size.
    Size(f32),
    /// New sprite opacity.
    Opacity(f32),
    /// New per-tick fall distance.
    FallSpeed(f32),
}

impl ParamEvent {
    /// Events turning `before` into `after`, style changes first.
    pub fn diff(before: &SnowParams, after: &SnowParams) -> Vec<ParamEvent> {
        let mut events = Vec::new();
        if before.size != after.size {
            events.push(ParamEvent::Size(after.size));
        }
        if before.opacity != after.opacity {
            events.push(ParamEvent::Opacity(after.opacity));
        }
        if before.fall_speed != after.fall_speed {
            events.push(ParamEvent::FallSpeed(after.fall_speed));
        }
        if before.count != after.count {
            events.push(ParamEvent::Count(after.count));
        }
        events
    }
}

/// Owns the snowfall field and forwards its changes to a backend.
pub struct SnowScene<B: PointBackend, R: Rng = SmallRng> {
    field: ParticleField,
    params: SnowParams,
    rng: R,
    backend: B,
}

impl<B: PointBackend, R: Rng> SnowScene<B, R> {
    /// Build the first field from `params` and attach it to `backend`.
    pub fn init(params: SnowParams, backend: B, rng: R) -> Result<Self, FieldError> {
        let mut scene = Self {
            field: ParticleField::default(),
            params,
            rng,
            backend,
        };
        scene.regenerate(params.count)?;
        Ok(scene)
    }

    /// Advance the snowfall one step and upload the result.
    ///
    /// `_delta` is the host's frame time. The fall distance is a fixed amount
    /// per tick, so it is not used.
    pub fn tick(&mut self, _delta: f32) {
        self.field.advance(&mut self.rng);
        if let Some(positions) = self.field.take_dirty() {
            self.backend.upload_positions(positions);
        }
    }

    /// Replace the field with `count` freshly sampled flakes.
    ///
    /// On error the current field stays attached.
    pub fn set_count(&mut self, count: u32) -> Result<(), FieldError> {
        self.regenerate(count)?;
        self.params.count = count;
        Ok(())
    }

    /// Change the sprite size.
    pub fn set_size(&mut self, size: f32) {
        self.params.size = size;
        self.field.set_size(size);
        self.push_material();
    }

    /// Change the sprite opacity.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.params.opacity = opacity;
        self.field.set_opacity(opacity);
        self.push_material();
    }

    /// Change the fall distance used from the next tick on.
    pub fn set_fall_speed(&mut self, fall_speed: f32) {
        self.params.fall_speed = fall_speed;
        self.field.set_fall_speed(fall_speed);
    }

    /// Route a panel event to the matching setter.
    pub fn apply(&mut self, event: ParamEvent) -> Result<(), FieldError> {
        match event {
            ParamEvent::Count(count) => return self.set_count(count),
            ParamEvent::Size(size) => self.set_size(size),
            ParamEvent::Opacity(opacity) => self.set_opacity(opacity),
            ParamEvent::FallSpeed(fall_speed) => self.set_fall_speed(fall_speed),
        }
        Ok(())
    }

    /// Detach the flakes and hand the backend back.
    pub fn teardown(mut self) -> B {
        self.backend.detach_points();
        self.backend
    }

    /// The live field.
    #[inline]
    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    /// Current parameters.
    #[inline]
    pub fn params(&self) -> &SnowParams {
        &self.params
    }

    /// The rendering backend.
    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the rendering backend.
    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn regenerate(&mut self, count: u32) -> Result<(), FieldError> {
        let field = ParticleField::regenerate(count as usize, &self.params, &mut self.rng)?;

        if !self.field.is_empty() {
            self.backend.detach_points();
        }
        self.field = field;

        let material = PointMaterial::from_field(&self.field);
        self.backend.attach_points(self.field.positions(), material);
        self.field.take_dirty();

        log::info!("Regenerated snow field with {} particles", count);
        Ok(())
    }

    fn push_material(&mut self) {
        let material = PointMaterial::from_field(&self.field);
        log::debug!(
            "Point material: size {:.3}, opacity {:.2}",
            material.size,
            material.opacity
        );
        self.backend.set_material(material);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Attach(usize),
        Detach,
        Material(PointMaterial),
        Upload(usize),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        bound: Option<Vec<f32>>,
    }

    impl PointBackend for Recorder {
        fn attach_points(&mut self, positions: &[f32], _material: PointMaterial) {
            self.calls.push(Call::Attach(positions.len()));
            self.bound = Some(positions.to_vec());
        }

        fn detach_points(&mut self) {
            self.calls.push(Call::Detach);
            self.bound = None;
        }

        fn set_material(&mut self, material: PointMaterial) {
            self.calls.push(Call::Material(material));
        }

        fn upload_positions(&mut self, positions: &[f32]) {
            self.calls.push(Call::Upload(positions.len()));
            self.bound = Some(positions.to_vec());
        }
    }

    fn scene(count: u32) -> SnowScene<Recorder> {
        let params = SnowParams {
            count,
            ..SnowParams::default()
        };
        SnowScene::init(params, Recorder::default(), SmallRng::seed_from_u64(11)).unwrap()
    }

    #[test]
    fn test_init_attaches_once() {
        let scene = scene(1000);
        assert_eq!(scene.backend().calls, vec![Call::Attach(3000)]);
        assert!(!scene.field().is_dirty());
    }

    #[test]
    fn test_init_rejects_zero_count() {
        let params = SnowParams {
            count: 0,
            ..SnowParams::default()
        };
        let result = SnowScene::init(params, Recorder::default(), SmallRng::seed_from_u64(1));
        assert!(matches!(result, Err(FieldError::InvalidCapacity { requested: 0 })));
    }

    #[test]
    fn test_tick_uploads_advanced_buffer() {
        let mut scene = scene(100);
        scene.tick(0.016);
        assert_eq!(scene.backend().calls.last(), Some(&Call::Upload(300)));
        assert_eq!(scene.backend().bound.as_deref(), Some(scene.field().positions()));
    }

    #[test]
    fn test_set_count_replaces_geometry() {
        let mut scene = scene(1000);
        let old = scene.field().positions().to_vec();

        scene.set_count(500).unwrap();

        assert_eq!(scene.field().capacity(), 500);
        assert_eq!(scene.params().count, 500);
        assert_eq!(
            scene.backend().calls,
            vec![Call::Attach(3000), Call::Detach, Call::Attach(1500)]
        );
        assert_ne!(&old[..1500], scene.field().positions());
    }

    #[test]
    fn test_failed_count_keeps_field() {
        let mut scene = scene(200);
        let before = scene.field().clone();

        assert!(scene.set_count(0).is_err());

        assert_eq!(scene.field(), &before);
        assert_eq!(scene.params().count, 200);
        assert_eq!(scene.backend().calls, vec![Call::Attach(600)]);
    }

    #[test]
    fn test_style_changes_only_touch_material() {
        let mut scene = scene(100);
        let before = scene.field().positions().to_vec();

        scene.set_size(0.5);
        scene.set_opacity(0.3);

        assert_eq!(scene.field().positions(), before.as_slice());
        let calls = &scene.backend().calls;
        assert_eq!(calls.len(), 3);
        match (&calls[1], &calls[2]) {
            (Call::Material(a), Call::Material(b)) => {
                assert_eq!(a.size, 0.5);
                assert_eq!(b.opacity, 0.3);
                assert_eq!(b.color, SNOW_COLOR);
            }
            other => panic!("unexpected calls: {:?}", other),
        }
    }

    #[test]
    fn test_fall_speed_applies_next_tick() {
        let mut scene = scene(100);
        scene.set_fall_speed(0.0);
        let before = scene.field().positions().to_vec();

        scene.tick(1.0);

        assert_eq!(scene.field().positions(), before.as_slice());
        assert_eq!(scene.field().fall_speed(), 0.0);
        // No notification for fall speed, only the tick upload.
        assert_eq!(scene.backend().calls.len(), 2);
    }

    #[test]
    fn test_apply_dispatches() {
        let mut scene = scene(100);
        scene.apply(ParamEvent::Count(300)).unwrap();
        scene.apply(ParamEvent::Size(0.2)).unwrap();
        scene.apply(ParamEvent::Opacity(0.4)).unwrap();
        scene.apply(ParamEvent::FallSpeed(0.05)).unwrap();

        let p = scene.params();
        assert_eq!((p.count, p.size, p.opacity, p.fall_speed), (300, 0.2, 0.4, 0.05));
        assert_eq!(scene.field().capacity(), 300);
    }

    #[test]
    fn test_diff_params() {
        let before = SnowParams::default();
        assert!(ParamEvent::diff(&before, &before).is_empty());

        let after = SnowParams {
            count: 2000,
            opacity: 0.5,
            ..before
        };
        assert_eq!(
            ParamEvent::diff(&before, &after),
            vec![ParamEvent::Opacity(0.5), ParamEvent::Count(2000)]
        );
    }

    #[test]
    fn test_teardown_detaches() {
        let scene = scene(100);
        let backend = scene.teardown();
        assert_eq!(backend.calls.last(), Some(&Call::Detach));
        assert!(backend.bound.is_none());
    }
}

//! # Snowfall
//!
//! A small falling-snow scene: a field of point sprites drifting down over a
//! floor and a wall, lit by an ambient and a directional light.
//!
//! The simulation itself is CPU-side and renderer agnostic. A
//! [`ParticleField`] holds flat `x, y, z` positions; [`SnowScene`] owns the
//! field together with its parameters and random source, and pushes every
//! change through a [`PointBackend`]. The bundled [`Viewer`] plugs a wgpu
//! renderer into that seam and opens a window.
//!
//! ## Quick Start
//!
//! ```ignore
//! use snowfall::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     Viewer::new()
//!         .with_params(SnowParams {
//!             count: 2000,
//!             ..SnowParams::default()
//!         })
//!         .run()
//! }
//! ```
//!
//! ## Driving a field directly
//!
//! The field is usable without a window. Pass any [`rand::Rng`]; seeded
//! generators give repeatable runs.
//!
//! ```
//! use rand::{rngs::SmallRng, SeedableRng};
//! use snowfall::{ParticleField, SnowParams};
//!
//! let mut rng = SmallRng::seed_from_u64(7);
//! let mut field = ParticleField::regenerate(500, &SnowParams::default(), &mut rng).unwrap();
//! field.advance(&mut rng);
//! assert_eq!(field.positions().len(), 1500);
//! ```
//!
//! ## Debug panel
//!
//! With the `egui` feature the viewer shows a "Debug" window with sliders for
//! count, size, opacity and fall speed, plus the directional light position
//! and intensity. Count changes rebuild the field; the rest are applied in
//! place.

pub mod camera;
pub mod error;
pub mod field;
pub mod gpu;
#[cfg(feature = "egui")]
pub mod panel;
pub mod params;
pub mod scene;
pub mod stage;
pub mod time;
pub mod viewer;

pub use bytemuck;
pub use camera::OrbitCamera;
pub use error::{FieldError, GpuError, ViewerError};
pub use field::ParticleField;
pub use glam::{Vec2, Vec3};
pub use params::{LightParams, ParamRange, SnowParams};
pub use scene::{ParamEvent, PointBackend, PointMaterial, SnowScene};
pub use stage::{Plane, Stage};
pub use time::{FrameClock, FrameTime};
pub use viewer::Viewer;

#[cfg(feature = "egui")]
pub use egui;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::camera::OrbitCamera;
    pub use crate::error::{FieldError, ViewerError};
    pub use crate::field::ParticleField;
    pub use crate::params::{LightParams, SnowParams};
    pub use crate::scene::{ParamEvent, PointBackend, PointMaterial, SnowScene};
    pub use crate::viewer::Viewer;
    pub use glam::Vec3;
}

//! The static set the snow falls on: a floor, a back wall and their lights.
//!
//! Planes follow the usual convention of being built in the XY plane facing
//! `+Z`, then rotated and moved into place. The default [`Stage`] lays a
//! 50 × 50 floor flat on the ground and stands a 50 × 50 wall up at `x = -5`,
//! facing the camera.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec2, Vec3};

use crate::params::LightParams;

/// One vertex of a lit stage surface.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct StageVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

/// Surface description for a plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    /// Base colour (linear RGB).
    pub color: Vec3,
    /// Kept for parity with standard materials; shading is Lambert only.
    pub roughness: f32,
    pub metalness: f32,
}

impl Surface {
    /// Packed snow.
    pub const SNOW: Surface = Surface {
        color: Vec3::new(0.92, 0.94, 0.97),
        roughness: 0.5,
        metalness: 0.0,
    };

    /// Blue-grey ice.
    pub const ICE: Surface = Surface {
        color: Vec3::new(0.62, 0.74, 0.82),
        roughness: 0.5,
        metalness: 0.0,
    };
}

/// A flat rectangle placed in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Width and height before rotation.
    pub size: Vec2,
    pub rotation: Quat,
    pub translation: Vec3,
    pub surface: Surface,
}

impl Plane {
    /// An unrotated plane of `width` × `height` centred on the origin.
    pub fn new(width: f32, height: f32, surface: Surface) -> Self {
        Self {
            size: Vec2::new(width, height),
            rotation: Quat::IDENTITY,
            translation: Vec3::ZERO,
            surface,
        }
    }

    /// Rotate about the X axis by `angle` radians.
    pub fn with_rotation_x(mut self, angle: f32) -> Self {
        self.rotation = Quat::from_rotation_x(angle) * self.rotation;
        self
    }

    /// Rotate about the Y axis by `angle` radians.
    pub fn with_rotation_y(mut self, angle: f32) -> Self {
        self.rotation = Quat::from_rotation_y(angle) * self.rotation;
        self
    }

    /// Move the plane's centre to `translation`.
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Local-to-world transform.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }

    /// World-space facing direction.
    pub fn normal(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Two counter-clockwise triangles covering the plane.
    pub fn vertices(&self) -> [StageVertex; 6] {
        let half = self.size * 0.5;
        let corners = [
            Vec3::new(-half.x, -half.y, 0.0),
            Vec3::new(half.x, -half.y, 0.0),
            Vec3::new(half.x, half.y, 0.0),
            Vec3::new(-half.x, half.y, 0.0),
        ];
        let transform = self.transform();
        let normal = self.normal().to_array();
        let color = self.surface.color.to_array();

        [0, 1, 2, 0, 2, 3].map(|i| StageVertex {
            position: transform.transform_point3(corners[i]).to_array(),
            normal,
            color,
        })
    }
}

/// Everything drawn besides the snow.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub floor: Plane,
    pub wall: Plane,
    pub lights: LightParams,
}

impl Stage {
    /// Offset of the directional light from the point it follows.
    pub const SUN_OFFSET: Vec3 = Vec3::new(5.0, 5.0, 5.0);

    /// All plane vertices, floor first.
    pub fn vertices(&self) -> Vec<StageVertex> {
        [self.floor, self.wall]
            .iter()
            .flat_map(|plane| plane.vertices())
            .collect()
    }

    /// Keep the directional light at [`Self::SUN_OFFSET`] from `anchor`.
    pub fn aim_sun_at(&mut self, anchor: Vec3) {
        self.lights.follow(anchor, Self::SUN_OFFSET);
    }
}

impl Default for Stage {
    fn default() -> Self {
        use std::f32::consts::FRAC_PI_2;

        Self {
            floor: Plane::new(50.0, 50.0, Surface::SNOW).with_rotation_x(-FRAC_PI_2),
            wall: Plane::new(50.0, 50.0, Surface::ICE)
                .with_rotation_y(FRAC_PI_2)
                .with_translation(Vec3::new(-5.0, 5.0, 0.0)),
            lights: LightParams::default(),
        }
    }
}

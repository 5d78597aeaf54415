use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::params::LightParams;
use crate::scene::PointMaterial;

pub const STAGE_SOURCE: &str = include_str!("stage.wgsl");
pub const POINTS_SOURCE: &str = include_str!("points.wgsl");

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub right: [f32; 4],
    pub up: [f32; 4],
}

impl CameraUniform {
    pub fn new(view: Mat4, proj: Mat4) -> Self {
        // Rows of the view matrix are the camera basis in world space.
        Self {
            view_proj: (proj * view).to_cols_array_2d(),
            right: view.row(0).truncate().extend(0.0).to_array(),
            up: view.row(1).truncate().extend(0.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightsUniform {
    pub ambient: [f32; 4],
    pub sun_color: [f32; 4],
    pub sun_direction: [f32; 4],
}

impl From<&LightParams> for LightsUniform {
    fn from(lights: &LightParams) -> Self {
        Self {
            ambient: (lights.ambient_color * lights.ambient_intensity).extend(1.0).to_array(),
            sun_color: (lights.sun_color * lights.sun_intensity).extend(1.0).to_array(),
            sun_direction: lights.sun_direction().extend(0.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PointStyleUniform {
    pub color: [f32; 4],
    pub size: f32,
    pub attenuate: u32,
    pub viewport: [f32; 2],
}

impl PointStyleUniform {
    pub fn new(material: &PointMaterial, width: u32, height: u32) -> Self {
        Self {
            color: material.color.extend(material.opacity).to_array(),
            size: material.size,
            attenuate: material.size_attenuation as u32,
            viewport: [width.max(1) as f32, height.max(1) as f32],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_uniform_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 96);
        assert_eq!(std::mem::size_of::<LightsUniform>(), 48);
        assert_eq!(std::mem::size_of::<PointStyleUniform>(), 32);
    }

    #[test]
    fn test_camera_basis() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let u = CameraUniform::new(view, Mat4::IDENTITY);
        assert_eq!(u.right, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(u.up, [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_lights_scaled_by_intensity() {
        let u = LightsUniform::from(&LightParams::default());
        assert_eq!(u.ambient[..3], [0.5, 0.5, 0.5]);
        assert_eq!(u.sun_color[..3], [0.9, 0.9, 0.9]);
    }

    #[test]
    fn test_point_style_packs_opacity() {
        let material = PointMaterial {
            size: 0.1,
            opacity: 0.8,
            color: Vec3::ONE,
            size_attenuation: true,
        };
        let u = PointStyleUniform::new(&material, 0, 720);
        assert_eq!(u.color, [1.0, 1.0, 1.0, 0.8]);
        assert_eq!(u.attenuate, 1);
        assert_eq!(u.viewport, [1.0, 720.0]);
    }
}

//! wgpu renderer for the stage and the snow point cloud.

#[cfg(feature = "egui")]
pub mod egui_integration;
mod shader;

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::OrbitCamera;
use crate::error::GpuError;
use crate::field::STRIDE;
use crate::params::LightParams;
use crate::scene::{PointBackend, PointMaterial};
use crate::stage::{Stage, StageVertex};
use shader::{CameraUniform, LightsUniform, PointStyleUniform, POINTS_SOURCE, STAGE_SOURCE};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.05,
    a: 1.0,
};

/// Something drawn on top of the scene inside the same render pass.
pub trait Overlay {
    /// Upload buffers and textures before the pass begins.
    fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        size_in_pixels: [u32; 2],
    );

    /// Record draw calls after the scene.
    fn paint(&self, pass: &mut wgpu::RenderPass<'static>);

    /// Release per-frame resources after submission.
    fn finish(&mut self) {}
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    stage_pipeline: wgpu::RenderPipeline,
    points_pipeline: wgpu::RenderPipeline,
    stage_vertices: wgpu::Buffer,
    stage_vertex_count: u32,
    camera_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    style_buffer: wgpu::Buffer,
    stage_bind_group: wgpu::BindGroup,
    points_bind_group: wgpu::BindGroup,
    depth_texture: wgpu::TextureView,
    // Replaced wholesale on every attach; `None` while detached.
    point_buffer: Option<wgpu::Buffer>,
    point_count: u32,
    material: Option<PointMaterial>,
    pub camera: OrbitCamera,
}

impl GpuState {
    pub async fn new(window: Arc<Window>, stage: &Stage, camera: OrbitCamera) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);

        let mut camera = camera;
        camera.resize(config.width, config.height);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::bytes_of(&CameraUniform::new(
                camera.view_matrix(),
                camera.projection_matrix(),
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let lights_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lights Buffer"),
            contents: bytemuck::bytes_of(&LightsUniform::from(&stage.lights)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let style_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Point Style Buffer"),
            size: std::mem::size_of::<PointStyleUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let vertices = stage.vertices();
        let stage_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Stage Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Both pipelines bind the camera at 0 and their own uniform at 1.
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Bind Group Layout"),
            entries: &[
                uniform_layout_entry(0, wgpu::ShaderStages::VERTEX),
                uniform_layout_entry(1, wgpu::ShaderStages::VERTEX_FRAGMENT),
            ],
        });

        let stage_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Stage Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights_buffer.as_entire_binding(),
                },
            ],
        });

        let points_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Points Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: style_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let stage_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Stage Shader"),
            source: wgpu::ShaderSource::Wgsl(STAGE_SOURCE.into()),
        });

        let points_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Points Shader"),
            source: wgpu::ShaderSource::Wgsl(POINTS_SOURCE.into()),
        });

        let stage_attributes = wgpu::vertex_attr_array![
            0 => Float32x3, // position
            1 => Float32x3, // normal
            2 => Float32x3, // color
        ];

        let stage_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Stage Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &stage_shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<StageVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &stage_attributes,
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &stage_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let points_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Points Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &points_shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: (STRIDE * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x3,
                    }],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &points_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            // Transparent sprites: test against the stage, don't occlude each other.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        log::info!(
            "GPU ready: {}x{} surface, format {:?}",
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            stage_pipeline,
            points_pipeline,
            stage_vertices,
            stage_vertex_count: vertices.len() as u32,
            camera_buffer,
            lights_buffer,
            style_buffer,
            stage_bind_group,
            points_bind_group,
            depth_texture,
            point_buffer: None,
            point_count: 0,
            material: None,
            camera,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
            self.camera.resize(new_size.width, new_size.height);
            // Pixel-sized sprites depend on the viewport.
            self.write_point_style();
            log::info!("Resized surface to {}x{}", new_size.width, new_size.height);
        }
    }

    /// Reconfigure the surface at its current size, e.g. after it was lost.
    pub fn reconfigure(&mut self) {
        self.resize(winit::dpi::PhysicalSize {
            width: self.config.width,
            height: self.config.height,
        });
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Number of point instances currently bound.
    pub fn point_count(&self) -> u32 {
        self.point_count
    }

    fn write_point_style(&self) {
        if let Some(material) = &self.material {
            let style = PointStyleUniform::new(material, self.config.width, self.config.height);
            self.queue
                .write_buffer(&self.style_buffer, 0, bytemuck::bytes_of(&style));
        }
    }

    fn update_uniforms(&self, lights: &LightParams) {
        let camera = CameraUniform::new(self.camera.view_matrix(), self.camera.projection_matrix());
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera));
        self.queue.write_buffer(
            &self.lights_buffer,
            0,
            bytemuck::bytes_of(&LightsUniform::from(lights)),
        );
    }

    /// Draw the stage, the snow, and `overlay` if given.
    pub fn render(
        &mut self,
        lights: &LightParams,
        mut overlay: Option<&mut dyn Overlay>,
    ) -> Result<(), wgpu::SurfaceError> {
        self.update_uniforms(lights);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        if let Some(overlay) = overlay.as_deref_mut() {
            overlay.prepare(
                &self.device,
                &self.queue,
                &mut encoder,
                [self.config.width, self.config.height],
            );
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.stage_pipeline);
            render_pass.set_bind_group(0, &self.stage_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.stage_vertices.slice(..));
            render_pass.draw(0..self.stage_vertex_count, 0..1);

            if let Some(points) = &self.point_buffer {
                render_pass.set_pipeline(&self.points_pipeline);
                render_pass.set_bind_group(0, &self.points_bind_group, &[]);
                render_pass.set_vertex_buffer(0, points.slice(..));
                render_pass.draw(0..6, 0..self.point_count);
            }

            if let Some(overlay) = overlay.as_deref() {
                let mut render_pass = render_pass.forget_lifetime();
                overlay.paint(&mut render_pass);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if let Some(overlay) = overlay {
            overlay.finish();
        }

        Ok(())
    }
}

impl PointBackend for GpuState {
    fn attach_points(&mut self, positions: &[f32], material: PointMaterial) {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Snow Position Buffer"),
            contents: bytemuck::cast_slice(positions),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        self.point_buffer = Some(buffer);
        self.point_count = (positions.len() / STRIDE) as u32;
        self.set_material(material);
    }

    fn detach_points(&mut self) {
        if let Some(buffer) = self.point_buffer.take() {
            buffer.destroy();
        }
        self.point_count = 0;
    }

    fn set_material(&mut self, material: PointMaterial) {
        self.material = Some(material);
        self.write_point_style();
    }

    fn upload_positions(&mut self, positions: &[f32]) {
        let Some(buffer) = &self.point_buffer else {
            return;
        };
        let bytes: &[u8] = bytemuck::cast_slice(positions);
        if bytes.len() as wgpu::BufferAddress != buffer.size() {
            log::warn!(
                "Skipping upload of {} bytes into a {} byte point buffer",
                bytes.len(),
                buffer.size()
            );
            return;
        }
        self.queue.write_buffer(buffer, 0, bytes);
    }
}

fn uniform_layout_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

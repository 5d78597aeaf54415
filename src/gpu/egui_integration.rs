//! Egui integration for the debug panel.
//!
//! This module provides optional egui UI support when the `egui` feature is enabled.

use std::sync::Arc;
use winit::window::Window;

use super::Overlay;

/// Egui integration state.
///
/// Wraps egui context, winit state, and wgpu renderer.
pub struct EguiIntegration {
    pub ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

/// Output from egui frame processing.
pub struct EguiFrameOutput {
    pub paint_jobs: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

impl EguiIntegration {
    /// Create new egui integration.
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        window: &Arc<Window>,
    ) -> Self {
        let ctx = egui::Context::default();

        let mut style = egui::Style::default();
        style.visuals = egui::Visuals::dark();
        style.visuals.window_shadow = egui::Shadow::NONE;
        style.visuals.popup_shadow = egui::Shadow::NONE;
        ctx.set_style(style);

        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window.as_ref(),
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        // The panel is drawn inside the scene pass, so it shares its depth format.
        let renderer = egui_wgpu::Renderer::new(
            device,
            output_format,
            Some(super::DEPTH_FORMAT),
            1,     // msaa samples
            false, // dithering
        );

        Self { ctx, state, renderer }
    }

    /// Process a winit event.
    ///
    /// Returns true if egui consumed the event (don't pass to camera controls).
    pub fn on_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.state.on_window_event(window, event);
        response.consumed
    }

    /// Begin a new frame. Call before your UI code.
    pub fn begin_frame(&mut self, window: &Window) {
        let raw_input = self.state.take_egui_input(window);
        self.ctx.begin_pass(raw_input);
    }

    /// End the frame and get the output for rendering.
    pub fn end_frame(&mut self, window: &Window) -> EguiFrameOutput {
        let full_output = self.ctx.end_pass();

        self.state.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self.ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        EguiFrameOutput {
            paint_jobs,
            textures_delta: full_output.textures_delta,
            pixels_per_point: full_output.pixels_per_point,
        }
    }

    /// Pair this integration with a finished frame so the renderer can draw it.
    pub fn overlay<'a>(&'a mut self, output: EguiFrameOutput) -> EguiOverlay<'a> {
        EguiOverlay {
            egui: self,
            output,
            screen: None,
        }
    }
}

/// One frame of egui output ready to be painted over the scene.
pub struct EguiOverlay<'a> {
    egui: &'a mut EguiIntegration,
    output: EguiFrameOutput,
    screen: Option<egui_wgpu::ScreenDescriptor>,
}

impl Overlay for EguiOverlay<'_> {
    fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        size_in_pixels: [u32; 2],
    ) {
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point: self.output.pixels_per_point,
        };

        for (id, image_delta) in &self.output.textures_delta.set {
            self.egui.renderer.update_texture(device, queue, *id, image_delta);
        }

        self.egui.renderer.update_buffers(
            device,
            queue,
            encoder,
            &self.output.paint_jobs,
            &screen,
        );
        self.screen = Some(screen);
    }

    fn paint(&self, pass: &mut wgpu::RenderPass<'static>) {
        if let Some(screen) = &self.screen {
            self.egui.renderer.render(pass, &self.output.paint_jobs, screen);
        }
    }

    fn finish(&mut self) {
        for id in &self.output.textures_delta.free {
            self.egui.renderer.free_texture(id);
        }
    }
}

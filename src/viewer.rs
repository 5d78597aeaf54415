//! Viewer builder and runner

use std::sync::Arc;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::camera::OrbitCamera;
use crate::error::ViewerError;
use crate::gpu::GpuState;
use crate::params::{LightParams, SnowParams};
use crate::scene::SnowScene;
use crate::stage::Stage;
use crate::time::FrameClock;

#[cfg(feature = "egui")]
use crate::gpu::egui_integration::EguiIntegration;
#[cfg(feature = "egui")]
use crate::panel::DebugPanel;

/// A snowfall viewer builder.
///
/// Use method chaining to configure, then call `.run()` to open the window.
pub struct Viewer {
    params: SnowParams,
    stage: Stage,
    camera: OrbitCamera,
    seed: Option<u64>,
    title: String,
}

impl Viewer {
    /// Create a viewer with the default scene.
    pub fn new() -> Self {
        Self {
            params: SnowParams::default(),
            stage: Stage::default(),
            camera: OrbitCamera::default(),
            seed: None,
            title: "Snowfall".to_string(),
        }
    }

    /// Set the initial snow parameters.
    pub fn with_params(mut self, params: SnowParams) -> Self {
        self.params = params;
        self
    }

    /// Set the initial lighting.
    pub fn with_lights(mut self, lights: LightParams) -> Self {
        self.stage.lights = lights;
        self
    }

    /// Keep the directional light at a fixed offset above `anchor`.
    pub fn with_sun_anchor(mut self, anchor: Vec3) -> Self {
        self.stage.aim_sun_at(anchor);
        self
    }

    /// Replace the starting camera.
    pub fn with_camera(mut self, camera: OrbitCamera) -> Self {
        self.camera = camera;
        self
    }

    /// Seed the snowfall's random source for a repeatable run.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Current snow parameters.
    pub fn params(&self) -> &SnowParams {
        &self.params
    }

    /// Current stage.
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        }
    }

    /// Run the viewer. This blocks until the window is closed.
    pub fn run(self) -> Result<(), ViewerError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

struct App {
    viewer: Viewer,
    window: Option<Arc<Window>>,
    scene: Option<SnowScene<GpuState>>,
    clock: FrameClock,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    error: Option<ViewerError>,
    #[cfg(feature = "egui")]
    egui: Option<EguiIntegration>,
    #[cfg(feature = "egui")]
    panel: DebugPanel,
}

impl App {
    fn new(viewer: Viewer) -> Self {
        Self {
            viewer,
            window: None,
            scene: None,
            clock: FrameClock::new(),
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
            #[cfg(feature = "egui")]
            egui: None,
            #[cfg(feature = "egui")]
            panel: DebugPanel::new(),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.viewer.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        self.window = Some(window.clone());

        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            &self.viewer.stage,
            self.viewer.camera.clone(),
        ))?;

        #[cfg(feature = "egui")]
        {
            self.egui = Some(EguiIntegration::new(gpu.device(), gpu.config.format, &window));
        }

        let scene = SnowScene::init(self.viewer.params, gpu, self.viewer.rng())?;
        self.scene = Some(scene);
        self.clock = FrameClock::new();

        log::info!("Viewer started with {} particles", self.viewer.params.count);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let frame = self.clock.tick();
        let (Some(scene), Some(window)) = (&mut self.scene, &self.window) else {
            return;
        };

        #[cfg(feature = "egui")]
        let ui_output = match &mut self.egui {
            Some(egui) => {
                egui.begin_frame(window);
                let params = *scene.params();
                let events = self.panel.show(
                    &egui.ctx,
                    &params,
                    &mut self.viewer.stage.lights,
                    self.clock.fps(),
                );
                for event in events {
                    if let Err(e) = scene.apply(event) {
                        log::error!("Ignoring parameter change {:?}: {}", event, e);
                    }
                }
                Some(egui.end_frame(window))
            }
            None => None,
        };

        scene.tick(frame.delta);

        let lights = self.viewer.stage.lights;
        let gpu = scene.backend_mut();
        gpu.camera.update();

        #[cfg(feature = "egui")]
        let result = match (&mut self.egui, ui_output) {
            (Some(egui), Some(output)) => {
                let mut overlay = egui.overlay(output);
                gpu.render(&lights, Some(&mut overlay))
            }
            _ => gpu.render(&lights, None),
        };
        #[cfg(not(feature = "egui"))]
        let result = gpu.render(&lights, None);

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }

        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                log::error!("Failed to start viewer: {}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        if let (Some(egui), Some(window)) = (&mut self.egui, &self.window) {
            if egui.on_window_event(window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                if let Some(scene) = self.scene.take() {
                    scene.teardown();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(scene) = &mut self.scene {
                    scene.backend_mut().resize(physical_size);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = position.x - last_x;
                        let dy = position.y - last_y;

                        if let Some(scene) = &mut self.scene {
                            scene
                                .backend_mut()
                                .camera
                                .rotate(-dx as f32 * 0.005, dy as f32 * 0.005);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(scene) = &mut self.scene {
                    scene.backend_mut().camera.zoom(scroll * 0.3);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let viewer = Viewer::new();
        assert_eq!(viewer.params(), &SnowParams::default());
        assert_eq!(viewer.stage().lights, LightParams::default());
        assert!(viewer.seed.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let params = SnowParams {
            count: 300,
            ..SnowParams::default()
        };
        let viewer = Viewer::new()
            .with_params(params)
            .with_seed(9)
            .with_sun_anchor(Vec3::ZERO)
            .with_title("Test");

        assert_eq!(viewer.params().count, 300);
        assert_eq!(viewer.stage().lights.sun_position, Vec3::splat(5.0));
        assert_eq!(viewer.title, "Test");
    }

    #[test]
    fn test_seeded_rng_repeats() {
        use rand::Rng;

        let viewer = Viewer::new().with_seed(42);
        let a: f32 = viewer.rng().gen();
        let b: f32 = viewer.rng().gen();
        assert_eq!(a, b);
    }
}

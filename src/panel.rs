//! Debug panel for live tweaking (requires the `egui` feature).

use crate::params::{LightParams, ParamRange, SnowParams};
use crate::scene::ParamEvent;

/// Floating window with the snow and light controls.
pub struct DebugPanel {
    open: bool,
}

impl DebugPanel {
    pub fn new() -> Self {
        Self { open: true }
    }

    /// Draw the panel for this frame.
    ///
    /// Light edits are written straight into `lights`. Snow edits are returned
    /// as events so the scene can apply them; `params` itself is not modified.
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        params: &SnowParams,
        lights: &mut LightParams,
        fps: f32,
    ) -> Vec<ParamEvent> {
        let mut edited = *params;

        egui::Window::new("Debug")
            .open(&mut self.open)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.label(format!("{:.0} fps", fps));

                egui::CollapsingHeader::new("Snow Particles")
                    .default_open(true)
                    .show(ui, |ui| {
                        let count = SnowParams::COUNT_RANGE;
                        ui.add(
                            egui::Slider::new(&mut edited.count, count.min as u32..=count.max as u32)
                                .step_by(count.step as f64)
                                .text("Count"),
                        );
                        ui.add(slider(&mut edited.size, SnowParams::SIZE_RANGE, "Size"));
                        ui.add(slider(&mut edited.opacity, SnowParams::OPACITY_RANGE, "Opacity"));
                        ui.add(slider(
                            &mut edited.fall_speed,
                            SnowParams::FALL_SPEED_RANGE,
                            "Fall Speed",
                        ));
                    });

                egui::CollapsingHeader::new("Directional Light")
                    .default_open(true)
                    .show(ui, |ui| {
                        let range = LightParams::POSITION_RANGE;
                        ui.add(slider(&mut lights.sun_position.x, range, "X Position"));
                        ui.add(slider(&mut lights.sun_position.y, range, "Y Position"));
                        ui.add(slider(&mut lights.sun_position.z, range, "Z Position"));
                        ui.add(slider(
                            &mut lights.sun_intensity,
                            LightParams::INTENSITY_RANGE,
                            "Intensity",
                        ));
                    });
            });

        ParamEvent::diff(params, &edited)
    }
}

impl Default for DebugPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn slider<'a>(value: &'a mut f32, range: ParamRange, label: &str) -> egui::Slider<'a> {
    egui::Slider::new(value, range.min..=range.max)
        .step_by(range.step as f64)
        .text(label)
}

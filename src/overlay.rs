//! Egui overlay for the native window.
//!
//! Shows the streak counter, the level markers beside the flame and a small
//! control panel. Only built with the `egui` feature.

use std::sync::Arc;

use winit::window::Window;

use crate::params::{level_markers, StreakInput};

/// Flame gradient colors reused for the overlay text.
const STREAK_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 180, 0);
const MARKER_ACTIVE: egui::Color32 = egui::Color32::from_rgb(255, 230, 150);
const MARKER_IDLE: egui::Color32 = egui::Color32::from_rgb(110, 110, 120);

/// Values shown in the panel but not edited there.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelStats {
    pub particles: usize,
    pub fps: f32,
}

/// Values the panel can edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelState {
    pub input: StreakInput,
    pub backdrop_glow: bool,
}

/// Egui context, winit state and wgpu renderer.
pub struct Overlay {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

/// Output from one overlay frame.
pub struct OverlayFrame {
    pub paint_jobs: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

impl Overlay {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat, window: &Arc<Window>) -> Self {
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

        let renderer = egui_wgpu::Renderer::new(device, output_format, None, 1, false);

        Self { ctx, state, renderer }
    }

    /// Feed a window event to egui. Returns true if egui consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Run the panel UI for one frame, editing `panel` in place.
    pub fn run(&mut self, window: &Window, panel: &mut PanelState, stats: PanelStats) -> OverlayFrame {
        let raw_input = self.state.take_egui_input(window);
        let full_output = self.ctx.run(raw_input, |ctx| draw_panel(ctx, panel, stats));

        self.state
            .handle_platform_output(window, full_output.platform_output);
        let paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        OverlayFrame {
            paint_jobs,
            textures_delta: full_output.textures_delta,
            pixels_per_point: full_output.pixels_per_point,
        }
    }

    /// Record the overlay on top of `view`.
    pub fn paint(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        size_in_pixels: [u32; 2],
        frame: &OverlayFrame,
    ) {
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point: frame.pixels_per_point,
        };

        for (id, image_delta) in &frame.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }
        self.renderer
            .update_buffers(device, queue, encoder, &frame.paint_jobs, &screen);

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Overlay Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            self.renderer
                .render(&mut render_pass, &frame.paint_jobs, &screen);
        }

        for id in &frame.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

fn draw_panel(ctx: &egui::Context, panel: &mut PanelState, stats: PanelStats) {
    let input = panel.input;

    egui::Area::new(egui::Id::new("streak_counter"))
        .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -16.0))
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new(input.streak.to_string())
                        .size(36.0)
                        .strong()
                        .color(STREAK_COLOR),
                );
                ui.label(egui::RichText::new(if input.streak == 1 { "day" } else { "days" }).small());
            });
        });

    let screen = ctx.screen_rect().shrink(8.0);
    let painter = ctx.layer_painter(egui::LayerId::background());
    for marker in level_markers(input) {
        let color = if marker.active { MARKER_ACTIVE } else { MARKER_IDLE };
        painter.text(
            egui::pos2(screen.left(), screen.top() + marker.y_fraction * screen.height()),
            egui::Align2::LEFT_TOP,
            marker.level.to_string(),
            egui::FontId::monospace(12.0),
            color,
        );
    }

    egui::Window::new("Flamometer")
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-8.0, 8.0))
        .resizable(false)
        .collapsible(true)
        .show(ctx, |ui| {
            ui.add(egui::Slider::new(&mut panel.input.streak, 0..=panel.input.max_streak.max(1)).text("streak"));
            ui.add(egui::Slider::new(&mut panel.input.max_streak, 0..=365).text("max streak"));
            ui.checkbox(&mut panel.backdrop_glow, "backdrop glow");
            ui.separator();
            ui.label(format!("particles: {}", stats.particles));
            ui.label(format!("fps: {:.0}", stats.fps));
        });
}

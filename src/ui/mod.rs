//! Debug overlay: frame statistics and a location picker drawn with egui.

use derivative::Derivative;
use egui_wgpu::ScreenDescriptor;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::globe::GeoLocation;

/// Frame time of the last frame and frames per second over the last
/// second.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats
{
        last: Option<f64>,
        window_start: f64,
        frames: u32,
        pub fps: f32,
        pub frame_ms: f32,
}

impl FrameStats
{
        pub fn new() -> Self
        {
                Self::default()
        }

        /// Records a frame at `time` seconds.
        pub fn tick(
                &mut self,
                time: f64,
        )
        {
                match self.last
                {
                        Some(last) =>
                        {
                                self.frame_ms = ((time - last) * 1000.0) as f32;
                                self.frames += 1;
                        }
                        None => self.window_start = time,
                }

                self.last = Some(time);

                let elapsed = time - self.window_start;

                if elapsed >= 1.0
                {
                        self.fps = (self.frames as f64 / elapsed) as f32;
                        self.frames = 0;
                        self.window_start = time;
                }
        }

        pub fn label(&self) -> String
        {
                format!("{:.0} FPS  {:.1} ms", self.fps, self.frame_ms)
        }
}

/// egui drawn over the scene: input through `egui-winit`, painting through
/// `egui-wgpu` into the frame's surface view.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct DebugOverlay
{
        #[derivative(Debug = "ignore")]
        state: egui_winit::State,

        #[derivative(Debug = "ignore")]
        painter: egui_wgpu::Renderer,

        stats: FrameStats,
        show_stats: bool,
}

impl DebugOverlay
{
        pub fn new(
                device: &wgpu::Device,
                format: wgpu::TextureFormat,
                window: &Window,
                show_stats: bool,
        ) -> Self
        {
                let state = egui_winit::State::new(
                        egui::Context::default(),
                        egui::viewport::ViewportId::ROOT,
                        window,
                        Some(window.scale_factor() as f32),
                        None,
                        Some(2 * 1024),
                );

                // The overlay pass has no depth attachment.
                let painter = egui_wgpu::Renderer::new(device, format, None, 1, true);

                Self {
                        state,
                        painter,
                        stats: FrameStats::new(),
                        show_stats,
                }
        }

        /// Returns whether egui wants the event for itself.
        pub fn handle_input(
                &mut self,
                window: &Window,
                event: &WindowEvent,
        ) -> bool
        {
                self.state.on_window_event(window, event).consumed
        }

        pub fn record_frame(
                &mut self,
                time: f64,
        )
        {
                self.stats.tick(time);
        }

        pub fn stats(&self) -> &FrameStats
        {
                &self.stats
        }

        /// Draws the overlay into `view`.
        ///
        /// Returns the location whose button was clicked this frame.
        #[allow(clippy::too_many_arguments)]
        pub fn draw(
                &mut self,
                device: &wgpu::Device,
                queue: &wgpu::Queue,
                encoder: &mut wgpu::CommandEncoder,
                window: &Window,
                view: &wgpu::TextureView,
                screen: ScreenDescriptor,
                locations: &[GeoLocation],
                current: Option<&str>,
        ) -> Option<&'static str>
        {
                let context = self.state.egui_ctx().clone();

                // Points follow the capped drawing buffer, not the raw device ratio.
                context.set_pixels_per_point(screen.pixels_per_point);

                let input = self.state.take_egui_input(window);
                let stats = self.show_stats.then(|| self.stats.label());
                let mut clicked = None;

                let output = context.run(input, |ctx| {
                        if let Some(label) = &stats
                        {
                                egui::Area::new("stats".into())
                                        .fixed_pos(egui::pos2(10.0, 10.0))
                                        .show(ctx, |ui| {
                                                ui.label(egui::RichText::new(label.as_str()).monospace());
                                        });
                        }

                        if locations.is_empty()
                        {
                                return;
                        }

                        egui::Window::new("Locations")
                                .resizable(false)
                                .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-10.0, 10.0))
                                .show(ctx, |ui| {
                                        for location in locations
                                        {
                                                let selected = current == Some(location.name);

                                                if ui.selectable_label(selected, location.name).clicked()
                                                {
                                                        clicked = Some(location.name);
                                                }
                                        }
                                });
                });

                self.state.handle_platform_output(window, output.platform_output);

                let triangles = context.tessellate(output.shapes, output.pixels_per_point);

                for (id, delta) in &output.textures_delta.set
                {
                        self.painter.update_texture(device, queue, *id, delta);
                }

                self.painter.update_buffers(device, queue, encoder, &triangles, &screen);

                let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("overlay pass"),
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
                });

                self.painter.render(&mut pass.forget_lifetime(), &triangles, &screen);

                for id in &output.textures_delta.free
                {
                        self.painter.free_texture(id);
                }

                clicked
        }
}

#[cfg(test)]
mod tests
{
        use super::*;

        #[test]
        fn first_frame_only_starts_the_clock()
        {
                let mut stats = FrameStats::new();
                stats.tick(5.0);

                assert_eq!(stats.fps, 0.0);
                assert_eq!(stats.frame_ms, 0.0);
        }

        #[test]
        fn counts_frames_over_one_second()
        {
                let mut stats = FrameStats::new();

                for i in 0..=4
                {
                        stats.tick(i as f64 * 0.25);
                }

                assert!((stats.fps - 4.0).abs() < 1e-4);
                assert!((stats.frame_ms - 250.0).abs() < 1e-3);
                assert_eq!(stats.label(), "4 FPS  250.0 ms");
        }
}

use std::sync::Arc;

use crossbeam::channel::{Receiver, unbounded};
use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use fault3d::ViewerConfig;
use fault3d::geo::{CoordinateParser, ParseWarning};
use fault3d::renderer::{FrameStatus, GpuState, RenderLoop, SceneManager, StopHandle};
use fault3d::ui::{UiActions, UiState, apply_theme, draw_help_overlay, draw_side_panel};

struct App {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    egui_ctx: egui::Context,

    scene: SceneManager<GpuState>,
    render_loop: RenderLoop,
    stop: StopHandle,

    parser: CoordinateParser,
    diagnostics: Receiver<ParseWarning>,
    ui_state: UiState,

    dragging: bool,
}

impl App {
    fn new(config: ViewerConfig) -> Self {
        let (tx, rx) = unbounded();
        let (render_loop, stop) = RenderLoop::new();
        let ui_state = UiState::from_config(&config);

        Self {
            config,
            window: None,
            egui_state: None,
            egui_renderer: None,
            egui_ctx: egui::Context::default(),

            scene: SceneManager::new(),
            render_loop,
            stop,

            parser: CoordinateParser::with_diagnostics(tx),
            diagnostics: rx,
            ui_state,

            dragging: false,
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) {
        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            self.egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );
        apply_theme(&self.egui_ctx);
        self.egui_state = Some(egui_state);
        self.window = Some(window.clone());

        let gpu = match pollster::block_on(GpuState::new(window.clone(), self.config.vsync)) {
            Ok(gpu) => gpu,
            Err(e) => {
                tracing::error!(error = %e, "GPU initialisation failed");
                self.ui_state.last_error = Some(e.to_string());
                return;
            }
        };

        self.egui_renderer = Some(egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.config.format,
            None,
            1,
            false,
        ));

        self.scene.attach(gpu);
        let size = window.inner_size();
        self.scene.resize(size.width, size.height);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let (trace, params) = self.ui_state.parse_tagged(&self.parser, &self.diagnostics);
        match self.scene.rebuild(&trace, &params) {
            Ok(outcome) => {
                self.ui_state.last_outcome = Some(outcome);
                self.ui_state.last_error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "rebuild skipped");
                self.ui_state.last_outcome = None;
                self.ui_state.last_error = Some(e.to_string());
            }
        }
    }

    fn handle_ui_actions(&mut self, actions: UiActions) {
        if let Some(vsync) = actions.set_vsync {
            if let Some(gpu) = self.scene.backend_mut() {
                gpu.set_vsync(vsync);
            }
        }
        if actions.rebuild {
            self.rebuild();
        }
    }

    fn render(&mut self) {
        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return;
        };

        let raw_input = egui_state.take_egui_input(window);
        let camera = self.scene.camera().copied();
        let mut ui_actions = UiActions::default();

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui_actions = draw_side_panel(ctx, &mut self.ui_state);
            if let (true, Some(camera)) = (self.ui_state.show_help, &camera) {
                draw_help_overlay(ctx, camera);
            }
        });
        egui_state.handle_platform_output(window, full_output.platform_output);

        self.handle_ui_actions(ui_actions);

        let Some(egui_renderer) = &mut self.egui_renderer else {
            return;
        };

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let textures_delta = full_output.textures_delta;
        let pixels_per_point = full_output.pixels_per_point;

        let status = self.render_loop.frame(&mut self.scene, |gpu, frame| {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [gpu.config.width, gpu.config.height],
                pixels_per_point,
            };

            for (id, delta) in &textures_delta.set {
                egui_renderer.update_texture(&gpu.device, &gpu.queue, *id, delta);
            }

            egui_renderer.update_buffers(
                &gpu.device,
                &gpu.queue,
                &mut frame.encoder,
                &paint_jobs,
                &screen_descriptor,
            );

            let render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
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

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        });

        for id in &textures_delta.free {
            egui_renderer.free_texture(id);
        }

        if status == FrameStatus::Stopped {
            tracing::info!(frames = self.render_loop.frames_drawn(), "render loop stopped");
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));

        match event_loop.create_window(window_attrs) {
            Ok(window) => self.init_gpu(Arc::new(window)),
            Err(e) => {
                tracing::error!(error = %e, "failed to create window");
                self.stop.stop();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let (Some(egui_state), Some(window)) = (&mut self.egui_state, &self.window) {
            let response = egui_state.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.stop.stop();
            }

            WindowEvent::Resized(size) => {
                self.scene.resize(size.width, size.height);
            }

            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => y,
                    winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                if let Some(controls) = self.scene.controls_mut() {
                    controls.dolly(scroll);
                }
            }

            WindowEvent::RedrawRequested => {
                self.render();
            }

            _ => {}
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: winit::event::DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.dragging {
                if let Some(controls) = self.scene.controls_mut() {
                    controls.rotate(Vec2::new(delta.0 as f32, delta.1 as f32));
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.stop.is_stopped() {
            self.scene.teardown();
            event_loop.exit();
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let (config, config_error) = match ViewerConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (ViewerConfig::default(), Some(e)),
    };
    fault3d::init_logging(&config.log_filter);
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "using default config");
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}

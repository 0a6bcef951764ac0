//! Trapped-Ion Quantum Computer Demo
//!
//! Select ions in a linear Paul trap and drive them with laser pulses.
//!
//! Controls:
//! - Click: Select / deselect an ion (max 2)
//! - C: Laser-cool the chain to the ground state
//! - P: π pulse on the selected ions
//! - H: π/2 pulse on the selected ions
//! - E: Entangle the two selected ions
//! - Esc: Clear selection
//! - Arrow keys: Rotate view
//! - Scroll: Zoom

use common::{Camera3D, GraphicsContext, WindowSettings};
use ion_trap::control_panel::{draw_control_panel, draw_notice, StateLabelView};
use ion_trap::renderer::{build_frame, TrapRenderer};
use ion_trap::{Command, IonTrap, PulseKind, TrapConfig, TrapError};
use winit::{
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ControlFlow,
    keyboard::{KeyCode, PhysicalKey},
};

const MAX_POINTS: usize = 256;
const MAX_LINES: usize = 1024;

struct EguiState {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

struct App {
    ctx: GraphicsContext,
    renderer: TrapRenderer,
    trap: IonTrap,
    camera: Camera3D,
    egui: EguiState,
    state_label: StateLabelView,
    /// Blocking message for rejected input
    notice: Option<String>,
    cursor: (f64, f64),
}

impl App {
    fn new(ctx: GraphicsContext) -> Self {
        let renderer = TrapRenderer::new(&ctx, MAX_POINTS, MAX_LINES);
        let mut camera = Camera3D::new(ctx.aspect_ratio());
        camera.distance = 11.0;
        camera.pitch = 0.35;
        camera.update_orbital();

        let trap = IonTrap::new(TrapConfig::default());

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &ctx.window,
            Some(ctx.window.scale_factor() as f32),
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&ctx.device, ctx.config.format, None, 1);

        Self {
            ctx,
            renderer,
            trap,
            camera,
            egui: EguiState {
                ctx: egui_ctx,
                state: egui_state,
                renderer: egui_renderer,
            },
            state_label: StateLabelView::new(),
            notice: None,
            cursor: (0.0, 0.0),
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.ctx.resize(new_size);
        self.camera.update_aspect_ratio(self.ctx.aspect_ratio());
    }

    fn update(&mut self, dt: std::time::Duration) {
        self.trap.update(dt);
    }

    fn run_command(&mut self, command: Command) {
        if self.notice.is_some() {
            return;
        }
        if let Err(e) = self.trap.execute(command) {
            self.report(e);
        }
    }

    fn report(&mut self, error: TrapError) {
        match error {
            TrapError::NotFound(id) => log::error!("Picked ion {} does not exist", id),
            e => self.notice = Some(e.to_string()),
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.update_camera(&self.ctx.queue, &self.camera);
        let frame = build_frame(&self.trap);
        let (num_points, num_lines) = self.renderer.upload(&self.ctx.queue, &frame);

        // Build egui UI
        let raw_input = self.egui.state.take_egui_input(&self.ctx.window);
        let mut command = None;
        let mut notice = self.notice.take();
        let controls_enabled = notice.is_none();
        let trap = &self.trap;
        let state_label = &mut self.state_label;
        let full_output = self.egui.ctx.run(raw_input, |ctx| {
            command = draw_control_panel(ctx, trap, state_label, controls_enabled);
            draw_notice(ctx, &mut notice);
        });
        self.notice = notice;
        if let Some(command) = command {
            self.run_command(command);
        }

        self.egui.state.handle_platform_output(&self.ctx.window, full_output.platform_output);
        let tris = self.egui.ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui.renderer.update_texture(&self.ctx.device, &self.ctx.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.ctx.size.width, self.ctx.size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.renderer.render(&mut encoder, &view, num_points, num_lines);

        self.egui.renderer.update_buffers(
            &self.ctx.device,
            &self.ctx.queue,
            &mut encoder,
            &tris,
            &screen_descriptor,
        );
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
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
            self.egui.renderer.render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui.renderer.free_texture(id);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn handle_click(&mut self) {
        if self.notice.is_some() {
            return;
        }
        let (origin, dir) = self.camera.ray_from_cursor(
            self.cursor.0 as f32,
            self.cursor.1 as f32,
            self.ctx.size.width as f32,
            self.ctx.size.height as f32,
        );
        // A miss is a no-op
        if let Some(id) = self.trap.pick(origin, dir) {
            if let Err(e) = self.trap.toggle(id) {
                self.report(e);
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode, state: ElementState) {
        if state != ElementState::Pressed {
            return;
        }

        match key {
            KeyCode::KeyC => self.run_command(Command::Cool),
            KeyCode::KeyP => self.run_command(Command::Pulse(PulseKind::Pi)),
            KeyCode::KeyH => self.run_command(Command::Pulse(PulseKind::HalfPi)),
            KeyCode::KeyE => self.run_command(Command::Entangle),
            KeyCode::Escape => self.run_command(Command::ClearSelection),
            KeyCode::Enter if self.notice.is_some() => self.notice = None,
            KeyCode::ArrowLeft => self.camera.orbit(-0.1, 0.0),
            KeyCode::ArrowRight => self.camera.orbit(0.1, 0.0),
            KeyCode::ArrowUp => self.camera.orbit(0.0, 0.1),
            KeyCode::ArrowDown => self.camera.orbit(0.0, -0.1),
            _ => {}
        }
    }

    fn handle_scroll(&mut self, delta: f32) {
        self.camera.zoom(delta);
    }

    fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.egui.state.on_window_event(&self.ctx.window, event).consumed
    }
}

fn main() {
    let settings = WindowSettings::new("Ion Trap - Trapped-Ion Quantum Computer", 1280, 720);
    let (ctx, event_loop) = pollster::block_on(GraphicsContext::new(&settings));

    log::info!("Click ions to select, C cool, P π pulse, H π/2 pulse, E entangle");

    let mut app = App::new(ctx);
    let mut last_time = std::time::Instant::now();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { ref event, .. } => {
                    // Cursor tracking must see every move, even over the panel
                    if let WindowEvent::CursorMoved { position, .. } = event {
                        app.cursor = (position.x, position.y);
                    }

                    let consumed = app.handle_window_event(event);

                    if !consumed {
                        match event {
                            WindowEvent::CloseRequested => elwt.exit(),
                            WindowEvent::Resized(size) => app.resize(*size),
                            WindowEvent::MouseInput {
                                state: ElementState::Pressed,
                                button: MouseButton::Left,
                                ..
                            } => app.handle_click(),
                            WindowEvent::KeyboardInput {
                                event:
                                    KeyEvent {
                                        physical_key: PhysicalKey::Code(key),
                                        state,
                                        ..
                                    },
                                ..
                            } => app.handle_key(*key, *state),
                            WindowEvent::MouseWheel { delta, .. } => {
                                let scroll = match delta {
                                    MouseScrollDelta::LineDelta(_, y) => *y,
                                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                                };
                                app.handle_scroll(scroll);
                            }
                            WindowEvent::RedrawRequested => {
                                let now = std::time::Instant::now();
                                let dt = now - last_time;
                                last_time = now;

                                app.update(dt);
                                match app.render() {
                                    Ok(_) => {}
                                    Err(wgpu::SurfaceError::Lost) => app.resize(app.ctx.size),
                                    Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                                    Err(e) => log::error!("Render error: {:?}", e),
                                }
                            }
                            _ => {}
                        }
                    }
                }
                Event::AboutToWait => {
                    app.ctx.window.request_redraw();
                }
                _ => {}
            }
        })
        .expect("Event loop error");
}

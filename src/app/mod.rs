mod cli;
mod egui_host;
mod host;
mod input;
mod timing;

pub use cli::Cli;
pub use host::Host;

use crate::assets::{GltfModelLoader, ImageTextureLoader};
use crate::composer::{ComposeError, SceneComposer};
use crate::config::{ConfigError, SceneConfig};
use crate::render::{HeadlessRenderer, OrbitControls, RenderService};
use crate::ui::EguiPanel;
use egui_host::EguiHost;
use input::{wheel_notches, PointerState};
use timing::FrameTiming;

use glam::Vec3;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::error::EventLoopError;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "Portal";

type PortalComposer = SceneComposer<HeadlessRenderer, OrbitControls>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("event loop: {0}")]
    EventLoop(#[from] EventLoopError),
}

pub struct App {
    config: SceneConfig,
    debug_panel: bool,
    window: Option<Arc<Window>>,
    composer: Option<PortalComposer>,
    egui: Option<EguiHost>,
    pointer: PointerState,
    ui_wants_pointer: bool,
    timing: FrameTiming,
    target_frame_duration: Duration,
    next_frame_time: Instant,
}

impl App {
    fn new(config: SceneConfig, debug_panel: bool) -> Self {
        let now = Instant::now();
        Self {
            config,
            debug_panel,
            window: None,
            composer: None,
            egui: None,
            pointer: PointerState::default(),
            ui_wants_pointer: false,
            timing: FrameTiming::new(WINDOW_TITLE, now),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: now,
        }
    }

    fn init_scene(&mut self, window: &Window) -> Result<(), ComposeError> {
        let controls = OrbitControls::new(
            self.config.controls.clone(),
            Vec3::from(self.config.camera.target),
        );
        let panel = self.debug_panel.then(|| EguiPanel::new("Debug"));
        let mut composer = SceneComposer::new(
            self.config.clone(),
            HeadlessRenderer::new(),
            controls,
            window.viewport_metrics(),
            panel,
        )?;

        let base_dir = &self.config.assets.base_dir;
        composer.begin_loading(
            &ImageTextureLoader::new(base_dir.clone()),
            &GltfModelLoader::new(base_dir.clone()),
        );

        if self.debug_panel {
            self.egui = Some(EguiHost::new(window));
        }
        self.composer = Some(composer);
        Ok(())
    }

    fn handle_resize(&mut self) {
        let (Some(window), Some(composer)) = (self.window.as_ref(), self.composer.as_mut()) else {
            return;
        };
        if let Err(err) = composer.resize(window.viewport_metrics()) {
            log::error!("Resize failed: {}", err);
        }
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn render(&mut self) {
        let Some(window) = self.window.clone() else {
            return;
        };
        let Some(composer) = self.composer.as_mut() else {
            return;
        };

        // Errors are logged by the composer; the scene keeps running without
        // the failed asset.
        let _ = composer.poll_assets();

        let started = Instant::now();
        let overlay = match (self.egui.as_mut(), composer.panel_mut()) {
            (Some(egui), Some(panel)) => Some(egui.run_panel(&window, panel)),
            _ => None,
        };
        if let Some(frame) = overlay {
            self.ui_wants_pointer = frame.wants_pointer_input;
            composer.renderer_mut().submit_overlay(
                &frame.clipped_primitives,
                &frame.textures_delta,
                frame.pixels_per_point,
            );
        }
        composer.tick();

        self.timing.set_tick_duration(started.elapsed());
        self.timing.update(&window, Instant::now());
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(1280.0, 720.0))
            .with_resizable(true);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };

        if let Err(err) = self.init_scene(&window) {
            log::error!("Failed to compose scene: {}", err);
            event_loop.exit();
            return;
        }
        self.update_target_frame_duration(&window);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let consumed = match (self.egui.as_mut(), self.window.as_ref()) {
            (Some(egui), Some(window)) => egui.on_window_event(window, &event),
            _ => false,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) && !consumed {
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(_) => {
                self.handle_resize();
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => self.handle_resize(),
            WindowEvent::Moved(_) => {
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let delta = self.pointer.cursor_moved(position.x as f32, position.y as f32);
                if let (Some((dx, dy)), Some(composer), Some(window)) =
                    (delta, self.composer.as_mut(), self.window.as_ref())
                {
                    let height = window.inner_size().height as f32;
                    composer.controls_mut().drag(dx, dy, height);
                }
            }
            WindowEvent::CursorLeft { .. } => self.pointer.cursor_left(),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                self.pointer
                    .set_primary(pressed && !consumed && !self.ui_wants_pointer);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if consumed || self.ui_wants_pointer {
                    return;
                }
                if let Some(composer) = self.composer.as_mut() {
                    composer.controls_mut().wheel(wheel_notches(delta));
                }
            }
            WindowEvent::RedrawRequested => self.render(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_frame();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

/// Open the window and run the scene until it is closed. Expects a logger to
/// be installed already.
pub fn run(cli: Cli) -> Result<(), AppError> {
    let config = cli.scene_config()?;
    log::info!(
        "Portal scene: assets from {}, debug panel {}, sky {}",
        config.assets.base_dir.display(),
        if cli.debug_panel() { "on" } else { "off" },
        if config.sky_enabled { "on" } else { "off" }
    );
    log::info!("   Press ESC or close window to exit");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, cli.debug_panel());
    event_loop.run_app(&mut app)?;

    log::info!("Goodbye");
    Ok(())
}

//! Native window host.
//!
//! Opens a winit window, mounts a flame into it and presents each tick
//! through the GPU [`Presenter`].
//!
//! | Key | Action |
//! |-----|--------|
//! | Up / Down | streak ± 1 |
//! | Right / Left | max streak ± 1 |
//! | B | toggle backdrop glow |
//! | Escape | quit |

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use glam::Vec2;
use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::error::HostError;
use crate::gpu::Presenter;
use crate::host::{FrameRequest, Host, Mounted, ResizeObserver};
use crate::params::StreakInput;
use crate::simulation::FlameConfig;
use crate::surface::PixelSurface;
use crate::time::FrameClock;

/// Default window size in logical pixels, a tall flame column.
pub const DEFAULT_SIZE: (f64, f64) = (200.0, 384.0);

/// [`Host`] backed by a winit window.
///
/// Frame requests become redraw requests. Winit cannot withdraw a redraw,
/// so a cancelled request is simply ignored when it arrives.
pub struct WindowHost {
    window: Arc<Window>,
    next_id: u64,
    pending: Option<FrameRequest>,
    observer: Option<ResizeObserver>,
}

impl WindowHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next_id: 0,
            pending: None,
            observer: None,
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Whether a redraw arriving now answers a live frame request.
    pub fn has_pending_frame(&self) -> bool {
        self.pending.is_some()
    }
}

impl Host for WindowHost {
    fn container_size(&self) -> Option<Vec2> {
        let size = self.window.inner_size().to_logical::<f32>(self.window.scale_factor());
        Some(Vec2::new(size.width, size.height))
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.window.scale_factor() as f32
    }

    fn request_frame(&mut self) -> FrameRequest {
        self.next_id += 1;
        let request = FrameRequest(self.next_id);
        self.pending = Some(request);
        self.window.request_redraw();
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending == Some(request) {
            self.pending = None;
        }
    }

    fn observe_resize(&mut self) -> ResizeObserver {
        self.next_id += 1;
        let observer = ResizeObserver(self.next_id);
        self.observer = Some(observer);
        observer
    }

    fn disconnect(&mut self, observer: ResizeObserver) {
        if self.observer == Some(observer) {
            self.observer = None;
        }
    }
}

type WindowMount = Mounted<WindowHost, PixelSurface, Rc<Cell<StreakInput>>>;

/// Everything that exists while the window is open.
struct Running {
    presenter: Presenter,
    mounted: WindowMount,
    clock: FrameClock,
    #[cfg(feature = "egui")]
    overlay: crate::overlay::Overlay,
}

pub struct App {
    config: FlameConfig,
    input: Rc<Cell<StreakInput>>,
    running: Option<Running>,
    error: Option<HostError>,
}

impl App {
    pub fn new(config: FlameConfig, input: StreakInput) -> Self {
        Self {
            config,
            input: Rc::new(Cell::new(input)),
            running: None,
            error: None,
        }
    }

    fn open(&self, event_loop: &ActiveEventLoop) -> Result<Running, HostError> {
        let window_attrs = Window::default_attributes()
            .with_title("Flamometer")
            .with_inner_size(LogicalSize::new(DEFAULT_SIZE.0, DEFAULT_SIZE.1));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let presenter = pollster::block_on(Presenter::new(window.clone()))?;

        #[cfg(feature = "egui")]
        let overlay = crate::overlay::Overlay::new(presenter.device(), presenter.format(), &window);

        let mounted = Mounted::mount(
            WindowHost::new(window),
            Some(PixelSurface::new(0.0, 0.0, 1.0)),
            self.config.clone(),
            Rc::clone(&self.input),
        );

        Ok(Running {
            presenter,
            mounted,
            clock: FrameClock::new(),
            #[cfg(feature = "egui")]
            overlay,
        })
    }

    fn adjust(&self, f: impl FnOnce(&mut StreakInput)) {
        let mut input = self.input.get();
        f(&mut input);
        input.streak = input.streak.max(0);
        input.max_streak = input.max_streak.max(0);
        self.input.set(input);
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        match &event.logical_key {
            Key::Named(NamedKey::Escape) => event_loop.exit(),
            Key::Named(NamedKey::ArrowUp) => self.adjust(|i| i.streak += 1),
            Key::Named(NamedKey::ArrowDown) => self.adjust(|i| i.streak -= 1),
            Key::Named(NamedKey::ArrowRight) => self.adjust(|i| i.max_streak += 1),
            Key::Named(NamedKey::ArrowLeft) => self.adjust(|i| i.max_streak -= 1),
            Key::Character(c) if c.eq_ignore_ascii_case("b") => {
                if let Some(running) = &mut self.running {
                    let engine = running.mounted.engine_mut();
                    let enabled = !engine.config().backdrop_glow();
                    engine.set_backdrop_glow(enabled);
                    info!(enabled, "backdrop glow toggled");
                }
            }
            _ => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = &mut self.running else {
            return;
        };
        if !running.mounted.host().has_pending_frame() {
            return;
        }
        if running.mounted.on_frame().is_none() {
            return;
        }
        if let Some(surface) = running.mounted.surface() {
            running.presenter.upload(surface);
        }

        #[cfg(feature = "egui")]
        let result = {
            let window = Arc::clone(running.mounted.host().window());
            let mut panel = crate::overlay::PanelState {
                input: self.input.get(),
                backdrop_glow: running.mounted.engine().config().backdrop_glow(),
            };
            let stats = crate::overlay::PanelStats {
                particles: running.mounted.engine().particle_count(),
                fps: running.clock.fps(),
            };
            let frame = running.overlay.run(&window, &mut panel, stats);
            self.input.set(panel.input);
            running.mounted.engine_mut().set_backdrop_glow(panel.backdrop_glow);

            let size = running.presenter.size();
            let overlay = &mut running.overlay;
            running.presenter.render_with(|device, queue, encoder, view| {
                overlay.paint(device, queue, encoder, view, [size.width, size.height], &frame);
            })
        };
        #[cfg(not(feature = "egui"))]
        let result = running.presenter.render();

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = running.presenter.size();
                running.presenter.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => warn!("render error: {:?}", e),
        }

        if running.clock.update() {
            let input = self.input.get();
            running.mounted.host().window().set_title(&format!(
                "Flamometer | streak {}/{} | {} particles | {:.0} fps",
                input.streak,
                input.max_streak,
                running.mounted.engine().particle_count(),
                running.clock.fps()
            ));
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.open(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                error!("failed to open window: {}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        if let Some(running) = &mut self.running {
            let window = Arc::clone(running.mounted.host().window());
            if running.overlay.on_window_event(&window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(running) = &mut self.running {
                    running.mounted.release();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(running) = &mut self.running {
                    running.presenter.resize(physical_size);
                    let window = running.mounted.host().window();
                    let logical = physical_size.to_logical::<f32>(window.scale_factor());
                    running.mounted.on_resize(Vec2::new(logical.width, logical.height));
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(running) = &mut self.running {
                    if let Some(logical) = running.mounted.host().container_size() {
                        running.mounted.on_resize(logical);
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, &event),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Open a window showing the flame and block until it is closed.
pub fn run(config: FlameConfig, input: StreakInput) -> Result<(), HostError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, input);
    info!(streak = input.streak, max_streak = input.max_streak, "opening window");
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

//! Mounting a flame into a host rendering environment.
//!
//! A host is whatever schedules frames and reports container size changes:
//! the native window in [`window`](crate::window), or [`ManualHost`] for
//! headless rendering and tests. [`Mounted`] takes its subscriptions from
//! the host when it is created and hands every one of them back when it is
//! released or dropped.
//!
//! # Lifecycle
//!
//! ```ignore
//! let mut mounted = Mounted::mount(host, Some(surface), FlameConfig::new(), input);
//! // host calls back once per frame:
//! mounted.on_frame();
//! // host reports a new container size:
//! mounted.on_resize(Vec2::new(200.0, 384.0));
//! // teardown (also runs on drop):
//! mounted.release();
//! ```

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;
use tracing::{debug, info};

use crate::params::StreakInput;
use crate::simulation::{FlameConfig, Flamometer, TickReport};
use crate::surface::Surface;

/// Handle for a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Handle for an active resize observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResizeObserver(pub u64);

/// The host rendering environment a flame is mounted into.
pub trait Host {
    /// Logical size of the container the flame fills, `None` if there is none.
    fn container_size(&self) -> Option<Vec2>;

    /// Physical pixels per logical pixel.
    fn device_pixel_ratio(&self) -> f32 {
        1.0
    }

    /// Ask for one frame callback.
    fn request_frame(&mut self) -> FrameRequest;

    /// Withdraw a frame callback that has not fired yet.
    fn cancel_frame(&mut self, request: FrameRequest);

    /// Start delivering container resize notifications.
    fn observe_resize(&mut self) -> ResizeObserver;

    /// Stop delivering resize notifications.
    fn disconnect(&mut self, observer: ResizeObserver);
}

/// Supplies the streak pair; read again on every tick.
pub trait StreakSource {
    fn read(&self) -> StreakInput;
}

impl StreakSource for StreakInput {
    fn read(&self) -> StreakInput {
        *self
    }
}

impl StreakSource for Cell<StreakInput> {
    fn read(&self) -> StreakInput {
        self.get()
    }
}

impl<T: StreakSource + ?Sized> StreakSource for Rc<T> {
    fn read(&self) -> StreakInput {
        (**self).read()
    }
}

impl<F: Fn() -> StreakInput> StreakSource for F {
    fn read(&self) -> StreakInput {
        self()
    }
}

/// A flame mounted into a host.
///
/// A mount without a drawing surface or container is *disabled*: it holds
/// no subscriptions and every callback is a no-op.
pub struct Mounted<H: Host, S: Surface, Src: StreakSource> {
    host: H,
    surface: Option<S>,
    engine: Flamometer,
    source: Src,
    pending: Option<FrameRequest>,
    observer: Option<ResizeObserver>,
}

impl<H: Host, S: Surface, Src: StreakSource> Mounted<H, S, Src> {
    /// Mount a flame: size the surface, observe resizes, schedule the first frame.
    pub fn mount(mut host: H, surface: Option<S>, config: FlameConfig, source: Src) -> Self {
        let engine = Flamometer::new(config);

        let (mut surface, size) = match (surface, host.container_size()) {
            (Some(surface), Some(size)) => (surface, size),
            (surface, size) => {
                debug!(
                    has_surface = surface.is_some(),
                    has_container = size.is_some(),
                    "no drawing surface available, flamometer disabled"
                );
                return Self {
                    host,
                    surface: None,
                    engine,
                    source,
                    pending: None,
                    observer: None,
                };
            }
        };

        surface.resize(size, host.device_pixel_ratio());
        let observer = host.observe_resize();
        let pending = host.request_frame();
        info!(width = size.x, height = size.y, "flamometer mounted");

        Self {
            host,
            surface: Some(surface),
            engine,
            source,
            pending: Some(pending),
            observer: Some(observer),
        }
    }

    /// Whether this mount draws anything at all.
    pub fn is_active(&self) -> bool {
        self.surface.is_some() && self.pending.is_some()
    }

    /// The scheduled frame fired: run one tick and schedule the next.
    ///
    /// Returns `None` when disabled or already released.
    pub fn on_frame(&mut self) -> Option<TickReport> {
        self.pending.take()?;
        let surface = self.surface.as_mut()?;
        let report = self.engine.tick(surface, self.source.read());
        self.pending = Some(self.host.request_frame());
        Some(report)
    }

    /// The container changed size. Particles and the streak memo are kept.
    pub fn on_resize(&mut self, logical: Vec2) {
        if self.observer.is_none() {
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(logical, self.host.device_pixel_ratio());
            debug!(width = logical.x, height = logical.y, "flamometer resized");
        }
    }

    /// Cancel the pending frame, stop observing resizes and drop every particle.
    ///
    /// Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(request) = self.pending.take() {
            self.host.cancel_frame(request);
        }
        if let Some(observer) = self.observer.take() {
            self.host.disconnect(observer);
            debug!("flamometer released");
        }
        self.engine.clear();
    }

    pub fn engine(&self) -> &Flamometer {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Flamometer {
        &mut self.engine
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn source(&self) -> &Src {
        &self.source
    }
}

impl<H: Host, S: Surface, Src: StreakSource> Drop for Mounted<H, S, Src> {
    fn drop(&mut self) {
        self.release();
    }
}

/// A host driven by hand: frames fire when the caller says so.
///
/// Used for headless rendering and in tests.
#[derive(Debug, Clone, Default)]
pub struct ManualHost {
    container: Option<Vec2>,
    pixel_ratio: f32,
    next_id: u64,
    pending: Option<FrameRequest>,
    observer: Option<ResizeObserver>,
    requested: u64,
    cancelled: u64,
    disconnected: u64,
}

impl ManualHost {
    /// A host with a container of `size` logical pixels.
    pub fn new(size: Vec2, pixel_ratio: f32) -> Self {
        Self {
            container: Some(size),
            pixel_ratio,
            ..Self::default()
        }
    }

    /// A host with nowhere to draw.
    pub fn without_container() -> Self {
        Self::default()
    }

    pub fn pending_frame(&self) -> Option<FrameRequest> {
        self.pending
    }

    pub fn is_observing(&self) -> bool {
        self.observer.is_some()
    }

    /// Frames requested so far.
    pub fn frames_requested(&self) -> u64 {
        self.requested
    }

    pub fn frames_cancelled(&self) -> u64 {
        self.cancelled
    }

    pub fn observers_disconnected(&self) -> u64 {
        self.disconnected
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Host for ManualHost {
    fn container_size(&self) -> Option<Vec2> {
        self.container
    }

    fn device_pixel_ratio(&self) -> f32 {
        if self.pixel_ratio > 0.0 {
            self.pixel_ratio
        } else {
            1.0
        }
    }

    fn request_frame(&mut self) -> FrameRequest {
        let request = FrameRequest(self.next());
        self.pending = Some(request);
        self.requested += 1;
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending == Some(request) {
            self.pending = None;
            self.cancelled += 1;
        }
    }

    fn observe_resize(&mut self) -> ResizeObserver {
        let observer = ResizeObserver(self.next());
        self.observer = Some(observer);
        observer
    }

    fn disconnect(&mut self, observer: ResizeObserver) {
        if self.observer == Some(observer) {
            self.observer = None;
            self.disconnected += 1;
        }
    }
}

/// Drive a mounted flame for `frames` ticks on a [`ManualHost`].
///
/// Returns the report of the last tick, `None` if the mount is disabled.
pub fn run_frames<S: Surface, Src: StreakSource>(
    mounted: &mut Mounted<ManualHost, S, Src>,
    frames: u64,
) -> Option<TickReport> {
    let mut last = None;
    for _ in 0..frames {
        if mounted.host().pending_frame().is_none() {
            break;
        }
        last = mounted.on_frame();
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PixelSurface;

    fn mount(input: StreakInput) -> Mounted<ManualHost, PixelSurface, StreakInput> {
        Mounted::mount(
            ManualHost::new(Vec2::new(200.0, 384.0), 2.0),
            Some(PixelSurface::new(1.0, 1.0, 1.0)),
            FlameConfig::new().with_seed(3),
            input,
        )
    }

    #[test]
    fn test_mount_sizes_surface_and_subscribes() {
        let m = mount(StreakInput::new(7, 21));
        assert!(m.is_active());
        assert_eq!(m.surface().map(|s| s.physical_size()), Some((400, 768)));
        assert!(m.host().is_observing());
        assert_eq!(m.host().frames_requested(), 1);
    }

    #[test]
    fn test_each_frame_schedules_the_next() {
        let mut m = mount(StreakInput::new(7, 21));
        let report = run_frames(&mut m, 10).expect("active mount");
        assert_eq!(report.frame, 10);
        assert_eq!(m.host().frames_requested(), 11);
        assert!(m.host().pending_frame().is_some());
    }

    #[test]
    fn test_missing_surface_disables_silently() {
        let mut m: Mounted<ManualHost, PixelSurface, StreakInput> = Mounted::mount(
            ManualHost::new(Vec2::new(200.0, 384.0), 1.0),
            None,
            FlameConfig::new(),
            StreakInput::new(7, 21),
        );
        assert!(!m.is_active());
        assert!(m.on_frame().is_none());
        assert_eq!(m.host().frames_requested(), 0);
        assert!(!m.host().is_observing());
    }

    #[test]
    fn test_missing_container_disables_silently() {
        let mut m = Mounted::mount(
            ManualHost::without_container(),
            Some(PixelSurface::new(10.0, 10.0, 1.0)),
            FlameConfig::new(),
            StreakInput::new(7, 21),
        );
        assert!(!m.is_active());
        assert!(m.surface().is_none());
        assert!(m.on_frame().is_none());
        m.release();
        assert_eq!(m.host().frames_cancelled(), 0);
    }

    #[test]
    fn test_release_cancels_and_clears() {
        let mut m = mount(StreakInput::new(21, 21));
        run_frames(&mut m, 40);
        assert!(m.engine().particle_count() > 0);

        m.release();
        assert_eq!(m.engine().particle_count(), 0);
        assert!(m.host().pending_frame().is_none());
        assert!(!m.host().is_observing());
        assert_eq!(m.host().frames_cancelled(), 1);
        assert_eq!(m.host().observers_disconnected(), 1);

        // Nothing runs or gets scheduled after teardown.
        assert!(m.on_frame().is_none());
        m.release();
        assert_eq!(m.host().frames_cancelled(), 1);
        assert_eq!(m.host().frames_requested(), 41);
    }

    #[test]
    fn test_resize_keeps_particles_and_memo() {
        let mut m = mount(StreakInput::new(21, 21));
        run_frames(&mut m, 20);
        let before = m.engine().particles().to_vec();
        let memo = m.engine().last_streak();

        m.on_resize(Vec2::new(300.0, 500.0));
        assert_eq!(m.surface().map(|s| s.physical_size()), Some((600, 1000)));
        assert_eq!(m.engine().particles(), before.as_slice());
        assert_eq!(m.engine().last_streak(), memo);
    }

    #[test]
    fn test_resize_ignored_after_release() {
        let mut m = mount(StreakInput::new(21, 21));
        m.release();
        m.on_resize(Vec2::new(10.0, 10.0));
        assert_eq!(m.surface().map(|s| s.physical_size()), Some((400, 768)));
    }

    #[test]
    fn test_source_read_fresh_each_tick() {
        let input = Rc::new(Cell::new(StreakInput::new(0, 21)));
        let mut m = Mounted::mount(
            ManualHost::new(Vec2::new(200.0, 384.0), 1.0),
            Some(PixelSurface::new(1.0, 1.0, 1.0)),
            FlameConfig::new().with_seed(9),
            Rc::clone(&input),
        );
        let report = m.on_frame().expect("active");
        assert!(!report.drew_flame);

        input.set(StreakInput::new(10, 21));
        let report = m.on_frame().expect("active");
        assert!(report.drew_flame);
        assert!(report.streak_increased);
    }

    #[test]
    fn test_closure_source() {
        let source = || StreakInput::new(4, 8);
        assert_eq!(source.read(), StreakInput::new(4, 8));
    }
}

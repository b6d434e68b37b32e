//! Integration tests for the flame engine and its host lifecycle.
//!
//! These drive the public API the way a host would: mount, tick, resize and
//! tear down, checking the particle set and the drawn surface.

use std::cell::RefCell;
use std::rc::Rc;

use flamometer::host::{run_frames, FrameRequest, ResizeObserver};
use flamometer::prelude::*;
use flamometer::Particle;

fn surface() -> PixelSurface {
    PixelSurface::new(200.0, 384.0, 1.0)
}

fn seeded(seed: u64) -> Flamometer {
    Flamometer::new(FlameConfig::new().with_seed(seed))
}

// ============================================================================
// Particle set
// ============================================================================

#[test]
fn test_cap_never_exceeded() {
    let mut engine = seeded(1);
    let mut s = PixelSurface::new(60.0, 120.0, 1.0);

    // A rising streak bursts on every tick.
    for streak in 1..400 {
        let report = engine.tick(&mut s, StreakInput::new(streak, 21));
        assert!(report.alive <= 150, "tick {} had {} particles", streak, report.alive);
        assert_eq!(report.alive, engine.particle_count());
    }
    assert_eq!(engine.particle_count(), 150);
}

#[test]
fn test_custom_cap() {
    let mut engine = Flamometer::new(FlameConfig::new().with_particle_cap(10).with_seed(2));
    let mut s = PixelSurface::new(60.0, 120.0, 1.0);
    for streak in 1..50 {
        engine.tick(&mut s, StreakInput::new(streak, 21));
        assert!(engine.particle_count() <= 10);
    }
}

fn find<'a>(particles: &'a [Particle], like: &Particle) -> Option<&'a Particle> {
    particles.iter().find(|p| p.initial_life == like.initial_life && p.initial_size == like.initial_size)
}

#[test]
fn test_life_decrements_and_size_shrinks() {
    let mut engine = seeded(3);
    let mut s = PixelSurface::new(60.0, 120.0, 1.0);
    for _ in 0..30 {
        engine.tick(&mut s, StreakInput::new(21, 21));
    }

    // With no streak nothing new is emitted, so every survivor is traceable.
    let dark = StreakInput::new(0, 21);
    for _ in 0..120 {
        let before = engine.particles().to_vec();
        let report = engine.tick(&mut s, dark);
        assert_eq!(report.spawned, 0);
        assert_eq!(report.retired + report.alive, before.len());

        for p in engine.particles() {
            let prev = find(&before, p).expect("survivor existed last tick");
            assert!((p.life - (prev.life - 1.0)).abs() < 1e-4);
            assert!(p.size <= prev.size);
            assert!(p.size > 0.1);
        }
    }
    assert_eq!(engine.particle_count(), 0);
}

#[test]
fn test_particles_rise() {
    let mut engine = seeded(4);
    let mut s = surface();
    engine.tick(&mut s, StreakInput::new(21, 21));
    engine.tick(&mut s, StreakInput::new(21, 21));
    for p in engine.particles() {
        assert!(p.velocity.y < 0.0, "{:?}", p);
    }
}

#[test]
fn test_same_seed_same_flame() {
    let mut a = seeded(9);
    let mut b = seeded(9);
    let (mut sa, mut sb) = (surface(), surface());
    for streak in [3, 3, 4, 4, 4, 9, 9] {
        a.tick(&mut sa, StreakInput::new(streak, 21));
        b.tick(&mut sb, StreakInput::new(streak, 21));
    }
    assert_eq!(a.particles(), b.particles());
    assert_eq!(sa.to_rgba8(), sb.to_rgba8());
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_zero_streak_is_dark() {
    let mut engine = seeded(5);
    let mut s = surface();
    for _ in 0..50 {
        let report = engine.tick(&mut s, StreakInput::new(0, 21));
        assert!(!report.drew_flame);
    }
    assert_eq!(engine.particle_count(), 0);
    assert_eq!(s.coverage(), 0.0);
}

#[test]
fn test_over_max_saturates() {
    let mut capped = seeded(6);
    let mut over = seeded(6);
    let (mut a, mut b) = (surface(), surface());
    for _ in 0..20 {
        capped.tick(&mut a, StreakInput::new(21, 21));
        over.tick(&mut b, StreakInput::new(42, 21));
    }
    assert_eq!(capped.particles(), over.particles());
}

#[test]
fn test_zero_max_streak_means_full_flame() {
    let mut engine = seeded(7);
    let mut s = surface();
    let report = engine.tick(&mut s, StreakInput::new(1, 0));
    assert_eq!(report.params.flame_height_ratio, 1.0);
    assert_eq!(report.params.intensity, 1.0);
    assert!(report.drew_flame);
}

#[test]
fn test_burst_only_on_increase() {
    let mut engine = seeded(8);
    let mut s = surface();

    let first = engine.tick(&mut s, StreakInput::new(7, 21));
    assert!(!first.streak_increased);

    let up = engine.tick(&mut s, StreakInput::new(8, 21));
    assert!(up.streak_increased);
    assert_eq!(up.spawned, 7);

    let same = engine.tick(&mut s, StreakInput::new(8, 21));
    assert!(!same.streak_increased);
    assert_eq!(same.spawned, 2);

    let down = engine.tick(&mut s, StreakInput::new(2, 21));
    assert!(!down.streak_increased);
}

#[test]
fn test_taller_streak_draws_higher() {
    // Topmost row with any ink, scanning down from the top.
    fn top_row(s: &PixelSurface) -> u32 {
        let (w, h) = s.physical_size();
        (0..h)
            .find(|&y| (0..w).any(|x| s.pixel(x, y).is_some_and(|p| p.w > 0.05)))
            .unwrap_or(h)
    }

    let mut low = Flamometer::new(FlameConfig::new().with_particle_cap(0));
    let mut high = Flamometer::new(FlameConfig::new().with_particle_cap(0));
    let (mut a, mut b) = (surface(), surface());
    low.tick(&mut a, StreakInput::new(5, 21));
    high.tick(&mut b, StreakInput::new(20, 21));

    assert!(top_row(&b) < top_row(&a));
}

// ============================================================================
// Host lifecycle
// ============================================================================

#[derive(Debug, Default)]
struct Log {
    requested: Vec<FrameRequest>,
    cancelled: Vec<FrameRequest>,
    observed: Vec<ResizeObserver>,
    disconnected: Vec<ResizeObserver>,
}

/// A host that records every call into a shared log.
struct RecordingHost {
    log: Rc<RefCell<Log>>,
    next: u64,
}

impl Host for RecordingHost {
    fn container_size(&self) -> Option<Vec2> {
        Some(Vec2::new(100.0, 200.0))
    }

    fn request_frame(&mut self) -> FrameRequest {
        self.next += 1;
        let r = FrameRequest(self.next);
        self.log.borrow_mut().requested.push(r);
        r
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.log.borrow_mut().cancelled.push(request);
    }

    fn observe_resize(&mut self) -> ResizeObserver {
        self.next += 1;
        let o = ResizeObserver(self.next);
        self.log.borrow_mut().observed.push(o);
        o
    }

    fn disconnect(&mut self, observer: ResizeObserver) {
        self.log.borrow_mut().disconnected.push(observer);
    }
}

#[test]
fn test_drop_releases_subscriptions() {
    let log = Rc::new(RefCell::new(Log::default()));
    {
        let mut mounted = Mounted::mount(
            RecordingHost { log: Rc::clone(&log), next: 0 },
            Some(PixelSurface::new(1.0, 1.0, 1.0)),
            FlameConfig::new().with_seed(1),
            StreakInput::new(10, 21),
        );
        for _ in 0..5 {
            mounted.on_frame();
        }
    }

    let log = log.borrow();
    assert_eq!(log.requested.len(), 6);
    // Exactly the outstanding request is cancelled, exactly once.
    assert_eq!(log.cancelled, vec![log.requested[5]]);
    assert_eq!(log.disconnected, log.observed);
}

#[test]
fn test_explicit_release_then_drop_releases_once() {
    let log = Rc::new(RefCell::new(Log::default()));
    {
        let mut mounted = Mounted::mount(
            RecordingHost { log: Rc::clone(&log), next: 0 },
            Some(PixelSurface::new(1.0, 1.0, 1.0)),
            FlameConfig::new(),
            StreakInput::new(10, 21),
        );
        mounted.release();
        mounted.release();
    }
    let log = log.borrow();
    assert_eq!(log.cancelled.len(), 1);
    assert_eq!(log.disconnected.len(), 1);
}

#[test]
fn test_disabled_mount_takes_no_subscriptions() {
    let log = Rc::new(RefCell::new(Log::default()));
    {
        let mut mounted: Mounted<_, PixelSurface, _> = Mounted::mount(
            RecordingHost { log: Rc::clone(&log), next: 0 },
            None,
            FlameConfig::new(),
            StreakInput::new(10, 21),
        );
        assert!(mounted.on_frame().is_none());
    }
    let log = log.borrow();
    assert!(log.requested.is_empty());
    assert!(log.observed.is_empty());
    assert!(log.cancelled.is_empty());
    assert!(log.disconnected.is_empty());
}

#[test]
fn test_resize_mid_run_keeps_animating() {
    let mut mounted = Mounted::mount(
        ManualHost::new(Vec2::new(200.0, 384.0), 1.0),
        Some(surface()),
        FlameConfig::new().with_seed(12),
        StreakInput::new(21, 21),
    );
    run_frames(&mut mounted, 30);
    let count = mounted.engine().particle_count();
    assert!(count > 0);

    mounted.on_resize(Vec2::new(100.0, 192.0));
    assert_eq!(mounted.engine().particle_count(), count);

    let report = run_frames(&mut mounted, 1).expect("still active");
    assert_eq!(report.frame, 31);
    assert_eq!(mounted.surface().map(|s| s.logical_size()), Some(Vec2::new(100.0, 192.0)));
}

#[test]
fn test_instances_are_independent() {
    let mk = |streak| {
        Mounted::mount(
            ManualHost::new(Vec2::new(200.0, 384.0), 1.0),
            Some(surface()),
            FlameConfig::new().with_seed(1),
            StreakInput::new(streak, 21),
        )
    };
    let mut lit = mk(21);
    let mut dark = mk(0);
    run_frames(&mut lit, 10);
    run_frames(&mut dark, 10);
    assert!(lit.engine().particle_count() > 0);
    assert_eq!(dark.engine().particle_count(), 0);

    lit.release();
    assert_eq!(lit.engine().particle_count(), 0);
    assert!(dark.is_active());
}

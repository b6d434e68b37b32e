//! Particle emission at the flame base.
//!
//! Each tick the emitter tops up the active set: a steady trickle that
//! follows the flame's intensity, plus a one-tick burst whenever the streak
//! goes up.
//!
//! # Rate
//!
//! | Situation | Particles this tick |
//! |-----------|---------------------|
//! | streak unchanged | `⌈intensity × 1.5⌉` |
//! | streak increased | `⌈intensity × 1.5 + 5⌉` |
//! | flame under 5 px tall | none |
//!
//! Spawning always stops as soon as the active set reaches its cap.

use glam::Vec2;
use rand::Rng;

use crate::flame::FlameGeometry;
use crate::particle::Particle;

/// Flames shorter than this (in logical pixels) emit nothing.
pub const MIN_EMIT_HEIGHT: f32 = 5.0;

/// Tolerance when rounding a fractional rate up, so float noise
/// like `0.9999999` still counts as one particle.
const RATE_EPSILON: f32 = 1e-4;

/// Emission settings for the flame base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emitter {
    /// Particles per tick at full intensity.
    pub rate: f32,
    /// Extra particles on the tick the streak increases.
    pub burst: f32,
    /// Fraction of the flame width particles are spread over.
    pub spread: f32,
    /// Fraction of the flame height particles may start above the base.
    pub rise: f32,
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            rate: 1.5,
            burst: 5.0,
            spread: 0.6,
            rise: 0.3,
        }
    }
}

impl Emitter {
    /// Particles-per-tick rate for the given intensity.
    pub fn emit_rate(&self, intensity: f32, streak_increased: bool) -> f32 {
        let burst = if streak_increased { self.burst } else { 0.0 };
        (intensity * self.rate + burst).max(0.0)
    }

    /// Whole particles to spawn for a rate. Fractional rates round up.
    pub fn spawn_count(rate: f32) -> usize {
        if rate <= RATE_EPSILON {
            0
        } else {
            (rate - RATE_EPSILON).ceil() as usize
        }
    }

    /// A random emission point: concentrated toward the center, mostly at the base.
    pub fn emit_point<R: Rng + ?Sized>(&self, geometry: &FlameGeometry, rng: &mut R) -> Vec2 {
        let y = geometry.height - rng.gen::<f32>() * (geometry.base_height * self.rise);
        let x = geometry.center_x()
            + (rng.gen::<f32>() - 0.5) * (geometry.flame_width * self.spread);
        Vec2::new(x, y)
    }

    /// Spawn up to `rate` particles into `particles`, never growing it past `cap`.
    ///
    /// Returns how many particles were added.
    pub fn emit<R: Rng + ?Sized>(
        &self,
        particles: &mut Vec<Particle>,
        cap: usize,
        geometry: &FlameGeometry,
        rate: f32,
        rng: &mut R,
    ) -> usize {
        if geometry.base_height <= MIN_EMIT_HEIGHT {
            return 0;
        }

        let mut spawned = 0;
        for _ in 0..Self::spawn_count(rate) {
            if particles.len() >= cap {
                break;
            }
            let point = self.emit_point(geometry, rng);
            particles.push(Particle::spawn(point, geometry.width, rng));
            spawned += 1;
        }
        spawned
    }
}

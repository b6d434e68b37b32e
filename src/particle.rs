//! Flame particles.
//!
//! A particle is a plain value: it is born near the flame base, drifts
//! upward with a little turbulence, shrinks and reddens as it ages, and is
//! dropped by its owner the tick its life or size runs out.

use glam::{Vec2, Vec3};
use rand::Rng;

use crate::visuals::HotPalette;

/// Horizontal jitter applied to the emission point.
const SPAWN_JITTER: f32 = 20.0;
/// Remaining-life fraction below which a particle starts reddening.
const REDDEN_BELOW: f32 = 0.5;
const GREEN_FADE: f32 = 0.98;
const BLUE_FADE: f32 = 0.95;
const TURBULENCE_X: f32 = 0.2;
const TURBULENCE_Y: f32 = 0.1;
/// Peak particle opacity.
const MAX_ALPHA: f32 = 0.8;

/// A single flame particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Position in surface-local logical pixels. `y` grows downward.
    pub position: Vec2,
    /// Displacement per tick.
    pub velocity: Vec2,
    /// Current diameter.
    pub size: f32,
    pub initial_size: f32,
    /// Remaining lifetime in ticks.
    pub life: f32,
    pub initial_life: f32,
    /// RGB in `[0, 1]`.
    pub color: Vec3,
}

impl Particle {
    /// Create a particle at an emission point on a surface `width` wide.
    ///
    /// Particles emitted near the horizontal center rise faster; those near
    /// the edges drift more sideways.
    pub fn spawn<R: Rng + ?Sized>(emit: Vec2, width: f32, rng: &mut R) -> Self {
        let half_width = width * 0.5;
        let edge = if half_width > 0.0 {
            ((emit.x - half_width).abs() / half_width).min(1.0)
        } else {
            0.0
        };

        let x = emit.x + (rng.gen::<f32>() - 0.5) * SPAWN_JITTER;
        let vx = (rng.gen::<f32>() - 0.5) * (2.0 + edge * 3.0);
        let vy = -(rng.gen::<f32>() * 2.0 + 2.0 + (1.0 - edge) * 3.0);
        let initial_size = rng.gen::<f32>() * 5.0 + 3.0;
        let initial_life = rng.gen::<f32>() * 60.0 + 40.0;
        let color = HotPalette::pick(rng.gen::<f32>()).color();

        Self {
            position: Vec2::new(x, emit.y),
            velocity: Vec2::new(vx, vy),
            size: initial_size,
            initial_size,
            life: initial_life,
            initial_life,
            color,
        }
    }

    /// Fraction of life remaining, in `[0, 1]` while alive.
    #[inline]
    pub fn life_ratio(&self) -> f32 {
        if self.initial_life > 0.0 {
            self.life / self.initial_life
        } else {
            0.0
        }
    }

    /// Advance one tick.
    pub fn update<R: Rng + ?Sized>(&mut self, damping: f32, rng: &mut R) {
        self.position += self.velocity;
        self.velocity.y *= damping;
        self.life -= 1.0;

        let ratio = self.life_ratio();
        self.size = (self.initial_size * ratio).max(0.0);

        if ratio < REDDEN_BELOW {
            self.color.y = (self.color.y * GREEN_FADE).max(0.0);
            self.color.z = (self.color.z * BLUE_FADE).max(0.0);
        }

        self.velocity.x += (rng.gen::<f32>() - 0.5) * TURBULENCE_X;
        self.velocity.y += (rng.gen::<f32>() - 0.5) * TURBULENCE_Y;
    }

    /// Whether the particle should be dropped from the active set.
    #[inline]
    pub fn is_expired(&self, size_threshold: f32) -> bool {
        self.life <= 0.0 || self.size <= size_threshold
    }

    /// Opacity: full until half-life, then fading linearly to zero.
    #[inline]
    pub fn alpha(&self) -> f32 {
        if self.initial_life <= 0.0 {
            return 0.0;
        }
        (self.life / (self.initial_life * 0.5)).clamp(0.0, 1.0) * MAX_ALPHA
    }

    /// Radius of the drawn disc.
    #[inline]
    pub fn radius(&self) -> f32 {
        (self.size * 0.5).max(0.0)
    }
}

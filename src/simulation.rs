//! The flame engine: configuration builder and per-tick simulation.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use crate::emitter::Emitter;
use crate::flame::{backdrop_glow, FlameGeometry, FlameSilhouette};
use crate::params::{FlameParams, StreakInput};
use crate::particle::Particle;
use crate::surface::Surface;
use crate::visuals::{BlendMode, Rgba};

/// Upper bound on [`FlameConfig::with_particle_cap`].
pub const MAX_PARTICLE_CAP: usize = u16::MAX as usize;

/// Particles preallocated by [`Flamometer::new`]; the set grows past this on demand.
const PREALLOCATED_PARTICLES: usize = 1024;

/// Engine settings.
///
/// Use method chaining to configure, then hand it to [`Flamometer::new`].
///
/// ```ignore
/// let config = FlameConfig::new()
///     .with_particle_cap(300)
///     .with_backdrop_glow(true)
///     .with_seed(42);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FlameConfig {
    particle_cap: usize,
    damping: f32,
    size_threshold: f32,
    emitter: Emitter,
    backdrop_glow: bool,
    seed: Option<u64>,
}

impl FlameConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            particle_cap: 150,
            damping: 0.99,
            size_threshold: 0.1,
            emitter: Emitter::default(),
            backdrop_glow: false,
            seed: None,
        }
    }

    /// Maximum number of live particles, clamped to [`MAX_PARTICLE_CAP`].
    pub fn with_particle_cap(mut self, cap: usize) -> Self {
        self.particle_cap = cap.min(MAX_PARTICLE_CAP);
        self
    }

    /// Vertical velocity multiplier applied every tick, clamped to `[0, 1]`.
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.clamp(0.0, 1.0);
        self
    }

    /// Particles at or below this size are retired.
    pub fn with_size_threshold(mut self, threshold: f32) -> Self {
        self.size_threshold = threshold.max(0.0);
        self
    }

    /// Particles per tick at full intensity.
    pub fn with_emission_rate(mut self, rate: f32) -> Self {
        self.emitter.rate = rate.max(0.0);
        self
    }

    /// Extra particles on the tick the streak goes up.
    pub fn with_burst(mut self, burst: f32) -> Self {
        self.emitter.burst = burst.max(0.0);
        self
    }

    /// Paint a soft radial glow behind the flame.
    pub fn with_backdrop_glow(mut self, enabled: bool) -> Self {
        self.backdrop_glow = enabled;
        self
    }

    /// Seed the random generator for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn particle_cap(&self) -> usize {
        self.particle_cap
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn size_threshold(&self) -> f32 {
        self.size_threshold
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn backdrop_glow(&self) -> bool {
        self.backdrop_glow
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl Default for FlameConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Index of this tick, starting at 1.
    pub frame: u64,
    pub params: FlameParams,
    /// Whether the streak went up since the previous tick.
    pub streak_increased: bool,
    /// Whether a flame silhouette was drawn.
    pub drew_flame: bool,
    /// Particles retired in the update phase.
    pub retired: usize,
    /// Particles spawned in the emission phase.
    pub spawned: usize,
    /// Live particles after the tick.
    pub alive: usize,
}

/// One mounted flame visualization.
///
/// Owns its particles and the last streak it saw; nothing is shared between
/// instances. Behavior is tick-indexed: calling [`tick`](Self::tick) faster
/// makes the flame move faster.
#[derive(Debug)]
pub struct Flamometer {
    config: FlameConfig,
    particles: Vec<Particle>,
    last_streak: Option<i64>,
    frame: u64,
    rng: StdRng,
}

impl Flamometer {
    pub fn new(config: FlameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            particles: Vec::with_capacity(config.particle_cap.min(PREALLOCATED_PARTICLES)),
            config,
            last_streak: None,
            frame: 0,
            rng,
        }
    }

    pub fn config(&self) -> &FlameConfig {
        &self.config
    }

    /// Toggle the backdrop glow at runtime.
    pub fn set_backdrop_glow(&mut self, enabled: bool) {
        self.config.backdrop_glow = enabled;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// The streak seen by the previous tick, if any.
    pub fn last_streak(&self) -> Option<i64> {
        self.last_streak
    }

    /// Number of ticks run so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Drop every particle.
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Run one tick: update and draw the particles, emit new ones, and draw
    /// the flame onto `surface`.
    pub fn tick<S: Surface + ?Sized>(&mut self, surface: &mut S, input: StreakInput) -> TickReport {
        self.frame += 1;

        let params = FlameParams::from_input(input);
        let size = surface.logical_size();
        let geometry = FlameGeometry::new(size.x, size.y, params);

        surface.clear();

        if self.config.backdrop_glow && params.intensity > 0.0 {
            surface.fill_rect(&backdrop_glow(size.x, size.y, params));
        }

        let silhouette = FlameSilhouette::build(&geometry, params, self.frame);
        if let Some(flame) = &silhouette {
            surface.fill_path(&flame.path, &flame.paint, Some(&flame.shadow));
        }

        surface.set_blend_mode(BlendMode::Lighter);
        let retired = self.update_particles(surface);
        surface.set_blend_mode(BlendMode::SourceOver);

        let streak_increased = self.last_streak.is_some_and(|last| input.streak > last);
        let rate = self.config.emitter.emit_rate(params.intensity, streak_increased);
        if streak_increased {
            debug!(streak = input.streak, rate, "streak increased, bursting");
        }
        let spawned = self.config.emitter.emit(
            &mut self.particles,
            self.config.particle_cap,
            &geometry,
            rate,
            &mut self.rng,
        );

        self.last_streak = Some(input.streak);

        let report = TickReport {
            frame: self.frame,
            params,
            streak_increased,
            drew_flame: silhouette.is_some(),
            retired,
            spawned,
            alive: self.particles.len(),
        };
        trace!(?report, "tick");
        report
    }

    /// Advance every particle, drawing survivors and dropping the rest.
    fn update_particles<S: Surface + ?Sized>(&mut self, surface: &mut S) -> usize {
        let damping = self.config.damping;
        let threshold = self.config.size_threshold;
        let rng = &mut self.rng;
        let mut retired = 0;

        self.particles.retain_mut(|p| {
            p.update(damping, &mut *rng);
            if p.is_expired(threshold) {
                retired += 1;
                return false;
            }
            surface.fill_circle(p.position, p.radius(), Rgba::from_vec3(p.color, p.alpha()));
            true
        });
        retired
    }
}

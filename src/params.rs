//! Streak input and the flame parameters derived from it.
//!
//! The visualization is driven by exactly two numbers supplied by the host:
//! the current streak and the longest streak on record. Everything the engine
//! draws is a function of the pair below, recomputed on every tick.
//!
//! ```ignore
//! let params = FlameParams::from_input(StreakInput::new(7, 21));
//! assert!((params.flame_height_ratio - 1.0 / 3.0).abs() < 1e-6);
//! ```

/// Number of level markers drawn beside the flame.
pub const LEVEL_MARKER_COUNT: usize = 5;

/// The two host-supplied inputs, read fresh each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakInput {
    /// Current run of consecutive qualifying days.
    pub streak: i64,
    /// Longest run on record. Values below 1 are treated as 1.
    pub max_streak: i64,
}

impl StreakInput {
    pub fn new(streak: i64, max_streak: i64) -> Self {
        Self { streak, max_streak }
    }

    /// `max_streak` clamped to at least 1, so it can be used as a divisor.
    #[inline]
    pub fn safe_max(&self) -> f32 {
        self.max_streak.max(1) as f32
    }
}

/// Per-tick parameters derived from a [`StreakInput`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlameParams {
    /// Flame height as a fraction of the surface height, in `[0, 1]`.
    pub flame_height_ratio: f32,
    /// Emission rate, glow and brightness driver, in `[0, 1]`.
    ///
    /// Saturates at half of the max streak.
    pub intensity: f32,
}

impl FlameParams {
    /// Derive the flame parameters. Never divides by zero and never leaves `[0, 1]`.
    pub fn from_input(input: StreakInput) -> Self {
        let safe_max = input.safe_max();
        let streak = input.streak as f32;

        Self {
            flame_height_ratio: (streak / safe_max).clamp(0.0, 1.0),
            intensity: (streak / (safe_max * 0.5)).clamp(0.0, 1.0),
        }
    }

    /// Core brightness of the flame tip.
    #[inline]
    pub fn core_brightness(&self) -> f32 {
        (self.intensity * 1.5).min(1.0)
    }
}

/// A streak milestone shown beside the flame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelMarker {
    /// Streak needed to reach this level.
    pub level: i64,
    /// Whether the current streak has reached it.
    pub active: bool,
    /// Vertical position from the top, as a fraction of the height.
    pub y_fraction: f32,
}

/// The five level markers, top (the max streak) to bottom.
pub fn level_markers(input: StreakInput) -> [LevelMarker; LEVEL_MARKER_COUNT] {
    let safe_max = input.safe_max();
    std::array::from_fn(|i| {
        let step = i as f32 * 0.2;
        let level = (safe_max * (1.0 - step)).round() as i64;
        LevelMarker {
            level,
            active: input.streak >= level,
            y_fraction: step,
        }
    })
}

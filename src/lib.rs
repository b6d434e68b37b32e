//! # Flamometer
//!
//! A particle flame whose height and intensity show how a current streak
//! compares to the longest one on record.
//!
//! The host supplies two integers, `streak` and `max_streak`. Every tick the
//! engine derives a height ratio and an intensity from them, draws a wobbling
//! flame silhouette with a glow, then advances and draws up to 150 rising
//! particles emitted at the flame's base. When the streak goes up the next
//! tick emits an extra burst.
//!
//! ## Quick Start
//!
//! ```ignore
//! use flamometer::prelude::*;
//!
//! let mut engine = Flamometer::new(FlameConfig::new().with_seed(7));
//! let mut surface = PixelSurface::new(200.0, 384.0, 2.0);
//!
//! for _ in 0..120 {
//!     engine.tick(&mut surface, StreakInput::new(7, 21));
//! }
//! flamometer::export::save_png(&surface, "flame.png")?;
//! ```
//!
//! ## Mounting
//!
//! Hosts that schedule frames themselves mount the engine through
//! [`Mounted`], which owns the frame request and resize subscription and
//! gives both back on [`Mounted::release`] or drop. [`ManualHost`] drives a
//! mount by hand; [`window::run`] opens a native window.
//!
//! ## Parameters
//!
//! | Quantity | Formula |
//! |----------|---------|
//! | height ratio | `clamp(streak / max(1, max_streak), 0, 1)` |
//! | intensity | `clamp(streak / (max(1, max_streak) / 2), 0, 1)` |
//! | flame height | `height × ratio × 0.95` |
//! | flame width | `width × 0.6` |
//!
//! ## Features
//!
//! - `egui` adds an overlay to the native window with the streak counter,
//!   level markers and live controls.

pub mod emitter;
pub mod error;
pub mod export;
pub mod flame;
pub mod gpu;
pub mod host;
#[cfg(feature = "egui")]
pub mod overlay;
pub mod params;
pub mod particle;
mod simulation;
pub mod surface;
pub mod time;
pub mod visuals;
pub mod window;

pub use emitter::Emitter;
pub use error::{ExportError, GpuError, HostError};
pub use glam::{Vec2, Vec3, Vec4};
pub use host::{Host, ManualHost, Mounted, StreakSource};
pub use params::{level_markers, FlameParams, LevelMarker, StreakInput};
pub use particle::Particle;
pub use simulation::{FlameConfig, Flamometer, TickReport, MAX_PARTICLE_CAP};
pub use surface::{Path, PixelSurface, Surface};
pub use visuals::{BlendMode, HotPalette, Paint, Rgba};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use flamometer::prelude::*;
/// ```
pub mod prelude {
    pub use crate::host::{Host, ManualHost, Mounted, StreakSource};
    pub use crate::params::{FlameParams, StreakInput};
    pub use crate::simulation::{FlameConfig, Flamometer, TickReport};
    pub use crate::surface::{PixelSurface, Surface};
    pub use crate::visuals::BlendMode;
    pub use crate::Vec2;
}

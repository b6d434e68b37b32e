//! The procedural flame silhouette drawn beneath the particles.
//!
//! The silhouette is a closed path from the bottom-left of the flame to its
//! peak and back down to the bottom-right, made of two quadratic curves. Its
//! control points wobble sinusoidally with the tick index, so the flame
//! sways without any stored state.

use glam::Vec2;

use crate::params::FlameParams;
use crate::surface::Path;
use crate::visuals::{GradientStop, LinearGradient, Paint, RadialGradient, Rgba, Shadow};

/// The flame never quite reaches the top of the surface.
const MAX_HEIGHT_FRACTION: f32 = 0.95;
/// Flame width as a fraction of the surface width.
const WIDTH_FRACTION: f32 = 0.6;
/// Glow blur radius at full intensity, in logical pixels.
const MAX_GLOW_BLUR: f32 = 30.0;

/// Flame dimensions for one tick, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlameGeometry {
    pub width: f32,
    pub height: f32,
    /// Height of the flame above the bottom edge.
    pub base_height: f32,
    pub flame_width: f32,
}

impl FlameGeometry {
    pub fn new(width: f32, height: f32, params: FlameParams) -> Self {
        let width = width.max(0.0);
        let height = height.max(0.0);
        Self {
            width,
            height,
            base_height: height * params.flame_height_ratio * MAX_HEIGHT_FRACTION,
            flame_width: width * WIDTH_FRACTION,
        }
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.width * 0.5
    }

    /// Y coordinate of the flame peak (before wobble).
    #[inline]
    pub fn top_y(&self) -> f32 {
        self.height - self.base_height
    }

    /// Whether there is any flame to draw.
    #[inline]
    pub fn is_lit(&self) -> bool {
        self.base_height > 0.0
    }
}

/// Horizontal wobble offsets `(sides, peak)` for a tick.
///
/// The first moves the two curve control points in opposite directions, the
/// second shifts the peak. Both vanish at zero intensity.
pub fn wobble(frame: u64, flame_width: f32, intensity: f32) -> (f32, f32) {
    let t = frame as f32;
    let sides = (t * 0.05).sin() * (flame_width * 0.05) * intensity;
    let peak = (t * 0.07).cos() * (flame_width * 0.04) * intensity;
    (sides, peak)
}

/// A fully described flame body: outline, fill and glow.
#[derive(Debug, Clone, PartialEq)]
pub struct FlameSilhouette {
    pub path: Path,
    pub paint: Paint,
    pub shadow: Shadow,
    /// Peak of the flame, after wobble.
    pub peak: Vec2,
}

impl FlameSilhouette {
    /// Build the silhouette for tick `frame`. `None` when the flame is out.
    pub fn build(geometry: &FlameGeometry, params: FlameParams, frame: u64) -> Option<Self> {
        if !geometry.is_lit() {
            return None;
        }

        let FlameGeometry { width, height, flame_width, .. } = *geometry;
        let cx = width * 0.5;
        let top_y = geometry.top_y();
        let intensity = params.intensity;
        let (sides, peak_shift) = wobble(frame, flame_width, intensity);

        let control_y = height * 0.6 + top_y * 0.4;
        let peak = Vec2::new(cx + peak_shift, top_y);

        let mut path = Path::new();
        path.move_to(Vec2::new(cx - flame_width * 0.5, height));
        path.quad_to(Vec2::new(cx - flame_width * 0.3 + sides, control_y), peak);
        path.quad_to(
            Vec2::new(cx + flame_width * 0.3 - sides, control_y),
            Vec2::new(cx + flame_width * 0.5, height),
        );
        path.close();

        let core = params.core_brightness();
        let gradient = LinearGradient::new(
            Vec2::new(cx, height),
            Vec2::new(cx, top_y),
            vec![
                GradientStop::new(0.0, Rgba::from_rgb8(255, 100, 0, intensity * 0.8)),
                GradientStop::new(0.3, Rgba::from_rgb8(255, 180, 0, intensity * 0.9)),
                GradientStop::new(0.7, Rgba::from_rgb8(255, 230, 150, core)),
                GradientStop::new(1.0, Rgba::from_rgb8(255, 255, 240, core * 0.8)),
            ],
        );

        let shadow = Shadow {
            color: Rgba::from_rgb8(255, 100, 0, intensity * 0.7),
            blur: MAX_GLOW_BLUR * intensity,
        };

        Some(Self {
            path,
            paint: Paint::Linear(gradient),
            shadow,
            peak,
        })
    }
}

/// Soft orange glow behind the flame, centred at the flame's height.
///
/// Sized like a CSS `radial-gradient(circle ...)`: the gradient ray reaches
/// the farthest corner and fades out at 70% of it.
pub fn backdrop_glow(width: f32, height: f32, params: FlameParams) -> Paint {
    let center = Vec2::new(width * 0.5, height * (1.0 - params.flame_height_ratio));
    let far_x = center.x.max(width - center.x);
    let far_y = center.y.max(height - center.y);
    let radius = Vec2::new(far_x, far_y).length();

    Paint::Radial(RadialGradient::new(
        center,
        radius,
        vec![
            GradientStop::new(0.0, Rgba::from_rgb8(255, 100, 0, params.intensity * 0.4)),
            GradientStop::new(0.7, Rgba::from_rgb8(255, 100, 0, 0.0)),
        ],
    ))
}

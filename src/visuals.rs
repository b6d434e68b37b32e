//! Colors, paints and blend modes used when drawing the flame.
//!
//! These types describe *what* gets drawn; the [`surface`](crate::surface)
//! module hands them to the rasterizer.
//!
//! # Usage
//!
//! ```ignore
//! let glow = Paint::Linear(LinearGradient::new(
//!     Vec2::new(50.0, 200.0),
//!     Vec2::new(50.0, 20.0),
//!     vec![
//!         GradientStop::new(0.0, Rgba::from_rgb8(255, 100, 0, 0.8)),
//!         GradientStop::new(1.0, Rgba::from_rgb8(255, 255, 240, 0.8)),
//!     ],
//! ));
//! surface.set_blend_mode(BlendMode::Lighter);
//! ```

use glam::{Vec2, Vec3};

/// A color with straight (non-premultiplied) alpha. All channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Rgba = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a: a.clamp(0.0, 1.0) }
    }

    /// Build from 8-bit channel values and a `[0, 1]` alpha, CSS `rgba()` style.
    pub fn from_rgb8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a)
    }

    /// Build from an RGB vector in `[0, 1]` and an alpha.
    pub fn from_vec3(rgb: Vec3, a: f32) -> Self {
        Self::new(rgb.x, rgb.y, rgb.z, a)
    }

}

/// How a drawn color combines with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Standard alpha compositing (default).
    ///
    /// The source is painted over the destination according to its alpha.
    #[default]
    SourceOver,

    /// Additive blending.
    ///
    /// Source and destination are summed and clamped, so overlapping
    /// particles brighten instead of hiding one another.
    Lighter,
}

/// The weighted set of "hot" starting colors particles are born with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotPalette {
    /// 30% of particles.
    WhiteYellow,
    /// 40% of particles.
    YellowOrange,
    /// 30% of particles.
    Orange,
}

impl HotPalette {
    /// Pick a palette entry from a uniform roll in `[0, 1)`.
    pub fn pick(roll: f32) -> Self {
        if roll > 0.7 {
            HotPalette::WhiteYellow
        } else if roll > 0.3 {
            HotPalette::YellowOrange
        } else {
            HotPalette::Orange
        }
    }

    /// RGB in `[0, 1]`.
    pub fn color(&self) -> Vec3 {
        match self {
            HotPalette::WhiteYellow => Vec3::new(1.0, 1.0, 200.0 / 255.0),
            HotPalette::YellowOrange => Vec3::new(1.0, 200.0 / 255.0, 50.0 / 255.0),
            HotPalette::Orange => Vec3::new(1.0, 130.0 / 255.0, 0.0),
        }
    }
}

/// One color stop of a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient in `[0, 1]`.
    pub offset: f32,
    pub color: Rgba,
}

impl GradientStop {
    pub fn new(offset: f32, color: Rgba) -> Self {
        Self { offset: offset.clamp(0.0, 1.0), color }
    }
}

/// A gradient along the line from `start` to `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub start: Vec2,
    pub end: Vec2,
    stops: Vec<GradientStop>,
}

impl LinearGradient {
    /// Stops are sorted by offset.
    pub fn new(start: Vec2, end: Vec2, mut stops: Vec<GradientStop>) -> Self {
        stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Self { start, end, stops }
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }
}

/// A circular gradient from `center` out to `radius`.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub center: Vec2,
    pub radius: f32,
    stops: Vec<GradientStop>,
}

impl RadialGradient {
    pub fn new(center: Vec2, radius: f32, mut stops: Vec<GradientStop>) -> Self {
        stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Self { center, radius, stops }
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }
}

/// What a filled shape is painted with.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Linear(LinearGradient),
    Radial(RadialGradient),
}

/// A soft drop shadow drawn beneath a filled shape; used as the flame's glow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Rgba,
    /// Blur radius in logical pixels. The blur's standard deviation is half of it.
    pub blur: f32,
}

impl Shadow {
    /// Whether drawing this shadow would change any pixel.
    pub fn is_visible(&self) -> bool {
        self.color.a > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hot_palette_weights() {
        assert_eq!(HotPalette::pick(0.95), HotPalette::WhiteYellow);
        assert_eq!(HotPalette::pick(0.7), HotPalette::YellowOrange);
        assert_eq!(HotPalette::pick(0.31), HotPalette::YellowOrange);
        assert_eq!(HotPalette::pick(0.3), HotPalette::Orange);
        assert_eq!(HotPalette::pick(0.0), HotPalette::Orange);
        assert_eq!(HotPalette::Orange.color().z, 0.0);
    }

    #[test]
    fn test_gradient_stops_sorted_and_clamped() {
        let g = LinearGradient::new(
            Vec2::new(0.0, 100.0),
            Vec2::new(0.0, 0.0),
            vec![
                GradientStop::new(1.5, Rgba::new(1.0, 1.0, 1.0, 1.0)),
                GradientStop::new(0.0, Rgba::TRANSPARENT),
            ],
        );
        let offsets: Vec<f32> = g.stops().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 1.0]);

        let r = RadialGradient::new(
            Vec2::ZERO,
            10.0,
            vec![
                GradientStop::new(0.7, Rgba::TRANSPARENT),
                GradientStop::new(-1.0, Rgba::new(1.0, 0.4, 0.0, 0.4)),
            ],
        );
        assert_eq!(r.stops()[0].color.a, 0.4);
        assert_eq!(r.stops()[1].offset, 0.7);
    }

    #[test]
    fn test_shadow_visibility() {
        let shadow = Shadow { color: Rgba::from_rgb8(255, 100, 0, 0.0), blur: 30.0 };
        assert!(!shadow.is_visible());
        assert!(Shadow { color: Rgba::from_rgb8(255, 100, 0, 0.7), ..shadow }.is_visible());
    }

    #[test]
    fn test_alpha_clamped() {
        assert_eq!(Rgba::new(1.0, 1.0, 1.0, 3.0).a, 1.0);
        assert_eq!(Rgba::from_rgb8(255, 0, 0, -1.0).a, 0.0);
        assert_eq!(Rgba::from_vec3(Vec3::ONE, 0.5).a, 0.5);
    }
}

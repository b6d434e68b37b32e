//! Drawing surfaces.
//!
//! The engine draws through the [`Surface`] trait, in *logical* pixels. A
//! surface maps those onto its own backing store, which for a high-density
//! display holds `logical × scale factor` physical pixels.
//!
//! [`PixelSurface`] is the software implementation, a [`tiny_skia::Pixmap`]
//! drawn with a scale transform. The flame glow is rendered on a separate
//! layer and blurred with [`image::imageops::blur`]. The window host uploads
//! the pixmap to the GPU every frame, the headless renderer writes it to a PNG.

use std::fmt;

use glam::{Vec2, Vec4};
use image::{imageops, GrayImage};
use tiny_skia as sk;

use crate::visuals::{BlendMode, GradientStop, Paint, Rgba, Shadow};

/// Below this the glow layer is composited unblurred.
const MIN_BLUR_SIGMA: f32 = 0.5;

/// One step of a [`Path`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo { ctrl: Vec2, to: Vec2 },
    Close,
}

/// A 2D outline built from lines and quadratic curves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, p: Vec2) -> &mut Self {
        self.commands.push(PathCommand::MoveTo(p));
        self
    }

    pub fn line_to(&mut self, p: Vec2) -> &mut Self {
        self.commands.push(PathCommand::LineTo(p));
        self
    }

    pub fn quad_to(&mut self, ctrl: Vec2, to: Vec2) -> &mut Self {
        self.commands.push(PathCommand::QuadTo { ctrl, to });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.commands.push(PathCommand::Close);
        self
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Replay the commands into a tiny-skia path. `None` when nothing encloses area.
    fn to_skia(&self) -> Option<sk::Path> {
        let mut builder = sk::PathBuilder::new();
        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(p) => builder.move_to(p.x, p.y),
                PathCommand::LineTo(p) => builder.line_to(p.x, p.y),
                PathCommand::QuadTo { ctrl, to } => builder.quad_to(ctrl.x, ctrl.y, to.x, to.y),
                PathCommand::Close => builder.close(),
            }
        }
        builder.finish()
    }
}

/// Something the engine can draw a frame onto.
///
/// All coordinates are logical pixels with the origin at the top-left.
pub trait Surface {
    /// Current size in logical pixels.
    fn logical_size(&self) -> Vec2;

    /// Resize to `logical` pixels at `scale_factor` physical pixels each.
    ///
    /// The contents are discarded, as with an HTML canvas.
    fn resize(&mut self, logical: Vec2, scale_factor: f32);

    /// Make every pixel transparent.
    fn clear(&mut self);

    fn blend_mode(&self) -> BlendMode;

    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Fill the whole surface with `paint`.
    fn fill_rect(&mut self, paint: &Paint);

    /// Fill a closed path, drawing `shadow` beneath it first.
    fn fill_path(&mut self, path: &Path, paint: &Paint, shadow: Option<&Shadow>);

    /// Fill an anti-aliased disc.
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);
}

impl From<BlendMode> for sk::BlendMode {
    fn from(mode: BlendMode) -> Self {
        match mode {
            BlendMode::SourceOver => sk::BlendMode::SourceOver,
            BlendMode::Lighter => sk::BlendMode::Plus,
        }
    }
}

fn sk_color(c: Rgba) -> sk::Color {
    sk::Color::from_rgba(
        c.r.clamp(0.0, 1.0),
        c.g.clamp(0.0, 1.0),
        c.b.clamp(0.0, 1.0),
        c.a.clamp(0.0, 1.0),
    )
    .unwrap_or(sk::Color::TRANSPARENT)
}

fn sk_point(p: Vec2) -> sk::Point {
    sk::Point::from_xy(p.x, p.y)
}

fn sk_stops(stops: &[GradientStop]) -> Vec<sk::GradientStop> {
    stops
        .iter()
        .map(|s| sk::GradientStop::new(s.offset, sk_color(s.color)))
        .collect()
}

/// Shader for a paint in logical coordinates. `None` for a degenerate gradient.
fn sk_shader(paint: &Paint) -> Option<sk::Shader<'static>> {
    match paint {
        Paint::Solid(c) => Some(sk::Shader::SolidColor(sk_color(*c))),
        Paint::Linear(g) => sk::LinearGradient::new(
            sk_point(g.start),
            sk_point(g.end),
            sk_stops(g.stops()),
            sk::SpreadMode::Pad,
            sk::Transform::identity(),
        ),
        Paint::Radial(g) => sk::RadialGradient::new(
            sk_point(g.center),
            sk_point(g.center),
            g.radius,
            sk_stops(g.stops()),
            sk::SpreadMode::Pad,
            sk::Transform::identity(),
        ),
    }
}

/// Premultiply one channel in `[0, 1]` by an 8-bit alpha.
#[inline]
fn premultiply(channel: f32, alpha: u8) -> u8 {
    (channel.clamp(0.0, 1.0) * alpha as f32).round() as u8
}

/// Software surface backed by a premultiplied RGBA8 pixmap.
#[derive(Clone)]
pub struct PixelSurface {
    logical: Vec2,
    scale: f32,
    /// `None` while either physical dimension is zero.
    pixmap: Option<sk::Pixmap>,
    blend: BlendMode,
}

impl fmt::Debug for PixelSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelSurface")
            .field("logical", &self.logical)
            .field("scale", &self.scale)
            .field("physical", &self.physical_size())
            .field("blend", &self.blend)
            .finish()
    }
}

impl PixelSurface {
    /// Create a cleared surface of `width × height` logical pixels.
    pub fn new(width: f32, height: f32, scale_factor: f32) -> Self {
        let mut surface = Self {
            logical: Vec2::ZERO,
            scale: 1.0,
            pixmap: None,
            blend: BlendMode::default(),
        };
        surface.resize(Vec2::new(width, height), scale_factor);
        surface
    }

    /// Backing store size in physical pixels.
    #[inline]
    pub fn physical_size(&self) -> (u32, u32) {
        self.pixmap
            .as_ref()
            .map_or((0, 0), |p| (p.width(), p.height()))
    }

    #[inline]
    pub fn scale_factor(&self) -> f32 {
        self.scale
    }

    /// Premultiplied color of a physical pixel in `[0, 1]`, `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec4> {
        let p = self.pixmap.as_ref()?.pixel(x, y)?;
        Some(Vec4::new(p.red() as f32, p.green() as f32, p.blue() as f32, p.alpha() as f32) / 255.0)
    }

    /// 8-bit RGBA with straight alpha, row-major.
    pub fn to_rgba8(&self) -> Vec<[u8; 4]> {
        self.pixmap.as_ref().map_or_else(Vec::new, |pixmap| {
            pixmap
                .pixels()
                .iter()
                .map(|p| {
                    let c = p.demultiply();
                    [c.red(), c.green(), c.blue(), c.alpha()]
                })
                .collect()
        })
    }

    /// Raw premultiplied RGBA8 bytes, row-major. Over black this is the visible image.
    pub fn premultiplied_bytes(&self) -> &[u8] {
        match &self.pixmap {
            Some(pixmap) => pixmap.data(),
            None => &[],
        }
    }

    /// Sum of alpha over every pixel; a cheap "how much is drawn".
    pub fn coverage(&self) -> f32 {
        self.pixmap.as_ref().map_or(0.0, |pixmap| {
            pixmap.pixels().iter().map(|p| p.alpha() as f32 / 255.0).sum()
        })
    }

    #[inline]
    fn transform(&self) -> sk::Transform {
        sk::Transform::from_scale(self.scale, self.scale)
    }

    fn sk_paint(&self, shader: sk::Shader<'static>) -> sk::Paint<'static> {
        sk::Paint {
            shader,
            blend_mode: self.blend.into(),
            anti_alias: true,
            ..sk::Paint::default()
        }
    }

    /// Render `path` on its own layer in the shadow color, blur it and
    /// composite it with the current blend mode.
    ///
    /// The layer's alpha is the shape's own coverage times its paint alpha,
    /// as with a canvas `shadowBlur`.
    fn draw_shadow(&mut self, path: &sk::Path, shader: &sk::Shader<'static>, shadow: &Shadow) {
        let transform = self.transform();
        let sigma = shadow.blur * 0.5 * self.scale;
        let blend = self.blend;
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };
        let (width, height) = (pixmap.width(), pixmap.height());
        let Some(mut layer) = sk::Pixmap::new(width, height) else {
            return;
        };

        let shape = sk::Paint {
            shader: shader.clone(),
            anti_alias: true,
            ..sk::Paint::default()
        };
        layer.fill_path(path, &shape, sk::FillRule::Winding, transform, None);

        let alpha: Vec<u8> = layer.pixels().iter().map(|p| p.alpha()).collect();
        let Some(alpha) = GrayImage::from_raw(width, height, alpha) else {
            return;
        };
        let alpha = if sigma >= MIN_BLUR_SIGMA {
            imageops::blur(&alpha, sigma)
        } else {
            alpha
        };

        let color = shadow.color;
        for (px, a) in layer.pixels_mut().iter_mut().zip(alpha.pixels()) {
            let a = (a[0] as f32 * color.a).round() as u8;
            *px = sk::PremultipliedColorU8::from_rgba(
                premultiply(color.r, a),
                premultiply(color.g, a),
                premultiply(color.b, a),
                a,
            )
            .unwrap_or(sk::PremultipliedColorU8::TRANSPARENT);
        }

        let paint = sk::PixmapPaint {
            blend_mode: blend.into(),
            ..sk::PixmapPaint::default()
        };
        pixmap.draw_pixmap(0, 0, layer.as_ref(), &paint, sk::Transform::identity(), None);
    }
}

impl Surface for PixelSurface {
    fn logical_size(&self) -> Vec2 {
        self.logical
    }

    fn resize(&mut self, logical: Vec2, scale_factor: f32) {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        let logical = logical.max(Vec2::ZERO);
        self.logical = logical;
        self.scale = scale;
        let width = (logical.x * scale).round() as u32;
        let height = (logical.y * scale).round() as u32;
        self.pixmap = sk::Pixmap::new(width, height);
    }

    fn clear(&mut self) {
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill(sk::Color::TRANSPARENT);
        }
    }

    fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    fn fill_rect(&mut self, paint: &Paint) {
        let Some(rect) = sk::Rect::from_xywh(0.0, 0.0, self.logical.x, self.logical.y) else {
            return;
        };
        let Some(shader) = sk_shader(paint) else {
            return;
        };
        let paint = self.sk_paint(shader);
        let transform = self.transform();
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill_rect(rect, &paint, transform, None);
        }
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint, shadow: Option<&Shadow>) {
        let (Some(path), Some(shader)) = (path.to_skia(), sk_shader(paint)) else {
            return;
        };

        if let Some(shadow) = shadow.filter(|s| s.is_visible()) {
            self.draw_shadow(&path, &shader, shadow);
        }

        let paint = self.sk_paint(shader);
        let transform = self.transform();
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill_path(&path, &paint, sk::FillRule::Winding, transform, None);
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if color.a <= 0.0 {
            return;
        }
        let Some(circle) = sk::PathBuilder::from_circle(center.x, center.y, radius) else {
            return;
        };
        let paint = self.sk_paint(sk::Shader::SolidColor(sk_color(color)));
        let transform = self.transform();
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill_path(&circle, &paint, sk::FillRule::Winding, transform, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One channel step of an 8-bit buffer, plus rounding slack.
    const EPS: f32 = 2.0 / 255.0;

    fn square(size: f32) -> Path {
        let mut p = Path::new();
        p.move_to(Vec2::new(0.0, 0.0))
            .line_to(Vec2::new(size, 0.0))
            .line_to(Vec2::new(size, size))
            .line_to(Vec2::new(0.0, size))
            .close();
        p
    }

    fn near(a: Vec4, b: Vec4) -> bool {
        a.abs_diff_eq(b, EPS)
    }

    #[test]
    fn test_quad_curve_peaks_halfway() {
        // The curve peaks halfway to its control point.
        let mut p = Path::new();
        p.move_to(Vec2::ZERO)
            .quad_to(Vec2::new(10.0, 20.0), Vec2::new(20.0, 0.0))
            .close();
        let mut s = PixelSurface::new(24.0, 24.0, 1.0);
        s.fill_path(&p, &Paint::Solid(Rgba::new(1.0, 1.0, 1.0, 1.0)), None);

        assert!(s.pixel(10, 5).unwrap().w > 0.99);
        assert_eq!(s.pixel(10, 15).unwrap().w, 0.0);
    }

    #[test]
    fn test_empty_path_draws_nothing() {
        let mut s = PixelSurface::new(8.0, 8.0, 1.0);
        s.fill_path(&Path::new(), &Paint::Solid(Rgba::new(1.0, 1.0, 1.0, 1.0)), None);
        assert_eq!(s.coverage(), 0.0);
    }

    #[test]
    fn test_resize_applies_scale_factor() {
        let mut s = PixelSurface::new(100.0, 50.0, 1.0);
        assert_eq!(s.physical_size(), (100, 50));
        s.resize(Vec2::new(200.0, 384.0), 2.0);
        assert_eq!(s.physical_size(), (400, 768));
        assert_eq!(s.logical_size(), Vec2::new(200.0, 384.0));

        s.resize(Vec2::new(10.0, 10.0), f32::NAN);
        assert_eq!(s.scale_factor(), 1.0);
    }

    #[test]
    fn test_fill_square() {
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let mut s = PixelSurface::new(8.0, 8.0, 1.0);
        s.fill_path(&square(4.0), &Paint::Solid(Rgba::new(1.0, 0.0, 0.0, 1.0)), None);
        assert!(near(s.pixel(1, 1).unwrap(), red));
        assert!(near(s.pixel(3, 3).unwrap(), red));
        assert_eq!(s.pixel(5, 5), Some(Vec4::ZERO));
        assert!((s.coverage() - 16.0).abs() < 0.5, "{}", s.coverage());
    }

    #[test]
    fn test_scale_factor_scales_drawing() {
        let mut s = PixelSurface::new(8.0, 8.0, 2.0);
        s.fill_path(&square(4.0), &Paint::Solid(Rgba::new(1.0, 1.0, 1.0, 1.0)), None);
        assert!(s.pixel(7, 7).unwrap().w > 0.99);
        assert_eq!(s.pixel(9, 9).unwrap().w, 0.0);
        assert!((s.coverage() - 64.0).abs() < 1.0);
    }

    #[test]
    fn test_fill_half_pixel_edge_is_antialiased() {
        let mut s = PixelSurface::new(4.0, 4.0, 1.0);
        s.fill_path(&square(2.5), &Paint::Solid(Rgba::new(1.0, 1.0, 1.0, 1.0)), None);
        let edge = s.pixel(2, 0).unwrap();
        assert!((edge.w - 0.5).abs() < 0.1, "{edge:?}");
    }

    #[test]
    fn test_shadow_spreads_beyond_shape() {
        let mut s = PixelSurface::new(60.0, 60.0, 1.0);
        let mut p = Path::new();
        p.move_to(Vec2::new(25.0, 25.0))
            .line_to(Vec2::new(35.0, 25.0))
            .line_to(Vec2::new(35.0, 35.0))
            .line_to(Vec2::new(25.0, 35.0))
            .close();
        let shadow = Shadow {
            color: Rgba::new(1.0, 0.4, 0.0, 1.0),
            blur: 10.0,
        };
        s.fill_path(&p, &Paint::Solid(Rgba::new(1.0, 1.0, 1.0, 1.0)), Some(&shadow));
        let outside = s.pixel(22, 30).unwrap();
        assert!(outside.w > 0.0);
        assert!(outside.x > outside.y);
        assert_eq!(s.pixel(0, 0).unwrap().w, 0.0);
        assert!(near(s.pixel(30, 30).unwrap(), Vec4::ONE));
    }

    #[test]
    fn test_invisible_shadow_is_skipped() {
        let shadow = Shadow {
            color: Rgba::TRANSPARENT,
            blur: 10.0,
        };
        let mut with = PixelSurface::new(20.0, 20.0, 1.0);
        let mut without = PixelSurface::new(20.0, 20.0, 1.0);
        let paint = Paint::Solid(Rgba::new(1.0, 1.0, 1.0, 1.0));
        with.fill_path(&square(5.0), &paint, Some(&shadow));
        without.fill_path(&square(5.0), &paint, None);
        assert_eq!(with.to_rgba8(), without.to_rgba8());
    }

    #[test]
    fn test_circle_coverage_roughly_matches_area() {
        let mut s = PixelSurface::new(32.0, 32.0, 1.0);
        s.fill_circle(Vec2::new(16.0, 16.0), 5.0, Rgba::new(1.0, 1.0, 1.0, 1.0));
        let area = std::f32::consts::PI * 25.0;
        assert!((s.coverage() - area).abs() < area * 0.05, "{}", s.coverage());
    }

    #[test]
    fn test_additive_overlap_brightens() {
        let color = Rgba::new(0.5, 0.25, 0.0, 0.8);

        let mut over = PixelSurface::new(16.0, 16.0, 1.0);
        over.fill_circle(Vec2::new(8.0, 8.0), 4.0, color);
        over.fill_circle(Vec2::new(8.0, 8.0), 4.0, color);

        let mut lighter = PixelSurface::new(16.0, 16.0, 1.0);
        lighter.set_blend_mode(BlendMode::Lighter);
        lighter.fill_circle(Vec2::new(8.0, 8.0), 4.0, color);
        lighter.fill_circle(Vec2::new(8.0, 8.0), 4.0, color);

        let a = over.pixel(8, 8).unwrap();
        let b = lighter.pixel(8, 8).unwrap();
        assert!(b.x > a.x);
        assert!((b.x - 0.8).abs() < EPS);
        // Source-over never exceeds the brighter of the two inputs.
        assert!(a.x <= 0.5 + EPS);
    }

    #[test]
    fn test_lighter_saturates() {
        let mut s = PixelSurface::new(4.0, 4.0, 1.0);
        s.set_blend_mode(BlendMode::Lighter);
        for _ in 0..3 {
            s.fill_rect(&Paint::Solid(Rgba::new(0.6, 0.2, 0.0, 1.0)));
        }
        let p = s.pixel(1, 1).unwrap();
        assert_eq!(p.x, 1.0);
        assert!((p.y - 0.6).abs() < EPS);
        assert_eq!(p.w, 1.0);
    }

    #[test]
    fn test_linear_gradient_fill() {
        let paint = Paint::Linear(crate::visuals::LinearGradient::new(
            Vec2::new(0.0, 10.0),
            Vec2::new(0.0, 0.0),
            vec![
                GradientStop::new(0.0, Rgba::new(1.0, 1.0, 1.0, 0.0)),
                GradientStop::new(1.0, Rgba::new(1.0, 1.0, 1.0, 1.0)),
            ],
        ));
        let mut s = PixelSurface::new(4.0, 10.0, 1.0);
        s.fill_rect(&paint);
        let top = s.pixel(1, 0).unwrap().w;
        let mid = s.pixel(1, 5).unwrap().w;
        let bottom = s.pixel(1, 9).unwrap().w;
        assert!(top > mid && mid > bottom);
        assert!((mid - 0.45).abs() < 0.05, "{mid}");
    }

    #[test]
    fn test_clear_and_zero_size() {
        let mut s = PixelSurface::new(4.0, 4.0, 1.0);
        s.fill_rect(&Paint::Solid(Rgba::new(1.0, 1.0, 1.0, 1.0)));
        assert!((s.coverage() - 16.0).abs() < 1e-3);
        s.clear();
        assert_eq!(s.coverage(), 0.0);

        let mut empty = PixelSurface::new(0.0, 0.0, 2.0);
        empty.fill_circle(Vec2::ZERO, 3.0, Rgba::new(1.0, 1.0, 1.0, 1.0));
        empty.fill_path(&square(3.0), &Paint::Solid(Rgba::TRANSPARENT), None);
        empty.fill_rect(&Paint::Solid(Rgba::new(1.0, 1.0, 1.0, 1.0)));
        assert_eq!(empty.physical_size(), (0, 0));
        assert!(empty.to_rgba8().is_empty());
        assert!(empty.premultiplied_bytes().is_empty());
        assert_eq!(empty.pixel(0, 0), None);
    }

    #[test]
    fn test_rgba8_unpremultiplies() {
        let mut s = PixelSurface::new(1.0, 1.0, 1.0);
        s.fill_rect(&Paint::Solid(Rgba::new(1.0, 0.5, 0.0, 0.5)));
        let close = |a: [u8; 4], b: [u8; 4]| a.iter().zip(b).all(|(x, y)| (*x as i32 - y as i32).abs() <= 2);
        let straight = s.to_rgba8()[0];
        let bytes = s.premultiplied_bytes();
        let premul = [bytes[0], bytes[1], bytes[2], bytes[3]];
        assert!(close(straight, [255, 128, 0, 128]), "{straight:?}");
        assert!(close(premul, [128, 64, 0, 128]), "{premul:?}");
    }
}

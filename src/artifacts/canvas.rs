//! Minimal raster drawing on top of `image::RgbImage`.

use std::path::Path;

use image::{Rgb, RgbImage};

use super::ArtifactError;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const GRID: Rgb<u8> = Rgb([225, 225, 225]);
pub const MUTED: Rgb<u8> = Rgb([128, 128, 128]);

/// Opaque RGB canvas with coverage-blended primitives.
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, background),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.image.get_pixel(x, y)
    }

    /// Mix `color` into one pixel by `coverage`; out-of-bounds is ignored.
    pub fn blend(&mut self, x: i64, y: i64, color: Rgb<u8>, coverage: f32) {
        if coverage <= 0.0 || x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.image.width() || y >= self.image.height() {
            return;
        }
        let coverage = coverage.clamp(0.0, 1.0);
        let pixel = self.image.get_pixel_mut(x, y);
        for channel in 0..3 {
            let existing = pixel.0[channel] as f32;
            let target = color.0[channel] as f32;
            pixel.0[channel] = (existing + (target - existing) * coverage).round() as u8;
        }
    }

    /// Anti-aliased line (Wu's algorithm).
    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb<u8>) {
        let (mut x0, mut y0) = from;
        let (mut x1, mut y1) = to;
        let steep = (y1 - y0).abs() > (x1 - x0).abs();
        if steep {
            std::mem::swap(&mut x0, &mut y0);
            std::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            std::mem::swap(&mut x0, &mut x1);
            std::mem::swap(&mut y0, &mut y1);
        }
        let plot = |canvas: &mut Self, a: f32, b: f32, coverage: f32| {
            let (px, py) = if steep { (b, a) } else { (a, b) };
            canvas.blend(px as i64, py as i64, color, coverage);
        };
        let dx = x1 - x0;
        if dx.abs() < f32::EPSILON {
            plot(self, x0.round(), y0.round(), 1.0);
            return;
        }
        let gradient = (y1 - y0) / dx;
        let start = x0.round();
        let end = x1.round();
        let mut y = y0 + gradient * (start - x0);
        let mut x = start;
        while x <= end {
            let base = y.floor();
            let frac = y - base;
            plot(self, x, base, 1.0 - frac);
            plot(self, x, base + 1.0, frac);
            y += gradient;
            x += 1.0;
        }
    }

    /// Line widened by drawing parallel offsets.
    pub fn thick_line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb<u8>, width: f32) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len = (dx * dx + dy * dy).sqrt();
        if len < f32::EPSILON || width <= 1.0 {
            self.line(from, to, color);
            return;
        }
        let (nx, ny) = (-dy / len, dx / len);
        let steps = (width.ceil() as i32).max(1);
        for step in 0..steps {
            let offset = step as f32 - (steps - 1) as f32 / 2.0;
            self.line(
                (from.0 + nx * offset, from.1 + ny * offset),
                (to.0 + nx * offset, to.1 + ny * offset),
                color,
            );
        }
    }

    /// Line drawn as alternating `dash`-pixel segments.
    pub fn dashed_line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb<u8>, dash: f32) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len = (dx * dx + dy * dy).sqrt();
        if len < f32::EPSILON || dash <= 0.0 {
            return;
        }
        let mut t = 0.0f32;
        while t < len {
            let end = (t + dash).min(len);
            self.line(
                (from.0 + dx * t / len, from.1 + dy * t / len),
                (from.0 + dx * end / len, from.1 + dy * end / len),
                color,
            );
            t += dash * 2.0;
        }
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgb<u8>) {
        for row in y..y + i64::from(height) {
            for col in x..x + i64::from(width) {
                self.blend(col, row, color, 1.0);
            }
        }
    }

    pub fn stroke_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgb<u8>) {
        if width == 0 || height == 0 {
            return;
        }
        let right = x + i64::from(width) - 1;
        let bottom = y + i64::from(height) - 1;
        for col in x..=right {
            self.blend(col, y, color, 1.0);
            self.blend(col, bottom, color, 1.0);
        }
        for row in y..=bottom {
            self.blend(x, row, color, 1.0);
            self.blend(right, row, color, 1.0);
        }
    }

    pub fn save_png(&self, path: &Path) -> Result<(), ArtifactError> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|source| ArtifactError::Image {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

/// Linear mix of two colors, `t = 0` gives `a`.
pub fn mix(a: Rgb<u8>, b: Rgb<u8>, t: f32) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let channel = |i: usize| (a.0[i] as f32 + (b.0[i] as f32 - a.0[i] as f32) * t).round() as u8;
    Rgb([channel(0), channel(1), channel(2)])
}

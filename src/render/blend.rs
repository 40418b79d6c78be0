//! Source-over compositing for shapes rasterized by embedded-graphics.
//!
//! Primitives are first rasterized into a [`CoverageMask`], then blended into
//! a premultiplied 32-bit buffer in one pass, so translucent shapes built from
//! overlapping pieces (a line plus its round caps) blend every pixel once.

use std::convert::Infallible;

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_6X12, FONT_7X13};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use glam::Vec2;

use crate::render::PixelLayout;

/// Pixels touched by the primitives drawn since the last composite
pub struct CoverageMask {
    width: u32,
    height: u32,
    covered: Vec<bool>,
    // Inclusive bounds of the covered pixels
    dirty: Option<(Point, Point)>,
}

impl CoverageMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            covered: vec![false; width as usize * height as usize],
            dirty: None,
        }
    }

    pub fn is_covered(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|i| self.covered[i])
    }

    /// Number of covered pixels
    pub fn coverage(&self) -> usize {
        self.covered.iter().filter(|&&c| c).count()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Blend `color` (straight RGBA) over every covered pixel of `target`,
    /// then clear the mask
    pub fn composite(&mut self, target: &mut [u8], stride: usize, layout: PixelLayout, color: [u8; 4]) {
        let Some((min, max)) = self.dirty.take() else {
            return;
        };

        let [r, g, b, a] = color;
        let src = match layout {
            PixelLayout::Rgba8 => [r, g, b],
            PixelLayout::Bgra8 => [b, g, r],
        };
        let alpha = a as u32;
        let inverse = 255 - alpha;

        for y in min.y..=max.y {
            for x in min.x..=max.x {
                let Some(index) = self.index(x, y) else {
                    continue;
                };
                if !std::mem::take(&mut self.covered[index]) {
                    continue;
                }

                let offset = y as usize * stride + x as usize * 4;
                let Some(pixel) = target.get_mut(offset..offset + 4) else {
                    continue;
                };
                for channel in 0..3 {
                    pixel[channel] = (mul_255(src[channel] as u32, alpha)
                        + mul_255(pixel[channel] as u32, inverse)) as u8;
                }
                pixel[3] = (alpha + mul_255(pixel[3] as u32, inverse)) as u8;
            }
        }
    }
}

impl OriginDimensions for CoverageMask {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for CoverageMask {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if color.is_off() {
                continue;
            }
            let Some(index) = self.index(point.x, point.y) else {
                continue;
            };

            self.covered[index] = true;
            self.dirty = Some(match self.dirty {
                Some((min, max)) => (min.component_min(point), max.component_max(point)),
                None => (point, point),
            });
        }
        Ok(())
    }
}

/// x * y / 255, rounded
fn mul_255(x: u32, y: u32) -> u32 {
    let t = x * y + 128;
    (t + (t >> 8)) >> 8
}

/// Closest bundled font for a pixel size
pub fn label_font(size: f32) -> &'static MonoFont<'static> {
    if size <= 10.0 {
        &FONT_6X10
    } else if size <= 12.0 {
        &FONT_6X12
    } else {
        &FONT_7X13
    }
}

/// Rasterize `text` with its baseline starting at `origin`
pub fn draw_label(mask: &mut CoverageMask, text: &str, origin: Vec2, size: f32) {
    let style = MonoTextStyle::new(label_font(size), BinaryColor::On);
    let position = Point::new(origin.x.round() as i32, origin.y.round() as i32);
    Text::with_baseline(text, position, style, Baseline::Alphabetic)
        .draw(mask)
        .ok();
}

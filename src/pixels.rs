//! Device-independent pixel buffer, the drawing surface of the imaging backend.
//!
//! Rows are stored top-down, each padded to a multiple of four bytes. 32-bit
//! pixels are BGRA with premultiplied alpha; 24-bit pixels are BGR.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::window::ClientRect;
use crate::error::{RenderError, Result};

const BITMAP_TYPE: u16 = 0x4d42; // "BM"
const BITMAP_PIXELS_PER_METER: i32 = 2834; // 72 dpi
const BI_RGB: u32 = 0;

/// Pixel rectangle with exclusive right/bottom edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl PixelRect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Overlap of both rectangles, `None` when they do not intersect
    pub fn intersect(&self, other: &PixelRect) -> Option<PixelRect> {
        let rect = PixelRect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        (!rect.is_empty()).then_some(rect)
    }
}

/// Owned pixel storage with the layout of a top-down DIB section
#[derive(Clone)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
    bits_per_pixel: u16,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bits_per_pixel", &self.bits_per_pixel)
            .finish()
    }
}

impl PixelBuffer {
    /// Zeroed 32-bit buffer
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::with_depth(width, height, 32)
    }

    /// Zeroed buffer with 24 or 32 bits per pixel
    pub fn with_depth(width: u32, height: u32, bits_per_pixel: u16) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptySurface { width, height });
        }
        if bits_per_pixel != 24 && bits_per_pixel != 32 {
            return Err(RenderError::PixelFormat(bits_per_pixel));
        }

        let stride = Self::row_stride(width, bits_per_pixel);
        let len = stride
            .checked_mul(height as usize)
            .ok_or(RenderError::SurfaceAllocation { width, height })?;

        Ok(Self {
            data: vec![0; len],
            width,
            height,
            stride,
            bits_per_pixel,
        })
    }

    /// Bytes per row, padded to a four-byte boundary
    pub fn row_stride(width: u32, bits_per_pixel: u16) -> usize {
        let bits = width as usize * bits_per_pixel as usize;
        bits.div_ceil(32) * 4
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> ClientRect {
        ClientRect::new(self.width, self.height)
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn bits_per_pixel(&self) -> u16 {
        self.bits_per_pixel
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel as usize / 8
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Byte offset of pixel (x, y), `None` outside the buffer
    pub fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.stride + x as usize * self.bytes_per_pixel())
    }

    /// Pixel bytes in storage order (BGRA or BGR)
    pub fn pixel(&self, x: i32, y: i32) -> Option<&[u8]> {
        let offset = self.offset(x, y)?;
        self.data.get(offset..offset + self.bytes_per_pixel())
    }

    /// Set every pixel to `color`, given in storage order
    pub fn fill(&mut self, color: &[u8]) {
        let bpp = self.bytes_per_pixel();
        if color.len() != bpp {
            return;
        }
        let row_bytes = self.width as usize * bpp;
        for row in self.data.chunks_exact_mut(self.stride) {
            for pixel in row[..row_bytes].chunks_exact_mut(bpp) {
                pixel.copy_from_slice(color);
            }
        }
    }

    /// Set the alpha byte of every pixel inside `rect`, clipped to the buffer.
    /// Empty or non-intersecting rectangles and 24-bit buffers are left alone.
    pub fn set_alpha(&mut self, rect: PixelRect, level: u8) {
        if self.bits_per_pixel != 32 {
            return;
        }
        let Some(clip) = rect.intersect(&PixelRect::from_size(self.width, self.height)) else {
            return;
        };

        for y in clip.top..clip.bottom {
            let row = y as usize * self.stride;
            for x in clip.left..clip.right {
                self.data[row + x as usize * 4 + 3] = level;
            }
        }
    }

    /// Serialize as an uncompressed BMP file
    pub fn write_bmp<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let header_len = std::mem::size_of::<BitmapFileHeader>() + std::mem::size_of::<BitmapInfoHeader>();
        let file_len = header_len + self.data.len();

        let file_header = BitmapFileHeader {
            kind: BITMAP_TYPE.to_le(),
            size: (file_len as u32).to_le(),
            reserved1: 0,
            reserved2: 0,
            offset: (header_len as u32).to_le(),
        };

        let info_header = BitmapInfoHeader {
            size: (std::mem::size_of::<BitmapInfoHeader>() as u32).to_le(),
            width: (self.width as i32).to_le(),
            // Negative height marks top-down rows
            height: (-(self.height as i32)).to_le(),
            planes: 1u16.to_le(),
            bit_count: self.bits_per_pixel.to_le(),
            compression: BI_RGB.to_le(),
            size_image: (self.data.len() as u32).to_le(),
            x_pels_per_meter: BITMAP_PIXELS_PER_METER.to_le(),
            y_pels_per_meter: BITMAP_PIXELS_PER_METER.to_le(),
            colors_used: 0,
            colors_important: 0,
        };

        writer.write_all(bytemuck::bytes_of(&file_header))?;
        writer.write_all(bytemuck::bytes_of(&info_header))?;
        writer.write_all(&self.data)?;
        writer.flush()
    }

    /// Write the buffer to `path` as a BMP file
    pub fn save_bmp(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_bmp(&mut writer)?;
        Ok(())
    }
}

#[repr(C, packed)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BitmapFileHeader {
    kind: u16,
    size: u32,
    reserved1: u16,
    reserved2: u16,
    offset: u32,
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BitmapInfoHeader {
    size: u32,
    width: i32,
    height: i32,
    planes: u16,
    bit_count: u16,
    compression: u32,
    size_image: u32,
    x_pels_per_meter: i32,
    y_pels_per_meter: i32,
    colors_used: u32,
    colors_important: u32,
}

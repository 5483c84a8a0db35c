//! Decoded pixel buffers, padded to power-of-two surfaces for upload.

use corelib::{DecodeError, pad_to_pow2};

/// Bit depth of decoded pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorDepth {
    /// 8-bit RGB, no alpha.
    Rgb24,
    /// 8-bit RGBA.
    Rgba32,
}

impl ColorDepth {
    pub fn bits(self) -> u32 {
        match self {
            ColorDepth::Rgb24 => 24,
            ColorDepth::Rgba32 => 32,
        }
    }

    /// Bytes (components) per pixel.
    pub fn components(self) -> usize {
        match self {
            ColorDepth::Rgb24 => 3,
            ColorDepth::Rgba32 => 4,
        }
    }

    #[inline]
    pub fn has_alpha(self) -> bool {
        self == ColorDepth::Rgba32
    }
}

/// Pixel data in CPU-friendly format before GPU upload.
///
/// `pixels` covers the padded `texture_width` x `texture_height` surface,
/// rows tightly packed; only the top-left `width` x `height` region carries
/// image content, the rest is zeroed.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub texture_width: u32,
    pub texture_height: u32,
    pub depth: ColorDepth,
}

impl ImageData {
    /// Wrap tightly packed rows, padding them to a power-of-two surface.
    pub fn from_packed(
        width: u32,
        height: u32,
        depth: ColorDepth,
        packed: &[u8],
    ) -> Result<Self, DecodeError> {
        Self::from_rows(width, height, depth, packed, false)
    }

    /// Wrap tightly packed RGBA8 rows.
    pub fn from_rgba8(width: u32, height: u32, packed: &[u8]) -> Result<Self, DecodeError> {
        Self::from_packed(width, height, ColorDepth::Rgba32, packed)
    }

    /// Wrap tightly packed RGB8 rows.
    pub fn from_rgb8(width: u32, height: u32, packed: &[u8]) -> Result<Self, DecodeError> {
        Self::from_packed(width, height, ColorDepth::Rgb24, packed)
    }

    pub(crate) fn from_rows(
        width: u32,
        height: u32,
        depth: ColorDepth,
        packed: &[u8],
        flip_vertically: bool,
    ) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::Malformed(format!(
                "image has no pixels ({width}x{height})"
            )));
        }

        let bpp = depth.components();
        let row_len = width as usize * bpp;
        let expected = row_len * height as usize;
        if packed.len() < expected {
            return Err(DecodeError::Truncated);
        }
        if packed.len() > expected {
            return Err(DecodeError::Malformed(format!(
                "{} bytes of pixels for a {width}x{height} image, expected {expected}",
                packed.len()
            )));
        }

        Ok(Self::pad_rows(width, height, depth, packed, flip_vertically))
    }

    /// `packed` must hold exactly `width * height` pixels.
    fn pad_rows(
        width: u32,
        height: u32,
        depth: ColorDepth,
        packed: &[u8],
        flip_vertically: bool,
    ) -> Self {
        let row_len = width as usize * depth.components();
        let texture_width = pad_to_pow2(width);
        let texture_height = pad_to_pow2(height);
        let padded_row_len = texture_width as usize * depth.components();
        let mut pixels = vec![0u8; padded_row_len * texture_height as usize];

        for (y, src) in packed.chunks_exact(row_len).enumerate() {
            let dst_y = if flip_vertically {
                height as usize - 1 - y
            } else {
                y
            };
            let start = dst_y * padded_row_len;
            pixels[start..start + row_len].copy_from_slice(src);
        }

        Self {
            pixels,
            width,
            height,
            texture_width,
            texture_height,
            depth,
        }
    }

    /// Opaque white/grey checkerboard with 8x8 cells.
    pub fn checkerboard(size: u32) -> Self {
        const LIGHT: [u8; 4] = [255, 255, 255, 255];
        const DARK: [u8; 4] = [128, 128, 128, 255];

        let size = size.max(1);
        let packed: Vec<u8> = (0..size)
            .flat_map(|y| (0..size).map(move |x| (x / 8 + y / 8) % 2 == 0))
            .flat_map(|light| if light { LIGHT } else { DARK })
            .collect();
        Self::pad_rows(size, size, ColorDepth::Rgba32, &packed, false)
    }

    /// Number of bytes per pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        self.depth.components()
    }

    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.depth.has_alpha()
    }

    /// Bytes of one pixel on the padded surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.texture_width || y >= self.texture_height {
            return None;
        }
        let bpp = self.bytes_per_pixel();
        let start = (y as usize * self.texture_width as usize + x as usize) * bpp;
        self.pixels.get(start..start + bpp)
    }

    /// Check the metadata is self-consistent.
    pub fn is_valid(&self) -> bool {
        let expected_size =
            self.texture_width as usize * self.texture_height as usize * self.bytes_per_pixel();
        self.width > 0
            && self.height > 0
            && self.texture_width == pad_to_pow2(self.width)
            && self.texture_height == pad_to_pow2(self.height)
            && self.pixels.len() == expected_size
    }
}

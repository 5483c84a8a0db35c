//! The graphics driver seam the texture cache talks to.
//!
//! Calls mirror a fixed-function texture API: allocate a handle, bind it,
//! configure sampling, upload pixels. Every call is synchronous and either
//! completes or returns a [`DriverError`] before the next one is issued.

use std::fmt;

use asset::ColorDepth;
pub use corelib::DriverError;

/// Opaque texture id owned by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DriverHandle(pub u32);

impl fmt::Display for DriverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Binding point of a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture2D,
}

/// Minification filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MinFilter {
    Nearest,
    Linear,
    /// Linear within a level, nearest level; needs a mip chain.
    LinearMipmapNearest,
}

impl MinFilter {
    #[inline]
    pub fn uses_mipmaps(self) -> bool {
        matches!(self, MinFilter::LinearMipmapNearest)
    }
}

/// Magnification filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MagFilter {
    Nearest,
    Linear,
}

/// Storage format the driver allocates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InternalFormat {
    /// 8 bits per channel.
    Rgba8,
    /// Reduced precision, 4 bits per channel.
    Rgba4,
}

/// Layout of the pixels handed to the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Rgb,
    Rgba,
}

impl SourceFormat {
    pub fn components(self) -> usize {
        match self {
            SourceFormat::Rgb => 3,
            SourceFormat::Rgba => 4,
        }
    }
}

impl From<ColorDepth> for SourceFormat {
    fn from(depth: ColorDepth) -> Self {
        if depth.has_alpha() {
            SourceFormat::Rgba
        } else {
            SourceFormat::Rgb
        }
    }
}

/// Component type of the pixels handed to the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelType {
    UnsignedByte,
}

/// One 2D image upload.
#[derive(Clone, Copy, Debug)]
pub struct ImageUpload<'a> {
    pub internal_format: InternalFormat,
    pub width: u32,
    pub height: u32,
    pub source_format: SourceFormat,
    pub pixel_type: PixelType,
    pub data: &'a [u8],
}

impl ImageUpload<'_> {
    /// Bytes the upload must carry.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.source_format.components()
    }

    pub fn check_len(&self) -> Result<(), DriverError> {
        let expected = self.expected_len();
        if self.data.len() < expected {
            return Err(DriverError::BufferSize {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

/// A graphics driver context.
///
/// Not reentrant: one owner issues calls in order.
pub trait GpuDriver {
    fn allocate_handle(&mut self) -> Result<DriverHandle, DriverError>;

    /// Free `handle` and whatever was stored behind it. Unbinds it if bound.
    fn release_handle(&mut self, handle: DriverHandle) -> Result<(), DriverError>;

    fn bind(&mut self, target: TextureTarget, handle: DriverHandle) -> Result<(), DriverError>;

    fn set_min_filter(&mut self, target: TextureTarget, filter: MinFilter)
    -> Result<(), DriverError>;

    fn set_mag_filter(&mut self, target: TextureTarget, filter: MagFilter)
    -> Result<(), DriverError>;

    /// Upload level 0 of the bound texture.
    fn upload_image_2d(
        &mut self,
        target: TextureTarget,
        upload: &ImageUpload<'_>,
    ) -> Result<(), DriverError>;

    /// Upload the bound texture with a full mip chain built from `upload`.
    fn generate_mipmaps_2d(
        &mut self,
        target: TextureTarget,
        upload: &ImageUpload<'_>,
    ) -> Result<(), DriverError>;
}

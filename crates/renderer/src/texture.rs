//! GPU-resident texture handles and the filters they are created with.

use crate::driver::{DriverHandle, MagFilter, MinFilter, TextureTarget};

/// Sampling filter requested for a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
    /// Linear sampling with a generated mip chain.
    LinearMipmapNearest,
}

impl Filter {
    pub fn min_filter(self) -> MinFilter {
        match self {
            Filter::Nearest => MinFilter::Nearest,
            Filter::Linear => MinFilter::Linear,
            Filter::LinearMipmapNearest => MinFilter::LinearMipmapNearest,
        }
    }

    /// Mip-mapped magnification does not exist; it degrades to linear.
    pub fn mag_filter(self) -> MagFilter {
        match self {
            Filter::Nearest => MagFilter::Nearest,
            Filter::Linear | Filter::LinearMipmapNearest => MagFilter::Linear,
        }
    }

    pub fn family(self) -> FilterFamily {
        match self {
            Filter::Nearest => FilterFamily::Nearest,
            Filter::Linear | Filter::LinearMipmapNearest => FilterFamily::Linear,
        }
    }
}

/// Cache namespace a filter falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterFamily {
    Nearest,
    Linear,
}

/// A texture uploaded to the driver.
///
/// `width`/`height` are the image's own size; `texture_width`/`texture_height`
/// are the power-of-two surface the driver allocated.
#[derive(Debug, PartialEq, Eq)]
pub struct Texture {
    name: String,
    target: TextureTarget,
    handle: DriverHandle,
    width: u32,
    height: u32,
    texture_width: u32,
    texture_height: u32,
    has_alpha: bool,
}

impl Texture {
    pub(crate) fn new(
        name: String,
        target: TextureTarget,
        handle: DriverHandle,
        (width, height): (u32, u32),
        (texture_width, texture_height): (u32, u32),
        has_alpha: bool,
    ) -> Self {
        Self {
            name,
            target,
            handle,
            width,
            height,
            texture_width,
            texture_height,
            has_alpha,
        }
    }

    /// Resource identifier, or `generated:WxH` for programmatic images.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> TextureTarget {
        self.target
    }

    pub fn handle(&self) -> DriverHandle {
        self.handle
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texture_width(&self) -> u32 {
        self.texture_width
    }

    pub fn texture_height(&self) -> u32 {
        self.texture_height
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Largest UV coordinates that still land on image content.
    pub fn uv_extent(&self) -> (f32, f32) {
        (
            self.width as f32 / self.texture_width as f32,
            self.height as f32 / self.texture_height as f32,
        )
    }
}

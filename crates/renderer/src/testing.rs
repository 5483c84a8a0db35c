//! Fakes for exercising the cache without a GPU.

use std::io::{self, Read};

use asset::{ColorDepth, ImageData, ImageDecoder, ImageFormat};
use corelib::DecodeError;

use crate::driver::{
    DriverError, DriverHandle, GpuDriver, ImageUpload, InternalFormat, MagFilter, MinFilter,
    PixelType, SourceFormat, TextureTarget,
};

/// What reached the driver in one upload call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadRecord {
    pub internal_format: InternalFormat,
    pub width: u32,
    pub height: u32,
    pub source_format: SourceFormat,
    pub pixel_type: PixelType,
    pub len: usize,
}

impl From<&ImageUpload<'_>> for UploadRecord {
    fn from(upload: &ImageUpload<'_>) -> Self {
        Self {
            internal_format: upload.internal_format,
            width: upload.width,
            height: upload.height,
            source_format: upload.source_format,
            pixel_type: upload.pixel_type,
            len: upload.data.len(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriverCall {
    Allocate(DriverHandle),
    Release(DriverHandle),
    Bind(TextureTarget, DriverHandle),
    MinFilter(MinFilter),
    MagFilter(MagFilter),
    Upload(UploadRecord),
    Mipmaps(UploadRecord),
}

/// Call that should fail next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailPoint {
    Allocate,
    Upload,
}

/// Driver that records calls instead of touching GPU state.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    pub calls: Vec<DriverCall>,
    /// Fails the matching call once, then clears itself.
    pub fail: Option<FailPoint>,
    next: u32,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uploads(&self) -> Vec<&UploadRecord> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DriverCall::Upload(rec) | DriverCall::Mipmaps(rec) => Some(rec),
                _ => None,
            })
            .collect()
    }

    pub fn allocations(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DriverCall::Allocate(_)))
            .count()
    }

    /// Handles allocated and not released, in allocation order.
    pub fn live_handles(&self) -> Vec<DriverHandle> {
        let mut live = Vec::new();
        for call in &self.calls {
            match call {
                DriverCall::Allocate(handle) => live.push(*handle),
                DriverCall::Release(handle) => live.retain(|h| h != handle),
                _ => {}
            }
        }
        live
    }

    fn trip(&mut self, point: FailPoint) -> Result<(), DriverError> {
        if self.fail == Some(point) {
            self.fail = None;
            return Err(DriverError::Backend(format!("injected {point:?} failure")));
        }
        Ok(())
    }
}

impl GpuDriver for RecordingDriver {
    fn allocate_handle(&mut self) -> Result<DriverHandle, DriverError> {
        self.trip(FailPoint::Allocate)?;
        self.next += 1;
        let handle = DriverHandle(self.next);
        self.calls.push(DriverCall::Allocate(handle));
        Ok(handle)
    }

    fn release_handle(&mut self, handle: DriverHandle) -> Result<(), DriverError> {
        if !self.live_handles().contains(&handle) {
            return Err(DriverError::UnknownHandle(handle.0));
        }
        self.calls.push(DriverCall::Release(handle));
        Ok(())
    }

    fn bind(&mut self, target: TextureTarget, handle: DriverHandle) -> Result<(), DriverError> {
        self.calls.push(DriverCall::Bind(target, handle));
        Ok(())
    }

    fn set_min_filter(&mut self, _: TextureTarget, filter: MinFilter) -> Result<(), DriverError> {
        self.calls.push(DriverCall::MinFilter(filter));
        Ok(())
    }

    fn set_mag_filter(&mut self, _: TextureTarget, filter: MagFilter) -> Result<(), DriverError> {
        self.calls.push(DriverCall::MagFilter(filter));
        Ok(())
    }

    fn upload_image_2d(
        &mut self,
        _: TextureTarget,
        upload: &ImageUpload<'_>,
    ) -> Result<(), DriverError> {
        self.trip(FailPoint::Upload)?;
        upload.check_len()?;
        self.calls.push(DriverCall::Upload(upload.into()));
        Ok(())
    }

    fn generate_mipmaps_2d(
        &mut self,
        _: TextureTarget,
        upload: &ImageUpload<'_>,
    ) -> Result<(), DriverError> {
        self.trip(FailPoint::Upload)?;
        upload.check_len()?;
        self.calls.push(DriverCall::Mipmaps(upload.into()));
        Ok(())
    }
}

/// Decoder that returns a blank image of fixed size and counts its calls.
#[derive(Debug)]
pub struct CountingDecoder {
    /// `(format, flip_vertically)` per call.
    pub decodes: Vec<(ImageFormat, bool)>,
    pub width: u32,
    pub height: u32,
    pub depth: ColorDepth,
    /// Returned (once) instead of an image.
    pub fail_next: Option<DecodeError>,
    /// Overrides the padded size reported back, to model a broken decoder.
    pub report_texture_size: Option<(u32, u32)>,
}

impl CountingDecoder {
    pub fn new(width: u32, height: u32, depth: ColorDepth) -> Self {
        Self {
            decodes: Vec::new(),
            width,
            height,
            depth,
            fail_next: None,
            report_texture_size: None,
        }
    }
}

impl ImageDecoder for CountingDecoder {
    fn decode(
        &mut self,
        stream: &mut dyn Read,
        format: ImageFormat,
        flip_vertically: bool,
    ) -> Result<ImageData, DecodeError> {
        io::copy(stream, &mut io::sink()).map_err(DecodeError::Io)?;
        self.decodes.push((format, flip_vertically));
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        let len = self.width as usize * self.height as usize * self.depth.components();
        let pixels = vec![0x7f; len];
        let mut image = ImageData::from_packed(self.width, self.height, self.depth, &pixels)?;
        if let Some((w, h)) = self.report_texture_size {
            image.texture_width = w;
            image.texture_height = h;
        }
        Ok(image)
    }
}

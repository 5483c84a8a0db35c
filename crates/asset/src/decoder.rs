//! Stream → pixel decoding.

use std::io::{self, Read};

use corelib::DecodeError;
use image::{DynamicImage, ImageError};

use crate::format::ImageFormat;
use crate::image_data::{ColorDepth, ImageData};

/// Turns an encoded byte stream into padded pixels.
pub trait ImageDecoder {
    fn decode(
        &mut self,
        stream: &mut dyn Read,
        format: ImageFormat,
        flip_vertically: bool,
    ) -> Result<ImageData, DecodeError>;
}

/// Default decoder backed by the `image` crate.
///
/// [`ImageFormat::Indexed`] is always read as Targa (true-colour or
/// colour-mapped); [`ImageFormat::General`] sniffs the format from the
/// stream's signature.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageCrateDecoder;

impl ImageCrateDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ImageDecoder for ImageCrateDecoder {
    fn decode(
        &mut self,
        stream: &mut dyn Read,
        format: ImageFormat,
        flip_vertically: bool,
    ) -> Result<ImageData, DecodeError> {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes).map_err(map_io_error)?;
        if bytes.is_empty() {
            return Err(DecodeError::Truncated);
        }

        let decoded = match format {
            ImageFormat::Indexed => {
                image::load_from_memory_with_format(&bytes, image::ImageFormat::Tga)
            }
            ImageFormat::General => {
                let guessed = image::guess_format(&bytes).map_err(|_| {
                    DecodeError::Unsupported("unrecognised image signature".to_string())
                })?;
                log::debug!("Sniffed {:?} from {} bytes", guessed, bytes.len());
                image::load_from_memory_with_format(&bytes, guessed)
            }
        }
        .map_err(map_image_error)?;

        into_image_data(decoded, flip_vertically)
    }
}

fn into_image_data(
    decoded: DynamicImage,
    flip_vertically: bool,
) -> Result<ImageData, DecodeError> {
    let (width, height) = (decoded.width(), decoded.height());
    let (depth, packed) = if decoded.color().has_alpha() {
        (ColorDepth::Rgba32, decoded.into_rgba8().into_raw())
    } else {
        (ColorDepth::Rgb24, decoded.into_rgb8().into_raw())
    };

    log::debug!(
        "Decoded {}x{} image at {} bpp (flip={})",
        width,
        height,
        depth.bits(),
        flip_vertically
    );

    ImageData::from_rows(width, height, depth, &packed, flip_vertically)
}

fn map_io_error(err: io::Error) -> DecodeError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        DecodeError::Truncated
    } else {
        DecodeError::Io(err)
    }
}

fn map_image_error(err: ImageError) -> DecodeError {
    match err {
        ImageError::Unsupported(e) => DecodeError::Unsupported(e.to_string()),
        ImageError::IoError(e) => map_io_error(e),
        other => DecodeError::Malformed(other.to_string()),
    }
}

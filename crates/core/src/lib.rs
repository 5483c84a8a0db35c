//! Core shared types and errors (renderer-agnostic).

use std::io;

use thiserror::Error;

pub mod pow2;

pub use pow2::{checked_pad_to_pow2, pad_to_pow2};

/// Failure while turning an encoded stream into pixels.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed image data: {0}")]
    Malformed(String),
    #[error("image stream ended early")]
    Truncated,
    #[error("unsupported image format: {0}")]
    Unsupported(String),
    #[error("failed to read image stream")]
    Io(#[source] io::Error),
}

/// Failure reported by the graphics driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no texture handles left")]
    OutOfHandles,
    #[error("unknown texture handle {0}")]
    UnknownHandle(u32),
    #[error("no texture is bound")]
    NothingBound,
    #[error("texture {width}x{height} exceeds the driver limit of {max}")]
    TooLarge { width: u32, height: u32, max: u32 },
    #[error("pixel buffer holds {actual} bytes, upload needs {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("no suitable GPU adapter")]
    NoAdapter,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Load failure naming the resource that could not be turned into a texture.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode texture '{resource}'")]
    Decode {
        resource: String,
        #[source]
        source: DecodeError,
    },
    #[error("unsupported format for texture '{resource}': {reason}")]
    UnsupportedFormat { resource: String, reason: String },
    #[error("driver failed while uploading texture '{resource}'")]
    Driver {
        resource: String,
        #[source]
        source: DriverError,
    },
    #[error("failed to open texture '{resource}'")]
    Io {
        resource: String,
        #[source]
        source: io::Error,
    },
}

impl TextureError {
    /// Attach `resource` to a decoder failure, splitting out unsupported formats.
    pub fn decode(resource: impl Into<String>, source: DecodeError) -> Self {
        let resource = resource.into();
        match source {
            DecodeError::Unsupported(reason) => Self::UnsupportedFormat { resource, reason },
            source => Self::Decode { resource, source },
        }
    }

    pub fn driver(resource: impl Into<String>, source: DriverError) -> Self {
        Self::Driver {
            resource: resource.into(),
            source,
        }
    }

    /// The resource identifier the failure belongs to.
    pub fn resource(&self) -> &str {
        match self {
            Self::Decode { resource, .. }
            | Self::UnsupportedFormat { resource, .. }
            | Self::Driver { resource, .. }
            | Self::Io { resource, .. } => resource,
        }
    }
}

pub type TextureResult<T> = Result<T, TextureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_decode_becomes_format_error() {
        let err = TextureError::decode("song.ogg", DecodeError::Unsupported("ogg".into()));
        assert!(matches!(err, TextureError::UnsupportedFormat { .. }));
        assert_eq!(err.resource(), "song.ogg");
        assert!(err.to_string().contains("song.ogg"));
    }

    #[test]
    fn other_decode_failures_keep_their_source() {
        let err = TextureError::decode("tile.tga", DecodeError::Truncated);
        match &err {
            TextureError::Decode { source, .. } => assert!(matches!(source, DecodeError::Truncated)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.resource(), "tile.tga");
    }

    #[test]
    fn driver_error_names_resource() {
        let err = TextureError::driver("hero.png", DriverError::OutOfHandles);
        assert_eq!(err.to_string(), "driver failed while uploading texture 'hero.png'");
    }
}

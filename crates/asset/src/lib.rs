//! Asset loading: image decoding into padded, upload-ready pixel buffers.
//! `.tga` resources take the indexed (Targa) path, everything else is sniffed.

pub mod decoder;
pub mod format;
pub mod image_data;

pub use decoder::{ImageCrateDecoder, ImageDecoder};
pub use format::ImageFormat;
pub use image_data::{ColorDepth, ImageData};

//! Renderer-side texture management: the driver seam, texture handles and
//! the cache that decodes and uploads each resource once.

pub mod cache;
pub mod driver;
pub mod texture;
pub mod wgpu_driver;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheConfig, TextureCache};
pub use driver::{DriverHandle, GpuDriver};
pub use texture::{Filter, FilterFamily, Texture};
pub use wgpu_driver::WgpuDriver;

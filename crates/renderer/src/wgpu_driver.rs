//! [`GpuDriver`] on a wgpu device.
//! wgpu = 23.x
//!
//! wgpu has no notion of a bound texture or per-texture filter state, so the
//! driver keeps that state per handle and turns it into a [`wgpu::Sampler`]
//! when pixels arrive. Sources are always stored as `Rgba8Unorm`:
//! - RGB sources get an opaque alpha channel,
//! - reduced precision is quantised to 4 bits per channel on the CPU,
//! - mip chains are box-filtered on the CPU.

use std::collections::HashMap;

use wgpu::{
    Device, Extent3d, FilterMode, ImageCopyTexture, ImageDataLayout, Origin3d, Queue,
    SamplerDescriptor, TextureAspect, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages,
};

use crate::driver::{
    DriverError, DriverHandle, GpuDriver, ImageUpload, InternalFormat, MagFilter, MinFilter,
    SourceFormat, TextureTarget,
};

const STORAGE_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

/// GPU objects behind one driver handle.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

struct Slot {
    min_filter: MinFilter,
    mag_filter: MagFilter,
    gpu: Option<GpuTexture>,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            min_filter: MinFilter::Linear,
            mag_filter: MagFilter::Linear,
            gpu: None,
        }
    }
}

pub struct WgpuDriver {
    device: Device,
    queue: Queue,
    slots: HashMap<DriverHandle, Slot>,
    bound: Option<DriverHandle>,
    next: u32,
}

impl WgpuDriver {
    pub fn new(device: Device, queue: Queue) -> Self {
        Self {
            device,
            queue,
            slots: HashMap::new(),
            bound: None,
            next: 0,
        }
    }

    /// Create a device of its own, without a surface.
    pub fn new_headless(backends: wgpu::Backends) -> Result<Self, DriverError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(DriverError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Texture device on {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Texture Cache Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| DriverError::Backend(e.to_string()))?;

        Ok(Self::new(device, queue))
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// GPU objects for `handle`, once pixels have been uploaded.
    pub fn texture(&self, handle: DriverHandle) -> Option<&GpuTexture> {
        self.slots.get(&handle)?.gpu.as_ref()
    }

    fn bound_slot(&mut self, target: TextureTarget) -> Result<&mut Slot, DriverError> {
        let TextureTarget::Texture2D = target;
        let handle = self.bound.ok_or(DriverError::NothingBound)?;
        self.slots
            .get_mut(&handle)
            .ok_or(DriverError::UnknownHandle(handle.0))
    }

    fn store(
        &mut self,
        target: TextureTarget,
        upload: &ImageUpload<'_>,
        mipmapped: bool,
    ) -> Result<(), DriverError> {
        upload.check_len()?;
        let max = self.device.limits().max_texture_dimension_2d;
        if upload.width > max || upload.height > max {
            return Err(DriverError::TooLarge {
                width: upload.width,
                height: upload.height,
                max,
            });
        }

        let base = expand_to_rgba8(upload);
        let mut levels = if mipmapped {
            mip_chain(base, upload.width, upload.height)
        } else {
            vec![MipLevel {
                width: upload.width,
                height: upload.height,
                pixels: base,
            }]
        };
        if upload.internal_format == InternalFormat::Rgba4 {
            for level in &mut levels {
                quantize_rgba4(&mut level.pixels);
            }
        }

        let handle = self.bound.ok_or(DriverError::NothingBound)?;
        let (min_filter, mag_filter) = {
            let slot = self.bound_slot(target)?;
            (slot.min_filter, slot.mag_filter)
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let label = format!("Texture {handle}");
        let texture = self.device.create_texture(&TextureDescriptor {
            label: Some(&label),
            size: Extent3d {
                width: upload.width,
                height: upload.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: STORAGE_FORMAT,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (mip_level, level) in levels.iter().enumerate() {
            self.queue.write_texture(
                ImageCopyTexture {
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: Origin3d::ZERO,
                    aspect: TextureAspect::All,
                },
                &level.pixels,
                ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level.width),
                    rows_per_image: Some(level.height),
                },
                Extent3d {
                    width: level.width,
                    height: level.height,
                    depth_or_array_layers: 1,
                },
            );
        }
        let view = texture.create_view(&Default::default());
        let (min, mipmap) = min_filter_modes(min_filter);
        let sampler = self.device.create_sampler(&SamplerDescriptor {
            label: Some(&label),
            mag_filter: match mag_filter {
                MagFilter::Nearest => FilterMode::Nearest,
                MagFilter::Linear => FilterMode::Linear,
            },
            min_filter: min,
            mipmap_filter: mipmap,
            ..Default::default()
        });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(DriverError::Backend(err.to_string()));
        }

        log::debug!(
            "Stored {} as {}x{} with {} level(s)",
            handle,
            upload.width,
            upload.height,
            levels.len()
        );
        self.bound_slot(target)?.gpu = Some(GpuTexture {
            texture,
            view,
            sampler,
        });
        Ok(())
    }
}

impl GpuDriver for WgpuDriver {
    fn allocate_handle(&mut self) -> Result<DriverHandle, DriverError> {
        self.next = self.next.checked_add(1).ok_or(DriverError::OutOfHandles)?;
        let handle = DriverHandle(self.next);
        self.slots.insert(handle, Slot::default());
        Ok(handle)
    }

    fn release_handle(&mut self, handle: DriverHandle) -> Result<(), DriverError> {
        let slot = self
            .slots
            .remove(&handle)
            .ok_or(DriverError::UnknownHandle(handle.0))?;
        if let Some(gpu) = slot.gpu {
            gpu.texture.destroy();
        }
        if self.bound == Some(handle) {
            self.bound = None;
        }
        Ok(())
    }

    fn bind(&mut self, target: TextureTarget, handle: DriverHandle) -> Result<(), DriverError> {
        let TextureTarget::Texture2D = target;
        if !self.slots.contains_key(&handle) {
            return Err(DriverError::UnknownHandle(handle.0));
        }
        self.bound = Some(handle);
        Ok(())
    }

    fn set_min_filter(
        &mut self,
        target: TextureTarget,
        filter: MinFilter,
    ) -> Result<(), DriverError> {
        self.bound_slot(target)?.min_filter = filter;
        Ok(())
    }

    fn set_mag_filter(
        &mut self,
        target: TextureTarget,
        filter: MagFilter,
    ) -> Result<(), DriverError> {
        self.bound_slot(target)?.mag_filter = filter;
        Ok(())
    }

    fn upload_image_2d(
        &mut self,
        target: TextureTarget,
        upload: &ImageUpload<'_>,
    ) -> Result<(), DriverError> {
        self.store(target, upload, false)
    }

    fn generate_mipmaps_2d(
        &mut self,
        target: TextureTarget,
        upload: &ImageUpload<'_>,
    ) -> Result<(), DriverError> {
        self.store(target, upload, true)
    }
}

/// (minification, mipmap) filter modes for a sampler.
fn min_filter_modes(filter: MinFilter) -> (FilterMode, FilterMode) {
    match filter {
        MinFilter::Nearest => (FilterMode::Nearest, FilterMode::Nearest),
        MinFilter::Linear => (FilterMode::Linear, FilterMode::Nearest),
        MinFilter::LinearMipmapNearest => (FilterMode::Linear, FilterMode::Nearest),
    }
}

#[derive(Debug, PartialEq)]
struct MipLevel {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

fn expand_to_rgba8(upload: &ImageUpload<'_>) -> Vec<u8> {
    let texels = upload.width as usize * upload.height as usize;
    let data = &upload.data[..upload.expected_len()];
    match upload.source_format {
        SourceFormat::Rgba => data.to_vec(),
        SourceFormat::Rgb => {
            let mut out = Vec::with_capacity(texels * 4);
            for px in data.chunks_exact(3) {
                out.extend_from_slice(px);
                out.push(u8::MAX);
            }
            out
        }
    }
}

/// Drop each channel to its top 4 bits, replicated into the low nibble.
fn quantize_rgba4(pixels: &mut [u8]) {
    for v in pixels {
        let hi = *v & 0xF0;
        *v = hi | (hi >> 4);
    }
}

/// Base level followed by 2x2 box-filtered levels down to 1x1.
fn mip_chain(base: Vec<u8>, width: u32, height: u32) -> Vec<MipLevel> {
    let mut levels = vec![MipLevel {
        width,
        height,
        pixels: base,
    }];

    loop {
        let prev = &levels[levels.len() - 1];
        if prev.width == 1 && prev.height == 1 {
            break;
        }
        let (pw, ph) = (prev.width as usize, prev.height as usize);
        let (w, h) = ((pw / 2).max(1), (ph / 2).max(1));
        let mut pixels = Vec::with_capacity(w * h * 4);

        for y in 0..h {
            for x in 0..w {
                let xs = [(2 * x).min(pw - 1), (2 * x + 1).min(pw - 1)];
                let ys = [(2 * y).min(ph - 1), (2 * y + 1).min(ph - 1)];
                for c in 0..4 {
                    let mut sum = 0u32;
                    for sy in ys {
                        for sx in xs {
                            sum += prev.pixels[(sy * pw + sx) * 4 + c] as u32;
                        }
                    }
                    pixels.push(((sum + 2) / 4) as u8);
                }
            }
        }

        levels.push(MipLevel {
            width: w as u32,
            height: h as u32,
            pixels,
        });
    }

    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::PixelType;

    fn upload(source_format: SourceFormat, width: u32, height: u32, data: &[u8]) -> ImageUpload<'_> {
        ImageUpload {
            internal_format: InternalFormat::Rgba8,
            width,
            height,
            source_format,
            pixel_type: PixelType::UnsignedByte,
            data,
        }
    }

    #[test]
    fn rgb_gains_opaque_alpha() {
        let data = [1, 2, 3, 4, 5, 6];
        let out = expand_to_rgba8(&upload(SourceFormat::Rgb, 2, 1, &data));
        assert_eq!(out, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn rgba_is_copied_up_to_the_surface_size() {
        let data = [9u8; 20];
        let out = expand_to_rgba8(&upload(SourceFormat::Rgba, 2, 2, &data));
        assert_eq!(out.len(), 16);
    }

    #[test]
    fn quantizing_keeps_high_nibble() {
        let mut px = [0x00, 0x0F, 0x10, 0xAB, 0xFF];
        quantize_rgba4(&mut px);
        assert_eq!(px, [0x00, 0x00, 0x11, 0xAA, 0xFF]);
    }

    #[test]
    fn mip_chain_halves_down_to_one() {
        let levels = mip_chain(vec![0; 8 * 2 * 4], 8, 2);
        let sizes: Vec<_> = levels.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
        for level in &levels {
            assert_eq!(level.pixels.len(), (level.width * level.height * 4) as usize);
        }
    }

    #[test]
    fn mip_levels_average_their_quad() {
        #[rustfmt::skip]
        let base = vec![
            0, 0, 0, 0,       100, 100, 100, 100,
            200, 200, 200, 200, 100, 100, 100, 100,
        ];
        let levels = mip_chain(base, 2, 2);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1].pixels, vec![100, 100, 100, 100]);
    }

    #[test]
    fn sampler_modes_follow_min_filter() {
        assert_eq!(
            min_filter_modes(MinFilter::Nearest),
            (FilterMode::Nearest, FilterMode::Nearest)
        );
        assert_eq!(
            min_filter_modes(MinFilter::LinearMipmapNearest),
            (FilterMode::Linear, FilterMode::Nearest)
        );
    }
}

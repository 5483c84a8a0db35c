//! Texture cache: decode once, upload once, hand out the same handle after.
//!
//! Textures are keyed by resource identifier within a [`FilterFamily`], so the
//! same image may be resident twice: once sampled nearest, once linear.
//! Entries are never evicted. A failed load stores nothing and the next
//! request runs the whole pipeline again.
//!
//! The `flipped` flag is not part of the key: the first orientation loaded
//! for a (resource, family) pair is what later callers get.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{self, Path};
use std::rc::Rc;

use asset::{ImageCrateDecoder, ImageData, ImageDecoder, ImageFormat};
use corelib::{DecodeError, TextureError, TextureResult, checked_pad_to_pow2};

use crate::driver::{
    DriverError, DriverHandle, GpuDriver, ImageUpload, InternalFormat, PixelType, SourceFormat,
    TextureTarget,
};
use crate::texture::{Filter, FilterFamily, Texture};

const TARGET: TextureTarget = TextureTarget::Texture2D;

/// Settings applied to uploads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Allocate 4-bit-per-channel surfaces instead of 8-bit ones.
    pub reduced_precision: bool,
}

impl CacheConfig {
    pub fn internal_format(&self) -> InternalFormat {
        if self.reduced_precision {
            InternalFormat::Rgba4
        } else {
            InternalFormat::Rgba8
        }
    }
}

/// Owns a driver context and every texture loaded through it.
pub struct TextureCache<D, I = ImageCrateDecoder> {
    driver: D,
    decoder: I,
    config: CacheConfig,
    nearest: HashMap<String, Rc<Texture>>,
    linear: HashMap<String, Rc<Texture>>,
}

impl<D: GpuDriver> TextureCache<D> {
    /// Cache decoding through the `image` crate.
    pub fn new(driver: D) -> Self {
        Self::with_decoder(driver, ImageCrateDecoder::new())
    }
}

impl<D: GpuDriver, I: ImageDecoder> TextureCache<D, I> {
    pub fn with_decoder(driver: D, decoder: I) -> Self {
        Self {
            driver,
            decoder,
            config: CacheConfig::default(),
            nearest: HashMap::new(),
            linear: HashMap::new(),
        }
    }

    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Switch the destination format for uploads from now on.
    /// Textures already resident keep the format they were created with.
    pub fn set_reduced_precision(&mut self, reduced: bool) {
        if self.config.reduced_precision != reduced {
            self.config.reduced_precision = reduced;
            log::info!("Texture uploads now use {:?}", self.config.internal_format());
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn decoder(&self) -> &I {
        &self.decoder
    }

    pub fn decoder_mut(&mut self) -> &mut I {
        &mut self.decoder
    }

    /// Resident texture for `resource` in `family`, if any.
    pub fn get(&self, resource: &str, family: FilterFamily) -> Option<Rc<Texture>> {
        self.table(family).get(resource).cloned()
    }

    pub fn contains(&self, resource: &str, family: FilterFamily) -> bool {
        self.table(family).contains_key(resource)
    }

    /// Resident textures across both families.
    pub fn len(&self) -> usize {
        self.nearest.len() + self.linear.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Texture for `resource`, decoding `stream` and uploading it on first use.
    ///
    /// On a hit the stream is not read.
    pub fn texture<R: Read>(
        &mut self,
        mut stream: R,
        resource: &str,
        flipped: bool,
        filter: Filter,
    ) -> TextureResult<Rc<Texture>> {
        let family = filter.family();
        if let Some(tex) = self.get(resource, family) {
            log::debug!("Texture cache hit: '{}' ({:?})", resource, family);
            return Ok(tex);
        }

        let format = ImageFormat::from_resource_name(resource);
        let image = self
            .decoder
            .decode(&mut stream, format, flipped)
            .map_err(|err| {
                log::warn!("Decoding '{}' failed: {}", resource, err);
                TextureError::decode(resource, err)
            })?;

        let tex = Rc::new(self.upload(resource.to_string(), &image, filter)?);
        self.table_mut(family)
            .insert(resource.to_string(), Rc::clone(&tex));
        Ok(tex)
    }

    /// Texture for the file at `path`, keyed by its absolute path.
    pub fn texture_from_path(
        &mut self,
        path: impl AsRef<Path>,
        flipped: bool,
        filter: Filter,
    ) -> TextureResult<Rc<Texture>> {
        let path = path.as_ref();
        let absolute = path::absolute(path).map_err(|source| TextureError::Io {
            resource: path.display().to_string(),
            source,
        })?;
        let resource = match absolute.to_str() {
            Some(resource) => resource.to_string(),
            None => {
                return Err(TextureError::Io {
                    resource: absolute.display().to_string(),
                    source: io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "texture path is not valid UTF-8",
                    ),
                });
            }
        };

        if let Some(tex) = self.get(&resource, filter.family()) {
            log::debug!("Texture cache hit: '{}' ({:?})", resource, filter.family());
            return Ok(tex);
        }

        let file = File::open(&absolute).map_err(|source| TextureError::Io {
            resource: resource.clone(),
            source,
        })?;
        self.texture(BufReader::new(file), &resource, flipped, filter)
    }

    /// Upload a programmatic image. Never cached: every call allocates a
    /// fresh driver handle.
    pub fn texture_from_image(
        &mut self,
        image: &ImageData,
        filter: Filter,
    ) -> TextureResult<Rc<Texture>> {
        let name = format!("generated:{}x{}", image.width, image.height);
        Ok(Rc::new(self.upload(name, image, filter)?))
    }

    fn upload(
        &mut self,
        name: String,
        image: &ImageData,
        filter: Filter,
    ) -> TextureResult<Texture> {
        check_image(image).map_err(|err| {
            log::warn!("Rejecting image for '{}': {}", name, err);
            TextureError::decode(name.as_str(), err)
        })?;

        let source_format = SourceFormat::from(image.depth);
        let upload = ImageUpload {
            internal_format: self.config.internal_format(),
            width: image.texture_width,
            height: image.texture_height,
            source_format,
            pixel_type: PixelType::UnsignedByte,
            data: &image.pixels,
        };
        let handle = submit(&mut self.driver, &upload, filter).map_err(|err| {
            log::warn!("Uploading '{}' failed: {}", name, err);
            TextureError::driver(name.as_str(), err)
        })?;

        log::info!(
            "Created texture {} '{}': {}x{} on {}x{} surface, {:?} -> {:?}, {:?}",
            handle,
            name,
            image.width,
            image.height,
            image.texture_width,
            image.texture_height,
            source_format,
            upload.internal_format,
            filter
        );

        Ok(Texture::new(
            name,
            TARGET,
            handle,
            (image.width, image.height),
            (image.texture_width, image.texture_height),
            image.has_alpha(),
        ))
    }

    fn table(&self, family: FilterFamily) -> &HashMap<String, Rc<Texture>> {
        match family {
            FilterFamily::Nearest => &self.nearest,
            FilterFamily::Linear => &self.linear,
        }
    }

    fn table_mut(&mut self, family: FilterFamily) -> &mut HashMap<String, Rc<Texture>> {
        match family {
            FilterFamily::Nearest => &mut self.nearest,
            FilterFamily::Linear => &mut self.linear,
        }
    }
}

/// Allocate, bind, configure and fill one driver texture.
fn submit<D: GpuDriver>(
    driver: &mut D,
    upload: &ImageUpload<'_>,
    filter: Filter,
) -> Result<DriverHandle, DriverError> {
    let handle = driver.allocate_handle()?;
    match fill(driver, handle, upload, filter) {
        Ok(()) => Ok(handle),
        Err(err) => {
            if let Err(release_err) = driver.release_handle(handle) {
                log::warn!("Releasing {} failed: {}", handle, release_err);
            }
            Err(err)
        }
    }
}

fn fill<D: GpuDriver>(
    driver: &mut D,
    handle: DriverHandle,
    upload: &ImageUpload<'_>,
    filter: Filter,
) -> Result<(), DriverError> {
    let min_filter = filter.min_filter();
    driver.bind(TARGET, handle)?;
    driver.set_min_filter(TARGET, min_filter)?;
    driver.set_mag_filter(TARGET, filter.mag_filter())?;
    if min_filter.uses_mipmaps() {
        driver.generate_mipmaps_2d(TARGET, upload)
    } else {
        driver.upload_image_2d(TARGET, upload)
    }
}

/// Decoders are external; their metadata is checked before it reaches the driver.
fn check_image(image: &ImageData) -> Result<(), DecodeError> {
    if image.width == 0 || image.height == 0 {
        return Err(DecodeError::Malformed(format!(
            "image has no pixels ({}x{})",
            image.width, image.height
        )));
    }
    let padded = match (
        checked_pad_to_pow2(image.width),
        checked_pad_to_pow2(image.height),
    ) {
        (Some(w), Some(h)) => (w, h),
        _ => {
            return Err(DecodeError::Malformed(format!(
                "image size {}x{} has no power-of-two surface",
                image.width, image.height
            )));
        }
    };
    if (image.texture_width, image.texture_height) != padded {
        return Err(DecodeError::Malformed(format!(
            "padded size {}x{} does not match {}x{} for a {}x{} image",
            image.texture_width, image.texture_height, padded.0, padded.1, image.width, image.height
        )));
    }
    let expected =
        image.texture_width as usize * image.texture_height as usize * image.bytes_per_pixel();
    if image.pixels.len() < expected {
        return Err(DecodeError::Truncated);
    }
    Ok(())
}

use std::path::Path;

/// Decoded RGBA8 pixels ready for [`GpuTexture::upload`](super::GpuTexture::upload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to decode image from memory: {0}")]
    DecodeBytes(#[source] image::ImageError),
}

impl ImageData {
    /// Decodes an image file (any format enabled on the `image` crate) to RGBA8.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let path = path.as_ref();
        log::debug!("decoding image {}", path.display());

        let decoded = image::open(path).map_err(|source| ImageError::Decode {
            path: path.display().to_string(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();

        log::info!("decoded {}x{} image from {}", width, height, path.display());
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// Decodes an in-memory encoded image to RGBA8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        let rgba = image::load_from_memory(bytes)
            .map_err(ImageError::DecodeBytes)?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// Single-color image.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let texels = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: rgba.repeat(texels),
        }
    }

    /// Two-color checkerboard with square cells of `cell` pixels.
    pub fn checkerboard(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let even = ((x / cell) + (y / cell)) % 2 == 0;
                pixels.extend_from_slice(if even { &a } else { &b });
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }
}

use std::path::PathBuf;

use anyhow::Context;

use crate::foundation::core::{Dimensions, PixelBuffer};
use crate::foundation::error::ImagoResult;

/// Pull-based source-image supplier.
///
/// `decode` is called exactly once per provider assignment, on the
/// render thread, when the engine resolves a pending texture update.
pub trait ImageProvider: Send {
    fn decode(&self) -> ImagoResult<PixelBuffer>;
}

/// Decodes the source image from a file path via the `image` crate.
#[derive(Clone, Debug)]
pub struct FileImageProvider {
    path: PathBuf,
}

impl FileImageProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ImageProvider for FileImageProvider {
    fn decode(&self) -> ImagoResult<PixelBuffer> {
        let dyn_img = image::open(&self.path)
            .with_context(|| format!("decode image from {}", self.path.display()))?;
        buffer_from_dynamic(dyn_img)
    }
}

/// Decodes the source image from an in-memory encoded byte buffer.
#[derive(Clone, Debug)]
pub struct MemoryImageProvider {
    bytes: Vec<u8>,
}

impl MemoryImageProvider {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl ImageProvider for MemoryImageProvider {
    fn decode(&self) -> ImagoResult<PixelBuffer> {
        let dyn_img =
            image::load_from_memory(&self.bytes).context("decode image from memory")?;
        buffer_from_dynamic(dyn_img)
    }
}

fn buffer_from_dynamic(dyn_img: image::DynamicImage) -> ImagoResult<PixelBuffer> {
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    PixelBuffer::new(Dimensions::new(width, height)?, rgba.into_raw())
}

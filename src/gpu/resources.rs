use crate::foundation::core::{Dimensions, PixelBuffer};
use crate::foundation::error::ImagoResult;
use crate::gpu::backend::{GeometryId, SharedBackend, TargetId, TextureId};

/// An owned GPU 2D image.
///
/// Move-only: the destructor frees the underlying allocation exactly
/// once, so use-after-release is unrepresentable rather than guarded at
/// runtime.
pub struct Texture {
    backend: SharedBackend,
    id: TextureId,
    dimensions: Dimensions,
}

impl Texture {
    /// Allocates an empty texture, typically as a render-target backing
    /// store.
    pub fn empty(backend: &SharedBackend, dimensions: Dimensions) -> ImagoResult<Self> {
        let id = backend.create_texture(dimensions)?;
        Ok(Self {
            backend: backend.clone(),
            id,
            dimensions,
        })
    }

    /// Bulk-allocates `count` empty textures in one backend round trip.
    pub fn empty_many(
        backend: &SharedBackend,
        count: usize,
        dimensions: Dimensions,
    ) -> ImagoResult<Vec<Self>> {
        let ids = backend.create_textures(count, dimensions)?;
        Ok(ids
            .into_iter()
            .map(|id| Self {
                backend: backend.clone(),
                id,
                dimensions,
            })
            .collect())
    }

    /// Uploads a decoded image, consuming (and thereby freeing) the
    /// source pixel buffer as soon as the upload is issued.
    ///
    /// Scanlines are uploaded bottom-up; the first layer pass applies
    /// the Y-invert to reorient them, exactly once per pipeline.
    pub fn from_pixels(
        backend: &SharedBackend,
        source: PixelBuffer,
        mipmaps: bool,
    ) -> ImagoResult<Self> {
        let dimensions = source.dimensions;
        let flipped = flip_rows(&source.data, dimensions);
        drop(source);
        let id = backend.upload_texture(dimensions, &flipped, mipmaps)?;
        Ok(Self {
            backend: backend.clone(),
            id,
            dimensions,
        })
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.backend.delete_texture(self.id);
    }
}

/// Reverses scanline order of an RGBA8 buffer.
pub(crate) fn flip_rows(data: &[u8], dimensions: Dimensions) -> Vec<u8> {
    let row_bytes = dimensions.width as usize * 4;
    let mut out = Vec::with_capacity(data.len());
    for row in data.chunks_exact(row_bytes).rev() {
        out.extend_from_slice(row);
    }
    out
}

/// A render target with one texture as its color destination.
///
/// The target does not own its texture; the owning slot (swap chain or
/// engine) keeps the texture alive for at least as long as the target.
pub struct RenderTarget {
    backend: SharedBackend,
    id: TargetId,
}

impl RenderTarget {
    pub fn new(backend: &SharedBackend, texture: &Texture) -> ImagoResult<Self> {
        let id = backend.create_render_target(texture.id())?;
        Ok(Self {
            backend: backend.clone(),
            id,
        })
    }

    pub fn id(&self) -> TargetId {
        self.id
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        self.backend.delete_render_target(self.id);
    }
}

/// A static vertex+index buffer pair, created once and reused for every
/// draw.
pub struct GeometryBuffer {
    backend: SharedBackend,
    id: GeometryId,
}

impl GeometryBuffer {
    pub fn new(
        backend: &SharedBackend,
        vertices: &[f32],
        indices: &[u16],
    ) -> ImagoResult<Self> {
        let id = backend.create_geometry(vertices, indices)?;
        Ok(Self {
            backend: backend.clone(),
            id,
        })
    }

    pub fn id(&self) -> GeometryId {
        self.id
    }
}

impl Drop for GeometryBuffer {
    fn drop(&mut self) {
        self.backend.delete_geometry(self.id);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gpu/resources.rs"]
mod tests;

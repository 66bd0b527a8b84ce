use crate::foundation::core::{Dimensions, PixelBuffer};
use crate::foundation::error::ImagoResult;
use crate::gpu::backend::SharedBackend;
use crate::gpu::resources::{self, RenderTarget, Texture};

const LENGTH: usize = 2;

struct Slot {
    texture: Texture,
    target: RenderTarget,
}

/// A fixed pair of texture+render-target slots used to chain passes.
///
/// Reads come from the slot at the current index, writes go to the next
/// slot, so a pass can never sample the texture it is rendering into.
/// [`Swapchain::advance`] rotates the read index after each pass.
pub struct Swapchain {
    backend: SharedBackend,
    dimensions: Dimensions,
    slots: Vec<Slot>,
    index: usize,
}

impl Swapchain {
    /// Allocates both textures in one bulk call and attaches each to its
    /// own render target.
    pub fn create(backend: &SharedBackend, dimensions: Dimensions) -> ImagoResult<Self> {
        let textures = Texture::empty_many(backend, LENGTH, dimensions)?;
        let slots = textures
            .into_iter()
            .map(|texture| {
                let target = RenderTarget::new(backend, &texture)?;
                Ok(Slot { texture, target })
            })
            .collect::<ImagoResult<Vec<_>>>()?;

        Ok(Self {
            backend: backend.clone(),
            dimensions,
            slots,
            index: 0,
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The texture to sample from.
    pub fn texture(&self) -> &Texture {
        &self.slots[self.index].texture
    }

    /// The target to render into; always the slot after the read slot.
    pub fn render_target(&self) -> &RenderTarget {
        &self.slots[self.next_index()].target
    }

    /// Rotates the read index forward after a pass completes.
    pub fn advance(&mut self) {
        self.index = self.next_index();
    }

    /// Reads the current read texture back as a top-down [`PixelBuffer`].
    ///
    /// The chain stores scanlines bottom-up (the source-upload
    /// convention), so the rows are reversed here. Only meaningful once
    /// a pass has rendered into the read slot; used by the export path.
    pub fn read_pixels(&self) -> ImagoResult<PixelBuffer> {
        let raw = self
            .backend
            .read_pixels(self.slots[self.index].target.id(), self.dimensions)?;
        PixelBuffer::new(self.dimensions, resources::flip_rows(&raw, self.dimensions))
    }

    fn next_index(&self) -> usize {
        (self.index + 1) % LENGTH
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gpu/swapchain.rs"]
mod tests;

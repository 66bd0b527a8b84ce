use std::sync::Arc;

use glam::Mat4;

use crate::engine::ExportCallback;
use crate::foundation::core::Dimensions;
use crate::gpu::quad::Quad;
use crate::gpu::resources::Texture;
use crate::gpu::swapchain::Swapchain;
use crate::layer::Layer;
use crate::provider::ImageProvider;
use crate::shader::factory::LayerShaderFactory;

/// One immutable snapshot of the render session.
///
/// Every mutation replaces the whole snapshot (struct-update over
/// `mem::take`), never edits fields of a live one, so a frame always
/// sees one coherent state. The `pending_*` flags record work the render
/// thread must resolve before the next draw; they let expensive steps
/// (decode, reallocation) run once even when several updates land
/// between frames.
#[derive(Default)]
pub(crate) struct EngineState {
    /// Set once the surface exists and the static resources are built.
    pub ready: bool,
    pub layers: Vec<Arc<dyn Layer>>,
    pub image_provider: Option<Box<dyn ImageProvider>>,
    /// Source texture, staged from the provider's decoded pixels.
    pub image: Option<Texture>,
    /// Viewport-fit chain used by the preview pipeline.
    pub swapchain: Option<Swapchain>,
    /// Letterbox transform for the final preview pass.
    pub aspect_matrix: Mat4,
    pub viewport: Option<Dimensions>,
    pub factory: Option<LayerShaderFactory>,
    pub quad: Option<Quad>,
    pub pending_texture: bool,
    pub pending_swapchain: bool,
    pub pending_aspect: bool,
    pub pending_export: bool,
    pub export_callback: Option<ExportCallback>,
}

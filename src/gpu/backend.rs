use std::rc::Rc;

use glam::Mat4;

use crate::foundation::core::Dimensions;
use crate::foundation::error::ImagoResult;

/// Raw handle to a backend 2D texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Raw handle to a backend render target (framebuffer).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetId(pub u64);

/// Raw handle to a backend vertex+index geometry pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryId(pub u64);

/// Raw handle to a compiled-but-unlinked shader stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StageId(pub u64);

/// Raw handle to a linked, usable shader program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Where a draw call writes: an off-screen target or the visible surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    Target(TargetId),
    Surface,
}

/// One full-screen-quad pass: sample `source`, run `program`, write the
/// result into `destination` at `dimensions`.
#[derive(Clone, Copy, Debug)]
pub struct DrawCall {
    pub program: ProgramId,
    pub geometry: GeometryId,
    pub source: TextureId,
    pub destination: Destination,
    pub dimensions: Dimensions,
    /// Letterbox transform; identity for off-screen passes.
    pub aspect: Mat4,
    /// Vertical flip; identity except on the pass where scanlines first
    /// enter the pipeline.
    pub invert: Mat4,
    pub intensity: f32,
    /// [`BlendMode`](crate::BlendMode) ordinal matched in the fragment
    /// template.
    pub blend_mode: u32,
    /// Custom uniform block filled by the layer's `bind` hook.
    pub params: [f32; 16],
    /// Color the destination is cleared to before the quad is drawn.
    pub clear_color: [f32; 4],
}

/// The raw graphics-API surface the engine draws through.
///
/// Implementations are single-threaded: every call happens on the one
/// render thread that owns the graphics context. Resource wrappers in
/// [`crate::gpu::resources`] pair each `create_*` with the matching
/// `delete_*` in their destructors, so a delete is issued exactly once
/// per allocation.
///
/// Allocation failures are surfaced as [`crate::ImagoError::Gpu`] and
/// treated as fatal by the engine; shader compile/link failures are the
/// only recoverable errors.
pub trait GpuBackend {
    /// Allocates an empty RGBA8 texture, e.g. as a render-target backing
    /// store.
    fn create_texture(&self, dimensions: Dimensions) -> ImagoResult<TextureId>;

    /// Bulk-allocates `count` empty textures of one size in a single
    /// backend round trip (swap-chain construction).
    fn create_textures(&self, count: usize, dimensions: Dimensions) -> ImagoResult<Vec<TextureId>>;

    /// Allocates a texture and uploads `pixels` (RGBA8, row-major, one
    /// row per scanline as given), optionally generating a mip chain.
    fn upload_texture(
        &self,
        dimensions: Dimensions,
        pixels: &[u8],
        mipmaps: bool,
    ) -> ImagoResult<TextureId>;

    fn delete_texture(&self, id: TextureId);

    /// Creates a render target with `texture` as its color destination.
    /// The target does not own the texture.
    fn create_render_target(&self, texture: TextureId) -> ImagoResult<TargetId>;

    fn delete_render_target(&self, id: TargetId);

    /// Uploads one static interleaved vertex buffer and one index buffer.
    fn create_geometry(&self, vertices: &[f32], indices: &[u16]) -> ImagoResult<GeometryId>;

    fn delete_geometry(&self, id: GeometryId);

    /// Compiles one shader stage; a failed compile is reported as
    /// `Err(Shader)` with the backend's diagnostic text.
    fn compile_stage(&self, kind: StageKind, source: &str) -> ImagoResult<StageId>;

    fn delete_stage(&self, id: StageId);

    /// Links a vertex and a fragment stage into a usable program.
    fn link_program(&self, vertex: StageId, fragment: StageId) -> ImagoResult<ProgramId>;

    fn delete_program(&self, id: ProgramId);

    /// Executes one full-screen pass.
    fn draw(&self, call: &DrawCall) -> ImagoResult<()>;

    /// Reads the texture behind `target` back as RGBA8 bytes in the
    /// texture's stored row order.
    fn read_pixels(&self, target: TargetId, dimensions: Dimensions) -> ImagoResult<Vec<u8>>;

    /// Clears the visible surface.
    fn clear_surface(&self, color: [f32; 4]) -> ImagoResult<()>;
}

/// Backends are shared by reference among the render-thread wrappers.
pub type SharedBackend = Rc<dyn GpuBackend>;

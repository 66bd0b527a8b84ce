//! Imago is a GPU image-filter compositing engine.
//!
//! It applies an ordered stack of shader "layers" to a source image and
//! produces either a live, viewport-bound preview or a one-shot
//! full-resolution export image.
//!
//! # Pipeline overview
//!
//! 1. **Stage**: an [`ImageProvider`] decodes the source image once per
//!    assignment; the engine uploads it as a texture and sizes a
//!    two-slot [`Swapchain`] to fit the viewport.
//! 2. **Derive**: every render tick the engine resolves pending updates
//!    and derives a render context (blank / preview / export) from an
//!    immutable session-state snapshot.
//! 3. **Draw**: layers are applied in order, ping-ponging through the
//!    swap chain; the last pass lands on the visible surface (preview)
//!    or in an off-screen target whose pixels are read back (export).
//!
//! Key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single-threaded rendering**: all GPU calls happen on one render
//!   thread; control-thread mutations are queued through [`EngineHandle`].
//! - **Whole-snapshot state**: session state is replaced wholesale on
//!   every mutation, never partially updated in place.
//! - **One program per layer kind**: shaders are cached by stable layer
//!   type identity, not per instance.
//!
//! The graphics API sits behind the [`GpuBackend`] trait; the `gpu`
//! cargo feature enables the wgpu implementation.
#![forbid(unsafe_code)]

mod engine;
mod foundation;
mod gpu;
mod layer;
mod provider;
mod shader;

pub use engine::{Engine, EngineHandle, EngineSettings, ExportCallback, RenderScheduler};
pub use foundation::core::{
    Dimensions, Mat4, PixelBuffer, aspect_fit_matrix, invert_y_matrix, scale_matrix,
};
pub use foundation::error::{ImagoError, ImagoResult};
pub use gpu::backend::{
    Destination, DrawCall, GeometryId, GpuBackend, ProgramId, SharedBackend, StageId, StageKind,
    TargetId, TextureId,
};
pub use gpu::quad::Quad;
pub use gpu::resources::{GeometryBuffer, RenderTarget, Texture};
pub use gpu::swapchain::Swapchain;
pub use layer::{BlendMode, Layer, LayerParams, ShaderKey};
pub use provider::{FileImageProvider, ImageProvider, MemoryImageProvider};
pub use shader::factory::LayerShaderFactory;
pub use shader::program::{ShaderProgram, ShaderStage};

#[cfg(feature = "gpu")]
pub use gpu::wgpu_backend::WgpuBackend;

pub mod backend;
pub mod quad;
pub mod resources;
pub mod swapchain;

#[cfg(feature = "gpu")]
pub mod wgpu_backend;

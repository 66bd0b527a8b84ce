pub(crate) mod context;
pub(crate) mod state;

use std::sync::Arc;
use std::sync::mpsc;

use glam::Mat4;
use tracing::{debug, warn};

use crate::engine::state::EngineState;
use crate::foundation::core::{Dimensions, PixelBuffer, aspect_fit_matrix};
use crate::foundation::error::ImagoResult;
use crate::gpu::backend::SharedBackend;
use crate::gpu::quad::Quad;
use crate::gpu::resources::Texture;
use crate::gpu::swapchain::Swapchain;
use crate::layer::Layer;
use crate::provider::ImageProvider;
use crate::shader::factory::LayerShaderFactory;

/// Receives the finished export image, posted through the host's
/// [`RenderScheduler`] after the frame that produced it.
pub type ExportCallback = Box<dyn FnOnce(PixelBuffer) + Send>;

/// Bridge to the platform's frame loop. Implementations ask for a
/// render-thread frame to be scheduled soon and run completion tasks
/// away from the render loop. Called from any thread.
pub trait RenderScheduler: Send + Sync {
    fn request_render(&self);

    /// Runs a completion task off the render thread, typically on the
    /// host's main thread. Export results are delivered through here so
    /// the frame never blocks on the caller's handler.
    fn post(&self, task: Box<dyn FnOnce() + Send>);
}

#[derive(Clone, Copy, Debug)]
pub struct EngineSettings {
    /// Color the surface is cleared to before each pass.
    pub clear_color: [f32; 4],
    /// Generate a mip chain for the source texture so heavily downscaled
    /// previews sample smoothly.
    pub mipmap_source: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            mipmap_source: true,
        }
    }
}

enum Command {
    SetLayers(Vec<Arc<dyn Layer>>),
    SetImageProvider(Box<dyn ImageProvider>),
    Export(ExportCallback),
}

/// Cloneable control-thread handle to a running [`Engine`].
///
/// Mutations are queued and applied by the render thread at the start of
/// its next frame; each queued mutation also asks the scheduler for a
/// frame. Commands sent after the engine is dropped are discarded.
#[derive(Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<Command>,
    scheduler: Arc<dyn RenderScheduler>,
}

impl EngineHandle {
    /// Replaces the layer stack for subsequent frames.
    pub fn set_layers(&self, layers: Vec<Arc<dyn Layer>>) {
        self.send(Command::SetLayers(layers));
    }

    /// Replaces the source image. Decoding happens once, on the render
    /// thread, before the next frame that needs it.
    pub fn set_image_provider(&self, provider: Box<dyn ImageProvider>) {
        self.send(Command::SetImageProvider(provider));
    }

    /// Requests a one-shot full-resolution export of the current stack.
    /// The callback is posted through the [`RenderScheduler`] once the
    /// frame completes.
    pub fn export(&self, callback: ExportCallback) {
        self.send(Command::Export(callback));
    }

    /// Asks the scheduler for a frame without queuing a mutation.
    pub fn request_render(&self) {
        self.scheduler.request_render();
    }

    fn send(&self, command: Command) {
        if self.sender.send(command).is_ok() {
            self.scheduler.request_render();
        }
    }
}

/// The render-thread orchestrator.
///
/// Owns the session state and the GPU backend; everything here runs on
/// the one thread that owns the graphics context. The platform calls
/// [`Engine::surface_created`], [`Engine::surface_resized`] and
/// [`Engine::render_frame`] from its surface lifecycle, and hands
/// [`Engine::handle`] clones to control-thread code.
pub struct Engine {
    backend: SharedBackend,
    settings: EngineSettings,
    state: EngineState,
    commands: mpsc::Receiver<Command>,
    handle: EngineHandle,
}

impl Engine {
    pub fn new(
        backend: SharedBackend,
        settings: EngineSettings,
        scheduler: Arc<dyn RenderScheduler>,
    ) -> Self {
        let (sender, commands) = mpsc::channel();
        let handle = EngineHandle { sender, scheduler };
        Self {
            backend,
            settings,
            state: EngineState::default(),
            commands,
            handle,
        }
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Builds the static per-surface resources (quad, vertex stage,
    /// bypass program) and marks the engine ready to draw. Call again
    /// after [`Engine::teardown`] when the platform recreates the
    /// surface.
    #[tracing::instrument(skip(self))]
    pub fn surface_created(&mut self) -> ImagoResult<()> {
        let quad = Quad::create(&self.backend)?;
        let factory = LayerShaderFactory::create(&self.backend)?;
        self.state = EngineState {
            ready: true,
            quad: Some(quad),
            factory: Some(factory),
            ..std::mem::take(&mut self.state)
        };
        debug!("surface resources created");
        Ok(())
    }

    /// Records the new viewport and schedules swap-chain and aspect
    /// recomputation. A size equal to the current viewport is a no-op,
    /// so redundant resize callbacks do not churn GPU allocations.
    pub fn surface_resized(&mut self, viewport: Dimensions) {
        if self.state.viewport == Some(viewport) {
            return;
        }
        debug!(%viewport, "viewport changed");
        self.state = EngineState {
            viewport: Some(viewport),
            pending_swapchain: true,
            pending_aspect: true,
            ..std::mem::take(&mut self.state)
        };
    }

    /// Runs one frame: drains queued mutations, resolves pending work,
    /// derives the render context and draws it. Errors here are GPU
    /// failures and are fatal for the session.
    pub fn render_frame(&mut self) -> ImagoResult<()> {
        self.drain_commands();
        self.resolve_pending()?;

        let Some(render_context) = self.state.render_context() else {
            return Ok(());
        };
        let exported = context::draw(
            &self.backend,
            &self.settings,
            &mut self.state,
            render_context,
        )?;

        if self.state.pending_export {
            let callback = self.state.export_callback.take();
            self.state = EngineState {
                pending_export: false,
                ..std::mem::take(&mut self.state)
            };
            match (exported, callback) {
                (Some(buffer), Some(callback)) => {
                    debug!(dimensions = %buffer.dimensions, "export complete");
                    self.handle
                        .scheduler
                        .post(Box::new(move || callback(buffer)));
                }
                _ => warn!("export request dropped, it needs a staged image and a layer stack"),
            }
        }
        Ok(())
    }

    /// Releases every GPU resource and returns to the not-ready state.
    /// The handle stays valid; its commands take effect after the next
    /// [`Engine::surface_created`].
    pub fn teardown(&mut self) {
        self.state = EngineState::default();
        debug!("engine torn down");
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                Command::SetLayers(layers) => {
                    self.state = EngineState {
                        layers,
                        ..std::mem::take(&mut self.state)
                    };
                }
                Command::SetImageProvider(provider) => {
                    self.state = EngineState {
                        image_provider: Some(provider),
                        image: None,
                        pending_texture: true,
                        pending_swapchain: true,
                        pending_aspect: true,
                        ..std::mem::take(&mut self.state)
                    };
                }
                Command::Export(callback) => {
                    self.state = EngineState {
                        pending_export: true,
                        export_callback: Some(callback),
                        ..std::mem::take(&mut self.state)
                    };
                }
            }
        }
    }

    /// Resolves pending work in dependency order: texture before swap
    /// chain and aspect, since both are sized from the staged image.
    fn resolve_pending(&mut self) -> ImagoResult<()> {
        if !self.state.ready {
            return Ok(());
        }

        if self.state.pending_texture {
            let image = match &self.state.image_provider {
                Some(provider) => match provider.decode() {
                    Ok(buffer) => Some(Texture::from_pixels(
                        &self.backend,
                        buffer,
                        self.settings.mipmap_source,
                    )?),
                    Err(err) => {
                        warn!(error = %err, "source image decode failed, staying blank");
                        None
                    }
                },
                None => None,
            };
            self.state = EngineState {
                image,
                pending_texture: false,
                ..std::mem::take(&mut self.state)
            };
        }

        if self.state.pending_swapchain {
            let swapchain = match (&self.state.image, self.state.viewport) {
                (Some(image), Some(viewport)) => {
                    let fitted = image.dimensions().fit_inside(viewport);
                    Some(Swapchain::create(&self.backend, fitted)?)
                }
                _ => None,
            };
            self.state = EngineState {
                swapchain,
                pending_swapchain: false,
                ..std::mem::take(&mut self.state)
            };
        }

        if self.state.pending_aspect {
            let aspect_matrix = match (&self.state.image, self.state.viewport) {
                (Some(image), Some(viewport)) => {
                    aspect_fit_matrix(image.dimensions().aspect_ratio(), viewport.aspect_ratio())
                }
                _ => Mat4::IDENTITY,
            };
            self.state = EngineState {
                aspect_matrix,
                pending_aspect: false,
                ..std::mem::take(&mut self.state)
            };
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/engine/engine.rs"]
mod tests;

use glam::Mat4;

use crate::engine::EngineSettings;
use crate::engine::state::EngineState;
use crate::foundation::core::{Dimensions, PixelBuffer, invert_y_matrix};
use crate::foundation::error::{ImagoError, ImagoResult};
use crate::gpu::backend::{Destination, DrawCall, SharedBackend, TextureId};
use crate::gpu::quad::Quad;
use crate::gpu::swapchain::Swapchain;
use crate::layer::{BlendMode, Layer, LayerParams};
use crate::shader::factory::LayerShaderFactory;

/// What a frame renders, derived fresh from the state snapshot each
/// tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RenderContext {
    /// Nothing staged; the surface is cleared to the settings color.
    Blank,
    /// Viewport-fit pipeline ending on the visible surface.
    Preview,
    /// Full-resolution pipeline ending in a pixel readback.
    Export,
}

impl EngineState {
    /// `None` until the surface resources exist; drawing before then
    /// would dereference resources that are not there yet.
    pub(crate) fn render_context(&self) -> Option<RenderContext> {
        if !self.ready || self.quad.is_none() || self.factory.is_none() {
            return None;
        }
        Some(match (&self.image, &self.swapchain) {
            (Some(_), _) if self.wants_export() => RenderContext::Export,
            (Some(_), Some(_)) => RenderContext::Preview,
            _ => RenderContext::Blank,
        })
    }

    /// An export needs an image, at least one layer and a registered
    /// callback; anything less degrades the request to a no-op.
    fn wants_export(&self) -> bool {
        self.pending_export && !self.layers.is_empty() && self.export_callback.is_some()
    }
}

/// Runs one frame for the derived context. Returns the exported pixels
/// when the context was [`RenderContext::Export`].
pub(crate) fn draw(
    backend: &SharedBackend,
    settings: &EngineSettings,
    state: &mut EngineState,
    context: RenderContext,
) -> ImagoResult<Option<PixelBuffer>> {
    match context {
        RenderContext::Blank => {
            backend.clear_surface(settings.clear_color)?;
            Ok(None)
        }
        RenderContext::Preview => {
            draw_preview(backend, settings, state)?;
            Ok(None)
        }
        RenderContext::Export => draw_export(backend, settings, state).map(Some),
    }
}

/// Preview pass routing:
///
/// - the first pass samples the source texture and applies the Y-invert
///   (scanlines enter the pipeline exactly once);
/// - intermediate passes ping-pong through the swap chain with identity
///   matrices;
/// - the last pass writes to the visible surface at viewport size with
///   the aspect-fit transform.
///
/// An empty layer list collapses to a single bypass pass that is first
/// and last at once.
fn draw_preview(
    backend: &SharedBackend,
    settings: &EngineSettings,
    state: &mut EngineState,
) -> ImagoResult<()> {
    let EngineState {
        layers,
        image,
        swapchain,
        aspect_matrix,
        viewport,
        factory,
        quad,
        ..
    } = state;
    let (Some(image), Some(swapchain), Some(factory), Some(quad), Some(viewport)) = (
        image.as_ref(),
        swapchain.as_mut(),
        factory.as_mut(),
        quad.as_ref(),
        *viewport,
    ) else {
        return Ok(());
    };

    if layers.is_empty() {
        return backend.draw(&DrawCall {
            program: factory.bypass().id(),
            geometry: quad.geometry_id(),
            source: image.id(),
            destination: Destination::Surface,
            dimensions: viewport,
            aspect: *aspect_matrix,
            invert: invert_y_matrix(),
            intensity: 1.0,
            blend_mode: BlendMode::Normal.ordinal(),
            params: [0.0; 16],
            clear_color: settings.clear_color,
        });
    }

    let last = layers.len() - 1;
    for (index, layer) in layers.iter().enumerate() {
        let source = if index == 0 {
            image.id()
        } else {
            swapchain.texture().id()
        };
        let (destination, dimensions, aspect) = if index == last {
            (Destination::Surface, viewport, *aspect_matrix)
        } else {
            (
                Destination::Target(swapchain.render_target().id()),
                swapchain.dimensions(),
                Mat4::IDENTITY,
            )
        };
        let invert = if index == 0 {
            invert_y_matrix()
        } else {
            Mat4::IDENTITY
        };

        draw_layer(
            backend,
            settings,
            factory,
            quad,
            layer.as_ref(),
            source,
            destination,
            dimensions,
            aspect,
            invert,
        )?;

        if matches!(destination, Destination::Target(_)) {
            swapchain.advance();
        }
    }
    Ok(())
}

/// Export runs at full source resolution through a throwaway chain, with
/// identity matrices throughout: the chain keeps the stored scanline
/// order and [`Swapchain::read_pixels`] restores top-down rows at the
/// end. The chain (and both its textures) is freed as soon as the
/// readback completes.
fn draw_export(
    backend: &SharedBackend,
    settings: &EngineSettings,
    state: &mut EngineState,
) -> ImagoResult<PixelBuffer> {
    let EngineState {
        layers,
        image,
        factory,
        quad,
        ..
    } = state;
    let (Some(image), Some(factory), Some(quad)) =
        (image.as_ref(), factory.as_mut(), quad.as_ref())
    else {
        return Err(ImagoError::validation("export drawn without a staged image"));
    };

    let mut chain = Swapchain::create(backend, image.dimensions())?;
    let dimensions = chain.dimensions();

    for (index, layer) in layers.iter().enumerate() {
        let source = if index == 0 {
            image.id()
        } else {
            chain.texture().id()
        };
        draw_layer(
            backend,
            settings,
            factory,
            quad,
            layer.as_ref(),
            source,
            Destination::Target(chain.render_target().id()),
            dimensions,
            Mat4::IDENTITY,
            Mat4::IDENTITY,
        )?;
        chain.advance();
    }

    chain.read_pixels()
}

/// Draws one layer pass. When the layer's shader is unavailable the
/// bypass program stands in, so the input passes through unmodified and
/// the pass routing around it stays identical.
#[allow(clippy::too_many_arguments)]
fn draw_layer(
    backend: &SharedBackend,
    settings: &EngineSettings,
    factory: &mut LayerShaderFactory,
    quad: &Quad,
    layer: &dyn Layer,
    source: TextureId,
    destination: Destination,
    dimensions: Dimensions,
    aspect: Mat4,
    invert: Mat4,
) -> ImagoResult<()> {
    let mut call = DrawCall {
        program: factory.bypass().id(),
        geometry: quad.geometry_id(),
        source,
        destination,
        dimensions,
        aspect,
        invert,
        intensity: 1.0,
        blend_mode: BlendMode::Normal.ordinal(),
        params: [0.0; 16],
        clear_color: settings.clear_color,
    };

    if let Some(program) = factory.shader_for(layer) {
        let mut params = LayerParams::default();
        layer.bind(&mut params);
        call.program = program.id();
        call.intensity = layer.intensity();
        call.blend_mode = layer.blend_mode().ordinal();
        call.params = params.as_array();
    }

    backend.draw(&call)
}

#[cfg(test)]
#[path = "../../tests/unit/engine/context.rs"]
mod tests;

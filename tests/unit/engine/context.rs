use super::*;

#[path = "../harness.rs"]
mod harness;

use std::sync::Arc;

use harness::{GrayscaleLayer, TestBackend};

use crate::gpu::resources::Texture;
use crate::shader::factory::LayerShaderFactory;

fn ready_state(shared: &SharedBackend) -> EngineState {
    EngineState {
        ready: true,
        factory: Some(LayerShaderFactory::create(shared).unwrap()),
        quad: Some(Quad::create(shared).unwrap()),
        ..EngineState::default()
    }
}

#[test]
fn no_context_before_surface_resources_exist() {
    let state = EngineState::default();
    assert_eq!(state.render_context(), None);
}

#[test]
fn blank_until_an_image_and_chain_are_staged() {
    let (_, shared) = TestBackend::shared();
    let dimensions = Dimensions::new(8, 8).unwrap();

    let mut state = ready_state(&shared);
    assert_eq!(state.render_context(), Some(RenderContext::Blank));

    // An image alone is not previewable; the chain is sized from the
    // viewport, which may not exist yet.
    state.image = Some(Texture::empty(&shared, dimensions).unwrap());
    assert_eq!(state.render_context(), Some(RenderContext::Blank));

    state.swapchain = Some(Swapchain::create(&shared, dimensions).unwrap());
    assert_eq!(state.render_context(), Some(RenderContext::Preview));
}

#[test]
fn pending_export_takes_precedence_over_preview() {
    let (_, shared) = TestBackend::shared();
    let dimensions = Dimensions::new(8, 8).unwrap();

    let mut state = ready_state(&shared);
    state.image = Some(Texture::empty(&shared, dimensions).unwrap());
    state.swapchain = Some(Swapchain::create(&shared, dimensions).unwrap());
    state.layers = vec![Arc::new(GrayscaleLayer { intensity: 1.0 })];
    state.pending_export = true;
    state.export_callback = Some(Box::new(|_| {}));
    assert_eq!(state.render_context(), Some(RenderContext::Export));

    // Export does not need the preview chain, only the image.
    state.swapchain = None;
    assert_eq!(state.render_context(), Some(RenderContext::Export));
}

#[test]
fn pending_export_without_an_image_stays_blank() {
    let (_, shared) = TestBackend::shared();
    let mut state = ready_state(&shared);
    state.layers = vec![Arc::new(GrayscaleLayer { intensity: 1.0 })];
    state.pending_export = true;
    state.export_callback = Some(Box::new(|_| {}));
    assert_eq!(state.render_context(), Some(RenderContext::Blank));
}

#[test]
fn export_needs_a_layer_stack() {
    let (_, shared) = TestBackend::shared();
    let dimensions = Dimensions::new(8, 8).unwrap();

    let mut state = ready_state(&shared);
    state.image = Some(Texture::empty(&shared, dimensions).unwrap());
    state.swapchain = Some(Swapchain::create(&shared, dimensions).unwrap());
    state.pending_export = true;
    state.export_callback = Some(Box::new(|_| {}));
    assert_eq!(
        state.render_context(),
        Some(RenderContext::Preview),
        "an empty stack has nothing to export"
    );
}

#[test]
fn blank_context_clears_the_surface() {
    let (backend, shared) = TestBackend::shared();
    let settings = EngineSettings::default();
    let mut state = ready_state(&shared);

    let exported = draw(&shared, &settings, &mut state, RenderContext::Blank).unwrap();
    assert!(exported.is_none());
    assert_eq!(backend.state.borrow().surface_clears, 1);
    assert!(backend.draws().is_empty());
}

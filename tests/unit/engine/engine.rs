use super::*;

#[path = "../harness.rs"]
mod harness;

use std::rc::Rc;
use std::sync::Mutex;
use std::sync::atomic::Ordering;

use harness::{
    BrokenLayer, ContrastLayer, CountingProvider, CountingScheduler, DeferredScheduler,
    FailingProvider, GrayscaleLayer, InlineScheduler, TestBackend,
};

use crate::foundation::core::invert_y_matrix;
use crate::gpu::backend::{Destination, TextureId};

const IMAGE: Dimensions = Dimensions {
    width: 64,
    height: 36,
};
const VIEWPORT: Dimensions = Dimensions {
    width: 16,
    height: 12,
};

fn ready_engine(viewport: Dimensions) -> (Rc<TestBackend>, Engine) {
    harness::init_tracing();
    let (backend, shared) = TestBackend::shared();
    let mut engine = Engine::new(shared, EngineSettings::default(), Arc::new(InlineScheduler));
    engine.surface_created().unwrap();
    engine.surface_resized(viewport);
    (backend, engine)
}

fn stack(layers: Vec<Arc<dyn Layer>>) -> (Rc<TestBackend>, Engine) {
    let (backend, mut engine) = ready_engine(VIEWPORT);
    let handle = engine.handle();
    handle.set_image_provider(Box::new(CountingProvider::new(IMAGE)));
    handle.set_layers(layers);
    (backend, engine)
}

#[test]
fn empty_layer_list_previews_through_the_bypass_program() {
    let (backend, mut engine) = stack(vec![]);
    engine.render_frame().unwrap();

    let draws = backend.draws();
    assert_eq!(draws.len(), 1);
    let draw = &draws[0];
    assert!(backend.is_bypass(draw.program));
    assert_eq!(draw.destination, Destination::Surface);
    assert_eq!(draw.dimensions, VIEWPORT);
    assert_eq!(draw.invert, invert_y_matrix());
    assert_ne!(draw.aspect, Mat4::IDENTITY, "16:9 into 4:3 letterboxes");
}

#[test]
fn preview_routes_layers_first_to_last() {
    let (backend, mut engine) = stack(vec![
        Arc::new(GrayscaleLayer { intensity: 0.8 }) as Arc<dyn Layer>,
        Arc::new(harness::InvertLayer),
        Arc::new(ContrastLayer { strength: 1.4 }),
    ]);
    engine.render_frame().unwrap();

    let draws = backend.draws();
    assert_eq!(draws.len(), 3);

    // First pass: samples the source image, applies the Y-invert, lands
    // in the chain at chain resolution (64x36 fit into 16x12 -> 16x9).
    let chain_dims = IMAGE.fit_inside(VIEWPORT);
    assert_eq!(chain_dims, Dimensions::new(16, 9).unwrap());
    assert!(matches!(draws[0].destination, Destination::Target(_)));
    assert_eq!(draws[0].dimensions, chain_dims);
    assert_eq!(draws[0].invert, invert_y_matrix());
    assert_eq!(draws[0].aspect, Mat4::IDENTITY);
    assert_eq!(draws[0].intensity, 0.8);

    // Intermediate pass: chain to chain, identity matrices, reads a
    // different texture than it writes.
    assert!(matches!(draws[1].destination, Destination::Target(_)));
    assert_eq!(draws[1].invert, Mat4::IDENTITY);
    assert_ne!(draws[1].source, draws[0].source);

    // Last pass: chain to surface at viewport size with the letterbox
    // transform; custom params came through the bind hook.
    assert_eq!(draws[2].destination, Destination::Surface);
    assert_eq!(draws[2].dimensions, VIEWPORT);
    assert_eq!(draws[2].invert, Mat4::IDENTITY);
    assert_ne!(draws[2].aspect, Mat4::IDENTITY);
    assert_eq!(draws[2].params[0], 1.4);

    let inverted = draws.iter().filter(|d| d.invert == invert_y_matrix()).count();
    assert_eq!(inverted, 1, "scanlines are reoriented exactly once");
}

#[test]
fn provider_decodes_once_across_frames() {
    let (backend, mut engine) = ready_engine(VIEWPORT);
    let provider = CountingProvider::new(IMAGE);
    let decodes = provider.decodes.clone();
    engine.handle().set_image_provider(Box::new(provider));

    engine.render_frame().unwrap();
    engine.render_frame().unwrap();
    engine.render_frame().unwrap();

    assert_eq!(decodes.load(Ordering::Relaxed), 1);
    let uploads = backend
        .state
        .borrow()
        .textures
        .values()
        .filter(|t| t.uploaded.is_some())
        .count();
    assert_eq!(uploads, 1);
}

#[test]
fn resize_rebuilds_the_chain_without_redecoding() {
    let (backend, mut engine) = ready_engine(VIEWPORT);
    let provider = CountingProvider::new(IMAGE);
    let decodes = provider.decodes.clone();
    engine.handle().set_image_provider(Box::new(provider));
    engine.render_frame().unwrap();
    assert_eq!(backend.live_counts().0, 3, "image + two chain slots");

    // Same size: nothing is marked dirty, nothing reallocates.
    let before: Vec<_> = backend.state.borrow().textures.keys().copied().collect();
    engine.surface_resized(VIEWPORT);
    engine.render_frame().unwrap();
    let after: Vec<_> = backend.state.borrow().textures.keys().copied().collect();
    assert_eq!(sorted(before), sorted(after));

    // New size: the chain is rebuilt, the decoded image is reused.
    engine.surface_resized(Dimensions::new(32, 24).unwrap());
    engine.render_frame().unwrap();
    assert_eq!(decodes.load(Ordering::Relaxed), 1);
    assert_eq!(backend.live_counts().0, 3);
    assert_eq!(
        backend.draws().last().unwrap().dimensions,
        Dimensions::new(32, 24).unwrap()
    );
}

fn sorted(mut ids: Vec<TextureId>) -> Vec<TextureId> {
    ids.sort_by_key(|id| id.0);
    ids
}

#[test]
fn broken_layer_passes_its_input_through() {
    let with_broken: Vec<Arc<dyn Layer>> = vec![
        Arc::new(GrayscaleLayer { intensity: 0.8 }),
        Arc::new(BrokenLayer),
        Arc::new(ContrastLayer { strength: 1.4 }),
    ];
    let without: Vec<Arc<dyn Layer>> = vec![
        Arc::new(GrayscaleLayer { intensity: 0.8 }),
        Arc::new(ContrastLayer { strength: 1.4 }),
    ];

    let (backend_a, mut engine_a) = stack(with_broken);
    engine_a.render_frame().unwrap();
    let (backend_b, mut engine_b) = stack(without);
    engine_b.render_frame().unwrap();

    let draws = backend_a.draws();
    assert_eq!(draws.len(), 3, "the chain still advances through the broken layer");
    assert!(backend_a.is_bypass(draws[1].program));
    assert_eq!(
        backend_a.surface_tag(),
        backend_b.surface_tag(),
        "a broken layer contributes nothing to the output"
    );
}

#[test]
fn export_runs_at_source_resolution() {
    let (backend, mut engine) = stack(vec![
        Arc::new(GrayscaleLayer { intensity: 1.0 }) as Arc<dyn Layer>,
        Arc::new(ContrastLayer { strength: 2.0 }),
    ]);
    let handle = engine.handle();

    let slot = Arc::new(Mutex::new(None));
    let sink = slot.clone();
    handle.export(Box::new(move |buffer| {
        *sink.lock().unwrap() = Some(buffer);
    }));
    engine.render_frame().unwrap();

    let exported = slot.lock().unwrap().take().expect("export callback ran");
    assert_eq!(exported.dimensions, IMAGE);

    let draws = backend.draws();
    assert_eq!(draws.len(), 2);
    for draw in &draws {
        assert!(matches!(draw.destination, Destination::Target(_)));
        assert_eq!(draw.dimensions, IMAGE);
        assert_eq!(draw.aspect, Mat4::IDENTITY);
        assert_eq!(draw.invert, Mat4::IDENTITY);
    }

    // The throwaway full-resolution chain is gone; the image and the
    // preview chain remain.
    assert_eq!(backend.live_counts().0, 3);
    assert_eq!(backend.live_counts().1, 2);

    // The next frame falls back to a normal preview.
    backend.clear_draws();
    engine.render_frame().unwrap();
    assert_eq!(backend.draws().last().unwrap().destination, Destination::Surface);
}

#[test]
fn export_callback_is_posted_through_the_scheduler() {
    harness::init_tracing();
    let (_, shared) = TestBackend::shared();
    let scheduler = Arc::new(DeferredScheduler::default());
    let mut engine = Engine::new(shared, EngineSettings::default(), scheduler.clone());
    engine.surface_created().unwrap();
    engine.surface_resized(VIEWPORT);
    let handle = engine.handle();
    handle.set_image_provider(Box::new(CountingProvider::new(IMAGE)));
    handle.set_layers(vec![Arc::new(GrayscaleLayer { intensity: 1.0 })]);

    let slot = Arc::new(Mutex::new(None::<PixelBuffer>));
    let sink = slot.clone();
    handle.export(Box::new(move |buffer| {
        *sink.lock().unwrap() = Some(buffer);
    }));
    engine.render_frame().unwrap();

    // The frame hands the result to the scheduler; the closure only
    // runs once the host dispatches it.
    assert!(slot.lock().unwrap().is_none());
    assert_eq!(scheduler.pending(), 1);
    scheduler.drain();
    let exported = slot.lock().unwrap().take().expect("export callback ran");
    assert_eq!(exported.dimensions, IMAGE);
}

#[test]
fn repeated_exports_are_independent() {
    let gray: Vec<Arc<dyn Layer>> = vec![Arc::new(GrayscaleLayer { intensity: 1.0 })];
    let contrast: Vec<Arc<dyn Layer>> = vec![Arc::new(ContrastLayer { strength: 2.0 })];

    let (backend, mut engine) = stack(gray.clone());
    let handle = engine.handle();

    let first = export_once(&mut engine, &handle);
    assert_eq!(first.dimensions, IMAGE);
    let (textures, targets, ..) = backend.live_counts();
    assert_eq!((textures, targets), (3, 2), "image + preview chain only");

    handle.set_layers(contrast.clone());
    let second = export_once(&mut engine, &handle);
    // The second throwaway chain is gone too; only the contrast shader
    // joined the caches.
    let (textures, targets, ..) = backend.live_counts();
    assert_eq!((textures, targets), (3, 2));

    // Each result matches a fresh single-export run of its own list;
    // nothing bleeds from one call into the next.
    assert_eq!(first.data, single_export(gray).data);
    assert_eq!(second.data, single_export(contrast).data);
    assert_ne!(first.data, second.data);
}

fn export_once(engine: &mut Engine, handle: &EngineHandle) -> PixelBuffer {
    let slot = Arc::new(Mutex::new(None));
    let sink = slot.clone();
    handle.export(Box::new(move |buffer| {
        *sink.lock().unwrap() = Some(buffer);
    }));
    engine.render_frame().unwrap();
    let exported = slot.lock().unwrap().take();
    exported.expect("export callback ran")
}

fn single_export(layers: Vec<Arc<dyn Layer>>) -> PixelBuffer {
    let (_, mut engine) = stack(layers);
    let handle = engine.handle();
    export_once(&mut engine, &handle)
}

#[test]
fn export_without_an_image_is_dropped() {
    let (backend, mut engine) = ready_engine(VIEWPORT);
    let handle = engine.handle();

    let slot = Arc::new(Mutex::new(None::<PixelBuffer>));
    let sink = slot.clone();
    handle.export(Box::new(move |buffer| {
        *sink.lock().unwrap() = Some(buffer);
    }));
    engine.render_frame().unwrap();

    assert!(slot.lock().unwrap().is_none());
    assert!(backend.draws().is_empty());
    assert_eq!(backend.state.borrow().surface_clears, 1);

    // The dropped request does not linger into later frames.
    engine.render_frame().unwrap();
    assert!(backend.draws().is_empty());
}

#[test]
fn export_with_no_layers_degrades_to_a_preview() {
    let (backend, mut engine) = stack(vec![]);
    let handle = engine.handle();

    let slot = Arc::new(Mutex::new(None::<PixelBuffer>));
    let sink = slot.clone();
    handle.export(Box::new(move |buffer| {
        *sink.lock().unwrap() = Some(buffer);
    }));
    engine.render_frame().unwrap();

    // The frame renders as an ordinary bypass preview; the request is
    // dropped rather than producing an empty-stack export.
    assert!(slot.lock().unwrap().is_none());
    let draws = backend.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].destination, Destination::Surface);

    backend.clear_draws();
    engine.render_frame().unwrap();
    assert_eq!(backend.draws().len(), 1, "the stale request does not linger");
}

#[test]
fn decode_failure_leaves_the_session_blank() {
    let (backend, mut engine) = ready_engine(VIEWPORT);
    engine.handle().set_image_provider(Box::new(FailingProvider));
    engine.render_frame().unwrap();

    assert!(backend.draws().is_empty());
    assert_eq!(backend.state.borrow().surface_clears, 1);
    assert_eq!(backend.live_counts().0, 0);
}

#[test]
fn teardown_releases_every_resource() {
    let (backend, mut engine) = stack(vec![
        Arc::new(GrayscaleLayer { intensity: 1.0 }) as Arc<dyn Layer>,
    ]);
    engine.render_frame().unwrap();
    assert_ne!(backend.live_counts(), (0, 0, 0, 0, 0));

    engine.teardown();
    assert_eq!(backend.live_counts(), (0, 0, 0, 0, 0));

    // Rendering after teardown is a no-op until the surface comes back.
    backend.clear_draws();
    engine.render_frame().unwrap();
    assert!(backend.draws().is_empty());
}

#[test]
fn handle_mutations_schedule_a_frame() {
    let (_, shared) = TestBackend::shared();
    let scheduler = Arc::new(CountingScheduler::default());
    let engine = Engine::new(shared, EngineSettings::default(), scheduler.clone());
    let handle = engine.handle();

    handle.set_layers(vec![]);
    handle.request_render();
    handle.export(Box::new(|_| {}));
    assert_eq!(scheduler.0.load(Ordering::Relaxed), 3);
}

use super::*;

#[path = "../harness.rs"]
mod harness;

use harness::{BrokenLayer, GrayscaleLayer, InvertLayer, TestBackend};

#[test]
fn create_builds_the_bypass_program_eagerly() {
    let (backend, shared) = TestBackend::shared();
    let factory = LayerShaderFactory::create(&shared).unwrap();
    assert!(backend.is_bypass(factory.bypass().id()));
    assert_eq!(factory.cached_len(), 0);
}

#[test]
fn same_layer_type_compiles_once() {
    let (backend, shared) = TestBackend::shared();
    let mut factory = LayerShaderFactory::create(&shared).unwrap();

    let a = GrayscaleLayer { intensity: 1.0 };
    let b = GrayscaleLayer { intensity: 0.25 };
    let first = factory.shader_for(&a).unwrap();
    let second = factory.shader_for(&b).unwrap();

    assert_eq!(first.id(), second.id());
    assert_eq!(factory.cached_len(), 1);
    assert_eq!(backend.compile_attempts_containing("0.299"), 1);
}

#[test]
fn distinct_layer_types_get_distinct_programs() {
    let (_, shared) = TestBackend::shared();
    let mut factory = LayerShaderFactory::create(&shared).unwrap();

    let gray = factory.shader_for(&GrayscaleLayer { intensity: 1.0 }).unwrap();
    let invert = factory.shader_for(&InvertLayer).unwrap();
    assert_ne!(gray.id(), invert.id());
    assert_eq!(factory.cached_len(), 2);
}

#[test]
fn failed_snippet_is_attempted_once_and_remembered() {
    let (backend, shared) = TestBackend::shared();
    let mut factory = LayerShaderFactory::create(&shared).unwrap();

    assert!(factory.shader_for(&BrokenLayer).is_none());
    assert!(factory.shader_for(&BrokenLayer).is_none());
    assert_eq!(
        backend.compile_attempts_containing(harness::BAD_SNIPPET_MARKER),
        1
    );
    assert_eq!(factory.cached_len(), 0);
}

#[test]
fn drop_releases_every_cached_program() {
    let (backend, shared) = TestBackend::shared();
    let mut factory = LayerShaderFactory::create(&shared).unwrap();
    factory.shader_for(&GrayscaleLayer { intensity: 1.0 }).unwrap();
    factory.shader_for(&InvertLayer).unwrap();

    drop(factory);
    assert_eq!(backend.live_counts(), (0, 0, 0, 0, 0));
}

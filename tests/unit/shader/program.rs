use super::*;

#[path = "../harness.rs"]
mod harness;

use harness::TestBackend;
use crate::shader::templates;

fn fragment_source() -> String {
    templates::compose_layer_fragment(
        "fn process(color: vec4<f32>) -> vec4<f32> { return color; }",
    )
}

#[test]
fn link_accepts_either_stage_order() {
    let (_, shared) = TestBackend::shared();
    let vertex = ShaderStage::compile(&shared, StageKind::Vertex, templates::VERTEX_SHADER).unwrap();
    let fragment =
        ShaderStage::compile(&shared, StageKind::Fragment, &fragment_source()).unwrap();

    assert!(vertex.link_with(&fragment).is_ok());
    assert!(fragment.link_with(&vertex).is_ok());
}

#[test]
fn link_rejects_two_stages_of_the_same_kind() {
    let (_, shared) = TestBackend::shared();
    let a = ShaderStage::compile(&shared, StageKind::Fragment, &fragment_source()).unwrap();
    let b = ShaderStage::compile(&shared, StageKind::Fragment, &fragment_source()).unwrap();

    let err = a.link_with(&b).err().unwrap();
    assert!(matches!(err, ImagoError::Validation(_)), "got {err}");
}

#[test]
fn compile_failure_surfaces_the_backend_diagnostic() {
    let (_, shared) = TestBackend::shared();
    let err = ShaderStage::compile(&shared, StageKind::Fragment, harness::BAD_SNIPPET_MARKER)
        .err()
        .unwrap();
    assert!(matches!(err, ImagoError::Shader(_)), "got {err}");
}

#[test]
fn drop_releases_stages_and_programs() {
    let (backend, shared) = TestBackend::shared();
    let vertex = ShaderStage::compile(&shared, StageKind::Vertex, templates::VERTEX_SHADER).unwrap();
    let fragment =
        ShaderStage::compile(&shared, StageKind::Fragment, &fragment_source()).unwrap();
    let program = vertex.link_with(&fragment).unwrap();
    assert_eq!(backend.live_counts(), (0, 0, 0, 2, 1));

    drop(program);
    assert_eq!(backend.live_counts().4, 0);
    drop(vertex);
    drop(fragment);
    assert_eq!(backend.live_counts().3, 0);
}

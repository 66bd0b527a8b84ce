use super::*;

#[path = "../harness.rs"]
mod harness;

use harness::TestBackend;

use crate::gpu::backend::GpuBackend;

#[test]
fn write_slot_is_never_the_read_slot() {
    let (backend, shared) = TestBackend::shared();
    let dimensions = Dimensions::new(64, 64).unwrap();
    let mut chain = Swapchain::create(&shared, dimensions).unwrap();

    for _ in 0..4 {
        let read = chain.texture().id();
        let write_backing = backend.state.borrow().targets[&chain.render_target().id()];
        assert_ne!(write_backing, read);
        chain.advance();
        assert_ne!(chain.texture().id(), read);
    }
}

#[test]
fn advance_rotates_between_the_two_slots() {
    let (_, shared) = TestBackend::shared();
    let dimensions = Dimensions::new(32, 32).unwrap();
    let mut chain = Swapchain::create(&shared, dimensions).unwrap();

    let first = chain.texture().id();
    chain.advance();
    let second = chain.texture().id();
    chain.advance();
    assert_ne!(first, second);
    assert_eq!(chain.texture().id(), first);
}

#[test]
fn creation_allocates_two_textures_and_targets() {
    let (backend, shared) = TestBackend::shared();
    let dimensions = Dimensions::new(16, 16).unwrap();
    let chain = Swapchain::create(&shared, dimensions).unwrap();
    assert_eq!(chain.dimensions(), dimensions);
    assert_eq!(backend.live_counts(), (2, 2, 0, 0, 0));

    drop(chain);
    assert_eq!(backend.live_counts(), (0, 0, 0, 0, 0));
}

#[test]
fn read_pixels_restores_top_down_rows() {
    let (backend, shared) = TestBackend::shared();
    let dimensions = Dimensions::new(2, 3).unwrap();
    let chain = Swapchain::create(&shared, dimensions).unwrap();

    // The mock fills row r with (tag + r); un-flipping must put the
    // highest row value first.
    let buffer = chain.read_pixels().unwrap();
    assert_eq!(buffer.dimensions, dimensions);
    assert_eq!(buffer.data[0], 2);
    assert_eq!(buffer.data[buffer.data.len() - 1], 0);

    let raw = backend
        .read_pixels(
            backend.state.borrow().targets.keys().next().copied().unwrap(),
            dimensions,
        )
        .unwrap();
    assert_eq!(raw[0], 0);
}

use crate::foundation::error::ImagoResult;
use crate::gpu::backend::{GeometryId, SharedBackend};
use crate::gpu::resources::GeometryBuffer;

/// Interleaved pos.xy + uv per vertex. Clip-space top maps to the first
/// texture row, so a pass with identity matrices preserves stored
/// scanline order.
const VERTICES: [f32; 16] = [
    -1.0, 1.0, 0.0, 0.0, //
    -1.0, -1.0, 0.0, 1.0, //
    1.0, -1.0, 1.0, 1.0, //
    1.0, 1.0, 1.0, 0.0, //
];

const INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// The static full-screen quad every pass draws: two triangles covering
/// the clip area, created once and released at engine teardown.
pub struct Quad {
    geometry: GeometryBuffer,
}

impl Quad {
    pub fn create(backend: &SharedBackend) -> ImagoResult<Self> {
        let geometry = GeometryBuffer::new(backend, &VERTICES, &INDICES)?;
        Ok(Self { geometry })
    }

    pub fn geometry_id(&self) -> GeometryId {
        self.geometry.id()
    }
}

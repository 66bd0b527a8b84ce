use crate::foundation::error::{ImagoError, ImagoResult};
use crate::gpu::backend::{ProgramId, SharedBackend, StageId, StageKind};

/// A compiled shader stage awaiting linkage.
///
/// Stages outlive the programs linked from them only in the factory,
/// which keeps the shared vertex stage around to pair with every layer
/// fragment it compiles.
pub struct ShaderStage {
    backend: SharedBackend,
    id: StageId,
    kind: StageKind,
}

impl ShaderStage {
    pub fn compile(backend: &SharedBackend, kind: StageKind, source: &str) -> ImagoResult<Self> {
        let id = backend.compile_stage(kind, source)?;
        Ok(Self {
            backend: backend.clone(),
            id,
            kind,
        })
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Links this stage with `other` into a usable program. The pair must
    /// be one vertex and one fragment stage, in either order.
    pub fn link_with(&self, other: &ShaderStage) -> ImagoResult<ShaderProgram> {
        let (vertex, fragment) = match (self.kind, other.kind) {
            (StageKind::Vertex, StageKind::Fragment) => (self.id, other.id),
            (StageKind::Fragment, StageKind::Vertex) => (other.id, self.id),
            (kind, _) => {
                return Err(ImagoError::validation(format!(
                    "cannot link two {kind} stages"
                )));
            }
        };
        let id = self.backend.link_program(vertex, fragment)?;
        Ok(ShaderProgram {
            backend: self.backend.clone(),
            id,
        })
    }
}

impl Drop for ShaderStage {
    fn drop(&mut self) {
        self.backend.delete_stage(self.id);
    }
}

/// A linked vertex+fragment program, ready to draw with.
pub struct ShaderProgram {
    backend: SharedBackend,
    id: ProgramId,
}

impl ShaderProgram {
    pub fn id(&self) -> ProgramId {
        self.id
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.backend.delete_program(self.id);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/shader/program.rs"]
mod tests;

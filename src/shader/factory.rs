use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::foundation::error::ImagoResult;
use crate::gpu::backend::{SharedBackend, StageKind};
use crate::layer::{Layer, ShaderKey};
use crate::shader::program::{ShaderProgram, ShaderStage};
use crate::shader::templates;

enum CacheEntry {
    Ready(Rc<ShaderProgram>),
    /// The snippet failed to compile or link; remembered so a broken
    /// layer type is attempted once, not on every frame.
    Unavailable,
}

/// Compiles and caches one program per layer *type*.
///
/// The shared vertex stage and the bypass program are built eagerly at
/// creation; layer programs are built lazily the first time a layer of
/// that type is drawn.
pub struct LayerShaderFactory {
    backend: SharedBackend,
    vertex: ShaderStage,
    bypass: Rc<ShaderProgram>,
    cache: HashMap<ShaderKey, CacheEntry>,
}

impl LayerShaderFactory {
    /// Fails only if the fixed templates themselves do not compile,
    /// which is fatal for the engine.
    pub fn create(backend: &SharedBackend) -> ImagoResult<Self> {
        let vertex = ShaderStage::compile(backend, StageKind::Vertex, templates::VERTEX_SHADER)?;
        let bypass_stage =
            ShaderStage::compile(backend, StageKind::Fragment, &templates::bypass_fragment())?;
        let bypass = Rc::new(vertex.link_with(&bypass_stage)?);
        Ok(Self {
            backend: backend.clone(),
            vertex,
            bypass,
            cache: HashMap::new(),
        })
    }

    /// The verbatim-copy program, used for empty layer lists and for
    /// layers whose shader is unavailable.
    pub fn bypass(&self) -> Rc<ShaderProgram> {
        Rc::clone(&self.bypass)
    }

    /// The program for `layer`'s type, compiled on first sight.
    ///
    /// Returns `None` when the layer's snippet failed to compile or
    /// link; the engine then draws the layer as a bypass pass.
    pub fn shader_for(&mut self, layer: &dyn Layer) -> Option<Rc<ShaderProgram>> {
        let key = layer.shader_key();
        if let Some(entry) = self.cache.get(&key) {
            return match entry {
                CacheEntry::Ready(program) => Some(Rc::clone(program)),
                CacheEntry::Unavailable => None,
            };
        }

        match self.compile_layer(layer) {
            Ok(program) => {
                debug!(?key, "layer shader compiled");
                self.cache.insert(key, CacheEntry::Ready(Rc::clone(&program)));
                Some(program)
            }
            Err(err) => {
                warn!(?key, error = %err, "layer shader unavailable, drawing layer as bypass");
                self.cache.insert(key, CacheEntry::Unavailable);
                None
            }
        }
    }

    /// Number of layer types with a live compiled program.
    pub fn cached_len(&self) -> usize {
        self.cache
            .values()
            .filter(|entry| matches!(entry, CacheEntry::Ready(_)))
            .count()
    }

    fn compile_layer(&self, layer: &dyn Layer) -> ImagoResult<Rc<ShaderProgram>> {
        let source = templates::compose_layer_fragment(layer.source());
        let fragment = ShaderStage::compile(&self.backend, StageKind::Fragment, &source)?;
        Ok(Rc::new(self.vertex.link_with(&fragment)?))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/shader/factory.rs"]
mod tests;

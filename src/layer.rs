use std::any::TypeId;

/// Stable identity of a layer *type*, used as the shader-cache key.
///
/// All instances of the same layer type share one compiled program; only
/// per-draw uniform values vary per instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderKey(TypeId);

impl ShaderKey {
    pub fn of<T: 'static>() -> Self {
        Self(TypeId::of::<T>())
    }
}

/// Algorithm used to blend a layer's processed color with the color it
/// received as input, before the intensity mix.
///
/// Ordinals are part of the shader contract: they are passed to the
/// fragment template as a uniform and matched in WGSL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BlendMode {
    #[default]
    Normal,

    // Darken
    Darken,
    Multiply,
    ColorBurn,
    LinearBurn,
    DarkerColor,

    // Lighten
    Lighten,
    Screen,
    ColorDodge,
    LinearDodge,
    LighterColor,

    // Contrast
    Overlay,
    SoftLight,
    HardLight,
    VividLight,
    LinearLight,
    PinLight,
    HardMix,

    // Inversion
    Difference,
    Exclusion,

    // Cancellation
    Subtract,
    Divide,

    // Component
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    /// The uniform value matched by the fragment template.
    pub fn ordinal(self) -> u32 {
        self as u32
    }
}

/// Extra per-draw uniform values a layer can bind, exposed to the WGSL
/// snippet as `u.params` (four vec4s).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayerParams([f32; 16]);

impl LayerParams {
    /// Sets one float slot. Indices >= 16 are ignored.
    pub fn set(&mut self, index: usize, value: f32) {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = value;
        }
    }

    pub fn as_array(&self) -> [f32; 16] {
        self.0
    }
}

/// One image-processing layer: a WGSL snippet plus per-draw values.
///
/// The snippet must define `fn process(color: vec4<f32>) -> vec4<f32>`;
/// the engine wraps it with a shared header and footer that sample the
/// input, blend the processed color per [`BlendMode`], and interpolate
/// with the original by [`Layer::intensity`].
pub trait Layer: Send + Sync + 'static {
    /// Cache identity of this layer's type. Conventionally
    /// `ShaderKey::of::<Self>()`.
    fn shader_key(&self) -> ShaderKey;

    /// Fragment shader snippet defining `process`.
    fn source(&self) -> &str;

    /// Interpolation factor in `[0, 1]` between the original color (0)
    /// and the blended processed color (1).
    fn intensity(&self) -> f32;

    fn blend_mode(&self) -> BlendMode {
        BlendMode::Normal
    }

    /// Called before every draw of this layer to bind custom uniforms.
    fn bind(&self, _params: &mut LayerParams) {}
}

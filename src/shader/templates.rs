//! WGSL templates shared by every layer program.
//!
//! A layer program is the fixed [`FRAGMENT_HEADER`], the layer's snippet
//! (which must define `fn process(color: vec4<f32>) -> vec4<f32>`), and
//! the fixed [`FRAGMENT_FOOTER`], linked against the shared
//! [`VERTEX_SHADER`]. The bypass program copies a texture verbatim and
//! is used when the layer list is empty or a layer's shader is
//! unavailable.

/// Shared vertex stage: applies the aspect-fit matrix, then the
/// optional Y-invert, and passes texture coordinates through.
pub const VERTEX_SHADER: &str = r#"
struct LayerUniforms {
    aspect: mat4x4<f32>,
    invert: mat4x4<f32>,
    intensity: f32,
    blend_mode: u32,
    _pad: vec2<f32>,
    params: array<vec4<f32>, 4>,
}

@group(0) @binding(0) var<uniform> u: LayerUniforms;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) tex_coords: vec2<f32>) -> VsOut {
    var o: VsOut;
    o.pos = u.aspect * u.invert * vec4<f32>(position, 0.0, 1.0);
    o.uv = tex_coords;
    return o;
}
"#;

/// Fragment preamble: uniform block, source texture and sampler, and
/// the interpolated inputs. `u.params` holds the layer's custom values.
pub const FRAGMENT_HEADER: &str = r#"
struct LayerUniforms {
    aspect: mat4x4<f32>,
    invert: mat4x4<f32>,
    intensity: f32,
    blend_mode: u32,
    _pad: vec2<f32>,
    params: array<vec4<f32>, 4>,
}

@group(0) @binding(0) var<uniform> u: LayerUniforms;
@group(0) @binding(1) var t_source: texture_2d<f32>;
@group(0) @binding(2) var s_source: sampler;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
}
"#;

/// Fragment epilogue: blends `process(original)` with the original by
/// `u.blend_mode`, then interpolates by `u.intensity`.
pub const FRAGMENT_FOOTER: &str = r#"
fn lum(c: vec3<f32>) -> f32 {
    return dot(c, vec3<f32>(0.3, 0.59, 0.11));
}

fn clip_color(c: vec3<f32>) -> vec3<f32> {
    let l = lum(c);
    let mn = min(c.r, min(c.g, c.b));
    let mx = max(c.r, max(c.g, c.b));
    var r = c;
    if (mn < 0.0) {
        r = l + (r - l) * l / (l - mn);
    }
    if (mx > 1.0) {
        r = l + (r - l) * (1.0 - l) / (mx - l);
    }
    return r;
}

fn set_lum(c: vec3<f32>, l: f32) -> vec3<f32> {
    return clip_color(c + (l - lum(c)));
}

fn sat(c: vec3<f32>) -> f32 {
    return max(c.r, max(c.g, c.b)) - min(c.r, min(c.g, c.b));
}

fn set_sat(c: vec3<f32>, s: f32) -> vec3<f32> {
    let mx = max(c.r, max(c.g, c.b));
    let mn = min(c.r, min(c.g, c.b));
    if (mx <= mn) {
        return vec3<f32>(0.0);
    }
    return (c - mn) * s / (mx - mn);
}

fn blend_rgb(base: vec3<f32>, src: vec3<f32>, mode: u32) -> vec3<f32> {
    let zero = vec3<f32>(0.0);
    let one = vec3<f32>(1.0);
    let half = vec3<f32>(0.5);
    let eps = vec3<f32>(1.0e-5);
    switch mode {
        // Normal
        case 0u: { return src; }
        // Darken
        case 1u: { return min(base, src); }
        case 2u: { return base * src; }
        case 3u: { return one - min(one, (one - base) / max(src, eps)); }
        case 4u: { return max(base + src - one, zero); }
        case 5u: {
            if (lum(src) < lum(base)) { return src; }
            return base;
        }
        // Lighten
        case 6u: { return max(base, src); }
        case 7u: { return base + src - base * src; }
        case 8u: { return min(one, base / max(one - src, eps)); }
        case 9u: { return min(one, base + src); }
        case 10u: {
            if (lum(src) > lum(base)) { return src; }
            return base;
        }
        // Contrast
        case 11u: {
            return select(one - 2.0 * (one - base) * (one - src), 2.0 * base * src, base < half);
        }
        case 12u: {
            let d = select(sqrt(base), ((16.0 * base - 12.0) * base + 4.0) * base, base <= vec3<f32>(0.25));
            return select(
                base + (2.0 * src - one) * (d - base),
                base - (one - 2.0 * src) * base * (one - base),
                src <= half,
            );
        }
        case 13u: {
            return select(one - 2.0 * (one - base) * (one - src), 2.0 * base * src, src < half);
        }
        case 14u: {
            let burn = one - min(one, (one - base) / max(2.0 * src, eps));
            let dodge = min(one, base / max(one - 2.0 * (src - half), eps));
            return select(dodge, burn, src < half);
        }
        case 15u: { return clamp(base + 2.0 * src - one, zero, one); }
        case 16u: {
            return select(max(base, 2.0 * src - one), min(base, 2.0 * src), src < half);
        }
        case 17u: {
            let burn = one - min(one, (one - base) / max(2.0 * src, eps));
            let dodge = min(one, base / max(one - 2.0 * (src - half), eps));
            let vivid = select(dodge, burn, src < half);
            return select(one, zero, vivid < half);
        }
        // Inversion
        case 18u: { return abs(base - src); }
        case 19u: { return base + src - 2.0 * base * src; }
        // Cancellation
        case 20u: { return max(base - src, zero); }
        case 21u: { return min(one, base / max(src, eps)); }
        // Component
        case 22u: { return set_lum(set_sat(src, sat(base)), lum(base)); }
        case 23u: { return set_lum(set_sat(base, sat(src)), lum(base)); }
        case 24u: { return set_lum(src, lum(base)); }
        case 25u: { return set_lum(base, lum(src)); }
        default: { return src; }
    }
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let original = textureSample(t_source, s_source, in.uv);
    let processed = clamp(process(original), vec4<f32>(0.0), vec4<f32>(1.0));
    let blended = vec4<f32>(blend_rgb(original.rgb, processed.rgb, u.blend_mode), processed.a);
    return mix(original, blended, clamp(u.intensity, 0.0, 1.0));
}
"#;

const BYPASS_MAIN: &str = r#"
@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return textureSample(t_source, s_source, in.uv);
}
"#;

/// Full fragment source for a layer snippet.
pub fn compose_layer_fragment(snippet: &str) -> String {
    let mut source = String::with_capacity(
        FRAGMENT_HEADER.len() + snippet.len() + FRAGMENT_FOOTER.len() + 4,
    );
    source.push_str(FRAGMENT_HEADER);
    source.push_str("\n\n");
    source.push_str(snippet);
    source.push_str("\n\n");
    source.push_str(FRAGMENT_FOOTER);
    source
}

/// Full fragment source of the verbatim-copy program.
pub fn bypass_fragment() -> String {
    let mut source = String::with_capacity(FRAGMENT_HEADER.len() + BYPASS_MAIN.len());
    source.push_str(FRAGMENT_HEADER);
    source.push_str(BYPASS_MAIN);
    source
}

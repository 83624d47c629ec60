//! # GLSL Sources
//!
//! OpenGL 3.3 core shaders for the toolpath volumes, instanced tubes, flat
//! coloured helpers and the background gradient.

/// Shaded volume: per-vertex position, normal, tube coordinate and layer top.
pub const VOLUME_VERTEX_SHADER: &str = r#"
#version 330 core

layout (location = 0) in vec3 position;
layout (location = 1) in vec3 normal;
layout (location = 2) in float tube;
layout (location = 6) in float layer_top;

uniform mat4 view_projection;
uniform vec3 origin;
uniform vec4 color;

out vec3 frag_position;
out vec3 frag_normal;
out float frag_tube;
out vec4 frag_color;
out float frag_layer_top;

void main() {
    vec3 world = position + origin;
    gl_Position = view_projection * vec4(world, 1.0);
    frag_position = world;
    frag_normal = normal;
    frag_tube = tube;
    frag_color = color;
    frag_layer_top = layer_top + origin.z;
}
"#;

/// Instanced tube: the template is stretched from `pos_a` to `pos_b`.
/// `override_color` replaces the per-instance colour with `color`
/// (hover highlight and picking).
pub const INSTANCED_VERTEX_SHADER: &str = r#"
#version 330 core

layout (location = 0) in vec3 position;
layout (location = 1) in vec3 normal;
layout (location = 2) in float tube;
layout (location = 3) in vec4 pos_a_width;
layout (location = 4) in vec4 pos_b_height;
layout (location = 5) in vec4 instance_color;

uniform mat4 view_projection;
uniform vec3 origin;
uniform vec4 color;
uniform bool override_color;

out vec3 frag_position;
out vec3 frag_normal;
out float frag_tube;
out vec4 frag_color;
out float frag_layer_top;

void main() {
    vec3 a = pos_a_width.xyz;
    vec3 b = pos_b_height.xyz;
    float width = pos_a_width.w;
    float height = pos_b_height.w;

    vec3 axis = b - a;
    float len = length(axis);
    vec3 dir = len > 0.0 ? axis / len : vec3(1.0, 0.0, 0.0);
    vec3 side = vec3(dir.y, -dir.x, 0.0);
    if (dot(side, side) < 1e-8) {
        side = vec3(0.0, -1.0, 0.0);
    }
    side = normalize(side);
    vec3 up = cross(side, dir);

    // Record Z is the layer top; the tube axis sits half a layer lower.
    // Template +Y maps to -side so the frame stays right-handed.
    vec3 center = a - vec3(0.0, 0.0, height * 0.5);
    vec3 world = center
        + dir * (position.x * len)
        + side * (-position.y * width)
        + up * (position.z * height)
        + origin;

    gl_Position = view_projection * vec4(world, 1.0);
    frag_position = world;
    frag_normal = normalize(dir * normal.x - side * normal.y + up * normal.z);
    frag_tube = tube;
    frag_color = override_color ? color : instance_color;
    frag_layer_top = a.z + origin.z;
}
"#;

/// Shared fragment stage for volumes and instanced tubes: layer clipping,
/// directional lighting and tube-coordinate shading. A fragment survives
/// when its layer top lies in `(clip_min, clip_max]`, so whole layers are
/// kept or dropped together. With `flat_color` set the colour is written
/// untouched (picking pass).
pub const VOLUME_FRAGMENT_SHADER: &str = r#"
#version 330 core

in vec3 frag_position;
in vec3 frag_normal;
in float frag_tube;
in vec4 frag_color;
in float frag_layer_top;

uniform vec3 light_direction;
uniform float clip_min;
uniform float clip_max;
uniform float clip_epsilon;
uniform bool flat_color;

out vec4 out_color;

void main() {
    if (frag_layer_top <= clip_min + clip_epsilon || frag_layer_top > clip_max + clip_epsilon) {
        discard;
    }
    if (flat_color) {
        out_color = frag_color;
        return;
    }

    vec3 n = normalize(frag_normal);
    if (!gl_FrontFacing) {
        n = -n;
    }
    float diffuse = max(dot(n, normalize(-light_direction)), 0.0);
    // Darken towards the round edges of the bead.
    float rim = 1.0 - 0.25 * frag_tube * frag_tube;
    vec3 rgb = frag_color.rgb * (0.3 + 0.7 * diffuse) * rim;
    out_color = vec4(rgb, frag_color.a);
}
"#;

/// Per-vertex coloured lines and triangles (bed, grid, axes, outlines).
pub const FLAT_VERTEX_SHADER: &str = r#"
#version 330 core

layout (location = 0) in vec3 position;
layout (location = 1) in vec4 color;

uniform mat4 view_projection;

out vec4 frag_color;

void main() {
    gl_Position = view_projection * vec4(position, 1.0);
    frag_color = color;
}
"#;

pub const FLAT_FRAGMENT_SHADER: &str = r#"
#version 330 core

in vec4 frag_color;
out vec4 out_color;

void main() {
    out_color = frag_color;
}
"#;

/// Full-screen triangle generated from `gl_VertexID`.
pub const BACKGROUND_VERTEX_SHADER: &str = r#"
#version 330 core

out float frag_t;

void main() {
    vec2 p = vec2(float((gl_VertexID << 1) & 2), float(gl_VertexID & 2)) * 2.0 - 1.0;
    frag_t = p.y * 0.5 + 0.5;
    gl_Position = vec4(p, 0.999, 1.0);
}
"#;

pub const BACKGROUND_FRAGMENT_SHADER: &str = r#"
#version 330 core

in float frag_t;

uniform vec4 top_color;
uniform vec4 bottom_color;

out vec4 out_color;

void main() {
    out_color = mix(bottom_color, top_color, clamp(frag_t, 0.0, 1.0));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_declare_version() {
        for src in [
            VOLUME_VERTEX_SHADER,
            INSTANCED_VERTEX_SHADER,
            VOLUME_FRAGMENT_SHADER,
            FLAT_VERTEX_SHADER,
            FLAT_FRAGMENT_SHADER,
            BACKGROUND_VERTEX_SHADER,
            BACKGROUND_FRAGMENT_SHADER,
        ] {
            assert!(src.trim_start().starts_with("#version 330 core"));
        }
    }

    #[test]
    fn test_fragment_stage_clips_on_layer_top() {
        assert!(VOLUME_FRAGMENT_SHADER
            .contains("frag_layer_top <= clip_min + clip_epsilon || frag_layer_top > clip_max + clip_epsilon"));
        assert!(!VOLUME_FRAGMENT_SHADER.contains("frag_position.z"));
        for vertex in [VOLUME_VERTEX_SHADER, INSTANCED_VERTEX_SHADER] {
            assert!(vertex.contains("out float frag_layer_top;"));
        }
        assert!(VOLUME_VERTEX_SHADER.contains("layout (location = 6) in float layer_top;"));
    }

    #[test]
    fn test_instanced_colour_can_be_overridden() {
        assert!(INSTANCED_VERTEX_SHADER.contains("override_color ? color : instance_color"));
    }
}

//! Static GLSL text and the pieces rendered from [`GeneratorOptions`]

use crate::options::{GeneratorOptions, MaterialOptions, MaterialPalette};

pub(crate) const FRAGMENT_HEADER: &str = include_str!("shaders/fragment_header.glsl");
pub(crate) const COMPUTE_HEADER: &str = include_str!("shaders/compute_header.glsl");
pub(crate) const TYPES: &str = include_str!("shaders/types.glsl");
pub(crate) const PRIMITIVES: &str = include_str!("shaders/primitives.glsl");
pub(crate) const SCENE_BEGIN: &str = include_str!("shaders/scene_begin.glsl");
pub(crate) const SCENE_END: &str = include_str!("shaders/scene_end.glsl");
pub(crate) const RAYMARCH: &str = include_str!("shaders/raymarch.glsl");
pub(crate) const COMPUTE_MAIN: &str = include_str!("shaders/compute_main.glsl");
const FRAGMENT_MAIN: &str = include_str!("shaders/fragment_main.glsl");

/// Material id attached to every `SceneResult`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialId {
    Plane,
    Sphere,
    Ellipsoid,
    Box,
    Torus,
    User,
}

impl MaterialId {
    pub const ALL: [MaterialId; 6] = [
        MaterialId::Plane,
        MaterialId::Sphere,
        MaterialId::Ellipsoid,
        MaterialId::Box,
        MaterialId::Torus,
        MaterialId::User,
    ];

    pub fn value(self) -> i32 {
        match self {
            MaterialId::Plane => 0,
            MaterialId::Sphere => 1,
            MaterialId::Ellipsoid => 2,
            MaterialId::Box => 3,
            MaterialId::Torus => 4,
            MaterialId::User => 5,
        }
    }

    /// Name of the GLSL `#define` for this id
    pub fn define(self) -> &'static str {
        match self {
            MaterialId::Plane => "SDFL_MATERIAL_PLANE",
            MaterialId::Sphere => "SDFL_MATERIAL_SPHERE",
            MaterialId::Ellipsoid => "SDFL_MATERIAL_ELLIPSOID",
            MaterialId::Box => "SDFL_MATERIAL_BOX",
            MaterialId::Torus => "SDFL_MATERIAL_TORUS",
            MaterialId::User => "SDFL_MATERIAL_USER",
        }
    }

    fn options(self, palette: &MaterialPalette) -> &MaterialOptions {
        match self {
            MaterialId::Plane => &palette.plane,
            MaterialId::Sphere => &palette.sphere,
            MaterialId::Ellipsoid => &palette.ellipsoid,
            MaterialId::Box => &palette.box_shape,
            MaterialId::Torus => &palette.torus,
            MaterialId::User => &palette.user,
        }
    }
}

/// GLSL float literal. Always has a decimal point or exponent.
pub(crate) fn float(value: f32) -> String {
    format!("{:?}", value)
}

pub(crate) fn vec3(values: [f32; 3]) -> String {
    format!(
        "vec3({}, {}, {})",
        float(values[0]),
        float(values[1]),
        float(values[2])
    )
}

/// Constants shared by both targets
pub(crate) fn defines(options: &GeneratorOptions) -> String {
    let mut code = String::from("\n");
    code += &format!("#define SDFL_MAX_STEPS {}\n", options.max_steps);
    code += &format!("#define SDFL_MAX_DISTANCE {}\n", float(options.max_distance));
    code += &format!("#define SDFL_HIT_DISTANCE {}\n", float(options.hit_distance));
    code += &format!(
        "#define SDFL_SHADOW_CAST_DISTANCE {}\n",
        float(options.shadow_cast_distance)
    );
    code += &format!(
        "#define SDFL_SHADOW_PENUMBRA {}\n",
        float(options.shadow_penumbra)
    );
    code += &format!("#define SDFL_NORMAL_EPSILON {}\n", float(options.normal_epsilon));
    code += &format!(
        "#define SDFL_LIGHT_POSITION {}\n",
        vec3(options.light_position)
    );
    code += &format!("#define SDFL_AMBIENT {}\n", float(options.ambient));

    code += "\n#define SDFL_MATERIAL_NONE -1\n";
    for id in MaterialId::ALL {
        code += &format!("#define {} {}\n", id.define(), id.value());
    }
    code
}

/// `sdfl_GetMaterial(int id)` built from the palette
pub(crate) fn material_lookup(palette: &MaterialPalette) -> String {
    let mut code = String::from("\nMaterial sdfl_GetMaterial(int id) {\n");
    for id in MaterialId::ALL {
        let material = id.options(palette);
        code += &format!(
            "    if (id == {}) return Material({}, {}, {});\n",
            id.define(),
            vec3(material.albedo),
            float(material.roughness),
            vec3(material.emission)
        );
    }
    code += "    return Material(vec3(1.0), 1.0, vec3(0.0));\n}\n";
    code
}

pub(crate) fn fragment_main(ray_origin: &str, background: &str) -> String {
    FRAGMENT_MAIN
        .replace("{{RAY_ORIGIN}}", ray_origin)
        .replace("{{BACKGROUND}}", background)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_literals_are_glsl_floats() {
        assert_eq!(float(100.0), "100.0");
        assert_eq!(float(0.01), "0.01");
        assert_eq!(float(-2.0), "-2.0");
        assert_eq!(vec3([0.0, 8.0, 3.0]), "vec3(0.0, 8.0, 3.0)");
    }

    #[test]
    fn test_defines_follow_options() {
        let options = GeneratorOptions {
            max_steps: 64,
            ..GeneratorOptions::default()
        };
        let code = defines(&options);
        assert!(code.contains("#define SDFL_MAX_STEPS 64\n"));
        assert!(code.contains("#define SDFL_SHADOW_CAST_DISTANCE 0.05\n"));
        assert!(code.contains("#define SDFL_MATERIAL_USER 5\n"));
    }

    #[test]
    fn test_material_lookup_covers_every_id() {
        let code = material_lookup(&MaterialPalette::default());
        for id in MaterialId::ALL {
            assert!(code.contains(&format!("if (id == {})", id.define())));
        }
    }

    #[test]
    fn test_fragment_main_placeholders() {
        let code = fragment_main("vec3(0, 1, 5)", "vec3(0.1)");
        assert!(code.contains("vec3 ray_origin = vec3(0, 1, 5);"));
        assert!(code.contains("vec3 background = vec3(0.1);"));
        assert!(!code.contains("{{"));
    }
}

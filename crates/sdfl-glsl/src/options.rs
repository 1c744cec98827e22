//! Generator settings
//!
//! Everything here ends up as `#define`s or constants in the generated
//! shaders. Options load from JSON; missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GenerateError, Result};

/// Shading parameters for one material id
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialOptions {
    /// Base color (RGB, 0-1)
    pub albedo: [f32; 3],
    /// 0 = mirror-like highlight, 1 = fully diffuse
    pub roughness: f32,
    /// Emitted color added after lighting (RGB)
    pub emission: [f32; 3],
}

impl MaterialOptions {
    pub const fn new(albedo: [f32; 3], roughness: f32) -> Self {
        Self {
            albedo,
            roughness,
            emission: [0.0, 0.0, 0.0],
        }
    }
}

/// One material per primitive kind plus one for user-defined functions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialPalette {
    pub plane: MaterialOptions,
    pub sphere: MaterialOptions,
    pub ellipsoid: MaterialOptions,
    #[serde(rename = "box")]
    pub box_shape: MaterialOptions,
    pub torus: MaterialOptions,
    pub user: MaterialOptions,
}

impl Default for MaterialPalette {
    fn default() -> Self {
        Self {
            plane: MaterialOptions::new([0.6, 0.6, 0.6], 0.9),
            sphere: MaterialOptions::new([0.85, 0.3, 0.25], 0.4),
            ellipsoid: MaterialOptions::new([0.3, 0.7, 0.4], 0.5),
            box_shape: MaterialOptions::new([0.3, 0.45, 0.85], 0.6),
            torus: MaterialOptions::new([0.9, 0.75, 0.3], 0.2),
            user: MaterialOptions::new([0.75, 0.75, 0.75], 0.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    // Raymarching
    /// Sphere-tracing step limit
    pub max_steps: u32,
    /// Rays stop once they travel this far
    pub max_distance: f32,
    /// A step shorter than this counts as a hit
    pub hit_distance: f32,
    /// Offset along the normal before casting a shadow ray
    pub shadow_cast_distance: f32,
    /// Soft shadow sharpness; higher is harder
    pub shadow_penumbra: f32,
    /// Central-difference step for normals
    pub normal_epsilon: f32,

    // Lighting
    pub light_position: [f32; 3],
    /// Ambient term multiplier
    pub ambient: f32,

    // Background
    /// Used when the scene does not set `background`
    pub background: [f32; 3],

    // Materials
    pub materials: MaterialPalette,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            max_steps: 100,
            max_distance: 100.0,
            hit_distance: 0.01,
            shadow_cast_distance: 0.05,
            shadow_penumbra: 8.0,
            normal_epsilon: 0.01,

            light_position: [0.0, 8.0, 3.0],
            ambient: 0.1,

            background: [0.7, 0.8, 0.9],

            materials: MaterialPalette::default(),
        }
    }
}

impl GeneratorOptions {
    /// Parse options from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load options from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GenerateError::ReadOptions {
            path: path.to_path_buf(),
            source,
        })?;
        let options = Self::from_json(&text)?;
        tracing::debug!("Loaded generator options from {}", path.display());
        Ok(options)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options =
            GeneratorOptions::from_json(r#"{ "max_steps": 250, "materials": { "box": { "albedo": [1, 0, 0], "roughness": 0.1, "emission": [0, 0, 0] } } }"#)
                .unwrap();
        assert_eq!(options.max_steps, 250);
        assert!((options.hit_distance - 0.01).abs() < f32::EPSILON);
        assert_eq!(options.materials.box_shape.albedo, [1.0, 0.0, 0.0]);
        assert_eq!(options.materials.sphere, MaterialPalette::default().sphere);
    }

    #[test]
    fn test_json_round_trip() {
        let options = GeneratorOptions::default();
        let text = options.to_json().unwrap();
        assert!(text.contains("\"box\""));
        assert_eq!(GeneratorOptions::from_json(&text).unwrap(), options);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            GeneratorOptions::from_json("{ \"max_steps\": -1 }"),
            Err(GenerateError::ParseOptions(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("sdfl-options-that-do-not-exist.json");
        assert!(matches!(
            GeneratorOptions::load(&path),
            Err(GenerateError::ReadOptions { .. })
        ));
    }
}

//! SDFL GLSL generation
//!
//! Turns an SDFL [`Program`](sdfl_lang::Program) into two GLSL 4.30 shaders:
//! a fragment shader that raymarches the scene and a compute shader that
//! samples the scene distance on a voxel grid.
//!
//! ## Key Types
//!
//! - [`GlslGenerator`] - One generation pass over a program
//! - [`GeneratorOptions`] - Raymarching, lighting and material constants
//! - [`VoxelGrid`] - Host-side indexing that matches the compute shader
//!
//! ## Example
//!
//! ```rust
//! use sdfl_glsl::GlslGenerator;
//! use sdfl_lang::{CompilationContext, parse_source};
//!
//! let mut ctx = CompilationContext::new();
//! let program = parse_source(
//!     "scene(camera: camera(position: (0, 1, 5)), children: [sphere(position: (0, 0, 0), radius: 1)])",
//!     &mut ctx,
//! )
//! .unwrap();
//!
//! let shaders = GlslGenerator::default().generate(&program, &mut ctx).unwrap();
//! assert!(shaders.fragment.contains("sdfl_PushScene(sd0);"));
//! ```

mod buffers;
mod error;
mod generator;
mod library;
mod options;
mod voxel;

pub use buffers::{GeneratedShaders, ShaderBuffers};
pub use error::{GenerateError, Result};
pub use generator::{GenerationStage, GlslGenerator, generate};
pub use library::MaterialId;
pub use options::{GeneratorOptions, MaterialOptions, MaterialPalette};
pub use voxel::{VoxelGrid, WORKGROUP_SIZE};

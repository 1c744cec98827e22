//! SDFL compile engine
//!
//! Ties the front end, the sequence codec and the GLSL generator together
//! and handles everything around a compile: reading inputs, writing output
//! files, recompiling on change and batch sequence export.
//!
//! ## Modules
//!
//! - [`compiler`] - Source or sequence in, [`Compilation`] out
//! - [`output`] - Output file names and writers
//! - [`batch`] - Parallel multi-file sequence export
//! - [`submission`] - Relay payload for sharing a program
//! - [`watch`] - Rebuild on file change (feature `file-watcher`)
//!
//! ## Example
//!
//! ```rust
//! use sdfl_engine::Compiler;
//!
//! let compilation = Compiler::default()
//!     .compile_source(
//!         "scene(camera: camera(position: (0, 1, 5)), children: [sphere(position: (0, 0, 0), radius: 1)])",
//!     )
//!     .unwrap();
//! assert_eq!(compilation.sequence[0], "call:scene:2");
//! assert!(compilation.shaders.compute.contains("sdfData"));
//! ```

pub mod batch;
pub mod compiler;
mod error;
pub mod output;
pub mod submission;
#[cfg(feature = "file-watcher")]
pub mod watch;

pub use batch::{SequenceExport, export_sequences};
pub use compiler::{Compilation, Compiler, InputKind};
pub use error::{CompileError, Result};
pub use output::OutputPaths;
pub use submission::{MIN_TAGS, ProgramSubmission};
#[cfg(feature = "file-watcher")]
pub use watch::{SourceWatcher, WatchEvent, watch_and_build};

pub use sdfl_glsl::{GeneratedShaders, GeneratorOptions};
pub use sdfl_lang::{Diagnostic, Severity};

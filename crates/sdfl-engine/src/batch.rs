//! Batch sequence export
//!
//! Compiles many source files in parallel and collects their sequences into
//! one multi-document file. A file that fails to compile is reported and
//! left out; the rest are still exported.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::compiler::{Compiler, InputKind};
use crate::error::{CompileError, Result};
use crate::output;

/// Outcome of a batch export
#[derive(Debug, Default)]
pub struct SequenceExport {
    /// Inputs whose sequence was written, in input order
    pub exported: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, CompileError)>,
}

impl SequenceExport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Compile every input and write their sequences to `output`.
///
/// With `append` the documents are added after whatever `output` already
/// holds; otherwise the file is replaced.
pub fn export_sequences(
    compiler: &Compiler,
    inputs: &[PathBuf],
    output: &Path,
    append: bool,
) -> Result<SequenceExport> {
    let results: Vec<_> = inputs
        .par_iter()
        .map(|path| {
            compiler
                .compile_file(path, InputKind::Source)
                .map(|compilation| compilation.sequence)
        })
        .collect();

    let mut export = SequenceExport::default();
    let mut documents = Vec::new();
    for (path, result) in inputs.iter().zip(results) {
        match result {
            Ok(sequence) => {
                documents.push(sequence);
                export.exported.push(path.clone());
            }
            Err(e) => {
                tracing::error!("Skipping {}: {}", path.display(), e);
                export.failed.push((path.clone(), e));
            }
        }
    }

    if append {
        for document in &documents {
            output::append_document(output, document)?;
        }
    } else if !documents.is_empty() {
        output::write_documents(output, &documents)?;
    }

    tracing::info!(
        "Exported {} of {} sequence(s) to {}",
        export.exported.len(),
        inputs.len(),
        output.display()
    );
    Ok(export)
}

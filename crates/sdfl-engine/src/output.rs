//! Output files
//!
//! A compile writes up to three files: the fragment shader, the compute
//! shader and the instruction sequence. Sequence files may hold several
//! documents separated by a blank line.

use std::path::{Path, PathBuf};

use sdfl_glsl::GeneratedShaders;

use crate::error::{CompileError, Result};

pub const FRAGMENT_FILE: &str = "out_frag.glsl";
pub const COMPUTE_FILE: &str = "out_compute.glsl";
pub const SEQUENCE_FILE: &str = "ast_sequence.txt";

/// Where a compile's outputs go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub fragment: PathBuf,
    pub compute: PathBuf,
    pub sequence: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self::in_dir(".")
    }
}

impl OutputPaths {
    /// The standard file names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            fragment: dir.join(FRAGMENT_FILE),
            compute: dir.join(COMPUTE_FILE),
            sequence: dir.join(SEQUENCE_FILE),
        }
    }

    pub fn write_shaders(&self, shaders: &GeneratedShaders) -> Result<()> {
        write_file(&self.fragment, &shaders.fragment)?;
        write_file(&self.compute, &shaders.compute)?;
        Ok(())
    }

    /// Overwrite the sequence file with a single document
    pub fn write_sequence(&self, lines: &[String]) -> Result<()> {
        write_file(&self.sequence, &document_text(lines))?;
        Ok(())
    }
}

/// Write several documents as one blank-line separated file
pub fn write_documents(path: impl AsRef<Path>, documents: &[Vec<String>]) -> Result<()> {
    let text = documents
        .iter()
        .map(|lines| lines.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n");
    write_file(path.as_ref(), &format!("{}\n", text))?;
    Ok(())
}

/// Append one document to a sequence file, creating it if needed
pub fn append_document(path: impl AsRef<Path>, lines: &[String]) -> Result<()> {
    let path = path.as_ref();
    let existing = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(source) => {
            return Err(CompileError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let existing = existing.trim_end();
    let text = if existing.is_empty() {
        document_text(lines)
    } else {
        format!("{}\n\n{}", existing, document_text(lines))
    };
    write_file(path, &text)?;
    Ok(())
}

fn document_text(lines: &[String]) -> String {
    format!("{}\n", lines.join("\n"))
}

fn write_file(path: &Path, contents: &str) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| CompileError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| CompileError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("{} bytes written to {}", contents.len(), path.display());
    Ok(contents.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sdfl-output-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    #[test]
    fn test_standard_names() {
        let paths = OutputPaths::in_dir("build");
        assert_eq!(paths.fragment, Path::new("build").join("out_frag.glsl"));
        assert_eq!(paths.compute, Path::new("build").join("out_compute.glsl"));
        assert_eq!(paths.sequence, Path::new("build").join("ast_sequence.txt"));
    }

    #[test]
    fn test_write_creates_directories() {
        let dir = temp_dir("write");
        let paths = OutputPaths::in_dir(dir.join("nested"));
        let shaders = GeneratedShaders {
            fragment: "frag".into(),
            compute: "comp".into(),
        };
        paths.write_shaders(&shaders).unwrap();
        paths.write_sequence(&lines("val:number\nliteral:1")).unwrap();

        assert_eq!(std::fs::read_to_string(&paths.fragment).unwrap(), "frag");
        assert_eq!(std::fs::read_to_string(&paths.compute).unwrap(), "comp");
        assert_eq!(
            std::fs::read_to_string(&paths.sequence).unwrap(),
            "val:number\nliteral:1\n"
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_append_separates_documents() {
        let dir = temp_dir("append");
        let path = dir.join("sequences.txt");
        append_document(&path, &lines("val:number\nliteral:1")).unwrap();
        append_document(&path, &lines("val:number\nliteral:2")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "val:number\nliteral:1\n\nval:number\nliteral:2\n");
        assert_eq!(sdfl_seq::split_documents(&text).len(), 2);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_documents() {
        let dir = temp_dir("documents");
        let path = dir.join("all.txt");
        write_documents(&path, &[lines("val:number\nliteral:1"), lines("val:number\nliteral:2")])
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "val:number\nliteral:1\n\nval:number\nliteral:2\n"
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }
}

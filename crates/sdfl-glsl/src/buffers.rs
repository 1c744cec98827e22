//! Output accumulators

/// The two shader texts of a finished pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeneratedShaders {
    /// `#version 430 core` raymarching fragment shader
    pub fragment: String,
    /// `#version 430` voxelizing compute shader
    pub compute: String,
}

/// Append-only fragment/compute text, filled in lockstep for shared code
#[derive(Debug, Clone, Default)]
pub struct ShaderBuffers {
    fragment: String,
    compute: String,
}

impl ShaderBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to both targets
    pub fn both(&mut self, code: &str) {
        self.fragment.push_str(code);
        self.compute.push_str(code);
    }

    pub fn fragment(&mut self, code: &str) {
        self.fragment.push_str(code);
    }

    pub fn compute(&mut self, code: &str) {
        self.compute.push_str(code);
    }

    pub fn clear(&mut self) {
        self.fragment.clear();
        self.compute.clear();
    }

    pub fn fragment_text(&self) -> &str {
        &self.fragment
    }

    pub fn compute_text(&self) -> &str {
        &self.compute
    }

    pub fn snapshot(&self) -> GeneratedShaders {
        GeneratedShaders {
            fragment: self.fragment.clone(),
            compute: self.compute.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lockstep_and_single_target() {
        let mut buffers = ShaderBuffers::new();
        buffers.both("shared;");
        buffers.fragment("frag;");
        buffers.compute("comp;");
        assert_eq!(buffers.fragment_text(), "shared;frag;");
        assert_eq!(buffers.compute_text(), "shared;comp;");

        buffers.clear();
        assert_eq!(buffers.snapshot(), GeneratedShaders::default());
    }
}

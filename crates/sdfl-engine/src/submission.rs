//! Program submission payload for the relay service
//!
//! Only the payload is built here; sending it is up to the caller.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::compiler::Compilation;
use crate::error::{CompileError, Result};

/// Fewest tags the relay accepts
pub const MIN_TAGS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgramSubmission {
    pub code: String,
    pub description: String,
    pub sequence_representation: Vec<String>,
    pub name: String,
    /// Base64-encoded preview image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_image: Option<String>,
    pub tags: Vec<String>,
}

impl ProgramSubmission {
    /// Payload for a compiled source program
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        code: impl Into<String>,
        compilation: &Compilation,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            sequence_representation: compilation.sequence.clone(),
            name: name.into(),
            preview_image: None,
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Attach raw image bytes, stored base64-encoded
    pub fn with_preview(mut self, image: &[u8]) -> Self {
        self.preview_image = Some(base64::engine::general_purpose::STANDARD.encode(image));
        self
    }

    /// Decoded preview image bytes, if any
    pub fn preview_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.preview_image
            .as_deref()
            .map(|data| base64::engine::general_purpose::STANDARD.decode(data))
            .transpose()
            .map_err(CompileError::from)
    }

    /// Check the fields the relay requires
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("code", self.code.as_str()),
            ("name", self.name.as_str()),
            ("description", self.description.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CompileError::Submission(format!("`{}` is empty", field)));
            }
        }

        if self.sequence_representation.is_empty() {
            return Err(CompileError::Submission(
                "`sequence_representation` is empty".into(),
            ));
        }

        let tags = self.tags.iter().filter(|t| !t.trim().is_empty()).count();
        if tags < MIN_TAGS {
            return Err(CompileError::Submission(format!(
                "{} tag(s) given, at least {} required",
                tags, MIN_TAGS
            )));
        }

        self.preview_bytes()?;
        Ok(())
    }

    /// Validate and serialize
    pub fn to_json(&self) -> Result<String> {
        self.validate()?;
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn submission() -> ProgramSubmission {
        ProgramSubmission {
            code: "scene(...)".into(),
            description: "a sphere".into(),
            sequence_representation: vec!["call:scene:2".into()],
            name: "ball".into(),
            preview_image: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_needs_three_tags() {
        let two = submission().with_tags(["sphere", "simple"]);
        assert!(matches!(two.validate(), Err(CompileError::Submission(_))));

        let blank = submission().with_tags(["sphere", "simple", "  "]);
        assert!(blank.validate().is_err());

        let three = submission().with_tags(["sphere", "simple", "demo"]);
        assert!(three.validate().is_ok());
    }

    #[test]
    fn test_required_fields() {
        let mut missing_name = submission().with_tags(["a", "b", "c"]);
        missing_name.name = " ".into();
        let err = missing_name.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid submission: `name` is empty");

        let mut missing_sequence = submission().with_tags(["a", "b", "c"]);
        missing_sequence.sequence_representation.clear();
        assert!(missing_sequence.validate().is_err());
    }

    #[test]
    fn test_preview_is_base64() {
        let payload = submission()
            .with_tags(["a", "b", "c"])
            .with_preview(&[0x89, b'P', b'N', b'G']);
        assert_eq!(payload.preview_image.as_deref(), Some("iVBORw=="));
        assert_eq!(
            payload.preview_bytes().unwrap(),
            Some(vec![0x89, b'P', b'N', b'G'])
        );

        let mut broken = payload.clone();
        broken.preview_image = Some("not base64!".into());
        assert!(matches!(broken.validate(), Err(CompileError::Preview(_))));
    }

    #[test]
    fn test_json_field_names() {
        let payload = submission().with_tags(["a", "b", "c"]).with_tag("d");
        let json = payload.to_json().unwrap();
        assert!(json.contains("\"sequence_representation\""));
        assert!(!json.contains("preview_image"));
        assert_eq!(ProgramSubmission::from_json(&json).unwrap(), payload);
    }
}

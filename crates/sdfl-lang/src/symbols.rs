//! Symbol table of builtin and user-defined functions
//!
//! The declared parameter order of each builtin is the canonical mapping from
//! named call arguments back to positional shader-function arguments.

use std::collections::HashMap;

use crate::ast::{Expression, FunctionDefinition};

/// What a symbol does during code generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolRole {
    Scene,
    Camera,
    LocalScope,
    Transform,
    BooleanOp,
    PrimitiveShape,
    UserDefined,
    BuiltinVariable,
    UserVariable,
}

impl SymbolRole {
    pub fn is_builtin(self) -> bool {
        !matches!(self, SymbolRole::UserDefined | SymbolRole::UserVariable)
    }
}

/// A symbol-table entry
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub identifier: String,
    pub role: SymbolRole,
    pub parameters: Vec<String>,
    /// Present only for user-defined functions
    pub body: Option<Expression>,
}

impl FunctionSignature {
    pub fn builtin(identifier: &str, role: SymbolRole, parameters: &[&str]) -> Self {
        Self {
            identifier: identifier.to_string(),
            role,
            parameters: parameters.iter().map(|p| (*p).to_string()).collect(),
            body: None,
        }
    }

    pub fn user_defined(definition: &FunctionDefinition) -> Self {
        Self {
            identifier: definition.identifier.clone(),
            role: SymbolRole::UserDefined,
            parameters: definition.parameters.clone(),
            body: Some(definition.body.clone()),
        }
    }
}

const BUILTINS: &[(&str, SymbolRole, &[&str])] = &[
    ("scene", SymbolRole::Scene, &["background", "camera", "children"]),
    ("local", SymbolRole::LocalScope, &["children"]),
    ("camera", SymbolRole::Camera, &["position"]),
    ("plane", SymbolRole::PrimitiveShape, &["height"]),
    ("sphere", SymbolRole::PrimitiveShape, &["position", "radius"]),
    ("ellipsoid", SymbolRole::PrimitiveShape, &["position", "radius"]),
    ("box", SymbolRole::PrimitiveShape, &["position", "size"]),
    (
        "torus",
        SymbolRole::PrimitiveShape,
        &["position", "radius", "thickness"],
    ),
    (
        "rotateAround",
        SymbolRole::Transform,
        &["position", "rotation", "child"],
    ),
    ("union", SymbolRole::BooleanOp, &["child1", "child2"]),
    ("intersection", SymbolRole::BooleanOp, &["child1", "child2"]),
    ("subtraction", SymbolRole::BooleanOp, &["child1", "child2"]),
    (
        "smoothUnion",
        SymbolRole::BooleanOp,
        &["child1", "child2", "smooth_transition"],
    ),
    (
        "smoothSubtraction",
        SymbolRole::BooleanOp,
        &["child1", "child2", "smooth_transition"],
    ),
    (
        "smoothIntersection",
        SymbolRole::BooleanOp,
        &["child1", "child2", "smooth_transition"],
    ),
];

/// Builtin signatures plus user functions registered while parsing
#[derive(Debug, Clone)]
pub struct SymbolTable {
    entries: HashMap<String, FunctionSignature>,
}

impl SymbolTable {
    /// A table seeded with every builtin
    pub fn new() -> Self {
        let entries = BUILTINS
            .iter()
            .map(|&(id, role, params)| (id.to_string(), FunctionSignature::builtin(id, role, params)))
            .collect();
        Self { entries }
    }

    /// A table with no builtins
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn lookup(&self, identifier: &str) -> Option<&FunctionSignature> {
        self.entries.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Insert a signature, overwriting (and returning) any previous entry
    pub fn register(&mut self, signature: FunctionSignature) -> Option<FunctionSignature> {
        self.entries.insert(signature.identifier.clone(), signature)
    }

    /// User-defined entries, sorted by identifier
    pub fn user_defined(&self) -> Vec<&FunctionSignature> {
        let mut user: Vec<&FunctionSignature> = self
            .entries
            .values()
            .filter(|s| s.role == SymbolRole::UserDefined)
            .collect();
        user.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        user
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_parameter_order() {
        let table = SymbolTable::new();
        let torus = table.lookup("torus").unwrap();
        assert_eq!(torus.role, SymbolRole::PrimitiveShape);
        assert_eq!(torus.parameters, vec!["position", "radius", "thickness"]);

        let scene = table.lookup("scene").unwrap();
        assert_eq!(scene.parameters, vec!["background", "camera", "children"]);

        assert_eq!(table.len(), BUILTINS.len());
        assert!(table.lookup("cylinder").is_none());
    }

    #[test]
    fn test_register_overwrites() {
        let mut table = SymbolTable::new();
        let definition = FunctionDefinition {
            identifier: "wheel".into(),
            parameters: vec!["size".into()],
            body: Expression::Invalid,
        };
        assert!(table.register(FunctionSignature::user_defined(&definition)).is_none());

        let replacement = FunctionDefinition {
            parameters: vec![],
            ..definition
        };
        let previous = table.register(FunctionSignature::user_defined(&replacement));
        assert_eq!(previous.unwrap().parameters, vec!["size"]);
        assert!(table.lookup("wheel").unwrap().parameters.is_empty());
        assert_eq!(table.user_defined().len(), 1);
        assert!(!SymbolRole::UserDefined.is_builtin());
    }
}

//! Per-compilation state
//!
//! Holds the symbol table, the fresh-name counters used by the code
//! generator and the diagnostic sink. Each compile gets its own context, so
//! repeated or parallel compiles never observe each other's registrations.

use std::collections::HashMap;

use crate::ast::{FunctionDefinition, Program};
use crate::diagnostics::{Diagnostics, Location, Phase};
use crate::symbols::{FunctionSignature, SymbolTable};

/// Monotonic per-base-name counters (`q0, q1, ...`, `sd0, sd1, ...`).
///
/// Names are never reclaimed within a pass; independent branches simply get
/// higher indices.
#[derive(Debug, Clone, Default)]
pub struct FreshNames {
    counters: HashMap<String, usize>,
}

impl FreshNames {
    pub fn next(&mut self, base: &str) -> String {
        let count = self.counters.entry(base.to_string()).or_insert(0);
        let name = format!("{}{}", base, count);
        *count += 1;
        name
    }

    pub fn reset(&mut self) {
        self.counters.clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompilationContext {
    pub symbols: SymbolTable,
    pub diagnostics: Diagnostics,
    names: FreshNames,
}

impl CompilationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh_name(&mut self, base: &str) -> String {
        self.names.next(base)
    }

    pub fn reset_names(&mut self) {
        self.names.reset();
    }

    /// Register a user function, warning when it replaces a builtin
    pub fn register_definition(&mut self, definition: &FunctionDefinition) {
        let previous = self
            .symbols
            .register(FunctionSignature::user_defined(definition));
        if let Some(previous) = previous {
            if previous.role.is_builtin() {
                self.diagnostics.warning(
                    Phase::Syntax,
                    Location::Path(definition.identifier.clone()),
                    format!("definition of `{}` shadows a builtin", definition.identifier),
                );
            }
        }
        tracing::debug!("Registered user function `{}`", definition.identifier);
    }

    /// Register every definition of a program, in declaration order
    pub fn register_program(&mut self, program: &Program) {
        for definition in program.definitions() {
            self.register_definition(definition);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expression;
    use crate::symbols::SymbolRole;

    #[test]
    fn test_fresh_names_are_per_base() {
        let mut ctx = CompilationContext::new();
        assert_eq!(ctx.fresh_name("q"), "q0");
        assert_eq!(ctx.fresh_name("sd"), "sd0");
        assert_eq!(ctx.fresh_name("q"), "q1");
        ctx.reset_names();
        assert_eq!(ctx.fresh_name("q"), "q0");
    }

    #[test]
    fn test_shadowing_a_builtin_warns() {
        let mut ctx = CompilationContext::new();
        ctx.register_definition(&FunctionDefinition {
            identifier: "sphere".into(),
            parameters: vec![],
            body: Expression::Invalid,
        });
        assert_eq!(
            ctx.symbols.lookup("sphere").map(|s| s.role),
            Some(SymbolRole::UserDefined)
        );
        assert_eq!(ctx.diagnostics.len(), 1);
        assert!(!ctx.diagnostics.has_errors());
    }
}

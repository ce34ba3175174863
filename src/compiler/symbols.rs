use indexmap::IndexMap;

use super::ast::{CompileUnit, LslType};
use super::builtins::{find_constant, find_function, is_reserved};
use super::error::CompileError;
use super::flags::AcceptedFlags;
use super::parser::is_identifier;
use super::resolver::VariableScope;

/// Scanner working state: the unit being built plus the stack of open
/// block scopes.
#[derive(Debug)]
pub struct CompileState {
    pub unit: CompileUnit,
    scopes: Vec<IndexMap<String, LslType>>,
}

impl CompileState {
    pub fn new(flags: AcceptedFlags) -> Self {
        Self {
            unit: CompileUnit::new(flags),
            scopes: Vec::new(),
        }
    }

    pub fn flags(&self) -> AcceptedFlags {
        self.unit.flags
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(IndexMap::new());
    }

    pub fn pop_scope(&mut self, line: usize) -> Result<(), CompileError> {
        self.scopes
            .pop()
            .map(|_| ())
            .ok_or_else(|| CompileError::internal("scope stack is empty on block exit", line))
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Name-validity and collision check for a new global, function,
    /// parameter, or local.
    pub fn check_new_name(&self, name: &str, line: usize) -> Result<(), CompileError> {
        if !is_identifier(name) {
            return Err(CompileError::declaration(format!("'{name}' is not a valid identifier"), line));
        }
        let collision = if is_reserved(name) {
            Some("a reserved word")
        } else if find_function(name, self.flags()).is_some() {
            Some("a built-in function")
        } else if find_constant(name, self.flags()).is_some() {
            Some("a built-in constant")
        } else if self.unit.globals.contains_key(name) {
            Some("a global variable")
        } else if self.unit.functions.contains_key(name) {
            Some("a function")
        } else if self.scopes.last().is_some_and(|scope| scope.contains_key(name)) {
            Some("a variable in this block")
        } else {
            None
        };
        match collision {
            Some(what) => Err(CompileError::declaration(
                format!("Name collision: '{name}' is already defined as {what}"),
                line,
            )),
            None => Ok(()),
        }
    }

    /// Add a parameter or local to the innermost scope.
    pub fn declare_local(&mut self, name: &str, ty: LslType, line: usize) -> Result<(), CompileError> {
        self.check_new_name(name, line)?;
        let scope = self
            .scopes
            .last_mut()
            .ok_or_else(|| CompileError::internal("local declared outside any scope", line))?;
        scope.insert(name.to_owned(), ty);
        Ok(())
    }

    pub fn into_unit(self) -> CompileUnit {
        self.unit
    }
}

impl VariableScope for CompileState {
    fn is_variable(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains_key(name)) || self.unit.globals.contains_key(name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::compiler::ast::GlobalVariable;
    use crate::compiler::error::ErrorKind;

    fn state() -> CompileState {
        CompileState::new(AcceptedFlags::DEFAULT_BASELINE)
    }

    fn add_global(state: &mut CompileState, name: &str) {
        state.unit.globals.insert(
            name.into(),
            GlobalVariable {
                name: name.into(),
                ty: LslType::Integer,
                line: 1,
                initializer: None,
                value: None,
            },
        );
    }

    #[test]
    fn invalid_identifiers() {
        let s = state();
        assert!(s.check_new_name("9lives", 1).is_err());
        assert!(s.check_new_name("a-b", 1).is_err());
        assert!(s.check_new_name("_ok$1", 1).is_ok());
    }

    #[test]
    fn collision_messages() {
        let mut s = state();
        add_global(&mut s, "count");
        let msg = |name: &str| s.check_new_name(name, 3).unwrap_err().message;
        assert!(msg("integer").contains("reserved word"));
        assert!(msg("llSay").contains("built-in function"));
        assert!(msg("PI").contains("built-in constant"));
        assert!(msg("count").contains("global variable"));
    }

    #[test]
    fn disabled_dialect_names_are_free() {
        let s = CompileState::new(AcceptedFlags::LSL);
        assert!(s.check_new_name("OS_NPC_FLY", 1).is_ok());
        assert!(s.check_new_name("osNpcCreate", 1).is_ok());
    }

    #[test]
    fn same_block_duplicates_fail_nested_ok() {
        let mut s = state();
        s.push_scope();
        s.declare_local("x", LslType::Integer, 1).unwrap();
        let err = s.declare_local("x", LslType::Float, 2).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Declaration);
        s.push_scope();
        assert!(s.declare_local("x", LslType::String, 3).is_ok());
        assert!(s.is_variable("x"));
        s.pop_scope(4).unwrap();
        s.pop_scope(5).unwrap();
        assert!(!s.is_variable("x"));
    }

    #[test]
    fn popping_empty_stack_is_internal() {
        let mut s = state();
        let err = s.pop_scope(9).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.line, 9);
    }
}

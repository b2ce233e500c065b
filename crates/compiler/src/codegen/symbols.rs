//! Symbol tables: lexically scoped variables and module-level functions.

use std::collections::HashMap;

use crate::ast::Span;
use crate::codegen::error::{CompileError, CompileErrorKind};
use crate::types::Type;

/// A declared variable: its type and the positive distance of its stack
/// slot below the frame base pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDescription<'a> {
    pub name: &'a str,
    pub ty: Type,
    pub stack_offset: usize,
}

/// A tree of lexical scopes, represented as a stack: the last entry is the
/// current scope and each entry's parent is the one below it. Lookup
/// climbs toward the root; declaration writes only into the current scope.
#[derive(Debug, Default)]
pub struct VariableTable<'a> {
    scopes: Vec<HashMap<&'a str, VariableDescription<'a>>>,
}

impl<'a> VariableTable<'a> {
    /// A table with the outermost (global) scope already open.
    pub fn new() -> Self {
        VariableTable {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() <= 1 {
            panic!("pop_scope called at global scope");
        }
        self.scopes.pop();
    }

    /// Bind a variable in the current scope. Fails if the name is already
    /// bound there; shadowing an outer scope is allowed.
    pub fn declare(
        &mut self,
        variable: VariableDescription<'a>,
        span: Span,
    ) -> Result<(), CompileError> {
        let top = self.scopes.len() - 1;
        let scope = &mut self.scopes[top];

        if scope.contains_key(variable.name) {
            return Err(CompileError::new(
                span,
                CompileErrorKind::VariableRedeclaration {
                    name: variable.name.to_string(),
                },
            ));
        }

        scope.insert(variable.name, variable);
        Ok(())
    }

    /// Find the nearest binding of `name`, walking outward through the
    /// enclosing scopes.
    pub fn lookup(&self, name: &str) -> Option<&VariableDescription<'a>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
    }
}

/// One function parameter of a resolved signature.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParameter<'a> {
    pub name: Option<&'a str>,
    pub ty: Type,
}

/// The typed interface of a function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature<'a> {
    pub return_type: Type,
    pub parameters: Vec<FunctionParameter<'a>>,
    pub is_variadic: bool,
}

impl<'a> FunctionSignature<'a> {
    /// Two signatures match iff their return types are equal, their
    /// parameter counts and types agree position by position, and their
    /// variadic flags agree. Parameter names are irrelevant.
    pub fn matches(&self, other: &FunctionSignature<'a>) -> bool {
        self.parameters.len() == other.parameters.len()
            && self.is_variadic == other.is_variadic
            && self.return_type == other.return_type
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(left, right)| left.ty == right.ty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDescription<'a> {
    pub name: &'a str,
    pub signature: FunctionSignature<'a>,
    pub has_definition: bool,
}

/// Module-scope function table. Iteration follows insertion order so the
/// emitted assembly is deterministic.
#[derive(Debug, Default)]
pub struct FunctionTable<'a> {
    descriptions: Vec<FunctionDescription<'a>>,
    index: HashMap<&'a str, usize>,
}

impl<'a> FunctionTable<'a> {
    pub fn new() -> Self {
        FunctionTable::default()
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDescription<'a>> {
        self.index.get(name).map(|&i| &self.descriptions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionDescription<'a>> {
        self.descriptions.iter()
    }

    fn insert(&mut self, description: FunctionDescription<'a>) {
        self.index.insert(description.name, self.descriptions.len());
        self.descriptions.push(description);
    }

    /// Record a declaration. Idempotent for matching signatures; a
    /// conflicting signature is an error.
    pub fn declare(
        &mut self,
        name: &'a str,
        signature: &FunctionSignature<'a>,
        span: Span,
    ) -> Result<(), CompileError> {
        match self.get(name) {
            Some(existing) => {
                if existing.signature.matches(signature) {
                    Ok(())
                } else {
                    Err(CompileError::new(
                        span,
                        CompileErrorKind::FunctionSignatureMismatch {
                            name: name.to_string(),
                        },
                    ))
                }
            }
            None => {
                self.insert(FunctionDescription {
                    name,
                    signature: signature.clone(),
                    has_definition: false,
                });
                Ok(())
            }
        }
    }

    /// Record a definition. The signature must match any prior
    /// declaration, and a function is defined at most once.
    pub fn define(
        &mut self,
        name: &'a str,
        signature: &FunctionSignature<'a>,
        span: Span,
    ) -> Result<(), CompileError> {
        match self.index.get(name).copied() {
            Some(existing_index) => {
                let existing = &self.descriptions[existing_index];

                if !existing.signature.matches(signature) {
                    return Err(CompileError::new(
                        span,
                        CompileErrorKind::FunctionSignatureMismatch {
                            name: name.to_string(),
                        },
                    ));
                }
                if existing.has_definition {
                    return Err(CompileError::new(
                        span,
                        CompileErrorKind::FunctionRedefinition {
                            name: name.to_string(),
                        },
                    ));
                }

                self.descriptions[existing_index].has_definition = true;
                Ok(())
            }
            None => {
                self.insert(FunctionDescription {
                    name,
                    signature: signature.clone(),
                    has_definition: true,
                });
                Ok(())
            }
        }
    }
}

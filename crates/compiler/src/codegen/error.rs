//! Code generation error types.

use std::fmt;

use crate::ast::{BinaryOpKind, Span};
use crate::types::Type;

/// A semantic error found while generating code. Carries the source span
/// of the offending construct plus a kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub span: Span,
    pub kind: CompileErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompileErrorKind {
    Unknown,
    NotImplemented,
    UndeclaredIdentifier {
        name: String,
    },
    IncompatibleTypes {
        first: Type,
        second: Type,
    },
    IncompatibleTypesWithBinaryOp {
        op: BinaryOpKind,
        first: Type,
        second: Type,
    },
    IncorrectArgumentCount {
        function_name: String,
        expected: usize,
        got: usize,
    },
    VariableRedeclaration {
        name: String,
    },
    FunctionRedefinition {
        name: String,
    },
    FunctionSignatureMismatch {
        name: String,
    },
}

impl CompileError {
    pub fn new(span: Span, kind: CompileErrorKind) -> Self {
        CompileError { span, kind }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) ", self.span)?;

        match &self.kind {
            CompileErrorKind::Unknown => f.write_str("unknown error"),
            CompileErrorKind::NotImplemented => f.write_str("not implemented"),
            CompileErrorKind::UndeclaredIdentifier { name } => {
                write!(f, "undeclared identifier: {}", name)
            }
            CompileErrorKind::IncompatibleTypes { first, second } => {
                write!(f, "incompatible types: {} and {}", first, second)
            }
            CompileErrorKind::IncompatibleTypesWithBinaryOp { op, first, second } => {
                write!(
                    f,
                    "incompatible types for binary `{}`: {} and {}",
                    op, first, second
                )
            }
            CompileErrorKind::IncorrectArgumentCount {
                function_name,
                expected,
                got,
            } => {
                write!(
                    f,
                    "incorrect argument count for function {}: expected {}, got {}",
                    function_name, expected, got
                )
            }
            CompileErrorKind::VariableRedeclaration { name } => {
                write!(f, "redeclaration of {}", name)
            }
            CompileErrorKind::FunctionRedefinition { name } => {
                write!(f, "redefinition of {}", name)
            }
            CompileErrorKind::FunctionSignatureMismatch { name } => {
                write!(f, "mismatched function signature in {}", name)
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// Error type for code generation.
///
/// Allows `?` propagation both for semantic errors (invalid programs) and
/// for formatting errors while writing assembly text.
#[derive(Debug)]
pub enum CodeGenError {
    Compile(CompileError),
    Format(std::fmt::Error),
}

impl fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeGenError::Compile(error) => write!(f, "{}", error),
            CodeGenError::Format(error) => write!(f, "assembly emission error: {}", error),
        }
    }
}

impl std::error::Error for CodeGenError {}

impl From<CompileError> for CodeGenError {
    fn from(error: CompileError) -> Self {
        CodeGenError::Compile(error)
    }
}

impl From<std::fmt::Error> for CodeGenError {
    fn from(error: std::fmt::Error) -> Self {
        CodeGenError::Format(error)
    }
}

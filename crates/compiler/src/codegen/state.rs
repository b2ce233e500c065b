//! Compiler state and core types.
//!
//! The [`Compiler`] owns the output buffers and symbol tables for one
//! compilation. Functions are compiled into a separate body buffer first,
//! because the prologue can only be sized once the whole body has been
//! seen (`stack_offset_max` is a high-water mark).
//!
//! Stack bookkeeping uses three offsets, all positive distances below the
//! frame base pointer:
//! - `stack_offset`: bytes taken by live variables;
//! - `stack_offset_temporary`: live variables plus expression temporaries;
//!   reset to `stack_offset` at every statement boundary so temporaries
//!   never overlap live variables;
//! - `stack_offset_max`: high-water mark of both, used to size the frame.

use crate::ast::{Span, TypeExpr, TypeExprKind};
use crate::codegen::asm::{Operand, align_up};
use crate::codegen::error::CompileError;
use crate::codegen::symbols::{FunctionTable, VariableDescription, VariableTable};
use crate::types::Type;

/// Single-pass code generator: walks the AST once, building symbol tables
/// on the fly and emitting assembly text.
pub struct Compiler<'a> {
    /// `.text` section contents.
    pub(super) text: String,
    /// `.data` section contents.
    pub(super) data: String,
    /// Body of the function currently being compiled.
    pub(super) body: String,
    pub(super) variables: VariableTable<'a>,
    pub(super) functions: FunctionTable<'a>,
    /// Return type of the function currently being compiled.
    pub(super) return_type: Type,
    pub(super) stack_offset: usize,
    pub(super) stack_offset_temporary: usize,
    pub(super) stack_offset_max: usize,
}

impl<'a> Compiler<'a> {
    pub fn new() -> Self {
        Compiler {
            text: String::new(),
            data: String::new(),
            body: String::new(),
            variables: VariableTable::new(),
            functions: FunctionTable::new(),
            return_type: Type::Unknown,
            stack_offset: 0,
            stack_offset_temporary: 0,
            stack_offset_max: 0,
        }
    }

    /// Reset the per-function state before compiling a function body.
    pub(super) fn init_function_context(&mut self, return_type: Type) {
        self.return_type = return_type;
        self.stack_offset = 0;
        self.stack_offset_temporary = 0;
        self.stack_offset_max = 0;
        self.body.clear();
    }

    /// Reserve frame space for a variable and bind it in the current
    /// scope. The slot is aligned to the type's alignment.
    pub(super) fn declare_variable(
        &mut self,
        name: &'a str,
        ty: Type,
        span: Span,
    ) -> Result<VariableDescription<'a>, CompileError> {
        let size = ty.size_bytes();
        let align = ty.align_bytes();

        self.stack_offset = align_up(self.stack_offset, align) + size;
        self.stack_offset_temporary = self.stack_offset;
        self.stack_offset_max = self.stack_offset_max.max(self.stack_offset);

        let variable = VariableDescription {
            name,
            ty,
            stack_offset: self.stack_offset,
        };
        self.variables.declare(variable.clone(), span)?;

        Ok(variable)
    }

    /// Reserve a stack temporary for the rest of the current statement.
    pub(super) fn allocate_temporary(&mut self, size_bytes: usize) -> Operand<'static> {
        self.stack_offset_temporary += size_bytes;
        self.stack_offset_max = self.stack_offset_max.max(self.stack_offset_temporary);
        Operand::stack(self.stack_offset_temporary)
    }

    /// Release stack temporaries taken with [`Compiler::allocate_temporary`].
    pub(super) fn free_temporary(&mut self, size_bytes: usize) {
        self.stack_offset_temporary -= size_bytes;
    }
}

impl<'a> Default for Compiler<'a> {
    fn default() -> Self {
        Compiler::new()
    }
}

/// Resolve a type as written in the source to a semantic type.
pub(super) fn analyze_type(ty: &TypeExpr) -> Type {
    match ty.kind {
        TypeExprKind::Integer { size, is_signed } => Type::Integer { size, is_signed },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntegerSize;

    #[test]
    fn test_declared_variables_take_aligned_slots() {
        let mut compiler = Compiler::new();

        let a = compiler
            .declare_variable("a", Type::signed(IntegerSize::S8), Span::default())
            .unwrap();
        assert_eq!(a.stack_offset, 1);

        // the 8-byte variable is aligned up past the 1-byte one
        let b = compiler
            .declare_variable("b", Type::signed(IntegerSize::S64), Span::default())
            .unwrap();
        assert_eq!(b.stack_offset, 16);
        assert_eq!(b.stack_offset % 8, 0);

        assert_eq!(compiler.stack_offset_max, 16);
    }

    #[test]
    fn test_temporaries_stack_and_unwind() {
        let mut compiler = Compiler::new();
        compiler
            .declare_variable("a", Type::signed(IntegerSize::S32), Span::default())
            .unwrap();

        let first = compiler.allocate_temporary(4);
        let second = compiler.allocate_temporary(4);
        assert_eq!(first, Operand::stack(8));
        assert_eq!(second, Operand::stack(12));
        assert_eq!(compiler.stack_offset_max, 12);

        compiler.free_temporary(8);
        assert_eq!(compiler.stack_offset_temporary, compiler.stack_offset);
        // the high-water mark stays
        assert_eq!(compiler.stack_offset_max, 12);
    }

    #[test]
    fn test_analyze_type_maps_integer_kinds() {
        let ty = TypeExpr {
            kind: TypeExprKind::Integer {
                size: IntegerSize::S16,
                is_signed: false,
            },
            span: Span::default(),
        };
        assert_eq!(analyze_type(&ty), Type::unsigned(IntegerSize::S16));
    }
}

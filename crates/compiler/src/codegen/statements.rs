//! Statement and block code generation.

use crate::ast::{Block, Expression, Identifier, Statement, StatementKind, TypeExpr};
use crate::codegen::asm::{IntReg, Operand, emit_assignment, emit_function_exit};
use crate::codegen::error::{CodeGenError, CompileError, CompileErrorKind};
use crate::codegen::state::{Compiler, analyze_type};
use crate::types::Type;

impl<'a> Compiler<'a> {
    /// Compile a block in a fresh lexical scope. The scope is popped on
    /// every exit path, including errors.
    pub(super) fn compile_block(&mut self, block: &Block<'a>) -> Result<(), CodeGenError> {
        self.variables.push_scope();
        let result = self.compile_block_statements(block);
        self.variables.pop_scope();
        result
    }

    fn compile_block_statements(&mut self, block: &Block<'a>) -> Result<(), CodeGenError> {
        for statement in block.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    fn compile_statement(&mut self, statement: &Statement<'a>) -> Result<(), CodeGenError> {
        // statement boundary: temporaries never overlap live variables
        self.stack_offset_temporary = self.stack_offset;

        match &statement.kind {
            StatementKind::Expression(expression) => {
                // evaluate for effect, discard the value
                self.compile_expression(expression)?;
                Ok(())
            }
            StatementKind::VariableDeclaration {
                name,
                ty,
                initializer,
            } => self.compile_variable_declaration(*name, *ty, *initializer, statement),
            StatementKind::Return(expression) => self.compile_return(*expression),
        }
    }

    fn compile_variable_declaration(
        &mut self,
        name: Identifier<'a>,
        ty: TypeExpr,
        initializer: Option<&'a Expression<'a>>,
        statement: &Statement<'a>,
    ) -> Result<(), CodeGenError> {
        let ty = analyze_type(&ty);
        let variable = self.declare_variable(name.name, ty, statement.span)?;

        if let Some(initializer) = initializer {
            let value = self.compile_expression(initializer)?;

            if !Type::can_coerce(&variable.ty, &value.ty) {
                return Err(CompileError::new(
                    initializer.span,
                    CompileErrorKind::IncompatibleTypes {
                        first: variable.ty,
                        second: value.ty,
                    },
                )
                .into());
            }

            emit_assignment(
                &mut self.body,
                Operand::stack(variable.stack_offset),
                value.operand,
                &variable.ty,
                &value.ty,
            )?;
        }

        Ok(())
    }

    fn compile_return(
        &mut self,
        expression: Option<&'a Expression<'a>>,
    ) -> Result<(), CodeGenError> {
        if let Some(expression) = expression {
            let value = self.compile_expression(expression)?;
            let return_type = self.return_type.clone();

            if !Type::can_coerce(&return_type, &value.ty) {
                return Err(CompileError::new(
                    expression.span,
                    CompileErrorKind::IncompatibleTypes {
                        first: return_type,
                        second: value.ty,
                    },
                )
                .into());
            }

            // return value goes in rax
            emit_assignment(
                &mut self.body,
                Operand::Register(IntReg::A),
                value.operand,
                &return_type,
                &value.ty,
            )?;
        }

        emit_function_exit(&mut self.body)?;
        Ok(())
    }
}

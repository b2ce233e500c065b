//! Expression code generation.
//!
//! Every expression compiles to an [`ExpressionValue`]: the operand its
//! result lives in plus its semantic type. A fixed register scheme is
//! used instead of a register allocator: binary operations run with the
//! left operand in `rax` and the right in `rbx`, and any register-held
//! value is spilled to a stack temporary before another subexpression is
//! compiled, so subexpression codegen may clobber registers freely.

use crate::ast::{BinaryOpKind, Expression, ExpressionKind, Identifier, IntegerLiteral, Span};
use crate::codegen::abi::ArgumentPlacer;
use crate::codegen::asm::{
    Instruction, IntReg, Operand, OperandWidth, emit_assignment, emit_instruction,
    emit_instruction_dst_src, emit_instruction_single, emit_move,
};
use crate::codegen::error::{CodeGenError, CompileError, CompileErrorKind};
use crate::codegen::state::Compiler;
use crate::types::{IntegerSize, Type};

/// The result of compiling an expression: where the value lives and what
/// type it has.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct ExpressionValue<'a> {
    pub operand: Operand<'a>,
    pub ty: Type,
}

/// The semantic type of an integer literal: `l` forces 64 bits, otherwise
/// the smallest type of at least 32 bits that can represent the value.
fn constant_type(literal: &IntegerLiteral) -> Type {
    if literal.is_long {
        Type::Integer {
            size: IntegerSize::S64,
            is_signed: literal.is_signed,
        }
    } else if literal.is_signed {
        if literal.value <= i32::MAX as u64 {
            Type::signed(IntegerSize::S32)
        } else {
            Type::signed(IntegerSize::S64)
        }
    } else if literal.value <= u64::from(u32::MAX) {
        Type::unsigned(IntegerSize::S32)
    } else {
        Type::unsigned(IntegerSize::S64)
    }
}

impl<'a> Compiler<'a> {
    pub(super) fn compile_expression(
        &mut self,
        expression: &Expression<'a>,
    ) -> Result<ExpressionValue<'a>, CodeGenError> {
        match &expression.kind {
            ExpressionKind::Identifier(identifier) => self.compile_identifier(identifier),
            ExpressionKind::Constant(literal) => Ok(ExpressionValue {
                operand: Operand::Immediate(literal.value),
                ty: constant_type(literal),
            }),
            ExpressionKind::Assignment { assignee, value } => {
                self.compile_assignment(*assignee, value, expression.span)
            }
            ExpressionKind::Call { callee, arguments } => self.compile_call(*callee, arguments),
            ExpressionKind::UnaryOp { .. } => Err(CompileError::new(
                expression.span,
                CompileErrorKind::NotImplemented,
            )
            .into()),
            ExpressionKind::BinaryOp { op, left, right } => {
                self.compile_binary_op(*op, left, right, expression.span)
            }
        }
    }

    fn compile_identifier(
        &mut self,
        identifier: &Identifier<'a>,
    ) -> Result<ExpressionValue<'a>, CodeGenError> {
        let Some(variable) = self.variables.lookup(identifier.name) else {
            return Err(CompileError::new(
                identifier.span,
                CompileErrorKind::UndeclaredIdentifier {
                    name: identifier.name.to_string(),
                },
            )
            .into());
        };

        Ok(ExpressionValue {
            operand: Operand::stack(variable.stack_offset),
            ty: variable.ty.clone(),
        })
    }

    fn compile_assignment(
        &mut self,
        assignee: Identifier<'a>,
        value: &Expression<'a>,
        span: Span,
    ) -> Result<ExpressionValue<'a>, CodeGenError> {
        let Some(variable) = self.variables.lookup(assignee.name).cloned() else {
            return Err(CompileError::new(
                assignee.span,
                CompileErrorKind::UndeclaredIdentifier {
                    name: assignee.name.to_string(),
                },
            )
            .into());
        };

        let value = self.compile_expression(value)?;

        if !Type::can_coerce(&variable.ty, &value.ty) {
            return Err(CompileError::new(
                span,
                CompileErrorKind::IncompatibleTypes {
                    first: variable.ty,
                    second: value.ty,
                },
            )
            .into());
        }

        let slot = Operand::stack(variable.stack_offset);
        emit_assignment(&mut self.body, slot, value.operand, &variable.ty, &value.ty)?;

        Ok(ExpressionValue {
            operand: slot,
            ty: variable.ty,
        })
    }

    /// Spill a register-held value to a stack temporary, so that compiling
    /// another expression cannot clobber it. `temporary_usage` accumulates
    /// the bytes to release once the consuming operation is done.
    fn spill_to_temporary(
        &mut self,
        value: &mut ExpressionValue<'a>,
        temporary_usage: &mut usize,
    ) -> Result<(), CodeGenError> {
        if !value.operand.is_register() {
            return Ok(());
        }

        let size = value.ty.size_bytes();
        let width = OperandWidth::of_type(&value.ty);
        let temporary = self.allocate_temporary(size);

        emit_move(
            &mut self.body,
            temporary,
            value.operand,
            width,
            width,
            IntReg::A,
        )?;

        value.operand = temporary;
        *temporary_usage += size;
        Ok(())
    }

    fn compile_call(
        &mut self,
        callee: Identifier<'a>,
        arguments: &[Expression<'a>],
    ) -> Result<ExpressionValue<'a>, CodeGenError> {
        let Some(description) = self.functions.get(callee.name) else {
            return Err(CompileError::new(
                callee.span,
                CompileErrorKind::UndeclaredIdentifier {
                    name: callee.name.to_string(),
                },
            )
            .into());
        };

        if arguments.len() != description.signature.parameters.len() {
            return Err(CompileError::new(
                callee.span,
                CompileErrorKind::IncorrectArgumentCount {
                    function_name: description.name.to_string(),
                    expected: description.signature.parameters.len(),
                    got: arguments.len(),
                },
            )
            .into());
        }

        let name = description.name;
        let signature = description.signature.clone();

        // compile arguments in source order, spilling register results so
        // a later argument's codegen can clobber registers freely
        let mut placer = ArgumentPlacer::new();
        let mut temporary_usage = 0usize;
        let mut placements = Vec::with_capacity(arguments.len());

        for (argument, parameter) in arguments.iter().zip(&signature.parameters) {
            let location = placer.place(&parameter.ty);

            let mut value = self.compile_expression(argument)?;

            if !Type::can_coerce(&parameter.ty, &value.ty) {
                return Err(CompileError::new(
                    argument.span,
                    CompileErrorKind::IncompatibleTypes {
                        first: parameter.ty.clone(),
                        second: value.ty,
                    },
                )
                .into());
            }

            self.spill_to_temporary(&mut value, &mut temporary_usage)?;
            placements.push((location, value, parameter.ty.clone()));
        }

        // move arguments into their target locations in reverse order, so
        // stack-passed arguments are pushed back to front
        for (location, value, parameter_ty) in placements.iter().rev() {
            match location {
                Operand::Register(_) => {
                    emit_assignment(
                        &mut self.body,
                        *location,
                        value.operand,
                        parameter_ty,
                        &value.ty,
                    )?;
                }
                Operand::Memory { .. } => {
                    // stack argument: convert in rax, push 8 bytes
                    let rax = Operand::Register(IntReg::A);
                    emit_assignment(&mut self.body, rax, value.operand, parameter_ty, &value.ty)?;
                    emit_instruction_single(
                        &mut self.body,
                        Instruction::Push,
                        OperandWidth::QWord,
                        rax,
                    )?;
                }
                _ => unreachable!("argument placed in an impossible location"),
            }
        }

        emit_instruction_single(
            &mut self.body,
            Instruction::Call,
            OperandWidth::QWord,
            Operand::Label(name),
        )?;

        // pop stack-passed arguments
        if placer.stack_bytes() > 0 {
            emit_instruction_dst_src(
                &mut self.body,
                Instruction::Add,
                OperandWidth::QWord,
                OperandWidth::QWord,
                Operand::Register(IntReg::Sp),
                Operand::Immediate(placer.stack_bytes() as u64),
            )?;
        }

        self.free_temporary(temporary_usage);

        Ok(ExpressionValue {
            operand: Operand::Register(IntReg::A),
            ty: signature.return_type,
        })
    }

    fn compile_binary_op(
        &mut self,
        op: BinaryOpKind,
        left: &Expression<'a>,
        right: &Expression<'a>,
        span: Span,
    ) -> Result<ExpressionValue<'a>, CodeGenError> {
        let mut temporary_usage = 0usize;

        let mut left_value = self.compile_expression(left)?;
        self.spill_to_temporary(&mut left_value, &mut temporary_usage)?;

        let right_value = self.compile_expression(right)?;

        let result_type = Type::promote(&left_value.ty, &right_value.ty);
        if !Type::can_coerce(&result_type, &left_value.ty)
            || !Type::can_coerce(&result_type, &right_value.ty)
        {
            return Err(CompileError::new(
                span,
                CompileErrorKind::IncompatibleTypesWithBinaryOp {
                    op,
                    first: left_value.ty,
                    second: right_value.ty,
                },
            )
            .into());
        }

        // right into rbx first: it may currently live in rax
        let rax = Operand::Register(IntReg::A);
        let rbx = Operand::Register(IntReg::B);
        emit_assignment(
            &mut self.body,
            rbx,
            right_value.operand,
            &result_type,
            &right_value.ty,
        )?;
        emit_assignment(
            &mut self.body,
            rax,
            left_value.operand,
            &result_type,
            &left_value.ty,
        )?;

        let width = OperandWidth::of_type(&result_type);
        match op {
            BinaryOpKind::Add => {
                emit_instruction_dst_src(&mut self.body, Instruction::Add, width, width, rax, rbx)?;
            }
            BinaryOpKind::Sub => {
                emit_instruction_dst_src(&mut self.body, Instruction::Sub, width, width, rax, rbx)?;
            }
            BinaryOpKind::Mul => {
                emit_instruction_dst_src(&mut self.body, Instruction::IMul, width, width, rax, rbx)?;
            }
            BinaryOpKind::Div => {
                // sign-extend rax into rdx, then divide by rbx
                emit_instruction(&mut self.body, Instruction::Cdq)?;
                emit_instruction_single(&mut self.body, Instruction::IDiv, width, rbx)?;
            }
        }

        self.free_temporary(temporary_usage);

        Ok(ExpressionValue {
            operand: rax,
            ty: result_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_type_defaults_to_int32() {
        let literal = IntegerLiteral {
            value: 0,
            is_long: false,
            is_signed: true,
        };
        assert_eq!(constant_type(&literal), Type::signed(IntegerSize::S32));
    }

    #[test]
    fn test_constant_type_grows_past_int32_range() {
        let literal = IntegerLiteral {
            value: 2_147_483_648,
            is_long: false,
            is_signed: true,
        };
        assert_eq!(constant_type(&literal), Type::signed(IntegerSize::S64));

        // the same value fits as unsigned 32-bit
        let literal = IntegerLiteral {
            value: 2_147_483_648,
            is_long: false,
            is_signed: false,
        };
        assert_eq!(constant_type(&literal), Type::unsigned(IntegerSize::S32));
    }

    #[test]
    fn test_constant_type_long_suffix_forces_64_bits() {
        let literal = IntegerLiteral {
            value: 1,
            is_long: true,
            is_signed: true,
        };
        assert_eq!(constant_type(&literal), Type::signed(IntegerSize::S64));

        let literal = IntegerLiteral {
            value: 1,
            is_long: true,
            is_signed: false,
        };
        assert_eq!(constant_type(&literal), Type::unsigned(IntegerSize::S64));
    }

    #[test]
    fn test_constant_type_unsigned_boundary() {
        let literal = IntegerLiteral {
            value: u64::from(u32::MAX) + 1,
            is_long: false,
            is_signed: false,
        };
        assert_eq!(constant_type(&literal), Type::unsigned(IntegerSize::S64));
    }
}

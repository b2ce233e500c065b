//! AST pretty-printer.
//!
//! Renders a parsed tree back to C source text. The output reparses to an
//! equivalent tree, which the tests use as a round-trip check on the
//! parser: printing, reparsing and printing again is a fixed point.

use std::fmt::{self, Write as _};

use crate::ast::{
    BinaryOpKind, Block, Expression, ExpressionKind, FunctionDefinition, Parameter, Root,
    Signature, Statement, StatementKind, TypeExpr, TypeExprKind, UnaryOpKind,
};
use crate::types::IntegerSize;

const INDENT: &str = "    ";

/// Render a whole translation unit.
pub fn print_root(root: &Root<'_>) -> String {
    let mut out = String::new();

    for (index, item) in root.items.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let crate::ast::TopLevelItemKind::FunctionDefinition(ref function) = item.kind;
        // String formatting cannot fail
        let _ = write_function(&mut out, function);
    }

    out
}

fn write_function(out: &mut String, function: &FunctionDefinition<'_>) -> fmt::Result {
    write_signature(out, &function.signature)?;
    out.write_str(" ")?;
    write_block(out, &function.body)
}

fn write_signature(out: &mut String, signature: &Signature<'_>) -> fmt::Result {
    write_type(out, &signature.return_type)?;
    write!(out, " {}(", signature.name.name)?;

    for (index, parameter) in signature.parameters.iter().enumerate() {
        if index > 0 {
            out.write_str(", ")?;
        }
        write_parameter(out, parameter)?;
    }

    out.write_str(")")
}

fn write_parameter(out: &mut String, parameter: &Parameter<'_>) -> fmt::Result {
    write_type(out, &parameter.ty)?;
    if let Some(name) = parameter.name {
        write!(out, " {}", name.name)?;
    }
    Ok(())
}

fn write_type(out: &mut String, ty: &TypeExpr) -> fmt::Result {
    let TypeExprKind::Integer { size, is_signed } = ty.kind;

    // `char` is unsigned unless qualified; the other widths are signed
    // unless qualified
    let name = match (size, is_signed) {
        (IntegerSize::S8, false) => "char",
        (IntegerSize::S8, true) => "signed char",
        (IntegerSize::S16, true) => "short",
        (IntegerSize::S16, false) => "unsigned short",
        (IntegerSize::S32, true) => "int",
        (IntegerSize::S32, false) => "unsigned int",
        (IntegerSize::S64, true) => "long",
        (IntegerSize::S64, false) => "unsigned long",
    };
    out.write_str(name)
}

fn write_block(out: &mut String, block: &Block<'_>) -> fmt::Result {
    out.write_str("{\n")?;
    for statement in block.statements {
        out.write_str(INDENT)?;
        write_statement(out, statement)?;
        out.write_str("\n")?;
    }
    out.write_str("}\n")
}

fn write_statement(out: &mut String, statement: &Statement<'_>) -> fmt::Result {
    match &statement.kind {
        StatementKind::Expression(expression) => {
            write_expression(out, expression)?;
            out.write_str(";")
        }
        StatementKind::VariableDeclaration {
            name,
            ty,
            initializer,
        } => {
            write_type(out, ty)?;
            write!(out, " {}", name.name)?;
            if let Some(initializer) = initializer {
                out.write_str(" = ")?;
                write_expression(out, initializer)?;
            }
            out.write_str(";")
        }
        StatementKind::Return(expression) => {
            out.write_str("return")?;
            if let Some(expression) = expression {
                out.write_str(" ")?;
                write_expression(out, expression)?;
            }
            out.write_str(";")
        }
    }
}

/// Binding strength, used to decide where parentheses are required.
fn precedence(expression: &Expression<'_>) -> u8 {
    match &expression.kind {
        ExpressionKind::Assignment { .. } => 0,
        ExpressionKind::BinaryOp { op, .. } => match op {
            BinaryOpKind::Add | BinaryOpKind::Sub => 1,
            BinaryOpKind::Mul | BinaryOpKind::Div => 2,
        },
        _ => 3,
    }
}

fn write_expression(out: &mut String, expression: &Expression<'_>) -> fmt::Result {
    match &expression.kind {
        ExpressionKind::Identifier(identifier) => out.write_str(identifier.name),
        ExpressionKind::Constant(literal) => {
            write!(out, "{}", literal.value)?;
            if !literal.is_signed {
                out.write_str("u")?;
            }
            if literal.is_long {
                out.write_str("l")?;
            }
            Ok(())
        }
        ExpressionKind::Assignment { assignee, value } => {
            write!(out, "{} = ", assignee.name)?;
            write_expression(out, value)
        }
        ExpressionKind::Call { callee, arguments } => {
            write!(out, "{}(", callee.name)?;
            for (index, argument) in arguments.iter().enumerate() {
                if index > 0 {
                    out.write_str(", ")?;
                }
                write_expression(out, argument)?;
            }
            out.write_str(")")
        }
        ExpressionKind::UnaryOp { op, operand } => {
            let UnaryOpKind::Negation = op;
            out.write_str("-")?;
            write_operand(out, operand, 3, true)
        }
        ExpressionKind::BinaryOp { op, left, right } => {
            let prec = precedence(expression);
            write_operand(out, left, prec, false)?;
            write!(out, " {} ", op)?;
            write_operand(out, right, prec, true)
        }
    }
}

/// Write a binary operand, parenthesizing when its binding is too weak to
/// stand bare. Operators group left, so a right operand of equal
/// precedence also needs parentheses.
fn write_operand(
    out: &mut String,
    operand: &Expression<'_>,
    parent_precedence: u8,
    is_right: bool,
) -> fmt::Result {
    let own = precedence(operand);
    let needs_parens = own < parent_precedence || (is_right && own == parent_precedence);

    if needs_parens {
        out.write_str("(")?;
        write_expression(out, operand)?;
        out.write_str(")")
    } else {
        write_expression(out, operand)
    }
}

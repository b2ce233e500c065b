//! Top-level code generation: the compilation entry point and function
//! definitions.

use std::fmt::Write as _;

use crate::ast::{
    FunctionDefinition, Root, Signature, Statement, StatementKind, TopLevelItemKind,
};
use crate::codegen::abi::ArgumentPlacer;
use crate::codegen::asm::{
    IntReg, Operand, OperandWidth, emit_function_exit, emit_function_prologue, emit_label,
    emit_move,
};
use crate::codegen::error::CodeGenError;
use crate::codegen::state::{Compiler, analyze_type};
use crate::codegen::symbols::{FunctionParameter, FunctionSignature};

/// Resolve the written signature into a semantic one. The grammar has no
/// `...` parameter, so signatures are never variadic.
fn analyze_function_signature<'a>(signature: &Signature<'a>) -> FunctionSignature<'a> {
    FunctionSignature {
        return_type: analyze_type(&signature.return_type),
        parameters: signature
            .parameters
            .iter()
            .map(|parameter| FunctionParameter {
                name: parameter.name.map(|name| name.name),
                ty: analyze_type(&parameter.ty),
            })
            .collect(),
        is_variadic: false,
    }
}

impl<'a> Compiler<'a> {
    /// Compile a whole translation unit to assembly text:
    /// `global main`, then the `.data` and `.text` sections in source
    /// order.
    pub fn compile(mut self, root: &Root<'a>) -> Result<String, CodeGenError> {
        for item in root.items {
            match &item.kind {
                TopLevelItemKind::FunctionDefinition(function) => {
                    self.compile_function_definition(function)?;
                }
            }
        }

        let mut output = String::with_capacity(
            self.text.len() + self.data.len() + 64,
        );
        writeln!(output, "global main")?;
        writeln!(output, "section .data")?;
        output.push_str(&self.data);
        writeln!(output, "section .text")?;
        output.push_str(&self.text);

        Ok(output)
    }

    fn compile_function_definition(
        &mut self,
        function: &FunctionDefinition<'a>,
    ) -> Result<(), CodeGenError> {
        // register the definition; mismatched or duplicate definitions fail
        let signature = analyze_function_signature(&function.signature);
        let name = function.signature.name.name;
        self.functions
            .define(name, &signature, function.signature.span)?;

        self.init_function_context(signature.return_type.clone());

        // parameters live in the outermost scope of the body
        self.variables.push_scope();
        let result = self.compile_function_body(function, &signature);
        self.variables.pop_scope();
        result?;

        // the prologue is sized by the body's high-water mark, so it is
        // emitted after the body has been compiled into its own buffer
        emit_label(&mut self.text, name)?;
        emit_function_prologue(&mut self.text, self.stack_offset_max)?;
        let body = std::mem::take(&mut self.body);
        self.text.push_str(&body);

        Ok(())
    }

    fn compile_function_body(
        &mut self,
        function: &FunctionDefinition<'a>,
        signature: &FunctionSignature<'a>,
    ) -> Result<(), CodeGenError> {
        // move every named parameter from its argument location into a
        // local stack slot
        let mut placer = ArgumentPlacer::new();
        for (parameter, resolved) in function
            .signature
            .parameters
            .iter()
            .zip(&signature.parameters)
        {
            let location = placer.place(&resolved.ty);

            let Some(name) = parameter.name else {
                continue;
            };

            let variable =
                self.declare_variable(name.name, resolved.ty.clone(), parameter.span)?;
            let width = OperandWidth::of_type(&resolved.ty);
            emit_move(
                &mut self.body,
                Operand::stack(variable.stack_offset),
                location,
                width,
                width,
                IntReg::A,
            )?;
        }

        self.compile_block(&function.body)?;

        // fallback epilogue when the body does not end in a return
        let ends_with_return = matches!(
            function.body.statements.last(),
            Some(Statement {
                kind: StatementKind::Return(_),
                ..
            })
        );
        if !ends_with_return {
            emit_function_exit(&mut self.body)?;
        }

        Ok(())
    }
}

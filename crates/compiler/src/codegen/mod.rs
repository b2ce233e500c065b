//! Code generation: AST to x86-64 assembly text.
//!
//! A single pass over the AST emits NASM-syntax Intel assembly. There is
//! no separate semantic pass: symbol tables are built on the fly and type
//! checks happen at each node visit. The first semantic error aborts the
//! compilation.
//!
//! # Module structure
//!
//! - `state.rs`: the [`Compiler`] struct: output buffers, symbol tables,
//!   stack-frame bookkeeping
//! - `program.rs`: entry point and function definitions
//! - `statements.rs`: blocks and statements
//! - `expr.rs`: expressions and the fixed `rax`/`rbx` register scheme
//! - `asm.rs`: assembly model (instructions, registers, operands) and
//!   formatting
//! - `abi.rs`: System V AMD64 argument placement
//! - `symbols.rs`: variable scopes and the function table
//! - `error.rs`: error types

mod abi;
mod asm;
mod error;
mod expr;
mod program;
mod state;
mod statements;
mod symbols;

pub use abi::{ArgumentPlacer, INT_ARGUMENT_REGISTERS};
pub use asm::{Instruction, IntReg, Operand, OperandWidth};
pub use error::{CodeGenError, CompileError, CompileErrorKind};
pub use state::Compiler;
pub use symbols::{
    FunctionDescription, FunctionParameter, FunctionSignature, FunctionTable,
    VariableDescription, VariableTable,
};

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;

    fn compile_source(source: &str) -> Result<String, CodeGenError> {
        let arena = Bump::new();
        let tokens = crate::lexer::tokenize(source);
        let root = crate::parser::parse(tokens, &arena).expect("source should parse");
        Compiler::new().compile(&root)
    }

    fn compile_error_kind(source: &str) -> CompileErrorKind {
        match compile_source(source) {
            Err(CodeGenError::Compile(error)) => error.kind,
            other => panic!("expected a compile error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_output_section_layout() {
        let asm = compile_source("int main() { return 0; }").unwrap();
        assert!(asm.starts_with("global main\nsection .data\nsection .text\n"));
        assert!(asm.contains("main:\n"));
    }

    #[test]
    fn test_functions_are_emitted_in_source_order() {
        let asm = compile_source("int f() { return 1; } int main() { return 0; }").unwrap();
        let f_at = asm.find("f:\n").unwrap();
        let main_at = asm.find("main:\n").unwrap();
        assert!(f_at < main_at);
    }

    #[test]
    fn test_prologue_is_sized_and_aligned() {
        // three dword locals: stack offsets 4, 8, 12; frame rounded to 16
        let asm = compile_source("int main() { int a; int b; int c; return 0; }").unwrap();
        assert!(asm.contains("\tsub rsp, 16\n"), "asm was:\n{}", asm);

        // five dword locals: 20 bytes round up to 32
        let asm =
            compile_source("int main() { int a; int b; int c; int d; int e; return 0; }").unwrap();
        assert!(asm.contains("\tsub rsp, 32\n"), "asm was:\n{}", asm);
    }

    #[test]
    fn test_parameters_shadowable_in_body() {
        // parameters sit in the scope outside the body block, so a body
        // local of the same name shadows rather than collides
        let asm = compile_source("int f(int a) { int a = 2; return a; }").unwrap();
        assert!(asm.contains("\tmov dword [rbp-4], edi\n"), "asm was:\n{}", asm);
        assert!(asm.contains("\tmov dword [rbp-8], 2\n"), "asm was:\n{}", asm);
    }

    #[test]
    fn test_call_with_more_than_six_arguments_cleans_the_stack() {
        let asm = compile_source(
            "int f(int a, int b, int c, int d, int e, int g, int h, int i) { return a; }\n\
             int main() { return f(1, 2, 3, 4, 5, 6, 7, 8); }",
        )
        .unwrap();

        // two stack-passed arguments, pushed back to front
        let first_push = asm.find("\tpush rax\n").unwrap();
        let call_at = asm.rfind("\tcall f\n").unwrap();
        assert!(first_push < call_at);
        assert!(asm.contains("\tadd rsp, 16\n"), "asm was:\n{}", asm);

        // the callee finds them above the frame base
        assert!(asm.contains("[rbp+16]"), "asm was:\n{}", asm);
        assert!(asm.contains("[rbp+24]"), "asm was:\n{}", asm);
    }

    #[test]
    fn test_register_arguments_are_placed_in_reverse_order() {
        let asm = compile_source(
            "int f(int a, int b) { return a; } int main() { return f(10, 3); }",
        )
        .unwrap();

        let esi_at = asm.rfind("\tmov esi, 3\n").unwrap();
        let edi_at = asm.rfind("\tmov edi, 10\n").unwrap();
        assert!(esi_at < edi_at, "asm was:\n{}", asm);
    }

    #[test]
    fn test_undeclared_identifier() {
        assert!(matches!(
            compile_error_kind("int main() { return x; }"),
            CompileErrorKind::UndeclaredIdentifier { name } if name == "x"
        ));
    }

    #[test]
    fn test_undeclared_function() {
        assert!(matches!(
            compile_error_kind("int main() { return f(); }"),
            CompileErrorKind::UndeclaredIdentifier { name } if name == "f"
        ));
    }

    #[test]
    fn test_function_redefinition() {
        assert!(matches!(
            compile_error_kind("int f() { return 0; } int f() { return 1; } int main() {}"),
            CompileErrorKind::FunctionRedefinition { name } if name == "f"
        ));
    }

    #[test]
    fn test_function_signature_mismatch_on_redefinition() {
        assert!(matches!(
            compile_error_kind("int f() { return 0; } long f() { return 1; } int main() {}"),
            CompileErrorKind::FunctionSignatureMismatch { name } if name == "f"
        ));
    }

    #[test]
    fn test_expression_statement_value_is_discarded() {
        let asm = compile_source("int main() { int a = 1; a + 2; return a; }").unwrap();
        // the addition is still evaluated
        assert!(asm.contains("\tadd eax, ebx\n"), "asm was:\n{}", asm);
    }

    #[test]
    fn test_division_sign_extends_into_rdx() {
        let asm = compile_source("int main() { int a = 7; int b = 2; return a / b; }").unwrap();
        assert!(asm.contains("\tcdq\n\tidiv ebx\n"), "asm was:\n{}", asm);
    }

    #[test]
    fn test_assignment_expression_stores_to_the_slot() {
        let asm = compile_source("int main() { int a; a = 5; return a; }").unwrap();
        assert!(asm.contains("\tmov dword [rbp-4], 5\n"), "asm was:\n{}", asm);
    }
}

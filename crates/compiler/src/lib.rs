//! cc64 compiler library.
//!
//! Compiles a subset of C to x86-64 assembly in NASM syntax. The pipeline
//! is linear and synchronous: source bytes are tokenized, parsed into an
//! arena-allocated AST, then compiled to assembly text in a single pass.
//! [`compile_file`] additionally drives `nasm` and `ld` to turn the
//! assembly into an executable.
//!
//! The first error from any stage aborts the compilation and is returned
//! to the caller; there is no recovery or continue-after-error mode.

pub mod ast;
pub mod codegen;
pub mod lexer;
pub mod parser;
pub mod pretty;
pub mod types;

pub use codegen::{CodeGenError, CompileError, CompileErrorKind, Compiler};
pub use parser::ParseError;

use std::fmt;
use std::fs;
use std::path::Path;
use std::process::Command;

use bumpalo::Bump;
use tracing::debug;

/// Any error the compilation pipeline can surface.
#[derive(Debug)]
pub enum Error {
    Parse(ParseError),
    Compile(CompileError),
    Emit(fmt::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(error) => write!(f, "{}", error),
            Error::Compile(error) => write!(f, "{}", error),
            Error::Emit(error) => write!(f, "assembly emission error: {}", error),
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Self {
        Error::Parse(error)
    }
}

impl From<CodeGenError> for Error {
    fn from(error: CodeGenError) -> Self {
        match error {
            CodeGenError::Compile(error) => Error::Compile(error),
            CodeGenError::Format(error) => Error::Emit(error),
        }
    }
}

/// Compile C source text to assembly text.
pub fn compile_to_asm(source: &str) -> Result<String, Error> {
    debug!("lexical analysis");
    let tokens = lexer::tokenize(source);
    tracing::trace!(tokens = tokens.len(), "tokenized");

    debug!("syntax analysis");
    let arena = Bump::new();
    let root = parser::parse(tokens, &arena)?;
    if tracing::enabled!(tracing::Level::TRACE) {
        tracing::trace!(ast = %pretty::print_root(&root), "parsed program");
    }

    debug!("code generation");
    let asm = Compiler::new().compile(&root)?;

    Ok(asm)
}

/// Run the pipeline on a file and report diagnostics without writing any
/// output.
pub fn check_file(input: &Path) -> Result<(), String> {
    let source = fs::read_to_string(input)
        .map_err(|e| format!("failed to read {}: {}", input.display(), e))?;

    compile_to_asm(&source).map_err(|e| e.to_string())?;
    Ok(())
}

/// Compile a source file and write the assembly text to `output`.
pub fn emit_asm_file(input: &Path, output: &Path) -> Result<(), String> {
    let source = fs::read_to_string(input)
        .map_err(|e| format!("failed to read {}: {}", input.display(), e))?;

    let asm = compile_to_asm(&source).map_err(|e| e.to_string())?;

    fs::write(output, asm)
        .map_err(|e| format!("failed to write {}: {}", output.display(), e))?;
    Ok(())
}

/// Compile a source file to an executable: emit the `.asm`, assemble it
/// with `nasm`, link with `ld`. Intermediate files are removed unless
/// `keep_asm` is set.
pub fn compile_file(input: &Path, output: &Path, keep_asm: bool) -> Result<(), String> {
    let asm_path = output.with_extension("asm");
    let object_path = output.with_extension("o");

    emit_asm_file(input, &asm_path)?;

    debug!("assembling (nasm)");
    let nasm_output = Command::new("nasm")
        .arg("-f")
        .arg("elf64")
        .arg(&asm_path)
        .arg("-o")
        .arg(&object_path)
        .output()
        .map_err(|e| format!("failed to run nasm: {}", e))?;

    if !nasm_output.status.success() {
        let stderr = String::from_utf8_lossy(&nasm_output.stderr);
        return Err(format!("nasm failed:\n{}", stderr));
    }

    debug!("linking (ld)");
    let ld_output = Command::new("ld")
        .arg("-dynamic-linker")
        .arg("/lib64/ld-linux-x86-64.so.2")
        .arg("-o")
        .arg(output)
        .arg(&object_path)
        .arg("/usr/lib/crt1.o")
        .arg("/usr/lib/crti.o")
        .arg("/usr/lib/crtn.o")
        .arg("-lc")
        .arg("-L/lib64")
        .output()
        .map_err(|e| format!("failed to run ld: {}", e))?;

    if !ld_output.status.success() {
        let stderr = String::from_utf8_lossy(&ld_output.stderr);
        return Err(format!("ld failed:\n{}", stderr));
    }

    fs::remove_file(&object_path).ok();
    if !keep_asm {
        fs::remove_file(&asm_path).ok();
    }

    Ok(())
}

//! cc64 compiler CLI.
//!
//! Command-line interface for compiling C source files to executables via
//! NASM assembly, checking them for errors, or emitting the assembly
//! itself.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use std::io;
use std::path::{Path, PathBuf};
use std::process;

#[derive(ClapParser)]
#[command(name = "cc64")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile a subset of C to x86-64 executables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a C file to an executable
    Build {
        /// Input C source file
        input: PathBuf,

        /// Output executable path (defaults to input filename without extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep the intermediate assembly file (.asm)
        #[arg(long)]
        keep_asm: bool,
    },

    /// Check a C file for errors without producing output
    Check {
        /// Input C source file
        input: PathBuf,
    },

    /// Compile a C file to assembly text only
    EmitAsm {
        /// Input C source file
        input: PathBuf,

        /// Output assembly path (defaults to input filename with .asm)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            keep_asm,
        } => {
            let output = output.unwrap_or_else(|| default_output(&input));
            run_build(&input, &output, keep_asm);
        }
        Commands::Check { input } => {
            run_check(&input);
        }
        Commands::EmitAsm { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension("asm"));
            run_emit_asm(&input, &output);
        }
        Commands::Completions { shell } => {
            run_completions(shell);
        }
    }
}

/// Default executable path: the input filename without its extension.
fn default_output(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    PathBuf::from(stem)
}

fn run_build(input: &Path, output: &Path, keep_asm: bool) {
    if let Err(error) = cc64::compile_file(input, output, keep_asm) {
        eprintln!("error: {}", error);
        process::exit(1);
    }
}

fn run_check(input: &Path) {
    if let Err(error) = cc64::check_file(input) {
        eprintln!("error: {}", error);
        process::exit(1);
    }
}

fn run_emit_asm(input: &Path, output: &Path) {
    if let Err(error) = cc64::emit_asm_file(input, output) {
        eprintln!("error: {}", error);
        process::exit(1);
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "cc64", &mut io::stdout());
}

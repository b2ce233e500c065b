//! Assembly model and emitter.
//!
//! Pure formatting over a small model of x86-64: instructions with fixed
//! arities, the sixteen general-purpose integer registers, and operands
//! (immediate, label, register, memory, indexed memory). Output is
//! NASM-compatible Intel syntax written into a `String` sink through
//! `std::fmt::Write`.
//!
//! Operand width is not a property of an operand; it is supplied at each
//! emission, so the same stack slot can be read at different widths.

use std::fmt::{self, Write as _};

use crate::types::{IntegerSize, Type};

/// Round `value` up to the next multiple of `round`.
pub fn align_up(value: usize, round: usize) -> usize {
    value.div_ceil(round) * round
}

/// The sixteen general-purpose x86-64 integer registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntReg {
    A,
    B,
    C,
    D,
    Si,
    Di,
    Sp,
    Bp,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
}

impl IntReg {
    /// NASM register name at the given operand width.
    pub fn name(self, width: OperandWidth) -> &'static str {
        use IntReg::*;

        match width {
            OperandWidth::Byte => match self {
                A => "al",
                B => "bl",
                C => "cl",
                D => "dl",
                Si => "sil",
                Di => "dil",
                Sp => "spl",
                Bp => "bpl",
                R8 => "r8b",
                R9 => "r9b",
                R10 => "r10b",
                R11 => "r11b",
                R12 => "r12b",
                R13 => "r13b",
                R14 => "r14b",
                R15 => "r15b",
            },
            OperandWidth::Word => match self {
                A => "ax",
                B => "bx",
                C => "cx",
                D => "dx",
                Si => "si",
                Di => "di",
                Sp => "sp",
                Bp => "bp",
                R8 => "r8w",
                R9 => "r9w",
                R10 => "r10w",
                R11 => "r11w",
                R12 => "r12w",
                R13 => "r13w",
                R14 => "r14w",
                R15 => "r15w",
            },
            OperandWidth::DWord => match self {
                A => "eax",
                B => "ebx",
                C => "ecx",
                D => "edx",
                Si => "esi",
                Di => "edi",
                Sp => "esp",
                Bp => "ebp",
                R8 => "r8d",
                R9 => "r9d",
                R10 => "r10d",
                R11 => "r11d",
                R12 => "r12d",
                R13 => "r13d",
                R14 => "r14d",
                R15 => "r15d",
            },
            OperandWidth::QWord => match self {
                A => "rax",
                B => "rbx",
                C => "rcx",
                D => "rdx",
                Si => "rsi",
                Di => "rdi",
                Sp => "rsp",
                Bp => "rbp",
                R8 => "r8",
                R9 => "r9",
                R10 => "r10",
                R11 => "r11",
                R12 => "r12",
                R13 => "r13",
                R14 => "r14",
                R15 => "r15",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OperandWidth {
    Byte,
    Word,
    DWord,
    QWord,
}

impl OperandWidth {
    pub fn name(self) -> &'static str {
        match self {
            OperandWidth::Byte => "byte",
            OperandWidth::Word => "word",
            OperandWidth::DWord => "dword",
            OperandWidth::QWord => "qword",
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            OperandWidth::Byte => 1,
            OperandWidth::Word => 2,
            OperandWidth::DWord => 4,
            OperandWidth::QWord => 8,
        }
    }

    pub fn of_integer_size(size: IntegerSize) -> Self {
        match size {
            IntegerSize::S8 => OperandWidth::Byte,
            IntegerSize::S16 => OperandWidth::Word,
            IntegerSize::S32 => OperandWidth::DWord,
            IntegerSize::S64 => OperandWidth::QWord,
        }
    }

    /// Width of an integer-typed value. Panics on non-integer types; the
    /// callers have already type-checked.
    pub fn of_type(ty: &Type) -> Self {
        match ty {
            Type::Integer { size, .. } => OperandWidth::of_integer_size(*size),
            _ => panic!("operand width of non-integer type: {}", ty),
        }
    }
}

/// An instruction operand. Width is supplied separately at emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand<'a> {
    Immediate(u64),
    Label(&'a str),
    Register(IntReg),
    Memory {
        base: IntReg,
        displacement: i64,
    },
    MemoryIndexed {
        base: IntReg,
        index: IntReg,
        displacement: i64,
        scale: i64,
    },
}

impl<'a> Operand<'a> {
    /// The stack slot `stack_offset` bytes below the frame base pointer.
    pub fn stack(stack_offset: usize) -> Self {
        Operand::Memory {
            base: IntReg::Bp,
            displacement: -(stack_offset as i64),
        }
    }

    pub fn is_register(&self) -> bool {
        matches!(self, Operand::Register(_))
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Operand::Memory { .. } | Operand::MemoryIndexed { .. })
    }

    /// The same operand displaced by `amount_bytes`. Only memory operands
    /// change; other kinds are returned untouched.
    pub fn displace(self, amount_bytes: i64) -> Self {
        match self {
            Operand::Memory { base, displacement } => Operand::Memory {
                base,
                displacement: displacement + amount_bytes,
            },
            Operand::MemoryIndexed {
                base,
                index,
                displacement,
                scale,
            } => Operand::MemoryIndexed {
                base,
                index,
                displacement: displacement + amount_bytes,
                scale,
            },
            other => other,
        }
    }

    fn write(self, out: &mut String, width: OperandWidth) -> fmt::Result {
        match self {
            Operand::Immediate(value) => write!(out, "{}", value),
            Operand::Label(name) => out.write_str(name),
            Operand::Register(reg) => out.write_str(reg.name(width)),
            Operand::Memory { base, displacement } => {
                write!(
                    out,
                    "{} [{}{:+}]",
                    width.name(),
                    base.name(OperandWidth::QWord),
                    displacement
                )
            }
            Operand::MemoryIndexed {
                base,
                index,
                displacement,
                scale,
            } => {
                write!(
                    out,
                    "{} [{}+{}*{}{:+}]",
                    width.name(),
                    base.name(OperandWidth::QWord),
                    index.name(OperandWidth::QWord),
                    scale,
                    displacement
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // 0 operands
    Leave,
    Ret,
    Cdq,
    Cdqe,
    // 1 operand
    Push,
    Pop,
    Call,
    IDiv,
    // 2 operands
    Mov,
    MovSx,
    MovZx,
    Add,
    Sub,
    IMul,
}

impl Instruction {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Instruction::Leave => "leave",
            Instruction::Ret => "ret",
            Instruction::Cdq => "cdq",
            Instruction::Cdqe => "cdqe",
            Instruction::Push => "push",
            Instruction::Pop => "pop",
            Instruction::Call => "call",
            Instruction::IDiv => "idiv",
            Instruction::Mov => "mov",
            Instruction::MovSx => "movsx",
            Instruction::MovZx => "movzx",
            Instruction::Add => "add",
            Instruction::Sub => "sub",
            Instruction::IMul => "imul",
        }
    }

    pub fn operand_count(self) -> usize {
        match self {
            Instruction::Leave | Instruction::Ret | Instruction::Cdq | Instruction::Cdqe => 0,
            Instruction::Push | Instruction::Pop | Instruction::Call | Instruction::IDiv => 1,
            Instruction::Mov
            | Instruction::MovSx
            | Instruction::MovZx
            | Instruction::Add
            | Instruction::Sub
            | Instruction::IMul => 2,
        }
    }
}

/// Emit a 0-operand instruction.
pub fn emit_instruction(out: &mut String, instruction: Instruction) -> fmt::Result {
    assert_eq!(
        instruction.operand_count(),
        0,
        "instruction {} takes {} operands",
        instruction.mnemonic(),
        instruction.operand_count()
    );

    writeln!(out, "\t{}", instruction.mnemonic())
}

/// Emit a 1-operand instruction.
pub fn emit_instruction_single(
    out: &mut String,
    instruction: Instruction,
    width: OperandWidth,
    operand: Operand<'_>,
) -> fmt::Result {
    assert_eq!(
        instruction.operand_count(),
        1,
        "instruction {} takes {} operands",
        instruction.mnemonic(),
        instruction.operand_count()
    );

    write!(out, "\t{} ", instruction.mnemonic())?;
    operand.write(out, width)?;
    out.write_char('\n')
}

/// Emit a 2-operand instruction. The destination and source widths are
/// independent so extension instructions can mix them.
pub fn emit_instruction_dst_src(
    out: &mut String,
    instruction: Instruction,
    dst_width: OperandWidth,
    src_width: OperandWidth,
    dst: Operand<'_>,
    src: Operand<'_>,
) -> fmt::Result {
    assert_eq!(
        instruction.operand_count(),
        2,
        "instruction {} takes {} operands",
        instruction.mnemonic(),
        instruction.operand_count()
    );

    write!(out, "\t{} ", instruction.mnemonic())?;
    dst.write(out, dst_width)?;
    out.write_str(", ")?;
    src.write(out, src_width)?;
    out.write_char('\n')
}

pub fn emit_label(out: &mut String, label: &str) -> fmt::Result {
    writeln!(out, "{}:", label)
}

/// `push rbp; mov rbp, rsp; sub rsp, N` with `N` the stack usage rounded
/// up to a 16-byte boundary. The subtract is omitted for an empty frame.
pub fn emit_function_prologue(out: &mut String, stack_usage: usize) -> fmt::Result {
    emit_instruction_single(
        out,
        Instruction::Push,
        OperandWidth::QWord,
        Operand::Register(IntReg::Bp),
    )?;
    emit_instruction_dst_src(
        out,
        Instruction::Mov,
        OperandWidth::QWord,
        OperandWidth::QWord,
        Operand::Register(IntReg::Bp),
        Operand::Register(IntReg::Sp),
    )?;

    if stack_usage > 0 {
        emit_instruction_dst_src(
            out,
            Instruction::Sub,
            OperandWidth::QWord,
            OperandWidth::QWord,
            Operand::Register(IntReg::Sp),
            Operand::Immediate(align_up(stack_usage, 16) as u64),
        )?;
    }

    Ok(())
}

/// `leave; ret`.
pub fn emit_function_exit(out: &mut String) -> fmt::Result {
    emit_instruction(out, Instruction::Leave)?;
    emit_instruction(out, Instruction::Ret)
}

/// Emit the `mov`s needed to move `src` into `dst` (0-2 instructions).
///
/// Nothing is emitted when the operands denote the same location. A move
/// between two memory operands is routed through `scratch`; a `mov` with
/// both operands in memory is never emitted.
pub fn emit_move(
    out: &mut String,
    dst: Operand<'_>,
    src: Operand<'_>,
    dst_width: OperandWidth,
    src_width: OperandWidth,
    scratch: IntReg,
) -> fmt::Result {
    assert!(
        !matches!(dst, Operand::Immediate(_) | Operand::Label(_)),
        "emit_move: destination cannot be an immediate or label"
    );

    if src == dst {
        // nothing to do
        Ok(())
    } else if dst.is_register() || src.is_register() || matches!(src, Operand::Immediate(_)) {
        emit_instruction_dst_src(out, Instruction::Mov, dst_width, src_width, dst, src)
    } else {
        let scratch = Operand::Register(scratch);
        emit_instruction_dst_src(out, Instruction::Mov, src_width, src_width, scratch, src)?;
        emit_instruction_dst_src(out, Instruction::Mov, dst_width, dst_width, dst, scratch)
    }
}

/// Copy `size_bytes` bytes from `src` to `dst`, walking both operands in
/// qword/dword/word/byte steps. Destinations larger than 8 bytes must be
/// memory operands.
pub fn emit_move_bytes(
    out: &mut String,
    dst: Operand<'_>,
    src: Operand<'_>,
    size_bytes: usize,
    scratch: IntReg,
) -> fmt::Result {
    assert!(
        size_bytes <= 8 || !dst.is_register(),
        "emit_move_bytes: register destination larger than 8 bytes"
    );

    let mut offset = 0usize;
    while offset < size_bytes {
        let remaining = size_bytes - offset;
        let width = if remaining >= 8 {
            OperandWidth::QWord
        } else if remaining >= 4 {
            OperandWidth::DWord
        } else if remaining >= 2 {
            OperandWidth::Word
        } else {
            OperandWidth::Byte
        };

        emit_move(
            out,
            dst.displace(offset as i64),
            src.displace(offset as i64),
            width,
            width,
            scratch,
        )?;

        offset += width.bytes();
    }

    Ok(())
}

/// Move `src` into `dst` with integer conversions.
///
/// Equal types copy bytes. For integer pairs:
/// - a source at least as wide as the destination is stored with a plain
///   move at the destination width (upper bits discarded);
/// - signed 32 to signed 64 routes through `rax` with `cdqe`;
/// - otherwise a `movsx`/`movzx` extension, done in `rax` first when the
///   destination is not a register. Zero-extending a 32-bit value uses a
///   plain dword move (the CPU clears the upper half).
pub fn emit_assignment(
    out: &mut String,
    dst: Operand<'_>,
    src: Operand<'_>,
    dst_type: &Type,
    src_type: &Type,
) -> fmt::Result {
    if dst_type == src_type {
        return emit_move_bytes(out, dst, src, dst_type.size_bytes(), IntReg::A);
    }

    let (
        Type::Integer {
            size: dst_size,
            is_signed: dst_signed,
        },
        Type::Integer {
            size: src_size,
            is_signed: src_signed,
        },
    ) = (dst_type, src_type)
    else {
        panic!(
            "emit_assignment: unsupported conversion from {} to {}",
            src_type, dst_type
        );
    };

    let dst_width = OperandWidth::of_integer_size(*dst_size);
    let src_width = OperandWidth::of_integer_size(*src_size);

    if src_size >= dst_size {
        // truncating store: upper bits are discarded by the narrower write
        return emit_move(out, dst, src, dst_width, dst_width, IntReg::A);
    }

    if *dst_size == IntegerSize::S64 && *dst_signed && *src_size == IntegerSize::S32 && *src_signed
    {
        // sign-extend eax into rax
        let rax = Operand::Register(IntReg::A);
        emit_move(out, rax, src, src_width, src_width, IntReg::A)?;
        emit_instruction(out, Instruction::Cdqe)?;
        return emit_move(out, dst, rax, dst_width, dst_width, IntReg::A);
    }

    let emit_extension =
        |out: &mut String, target: Operand<'_>| -> fmt::Result {
            if !*src_signed && *src_size == IntegerSize::S32 {
                // 32-bit source: a plain dword move zero-extends
                emit_instruction_dst_src(
                    out,
                    Instruction::Mov,
                    OperandWidth::DWord,
                    OperandWidth::DWord,
                    target,
                    src,
                )
            } else if *src_signed {
                emit_instruction_dst_src(out, Instruction::MovSx, dst_width, src_width, target, src)
            } else {
                emit_instruction_dst_src(out, Instruction::MovZx, dst_width, src_width, target, src)
            }
        };

    if dst.is_register() {
        emit_extension(out, dst)
    } else {
        // extend into rax, then store
        let rax = Operand::Register(IntReg::A);
        emit_extension(out, rax)?;
        emit_move(out, dst, rax, dst_width, dst_width, IntReg::A)
    }
}

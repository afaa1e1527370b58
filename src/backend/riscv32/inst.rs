use core::fmt;

use super::regs::{self, EPILOGUE_SUFFIX};
use crate::{
    backend::regs::{PReg, Reg},
    tac::{BinaryOp, CondBrOp, InstrKind, Label, Temp, UnaryOp},
};

/// One RV32 instruction template.
///
/// Operands are [`Reg`]s: virtual before register allocation, physical
/// afterwards. `Param` and `Alloc` are pseudo instructions consumed entirely
/// by the allocator and never reach the final stream.
#[derive(Debug, Clone)]
pub enum RvInst {
    Label { label: Label },
    Li { rd: Reg, imm: i32 },
    Mv { rd: Reg, rs: Reg },
    Unary { op: UnaryOp, rd: Reg, rs: Reg },
    Binary { op: BinaryOp, rd: Reg, rs1: Reg, rs2: Reg },
    Br { op: CondBrOp, rs: Reg, target: Label },
    J { target: Label },
    /// Jump to the shared epilogue of `func`; the target has no native
    /// return inside a frame.
    JEpilogue { func: Label },
    Call { callee: Label },
    /// Outgoing-argument pseudo instruction.
    Param { value: Reg },
    /// Stack-array pseudo instruction: reserve `size` bytes, set `rd` to the
    /// base address.
    Alloc { rd: Reg, size: u32 },
    Lw { rd: Reg, base: PReg, offset: i32 },
    Sw { rs: Reg, base: PReg, offset: i32 },
    /// `addi sp, sp, imm`.
    SpAdd { imm: i32 },
    Addi { rd: PReg, rs: PReg, imm: i32 },
    Ret,
}

impl RvInst {
    pub fn kind(&self) -> InstrKind {
        match self {
            RvInst::Label { .. } => InstrKind::Label,
            RvInst::Li { .. }
            | RvInst::Mv { .. }
            | RvInst::Unary { .. }
            | RvInst::Binary { .. }
            | RvInst::Lw { .. }
            | RvInst::Sw { .. }
            | RvInst::SpAdd { .. }
            | RvInst::Addi { .. } => InstrKind::Seq,
            RvInst::Br { .. } => InstrKind::CondJump,
            RvInst::J { .. } => InstrKind::Jump,
            RvInst::JEpilogue { .. } | RvInst::Ret => InstrKind::Ret,
            RvInst::Call { .. } => InstrKind::Call,
            RvInst::Param { .. } => InstrKind::Param,
            RvInst::Alloc { .. } => InstrKind::Alloc,
        }
    }

    /// Whether this instruction transfers control away from the block.
    pub fn is_control_transfer(&self) -> bool {
        matches!(
            self.kind(),
            InstrKind::Jump | InstrKind::CondJump | InstrKind::Ret
        )
    }

    /// Ordered source operands.
    pub fn srcs(&self) -> Vec<Reg> {
        match self {
            RvInst::Mv { rs, .. } | RvInst::Unary { rs, .. } => vec![*rs],
            RvInst::Binary { rs1, rs2, .. } => vec![*rs1, *rs2],
            RvInst::Br { rs, .. } => vec![*rs],
            RvInst::Param { value } => vec![*value],
            RvInst::Sw { rs, .. } => vec![*rs],
            RvInst::Label { .. }
            | RvInst::Li { .. }
            | RvInst::J { .. }
            | RvInst::JEpilogue { .. }
            | RvInst::Call { .. }
            | RvInst::Alloc { .. }
            | RvInst::Lw { .. }
            | RvInst::SpAdd { .. }
            | RvInst::Addi { .. }
            | RvInst::Ret => vec![],
        }
    }

    /// Ordered destination operands.
    pub fn dsts(&self) -> Vec<Reg> {
        match self {
            RvInst::Li { rd, .. }
            | RvInst::Mv { rd, .. }
            | RvInst::Unary { rd, .. }
            | RvInst::Binary { rd, .. }
            | RvInst::Alloc { rd, .. }
            | RvInst::Lw { rd, .. } => vec![*rd],
            RvInst::Label { .. }
            | RvInst::Br { .. }
            | RvInst::J { .. }
            | RvInst::JEpilogue { .. }
            | RvInst::Call { .. }
            | RvInst::Param { .. }
            | RvInst::Sw { .. }
            | RvInst::SpAdd { .. }
            | RvInst::Addi { .. }
            | RvInst::Ret => vec![],
        }
    }

    /// Temps read by this instruction.
    pub fn uses(&self) -> Vec<Temp> {
        self.srcs().iter().filter_map(Reg::as_temp).collect()
    }

    /// Temps written by this instruction.
    pub fn defs(&self) -> Vec<Temp> {
        self.dsts().iter().filter_map(Reg::as_temp).collect()
    }

    /// Rebuild the instruction with allocated registers substituted for its
    /// operands, positionally matching [`RvInst::dsts`] and [`RvInst::srcs`].
    pub fn with_operands(&self, dsts: &[PReg], srcs: &[PReg]) -> RvInst {
        match self {
            RvInst::Li { imm, .. } => RvInst::Li {
                rd: dsts[0].into(),
                imm: *imm,
            },
            RvInst::Mv { .. } => RvInst::Mv {
                rd: dsts[0].into(),
                rs: srcs[0].into(),
            },
            RvInst::Unary { op, .. } => RvInst::Unary {
                op: *op,
                rd: dsts[0].into(),
                rs: srcs[0].into(),
            },
            RvInst::Binary { op, .. } => RvInst::Binary {
                op: *op,
                rd: dsts[0].into(),
                rs1: srcs[0].into(),
                rs2: srcs[1].into(),
            },
            RvInst::Br { op, target, .. } => RvInst::Br {
                op: *op,
                rs: srcs[0].into(),
                target: target.clone(),
            },
            RvInst::Label { .. }
            | RvInst::J { .. }
            | RvInst::JEpilogue { .. }
            | RvInst::Call { .. }
            | RvInst::Param { .. }
            | RvInst::Alloc { .. }
            | RvInst::Lw { .. }
            | RvInst::Sw { .. }
            | RvInst::SpAdd { .. }
            | RvInst::Addi { .. }
            | RvInst::Ret => self.clone(),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "neg"),
            UnaryOp::Not => write!(f, "not"),
            UnaryOp::Seqz => write!(f, "seqz"),
            UnaryOp::Snez => write!(f, "snez"),
            UnaryOp::Sltz => write!(f, "sltz"),
            UnaryOp::Sgtz => write!(f, "sgtz"),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "add"),
            BinaryOp::Sub => write!(f, "sub"),
            BinaryOp::Mul => write!(f, "mul"),
            BinaryOp::Div => write!(f, "div"),
            BinaryOp::Rem => write!(f, "rem"),
            BinaryOp::Slt => write!(f, "slt"),
            BinaryOp::Sgt => write!(f, "sgt"),
            BinaryOp::And => write!(f, "and"),
            BinaryOp::Or => write!(f, "or"),
            BinaryOp::Equ | BinaryOp::Neq | BinaryOp::Leq | BinaryOp::Geq => {
                unreachable!("comparison should be legalized during instruction selection")
            }
        }
    }
}

impl fmt::Display for CondBrOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CondBrOp::Beqz => write!(f, "beqz"),
            CondBrOp::Bnez => write!(f, "bnez"),
        }
    }
}

impl fmt::Display for RvInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RvInst::Label { label } => write!(f, "{}:", label),
            RvInst::Li { rd, imm } => write!(f, "li {}, {}", rd, imm),
            RvInst::Mv { rd, rs } => write!(f, "mv {}, {}", rd, rs),
            RvInst::Unary { op, rd, rs } => write!(f, "{} {}, {}", op, rd, rs),
            RvInst::Binary { op, rd, rs1, rs2 } => {
                write!(f, "{} {}, {}, {}", op, rd, rs1, rs2)
            }
            RvInst::Br { op, rs, target } => write!(f, "{} {}, {}", op, rs, target),
            RvInst::J { target } => write!(f, "j {}", target),
            RvInst::JEpilogue { func } => write!(f, "j {}{}", func, EPILOGUE_SUFFIX),
            RvInst::Call { callee } => write!(f, "call {}", callee),
            RvInst::Lw { rd, base, offset } => {
                write!(f, "lw {}, {}({})", rd, offset, regs::display_preg(*base))
            }
            RvInst::Sw { rs, base, offset } => {
                write!(f, "sw {}, {}({})", rs, offset, regs::display_preg(*base))
            }
            RvInst::SpAdd { imm } => write!(f, "addi sp, sp, {}", imm),
            RvInst::Addi { rd, rs, imm } => {
                write!(
                    f,
                    "addi {}, {}, {}",
                    regs::display_preg(*rd),
                    regs::display_preg(*rs),
                    imm
                )
            }
            RvInst::Ret => write!(f, "ret"),
            RvInst::Param { .. } | RvInst::Alloc { .. } => {
                unreachable!("pseudo instruction should be consumed by the register allocator")
            }
        }
    }
}

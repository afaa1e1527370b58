//! # Three-Address Code
//!
//! The instruction set consumed by the backend. TAC is produced by an
//! external front end; this module only defines the data model: virtual
//! registers ([`Temp`]), labels, operators and the per-function instruction
//! sequence ([`TacFunc`]).

use core::fmt;
use std::hash::Hash;

/// A virtual register.
///
/// Temps are numbered densely within a function. By convention the incoming
/// arguments of a function occupy temps `0..num_args`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Temp(u32);

impl Temp {
    pub const fn new(index: u32) -> Self { Self(index) }

    pub const fn index(self) -> u32 { self.0 }
}

impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "$t{}", self.0) }
}

/// An assembly-level label.
#[derive(Debug, Clone)]
pub struct Label(String);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool { self.0 == other.0 }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) { self.0.hash(state) }
}

impl<T> From<T> for Label
where
    T: AsRef<str>,
{
    fn from(value: T) -> Self { Self(value.as_ref().to_string()) }
}

/// The coarse kind of an instruction, used by block partitioning and by the
/// register allocator's dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrKind {
    /// A label definition.
    Label,
    /// A sequential instruction (move, load-immediate, unary, binary, ...).
    Seq,
    /// An unconditional jump.
    Jump,
    /// A conditional jump.
    CondJump,
    /// A return (or a jump to the function epilogue).
    Ret,
    /// A function call.
    Call,
    /// An outgoing-argument pseudo instruction.
    Param,
    /// A stack array allocation.
    Alloc,
}

/// Unary operators.
///
/// The comparison tests (`Seqz` and friends) are shared with the machine
/// level: instruction selection synthesizes comparisons from them since the
/// target has no condition codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
    /// Set if equal to zero.
    Seqz,
    /// Set if not equal to zero.
    Snez,
    /// Set if less than zero.
    Sltz,
    /// Set if greater than zero.
    Sgtz,
}

/// Binary operators.
///
/// The composite comparisons (`Equ`, `Neq`, `Leq`, `Geq`) and the boolean
/// `And`/`Or` only exist at the TAC level; instruction selection legalizes
/// them into subtract-and-test sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Slt,
    Sgt,
    Leq,
    Geq,
    Equ,
    Neq,
    And,
    Or,
}

/// Conditional branch operators: branch on the condition temp being zero or
/// nonzero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CondBrOp {
    Beqz,
    Bnez,
}

/// One TAC instruction.
#[derive(Debug, Clone)]
pub enum TacInst {
    /// Defines `label` at this point of the sequence.
    Mark { label: Label },
    Assign { dst: Temp, src: Temp },
    LoadImm { dst: Temp, value: i32 },
    Unary { op: UnaryOp, dst: Temp, operand: Temp },
    Binary { op: BinaryOp, dst: Temp, lhs: Temp, rhs: Temp },
    CondBranch { op: CondBrOp, cond: Temp, target: Label },
    Branch { target: Label },
    Return { value: Option<Temp> },
    /// Call `callee`; the return value lands in `dst`.
    Call { dst: Temp, callee: Label },
    /// Pass `value` as the next outgoing argument of the pending call.
    Param { value: Temp },
    /// Reserve `size` bytes of stack and set `dst` to the base address.
    Alloc { dst: Temp, size: u32 },
}

impl TacInst {
    pub fn kind(&self) -> InstrKind {
        match self {
            TacInst::Mark { .. } => InstrKind::Label,
            TacInst::Assign { .. }
            | TacInst::LoadImm { .. }
            | TacInst::Unary { .. }
            | TacInst::Binary { .. } => InstrKind::Seq,
            TacInst::CondBranch { .. } => InstrKind::CondJump,
            TacInst::Branch { .. } => InstrKind::Jump,
            TacInst::Return { .. } => InstrKind::Ret,
            TacInst::Call { .. } => InstrKind::Call,
            TacInst::Param { .. } => InstrKind::Param,
            TacInst::Alloc { .. } => InstrKind::Alloc,
        }
    }
}

/// A TAC function: an entry label, the declared argument count, and the
/// instruction sequence.
#[derive(Debug, Clone)]
pub struct TacFunc {
    label: Label,
    num_args: usize,
    insts: Vec<TacInst>,
}

impl TacFunc {
    pub fn new(label: impl Into<Label>, num_args: usize) -> Self {
        Self {
            label: label.into(),
            num_args,
            insts: Vec::new(),
        }
    }

    pub fn label(&self) -> &Label { &self.label }

    pub fn num_args(&self) -> usize { self.num_args }

    pub fn insts(&self) -> &[TacInst] { &self.insts }

    pub fn push(&mut self, inst: TacInst) { self.insts.push(inst); }
}

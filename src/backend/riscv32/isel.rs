//! Instruction selection.
//!
//! Lowers each TAC instruction into one or more RV32 templates with operand
//! identities preserved; register assignment happens later in the allocator.
//! The target has no condition-code register, so composite comparisons and
//! boolean connectives are synthesized from subtraction and the sign tests.

use super::{
    inst::RvInst,
    regs::{self, RET_REG},
};
use crate::{
    backend::regs::Reg,
    tac::{BinaryOp, Label, TacFunc, TacInst, Temp, UnaryOp},
};

pub struct InstrSelector {
    func_label: Label,
    seq: Vec<RvInst>,
}

impl InstrSelector {
    pub fn new(func_label: Label) -> Self {
        Self {
            func_label,
            seq: Vec::new(),
        }
    }

    /// Lower the whole instruction sequence of `func`.
    pub fn select_func(func: &TacFunc) -> Vec<RvInst> {
        let mut selector = Self::new(func.label().clone());
        for inst in func.insts() {
            selector.select(inst);
        }
        selector.finish()
    }

    pub fn finish(self) -> Vec<RvInst> { self.seq }

    pub fn select(&mut self, inst: &TacInst) {
        match inst {
            TacInst::Mark { label } => self.seq.push(RvInst::Label {
                label: label.clone(),
            }),
            TacInst::Assign { dst, src } => self.seq.push(RvInst::Mv {
                rd: (*dst).into(),
                rs: (*src).into(),
            }),
            TacInst::LoadImm { dst, value } => self.seq.push(RvInst::Li {
                rd: (*dst).into(),
                imm: *value,
            }),
            TacInst::Unary { op, dst, operand } => self.seq.push(RvInst::Unary {
                op: *op,
                rd: (*dst).into(),
                rs: (*operand).into(),
            }),
            TacInst::Binary { op, dst, lhs, rhs } => self.select_binary(*op, *dst, *lhs, *rhs),
            TacInst::CondBranch { op, cond, target } => self.seq.push(RvInst::Br {
                op: *op,
                rs: (*cond).into(),
                target: target.clone(),
            }),
            TacInst::Branch { target } => self.seq.push(RvInst::J {
                target: target.clone(),
            }),
            TacInst::Return { value } => {
                match value {
                    Some(value) => self.seq.push(RvInst::Mv {
                        rd: RET_REG.into(),
                        rs: (*value).into(),
                    }),
                    None => self.seq.push(RvInst::Li {
                        rd: RET_REG.into(),
                        imm: 0,
                    }),
                }
                // no native return inside the frame, jump to the shared
                // epilogue instead
                self.seq.push(RvInst::JEpilogue {
                    func: self.func_label.clone(),
                });
            }
            TacInst::Call { dst, callee } => {
                self.seq.push(RvInst::Call {
                    callee: callee.clone(),
                });
                self.seq.push(RvInst::Mv {
                    rd: (*dst).into(),
                    rs: RET_REG.into(),
                });
            }
            TacInst::Param { value } => self.seq.push(RvInst::Param {
                value: (*value).into(),
            }),
            TacInst::Alloc { dst, size } => self.seq.push(RvInst::Alloc {
                rd: (*dst).into(),
                size: *size,
            }),
        }
    }

    fn select_binary(&mut self, op: BinaryOp, dst: Temp, lhs: Temp, rhs: Temp) {
        let dst: Reg = dst.into();
        let lhs: Reg = lhs.into();
        let rhs: Reg = rhs.into();
        match op {
            BinaryOp::Equ => {
                self.push_binary(BinaryOp::Sub, dst, lhs, rhs);
                self.push_unary(UnaryOp::Seqz, dst, dst);
            }
            BinaryOp::Neq => {
                self.push_binary(BinaryOp::Sub, dst, lhs, rhs);
                self.push_unary(UnaryOp::Snez, dst, dst);
            }
            BinaryOp::Leq => {
                self.push_binary(BinaryOp::Sub, dst, lhs, rhs);
                self.push_unary(UnaryOp::Sgtz, dst, dst);
                self.push_unary(UnaryOp::Seqz, dst, dst);
            }
            BinaryOp::Geq => {
                self.push_binary(BinaryOp::Sub, dst, lhs, rhs);
                self.push_unary(UnaryOp::Sltz, dst, dst);
                self.push_unary(UnaryOp::Seqz, dst, dst);
            }
            BinaryOp::Or => {
                self.push_binary(BinaryOp::Or, dst, lhs, rhs);
                self.push_unary(UnaryOp::Snez, dst, dst);
            }
            BinaryOp::And => {
                // normalize lhs to 0/-1, mask rhs, then re-normalize
                self.push_unary(UnaryOp::Snez, dst, lhs);
                self.push_binary(BinaryOp::Sub, dst, regs::zero().into(), dst);
                self.push_binary(BinaryOp::And, dst, dst, rhs);
                self.push_unary(UnaryOp::Snez, dst, dst);
            }
            BinaryOp::Add
            | BinaryOp::Sub
            | BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Rem
            | BinaryOp::Slt
            | BinaryOp::Sgt => self.push_binary(op, dst, lhs, rhs),
        }
    }

    fn push_unary(&mut self, op: UnaryOp, rd: Reg, rs: Reg) {
        self.seq.push(RvInst::Unary { op, rd, rs });
    }

    fn push_binary(&mut self, op: BinaryOp, rd: Reg, rs1: Reg, rs2: Reg) {
        self.seq.push(RvInst::Binary { op, rd, rs1, rs2 });
    }
}

//! # Backend
//!
//! Lowers three-address code to RV32 assembly, one function at a time:
//! instruction selection, block partitioning, CFG construction and
//! reachability, liveness, brute-force local register allocation with
//! spilling and the calling convention, and finally frame layout with
//! prologue/epilogue emission.

pub mod block;
pub mod cfg;
pub mod emit;
pub mod liveness;
pub mod regalloc;
pub mod regs;
pub mod riscv32;

use thiserror::Error;

pub use regs::{PReg, Reg};

use crate::tac::{Label, TacFunc, Temp};

/// Fatal internal-consistency violations. None of these are user
/// diagnostics and none are recoverable; compilation of the current
/// function is aborted.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// A reload targeted a temp whose spill slot was never written.
    #[error("reload of {0}, which was never stored to a spill slot")]
    UnspilledReload(Temp),

    /// A branch targets a label that is not defined in the function.
    #[error("branch target `{0}` is not defined in this function")]
    UnknownLabel(Label),

    /// The finished frame does not fit the addressable immediate range.
    #[error("stack frame of {0} bytes exceeds the addressable immediate range")]
    FrameTooLarge(i32),

    #[error(transparent)]
    Cfg(#[from] cfg::CfgError),
}

/// Generate assembly for a whole program with the default deterministic
/// spill policy.
pub fn codegen(program: &[TacFunc]) -> Result<String, CodegenError> {
    let mut policy = regalloc::RoundRobin::default();
    codegen_with_policy(program, &mut policy)
}

/// Generate assembly for a whole program, choosing spill victims with
/// `policy`.
pub fn codegen_with_policy(
    program: &[TacFunc],
    policy: &mut dyn regalloc::SpillPolicy,
) -> Result<String, CodegenError> {
    use regalloc::RegAlloc;

    let mut emitter = emit::RiscvAsmEmitter::new();
    for func in program {
        let (insts, info) = emitter.select_instrs(func);
        let (blocks, edges) = block::partition(insts)?;
        let mut cfg = cfg::Cfg::new(blocks, &edges)?;
        liveness::analyze(&mut cfg);

        let mut sub = emitter.emit_subroutine(info);
        let mut alloc = regalloc::BruteRegAlloc::new(&mut *policy);
        alloc.accept(&cfg, &mut sub, func.num_args())?;
    }
    Ok(emitter.finish())
}

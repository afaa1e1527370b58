//! Assembly emission.
//!
//! [`RiscvAsmEmitter`] owns the output text for a whole program.
//! [`SubroutineEmitter`] buffers the allocator's instruction stream for one
//! function and owns the spill-slot table; the frame size is only known once
//! allocation is done, so the prologue and epilogue are synthesized last, in
//! [`SubroutineEmitter::emit_end`].
//!
//! Frame layout, low to high offset from the post-prologue stack pointer:
//! the callee-saved save area (one word per callee-saved register, used or
//! not), the RA slot, the FP slot, then one spill slot per spilled temp,
//! allocated on first store. After the prologue `fp = sp + frame_size`, so
//! the frame pointer points just past the frame.

use rustc_hash::{FxHashMap, FxHashSet};

use super::{
    regs::PReg,
    riscv32::{
        imm::Imm12,
        inst::RvInst,
        isel::InstrSelector,
        regs::{fp, ra, sp, t0, CALLEE_SAVED_REGS, EPILOGUE_SUFFIX, WORD_SIZE},
    },
    CodegenError,
};
use crate::tac::{InstrKind, Label, TacFunc, Temp};

/// Per-function metadata handed from instruction selection to the emitter.
#[derive(Debug, Clone)]
pub struct SubroutineInfo {
    pub func_label: Label,
    pub num_args: usize,
}

/// The program-level emitter: selects instructions and collects the final
/// assembly text.
pub struct RiscvAsmEmitter {
    out: String,
}

impl Default for RiscvAsmEmitter {
    fn default() -> Self {
        Self {
            out: "\t.text\n".to_string(),
        }
    }
}

impl RiscvAsmEmitter {
    pub fn new() -> Self { Self::default() }

    /// Lower the TAC of `func` into instruction templates; register
    /// assignment happens in the allocator.
    pub fn select_instrs(&self, func: &TacFunc) -> (Vec<RvInst>, SubroutineInfo) {
        let seq = InstrSelector::select_func(func);
        let info = SubroutineInfo {
            func_label: func.label().clone(),
            num_args: func.num_args(),
        };
        (seq, info)
    }

    pub fn emit_subroutine(&mut self, info: SubroutineInfo) -> SubroutineEmitter<'_> {
        SubroutineEmitter::new(self, info)
    }

    pub fn finish(self) -> String { self.out }
}

/// Buffers one function's body and finalizes its stack frame.
pub struct SubroutineEmitter<'a> {
    emitter: &'a mut RiscvAsmEmitter,
    info: SubroutineInfo,
    buf: Vec<RvInst>,
    /// temp index -> spill-slot offset from the post-prologue sp.
    offsets: FxHashMap<u32, i32>,
    next_local_offset: i32,
}

impl<'a> SubroutineEmitter<'a> {
    fn new(emitter: &'a mut RiscvAsmEmitter, info: SubroutineInfo) -> Self {
        emitter.out.push_str(&format!("\t.global {}\n", info.func_label));
        emitter.out.push_str(&format!("{}:\n", info.func_label));
        Self {
            emitter,
            info,
            buf: Vec::new(),
            offsets: FxHashMap::default(),
            // callee-saved save area, then the RA and FP slots
            next_local_offset: CALLEE_SAVED_REGS.len() as i32 * WORD_SIZE + 2 * WORD_SIZE,
        }
    }

    pub fn emit_label(&mut self, label: &Label) {
        self.buf.push(RvInst::Label {
            label: label.clone(),
        });
    }

    pub fn emit_native(&mut self, inst: RvInst) { self.buf.push(inst); }

    pub fn emit_move(&mut self, dst: PReg, src: PReg) {
        self.buf.push(RvInst::Mv {
            rd: dst.into(),
            rs: src.into(),
        });
    }

    /// Store `reg`, currently holding `temp`, to the temp's spill slot; the
    /// slot is allocated on first store.
    pub fn emit_store_to_stack(&mut self, reg: PReg, temp: Temp) {
        let next = &mut self.next_local_offset;
        let offset = *self.offsets.entry(temp.index()).or_insert_with(|| {
            let offset = *next;
            *next += WORD_SIZE;
            offset
        });
        self.buf.push(RvInst::Sw {
            rs: reg.into(),
            base: sp(),
            offset,
        });
    }

    /// Whether `temp` has a spill slot already.
    pub fn has_slot(&self, temp: Temp) -> bool { self.offsets.contains_key(&temp.index()) }

    /// Reload `temp` from its spill slot into `reg`.
    ///
    /// Reloading a temp that was never stored is an internal-consistency
    /// violation, not a user diagnostic.
    pub fn emit_load_from_stack(&mut self, reg: PReg, temp: Temp) -> Result<(), CodegenError> {
        let offset = *self
            .offsets
            .get(&temp.index())
            .ok_or(CodegenError::UnspilledReload(temp))?;
        self.buf.push(RvInst::Lw {
            rd: reg.into(),
            base: sp(),
            offset,
        });
        Ok(())
    }

    /// Load incoming stack argument `index` (index >= 8) from the caller's
    /// push area, which sits just past the frame pointer.
    pub fn emit_get_param(&mut self, reg: PReg, index: usize) {
        self.buf.push(RvInst::Lw {
            rd: reg.into(),
            base: fp(),
            offset: WORD_SIZE * (index as i32 - 8),
        });
    }

    /// Push outgoing stack argument number `pushed` (0-based push order):
    /// extend the stack by one word and copy the temp's value from its spill
    /// slot through the scratch register.
    pub fn emit_store_param(&mut self, temp: Temp, pushed: usize) -> Result<(), CodegenError> {
        let offset = *self
            .offsets
            .get(&temp.index())
            .ok_or(CodegenError::UnspilledReload(temp))?;
        self.buf.push(RvInst::SpAdd { imm: -WORD_SIZE });
        // the slot moved down by one word per push so far, plus this one
        self.buf.push(RvInst::Lw {
            rd: t0().into(),
            base: sp(),
            offset: WORD_SIZE * (pushed as i32 + 1) + offset,
        });
        self.buf.push(RvInst::Sw {
            rs: t0().into(),
            base: sp(),
            offset: 0,
        });
        Ok(())
    }

    /// Deallocate the extra-argument area right after the call.
    pub fn emit_pop_param(&mut self, bytes: i32) { self.buf.push(RvInst::SpAdd { imm: bytes }); }

    /// Reserve a stack region of `size` bytes, rounded up to whole words,
    /// and set `reg` to its base address. A region that would push the frame
    /// past `i32` is rejected here rather than wrapping.
    pub fn alloc_array(&mut self, reg: PReg, size: u32) -> Result<(), CodegenError> {
        let offset = self.next_local_offset;
        let rounded =
            (i64::from(size) + i64::from(WORD_SIZE) - 1) / i64::from(WORD_SIZE) * i64::from(WORD_SIZE);
        self.next_local_offset = i32::try_from(i64::from(offset) + rounded)
            .map_err(|_| CodegenError::FrameTooLarge(i32::MAX))?;
        self.buf.push(RvInst::Addi {
            rd: reg,
            rs: sp(),
            imm: offset,
        });
        Ok(())
    }

    /// Synthesize the prologue, flush the buffered body and emit the shared
    /// epilogue. `used` is the set of registers ever bound during the
    /// function; only callee-saved members of it are saved and restored.
    pub fn emit_end(&mut self, used: &FxHashSet<PReg>) -> Result<(), CodegenError> {
        let frame_size = self.next_local_offset;
        Imm12::try_from_i32(frame_size).ok_or(CodegenError::FrameTooLarge(frame_size))?;

        let ra_offset = CALLEE_SAVED_REGS.len() as i32 * WORD_SIZE;
        let fp_offset = ra_offset + WORD_SIZE;

        let mut prologue: Vec<RvInst> = vec![
            RvInst::SpAdd { imm: -frame_size },
            RvInst::Sw {
                rs: ra().into(),
                base: sp(),
                offset: ra_offset,
            },
            RvInst::Sw {
                rs: fp().into(),
                base: sp(),
                offset: fp_offset,
            },
            // the frame pointer points just past the frame
            RvInst::Addi {
                rd: fp(),
                rs: sp(),
                imm: frame_size,
            },
        ];
        for (i, reg) in CALLEE_SAVED_REGS.iter().enumerate() {
            if used.contains(reg) {
                prologue.push(RvInst::Sw {
                    rs: (*reg).into(),
                    base: sp(),
                    offset: i as i32 * WORD_SIZE,
                });
            }
        }

        let mut epilogue: Vec<RvInst> = Vec::new();
        for (i, reg) in CALLEE_SAVED_REGS.iter().enumerate() {
            if used.contains(reg) {
                epilogue.push(RvInst::Lw {
                    rd: (*reg).into(),
                    base: sp(),
                    offset: i as i32 * WORD_SIZE,
                });
            }
        }
        epilogue.push(RvInst::Lw {
            rd: fp().into(),
            base: sp(),
            offset: fp_offset,
        });
        epilogue.push(RvInst::Lw {
            rd: ra().into(),
            base: sp(),
            offset: ra_offset,
        });
        epilogue.push(RvInst::SpAdd { imm: frame_size });
        epilogue.push(RvInst::Ret);

        let out = &mut self.emitter.out;
        for inst in &prologue {
            out.push_str(&format!("\t{}\n", inst));
        }
        for inst in &self.buf {
            match inst.kind() {
                InstrKind::Label => out.push_str(&format!("{}\n", inst)),
                InstrKind::Seq
                | InstrKind::Jump
                | InstrKind::CondJump
                | InstrKind::Ret
                | InstrKind::Call
                | InstrKind::Param
                | InstrKind::Alloc => out.push_str(&format!("\t{}\n", inst)),
            }
        }
        out.push_str(&format!("{}{}:\n", self.info.func_label, EPILOGUE_SUFFIX));
        for inst in &epilogue {
            out.push_str(&format!("\t{}\n", inst));
        }
        out.push('\n');
        Ok(())
    }
}

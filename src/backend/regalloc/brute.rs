//! Brute-force local register allocation.
//!
//! Walks the CFG in node order and allocates registers block by block:
//! register residency is strictly block-local, and every value live across a
//! block boundary goes through its spill slot. The allocator also implements
//! the calling convention: parameter marshaling into the eight argument
//! registers, stack passing beyond them, and caller-saved preservation
//! around calls.

use std::mem;

use rustc_hash::{FxHashMap, FxHashSet};

use super::{RegAlloc, SpillPolicy};
use crate::{
    backend::{
        block::{BasicBlock, Loc},
        cfg::Cfg,
        emit::SubroutineEmitter,
        regs::{PReg, Reg},
        riscv32::{
            inst::RvInst,
            regs::{t0, ALLOCATABLE_REGS, ARG_REGS, CALLER_SAVED_REGS, RET_REG, WORD_SIZE},
        },
        CodegenError,
    },
    tac::{InstrKind, Temp},
};

pub struct BruteRegAlloc<'p> {
    policy: &'p mut dyn SpillPolicy,

    /// temp index -> register currently holding it.
    bindings: FxHashMap<u32, PReg>,
    /// register -> temp currently bound to it.
    occupants: FxHashMap<PReg, Temp>,
    /// Registers bound at least once during the whole function; drives the
    /// callee-saved save/restore pairs in the prologue and epilogue.
    ever_used: FxHashSet<PReg>,

    /// Outgoing arguments accumulated by param pseudo instructions for the
    /// pending call, in source order.
    pending_args: Vec<Temp>,
    /// Caller-saved registers stored away for the pending call, with the
    /// temps they held, in store order.
    shadowed: Vec<(PReg, Temp)>,
}

impl<'p> BruteRegAlloc<'p> {
    pub fn new(policy: &'p mut dyn SpillPolicy) -> Self {
        Self {
            policy,
            bindings: FxHashMap::default(),
            occupants: FxHashMap::default(),
            ever_used: FxHashSet::default(),
            pending_args: Vec::new(),
            shadowed: Vec::new(),
        }
    }

    fn bind(&mut self, temp: Temp, reg: PReg) {
        self.ever_used.insert(reg);
        self.bindings.insert(temp.index(), reg);
        self.occupants.insert(reg, temp);
    }

    fn unbind(&mut self, temp: Temp) {
        if let Some(reg) = self.bindings.remove(&temp.index()) {
            self.occupants.remove(&reg);
        }
    }

    fn occupant(&self, reg: PReg) -> Option<Temp> { self.occupants.get(&reg).copied() }

    fn local_alloc(
        &mut self,
        block: &BasicBlock,
        sub: &mut SubroutineEmitter<'_>,
    ) -> Result<(), CodegenError> {
        // residency is block-local, start from a clean register file
        self.bindings.clear();
        self.occupants.clear();

        for loc in block.seq_locs() {
            self.alloc_for_loc(loc, sub)?;
        }

        // persist everything live out of the block; successors reload from
        // the spill slots
        let mut live_out: Vec<u32> = block.live_out.iter().copied().collect();
        live_out.sort_unstable();
        for index in live_out {
            if let Some(&reg) = self.bindings.get(&index) {
                sub.emit_store_to_stack(reg, Temp::new(index));
            }
        }

        // the terminator is allocated after the live-out stores, so a
        // register just spilled may be reused by its operands
        if let Some(terminator) = block.terminator() {
            self.alloc_for_loc(terminator, sub)?;
        }
        Ok(())
    }

    fn alloc_for_loc(
        &mut self,
        loc: &Loc,
        sub: &mut SubroutineEmitter<'_>,
    ) -> Result<(), CodegenError> {
        let inst = &loc.inst;

        let mut src_regs: Vec<PReg> = Vec::new();
        let mut dst_regs: Vec<PReg> = Vec::new();

        for operand in inst.srcs() {
            match operand {
                Reg::P(preg) => src_regs.push(preg),
                Reg::V(temp) => {
                    src_regs.push(self.alloc_reg_for(temp, true, &loc.live_in, sub)?)
                }
            }
        }
        for operand in inst.dsts() {
            match operand {
                Reg::P(preg) => dst_regs.push(preg),
                Reg::V(temp) => {
                    // not read yet, no reload from the stack
                    dst_regs.push(self.alloc_reg_for(temp, false, &loc.live_in, sub)?)
                }
            }
        }

        match inst.kind() {
            InstrKind::Call => self.alloc_for_call(inst, &dst_regs, &src_regs, sub)?,
            InstrKind::Param => {
                let RvInst::Param { value } = inst else {
                    unreachable!("kind() said param");
                };
                let temp = value.as_temp().expect("param takes a temp operand");
                self.alloc_for_param(temp, src_regs[0], sub);
            }
            InstrKind::Alloc => {
                let RvInst::Alloc { size, .. } = inst else {
                    unreachable!("kind() said alloc");
                };
                sub.alloc_array(dst_regs[0], *size)?;
            }
            InstrKind::Label
            | InstrKind::Seq
            | InstrKind::Jump
            | InstrKind::CondJump
            | InstrKind::Ret => {
                sub.emit_native(inst.with_operands(&dst_regs, &src_regs));
            }
        }
        Ok(())
    }

    /// Store caller-saved registers, marshal stack arguments, emit the call,
    /// pop the extra-argument area and restore the shadow-saved pairs.
    fn alloc_for_call(
        &mut self,
        inst: &RvInst,
        dst_regs: &[PReg],
        src_regs: &[PReg],
        sub: &mut SubroutineEmitter<'_>,
    ) -> Result<(), CodegenError> {
        // argument registers already loaded by param handling keep their
        // values; every other occupied caller-saved register is stored away
        let reserved = &ARG_REGS[..self.pending_args.len().min(ARG_REGS.len())];
        for reg in CALLER_SAVED_REGS {
            if reserved.contains(&reg) {
                continue;
            }
            if let Some(temp) = self.occupant(reg) {
                self.shadowed.push((reg, temp));
                sub.emit_store_to_stack(reg, temp);
                self.unbind(temp);
            }
        }

        // arguments 9..n go to a freshly extended stack area, right to left;
        // one still resident in a callee-saved register gets its backing
        // slot here, since the push copies from the spill slot
        let num_stack_args = self.pending_args.len().saturating_sub(ARG_REGS.len());
        if num_stack_args > 0 {
            for &temp in &self.pending_args[ARG_REGS.len()..] {
                if !sub.has_slot(temp) {
                    if let Some(&reg) = self.bindings.get(&temp.index()) {
                        sub.emit_store_to_stack(reg, temp);
                    }
                }
            }
            for (pushed, &temp) in self.pending_args[ARG_REGS.len()..].iter().rev().enumerate()
            {
                sub.emit_store_param(temp, pushed)?;
            }
        }

        sub.emit_native(inst.with_operands(dst_regs, src_regs));

        if num_stack_args > 0 {
            sub.emit_pop_param(WORD_SIZE * num_stack_args as i32);
        }
        self.pending_args.clear();

        // the return register's prior occupant is discarded, everything else
        // comes back
        let shadowed = mem::take(&mut self.shadowed);
        for (reg, temp) in shadowed {
            if reg == RET_REG {
                continue;
            }
            if let Some(current) = self.occupant(reg) {
                self.unbind(current);
            }
            self.bind(temp, reg);
            sub.emit_load_from_stack(reg, temp)?;
        }

        // register residency across the call is not trusted; later uses
        // reload from the spill slots
        let occupied: Vec<Temp> = CALLER_SAVED_REGS
            .iter()
            .filter_map(|reg| self.occupant(*reg))
            .collect();
        for temp in occupied {
            self.unbind(temp);
        }
        Ok(())
    }

    /// Record the argument; the first eight are moved into their argument
    /// registers immediately, the rest are materialized at call time.
    fn alloc_for_param(&mut self, temp: Temp, src_reg: PReg, sub: &mut SubroutineEmitter<'_>) {
        let n = self.pending_args.len();
        if n < ARG_REGS.len() {
            let reg = ARG_REGS[n];
            if let Some(prev) = self.occupant(reg) {
                self.shadowed.push((reg, prev));
                sub.emit_store_to_stack(reg, prev);
                self.unbind(prev);
            }
            sub.emit_move(reg, src_reg);
        }
        self.pending_args.push(temp);
    }

    /// Find a register for `temp`.
    ///
    /// Scan the pool in fixed order for a register that is free or bound to
    /// a temp absent from `live`; failing that, ask the spill policy for a
    /// victim and store it out first.
    fn alloc_reg_for(
        &mut self,
        temp: Temp,
        is_read: bool,
        live: &FxHashSet<u32>,
        sub: &mut SubroutineEmitter<'_>,
    ) -> Result<PReg, CodegenError> {
        if let Some(&reg) = self.bindings.get(&temp.index()) {
            return Ok(reg);
        }

        for reg in ALLOCATABLE_REGS {
            let evictable = match self.occupant(reg) {
                None => true,
                // dead occupants are evicted without a store
                Some(bound) => !live.contains(&bound.index()),
            };
            if evictable {
                if is_read {
                    // a source that is not yet resident must have been
                    // stored earlier
                    sub.emit_load_from_stack(reg, temp)?;
                }
                if let Some(bound) = self.occupant(reg) {
                    self.unbind(bound);
                }
                self.bind(temp, reg);
                return Ok(reg);
            }
        }

        // every register holds a live temp, spill one
        let reg = self.policy.choose_victim(&ALLOCATABLE_REGS);
        let victim = self
            .occupant(reg)
            .expect("spill victim must be occupied when the pool is exhausted");
        sub.emit_store_to_stack(reg, victim);
        self.unbind(victim);
        self.bind(temp, reg);
        if is_read {
            sub.emit_load_from_stack(reg, temp)?;
        }
        Ok(reg)
    }
}

impl RegAlloc for BruteRegAlloc<'_> {
    /// Perform full code generation for one function.
    ///
    /// # Preconditions
    ///
    /// The instruction producer must not rely on a temp that occupies the
    /// return register when a call is reached: the register's prior occupant
    /// is permanently discarded by call handling, so its value must not be
    /// needed after the call.
    fn accept(
        &mut self,
        cfg: &Cfg,
        sub: &mut SubroutineEmitter<'_>,
        num_args: usize,
    ) -> Result<(), CodegenError> {
        // give every argument temp a backing spill slot before any reload
        // is attempted
        for index in 0..num_args.min(ARG_REGS.len()) {
            let temp = Temp::new(index as u32);
            self.bind(temp, ARG_REGS[index]);
            sub.emit_store_to_stack(ARG_REGS[index], temp);
        }
        // incoming stack arguments are copied out of the caller's push area
        for index in ARG_REGS.len()..num_args {
            let temp = Temp::new(index as u32);
            sub.emit_get_param(t0(), index);
            sub.emit_store_to_stack(t0(), temp);
        }

        for id in 0..cfg.len() {
            let block = cfg.block(id);
            // the label comes out even for unreachable blocks; only the
            // body is gated on reachability
            if let Some(label) = &block.label {
                sub.emit_label(label);
            }
            if cfg.is_reachable(id) {
                self.local_alloc(block, sub)?;
            }
        }

        sub.emit_end(&self.ever_used)
    }
}

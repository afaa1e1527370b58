//! Basic blocks over selected machine instructions.
//!
//! [`Loc`] wraps one instruction with its liveness record; [`BasicBlock`] is
//! a maximal straight-line sequence of Locs. The partitioner splits the
//! selector's flat instruction sequence at labels and after control
//! transfers, producing the node list and edge list consumed by
//! [`Cfg`](super::cfg::Cfg) construction.

use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;

use super::{riscv32::inst::RvInst, CodegenError};
use crate::tac::{InstrKind, Label};

/// A line of code: one instruction plus its live-in/live-out sets of temp
/// indices. The sets are filled by liveness analysis and consumed read-only
/// by the allocator.
#[derive(Debug, Clone)]
pub struct Loc {
    pub inst: RvInst,
    pub live_in: FxHashSet<u32>,
    pub live_out: FxHashSet<u32>,
}

impl Loc {
    pub fn new(inst: RvInst) -> Self {
        Self {
            inst,
            live_in: FxHashSet::default(),
            live_out: FxHashSet::default(),
        }
    }
}

/// How control leaves a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Falls through to the next block in order.
    Continuous,
    EndByJump,
    EndByCondJump,
    EndByReturn,
}

/// A maximal ordered sequence of [`Loc`]s with a single entry and exit.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub kind: BlockKind,
    /// The entry label, present iff the block started at a label mark.
    pub label: Option<Label>,
    pub locs: Vec<Loc>,
    /// Aggregated block-exit live-out: the union over the live-out sets of
    /// the contained Locs.
    pub live_out: FxHashSet<u32>,
}

impl BasicBlock {
    fn new(label: Option<Label>) -> Self {
        Self {
            kind: BlockKind::Continuous,
            label,
            locs: Vec::new(),
            live_out: FxHashSet::default(),
        }
    }

    pub fn is_empty(&self) -> bool { self.locs.is_empty() }

    /// The locs processed by the main local-allocation loop: everything but
    /// a trailing control-transfer instruction.
    pub fn seq_locs(&self) -> &[Loc] {
        if self.kind != BlockKind::Continuous && !self.locs.is_empty() {
            &self.locs[..self.locs.len() - 1]
        } else {
            &self.locs[..]
        }
    }

    /// The trailing control-transfer instruction, if the block ends in one.
    pub fn terminator(&self) -> Option<&Loc> {
        if self.kind != BlockKind::Continuous {
            self.locs.last()
        } else {
            None
        }
    }
}

/// Partition a selected instruction sequence into basic blocks plus the edge
/// list between them. Block indices follow sequence order; index 0 is the
/// function entry.
pub fn partition(
    insts: Vec<RvInst>,
) -> Result<(Vec<BasicBlock>, Vec<(usize, usize)>), CodegenError> {
    let mut blocks: Vec<BasicBlock> = Vec::new();
    let mut current = BasicBlock::new(None);

    for inst in insts {
        match inst.kind() {
            InstrKind::Label => {
                let label = match &inst {
                    RvInst::Label { label } => label.clone(),
                    _ => unreachable!("label kind implies label instruction"),
                };
                if !current.is_empty() || current.label.is_some() {
                    blocks.push(current);
                }
                current = BasicBlock::new(Some(label));
            }
            InstrKind::Jump | InstrKind::CondJump | InstrKind::Ret => {
                current.kind = match inst.kind() {
                    InstrKind::Jump => BlockKind::EndByJump,
                    InstrKind::CondJump => BlockKind::EndByCondJump,
                    InstrKind::Ret => BlockKind::EndByReturn,
                    InstrKind::Label
                    | InstrKind::Seq
                    | InstrKind::Call
                    | InstrKind::Param
                    | InstrKind::Alloc => unreachable!(),
                };
                current.locs.push(Loc::new(inst));
                blocks.push(current);
                current = BasicBlock::new(None);
            }
            InstrKind::Seq | InstrKind::Call | InstrKind::Param | InstrKind::Alloc => {
                current.locs.push(Loc::new(inst));
            }
        }
    }
    if !current.is_empty() || current.label.is_some() || blocks.is_empty() {
        blocks.push(current);
    }

    let mut label_to_block: FxHashMap<Label, usize> = FxHashMap::default();
    for (id, block) in blocks.iter().enumerate() {
        if let Some(label) = &block.label {
            label_to_block.insert(label.clone(), id);
        }
    }

    let mut edges = Vec::new();
    for (id, block) in blocks.iter().enumerate() {
        let target = |label: &Label| -> Result<usize, CodegenError> {
            label_to_block
                .get(label)
                .copied()
                .ok_or_else(|| CodegenError::UnknownLabel(label.clone()))
        };
        match block.kind {
            BlockKind::Continuous => {
                if id + 1 < blocks.len() {
                    edges.push((id, id + 1));
                }
            }
            BlockKind::EndByJump => {
                if let Some(RvInst::J { target: label }) = block.locs.last().map(|l| &l.inst) {
                    edges.push((id, target(label)?));
                }
                // a jump to the epilogue exits the function, no edge
            }
            BlockKind::EndByCondJump => {
                if let Some(RvInst::Br { target: label, .. }) =
                    block.locs.last().map(|l| &l.inst)
                {
                    edges.push((id, target(label)?));
                }
                if id + 1 < blocks.len() {
                    edges.push((id, id + 1));
                }
            }
            BlockKind::EndByReturn => {}
        }
    }

    Ok((blocks, edges))
}

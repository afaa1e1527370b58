//! Liveness analysis over selected instructions.
//!
//! Standard backward dataflow: block-level use/def sets, iteration to
//! fixpoint over the CFG, then an in-block backward sweep filling each
//! [`Loc`](super::block::Loc)'s `live_in`/`live_out`. The block's aggregated
//! live-out set (the union over its Locs' live-out) drives end-of-block
//! spilling in the allocator.

use rustc_hash::FxHashSet;

use super::cfg::Cfg;

/// Compute liveness for every Loc of every block in `cfg`, in place.
pub fn analyze(cfg: &mut Cfg) {
    let n = cfg.len();

    let mut uses: Vec<FxHashSet<u32>> = vec![FxHashSet::default(); n];
    let mut defs: Vec<FxHashSet<u32>> = vec![FxHashSet::default(); n];
    for id in 0..n {
        for loc in &cfg.block(id).locs {
            for temp in loc.inst.uses() {
                if !defs[id].contains(&temp.index()) {
                    uses[id].insert(temp.index());
                }
            }
            for temp in loc.inst.defs() {
                defs[id].insert(temp.index());
            }
        }
    }

    let mut in_: Vec<FxHashSet<u32>> = vec![FxHashSet::default(); n];
    let mut out: Vec<FxHashSet<u32>> = vec![FxHashSet::default(); n];

    let mut changed = true;
    while changed {
        changed = false;
        for id in (0..n).rev() {
            // out[B] = U in[S] for all S in succ[B]
            let mut out_set = FxHashSet::default();
            for &succ in cfg.succs(id) {
                out_set.extend(in_[succ].iter().copied());
            }

            // in[B] = use[B] U (out[B] - def[B])
            let mut in_set = uses[id].clone();
            in_set.extend(out_set.difference(&defs[id]).copied());

            if in_[id] != in_set {
                in_[id] = in_set;
                changed = true;
            }
            if out[id] != out_set {
                out[id] = out_set;
                changed = true;
            }
        }
    }

    for id in 0..n {
        let block = cfg.block_mut(id);
        let mut live = out[id].clone();
        let mut aggregated = FxHashSet::default();
        for loc in block.locs.iter_mut().rev() {
            loc.live_out = live.clone();
            aggregated.extend(live.iter().copied());
            for temp in loc.inst.defs() {
                live.remove(&temp.index());
            }
            for temp in loc.inst.uses() {
                live.insert(temp.index());
            }
            loc.live_in = live.clone();
        }
        block.live_out = aggregated;
    }
}

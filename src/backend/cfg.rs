//! Control-flow graph over basic blocks.
//!
//! Owns the ordered node list (index 0 is the entry) and the edge relation,
//! derives predecessor/successor adjacency sets and a reachability bit per
//! node via breadth-first traversal from the entry.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use thiserror::Error;

use super::block::BasicBlock;

#[derive(Debug, Error)]
pub enum CfgError {
    #[error("edge ({0}, {1}) references an out-of-range block index")]
    EdgeOutOfRange(usize, usize),
}

#[derive(Debug)]
pub struct Cfg {
    nodes: Vec<BasicBlock>,
    /// `links[u]` is `(preds, succs)` of node `u`.
    links: Vec<(FxHashSet<usize>, FxHashSet<usize>)>,
    reachable: Vec<bool>,
}

impl Cfg {
    pub fn new(nodes: Vec<BasicBlock>, edges: &[(usize, usize)]) -> Result<Self, CfgError> {
        let n = nodes.len();
        let mut links = vec![(FxHashSet::default(), FxHashSet::default()); n];
        for &(u, v) in edges {
            if u >= n || v >= n {
                return Err(CfgError::EdgeOutOfRange(u, v));
            }
            links[u].1.insert(v);
            links[v].0.insert(u);
        }

        // breadth-first traversal from the entry node
        let mut reachable = vec![false; n];
        if n > 0 {
            let mut queue = VecDeque::new();
            queue.push_back(0);
            reachable[0] = true;
            while let Some(u) = queue.pop_front() {
                for &v in &links[u].1 {
                    if !reachable[v] {
                        reachable[v] = true;
                        queue.push_back(v);
                    }
                }
            }
        }

        Ok(Self {
            nodes,
            links,
            reachable,
        })
    }

    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    pub fn block(&self, id: usize) -> &BasicBlock { &self.nodes[id] }

    pub fn block_mut(&mut self, id: usize) -> &mut BasicBlock { &mut self.nodes[id] }

    pub fn preds(&self, id: usize) -> &FxHashSet<usize> { &self.links[id].0 }

    pub fn succs(&self, id: usize) -> &FxHashSet<usize> { &self.links[id].1 }

    pub fn in_degree(&self, id: usize) -> usize { self.links[id].0.len() }

    pub fn out_degree(&self, id: usize) -> usize { self.links[id].1.len() }

    /// Whether node `id` is reachable from the entry.
    pub fn is_reachable(&self, id: usize) -> bool { self.reachable[id] }

    pub fn iter(&self) -> impl Iterator<Item = &BasicBlock> { self.nodes.iter() }
}

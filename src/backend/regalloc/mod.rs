//! # Register Allocation
//!
//! - `brute`: the per-block local allocator with spilling and the calling
//!   convention protocol.
//!
//! The allocator sits behind the [`RegAlloc`] trait so a global allocator
//! can be substituted without changing callers. Spill-victim selection is an
//! injectable [`SpillPolicy`]; the default is a deterministic round-robin,
//! with a seeded xorshift generator available when parity with a
//! randomized implementation is wanted.

pub mod brute;

pub use brute::BruteRegAlloc;

use super::{
    cfg::Cfg,
    emit::SubroutineEmitter,
    regs::PReg,
    CodegenError,
};

/// Full code generation for one function, by side effect on the subroutine
/// emitter.
pub trait RegAlloc {
    fn accept(
        &mut self,
        cfg: &Cfg,
        sub: &mut SubroutineEmitter<'_>,
        num_args: usize,
    ) -> Result<(), CodegenError>;
}

/// Chooses the victim register when every allocatable register is bound to a
/// live temp.
pub trait SpillPolicy {
    fn choose_victim(&mut self, pool: &[PReg]) -> PReg;
}

/// Deterministic victim choice: cycle through the pool in fixed order.
#[derive(Debug, Default)]
pub struct RoundRobin {
    next: usize,
}

impl SpillPolicy for RoundRobin {
    fn choose_victim(&mut self, pool: &[PReg]) -> PReg {
        let reg = pool[self.next % pool.len()];
        self.next += 1;
        reg
    }
}

/// Seeded uniform-ish victim choice (xorshift64).
#[derive(Debug)]
pub struct XorShift {
    state: u64,
}

impl XorShift {
    pub fn new(seed: u64) -> Self {
        Self {
            // xorshift state must be nonzero
            state: seed.max(1),
        }
    }
}

impl SpillPolicy for XorShift {
    fn choose_victim(&mut self, pool: &[PReg]) -> PReg {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        pool[(x % pool.len() as u64) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::riscv32::regs::ALLOCATABLE_REGS;

    #[test]
    fn test_round_robin_cycles() {
        let mut policy = RoundRobin::default();
        let first: Vec<PReg> = (0..ALLOCATABLE_REGS.len())
            .map(|_| policy.choose_victim(&ALLOCATABLE_REGS))
            .collect();
        assert_eq!(first, ALLOCATABLE_REGS.to_vec());
        assert_eq!(policy.choose_victim(&ALLOCATABLE_REGS), ALLOCATABLE_REGS[0]);
    }

    #[test]
    fn test_xorshift_deterministic() {
        let mut a = XorShift::new(42);
        let mut b = XorShift::new(42);
        for _ in 0..16 {
            assert_eq!(
                a.choose_victim(&ALLOCATABLE_REGS),
                b.choose_victim(&ALLOCATABLE_REGS)
            );
        }
    }
}

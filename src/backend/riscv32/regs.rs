//! RV32 register definitions and the ABI sets used by the allocator and the
//! frame emitter.

use core::fmt;

use crate::backend::regs::PReg;

pub const fn zero() -> PReg { PReg::new(0) }

pub const fn ra() -> PReg { PReg::new(1) }

pub const fn sp() -> PReg { PReg::new(2) }

pub const fn gp() -> PReg { PReg::new(3) }

pub const fn tp() -> PReg { PReg::new(4) }

pub const fn t0() -> PReg { PReg::new(5) }

pub const fn t1() -> PReg { PReg::new(6) }

pub const fn t2() -> PReg { PReg::new(7) }

pub const fn s0() -> PReg { PReg::new(8) }

pub const fn fp() -> PReg { s0() }

pub const fn s1() -> PReg { PReg::new(9) }

pub const fn a0() -> PReg { PReg::new(10) }

pub const fn a1() -> PReg { PReg::new(11) }

pub const fn a2() -> PReg { PReg::new(12) }

pub const fn a3() -> PReg { PReg::new(13) }

pub const fn a4() -> PReg { PReg::new(14) }

pub const fn a5() -> PReg { PReg::new(15) }

pub const fn a6() -> PReg { PReg::new(16) }

pub const fn a7() -> PReg { PReg::new(17) }

pub const fn s2() -> PReg { PReg::new(18) }

pub const fn s3() -> PReg { PReg::new(19) }

pub const fn s4() -> PReg { PReg::new(20) }

pub const fn s5() -> PReg { PReg::new(21) }

pub const fn s6() -> PReg { PReg::new(22) }

pub const fn s7() -> PReg { PReg::new(23) }

pub const fn s8() -> PReg { PReg::new(24) }

pub const fn s9() -> PReg { PReg::new(25) }

pub const fn s10() -> PReg { PReg::new(26) }

pub const fn s11() -> PReg { PReg::new(27) }

pub const fn t3() -> PReg { PReg::new(28) }

pub const fn t4() -> PReg { PReg::new(29) }

pub const fn t5() -> PReg { PReg::new(30) }

pub const fn t6() -> PReg { PReg::new(31) }

pub const fn display_preg(reg: PReg) -> &'static str {
    match reg.num() {
        0 => "zero",
        1 => "ra",
        2 => "sp",
        3 => "gp",
        4 => "tp",
        5 => "t0",
        6 => "t1",
        7 => "t2",
        8 => "s0",
        9 => "s1",
        10 => "a0",
        11 => "a1",
        12 => "a2",
        13 => "a3",
        14 => "a4",
        15 => "a5",
        16 => "a6",
        17 => "a7",
        18 => "s2",
        19 => "s3",
        20 => "s4",
        21 => "s5",
        22 => "s6",
        23 => "s7",
        24 => "s8",
        25 => "s9",
        26 => "s10",
        27 => "s11",
        28 => "t3",
        29 => "t4",
        30 => "t5",
        31 => "t6",
        _ => "<invalid>",
    }
}

impl fmt::Display for PReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.num() < 32 {
            write!(f, "{}", display_preg(*self))
        } else {
            unreachable!("invalid register number")
        }
    }
}

/// Bytes per stack word (ILP32).
pub const WORD_SIZE: i32 = 4;

/// Incoming parameters and outgoing call arguments share these registers.
pub const ARG_REGS: [PReg; 8] = [a0(), a1(), a2(), a3(), a4(), a5(), a6(), a7()];

/// The return value register.
pub const RET_REG: PReg = a0();

pub const CALLER_SAVED_REGS: [PReg; 15] = [
    t0(),
    t1(),
    t2(),
    t3(),
    t4(),
    t5(),
    t6(),
    a0(),
    a1(),
    a2(),
    a3(),
    a4(),
    a5(),
    a6(),
    a7(),
];

/// Saved in the prologue when ever bound; `s0` is the frame pointer and
/// excluded. The save-area slot of `CALLEE_SAVED_REGS[i]` is `4 * i`.
pub const CALLEE_SAVED_REGS: [PReg; 11] = [
    s1(),
    s2(),
    s3(),
    s4(),
    s5(),
    s6(),
    s7(),
    s8(),
    s9(),
    s10(),
    s11(),
];

/// The pool scanned by the allocator, in fixed order. Argument registers are
/// bindable (parameter marshaling binds them directly) but never handed out
/// by the pool scan.
pub const ALLOCATABLE_REGS: [PReg; 18] = [
    t0(),
    t1(),
    t2(),
    t3(),
    t4(),
    t5(),
    t6(),
    s1(),
    s2(),
    s3(),
    s4(),
    s5(),
    s6(),
    s7(),
    s8(),
    s9(),
    s10(),
    s11(),
];

/// Every lowered return jumps to `<function label>` + this suffix.
pub const EPILOGUE_SUFFIX: &str = "_exit";

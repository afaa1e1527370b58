use core::fmt;

use crate::tac::Temp;

/// The physical register.
///
/// Only one register class (general purpose) exists on this target, so a
/// plain register number is enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PReg(u8);

impl PReg {
    pub const fn new(num: u8) -> Self { Self(num) }

    pub const fn num(&self) -> u8 { self.0 }
}

/// A machine instruction operand: either an already-physical register or a
/// virtual one (a [`Temp`]) awaiting allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    P(PReg),
    V(Temp),
}

impl Reg {
    pub fn is_preg(&self) -> bool { matches!(self, Reg::P(_)) }

    pub fn is_vreg(&self) -> bool { matches!(self, Reg::V(_)) }

    pub fn as_temp(&self) -> Option<Temp> {
        match self {
            Reg::V(temp) => Some(*temp),
            Reg::P(_) => None,
        }
    }

    pub fn as_preg(&self) -> Option<PReg> {
        match self {
            Reg::P(preg) => Some(*preg),
            Reg::V(_) => None,
        }
    }
}

impl From<Temp> for Reg {
    fn from(temp: Temp) -> Self { Self::V(temp) }
}

impl From<PReg> for Reg {
    fn from(preg: PReg) -> Self { Self::P(preg) }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reg::P(preg) => write!(f, "{}", super::riscv32::regs::display_preg(*preg)),
            Reg::V(temp) => write!(f, "{}", temp),
        }
    }
}

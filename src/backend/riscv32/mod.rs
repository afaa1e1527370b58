pub mod imm;
pub mod inst;
pub mod isel;
pub mod regs;

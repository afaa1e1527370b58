#![allow(dead_code)]

use rvtac::{
    backend,
    tac::{BinaryOp, TacFunc, TacInst, Temp},
};

/// Run the full pipeline and return the assembly text.
pub fn codegen(program: &[TacFunc]) -> String {
    backend::codegen(program).expect("codegen should succeed")
}

/// Count the lines whose trimmed content equals `line`.
pub fn count_lines(asm: &str, line: &str) -> usize {
    asm.lines().filter(|l| l.trim() == line).count()
}

/// `f(a, b) { return a + b; }`
pub fn add_func(name: &str) -> TacFunc {
    let mut f = TacFunc::new(name, 2);
    f.push(TacInst::Binary {
        op: BinaryOp::Add,
        dst: Temp::new(2),
        lhs: Temp::new(0),
        rhs: Temp::new(1),
    });
    f.push(TacInst::Return {
        value: Some(Temp::new(2)),
    });
    f
}

/// A function that keeps `width` temps live at once: `width` load-immediates
/// followed by a chain of additions folding them all into one result.
pub fn wide_func(name: &str, width: u32) -> TacFunc {
    assert!(width >= 2);
    let mut f = TacFunc::new(name, 0);
    for i in 0..width {
        f.push(TacInst::LoadImm {
            dst: Temp::new(i),
            value: i as i32,
        });
    }
    let mut acc = Temp::new(0);
    let mut next = width;
    for i in 1..width {
        f.push(TacInst::Binary {
            op: BinaryOp::Add,
            dst: Temp::new(next),
            lhs: acc,
            rhs: Temp::new(i),
        });
        acc = Temp::new(next);
        next += 1;
    }
    f.push(TacInst::Return { value: Some(acc) });
    f
}

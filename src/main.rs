use rvtac::{
    backend,
    tac::{BinaryOp, CondBrOp, TacFunc, TacInst, Temp},
};

fn main() {
    // max(a, b): return the larger argument
    let mut max = TacFunc::new("max", 2);
    max.push(TacInst::Binary {
        op: BinaryOp::Slt,
        dst: Temp::new(2),
        lhs: Temp::new(0),
        rhs: Temp::new(1),
    });
    max.push(TacInst::CondBranch {
        op: CondBrOp::Beqz,
        cond: Temp::new(2),
        target: "max_else".into(),
    });
    max.push(TacInst::Return {
        value: Some(Temp::new(1)),
    });
    max.push(TacInst::Mark {
        label: "max_else".into(),
    });
    max.push(TacInst::Return {
        value: Some(Temp::new(0)),
    });

    // main: return max(3, 4)
    let mut main_func = TacFunc::new("main", 0);
    main_func.push(TacInst::LoadImm {
        dst: Temp::new(0),
        value: 3,
    });
    main_func.push(TacInst::LoadImm {
        dst: Temp::new(1),
        value: 4,
    });
    main_func.push(TacInst::Param {
        value: Temp::new(0),
    });
    main_func.push(TacInst::Param {
        value: Temp::new(1),
    });
    main_func.push(TacInst::Call {
        dst: Temp::new(2),
        callee: "max".into(),
    });
    main_func.push(TacInst::Return {
        value: Some(Temp::new(2)),
    });

    let asm = backend::codegen(&[max, main_func]).expect("codegen failed");
    print!("{}", asm);
}

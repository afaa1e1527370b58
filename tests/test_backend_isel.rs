use rvtac::{
    backend::{
        riscv32::{inst::RvInst, isel::InstrSelector, regs::RET_REG},
        Reg,
    },
    tac::{BinaryOp, TacFunc, TacInst, Temp, UnaryOp},
};

fn select_one(inst: TacInst) -> Vec<RvInst> {
    let mut selector = InstrSelector::new("f".into());
    selector.select(&inst);
    selector.finish()
}

fn binary(op: BinaryOp) -> TacInst {
    TacInst::Binary {
        op,
        dst: Temp::new(2),
        lhs: Temp::new(0),
        rhs: Temp::new(1),
    }
}

#[test]
fn test_isel_eq_lowers_to_sub_seqz() {
    let seq = select_one(binary(BinaryOp::Equ));
    assert_eq!(seq.len(), 2);
    assert!(matches!(
        seq[0],
        RvInst::Binary {
            op: BinaryOp::Sub,
            rd: Reg::V(d),
            ..
        } if d == Temp::new(2)
    ));
    assert!(matches!(
        seq[1],
        RvInst::Unary {
            op: UnaryOp::Seqz,
            rd: Reg::V(d),
            rs: Reg::V(s),
        } if d == Temp::new(2) && s == Temp::new(2)
    ));
}

#[test]
fn test_isel_neq_lowers_to_sub_snez() {
    let seq = select_one(binary(BinaryOp::Neq));
    assert_eq!(seq.len(), 2);
    assert!(matches!(seq[0], RvInst::Binary { op: BinaryOp::Sub, .. }));
    assert!(matches!(seq[1], RvInst::Unary { op: UnaryOp::Snez, .. }));
}

#[test]
fn test_isel_leq_lowers_to_sub_sgtz_seqz() {
    let seq = select_one(binary(BinaryOp::Leq));
    assert_eq!(seq.len(), 3);
    assert!(matches!(seq[0], RvInst::Binary { op: BinaryOp::Sub, .. }));
    assert!(matches!(seq[1], RvInst::Unary { op: UnaryOp::Sgtz, .. }));
    assert!(matches!(seq[2], RvInst::Unary { op: UnaryOp::Seqz, .. }));
}

#[test]
fn test_isel_geq_lowers_to_sub_sltz_seqz() {
    let seq = select_one(binary(BinaryOp::Geq));
    assert_eq!(seq.len(), 3);
    assert!(matches!(seq[0], RvInst::Binary { op: BinaryOp::Sub, .. }));
    assert!(matches!(seq[1], RvInst::Unary { op: UnaryOp::Sltz, .. }));
    assert!(matches!(seq[2], RvInst::Unary { op: UnaryOp::Seqz, .. }));
}

#[test]
fn test_isel_logic_or_normalizes_result() {
    let seq = select_one(binary(BinaryOp::Or));
    assert_eq!(seq.len(), 2);
    assert!(matches!(seq[0], RvInst::Binary { op: BinaryOp::Or, .. }));
    assert!(matches!(seq[1], RvInst::Unary { op: UnaryOp::Snez, .. }));
}

#[test]
fn test_isel_logic_and_masks_through_sign_extension() {
    let seq = select_one(binary(BinaryOp::And));
    assert_eq!(seq.len(), 4);
    assert!(matches!(seq[0], RvInst::Unary { op: UnaryOp::Snez, .. }));
    assert!(matches!(seq[1], RvInst::Binary { op: BinaryOp::Sub, .. }));
    assert!(matches!(seq[2], RvInst::Binary { op: BinaryOp::And, .. }));
    assert!(matches!(seq[3], RvInst::Unary { op: UnaryOp::Snez, .. }));
}

#[test]
fn test_isel_no_composite_comparison_survives() {
    for op in [BinaryOp::Equ, BinaryOp::Neq, BinaryOp::Leq, BinaryOp::Geq] {
        for inst in select_one(binary(op)) {
            if let RvInst::Binary { op, .. } = inst {
                assert!(
                    !matches!(
                        op,
                        BinaryOp::Equ | BinaryOp::Neq | BinaryOp::Leq | BinaryOp::Geq
                    ),
                    "composite comparison leaked through selection"
                );
            }
        }
    }
}

#[test]
fn test_isel_return_jumps_to_shared_epilogue() {
    let seq = select_one(TacInst::Return {
        value: Some(Temp::new(0)),
    });
    assert_eq!(seq.len(), 2);
    assert!(matches!(
        seq[0],
        RvInst::Mv {
            rd: Reg::P(rd),
            rs: Reg::V(v),
        } if rd == RET_REG && v == Temp::new(0)
    ));
    assert!(matches!(&seq[1], RvInst::JEpilogue { func } if *func == "f".into()));
}

#[test]
fn test_isel_void_return_zeroes_result() {
    let seq = select_one(TacInst::Return { value: None });
    assert_eq!(seq.len(), 2);
    assert!(matches!(
        seq[0],
        RvInst::Li { rd: Reg::P(rd), imm: 0 } if rd == RET_REG
    ));
    assert!(matches!(seq[1], RvInst::JEpilogue { .. }));
}

#[test]
fn test_isel_call_moves_result_out_of_ret_reg() {
    let seq = select_one(TacInst::Call {
        dst: Temp::new(3),
        callee: "g".into(),
    });
    assert_eq!(seq.len(), 2);
    assert!(matches!(&seq[0], RvInst::Call { callee } if *callee == "g".into()));
    assert!(matches!(
        seq[1],
        RvInst::Mv {
            rd: Reg::V(d),
            rs: Reg::P(rs),
        } if d == Temp::new(3) && rs == RET_REG
    ));
}

#[test]
fn test_isel_whole_function_order_is_preserved() {
    let mut f = TacFunc::new("f", 1);
    f.push(TacInst::LoadImm {
        dst: Temp::new(1),
        value: 7,
    });
    f.push(binary(BinaryOp::Slt));
    f.push(TacInst::Return {
        value: Some(Temp::new(2)),
    });

    let seq = InstrSelector::select_func(&f);
    assert_eq!(seq.len(), 4);
    assert!(matches!(seq[0], RvInst::Li { imm: 7, .. }));
    assert!(matches!(seq[1], RvInst::Binary { op: BinaryOp::Slt, .. }));
    assert!(matches!(seq[2], RvInst::Mv { .. }));
    assert!(matches!(seq[3], RvInst::JEpilogue { .. }));
}

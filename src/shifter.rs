//! 5-stage barrel shifter
//!
//! Shifts by 16, 8, 4, 2 and 1 under control of the five shift-amount bits,
//! each stage built from slice and concatenation only. SRA replicates the
//! sign bit sampled before the first stage. No host `<<` or `>>` appears in
//! the body.

use crate::bits::{self, Bit};

/// Shift operation selector, with the 2-bit control encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ShiftOp {
    #[default]
    Sll,
    Srl,
    Sra,
}

impl ShiftOp {
    pub fn code(self) -> [Bit; 2] {
        match self {
            ShiftOp::Sll => [0, 0],
            ShiftOp::Srl => [0, 1],
            ShiftOp::Sra => [1, 1],
        }
    }

    pub fn from_code(code: &[Bit]) -> Option<ShiftOp> {
        match code {
            [0, 0] => Some(ShiftOp::Sll),
            [0, 1] => Some(ShiftOp::Srl),
            [1, 1] => Some(ShiftOp::Sra),
            _ => None,
        }
    }
}

/// Shift a 32-bit vector by the amount given as a 5-bit vector. Callers
/// holding a wider amount mask it by slicing the low five bits first, per
/// the RV32 shift semantics.
pub fn shift(data: &[Bit], shamt: &[Bit], op: ShiftOp) -> Vec<Bit> {
    assert_eq!(data.len(), 32, "shifter: expected 32 data bits, got {}", data.len());
    assert_eq!(shamt.len(), 5, "shifter: expected 5 amount bits, got {}", shamt.len());

    let sign = data[0];
    let width = data.len();
    let mut current = data.to_vec();

    // shamt[0] drives the 16-bit stage down to shamt[4] driving the 1-bit
    // stage
    let stages = [16usize, 8, 4, 2, 1];
    for (bit, &amount) in shamt.iter().zip(&stages) {
        if *bit == 0 {
            continue;
        }
        current = match op {
            ShiftOp::Sll => {
                let kept = bits::slice(&current, amount, width);
                bits::concat(&[&kept, &bits::zeros(amount)])
            }
            ShiftOp::Srl => {
                let kept = bits::slice(&current, 0, width - amount);
                bits::concat(&[&bits::zeros(amount), &kept])
            }
            ShiftOp::Sra => {
                let kept = bits::slice(&current, 0, width - amount);
                let fill = vec![sign; amount];
                bits::concat(&[&fill, &kept])
            }
        };
    }

    current
}

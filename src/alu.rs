//! 32-bit ripple-carry ALU
//!
//! The adder is 32 one-bit full-adder cells chained LSB to MSB, each
//! computing sum and majority carry from boolean primitives. Subtraction is
//! addition with B inverted and carry-in 1. No host `+` or `-` touches the
//! data path below.

use crate::bits::{self, Bit};

/// ALU operation selector, with the 4-bit control encodings used on the
/// wire form of the control word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AluOp {
    And,
    Or,
    #[default]
    Add,
    Xor,
    Sub,
    Nor,
}

impl AluOp {
    /// 4-bit control encoding.
    pub fn code(self) -> [Bit; 4] {
        match self {
            AluOp::And => [0, 0, 0, 0],
            AluOp::Or => [0, 0, 0, 1],
            AluOp::Add => [0, 0, 1, 0],
            AluOp::Xor => [0, 0, 1, 1],
            AluOp::Sub => [0, 1, 1, 0],
            AluOp::Nor => [1, 1, 0, 0],
        }
    }

    pub fn from_code(code: &[Bit]) -> Option<AluOp> {
        match code {
            [0, 0, 0, 0] => Some(AluOp::And),
            [0, 0, 0, 1] => Some(AluOp::Or),
            [0, 0, 1, 0] => Some(AluOp::Add),
            [0, 0, 1, 1] => Some(AluOp::Xor),
            [0, 1, 1, 0] => Some(AluOp::Sub),
            [1, 1, 0, 0] => Some(AluOp::Nor),
            _ => None,
        }
    }
}

/// Condition flags produced with every result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AluFlags {
    /// MSB of the result.
    pub n: Bit,
    /// All result bits zero.
    pub z: Bit,
    /// Carry out of the MSB cell; for SUB this means "no borrow".
    pub c: Bit,
    /// Signed overflow.
    pub v: Bit,
}

fn majority(a: Bit, b: Bit, c: Bit) -> Bit {
    (a & b) | (a & c) | (b & c)
}

/// One full-adder cell: (sum, carry-out).
fn full_adder(a: Bit, b: Bit, cin: Bit) -> (Bit, Bit) {
    ((a ^ b) ^ cin, majority(a, b, cin))
}

/// Ripple-carry add of two equal-width vectors: (sum, carry-out of MSB).
fn ripple_add(a: &[Bit], b: &[Bit], carry_in: Bit) -> (Vec<Bit>, Bit) {
    assert_eq!(a.len(), b.len(), "alu: width mismatch {} != {}", a.len(), b.len());

    let width = a.len();
    let mut result = vec![0; width];
    let mut carry = carry_in;

    // LSB (index width-1) up to MSB (index 0)
    for i in (0..width).rev() {
        let (sum, cout) = full_adder(a[i], b[i], carry);
        result[i] = sum;
        carry = cout;
    }

    (result, carry)
}

fn flags_for(result: &[Bit], carry: Bit, v: Bit) -> AluFlags {
    AluFlags {
        n: result[0],
        z: if bits::is_zero(result) { 1 } else { 0 },
        c: carry,
        v,
    }
}

/// Execute one ALU operation on two equal-width vectors.
pub fn alu(a: &[Bit], b: &[Bit], op: AluOp) -> (Vec<Bit>, AluFlags) {
    assert_eq!(a.len(), b.len(), "alu: width mismatch {} != {}", a.len(), b.len());

    match op {
        AluOp::And => {
            let r = bits::bits_and(a, b);
            let f = flags_for(&r, 0, 0);
            (r, f)
        }
        AluOp::Or => {
            let r = bits::bits_or(a, b);
            let f = flags_for(&r, 0, 0);
            (r, f)
        }
        AluOp::Xor => {
            let r = bits::bits_xor(a, b);
            let f = flags_for(&r, 0, 0);
            (r, f)
        }
        AluOp::Nor => {
            let r = bits::bits_not(&bits::bits_or(a, b));
            let f = flags_for(&r, 0, 0);
            (r, f)
        }
        AluOp::Add => {
            let (r, cout) = ripple_add(a, b, 0);
            // Overflow: same operand signs, result sign differs
            let v = if a[0] == b[0] && r[0] != a[0] { 1 } else { 0 };
            let f = flags_for(&r, cout, v);
            (r, f)
        }
        AluOp::Sub => {
            let (r, cout) = ripple_add(a, &bits::bits_not(b), 1);
            // Overflow: operand signs differ, result sign differs from A
            let v = if a[0] != b[0] && r[0] != a[0] { 1 } else { 0 };
            let f = flags_for(&r, cout, v);
            (r, f)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{from_u32, to_u32};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn run(a: u32, b: u32, op: AluOp) -> (u32, AluFlags) {
        let (r, f) = alu(&from_u32(a, 32), &from_u32(b, 32), op);
        (to_u32(&r), f)
    }

    #[test]
    fn test_add_boundary_flags() {
        let (r, f) = run(0x7FFF_FFFF, 1, AluOp::Add);
        assert_eq!(r, 0x8000_0000);
        assert_eq!(f, AluFlags { n: 1, z: 0, c: 0, v: 1 });

        let (r, f) = run(0xFFFF_FFFF, 0xFFFF_FFFF, AluOp::Add);
        assert_eq!(r, 0xFFFF_FFFE);
        assert_eq!(f, AluFlags { n: 1, z: 0, c: 1, v: 0 });

        let (r, f) = run(13, (-13i32) as u32, AluOp::Add);
        assert_eq!(r, 0);
        assert_eq!(f, AluFlags { n: 0, z: 1, c: 1, v: 0 });
    }

    #[test]
    fn test_sub_boundary_flags() {
        let (r, f) = run(0x8000_0000, 1, AluOp::Sub);
        assert_eq!(r, 0x7FFF_FFFF);
        assert_eq!(f, AluFlags { n: 0, z: 0, c: 1, v: 1 });

        // Equal operands: zero result, no borrow
        let (r, f) = run(42, 42, AluOp::Sub);
        assert_eq!(r, 0);
        assert_eq!(f.z, 1);
        assert_eq!(f.c, 1);
    }

    #[test]
    fn test_logic_ops_clear_c_and_v() {
        let (r, f) = run(0xF0F0_F0F0, 0x0F0F_0F0F, AluOp::Or);
        assert_eq!(r, 0xFFFF_FFFF);
        assert_eq!(f, AluFlags { n: 1, z: 0, c: 0, v: 0 });

        let (r, f) = run(0xFFFF_FFFF, 0xFFFF_FFFF, AluOp::Nor);
        assert_eq!(r, 0);
        assert_eq!(f.z, 1);

        let (r, _) = run(0b1100, 0b1010, AluOp::Xor);
        assert_eq!(r, 0b0110);

        let (r, _) = run(0b1100, 0b1010, AluOp::And);
        assert_eq!(r, 0b1000);
    }

    #[test]
    fn test_add_then_sub_is_identity() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let a: u32 = rng.gen();
            let b: u32 = rng.gen();
            let (sum, _) = run(a, b, AluOp::Add);
            let (back, _) = run(sum, b, AluOp::Sub);
            assert_eq!(back, a);
        }
    }

    #[test]
    fn test_matches_wrapping_host_arithmetic() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let a: u32 = rng.gen();
            let b: u32 = rng.gen();
            assert_eq!(run(a, b, AluOp::Add).0, a.wrapping_add(b));
            assert_eq!(run(a, b, AluOp::Sub).0, a.wrapping_sub(b));
        }
    }

    #[test]
    fn test_op_codes_round_trip() {
        for op in [AluOp::And, AluOp::Or, AluOp::Add, AluOp::Xor, AluOp::Sub, AluOp::Nor] {
            assert_eq!(AluOp::from_code(&op.code()), Some(op));
        }
        assert_eq!(AluOp::from_code(&[1, 1, 1, 1]), None);
    }
}

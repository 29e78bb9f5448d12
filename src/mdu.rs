//! Multiply/divide unit (M extension)
//!
//! Multiplication is the 32-iteration shift-add algorithm over a 64-bit
//! accumulator that shifts right each step; division is 32 iterations of
//! restoring division over a left-shifted remainder:quotient pair. Signed
//! variants negate to magnitudes through the ALU up front and restore the
//! sign at the end. No host `*`, `/` or `%` appears in the bodies.

use crate::alu::{alu, AluOp};
use crate::bits::{self, Bit};
use crate::shifter::{shift, ShiftOp};

/// M-extension operation selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MdOp {
    Mul,
    Mulh,
    Mulhsu,
    Mulhu,
    Div,
    Divu,
    Rem,
    Remu,
}

/// One step of the shift-add multiplier.
#[derive(Clone, Debug)]
pub struct MulTrace {
    pub step: usize,
    /// Accumulator high half after the step.
    pub acc_hi: Vec<Bit>,
    /// Accumulator low half after the step (holds the remaining multiplier
    /// bits in its upper part as the product shifts in).
    pub acc_lo: Vec<Bit>,
    /// Multiplier bit examined this step.
    pub multiplier_bit: Bit,
    /// Whether the multiplicand was added.
    pub added: bool,
}

/// One step of the restoring divider.
#[derive(Clone, Debug)]
pub struct DivTrace {
    pub step: usize,
    pub remainder: Vec<Bit>,
    pub quotient: Vec<Bit>,
    /// True when the trial subtraction was committed.
    pub subtracted: bool,
}

/// Multiplication outcome: 64-bit product halves, selected result, the
/// MUL-only overflow flag, and the per-iteration trace.
#[derive(Clone, Debug)]
pub struct MulResult {
    pub result: Vec<Bit>,
    pub hi: Vec<Bit>,
    pub lo: Vec<Bit>,
    pub overflow: bool,
    pub trace: Vec<MulTrace>,
}

/// Division outcome with the INT_MIN / -1 grading flag and the
/// per-iteration trace.
#[derive(Clone, Debug)]
pub struct DivResult {
    pub quotient: Vec<Bit>,
    pub remainder: Vec<Bit>,
    pub overflow: bool,
    pub trace: Vec<DivTrace>,
}

/// Two's-complement negation: invert and add one through the ALU.
pub fn negate(value: &[Bit]) -> Vec<Bit> {
    let (r, _) = alu(&bits::bits_not(value), &bits::one(value.len()), AluOp::Add);
    r
}

fn one_bit_shamt() -> Vec<Bit> {
    vec![0, 0, 0, 0, 1]
}

/// Unsigned 32x32 -> 64 core loop shared by the multiply variants and the
/// FPU significand multiplier. Each step inspects the multiplier LSB held
/// in the accumulator's low half, conditionally adds the multiplicand into
/// the high half, then shifts the whole (carry:hi:lo) right by one.
pub fn multiply_unsigned(
    multiplicand: &[Bit],
    multiplier: &[Bit],
    trace: &mut Vec<MulTrace>,
) -> (Vec<Bit>, Vec<Bit>) {
    assert_eq!(multiplicand.len(), 32, "mdu: expected 32-bit multiplicand");
    assert_eq!(multiplier.len(), 32, "mdu: expected 32-bit multiplier");

    let mut acc_hi = bits::zeros(32);
    let mut acc_lo = multiplier.to_vec();
    let by_one = one_bit_shamt();

    for step in 0..32 {
        let multiplier_bit = acc_lo[31];
        let mut carry: Bit = 0;
        let added = multiplier_bit == 1;

        if added {
            let (sum, flags) = alu(&acc_hi, multiplicand, AluOp::Add);
            acc_hi = sum;
            carry = flags.c;
        }

        // Shift (carry : acc_hi : acc_lo) right by one
        let hi_out = acc_hi[31];
        acc_lo = shift(&acc_lo, &by_one, ShiftOp::Srl);
        acc_lo = bits::set_bit(&acc_lo, 0, hi_out);
        acc_hi = shift(&acc_hi, &by_one, ShiftOp::Srl);
        acc_hi = bits::set_bit(&acc_hi, 0, carry);

        trace.push(MulTrace {
            step,
            acc_hi: acc_hi.clone(),
            acc_lo: acc_lo.clone(),
            multiplier_bit,
            added,
        });
    }

    (acc_hi, acc_lo)
}

/// Negate a 64-bit value held as two 32-bit halves.
fn negate_pair(hi: &[Bit], lo: &[Bit]) -> (Vec<Bit>, Vec<Bit>) {
    let lo_inv = bits::bits_not(lo);
    let hi_inv = bits::bits_not(hi);
    let (new_lo, flags) = alu(&lo_inv, &bits::one(32), AluOp::Add);
    let new_hi = if flags.c == 1 {
        alu(&hi_inv, &bits::one(32), AluOp::Add).0
    } else {
        hi_inv
    };
    (new_hi, new_lo)
}

/// MUL / MULH / MULHSU / MULHU.
pub fn multiply(rs1: &[Bit], rs2: &[Bit], op: MdOp) -> MulResult {
    let (rs1_signed, rs2_signed) = match op {
        MdOp::Mul | MdOp::Mulh => (true, true),
        MdOp::Mulhsu => (true, false),
        MdOp::Mulhu => (false, false),
        _ => panic!("multiply: not a multiply op: {:?}", op),
    };

    let rs1_negative = rs1_signed && bits::is_negative(rs1);
    let rs2_negative = rs2_signed && bits::is_negative(rs2);

    let multiplicand = if rs1_negative { negate(rs1) } else { rs1.to_vec() };
    let multiplier = if rs2_negative { negate(rs2) } else { rs2.to_vec() };

    let mut trace = Vec::new();
    let (mut hi, mut lo) = multiply_unsigned(&multiplicand, &multiplier, &mut trace);

    if rs1_negative != rs2_negative {
        let (nh, nl) = negate_pair(&hi, &lo);
        hi = nh;
        lo = nl;
    }

    // MUL overflow: the high half is not the sign extension of the low half
    let expected_hi = vec![lo[0]; 32];
    let overflow = op == MdOp::Mul && hi != expected_hi;

    let result = match op {
        MdOp::Mul => lo.clone(),
        _ => hi.clone(),
    };

    MulResult { result, hi, lo, overflow, trace }
}

/// DIV / DIVU / REM / REMU with the RISC-V M edge cases.
pub fn divide(rs1: &[Bit], rs2: &[Bit], op: MdOp) -> DivResult {
    let signed_op = matches!(op, MdOp::Div | MdOp::Rem);
    assert!(
        matches!(op, MdOp::Div | MdOp::Divu | MdOp::Rem | MdOp::Remu),
        "divide: not a divide op: {:?}",
        op
    );

    // Divide by zero: quotient all-ones, remainder is the dividend
    if bits::is_zero(rs2) {
        return DivResult {
            quotient: bits::ones(32),
            remainder: rs1.to_vec(),
            overflow: false,
            trace: Vec::new(),
        };
    }

    // INT_MIN / -1: quotient wraps to INT_MIN, remainder zero
    if signed_op {
        let int_min = bits::concat(&[&[1], &bits::zeros(31)]);
        if rs1 == int_min.as_slice() && bits::is_zero(&bits::bits_not(rs2)) {
            return DivResult {
                quotient: int_min,
                remainder: bits::zeros(32),
                overflow: true,
                trace: Vec::new(),
            };
        }
    }

    let dividend_negative = signed_op && bits::is_negative(rs1);
    let divisor_negative = signed_op && bits::is_negative(rs2);

    let dividend = if dividend_negative { negate(rs1) } else { rs1.to_vec() };
    let divisor = if divisor_negative { negate(rs2) } else { rs2.to_vec() };

    let mut remainder = bits::zeros(32);
    let mut quotient = dividend;
    let by_one = one_bit_shamt();
    let mut trace = Vec::new();

    for step in 0..32 {
        // Shift (remainder : quotient) left by one
        let shifted_out = remainder[0];
        let quotient_msb = quotient[0];
        remainder = shift(&remainder, &by_one, ShiftOp::Sll);
        remainder = bits::set_bit(&remainder, 31, quotient_msb);
        quotient = shift(&quotient, &by_one, ShiftOp::Sll);

        // Trial subtraction; commit on no-borrow, or unconditionally when a
        // bit left the remainder (the 33-bit value always exceeds the
        // divisor then)
        let (diff, flags) = alu(&remainder, &divisor, AluOp::Sub);
        let subtracted = shifted_out == 1 || flags.c == 1;
        if subtracted {
            remainder = diff;
            quotient = bits::set_bit(&quotient, 31, 1);
        }

        trace.push(DivTrace {
            step,
            remainder: remainder.clone(),
            quotient: quotient.clone(),
            subtracted,
        });
    }

    // Sign correction: quotient by XOR of operand signs, remainder by the
    // dividend's sign
    if dividend_negative != divisor_negative && !bits::is_zero(&quotient) {
        quotient = negate(&quotient);
    }
    if dividend_negative && !bits::is_zero(&remainder) {
        remainder = negate(&remainder);
    }

    DivResult { quotient, remainder, overflow: false, trace }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{from_u32, to_u32};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn mul(a: u32, b: u32, op: MdOp) -> MulResult {
        multiply(&from_u32(a, 32), &from_u32(b, 32), op)
    }

    fn div(a: u32, b: u32, op: MdOp) -> DivResult {
        divide(&from_u32(a, 32), &from_u32(b, 32), op)
    }

    #[test]
    fn test_mul_spec_vector() {
        let r = mul(12345678, (-87654321i32) as u32, MdOp::Mul);
        assert_eq!(to_u32(&r.result), 0xD91D_0712);
        assert!(r.overflow);

        let r = mul(12345678, (-87654321i32) as u32, MdOp::Mulh);
        assert_eq!(to_u32(&r.result), 0xFFFC_27C9);
    }

    #[test]
    fn test_mul_small_values() {
        let r = mul(6, 7, MdOp::Mul);
        assert_eq!(to_u32(&r.result), 42);
        assert!(!r.overflow);
        assert_eq!(r.trace.len(), 32);

        let r = mul((-6i32) as u32, 7, MdOp::Mul);
        assert_eq!(to_u32(&r.result) as i32, -42);
        assert!(!r.overflow);
    }

    #[test]
    fn test_mulh_variants() {
        let a = 0x8000_0000u32;
        let b = 0xFFFF_FFFFu32;

        // signed x signed: (-2^31) * (-1) = 2^31
        let r = mul(a, b, MdOp::Mulh);
        assert_eq!(to_u32(&r.result), 0);

        // unsigned x unsigned
        let r = mul(a, b, MdOp::Mulhu);
        let expect = ((a as u64 * b as u64) >> 32) as u32;
        assert_eq!(to_u32(&r.result), expect);

        // signed x unsigned: (-2^31) * (2^32 - 1)
        let r = mul(a, b, MdOp::Mulhsu);
        let expect = (((a as i32 as i64) * (b as u64 as i64)) >> 32) as u32;
        assert_eq!(to_u32(&r.result), expect);
    }

    #[test]
    fn test_mul_matches_host_products() {
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..100 {
            let a: u32 = rng.gen();
            let b: u32 = rng.gen();

            let signed = (a as i32 as i64) * (b as i32 as i64);
            let unsigned = (a as u64) * (b as u64);

            assert_eq!(to_u32(&mul(a, b, MdOp::Mul).result), signed as u32);
            assert_eq!(to_u32(&mul(a, b, MdOp::Mulh).result), (signed >> 32) as u32);
            assert_eq!(to_u32(&mul(a, b, MdOp::Mulhu).result), (unsigned >> 32) as u32);

            let mixed = (a as i32 as i64).wrapping_mul(b as i64);
            assert_eq!(to_u32(&mul(a, b, MdOp::Mulhsu).result), (mixed >> 32) as u32);
        }
    }

    #[test]
    fn test_div_spec_vectors() {
        let r = div((-7i32) as u32, 3, MdOp::Div);
        assert_eq!(to_u32(&r.quotient) as i32, -2);
        assert_eq!(to_u32(&r.remainder) as i32, -1);

        let r = div(0x8000_0000, 3, MdOp::Divu);
        assert_eq!(to_u32(&r.quotient), 0x2AAA_AAAA);
        assert_eq!(to_u32(&r.remainder), 2);
    }

    #[test]
    fn test_divide_by_zero() {
        for op in [MdOp::Div, MdOp::Divu] {
            let r = div(100, 0, op);
            assert_eq!(to_u32(&r.quotient), 0xFFFF_FFFF);
            assert_eq!(to_u32(&r.remainder), 100);
            assert!(!r.overflow);
        }
    }

    #[test]
    fn test_int_min_over_minus_one() {
        let r = div(0x8000_0000, 0xFFFF_FFFF, MdOp::Div);
        assert_eq!(to_u32(&r.quotient), 0x8000_0000);
        assert_eq!(to_u32(&r.remainder), 0);
        assert!(r.overflow);
    }

    #[test]
    fn test_large_unsigned_divisor() {
        // Exercises the 33rd-bit commit path: divisor has its MSB set
        let r = div(0xFFFF_FFFF, 0x8000_0001, MdOp::Divu);
        assert_eq!(to_u32(&r.quotient), 0xFFFF_FFFFu32 / 0x8000_0001);
        assert_eq!(to_u32(&r.remainder), 0xFFFF_FFFFu32 % 0x8000_0001);
    }

    #[test]
    fn test_reconstruction_property() {
        // Q * B + R = A, computed through the unit itself
        let mut rng = StdRng::seed_from_u64(33);
        for _ in 0..100 {
            let a: u32 = rng.gen();
            let b: u32 = rng.gen::<u32>() | 1; // nonzero

            let q = div(a, b, MdOp::Div);
            let back = mul(to_u32(&q.quotient), b, MdOp::Mul);
            let (sum, _) = crate::alu::alu(&back.result, &q.remainder, AluOp::Add);
            assert_eq!(to_u32(&sum), a);

            // |R| < |B|
            let r_mag = (to_u32(&q.remainder) as i32).unsigned_abs();
            let b_mag = (b as i32).unsigned_abs();
            assert!(r_mag < b_mag);
        }
    }

    #[test]
    fn test_matches_host_division() {
        let mut rng = StdRng::seed_from_u64(44);
        for _ in 0..100 {
            let a: u32 = rng.gen();
            let b: u32 = rng.gen::<u32>().max(1);

            assert_eq!(to_u32(&div(a, b, MdOp::Divu).quotient), a / b);
            assert_eq!(to_u32(&div(a, b, MdOp::Remu).remainder), a % b);

            let (sa, sb) = (a as i32, b as i32);
            if !(sa == i32::MIN && sb == -1) && sb != 0 {
                assert_eq!(to_u32(&div(a, b, MdOp::Div).quotient) as i32, sa.wrapping_div(sb));
                assert_eq!(to_u32(&div(a, b, MdOp::Rem).remainder) as i32, sa.wrapping_rem(sb));
            }
        }
    }

    #[test]
    fn test_divider_trace_shape() {
        let r = div(100, 7, MdOp::Divu);
        assert_eq!(r.trace.len(), 32);
        assert_eq!(to_u32(&r.trace[31].quotient), 100 / 7);
        assert_eq!(to_u32(&r.trace[31].remainder), 100 % 7);
    }
}

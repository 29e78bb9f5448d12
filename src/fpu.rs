//! IEEE-754 single-precision floating-point unit (F extension)
//!
//! FADD.S, FSUB.S and FMUL.S built entirely from the bit-vector ALU,
//! shifter and multiplier loop. Operands move through unpack ->
//! special-value screening -> align -> operate -> normalize -> round ->
//! repack. Three extension bits (guard, round, sticky) ride below the
//! 24-bit significand; bits lost to right shifts are jammed into the sticky
//! position so round-to-nearest-even stays exact. No host floating-point
//! arithmetic appears in the bodies.

use crate::alu::{alu, AluOp};
use crate::bits::{self, Bit};
use crate::mdu::multiply_unsigned;
use crate::shifter::{shift, ShiftOp};

pub const EXP_WIDTH: usize = 8;
pub const FRAC_WIDTH: usize = 23;

/// Significand grid inside a 32-bit working vector: four headroom bits, a
/// carry slot at index 4, the hidden bit at HIDDEN, 23 fraction bits, then
/// guard/round/sticky at the bottom.
const CARRY: usize = 4;
const HIDDEN: usize = 5;
const GUARD: usize = 29;
const ROUND: usize = 30;
const STICKY: usize = 31;

/// Operand classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FpClass {
    Zero,
    Subnormal,
    Normal,
    Infinity,
    Nan,
}

/// IEEE-754 exception flags, NV/DZ/OF/UF/NX in FCSR order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FpFlags {
    pub nv: Bit,
    pub dz: Bit,
    pub of: Bit,
    pub uf: Bit,
    pub nx: Bit,
}

impl FpFlags {
    /// The 5-bit FCSR flag field, MSB-first NV..NX.
    pub fn to_bits(self) -> [Bit; 5] {
        [self.nv, self.dz, self.of, self.uf, self.nx]
    }
}

/// Rounding mode from the FCSR frm field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoundingMode {
    #[default]
    Rne,
    Rtz,
    Rdn,
    Rup,
    Rmm,
}

impl RoundingMode {
    /// Decode the 3-bit frm field; reserved encodings fall back to RNE.
    pub fn from_bits(frm: &[Bit]) -> RoundingMode {
        match frm {
            [0, 0, 0] => RoundingMode::Rne,
            [0, 0, 1] => RoundingMode::Rtz,
            [0, 1, 0] => RoundingMode::Rdn,
            [0, 1, 1] => RoundingMode::Rup,
            [1, 0, 0] => RoundingMode::Rmm,
            _ => RoundingMode::Rne,
        }
    }
}

/// Unpacked operand.
#[derive(Clone, Debug)]
pub struct Unpacked {
    pub sign: Bit,
    /// Stored 8-bit biased exponent.
    pub exp: Vec<Bit>,
    /// Stored 23-bit fraction.
    pub frac: Vec<Bit>,
    pub class: FpClass,
}

/// Result of one FPU operation.
#[derive(Clone, Debug)]
pub struct FpResult {
    pub result: Vec<Bit>,
    pub flags: FpFlags,
    pub trace: Vec<String>,
}

/// Split a 32-bit vector into sign, exponent and fraction fields and
/// classify it.
pub fn unpack(value: &[Bit]) -> Unpacked {
    assert_eq!(value.len(), 32, "fpu: expected 32 bits, got {}", value.len());

    let sign = value[0];
    let exp = bits::slice(value, 1, 9);
    let frac = bits::slice(value, 9, 32);

    let exp_zero = bits::is_zero(&exp);
    let exp_max = bits::is_zero(&bits::bits_not(&exp));
    let frac_zero = bits::is_zero(&frac);

    let class = match (exp_zero, exp_max, frac_zero) {
        (true, _, true) => FpClass::Zero,
        (true, _, false) => FpClass::Subnormal,
        (_, true, true) => FpClass::Infinity,
        (_, true, false) => FpClass::Nan,
        _ => FpClass::Normal,
    };

    Unpacked { sign, exp, frac, class }
}

/// Reassemble sign, stored exponent and fraction fields.
pub fn pack(sign: Bit, exp: &[Bit], frac: &[Bit]) -> Vec<Bit> {
    assert_eq!(exp.len(), EXP_WIDTH, "fpu: exponent must be {} bits", EXP_WIDTH);
    assert_eq!(frac.len(), FRAC_WIDTH, "fpu: fraction must be {} bits", FRAC_WIDTH);
    bits::concat(&[&[sign], exp, frac])
}

fn quiet_nan() -> Vec<Bit> {
    pack(0, &bits::ones(EXP_WIDTH), &bits::concat(&[&[1], &bits::zeros(22)]))
}

fn infinity(sign: Bit) -> Vec<Bit> {
    pack(sign, &bits::ones(EXP_WIDTH), &bits::zeros(FRAC_WIDTH))
}

fn signed_zero(sign: Bit) -> Vec<Bit> {
    pack(sign, &bits::zeros(EXP_WIDTH), &bits::zeros(FRAC_WIDTH))
}

/// A NaN without its fraction MSB set is treated as signaling.
fn is_signaling(op: &Unpacked) -> bool {
    op.class == FpClass::Nan && op.frac[0] == 0
}

/// Working biased exponent as a 32-bit vector: the stored exponent, except
/// subnormals carry the same weight as exponent 1.
fn working_exp(op: &Unpacked) -> Vec<Bit> {
    if op.class == FpClass::Subnormal {
        bits::one(32)
    } else {
        bits::zero_extend(&op.exp, 32)
    }
}

/// Significand on the working grid: headroom, hidden bit (normals only),
/// fraction, zeroed guard/round/sticky.
fn working_sig(op: &Unpacked) -> Vec<Bit> {
    let hidden: Bit = if op.class == FpClass::Normal { 1 } else { 0 };
    bits::concat(&[&bits::zeros(HIDDEN), &[hidden], &op.frac, &bits::zeros(3)])
}

/// Unsigned >= via the subtraction borrow.
fn ge_unsigned(a: &[Bit], b: &[Bit]) -> bool {
    alu(a, b, AluOp::Sub).1.c == 1
}

/// Shift right, ORing every lost bit into the sticky (lowest) position.
fn shift_right_jam(sig: &[Bit], amount: &[Bit]) -> Vec<Bit> {
    assert_eq!(amount.len(), 32, "fpu: shift amount must be a 32-bit vector");

    if bits::is_zero(amount) {
        return sig.to_vec();
    }

    // Amounts of 32 or more drain the whole grid into the sticky bit
    if !bits::is_zero(&bits::slice(amount, 0, 27)) {
        let mut out = bits::zeros(32);
        if !bits::is_zero(sig) {
            out[STICKY] = 1;
        }
        return out;
    }

    let shamt = bits::slice(amount, 27, 32);
    let shifted = shift(sig, &shamt, ShiftOp::Srl);
    let back = shift(&shifted, &shamt, ShiftOp::Sll);
    if back != sig {
        bits::set_bit(&shifted, STICKY, shifted[STICKY] | 1)
    } else {
        shifted
    }
}

fn exp_add_one(exp: &[Bit]) -> Vec<Bit> {
    alu(exp, &bits::one(32), AluOp::Add).0
}

fn exp_sub_one(exp: &[Bit]) -> Vec<Bit> {
    alu(exp, &bits::one(32), AluOp::Sub).0
}

/// Round the normalized grid and pack the final bit pattern.
///
/// Preconditions: `sig` is a working grid with the carry slot clear and
/// either the hidden bit set (normal) or `exp` == 1 (subnormal range);
/// `exp` is the working biased exponent, >= 1.
fn round_and_pack(
    sign: Bit,
    exp: &[Bit],
    sig: &[Bit],
    rm: RoundingMode,
    trace: &mut Vec<String>,
) -> (Vec<Bit>, FpFlags) {
    let mut flags = FpFlags::default();

    let g = sig[GUARD];
    let r = sig[ROUND];
    let t = sig[STICKY];
    let lsb = sig[GUARD - 1];

    let discarded = g | r | t;
    if discarded == 1 {
        flags.nx = 1;
    }

    let round_up = match rm {
        RoundingMode::Rne => g == 1 && (r == 1 || t == 1 || lsb == 1),
        RoundingMode::Rtz => false,
        RoundingMode::Rdn => sign == 1 && discarded == 1,
        RoundingMode::Rup => sign == 0 && discarded == 1,
        RoundingMode::Rmm => g == 1,
    };

    // 24-bit significand zero-extended so a rounding carry has room
    let mut sig24 = bits::zero_extend(&bits::slice(sig, HIDDEN, GUARD), 32);
    let mut exp = exp.to_vec();

    if round_up {
        sig24 = alu(&sig24, &bits::one(32), AluOp::Add).0;
        trace.push("round: incremented significand".to_string());
        // Carry out of the hidden position: 2^24 -> shift back down
        if sig24[7] == 1 {
            sig24 = shift(&sig24, &[0, 0, 0, 0, 1], ShiftOp::Srl);
            exp = exp_add_one(&exp);
        }
    }

    // Overflow to signed infinity once the exponent leaves the normal range
    let max_exp = bits::zero_extend(&bits::ones(EXP_WIDTH), 32);
    if ge_unsigned(&exp, &max_exp) {
        flags.of = 1;
        flags.nx = 1;
        trace.push("round: exponent overflow, result is infinity".to_string());
        return (infinity(sign), flags);
    }

    let hidden = sig24[8];
    let frac = bits::slice(&sig24, 9, 32);

    if hidden == 0 {
        // Below the minimum normal: subnormal encoding, or zero when the
        // fraction drained completely
        if flags.nx == 1 {
            flags.uf = 1;
        }
        let packed = pack(sign, &bits::zeros(EXP_WIDTH), &frac);
        trace.push("round: tiny result packed as subnormal/zero".to_string());
        return (packed, flags);
    }

    let stored_exp = bits::slice(&exp, 24, 32);
    (pack(sign, &stored_exp, &frac), flags)
}

/// Sign of an exact-zero sum: positive except when rounding down.
fn zero_sum_sign(rm: RoundingMode) -> Bit {
    if rm == RoundingMode::Rdn {
        1
    } else {
        0
    }
}

/// IEEE-754 single-precision addition.
pub fn fadd(a_bits: &[Bit], b_bits: &[Bit], rm: RoundingMode) -> FpResult {
    let mut trace = Vec::new();
    let mut flags = FpFlags::default();

    let a = unpack(a_bits);
    let b = unpack(b_bits);
    trace.push(format!("unpack: A class {:?}, B class {:?}", a.class, b.class));

    // Special values before any numeric work
    if a.class == FpClass::Nan || b.class == FpClass::Nan {
        if is_signaling(&a) || is_signaling(&b) {
            flags.nv = 1;
        }
        trace.push("special: NaN operand, quiet NaN result".to_string());
        return FpResult { result: quiet_nan(), flags, trace };
    }

    if a.class == FpClass::Infinity && b.class == FpClass::Infinity {
        if a.sign != b.sign {
            flags.nv = 1;
            trace.push("special: opposing infinities, invalid".to_string());
            return FpResult { result: quiet_nan(), flags, trace };
        }
        return FpResult { result: infinity(a.sign), flags, trace };
    }
    if a.class == FpClass::Infinity {
        return FpResult { result: a_bits.to_vec(), flags, trace };
    }
    if b.class == FpClass::Infinity {
        return FpResult { result: b_bits.to_vec(), flags, trace };
    }

    if a.class == FpClass::Zero && b.class == FpClass::Zero {
        let sign = if a.sign == b.sign { a.sign } else { zero_sum_sign(rm) };
        return FpResult { result: signed_zero(sign), flags, trace };
    }
    if a.class == FpClass::Zero {
        return FpResult { result: b_bits.to_vec(), flags, trace };
    }
    if b.class == FpClass::Zero {
        return FpResult { result: a_bits.to_vec(), flags, trace };
    }

    // Align: shift the smaller-exponent operand right by the difference
    let exp_a = working_exp(&a);
    let exp_b = working_exp(&b);
    let sig_a = working_sig(&a);
    let sig_b = working_sig(&b);

    let (exp, sign_big, sig_big, sign_small, sig_small) = if ge_unsigned(&exp_a, &exp_b) {
        let (diff, _) = alu(&exp_a, &exp_b, AluOp::Sub);
        let aligned = shift_right_jam(&sig_b, &diff);
        trace.push(format!("align: B shifted right by 0x{}", bits::to_hex(&diff)));
        (exp_a, a.sign, sig_a, b.sign, aligned)
    } else {
        let (diff, _) = alu(&exp_b, &exp_a, AluOp::Sub);
        let aligned = shift_right_jam(&sig_a, &diff);
        trace.push(format!("align: A shifted right by 0x{}", bits::to_hex(&diff)));
        (exp_b, b.sign, sig_b, a.sign, aligned)
    };

    // Operate on the aligned significands
    let (mut sig, sign) = if sign_big == sign_small {
        let (sum, _) = alu(&sig_big, &sig_small, AluOp::Add);
        (sum, sign_big)
    } else {
        // Effective subtraction: larger magnitude first
        if ge_unsigned(&sig_big, &sig_small) {
            let (diff, _) = alu(&sig_big, &sig_small, AluOp::Sub);
            (diff, sign_big)
        } else {
            let (diff, _) = alu(&sig_small, &sig_big, AluOp::Sub);
            (diff, sign_small)
        }
    };
    let mut exp = exp;
    trace.push(format!("operate: significand 0x{}", bits::to_hex(&sig)));

    if bits::is_zero(&sig) {
        // Exact cancellation
        return FpResult { result: signed_zero(zero_sum_sign(rm)), flags, trace };
    }

    // Normalize: one jammed right shift after carry, or left shifts after
    // cancellation until the hidden bit returns or the exponent bottoms out
    if sig[CARRY] == 1 {
        let t = sig[STICKY];
        sig = shift(&sig, &[0, 0, 0, 0, 1], ShiftOp::Srl);
        sig = bits::set_bit(&sig, STICKY, sig[STICKY] | t);
        exp = exp_add_one(&exp);
        trace.push("normalize: carry, shifted right one".to_string());
    } else {
        while sig[HIDDEN] == 0 && {
            let (_, f) = alu(&exp, &bits::one(32), AluOp::Sub);
            f.c == 1 && f.z == 0
        } {
            sig = shift(&sig, &[0, 0, 0, 0, 1], ShiftOp::Sll);
            exp = exp_sub_one(&exp);
        }
    }

    let (result, round_flags) = round_and_pack(sign, &exp, &sig, rm, &mut trace);
    flags.nv |= round_flags.nv;
    flags.of |= round_flags.of;
    flags.uf |= round_flags.uf;
    flags.nx |= round_flags.nx;

    FpResult { result, flags, trace }
}

/// IEEE-754 single-precision subtraction: addition with B's sign flipped.
pub fn fsub(a_bits: &[Bit], b_bits: &[Bit], rm: RoundingMode) -> FpResult {
    let negated = bits::set_bit(b_bits, 0, 1 ^ b_bits[0]);
    let mut out = fadd(a_bits, &negated, rm);
    out.trace.insert(0, "fsub: negated B, performing addition".to_string());
    out
}

/// IEEE-754 single-precision multiplication.
pub fn fmul(a_bits: &[Bit], b_bits: &[Bit], rm: RoundingMode) -> FpResult {
    let mut trace = Vec::new();
    let mut flags = FpFlags::default();

    let a = unpack(a_bits);
    let b = unpack(b_bits);
    trace.push(format!("unpack: A class {:?}, B class {:?}", a.class, b.class));

    let sign = a.sign ^ b.sign;

    if a.class == FpClass::Nan || b.class == FpClass::Nan {
        if is_signaling(&a) || is_signaling(&b) {
            flags.nv = 1;
        }
        trace.push("special: NaN operand, quiet NaN result".to_string());
        return FpResult { result: quiet_nan(), flags, trace };
    }

    let zero_times_inf = (a.class == FpClass::Zero && b.class == FpClass::Infinity)
        || (a.class == FpClass::Infinity && b.class == FpClass::Zero);
    if zero_times_inf {
        flags.nv = 1;
        trace.push("special: zero times infinity, invalid".to_string());
        return FpResult { result: quiet_nan(), flags, trace };
    }

    if a.class == FpClass::Infinity || b.class == FpClass::Infinity {
        return FpResult { result: infinity(sign), flags, trace };
    }
    if a.class == FpClass::Zero || b.class == FpClass::Zero {
        return FpResult { result: signed_zero(sign), flags, trace };
    }

    // Exponent: Ea + Eb - bias, kept signed in 32 bits
    let bias = bits::zero_extend(&[0, 1, 1, 1, 1, 1, 1, 1], 32);
    let (exp_sum, _) = alu(&working_exp(&a), &working_exp(&b), AluOp::Add);
    let (mut exp, _) = alu(&exp_sum, &bias, AluOp::Sub);

    // 24x24 significand product through the shift-add multiplier
    let sig_a = {
        let hidden: Bit = if a.class == FpClass::Normal { 1 } else { 0 };
        bits::zero_extend(&bits::concat(&[&[hidden], &a.frac]), 32)
    };
    let sig_b = {
        let hidden: Bit = if b.class == FpClass::Normal { 1 } else { 0 };
        bits::zero_extend(&bits::concat(&[&[hidden], &b.frac]), 32)
    };
    let mut mul_trace = Vec::new();
    let (hi, lo) = multiply_unsigned(&sig_a, &sig_b, &mut mul_trace);
    let mut product = bits::concat(&[&bits::slice(&hi, 16, 32), &lo]);
    trace.push(format!("operate: 48-bit product 0x{}", bits::to_hex(&product)));

    // Normalize the product: weight 2^47 set means the value is in [2, 4)
    if product[0] == 1 {
        exp = exp_add_one(&exp);
    } else {
        // Subnormal inputs can leave leading zeros; shift up to the 2^46
        // position, letting the exponent go negative for now
        while product[1] == 0 && !bits::is_zero(&product) {
            product = bits::concat(&[&bits::slice(&product, 1, 48), &[0]]);
            exp = exp_sub_one(&exp);
        }
        product = bits::concat(&[&bits::slice(&product, 1, 48), &[0]]);
    }

    // Fold the product's top 27 bits onto the working grid, jamming the
    // tail into sticky
    let tail = bits::slice(&product, 26, 48);
    let sticky: Bit = if bits::is_zero(&tail) { 0 } else { 1 };
    let head = bits::slice(&product, 0, 26);
    let mut sig = bits::concat(&[&bits::zeros(HIDDEN), &head, &[sticky]]);

    // A negative or zero working exponent means a subnormal result: shift
    // the grid right by (1 - exp) and clamp the exponent to 1
    let one_exp = bits::one(32);
    if bits::is_negative(&exp) || !ge_unsigned(&exp, &one_exp) {
        let (denorm, _) = alu(&one_exp, &exp, AluOp::Sub);
        sig = shift_right_jam(&sig, &denorm);
        exp = one_exp;
        trace.push("normalize: denormalized tiny product".to_string());
    }

    let (result, round_flags) = round_and_pack(sign, &exp, &sig, rm, &mut trace);
    flags.nv |= round_flags.nv;
    flags.of |= round_flags.of;
    flags.uf |= round_flags.uf;
    flags.nx |= round_flags.nx;

    FpResult { result, flags, trace }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{from_u32, to_u32};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn add(a: u32, b: u32) -> (u32, FpFlags) {
        let r = fadd(&from_u32(a, 32), &from_u32(b, 32), RoundingMode::Rne);
        (to_u32(&r.result), r.flags)
    }

    fn mul(a: u32, b: u32) -> (u32, FpFlags) {
        let r = fmul(&from_u32(a, 32), &from_u32(b, 32), RoundingMode::Rne);
        (to_u32(&r.result), r.flags)
    }

    fn sub(a: u32, b: u32) -> (u32, FpFlags) {
        let r = fsub(&from_u32(a, 32), &from_u32(b, 32), RoundingMode::Rne);
        (to_u32(&r.result), r.flags)
    }

    #[test]
    fn test_classification() {
        assert_eq!(unpack(&from_u32(0x0000_0000, 32)).class, FpClass::Zero);
        assert_eq!(unpack(&from_u32(0x8000_0000, 32)).class, FpClass::Zero);
        assert_eq!(unpack(&from_u32(0x0000_0001, 32)).class, FpClass::Subnormal);
        assert_eq!(unpack(&from_u32(0x3F80_0000, 32)).class, FpClass::Normal);
        assert_eq!(unpack(&from_u32(0x7F80_0000, 32)).class, FpClass::Infinity);
        assert_eq!(unpack(&from_u32(0x7FC0_0000, 32)).class, FpClass::Nan);
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        for v in [0x3F80_0000u32, 0x4070_0000, 0x8000_0001, 0x7F7F_FFFF, 0x0080_0000] {
            let u = unpack(&from_u32(v, 32));
            assert_eq!(to_u32(&pack(u.sign, &u.exp, &u.frac)), v);
        }
    }

    #[test]
    fn test_add_spec_vectors() {
        // 1.5 + 2.25 = 3.75
        let (r, f) = add(0x3FC0_0000, 0x4010_0000);
        assert_eq!(r, 0x4070_0000);
        assert_eq!(f.nx, 0);

        // 0.1 + 0.2, ties to even
        let (r, f) = add(0x3DCC_CCCD, 0x3E4C_CCCD);
        assert_eq!(r, 0x3E99_999A);
        assert_eq!(f.nx, 1);

        // 1.0 + 2.0 = 3.0
        let (r, _) = add(0x3F80_0000, 0x4000_0000);
        assert_eq!(r, 0x4040_0000);
    }

    #[test]
    fn test_mul_overflow_to_infinity() {
        // 1e38 * 10 overflows
        let e38 = f32::to_bits(1e38);
        let ten = f32::to_bits(10.0);
        let (r, f) = mul(e38, ten);
        assert_eq!(r, 0x7F80_0000);
        assert_eq!(f.of, 1);
        assert_eq!(f.nx, 1);
    }

    #[test]
    fn test_special_values() {
        let inf = 0x7F80_0000u32;
        let neg_inf = 0xFF80_0000u32;
        let qnan = 0x7FC0_0000u32;

        // inf - inf is invalid
        let (r, f) = add(inf, neg_inf);
        assert_eq!(r, qnan);
        assert_eq!(f.nv, 1);

        // inf + finite stays inf
        let (r, f) = add(inf, 0x3F80_0000);
        assert_eq!(r, inf);
        assert_eq!(f.nv, 0);

        // 0 * inf is invalid
        let (r, f) = mul(0, inf);
        assert_eq!(r, qnan);
        assert_eq!(f.nv, 1);

        // quiet NaN propagates without invalid
        let (r, f) = add(qnan, 0x3F80_0000);
        assert_eq!(r, qnan);
        assert_eq!(f.nv, 0);

        // signaling-style NaN raises invalid
        let snan = 0x7F80_0001u32;
        let (r, f) = add(snan, 0x3F80_0000);
        assert_eq!(r, qnan);
        assert_eq!(f.nv, 1);
    }

    #[test]
    fn test_signed_zero_rules() {
        let pz = 0x0000_0000u32;
        let nz = 0x8000_0000u32;

        assert_eq!(add(pz, pz).0, pz);
        assert_eq!(add(nz, nz).0, nz);
        assert_eq!(add(pz, nz).0, pz);

        // x + (-x) is exactly +0 under RNE
        let one = 0x3F80_0000u32;
        assert_eq!(sub(one, one).0, pz);
    }

    #[test]
    fn test_cancellation() {
        // 1.0000001... - 1.0 exercises the big left-shift normalize
        let a = f32::to_bits(1.0000001);
        let b = f32::to_bits(1.0);
        let (r, _) = sub(a, b);
        assert_eq!(f32::from_bits(r), 1.0000001f32 - 1.0f32);
    }

    #[test]
    fn test_add_matches_host_float() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..300 {
            let a = f32::from_bits(rng.gen::<u32>() & 0x7FFF_FFFF);
            let b = f32::from_bits(rng.gen::<u32>());
            if !a.is_finite() || !b.is_finite() {
                continue;
            }
            let expect = a + b;
            let (r, _) = add(a.to_bits(), b.to_bits());
            assert_eq!(
                r,
                expect.to_bits(),
                "fadd {a:?} + {b:?}: got {:08X}, want {:08X}",
                r,
                expect.to_bits()
            );
        }
    }

    #[test]
    fn test_mul_matches_host_float() {
        let mut rng = StdRng::seed_from_u64(123);
        for _ in 0..300 {
            let a = f32::from_bits(rng.gen::<u32>());
            let b = f32::from_bits(rng.gen::<u32>());
            if !a.is_finite() || !b.is_finite() {
                continue;
            }
            let expect = a * b;
            if expect.is_nan() {
                continue;
            }
            let (r, _) = mul(a.to_bits(), b.to_bits());
            assert_eq!(
                r,
                expect.to_bits(),
                "fmul {a:?} * {b:?}: got {:08X}, want {:08X}",
                r,
                expect.to_bits()
            );
        }
    }

    #[test]
    fn test_subnormal_results() {
        // Smallest normal times a half: subnormal, underflow
        let min_normal = 0x0080_0000u32; // 2^-126
        let half = 0x3F00_0000u32;
        let (r, f) = mul(min_normal, half);
        assert_eq!(r, 0x0040_0000);
        // Exact halving of the smallest normal is not inexact
        assert_eq!(f.nx, 0);
        assert_eq!(f.uf, 0);

        // Subnormal + subnormal stays exact
        let (r, f) = add(0x0000_0001, 0x0000_0001);
        assert_eq!(r, 0x0000_0002);
        assert_eq!(f.nx, 0);
    }

    #[test]
    fn test_directed_rounding_modes() {
        let a = from_u32(0x3DCC_CCCD, 32); // 0.1
        let b = from_u32(0x3E4C_CCCD, 32); // 0.2

        let rne = to_u32(&fadd(&a, &b, RoundingMode::Rne).result);
        let rtz = to_u32(&fadd(&a, &b, RoundingMode::Rtz).result);
        let rup = to_u32(&fadd(&a, &b, RoundingMode::Rup).result);
        let rdn = to_u32(&fadd(&a, &b, RoundingMode::Rdn).result);

        assert_eq!(rne, 0x3E99_999A);
        assert_eq!(rtz, 0x3E99_9999);
        assert_eq!(rup, 0x3E99_999A);
        assert_eq!(rdn, 0x3E99_9999);
    }
}

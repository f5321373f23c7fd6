//! ALU operations and flag lookup tables for the Z80.
//!
//! Tables are computed by `const fn` and live in read-only statics, so they
//! exist exactly once and never change. Arithmetic (ADD/ADC/SUB/SBC/CP and
//! the 16-bit forms) is closed-form.

#![allow(clippy::verbose_bit_mask)] // Clearer to read mask comparisons.

use crate::flags::{CF, HF, NF, PF, SF, XF, XY, YF, ZF, sz53, sz53p};

/// Result of an ALU operation with flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub flags: u8,
}

// =========================================================================
// Lookup tables
// =========================================================================

/// Flags after 8-bit INC, indexed by the old value. Carry is left clear.
pub(crate) static INC_FLAGS: [u8; 256] = inc_flags_table();

/// Flags after 8-bit DEC, indexed by the old value. Carry is left clear.
pub(crate) static DEC_FLAGS: [u8; 256] = dec_flags_table();

/// S, Z, bits 3/5 and parity for a logic result. AND additionally sets H.
pub(crate) static LOGIC_FLAGS: [u8; 256] = logic_flags_table();

/// DAA outcome as AF, indexed by `A | (H<<10 | N<<9 | C<<8)`.
pub(crate) static DAA_RESULTS: [u16; 0x800] = daa_table();

/// Results of RLC, indexed by the operand.
pub(crate) static ROL_RESULTS: [u8; 256] = rol_results_table();

/// Results of RRC, indexed by the operand.
pub(crate) static ROR_RESULTS: [u8; 256] = ror_results_table();

/// Flags after RLC, indexed by the operand.
pub(crate) static RLC_FLAGS: [u8; 256] = shift_flags_table(ShiftKind::Rlc);

/// Flags after RRC, indexed by the operand.
pub(crate) static RRC_FLAGS: [u8; 256] = shift_flags_table(ShiftKind::Rrc);

/// Flags after RL with carry clear (also SLA), indexed by the operand.
pub(crate) static RL_CARRY0_FLAGS: [u8; 256] = shift_flags_table(ShiftKind::RlCarry0);

/// Flags after RL with carry set (also SLL), indexed by the operand.
pub(crate) static RL_CARRY1_FLAGS: [u8; 256] = shift_flags_table(ShiftKind::RlCarry1);

/// Flags after RR with carry clear (also SRL), indexed by the operand.
pub(crate) static RR_CARRY0_FLAGS: [u8; 256] = shift_flags_table(ShiftKind::RrCarry0);

/// Flags after RR with carry set, indexed by the operand.
pub(crate) static RR_CARRY1_FLAGS: [u8; 256] = shift_flags_table(ShiftKind::RrCarry1);

/// Flags after SRA, indexed by the operand.
pub(crate) static SRA_FLAGS: [u8; 256] = shift_flags_table(ShiftKind::Sra);

const fn inc_flags_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let old = i as u8;
        let new = old.wrapping_add(1);
        let mut f = sz53(new);
        if old & 0x0F == 0x0F {
            f |= HF;
        }
        if old == 0x7F {
            f |= PF;
        }
        table[i] = f;
        i += 1;
    }
    table
}

const fn dec_flags_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let old = i as u8;
        let new = old.wrapping_sub(1);
        let mut f = sz53(new) | NF;
        if old & 0x0F == 0x00 {
            f |= HF;
        }
        if old == 0x80 {
            f |= PF;
        }
        table[i] = f;
        i += 1;
    }
    table
}

const fn logic_flags_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = sz53p(i as u8);
        i += 1;
    }
    table
}

const fn daa_table() -> [u16; 0x800] {
    let mut table = [0u16; 0x800];
    let mut b = 0usize;
    while b < 0x100 {
        let hi = (b >> 4) as u8;
        let lo = (b & 0x0F) as u8;
        let mut flags_in = 0usize;
        // flags_in bit 2 = H, bit 1 = N, bit 0 = C
        while flags_in < 8 {
            let h = flags_in & 4 != 0;
            let n = flags_in & 2 != 0;
            let c = flags_in & 1 != 0;

            let mut diff = 0u8;
            let mut carry_after = c;
            if !c {
                if hi <= 9 && lo <= 9 {
                    diff = if h { 0x06 } else { 0x00 };
                } else if hi <= 8 && lo >= 0x0A {
                    diff = 0x06;
                } else if hi >= 0x0A && lo <= 9 && !h {
                    diff = 0x60;
                    carry_after = true;
                } else if hi >= 9 && lo >= 0x0A {
                    diff = 0x66;
                    carry_after = true;
                } else if hi >= 0x0A && lo <= 9 {
                    if h {
                        diff = 0x66;
                    }
                    carry_after = true;
                }
            } else if lo <= 9 {
                diff = if h { 0x66 } else { 0x60 };
            } else {
                diff = 0x66;
            }

            let half_after = (lo >= 0x0A && !n) || (lo <= 5 && n && h);
            let a = if n {
                (b as u8).wrapping_sub(diff)
            } else {
                (b as u8).wrapping_add(diff)
            };

            let mut f = sz53p(a);
            if n {
                f |= NF;
            }
            if half_after {
                f |= HF;
            }
            if carry_after {
                f |= CF;
            }
            table[(flags_in << 8) | b] = (a as u16) << 8 | f as u16;
            flags_in += 1;
        }
        b += 1;
    }
    table
}

const fn rol_results_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).rotate_left(1);
        i += 1;
    }
    table
}

const fn ror_results_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).rotate_right(1);
        i += 1;
    }
    table
}

#[derive(Clone, Copy)]
enum ShiftKind {
    Rlc,
    Rrc,
    RlCarry0,
    RlCarry1,
    RrCarry0,
    RrCarry1,
    Sra,
}

const fn shift_flags_table(kind: ShiftKind) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let v = i as u8;
        let (result, carry) = match kind {
            ShiftKind::Rlc => (v.rotate_left(1), v & 0x80 != 0),
            ShiftKind::Rrc => (v.rotate_right(1), v & 0x01 != 0),
            ShiftKind::RlCarry0 => (v << 1, v & 0x80 != 0),
            ShiftKind::RlCarry1 => ((v << 1) | 0x01, v & 0x80 != 0),
            ShiftKind::RrCarry0 => (v >> 1, v & 0x01 != 0),
            ShiftKind::RrCarry1 => ((v >> 1) | 0x80, v & 0x01 != 0),
            ShiftKind::Sra => ((v >> 1) | (v & 0x80), v & 0x01 != 0),
        };
        let mut f = sz53p(result);
        if carry {
            f |= CF;
        }
        table[i] = f;
        i += 1;
    }
    table
}

// =========================================================================
// 8-bit arithmetic
// =========================================================================

/// Add two bytes with optional carry, returning result and flags.
#[must_use]
pub fn add8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let wide = u16::from(a) + u16::from(b) + u16::from(c);
    let value = wide as u8;

    let mut flags = sz53(value);
    if (a & 0x0F) + (b & 0x0F) + c > 0x0F {
        flags |= HF;
    }
    // Both operands same sign, result different sign
    if (a ^ b) & 0x80 == 0 && (a ^ value) & 0x80 != 0 {
        flags |= PF;
    }
    if wide > 0xFF {
        flags |= CF;
    }

    AluResult { value, flags }
}

/// Subtract two bytes with optional borrow, returning result and flags.
#[must_use]
pub fn sub8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let value = a.wrapping_sub(b).wrapping_sub(c);

    let mut flags = sz53(value) | NF;
    if (a & 0x0F) < (b & 0x0F) + c {
        flags |= HF;
    }
    // Operands differ in sign, result sign matches the subtrahend
    if (a ^ b) & 0x80 != 0 && (b ^ value) & 0x80 == 0 {
        flags |= PF;
    }
    if u16::from(a) < u16::from(b) + u16::from(c) {
        flags |= CF;
    }

    AluResult { value, flags }
}

/// Compare: subtract without storing. Bits 3/5 come from the operand.
#[must_use]
pub fn cp8(a: u8, b: u8) -> AluResult {
    let mut result = sub8(a, b, false);
    result.flags = (result.flags & !XY) | (b & XY);
    result.value = a;
    result
}

#[must_use]
pub fn and8(a: u8, b: u8) -> AluResult {
    let value = a & b;
    AluResult {
        value,
        flags: LOGIC_FLAGS[value as usize] | HF,
    }
}

#[must_use]
pub fn or8(a: u8, b: u8) -> AluResult {
    let value = a | b;
    AluResult {
        value,
        flags: LOGIC_FLAGS[value as usize],
    }
}

#[must_use]
pub fn xor8(a: u8, b: u8) -> AluResult {
    let value = a ^ b;
    AluResult {
        value,
        flags: LOGIC_FLAGS[value as usize],
    }
}

/// One of the eight accumulator operations selected by opcode bits 5-3:
/// ADD ADC SUB SBC AND XOR OR CP.
#[must_use]
pub fn accumulator_op(op: u8, a: u8, operand: u8, carry: bool) -> AluResult {
    match op & 7 {
        0 => add8(a, operand, false),
        1 => add8(a, operand, carry),
        2 => sub8(a, operand, false),
        3 => sub8(a, operand, carry),
        4 => and8(a, operand),
        5 => xor8(a, operand),
        6 => or8(a, operand),
        _ => cp8(a, operand),
    }
}

// =========================================================================
// Rotates and shifts (CB group)
// =========================================================================

/// One of the eight CB-group shifts selected by opcode bits 5-3:
/// RLC RRC RL RR SLA SRA SLL SRL. Uses the lookup tables.
#[must_use]
pub fn shift_op(op: u8, value: u8, carry: bool) -> AluResult {
    match op & 7 {
        0 => AluResult {
            value: ROL_RESULTS[value as usize],
            flags: RLC_FLAGS[value as usize],
        },
        1 => AluResult {
            value: ROR_RESULTS[value as usize],
            flags: RRC_FLAGS[value as usize],
        },
        2 => AluResult {
            value: (value << 1) | u8::from(carry),
            flags: if carry {
                RL_CARRY1_FLAGS[value as usize]
            } else {
                RL_CARRY0_FLAGS[value as usize]
            },
        },
        3 => AluResult {
            value: (value >> 1) | if carry { 0x80 } else { 0 },
            flags: if carry {
                RR_CARRY1_FLAGS[value as usize]
            } else {
                RR_CARRY0_FLAGS[value as usize]
            },
        },
        4 => AluResult {
            value: value << 1,
            flags: RL_CARRY0_FLAGS[value as usize],
        },
        5 => AluResult {
            value: (value >> 1) | (value & 0x80),
            flags: SRA_FLAGS[value as usize],
        },
        6 => AluResult {
            value: (value << 1) | 0x01,
            flags: RL_CARRY1_FLAGS[value as usize],
        },
        _ => AluResult {
            value: value >> 1,
            flags: RR_CARRY0_FLAGS[value as usize],
        },
    }
}

// =========================================================================
// 16-bit arithmetic
// =========================================================================

/// 16-bit add for HL/IX/IY. Returns the result and the H, C and 3/5 bits;
/// the caller keeps S, Z and P/V.
#[must_use]
pub fn add16(a: u16, b: u16) -> (u16, u8) {
    let wide = u32::from(a) + u32::from(b);
    let result = wide as u16;

    let mut flags = ((result >> 8) as u8) & XY;
    if (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF {
        flags |= HF;
    }
    if wide > 0xFFFF {
        flags |= CF;
    }

    (result, flags)
}

/// 16-bit add with carry for HL.
#[must_use]
pub fn adc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u16::from(carry);
    let wide = u32::from(a) + u32::from(b) + u32::from(c);
    let result = wide as u16;

    let mut flags = ((result >> 8) as u8) & (SF | YF | XF);
    if result == 0 {
        flags |= ZF;
    }
    if (a & 0x0FFF) + (b & 0x0FFF) + c > 0x0FFF {
        flags |= HF;
    }
    let signed = i32::from(a as i16) + i32::from(b as i16) + i32::from(c);
    if !(-0x8000..0x8000).contains(&signed) {
        flags |= PF;
    }
    if wide > 0xFFFF {
        flags |= CF;
    }

    (result, flags)
}

/// 16-bit subtract with borrow for HL.
#[must_use]
pub fn sbc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u16::from(carry);
    let result = a.wrapping_sub(b).wrapping_sub(c);

    let mut flags = (((result >> 8) as u8) & (SF | YF | XF)) | NF;
    if result == 0 {
        flags |= ZF;
    }
    if (a & 0x0FFF) < (b & 0x0FFF) + c {
        flags |= HF;
    }
    let signed = i32::from(a as i16) - i32::from(b as i16) - i32::from(c);
    if !(-0x8000..0x8000).contains(&signed) {
        flags |= PF;
    }
    if u32::from(a) < u32::from(b) + u32::from(c) {
        flags |= CF;
    }

    (result, flags)
}

/// DAA: new AF from the current A and F.
#[must_use]
pub fn daa(a: u8, f: u8) -> u16 {
    let index = a as usize | (((f as usize & 0x03) | ((f as usize >> 2) & 0x04)) << 8);
    DAA_RESULTS[index]
}

//! FPU instructions: 16 registers (`F0..F15`), single (`.S`) and double
//! (`.D`) precision. All FPU encodings begin with `constants::EXT_PREFIX`.

use crate::register::FpuRegister;
use util::EnumFromStr;
use util_derive::EnumFromStr;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumFromStr)]
pub enum FpuOp {
    FADD, FSUB, FMUL, FDIV, FNEG, FABS, FCMP, FMOV, FSQRT,
}

impl std::fmt::Display for FpuOp {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

const TWO_REGISTER_OPS: &[(FpuOp, u8, u8)] = &[
    // (op, single-precision opcode, double-precision opcode)
    (FpuOp::FADD, 0xA0, 0xA1),
    (FpuOp::FSUB, 0xA2, 0xA3),
    (FpuOp::FMUL, 0xA4, 0xA5),
    (FpuOp::FDIV, 0xA6, 0xA7),
    (FpuOp::FNEG, 0xA8, 0xA9),
    (FpuOp::FABS, 0xAA, 0xAB),
    (FpuOp::FCMP, 0xAC, 0xAD),
    (FpuOp::FMOV, 0xAE, 0xAF),
    (FpuOp::FSQRT, 0xB8, 0xB9),
];

pub const FCVT_DS: u8 = 0xBA;
pub const FCVT_SD: u8 = 0xBB;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumFromStr)]
pub enum FpuUnaryOp {
    F2I, I2F, FTOA, FTOT, ATOF, TTOF,
}

impl std::fmt::Display for FpuUnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

const UNARY_OPS: &[(FpuUnaryOp, u8)] = &[
    (FpuUnaryOp::F2I, 0xBC),
    (FpuUnaryOp::I2F, 0xBD),
    (FpuUnaryOp::FTOA, 0xBE),
    (FpuUnaryOp::FTOT, 0xBF),
    (FpuUnaryOp::ATOF, 0xC0),
    (FpuUnaryOp::TTOF, 0xC1),
];

pub const LDF_DP: u8 = 0xB0;
pub const LDF_ABS: u8 = 0xB1;
pub const STF_DP: u8 = 0xB2;
pub const STF_ABS: u8 = 0xB3;
pub const LDF_REGISTER_INDIRECT: u8 = 0xB4;
pub const STF_REGISTER_INDIRECT: u8 = 0xB5;
pub const LDF_ABS32: u8 = 0xB6;
pub const STF_ABS32: u8 = 0xB7;

/// Pack a two-register form's register byte: high nibble destination, low
/// nibble source.
pub fn pack_two_register(dest: FpuRegister, src: FpuRegister) -> u8 {
    (dest.index() << 4) | src.index()
}

pub fn unpack_two_register(byte: u8) -> (FpuRegister, FpuRegister) {
    let dest = FpuRegister::from_index(byte >> 4).expect("nibble is always < 16");
    let src = FpuRegister::from_index(byte & 0x0F).expect("nibble is always < 16");
    (dest, src)
}

/// Pack a one-register form's register byte: register in the high nibble,
/// low nibble zero.
pub fn pack_one_register(reg: FpuRegister) -> u8 {
    reg.index() << 4
}

pub fn unpack_one_register(byte: u8) -> FpuRegister {
    FpuRegister::from_index(byte >> 4).expect("nibble is always < 16")
}

/// Pack a register-indirect memory form: `Fn` in the high nibble, `Rm`
/// (restricted to 0..15) in the low nibble.
pub fn pack_register_indirect(freg: FpuRegister, rm: u8) -> Option<u8> {
    if rm < 16 {
        Some((freg.index() << 4) | rm)
    } else {
        None
    }
}

pub fn unpack_register_indirect(byte: u8) -> (FpuRegister, u8) {
    (
        FpuRegister::from_index(byte >> 4).expect("nibble is always < 16"),
        byte & 0x0F,
    )
}

pub fn encode_two_register_op(op: FpuOp, double: bool) -> u8 {
    let (_, s, d) = TWO_REGISTER_OPS
        .iter()
        .map(|&(o, s, d)| (o, s, d))
        .find(|&(o, _, _)| o == op)
        .expect("FpuOp is exhaustively covered by TWO_REGISTER_OPS");
    if double {
        d
    } else {
        s
    }
}

pub fn decode_two_register_op(opcode: u8) -> Option<(FpuOp, bool)> {
    for &(op, s, d) in TWO_REGISTER_OPS {
        if opcode == s {
            return Some((op, false));
        }
        if opcode == d {
            return Some((op, true));
        }
    }
    None
}

pub fn encode_unary_op(op: FpuUnaryOp) -> u8 {
    UNARY_OPS
        .iter()
        .find(|&&(o, _)| o == op)
        .map(|&(_, opcode)| opcode)
        .expect("FpuUnaryOp is exhaustively covered by UNARY_OPS")
}

pub fn decode_unary_op(opcode: u8) -> Option<FpuUnaryOp> {
    UNARY_OPS
        .iter()
        .find(|&&(_, o)| o == opcode)
        .map(|&(op, _)| op)
}

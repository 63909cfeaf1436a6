//! The standard-plane opcode table: the inherited 6502/65816 instruction set
//! (`WDM`/`0x42` excluded — it is handled as a two-byte escape by the driver
//! and decoder, not as a table entry; see `constants::WDM_ESCAPE`).
//!
//! Kept as one flat, literal `(Mnemonic, AddressingMode, u8)` list rather
//! than a hand-indexed 2-D matrix: with 256 possible opcodes a linear scan is
//! cheap, and a flat list is far less likely to hide an off-by-one than an
//! array addressed by enum discriminant.

use crate::addressing::AddressingMode;
use crate::mnemonic::Mnemonic;

type Entry = (Mnemonic, AddressingMode, u8);

#[rustfmt::skip]
const OPCODES: &[Entry] = {
    use AddressingMode::*;
    use Mnemonic::*;
    &[
        // Group 1: (dp,X) dp # abs (dp),Y dp,X abs,Y abs,X (dp) [dp] [dp],Y sr,S (sr,S),Y long long,X
        (ORA, DpIndirectX, 0x01), (ORA, Dp, 0x05), (ORA, Immediate, 0x09), (ORA, Abs, 0x0D),
        (ORA, DpIndirectY, 0x11), (ORA, DpX, 0x15), (ORA, AbsY, 0x19), (ORA, AbsX, 0x1D),
        (ORA, DpIndirect, 0x12), (ORA, DpIndirectLong, 0x07), (ORA, DpIndirectLongY, 0x17),
        (ORA, StackRelative, 0x03), (ORA, StackRelativeIndirectY, 0x13),
        (ORA, AbsLong, 0x0F), (ORA, AbsLongX, 0x1F),

        (AND, DpIndirectX, 0x21), (AND, Dp, 0x25), (AND, Immediate, 0x29), (AND, Abs, 0x2D),
        (AND, DpIndirectY, 0x31), (AND, DpX, 0x35), (AND, AbsY, 0x39), (AND, AbsX, 0x3D),
        (AND, DpIndirect, 0x32), (AND, DpIndirectLong, 0x27), (AND, DpIndirectLongY, 0x37),
        (AND, StackRelative, 0x23), (AND, StackRelativeIndirectY, 0x33),
        (AND, AbsLong, 0x2F), (AND, AbsLongX, 0x3F),

        (EOR, DpIndirectX, 0x41), (EOR, Dp, 0x45), (EOR, Immediate, 0x49), (EOR, Abs, 0x4D),
        (EOR, DpIndirectY, 0x51), (EOR, DpX, 0x55), (EOR, AbsY, 0x59), (EOR, AbsX, 0x5D),
        (EOR, DpIndirect, 0x52), (EOR, DpIndirectLong, 0x47), (EOR, DpIndirectLongY, 0x57),
        (EOR, StackRelative, 0x43), (EOR, StackRelativeIndirectY, 0x53),
        (EOR, AbsLong, 0x4F), (EOR, AbsLongX, 0x5F),

        (ADC, DpIndirectX, 0x61), (ADC, Dp, 0x65), (ADC, Immediate, 0x69), (ADC, Abs, 0x6D),
        (ADC, DpIndirectY, 0x71), (ADC, DpX, 0x75), (ADC, AbsY, 0x79), (ADC, AbsX, 0x7D),
        (ADC, DpIndirect, 0x72), (ADC, DpIndirectLong, 0x67), (ADC, DpIndirectLongY, 0x77),
        (ADC, StackRelative, 0x63), (ADC, StackRelativeIndirectY, 0x73),
        (ADC, AbsLong, 0x6F), (ADC, AbsLongX, 0x7F),

        (STA, DpIndirectX, 0x81), (STA, Dp, 0x85), (STA, Abs, 0x8D),
        (STA, DpIndirectY, 0x91), (STA, DpX, 0x95), (STA, AbsY, 0x99), (STA, AbsX, 0x9D),
        (STA, DpIndirect, 0x92), (STA, DpIndirectLong, 0x87), (STA, DpIndirectLongY, 0x97),
        (STA, StackRelative, 0x83), (STA, StackRelativeIndirectY, 0x93),
        (STA, AbsLong, 0x8F), (STA, AbsLongX, 0x9F),

        (LDA, DpIndirectX, 0xA1), (LDA, Dp, 0xA5), (LDA, Immediate, 0xA9), (LDA, Abs, 0xAD),
        (LDA, DpIndirectY, 0xB1), (LDA, DpX, 0xB5), (LDA, AbsY, 0xB9), (LDA, AbsX, 0xBD),
        (LDA, DpIndirect, 0xB2), (LDA, DpIndirectLong, 0xA7), (LDA, DpIndirectLongY, 0xB7),
        (LDA, StackRelative, 0xA3), (LDA, StackRelativeIndirectY, 0xB3),
        (LDA, AbsLong, 0xAF), (LDA, AbsLongX, 0xBF),

        (CMP, DpIndirectX, 0xC1), (CMP, Dp, 0xC5), (CMP, Immediate, 0xC9), (CMP, Abs, 0xCD),
        (CMP, DpIndirectY, 0xD1), (CMP, DpX, 0xD5), (CMP, AbsY, 0xD9), (CMP, AbsX, 0xDD),
        (CMP, DpIndirect, 0xD2), (CMP, DpIndirectLong, 0xC7), (CMP, DpIndirectLongY, 0xD7),
        (CMP, StackRelative, 0xC3), (CMP, StackRelativeIndirectY, 0xD3),
        (CMP, AbsLong, 0xCF), (CMP, AbsLongX, 0xDF),

        (SBC, DpIndirectX, 0xE1), (SBC, Dp, 0xE5), (SBC, Immediate, 0xE9), (SBC, Abs, 0xED),
        (SBC, DpIndirectY, 0xF1), (SBC, DpX, 0xF5), (SBC, AbsY, 0xF9), (SBC, AbsX, 0xFD),
        (SBC, DpIndirect, 0xF2), (SBC, DpIndirectLong, 0xE7), (SBC, DpIndirectLongY, 0xF7),
        (SBC, StackRelative, 0xE3), (SBC, StackRelativeIndirectY, 0xF3),
        (SBC, AbsLong, 0xEF), (SBC, AbsLongX, 0xFF),

        // Read-modify-write shifts
        (ASL, Dp, 0x06), (ASL, Accumulator, 0x0A), (ASL, Abs, 0x0E), (ASL, DpX, 0x16), (ASL, AbsX, 0x1E),
        (ROL, Dp, 0x26), (ROL, Accumulator, 0x2A), (ROL, Abs, 0x2E), (ROL, DpX, 0x36), (ROL, AbsX, 0x3E),
        (LSR, Dp, 0x46), (LSR, Accumulator, 0x4A), (LSR, Abs, 0x4E), (LSR, DpX, 0x56), (LSR, AbsX, 0x5E),
        (ROR, Dp, 0x66), (ROR, Accumulator, 0x6A), (ROR, Abs, 0x6E), (ROR, DpX, 0x76), (ROR, AbsX, 0x7E),
        (INC, Dp, 0xE6), (INC, Accumulator, 0x1A), (INC, Abs, 0xEE), (INC, DpX, 0xF6), (INC, AbsX, 0xFE),
        (DEC, Dp, 0xC6), (DEC, Accumulator, 0x3A), (DEC, Abs, 0xCE), (DEC, DpX, 0xD6), (DEC, AbsX, 0xDE),

        // Index load/store/compare
        (STX, Dp, 0x86), (STX, Abs, 0x8E), (STX, DpY, 0x96),
        (STY, Dp, 0x84), (STY, Abs, 0x8C), (STY, DpX, 0x94),
        (LDX, Immediate, 0xA2), (LDX, Dp, 0xA6), (LDX, Abs, 0xAE), (LDX, DpY, 0xB6), (LDX, AbsY, 0xBE),
        (LDY, Immediate, 0xA0), (LDY, Dp, 0xA4), (LDY, Abs, 0xAC), (LDY, DpX, 0xB4), (LDY, AbsX, 0xBC),
        (CPX, Immediate, 0xE0), (CPX, Dp, 0xE4), (CPX, Abs, 0xEC),
        (CPY, Immediate, 0xC0), (CPY, Dp, 0xC4), (CPY, Abs, 0xCC),

        // Bit test / set-reset / store-zero
        (BIT, Dp, 0x24), (BIT, Abs, 0x2C), (BIT, DpX, 0x34), (BIT, AbsX, 0x3C), (BIT, Immediate, 0x89),
        (TSB, Dp, 0x04), (TSB, Abs, 0x0C),
        (TRB, Dp, 0x14), (TRB, Abs, 0x1C),
        (STZ, Dp, 0x64), (STZ, DpX, 0x74), (STZ, Abs, 0x9C), (STZ, AbsX, 0x9E),

        // Branches
        (BPL, Relative, 0x10), (BMI, Relative, 0x30), (BVC, Relative, 0x50), (BVS, Relative, 0x70),
        (BCC, Relative, 0x90), (BCS, Relative, 0xB0), (BNE, Relative, 0xD0), (BEQ, Relative, 0xF0),
        (BRA, Relative, 0x80), (BRL, RelativeLong, 0x82),

        // Jumps and subroutine linkage
        (JMP, Abs, 0x4C), (JMP, AbsIndirect, 0x6C), (JMP, AbsIndirectX, 0x7C),
        (JML, AbsLong, 0x5C), (JML, AbsIndirectLong, 0xDC),
        (JSR, Abs, 0x20), (JSR, AbsIndirectX, 0xFC), (JSL, AbsLong, 0x22),
        (RTS, Implied, 0x60), (RTL, Implied, 0x6B), (RTI, Implied, 0x40), (BRK, Implied, 0x00),

        // Stack
        (PHA, Implied, 0x48), (PLA, Implied, 0x68), (PHP, Implied, 0x08), (PLP, Implied, 0x28),
        (PHX, Implied, 0xDA), (PLX, Implied, 0xFA), (PHY, Implied, 0x5A), (PLY, Implied, 0x7A),
        (PHB, Implied, 0x8B), (PLB, Implied, 0xAB), (PHD, Implied, 0x0B), (PLD, Implied, 0x2B),
        (PHK, Implied, 0x4B),
        (PEA, Immediate, 0xF4), (PEI, DpIndirect, 0xD4), (PER, RelativeLong, 0x62),

        // Transfers
        (TAX, Implied, 0xAA), (TAY, Implied, 0xA8), (TXA, Implied, 0x8A), (TYA, Implied, 0x98),
        (TXS, Implied, 0x9A), (TSX, Implied, 0xBA), (TCD, Implied, 0x5B), (TDC, Implied, 0x7B),
        (TCS, Implied, 0x1B), (TSC, Implied, 0x3B), (XBA, Implied, 0xEB), (XCE, Implied, 0xFB),

        // Flags
        (CLC, Implied, 0x18), (SEC, Implied, 0x38), (CLI, Implied, 0x58), (SEI, Implied, 0x78),
        (CLV, Implied, 0xB8), (CLD, Implied, 0xD8), (SED, Implied, 0xF8),

        // Increment/decrement registers
        (INX, Implied, 0xE8), (DEX, Implied, 0xCA), (INY, Implied, 0xC8), (DEY, Implied, 0x88),

        (NOP, Implied, 0xEA),
        (MVP, BlockMove, 0x44), (MVN, BlockMove, 0x54),
        (REP, Immediate, 0xC2), (SEP, Immediate, 0xE2),

        (STP, Implied, 0xDB), (WAI, Implied, 0xCB),
    ]
};

pub fn encode_standard(mnemonic: Mnemonic, mode: AddressingMode) -> Option<u8> {
    OPCODES
        .iter()
        .find(|&&(m, a, _)| m == mnemonic && a == mode)
        .map(|&(_, _, op)| op)
}

pub fn decode_standard(opcode: u8) -> Option<(Mnemonic, AddressingMode)> {
    if opcode == crate::constants::WDM_ESCAPE {
        return None;
    }
    OPCODES
        .iter()
        .find(|&&(_, _, op)| op == opcode)
        .map(|&(m, a, _)| (m, a))
}

/// Any addressing mode the table grants `mnemonic` at all, used to decide
/// whether a dp/abs promotion target exists before retrying the encode.
pub fn supports(mnemonic: Mnemonic, mode: AddressingMode) -> bool {
    OPCODES.iter().any(|&(m, a, _)| m == mnemonic && a == mode)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::addressing::AddressingMode::*;
    use crate::mnemonic::Mnemonic::*;

    #[test]
    fn lda_immediate_is_a9() {
        assert_eq!(encode_standard(LDA, Immediate), Some(0xA9));
    }

    #[test]
    fn lda_dp_is_a5() {
        assert_eq!(encode_standard(LDA, Dp), Some(0xA5));
    }

    #[test]
    fn nop_is_ea() {
        assert_eq!(encode_standard(NOP, Implied), Some(0xEA));
    }

    #[test]
    fn bne_is_d0() {
        assert_eq!(encode_standard(BNE, Relative), Some(0xD0));
    }

    #[test]
    fn decode_reverses_encode_for_every_entry() {
        for &(mnemonic, mode, opcode) in OPCODES {
            assert_eq!(decode_standard(opcode), Some((mnemonic, mode)));
            assert_eq!(encode_standard(mnemonic, mode), Some(opcode));
        }
    }

    #[test]
    fn sta_has_no_immediate_form() {
        assert_eq!(encode_standard(STA, Immediate), None);
    }

    #[test]
    fn wdm_opcode_is_not_a_table_entry() {
        assert_eq!(decode_standard(0x42), None);
    }
}

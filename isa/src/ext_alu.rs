//! The extended-ALU meta-plane (opcodes `0x80..0x97`). After the prefix and
//! opcode byte, a single mode byte packs a size, a target-class flag, and an
//! addressing-mode index, rather than each (mnemonic, mode) pair getting its
//! own opcode the way the standard plane does.

use util::EnumFromStr;
use util_derive::EnumFromStr;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumFromStr)]
pub enum ExtAluMnemonic {
    LD, ST, ADC, SBC, AND, ORA, EOR, CMP, BIT, TSB, TRB,
    INC, DEC, ASL, LSR, ROL, ROR, STZ,
}

impl std::fmt::Display for ExtAluMnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

const MNEMONIC_OPCODES: &[(ExtAluMnemonic, u8)] = {
    use ExtAluMnemonic::*;
    &[
        (LD, 0x80), (ST, 0x81), (ADC, 0x82), (SBC, 0x83), (AND, 0x84),
        (ORA, 0x85), (EOR, 0x86), (CMP, 0x87), (BIT, 0x88), (TSB, 0x89),
        (TRB, 0x8A), (INC, 0x8B), (DEC, 0x8C), (ASL, 0x8D), (LSR, 0x8E),
        (ROL, 0x8F), (ROR, 0x90), (STZ, 0x91),
    ]
};

pub fn encode_mnemonic(mnemonic: ExtAluMnemonic) -> u8 {
    MNEMONIC_OPCODES
        .iter()
        .find(|&&(m, _)| m == mnemonic)
        .map(|&(_, op)| op)
        .expect("ExtAluMnemonic is exhaustively covered by MNEMONIC_OPCODES")
}

pub fn decode_mnemonic(opcode: u8) -> Option<ExtAluMnemonic> {
    MNEMONIC_OPCODES
        .iter()
        .find(|&&(_, op)| op == opcode)
        .map(|&(m, _)| m)
}

impl ExtAluMnemonic {
    /// Only these four can take a memory location as their destination;
    /// every other mnemonic writes back to the accumulator or the
    /// register-file destination named by the mode byte's target bit.
    pub fn permits_memory_destination(self) -> bool {
        matches!(
            self,
            ExtAluMnemonic::ST | ExtAluMnemonic::TSB | ExtAluMnemonic::TRB | ExtAluMnemonic::STZ
        )
    }

    /// Unary forms (in-place increment/decrement/shift) take no source
    /// operand; everything else does.
    pub fn requires_source(self) -> bool {
        !matches!(
            self,
            ExtAluMnemonic::INC
                | ExtAluMnemonic::DEC
                | ExtAluMnemonic::ASL
                | ExtAluMnemonic::LSR
                | ExtAluMnemonic::ROL
                | ExtAluMnemonic::ROR
        )
    }
}

/// Bits 7:6 of the mode byte.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExtAluSize {
    Byte,
    Word,
    Default,
}

impl ExtAluSize {
    fn bits(self) -> u8 {
        match self {
            ExtAluSize::Byte => 0,
            ExtAluSize::Word => 1,
            ExtAluSize::Default => 2,
        }
    }

    fn from_bits(bits: u8) -> Option<ExtAluSize> {
        match bits {
            0 => Some(ExtAluSize::Byte),
            1 => Some(ExtAluSize::Word),
            2 => Some(ExtAluSize::Default),
            _ => None,
        }
    }
}

/// The bits 4:0 addressing-mode index. Discriminants are the literal
/// mode-byte values, not a sequential count, so `0x10..0x15` sit well past
/// `0x0D` to leave room for the 32-bit-absolute family.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum ExtAluAddrMode {
    Dp = 0x00,
    DpX = 0x01,
    DpY = 0x02,
    DpIndirectX = 0x03,
    DpIndirectY = 0x04,
    DpIndirect = 0x05,
    DpIndirectLong = 0x06,
    DpIndirectLongY = 0x07,
    Abs = 0x08,
    AbsX = 0x09,
    AbsY = 0x0A,
    AbsIndirect = 0x0B,
    AbsIndirectX = 0x0C,
    AbsIndirectLong = 0x0D,
    Abs32 = 0x10,
    Abs32X = 0x11,
    Abs32Y = 0x12,
    Abs32Indirect = 0x13,
    Abs32IndirectX = 0x14,
    Abs32IndirectLong = 0x15,
    Immediate = 0x18,
    Accumulator = 0x19,
    X = 0x1A,
    Y = 0x1B,
    StackRelative = 0x1C,
    StackRelativeIndirectY = 0x1D,
}

impl ExtAluAddrMode {
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<ExtAluAddrMode> {
        use ExtAluAddrMode::*;
        let all = [
            Dp, DpX, DpY, DpIndirectX, DpIndirectY, DpIndirect, DpIndirectLong,
            DpIndirectLongY, Abs, AbsX, AbsY, AbsIndirect, AbsIndirectX, AbsIndirectLong,
            Abs32, Abs32X, Abs32Y, Abs32Indirect, Abs32IndirectX, Abs32IndirectLong,
            Immediate, Accumulator, X, Y, StackRelative, StackRelativeIndirectY,
        ];
        all.iter().find(|&m| m.index() == index).copied()
    }

    /// Number of payload bytes this mode contributes, given the mode byte's
    /// size field (only `Immediate` depends on it).
    pub fn operand_len(self, size: ExtAluSize) -> usize {
        use ExtAluAddrMode::*;
        match self {
            Dp | DpX | DpY | DpIndirectX | DpIndirectY | DpIndirect | DpIndirectLong
            | DpIndirectLongY => 1,
            Abs | AbsX | AbsY | AbsIndirect | AbsIndirectX | AbsIndirectLong => 2,
            Abs32 | Abs32X | Abs32Y | Abs32Indirect | Abs32IndirectX | Abs32IndirectLong => 4,
            StackRelative | StackRelativeIndirectY => 1,
            Accumulator | X | Y => 0,
            Immediate => match size {
                ExtAluSize::Byte => 1,
                ExtAluSize::Word => 2,
                ExtAluSize::Default => 4,
            },
        }
    }
}

/// Pack the mode byte: size in bits 7:6, the register-file-destination flag
/// in bit 5, the addressing-mode index in bits 4:0.
pub fn pack_mode_byte(size: ExtAluSize, register_target: bool, mode: ExtAluAddrMode) -> u8 {
    (size.bits() << 6) | ((register_target as u8) << 5) | mode.index()
}

pub fn unpack_mode_byte(byte: u8) -> Option<(ExtAluSize, bool, ExtAluAddrMode)> {
    let size = ExtAluSize::from_bits(byte >> 6)?;
    let register_target = (byte & 0x20) != 0;
    let mode = ExtAluAddrMode::from_index(byte & 0x1F)?;
    Some((size, register_target, mode))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mode_byte_round_trips_every_combination() {
        for &size in &[ExtAluSize::Byte, ExtAluSize::Word, ExtAluSize::Default] {
            for register_target in [false, true] {
                for index in 0u8..=0x1F {
                    let Some(mode) = ExtAluAddrMode::from_index(index) else {
                        continue;
                    };
                    let byte = pack_mode_byte(size, register_target, mode);
                    assert_eq!(unpack_mode_byte(byte), Some((size, register_target, mode)));
                }
            }
        }
    }

    #[test]
    fn immediate_with_register_target_packs_as_0x78() {
        // `LD R4, #$ABCD` with a word-width immediate: target=1 (register
        // file), addressing-mode index 0x18 (immediate).
        let byte = pack_mode_byte(ExtAluSize::Word, true, ExtAluAddrMode::Immediate);
        assert_eq!(byte, 0x78);
        assert_eq!(
            unpack_mode_byte(byte),
            Some((ExtAluSize::Word, true, ExtAluAddrMode::Immediate))
        );
    }

    #[test]
    fn ld_and_st_opcodes_round_trip() {
        assert_eq!(encode_mnemonic(ExtAluMnemonic::LD), 0x80);
        assert_eq!(decode_mnemonic(0x80), Some(ExtAluMnemonic::LD));
        assert_eq!(encode_mnemonic(ExtAluMnemonic::STZ), 0x91);
    }

    #[test]
    fn only_memory_writing_mnemonics_permit_a_memory_destination() {
        assert!(ExtAluMnemonic::ST.permits_memory_destination());
        assert!(ExtAluMnemonic::STZ.permits_memory_destination());
        assert!(!ExtAluMnemonic::LD.permits_memory_destination());
        assert!(!ExtAluMnemonic::ADC.permits_memory_destination());
    }

    #[test]
    fn unary_shift_forms_need_no_source() {
        assert!(!ExtAluMnemonic::INC.requires_source());
        assert!(!ExtAluMnemonic::ROL.requires_source());
        assert!(ExtAluMnemonic::ADC.requires_source());
    }
}

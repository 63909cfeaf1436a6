//! The addressing-mode algebra shared by the standard-plane encoder/decoder
//! and the operand parser. Modeled as a tagged sum per the "addressing mode
//! as a variant" design note rather than a family of parallel arrays.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    Dp,
    DpX,
    DpY,
    DpIndirectX,     // (dp,X)
    DpIndirectY,     // (dp),Y
    DpIndirect,      // (dp)
    DpIndirectLong,  // [dp]
    DpIndirectLongY, // [dp],Y
    Abs,
    AbsX,
    AbsY,
    AbsIndirect,      // (abs)
    AbsIndirectX,     // (abs,X)
    AbsIndirectLong,  // [abs]
    AbsLong,
    AbsLongX,
    StackRelative,           // sr,S
    StackRelativeIndirectY,  // (sr,S),Y
    BlockMove,
    Abs32,
    Relative,     // short branch displacement
    RelativeLong, // long branch displacement (BRL)
}

pub const ADDRESSING_MODE_COUNT: usize = 24;

impl AddressingMode {
    /// A stable index for table-driven lookups; not `repr(u8)` because the
    /// variant order above groups related modes for readability, not for
    /// numeric layout.
    pub fn index(self) -> usize {
        use AddressingMode::*;
        match self {
            Implied => 0,
            Accumulator => 1,
            Immediate => 2,
            Dp => 3,
            DpX => 4,
            DpY => 5,
            DpIndirectX => 6,
            DpIndirectY => 7,
            DpIndirect => 8,
            DpIndirectLong => 9,
            DpIndirectLongY => 10,
            Abs => 11,
            AbsX => 12,
            AbsY => 13,
            AbsIndirect => 14,
            AbsIndirectX => 15,
            AbsIndirectLong => 16,
            AbsLong => 17,
            AbsLongX => 18,
            StackRelative => 19,
            StackRelativeIndirectY => 20,
            BlockMove => 21,
            Abs32 => 22,
            Relative => 23,
            RelativeLong => 23, // shares the branch-promotion slot with Relative
        }
    }

    /// The "one size up" mode used for promotion: dp -> abs, dp-indexed ->
    /// abs-indexed, abs-indirect stays itself (promotion is retried once).
    pub fn promoted(self) -> Option<AddressingMode> {
        use AddressingMode::*;
        match self {
            Dp => Some(Abs),
            DpX => Some(AbsX),
            DpY => Some(AbsY),
            DpIndirect => Some(AbsIndirect),
            DpIndirectX => Some(AbsIndirectX),
            Relative => Some(RelativeLong),
            _ => None,
        }
    }
}

/// The value object the operand parser produces: an addressing-mode tag, a
/// primary numeric value, an optional secondary value (block-move
/// destination), and the explicit-`B+`-prefix flag.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ParsedOperand {
    pub mode: AddressingMode,
    pub value: u32,
    pub value2: Option<u32>,
    pub b_relative: bool,
}

impl ParsedOperand {
    pub fn simple(mode: AddressingMode, value: u32) -> ParsedOperand {
        ParsedOperand {
            mode,
            value,
            value2: None,
            b_relative: false,
        }
    }

    pub fn implied() -> ParsedOperand {
        ParsedOperand::simple(AddressingMode::Implied, 0)
    }
}

/// Classify a numeric payload by width, per spec 4.2's fan-out rule:
/// `<=0xFF -> dp, <=0xFFFF -> abs, <=0xFFFFFF -> abs-long, else 32-bit abs`.
pub fn classify_width(value: u32) -> AddressingMode {
    if value <= 0xFF {
        AddressingMode::Dp
    } else if value <= 0xFFFF {
        AddressingMode::Abs
    } else if value <= 0xFF_FFFF {
        AddressingMode::AbsLong
    } else {
        AddressingMode::Abs32
    }
}

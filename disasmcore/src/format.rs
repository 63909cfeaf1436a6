//! Renders addressing-mode/value pairs back into the textual syntax
//! `operand_parser` accepts, so a disassembly listing reassembles to the same
//! bytes it came from. One rule threads through several of these: a direct
//! page operand whose value is a multiple of the register stride renders as
//! `R<n>` instead of a literal `$XX` (spec 4.7 step 5's register-alias
//! rendering), for both the standard plane and the extended-ALU family.

use isa::addressing::AddressingMode;
use isa::register::dp_to_register_alias;

/// A direct-page byte, substituting its register alias when aligned.
pub fn dp(value: u8) -> String {
    match dp_to_register_alias(value) {
        Some(n) => format!("R{}", n),
        None => format!("${:02X}", value),
    }
}

fn abs(value: u32) -> String {
    format!("${:04X}", value)
}

fn abs_long(value: u32) -> String {
    format!("${:06X}", value)
}

fn abs32(value: u32) -> String {
    format!("${:08X}", value)
}

/// Renders a decoded standard-plane operand. `b_relative` is always applied
/// to `Abs`/`AbsX`/`AbsY` in 32-bit mode, since that is the only form the
/// operand parser accepts back in that mode.
pub fn standard_operand(mode: AddressingMode, value: u32, value2: Option<u32>, is_32bit: bool) -> String {
    use AddressingMode::*;
    match mode {
        Implied => String::new(),
        Accumulator => "A".to_string(),
        Immediate => format!("#${:X}", value),
        Dp => dp(value as u8),
        DpX => format!("{},X", dp(value as u8)),
        DpY => format!("{},Y", dp(value as u8)),
        DpIndirectX => format!("({},X)", dp(value as u8)),
        DpIndirectY => format!("({}),Y", dp(value as u8)),
        DpIndirect => format!("({})", dp(value as u8)),
        DpIndirectLong => format!("[{}]", dp(value as u8)),
        DpIndirectLongY => format!("[{}],Y", dp(value as u8)),
        Abs if is_32bit => format!("B+{}", abs(value)),
        AbsX if is_32bit => format!("B+{},X", abs(value)),
        AbsY if is_32bit => format!("B+{},Y", abs(value)),
        Abs => abs(value),
        AbsX => format!("{},X", abs(value)),
        AbsY => format!("{},Y", abs(value)),
        AbsIndirect => format!("({})", abs(value)),
        AbsIndirectX => format!("({},X)", abs(value)),
        AbsIndirectLong => format!("[{}]", abs(value)),
        AbsLong => abs_long(value),
        AbsLongX => format!("{},X", abs_long(value)),
        StackRelative => format!("${:02X},S", value as u8),
        StackRelativeIndirectY => format!("(${:02X},S),Y", value as u8),
        BlockMove => format!("${:02X},${:02X}", value as u8, value2.unwrap_or(0) as u8),
        Abs32 => abs32(value),
        Relative | RelativeLong => {
            unreachable!("branch targets are rendered by the caller, which knows pc")
        }
    }
}

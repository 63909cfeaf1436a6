//! Per-instruction decoding: the mirror image of `asmcore::encoder`, built
//! entirely out of the lookup tables `isa` already exposes. Each instruction
//! family here is decoded the same way its encoder counterpart builds it, so
//! a disassembly of an assembled program reassembles to the same bytes.

use isa::addressing::AddressingMode;
use isa::barrel::{self, BarrelInstruction};
use isa::bitfield::{self, BitfieldInstruction};
use isa::constants::{EXT_PREFIX, STP_ESCAPE_SUFFIX, WAI_ESCAPE_SUFFIX, WDM_ESCAPE};
use isa::error::DecodeError;
use isa::ext_alu::{self, ExtAluAddrMode, ExtAluSize};
use isa::extended::{self, ExtAddrMode};
use isa::fpu;
use isa::mnemonic::Mnemonic;
use isa::register::FpuRegister;
use isa::standard;

use crate::context::DecodeContext;
use crate::format;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    pub length: usize,
    pub text: String,
}

fn fixed(length: usize, text: impl Into<String>) -> Decoded {
    Decoded { length, text: text.into() }
}

/// Decodes the instruction at `bytes[0..]`, `pc` being its address. Advances
/// `ctx`'s mode in place when a `REP`/`SEP` is decoded. Never consumes more
/// than `bytes.len()`; a truncated tail or an opcode with no table entry is
/// reported rather than guessed at, so the caller can fall back to a single
/// raw byte and keep making forward progress.
pub fn decode_one(bytes: &[u8], pc: u32, ctx: &mut DecodeContext) -> Result<Decoded, DecodeError> {
    let opcode = *bytes.first().ok_or(DecodeError::TruncatedInstruction)?;

    if ctx.mode.is_32bit() && opcode == WDM_ESCAPE {
        return Ok(match bytes.get(1) {
            Some(&WAI_ESCAPE_SUFFIX) => fixed(2, "WAI"),
            Some(&STP_ESCAPE_SUFFIX) => fixed(2, "STP"),
            _ => fixed(1, format!(".BYTE ${:02X}", opcode)),
        });
    }

    if opcode == EXT_PREFIX {
        let second = *bytes.get(1).ok_or(DecodeError::TruncatedInstruction)?;
        return decode_extended_plane(second, &bytes[2..], ctx);
    }

    decode_standard_plane(opcode, &bytes[1..], pc, ctx)
}

// -------------------------------------------------------------- standard

fn standard_operand_len(mode: AddressingMode) -> usize {
    use AddressingMode::*;
    match mode {
        Implied | Accumulator => 0,
        Dp | DpX | DpY | DpIndirectX | DpIndirectY | DpIndirect | DpIndirectLong
        | DpIndirectLongY | StackRelative | StackRelativeIndirectY => 1,
        Abs | AbsX | AbsY | AbsIndirect | AbsIndirectX | AbsIndirectLong => 2,
        AbsLong | AbsLongX => 3,
        Abs32 => 4,
        Relative => 1,
        RelativeLong => 2,
        Immediate | BlockMove => 0,
    }
}

fn immediate_width(mnemonic: Mnemonic, ctx: &DecodeContext) -> usize {
    if let Some(bytes) = mnemonic.fixed_immediate_width() {
        return bytes as usize;
    }
    if mnemonic.is_memory_accumulator_op() {
        return ctx.mode.m.bytes() as usize;
    }
    if mnemonic.is_index_op() {
        return ctx.mode.x.bytes() as usize;
    }
    1
}

fn read_le(bytes: &[u8], width: usize) -> Result<u32, DecodeError> {
    if bytes.len() < width {
        return Err(DecodeError::TruncatedInstruction);
    }
    let mut value = 0u32;
    for i in 0..width {
        value |= (bytes[i] as u32) << (8 * i);
    }
    Ok(value)
}

fn decode_standard_plane(
    opcode: u8,
    rest: &[u8],
    pc: u32,
    ctx: &mut DecodeContext,
) -> Result<Decoded, DecodeError> {
    if opcode == WDM_ESCAPE {
        // Only reached outside 32-bit mode: WDM is a one-byte-operand
        // standard instruction there, not the 32-bit escape pair.
        let operand = *rest.first().ok_or(DecodeError::TruncatedInstruction)?;
        return Ok(fixed(2, format!("WDM ${:02X}", operand)));
    }

    let (mnemonic, mode) = standard::decode_standard(opcode).ok_or(DecodeError::UnknownOpcode)?;

    if matches!(mode, AddressingMode::Relative | AddressingMode::RelativeLong) {
        let width = standard_operand_len(mode);
        let raw = read_le(rest, width)?;
        let disp = if width == 1 { raw as u8 as i8 as i32 } else { raw as u16 as i16 as i32 };
        let next_pc = pc.wrapping_add(1 + width as u32);
        let target = next_pc.wrapping_add(disp as u32);
        return Ok(fixed(1 + width, format!("{} ${:08X}", mnemonic, target)));
    }

    if mode == AddressingMode::BlockMove {
        let dst = *rest.first().ok_or(DecodeError::TruncatedInstruction)?;
        let src = *rest.get(1).ok_or(DecodeError::TruncatedInstruction)?;
        return Ok(fixed(3, format!("{} ${:02X},${:02X}", mnemonic, src, dst)));
    }

    if mode == AddressingMode::Immediate {
        let width = immediate_width(mnemonic, ctx);
        let value = read_le(rest, width)?;
        if mnemonic == Mnemonic::SEP {
            ctx.apply_sep(value as u8);
        } else if mnemonic == Mnemonic::REP {
            ctx.apply_rep(value as u8);
        }
        let text = if mnemonic == Mnemonic::PEA {
            format!("{} ${:04X}", mnemonic, value)
        } else {
            format!("{} #${:X}", mnemonic, value)
        };
        return Ok(fixed(1 + width, text));
    }

    let width = standard_operand_len(mode);
    let value = read_le(rest, width)?;
    let operand_text = format::standard_operand(mode, value, None, ctx.mode.is_32bit());
    let text = if operand_text.is_empty() {
        mnemonic.to_string()
    } else {
        format!("{} {}", mnemonic, operand_text)
    };
    Ok(fixed(1 + width, text))
}

// -------------------------------------------------------------- extended

fn decode_extended_plane(second: u8, rest: &[u8], ctx: &mut DecodeContext) -> Result<Decoded, DecodeError> {
    if second == barrel::SECOND_OPCODE {
        return decode_barrel(rest);
    }
    if second == bitfield::SECOND_OPCODE {
        return decode_bitfield(rest);
    }
    if (0x80..=0x97).contains(&second) {
        return decode_ext_alu(second, rest);
    }
    if let Some((mnemonic, mode)) = extended::decode_extended(second) {
        return decode_extended_direct(mnemonic, mode, rest);
    }
    if let Some((op, double)) = fpu::decode_two_register_op(second) {
        let byte = *rest.first().ok_or(DecodeError::TruncatedInstruction)?;
        let (dest, src) = fpu::unpack_two_register(byte);
        let suffix = if double { "D" } else { "S" };
        return Ok(fixed(3, format!("{}.{} {}, {}", op, suffix, dest, src)));
    }
    if second == fpu::FCVT_DS || second == fpu::FCVT_SD {
        let byte = *rest.first().ok_or(DecodeError::TruncatedInstruction)?;
        let reg = fpu::unpack_one_register(byte);
        let name = if second == fpu::FCVT_DS { "FCVTDS" } else { "FCVTSD" };
        return Ok(fixed(3, format!("{} {}", name, reg)));
    }
    if let Some(op) = fpu::decode_unary_op(second) {
        let byte = *rest.first().ok_or(DecodeError::TruncatedInstruction)?;
        let reg = fpu::unpack_one_register(byte);
        return Ok(fixed(3, format!("{} {}", op, reg)));
    }
    if matches!(
        second,
        fpu::LDF_DP | fpu::LDF_ABS | fpu::LDF_REGISTER_INDIRECT | fpu::LDF_ABS32
            | fpu::STF_DP | fpu::STF_ABS | fpu::STF_REGISTER_INDIRECT | fpu::STF_ABS32
    ) {
        return decode_fpu_memory(second, rest);
    }
    Err(DecodeError::UnknownOpcode)
}

fn decode_extended_direct(
    mnemonic: extended::ExtMnemonic,
    mode: ExtAddrMode,
    rest: &[u8],
) -> Result<Decoded, DecodeError> {
    let width = mode.operand_len();
    let value = read_le(rest, width)?;
    let operand = match mode {
        ExtAddrMode::Implied => String::new(),
        ExtAddrMode::Byte => format::dp(value as u8),
        ExtAddrMode::Abs => format!("${:04X}", value),
        ExtAddrMode::Quad => format!("${:08X}", value),
    };
    let text = if operand.is_empty() { mnemonic.to_string() } else { format!("{} {}", mnemonic, operand) };
    Ok(fixed(2 + width, text))
}

fn decode_barrel(rest: &[u8]) -> Result<Decoded, DecodeError> {
    if rest.len() < 3 {
        return Err(DecodeError::TruncatedInstruction);
    }
    let bytes = [rest[0], rest[1], rest[2]];
    let inst = BarrelInstruction::decode(bytes).ok_or(DecodeError::UnknownOpcode)?;
    let count_text = match inst.count {
        barrel::ShiftCount::FromAccumulator => "A".to_string(),
        barrel::ShiftCount::Literal(n) => format!("${:02X}", n),
    };
    let text = format!("{} {}, ${:02X}, ${:02X}", inst.op, count_text, inst.dest_dp, inst.src_dp);
    Ok(fixed(5, text))
}

fn decode_bitfield(rest: &[u8]) -> Result<Decoded, DecodeError> {
    if rest.len() < 3 {
        return Err(DecodeError::TruncatedInstruction);
    }
    let bytes = [rest[0], rest[1], rest[2]];
    let inst = BitfieldInstruction::decode(bytes).ok_or(DecodeError::UnknownOpcode)?;
    let text = format!("{} ${:02X}, ${:02X}", inst.op, inst.dest_dp, inst.src_dp);
    Ok(fixed(5, text))
}

// --------------------------------------------------------------- ext-alu

/// Renders an extended-ALU source/destination addressing mode the same way
/// the standard-plane formatter does, reusing its syntax for every mode the
/// two families share.
fn ext_alu_operand(mode: ExtAluAddrMode, value: u32) -> String {
    use ExtAluAddrMode::*;
    match mode {
        Dp => format::dp(value as u8),
        DpX => format!("{},X", format::dp(value as u8)),
        DpY => format!("{},Y", format::dp(value as u8)),
        DpIndirectX => format!("({},X)", format::dp(value as u8)),
        DpIndirectY => format!("({}),Y", format::dp(value as u8)),
        DpIndirect => format!("({})", format::dp(value as u8)),
        DpIndirectLong => format!("[{}]", format::dp(value as u8)),
        DpIndirectLongY => format!("[{}],Y", format::dp(value as u8)),
        Abs => format!("${:04X}", value),
        AbsX => format!("${:04X},X", value),
        AbsY => format!("${:04X},Y", value),
        AbsIndirect => format!("(${:04X})", value),
        AbsIndirectX => format!("(${:04X},X)", value),
        AbsIndirectLong => format!("[${:04X}]", value),
        Abs32 => format!("${:08X}", value),
        Abs32X => format!("${:08X},X", value),
        Abs32Y => format!("${:08X},Y", value),
        Abs32Indirect => format!("(${:08X})", value),
        Abs32IndirectX => format!("(${:08X},X)", value),
        Abs32IndirectLong => format!("[${:08X}]", value),
        Immediate => format!("#${:X}", value),
        StackRelative => format!("${:02X},S", value as u8),
        StackRelativeIndirectY => format!("(${:02X},S),Y", value as u8),
        // Never produced by the text encoder (no source syntax maps to a
        // bare register-direct operand); decoded literally for robustness.
        Accumulator => "A".to_string(),
        X => "X".to_string(),
        Y => "Y".to_string(),
    }
}

fn ext_alu_suffix(size: ExtAluSize) -> &'static str {
    match size {
        ExtAluSize::Byte => "B",
        // `Default` never comes out of the text encoder (only `.B`/`.W`
        // suffixes select an `ExtAluMnemonic` at all); rendered as `.W` so a
        // malformed or hand-assembled mode byte still decodes to something.
        ExtAluSize::Word | ExtAluSize::Default => "W",
    }
}

fn decode_ext_alu(opcode: u8, rest: &[u8]) -> Result<Decoded, DecodeError> {
    let mnemonic = ext_alu::decode_mnemonic(opcode).ok_or(DecodeError::UnknownOpcode)?;
    let mode_byte = *rest.first().ok_or(DecodeError::TruncatedInstruction)?;
    let (size, register_target, addr_mode) =
        ext_alu::unpack_mode_byte(mode_byte).ok_or(DecodeError::UnknownOpcode)?;
    let suffix = ext_alu_suffix(size);
    // 1 for the prefix and 1 for the opcode byte, both already stripped off
    // into `second` by the caller, plus 1 for the mode byte read above.
    let mut consumed = 3;

    if mnemonic.permits_memory_destination() {
        let operand_len = addr_mode.operand_len(size);
        let value = read_le(&rest[1..], operand_len)?;
        consumed += operand_len;
        let text = format!("{}.{} {}", mnemonic, suffix, ext_alu_operand(addr_mode, value));
        return Ok(fixed(consumed, text));
    }

    let mut cursor = &rest[1..];
    let dest_text = if register_target {
        let index = *cursor.first().ok_or(DecodeError::TruncatedInstruction)?;
        cursor = &cursor[1..];
        consumed += 1;
        format!("R{}", index)
    } else {
        "A".to_string()
    };

    if !mnemonic.requires_source() {
        let text = format!("{}.{} {}", mnemonic, suffix, dest_text);
        return Ok(fixed(consumed, text));
    }

    let operand_len = addr_mode.operand_len(size);
    let value = read_le(cursor, operand_len)?;
    consumed += operand_len;
    let text = format!("{}.{} {}, {}", mnemonic, suffix, dest_text, ext_alu_operand(addr_mode, value));
    Ok(fixed(consumed, text))
}

// ------------------------------------------------------------------- FPU

fn decode_fpu_memory(second: u8, rest: &[u8]) -> Result<Decoded, DecodeError> {
    let register_byte = *rest.first().ok_or(DecodeError::TruncatedInstruction)?;
    let reg: FpuRegister = fpu::unpack_one_register(register_byte);
    let (is_load, mode, width) = match second {
        x if x == fpu::LDF_DP => (true, AddressingMode::Dp, 1),
        x if x == fpu::STF_DP => (false, AddressingMode::Dp, 1),
        x if x == fpu::LDF_ABS => (true, AddressingMode::Abs, 2),
        x if x == fpu::STF_ABS => (false, AddressingMode::Abs, 2),
        x if x == fpu::LDF_REGISTER_INDIRECT => (true, AddressingMode::DpIndirect, 1),
        x if x == fpu::STF_REGISTER_INDIRECT => (false, AddressingMode::DpIndirect, 1),
        x if x == fpu::LDF_ABS32 => (true, AddressingMode::Abs32, 4),
        x if x == fpu::STF_ABS32 => (false, AddressingMode::Abs32, 4),
        _ => unreachable!("caller already matched one of the eight LDF/STF opcodes"),
    };
    let value = read_le(&rest[1..], width)?;
    let operand = format::standard_operand(mode, value, None, false);
    let mnemonic = if is_load { "LDF" } else { "STF" };
    Ok(fixed(3 + width, format!("{} {}, {}", mnemonic, reg, operand)))
}

#[cfg(test)]
mod test {
    use super::*;

    fn decode(bytes: &[u8]) -> Decoded {
        let mut ctx = DecodeContext::new();
        decode_one(bytes, 0x1000, &mut ctx).unwrap()
    }

    #[test]
    fn lda_dp_decodes_with_register_alias() {
        let d = decode(&[0xA5, 0x10]);
        assert_eq!(d.length, 2);
        assert_eq!(d.text, "LDA R4");
    }

    #[test]
    fn lda_dp_non_aligned_decodes_as_literal() {
        let d = decode(&[0xA5, 0x11]);
        assert_eq!(d.text, "LDA $11");
    }

    #[test]
    fn lda_immediate_width_tracks_m_flag() {
        let mut ctx = DecodeContext::new();
        let d = decode_one(&[0xA9, 0x34, 0x12], 0x1000, &mut ctx).unwrap();
        assert_eq!(d.length, 3);
        assert_eq!(d.text, "LDA #$1234");
    }

    #[test]
    fn sep_narrows_and_persists_across_calls() {
        let mut ctx = DecodeContext::new();
        let sep = decode_one(&[0xE2, 0x30], 0x1000, &mut ctx).unwrap();
        assert_eq!(sep.text, "SEP #$30");
        let lda = decode_one(&[0xA9, 0x42], 0x1002, &mut ctx).unwrap();
        assert_eq!(lda.length, 2);
        assert_eq!(lda.text, "LDA #$42");
    }

    #[test]
    fn short_branch_resolves_target_from_pc() {
        // BNE $D0 with a -3 displacement from a branch at 0x1000 lands at 0xFFF.
        let mut ctx = DecodeContext::new();
        let d = decode_one(&[0xD0, 0xFD], 0x1000, &mut ctx).unwrap();
        assert_eq!(d.text, "BNE $00000FFF");
    }

    #[test]
    fn register_file_destination_round_trips_through_ext_alu() {
        // LD.W R4, #$ABCD
        let mode_byte = ext_alu::pack_mode_byte(ExtAluSize::Word, true, ExtAluAddrMode::Immediate);
        let bytes = [0x02, 0x80, mode_byte, 0x04, 0xCD, 0xAB];
        let d = decode(&bytes);
        assert_eq!(d.text, "LD.W R4, #$ABCD");
    }

    #[test]
    fn barrel_shift_decodes_all_three_operands() {
        let inst = BarrelInstruction {
            op: barrel::BarrelOp::SHL,
            count: barrel::ShiftCount::Literal(5),
            dest_dp: 0x10,
            src_dp: 0x14,
        };
        let mut bytes = vec![0x02, barrel::SECOND_OPCODE];
        bytes.extend_from_slice(&inst.encode());
        let d = decode(&bytes);
        assert_eq!(d.text, "SHL $05, $10, $14");
    }

    #[test]
    fn unknown_opcode_is_reported_not_guessed() {
        let mut ctx = DecodeContext::new();
        let err = decode_one(&[0x02, 0xFF], 0x1000, &mut ctx).unwrap_err();
        assert_eq!(err, DecodeError::UnknownOpcode);
    }

    #[test]
    fn wai_escape_only_applies_in_32bit_mode() {
        let mut ctx = DecodeContext::new();
        ctx.mode.m = isa::mode::Width::W32;
        ctx.mode.x = isa::mode::Width::W32;
        let d = decode_one(&[0x42, 0xCB], 0x1000, &mut ctx).unwrap();
        assert_eq!(d, fixed(2, "WAI"));
    }

    #[test]
    fn wdm_escape_in_16bit_mode_is_a_two_byte_instruction() {
        let d = decode(&[0x42, 0x07]);
        assert_eq!(d.text, "WDM $07");
    }
}

//! Turns a (mnemonic, operand text) pair into output bytes, bridging the
//! plain addressing-mode algebra in `operand_parser` to the five opcode
//! families in `isa`. Which family a bare mnemonic spelling selects is
//! resolved by an explicit suffix (`.B`/`.W` for the extended-ALU
//! meta-plane, `.S`/`.D` for FPU precision) or, for the handful of names
//! the barrel shifter shares with the standard plane (`ROL`/`ROR`), by
//! operand arity. See DESIGN.md for the full disambiguation rule.

use crate::expr::{self, EvalContext, ExprError};
use crate::operand_parser::{self, split_top_level_commas, OperandError};
use isa::addressing::AddressingMode;
use isa::barrel::{self, BarrelInstruction, BarrelOp, ShiftCount};
use isa::bitfield::{self, BitfieldInstruction, BitfieldOp};
use isa::constants::{EXT_PREFIX, STP_ESCAPE_SUFFIX, WAI_ESCAPE_SUFFIX, WDM_ESCAPE};
use isa::error::EncodeError;
use isa::ext_alu::{self, ExtAluAddrMode, ExtAluMnemonic, ExtAluSize};
use isa::extended::{self, ExtAddrMode, ExtMnemonic};
use isa::fpu;
use isa::mnemonic::Mnemonic;
use isa::mode::ProcessorMode;
use isa::register::FpuRegister;
use isa::standard;

#[derive(Clone, Debug, PartialEq)]
pub enum EncodeLineError {
    Operand(OperandError),
    Encode(EncodeError),
}

impl From<OperandError> for EncodeLineError {
    fn from(e: OperandError) -> EncodeLineError {
        EncodeLineError::Operand(e)
    }
}
impl From<ExprError> for EncodeLineError {
    fn from(e: ExprError) -> EncodeLineError {
        EncodeLineError::Operand(OperandError::Expr(e))
    }
}
impl From<EncodeError> for EncodeLineError {
    fn from(e: EncodeError) -> EncodeLineError {
        EncodeLineError::Encode(e)
    }
}

impl std::fmt::Display for EncodeLineError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            EncodeLineError::Operand(e) => write!(f, "{}", e),
            EncodeLineError::Encode(e) => write!(f, "{}", e),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Suffix {
    None,
    Byte,
    Word,
    Single,
    Double,
}

fn split_suffix(keyword: &str) -> (&str, Suffix) {
    match keyword.rsplit_once('.') {
        Some((base, "B")) | Some((base, "b")) => (base, Suffix::Byte),
        Some((base, "W")) | Some((base, "w")) => (base, Suffix::Word),
        Some((base, "S")) | Some((base, "s")) => (base, Suffix::Single),
        Some((base, "D")) | Some((base, "d")) => (base, Suffix::Double),
        _ => (keyword, Suffix::None),
    }
}

/// Encodes one statement. `pc` is this instruction's address; the branch
/// and immediate-width calculations below read it from `ctx.pc`, which the
/// driver must already have set to that address before calling in.
pub fn encode_line(
    keyword: &str,
    operand_text: &str,
    ctx: &mut EvalContext,
    mode: ProcessorMode,
) -> Result<Vec<u8>, EncodeLineError> {
    let (base, suffix) = split_suffix(keyword);
    let upper = base.to_uppercase();

    match suffix {
        Suffix::Byte | Suffix::Word => {
            let mnemonic: ExtAluMnemonic = upper
                .parse()
                .map_err(|_| EncodeLineError::Encode(EncodeError::UnknownMnemonic))?;
            let size = if suffix == Suffix::Byte { ExtAluSize::Byte } else { ExtAluSize::Word };
            encode_ext_alu(mnemonic, size, operand_text, ctx, mode)
        }
        Suffix::Single | Suffix::Double => {
            let op: fpu::FpuOp = upper
                .parse()
                .map_err(|_| EncodeLineError::Encode(EncodeError::UnknownMnemonic))?;
            encode_fpu_two_register(op, suffix == Suffix::Double, operand_text)
        }
        Suffix::None => encode_unsuffixed(&upper, operand_text, ctx, mode),
    }
}

/// Whether `keyword` (suffix included) names an instruction in any of the
/// five planes, without attempting to encode it. Used by the scanner's
/// label/mnemonic disambiguation and by the driver's pass-1 branch sizing.
pub fn is_instruction_keyword(keyword: &str) -> bool {
    let (base, suffix) = split_suffix(keyword);
    let upper = base.to_uppercase();
    match suffix {
        Suffix::Byte | Suffix::Word => upper.parse::<ExtAluMnemonic>().is_ok(),
        Suffix::Single | Suffix::Double => upper.parse::<fpu::FpuOp>().is_ok(),
        Suffix::None => {
            matches!(upper.as_str(), "SHL" | "SHR" | "SAR")
                || upper.parse::<Mnemonic>().is_ok()
                || upper.parse::<ExtMnemonic>().is_ok()
                || upper.parse::<BitfieldOp>().is_ok()
                || upper.parse::<fpu::FpuUnaryOp>().is_ok()
                || upper == "FCVTDS"
                || upper == "FCVTSD"
                || upper == "LDF"
                || upper == "STF"
        }
    }
}

/// `true` for the short-branch mnemonics (`BCC`..`BVS`, `BRA`) whose pass-1
/// size the driver fixes at 2 bytes rather than computing from a possibly
/// still-forward-referenced target; see `encode_branch`.
pub fn is_branch_mnemonic(keyword: &str) -> bool {
    let (base, suffix) = split_suffix(keyword);
    if suffix != Suffix::None {
        return false;
    }
    base.to_uppercase().parse::<Mnemonic>().map(|m| m.is_branch()).unwrap_or(false)
}

fn encode_unsuffixed(
    upper: &str,
    operand_text: &str,
    ctx: &mut EvalContext,
    mode: ProcessorMode,
) -> Result<Vec<u8>, EncodeLineError> {
    if matches!(upper, "SHL" | "SHR" | "SAR") {
        let op: BarrelOp = upper.parse().expect("matched above");
        return encode_barrel(op, operand_text, ctx);
    }
    if matches!(upper, "ROL" | "ROR") && split_top_level_commas(operand_text).len() == 3 {
        let op: BarrelOp = upper.parse().expect("matched above");
        return encode_barrel(op, operand_text, ctx);
    }
    if let Ok(mnemonic) = upper.parse::<Mnemonic>() {
        return encode_standard_plane(mnemonic, operand_text, ctx, mode);
    }
    if let Ok(mnemonic) = upper.parse::<ExtMnemonic>() {
        return encode_extended_direct(mnemonic, operand_text, ctx);
    }
    if let Ok(op) = upper.parse::<BitfieldOp>() {
        return encode_bitfield(op, operand_text, ctx);
    }
    if let Ok(op) = upper.parse::<fpu::FpuUnaryOp>() {
        return encode_fpu_unary(op, operand_text);
    }
    if upper == "FCVTDS" || upper == "FCVTSD" {
        let op = if upper == "FCVTDS" { fpu::FCVT_DS } else { fpu::FCVT_SD };
        let reg = parse_fpu_register(operand_text)?;
        return Ok(vec![EXT_PREFIX, op, fpu::pack_one_register(reg)]);
    }
    if upper == "LDF" || upper == "STF" {
        return encode_fpu_memory(upper, operand_text, ctx);
    }
    Err(EncodeLineError::Encode(EncodeError::UnknownMnemonic))
}

// ---------------------------------------------------------------- standard

fn encode_standard_plane(
    mnemonic: Mnemonic,
    operand_text: &str,
    ctx: &mut EvalContext,
    mode: ProcessorMode,
) -> Result<Vec<u8>, EncodeLineError> {
    if mnemonic == Mnemonic::WDM {
        if mode.is_32bit() {
            return Err(EncodeLineError::Encode(EncodeError::ReservedOpcode));
        }
        let value = expr::eval(operand_text, ctx)?;
        return Ok(vec![WDM_ESCAPE, value as u8]);
    }
    if mode.is_32bit() && matches!(mnemonic, Mnemonic::WAI | Mnemonic::STP) {
        let suffix = if mnemonic == Mnemonic::WAI { WAI_ESCAPE_SUFFIX } else { STP_ESCAPE_SUFFIX };
        return Ok(vec![WDM_ESCAPE, suffix]);
    }

    if mnemonic.is_branch() {
        return encode_branch(mnemonic, operand_text, ctx);
    }
    if mnemonic == Mnemonic::PER {
        return encode_per(operand_text, ctx);
    }
    if mnemonic == Mnemonic::PEA {
        // Written as a bare 16-bit value, no `#` prefix, despite sharing the
        // Immediate addressing-mode slot with the true immediate forms.
        let value = expr::eval(operand_text, ctx)? as u32;
        let opcode = standard::encode_standard(Mnemonic::PEA, AddressingMode::Immediate)
            .ok_or(EncodeError::InvalidAddressingMode)?;
        let mut out = vec![opcode];
        append_le(&mut out, value, 2);
        return Ok(out);
    }

    let operand = operand_parser::parse_operand(operand_text, ctx)?;

    if operand.mode == AddressingMode::BlockMove {
        let opcode = standard::encode_standard(mnemonic, AddressingMode::BlockMove)
            .ok_or(EncodeError::InvalidAddressingMode)?;
        let dst = operand.value2.ok_or(EncodeError::InvalidAddressingMode)?;
        return Ok(vec![opcode, dst as u8, operand.value as u8]);
    }

    check_32bit_constraints(operand.mode, operand.value, operand.b_relative, mode)?;

    let resolved_mode = resolve_addressing_mode(mnemonic, operand.mode)?;

    let opcode = standard::encode_standard(mnemonic, resolved_mode)
        .ok_or(EncodeError::InvalidAddressingMode)?;

    let mut out = vec![opcode];
    if resolved_mode == AddressingMode::Immediate {
        let width = immediate_width(mnemonic, mode);
        append_le(&mut out, operand.value, width);
    } else {
        append_le(&mut out, operand.value, operand_len(resolved_mode));
    }
    Ok(out)
}

fn resolve_addressing_mode(
    mnemonic: Mnemonic,
    mode: AddressingMode,
) -> Result<AddressingMode, EncodeError> {
    if standard::supports(mnemonic, mode) {
        return Ok(mode);
    }
    if let Some(promoted) = mode.promoted() {
        if standard::supports(mnemonic, promoted) {
            return Ok(promoted);
        }
    }
    Err(EncodeError::InvalidAddressingMode)
}

fn operand_len(mode: AddressingMode) -> usize {
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
        Immediate | BlockMove => 0, // handled by their own callers
    }
}

fn immediate_width(mnemonic: Mnemonic, mode: ProcessorMode) -> usize {
    if let Some(bytes) = mnemonic.fixed_immediate_width() {
        return bytes as usize;
    }
    if mnemonic.is_memory_accumulator_op() {
        return mode.m.bytes() as usize;
    }
    if mnemonic.is_index_op() {
        return mode.x.bytes() as usize;
    }
    1
}

/// 32-bit-mode constraints shared by the standard and extended-ALU planes:
/// unaligned direct-page addresses, 24-bit long addressing, and bare
/// 16-bit absolutes missing their explicit `B+` prefix are all illegal once
/// the processor is in 32-bit mode.
fn check_32bit_constraints(
    operand_mode: AddressingMode,
    value: u32,
    b_relative: bool,
    mode: ProcessorMode,
) -> Result<(), EncodeError> {
    if !mode.is_32bit() {
        return Ok(());
    }
    use AddressingMode::*;
    match operand_mode {
        Dp | DpX | DpY | DpIndirectX | DpIndirectY | DpIndirect | DpIndirectLong
        | DpIndirectLongY => {
            if value % 4 != 0 {
                return Err(EncodeError::UnalignedDp);
            }
        }
        AbsLong => {
            // This magnitude has an `Abs32` form (full 8-digit hex); the
            // 24-bit-long spelling that landed here instead is the
            // ambiguity spec's `Not8DigitAbs32` diagnostic exists to catch.
            return Err(EncodeError::Not8DigitAbs32);
        }
        AbsLongX | AbsIndirectLong => {
            // No indexed or indirect 32-bit absolute mode exists to widen
            // into, so these stay flatly illegal in 32-bit mode.
            return Err(EncodeError::LongAddrIn32Mode);
        }
        Abs | AbsX | AbsY => {
            if !b_relative {
                return Err(EncodeError::MissingBRelative);
            }
        }
        _ => {}
    }
    Ok(())
}

fn encode_branch(
    mnemonic: Mnemonic,
    operand_text: &str,
    ctx: &mut EvalContext,
) -> Result<Vec<u8>, EncodeLineError> {
    let target = expr::eval(operand_text, ctx)? as u32;

    let short_next_pc = ctx.pc.wrapping_add(2);
    let short_disp = target.wrapping_sub(short_next_pc) as i32;
    if (-128..=127).contains(&short_disp) {
        let opcode =
            standard::encode_standard(mnemonic, AddressingMode::Relative).ok_or(EncodeError::InvalidAddressingMode)?;
        return Ok(vec![opcode, short_disp as i8 as u8]);
    }

    if let Some(long_form) = mnemonic.long_branch_form() {
        let long_next_pc = ctx.pc.wrapping_add(3);
        let long_disp = target.wrapping_sub(long_next_pc) as i32;
        if (-32768..=32767).contains(&long_disp) {
            let opcode = standard::encode_standard(long_form, AddressingMode::RelativeLong)
                .ok_or(EncodeError::InvalidAddressingMode)?;
            let mut out = vec![opcode];
            append_le(&mut out, long_disp as u16 as u32, 2);
            return Ok(out);
        }
    }

    Err(EncodeLineError::Encode(EncodeError::BranchOutOfRange))
}

/// `PER` pushes a 16-bit displacement from the instruction following it to
/// the target, the same shape as a long branch but never promoted or
/// conditional — just a plain out-of-range error past the 16-bit window.
fn encode_per(operand_text: &str, ctx: &mut EvalContext) -> Result<Vec<u8>, EncodeLineError> {
    let target = expr::eval(operand_text, ctx)? as u32;
    let next_pc = ctx.pc.wrapping_add(3);
    let disp = target.wrapping_sub(next_pc) as i32;
    if !(-32768..=32767).contains(&disp) {
        return Err(EncodeLineError::Encode(EncodeError::BranchOutOfRange));
    }
    let opcode = standard::encode_standard(Mnemonic::PER, AddressingMode::RelativeLong)
        .ok_or(EncodeError::InvalidAddressingMode)?;
    let mut out = vec![opcode];
    append_le(&mut out, disp as u16 as u32, 2);
    Ok(out)
}

fn append_le(out: &mut Vec<u8>, value: u32, width: usize) {
    for i in 0..width {
        out.push(((value >> (8 * i)) & 0xFF) as u8);
    }
}

// ----------------------------------------------------------- extended direct

fn encode_extended_direct(
    mnemonic: ExtMnemonic,
    operand_text: &str,
    ctx: &mut EvalContext,
) -> Result<Vec<u8>, EncodeLineError> {
    let operand = operand_parser::parse_operand(operand_text, ctx)?;
    let ext_mode = match operand.mode {
        AddressingMode::Implied => ExtAddrMode::Implied,
        AddressingMode::Dp | AddressingMode::Immediate => ExtAddrMode::Byte,
        AddressingMode::Abs => ExtAddrMode::Abs,
        AddressingMode::Abs32 => ExtAddrMode::Quad,
        _ => return Err(EncodeLineError::Encode(EncodeError::InvalidAddressingMode)),
    };
    let opcode =
        extended::encode_extended(mnemonic, ext_mode).ok_or(EncodeError::InvalidAddressingMode)?;
    let mut out = vec![EXT_PREFIX, opcode];
    append_le(&mut out, operand.value, ext_mode.operand_len());
    Ok(out)
}

// -------------------------------------------------------------- ext-alu meta

/// A register alias written as `Rn` (not its resolved dp value — the raw
/// text, so a dp address that merely happens to equal a register's address
/// is never mistaken for a register-file destination).
fn register_alias_index(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('R').or_else(|| trimmed.strip_prefix('r'))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u32 = digits.parse().ok()?;
    if n < isa::constants::REGISTER_ALIAS_COUNT {
        Some(n)
    } else {
        None
    }
}

fn ext_alu_addr_mode(mode: AddressingMode) -> Result<ExtAluAddrMode, EncodeError> {
    use AddressingMode::*;
    Ok(match mode {
        Immediate => ExtAluAddrMode::Immediate,
        Dp => ExtAluAddrMode::Dp,
        DpX => ExtAluAddrMode::DpX,
        DpY => ExtAluAddrMode::DpY,
        DpIndirectX => ExtAluAddrMode::DpIndirectX,
        DpIndirectY => ExtAluAddrMode::DpIndirectY,
        DpIndirect => ExtAluAddrMode::DpIndirect,
        DpIndirectLong => ExtAluAddrMode::DpIndirectLong,
        DpIndirectLongY => ExtAluAddrMode::DpIndirectLongY,
        Abs => ExtAluAddrMode::Abs,
        AbsX => ExtAluAddrMode::AbsX,
        AbsY => ExtAluAddrMode::AbsY,
        AbsIndirect => ExtAluAddrMode::AbsIndirect,
        AbsIndirectX => ExtAluAddrMode::AbsIndirectX,
        AbsIndirectLong => ExtAluAddrMode::AbsIndirectLong,
        Abs32 => ExtAluAddrMode::Abs32,
        StackRelative => ExtAluAddrMode::StackRelative,
        StackRelativeIndirectY => ExtAluAddrMode::StackRelativeIndirectY,
        _ => return Err(EncodeError::InvalidAddressingMode),
    })
}

fn encode_ext_alu(
    mnemonic: ExtAluMnemonic,
    size: ExtAluSize,
    operand_text: &str,
    ctx: &mut EvalContext,
    mode: ProcessorMode,
) -> Result<Vec<u8>, EncodeLineError> {
    let parts = split_top_level_commas(operand_text);
    let opcode = ext_alu::encode_mnemonic(mnemonic);

    if mnemonic.permits_memory_destination() {
        let text = parts[0];
        let operand = operand_parser::parse_operand(text, ctx)?;
        check_32bit_constraints(operand.mode, operand.value, operand.b_relative, mode)?;
        let addr_mode = ext_alu_addr_mode(operand.mode)?;
        let mode_byte = ext_alu::pack_mode_byte(size, false, addr_mode);
        let mut out = vec![EXT_PREFIX, opcode, mode_byte];
        append_le(&mut out, operand.value, addr_mode.operand_len(size));
        return Ok(out);
    }

    let dest_text = parts[0].trim();
    let (register_target, register_index) = match register_alias_index(dest_text) {
        Some(n) => (true, Some(n)),
        None if dest_text.eq_ignore_ascii_case("a") => (false, None),
        None => return Err(EncodeLineError::Encode(EncodeError::InvalidAddressingMode)),
    };

    if !mnemonic.requires_source() {
        // Unary forms operate in place on the register file or the
        // accumulator; `Accumulator` is a zero-length mode placeholder
        // either way, the register-target bit is what actually selects it.
        let mode_byte = ext_alu::pack_mode_byte(size, register_target, ExtAluAddrMode::Accumulator);
        let mut out = vec![EXT_PREFIX, opcode, mode_byte];
        if let Some(n) = register_index {
            out.push(n as u8);
        }
        return Ok(out);
    }

    let src_text = parts.get(1).copied().ok_or(EncodeError::InvalidAddressingMode)?;
    let src = operand_parser::parse_operand(src_text, ctx)?;
    check_32bit_constraints(src.mode, src.value, src.b_relative, mode)?;
    let addr_mode = ext_alu_addr_mode(src.mode)?;
    let mode_byte = ext_alu::pack_mode_byte(size, register_target, addr_mode);
    let mut out = vec![EXT_PREFIX, opcode, mode_byte];
    if let Some(n) = register_index {
        out.push(n as u8);
    }
    append_le(&mut out, src.value, addr_mode.operand_len(size));
    Ok(out)
}

// ----------------------------------------------------------------- barrel

fn encode_barrel(
    op: BarrelOp,
    operand_text: &str,
    ctx: &mut EvalContext,
) -> Result<Vec<u8>, EncodeLineError> {
    let parts = split_top_level_commas(operand_text);
    if parts.len() != 3 {
        return Err(EncodeLineError::Encode(EncodeError::InvalidAddressingMode));
    }
    let count = if parts[0].trim().eq_ignore_ascii_case("a") {
        ShiftCount::FromAccumulator
    } else {
        ShiftCount::Literal(expr::eval(parts[0], ctx)? as u8)
    };
    let dest_dp = expr::eval(parts[1], ctx)? as u8;
    let src_dp = expr::eval(parts[2], ctx)? as u8;
    let inst = BarrelInstruction { op, count, dest_dp, src_dp };
    let mut out = vec![EXT_PREFIX, barrel::SECOND_OPCODE];
    out.extend_from_slice(&inst.encode());
    Ok(out)
}

// --------------------------------------------------------------- bit field

fn encode_bitfield(
    op: BitfieldOp,
    operand_text: &str,
    ctx: &mut EvalContext,
) -> Result<Vec<u8>, EncodeLineError> {
    let parts = split_top_level_commas(operand_text);
    if parts.len() != 2 {
        return Err(EncodeLineError::Encode(EncodeError::InvalidAddressingMode));
    }
    let dest_dp = expr::eval(parts[0], ctx)? as u8;
    let src_dp = expr::eval(parts[1], ctx)? as u8;
    let inst = BitfieldInstruction { op, dest_dp, src_dp };
    let mut out = vec![EXT_PREFIX, bitfield::SECOND_OPCODE];
    out.extend_from_slice(&inst.encode());
    Ok(out)
}

// -------------------------------------------------------------------- FPU

fn parse_fpu_register(text: &str) -> Result<FpuRegister, EncodeLineError> {
    text.trim()
        .to_uppercase()
        .parse()
        .map_err(|_| EncodeLineError::Encode(EncodeError::InvalidAddressingMode))
}

fn encode_fpu_two_register(
    op: fpu::FpuOp,
    double: bool,
    operand_text: &str,
) -> Result<Vec<u8>, EncodeLineError> {
    let parts = split_top_level_commas(operand_text);
    if parts.len() != 2 {
        return Err(EncodeLineError::Encode(EncodeError::InvalidAddressingMode));
    }
    let dest = parse_fpu_register(parts[0])?;
    let src = parse_fpu_register(parts[1])?;
    let opcode = fpu::encode_two_register_op(op, double);
    Ok(vec![EXT_PREFIX, opcode, fpu::pack_two_register(dest, src)])
}

fn encode_fpu_unary(op: fpu::FpuUnaryOp, operand_text: &str) -> Result<Vec<u8>, EncodeLineError> {
    let reg = parse_fpu_register(operand_text)?;
    let opcode = fpu::encode_unary_op(op);
    Ok(vec![EXT_PREFIX, opcode, fpu::pack_one_register(reg)])
}

fn encode_fpu_memory(
    upper: &str,
    operand_text: &str,
    ctx: &mut EvalContext,
) -> Result<Vec<u8>, EncodeLineError> {
    let parts = split_top_level_commas(operand_text);
    if parts.len() != 2 {
        return Err(EncodeLineError::Encode(EncodeError::InvalidAddressingMode));
    }
    let reg = parse_fpu_register(parts[0])?;
    let operand = operand_parser::parse_operand(parts[1], ctx)?;
    let is_load = upper == "LDF";
    let (opcode, operand_len) = match operand.mode {
        AddressingMode::Dp => (if is_load { fpu::LDF_DP } else { fpu::STF_DP }, 1),
        AddressingMode::Abs => (if is_load { fpu::LDF_ABS } else { fpu::STF_ABS }, 2),
        AddressingMode::DpIndirect => {
            (if is_load { fpu::LDF_REGISTER_INDIRECT } else { fpu::STF_REGISTER_INDIRECT }, 1)
        }
        AddressingMode::Abs32 => (if is_load { fpu::LDF_ABS32 } else { fpu::STF_ABS32 }, 4),
        _ => return Err(EncodeLineError::Encode(EncodeError::InvalidAddressingMode)),
    };
    let mut out = vec![EXT_PREFIX, opcode, fpu::pack_one_register(reg)];
    append_le(&mut out, operand.value, operand_len);
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::expr::PassMode;
    use crate::symbol::SymbolTable;

    fn encode(keyword: &str, operand: &str) -> Vec<u8> {
        let mut symbols = SymbolTable::new();
        let mut ctx = EvalContext { symbols: &mut symbols, pc: 0x1000, pass: PassMode::Second };
        encode_line(keyword, operand, &mut ctx, ProcessorMode::default()).unwrap()
    }

    #[test]
    fn lda_immediate_in_32bit_mode_is_4_bytes() {
        let bytes = encode("LDA", "#$12345678");
        assert_eq!(bytes[0], 0xA9);
        assert_eq!(bytes.len(), 5);
    }

    #[test]
    fn lda_dp_requires_4byte_alignment_in_32bit_mode() {
        let mut symbols = SymbolTable::new();
        let mut ctx = EvalContext { symbols: &mut symbols, pc: 0x1000, pass: PassMode::Second };
        let err = encode_line("LDA", "$11", &mut ctx, ProcessorMode::default()).unwrap_err();
        assert_eq!(err, EncodeLineError::Encode(EncodeError::UnalignedDp));
    }

    #[test]
    fn bare_abs_without_b_plus_is_rejected_in_32bit_mode() {
        let mut symbols = SymbolTable::new();
        let mut ctx = EvalContext { symbols: &mut symbols, pc: 0x1000, pass: PassMode::Second };
        let err = encode_line("LDA", "$1234", &mut ctx, ProcessorMode::default()).unwrap_err();
        assert_eq!(err, EncodeLineError::Encode(EncodeError::MissingBRelative));
    }

    #[test]
    fn b_relative_prefix_is_accepted_in_32bit_mode() {
        let bytes = encode("LDA", "B+$1234");
        assert_eq!(bytes[0], 0xAD);
    }

    #[test]
    fn full_8_digit_hex_abs32_is_legal_in_32bit_mode() {
        // LDQ's extended-plane `Quad` form is the literal-addressed memory
        // reference the `AbsLong`-in-32-bit-mode restriction otherwise shuts
        // out of the 0x10000-0xFFFFFF range: written with full 8-digit hex
        // it resolves to `Abs32`, which that restriction never touches.
        let bytes = encode("LDQ", "$0001ABCD");
        assert_eq!(bytes[0], EXT_PREFIX);
        assert_eq!(bytes[1], 0x1D);
        assert_eq!(bytes.len(), 6);
        assert_eq!(&bytes[2..6], &[0xCD, 0xAB, 0x01, 0x00]);
    }

    #[test]
    fn short_form_long_address_in_that_range_needs_8_digit_hex() {
        let mut symbols = SymbolTable::new();
        let mut ctx = EvalContext { symbols: &mut symbols, pc: 0x1000, pass: PassMode::Second };
        let err = encode_line("LDA", "$1ABCD", &mut ctx, ProcessorMode::default()).unwrap_err();
        assert_eq!(err, EncodeLineError::Encode(EncodeError::Not8DigitAbs32));
    }

    #[test]
    fn branch_in_range_is_a_short_form() {
        let bytes = encode("BNE", "$1005");
        assert_eq!(bytes, vec![0xD0, 0x03]);
    }

    #[test]
    fn bra_out_of_short_range_promotes_to_brl() {
        let bytes = encode("BRA", "$2000");
        assert_eq!(bytes[0], 0x82);
        assert_eq!(bytes.len(), 3);
    }

    #[test]
    fn bne_out_of_range_has_no_long_form() {
        let mut symbols = SymbolTable::new();
        let mut ctx = EvalContext { symbols: &mut symbols, pc: 0x1000, pass: PassMode::Second };
        let err = encode_line("BNE", "$4000", &mut ctx, ProcessorMode::default()).unwrap_err();
        assert_eq!(err, EncodeLineError::Encode(EncodeError::BranchOutOfRange));
    }

    #[test]
    fn per_pushes_a_16bit_displacement() {
        let bytes = encode("PER", "$1010");
        assert_eq!(bytes[0], 0x62);
        assert_eq!(&bytes[1..3], &[0x0D, 0x00]);
    }

    #[test]
    fn pea_takes_a_bare_16bit_value_with_no_hash() {
        let bytes = encode("PEA", "$1234");
        assert_eq!(bytes, vec![0xF4, 0x34, 0x12]);
    }

    #[test]
    fn block_move_swaps_wire_order() {
        let bytes = encode("MVP", "$10,$20");
        assert_eq!(bytes, vec![0x44, 0x20, 0x10]);
    }

    #[test]
    fn ext_alu_register_destination_gets_an_index_byte() {
        let bytes = encode("LD.W", "R4, #$ABCD");
        assert_eq!(bytes[0], EXT_PREFIX);
        assert_eq!(bytes[1], 0x80);
        assert_eq!(bytes[2], ext_alu::pack_mode_byte(ExtAluSize::Word, true, ExtAluAddrMode::Immediate));
        assert_eq!(bytes[3], 4); // register index
        assert_eq!(&bytes[4..6], &[0xCD, 0xAB]);
    }

    #[test]
    fn ext_alu_accumulator_destination_has_no_index_byte() {
        let bytes = encode("ADC.B", "A, #$12");
        assert_eq!(bytes[0], EXT_PREFIX);
        assert_eq!(bytes[1], 0x82);
        assert_eq!(bytes.len(), 4);
    }

    #[test]
    fn barrel_shift_with_literal_count() {
        let bytes = encode("SHL", "5, $10, $14");
        assert_eq!(bytes[0], EXT_PREFIX);
        assert_eq!(bytes[1], barrel::SECOND_OPCODE);
        assert_eq!(bytes[2], (0u8 << 5) | 5);
        assert_eq!(&bytes[3..5], &[0x10, 0x14]);
    }

    #[test]
    fn rol_with_three_operands_is_the_barrel_form() {
        let bytes = encode("ROL", "A, $10, $14");
        assert_eq!(bytes[1], barrel::SECOND_OPCODE);
    }

    #[test]
    fn rol_with_one_operand_is_the_standard_form() {
        let bytes = encode("ROL", "$10");
        assert_eq!(bytes, vec![0x26, 0x10]);
    }

    #[test]
    fn bitfield_popcount() {
        let bytes = encode("POPCNT", "$20, $24");
        assert_eq!(bytes[0], EXT_PREFIX);
        assert_eq!(bytes[1], bitfield::SECOND_OPCODE);
        assert_eq!(bytes[2], bitfield::encode_subop(BitfieldOp::POPCNT));
    }

    #[test]
    fn fpu_two_register_single_precision() {
        let bytes = encode("FADD.S", "F1, F2");
        assert_eq!(bytes, vec![EXT_PREFIX, 0xA0, fpu::pack_two_register(FpuRegister::F1, FpuRegister::F2)]);
    }

    #[test]
    fn fpu_two_register_double_precision() {
        let bytes = encode("FADD.D", "F1, F2");
        assert_eq!(bytes[1], 0xA1);
    }

    #[test]
    fn ldf_register_indirect_via_dp_parens() {
        let bytes = encode("LDF", "F3, ($10)");
        assert_eq!(bytes[1], fpu::LDF_REGISTER_INDIRECT);
    }

    #[test]
    fn is_instruction_keyword_covers_every_plane() {
        assert!(is_instruction_keyword("LDA"));
        assert!(is_instruction_keyword("MUL"));
        assert!(is_instruction_keyword("LD.W"));
        assert!(is_instruction_keyword("FADD.S"));
        assert!(is_instruction_keyword("POPCNT"));
        assert!(is_instruction_keyword("SHL"));
        assert!(is_instruction_keyword("LDF"));
        assert!(!is_instruction_keyword("COUNTER"));
    }

    #[test]
    fn is_branch_mnemonic_excludes_non_branches_and_suffixed_forms() {
        assert!(is_branch_mnemonic("BNE"));
        assert!(is_branch_mnemonic("BRA"));
        assert!(!is_branch_mnemonic("BRL"));
        assert!(!is_branch_mnemonic("LDA"));
        assert!(!is_branch_mnemonic("ADC.B"));
    }
}

//! Classifies the text following a mnemonic into an addressing mode and its
//! numeric payload. Depends only on the expression evaluator; it knows
//! nothing about which mnemonics exist, so branch/width promotion stays in
//! the encoder.

use crate::expr::{self, EvalContext, ExprError};
use isa::addressing::{classify_width, AddressingMode, ParsedOperand};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperandError {
    Expr(ExprError),
    Malformed(String),
}

impl From<ExprError> for OperandError {
    fn from(err: ExprError) -> OperandError {
        OperandError::Expr(err)
    }
}

impl std::fmt::Display for OperandError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            OperandError::Expr(e) => write!(f, "{}", e),
            OperandError::Malformed(msg) => write!(f, "{}", msg),
        }
    }
}

pub fn parse_operand(text: &str, ctx: &mut EvalContext) -> Result<ParsedOperand, OperandError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Ok(ParsedOperand::implied());
    }
    if trimmed.eq_ignore_ascii_case("a") {
        return Ok(ParsedOperand::simple(AddressingMode::Accumulator, 0));
    }
    if let Some(rest) = trimmed.strip_prefix('#') {
        let value = expr::eval(rest, ctx)?;
        return Ok(ParsedOperand::simple(AddressingMode::Immediate, value as u32));
    }
    if trimmed.starts_with('(') || trimmed.starts_with('[') {
        return parse_bracketed(trimmed, ctx);
    }
    if let Some(rest) = strip_b_plus(trimmed) {
        let value = expr::eval(rest, ctx)?;
        if value > 0xFFFF {
            return Err(OperandError::Malformed(
                "B+offset value must fit in 16 bits".to_string(),
            ));
        }
        let mut operand = ParsedOperand::simple(AddressingMode::Abs, value as u32);
        operand.b_relative = true;
        return Ok(operand);
    }

    let parts = split_top_level_commas(trimmed);
    let first_value = expr::eval(parts[0], ctx)?;
    let first_width = classify_operand_width(parts[0], first_value as u32);
    if parts.len() == 1 {
        return Ok(ParsedOperand::simple(first_width, first_value as u32));
    }

    let second = parts[1].trim();
    let mode = match second.to_uppercase().as_str() {
        "X" => indexed_x(first_width),
        "Y" => indexed_y(first_width),
        "S" => Some(AddressingMode::StackRelative),
        _ => None,
    };

    if let Some(mode) = mode {
        return Ok(ParsedOperand::simple(mode, first_value as u32));
    }

    // Not an index suffix: a block-move `src,dst` pair.
    let second_value = expr::eval(second, ctx)?;
    Ok(ParsedOperand {
        mode: AddressingMode::BlockMove,
        value: first_value as u32,
        value2: Some(second_value as u32),
        b_relative: false,
    })
}

/// `classify_width` alone picks `Abs32` only once the magnitude overflows
/// 24 bits, so a value like `$0001ABCD` (<=0xFFFFFF) would otherwise fall
/// into the `AbsLong` bucket with no way to ask for `Abs32` instead. A bare
/// literal written with a full 8-digit hex form is the surface syntax that
/// asks for `Abs32` regardless of its magnitude; anything else still falls
/// out by value the way `classify_width` always has.
fn classify_operand_width(text: &str, value: u32) -> AddressingMode {
    if is_explicit_abs32_literal(text) {
        AddressingMode::Abs32
    } else {
        classify_width(value)
    }
}

fn is_explicit_abs32_literal(text: &str) -> bool {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix('$')
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix("0X"));
    matches!(digits, Some(d) if d.len() == 8 && d.chars().all(|c| c.is_ascii_hexdigit()))
}

fn indexed_x(base: AddressingMode) -> Option<AddressingMode> {
    match base {
        AddressingMode::Dp => Some(AddressingMode::DpX),
        AddressingMode::Abs => Some(AddressingMode::AbsX),
        AddressingMode::AbsLong => Some(AddressingMode::AbsLongX),
        _ => None,
    }
}

fn indexed_y(base: AddressingMode) -> Option<AddressingMode> {
    match base {
        AddressingMode::Dp => Some(AddressingMode::DpY),
        AddressingMode::Abs => Some(AddressingMode::AbsY),
        _ => None,
    }
}

fn strip_b_plus(text: &str) -> Option<&str> {
    if text.len() >= 2 && text.as_bytes()[0].eq_ignore_ascii_case(&b'B') && text.as_bytes()[1] == b'+' {
        Some(&text[2..])
    } else {
        None
    }
}

fn parse_bracketed(text: &str, ctx: &mut EvalContext) -> Result<ParsedOperand, OperandError> {
    let open = text.chars().next().unwrap();
    let close_char = if open == '(' { ')' } else { ']' };
    let close_idx = find_matching_close(text, close_char)
        .ok_or_else(|| OperandError::Malformed(format!("unmatched \"{}\"", open)))?;
    let inner = &text[1..close_idx];
    let after = text[close_idx + 1..].trim();

    let inner_parts = split_top_level_commas(inner);
    let base_expr = inner_parts[0];
    let inner_suffix = inner_parts.get(1).map(|s| s.trim().to_uppercase());

    let value = expr::eval(base_expr, ctx)?;
    let width = classify_width(value as u32);

    let after_y = after.eq_ignore_ascii_case(",Y");
    if !after.is_empty() && !after_y {
        return Err(OperandError::Malformed(format!("unexpected trailing \"{}\"", after)));
    }

    let mode = match (open, inner_suffix.as_deref(), after_y) {
        ('(', None, false) => promote_or(width, AddressingMode::DpIndirect, AddressingMode::AbsIndirect),
        ('(', Some("X"), false) => {
            promote_or(width, AddressingMode::DpIndirectX, AddressingMode::AbsIndirectX)
        }
        ('(', None, true) => AddressingMode::DpIndirectY,
        ('(', Some("S"), true) => AddressingMode::StackRelativeIndirectY,
        ('[', None, false) => {
            promote_or(width, AddressingMode::DpIndirectLong, AddressingMode::AbsIndirectLong)
        }
        ('[', None, true) => AddressingMode::DpIndirectLongY,
        _ => {
            return Err(OperandError::Malformed(format!(
                "unrecognised indirect addressing form \"{}\"",
                text
            )))
        }
    };

    Ok(ParsedOperand::simple(mode, value as u32))
}

fn promote_or(width: AddressingMode, dp_form: AddressingMode, abs_form: AddressingMode) -> AddressingMode {
    if width == AddressingMode::Dp {
        dp_form
    } else {
        abs_form
    }
}

/// Splits on top-level commas only: commas nested inside `()`/`[]` or a
/// char literal do not count as separators.
pub(crate) fn split_top_level_commas(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    let mut in_char_lit = false;
    let bytes = text.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => in_char_lit = !in_char_lit,
            b'(' | b'[' if !in_char_lit => depth += 1,
            b')' | b']' if !in_char_lit => depth -= 1,
            b',' if !in_char_lit && depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(text[start..].trim());
    parts
}

fn find_matching_close(text: &str, close: char) -> Option<usize> {
    let open = text.chars().next()?;
    let mut depth = 0i32;
    for (idx, c) in text.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::expr::PassMode;
    use crate::symbol::SymbolTable;

    fn parse(text: &str) -> ParsedOperand {
        let mut symbols = SymbolTable::new();
        let mut ctx = EvalContext {
            symbols: &mut symbols,
            pc: 0x1000,
            pass: PassMode::Second,
        };
        parse_operand(text, &mut ctx).unwrap()
    }

    #[test]
    fn empty_is_implied() {
        assert_eq!(parse("").mode, AddressingMode::Implied);
    }

    #[test]
    fn bare_a_is_accumulator() {
        assert_eq!(parse("A").mode, AddressingMode::Accumulator);
        assert_eq!(parse("a").mode, AddressingMode::Accumulator);
    }

    #[test]
    fn immediate() {
        let op = parse("#$42");
        assert_eq!(op.mode, AddressingMode::Immediate);
        assert_eq!(op.value, 0x42);
    }

    #[test]
    fn dp_and_abs_fan_out_on_width() {
        assert_eq!(parse("$10").mode, AddressingMode::Dp);
        assert_eq!(parse("$1234").mode, AddressingMode::Abs);
        assert_eq!(parse("$123456").mode, AddressingMode::AbsLong);
        assert_eq!(parse("$12345678").mode, AddressingMode::Abs32);
    }

    #[test]
    fn indexed_forms() {
        assert_eq!(parse("$10,X").mode, AddressingMode::DpX);
        assert_eq!(parse("$1234,Y").mode, AddressingMode::AbsY);
    }

    #[test]
    fn dp_indirect_family() {
        assert_eq!(parse("($10,X)").mode, AddressingMode::DpIndirectX);
        assert_eq!(parse("($10),Y").mode, AddressingMode::DpIndirectY);
        assert_eq!(parse("($10)").mode, AddressingMode::DpIndirect);
        assert_eq!(parse("[$10]").mode, AddressingMode::DpIndirectLong);
        assert_eq!(parse("[$10],Y").mode, AddressingMode::DpIndirectLongY);
    }

    #[test]
    fn stack_relative_family() {
        assert_eq!(parse("$04,S").mode, AddressingMode::StackRelative);
        assert_eq!(parse("($04,S),Y").mode, AddressingMode::StackRelativeIndirectY);
    }

    #[test]
    fn abs_indirect_family_promotes_on_width() {
        assert_eq!(parse("($1234)").mode, AddressingMode::AbsIndirect);
        assert_eq!(parse("($1234,X)").mode, AddressingMode::AbsIndirectX);
        assert_eq!(parse("[$1234]").mode, AddressingMode::AbsIndirectLong);
    }

    #[test]
    fn b_relative_explicit_prefix() {
        let op = parse("B+$1234");
        assert_eq!(op.mode, AddressingMode::Abs);
        assert!(op.b_relative);
    }

    #[test]
    fn full_8_digit_hex_selects_abs32_even_under_0xffffff() {
        assert_eq!(parse("$0001ABCD").mode, AddressingMode::Abs32);
        assert_eq!(parse("$0001ABCD").value, 0x0001ABCD);
        assert_eq!(parse("0x0001ABCD").mode, AddressingMode::Abs32);
    }

    #[test]
    fn short_hex_in_the_same_range_still_classifies_as_abs_long() {
        assert_eq!(parse("$1ABCD").mode, AddressingMode::AbsLong);
    }

    #[test]
    fn block_move_keeps_source_then_dest_order() {
        let op = parse("$10,$20");
        assert_eq!(op.mode, AddressingMode::BlockMove);
        assert_eq!(op.value, 0x10);
        assert_eq!(op.value2, Some(0x20));
    }
}

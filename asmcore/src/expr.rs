//! `expr := prefix? primary (binop expr)* | '(' expr ')'`. Prefix operators
//! (`-`, `<`, `>`, `^`) apply to the entire following sub-expression; binary
//! operators associate left-to-right with no precedence distinction.

use crate::scanner::{AsmParser, Rule};
use crate::symbol::{register_alias_lookup, SymbolTable};
use pest::iterators::Pair;
use pest::Parser;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ExprError {
    BadNumber(String),
    BadCharLiteral(String),
    UnknownEscape(char),
    DivByZero,
    ModByZero,
    UndefinedSymbol(String),
    Syntax(String),
}

impl std::fmt::Display for ExprError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ExprError::BadNumber(s) => write!(f, "invalid numeric literal \"{}\"", s),
            ExprError::BadCharLiteral(s) => write!(f, "invalid character literal \"{}\"", s),
            ExprError::UnknownEscape(c) => write!(f, "unknown character escape \"\\{}\"", c),
            ExprError::DivByZero => write!(f, "division by zero"),
            ExprError::ModByZero => write!(f, "modulo by zero"),
            ExprError::UndefinedSymbol(name) => write!(f, "undefined symbol \"{}\"", name),
            ExprError::Syntax(msg) => write!(f, "{}", msg),
        }
    }
}

/// Whether an unknown identifier is a hard error (pass 2) or a silently
/// accepted placeholder (pass 1).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PassMode {
    First,
    Second,
}

pub struct EvalContext<'a> {
    pub symbols: &'a mut SymbolTable,
    pub pc: u32,
    pub pass: PassMode,
}

pub fn parse_expr(text: &str) -> Result<Pair<Rule>, ExprError> {
    let mut pairs =
        AsmParser::parse(Rule::expr, text.trim()).map_err(|e| ExprError::Syntax(e.to_string()))?;
    Ok(pairs.next().unwrap().into_inner().next().unwrap())
}

pub fn eval(text: &str, ctx: &mut EvalContext) -> Result<i64, ExprError> {
    let pair = parse_expr(text)?;
    eval_inner(pair, ctx)
}

fn eval_inner(pair: Pair<Rule>, ctx: &mut EvalContext) -> Result<i64, ExprError> {
    debug_assert_eq!(pair.as_rule(), Rule::expr_inner);
    let mut terms = pair.into_inner();
    let mut acc = eval_prefixed_term(terms.next().unwrap(), ctx)?;
    let mut rest = terms;
    while let Some(op) = rest.next() {
        let rhs_pair = rest.next().unwrap();
        let rhs = eval_prefixed_term(rhs_pair, ctx)?;
        acc = apply_binop(op.as_str(), acc, rhs)?;
    }
    Ok(acc)
}

fn apply_binop(op: &str, lhs: i64, rhs: i64) -> Result<i64, ExprError> {
    match op {
        "+" => Ok(lhs.wrapping_add(rhs)),
        "-" => Ok(lhs.wrapping_sub(rhs)),
        "*" => Ok(lhs.wrapping_mul(rhs)),
        "/" => {
            if rhs == 0 {
                Err(ExprError::DivByZero)
            } else {
                Ok(lhs.wrapping_div(rhs))
            }
        }
        "%" => {
            if rhs == 0 {
                Err(ExprError::ModByZero)
            } else {
                Ok(lhs.wrapping_rem(rhs))
            }
        }
        "&" => Ok(lhs & rhs),
        "|" => Ok(lhs | rhs),
        "^" => Ok(lhs ^ rhs),
        other => Err(ExprError::Syntax(format!("unknown operator \"{}\"", other))),
    }
}

fn eval_prefixed_term(pair: Pair<Rule>, ctx: &mut EvalContext) -> Result<i64, ExprError> {
    debug_assert_eq!(pair.as_rule(), Rule::prefixed_term);
    let mut inner = pair.into_inner().peekable();
    let mut prefixes = Vec::new();
    while let Some(p) = inner.peek() {
        if p.as_rule() == Rule::prefix_op {
            prefixes.push(inner.next().unwrap().as_str().to_string());
        } else {
            break;
        }
    }
    let value = eval_term(inner.next().unwrap(), ctx)?;
    let mut value = value;
    for prefix in prefixes.iter().rev() {
        value = match prefix.as_str() {
            "-" => value.wrapping_neg(),
            "<" => value & 0xFF,
            ">" => (value >> 8) & 0xFF,
            "^" => (value >> 16) & 0xFF,
            other => return Err(ExprError::Syntax(format!("unknown prefix \"{}\"", other))),
        };
    }
    Ok(value)
}

fn eval_term(pair: Pair<Rule>, ctx: &mut EvalContext) -> Result<i64, ExprError> {
    debug_assert_eq!(pair.as_rule(), Rule::term);
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::number => eval_number(inner),
        Rule::char_lit => eval_char_lit(inner),
        Rule::star => Ok(ctx.pc as i64),
        Rule::paren_expr => eval_inner(inner.into_inner().next().unwrap(), ctx),
        Rule::ident => eval_ident(inner, ctx),
        other => Err(ExprError::Syntax(format!("unexpected term {:?}", other))),
    }
}

fn eval_number(pair: Pair<Rule>) -> Result<i64, ExprError> {
    let text = pair.as_str();
    let inner = pair.into_inner().next().unwrap();
    let (digits, radix) = match inner.as_rule() {
        Rule::hex_dollar => (&text[1..], 16),
        Rule::hex_0x => (&text[2..], 16),
        Rule::bin_pct => (&text[1..], 2),
        Rule::decimal => (text, 10),
        _ => return Err(ExprError::BadNumber(text.to_string())),
    };
    i64::from_str_radix(digits, radix).map_err(|_| ExprError::BadNumber(text.to_string()))
}

fn eval_char_lit(pair: Pair<Rule>) -> Result<i64, ExprError> {
    let text = pair.as_str();
    let inner = &text[1..text.len() - 1];
    let mut chars = inner.chars();
    let value = match chars.next() {
        Some('\\') => match chars.next() {
            Some('n') => b'\n',
            Some('r') => b'\r',
            Some('t') => b'\t',
            Some('0') => 0,
            Some('\\') => b'\\',
            Some('\'') => b'\'',
            Some(other) => return Err(ExprError::UnknownEscape(other)),
            None => return Err(ExprError::BadCharLiteral(text.to_string())),
        },
        Some(c) if c.is_ascii() => c as u8,
        _ => return Err(ExprError::BadCharLiteral(text.to_string())),
    };
    Ok(value as i64)
}

fn eval_ident(pair: Pair<Rule>, ctx: &mut EvalContext) -> Result<i64, ExprError> {
    let name = pair.as_str();
    if let Some(alias) = register_alias_lookup(name) {
        return Ok(alias as i64);
    }
    let folded = name.to_uppercase();
    match ctx.symbols.lookup(&folded) {
        Some(sym) if sym.defined => Ok(sym.value as i64),
        Some(_) if ctx.pass == PassMode::First => Ok(0),
        None if ctx.pass == PassMode::First => {
            ctx.symbols.reference_forward(&folded);
            Ok(0)
        }
        _ => Err(ExprError::UndefinedSymbol(folded)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ctx(symbols: &mut SymbolTable) -> EvalContext {
        EvalContext {
            symbols,
            pc: 0x1000,
            pass: PassMode::Second,
        }
    }

    #[test]
    fn evaluates_hex_decimal_and_binary_literals() {
        let mut symbols = SymbolTable::new();
        let mut c = ctx(&mut symbols);
        assert_eq!(eval("$FF", &mut c).unwrap(), 0xFF);
        assert_eq!(eval("0xFF", &mut c).unwrap(), 0xFF);
        assert_eq!(eval("%1010", &mut c).unwrap(), 0b1010);
        assert_eq!(eval("42", &mut c).unwrap(), 42);
    }

    #[test]
    fn left_to_right_with_no_precedence() {
        let mut symbols = SymbolTable::new();
        let mut c = ctx(&mut symbols);
        // (2 + 3) * 4, not 2 + (3 * 4)
        assert_eq!(eval("2 + 3 * 4", &mut c).unwrap(), 20);
    }

    #[test]
    fn prefix_operators_slice_bytes() {
        let mut symbols = SymbolTable::new();
        let mut c = ctx(&mut symbols);
        assert_eq!(eval("<$1234", &mut c).unwrap(), 0x34);
        assert_eq!(eval(">$1234", &mut c).unwrap(), 0x12);
        assert_eq!(eval("^$123456", &mut c).unwrap(), 0x12);
        assert_eq!(eval("-5", &mut c).unwrap(), -5);
    }

    #[test]
    fn star_is_the_current_pc() {
        let mut symbols = SymbolTable::new();
        let mut c = ctx(&mut symbols);
        assert_eq!(eval("*", &mut c).unwrap(), 0x1000);
        assert_eq!(eval("* + 2", &mut c).unwrap(), 0x1002);
    }

    #[test]
    fn division_and_modulo_by_zero_error() {
        let mut symbols = SymbolTable::new();
        let mut c = ctx(&mut symbols);
        assert_eq!(eval("1/0", &mut c), Err(ExprError::DivByZero));
        assert_eq!(eval("1%0", &mut c), Err(ExprError::ModByZero));
    }

    #[test]
    fn pass1_forward_reference_is_a_silent_placeholder() {
        let mut symbols = SymbolTable::new();
        let mut c = EvalContext {
            symbols: &mut symbols,
            pc: 0,
            pass: PassMode::First,
        };
        assert_eq!(eval("LATER", &mut c).unwrap(), 0);
        assert_eq!(symbols.lookup("LATER").unwrap().defined, false);
    }

    #[test]
    fn pass2_undefined_symbol_is_an_error() {
        let mut symbols = SymbolTable::new();
        let mut c = ctx(&mut symbols);
        assert_eq!(
            eval("NEVER_DEFINED", &mut c),
            Err(ExprError::UndefinedSymbol("NEVER_DEFINED".to_string()))
        );
    }

    #[test]
    fn char_literal_escapes() {
        let mut symbols = SymbolTable::new();
        let mut c = ctx(&mut symbols);
        assert_eq!(eval("'\\n'", &mut c).unwrap(), b'\n' as i64);
        assert_eq!(eval("'A'", &mut c).unwrap(), b'A' as i64);
    }

    #[test]
    fn register_alias_resolves_without_symbol_lookup() {
        let mut symbols = SymbolTable::new();
        let mut c = ctx(&mut symbols);
        assert_eq!(eval("R4", &mut c).unwrap(), 0x10);
    }
}

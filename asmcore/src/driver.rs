//! Two-pass orchestration: flattens the source (and every transitively
//! `.INCLUDE`d file) into a single line list once, then walks that list
//! twice — pass 1 to size everything and collect labels, pass 2 (after
//! section linking) to commit bytes and surface the diagnostics that can
//! only be known once layout is fixed.

use std::fs;
use std::path::{Path, PathBuf};

use crate::diagnostic::{Diagnostic, DiagnosticBag, DiagnosticKind};
use crate::directive::{CfiDirective, CfiState, DirectiveKind, WidthTarget};
use crate::encoder::{self, EncodeLineError};
use crate::expr::{self, EvalContext, ExprError, PassMode};
use crate::include::{resolve_include, IncludeError, IncludeStack};
use crate::operand_parser::OperandError;
use crate::scanner::{scan_line, ScanError};
use crate::section::SectionTable;
use crate::symbol::{DefineOutcome, SymbolTable};
use isa::error::EncodeError;
use isa::mode::{ProcessorMode, Width};

#[derive(Debug)]
pub enum FatalError {
    Io(PathBuf, std::io::Error),
    Include(PathBuf, IncludeError),
}

impl std::fmt::Display for FatalError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FatalError::Io(path, err) => write!(f, "{}: {}", path.display(), err),
            FatalError::Include(path, err) => write!(f, "{}: {:?}", path.display(), err),
        }
    }
}

pub struct AssembledProgram {
    pub sections: SectionTable,
    pub symbols: SymbolTable,
    pub diagnostics: DiagnosticBag,
}

struct LoadedLine {
    file: PathBuf,
    line_no: u32,
    raw: String,
}

pub fn assemble_file(root: &Path, search_paths: &[PathBuf]) -> Result<AssembledProgram, FatalError> {
    let mut lines = Vec::new();
    let mut stack = IncludeStack::new(root.to_path_buf());
    load_file(root, search_paths, &mut stack, &mut lines)?;

    let mut sections = SectionTable::new();
    let mut symbols = SymbolTable::new();
    let mut cfi = CfiState::new();
    let mut diagnostics = DiagnosticBag::new();

    run_pass(&lines, PassMode::First, &mut sections, &mut symbols, &mut cfi, &mut diagnostics);

    for (index, delta) in sections.link() {
        symbols.relocate_section(index, delta);
    }
    sections.reset_for_pass();
    symbols.begin_new_pass();
    cfi = CfiState::new();

    run_pass(&lines, PassMode::Second, &mut sections, &mut symbols, &mut cfi, &mut diagnostics);

    Ok(AssembledProgram { sections, symbols, diagnostics })
}

fn load_file(
    path: &Path,
    search_paths: &[PathBuf],
    stack: &mut IncludeStack,
    out: &mut Vec<LoadedLine>,
) -> Result<(), FatalError> {
    let text = fs::read_to_string(path).map_err(|e| FatalError::Io(path.to_path_buf(), e))?;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        stack.top_mut().line = line_no;

        let scanned = match scan_line(raw, |w| {
            crate::directive::classify_directive(w).is_some() || encoder::is_instruction_keyword(w)
        }) {
            Ok(s) => s,
            Err(_) => {
                // Unparseable lines are re-scanned (and diagnosed) during
                // the real passes; here we only need include expansion.
                out.push(LoadedLine { file: path.to_path_buf(), line_no, raw: raw.to_string() });
                continue;
            }
        };

        let is_include = scanned
            .keyword
            .as_deref()
            .and_then(crate::directive::classify_directive)
            == Some(DirectiveKind::Include);

        if is_include {
            let operand = parse_string_literal(scanned.operand_text.trim())
                .unwrap_or_else(|| scanned.operand_text.trim().to_string());
            let resolved = resolve_include(&operand, path, search_paths)
                .map_err(|e| FatalError::Include(path.to_path_buf(), e))?;
            stack.push(resolved.clone()).map_err(|e| FatalError::Include(path.to_path_buf(), e))?;
            load_file(&resolved, search_paths, stack, out)?;
            stack.pop();
            continue;
        }

        out.push(LoadedLine { file: path.to_path_buf(), line_no, raw: raw.to_string() });
    }
    Ok(())
}

fn run_pass(
    lines: &[LoadedLine],
    pass: PassMode,
    sections: &mut SectionTable,
    symbols: &mut SymbolTable,
    cfi: &mut CfiState,
    diagnostics: &mut DiagnosticBag,
) {
    let mut mode = ProcessorMode::default();

    for line in lines {
        let scanned = match scan_line(&line.raw, |w| {
            crate::directive::classify_directive(w).is_some() || encoder::is_instruction_keyword(w)
        }) {
            Ok(s) => s,
            Err(ScanError(msg)) => {
                if pass == PassMode::Second {
                    diagnostics.push(Diagnostic::error(
                        line.file.clone(),
                        line.line_no,
                        DiagnosticKind::Syntactic(msg),
                    ));
                }
                continue;
            }
        };

        let mut ctx = EvalContext { symbols, pc: sections.current().pc, pass };

        let directive = scanned.keyword.as_deref().and_then(crate::directive::classify_directive);

        if let Some(label) = &scanned.label {
            if directive == Some(DirectiveKind::Equ) {
                match expr::eval(&scanned.operand_text, &mut ctx) {
                    Ok(value) => define_symbol(symbols, label, value as u32, line, None, pass, diagnostics),
                    Err(err) => report_expr_error(diagnostics, line, pass, err),
                }
                continue;
            }
            let pc = sections.current().pc;
            let section = sections.current_index();
            define_symbol(symbols, label, pc, line, Some(section), pass, diagnostics);
        }

        let Some(keyword) = scanned.keyword.as_deref() else { continue };
        if scanned.label.is_some() && directive == Some(DirectiveKind::Equ) {
            continue;
        }

        match directive {
            Some(kind) => {
                apply_directive(
                    kind,
                    keyword,
                    &scanned.operand_text,
                    line,
                    pass,
                    sections,
                    symbols,
                    cfi,
                    &mut mode,
                    diagnostics,
                );
            }
            None => {
                encode_instruction(keyword, &scanned.operand_text, line, pass, sections, symbols, mode, diagnostics);
            }
        }
    }
}

fn define_symbol(
    symbols: &mut SymbolTable,
    name: &str,
    value: u32,
    line: &LoadedLine,
    section: Option<usize>,
    pass: PassMode,
    diagnostics: &mut DiagnosticBag,
) {
    if let DefineOutcome::ConflictingRedefinition { previous_value } =
        symbols.define(name, value, line.line_no, section)
    {
        if pass == PassMode::Second {
            diagnostics.push(Diagnostic::error(
                line.file.clone(),
                line.line_no,
                DiagnosticKind::SemanticSymbol(format!(
                    "\"{}\" redefined (was {:#X}, now {:#X})",
                    name, previous_value, value
                )),
            ));
        }
    }
}

fn report_expr_error(diagnostics: &mut DiagnosticBag, line: &LoadedLine, pass: PassMode, err: ExprError) {
    if pass != PassMode::Second {
        return;
    }
    let kind = match err {
        ExprError::DivByZero => DiagnosticKind::Arithmetic(EncodeError::DivByZero),
        ExprError::ModByZero => DiagnosticKind::Arithmetic(EncodeError::ModByZero),
        ExprError::UndefinedSymbol(name) => {
            DiagnosticKind::SemanticSymbol(format!("undefined symbol \"{}\"", name))
        }
        other => DiagnosticKind::Syntactic(other.to_string()),
    };
    diagnostics.push(Diagnostic::error(line.file.clone(), line.line_no, kind));
}

fn encode_instruction(
    keyword: &str,
    operand_text: &str,
    line: &LoadedLine,
    pass: PassMode,
    sections: &mut SectionTable,
    symbols: &mut SymbolTable,
    mode: ProcessorMode,
    diagnostics: &mut DiagnosticBag,
) {
    if pass == PassMode::First && encoder::is_branch_mnemonic(keyword) {
        // Every real short-branch mnemonic is always 2 bytes; only `BRA`
        // can later promote to a 3-byte `BRL` in pass 2, which a forward
        // reference cannot be sized for up front. Pass 1 accepts that
        // narrow divergence rather than iterating to a fixed point.
        let mut ctx = EvalContext { symbols, pc: sections.current().pc, pass };
        let _ = expr::eval(operand_text, &mut ctx);
        sections.current_mut().reserve(2);
        return;
    }

    let mut ctx = EvalContext { symbols, pc: sections.current().pc, pass };
    match encoder::encode_line(keyword, operand_text, &mut ctx, mode) {
        Ok(bytes) => sections.current_mut().emit(&bytes),
        Err(err) => {
            if pass == PassMode::Second {
                diagnostics.push(Diagnostic::error(
                    line.file.clone(),
                    line.line_no,
                    encode_line_error_to_kind(err),
                ));
            }
        }
    }
}

fn encode_line_error_to_kind(err: EncodeLineError) -> DiagnosticKind {
    match err {
        EncodeLineError::Encode(e) => DiagnosticKind::Encoding(e),
        EncodeLineError::Operand(OperandError::Expr(ExprError::DivByZero)) => {
            DiagnosticKind::Arithmetic(EncodeError::DivByZero)
        }
        EncodeLineError::Operand(OperandError::Expr(ExprError::ModByZero)) => {
            DiagnosticKind::Arithmetic(EncodeError::ModByZero)
        }
        EncodeLineError::Operand(OperandError::Expr(ExprError::UndefinedSymbol(name))) => {
            DiagnosticKind::SemanticSymbol(format!("undefined symbol \"{}\"", name))
        }
        EncodeLineError::Operand(e) => DiagnosticKind::Syntactic(e.to_string()),
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_directive(
    kind: DirectiveKind,
    keyword: &str,
    operand_text: &str,
    line: &LoadedLine,
    pass: PassMode,
    sections: &mut SectionTable,
    symbols: &mut SymbolTable,
    cfi: &mut CfiState,
    mode: &mut ProcessorMode,
    diagnostics: &mut DiagnosticBag,
) {
    let mut ctx = EvalContext { symbols, pc: sections.current().pc, pass };

    match kind {
        DirectiveKind::Org => match expr::eval(operand_text, &mut ctx) {
            Ok(value) => sections.current_mut().set_org(value as u32),
            Err(err) => report_expr_error(diagnostics, line, pass, err),
        },
        DirectiveKind::Byte => {
            for part in crate::operand_parser::split_top_level_commas(operand_text) {
                match expr::eval(part, &mut ctx) {
                    Ok(value) => sections.current_mut().emit(&[value as u8]),
                    Err(err) => report_expr_error(diagnostics, line, pass, err),
                }
            }
        }
        DirectiveKind::Word => {
            for part in crate::operand_parser::split_top_level_commas(operand_text) {
                match expr::eval(part, &mut ctx) {
                    Ok(value) => sections.current_mut().emit(&(value as u16).to_le_bytes()),
                    Err(err) => report_expr_error(diagnostics, line, pass, err),
                }
            }
        }
        DirectiveKind::Long => {
            for part in crate::operand_parser::split_top_level_commas(operand_text) {
                match expr::eval(part, &mut ctx) {
                    Ok(value) => sections.current_mut().emit(&(value as u32).to_le_bytes()),
                    Err(err) => report_expr_error(diagnostics, line, pass, err),
                }
            }
        }
        DirectiveKind::Ascii { null_terminated } => match parse_string_literal(operand_text.trim()) {
            Some(text) => {
                let mut bytes = text.into_bytes();
                if null_terminated {
                    bytes.push(0);
                }
                sections.current_mut().emit(&bytes);
            }
            None => {
                if pass == PassMode::Second {
                    diagnostics.push(Diagnostic::error(
                        line.file.clone(),
                        line.line_no,
                        DiagnosticKind::Syntactic(format!(
                            "expected a quoted string after {}",
                            keyword
                        )),
                    ));
                }
            }
        },
        DirectiveKind::Space => match expr::eval(operand_text, &mut ctx) {
            Ok(count) => sections.current_mut().reserve(count as u32),
            Err(err) => report_expr_error(diagnostics, line, pass, err),
        },
        DirectiveKind::Align => match expr::eval(operand_text, &mut ctx) {
            Ok(n) => align_to(sections, n as u32),
            Err(err) => report_expr_error(diagnostics, line, pass, err),
        },
        DirectiveKind::P2Align => match expr::eval(operand_text, &mut ctx) {
            Ok(power) => align_to(sections, 1u32 << power),
            Err(err) => report_expr_error(diagnostics, line, pass, err),
        },
        DirectiveKind::SetWidth(target, width) => match target {
            WidthTarget::Accumulator => mode.m = width,
            WidthTarget::Index => mode.x = width,
        },
        DirectiveKind::Section(name) => {
            let _ = sections.switch_to(name);
        }
        DirectiveKind::NamedSection => {
            let name = operand_text.trim().trim_matches('"');
            if sections.switch_to(name).is_err() && pass == PassMode::Second {
                diagnostics.push(Diagnostic::error(
                    line.file.clone(),
                    line.line_no,
                    DiagnosticKind::SemanticSymbol("too many sections".to_string()),
                ));
            }
        }
        DirectiveKind::Include => {
            // Expanded away before the two passes begin; never reached here.
        }
        DirectiveKind::Equ => {
            // Handled at label-definition time in `run_pass`.
        }
        DirectiveKind::NoOp => {}
        DirectiveKind::Cfi(directive) => apply_cfi(directive, operand_text, line, pass, cfi, diagnostics),
        DirectiveKind::UnimplementedCfi(name) => {
            if pass == PassMode::Second {
                diagnostics.push(Diagnostic::warning(
                    line.file.clone(),
                    line.line_no,
                    DiagnosticKind::UnimplementedCfi(name),
                ));
            }
        }
    }
}

fn align_to(sections: &mut SectionTable, align: u32) {
    if align == 0 {
        return;
    }
    let pc = sections.current().pc;
    let aligned = (pc + align - 1) / align * align;
    // Padding here is a written-out region, not untouched space, so it gets
    // the directive's own zero fill rather than `reserve`'s 0xFF sentinel.
    let padding = vec![0u8; (aligned - pc) as usize];
    sections.current_mut().emit(&padding);
}

fn apply_cfi(
    directive: CfiDirective,
    operand_text: &str,
    line: &LoadedLine,
    pass: PassMode,
    cfi: &mut CfiState,
    diagnostics: &mut DiagnosticBag,
) {
    let parts = crate::operand_parser::split_top_level_commas(operand_text);
    let as_i64 = |text: &str| text.trim().parse::<i64>().unwrap_or(0);
    let as_u8 = |text: &str| text.trim().parse::<u8>().unwrap_or(0);

    let result = match directive {
        CfiDirective::StartProc => cfi.startproc(),
        CfiDirective::EndProc => cfi.endproc(),
        CfiDirective::DefCfa => cfi.def_cfa(as_u8(parts[0]), as_i64(parts.get(1).copied().unwrap_or("0"))),
        CfiDirective::DefCfaRegister => cfi.def_cfa_register(as_u8(parts[0])),
        CfiDirective::DefCfaOffset => cfi.def_cfa_offset(as_i64(parts[0])),
        CfiDirective::AdjustCfaOffset => cfi.adjust_cfa_offset(as_i64(parts[0])),
        CfiDirective::Offset => cfi.offset(as_u8(parts[0]), as_i64(parts.get(1).copied().unwrap_or("0"))),
        CfiDirective::Restore => cfi.restore(as_u8(parts[0])),
        CfiDirective::RememberState => cfi.remember_state(),
        CfiDirective::RestoreState => cfi.restore_state(),
    };

    if let Err(err) = result {
        if pass == PassMode::Second {
            diagnostics.push(Diagnostic::error(
                line.file.clone(),
                line.line_no,
                DiagnosticKind::SemanticSymbol(err.to_string()),
            ));
        }
    }
}

/// A minimal `"..."` literal reader with the same escapes `expr::eval`'s
/// char literals accept. Strings never enter the expression grammar: only
/// `.ASCII`/`.ASCIZ`/`.STRING`/`.INCLUDE` ever take one as their whole
/// operand.
fn parse_string_literal(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next()? {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                '0' => out.push('\0'),
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                other => out.push(other),
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("asmcore_driver_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn assembles_a_simple_program() {
        let path = write_temp(
            "simple.s",
            "  .ORG $1000\n  .M8\nSTART:\n  LDA #$12\n  NOP\n  BRA START\n",
        );
        let program = assemble_file(&path, &[]).unwrap();
        assert_eq!(program.diagnostics.error_count(), 0);
        let text = program.sections.get(0);
        assert_eq!(text.origin, 0x1000);
        assert_eq!(&text.bytes[0..2], &[0xA9, 0x12]);
        assert_eq!(text.bytes[2], 0xEA);
        assert_eq!(text.bytes[3], 0x80); // BRA
    }

    #[test]
    fn equate_defines_a_constant_without_a_section() {
        let path = write_temp("equ.s", "COUNT EQU 5\n  LDX #COUNT\n");
        let program = assemble_file(&path, &[]).unwrap();
        assert_eq!(program.diagnostics.error_count(), 0);
        assert_eq!(program.symbols.lookup("COUNT").unwrap().value, 5);
        assert_eq!(program.symbols.lookup("COUNT").unwrap().section, None);
    }

    #[test]
    fn undefined_symbol_is_a_pass2_error() {
        let path = write_temp("undef.s", "  LDA NEVER_DEFINED\n");
        let program = assemble_file(&path, &[]).unwrap();
        assert_eq!(program.diagnostics.error_count(), 1);
    }

    #[test]
    fn data_and_rodata_link_after_text() {
        let path = write_temp(
            "sections.s",
            "  .ORG $1000\n  .BYTE 1,2,3,4\n  .DATA\n  .WORD $AABB\n",
        );
        let program = assemble_file(&path, &[]).unwrap();
        assert_eq!(program.diagnostics.error_count(), 0);
        let data = program.sections.get(1);
        assert_eq!(data.origin, 0x1004);
    }

    #[test]
    fn ascii_directive_emits_string_bytes_with_optional_terminator() {
        let path = write_temp("ascii.s", "  .ASCIZ \"hi\"\n");
        let program = assemble_file(&path, &[]).unwrap();
        assert_eq!(program.diagnostics.error_count(), 0);
        assert_eq!(program.sections.get(0).bytes, vec![b'h', b'i', 0]);
    }

    #[test]
    fn include_directive_splices_in_the_named_file() {
        let included = write_temp("included.s", "  NOP\n");
        let root = write_temp("root.s", &format!("  .INCLUDE \"{}\"\n  NOP\n", included.display()));
        let program = assemble_file(&root, &[]).unwrap();
        assert_eq!(program.diagnostics.error_count(), 0);
        assert_eq!(program.sections.get(0).bytes, vec![0xEA, 0xEA]);
    }

    #[test]
    fn width_directives_affect_immediate_size() {
        let path = write_temp("widths.s", "  .M8\n  LDA #$12\n");
        let program = assemble_file(&path, &[]).unwrap();
        assert_eq!(program.diagnostics.error_count(), 0);
        assert_eq!(program.sections.get(0).bytes, vec![0xA9, 0x12]);
    }

    #[test]
    fn cfi_nesting_violation_is_diagnosed() {
        let path = write_temp("cfi.s", "  .CFI_STARTPROC\n  .CFI_STARTPROC\n  .CFI_ENDPROC\n");
        let program = assemble_file(&path, &[]).unwrap();
        assert_eq!(program.diagnostics.error_count(), 1);
    }

    #[test]
    fn unrecognised_cfi_directive_is_a_warning_not_an_error() {
        let path = write_temp(
            "cfi_unknown.s",
            "  .CFI_STARTPROC\n  .CFI_SIGNAL_FRAME\n  NOP\n  .CFI_ENDPROC\n",
        );
        let program = assemble_file(&path, &[]).unwrap();
        assert_eq!(program.diagnostics.error_count(), 0);
        assert_eq!(program.sections.get(0).bytes, vec![0xEA]);
        let warnings: Vec<_> = program
            .diagnostics
            .items
            .iter()
            .filter(|d| d.severity == crate::diagnostic::Severity::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
    }
}

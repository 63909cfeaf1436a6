//! DWARF CFI state machine (spec 4.6). The directives are accepted and the
//! state is tracked precisely, but this core never emits DWARF bytes —
//! only mismatches (nesting, stray restores) are diagnosed.

use std::collections::HashMap;

const MAX_REMEMBERED_STATES: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CfiSnapshot {
    cfa_register: u8,
    cfa_offset: i64,
    saved: HashMap<u8, Option<i64>>,
}

#[derive(Default, Debug)]
pub struct CfiState {
    active: bool,
    cfa_register: u8,
    cfa_offset: i64,
    saved: HashMap<u8, Option<i64>>,
    remembered: Vec<CfiSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CfiError {
    NestedStartproc,
    EndprocWithoutStartproc,
    RestoreStateWithoutRememberState,
    TooManyRememberedStates,
    NotInProcedure,
}

impl std::fmt::Display for CfiError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let msg = match self {
            CfiError::NestedStartproc => "nested .CFI_STARTPROC",
            CfiError::EndprocWithoutStartproc => ".CFI_ENDPROC without a matching .CFI_STARTPROC",
            CfiError::RestoreStateWithoutRememberState => {
                ".CFI_RESTORE_STATE without a matching .CFI_REMEMBER_STATE"
            }
            CfiError::TooManyRememberedStates => ".CFI_REMEMBER_STATE nested too deeply",
            CfiError::NotInProcedure => "CFI directive outside of .CFI_STARTPROC/.CFI_ENDPROC",
        };
        write!(f, "{}", msg)
    }
}

impl CfiState {
    pub fn new() -> CfiState {
        CfiState::default()
    }

    pub fn startproc(&mut self) -> Result<(), CfiError> {
        if self.active {
            return Err(CfiError::NestedStartproc);
        }
        self.active = true;
        self.cfa_register = 0;
        self.cfa_offset = 0;
        self.saved.clear();
        Ok(())
    }

    pub fn endproc(&mut self) -> Result<(), CfiError> {
        if !self.active {
            return Err(CfiError::EndprocWithoutStartproc);
        }
        self.active = false;
        Ok(())
    }

    pub fn def_cfa(&mut self, register: u8, offset: i64) -> Result<(), CfiError> {
        self.require_active()?;
        self.cfa_register = register;
        self.cfa_offset = offset;
        Ok(())
    }

    pub fn def_cfa_register(&mut self, register: u8) -> Result<(), CfiError> {
        self.require_active()?;
        self.cfa_register = register;
        Ok(())
    }

    pub fn def_cfa_offset(&mut self, offset: i64) -> Result<(), CfiError> {
        self.require_active()?;
        self.cfa_offset = offset;
        Ok(())
    }

    pub fn adjust_cfa_offset(&mut self, delta: i64) -> Result<(), CfiError> {
        self.require_active()?;
        self.cfa_offset += delta;
        Ok(())
    }

    pub fn offset(&mut self, register: u8, offset: i64) -> Result<(), CfiError> {
        self.require_active()?;
        self.saved.insert(register, Some(offset));
        Ok(())
    }

    pub fn restore(&mut self, register: u8) -> Result<(), CfiError> {
        self.require_active()?;
        self.saved.insert(register, None);
        Ok(())
    }

    pub fn remember_state(&mut self) -> Result<(), CfiError> {
        self.require_active()?;
        if self.remembered.len() >= MAX_REMEMBERED_STATES {
            return Err(CfiError::TooManyRememberedStates);
        }
        self.remembered.push(CfiSnapshot {
            cfa_register: self.cfa_register,
            cfa_offset: self.cfa_offset,
            saved: self.saved.clone(),
        });
        Ok(())
    }

    pub fn restore_state(&mut self) -> Result<(), CfiError> {
        self.require_active()?;
        let snapshot = self
            .remembered
            .pop()
            .ok_or(CfiError::RestoreStateWithoutRememberState)?;
        self.cfa_register = snapshot.cfa_register;
        self.cfa_offset = snapshot.cfa_offset;
        self.saved = snapshot.saved;
        Ok(())
    }

    fn require_active(&self) -> Result<(), CfiError> {
        if self.active {
            Ok(())
        } else {
            Err(CfiError::NotInProcedure)
        }
    }
}

/// Which processor-mode field a `.M*`/`.X*` directive targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidthTarget {
    Accumulator,
    Index,
}

/// CFI directives that mutate `CfiState`, separated from the keyword match
/// so the driver can read each directive's operand shape off the variant
/// before calling into the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CfiDirective {
    StartProc,
    EndProc,
    DefCfa,
    DefCfaRegister,
    DefCfaOffset,
    AdjustCfaOffset,
    Offset,
    Restore,
    RememberState,
    RestoreState,
}

/// Every non-CFI directive the driver recognises, plus the `Cfi` wrapper for
/// the ones above. `.GLOBL`/`.FILE`/`.TYPE`/`.SIZE`/`.IDENT`/`.ADDRSIG*` are
/// accepted and ignored: this core never emits an object-file symbol table
/// for a linker to consume.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectiveKind {
    Org,
    Byte,
    Word,
    Long,
    Ascii { null_terminated: bool },
    Space,
    Align,
    P2Align,
    SetWidth(WidthTarget, isa::mode::Width),
    Section(&'static str),
    NamedSection,
    Include,
    Equ,
    NoOp,
    Cfi(CfiDirective),
    /// A `.CFI_`-prefixed keyword outside the fixed set above (e.g.
    /// `.CFI_SIGNAL_FRAME`, `.CFI_ESCAPE`) — compiler-generated CFI output
    /// this core does not model, accepted and diagnosed rather than treated
    /// as an unknown mnemonic.
    UnimplementedCfi(String),
}

pub fn classify_directive(keyword: &str) -> Option<DirectiveKind> {
    use DirectiveKind::*;
    use isa::mode::Width;

    let upper = keyword.to_uppercase();
    Some(match upper.as_str() {
        ".ORG" | "ORG" | "*=" => Org,
        ".BYTE" | ".DB" | ".DCB" => Byte,
        ".WORD" | ".DW" | ".DCW" => Word,
        ".LONG" | ".DL" | ".DCL" | ".DWORD" | ".DD" => Long,
        ".ASCII" => Ascii { null_terminated: false },
        ".ASCIZ" | ".STRING" => Ascii { null_terminated: true },
        ".DS" | ".RES" | ".SPACE" | ".ZERO" => Space,
        ".ALIGN" => Align,
        ".P2ALIGN" => P2Align,
        ".M8" | ".A8" => SetWidth(WidthTarget::Accumulator, Width::W8),
        ".M16" | ".A16" => SetWidth(WidthTarget::Accumulator, Width::W16),
        ".M32" | ".A32" => SetWidth(WidthTarget::Accumulator, Width::W32),
        ".X8" | ".I8" => SetWidth(WidthTarget::Index, Width::W8),
        ".X16" | ".I16" => SetWidth(WidthTarget::Index, Width::W16),
        ".X32" | ".I32" => SetWidth(WidthTarget::Index, Width::W32),
        ".TEXT" | ".CODE" => Section(crate::section::TEXT),
        ".DATA" => Section(crate::section::DATA),
        ".RODATA" => Section(crate::section::RODATA),
        ".BSS" => Section(crate::section::BSS),
        ".SECTION" => NamedSection,
        ".INCLUDE" | ".INC" => Include,
        ".EQU" | "EQU" | "=" | ".SET" => Equ,
        ".GLOBL" | ".GLOBAL" | ".FILE" | ".TYPE" | ".SIZE" | ".IDENT" => NoOp,
        other if other.starts_with(".ADDRSIG") => NoOp,
        ".CFI_STARTPROC" => Cfi(CfiDirective::StartProc),
        ".CFI_ENDPROC" => Cfi(CfiDirective::EndProc),
        ".CFI_DEF_CFA" => Cfi(CfiDirective::DefCfa),
        ".CFI_DEF_CFA_REGISTER" => Cfi(CfiDirective::DefCfaRegister),
        ".CFI_DEF_CFA_OFFSET" => Cfi(CfiDirective::DefCfaOffset),
        ".CFI_ADJUST_CFA_OFFSET" => Cfi(CfiDirective::AdjustCfaOffset),
        ".CFI_OFFSET" => Cfi(CfiDirective::Offset),
        ".CFI_RESTORE" => Cfi(CfiDirective::Restore),
        ".CFI_REMEMBER_STATE" => Cfi(CfiDirective::RememberState),
        ".CFI_RESTORE_STATE" => Cfi(CfiDirective::RestoreState),
        other if other.starts_with(".CFI_") => UnimplementedCfi(keyword.to_string()),
        _ => return None,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nested_startproc_is_an_error() {
        let mut cfi = CfiState::new();
        cfi.startproc().unwrap();
        assert_eq!(cfi.startproc(), Err(CfiError::NestedStartproc));
    }

    #[test]
    fn endproc_without_startproc_is_an_error() {
        let mut cfi = CfiState::new();
        assert_eq!(cfi.endproc(), Err(CfiError::EndprocWithoutStartproc));
    }

    #[test]
    fn restore_state_without_remember_state_is_an_error() {
        let mut cfi = CfiState::new();
        cfi.startproc().unwrap();
        assert_eq!(
            cfi.restore_state(),
            Err(CfiError::RestoreStateWithoutRememberState)
        );
    }

    #[test]
    fn remember_and_restore_round_trips_saved_registers() {
        let mut cfi = CfiState::new();
        cfi.startproc().unwrap();
        cfi.offset(8, -8).unwrap();
        cfi.remember_state().unwrap();
        cfi.offset(8, -16).unwrap();
        cfi.restore_state().unwrap();
        assert_eq!(cfi.saved.get(&8), Some(&Some(-8)));
    }

    #[test]
    fn endproc_allows_a_later_startproc() {
        let mut cfi = CfiState::new();
        cfi.startproc().unwrap();
        cfi.endproc().unwrap();
        cfi.startproc().unwrap();
    }

    #[test]
    fn aliases_for_the_same_directive_classify_identically() {
        assert_eq!(classify_directive(".ORG"), classify_directive("ORG"));
        assert_eq!(classify_directive(".ASCIZ"), classify_directive(".STRING"));
        assert_eq!(classify_directive(".DB"), classify_directive(".BYTE"));
    }

    #[test]
    fn width_directives_target_the_right_field() {
        assert_eq!(
            classify_directive(".X16"),
            Some(DirectiveKind::SetWidth(WidthTarget::Index, isa::mode::Width::W16))
        );
        assert_eq!(
            classify_directive(".A8"),
            Some(DirectiveKind::SetWidth(WidthTarget::Accumulator, isa::mode::Width::W8))
        );
    }

    #[test]
    fn linker_metadata_directives_are_no_ops() {
        assert_eq!(classify_directive(".GLOBL"), Some(DirectiveKind::NoOp));
        assert_eq!(classify_directive(".ADDRSIG_SYM"), Some(DirectiveKind::NoOp));
    }

    #[test]
    fn unknown_keyword_is_not_a_directive() {
        assert_eq!(classify_directive("LDA"), None);
    }

    #[test]
    fn cfi_keyword_outside_the_fixed_set_is_unimplemented_not_unknown() {
        assert_eq!(
            classify_directive(".CFI_SIGNAL_FRAME"),
            Some(DirectiveKind::UnimplementedCfi(".CFI_SIGNAL_FRAME".to_string()))
        );
    }
}

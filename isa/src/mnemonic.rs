//! Mnemonic identifiers. The standard plane inherits the full 6502/65816
//! set (minus `COP`, whose real opcode `0x02` this ISA reassigns to the
//! extended-plane prefix — see DESIGN.md).

use util::EnumFromStr;
use util_derive::EnumFromStr;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumFromStr)]
pub enum Mnemonic {
    ADC, AND, ASL, BCC, BCS, BEQ, BIT, BMI, BNE, BPL, BRA, BRK, BRL, BVC, BVS,
    CLC, CLD, CLI, CLV, CMP, CPX, CPY,
    DEC, DEX, DEY,
    EOR,
    INC, INX, INY,
    JML, JMP, JSL, JSR,
    LDA, LDX, LDY, LSR,
    MVN, MVP,
    NOP,
    ORA,
    PEA, PEI, PER, PHA, PHB, PHD, PHK, PHP, PHX, PHY, PLA, PLB, PLD, PLP, PLX, PLY,
    REP, ROL, ROR, RTI, RTL, RTS,
    SBC, SEC, SED, SEI, SEP, STA, STP, STX, STY, STZ,
    TAX, TAY, TCD, TCS, TDC, TRB, TSB, TSC, TSX, TXA, TXS, TYA,
    WAI, WDM,
    XBA, XCE,
}

impl std::fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl Mnemonic {
    /// Short-branch mnemonics: relative, 1-byte displacement, candidates for
    /// long-branch promotion.
    pub fn is_conditional_branch(self) -> bool {
        matches!(
            self,
            Mnemonic::BCC
                | Mnemonic::BCS
                | Mnemonic::BEQ
                | Mnemonic::BMI
                | Mnemonic::BNE
                | Mnemonic::BPL
                | Mnemonic::BVC
                | Mnemonic::BVS
        )
    }

    pub fn is_short_unconditional_branch(self) -> bool {
        matches!(self, Mnemonic::BRA)
    }

    /// `BRA` is the only short branch with a documented long form (`BRL`);
    /// real conditional branches have none, so out-of-range conditional
    /// branches are always a hard error rather than silently promoted.
    pub fn long_branch_form(self) -> Option<Mnemonic> {
        match self {
            Mnemonic::BRA => Some(Mnemonic::BRL),
            _ => None,
        }
    }

    pub fn is_branch(self) -> bool {
        self.is_conditional_branch() || self.is_short_unconditional_branch()
    }

    /// Memory/accumulator mnemonics whose immediate width tracks `M`.
    pub fn is_memory_accumulator_op(self) -> bool {
        matches!(
            self,
            Mnemonic::LDA
                | Mnemonic::STA
                | Mnemonic::ADC
                | Mnemonic::SBC
                | Mnemonic::AND
                | Mnemonic::ORA
                | Mnemonic::EOR
                | Mnemonic::CMP
                | Mnemonic::BIT
        )
    }

    /// Index-register mnemonics whose immediate width tracks `X`.
    pub fn is_index_op(self) -> bool {
        matches!(
            self,
            Mnemonic::LDX | Mnemonic::LDY | Mnemonic::CPX | Mnemonic::CPY
        )
    }

    /// `REP`/`SEP`/`PEA` and their kin are always a fixed immediate width
    /// regardless of the current `M`/`X` mode.
    pub fn fixed_immediate_width(self) -> Option<u8> {
        match self {
            Mnemonic::REP | Mnemonic::SEP => Some(1),
            Mnemonic::PEA => Some(2),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("lda".to_uppercase().parse(), Ok(Mnemonic::LDA));
        assert_eq!("LDA".parse(), Ok(Mnemonic::LDA));
    }

    #[test]
    fn unknown_mnemonic_errors() {
        assert!("FROB".parse::<Mnemonic>().is_err());
    }

    #[test]
    fn bra_is_the_only_promotable_short_branch() {
        assert_eq!(Mnemonic::BRA.long_branch_form(), Some(Mnemonic::BRL));
        assert_eq!(Mnemonic::BNE.long_branch_form(), None);
    }
}

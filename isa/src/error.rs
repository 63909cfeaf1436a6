//! The encoding-layer error taxonomy (spec 7, "Semantic (encoding)" and
//! "Arithmetic" kinds). Lexical/syntactic/semantic-symbol kinds live in
//! `asmcore::diagnostic`, which wraps these with source position.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EncodeError {
    UnknownMnemonic,
    InvalidAddressingMode,
    BranchOutOfRange,
    UnalignedDp,
    LongAddrIn32Mode,
    MissingBRelative,
    Not8DigitAbs32,
    ReservedOpcode,
    DivByZero,
    ModByZero,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            EncodeError::UnknownMnemonic => "unknown instruction mnemonic",
            EncodeError::InvalidAddressingMode => "invalid addressing mode for mnemonic",
            EncodeError::BranchOutOfRange => "branch target out of range",
            EncodeError::UnalignedDp => "direct-page address is not 4-byte aligned in 32-bit mode",
            EncodeError::LongAddrIn32Mode => {
                "24-bit long indexed/indirect addressing is not legal in 32-bit mode"
            }
            EncodeError::MissingBRelative => {
                "bare 16-bit absolute requires an explicit B+ prefix in 32-bit mode"
            }
            EncodeError::Not8DigitAbs32 => "32-bit absolute value must use full 8-digit hex",
            EncodeError::ReservedOpcode => "opcode is reserved and cannot be emitted directly",
            EncodeError::DivByZero => "division by zero",
            EncodeError::ModByZero => "modulo by zero",
        };
        write!(f, "{}", msg)
    }
}

impl std::error::Error for EncodeError {}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DecodeError {
    UnknownOpcode,
    TruncatedInstruction,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            DecodeError::UnknownOpcode => "unknown opcode",
            DecodeError::TruncatedInstruction => "instruction truncated at end of input",
        };
        write!(f, "{}", msg)
    }
}

impl std::error::Error for DecodeError {}

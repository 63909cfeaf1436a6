//! Instruction tables and addressing-mode algebra for the 32-bit extended
//! 6502/65816 instruction set: the static encoding knowledge shared by the
//! assembler and the disassembler, with no CPU emulation or memory model.

pub mod addressing;
pub mod barrel;
pub mod bitfield;
pub mod constants;
pub mod error;
pub mod ext_alu;
pub mod extended;
pub mod fpu;
pub mod mnemonic;
pub mod mode;
pub mod register;
pub mod standard;

pub use addressing::{AddressingMode, ParsedOperand};
pub use error::{DecodeError, EncodeError};
pub use mnemonic::Mnemonic;
pub use mode::{ProcessorMode, Width};

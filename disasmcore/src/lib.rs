//! Disassembler core for a 32-bit-extended 6502/65816 instruction set.
//!
//! [`decode::decode_one`] turns one instruction's worth of bytes into text;
//! [`listing::disassemble`] walks a whole buffer, falling back to a single
//! `.BYTE` line whenever `decode_one` reports an opcode it can't place, so a
//! malformed or truncated tail never stalls the walk. [`context::DecodeContext`]
//! is the processor-mode state a stream of `REP`/`SEP` mutates as decoding
//! proceeds.

pub mod context;
pub mod decode;
pub mod format;
pub mod listing;

pub use context::DecodeContext;
pub use decode::{decode_one, Decoded};
pub use listing::{disassemble, Line};

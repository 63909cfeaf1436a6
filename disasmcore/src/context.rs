//! Decoder-side processor-mode context. The assembler's [`isa::mode::ProcessorMode`]
//! defaults to 32-bit `M`/`X` because that is the ISA's assemble-time default;
//! the disassembler has no such guarantee about the bytes in front of it, so
//! it starts at the inherited 65816 default (16-bit/16-bit, not emulation
//! mode) and only widens or narrows when the CLI overrides it or a `REP`/`SEP`
//! is actually observed in the stream.

use isa::mode::{ProcessorMode, Width};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeContext {
    pub mode: ProcessorMode,
    pub emulation: bool,
}

impl DecodeContext {
    pub fn new() -> DecodeContext {
        DecodeContext {
            mode: ProcessorMode::new(Width::W16, Width::W16),
            emulation: false,
        }
    }

    pub fn apply_sep(&mut self, operand: u8) {
        self.mode.apply_sep(operand);
    }

    pub fn apply_rep(&mut self, operand: u8) {
        self.mode.apply_rep(operand);
    }
}

impl Default for DecodeContext {
    fn default() -> DecodeContext {
        DecodeContext::new()
    }
}

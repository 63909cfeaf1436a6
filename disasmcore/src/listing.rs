//! Walks a byte buffer end to end, producing one [`Line`] per decoded
//! instruction. Mirrors the error-taxonomy's malformed-input-resilience
//! requirement: a byte `decode_one` can't place is never a reason to stop —
//! it becomes a one-byte `.BYTE` line and the walk resumes at the next byte,
//! so a corrupt tail costs lines, not forward progress.

use crate::context::DecodeContext;
use crate::decode::decode_one;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub address: u32,
    pub bytes: Vec<u8>,
    pub text: String,
}

/// Decodes `data` as if its first byte sat at `origin`, advancing `ctx`'s
/// processor mode as `REP`/`SEP` instructions are encountered along the way.
pub fn disassemble(data: &[u8], origin: u32, ctx: &mut DecodeContext) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut offset = 0usize;
    while offset < data.len() {
        let pc = origin.wrapping_add(offset as u32);
        let remaining = &data[offset..];
        let (length, text) = match decode_one(remaining, pc, ctx) {
            Ok(decoded) => (decoded.length.max(1).min(remaining.len()), decoded.text),
            Err(_) => (1, format!(".BYTE ${:02X}", remaining[0])),
        };
        lines.push(Line {
            address: pc,
            bytes: remaining[..length].to_vec(),
            text,
        });
        offset += length;
    }
    lines
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn walks_a_buffer_of_fixed_width_instructions() {
        // LDA #$1234 ; NOP ; NOP
        let data = [0xA9, 0x34, 0x12, 0xEA, 0xEA];
        let mut ctx = DecodeContext::new();
        let lines = disassemble(&data, 0x1000, &mut ctx);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], Line { address: 0x1000, bytes: vec![0xA9, 0x34, 0x12], text: "LDA #$1234".into() });
        assert_eq!(lines[1], Line { address: 0x1003, bytes: vec![0xEA], text: "NOP".into() });
        assert_eq!(lines[2].address, 0x1004);
    }

    #[test]
    fn an_unknown_opcode_falls_back_to_a_single_byte_and_keeps_going() {
        let data = [0x02, 0xFF, 0xEA];
        let mut ctx = DecodeContext::new();
        let lines = disassemble(&data, 0, &mut ctx);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, ".BYTE $02");
        assert_eq!(lines[1].text, ".BYTE $FF");
        assert_eq!(lines[2].text, "NOP");
    }

    #[test]
    fn a_truncated_tail_falls_back_byte_by_byte() {
        // LDA absolute (3 bytes) with only one byte of operand present.
        let data = [0xAD, 0x34];
        let mut ctx = DecodeContext::new();
        let lines = disassemble(&data, 0, &mut ctx);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, ".BYTE $AD");
        assert_eq!(lines[1].text, ".BYTE $34");
    }

    #[test]
    fn mode_state_threads_across_lines() {
        let data = [0xE2, 0x30, 0xA9, 0x42]; // SEP #$30 ; LDA #$42
        let mut ctx = DecodeContext::new();
        let lines = disassemble(&data, 0, &mut ctx);
        assert_eq!(lines[1].bytes.len(), 2);
        assert_eq!(lines[1].text, "LDA #$42");
    }
}

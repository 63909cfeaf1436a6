//! Serialises an [`AssembledProgram`](crate::driver::AssembledProgram) to the
//! formats a downstream loader or a human might want: a flat binary (gaps
//! between sections filled with the sentinel byte), Intel HEX, and a plain
//! symbol map.

use std::io::{self, Write};

use isa::constants::{FILL_BYTE, MAX_FLAT_SIZE};

use crate::section::SectionTable;
use crate::symbol::SymbolTable;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OutputError {
    ImageTooLarge { size: usize, max: usize },
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            OutputError::ImageTooLarge { size, max } => {
                write!(f, "output image is {} bytes, exceeding the {} byte limit", size, max)
            }
        }
    }
}

/// Lays every section out into one contiguous buffer starting at the lowest
/// section origin, with the sentinel byte filling any space `link()` left
/// between sections.
pub fn flatten(sections: &SectionTable) -> Result<Vec<u8>, OutputError> {
    let nonempty: Vec<_> = sections.iter().filter(|s| s.size() > 0).collect();
    if nonempty.is_empty() {
        return Ok(Vec::new());
    }

    let base = nonempty.iter().map(|s| s.origin).min().unwrap();
    let top = nonempty.iter().map(|s| s.end()).max().unwrap();
    let size = (top - base) as usize;
    if size > MAX_FLAT_SIZE {
        return Err(OutputError::ImageTooLarge { size, max: MAX_FLAT_SIZE });
    }

    let mut image = vec![FILL_BYTE; size];
    for section in nonempty {
        let offset = (section.origin - base) as usize;
        image[offset..offset + section.bytes.len()].copy_from_slice(&section.bytes);
    }
    Ok(image)
}

pub fn write_flat<W: Write>(sections: &SectionTable, writer: &mut W) -> io::Result<()> {
    let image = flatten(sections).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    writer.write_all(&image)
}

/// One Intel HEX data record holds at most this many payload bytes.
const HEX_RECORD_LEN: usize = 16;

/// Writes every nonempty section as a run of `:` data records at its own
/// address, followed by the end-of-file record. A section whose origin
/// exceeds the 16-bit window gets an extended-linear-address record ahead of
/// its first data record; the high 16 bits of the running address are
/// re-emitted whenever they change between chunks.
pub fn write_intel_hex<W: Write>(sections: &SectionTable, writer: &mut W) -> io::Result<()> {
    let mut high = None;
    for section in sections.iter().filter(|s| s.size() > 0) {
        for (chunk_index, chunk) in section.bytes.chunks(HEX_RECORD_LEN).enumerate() {
            let address = section.origin.wrapping_add((chunk_index * HEX_RECORD_LEN) as u32);
            let chunk_high = (address >> 16) as u16;
            if high != Some(chunk_high) {
                write_hex_record(writer, 0, 0x04, &chunk_high.to_be_bytes())?;
                high = Some(chunk_high);
            }
            write_hex_record(writer, address as u16, 0x00, chunk)?;
        }
    }
    write_hex_record(writer, 0, 0x01, &[])
}

fn write_hex_record<W: Write>(writer: &mut W, address: u16, record_type: u8, data: &[u8]) -> io::Result<()> {
    let mut checksum: u8 = data.len() as u8;
    checksum = checksum.wrapping_add((address >> 8) as u8);
    checksum = checksum.wrapping_add(address as u8);
    checksum = checksum.wrapping_add(record_type);
    for &byte in data {
        checksum = checksum.wrapping_add(byte);
    }
    checksum = (!checksum).wrapping_add(1);

    write!(writer, ":{:02X}{:04X}{:02X}", data.len(), address, record_type)?;
    for &byte in data {
        write!(writer, "{:02X}", byte)?;
    }
    writeln!(writer, "{:02X}", checksum)
}

/// A plain-text map: one `ADDR S NAME` line per linked section (in link
/// order), then one `ADDR L NAME` line per defined symbol (sorted by name so
/// successive runs diff cleanly).
pub fn write_symbol_map_text<W: Write>(
    sections: &SectionTable,
    symbols: &SymbolTable,
    writer: &mut W,
) -> io::Result<()> {
    for section in sections.iter().filter(|s| s.size() > 0) {
        writeln!(writer, "{:08X} S {}", section.origin, section.name)?;
    }
    let mut entries: Vec<_> = symbols.iter().filter(|(_, s)| s.defined).collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (name, symbol) in entries {
        writeln!(writer, "{:08X} L {}", symbol.value, name)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::section::{SectionTable, DATA};

    #[test]
    fn flatten_fills_gaps_between_sections() {
        let mut sections = SectionTable::new();
        sections.current_mut().set_org(0x1000);
        sections.current_mut().emit(&[1, 2]);
        sections.switch_to(DATA).unwrap();
        sections.current_mut().set_org(0x1008);
        sections.current_mut().emit(&[3, 4]);

        let image = flatten(&sections).unwrap();
        assert_eq!(image.len(), 0x0A);
        assert_eq!(&image[0..2], &[1, 2]);
        assert_eq!(&image[2..8], &[FILL_BYTE; 6]);
        assert_eq!(&image[8..10], &[3, 4]);
    }

    #[test]
    fn flatten_of_an_empty_program_is_empty() {
        let sections = SectionTable::new();
        assert_eq!(flatten(&sections).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn intel_hex_emits_an_extended_address_a_data_record_and_an_eof_record() {
        let mut sections = SectionTable::new();
        sections.current_mut().set_org(0x0000);
        sections.current_mut().emit(&[0x00, 0x01, 0x02]);

        let mut out = Vec::new();
        write_intel_hex(&sections, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), ":020000040000FA");
        assert_eq!(lines.next().unwrap(), ":03000000000102FA");
        assert_eq!(lines.next().unwrap(), ":00000001FF");
    }

    #[test]
    fn intel_hex_repeats_the_extended_address_record_only_when_it_changes() {
        let mut sections = SectionTable::new();
        sections.current_mut().set_org(0x1_FFF0);
        sections.current_mut().emit(&[0u8; 32]);

        let mut out = Vec::new();
        write_intel_hex(&sections, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        // The two 16-byte chunks straddle the 0x20000 boundary, so the high
        // word changes between them and the extended record repeats once.
        assert_eq!(
            lines,
            vec![
                ":020000040001F9",
                ":10FFF0000000000000000000000000000000000001",
                ":020000040002F8",
                ":1000000000000000000000000000000000000000F0",
                ":00000001FF",
            ]
        );
    }

    #[test]
    fn symbol_map_text_lists_sections_then_defined_symbols_sorted() {
        let mut sections = SectionTable::new();
        sections.current_mut().set_org(0x1000);
        sections.current_mut().emit(&[1]);

        let mut symbols = SymbolTable::new();
        symbols.define("ZEBRA", 0x20, 1, None);
        symbols.define("APPLE", 0x10, 1, None);
        symbols.reference_forward("PENDING");

        let mut out = Vec::new();
        write_symbol_map_text(&sections, &symbols, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "00001000 S TEXT\n00000010 L APPLE\n00000020 L ZEBRA\n"
        );
    }
}

//! A fixed-capacity set of named sections, each with its own origin,
//! program counter, size, and fill-initialised byte buffer.

use isa::constants::FILL_BYTE;

pub const MAX_SECTIONS: usize = 64;

#[derive(Clone, Debug)]
pub struct Section {
    pub name: String,
    pub origin: u32,
    pub pc: u32,
    pub bytes: Vec<u8>,
    pub origin_set: bool,
}

impl Section {
    fn new(name: &str) -> Section {
        Section {
            name: name.to_string(),
            origin: 0,
            pc: 0,
            bytes: Vec::new(),
            origin_set: false,
        }
    }

    pub fn size(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn end(&self) -> u32 {
        self.origin + self.size()
    }

    /// The first `.ORG` in a section both sets the origin and the PC;
    /// later calls only move the PC.
    pub fn set_org(&mut self, value: u32) {
        if !self.origin_set {
            self.origin = value;
            self.origin_set = true;
        }
        self.pc = value;
    }

    pub fn emit(&mut self, data: &[u8]) {
        let offset = (self.pc - self.origin) as usize;
        if offset + data.len() > self.bytes.len() {
            self.bytes.resize(offset + data.len(), FILL_BYTE);
        }
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        self.pc += data.len() as u32;
    }

    pub fn reserve(&mut self, count: u32) {
        let offset = (self.pc - self.origin) as usize;
        let end = offset + count as usize;
        if end > self.bytes.len() {
            self.bytes.resize(end, FILL_BYTE);
        }
        self.pc += count;
    }
}

pub const TEXT: &str = "TEXT";
pub const RODATA: &str = "RODATA";
pub const DATA: &str = "DATA";
pub const BSS: &str = "BSS";

/// Fixed linking order for sections whose origin was never set explicitly.
pub const LINK_ORDER: &[&str] = &[RODATA, DATA, BSS];

pub struct SectionTable {
    sections: Vec<Section>,
    current: usize,
}

impl SectionTable {
    pub fn new() -> SectionTable {
        SectionTable {
            sections: vec![Section::new(TEXT)],
            current: 0,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &Section {
        &self.sections[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Section {
        &mut self.sections[self.current]
    }

    pub fn get(&self, index: usize) -> &Section {
        &self.sections[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Section {
        &mut self.sections[index]
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Switch to (creating if necessary) the named section; returns its
    /// index and whether it is new.
    pub fn switch_to(&mut self, name: &str) -> Result<usize, ()> {
        if let Some(index) = self.sections.iter().position(|s| s.name == name) {
            self.current = index;
            return Ok(index);
        }
        if self.sections.len() >= MAX_SECTIONS {
            return Err(());
        }
        self.sections.push(Section::new(name));
        self.current = self.sections.len() - 1;
        Ok(self.current)
    }

    /// Reset every section's PC to its origin and truncate emitted bytes,
    /// ready for a fresh pass. Origins and `origin_set` survive so pass 2
    /// starts from pass 1's section-linking results.
    pub fn reset_for_pass(&mut self) {
        for section in &mut self.sections {
            section.pc = section.origin;
            section.bytes.clear();
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name == name)
    }

    /// Place every section (other than TEXT) whose origin was never set and
    /// whose size is nonzero, in `LINK_ORDER`, then any remaining
    /// user-declared sections in declaration order, each starting at the
    /// previous section's 4-byte-aligned end. Returns `(section_index,
    /// delta)` pairs for every section that moved, so callers can relocate
    /// symbols.
    pub fn link(&mut self) -> Vec<(usize, i64)> {
        fn align4(n: u32) -> u32 {
            (n + 3) & !3
        }

        let mut cursor = align4(self.sections[0].end());
        let mut moved = Vec::new();

        let mut ordered: Vec<usize> = LINK_ORDER
            .iter()
            .filter_map(|name| self.index_of(name))
            .collect();
        for index in 0..self.sections.len() {
            if index != 0 && !ordered.contains(&index) {
                ordered.push(index);
            }
        }

        for index in ordered {
            let section = &mut self.sections[index];
            if section.origin_set || section.size() == 0 {
                cursor = align4(cursor.max(section.end()));
                continue;
            }
            let delta = cursor as i64 - section.origin as i64;
            section.origin = cursor;
            section.origin_set = true;
            if delta != 0 {
                moved.push((index, delta));
            }
            cursor = align4(section.end());
        }
        moved
    }
}

impl Default for SectionTable {
    fn default() -> SectionTable {
        SectionTable::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_org_sets_origin_later_org_only_moves_pc() {
        let mut section = Section::new(TEXT);
        section.set_org(0x1000);
        assert_eq!(section.origin, 0x1000);
        section.emit(&[1, 2, 3, 4]);
        section.set_org(0x2000);
        assert_eq!(section.origin, 0x1000);
        assert_eq!(section.pc, 0x2000);
    }

    #[test]
    fn emit_fills_gaps_with_the_sentinel_byte() {
        let mut section = Section::new(TEXT);
        section.set_org(0);
        section.pc = 4;
        section.emit(&[0xAA]);
        assert_eq!(section.bytes, vec![FILL_BYTE, FILL_BYTE, FILL_BYTE, FILL_BYTE, 0xAA]);
    }

    #[test]
    fn section_linking_matches_scenario_e() {
        let mut table = SectionTable::new();
        table.current_mut().set_org(0x1000);
        table.current_mut().emit(&[0, 0, 0, 0]);
        table.switch_to(DATA).unwrap();
        table.current_mut().emit(&[0xAB, 0xCD]);
        let moved = table.link();
        assert_eq!(table.get(0).origin, 0x1000);
        let data_index = table.index_of(DATA).unwrap();
        assert_eq!(table.get(data_index).origin, 0x1004);
        assert_eq!(moved, vec![(data_index, 0x1004)]);
    }
}

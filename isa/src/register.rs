//! Register-alias algebra: the `R0..R63` direct-page window and the `F0..F15`
//! FPU register file.

use util::EnumFromStr;
use util_derive::EnumFromStr;

/// A 4-byte-aligned direct-page address renders (and parses) as `R<n>`.
pub fn register_alias_value(n: u32) -> Option<u32> {
    if n < crate::constants::REGISTER_ALIAS_COUNT {
        Some(n * crate::constants::REGISTER_STRIDE)
    } else {
        None
    }
}

/// The inverse: a direct-page byte that is a multiple of 4 has a canonical
/// `R<n>` rendering. Non-aligned direct-page addresses have none.
pub fn dp_to_register_alias(dp: u8) -> Option<u32> {
    if dp as u32 % crate::constants::REGISTER_STRIDE == 0 {
        Some(dp as u32 / crate::constants::REGISTER_STRIDE)
    } else {
        None
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumFromStr)]
pub enum FpuRegister {
    F0,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
}

impl FpuRegister {
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(n: u8) -> Option<FpuRegister> {
        const ALL: [FpuRegister; 16] = [
            FpuRegister::F0,
            FpuRegister::F1,
            FpuRegister::F2,
            FpuRegister::F3,
            FpuRegister::F4,
            FpuRegister::F5,
            FpuRegister::F6,
            FpuRegister::F7,
            FpuRegister::F8,
            FpuRegister::F9,
            FpuRegister::F10,
            FpuRegister::F11,
            FpuRegister::F12,
            FpuRegister::F13,
            FpuRegister::F14,
            FpuRegister::F15,
        ];
        ALL.get(n as usize).copied()
    }
}

impl std::fmt::Display for FpuRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

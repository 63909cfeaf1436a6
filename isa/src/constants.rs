//! Fixed limits the rest of the crate and its dependents build around.

/// Every instruction in the standard or extended plane fits in this many bytes.
pub const MAX_INSTR_BYTES: usize = 8;

/// Prefix byte that opens the extended instruction plane (see `extended`, `ext_alu`).
pub const EXT_PREFIX: u8 = 0x02;

/// Byte gaps in the flat output buffer are filled with this sentinel at init.
pub const FILL_BYTE: u8 = 0xFF;

/// Stride between consecutive `R0..R63` register-window slots in the direct page.
pub const REGISTER_STRIDE: u32 = 4;

/// Number of aligned direct-page slots exposed as `R0..R63`.
pub const REGISTER_ALIAS_COUNT: u32 = 64;

/// Number of FPU registers (`F0..F15`).
pub const FPU_REGISTER_COUNT: u32 = 16;

/// Bounded include-stack depth, to keep a cyclic `.INCLUDE` from exhausting the stack.
pub const MAX_INCLUDE_DEPTH: usize = 16;

/// Maximum number of `-I` search paths the CLI surface accepts.
pub const MAX_INCLUDE_PATHS: usize = 8;

/// Upper bound on the flat output buffer's size.
pub const MAX_FLAT_SIZE: usize = 1024 * 1024;

/// `WDM`'s real opcode; reserved in 32-bit mode and escapes `WAI`/`STP`.
pub const WDM_ESCAPE: u8 = 0x42;
pub const WAI_ESCAPE_SUFFIX: u8 = 0xCB;
pub const STP_ESCAPE_SUFFIX: u8 = 0xDB;

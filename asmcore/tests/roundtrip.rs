//! Assemble a small program, disassemble the result, and reassemble the
//! disassembly: the bytes from both assembles must match exactly.

use std::io::Write;

use disasmcore::{context::DecodeContext, listing::disassemble};
use isa::mode::Width;

fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("asmcore_roundtrip_test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

fn assemble_bytes(path: &std::path::Path) -> Vec<u8> {
    let program = asmcore::assemble_file(path, &[]).unwrap();
    assert_eq!(program.diagnostics.error_count(), 0, "{:?}", program.diagnostics.items);
    program.sections.get(0).bytes.clone()
}

#[test]
fn assemble_disassemble_reassemble_matches_byte_for_byte() {
    let source = "\
.ORG $2000
.M8
.X8
LDA #$42
STA R4
NOP
BNE $00002000
";
    let first = write_temp("forward.s", source);
    let original = assemble_bytes(&first);

    let mut ctx = DecodeContext::new();
    ctx.mode.m = Width::W8;
    ctx.mode.x = Width::W8;
    let lines = disassemble(&original, 0x2000, &mut ctx);

    let mut rebuilt = String::from(".ORG $2000\n.M8\n.X8\n");
    for line in &lines {
        rebuilt.push_str(&line.text);
        rebuilt.push('\n');
    }

    let second = write_temp("rebuilt.s", &rebuilt);
    let roundtripped = assemble_bytes(&second);

    assert_eq!(original, roundtripped);
}

#[test]
fn register_alias_round_trips_through_disassembly_text() {
    let source = ".ORG $3000\nLDA R4\n";
    let path = write_temp("alias.s", source);
    let original = assemble_bytes(&path);
    assert_eq!(original, vec![0xA5, 0x10]);

    let mut ctx = DecodeContext::new();
    ctx.mode.m = Width::W32;
    ctx.mode.x = Width::W32;
    let lines = disassemble(&original, 0x3000, &mut ctx);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text, "LDA R4");

    let rebuilt = format!(".ORG $3000\n{}\n", lines[0].text);
    let second = write_temp("alias_rebuilt.s", &rebuilt);
    let roundtripped = assemble_bytes(&second);
    assert_eq!(original, roundtripped);
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use disasmcore::context::DecodeContext;
use disasmcore::listing::disassemble;
use isa::mode::Width;

/// Disassembler for the m32 extended 6502/65816 instruction set.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    input: PathBuf,
    #[arg(short = 'o', long = "origin", value_parser = parse_u32, default_value = "0")]
    origin: u32,
    #[arg(short = 'l', long = "length", value_parser = parse_usize)]
    length: Option<usize>,
    #[arg(short = 's', long = "skip", value_parser = parse_usize, default_value = "0")]
    skip: usize,
    #[arg(short = 'x', long = "hex-bytes")]
    hex_bytes: bool,
    #[arg(short = 'n', long = "no-address")]
    no_address: bool,
    #[arg(short = 'm', long = "m-width", value_parser = parse_width, default_value = "16")]
    m_width: Width,
    #[arg(long = "x-width", value_parser = parse_width, default_value = "16")]
    x_width: Width,
}

fn parse_u32(text: &str) -> Result<u32, String> {
    let text = text.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(text, 16).map_err(|e| e.to_string())
}

fn parse_usize(text: &str) -> Result<usize, String> {
    text.parse().map_err(|e: std::num::ParseIntError| e.to_string())
}

fn parse_width(text: &str) -> Result<Width, String> {
    match text {
        "8" => Ok(Width::W8),
        "16" => Ok(Width::W16),
        "32" => Ok(Width::W32),
        other => Err(format!("expected 8, 16, or 32, got \"{}\"", other)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let data = match std::fs::read(&cli.input) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("reading \"{}\" failed: {}", cli.input.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let start = cli.skip.min(data.len());
    let end = match cli.length {
        Some(length) => start.saturating_add(length).min(data.len()),
        None => data.len(),
    };
    let slice = &data[start..end];

    let mut ctx = DecodeContext::new();
    ctx.mode.m = cli.m_width;
    ctx.mode.x = cli.x_width;

    let lines = disassemble(slice, cli.origin, &mut ctx);
    for line in &lines {
        let mut out = String::new();
        if !cli.no_address {
            out.push_str(&format!("{:08X}  ", line.address));
        }
        if cli.hex_bytes {
            let hex: Vec<String> = line.bytes.iter().map(|b| format!("{:02X}", b)).collect();
            out.push_str(&format!("{:<12}  ", hex.join(" ")));
        }
        out.push_str(&line.text);
        println!("{}", out);
    }

    ExitCode::SUCCESS
}

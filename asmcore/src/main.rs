use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use asmcore::driver::FatalError;
use asmcore::{output, Severity};

/// Assembler for the m32 extended 6502/65816 instruction set.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Source file to assemble
    input: PathBuf,

    /// Output file to write to
    #[arg(short, long, value_name = "FILE", default_value = "a.out")]
    output: PathBuf,

    /// Write a section/symbol map to this file
    #[arg(short = 'm', long = "map", value_name = "FILE")]
    map: Option<PathBuf>,

    /// Additional directory to search for `.INCLUDE`d files (repeatable)
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    include_paths: Vec<PathBuf>,

    /// Emit Intel HEX instead of a flat binary
    #[arg(short = 'h', long = "hex")]
    hex: bool,

    /// List defined symbols to stdout after assembling
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Print each assembled section's size to stdout
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let program = match asmcore::assemble_file(&cli.input, &cli.include_paths) {
        Ok(program) => program,
        Err(err) => {
            report_fatal(&err);
            return ExitCode::FAILURE;
        }
    };

    for diagnostic in &program.diagnostics.items {
        eprintln!("{}", diagnostic);
    }
    if program.diagnostics.error_count() > 0 {
        return ExitCode::FAILURE;
    }

    if let Err(err) = write_output(cli.hex, &program.sections, &cli.output) {
        eprintln!("writing \"{}\" failed: {}", cli.output.display(), err);
        return ExitCode::FAILURE;
    }

    if let Some(map_path) = &cli.map {
        if let Err(err) = write_map(&program.sections, &program.symbols, map_path) {
            eprintln!("writing \"{}\" failed: {}", map_path.display(), err);
            return ExitCode::FAILURE;
        }
    }

    if cli.list {
        let mut out = std::io::stdout();
        if let Err(err) = output::write_symbol_map_text(&program.sections, &program.symbols, &mut out) {
            eprintln!("listing symbols failed: {}", err);
            return ExitCode::FAILURE;
        }
    }

    if cli.verbose {
        for section in program.sections.iter().filter(|s| s.size() > 0) {
            println!("{}: {} byte(s) at ${:08X}", section.name, section.size(), section.origin);
        }
    }

    let warning_count = program.diagnostics.items.iter().filter(|d| d.severity == Severity::Warning).count();
    if warning_count > 0 {
        eprintln!("{} warning(s)", warning_count);
    }
    ExitCode::SUCCESS
}

fn write_output(hex: bool, sections: &asmcore::section::SectionTable, path: &Path) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    if hex {
        output::write_intel_hex(sections, &mut file)
    } else {
        output::write_flat(sections, &mut file)
    }
}

fn write_map(
    sections: &asmcore::section::SectionTable,
    symbols: &asmcore::symbol::SymbolTable,
    path: &Path,
) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    output::write_symbol_map_text(sections, symbols, &mut file)
}

fn report_fatal(err: &FatalError) {
    match err {
        FatalError::Io(path, io_err) => {
            eprintln!("reading \"{}\" failed: {}", path.display(), io_err)
        }
        FatalError::Include(path, include_err) => {
            eprintln!("{}: .INCLUDE failed: {:?}", path.display(), include_err)
        }
    }
}

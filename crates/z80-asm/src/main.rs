//! CLI entry point for the `z80-asm` binary.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;
use tracing_subscriber::EnvFilter;
use z80_asm::{assemble, AsmError, AssembleResult, ParseOptions};
use z80_core::{Flags, Machine, Reg16, Reg8, RunLimit, RunOutcome, DEFAULT_MAX_STEPS};

const USAGE_TEXT: &str = "\
Usage: z80-asm <command> [options]

Commands:
  build  <input> [-o <output>] [--verbose]  Assemble source to binary
  run    <input> [--max-steps <n>]          Assemble, run to HALT, dump registers
  disasm <binary> [--origin <addr>]         List the instructions in a binary

Options:
  -o, --output <file>  Output file path (default: input stem + .bin)
  -v, --verbose        Print listing to stderr (build only)
  --max-steps <n>      Instruction budget for run (default 1000000)
  --origin <addr>      Load address for disasm, decimal or hex with H suffix
  -h, --help           Show this help message

Set RUST_LOG (e.g. RUST_LOG=debug) for diagnostics on stderr.
";

const EXIT_FAILURE: i32 = 1;
const EXIT_USAGE: i32 = 2;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Build(BuildArgs),
    Run(RunArgs),
    Disasm(DisasmArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct BuildArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    input: PathBuf,
    max_steps: u64,
}

#[derive(Debug, PartialEq, Eq)]
struct DisasmArgs {
    input: PathBuf,
    origin: u16,
}

#[derive(Debug)]
enum Invocation {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<Invocation, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(Invocation::Help);
    }

    let command = match first.to_string_lossy().as_ref() {
        "build" => parse_build_args(args).map(Command::Build),
        "run" => parse_run_args(args).map(Command::Run),
        "disasm" => parse_disasm_args(args).map(Command::Disasm),
        other => Err(format!("unknown command: {other}")),
    }?;
    Ok(Invocation::Command(command))
}

fn take_input(input: &mut Option<PathBuf>, arg: OsString) -> Result<(), String> {
    if arg.to_string_lossy().starts_with('-') {
        return Err(format!("unknown option: {}", arg.to_string_lossy()));
    }
    if input.is_some() {
        return Err("only one input path is accepted".to_string());
    }
    *input = Some(PathBuf::from(arg));
    Ok(())
}

fn option_value(args: &mut impl Iterator<Item = OsString>, flag: &str) -> Result<String, String> {
    args.next()
        .map(|value| value.to_string_lossy().into_owned())
        .ok_or_else(|| format!("missing value for {flag}"))
}

#[allow(clippy::while_let_on_iterator)]
fn parse_build_args(mut args: impl Iterator<Item = OsString>) -> Result<BuildArgs, String> {
    let mut input = None;
    let mut output = None;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--verbose" || arg == "-v" {
            verbose = true;
        } else if arg == "-o" || arg == "--output" {
            output = Some(PathBuf::from(option_value(&mut args, "-o")?));
        } else {
            take_input(&mut input, arg)?;
        }
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(BuildArgs {
        input,
        output,
        verbose,
    })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut input = None;
    let mut max_steps = DEFAULT_MAX_STEPS;

    while let Some(arg) = args.next() {
        if arg == "--max-steps" {
            let value = option_value(&mut args, "--max-steps")?;
            max_steps = value
                .parse()
                .map_err(|_| format!("invalid step count: {value}"))?;
        } else {
            take_input(&mut input, arg)?;
        }
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(RunArgs { input, max_steps })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_disasm_args(mut args: impl Iterator<Item = OsString>) -> Result<DisasmArgs, String> {
    let mut input = None;
    let mut origin = 0;

    while let Some(arg) = args.next() {
        if arg == "--origin" {
            let value = option_value(&mut args, "--origin")?;
            origin = z80_asm::mnemonic::literal(&value)
                .and_then(|n| u16::try_from(n).ok())
                .ok_or_else(|| format!("invalid origin: {value}"))?;
        } else {
            take_input(&mut input, arg)?;
        }
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(DisasmArgs { input, origin })
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().map_or_else(|| "out".into(), |s| s.to_string_lossy());
    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{stem}.bin"))
}

fn report(input: &Path, err: &AsmError) {
    if err.line().is_some() {
        eprintln!("{}: error: {err}", input.display());
    } else {
        eprintln!("error: {err}");
    }
}

fn assemble_input(input: &Path) -> Result<AssembleResult, i32> {
    assemble(input, ParseOptions::default()).map_err(|e| {
        report(input, &e);
        EXIT_FAILURE
    })
}

fn run_build(args: BuildArgs) -> Result<(), i32> {
    let result = assemble_input(&args.input)?;
    let output_path = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input));

    if let Err(e) = fs::write(&output_path, &result.binary) {
        eprintln!("error: failed to write {}: {e}", output_path.display());
        return Err(EXIT_FAILURE);
    }

    if args.verbose {
        print_listing(&result);
    }

    println!(
        "Assembled {} ({} bytes) -> {}",
        args.input.display(),
        result.binary.len(),
        output_path.display()
    );
    Ok(())
}

fn print_listing(result: &AssembleResult) {
    for entry in &result.listing {
        let hex_bytes = entry
            .bytes
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        eprintln!(
            "{:04X}: {:<12} {} ; line {}",
            entry.address, hex_bytes, entry.source, entry.line
        );
    }
}

fn new_machine() -> Result<Machine, i32> {
    Machine::new().map_err(|e| {
        eprintln!("error: {e}");
        EXIT_FAILURE
    })
}

fn run_program(args: &RunArgs) -> Result<(), i32> {
    let result = assemble_input(&args.input)?;
    let mut machine = new_machine()?;
    machine.load(result.program.origin, &result.binary);

    let outcome = machine
        .run_until_halt(RunLimit {
            max_steps: args.max_steps,
        })
        .map_err(|e| {
            eprintln!(
                "error: at 0x{:04X}: {e}",
                machine.registers().pc()
            );
            EXIT_FAILURE
        })?;

    match outcome {
        RunOutcome::Halted { steps } => println!("Halted after {steps} steps"),
        RunOutcome::StepLimit { steps } => println!("Stopped after {steps} steps (no HALT)"),
    }
    print_registers(&machine);

    if matches!(outcome, RunOutcome::Halted { .. }) {
        Ok(())
    } else {
        Err(EXIT_FAILURE)
    }
}

fn print_registers(machine: &Machine) {
    let regs = machine.registers();
    let bytes = [
        Reg8::A,
        Reg8::F,
        Reg8::B,
        Reg8::C,
        Reg8::D,
        Reg8::E,
        Reg8::H,
        Reg8::L,
        Reg8::I,
        Reg8::R,
    ]
    .map(|reg| format!("{}={:02X}", reg.name(), regs.get8(reg)))
    .join(" ");
    let words = [Reg16::Ix, Reg16::Iy, Reg16::Sp, Reg16::Pc]
        .map(|reg| format!("{}={:04X}", reg.name(), regs.get16(reg)))
        .join(" ");
    println!("{bytes}");
    println!("{words}");
    println!("Flags: {}", flag_letters(regs.flags()));
}

fn flag_letters(flags: Flags) -> String {
    [
        (Flags::S, 'S'),
        (Flags::Z, 'Z'),
        (Flags::F5, '5'),
        (Flags::H, 'H'),
        (Flags::F3, '3'),
        (Flags::PV, 'P'),
        (Flags::N, 'N'),
        (Flags::C, 'C'),
    ]
    .iter()
    .map(|&(flag, letter)| if flags.contains(flag) { letter } else { '-' })
    .collect()
}

fn run_disasm(args: &DisasmArgs) -> Result<(), i32> {
    let image = fs::read(&args.input).map_err(|e| {
        eprintln!("error: {}: {e}", args.input.display());
        EXIT_FAILURE
    })?;
    let mut machine = new_machine()?;
    machine.load(args.origin, &image);

    let mut consumed = 0;
    for row in machine.disassemble(args.origin, image.len()) {
        if consumed >= image.len() {
            break;
        }
        consumed += row.bytes.len();
        println!("{row}");
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(Invocation::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(Invocation::Command(command)) => {
            tracing::debug!(?command, "starting");
            let result = match command {
                Command::Build(args) => run_build(args),
                Command::Run(args) => run_program(&args),
                Command::Disasm(args) => run_disasm(&args),
            };
            result.err().unwrap_or(0)
        }
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{USAGE_TEXT}");
            EXIT_USAGE
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::path::PathBuf;

    use z80_core::Flags;

    use super::{
        default_output_path, flag_letters, parse_args, parse_build_args, parse_disasm_args,
        parse_run_args, BuildArgs, DisasmArgs, Invocation, RunArgs,
    };

    fn os(args: &[&str]) -> impl Iterator<Item = OsString> {
        args.iter().map(OsString::from).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_build_command() {
        let result = parse_build_args(os(&["program.asm", "-o", "out.bin", "--verbose"]))
            .expect("valid build args should parse");
        assert_eq!(
            result,
            BuildArgs {
                input: PathBuf::from("program.asm"),
                output: Some(PathBuf::from("out.bin")),
                verbose: true,
            }
        );
    }

    #[test]
    fn parses_run_step_budget() {
        let result = parse_run_args(os(&["prog.asm", "--max-steps", "50"])).unwrap();
        assert_eq!(
            result,
            RunArgs {
                input: PathBuf::from("prog.asm"),
                max_steps: 50,
            }
        );
    }

    #[test]
    fn parses_hex_origin() {
        let result = parse_disasm_args(os(&["--origin", "8000H", "rom.bin"])).unwrap();
        assert_eq!(
            result,
            DisasmArgs {
                input: PathBuf::from("rom.bin"),
                origin: 0x8000,
            }
        );
    }

    #[test]
    fn rejects_bad_origin() {
        let error = parse_disasm_args(os(&["rom.bin", "--origin", "70000"])).unwrap_err();
        assert!(error.contains("invalid origin"));
    }

    #[test]
    fn parses_help_flag() {
        assert!(matches!(parse_args(os(&["--help"])), Ok(Invocation::Help)));
    }

    #[test]
    fn rejects_unknown_command() {
        let error = parse_args(os(&["link"])).unwrap_err();
        assert!(error.contains("unknown command"));
    }

    #[test]
    fn rejects_unknown_option() {
        let error = parse_run_args(os(&["prog.asm", "--fast"])).unwrap_err();
        assert!(error.contains("unknown option"));
    }

    #[test]
    fn missing_input_is_reported() {
        let error = parse_build_args(std::iter::empty()).unwrap_err();
        assert!(error.contains("missing input"));
    }

    #[test]
    fn default_output_replaces_extension() {
        assert_eq!(
            default_output_path(&PathBuf::from("src/program.asm")),
            PathBuf::from("src/program.bin")
        );
        assert_eq!(
            default_output_path(&PathBuf::from("program")),
            PathBuf::from("program.bin")
        );
    }

    #[test]
    fn flags_render_as_letters() {
        assert_eq!(flag_letters(Flags::Z | Flags::C), "-Z-----C");
        assert_eq!(flag_letters(Flags::all()), "SZ5H3PNC");
    }
}

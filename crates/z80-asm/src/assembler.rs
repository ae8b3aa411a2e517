//! Top-level assembler pipeline.
//!
//! [`assemble`] reads a source file, parses it with the three-pass
//! [`ProgramParser`](crate::parser::ProgramParser) and lays the commands
//! out as one contiguous image plus a listing.

use std::fs;
use std::path::Path;

use crate::errors::AsmError;
use crate::parser::{parse_program, ParseOptions, ParsedCommand, ParsedProgram};

/// An entry in the address-to-source listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Address of the first byte.
    pub address: u16,
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// Instruction text as written.
    pub source: String,
    /// Source line.
    pub line: usize,
}

/// Assembled image plus metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleResult {
    /// Image starting at [`ParsedProgram::origin`].
    pub binary: Vec<u8>,
    /// One entry per instruction.
    pub listing: Vec<ListingEntry>,
    /// The parsed program the image was built from.
    pub program: ParsedProgram,
}

/// Assembles a source file.
///
/// # Errors
///
/// Returns [`AsmError::Io`] if the file cannot be read,
/// [`AsmError::InvalidLines`] if any line matches no instruction form, and
/// any parse error raised by [`parse_program`].
pub fn assemble(path: &Path, options: ParseOptions) -> Result<AssembleResult, AsmError> {
    let source = fs::read_to_string(path).map_err(|e| AsmError::io(path, &e))?;
    assemble_source(&source, options)
}

/// Assembles program text.
///
/// # Errors
///
/// As [`assemble`], minus the I/O error.
pub fn assemble_source(source: &str, options: ParseOptions) -> Result<AssembleResult, AsmError> {
    let program = parse_program(source, options)?;
    let binary = program.to_bytes()?;
    let listing = program
        .commands
        .iter()
        .filter_map(|command| match command {
            ParsedCommand::Valid {
                line,
                text,
                memory_offset,
                ..
            } => Some(ListingEntry {
                address: *memory_offset,
                bytes: command.to_bytes().unwrap_or_default(),
                source: text.clone(),
                line: *line,
            }),
            ParsedCommand::Invalid { .. } => None,
        })
        .collect();
    tracing::debug!(
        bytes = binary.len(),
        labels = program.labels.len(),
        "assembled program"
    );
    Ok(AssembleResult {
        binary,
        listing,
        program,
    })
}

//! Label-resolving Z80 assembler library.

use tracing_subscriber as _;

/// File-level assembly pipeline and listing.
pub mod assembler;
/// Single-instruction encoding.
pub mod encoder;
/// Assembler error type.
pub mod errors;
/// Instruction text normalisation.
pub mod mnemonic;
/// Three-pass program parser.
pub mod parser;
/// Comment stripping and label splitting.
pub mod source;
/// Label table.
pub mod symbols;

pub use assembler::{assemble, assemble_source, AssembleResult, ListingEntry};
pub use encoder::{Assembler, EncodedOperand};
pub use errors::AsmError;
pub use mnemonic::normalize;
pub use parser::{parse_program, ParseOptions, ParsedCommand, ParsedProgram, ProgramParser};
pub use symbols::{Label, LabelTable};

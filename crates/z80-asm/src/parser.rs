//! Label-resolving program parser.
//!
//! Parsing runs in three passes over the source statements:
//!
//! 1. **Harvest**: every `label:` prefix enters the [`LabelTable`] at
//!    address 0 so forward references are known names.
//! 2. **Address**: labels get the running offset of their line. Operand
//!    names are replaced by `00` so the matched form (and so the length)
//!    does not depend on label spelling. Lines that match no form are
//!    recorded as invalid and take no space.
//! 3. **Resolve**: names are replaced by their decimal address, or by
//!    `target - next` for `JR`/`DJNZ`, and literals are bound to the form
//!    matched in pass 2.

use z80_core::{InstructionDescriptor, Opcode};

use crate::encoder::{bind_operands, encode, Assembler, EncodedOperand};
use crate::errors::AsmError;
use crate::mnemonic::{is_reserved, map_identifiers, normalize_instruction};
use crate::source::{statements, Statement};
use crate::symbols::LabelTable;

const ADDRESS_SPACE_END: u32 = 0x1_0000;
const WIDTH_PLACEHOLDER: &str = "00";

/// Program parser configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Address of the first instruction.
    pub origin: u16,
}

/// One instruction line of a parsed program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    /// The line matched no opcode table form.
    Invalid {
        /// Source line.
        line: usize,
        /// Instruction text as written.
        text: String,
    },
    /// A fully resolved instruction.
    Valid {
        /// Source line.
        line: usize,
        /// Instruction text as written.
        text: String,
        /// Matched opcode.
        opcode: Opcode,
        /// Encoded length in bytes.
        length: u8,
        /// Address of the first byte.
        memory_offset: u16,
        /// Operand values in textual order.
        operands: Vec<EncodedOperand>,
    },
}

impl ParsedCommand {
    /// Returns `true` for lines that matched no form.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }

    /// Source line.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::Invalid { line, .. } | Self::Valid { line, .. } => *line,
        }
    }

    /// Instruction text as written.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Invalid { text, .. } | Self::Valid { text, .. } => text,
        }
    }

    /// Address of a valid command.
    #[must_use]
    pub const fn memory_offset(&self) -> Option<u16> {
        match self {
            Self::Valid { memory_offset, .. } => Some(*memory_offset),
            Self::Invalid { .. } => None,
        }
    }

    /// Encoded bytes of a valid command.
    #[must_use]
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Self::Valid {
                opcode, operands, ..
            } => Some(encode(*opcode, operands)),
            Self::Invalid { .. } => None,
        }
    }
}

/// Result of parsing a whole program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedProgram {
    /// One entry per instruction line, in source order.
    pub commands: Vec<ParsedCommand>,
    /// Labels with their resolved addresses.
    pub labels: LabelTable,
    /// Address of the first byte.
    pub origin: u16,
}

impl ParsedProgram {
    /// Source lines of invalid commands.
    #[must_use]
    pub fn invalid_lines(&self) -> Vec<usize> {
        self.commands
            .iter()
            .filter(|command| command.is_invalid())
            .map(ParsedCommand::line)
            .collect()
    }

    /// Contiguous image starting at [`Self::origin`].
    ///
    /// # Errors
    ///
    /// Returns [`AsmError::InvalidLines`] if any command is invalid.
    pub fn to_bytes(&self) -> Result<Vec<u8>, AsmError> {
        let invalid = self.invalid_lines();
        if !invalid.is_empty() {
            return Err(AsmError::InvalidLines { lines: invalid });
        }
        Ok(self
            .commands
            .iter()
            .filter_map(ParsedCommand::to_bytes)
            .flatten()
            .collect())
    }
}

/// Parses a program with the shared opcode table.
///
/// # Errors
///
/// See [`ProgramParser::parse`].
pub fn parse_program(source: &str, options: ParseOptions) -> Result<ParsedProgram, AsmError> {
    ProgramParser::new(Assembler::shared()?, options).parse(source)
}

/// Three-pass program parser.
#[derive(Debug, Clone, Copy)]
pub struct ProgramParser<'t> {
    assembler: Assembler<'t>,
    options: ParseOptions,
}

struct Placed<'s> {
    statement: &'s Statement,
    instruction: &'s str,
    descriptor: Option<InstructionDescriptor>,
    offset: u16,
}

impl<'t> ProgramParser<'t> {
    /// Creates a parser.
    #[must_use]
    pub const fn new(assembler: Assembler<'t>, options: ParseOptions) -> Self {
        Self { assembler, options }
    }

    /// Parses `source`.
    ///
    /// Lines that match no opcode form become [`ParsedCommand::Invalid`]
    /// without stopping the parse.
    ///
    /// # Errors
    ///
    /// Label errors ([`AsmError::DuplicateLabel`], [`AsmError::InvalidLabel`],
    /// [`AsmError::UndefinedLabel`]), operand range errors and
    /// [`AsmError::AddressOverflow`] abort the parse.
    pub fn parse(&self, source: &str) -> Result<ParsedProgram, AsmError> {
        let statements = statements(source);

        let mut labels = LabelTable::new();
        for statement in &statements {
            if let Some(label) = &statement.label {
                labels.harvest(label, statement.line)?;
            }
        }

        let placed = self.assign_addresses(&statements, &mut labels)?;

        let commands = placed
            .iter()
            .map(|entry| resolve(entry, &labels))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ParsedProgram {
            commands,
            labels,
            origin: self.options.origin,
        })
    }

    fn assign_addresses<'s>(
        &self,
        statements: &'s [Statement],
        labels: &mut LabelTable,
    ) -> Result<Vec<Placed<'s>>, AsmError> {
        let mut placed = Vec::new();
        let mut offset = u32::from(self.options.origin);

        for statement in statements {
            let address =
                u16::try_from(offset).map_err(|_| AsmError::AddressOverflow {
                    line: statement.line,
                })?;
            if let Some(label) = &statement.label {
                labels.define(label, address);
            }
            let Some(instruction) = statement.instruction.as_deref() else {
                continue;
            };

            let sized = rewrite_operands(instruction, |name| {
                (!is_reserved(name)).then(|| WIDTH_PLACEHOLDER.to_string())
            });
            let descriptor = self.assembler.resolve(&sized);
            match &descriptor {
                Some(found) => {
                    offset += u32::from(found.length);
                    if offset > ADDRESS_SPACE_END {
                        return Err(AsmError::AddressOverflow {
                            line: statement.line,
                        });
                    }
                }
                None => {
                    tracing::debug!(line = statement.line, instruction, "no opcode form matches");
                }
            }
            placed.push(Placed {
                statement,
                instruction,
                descriptor,
                offset: address,
            });
        }
        Ok(placed)
    }
}

fn resolve(entry: &Placed<'_>, labels: &LabelTable) -> Result<ParsedCommand, AsmError> {
    let line = entry.statement.line;
    let Some(descriptor) = &entry.descriptor else {
        return Ok(ParsedCommand::Invalid {
            line,
            text: entry.instruction.to_string(),
        });
    };

    let relative = is_relative_branch(entry.instruction);
    let next = u32::from(entry.offset) + u32::from(descriptor.length);
    let mut failure = None;
    let resolved = rewrite_operands(entry.instruction, |name| {
        if is_reserved(name) || failure.is_some() {
            return None;
        }
        let value = labels.resolve(name, line).and_then(|target| {
            tracing::trace!(line, label = name, target, "label resolved");
            if relative {
                branch_displacement(target, next, line)
            } else {
                Ok(i32::from(target))
            }
        });
        match value {
            Ok(value) => Some(value.to_string()),
            Err(err) => {
                failure = Some(err);
                None
            }
        }
    });
    if let Some(err) = failure {
        return Err(err);
    }

    let literals = normalize_instruction(&resolved).literals;
    let operands = bind_operands(descriptor, &literals, line)?;
    Ok(ParsedCommand::Valid {
        line,
        text: entry.instruction.to_string(),
        opcode: descriptor.opcode,
        length: descriptor.length,
        memory_offset: entry.offset,
        operands,
    })
}

fn branch_displacement(target: u16, next: u32, line: usize) -> Result<i32, AsmError> {
    let displacement = i64::from(target) - i64::from(next);
    i8::try_from(displacement)
        .map(i32::from)
        .map_err(|_| AsmError::BranchOutOfRange {
            line,
            target,
            next: u16::try_from(next).unwrap_or(u16::MAX),
        })
}

fn is_relative_branch(instruction: &str) -> bool {
    let mnemonic = instruction
        .split_whitespace()
        .next()
        .unwrap_or_default();
    mnemonic.eq_ignore_ascii_case("JR") || mnemonic.eq_ignore_ascii_case("DJNZ")
}

/// Rewrites identifiers in the operand part of `instruction`, leaving the
/// mnemonic alone.
fn rewrite_operands(instruction: &str, replace: impl FnMut(&str) -> Option<String>) -> String {
    match instruction.split_once(char::is_whitespace) {
        Some((mnemonic, operands)) => format!("{mnemonic} {}", map_identifiers(operands, replace)),
        None => instruction.to_string(),
    }
}

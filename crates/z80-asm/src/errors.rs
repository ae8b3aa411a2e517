//! Error type for every assembler phase.
//!
//! Line-level failures carry the 1-based source line they were raised on so
//! a driver can print them in the usual `file:line: error: message` style.
//! A single instruction assembled on its own reports line 1.

use thiserror::Error;
use z80_core::TableError;

/// A program that cannot be turned into bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    /// No table entry matches the instruction text.
    #[error("line {line}: unknown mnemonic: {text}")]
    UnknownMnemonic {
        /// Source line.
        line: usize,
        /// Instruction text as written.
        text: String,
    },
    /// A literal does not fit the operand width it encodes into.
    #[error("line {line}: operand {value} does not fit in {width} byte(s)")]
    OperandOutOfRange {
        /// Source line.
        line: usize,
        /// Literal value.
        value: i32,
        /// Encoded width in bytes.
        width: u8,
    },
    /// The operand list does not line up with the matched instruction.
    #[error("line {line}: malformed operand: {operand}")]
    MalformedOperand {
        /// Source line.
        line: usize,
        /// Offending operand text.
        operand: String,
    },
    /// The label is a register or condition name, or not an identifier.
    #[error("line {line}: invalid label name '{name}'")]
    InvalidLabel {
        /// Source line.
        line: usize,
        /// Label as written.
        name: String,
    },
    /// A label was defined twice.
    #[error("line {line}: duplicate label '{name}' (first defined at line {first_line})")]
    DuplicateLabel {
        /// Line of the second definition.
        line: usize,
        /// Label name.
        name: String,
        /// Line of the first definition.
        first_line: usize,
    },
    /// An operand names a label that is never defined.
    #[error("line {line}: undefined label '{name}'")]
    UndefinedLabel {
        /// Source line.
        line: usize,
        /// Label name.
        name: String,
    },
    /// A relative branch target is more than a signed byte away.
    #[error("line {line}: relative branch to 0x{target:04X} from 0x{next:04X} is out of range")]
    BranchOutOfRange {
        /// Source line.
        line: usize,
        /// Branch target address.
        target: u16,
        /// Address of the following instruction.
        next: u16,
    },
    /// The program runs past the end of the 16-bit address space.
    #[error("line {line}: program does not fit below 0x10000")]
    AddressOverflow {
        /// Line whose instruction crosses the boundary.
        line: usize,
    },
    /// Lines that did not resolve to any instruction.
    #[error("invalid instruction on line(s) {}", join_lines(.lines))]
    InvalidLines {
        /// Offending source lines, ascending.
        lines: Vec<usize>,
    },
    /// The opcode table or whitelist failed to load.
    #[error(transparent)]
    Table(#[from] TableError),
    /// Reading or writing a file failed.
    #[error("{path}: {message}")]
    Io {
        /// File involved.
        path: String,
        /// Underlying I/O error text.
        message: String,
    },
}

impl AsmError {
    /// Source line of a line-level error.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::UnknownMnemonic { line, .. }
            | Self::OperandOutOfRange { line, .. }
            | Self::MalformedOperand { line, .. }
            | Self::InvalidLabel { line, .. }
            | Self::DuplicateLabel { line, .. }
            | Self::UndefinedLabel { line, .. }
            | Self::BranchOutOfRange { line, .. }
            | Self::AddressOverflow { line } => Some(*line),
            Self::InvalidLines { .. } | Self::Table(_) | Self::Io { .. } => None,
        }
    }

    pub(crate) fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

fn join_lines(lines: &[usize]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::AsmError;

    #[test]
    fn line_errors_report_their_line() {
        let err = AsmError::UndefinedLabel {
            line: 4,
            name: "Loop".into(),
        };
        assert_eq!(err.line(), Some(4));
        assert_eq!(err.to_string(), "line 4: undefined label 'Loop'");
    }

    #[test]
    fn invalid_lines_are_listed() {
        let err = AsmError::InvalidLines {
            lines: vec![2, 7],
        };
        assert_eq!(err.line(), None);
        assert_eq!(err.to_string(), "invalid instruction on line(s) 2, 7");
    }

    #[test]
    fn branch_range_message_shows_both_addresses() {
        let err = AsmError::BranchOutOfRange {
            line: 9,
            target: 0x0200,
            next: 0x0002,
        };
        assert_eq!(
            err.to_string(),
            "line 9: relative branch to 0x0200 from 0x0002 is out of range"
        );
    }
}

use thiserror::Error;

use crate::encoding::Opcode;

/// Fault classes used to tell a driving tool what kind of failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultClass {
    /// The fetched bytes or instruction text could not be decoded.
    Decode,
    /// The instruction is well formed but its operands are not allowed.
    Operand,
    /// Control flow left the 16-bit address space.
    Range,
    /// The instruction exists in the table but has no execution semantics here.
    Unsupported,
}

/// Runtime fault raised while decoding or executing an instruction.
///
/// Machine state mutated before the fault point is not rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ExecError {
    /// The operand combination is not on the legality whitelist.
    #[error("illegal operand combination: {instruction}")]
    IllegalOperands {
        /// Whitelist key that was rejected.
        instruction: String,
    },
    /// An immediate operand was used as a destination.
    #[error("cannot write to an immediate operand")]
    WriteToImmediate,
    /// A relative jump would leave the 16-bit address space.
    #[error("relative jump from 0x{pc:04X} by {offset} leaves the address space")]
    RelativeJumpOutOfRange {
        /// Program counter the offset was applied to.
        pc: u16,
        /// Signed displacement.
        offset: i8,
    },
    /// No table entry exists for the fetched opcode.
    #[error("unknown opcode {opcode} at 0x{pc:04X}")]
    UnknownOpcode {
        /// Opcode bytes that were fetched.
        opcode: Opcode,
        /// Address of the first opcode byte.
        pc: u16,
    },
    /// The instruction has no handler for its operand shape.
    #[error("unsupported instruction: {instruction}")]
    Unsupported {
        /// Fully substituted instruction text.
        instruction: String,
    },
    /// The instruction text could not be split into mnemonic and operands.
    #[error("malformed instruction: {instruction}")]
    MalformedInstruction {
        /// Offending instruction text.
        instruction: String,
    },
}

impl ExecError {
    /// Returns the fault class for this error.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::UnknownOpcode { .. } | Self::MalformedInstruction { .. } => FaultClass::Decode,
            Self::IllegalOperands { .. } | Self::WriteToImmediate => FaultClass::Operand,
            Self::RelativeJumpOutOfRange { .. } => FaultClass::Range,
            Self::Unsupported { .. } => FaultClass::Unsupported,
        }
    }

    pub(crate) fn malformed(text: &str) -> Self {
        Self::MalformedInstruction {
            instruction: text.to_string(),
        }
    }
}

/// Failure to load one of the static instruction-set resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum TableError {
    /// The opcode table did not contain exactly 256 data rows.
    #[error("opcode table has {found} rows, expected 256")]
    RowCount {
        /// Number of data rows found.
        found: usize,
    },
    /// A data row could not be parsed.
    #[error("malformed opcode table row {row}: {reason}")]
    MalformedRow {
        /// 1-based line number in the resource.
        row: usize,
        /// What was wrong with the row.
        reason: String,
    },
    /// The legality whitelist was empty.
    #[error("operand legality whitelist is empty")]
    EmptyWhitelist,
}

#[cfg(test)]
mod tests {
    use super::{ExecError, FaultClass};

    #[test]
    fn class_mapping_separates_decode_operand_and_range_faults() {
        assert_eq!(ExecError::malformed("LD").class(), FaultClass::Decode);
        assert_eq!(ExecError::WriteToImmediate.class(), FaultClass::Operand);
        assert_eq!(
            ExecError::RelativeJumpOutOfRange {
                pc: 0xFFFF,
                offset: 1
            }
            .class(),
            FaultClass::Range
        );
        assert_eq!(
            ExecError::Unsupported {
                instruction: "OUT (C),A".into()
            }
            .class(),
            FaultClass::Unsupported
        );
    }

    #[test]
    fn messages_carry_context() {
        let err = ExecError::RelativeJumpOutOfRange {
            pc: 0xFFFF,
            offset: 1,
        };
        assert_eq!(
            err.to_string(),
            "relative jump from 0xFFFF by 1 leaves the address space"
        );
    }
}

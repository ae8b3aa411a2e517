//! Single-instruction encoding against the opcode table.
//!
//! Bytes are laid out as prefix, opcode, then operands little-endian in
//! textual order. The indexed bit pages (`DDCB`/`FDCB`) put the
//! displacement before the opcode byte: `DD CB d op`.

use z80_core::{placeholders, InstructionDescriptor, Opcode, OpcodeTable, Placeholder, Prefix};

use crate::errors::AsmError;
use crate::mnemonic::normalize_instruction;

/// An operand value with the number of bytes it encodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodedOperand {
    /// Value as written, possibly negative.
    pub value: i32,
    /// Encoded width in bytes (1 or 2).
    pub width: u8,
}

/// Assembles one instruction at a time.
#[derive(Debug, Clone, Copy)]
pub struct Assembler<'t> {
    table: &'t OpcodeTable,
}

impl Assembler<'static> {
    /// Assembler over the process-wide opcode table.
    ///
    /// # Errors
    ///
    /// Returns [`AsmError::Table`] if the embedded table fails to load.
    pub fn shared() -> Result<Self, AsmError> {
        Ok(Self::new(OpcodeTable::shared()?))
    }
}

impl<'t> Assembler<'t> {
    /// Creates an assembler over `table`.
    #[must_use]
    pub const fn new(table: &'t OpcodeTable) -> Self {
        Self { table }
    }

    /// Opcode table in use.
    #[must_use]
    pub const fn table(&self) -> &'t OpcodeTable {
        self.table
    }

    /// Resolves `cmd` to its descriptor, or `None` if no form matches.
    #[must_use]
    pub fn resolve(&self, cmd: &str) -> Option<InstructionDescriptor> {
        self.table
            .resolve_by_mnemonic(&normalize_instruction(cmd).shape)
    }

    /// Encodes a single instruction.
    ///
    /// # Errors
    ///
    /// Returns [`AsmError::UnknownMnemonic`] when no table form matches and
    /// [`AsmError::OperandOutOfRange`] when a literal does not fit.
    pub fn parse(&self, cmd: &str) -> Result<Vec<u8>, AsmError> {
        self.parse_at(cmd, 1)
    }

    pub(crate) fn parse_at(&self, cmd: &str, line: usize) -> Result<Vec<u8>, AsmError> {
        let normalized = normalize_instruction(cmd);
        let descriptor = self
            .table
            .resolve_by_mnemonic(&normalized.shape)
            .ok_or_else(|| AsmError::UnknownMnemonic {
                line,
                text: cmd.trim().to_string(),
            })?;
        let operands = bind_operands(&descriptor, &normalized.literals, line)?;
        Ok(encode(descriptor.opcode, &operands))
    }
}

/// Pairs literals with the descriptor's placeholders and range-checks them.
///
/// # Errors
///
/// Returns [`AsmError::MalformedOperand`] when the counts differ and
/// [`AsmError::OperandOutOfRange`] when a value does not fit its slot.
pub fn bind_operands(
    descriptor: &InstructionDescriptor,
    literals: &[i32],
    line: usize,
) -> Result<Vec<EncodedOperand>, AsmError> {
    let slots = placeholders(&descriptor.mnemonic);
    if slots.len() != literals.len() {
        return Err(AsmError::MalformedOperand {
            line,
            operand: descriptor.mnemonic.clone(),
        });
    }
    slots
        .into_iter()
        .zip(literals)
        .map(|(slot, &value)| {
            if fits(slot, value) {
                Ok(EncodedOperand {
                    value,
                    width: slot.width(),
                })
            } else {
                Err(AsmError::OperandOutOfRange {
                    line,
                    value,
                    width: slot.width(),
                })
            }
        })
        .collect()
}

fn fits(slot: Placeholder, value: i32) -> bool {
    match slot {
        Placeholder::Displacement => (-128..=127).contains(&value),
        Placeholder::Byte => (-128..=0xFF).contains(&value),
        Placeholder::Word => (-0x8000..=0xFFFF).contains(&value),
    }
}

/// Lays out prefix, opcode and operand bytes.
#[must_use]
pub fn encode(opcode: Opcode, operands: &[EncodedOperand]) -> Vec<u8> {
    let mut bytes = opcode.prefix.bytes().to_vec();
    let operand_bytes = operands
        .iter()
        .flat_map(|operand| operand.value.to_le_bytes()[..usize::from(operand.width)].to_vec());
    if matches!(opcode.prefix, Prefix::DdCb | Prefix::FdCb) {
        bytes.extend(operand_bytes);
        bytes.push(opcode.code);
    } else {
        bytes.push(opcode.code);
        bytes.extend(operand_bytes);
    }
    bytes
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::Assembler;
    use crate::errors::AsmError;

    fn assembler() -> Assembler<'static> {
        Assembler::shared().unwrap()
    }

    #[rstest]
    #[case("NOP", &[0x00])]
    #[case("LD B,100", &[0x06, 100])]
    #[case("LD (500),A", &[0x32, 0xF4, 0x01])]
    #[case("LD BC,0ABCDH", &[0x01, 0xCD, 0xAB])]
    #[case("CALL 100", &[0xCD, 100, 0x00])]
    #[case("JR -2", &[0x18, 0xFE])]
    #[case("LD (IX+5),10", &[0xDD, 0x36, 0x05, 0x0A])]
    #[case("LD A,(IY-1)", &[0xFD, 0x7E, 0xFF])]
    #[case("RLC (IX+6)", &[0xDD, 0xCB, 0x06, 0x06])]
    #[case("BIT 7,(IY+2)", &[0xFD, 0xCB, 0x02, 0x7E])]
    #[case("LDIR", &[0xED, 0xB0])]
    #[case("IM 1", &[0xED, 0x56])]
    #[case("RST 38H", &[0xFF])]
    #[case("EX AF,AF'", &[0x08])]
    #[case("OUT (C),0", &[0xED, 0x71])]
    #[case("ld a , 0ffh", &[0x3E, 0xFF])]
    fn encodes_instruction_text(#[case] text: &str, #[case] bytes: &[u8]) {
        assert_eq!(assembler().parse(text).unwrap(), bytes);
    }

    #[test]
    fn unknown_mnemonic_is_reported() {
        let err = assembler().parse("FROB A").unwrap_err();
        assert_eq!(
            err,
            AsmError::UnknownMnemonic {
                line: 1,
                text: "FROB A".into()
            }
        );
    }

    #[rstest]
    #[case("LD B,256")]
    #[case("LD (IX+128),0")]
    #[case("LD HL,65536")]
    fn oversized_literals_are_rejected(#[case] text: &str) {
        assert!(matches!(
            assembler().parse(text),
            Err(AsmError::OperandOutOfRange { .. })
        ));
    }

    #[test]
    fn resolve_reports_length() {
        let descriptor = assembler().resolve("LD (IX+1),2").unwrap();
        assert_eq!(descriptor.length, 4);
    }
}

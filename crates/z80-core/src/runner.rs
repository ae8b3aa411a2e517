//! Fetch, operand substitution and dispatch of the instruction at PC.

use crate::decoder::{decode_text, Mnemonic};
use crate::dispatch::DispatchTable;
use crate::encoding::{placeholders, Opcode, Placeholder, Prefix};
use crate::execute::ExecutionEngine;
use crate::fault::ExecError;
use crate::legality::LegalityValidator;
use crate::memory::Memory;
use crate::state::RegisterFile;
use crate::table::OpcodeTable;

/// An instruction read from memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// Opcode identity.
    pub opcode: Opcode,
    /// Table text with placeholders, e.g. `LD (IX+d),n`.
    pub template: String,
    /// Text with placeholders replaced by decimal values, e.g. `LD (IX-5),10`.
    pub text: String,
    /// Encoded length in bytes.
    pub length: u8,
}

fn read_opcode(memory: &Memory, pc: u16) -> (Opcode, u16) {
    let at = |offset: u16| memory.get(pc.wrapping_add(offset));
    match at(0) {
        first @ (0xDD | 0xFD) => {
            let index_page = if first == 0xDD { Prefix::Dd } else { Prefix::Fd };
            if at(1) == 0xCB {
                let bit_page = if first == 0xDD {
                    Prefix::DdCb
                } else {
                    Prefix::FdCb
                };
                (Opcode::new(bit_page, at(3)), 2)
            } else {
                (Opcode::new(index_page, at(1)), 2)
            }
        }
        0xCB => (Opcode::new(Prefix::Cb, at(1)), 2),
        0xED => (Opcode::new(Prefix::Ed, at(1)), 2),
        code => (Opcode::new(Prefix::None, code), 1),
    }
}

/// Reads and decodes the instruction at `pc` without executing it.
///
/// Operand bytes follow the opcode byte, except on the indexed bit pages
/// where the displacement sits between the prefixes and the opcode.
///
/// # Errors
///
/// Returns [`ExecError::UnknownOpcode`] when the table has no entry.
pub fn fetch(table: &OpcodeTable, memory: &Memory, pc: u16) -> Result<Fetched, ExecError> {
    let (opcode, operand_start) = read_opcode(memory, pc);
    let descriptor = table.descriptor_for(opcode).ok_or_else(|| {
        tracing::warn!(pc, %opcode, "no table entry for opcode");
        ExecError::UnknownOpcode { opcode, pc }
    })?;

    let mut cursor = pc.wrapping_add(operand_start);
    let mut values = Vec::new();
    for placeholder in placeholders(&descriptor.mnemonic) {
        let value = match placeholder {
            Placeholder::Byte => i32::from(memory.get(cursor)),
            Placeholder::Displacement => i32::from(i8::from_le_bytes([memory.get(cursor)])),
            Placeholder::Word => i32::from(memory.get_word(cursor)),
        };
        cursor = cursor.wrapping_add(u16::from(placeholder.width()));
        values.push((placeholder, value));
    }

    Ok(Fetched {
        opcode,
        text: substitute(&descriptor.mnemonic, &values),
        template: descriptor.mnemonic,
        length: descriptor.length,
    })
}

/// Replaces each placeholder of `template` with its value, in textual order.
/// A negative displacement after `+` renders as `-n`.
#[must_use]
pub fn substitute(template: &str, values: &[(Placeholder, i32)]) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut values = values.iter();
    let mut rest = template;
    while let Some(start) = rest.find(|c: char| c.is_ascii_lowercase()) {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let end = tail
            .find(|c: char| !c.is_ascii_lowercase())
            .unwrap_or(tail.len());
        match values.next() {
            Some((_, value)) if *value < 0 && out.ends_with('+') => {
                out.pop();
                out.push_str(&value.to_string());
            }
            Some((_, value)) => out.push_str(&value.to_string()),
            None => out.push_str(&tail[..end]),
        }
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}

/// Drives one instruction at a time through fetch, decode and dispatch.
#[derive(Debug, Clone, Copy)]
pub struct CommandRunner<'t> {
    table: &'t OpcodeTable,
    legality: &'t LegalityValidator,
    dispatch: &'static DispatchTable,
}

impl<'t> CommandRunner<'t> {
    /// Creates a runner over the given tables.
    #[must_use]
    pub fn new(table: &'t OpcodeTable, legality: &'t LegalityValidator) -> Self {
        Self {
            table,
            legality,
            dispatch: DispatchTable::shared(),
        }
    }

    /// Executes the instruction at PC and returns whether it was `HALT`.
    ///
    /// PC is advanced past the instruction before the handler runs, so
    /// handlers that branch simply overwrite it.
    ///
    /// # Errors
    ///
    /// Returns the fetch, decode or execution fault. State written before the
    /// fault, including the advanced PC, is kept.
    pub fn run_next(
        &self,
        registers: &mut RegisterFile,
        memory: &mut Memory,
    ) -> Result<bool, ExecError> {
        let pc = registers.pc();
        let fetched = fetch(self.table, memory, pc)?;
        let instruction = decode_text(&fetched.text)?;
        let (provisional, wrapped) = pc.overflowing_add(u16::from(fetched.length));
        registers.set_pc(provisional);
        tracing::trace!(pc, text = %fetched.text, "execute");

        let mut engine =
            ExecutionEngine::new(registers, memory, self.legality).with_wrapped_pc(wrapped);
        self.dispatch.execute(&mut engine, &instruction)?;
        Ok(instruction.mnemonic == Mnemonic::Halt)
    }
}

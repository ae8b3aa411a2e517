//! Byte-stream disassembly into a text listing.

use std::fmt;

use crate::memory::Memory;
use crate::runner::fetch;
use crate::table::OpcodeTable;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One disassembled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address of the first byte.
    pub address: u16,
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// Instruction text, or `DB n` for bytes with no table entry.
    pub text: String,
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex: Vec<String> = self.bytes.iter().map(|b| format!("{b:02X}")).collect();
        write!(f, "{:04X}  {:<12}  {}", self.address, hex.join(" "), self.text)
    }
}

/// Disassembles `count` instructions starting at `start`.
///
/// Addresses wrap at the top of memory.
#[must_use]
pub fn disassemble(
    table: &OpcodeTable,
    memory: &Memory,
    start: u16,
    count: usize,
) -> Vec<DisassemblyRow> {
    let mut rows = Vec::with_capacity(count);
    let mut address = start;
    for _ in 0..count {
        let row = match fetch(table, memory, address) {
            Ok(fetched) => {
                let bytes = (0..u16::from(fetched.length))
                    .map(|offset| memory.get(address.wrapping_add(offset)))
                    .collect();
                DisassemblyRow {
                    address,
                    bytes,
                    text: fetched.text,
                }
            }
            Err(_) => {
                let byte = memory.get(address);
                DisassemblyRow {
                    address,
                    bytes: vec![byte],
                    text: format!("DB {byte}"),
                }
            }
        };
        address = address.wrapping_add(u16::try_from(row.bytes.len()).unwrap_or(1));
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::disassemble;
    use crate::memory::Memory;
    use crate::table::OpcodeTable;

    #[test]
    fn lists_instructions_with_their_bytes() {
        let table = OpcodeTable::shared().unwrap();
        let mut memory = Memory::new();
        memory.load(0x100, &[0x06, 0x64, 0x32, 0xF4, 0x01, 0x76]);

        let rows = disassemble(table, &memory, 0x100, 3);

        let texts: Vec<&str> = rows.iter().map(|row| row.text.as_str()).collect();
        assert_eq!(texts, ["LD B,100", "LD (500),A", "HALT"]);
        assert_eq!(rows[1].address, 0x102);
        assert_eq!(rows[1].bytes, vec![0x32, 0xF4, 0x01]);
    }

    #[test]
    fn unknown_bytes_become_data() {
        let table = OpcodeTable::shared().unwrap();
        let mut memory = Memory::new();
        memory.load(0, &[0xED, 0x00, 0x00]);

        let rows = disassemble(table, &memory, 0, 2);

        assert_eq!(rows[0].text, "DB 237");
        assert_eq!(rows[1].address, 1);
        assert_eq!(rows[1].text, "NOP");
    }

    #[test]
    fn rows_render_as_listing_lines() {
        let table = OpcodeTable::shared().unwrap();
        let mut memory = Memory::new();
        memory.load(0, &[0xDD, 0x21, 0x34, 0x12]);
        let rows = disassemble(table, &memory, 0, 1);
        assert_eq!(rows[0].to_string(), "0000  DD 21 34 12   LD IX,4660");
    }
}

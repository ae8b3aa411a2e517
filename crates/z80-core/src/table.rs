//! The opcode table resource and the mnemonic/opcode lookup service.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::encoding::{mnemonic_shape, InstructionDescriptor, Opcode, TableForm};
use crate::fault::TableError;

/// Number of data rows the opcode table must contain.
pub const OPCODE_TABLE_ROWS: usize = 256;

const HEADER_LINES: usize = 2;
const OPCODE_TABLE_SOURCE: &str = include_str!("../data/opcodes.txt");

/// One textual form of a table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    /// Table text with markers stripped, e.g. `LD (IX+d),n`.
    pub text: String,
    /// Marked `*`: behaves like another entry and is not indexed for lookup.
    pub duplicate: bool,
    /// Marked `+`: undocumented but indexed normally.
    pub undocumented: bool,
}

impl TableEntry {
    fn parse(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        if cell.is_empty() {
            return None;
        }
        let (cell, undocumented) = cell
            .strip_prefix('+')
            .map_or((cell, false), |rest| (rest, true));
        let (cell, duplicate) = cell
            .strip_suffix('*')
            .map_or((cell, false), |rest| (rest, true));
        Some(Self {
            text: cell.trim().to_string(),
            duplicate,
            undocumented,
        })
    }
}

type Row = [Option<TableEntry>; 5];

/// Immutable opcode table with one mnemonic index per table form.
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    rows: Vec<Row>,
    indices: [HashMap<String, u8>; 5],
}

impl OpcodeTable {
    /// Parses the embedded table resource.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if the resource is malformed.
    pub fn load() -> Result<Self, TableError> {
        Self::parse(OPCODE_TABLE_SOURCE)
    }

    /// Process-wide table, parsed on first use.
    ///
    /// # Errors
    ///
    /// Returns the load error, every time, if the resource is malformed.
    pub fn shared() -> Result<&'static Self, TableError> {
        static TABLE: OnceLock<Result<OpcodeTable, TableError>> = OnceLock::new();
        TABLE.get_or_init(Self::load).as_ref().map_err(Clone::clone)
    }

    /// Parses table text: two header lines, then exactly 256 rows of
    /// `| hex | dec | base | DD | CB | ED | DDCB |`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::RowCount`] when the row count is wrong and
    /// [`TableError::MalformedRow`] for unparseable, out-of-order or
    /// conflicting rows.
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let mut rows = Vec::with_capacity(OPCODE_TABLE_ROWS);
        let mut indices: [HashMap<String, u8>; 5] = Default::default();

        for (line_index, line) in text.lines().enumerate().skip(HEADER_LINES) {
            if line.trim().is_empty() {
                continue;
            }
            let row_number = line_index + 1;
            let malformed = |reason: &str| TableError::MalformedRow {
                row: row_number,
                reason: reason.to_string(),
            };

            let cells: Vec<&str> = line.split('|').map(str::trim).collect();
            if cells.len() != 9 || !cells[0].is_empty() || !cells[8].is_empty() {
                return Err(malformed("expected 7 cells"));
            }
            let hex = u8::from_str_radix(cells[1], 16).map_err(|_| malformed("bad hex code"))?;
            let dec: u8 = cells[2].parse().map_err(|_| malformed("bad decimal code"))?;
            if hex != dec {
                return Err(malformed("hex and decimal codes differ"));
            }
            if usize::from(hex) != rows.len() {
                return Err(malformed("row out of order"));
            }

            let row: Row = [
                TableEntry::parse(cells[3]),
                TableEntry::parse(cells[4]),
                TableEntry::parse(cells[5]),
                TableEntry::parse(cells[6]),
                TableEntry::parse(cells[7]),
            ];
            for (index, entry) in indices.iter_mut().zip(&row) {
                let Some(entry) = entry.as_ref().filter(|entry| !entry.duplicate) else {
                    continue;
                };
                if index.insert(mnemonic_shape(&entry.text), hex).is_some() {
                    return Err(malformed("mnemonic already indexed"));
                }
            }
            rows.push(row);
        }

        if rows.len() != OPCODE_TABLE_ROWS {
            return Err(TableError::RowCount { found: rows.len() });
        }

        tracing::debug!(
            rows = rows.len(),
            indexed = indices.iter().map(HashMap::len).sum::<usize>(),
            "opcode table loaded"
        );
        Ok(Self { rows, indices })
    }

    /// Number of rows (always 256 for a loaded table).
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Entry for one form of one row.
    #[must_use]
    pub fn entry(&self, form: TableForm, code: u8) -> Option<&TableEntry> {
        self.rows
            .get(usize::from(code))
            .and_then(|row| row[form.index()].as_ref())
    }

    /// Every populated entry with the IX-page opcode it belongs to.
    pub fn entries(&self) -> impl Iterator<Item = (Opcode, &TableEntry)> {
        self.rows.iter().zip(0_u8..=u8::MAX).flat_map(|(row, code)| {
            TableForm::ALL.into_iter().filter_map(move |form| {
                row[form.index()]
                    .as_ref()
                    .map(|entry| (Opcode::new(form.prefix(), code), entry))
            })
        })
    }

    /// Resolves normalised text (`#` for byte literals, `@` for word literals)
    /// to a descriptor.
    ///
    /// Forms are probed in [`TableForm::ALL`] order; on a total miss every `#`
    /// is widened to `@` and the probe repeats once. IY text resolves through
    /// the IX forms and yields `FD` opcodes.
    #[must_use]
    pub fn resolve_by_mnemonic(&self, normalized: &str) -> Option<InstructionDescriptor> {
        let text = normalized.trim();
        let iy = text.contains("IY");
        if iy && text.contains("IX") {
            return None;
        }
        let (key, forms): (String, &[TableForm]) = if iy {
            (text.replace("IY", "IX"), &[TableForm::Dd, TableForm::DdCb])
        } else {
            (text.to_string(), &TableForm::ALL)
        };

        let (form, code) = self.probe(&key, forms).or_else(|| {
            let widened = key.replace('#', "@");
            if widened == key {
                None
            } else {
                self.probe(&widened, forms)
            }
        })?;

        let prefix = if iy {
            form.prefix().to_iy()
        } else {
            form.prefix()
        };
        self.descriptor_for(Opcode::new(prefix, code))
    }

    fn probe(&self, key: &str, forms: &[TableForm]) -> Option<(TableForm, u8)> {
        forms.iter().find_map(|form| {
            self.indices[form.index()]
                .get(key)
                .map(|code| (*form, *code))
        })
    }

    /// Table text for a packed opcode such as `0x3E`, `0xED44` or `0xDDCB06`.
    #[must_use]
    pub fn command_for_hex(&self, packed: u32) -> Option<String> {
        Opcode::from_packed(packed).and_then(|opcode| self.command_for(opcode))
    }

    /// Table text for an opcode, with IX rewritten to IY on the `FD` pages.
    #[must_use]
    pub fn command_for(&self, opcode: Opcode) -> Option<String> {
        let entry = self.entry(opcode.prefix.form(), opcode.code)?;
        if opcode.prefix.is_iy() {
            Some(entry.text.replace("IX", "IY"))
        } else {
            Some(entry.text.clone())
        }
    }

    /// Descriptor for a known opcode.
    #[must_use]
    pub fn descriptor_for(&self, opcode: Opcode) -> Option<InstructionDescriptor> {
        self.command_for(opcode)
            .map(|text| InstructionDescriptor::new(text, opcode))
    }
}

//! Addressing-mode operands.

use std::fmt;

use crate::fault::ExecError;
use crate::memory::Memory;
use crate::state::{Reg16, Reg8, RegisterFile};

/// A source or destination resolved from instruction text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    /// 8-bit register.
    Register8(Reg8),
    /// 16-bit register; in 8-bit context its low byte is used.
    Register16(Reg16),
    /// Literal byte. Read-only.
    Immediate8(u8),
    /// `(nn)`
    MemoryDirect(u16),
    /// `(rr)` or `(IX+d)` / `(IY+d)`.
    MemoryIndexed {
        /// Base register.
        base: Reg16,
        /// Signed displacement.
        offset: i8,
    },
}

impl Operand {
    /// `(HL)`
    pub const HL_INDIRECT: Self = Self::MemoryIndexed {
        base: Reg16::Hl,
        offset: 0,
    };

    /// Parses upper-case operand text: a register, `(rr)`, `(IX+d)`, `(nn)`
    /// or a byte literal.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        if let Some(reg) = Reg8::from_name(text) {
            return Some(Self::Register8(reg));
        }
        if let Some(reg) = Reg16::from_name(text) {
            return Some(Self::Register16(reg));
        }
        if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
            return Self::parse_indirect(inner);
        }
        let value = parse_number(text)?;
        let byte = match value {
            0..=0xFF => u8::try_from(value).ok()?,
            -0x80..=-1 => i8::try_from(value).ok()?.to_le_bytes()[0],
            _ => return None,
        };
        Some(Self::Immediate8(byte))
    }

    fn parse_indirect(inner: &str) -> Option<Self> {
        if let Some(base) = Reg16::from_name(inner) {
            return Some(Self::MemoryIndexed { base, offset: 0 });
        }
        let Some(split) = inner.find(['+', '-']).filter(|split| *split > 0) else {
            return Self::direct(inner);
        };
        let base = Reg16::from_name(&inner[..split])
            .filter(|base| matches!(base, Reg16::Ix | Reg16::Iy))?;
        let offset = i8::try_from(parse_number(&inner[split..])?).ok()?;
        Some(Self::MemoryIndexed { base, offset })
    }

    fn direct(inner: &str) -> Option<Self> {
        let address = u16::try_from(parse_number(inner)?).ok()?;
        Some(Self::MemoryDirect(address))
    }

    /// Effective address for the memory forms.
    #[must_use]
    pub fn address(self, registers: &RegisterFile) -> Option<u16> {
        match self {
            Self::MemoryDirect(address) => Some(address),
            Self::MemoryIndexed { base, offset } => {
                Some(registers.get16(base).wrapping_add_signed(i16::from(offset)))
            }
            Self::Register8(_) | Self::Register16(_) | Self::Immediate8(_) => None,
        }
    }

    /// Reads the operand as a byte.
    #[must_use]
    pub fn read(self, registers: &RegisterFile, memory: &Memory) -> u8 {
        match self {
            Self::Register8(reg) => registers.get8(reg),
            Self::Register16(reg) => registers.get16(reg).to_le_bytes()[0],
            Self::Immediate8(value) => value,
            Self::MemoryDirect(_) | Self::MemoryIndexed { .. } => {
                self.address(registers).map_or(0, |address| memory.get(address))
            }
        }
    }

    /// Writes a byte through the operand.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::WriteToImmediate`] for literal operands.
    pub fn write(
        self,
        registers: &mut RegisterFile,
        memory: &mut Memory,
        value: u8,
    ) -> Result<(), ExecError> {
        match self {
            Self::Register8(reg) => registers.set8(reg, value),
            Self::Register16(reg) => {
                let [_, high] = registers.get16(reg).to_le_bytes();
                registers.set16(reg, u16::from_le_bytes([value, high]));
            }
            Self::Immediate8(_) => return Err(ExecError::WriteToImmediate),
            Self::MemoryDirect(_) | Self::MemoryIndexed { .. } => {
                if let Some(address) = self.address(registers) {
                    memory.set(address, value);
                }
            }
        }
        Ok(())
    }

    /// Reads the operand as a little-endian word.
    #[must_use]
    pub fn read_word(self, registers: &RegisterFile, memory: &Memory) -> u16 {
        match self {
            Self::Register8(reg) => u16::from(registers.get8(reg)),
            Self::Register16(reg) => registers.get16(reg),
            Self::Immediate8(value) => u16::from(value),
            Self::MemoryDirect(_) | Self::MemoryIndexed { .. } => self
                .address(registers)
                .map_or(0, |address| memory.get_word(address)),
        }
    }

    /// Writes a little-endian word through the operand.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::WriteToImmediate`] for literal operands.
    pub fn write_word(
        self,
        registers: &mut RegisterFile,
        memory: &mut Memory,
        value: u16,
    ) -> Result<(), ExecError> {
        match self {
            Self::Register8(reg) => registers.set8(reg, value.to_le_bytes()[0]),
            Self::Register16(reg) => registers.set16(reg, value),
            Self::Immediate8(_) => return Err(ExecError::WriteToImmediate),
            Self::MemoryDirect(_) | Self::MemoryIndexed { .. } => {
                if let Some(address) = self.address(registers) {
                    memory.set_word(address, value);
                }
            }
        }
        Ok(())
    }

    /// Lower-case shape used as a legality whitelist key, e.g. `a`, `n`,
    /// `(hl)`, `(ix+d)`.
    #[must_use]
    pub fn shape_name(self) -> String {
        match self {
            Self::Register8(reg) => reg.name().to_ascii_lowercase(),
            Self::Register16(reg) => reg.name().to_ascii_lowercase(),
            Self::Immediate8(_) => "n".to_string(),
            Self::MemoryDirect(_) => "(nn)".to_string(),
            Self::MemoryIndexed { base, .. } => match base {
                Reg16::Ix | Reg16::Iy => format!("({}+d)", base.name().to_ascii_lowercase()),
                _ => format!("({})", base.name().to_ascii_lowercase()),
            },
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register8(reg) => f.write_str(reg.name()),
            Self::Register16(reg) => f.write_str(reg.name()),
            Self::Immediate8(value) => write!(f, "{value}"),
            Self::MemoryDirect(address) => write!(f, "({address})"),
            Self::MemoryIndexed { base, offset } => match base {
                Reg16::Ix | Reg16::Iy => write!(f, "({}{offset:+})", base.name()),
                _ => write!(f, "({})", base.name()),
            },
        }
    }
}

/// Parses a signed decimal literal, or hex with an `H` suffix (`38H`).
#[must_use]
pub fn parse_number(text: &str) -> Option<i32> {
    let text = text.trim();
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = if let Some(hex) = digits.strip_suffix(['H', 'h']) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        i32::from_str_radix(hex, 16).ok()?
    } else {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<i32>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{parse_number, Operand};
    use crate::fault::ExecError;
    use crate::memory::Memory;
    use crate::state::{Reg16, Reg8, RegisterFile};

    #[rstest]
    #[case("A", Operand::Register8(Reg8::A))]
    #[case("IXH", Operand::Register8(Reg8::Ixh))]
    #[case("HL", Operand::Register16(Reg16::Hl))]
    #[case("(HL)", Operand::HL_INDIRECT)]
    #[case("(IX+5)", Operand::MemoryIndexed { base: Reg16::Ix, offset: 5 })]
    #[case("(IY-128)", Operand::MemoryIndexed { base: Reg16::Iy, offset: -128 })]
    #[case("(500)", Operand::MemoryDirect(500))]
    #[case("(0FFFFH)", Operand::MemoryDirect(0xFFFF))]
    #[case("255", Operand::Immediate8(255))]
    #[case("-1", Operand::Immediate8(0xFF))]
    fn parses_operand_text(#[case] text: &str, #[case] expected: Operand) {
        assert_eq!(Operand::parse(text), Some(expected));
    }

    #[rstest]
    #[case("256")]
    #[case("(IX+128)")]
    #[case("(70000)")]
    #[case("FOO")]
    #[case("(BC+1)")]
    fn rejects_bad_operand_text(#[case] text: &str) {
        assert_eq!(Operand::parse(text), None);
    }

    #[test]
    fn indexed_access_applies_signed_offset() {
        let mut regs = RegisterFile::new();
        let mut memory = Memory::new();
        regs.set16(Reg16::Ix, 0x1000);
        let operand = Operand::MemoryIndexed {
            base: Reg16::Ix,
            offset: -2,
        };

        operand.write(&mut regs, &mut memory, 0x42).unwrap();

        assert_eq!(memory.get(0x0FFE), 0x42);
        assert_eq!(operand.read(&regs, &memory), 0x42);
    }

    #[test]
    fn register16_in_byte_context_uses_low_byte() {
        let mut regs = RegisterFile::new();
        let mut memory = Memory::new();
        regs.set16(Reg16::Bc, 0xABCD);
        let operand = Operand::Register16(Reg16::Bc);

        assert_eq!(operand.read(&regs, &memory), 0xCD);
        operand.write(&mut regs, &mut memory, 0x11).unwrap();
        assert_eq!(regs.get16(Reg16::Bc), 0xAB11);
    }

    #[test]
    fn immediate_is_read_only() {
        let mut regs = RegisterFile::new();
        let mut memory = Memory::new();
        assert_eq!(
            Operand::Immediate8(3).write(&mut regs, &mut memory, 1),
            Err(ExecError::WriteToImmediate)
        );
        assert_eq!(
            Operand::Immediate8(3).write_word(&mut regs, &mut memory, 1),
            Err(ExecError::WriteToImmediate)
        );
    }

    #[test]
    fn word_access_through_memory_is_little_endian() {
        let mut regs = RegisterFile::new();
        let mut memory = Memory::new();
        Operand::MemoryDirect(0x2000)
            .write_word(&mut regs, &mut memory, 0x1234)
            .unwrap();
        assert_eq!(memory.get(0x2000), 0x34);
        assert_eq!(
            Operand::MemoryDirect(0x2000).read_word(&regs, &memory),
            0x1234
        );
    }

    #[rstest]
    #[case(Operand::Register8(Reg8::A), "a")]
    #[case(Operand::Immediate8(1), "n")]
    #[case(Operand::MemoryDirect(1), "(nn)")]
    #[case(Operand::HL_INDIRECT, "(hl)")]
    #[case(Operand::MemoryIndexed { base: Reg16::Iy, offset: 3 }, "(iy+d)")]
    #[case(Operand::Register16(Reg16::Sp), "sp")]
    fn shape_names_match_whitelist_keys(#[case] operand: Operand, #[case] shape: &str) {
        assert_eq!(operand.shape_name(), shape);
    }

    #[test]
    fn display_renders_signed_offsets() {
        let operand = Operand::MemoryIndexed {
            base: Reg16::Ix,
            offset: -5,
        };
        assert_eq!(operand.to_string(), "(IX-5)");
        assert_eq!(Operand::HL_INDIRECT.to_string(), "(HL)");
    }

    #[test]
    fn numbers_accept_decimal_and_hex_suffix() {
        assert_eq!(parse_number("100"), Some(100));
        assert_eq!(parse_number("-5"), Some(-5));
        assert_eq!(parse_number("38H"), Some(0x38));
        assert_eq!(parse_number("H"), None);
        assert_eq!(parse_number(""), None);
    }
}

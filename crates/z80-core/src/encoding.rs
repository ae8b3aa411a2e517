//! Opcode identity, prefixes and instruction descriptors.

use std::fmt;

/// Prefix bytes that select an extended opcode page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Prefix {
    /// Unprefixed base page.
    #[default]
    None,
    /// `CB` bit/rotate page.
    Cb,
    /// `DD` IX page.
    Dd,
    /// `ED` extended page.
    Ed,
    /// `FD` IY page (mirrors `DD`).
    Fd,
    /// `DD CB` indexed bit page.
    DdCb,
    /// `FD CB` indexed bit page (mirrors `DD CB`).
    FdCb,
}

impl Prefix {
    /// Prefix bytes in emission order.
    #[must_use]
    pub const fn bytes(self) -> &'static [u8] {
        match self {
            Self::None => &[],
            Self::Cb => &[0xCB],
            Self::Dd => &[0xDD],
            Self::Ed => &[0xED],
            Self::Fd => &[0xFD],
            Self::DdCb => &[0xDD, 0xCB],
            Self::FdCb => &[0xFD, 0xCB],
        }
    }

    /// Number of prefix bytes.
    #[must_use]
    pub const fn len(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Cb | Self::Dd | Self::Ed | Self::Fd => 1,
            Self::DdCb | Self::FdCb => 2,
        }
    }

    /// Returns true for the unprefixed page.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::None)
    }

    /// Table form holding this prefix's mnemonics.
    #[must_use]
    pub const fn form(self) -> TableForm {
        match self {
            Self::None => TableForm::Base,
            Self::Cb => TableForm::Cb,
            Self::Dd | Self::Fd => TableForm::Dd,
            Self::Ed => TableForm::Ed,
            Self::DdCb | Self::FdCb => TableForm::DdCb,
        }
    }

    /// Returns true for the IY pages.
    #[must_use]
    pub const fn is_iy(self) -> bool {
        matches!(self, Self::Fd | Self::FdCb)
    }

    /// Maps an IX page to its IY twin. Other pages are returned unchanged.
    #[must_use]
    pub const fn to_iy(self) -> Self {
        match self {
            Self::Dd => Self::Fd,
            Self::DdCb => Self::FdCb,
            other => other,
        }
    }
}

/// The five textual columns of the opcode table, in lookup priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableForm {
    /// Unprefixed instructions.
    Base,
    /// IX instructions (`DD`).
    Dd,
    /// Bit, rotate and shift instructions (`CB`).
    Cb,
    /// Extended instructions (`ED`).
    Ed,
    /// Indexed bit instructions (`DD CB`).
    DdCb,
}

impl TableForm {
    /// All forms in mnemonic-lookup priority order.
    pub const ALL: [Self; 5] = [Self::Base, Self::Dd, Self::Cb, Self::Ed, Self::DdCb];

    /// Column index within a table row.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Base => 0,
            Self::Dd => 1,
            Self::Cb => 2,
            Self::Ed => 3,
            Self::DdCb => 4,
        }
    }

    /// IX-page prefix for this form.
    #[must_use]
    pub const fn prefix(self) -> Prefix {
        match self {
            Self::Base => Prefix::None,
            Self::Dd => Prefix::Dd,
            Self::Cb => Prefix::Cb,
            Self::Ed => Prefix::Ed,
            Self::DdCb => Prefix::DdCb,
        }
    }
}

/// Fully qualified opcode: prefix page plus final opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Opcode {
    /// Prefix page.
    pub prefix: Prefix,
    /// Final opcode byte.
    pub code: u8,
}

impl Opcode {
    /// Creates an opcode.
    #[must_use]
    pub const fn new(prefix: Prefix, code: u8) -> Self {
        Self { prefix, code }
    }

    /// Prefix bytes followed by the opcode byte packed big-endian, e.g. `0xDDCB06`.
    #[must_use]
    pub fn packed(self) -> u32 {
        let prefix = self
            .prefix
            .bytes()
            .iter()
            .fold(0_u32, |acc, byte| (acc << 8) | u32::from(*byte));
        (prefix << 8) | u32::from(self.code)
    }

    /// Inverse of [`Opcode::packed`]. Returns `None` for unknown prefix combinations.
    #[must_use]
    pub const fn from_packed(packed: u32) -> Option<Self> {
        let code = (packed & 0xFF) as u8;
        let prefix = match packed >> 8 {
            0 => Prefix::None,
            0xCB => Prefix::Cb,
            0xDD => Prefix::Dd,
            0xED => Prefix::Ed,
            0xFD => Prefix::Fd,
            0xDDCB => Prefix::DdCb,
            0xFDCB => Prefix::FdCb,
            _ => return None,
        };
        Some(Self { prefix, code })
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.prefix.bytes() {
            write!(f, "{byte:02X}")?;
        }
        write!(f, "{:02X}", self.code)
    }
}

/// Everything needed to encode or decode one instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstructionDescriptor {
    /// Table text with `n`, `nn` and `d` placeholders, e.g. `LD (IX+d),n`.
    pub mnemonic: String,
    /// Opcode identity.
    pub opcode: Opcode,
    /// Width in bytes of each placeholder, in textual order.
    pub operand_widths: Vec<u8>,
    /// Total encoded length in bytes.
    pub length: u8,
}

impl InstructionDescriptor {
    /// Builds a descriptor from table text and opcode.
    #[must_use]
    pub fn new(mnemonic: impl Into<String>, opcode: Opcode) -> Self {
        let mnemonic = mnemonic.into();
        let operand_widths = operand_widths(&mnemonic);
        let length = opcode.prefix.len() + 1 + operand_widths.iter().sum::<u8>();
        Self {
            mnemonic,
            opcode,
            operand_widths,
            length,
        }
    }
}

/// A placeholder found in table text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `n`: unsigned byte.
    Byte,
    /// `nn`: little-endian word.
    Word,
    /// `d`: signed displacement byte.
    Displacement,
}

impl Placeholder {
    /// Encoded width in bytes.
    #[must_use]
    pub const fn width(self) -> u8 {
        match self {
            Self::Byte | Self::Displacement => 1,
            Self::Word => 2,
        }
    }

    /// Placeholder text as it appears in the table.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Byte => "n",
            Self::Word => "nn",
            Self::Displacement => "d",
        }
    }
}

/// Placeholders of `template` in textual order.
///
/// Table text is upper case apart from the placeholders, so every lower-case
/// run is one marker.
#[must_use]
pub fn placeholders(template: &str) -> Vec<Placeholder> {
    let mut found = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find(|c: char| c.is_ascii_lowercase()) {
        let tail = &rest[start..];
        let end = tail
            .find(|c: char| !c.is_ascii_lowercase())
            .unwrap_or(tail.len());
        match &tail[..end] {
            "nn" => found.push(Placeholder::Word),
            "n" => found.push(Placeholder::Byte),
            "d" => found.push(Placeholder::Displacement),
            _ => {}
        }
        rest = &tail[end..];
    }
    found
}

/// Operand widths of `template` in textual order.
#[must_use]
pub fn operand_widths(template: &str) -> Vec<u8> {
    placeholders(template)
        .into_iter()
        .map(Placeholder::width)
        .collect()
}

/// Lookup key for table text: `nn` becomes `@`, `n` and `d` become `#`.
#[must_use]
pub fn mnemonic_shape(template: &str) -> String {
    template.replace("nn", "@").replace(['n', 'd'], "#")
}

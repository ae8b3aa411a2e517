//! Branch conditions over the flag register.

use crate::state::Flags;

/// One of the eight Z80 branch conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// `NZ`
    NonZero,
    /// `Z`
    Zero,
    /// `NC`
    NoCarry,
    /// `C`
    Carry,
    /// `PO`
    ParityOdd,
    /// `PE`
    ParityEven,
    /// `P`
    Plus,
    /// `M`
    Minus,
}

impl Condition {
    /// All conditions in encoding order.
    pub const ALL: [Self; 8] = [
        Self::NonZero,
        Self::Zero,
        Self::NoCarry,
        Self::Carry,
        Self::ParityOdd,
        Self::ParityEven,
        Self::Plus,
        Self::Minus,
    ];

    /// Assembly name of the condition.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NonZero => "NZ",
            Self::Zero => "Z",
            Self::NoCarry => "NC",
            Self::Carry => "C",
            Self::ParityOdd => "PO",
            Self::ParityEven => "PE",
            Self::Plus => "P",
            Self::Minus => "M",
        }
    }

    /// Parses an upper-case condition name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cond| cond.name() == name)
    }

    /// Evaluates the condition against `flags`.
    #[must_use]
    pub const fn is_true(self, flags: Flags) -> bool {
        match self {
            Self::NonZero => !flags.contains(Flags::Z),
            Self::Zero => flags.contains(Flags::Z),
            Self::NoCarry => !flags.contains(Flags::C),
            Self::Carry => flags.contains(Flags::C),
            Self::ParityOdd => !flags.contains(Flags::PV),
            Self::ParityEven => flags.contains(Flags::PV),
            Self::Plus => !flags.contains(Flags::S),
            Self::Minus => flags.contains(Flags::S),
        }
    }
}

//! Architectural CPU state model primitives.

/// Status flag bit set over the `F` register.
pub mod flags;
/// Register file types and storage model.
pub mod registers;

pub use flags::Flags;
pub use registers::{Reg16, Reg8, RegisterFile, REGISTER8_COUNT, SHADOW_REGISTER_COUNT};

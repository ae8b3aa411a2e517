//! Bit-packed status flags stored in the `F` register.

use bitflags::bitflags;

bitflags! {
    /// Z80 status flags, one bit each, packed 1:1 into `F`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u8 {
        /// Carry.
        const C = 1 << 0;
        /// Add/subtract.
        const N = 1 << 1;
        /// Parity/overflow.
        const PV = 1 << 2;
        /// Undefined bit 3.
        const F3 = 1 << 3;
        /// Half carry.
        const H = 1 << 4;
        /// Undefined bit 5.
        const F5 = 1 << 5;
        /// Zero.
        const Z = 1 << 6;
        /// Sign.
        const S = 1 << 7;
    }
}

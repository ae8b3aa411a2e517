use super::flags::Flags;

/// Number of 8-bit storage slots in the active register bank.
pub const REGISTER8_COUNT: usize = 14;
/// Number of registers mirrored by the shadow bank (`A F B C D E H L`).
pub const SHADOW_REGISTER_COUNT: usize = 8;

/// 8-bit architecturally visible register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Reg8 {
    A = 0,
    F = 1,
    B = 2,
    C = 3,
    D = 4,
    E = 5,
    H = 6,
    L = 7,
    Ixh = 8,
    Ixl = 9,
    Iyh = 10,
    Iyl = 11,
    I = 12,
    R = 13,
}

impl Reg8 {
    /// Ordered list of all 8-bit registers.
    pub const ALL: [Self; REGISTER8_COUNT] = [
        Self::A,
        Self::F,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::H,
        Self::L,
        Self::Ixh,
        Self::Ixl,
        Self::Iyh,
        Self::Iyl,
        Self::I,
        Self::R,
    ];

    /// Returns the storage index for this register.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns `true` for registers that have a shadow copy.
    #[must_use]
    pub const fn is_banked(self) -> bool {
        self.index() < SHADOW_REGISTER_COUNT
    }

    /// Assembly name of the register.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::F => "F",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::H => "H",
            Self::L => "L",
            Self::Ixh => "IXH",
            Self::Ixl => "IXL",
            Self::Iyh => "IYH",
            Self::Iyl => "IYL",
            Self::I => "I",
            Self::R => "R",
        }
    }

    /// Parses an upper-case register name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|reg| reg.name() == name)
    }
}

/// 16-bit register identifier, either a composite pair or a native 16-bit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Reg16 {
    Af,
    Bc,
    De,
    Hl,
    Ix,
    Iy,
    Sp,
    Pc,
}

impl Reg16 {
    /// Ordered list of all 16-bit registers.
    pub const ALL: [Self; 8] = [
        Self::Af,
        Self::Bc,
        Self::De,
        Self::Hl,
        Self::Ix,
        Self::Iy,
        Self::Sp,
        Self::Pc,
    ];

    /// Returns the `(high, low)` halves of a composite register.
    ///
    /// `SP` and `PC` are stored natively and have no addressable halves.
    #[must_use]
    pub const fn halves(self) -> Option<(Reg8, Reg8)> {
        match self {
            Self::Af => Some((Reg8::A, Reg8::F)),
            Self::Bc => Some((Reg8::B, Reg8::C)),
            Self::De => Some((Reg8::D, Reg8::E)),
            Self::Hl => Some((Reg8::H, Reg8::L)),
            Self::Ix => Some((Reg8::Ixh, Reg8::Ixl)),
            Self::Iy => Some((Reg8::Iyh, Reg8::Iyl)),
            Self::Sp | Self::Pc => None,
        }
    }

    /// Assembly name of the register.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Af => "AF",
            Self::Bc => "BC",
            Self::De => "DE",
            Self::Hl => "HL",
            Self::Ix => "IX",
            Self::Iy => "IY",
            Self::Sp => "SP",
            Self::Pc => "PC",
        }
    }

    /// Parses an upper-case register pair name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|reg| reg.name() == name)
    }
}

/// Full register file: active bank, shadow bank, index, special and control registers.
///
/// Composite registers are stored as their halves, so a 16-bit value is
/// always `(high << 8) | low`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    regs: [u8; REGISTER8_COUNT],
    shadow: [u8; SHADOW_REGISTER_COUNT],
    pc: u16,
    sp: u16,
}

impl RegisterFile {
    /// Creates a zeroed register file.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            regs: [0; REGISTER8_COUNT],
            shadow: [0; SHADOW_REGISTER_COUNT],
            pc: 0,
            sp: 0,
        }
    }

    /// Reads an 8-bit register.
    #[must_use]
    pub const fn get8(&self, reg: Reg8) -> u8 {
        self.regs[reg.index()]
    }

    /// Writes an 8-bit register without disturbing its pair partner.
    pub const fn set8(&mut self, reg: Reg8, value: u8) {
        self.regs[reg.index()] = value;
    }

    /// Reads a 16-bit register.
    #[must_use]
    pub const fn get16(&self, reg: Reg16) -> u16 {
        match reg {
            Reg16::Sp => self.sp,
            Reg16::Pc => self.pc,
            Reg16::Af | Reg16::Bc | Reg16::De | Reg16::Hl | Reg16::Ix | Reg16::Iy => {
                let (hi, lo) = match reg.halves() {
                    Some(pair) => pair,
                    None => return 0,
                };
                u16::from_be_bytes([self.get8(hi), self.get8(lo)])
            }
        }
    }

    /// Writes a 16-bit register; composite pairs update both halves together.
    pub const fn set16(&mut self, reg: Reg16, value: u16) {
        match reg {
            Reg16::Sp => self.sp = value,
            Reg16::Pc => self.pc = value,
            Reg16::Af | Reg16::Bc | Reg16::De | Reg16::Hl | Reg16::Ix | Reg16::Iy => {
                if let Some((hi, lo)) = reg.halves() {
                    let [high, low] = value.to_be_bytes();
                    self.set8(hi, high);
                    self.set8(lo, low);
                }
            }
        }
    }

    /// Reads the `PC` register.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.pc
    }

    /// Writes the `PC` register.
    pub const fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }

    /// Reads the `SP` register.
    #[must_use]
    pub const fn sp(&self) -> u16 {
        self.sp
    }

    /// Writes the `SP` register.
    pub const fn set_sp(&mut self, value: u16) {
        self.sp = value;
    }

    /// Reads the shadow copy of a banked register.
    #[must_use]
    pub const fn shadow(&self, reg: Reg8) -> Option<u8> {
        if reg.is_banked() {
            Some(self.shadow[reg.index()])
        } else {
            None
        }
    }

    /// Writes the shadow copy of a banked register.
    ///
    /// Writes to registers without a shadow copy are ignored.
    pub const fn set_shadow(&mut self, reg: Reg8, value: u8) {
        if reg.is_banked() {
            self.shadow[reg.index()] = value;
        }
    }

    /// Swaps `AF` with `AF'`.
    pub const fn exchange_af(&mut self) {
        self.swap_with_shadow(Reg8::A);
        self.swap_with_shadow(Reg8::F);
    }

    /// Swaps `BC`, `DE` and `HL` with their shadow copies.
    pub const fn exchange_banks(&mut self) {
        let mut index = Reg8::B.index();
        while index < SHADOW_REGISTER_COUNT {
            let current = self.regs[index];
            self.regs[index] = self.shadow[index];
            self.shadow[index] = current;
            index += 1;
        }
    }

    const fn swap_with_shadow(&mut self, reg: Reg8) {
        let index = reg.index();
        let current = self.regs[index];
        self.regs[index] = self.shadow[index];
        self.shadow[index] = current;
    }

    /// Returns the `F` register as a flag set.
    #[must_use]
    pub const fn flags(&self) -> Flags {
        Flags::from_bits_retain(self.get8(Reg8::F))
    }

    /// Replaces all eight flags at once.
    pub const fn set_flags(&mut self, flags: Flags) {
        self.set8(Reg8::F, flags.bits());
    }

    /// Returns `true` when every bit of `flag` is set.
    #[must_use]
    pub const fn flag(&self, flag: Flags) -> bool {
        self.flags().contains(flag)
    }

    /// Sets or clears `flag`, leaving every other bit of `F` untouched.
    pub fn set_flag(&mut self, flag: Flags, enabled: bool) {
        let mut flags = self.flags();
        flags.set(flag, enabled);
        self.set_flags(flags);
    }
}

#[cfg(test)]
mod tests {
    use super::{Reg16, Reg8, RegisterFile, REGISTER8_COUNT};
    use crate::Flags;

    #[test]
    fn register_indices_are_dense_and_unique() {
        for (expected, reg) in Reg8::ALL.iter().copied().enumerate() {
            assert_eq!(reg.index(), expected);
        }
        assert_eq!(Reg8::ALL.len(), REGISTER8_COUNT);
    }

    #[test]
    fn names_round_trip() {
        for reg in Reg8::ALL {
            assert_eq!(Reg8::from_name(reg.name()), Some(reg));
        }
        for reg in Reg16::ALL {
            assert_eq!(Reg16::from_name(reg.name()), Some(reg));
        }
        assert_eq!(Reg8::from_name("Q"), None);
    }

    #[test]
    fn composite_write_sets_both_halves() {
        let mut regs = RegisterFile::new();
        regs.set16(Reg16::Bc, 0xABCD);

        assert_eq!(regs.get8(Reg8::B), 0xAB);
        assert_eq!(regs.get8(Reg8::C), 0xCD);
        assert_eq!(regs.get16(Reg16::Bc), 0xABCD);
    }

    #[test]
    fn half_write_leaves_partner_alone() {
        let mut regs = RegisterFile::new();
        regs.set16(Reg16::Ix, 0x1234);
        regs.set8(Reg8::Ixl, 0xFF);

        assert_eq!(regs.get8(Reg8::Ixh), 0x12);
        assert_eq!(regs.get16(Reg16::Ix), 0x12FF);
    }

    #[test]
    fn native_sixteen_bit_registers() {
        let mut regs = RegisterFile::new();
        regs.set16(Reg16::Sp, 0xFFF0);
        regs.set16(Reg16::Pc, 0x0100);

        assert_eq!(regs.sp(), 0xFFF0);
        assert_eq!(regs.pc(), 0x0100);
        assert_eq!(Reg16::Sp.halves(), None);
    }

    #[test]
    fn exchange_af_swaps_only_accumulator_and_flags() {
        let mut regs = RegisterFile::new();
        regs.set16(Reg16::Af, 0x1122);
        regs.set16(Reg16::Bc, 0x3344);
        regs.set_shadow(Reg8::A, 0x55);
        regs.set_shadow(Reg8::F, 0x66);

        regs.exchange_af();

        assert_eq!(regs.get16(Reg16::Af), 0x5566);
        assert_eq!(regs.shadow(Reg8::A), Some(0x11));
        assert_eq!(regs.shadow(Reg8::F), Some(0x22));
        assert_eq!(regs.get16(Reg16::Bc), 0x3344);
    }

    #[test]
    fn exchange_banks_swaps_bc_de_hl() {
        let mut regs = RegisterFile::new();
        regs.set16(Reg16::Af, 0x0102);
        regs.set16(Reg16::Bc, 0x1111);
        regs.set16(Reg16::De, 0x2222);
        regs.set16(Reg16::Hl, 0x3333);

        regs.exchange_banks();
        assert_eq!(regs.get16(Reg16::Bc), 0);
        assert_eq!(regs.get16(Reg16::Af), 0x0102);

        regs.exchange_banks();
        assert_eq!(regs.get16(Reg16::Bc), 0x1111);
        assert_eq!(regs.get16(Reg16::De), 0x2222);
        assert_eq!(regs.get16(Reg16::Hl), 0x3333);
    }

    #[test]
    fn shadow_writes_to_unbanked_registers_are_ignored() {
        let mut regs = RegisterFile::new();
        regs.set_shadow(Reg8::Ixh, 0x42);
        assert_eq!(regs.shadow(Reg8::Ixh), None);
    }

    #[test]
    fn single_flag_write_preserves_other_bits() {
        let mut regs = RegisterFile::new();
        regs.set8(Reg8::F, 0b1010_1010);

        regs.set_flag(Flags::C, true);
        assert_eq!(regs.get8(Reg8::F), 0b1010_1011);

        regs.set_flag(Flags::S, false);
        assert_eq!(regs.get8(Reg8::F), 0b0010_1011);
        assert!(regs.flag(Flags::F5));
        assert!(regs.flag(Flags::F3));
    }
}

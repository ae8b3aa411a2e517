//! Register composite and flag isolation invariants.

use bitflags as _;
use proptest::prelude::*;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;
use z80_core::{Flags, Reg16, Reg8, RegisterFile};

const COMPOSITES: [Reg16; 6] = [
    Reg16::Af,
    Reg16::Bc,
    Reg16::De,
    Reg16::Hl,
    Reg16::Ix,
    Reg16::Iy,
];

proptest! {
    #[test]
    fn composite_equals_high_shl_8_or_low(index in 0_usize..6, value in any::<u16>()) {
        let reg = COMPOSITES[index];
        let (high, low) = reg.halves().expect("composite");
        let mut regs = RegisterFile::new();
        regs.set16(reg, value);
        prop_assert_eq!(regs.get8(high), value.to_be_bytes()[0]);
        prop_assert_eq!(regs.get8(low), value.to_be_bytes()[1]);
        prop_assert_eq!(
            regs.get16(reg),
            (u16::from(regs.get8(high)) << 8) | u16::from(regs.get8(low))
        );
    }

    #[test]
    fn setting_a_half_keeps_the_other(index in 0_usize..6, initial in any::<u16>(), byte in any::<u8>()) {
        let reg = COMPOSITES[index];
        let (high, low) = reg.halves().expect("composite");
        let mut regs = RegisterFile::new();
        regs.set16(reg, initial);
        regs.set8(high, byte);
        prop_assert_eq!(regs.get8(low), initial.to_be_bytes()[1]);
        prop_assert_eq!(regs.get16(reg), u16::from_be_bytes([byte, initial.to_be_bytes()[1]]));
    }

    #[test]
    fn single_flag_writes_are_isolated(f in any::<u8>(), bit in 0_u32..8, enabled in any::<bool>()) {
        let flag = Flags::from_bits_retain(1 << bit);
        let mut regs = RegisterFile::new();
        regs.set8(Reg8::F, f);
        regs.set_flag(flag, enabled);
        let others = !flag.bits();
        prop_assert_eq!(regs.get8(Reg8::F) & others, f & others);
        prop_assert_eq!(regs.flag(flag), enabled);
    }

    #[test]
    fn writing_f_sets_every_flag(f in any::<u8>()) {
        let mut regs = RegisterFile::new();
        regs.set8(Reg8::F, f);
        prop_assert_eq!(regs.flags().bits(), f);
    }
}

#[test]
fn exx_then_exx_restores_active_bank() {
    let mut regs = RegisterFile::new();
    regs.set16(Reg16::Bc, 0x1111);
    regs.set16(Reg16::De, 0x2222);
    regs.set16(Reg16::Hl, 0x3333);
    regs.exchange_banks();
    assert_eq!(regs.get16(Reg16::Bc), 0);
    regs.exchange_banks();
    assert_eq!(regs.get16(Reg16::Hl), 0x3333);
}

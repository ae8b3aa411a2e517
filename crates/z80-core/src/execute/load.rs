//! Loads, stack transfers, exchanges and block moves.

use super::{ExecutionEngine, Operand};
use crate::fault::ExecError;
use crate::state::{Flags, Reg16, Reg8};

impl ExecutionEngine<'_> {
    /// `LD d,s` for bytes. Flags are untouched except for `LD A,I` and
    /// `LD A,R`, which set S and Z from the value and clear H, N and PV.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::WriteToImmediate`] when `dst` is a literal.
    pub fn ld8(&mut self, dst: Operand, src: Operand) -> Result<(), ExecError> {
        let value = self.read(src);
        self.write(dst, value)?;
        if dst == Operand::Register8(Reg8::A)
            && matches!(src, Operand::Register8(Reg8::I | Reg8::R))
        {
            self.update_flags(|flags| {
                flags.set(Flags::S, value & 0x80 != 0);
                flags.set(Flags::Z, value == 0);
                flags.remove(Flags::H | Flags::N | Flags::PV);
            });
        }
        Ok(())
    }

    /// `LD rr,nn`
    pub fn ld16(&mut self, dst: Reg16, value: u16) {
        self.registers.set16(dst, value);
    }

    /// `LD rr,rr'`, e.g. `LD SP,HL`.
    pub fn ld16_register(&mut self, dst: Reg16, src: Reg16) {
        let value = self.registers.get16(src);
        self.registers.set16(dst, value);
    }

    /// `LD rr,(nn)` and `LD (nn),rr` through a memory operand.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::WriteToImmediate`] when `dst` is a literal.
    pub fn ld16_indirect(&mut self, dst: Operand, src: Operand) -> Result<(), ExecError> {
        let value = src.read_word(self.registers, self.memory);
        dst.write_word(self.registers, self.memory, value)
    }

    /// `PUSH rr`
    pub fn push_reg(&mut self, reg: Reg16) {
        let value = self.registers.get16(reg);
        self.push(value);
    }

    /// `POP rr`
    pub fn pop_reg(&mut self, reg: Reg16) {
        let value = self.pop();
        self.registers.set16(reg, value);
    }

    /// `EX DE,HL`
    pub fn ex_de_hl(&mut self) {
        let de = self.registers.get16(Reg16::De);
        let hl = self.registers.get16(Reg16::Hl);
        self.registers.set16(Reg16::De, hl);
        self.registers.set16(Reg16::Hl, de);
    }

    /// `EX AF,AF'`
    pub fn ex_af(&mut self) {
        self.registers.exchange_af();
    }

    /// `EXX`: swaps BC, DE and HL with their shadows.
    pub fn exx(&mut self) {
        self.registers.exchange_banks();
    }

    /// `EX (SP),HL|IX|IY`
    pub fn ex_sp(&mut self, reg: Reg16) {
        let sp = self.registers.sp();
        let stacked = self.memory.get_word(sp);
        let value = self.registers.get16(reg);
        self.memory.set_word(sp, value);
        self.registers.set16(reg, stacked);
    }

    fn block_transfer(&mut self, step: i16) -> bool {
        let hl = self.registers.get16(Reg16::Hl);
        let de = self.registers.get16(Reg16::De);
        let value = self.memory.get(hl);
        self.memory.set(de, value);
        self.registers.set16(Reg16::Hl, hl.wrapping_add_signed(step));
        self.registers.set16(Reg16::De, de.wrapping_add_signed(step));
        let bc = self.registers.get16(Reg16::Bc).wrapping_sub(1);
        self.registers.set16(Reg16::Bc, bc);
        self.update_flags(|flags| {
            flags.set(Flags::PV, bc != 0);
            flags.remove(Flags::H | Flags::N);
        });
        bc != 0
    }

    /// `LDI`: (DE) ← (HL), HL and DE increment, BC decrements.
    pub fn ldi(&mut self) {
        self.block_transfer(1);
    }

    /// `LDD`: as `LDI` but HL and DE decrement.
    pub fn ldd(&mut self) {
        self.block_transfer(-1);
    }

    /// `LDIR`: repeats `LDI` until BC is zero. BC = 0 on entry moves 64 KiB.
    pub fn ldir(&mut self) {
        while self.block_transfer(1) {}
    }

    /// `LDDR`: repeats `LDD` until BC is zero.
    pub fn lddr(&mut self) {
        while self.block_transfer(-1) {}
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::execute::test_support::Rig;
    use crate::execute::Operand;
    use crate::fault::ExecError;
    use crate::state::{Flags, Reg16, Reg8};

    #[test]
    fn byte_loads_between_registers_and_memory() {
        let mut rig = Rig::new();
        rig.regs.set8(Reg8::A, 0x5A);
        rig.engine()
            .ld8(Operand::MemoryDirect(500), Operand::Register8(Reg8::A))
            .unwrap();
        assert_eq!(rig.memory.get(500), 0x5A);
        rig.engine()
            .ld8(Operand::Register8(Reg8::E), Operand::MemoryDirect(500))
            .unwrap();
        assert_eq!(rig.regs.get8(Reg8::E), 0x5A);
    }

    #[test]
    fn loads_leave_flags_alone() {
        let mut rig = Rig::new();
        rig.regs.set_flags(Flags::C | Flags::Z);
        rig.engine()
            .ld8(Operand::Register8(Reg8::B), Operand::Immediate8(0))
            .unwrap();
        assert_eq!(rig.regs.flags(), Flags::C | Flags::Z);
    }

    #[test]
    fn load_from_refresh_register_sets_flags() {
        let mut rig = Rig::new();
        rig.regs.set8(Reg8::R, 0x80);
        rig.regs.set_flags(Flags::PV | Flags::H | Flags::C);
        rig.engine()
            .ld8(Operand::Register8(Reg8::A), Operand::Register8(Reg8::R))
            .unwrap();
        assert_eq!(rig.regs.get8(Reg8::A), 0x80);
        assert_eq!(rig.regs.flags(), Flags::S | Flags::C);
    }

    #[test]
    fn load_into_immediate_faults() {
        let mut rig = Rig::new();
        assert_eq!(
            rig.engine()
                .ld8(Operand::Immediate8(1), Operand::Register8(Reg8::A)),
            Err(ExecError::WriteToImmediate)
        );
    }

    #[test]
    fn word_loads_through_memory() {
        let mut rig = Rig::new();
        rig.regs.set16(Reg16::Hl, 0xBEEF);
        rig.engine()
            .ld16_indirect(Operand::MemoryDirect(0x100), Operand::Register16(Reg16::Hl))
            .unwrap();
        assert_eq!(rig.memory.get(0x100), 0xEF);
        rig.engine()
            .ld16_indirect(Operand::Register16(Reg16::Bc), Operand::MemoryDirect(0x100))
            .unwrap();
        assert_eq!(rig.regs.get16(Reg16::Bc), 0xBEEF);
    }

    #[test]
    fn push_bc_stores_low_then_high() {
        let mut rig = Rig::new();
        rig.regs.set_sp(0x9000);
        rig.regs.set16(Reg16::Bc, 0xABCD);
        rig.engine().push_reg(Reg16::Bc);
        let sp = rig.regs.sp();
        assert_eq!(rig.memory.get(sp), 0xCD);
        assert_eq!(rig.memory.get(sp + 1), 0xAB);

        rig.engine().pop_reg(Reg16::De);
        assert_eq!(rig.regs.get16(Reg16::De), 0xABCD);
    }

    #[test]
    fn exchanges() {
        let mut rig = Rig::new();
        rig.regs.set16(Reg16::De, 1);
        rig.regs.set16(Reg16::Hl, 2);
        rig.engine().ex_de_hl();
        assert_eq!(rig.regs.get16(Reg16::De), 2);
        assert_eq!(rig.regs.get16(Reg16::Hl), 1);

        rig.regs.set_sp(0x100);
        rig.memory.set_word(0x100, 0x1111);
        rig.engine().ex_sp(Reg16::Hl);
        assert_eq!(rig.regs.get16(Reg16::Hl), 0x1111);
        assert_eq!(rig.memory.get_word(0x100), 1);

        rig.regs.set16(Reg16::Af, 0x1234);
        rig.engine().ex_af();
        assert_eq!(rig.regs.get16(Reg16::Af), 0);
        rig.engine().ex_af();
        assert_eq!(rig.regs.get16(Reg16::Af), 0x1234);
    }

    #[test]
    fn ldir_copies_block() {
        let mut rig = Rig::new();
        rig.memory.load(0x1000, &[1, 2, 3, 4, 5]);
        rig.regs.set16(Reg16::Hl, 0x1000);
        rig.regs.set16(Reg16::De, 0x2000);
        rig.regs.set16(Reg16::Bc, 5);
        rig.engine().ldir();

        assert_eq!(&rig.memory.as_slice()[0x2000..0x2005], &[1, 2, 3, 4, 5]);
        assert_eq!(rig.regs.get16(Reg16::Hl), 0x1005);
        assert_eq!(rig.regs.get16(Reg16::De), 0x2005);
        assert_eq!(rig.regs.get16(Reg16::Bc), 0);
        assert!(!rig.regs.flag(Flags::PV));
    }

    #[test]
    fn lddr_copies_downwards() {
        let mut rig = Rig::new();
        rig.memory.load(0x1000, &[9, 8, 7]);
        rig.regs.set16(Reg16::Hl, 0x1002);
        rig.regs.set16(Reg16::De, 0x3002);
        rig.regs.set16(Reg16::Bc, 3);
        rig.engine().lddr();
        assert_eq!(&rig.memory.as_slice()[0x3000..0x3003], &[9, 8, 7]);
        assert_eq!(rig.regs.get16(Reg16::Hl), 0x0FFF);
    }

    #[test]
    fn single_ldi_reports_remaining_count() {
        let mut rig = Rig::new();
        rig.regs.set16(Reg16::Bc, 2);
        rig.engine().ldi();
        assert!(rig.regs.flag(Flags::PV));
        assert_eq!(rig.regs.get16(Reg16::Bc), 1);
    }

    proptest! {
        #[test]
        fn ldd_moves_one_byte_downwards(value in any::<u8>(), hl in 0x100_u16..0x8000, de in 0x8000_u16..0xFF00) {
            let mut rig = Rig::new();
            rig.memory.set(hl, value);
            rig.regs.set16(Reg16::Hl, hl);
            rig.regs.set16(Reg16::De, de);
            rig.engine().ldd();
            prop_assert_eq!(rig.memory.get(de), value);
            prop_assert_eq!(rig.regs.get16(Reg16::Hl), hl - 1);
            prop_assert_eq!(rig.regs.get16(Reg16::De), de - 1);
        }
    }
}

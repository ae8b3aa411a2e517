//! Arithmetic, logic and accumulator instructions.

use super::flags::{evaluate, set_sz_parity};
use super::{ExecutionEngine, Operand};
use crate::fault::ExecError;
use crate::state::{Flags, Reg16, Reg8};

fn signed(value: u8) -> i8 {
    i8::from_le_bytes([value])
}

fn illegal(instruction: &str, first: &str, second: &str) -> ExecError {
    ExecError::IllegalOperands {
        instruction: format!("{instruction} {first},{second}").to_ascii_lowercase(),
    }
}

impl ExecutionEngine<'_> {
    /// `ADD A,s`. Carry is ignored; H is the low-nibble carry.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::IllegalOperands`] for combinations off the whitelist.
    pub fn add8(&mut self, dst: Reg8, src: Operand) -> Result<(), ExecError> {
        self.ensure_valid("add", dst.name(), Some(&src.shape_name()))?;
        let a = self.registers.get8(dst);
        let s = self.read(src);
        let result = a.wrapping_add(s);
        self.update_flags(|flags| {
            evaluate(flags, signed(a), signed(result));
            flags.set(Flags::H, (a & 0x0F) + (s & 0x0F) > 0x0F);
            flags.remove(Flags::N);
        });
        self.registers.set8(dst, result);
        Ok(())
    }

    /// `ADC A,s`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::IllegalOperands`] for combinations off the whitelist.
    pub fn adc8(&mut self, dst: Reg8, src: Operand) -> Result<(), ExecError> {
        self.ensure_valid("adc", dst.name(), Some(&src.shape_name()))?;
        let a = self.registers.get8(dst);
        let carry = u8::from(self.flags().contains(Flags::C));
        let result = a.wrapping_add(self.read(src)).wrapping_add(carry);
        self.update_flags(|flags| {
            evaluate(flags, signed(a), signed(result));
            flags.remove(Flags::N);
        });
        self.registers.set8(dst, result);
        Ok(())
    }

    /// `SUB s`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::IllegalOperands`] for combinations off the whitelist.
    pub fn sub8(&mut self, src: Operand) -> Result<(), ExecError> {
        self.ensure_valid("sub", &src.shape_name(), None)?;
        let a = self.registers.get8(Reg8::A);
        let result = a.wrapping_sub(self.read(src));
        self.update_flags(|flags| {
            evaluate(flags, signed(a), signed(result));
            flags.insert(Flags::N);
        });
        self.registers.set8(Reg8::A, result);
        Ok(())
    }

    fn subtract(&mut self, value: u8, borrow: bool) -> u8 {
        let a = self.registers.get8(Reg8::A);
        let c = u8::from(borrow);
        let result = a.wrapping_sub(value).wrapping_sub(c);
        self.update_flags(|flags| {
            flags.set(Flags::S, result & 0x80 != 0);
            flags.set(Flags::Z, result == 0);
            flags.set(Flags::H, (a & 0x0F) < (value & 0x0F) + c);
            flags.set(
                Flags::PV,
                (a ^ value) & 0x80 != 0 && (value ^ result) & 0x80 == 0,
            );
            flags.set(Flags::C, u16::from(a) < u16::from(value) + u16::from(c));
            flags.insert(Flags::N);
        });
        result
    }

    /// `SBC A,s`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::IllegalOperands`] unless the destination is `A`.
    pub fn sbc8(&mut self, dst: Reg8, src: Operand) -> Result<(), ExecError> {
        if dst != Reg8::A {
            return Err(illegal("sbc", dst.name(), &src.shape_name()));
        }
        let borrow = self.flags().contains(Flags::C);
        let value = self.read(src);
        let result = self.subtract(value, borrow);
        self.registers.set8(Reg8::A, result);
        Ok(())
    }

    /// `CP s`: subtract for flags only.
    pub fn cp8(&mut self, src: Operand) {
        let value = self.read(src);
        self.subtract(value, false);
    }

    fn logic(&mut self, result: u8, half: bool) {
        self.registers.set8(Reg8::A, result);
        self.update_flags(|flags| {
            set_sz_parity(flags, result);
            flags.set(Flags::H, half);
            flags.remove(Flags::N | Flags::C);
        });
    }

    /// `AND s`
    pub fn and8(&mut self, src: Operand) {
        let result = self.registers.get8(Reg8::A) & self.read(src);
        self.logic(result, true);
    }

    /// `OR s`
    pub fn or8(&mut self, src: Operand) {
        let result = self.registers.get8(Reg8::A) | self.read(src);
        self.logic(result, false);
    }

    /// `XOR s`
    pub fn xor8(&mut self, src: Operand) {
        let result = self.registers.get8(Reg8::A) ^ self.read(src);
        self.logic(result, false);
    }

    /// `INC s` on a byte. Carry is unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::IllegalOperands`] for combinations off the whitelist
    /// and [`ExecError::WriteToImmediate`] for literals.
    pub fn inc8(&mut self, target: Operand) -> Result<(), ExecError> {
        self.ensure_valid("inc", &target.shape_name(), None)?;
        let value = self.read(target);
        let result = value.wrapping_add(1);
        self.write(target, result)?;
        self.update_flags(|flags| {
            flags.set(Flags::S, result & 0x80 != 0);
            flags.set(Flags::Z, result == 0);
            flags.set(Flags::H, value & 0x0F == 0x0F);
            flags.set(Flags::PV, value == 0x7F);
            flags.remove(Flags::N);
        });
        Ok(())
    }

    /// `DEC s` on a byte. Carry is unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::IllegalOperands`] for combinations off the whitelist
    /// and [`ExecError::WriteToImmediate`] for literals.
    pub fn dec8(&mut self, target: Operand) -> Result<(), ExecError> {
        self.ensure_valid("dec", &target.shape_name(), None)?;
        let value = self.read(target);
        let result = value.wrapping_sub(1);
        self.write(target, result)?;
        self.update_flags(|flags| {
            flags.set(Flags::S, result & 0x80 != 0);
            flags.set(Flags::Z, result == 0);
            flags.set(Flags::H, value & 0x0F == 0);
            flags.set(Flags::PV, value == 0x80);
            flags.insert(Flags::N);
        });
        Ok(())
    }

    /// `INC rr`: wraps, no flags.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::IllegalOperands`] for registers off the whitelist.
    pub fn inc16(&mut self, reg: Reg16) -> Result<(), ExecError> {
        self.ensure_valid("inc", &reg.name().to_ascii_lowercase(), None)?;
        let value = self.registers.get16(reg).wrapping_add(1);
        self.registers.set16(reg, value);
        Ok(())
    }

    /// `DEC rr`: wraps, no flags.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::IllegalOperands`] for registers off the whitelist.
    pub fn dec16(&mut self, reg: Reg16) -> Result<(), ExecError> {
        self.ensure_valid("dec", &reg.name().to_ascii_lowercase(), None)?;
        let value = self.registers.get16(reg).wrapping_sub(1);
        self.registers.set16(reg, value);
        Ok(())
    }

    /// `ADD HL|IX|IY,rr`: H from bit 11, C from bit 15, N cleared.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::IllegalOperands`] for pairs off the whitelist.
    pub fn add16(&mut self, dst: Reg16, src: Reg16) -> Result<(), ExecError> {
        self.ensure_valid(
            "add",
            &dst.name().to_ascii_lowercase(),
            Some(&src.name().to_ascii_lowercase()),
        )?;
        let a = self.registers.get16(dst);
        let b = self.registers.get16(src);
        let (result, carry) = a.overflowing_add(b);
        self.registers.set16(dst, result);
        self.update_flags(|flags| {
            flags.set(Flags::H, (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF);
            flags.set(Flags::C, carry);
            flags.remove(Flags::N);
        });
        Ok(())
    }

    /// `ADC HL,rr`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::IllegalOperands`] for pairs off the whitelist.
    pub fn adc16(&mut self, dst: Reg16, src: Reg16) -> Result<(), ExecError> {
        self.ensure_valid(
            "adc",
            &dst.name().to_ascii_lowercase(),
            Some(&src.name().to_ascii_lowercase()),
        )?;
        let a = self.registers.get16(dst);
        let b = self.registers.get16(src);
        let c = u16::from(self.flags().contains(Flags::C));
        let (partial, first_carry) = a.overflowing_add(b);
        let (result, second_carry) = partial.overflowing_add(c);
        self.registers.set16(dst, result);
        self.update_flags(|flags| {
            flags.set(Flags::S, result & 0x8000 != 0);
            flags.set(Flags::Z, result == 0);
            flags.set(Flags::H, (a & 0x0FFF) + (b & 0x0FFF) + c > 0x0FFF);
            flags.set(
                Flags::PV,
                (a ^ b) & 0x8000 == 0 && (a ^ result) & 0x8000 != 0,
            );
            flags.set(Flags::C, first_carry || second_carry);
            flags.remove(Flags::N);
        });
        Ok(())
    }

    /// `SBC HL,rr`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::IllegalOperands`] unless the destination is `HL`.
    pub fn sbc16(&mut self, dst: Reg16, src: Reg16) -> Result<(), ExecError> {
        if dst != Reg16::Hl {
            return Err(illegal("sbc", dst.name(), src.name()));
        }
        let a = self.registers.get16(dst);
        let b = self.registers.get16(src);
        let c = u16::from(self.flags().contains(Flags::C));
        let result = a.wrapping_sub(b).wrapping_sub(c);
        self.registers.set16(dst, result);
        self.update_flags(|flags| {
            flags.set(Flags::S, result & 0x8000 != 0);
            flags.set(Flags::Z, result == 0);
            flags.set(Flags::H, (a & 0x0FFF) < (b & 0x0FFF) + c);
            flags.set(
                Flags::PV,
                (a ^ b) & 0x8000 != 0 && (b ^ result) & 0x8000 == 0,
            );
            flags.set(Flags::C, u32::from(a) < u32::from(b) + u32::from(c));
            flags.insert(Flags::N);
        });
        Ok(())
    }

    /// `DAA`: corrects the low nibble only.
    ///
    /// After an addition a low nibble above 9 (or H set) adds 6; after a
    /// subtraction H set subtracts 6. C and N are unaffected.
    pub fn daa(&mut self) {
        let a = self.registers.get8(Reg8::A);
        let flags = self.flags();
        let low = a & 0x0F;
        let subtract = flags.contains(Flags::N);
        let (result, half) = if subtract {
            if flags.contains(Flags::H) {
                (a.wrapping_sub(6), low < 6)
            } else {
                (a, false)
            }
        } else if low > 9 || flags.contains(Flags::H) {
            (a.wrapping_add(6), low > 9)
        } else {
            (a, false)
        };
        self.registers.set8(Reg8::A, result);
        self.update_flags(|flags| {
            set_sz_parity(flags, result);
            flags.set(Flags::H, half);
        });
    }

    /// `NEG`: A = 0 - A.
    pub fn neg(&mut self) {
        let a = self.registers.get8(Reg8::A);
        let result = 0_u8.wrapping_sub(a);
        self.registers.set8(Reg8::A, result);
        self.update_flags(|flags| {
            flags.set(Flags::S, result & 0x80 != 0);
            flags.set(Flags::Z, result == 0);
            flags.set(Flags::H, a & 0x0F != 0);
            flags.set(Flags::PV, a == 0x80);
            flags.set(Flags::C, a != 0);
            flags.insert(Flags::N);
        });
    }

    /// `CPL`: A = !A; sets H and N.
    pub fn cpl(&mut self) {
        let a = self.registers.get8(Reg8::A);
        self.registers.set8(Reg8::A, !a);
        self.update_flags(|flags| flags.insert(Flags::H | Flags::N));
    }

    /// `SCF`
    pub fn scf(&mut self) {
        self.update_flags(|flags| {
            flags.insert(Flags::C);
            flags.remove(Flags::H | Flags::N);
        });
    }

    /// `CCF`: H takes the old carry.
    pub fn ccf(&mut self) {
        self.update_flags(|flags| {
            let carry = flags.contains(Flags::C);
            flags.set(Flags::H, carry);
            flags.set(Flags::C, !carry);
            flags.remove(Flags::N);
        });
    }
}

//! Jumps, calls, returns and restarts.
//!
//! By the time a handler runs, PC already holds the address of the next
//! instruction, so relative branches and return addresses are computed from it.

use super::{Condition, ExecutionEngine};
use crate::fault::ExecError;
use crate::state::{Reg16, Reg8};

impl ExecutionEngine<'_> {
    /// `JP nn`
    pub fn jp(&mut self, target: u16) {
        self.registers.set_pc(target);
    }

    /// `JP cc,nn`
    pub fn jp_cond(&mut self, cond: Condition, target: u16) {
        if cond.is_true(self.flags()) {
            self.jp(target);
        }
    }

    /// `JP (HL)`, `JP (IX)`, `JP (IY)`: jumps to the register value.
    pub fn jp_indirect(&mut self, reg: Reg16) {
        let target = self.registers.get16(reg);
        self.jp(target);
    }

    /// `JR d`
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::RelativeJumpOutOfRange`] when `PC + d` leaves
    /// `0..=0xFFFF`, counting a PC that wrapped over the instruction as
    /// 0x10000 + PC. PC is unchanged in that case.
    pub fn jr(&mut self, offset: i8) -> Result<(), ExecError> {
        let pc = self.registers.pc();
        let base = i32::from(pc) + if self.pc_wrapped { 0x1_0000 } else { 0 };
        let target = u16::try_from(base + i32::from(offset))
            .map_err(|_| ExecError::RelativeJumpOutOfRange { pc, offset })?;
        self.registers.set_pc(target);
        Ok(())
    }

    /// `JR cc,d`
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::RelativeJumpOutOfRange`] if the taken branch leaves
    /// the address space.
    pub fn jr_cond(&mut self, cond: Condition, offset: i8) -> Result<(), ExecError> {
        if cond.is_true(self.flags()) {
            self.jr(offset)
        } else {
            Ok(())
        }
    }

    /// `DJNZ d`: decrements B and branches while it is nonzero.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::RelativeJumpOutOfRange`] if the taken branch leaves
    /// the address space.
    pub fn djnz(&mut self, offset: i8) -> Result<(), ExecError> {
        let b = self.registers.get8(Reg8::B).wrapping_sub(1);
        self.registers.set8(Reg8::B, b);
        if b == 0 {
            Ok(())
        } else {
            self.jr(offset)
        }
    }

    /// `CALL nn`
    pub fn call(&mut self, target: u16) {
        let ret = self.registers.pc();
        self.push(ret);
        self.registers.set_pc(target);
    }

    /// `CALL cc,nn`
    pub fn call_cond(&mut self, cond: Condition, target: u16) {
        if cond.is_true(self.flags()) {
            self.call(target);
        }
    }

    /// `RET`, `RETI`, `RETN`
    pub fn ret(&mut self) {
        let target = self.pop();
        self.registers.set_pc(target);
    }

    /// `RET cc`
    pub fn ret_cond(&mut self, cond: Condition) {
        if cond.is_true(self.flags()) {
            self.ret();
        }
    }

    /// `RST p`
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::MalformedInstruction`] unless `vector` is one of
    /// `00H, 08H, ..., 38H`.
    pub fn rst(&mut self, vector: u16) -> Result<(), ExecError> {
        if vector > 0x38 || vector % 8 != 0 {
            return Err(ExecError::MalformedInstruction {
                instruction: format!("RST {vector:02X}H"),
            });
        }
        self.call(vector);
        Ok(())
    }
}

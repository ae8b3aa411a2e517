//! Rotate, shift and single-bit instructions.

use super::flags::set_sz_parity;
use super::{ExecutionEngine, Operand};
use crate::fault::ExecError;
use crate::state::{Flags, Reg8};

/// The eight `CB`-page rotate and shift operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftOp {
    /// Rotate left circular.
    Rlc,
    /// Rotate right circular.
    Rrc,
    /// Rotate left through carry.
    Rl,
    /// Rotate right through carry.
    Rr,
    /// Arithmetic shift left.
    Sla,
    /// Arithmetic shift right, bit 7 kept.
    Sra,
    /// Shift left, bit 0 set (undocumented).
    Sll,
    /// Logical shift right.
    Srl,
}

impl ShiftOp {
    /// Applies the operation, returning `(result, carry_out)`.
    #[must_use]
    pub fn apply(self, value: u8, carry_in: bool) -> (u8, bool) {
        let carry = u8::from(carry_in);
        match self {
            Self::Rlc => (value.rotate_left(1), value & 0x80 != 0),
            Self::Rrc => (value.rotate_right(1), value & 0x01 != 0),
            Self::Rl => ((value << 1) | carry, value & 0x80 != 0),
            Self::Rr => ((value >> 1) | (carry << 7), value & 0x01 != 0),
            Self::Sla => (value << 1, value & 0x80 != 0),
            Self::Sra => ((value >> 1) | (value & 0x80), value & 0x01 != 0),
            Self::Sll => ((value << 1) | 0x01, value & 0x80 != 0),
            Self::Srl => (value >> 1, value & 0x01 != 0),
        }
    }
}

fn check_bit(bit: u8) -> Result<u8, ExecError> {
    if bit < 8 {
        Ok(1 << bit)
    } else {
        Err(ExecError::MalformedInstruction {
            instruction: format!("bit number {bit}"),
        })
    }
}

impl ExecutionEngine<'_> {
    fn rotate_accumulator(&mut self, op: ShiftOp) {
        let a = self.registers.get8(Reg8::A);
        let (result, carry) = op.apply(a, self.flags().contains(Flags::C));
        self.registers.set8(Reg8::A, result);
        self.update_flags(|flags| {
            flags.set(Flags::C, carry);
            flags.remove(Flags::H | Flags::N);
        });
    }

    /// `RLCA`
    pub fn rlca(&mut self) {
        self.rotate_accumulator(ShiftOp::Rlc);
    }

    /// `RRCA`
    pub fn rrca(&mut self) {
        self.rotate_accumulator(ShiftOp::Rrc);
    }

    /// `RLA`
    pub fn rla(&mut self) {
        self.rotate_accumulator(ShiftOp::Rl);
    }

    /// `RRA`
    pub fn rra(&mut self) {
        self.rotate_accumulator(ShiftOp::Rr);
    }

    /// `RLC s`, `SRL s` and the rest of the `CB` rotate/shift group.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::WriteToImmediate`] for literals.
    pub fn shift(&mut self, op: ShiftOp, target: Operand) -> Result<(), ExecError> {
        let (result, carry) = op.apply(self.read(target), self.flags().contains(Flags::C));
        self.write(target, result)?;
        self.update_flags(|flags| {
            set_sz_parity(flags, result);
            flags.set(Flags::C, carry);
            flags.remove(Flags::H | Flags::N);
        });
        Ok(())
    }

    /// `BIT b,s`: Z is the complement of the tested bit.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::MalformedInstruction`] for bit numbers above 7.
    pub fn bit(&mut self, bit: u8, src: Operand) -> Result<(), ExecError> {
        let mask = check_bit(bit)?;
        let set = self.read(src) & mask != 0;
        self.update_flags(|flags| {
            flags.set(Flags::Z, !set);
            flags.set(Flags::PV, !set);
            flags.set(Flags::S, set && bit == 7);
            flags.insert(Flags::H);
            flags.remove(Flags::N);
        });
        Ok(())
    }

    /// `SET b,s`
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::MalformedInstruction`] for bit numbers above 7 and
    /// [`ExecError::WriteToImmediate`] for literals.
    pub fn set_bit(&mut self, bit: u8, target: Operand) -> Result<(), ExecError> {
        let mask = check_bit(bit)?;
        let value = self.read(target) | mask;
        self.write(target, value)
    }

    /// `RES b,s`
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::MalformedInstruction`] for bit numbers above 7 and
    /// [`ExecError::WriteToImmediate`] for literals.
    pub fn res_bit(&mut self, bit: u8, target: Operand) -> Result<(), ExecError> {
        let mask = check_bit(bit)?;
        let value = self.read(target) & !mask;
        self.write(target, value)
    }
}

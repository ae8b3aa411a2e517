//! Instruction semantics over one register file and one memory.
//!
//! Each public method on [`ExecutionEngine`] implements one instruction
//! family. Methods mutate state in place; on error, writes already performed
//! are kept.

mod arith;
mod bits;
/// Branch conditions.
pub mod condition;
mod control;
/// Flag predicates.
pub mod flags;
mod load;
/// Addressing-mode operands.
pub mod operand;

pub use bits::ShiftOp;
pub use condition::Condition;
pub use flags::{evaluate, parity_even};
pub use operand::{parse_number, Operand};

use crate::fault::ExecError;
use crate::legality::LegalityValidator;
use crate::memory::Memory;
use crate::state::{Flags, RegisterFile};

/// Borrowed view of a machine used to execute one instruction.
#[derive(Debug)]
pub struct ExecutionEngine<'a> {
    registers: &'a mut RegisterFile,
    memory: &'a mut Memory,
    legality: &'a LegalityValidator,
    pc_wrapped: bool,
}

impl<'a> ExecutionEngine<'a> {
    /// Creates an engine over the given state.
    pub fn new(
        registers: &'a mut RegisterFile,
        memory: &'a mut Memory,
        legality: &'a LegalityValidator,
    ) -> Self {
        Self {
            registers,
            memory,
            legality,
            pc_wrapped: false,
        }
    }

    /// Marks PC as having wrapped past 0xFFFF while advancing over the
    /// current instruction, so relative branches are taken from 0x10000 + PC.
    #[must_use]
    pub(crate) const fn with_wrapped_pc(mut self, wrapped: bool) -> Self {
        self.pc_wrapped = wrapped;
        self
    }

    /// Reads the register file.
    #[must_use]
    pub fn registers(&self) -> &RegisterFile {
        self.registers
    }

    /// Mutable access to the register file.
    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        self.registers
    }

    /// Reads memory.
    #[must_use]
    pub fn memory(&self) -> &Memory {
        self.memory
    }

    /// Mutable access to memory.
    pub fn memory_mut(&mut self) -> &mut Memory {
        self.memory
    }

    fn read(&self, operand: Operand) -> u8 {
        operand.read(self.registers, self.memory)
    }

    fn write(&mut self, operand: Operand, value: u8) -> Result<(), ExecError> {
        operand.write(self.registers, self.memory, value)
    }

    fn flags(&self) -> Flags {
        self.registers.flags()
    }

    fn update_flags(&mut self, update: impl FnOnce(&mut Flags)) {
        let mut flags = self.registers.flags();
        update(&mut flags);
        self.registers.set_flags(flags);
    }

    fn ensure_valid(
        &self,
        instruction: &str,
        first: &str,
        second: Option<&str>,
    ) -> Result<(), ExecError> {
        self.legality.ensure_valid(instruction, first, second)
    }

    /// `NOP`
    pub const fn nop(&mut self) {}

    /// `HALT`: no interrupt model, so execution simply continues.
    pub const fn halt(&mut self) {}

    /// Pushes a word: SP decrements by two, low byte lands at SP.
    pub fn push(&mut self, value: u16) {
        let sp = self.registers.sp().wrapping_sub(2);
        self.registers.set_sp(sp);
        self.memory.set_word(sp, value);
    }

    /// Pops a word pushed by [`ExecutionEngine::push`].
    pub fn pop(&mut self) -> u16 {
        let sp = self.registers.sp();
        let value = self.memory.get_word(sp);
        self.registers.set_sp(sp.wrapping_add(2));
        value
    }
}


#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::test_support::Rig;

    #[test]
    fn push_stores_low_byte_at_sp() {
        let mut rig = Rig::new();
        rig.regs.set_sp(0x8000);
        rig.engine().push(0xABCD);

        assert_eq!(rig.regs.sp(), 0x7FFE);
        assert_eq!(rig.memory.get(0x7FFE), 0xCD);
        assert_eq!(rig.memory.get(0x7FFF), 0xAB);
    }

    #[test]
    fn stack_pointer_wraps() {
        let mut rig = Rig::new();
        rig.regs.set_sp(0x0001);
        rig.engine().push(0x1234);
        assert_eq!(rig.regs.sp(), 0xFFFF);
        assert_eq!(rig.engine().pop(), 0x1234);
        assert_eq!(rig.regs.sp(), 0x0001);
    }

    proptest! {
        #[test]
        fn push_then_pop_restores_value_and_sp(value in any::<u16>(), sp in any::<u16>()) {
            let mut rig = Rig::new();
            rig.regs.set_sp(sp);
            let mut engine = rig.engine();
            engine.push(value);
            prop_assert_eq!(engine.pop(), value);
            prop_assert_eq!(rig.regs.sp(), sp);
        }
    }
}

//! Host-facing machine: one register file, one memory and the shared tables.

use crate::disasm::{disassemble, DisassemblyRow};
use crate::fault::{ExecError, TableError};
use crate::legality::LegalityValidator;
use crate::memory::Memory;
use crate::runner::CommandRunner;
use crate::state::RegisterFile;
use crate::table::OpcodeTable;

/// Default step budget for [`Machine::run_until_halt`].
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

/// Initial register values for a new machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineConfig {
    /// Program counter at reset.
    pub initial_pc: u16,
    /// Stack pointer at reset.
    pub initial_sp: u16,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            initial_pc: 0x0000,
            initial_sp: 0xFFFF,
        }
    }
}

/// Upper bound on the number of instructions a run may execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunLimit {
    /// Maximum instructions to execute.
    pub max_steps: u64,
}

impl Default for RunLimit {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Result of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// An instruction other than `HALT` executed.
    Continue,
    /// `HALT` executed.
    Halted,
}

/// Result of a bounded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunOutcome {
    /// `HALT` was reached after `steps` instructions, itself included.
    Halted {
        /// Instructions executed.
        steps: u64,
    },
    /// The step budget ran out first.
    StepLimit {
        /// Instructions executed.
        steps: u64,
    },
}

impl RunOutcome {
    /// Instructions executed.
    #[must_use]
    pub const fn steps(self) -> u64 {
        match self {
            Self::Halted { steps } | Self::StepLimit { steps } => steps,
        }
    }
}

/// A complete Z80 machine.
#[derive(Debug)]
pub struct Machine {
    registers: RegisterFile,
    memory: Memory,
    table: &'static OpcodeTable,
    legality: &'static LegalityValidator,
}

impl Machine {
    /// Creates a machine with [`MachineConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if an embedded resource fails to load.
    pub fn new() -> Result<Self, TableError> {
        Self::with_config(MachineConfig::default())
    }

    /// Creates a machine with explicit reset values.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if an embedded resource fails to load.
    pub fn with_config(config: MachineConfig) -> Result<Self, TableError> {
        let mut registers = RegisterFile::new();
        registers.set_pc(config.initial_pc);
        registers.set_sp(config.initial_sp);
        Ok(Self {
            registers,
            memory: Memory::new(),
            table: OpcodeTable::shared()?,
            legality: LegalityValidator::shared()?,
        })
    }

    /// Reads the register file.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Mutable access to the register file.
    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }

    /// Reads memory.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Mutable access to memory, e.g. to subscribe observers.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Opcode table used by this machine.
    #[must_use]
    pub const fn table(&self) -> &'static OpcodeTable {
        self.table
    }

    /// Copies a program image into memory at `origin`.
    pub fn load(&mut self, origin: u16, image: &[u8]) {
        self.memory.load(origin, image);
    }

    /// Executes one instruction.
    ///
    /// # Errors
    ///
    /// Returns the [`ExecError`] raised by fetch, decode or execution.
    pub fn step(&mut self) -> Result<StepOutcome, ExecError> {
        let runner = CommandRunner::new(self.table, self.legality);
        if runner.run_next(&mut self.registers, &mut self.memory)? {
            Ok(StepOutcome::Halted)
        } else {
            Ok(StepOutcome::Continue)
        }
    }

    /// Steps until `HALT` or until `limit` instructions have executed.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExecError`]; steps before it stay applied.
    pub fn run_until_halt(&mut self, limit: RunLimit) -> Result<RunOutcome, ExecError> {
        let mut steps = 0;
        while steps < limit.max_steps {
            steps += 1;
            if self.step()? == StepOutcome::Halted {
                tracing::debug!(steps, pc = self.registers.pc(), "halted");
                return Ok(RunOutcome::Halted { steps });
            }
        }
        tracing::warn!(steps, "step limit reached before HALT");
        Ok(RunOutcome::StepLimit { steps })
    }

    /// Disassembles `count` instructions starting at `start`.
    #[must_use]
    pub fn disassemble(&self, start: u16, count: usize) -> Vec<DisassemblyRow> {
        disassemble(self.table, &self.memory, start, count)
    }
}

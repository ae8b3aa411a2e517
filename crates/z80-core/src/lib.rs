//! Z80 opcode tables, machine state and instruction execution.

/// Opcode identity, prefixes and instruction descriptors.
pub mod encoding;
pub use encoding::{
    mnemonic_shape, operand_widths, placeholders, InstructionDescriptor, Opcode, Placeholder,
    Prefix, TableForm,
};

/// Fault taxonomy for table loading and execution.
pub mod fault;
pub use fault::{ExecError, FaultClass, TableError};

/// The opcode table resource and lookup service.
pub mod table;
pub use table::{OpcodeTable, TableEntry, OPCODE_TABLE_ROWS};

/// Operand legality whitelist.
pub mod legality;
pub use legality::LegalityValidator;

/// Register file and flags.
pub mod state;
pub use state::{Flags, Reg16, Reg8, RegisterFile, REGISTER8_COUNT, SHADOW_REGISTER_COUNT};

/// Flat 64 KiB memory with change observers.
pub mod memory;
pub use memory::{
    new_address_space, ChangeCallback, Memory, MemoryChange, ObserverId, ADDRESS_SPACE_BYTES,
};

/// Instruction semantics.
pub mod execute;
pub use execute::{evaluate, parity_even, Condition, ExecutionEngine, Operand, ShiftOp};

/// Instruction text decoding.
pub mod decoder;
pub use decoder::{decode_text, Arg, ArgKind, Instruction, Mnemonic};

/// Mnemonic and argument-shape dispatch.
pub mod dispatch;
pub use dispatch::{DispatchTable, Handler};

/// Fetch and execute of the instruction at PC.
pub mod runner;
pub use runner::{fetch, substitute, CommandRunner, Fetched};

/// Text listings of memory.
pub mod disasm;
pub use disasm::{disassemble, DisassemblyRow};

/// Host-facing machine.
pub mod api;
pub use api::{Machine, MachineConfig, RunLimit, RunOutcome, StepOutcome, DEFAULT_MAX_STEPS};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;

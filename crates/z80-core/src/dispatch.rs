//! Dispatch from decoded instructions to execution-engine handlers.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::decoder::{Arg, ArgKind, Instruction, Mnemonic};
use crate::execute::{Condition, ExecutionEngine, Operand, ShiftOp};
use crate::fault::ExecError;
use crate::state::{Reg16, Reg8};

/// A handler runs one instruction form against the engine.
pub type Handler = fn(&mut ExecutionEngine<'_>, &[Arg]) -> Result<(), ExecError>;

/// Explicit `(mnemonic, argument shapes) -> handler` table.
pub struct DispatchTable {
    handlers: HashMap<(Mnemonic, Vec<ArgKind>), Handler>,
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

fn malformed() -> ExecError {
    ExecError::MalformedInstruction {
        instruction: "argument shape mismatch".to_string(),
    }
}

fn reg8(args: &[Arg], index: usize) -> Result<Reg8, ExecError> {
    match args.get(index) {
        Some(Arg::Reg8(reg)) => Ok(*reg),
        _ => Err(malformed()),
    }
}

fn reg16(args: &[Arg], index: usize) -> Result<Reg16, ExecError> {
    match args.get(index) {
        Some(Arg::Reg16(reg)) => Ok(*reg),
        _ => Err(malformed()),
    }
}

fn operand(args: &[Arg], index: usize) -> Result<Operand, ExecError> {
    match args.get(index) {
        Some(Arg::Operand(operand)) => Ok(*operand),
        _ => Err(malformed()),
    }
}

fn cond(args: &[Arg], index: usize) -> Result<Condition, ExecError> {
    match args.get(index) {
        Some(Arg::Cond(cond)) => Ok(*cond),
        _ => Err(malformed()),
    }
}

fn imm(args: &[Arg], index: usize) -> Result<i32, ExecError> {
    match args.get(index) {
        Some(Arg::Imm(value)) => Ok(*value),
        _ => Err(malformed()),
    }
}

fn address(args: &[Arg], index: usize) -> Result<u16, ExecError> {
    let value = imm(args, index)?;
    u16::try_from(value)
        .or_else(|_| i16::try_from(value).map(|v| u16::from_le_bytes(v.to_le_bytes())))
        .map_err(|_| malformed())
}

fn offset(args: &[Arg], index: usize) -> Result<i8, ExecError> {
    i8::try_from(imm(args, index)?).map_err(|_| malformed())
}

fn bit_number(args: &[Arg], index: usize) -> Result<u8, ExecError> {
    u8::try_from(imm(args, index)?).map_err(|_| malformed())
}

fn indirect_base(args: &[Arg], index: usize) -> Result<Reg16, ExecError> {
    match operand(args, index)? {
        Operand::MemoryIndexed { base, offset: 0 } => Ok(base),
        _ => Err(malformed()),
    }
}

macro_rules! unit {
    ($method:ident) => {
        |e, _| {
            e.$method();
            Ok(())
        }
    };
}

impl DispatchTable {
    /// Process-wide table, built on first use.
    #[must_use]
    pub fn shared() -> &'static Self {
        static TABLE: OnceLock<DispatchTable> = OnceLock::new();
        TABLE.get_or_init(Self::build)
    }

    /// Number of registered instruction forms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn register(&mut self, mnemonic: Mnemonic, kinds: &[ArgKind], handler: Handler) {
        self.handlers.insert((mnemonic, kinds.to_vec()), handler);
    }

    fn lookup(&self, mnemonic: Mnemonic, args: &[Arg]) -> Option<Handler> {
        let kinds = args.iter().map(Arg::kind).collect();
        self.handlers.get(&(mnemonic, kinds)).copied()
    }

    /// Runs `instruction` through its handler.
    ///
    /// When no handler matches and the trailing argument is a plain register
    /// or literal, the lookup is retried with it re-typed as an operand.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Unsupported`] when no handler exists, or the
    /// handler's own error.
    pub fn execute(
        &self,
        engine: &mut ExecutionEngine<'_>,
        instruction: &Instruction,
    ) -> Result<(), ExecError> {
        let unsupported = || ExecError::Unsupported {
            instruction: instruction.text.clone(),
        };
        if !instruction.mnemonic.is_supported() {
            return Err(unsupported());
        }
        if let Some(handler) = self.lookup(instruction.mnemonic, &instruction.args) {
            return handler(engine, &instruction.args);
        }
        let mut args = instruction.args.clone();
        let retyped = args.last().and_then(Arg::as_operand).ok_or_else(unsupported)?;
        if let Some(last) = args.last_mut() {
            *last = retyped;
        }
        let handler = self
            .lookup(instruction.mnemonic, &args)
            .ok_or_else(unsupported)?;
        handler(engine, &args)
    }

    #[allow(clippy::too_many_lines)]
    fn build() -> Self {
        use ArgKind::{Cond, Imm, Operand as Op, Reg16 as R16, Reg8 as R8, ShadowAf};
        use Mnemonic as M;

        let mut table = Self {
            handlers: HashMap::new(),
        };

        table.register(M::Nop, &[], unit!(nop));
        table.register(M::Halt, &[], unit!(halt));
        table.register(M::Di, &[], |_, _| Ok(()));
        table.register(M::Ei, &[], |_, _| Ok(()));
        table.register(M::Im, &[Imm], |_, _| Ok(()));

        table.register(M::Ld, &[R8, Op], |e, a| {
            e.ld8(Operand::Register8(reg8(a, 0)?), operand(a, 1)?)
        });
        table.register(M::Ld, &[Op, Op], |e, a| e.ld8(operand(a, 0)?, operand(a, 1)?));
        table.register(M::Ld, &[R16, Imm], |e, a| {
            e.ld16(reg16(a, 0)?, address(a, 1)?);
            Ok(())
        });
        table.register(M::Ld, &[R16, Op], |e, a| {
            e.ld16_indirect(Operand::Register16(reg16(a, 0)?), operand(a, 1)?)
        });
        table.register(M::Ld, &[Op, R16], |e, a| {
            e.ld16_indirect(operand(a, 0)?, Operand::Register16(reg16(a, 1)?))
        });
        table.register(M::Ld, &[R16, R16], |e, a| {
            e.ld16_register(reg16(a, 0)?, reg16(a, 1)?);
            Ok(())
        });

        table.register(M::Push, &[R16], |e, a| {
            e.push_reg(reg16(a, 0)?);
            Ok(())
        });
        table.register(M::Pop, &[R16], |e, a| {
            e.pop_reg(reg16(a, 0)?);
            Ok(())
        });
        table.register(M::Ex, &[R16, R16], |e, a| {
            match (reg16(a, 0)?, reg16(a, 1)?) {
                (Reg16::De, Reg16::Hl) => e.ex_de_hl(),
                _ => return Err(malformed()),
            }
            Ok(())
        });
        table.register(M::Ex, &[R16, ShadowAf], |e, a| {
            if reg16(a, 0)? != Reg16::Af {
                return Err(malformed());
            }
            e.ex_af();
            Ok(())
        });
        table.register(M::Ex, &[Op, R16], |e, a| {
            if indirect_base(a, 0)? != Reg16::Sp {
                return Err(malformed());
            }
            e.ex_sp(reg16(a, 1)?);
            Ok(())
        });
        table.register(M::Exx, &[], unit!(exx));

        table.register(M::Add, &[R8, Op], |e, a| e.add8(reg8(a, 0)?, operand(a, 1)?));
        table.register(M::Adc, &[R8, Op], |e, a| e.adc8(reg8(a, 0)?, operand(a, 1)?));
        table.register(M::Sbc, &[R8, Op], |e, a| e.sbc8(reg8(a, 0)?, operand(a, 1)?));
        table.register(M::Add, &[R16, R16], |e, a| e.add16(reg16(a, 0)?, reg16(a, 1)?));
        table.register(M::Adc, &[R16, R16], |e, a| e.adc16(reg16(a, 0)?, reg16(a, 1)?));
        table.register(M::Sbc, &[R16, R16], |e, a| e.sbc16(reg16(a, 0)?, reg16(a, 1)?));
        table.register(M::Sub, &[Op], |e, a| e.sub8(operand(a, 0)?));
        table.register(M::And, &[Op], |e, a| {
            e.and8(operand(a, 0)?);
            Ok(())
        });
        table.register(M::Or, &[Op], |e, a| {
            e.or8(operand(a, 0)?);
            Ok(())
        });
        table.register(M::Xor, &[Op], |e, a| {
            e.xor8(operand(a, 0)?);
            Ok(())
        });
        table.register(M::Cp, &[Op], |e, a| {
            e.cp8(operand(a, 0)?);
            Ok(())
        });
        table.register(M::Inc, &[Op], |e, a| e.inc8(operand(a, 0)?));
        table.register(M::Dec, &[Op], |e, a| e.dec8(operand(a, 0)?));
        table.register(M::Inc, &[R16], |e, a| e.inc16(reg16(a, 0)?));
        table.register(M::Dec, &[R16], |e, a| e.dec16(reg16(a, 0)?));

        let no_operand: [(Mnemonic, Handler); 16] = [
            (M::Rlca, unit!(rlca)),
            (M::Rrca, unit!(rrca)),
            (M::Rla, unit!(rla)),
            (M::Rra, unit!(rra)),
            (M::Daa, unit!(daa)),
            (M::Cpl, unit!(cpl)),
            (M::Neg, unit!(neg)),
            (M::Scf, unit!(scf)),
            (M::Ccf, unit!(ccf)),
            (M::Ldi, unit!(ldi)),
            (M::Ldd, unit!(ldd)),
            (M::Ldir, unit!(ldir)),
            (M::Lddr, unit!(lddr)),
            (M::Ret, unit!(ret)),
            (M::Reti, unit!(ret)),
            (M::Retn, unit!(ret)),
        ];
        for (mnemonic, handler) in no_operand {
            table.register(mnemonic, &[], handler);
        }

        let shifts: [(Mnemonic, Handler); 8] = [
            (M::Rlc, |e, a| e.shift(ShiftOp::Rlc, operand(a, 0)?)),
            (M::Rrc, |e, a| e.shift(ShiftOp::Rrc, operand(a, 0)?)),
            (M::Rl, |e, a| e.shift(ShiftOp::Rl, operand(a, 0)?)),
            (M::Rr, |e, a| e.shift(ShiftOp::Rr, operand(a, 0)?)),
            (M::Sla, |e, a| e.shift(ShiftOp::Sla, operand(a, 0)?)),
            (M::Sra, |e, a| e.shift(ShiftOp::Sra, operand(a, 0)?)),
            (M::Sll, |e, a| e.shift(ShiftOp::Sll, operand(a, 0)?)),
            (M::Srl, |e, a| e.shift(ShiftOp::Srl, operand(a, 0)?)),
        ];
        for (mnemonic, handler) in shifts {
            table.register(mnemonic, &[Op], handler);
        }
        table.register(M::Bit, &[Imm, Op], |e, a| e.bit(bit_number(a, 0)?, operand(a, 1)?));
        table.register(M::Set, &[Imm, Op], |e, a| {
            e.set_bit(bit_number(a, 0)?, operand(a, 1)?)
        });
        table.register(M::Res, &[Imm, Op], |e, a| {
            e.res_bit(bit_number(a, 0)?, operand(a, 1)?)
        });

        table.register(M::Jp, &[Imm], |e, a| {
            e.jp(address(a, 0)?);
            Ok(())
        });
        table.register(M::Jp, &[Cond, Imm], |e, a| {
            e.jp_cond(cond(a, 0)?, address(a, 1)?);
            Ok(())
        });
        table.register(M::Jp, &[Op], |e, a| {
            e.jp_indirect(indirect_base(a, 0)?);
            Ok(())
        });
        table.register(M::Jr, &[Imm], |e, a| e.jr(offset(a, 0)?));
        table.register(M::Jr, &[Cond, Imm], |e, a| e.jr_cond(cond(a, 0)?, offset(a, 1)?));
        table.register(M::Djnz, &[Imm], |e, a| e.djnz(offset(a, 0)?));
        table.register(M::Call, &[Imm], |e, a| {
            e.call(address(a, 0)?);
            Ok(())
        });
        table.register(M::Call, &[Cond, Imm], |e, a| {
            e.call_cond(cond(a, 0)?, address(a, 1)?);
            Ok(())
        });
        table.register(M::Ret, &[Cond], |e, a| {
            e.ret_cond(cond(a, 0)?);
            Ok(())
        });
        table.register(M::Rst, &[Imm], |e, a| e.rst(address(a, 0)?));

        tracing::debug!(forms = table.handlers.len(), "dispatch table built");
        table
    }
}

#[cfg(test)]
mod tests {
    use super::DispatchTable;
    use crate::decoder::decode_text;
    use crate::execute::test_support::Rig;
    use crate::fault::ExecError;
    use crate::state::{Reg16, Reg8};

    fn run(rig: &mut Rig, text: &str) -> Result<(), ExecError> {
        let instruction = decode_text(text)?;
        DispatchTable::shared().execute(&mut rig.engine(), &instruction)
    }

    #[test]
    fn direct_match_dispatches() {
        let mut rig = Rig::new();
        run(&mut rig, "LD BC,1000").unwrap();
        assert_eq!(rig.regs.get16(Reg16::Bc), 1000);
        run(&mut rig, "LD A,(HL)").unwrap();
    }

    #[test]
    fn trailing_register_falls_back_to_operand() {
        let mut rig = Rig::new();
        rig.regs.set8(Reg8::C, 7);
        run(&mut rig, "LD A,C").unwrap();
        assert_eq!(rig.regs.get8(Reg8::A), 7);
        run(&mut rig, "ADD A,C").unwrap();
        assert_eq!(rig.regs.get8(Reg8::A), 14);
    }

    #[test]
    fn trailing_literal_falls_back_to_operand() {
        let mut rig = Rig::new();
        rig.regs.set16(Reg16::Hl, 0x4000);
        run(&mut rig, "LD (HL),42").unwrap();
        assert_eq!(rig.memory.get(0x4000), 42);
        run(&mut rig, "SUB 2").unwrap();
        assert_eq!(rig.regs.get8(Reg8::A), 0xFE);
    }

    #[test]
    fn io_is_unsupported() {
        let mut rig = Rig::new();
        assert_eq!(
            run(&mut rig, "OUT (C),A"),
            Err(ExecError::Unsupported {
                instruction: "OUT (C),A".into()
            })
        );
        assert!(matches!(
            run(&mut rig, "RLD"),
            Err(ExecError::Unsupported { .. })
        ));
    }

    #[test]
    fn unknown_shape_is_unsupported() {
        let mut rig = Rig::new();
        assert!(matches!(
            run(&mut rig, "PUSH 5"),
            Err(ExecError::Unsupported { .. })
        ));
    }

    #[test]
    fn table_is_populated() {
        assert!(DispatchTable::shared().len() > 60);
    }
}

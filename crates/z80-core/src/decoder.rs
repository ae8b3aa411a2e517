//! Splits substituted instruction text into a mnemonic and typed arguments.

use std::fmt;

use crate::execute::{parse_number, Condition, Operand};
use crate::fault::ExecError;
use crate::state::{Reg16, Reg8};

macro_rules! mnemonics {
    ($($variant:ident => $name:literal,)+) => {
        /// Instruction name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[allow(missing_docs)]
        pub enum Mnemonic {
            $($variant,)+
        }

        impl Mnemonic {
            /// Every mnemonic in the opcode table.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Upper-case assembly name.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }
    };
}

mnemonics! {
    Adc => "ADC", Add => "ADD", And => "AND", Bit => "BIT", Call => "CALL",
    Ccf => "CCF", Cp => "CP", Cpd => "CPD", Cpdr => "CPDR", Cpi => "CPI",
    Cpir => "CPIR", Cpl => "CPL", Daa => "DAA", Dec => "DEC", Di => "DI",
    Djnz => "DJNZ", Ei => "EI", Ex => "EX", Exx => "EXX", Halt => "HALT",
    Im => "IM", In => "IN", Inc => "INC", Ind => "IND", Indr => "INDR",
    Ini => "INI", Inir => "INIR", Jp => "JP", Jr => "JR", Ld => "LD",
    Ldd => "LDD", Lddr => "LDDR", Ldi => "LDI", Ldir => "LDIR", Neg => "NEG",
    Nop => "NOP", Or => "OR", Otdr => "OTDR", Otir => "OTIR", Out => "OUT",
    Outd => "OUTD", Outi => "OUTI", Pop => "POP", Push => "PUSH", Res => "RES",
    Ret => "RET", Reti => "RETI", Retn => "RETN", Rl => "RL", Rla => "RLA",
    Rlc => "RLC", Rlca => "RLCA", Rld => "RLD", Rr => "RR", Rra => "RRA",
    Rrc => "RRC", Rrca => "RRCA", Rrd => "RRD", Rst => "RST", Sbc => "SBC",
    Scf => "SCF", Set => "SET", Sla => "SLA", Sll => "SLL", Sra => "SRA",
    Srl => "SRL", Sub => "SUB", Xor => "XOR",
}

impl Mnemonic {
    /// Parses an upper-case mnemonic.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.name() == name)
    }

    /// Port I/O, compare-block and nibble-rotate instructions have no
    /// execution semantics here.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(
            self,
            Self::In
                | Self::Ini
                | Self::Inir
                | Self::Ind
                | Self::Indr
                | Self::Out
                | Self::Outi
                | Self::Otir
                | Self::Outd
                | Self::Otdr
                | Self::Cpi
                | Self::Cpir
                | Self::Cpd
                | Self::Cpdr
                | Self::Rld
                | Self::Rrd
        )
    }

    const fn takes_condition(self, arg_count: usize) -> bool {
        match self {
            Self::Jp | Self::Jr | Self::Call => arg_count == 2,
            Self::Ret => arg_count == 1,
            _ => false,
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed instruction argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arg {
    /// Plain 8-bit register.
    Reg8(Reg8),
    /// Plain 16-bit register.
    Reg16(Reg16),
    /// `AF'`
    ShadowAf,
    /// Numeric literal.
    Imm(i32),
    /// Branch condition.
    Cond(Condition),
    /// Addressing-mode operand, e.g. `(HL)` or `(IX+5)`.
    Operand(Operand),
    /// I/O port, `(C)` or `(n)`.
    Port,
}

/// Shape of an [`Arg`], used as part of the dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ArgKind {
    Reg8,
    Reg16,
    ShadowAf,
    Imm,
    Cond,
    Operand,
    Port,
}

impl Arg {
    /// Shape of this argument.
    #[must_use]
    pub const fn kind(&self) -> ArgKind {
        match self {
            Self::Reg8(_) => ArgKind::Reg8,
            Self::Reg16(_) => ArgKind::Reg16,
            Self::ShadowAf => ArgKind::ShadowAf,
            Self::Imm(_) => ArgKind::Imm,
            Self::Cond(_) => ArgKind::Cond,
            Self::Operand(_) => ArgKind::Operand,
            Self::Port => ArgKind::Port,
        }
    }

    /// Re-types a plain register or byte literal as an addressing-mode operand.
    #[must_use]
    pub fn as_operand(&self) -> Option<Self> {
        match *self {
            Self::Reg8(reg) => Some(Self::Operand(Operand::Register8(reg))),
            Self::Imm(value) => {
                let byte = match value {
                    0..=0xFF => u8::try_from(value).ok()?,
                    -0x80..=-1 => i8::try_from(value).ok()?.to_le_bytes()[0],
                    _ => return None,
                };
                Some(Self::Operand(Operand::Immediate8(byte)))
            }
            _ => None,
        }
    }
}

/// Decoded instruction text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Instruction name.
    pub mnemonic: Mnemonic,
    /// Arguments in textual order.
    pub args: Vec<Arg>,
    /// Original upper-case text.
    pub text: String,
}

/// Decodes upper-case, placeholder-free instruction text such as
/// `LD (IX-5),10` or `JR NZ,-3`.
///
/// # Errors
///
/// Returns [`ExecError::MalformedInstruction`] for unknown mnemonics or
/// unparseable arguments.
pub fn decode_text(text: &str) -> Result<Instruction, ExecError> {
    let text = text.trim();
    let (name, rest) = text.split_once(' ').unwrap_or((text, ""));
    let mnemonic = Mnemonic::from_name(name).ok_or_else(|| ExecError::malformed(text))?;
    let tokens: Vec<&str> = if rest.trim().is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(str::trim).collect()
    };

    let args = tokens
        .iter()
        .enumerate()
        .map(|(index, token)| {
            parse_arg(mnemonic, token, index, tokens.len()).ok_or_else(|| ExecError::malformed(text))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Instruction {
        mnemonic,
        args,
        text: text.to_string(),
    })
}

fn parse_arg(mnemonic: Mnemonic, token: &str, index: usize, count: usize) -> Option<Arg> {
    if matches!(mnemonic, Mnemonic::In | Mnemonic::Out) && token.starts_with('(') {
        return Some(Arg::Port);
    }
    if token == "AF'" {
        return Some(Arg::ShadowAf);
    }
    if index == 0 && mnemonic.takes_condition(count) {
        return Condition::from_name(token).map(Arg::Cond);
    }
    if let Some(reg) = Reg8::from_name(token) {
        return Some(Arg::Reg8(reg));
    }
    if let Some(reg) = Reg16::from_name(token) {
        return Some(Arg::Reg16(reg));
    }
    if let Some(value) = parse_number(token) {
        return Some(Arg::Imm(value));
    }
    Operand::parse(token).map(Arg::Operand)
}

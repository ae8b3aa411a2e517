//! Instruction text normalisation into opcode-table lookup shapes.
//!
//! Assembly text such as `ld (ix-5), 100` is reduced to the shape the opcode
//! table indexes (`LD (IX+#),#`) while the literals it contained are kept
//! aside in textual order for the encoder.

use z80_core::execute::parse_number;
use z80_core::{Condition, Reg16, Reg8};

/// Wildcard that stands for one numeric literal in a lookup shape.
pub const LITERAL_WILDCARD: char = '#';

/// Instruction text reduced to a lookup shape plus its literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInstruction {
    /// Upper-case mnemonic.
    pub mnemonic: String,
    /// Lookup shape, e.g. `LD (IX+#),#`.
    pub shape: String,
    /// Literal values in textual order, one per wildcard.
    pub literals: Vec<i32>,
}

/// Returns the lookup shape of `cmd`.
///
/// Spaces are collapsed, operands are upper-cased and stripped of inner
/// whitespace, and every numeric literal becomes `#`. A negative index
/// displacement renders as `+#`. Bit numbers, `IM` modes and `RST` vectors
/// are part of the instruction and stay verbatim.
#[must_use]
pub fn normalize(cmd: &str) -> String {
    normalize_instruction(cmd).shape
}

/// Normalises `cmd` and keeps its literal values.
#[must_use]
pub fn normalize_instruction(cmd: &str) -> NormalizedInstruction {
    let cmd = cmd.trim();
    let (mnemonic, rest) = cmd
        .split_once(char::is_whitespace)
        .unwrap_or((cmd, ""));
    let mnemonic = mnemonic.to_ascii_uppercase();
    let operands: String = rest
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    let mut literals = Vec::new();
    let shaped: Vec<String> = if operands.is_empty() {
        Vec::new()
    } else {
        operands
            .split(',')
            .enumerate()
            .map(|(index, operand)| shape_operand(&mnemonic, index, operand, &mut literals))
            .collect()
    };

    let shape = if shaped.is_empty() {
        mnemonic.clone()
    } else {
        format!("{mnemonic} {}", shaped.join(","))
    };
    NormalizedInstruction {
        mnemonic,
        shape,
        literals,
    }
}

fn shape_operand(mnemonic: &str, index: usize, operand: &str, literals: &mut Vec<i32>) -> String {
    let fixed = mnemonic == "IM" || (index == 0 && matches!(mnemonic, "BIT" | "SET" | "RES"));
    if fixed {
        return operand.to_string();
    }
    if mnemonic == "OUT" && index == 1 && literal(operand) == Some(0) {
        return "0".to_string();
    }
    if mnemonic == "RST" {
        return literal(operand).map_or_else(|| operand.to_string(), |v| format!("{v:02X}H"));
    }

    if let Some(inner) = operand
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        if let Some(value) = literal(inner) {
            literals.push(value);
            return format!("({LITERAL_WILDCARD})");
        }
        if let Some((base, value)) = split_index(inner) {
            literals.push(value);
            return format!("({base}+{LITERAL_WILDCARD})");
        }
        return operand.to_string();
    }

    literal(operand).map_or_else(
        || operand.to_string(),
        |value| {
            literals.push(value);
            LITERAL_WILDCARD.to_string()
        },
    )
}

/// Splits `IX+5` / `IY-3` into the base register and signed displacement.
fn split_index(inner: &str) -> Option<(&str, i32)> {
    let base = inner.get(..2)?;
    if base != "IX" && base != "IY" {
        return None;
    }
    let expr = &inner[2..];
    if !expr.starts_with(['+', '-']) {
        return None;
    }
    literal(expr).map(|value| (base, value))
}

/// Parses a numeric literal that starts with a digit after an optional sign.
///
/// Identifiers such as `ABH` are never numbers, even though they are valid hex.
#[must_use]
pub fn literal(text: &str) -> Option<i32> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.starts_with(|c: char| c.is_ascii_digit()) {
        parse_number(text)
    } else {
        None
    }
}

/// Returns `true` for register and condition names, which can never be labels.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    Reg8::from_name(&upper).is_some()
        || Reg16::from_name(&upper).is_some()
        || Condition::from_name(&upper).is_some()
}

/// Returns `true` if `name` can be used as a label.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '.')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Rewrites every identifier in `operands` through `replace`.
///
/// Numbers (runs starting with a digit) are copied untouched, so hex
/// literals such as `0FFH` are never mistaken for names.
pub fn map_identifiers(operands: &str, mut replace: impl FnMut(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(operands.len());
    let mut rest = operands;
    while let Some(c) = rest.chars().next() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
            let end = rest
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'))
                .unwrap_or(rest.len());
            let token = &rest[..end];
            if c.is_ascii_digit() {
                out.push_str(token);
            } else {
                match replace(token) {
                    Some(substitute) => out.push_str(&substitute),
                    None => out.push_str(token),
                }
            }
            rest = &rest[end..];
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    out
}

//! Operand-combination whitelist for the arithmetic families.

use std::collections::HashSet;
use std::sync::OnceLock;

use crate::fault::{ExecError, TableError};

const WHITELIST_SOURCE: &str = include_str!("../data/legal_operands.txt");

/// Case-insensitive set of permitted `"<name> <op1>[,<op2>]"` combinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalityValidator {
    allowed: HashSet<String>,
}

impl LegalityValidator {
    /// Parses the embedded whitelist.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::EmptyWhitelist`] if the resource has no entries.
    pub fn load() -> Result<Self, TableError> {
        Self::parse(WHITELIST_SOURCE)
    }

    /// Process-wide whitelist, parsed on first use.
    ///
    /// # Errors
    ///
    /// Returns the load error if the resource is empty.
    pub fn shared() -> Result<&'static Self, TableError> {
        static VALIDATOR: OnceLock<Result<LegalityValidator, TableError>> = OnceLock::new();
        VALIDATOR
            .get_or_init(Self::load)
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Parses one combination per line; blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::EmptyWhitelist`] if no line carries an entry.
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let allowed: HashSet<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
        if allowed.is_empty() {
            return Err(TableError::EmptyWhitelist);
        }
        tracing::debug!(entries = allowed.len(), "operand whitelist loaded");
        Ok(Self { allowed })
    }

    /// Number of permitted combinations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    /// Returns true if nothing is permitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Checks a combination such as `("add", "a", Some("(ix+d)"))`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::IllegalOperands`] carrying the rejected key.
    pub fn ensure_valid(
        &self,
        instruction: &str,
        first: &str,
        second: Option<&str>,
    ) -> Result<(), ExecError> {
        let key = second.map_or_else(
            || format!("{instruction} {first}"),
            |second| format!("{instruction} {first},{second}"),
        );
        let key = key.to_ascii_lowercase();
        if self.allowed.contains(&key) {
            Ok(())
        } else {
            Err(ExecError::IllegalOperands { instruction: key })
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::LegalityValidator;
    use crate::fault::{ExecError, TableError};

    fn validator() -> &'static LegalityValidator {
        LegalityValidator::shared().expect("embedded whitelist loads")
    }

    #[rstest]
    #[case("add", "a", Some("b"))]
    #[case("ADD", "A", Some("(IX+d)"))]
    #[case("add", "hl", Some("sp"))]
    #[case("add", "ix", Some("ix"))]
    #[case("adc", "hl", Some("bc"))]
    #[case("sub", "n", None)]
    #[case("inc", "(hl)", None)]
    #[case("dec", "a", None)]
    fn accepts_documented_combinations(
        #[case] name: &str,
        #[case] first: &str,
        #[case] second: Option<&str>,
    ) {
        assert_eq!(validator().ensure_valid(name, first, second), Ok(()));
    }

    #[rstest]
    #[case("add", "ix", Some("hl"))]
    #[case("add", "b", Some("c"))]
    #[case("adc", "ix", Some("bc"))]
    #[case("inc", "n", None)]
    fn rejects_other_combinations(
        #[case] name: &str,
        #[case] first: &str,
        #[case] second: Option<&str>,
    ) {
        assert!(matches!(
            validator().ensure_valid(name, first, second),
            Err(ExecError::IllegalOperands { .. })
        ));
    }

    #[test]
    fn rejected_key_is_reported() {
        assert_eq!(
            validator().ensure_valid("ADD", "IX", Some("HL")),
            Err(ExecError::IllegalOperands {
                instruction: "add ix,hl".into()
            })
        );
    }

    #[test]
    fn empty_resource_is_an_error() {
        assert_eq!(
            LegalityValidator::parse("\n  \n"),
            Err(TableError::EmptyWhitelist)
        );
    }
}

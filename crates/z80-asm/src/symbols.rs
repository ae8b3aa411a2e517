//! Label table for one program parse.
//!
//! Labels are harvested before addresses are known, so each starts at a
//! placeholder address of 0 and is assigned its real address once the
//! address pass reaches the defining line.

use std::collections::BTreeMap;

use crate::errors::AsmError;
use crate::mnemonic::{is_identifier, is_reserved};

/// A label definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    /// Assigned address (0 until the address pass defines it).
    pub address: u16,
    /// Source line of the definition.
    pub defined_at: usize,
}

/// Label name to address mapping. Names are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    labels: BTreeMap<String, Label>,
}

impl LabelTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name` with a placeholder address.
    ///
    /// # Errors
    ///
    /// Returns [`AsmError::InvalidLabel`] for register, condition and
    /// non-identifier names, and [`AsmError::DuplicateLabel`] if `name` was
    /// already harvested.
    pub fn harvest(&mut self, name: &str, line: usize) -> Result<(), AsmError> {
        if !is_identifier(name) || is_reserved(name) {
            return Err(AsmError::InvalidLabel {
                line,
                name: name.to_string(),
            });
        }
        if let Some(existing) = self.labels.get(name) {
            return Err(AsmError::DuplicateLabel {
                line,
                name: name.to_string(),
                first_line: existing.defined_at,
            });
        }
        self.labels.insert(
            name.to_string(),
            Label {
                address: 0,
                defined_at: line,
            },
        );
        Ok(())
    }

    /// Overwrites the placeholder address of a harvested label.
    ///
    /// Returns `false` if `name` was never harvested.
    pub fn define(&mut self, name: &str, address: u16) -> bool {
        self.labels.get_mut(name).is_some_and(|label| {
            label.address = address;
            true
        })
    }

    /// Address of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AsmError::UndefinedLabel`] if `name` is not in the table.
    pub fn resolve(&self, name: &str, line: usize) -> Result<u16, AsmError> {
        self.labels
            .get(name)
            .map(|label| label.address)
            .ok_or_else(|| AsmError::UndefinedLabel {
                line,
                name: name.to_string(),
            })
    }

    /// Returns `true` if `name` is a harvested label.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    /// Looks up a label definition.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Label> {
        self.labels.get(name)
    }

    /// Number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if no labels were defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Label)> {
        self.labels.iter().map(|(name, label)| (name.as_str(), label))
    }
}

#[cfg(test)]
mod tests {
    use super::LabelTable;
    use crate::errors::AsmError;

    #[test]
    fn harvested_labels_start_at_zero() {
        let mut labels = LabelTable::new();
        labels.harvest("Loop", 3).unwrap();
        assert_eq!(labels.resolve("Loop", 1), Ok(0));
        assert!(labels.define("Loop", 0x20));
        assert_eq!(labels.resolve("Loop", 1), Ok(0x20));
        assert_eq!(labels.get("Loop").unwrap().defined_at, 3);
    }

    #[test]
    fn second_definition_is_rejected() {
        let mut labels = LabelTable::new();
        labels.harvest("Start", 1).unwrap();
        assert_eq!(
            labels.harvest("Start", 5),
            Err(AsmError::DuplicateLabel {
                line: 5,
                name: "Start".into(),
                first_line: 1
            })
        );
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut labels = LabelTable::new();
        labels.harvest("loop", 1).unwrap();
        labels.harvest("Loop", 2).unwrap();
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn register_names_cannot_be_labels() {
        let mut labels = LabelTable::new();
        assert!(matches!(
            labels.harvest("hl", 1),
            Err(AsmError::InvalidLabel { .. })
        ));
        assert!(matches!(
            labels.harvest("9lives", 1),
            Err(AsmError::InvalidLabel { .. })
        ));
        assert!(labels.is_empty());
    }

    #[test]
    fn unknown_labels_fail_to_resolve() {
        let mut labels = LabelTable::new();
        assert_eq!(
            labels.resolve("Missing", 7),
            Err(AsmError::UndefinedLabel {
                line: 7,
                name: "Missing".into()
            })
        );
        assert!(!labels.define("Missing", 1));
    }
}

//! Source ingestion: comments, blank lines and label prefixes.

/// One non-blank source line split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// 1-indexed line number in the original text.
    pub line: usize,
    /// Label defined by a `name:` prefix.
    pub label: Option<String>,
    /// Instruction text after the label, if any.
    pub instruction: Option<String>,
}

/// Splits program text into statements.
///
/// Everything after `;` is a comment. Lines that are empty once comments
/// are removed produce no statement.
#[must_use]
pub fn statements(content: &str) -> Vec<Statement> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let text = raw.split_once(';').map_or(raw, |(code, _)| code).trim();
            if text.is_empty() {
                return None;
            }
            let (label, rest) = split_label(text);
            let instruction = Some(rest.trim()).filter(|s| !s.is_empty());
            Some(Statement {
                line: idx + 1,
                label: label.map(str::to_string),
                instruction: instruction.map(str::to_string),
            })
        })
        .collect()
}

/// Splits a leading `name:` off `text`.
///
/// The colon must come before any whitespace so that operands are never
/// mistaken for labels.
fn split_label(text: &str) -> (Option<&str>, &str) {
    let head_end = text.find(char::is_whitespace).unwrap_or(text.len());
    match text[..head_end].find(':') {
        Some(colon) => (Some(&text[..colon]), &text[colon + 1..]),
        None => (None, text),
    }
}

#[cfg(test)]
mod tests {
    use super::{statements, Statement};

    #[test]
    fn blank_lines_and_comments_are_dropped() {
        let parsed = statements("; header\n\n  NOP ; idle\n\t\n");
        assert_eq!(
            parsed,
            vec![Statement {
                line: 3,
                label: None,
                instruction: Some("NOP".into()),
            }]
        );
    }

    #[test]
    fn labels_split_from_instructions() {
        let parsed = statements("JumpTo: INC C\nDone:\nloop:DJNZ loop");
        assert_eq!(parsed[0].label.as_deref(), Some("JumpTo"));
        assert_eq!(parsed[0].instruction.as_deref(), Some("INC C"));
        assert_eq!(parsed[1].label.as_deref(), Some("Done"));
        assert_eq!(parsed[1].instruction, None);
        assert_eq!(parsed[2].label.as_deref(), Some("loop"));
        assert_eq!(parsed[2].instruction.as_deref(), Some("DJNZ loop"));
    }

    #[test]
    fn shadow_register_apostrophe_is_not_a_label() {
        let parsed = statements("EX AF,AF'");
        assert_eq!(parsed[0].label, None);
    }

    #[test]
    fn empty_source_has_no_statements() {
        assert!(statements("").is_empty());
    }
}

//! `$(name.path)` expansion inside words.

use crate::env::Environment;
use crate::error::AccessError;

/// The expanded text and the first lookup that failed, if any.
///
/// Failed references stay in the text verbatim; the others are expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub text: String,
    pub error: Option<AccessError>,
}

impl Expansion {
    pub fn into_result(self) -> Result<String, AccessError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.text),
        }
    }
}

/// Replace every `$(name[.segment...])` in `word` with the string form of the
/// value it points to.
pub fn substitute(env: &mut Environment<'_>, word: &str) -> Expansion {
    let mut text = String::with_capacity(word.len());
    let mut error = None;
    let mut rest = word;

    while let Some(start) = rest.find("$(") {
        text.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let name_len = after
            .find(|c: char| !is_reference_char(c))
            .unwrap_or(after.len());

        if name_len == 0 || !after[name_len..].starts_with(')') {
            text.push_str("$(");
            rest = after;
            continue;
        }

        let reference = &after[..name_len];
        match env.read(reference) {
            Ok(value) => text.push_str(&value.to_string()),
            Err(err) => {
                tracing::trace!(reference, %err, "substitution failed");
                text.push_str(&rest[start..start + 2 + name_len + 1]);
                if error.is_none() {
                    error = Some(err);
                }
            }
        }
        rest = &after[name_len + 1..];
    }
    text.push_str(rest);

    Expansion { text, error }
}

fn is_reference_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

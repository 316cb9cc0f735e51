use std::fmt;

/// Length of a code line once spaces are removed.
pub const CODE_LENGTH: usize = 52;

/// A recognized line of exactly [`CODE_LENGTH`] non-space characters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedCode(String);

impl ExtractedCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtractedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Removes every space character. Other whitespace is kept.
pub fn strip_spaces(line: &str) -> String {
    line.replace(' ', "")
}

/// Finds the code in recognized text.
///
/// Every line whose stripped length is exactly [`CODE_LENGTH`] replaces the
/// previous match, so the last qualifying line wins.
pub fn extract_code(text: &str) -> Option<ExtractedCode> {
    let mut found = None;

    for line in text.split('\n') {
        let stripped = strip_spaces(line);
        if stripped.chars().count() == CODE_LENGTH {
            log::info!("Code line: {}", stripped);
            found = Some(ExtractedCode(stripped));
        }
    }

    found
}

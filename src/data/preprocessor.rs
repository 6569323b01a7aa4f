// ============================================================
// Layer 4 — Input Preprocessor
// ============================================================
// Cleans the raw sentence before tokenisation. Command lines
// and copy-pasted text carry invisible characters that would
// otherwise become junk tokens:
//   - Non-breaking spaces (U+00A0)
//   - Zero-width spaces (U+200B) and byte order marks
//   - Tabs, carriage returns, stray newlines
//
// The input is a single sentence, so all whitespace (including
// line breaks) collapses to single spaces and the result is
// trimmed. An output of "" means the input was blank.

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Normalise a raw input line: map whitespace variants and
    /// control characters to spaces, collapse runs, trim ends.
    pub fn clean(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        // Start true so leading whitespace never emits a space
        let mut last_space = true;

        for c in text.chars() {
            let is_space = match c {
                '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => true,
                c if c.is_whitespace() => true,
                c if c.is_control() => true,
                _ => false,
            };
            if is_space {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        // A single trailing space can remain when the input ends
        // with whitespace
        if out.ends_with(' ') {
            out.pop();
        }
        out
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

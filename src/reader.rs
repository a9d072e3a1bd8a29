//! Incremental form balancer for line-oriented input.
//!
//! The REPL appends characters as they arrive and only hands a chunk to the
//! lexer once a complete top-level form has accumulated. Parens inside
//! string literals do not count toward the balance, so `"("` never wedges
//! the prompt.

use crate::error::Error;

#[derive(Debug, Default)]
pub struct Reader {
    buffer: String,
}

impl Reader {
    pub fn new() -> Self {
        Self { buffer: String::new() }
    }

    /// A reader preloaded with the given chunks of source, in order.
    pub fn with_forms(forms: &[&str]) -> Self {
        let mut reader = Self::new();
        for form in forms {
            reader.append(form);
            reader.append("\n");
        }
        reader
    }

    /// Concatenates new input onto the internal buffer.
    pub fn append(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// True when the running count of `(` equals `)`, ignoring characters
    /// inside string literals.
    pub fn is_balanced(&self) -> bool {
        let mut opens = 0usize;
        let mut closes = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for c in self.buffer.chars() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' if in_string => escaped = true,
                '"' => in_string = !in_string,
                '(' if !in_string => opens += 1,
                ')' if !in_string => closes += 1,
                _ => {}
            }
        }

        opens == closes
    }

    /// Returns the smallest prefix of the buffer holding one balanced form,
    /// trimmed of surrounding whitespace, and consumes it. `Ok(None)` when
    /// the buffer holds nothing but whitespace; an error when it holds
    /// unmatched opens.
    pub fn next_form(&mut self) -> Result<Option<String>, Error> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let mut opens = 0usize;
        let mut closes = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        let mut end = self.buffer.len();

        for (index, c) in self.buffer.char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' if in_string => escaped = true,
                '"' => in_string = !in_string,
                '(' if !in_string => opens += 1,
                ')' if !in_string => closes += 1,
                _ => {}
            }

            if opens > 0 && opens == closes && !in_string {
                end = index + c.len_utf8();
                break;
            }
        }

        let form: String = self.buffer.drain(..end).collect();

        if opens != closes {
            return Err(Error::ReadError(
                "incomplete form (missing parens)".to_string(),
            ));
        }

        let trimmed = form.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        Ok(Some(trimmed.to_string()))
    }

    /// Drains the buffer into a sequence of complete forms.
    pub fn all_forms(&mut self) -> Result<Vec<String>, Error> {
        let mut forms = Vec::new();
        while let Some(form) = self.next_form()? {
            forms.push(form);
        }
        Ok(forms)
    }
}

use std::fmt;

/// Every layer of the pipeline reports failures through this one enum.
/// Errors carry a human-readable diagnostic and propagate upward to the
/// nearest driver (REPL or script runner); there is no in-language handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Unterminated string or malformed token.
    LexError(String),
    /// `next_form` called on a buffer with unmatched opens.
    ReadError(String),
    /// Unexpected token while building the expression tree.
    ParseError(String),
    /// Unknown symbol at evaluation time.
    LookupError(String),
    /// Wrong argument count to a user or primitive function.
    ArityError(String),
    /// Argument tag mismatch at a primitive or special form.
    TypeError(String),
    /// Valid types, invalid values (mod by zero, bad substr bounds, ...).
    DomainError(String),
    /// File not found, permission denied, closed-handle read.
    IOError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::LexError(msg) => write!(f, "lex error: {}", msg),
            Error::ReadError(msg) => write!(f, "read error: {}", msg),
            Error::ParseError(msg) => write!(f, "parse error: {}", msg),
            Error::LookupError(sym) => {
                write!(f, "value not found for '{}'", sym)
            }
            Error::ArityError(msg) => write!(f, "arity error: {}", msg),
            Error::TypeError(msg) => write!(f, "type error: {}", msg),
            Error::DomainError(msg) => write!(f, "domain error: {}", msg),
            Error::IOError(msg) => write!(f, "i/o error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_error_names_the_symbol() {
        let err = Error::LookupError("frobnicate".to_string());
        assert_eq!(err.to_string(), "value not found for 'frobnicate'");
    }

    #[test]
    fn categories_keep_their_prefix() {
        assert!(Error::LexError("x".into()).to_string().starts_with("lex"));
        assert!(Error::IOError("x".into()).to_string().starts_with("i/o"));
    }
}

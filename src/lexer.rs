//! Tokenizer: source text to a flat token stream.
//!
//! Lexing is split in two: a logos-derived raw layer that knows about
//! delimiters, strings, quotes and "words", and a promotion pass that turns
//! each word into an integer, a float, or a symbol. Commas count as
//! whitespace. String contents are kept raw, escape sequences and all, so a
//! pattern like `"\s+"` survives untouched all the way to the regex engine.
//!
//! Parenthesis balancing is not this layer's job; the [`crate::reader`]
//! handles that on the raw character stream.

use logos::Logos;
use std::fmt;

use crate::error::Error;

#[derive(Logos, Debug, PartialEq, Clone)]
enum RawToken {
    // Whitespace and commas are interchangeable separators.
    #[regex(r"[ \t\r\n,]+", logos::skip)]
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    // A quote only acts as a reader macro at a word boundary; the word
    // pattern below swallows apostrophes appearing mid-word.
    #[token("'")]
    Quote,

    // A string literal with support for escaped characters. The callback
    // strips the surrounding quotes but performs no unescaping.
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let slice = lex.slice();
        slice[1..slice.len() - 1].to_owned()
    })]
    Str(String),

    // A `"` that runs to end of input without a closing quote. Must stay
    // lower priority than the terminated rule above.
    #[regex(r#""([^"\\]|\\.)*"#, priority = 0)]
    UnterminatedStr,

    // Everything else accumulates into a word; the first character may not
    // be an apostrophe but later ones may.
    #[regex(r#"[^ \t\r\n,()'"][^ \t\r\n,()"]*"#, |lex| lex.slice().to_owned())]
    Word(String),
}

/// The token kinds the parser consumes.
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    OpenParen,
    CloseParen,
    Symbol(String),
    Str(String),
    Int(i64),
    Float(f64),
    Quote,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::OpenParen => write!(f, "("),
            Token::CloseParen => write!(f, ")"),
            Token::Symbol(name) => write!(f, "{}", name),
            Token::Str(text) => write!(f, "\"{}\"", text),
            Token::Int(value) => write!(f, "{}", value),
            Token::Float(value) => write!(f, "{}", value),
            Token::Quote => write!(f, "'"),
        }
    }
}

/// Promotes a word to the most specific numeric kind it parses as.
fn promote(word: String) -> Token {
    if let Ok(int) = word.parse::<i64>() {
        return Token::Int(int);
    }
    if looks_numeric(&word) {
        if let Ok(float) = word.parse::<f64>() {
            return Token::Float(float);
        }
    }
    Token::Symbol(word)
}

// `f64::from_str` accepts words like `inf` and `NaN`; restrict promotion to
// lexemes that start the way a decimal number does.
fn looks_numeric(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some('-') | Some('+') => {
            matches!(chars.next(), Some(c) if c.is_ascii_digit() || c == '.')
        }
        Some(c) => c.is_ascii_digit() || c == '.',
        None => false,
    }
}

/// Scans `source` left to right into tokens, or fails with a lexical error.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Error> {
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(raw) = lexer.next() {
        match raw {
            Ok(RawToken::LParen) => tokens.push(Token::OpenParen),
            Ok(RawToken::RParen) => tokens.push(Token::CloseParen),
            Ok(RawToken::Quote) => tokens.push(Token::Quote),
            Ok(RawToken::Str(contents)) => tokens.push(Token::Str(contents)),
            Ok(RawToken::Word(word)) => tokens.push(promote(word)),
            Ok(RawToken::UnterminatedStr) => {
                return Err(Error::LexError(
                    "unterminated string literal".to_string(),
                ));
            }
            Err(()) => {
                return Err(Error::LexError(format!(
                    "malformed token at byte {}",
                    lexer.span().start
                )));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_a_simple_form() {
        let tokens = tokenize("(+ 1 2)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::OpenParen,
                Token::Symbol("+".to_string()),
                Token::Int(1),
                Token::Int(2),
                Token::CloseParen,
            ]
        );
    }

    #[test]
    fn commas_are_whitespace() {
        let tokens = tokenize("(list 1, 2, 3)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::OpenParen,
                Token::Symbol("list".to_string()),
                Token::Int(1),
                Token::Int(2),
                Token::Int(3),
                Token::CloseParen,
            ]
        );
    }

    #[test]
    fn numbers_are_promoted() {
        let tokens = tokenize("42 -17 3.25 -0.5 1e3").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Int(42),
                Token::Int(-17),
                Token::Float(3.25),
                Token::Float(-0.5),
                Token::Float(1000.0),
            ]
        );
    }

    #[test]
    fn words_that_fail_numeric_parse_stay_symbols() {
        let tokens = tokenize("x1 even? - 1+ inf nan").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Symbol("x1".to_string()),
                Token::Symbol("even?".to_string()),
                Token::Symbol("-".to_string()),
                Token::Symbol("1+".to_string()),
                Token::Symbol("inf".to_string()),
                Token::Symbol("nan".to_string()),
            ]
        );
    }

    #[test]
    fn strings_keep_raw_contents() {
        let tokens = tokenize(r#"("a b" "\s+" "say \"hi\"")"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::OpenParen,
                Token::Str("a b".to_string()),
                Token::Str(r"\s+".to_string()),
                Token::Str(r#"say \"hi\""#.to_string()),
                Token::CloseParen,
            ]
        );
    }

    #[test]
    fn strings_are_not_reclassified_as_numbers() {
        let tokens = tokenize(r#""42""#).unwrap();
        assert_eq!(tokens, vec![Token::Str("42".to_string())]);
    }

    #[test]
    fn quote_at_word_boundary_is_a_token() {
        let tokens = tokenize("'sym").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Quote, Token::Symbol("sym".to_string())]
        );
    }

    #[test]
    fn quote_inside_a_word_is_part_of_it() {
        let tokens = tokenize("don't").unwrap();
        assert_eq!(tokens, vec![Token::Symbol("don't".to_string())]);
    }

    #[test]
    fn unterminated_string_is_a_lex_error() {
        let result = tokenize(r#""oops"#);
        assert_eq!(
            result,
            Err(Error::LexError("unterminated string literal".to_string()))
        );
    }
}

//! Recursive-descent parser: tokens to an expression tree.
//!
//! ```text
//! form  := atom | list | quote
//! atom  := SYMBOL | STRING | INTEGER | FLOAT
//! list  := OPEN_PAREN form* CLOSE_PAREN
//! quote := QUOTE form
//! ```

use crate::error::Error;
use crate::expr::Expression;
use crate::lexer::Token;
use crate::list::List;

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, position: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Result<&Token, Error> {
        let token = self.tokens.get(self.position).ok_or_else(|| {
            Error::ParseError("unexpected end of input".to_string())
        })?;
        self.position += 1;
        Ok(token)
    }

    /// Parses a single form.
    pub fn parse(&mut self) -> Result<Expression, Error> {
        self.parse_form()
    }

    /// Parses every form in the token stream.
    pub fn parse_all(&mut self) -> Result<Vec<Expression>, Error> {
        let mut forms = Vec::new();
        while self.peek().is_some() {
            forms.push(self.parse_form()?);
        }
        Ok(forms)
    }

    fn parse_form(&mut self) -> Result<Expression, Error> {
        let token = self.next()?.clone();
        match token {
            Token::OpenParen => self.parse_list(),
            Token::Quote => Ok(Expression::quote(self.parse_form()?)),
            Token::Symbol(name) => Ok(Expression::symbol(name)),
            Token::Str(text) => Ok(Expression::string(text)),
            Token::Int(value) => Ok(Expression::int(value)),
            Token::Float(value) => Ok(Expression::float(value)),
            token @ Token::CloseParen => Err(Error::ParseError(format!(
                "unexpected token '{}'",
                token
            ))),
        }
    }

    fn parse_list(&mut self) -> Result<Expression, Error> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(Token::CloseParen) => {
                    self.position += 1;
                    return Ok(Expression::list(items.into_iter().collect::<List>()));
                }
                Some(_) => items.push(self.parse_form()?),
                None => {
                    return Err(Error::ParseError(
                        "unexpected end of input inside list".to_string(),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_one(source: &str) -> Expression {
        Parser::new(tokenize(source).unwrap()).parse().unwrap()
    }

    #[test]
    fn parses_atoms() {
        assert_eq!(parse_one("42").to_string(), "42");
        assert_eq!(parse_one("2.5").to_string(), "2.5");
        assert_eq!(parse_one("sym").to_string(), "sym");
        assert_eq!(parse_one(r#""text""#).to_string(), "\"text\"");
    }

    #[test]
    fn parses_nested_lists() {
        let expr = parse_one("(a (b c) d)");
        assert_eq!(expr.to_string(), "(a (b c) d)");
        let items = expr.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.tail().head().unwrap().is_list());
    }

    #[test]
    fn parses_empty_list() {
        let expr = parse_one("()");
        assert!(expr.as_list().unwrap().is_empty());
    }

    #[test]
    fn quote_wraps_the_next_form() {
        let expr = parse_one("'(1 2)");
        match &expr.kind {
            crate::expr::ExprKind::Quote(inner) => {
                assert_eq!(inner.to_string(), "(1 2)");
            }
            other => panic!("expected quote, got {:?}", other),
        }
    }

    #[test]
    fn stray_close_paren_is_a_parse_error() {
        let result = Parser::new(tokenize(")").unwrap()).parse();
        assert!(matches!(result, Err(Error::ParseError(_))));
    }

    #[test]
    fn unclosed_list_is_a_parse_error() {
        let result = Parser::new(tokenize("(1 2").unwrap()).parse();
        assert!(matches!(result, Err(Error::ParseError(_))));
    }

    #[test]
    fn parse_all_reads_every_top_level_form() {
        let forms = Parser::new(tokenize("(a) 42 (b)").unwrap())
            .parse_all()
            .unwrap();
        assert_eq!(forms.len(), 3);
        assert_eq!(forms[1].to_string(), "42");
    }
}

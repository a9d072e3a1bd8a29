//! The embedding facade: construct an interpreter, feed it forms, get
//! values back. Hosts that embed the library drive this type directly; the
//! REPL and the script runner are thin wrappers around it.

use crate::core::CORE;
use crate::env::Environment;
use crate::error::Error;
use crate::eval::TcoEvaluator;
use crate::eval_naive::NaiveEvaluator;
use crate::expr::Expression;
use crate::lexer::tokenize;
use crate::parser::Parser;
use crate::reader::Reader;

/// Which evaluator drives this interpreter. `Tco` is the canonical
/// trampolined walker; `Naive` is the recursive variant kept for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Tco,
    Naive,
}

pub struct Interpreter {
    mode: Mode,
    env: Environment,
    tco: TcoEvaluator,
    naive: NaiveEvaluator,
}

impl Interpreter {
    /// An interpreter with an empty argument list, for the REPL and for
    /// embedding.
    pub fn new(mode: Mode) -> Self {
        Self::with_args(mode, Vec::new())
    }

    /// An interpreter for scripts; `args` become the `*args*` binding.
    pub fn with_args(mode: Mode, args: Vec<String>) -> Self {
        Self {
            mode,
            env: Environment::with_args(args),
            tco: TcoEvaluator::new(),
            naive: NaiveEvaluator::new(),
        }
    }

    /// Loads the core library into the global environment. Drivers call
    /// this before evaluating any user code.
    pub fn load_core(&mut self) -> Result<(), Error> {
        let mut reader = Reader::new();
        reader.append(CORE);
        self.run(&mut reader)?;
        Ok(())
    }

    /// Tokenizes, parses, and evaluates one form string. Extra top-level
    /// forms in the same string are evaluated in order; the last value
    /// wins.
    pub fn execute(&mut self, form: &str) -> Result<Expression, Error> {
        let tokens = tokenize(form)?;
        let forms = Parser::new(tokens).parse_all()?;

        let mut result = Expression::nil();
        for form in &forms {
            result = self.eval(form)?;
        }
        Ok(result)
    }

    /// Drains a reader and evaluates its forms in order, returning the
    /// value of the last one.
    pub fn run(&mut self, reader: &mut Reader) -> Result<Expression, Error> {
        let mut result = Expression::nil();
        for form in reader.all_forms()? {
            result = self.execute(&form)?;
        }
        Ok(result)
    }

    /// Pre-seeds the environment with a string binding.
    pub fn set_env(&mut self, key: &str, value: &str) {
        self.env.set(key, Expression::string(value));
    }

    /// Binds the build identity as `*haki-version*`, `*haki-git-commit*`,
    /// and `*haki-build-date*`.
    pub fn set_version_info(&mut self, version: &str, commit: &str, date: &str) {
        self.set_env("*haki-version*", version);
        self.set_env("*haki-git-commit*", commit);
        self.set_env("*haki-build-date*", date);
    }

    pub fn eval(&mut self, expr: &Expression) -> Result<Expression, Error> {
        match self.mode {
            Mode::Tco => self.tco.eval(&self.env, expr),
            Mode::Naive => self.naive.eval(&self.env, expr),
        }
    }
}

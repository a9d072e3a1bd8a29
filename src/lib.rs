//! Haki: a small Lisp-family interpreter that embeds as a library.
//!
//! The pipeline, leaves first: the [`lexer`] turns source text into tokens,
//! the [`reader`] balances incremental input into complete top-level forms,
//! the [`parser`] builds [`expr::Expression`] trees, and the trampolined
//! [`eval`] walker reduces them against an [`env::Environment`]. The
//! [`interp::Interpreter`] facade ties those together for embedders; the
//! [`repl`] and [`script`] drivers sit on top for the CLI.

pub mod core;
pub mod env;
pub mod error;
pub mod eval;
pub mod eval_naive;
pub mod expr;
pub mod hashmap;
pub mod interp;
pub mod lexer;
pub mod list;
pub mod parser;
pub mod primitives;
pub mod reader;
pub mod repl;
pub mod script;

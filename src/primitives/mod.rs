//! The fixed table of built-in operations, assembled once from the
//! per-concern modules, plus the type-checking combinators every primitive
//! uses to produce uniform diagnostics.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::error::Error;
use crate::expr::{Expression, PrimitiveFn, Tag};

pub mod fileio;
pub mod hashmap_ops;
pub mod list_ops;
pub mod logic;
pub mod math;
pub mod os;
pub mod string_ops;
pub mod write;

pub type Table = FxHashMap<&'static str, PrimitiveFn>;

static BUILTINS: Lazy<Table> = Lazy::new(|| {
    let mut table = Table::default();
    math::install(&mut table);
    logic::install(&mut table);
    list_ops::install(&mut table);
    string_ops::install(&mut table);
    hashmap_ops::install(&mut table);
    fileio::install(&mut table);
    os::install(&mut table);
    write::install(&mut table);
    table
});

/// The operator-name-to-native-function table. Built on first use, never
/// mutated afterwards.
pub fn table() -> &'static Table {
    &BUILTINS
}

//===----------------------------------------------------------------------===//
// Type-check combinators
//===----------------------------------------------------------------------===//

/// Arity requirement for a primitive call.
#[derive(Debug, Clone, Copy)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    OneOf(&'static [usize]),
}

/// Per-position tag requirement.
#[derive(Debug, Clone, Copy)]
pub enum ArgSpec {
    /// The argument at each listed position must carry the tag.
    IsType(&'static [usize], Tag),
    /// The argument at the position must carry one of the tags.
    IsOneOf(usize, &'static [Tag]),
    /// If the (optional) argument is present, it must carry the tag.
    OptType(usize, Tag),
}

/// Verifies arity and per-position tags, producing diagnostics of the
/// uniform shape `'(hget m k)' expects arg 1 to be type 'hash-map', not
/// 'list'`.
pub fn type_check(
    sig: &str,
    args: &[Expression],
    arity: Arity,
    specs: &[ArgSpec],
) -> Result<(), Error> {
    let argc = args.len();
    match arity {
        Arity::Exactly(n) if argc != n => {
            return Err(Error::ArityError(format!(
                "'{}' expects {} arg(s), you provided {}",
                sig, n, argc
            )));
        }
        Arity::AtLeast(n) if argc < n => {
            return Err(Error::ArityError(format!(
                "'{}' expects at least {} arg(s), you provided {}",
                sig, n, argc
            )));
        }
        Arity::OneOf(choices) if !choices.contains(&argc) => {
            let rendered: Vec<String> =
                choices.iter().map(|n| n.to_string()).collect();
            return Err(Error::ArityError(format!(
                "'{}' expects {} arg(s), you provided {}",
                sig,
                rendered.join(" or "),
                argc
            )));
        }
        _ => {}
    }

    for spec in specs {
        match spec {
            ArgSpec::IsType(positions, tag) => {
                for &pos in *positions {
                    if let Some(arg) = args.get(pos) {
                        if arg.tag() != *tag {
                            return Err(type_mismatch(sig, pos, tag.name(), arg));
                        }
                    }
                }
            }
            ArgSpec::IsOneOf(pos, tags) => {
                if let Some(arg) = args.get(*pos) {
                    if !tags.contains(&arg.tag()) {
                        let names: Vec<&str> =
                            tags.iter().map(|t| t.name()).collect();
                        return Err(type_mismatch(
                            sig,
                            *pos,
                            &names.join("|"),
                            arg,
                        ));
                    }
                }
            }
            ArgSpec::OptType(pos, tag) => {
                if let Some(arg) = args.get(*pos) {
                    if arg.tag() != *tag {
                        return Err(type_mismatch(sig, *pos, tag.name(), arg));
                    }
                }
            }
        }
    }

    Ok(())
}

fn type_mismatch(
    sig: &str,
    position: usize,
    expected: &str,
    actual: &Expression,
) -> Error {
    Error::TypeError(format!(
        "'{}' expects arg {} to be type '{}', not '{}'",
        sig,
        position + 1,
        expected,
        actual.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_populated_once() {
        let table = table();
        for name in ["+", "=", "head", "hget", "re-split", "prn", "cwd"] {
            assert!(table.contains_key(name), "missing primitive {}", name);
        }
    }

    #[test]
    fn arity_exact_mismatch_reports_counts() {
        let err = type_check(
            "(hget m k)",
            &[Expression::nil()],
            Arity::Exactly(2),
            &[],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::ArityError(
                "'(hget m k)' expects 2 arg(s), you provided 1".to_string()
            )
        );
    }

    #[test]
    fn tag_mismatch_reports_position_and_types() {
        let args = [Expression::list_from(vec![]), Expression::symbol("k")];
        let err = type_check(
            "(hget m k)",
            &args,
            Arity::Exactly(2),
            &[ArgSpec::IsType(&[0], Tag::HashMap)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::TypeError(
                "'(hget m k)' expects arg 1 to be type 'hash-map', not 'list'"
                    .to_string()
            )
        );
    }

    #[test]
    fn optional_positions_are_only_checked_when_present() {
        let args = [Expression::string("name")];
        assert!(type_check(
            "(env name default)",
            &args,
            Arity::AtLeast(1),
            &[
                ArgSpec::IsType(&[0], Tag::Str),
                ArgSpec::OptType(1, Tag::Str)
            ],
        )
        .is_ok());
    }
}

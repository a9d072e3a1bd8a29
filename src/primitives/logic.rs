//! Equality and negation.

use crate::error::Error;
use crate::expr::Expression;

use super::Table;

pub fn install(table: &mut Table) {
    table.insert("=", equals);
    table.insert("not", not);
}

/// `(= v1 ... vn)` — true when every argument is structurally equal to the
/// first. Equality is content-hash equality, which makes deep comparison of
/// lists and maps O(1).
fn equals(args: &[Expression]) -> Result<Expression, Error> {
    let (sentinel, rest) = args.split_first().ok_or_else(|| {
        Error::ArityError(
            "'(= v1 ... vn)' takes 1 or more args, you provided 0".to_string(),
        )
    })?;

    for arg in rest {
        if arg != sentinel {
            return Ok(Expression::bool(false));
        }
    }
    Ok(Expression::bool(true))
}

/// `(not val)` — logical negation under the language's truthiness rule.
fn not(args: &[Expression]) -> Result<Expression, Error> {
    if args.len() != 1 {
        return Err(Error::ArityError(format!(
            "'(not val)' takes one arg, you provided {}",
            args.len()
        )));
    }
    Ok(Expression::bool(!args[0].is_truthy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_deep() {
        let a = Expression::list_from(vec![
            Expression::int(1),
            Expression::list_from(vec![Expression::int(2)]),
        ]);
        let b = Expression::list_from(vec![
            Expression::int(1),
            Expression::list_from(vec![Expression::int(2)]),
        ]);
        assert_eq!(equals(&[a, b]).unwrap(), Expression::bool(true));
    }

    #[test]
    fn equality_is_variadic() {
        let args =
            [Expression::int(2), Expression::int(2), Expression::int(3)];
        assert_eq!(equals(&args).unwrap(), Expression::bool(false));
        assert_eq!(
            equals(&args[..2]).unwrap(),
            Expression::bool(true)
        );
    }

    #[test]
    fn single_argument_compares_equal_to_itself() {
        assert_eq!(
            equals(&[Expression::symbol("x")]).unwrap(),
            Expression::bool(true)
        );
    }

    #[test]
    fn not_follows_truthiness() {
        assert_eq!(not(&[Expression::nil()]).unwrap(), Expression::bool(true));
        assert_eq!(
            not(&[Expression::bool(false)]).unwrap(),
            Expression::bool(true)
        );
        assert_eq!(not(&[Expression::int(0)]).unwrap(), Expression::bool(false));
        assert_eq!(
            not(&[Expression::string("")]).unwrap(),
            Expression::bool(false)
        );
    }
}

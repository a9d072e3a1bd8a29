//! Arithmetic primitives. Everything computes in f64 and demotes integral
//! results back to integers, so `(+ 1 2.0)` is `3` while `(+ 2 0.1)` stays
//! `2.1`.

use crate::error::Error;
use crate::expr::{ExprKind, Expression};

use super::Table;

pub fn install(table: &mut Table) {
    table.insert("*", mult);
    table.insert("+", add);
    table.insert("-", minus);
    table.insert("<", less_than);
    table.insert("mod", modulo);
}

fn is_integral(value: f64) -> bool {
    value == (value as i64) as f64
}

/// Demotes an integral float back to an integer expression.
pub(crate) fn to_numeric_expr(value: f64) -> Expression {
    if is_integral(value) {
        Expression::int(value as i64)
    } else {
        Expression::float(value)
    }
}

pub(crate) fn as_number(expr: &Expression) -> Result<f64, Error> {
    match &expr.kind {
        ExprKind::Int(value) => Ok(*value as f64),
        ExprKind::Float(value) => Ok(*value),
        _ => Err(Error::TypeError(format!(
            "all arguments must be numbers, got '{}'",
            expr.type_name()
        ))),
    }
}

fn add(args: &[Expression]) -> Result<Expression, Error> {
    let mut result = 0.0;
    for arg in args {
        result += as_number(arg)?;
    }
    Ok(to_numeric_expr(result))
}

fn minus(args: &[Expression]) -> Result<Expression, Error> {
    let (first, rest) = args.split_first().ok_or_else(|| {
        Error::ArityError("'-' requires 1 or more args".to_string())
    })?;

    let mut result = as_number(first)?;

    // Unary minus negates.
    if rest.is_empty() {
        return Ok(to_numeric_expr(-result));
    }

    for arg in rest {
        result -= as_number(arg)?;
    }
    Ok(to_numeric_expr(result))
}

fn mult(args: &[Expression]) -> Result<Expression, Error> {
    let mut result = 1.0;
    for arg in args {
        result *= as_number(arg)?;
    }
    Ok(to_numeric_expr(result))
}

/// Strict monotone comparison: `(< a b c)` holds iff `a < b < c`.
fn less_than(args: &[Expression]) -> Result<Expression, Error> {
    if args.is_empty() {
        return Err(Error::ArityError(
            "'(< a b ... n)' requires at least 1 arg".to_string(),
        ));
    }

    let mut sentinel = as_number(&args[0])?;
    for arg in &args[1..] {
        let candidate = as_number(arg)?;
        if candidate <= sentinel {
            return Ok(Expression::bool(false));
        }
        sentinel = candidate;
    }
    Ok(Expression::bool(true))
}

fn modulo(args: &[Expression]) -> Result<Expression, Error> {
    if args.len() != 2 {
        return Err(Error::ArityError(format!(
            "'(mod num div)' takes 2 args, you provided {}",
            args.len()
        )));
    }

    let num = as_number(&args[0])?;
    let div = as_number(&args[1])?;
    if div == 0.0 {
        return Err(Error::DomainError(
            "'(mod num div)' division by zero".to_string(),
        ));
    }

    Ok(to_numeric_expr(num % div))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addition_folds_left_to_right() {
        let result = add(&[
            Expression::int(1),
            Expression::int(2),
            Expression::int(3),
        ])
        .unwrap();
        assert_eq!(result, Expression::int(6));
    }

    #[test]
    fn empty_addition_is_zero() {
        assert_eq!(add(&[]).unwrap(), Expression::int(0));
    }

    #[test]
    fn float_contagion_with_integral_demotion() {
        let promoted =
            add(&[Expression::int(2), Expression::float(0.1)]).unwrap();
        assert_eq!(promoted, Expression::float(2.1));

        let demoted =
            add(&[Expression::int(1), Expression::float(2.0)]).unwrap();
        assert_eq!(demoted, Expression::int(3));
    }

    #[test]
    fn unary_minus_negates() {
        assert_eq!(minus(&[Expression::int(5)]).unwrap(), Expression::int(-5));
    }

    #[test]
    fn minus_chains() {
        let result = minus(&[
            Expression::int(100),
            Expression::int(99),
            Expression::int(24),
        ])
        .unwrap();
        assert_eq!(result, Expression::int(-23));
    }

    #[test]
    fn multiplication_has_identity_one() {
        assert_eq!(mult(&[]).unwrap(), Expression::int(1));
        assert_eq!(
            mult(&[Expression::int(3), Expression::int(4)]).unwrap(),
            Expression::int(12)
        );
    }

    #[test]
    fn less_than_is_strict_monotone() {
        let yes = less_than(&[
            Expression::int(1),
            Expression::int(2),
            Expression::int(3),
        ])
        .unwrap();
        assert_eq!(yes, Expression::bool(true));

        let no = less_than(&[
            Expression::int(1),
            Expression::int(3),
            Expression::int(2),
        ])
        .unwrap();
        assert_eq!(no, Expression::bool(false));

        let equal_fails =
            less_than(&[Expression::int(2), Expression::int(2)]).unwrap();
        assert_eq!(equal_fails, Expression::bool(false));
    }

    #[test]
    fn modulo_keeps_integers_integral() {
        let result =
            modulo(&[Expression::int(7), Expression::int(2)]).unwrap();
        assert_eq!(result, Expression::int(1));
    }

    #[test]
    fn modulo_by_zero_is_a_domain_error() {
        let result = modulo(&[Expression::int(7), Expression::int(0)]);
        assert!(matches!(result, Err(Error::DomainError(_))));
    }

    #[test]
    fn non_numbers_are_rejected() {
        let result = add(&[Expression::string("2")]);
        assert!(matches!(result, Err(Error::TypeError(_))));
    }
}

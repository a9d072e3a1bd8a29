//! List primitives. All of them hand back fresh sequences; the argument
//! lists are never mutated.

use crate::error::Error;
use crate::expr::{ExprKind, Expression, Tag};
use crate::list::List;

use super::{type_check, ArgSpec, Arity, Table};

pub fn install(table: &mut Table) {
    table.insert("list", list);
    table.insert("list?", list_p);
    table.insert("head", head);
    table.insert("tail", tail);
    table.insert("prepend", prepend);
    table.insert("append", append);
    table.insert("join", join);
    table.insert("count", count);
}

fn list(args: &[Expression]) -> Result<Expression, Error> {
    Ok(Expression::list_from(args.iter().cloned()))
}

fn list_p(args: &[Expression]) -> Result<Expression, Error> {
    type_check("(list? val)", args, Arity::Exactly(1), &[])?;
    Ok(Expression::bool(args[0].is_list()))
}

/// `(head lst)` — the first element, or `nil` for the empty list.
fn head(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(head lst)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::List)],
    )?;

    let items = args[0].as_list().unwrap();
    Ok(items.head().cloned().unwrap_or_else(Expression::nil))
}

/// `(tail lst)` — everything but the first element; the tail of the empty
/// list is the empty list.
fn tail(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(tail lst)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::List)],
    )?;

    let items = args[0].as_list().unwrap();
    Ok(Expression::list(items.tail()))
}

/// `(prepend val lst)`
fn prepend(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(prepend val lst)",
        args,
        Arity::Exactly(2),
        &[ArgSpec::IsType(&[1], Tag::List)],
    )?;

    let items = args[1].as_list().unwrap();
    Ok(Expression::list(items.prepend(args[0].clone())))
}

/// `(append lst val)`
fn append(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(append lst val)",
        args,
        Arity::Exactly(2),
        &[ArgSpec::IsType(&[0], Tag::List)],
    )?;

    let items = args[0].as_list().unwrap();
    Ok(Expression::list(items.append(args[1].clone())))
}

/// `(join lst1 lst2 ... lstn)` — concatenates lists in order.
fn join(args: &[Expression]) -> Result<Expression, Error> {
    let mut joined = List::new();
    for arg in args {
        let items = arg.as_list().ok_or_else(|| {
            Error::TypeError(format!(
                "join takes only list params, {} is not a list",
                arg
            ))
        })?;
        joined = joined.join(items);
    }
    Ok(Expression::list(joined))
}

/// `(count val)` — elements in a list or hash-map, characters in a string.
fn count(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(count string|list|hash-map)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsOneOf(0, &[Tag::List, Tag::HashMap, Tag::Str])],
    )?;

    let n = match &args[0].kind {
        ExprKind::List(items) => items.len(),
        ExprKind::HashMap(map) => map.len(),
        ExprKind::Str(text) => text.chars().count(),
        _ => unreachable!("type_check admits only countable tags"),
    };
    Ok(Expression::int(n as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Expression {
        Expression::list_from(values.iter().map(|v| Expression::int(*v)))
    }

    #[test]
    fn list_builds_from_arguments() {
        let result =
            list(&[Expression::int(1), Expression::symbol("x")]).unwrap();
        assert_eq!(result.to_string(), "(1 x)");
    }

    #[test]
    fn head_of_empty_list_is_nil() {
        assert_eq!(head(&[ints(&[])]).unwrap(), Expression::nil());
        assert_eq!(head(&[ints(&[7, 8])]).unwrap(), Expression::int(7));
    }

    #[test]
    fn tail_of_empty_list_is_empty_list() {
        let result = tail(&[ints(&[])]).unwrap();
        assert!(result.as_list().unwrap().is_empty());

        let rest = tail(&[ints(&[1, 2, 3])]).unwrap();
        assert_eq!(rest, ints(&[2, 3]));
    }

    #[test]
    fn prepend_then_head_and_tail_invert() {
        let xs = ints(&[2, 3]);
        let grown =
            prepend(&[Expression::int(1), xs.clone()]).unwrap();
        assert_eq!(head(&[grown.clone()]).unwrap(), Expression::int(1));
        assert_eq!(tail(&[grown]).unwrap(), xs);
    }

    #[test]
    fn append_adds_at_the_back() {
        let result = append(&[ints(&[1, 2]), Expression::int(3)]).unwrap();
        assert_eq!(result, ints(&[1, 2, 3]));
    }

    #[test]
    fn join_sums_lengths() {
        let a = ints(&[1, 2]);
        let b = ints(&[3]);
        let joined = join(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(joined, ints(&[1, 2, 3]));

        let count_joined = count(&[joined]).unwrap();
        assert_eq!(count_joined, Expression::int(3));
    }

    #[test]
    fn count_covers_lists_strings_and_maps() {
        assert_eq!(count(&[ints(&[1, 2, 3])]).unwrap(), Expression::int(3));
        assert_eq!(
            count(&[Expression::string("abcd")]).unwrap(),
            Expression::int(4)
        );
        assert!(matches!(
            count(&[Expression::int(9)]),
            Err(Error::TypeError(_))
        ));
    }

    #[test]
    fn prepend_rejects_non_lists() {
        let err =
            prepend(&[Expression::int(1), Expression::int(2)]).unwrap_err();
        assert_eq!(
            err,
            Error::TypeError(
                "'(prepend val lst)' expects arg 2 to be type 'list', not 'integer'"
                    .to_string()
            )
        );
    }
}

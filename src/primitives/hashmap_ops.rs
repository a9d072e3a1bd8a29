//! Hash-map primitives. Maps are keyed by the content hash of the key
//! expression, and every write copies: the original map is unchanged after
//! `hset` / `hset-in`.

use crate::error::Error;
use crate::expr::{ExprKind, Expression, Tag};
use crate::hashmap::HakiMap;

use super::{type_check, ArgSpec, Arity, Table};

pub fn install(table: &mut Table) {
    table.insert("hmap", hmap);
    table.insert("hmap?", hmap_p);
    table.insert("hget", hget);
    table.insert("hset", hset);
    table.insert("hkeys", hkeys);
    table.insert("hvals", hvals);
    table.insert("hget-in", hget_in);
    table.insert("hset-in", hset_in);
}

fn map_arg(expr: &Expression) -> &HakiMap {
    match &expr.kind {
        ExprKind::HashMap(map) => map,
        _ => unreachable!("type_check admits only hash-maps"),
    }
}

/// `(hmap k v ...)` — builds a map from alternating keys and values.
fn hmap(args: &[Expression]) -> Result<Expression, Error> {
    if args.len() % 2 != 0 {
        return Err(Error::ArityError(
            "'(hmap k v ...)' expects an even number of params".to_string(),
        ));
    }

    let mut map = HakiMap::new();
    let mut iter = args.iter();
    while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
        map.set(key.clone(), value.clone());
    }
    Ok(Expression::hashmap(map))
}

fn hmap_p(args: &[Expression]) -> Result<Expression, Error> {
    type_check("(hmap? val)", args, Arity::Exactly(1), &[])?;
    Ok(Expression::bool(args[0].tag() == Tag::HashMap))
}

/// `(hget m k)` — the value bound to `k`, or `nil`.
fn hget(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(hget m k)",
        args,
        Arity::Exactly(2),
        &[ArgSpec::IsType(&[0], Tag::HashMap)],
    )?;

    Ok(map_arg(&args[0])
        .get(&args[1])
        .cloned()
        .unwrap_or_else(Expression::nil))
}

/// `(hset m k v ...)` — a NEW map with the bindings applied; `m` itself is
/// untouched. A `nil` value removes the key.
fn hset(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(hset m k v ...)",
        args,
        Arity::AtLeast(3),
        &[ArgSpec::IsType(&[0], Tag::HashMap)],
    )?;

    let pairs = &args[1..];
    if pairs.len() % 2 != 0 {
        return Err(Error::ArityError(format!(
            "'(hset m k v ...)' expects an even number of k/v params, you provided {}",
            pairs.len()
        )));
    }

    let mut updated = map_arg(&args[0]).clone();
    let mut iter = pairs.iter();
    while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
        updated.set(key.clone(), value.clone());
    }
    Ok(Expression::hashmap(updated))
}

fn hkeys(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(hkeys m)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::HashMap)],
    )?;
    Ok(Expression::list_from(map_arg(&args[0]).keys().cloned()))
}

fn hvals(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(hvals m)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::HashMap)],
    )?;
    Ok(Expression::list_from(map_arg(&args[0]).values().cloned()))
}

/// `(hget-in m (k ... ks))` — walks a path of keys through nested maps;
/// `nil` as soon as the path leaves map territory.
fn hget_in(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(hget-in m (k ... ks))",
        args,
        Arity::Exactly(2),
        &[
            ArgSpec::IsType(&[0], Tag::HashMap),
            ArgSpec::IsType(&[1], Tag::List),
        ],
    )?;

    let mut current = args[0].clone();
    for key in args[1].as_list().unwrap().iter() {
        let next = match &current.kind {
            ExprKind::HashMap(map) => {
                map.get(key).cloned().unwrap_or_else(Expression::nil)
            }
            _ => return Ok(Expression::nil()),
        };
        current = next;
    }
    Ok(current)
}

/// `(hset-in m (k ... ks) v)` — a new map with the value planted at the end
/// of the key path. Missing intermediate maps are created; a non-map in the
/// middle of the path is an error.
fn hset_in(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(hset-in m (k ... ks) v)",
        args,
        Arity::Exactly(3),
        &[
            ArgSpec::IsType(&[0], Tag::HashMap),
            ArgSpec::IsType(&[1], Tag::List),
        ],
    )?;

    let path: Vec<Expression> =
        args[1].as_list().unwrap().iter().cloned().collect();
    if path.is_empty() {
        return Err(Error::DomainError(
            "'(hset-in m (k ... ks) v)' requires a non-empty key path"
                .to_string(),
        ));
    }

    set_in(map_arg(&args[0]), &path, &args[2]).map(Expression::hashmap)
}

fn set_in(
    map: &HakiMap,
    path: &[Expression],
    value: &Expression,
) -> Result<HakiMap, Error> {
    let mut updated = map.clone();
    let key = &path[0];

    if path.len() == 1 {
        updated.set(key.clone(), value.clone());
        return Ok(updated);
    }

    let nested = match updated.get(key) {
        Some(inner) => match &inner.kind {
            ExprKind::HashMap(inner_map) => {
                set_in(inner_map, &path[1..], value)?
            }
            _ => {
                return Err(Error::TypeError(format!(
                    "'{}' key reached non-hashmap value of type '{}'",
                    key,
                    inner.type_name()
                )));
            }
        },
        None => set_in(&HakiMap::new(), &path[1..], value)?,
    };

    updated.set(key.clone(), Expression::hashmap(nested));
    Ok(updated)
}

//! String and regex primitives.
//!
//! String payloads are raw, exactly as lexed; regex sources therefore need
//! no re-escaping on their way to the engine.

use regex::Regex;

use crate::error::Error;
use crate::expr::{ExprKind, Expression, Tag};

use super::{type_check, ArgSpec, Arity, Table};

pub fn install(table: &mut Table) {
    table.insert("format", format_str);
    table.insert("trim", trim);
    table.insert("triml", triml);
    table.insert("trimr", trimr);
    table.insert("upper-case", upper_case);
    table.insert("lower-case", lower_case);
    table.insert("substr", substr);
    table.insert("index", index);
    table.insert("last-index", last_index);
    table.insert("starts-with?", starts_with_p);
    table.insert("ends-with?", ends_with_p);
    table.insert("replace", replace);
    table.insert("re-find", re_find);
    table.insert("re-list", re_list);
    table.insert("re-match", re_match);
    table.insert("re-split", re_split);
}

const TRIM_CUTSET: &[char] = &[' ', '\n', '\t', '\r'];

fn str_arg(expr: &Expression) -> &str {
    match &expr.kind {
        ExprKind::Str(text) => text,
        _ => unreachable!("type_check admits only strings"),
    }
}

fn compile(pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern).map_err(|e| Error::DomainError(e.to_string()))
}

/// `(format pattern v ... vs)` — substitutes each `%v` in the pattern with
/// the display form of the next argument (strings unquoted); `%%` emits a
/// literal percent sign.
fn format_str(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(format pattern v ... vs)",
        args,
        Arity::AtLeast(1),
        &[ArgSpec::IsType(&[0], Tag::Str)],
    )?;

    let pattern = str_arg(&args[0]);
    let mut values = args[1..].iter();
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some('v') => {
                chars.next();
                match values.next() {
                    Some(value) => out.push_str(&value.print_for_output()),
                    None => out.push_str("%!v(missing)"),
                }
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }

    Ok(Expression::string(out))
}

fn trim(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(trim string)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::Str)],
    )?;
    Ok(Expression::string(str_arg(&args[0]).trim_matches(TRIM_CUTSET)))
}

fn triml(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(triml string)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::Str)],
    )?;
    Ok(Expression::string(
        str_arg(&args[0]).trim_start_matches(TRIM_CUTSET),
    ))
}

fn trimr(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(trimr string)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::Str)],
    )?;
    Ok(Expression::string(
        str_arg(&args[0]).trim_end_matches(TRIM_CUTSET),
    ))
}

fn upper_case(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(upper-case s)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::Str)],
    )?;
    Ok(Expression::string(str_arg(&args[0]).to_uppercase()))
}

fn lower_case(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(lower-case s)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::Str)],
    )?;
    Ok(Expression::string(str_arg(&args[0]).to_lowercase()))
}

/// `(substr s start end)` — byte-indexed slice with explicit bounds checks.
fn substr(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(substr s start end)",
        args,
        Arity::Exactly(3),
        &[
            ArgSpec::IsType(&[0], Tag::Str),
            ArgSpec::IsType(&[1, 2], Tag::Int),
        ],
    )?;

    let s = str_arg(&args[0]);
    let (start, end) = match (&args[1].kind, &args[2].kind) {
        (ExprKind::Int(start), ExprKind::Int(end)) => (*start, *end),
        _ => unreachable!("type_check admits only integers"),
    };

    if start < 0 {
        return Err(Error::DomainError(format!(
            "'(substr s start end)' `start` ({}) should be a positive int",
            start
        )));
    }
    if end < start {
        return Err(Error::DomainError(format!(
            "'(substr s start end)' `end` ({}) should be >= to `start` ({})",
            end, start
        )));
    }
    if end > s.len() as i64 {
        return Err(Error::DomainError(format!(
            "'(substr s start end)' `end` ({}) exceeds `s` length {}",
            end,
            s.len()
        )));
    }

    match s.get(start as usize..end as usize) {
        Some(cut) => Ok(Expression::string(cut)),
        None => Err(Error::DomainError(format!(
            "'(substr s start end)' bounds {}..{} do not fall on character boundaries",
            start, end
        ))),
    }
}

/// `(index s substr)` — byte offset of the first occurrence, -1 if absent.
fn index(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(index s substr)",
        args,
        Arity::Exactly(2),
        &[ArgSpec::IsType(&[0, 1], Tag::Str)],
    )?;

    let position = str_arg(&args[0])
        .find(str_arg(&args[1]))
        .map(|i| i as i64)
        .unwrap_or(-1);
    Ok(Expression::int(position))
}

fn last_index(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(last-index s substr)",
        args,
        Arity::Exactly(2),
        &[ArgSpec::IsType(&[0, 1], Tag::Str)],
    )?;

    let position = str_arg(&args[0])
        .rfind(str_arg(&args[1]))
        .map(|i| i as i64)
        .unwrap_or(-1);
    Ok(Expression::int(position))
}

fn starts_with_p(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(starts-with? s prefix)",
        args,
        Arity::Exactly(2),
        &[ArgSpec::IsType(&[0, 1], Tag::Str)],
    )?;
    Ok(Expression::bool(
        str_arg(&args[0]).starts_with(str_arg(&args[1])),
    ))
}

fn ends_with_p(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(ends-with? s suffix)",
        args,
        Arity::Exactly(2),
        &[ArgSpec::IsType(&[0, 1], Tag::Str)],
    )?;
    Ok(Expression::bool(
        str_arg(&args[0]).ends_with(str_arg(&args[1])),
    ))
}

/// `(replace s old new)` — replaces every occurrence.
fn replace(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(replace s old new)",
        args,
        Arity::Exactly(3),
        &[ArgSpec::IsType(&[0, 1, 2], Tag::Str)],
    )?;
    Ok(Expression::string(
        str_arg(&args[0]).replace(str_arg(&args[1]), str_arg(&args[2])),
    ))
}

/// `(re-find re string)` — text of the first match, `""` when none.
fn re_find(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(re-find re string)",
        args,
        Arity::Exactly(2),
        &[ArgSpec::IsType(&[0, 1], Tag::Str)],
    )?;

    let re = compile(str_arg(&args[0]))?;
    let found = re
        .find(str_arg(&args[1]))
        .map(|m| m.as_str())
        .unwrap_or("");
    Ok(Expression::string(found))
}

/// `(re-match re string)` — whether the pattern matches anywhere.
fn re_match(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(re-match re string)",
        args,
        Arity::Exactly(2),
        &[ArgSpec::IsType(&[0, 1], Tag::Str)],
    )?;

    let re = compile(str_arg(&args[0]))?;
    Ok(Expression::bool(re.is_match(str_arg(&args[1]))))
}

/// `(re-list re string)` — every match, in order, as a list of strings.
fn re_list(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(re-list re string)",
        args,
        Arity::Exactly(2),
        &[ArgSpec::IsType(&[0, 1], Tag::Str)],
    )?;

    let re = compile(str_arg(&args[0]))?;
    Ok(Expression::list_from(
        re.find_iter(str_arg(&args[1]))
            .map(|m| Expression::string(m.as_str())),
    ))
}

/// `(re-split re string)` — the substrings between matches.
fn re_split(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(re-split re string)",
        args,
        Arity::Exactly(2),
        &[ArgSpec::IsType(&[0, 1], Tag::Str)],
    )?;

    let re = compile(str_arg(&args[0]))?;
    Ok(Expression::list_from(
        re.split(str_arg(&args[1])).map(Expression::string),
    ))
}

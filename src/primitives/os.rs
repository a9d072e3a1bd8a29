//! Operating-system primitives: working directory, process environment,
//! and subprocess execution.

use std::process::{Command, Stdio};

use crate::error::Error;
use crate::expr::{Expression, Tag};
use crate::hashmap::HakiMap;

use super::{type_check, ArgSpec, Arity, Table};

pub fn install(table: &mut Table) {
    table.insert("cd!", cd_bang);
    table.insert("cwd", cwd);
    table.insert("env", env_var);
    table.insert("environment", environment);
    table.insert("exec!", exec_bang);
    table.insert("exec!!", exec_bang_bang);
    table.insert("shell!", shell_bang);
    table.insert("exit!", exit_bang);
}

fn str_arg(expr: &Expression) -> &str {
    match &expr.kind {
        crate::expr::ExprKind::Str(text) => text,
        _ => unreachable!("type_check admits only strings"),
    }
}

/// Command arguments render as raw text for strings, display form for
/// everything else.
fn to_string_args(args: &[Expression]) -> Vec<String> {
    args.iter().map(|a| a.print_for_output()).collect()
}

/// `(cd! path)` — changes the working directory, returns the new one.
fn cd_bang(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(cd! path)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::Str)],
    )?;

    std::env::set_current_dir(str_arg(&args[0]))
        .map_err(|e| Error::IOError(e.to_string()))?;
    cwd(&[])
}

/// `(cwd)` — the current working directory as a string.
fn cwd(args: &[Expression]) -> Result<Expression, Error> {
    type_check("(cwd)", args, Arity::Exactly(0), &[])?;

    let dir =
        std::env::current_dir().map_err(|e| Error::IOError(e.to_string()))?;
    Ok(Expression::string(dir.display().to_string()))
}

/// `(env name default?)` — an environment variable, the default when unset
/// or empty, `nil` when neither exists.
fn env_var(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(env name default)",
        args,
        Arity::OneOf(&[1, 2]),
        &[
            ArgSpec::IsType(&[0], Tag::Str),
            ArgSpec::OptType(1, Tag::Str),
        ],
    )?;

    match std::env::var(str_arg(&args[0])) {
        Ok(value) if !value.is_empty() => Ok(Expression::string(value)),
        _ => match args.get(1) {
            Some(default) => Ok(default.clone()),
            None => Ok(Expression::nil()),
        },
    }
}

/// `(environment)` — the whole process environment as a hash-map.
fn environment(args: &[Expression]) -> Result<Expression, Error> {
    type_check("(environment)", args, Arity::Exactly(0), &[])?;

    let mut map = HakiMap::new();
    for (name, value) in std::env::vars() {
        map.set(Expression::string(name), Expression::string(value));
    }
    Ok(Expression::hashmap(map))
}

/// `(exec! cmd args...)` — runs a command, capturing output. Returns
/// `(ok exit-info output)` where `ok` is a bool and `output` combines
/// stdout and stderr.
fn exec_bang(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(exec! cmd args...)",
        args,
        Arity::AtLeast(1),
        &[ArgSpec::IsType(&[0], Tag::Str)],
    )?;

    let output = Command::new(str_arg(&args[0]))
        .args(to_string_args(&args[1..]))
        .output();

    match output {
        Ok(output) => {
            let mut combined =
                String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            let exit = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            Ok(Expression::list_from(vec![
                Expression::bool(output.status.success()),
                Expression::string(exit),
                Expression::string(combined),
            ]))
        }
        Err(e) => Ok(Expression::list_from(vec![
            Expression::bool(false),
            Expression::string(e.to_string()),
            Expression::string(""),
        ])),
    }
}

/// `(exec!! cmd args...)` — like `exec!` but returns a hash-map with the
/// keys `ok`, `stdout`, `stderr`, and `exit`.
fn exec_bang_bang(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(exec!! cmd args...)",
        args,
        Arity::AtLeast(1),
        &[ArgSpec::IsType(&[0], Tag::Str)],
    )?;

    let mut map = HakiMap::new();
    match Command::new(str_arg(&args[0]))
        .args(to_string_args(&args[1..]))
        .output()
    {
        Ok(output) => {
            map.set(
                Expression::symbol("ok"),
                Expression::bool(output.status.success()),
            );
            map.set(
                Expression::symbol("stdout"),
                Expression::string(
                    String::from_utf8_lossy(&output.stdout).into_owned(),
                ),
            );
            map.set(
                Expression::symbol("stderr"),
                Expression::string(
                    String::from_utf8_lossy(&output.stderr).into_owned(),
                ),
            );
            map.set(
                Expression::symbol("exit"),
                Expression::string(
                    output
                        .status
                        .code()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "signal".to_string()),
                ),
            );
        }
        Err(e) => {
            map.set(Expression::symbol("ok"), Expression::bool(false));
            map.set(Expression::symbol("stdout"), Expression::string(""));
            map.set(Expression::symbol("stderr"), Expression::string(""));
            map.set(
                Expression::symbol("exit"),
                Expression::string(e.to_string()),
            );
        }
    }
    Ok(Expression::hashmap(map))
}

/// `(shell! cmd args...)` — runs a command wired to this process's stdio.
/// Returns `nil` on success, the error text otherwise.
fn shell_bang(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(shell! cmd args...)",
        args,
        Arity::AtLeast(1),
        &[ArgSpec::IsType(&[0], Tag::Str)],
    )?;

    let status = Command::new(str_arg(&args[0]))
        .args(to_string_args(&args[1..]))
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status();

    match status {
        Ok(status) if status.success() => Ok(Expression::nil()),
        Ok(status) => Ok(Expression::string(status.to_string())),
        Err(e) => Ok(Expression::string(e.to_string())),
    }
}

/// `(exit! code?)` — terminates the process.
fn exit_bang(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(exit! code)",
        args,
        Arity::OneOf(&[0, 1]),
        &[ArgSpec::OptType(0, Tag::Int)],
    )?;

    let code = match args.first().map(|a| &a.kind) {
        Some(crate::expr::ExprKind::Int(code)) => *code as i32,
        _ => 0,
    };
    std::process::exit(code);
}

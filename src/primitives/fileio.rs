//! File-handle payload and the file I/O primitives.
//!
//! A handle wraps a buffered line scanner behind a mutex so `read-line` can
//! advance it through a shared, otherwise-immutable expression. The
//! standard streams are preloaded into the global frame as handles too.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Mutex;

use crate::error::Error;
use crate::expr::{Expression, Tag};

use super::{type_check, ArgSpec, Arity, Table};

pub fn install(table: &mut Table) {
    table.insert("open!", open_bang);
    table.insert("close!", close_bang);
    table.insert("closed?", closed_p);
    table.insert("read-file", read_file);
    table.insert("read-line", read_line);
    table.insert("file?", file_p);
    table.insert("dir?", dir_p);
    table.insert("exists?", exists_p);
    table.insert("handle?", handle_p);
    table.insert("files", files);
}

#[derive(Debug)]
enum Stream {
    Disk(BufReader<fs::File>),
    Stdin,
    Stdout,
    Stderr,
    Closed,
}

#[derive(Debug)]
pub struct FileHandle {
    path: String,
    stream: Mutex<Stream>,
}

impl FileHandle {
    pub fn open(path: &str) -> Result<FileHandle, Error> {
        let file =
            fs::File::open(path).map_err(|e| Error::IOError(e.to_string()))?;
        let absolute = fs::canonicalize(path)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| path.to_string());
        Ok(FileHandle {
            path: absolute,
            stream: Mutex::new(Stream::Disk(BufReader::new(file))),
        })
    }

    pub fn stdin() -> FileHandle {
        FileHandle {
            path: "/dev/stdin".to_string(),
            stream: Mutex::new(Stream::Stdin),
        }
    }

    pub fn stdout() -> FileHandle {
        FileHandle {
            path: "/dev/stdout".to_string(),
            stream: Mutex::new(Stream::Stdout),
        }
    }

    pub fn stderr() -> FileHandle {
        FileHandle {
            path: "/dev/stderr".to_string(),
            stream: Mutex::new(Stream::Stderr),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        !matches!(*self.stream.lock().unwrap(), Stream::Closed)
    }

    pub fn close(&self) {
        *self.stream.lock().unwrap() = Stream::Closed;
    }

    /// The next line without its terminator, or `None` at end of input (at
    /// which point the handle closes itself).
    pub fn next_line(&self) -> Result<Option<String>, Error> {
        let mut stream = self.stream.lock().unwrap();

        let mut line = String::new();
        let read = match &mut *stream {
            Stream::Disk(reader) => reader
                .read_line(&mut line)
                .map_err(|e| Error::IOError(e.to_string()))?,
            Stream::Stdin => std::io::stdin()
                .lock()
                .read_line(&mut line)
                .map_err(|e| Error::IOError(e.to_string()))?,
            Stream::Stdout | Stream::Stderr => {
                return Err(Error::IOError(format!(
                    "cannot read from output stream '{}'",
                    self.path
                )));
            }
            Stream::Closed => {
                return Err(Error::IOError(format!(
                    "cannot read from un-opened file: '{}'",
                    self.path
                )));
            }
        };

        if read == 0 {
            *stream = Stream::Closed;
            return Ok(None);
        }

        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

fn handle_arg(expr: &Expression) -> &FileHandle {
    match &expr.kind {
        crate::expr::ExprKind::File(handle) => handle.as_ref(),
        _ => unreachable!("type_check admits only file handles"),
    }
}

fn str_arg(expr: &Expression) -> &str {
    match &expr.kind {
        crate::expr::ExprKind::Str(text) => text,
        _ => unreachable!("type_check admits only strings"),
    }
}

/// `(open! fpath)` — opens a file for line-oriented reading.
fn open_bang(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(open! fpath)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::Str)],
    )?;
    Ok(Expression::file(FileHandle::open(str_arg(&args[0]))?))
}

fn close_bang(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(close! fhandle)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::File)],
    )?;
    handle_arg(&args[0]).close();
    Ok(Expression::nil())
}

fn closed_p(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(closed? fhandle)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::File)],
    )?;
    Ok(Expression::bool(!handle_arg(&args[0]).is_open()))
}

/// `(read-file fpath)` — the whole file as one string.
fn read_file(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(read-file fpath)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::Str)],
    )?;

    let contents = fs::read_to_string(str_arg(&args[0]))
        .map_err(|e| Error::IOError(e.to_string()))?;
    Ok(Expression::string(contents))
}

/// `(read-line fhandle)` — the next line, or `nil` at end of input.
fn read_line(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(read-line fhandle)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::File)],
    )?;

    match handle_arg(&args[0]).next_line()? {
        Some(line) => Ok(Expression::string(line)),
        None => Ok(Expression::nil()),
    }
}

fn file_p(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(file? fpath)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::Str)],
    )?;
    let path = Path::new(str_arg(&args[0]));
    Ok(Expression::bool(path.is_file()))
}

fn dir_p(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(dir? fpath)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::Str)],
    )?;
    let path = Path::new(str_arg(&args[0]));
    Ok(Expression::bool(path.is_dir()))
}

fn exists_p(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(exists? fpath)",
        args,
        Arity::Exactly(1),
        &[ArgSpec::IsType(&[0], Tag::Str)],
    )?;
    Ok(Expression::bool(Path::new(str_arg(&args[0])).exists()))
}

fn handle_p(args: &[Expression]) -> Result<Expression, Error> {
    type_check("(handle? val)", args, Arity::Exactly(1), &[])?;
    Ok(Expression::bool(args[0].tag() == Tag::File))
}

/// `(files root pattern?)` — walks the tree under `root`, returning every
/// path whose file name matches the optional `*`/`?` wildcard pattern.
fn files(args: &[Expression]) -> Result<Expression, Error> {
    type_check(
        "(files root pattern)",
        args,
        Arity::OneOf(&[1, 2]),
        &[
            ArgSpec::IsType(&[0], Tag::Str),
            ArgSpec::OptType(1, Tag::Str),
        ],
    )?;

    let root = str_arg(&args[0]);
    let pattern = args.get(1).map(|p| str_arg(p).to_string());

    let mut matches = Vec::new();
    walk(Path::new(root), pattern.as_deref(), &mut matches)?;
    matches.sort();

    Ok(Expression::list_from(
        matches.into_iter().map(Expression::string),
    ))
}

fn walk(
    dir: &Path,
    pattern: Option<&str>,
    matches: &mut Vec<String>,
) -> Result<(), Error> {
    let matched = match dir.file_name() {
        Some(name) => {
            wildcard_match(pattern.unwrap_or("*"), &name.to_string_lossy())
        }
        // The walk root itself ("." and friends) counts only when no
        // pattern narrows the result.
        None => pattern.is_none(),
    };
    if matched {
        matches.push(dir.display().to_string());
    }

    if !dir.is_dir() {
        return Ok(());
    }

    let entries =
        fs::read_dir(dir).map_err(|e| Error::IOError(e.to_string()))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::IOError(e.to_string()))?;
        walk(&entry.path(), pattern, matches)?;
    }
    Ok(())
}

/// Wildcard match over a file name: `*` for any run of characters, `?` for
/// exactly one. Enough of a glob for the `files` primitive.
fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    fn matches(pattern: &[char], name: &[char]) -> bool {
        match (pattern.first(), name.first()) {
            (None, None) => true,
            (Some('*'), _) => {
                matches(&pattern[1..], name)
                    || (!name.is_empty() && matches(pattern, &name[1..]))
            }
            (Some('?'), Some(_)) => matches(&pattern[1..], &name[1..]),
            (Some(p), Some(n)) if p == n => {
                matches(&pattern[1..], &name[1..])
            }
            _ => false,
        }
    }

    matches(&pattern, &name)
}

//! The expression model: a tagged value shared by code and data.
//!
//! Every expression carries a 32-bit content hash computed once at
//! construction. The hash is a pure function of `(tag, payload)` and doubles
//! as the identity for structural equality (`=`) and for hash-map keying.
//! Composite values fold the hashes of their elements, so `(1 2)` and
//! `(2 1)` differ while two independently built `(1 2)` lists collide on
//! purpose.

use std::fmt;
use std::hash::Hasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rustc_hash::FxHasher;

use crate::env::Environment;
use crate::error::Error;
use crate::hashmap::HakiMap;
use crate::list::List;
use crate::primitives::fileio::FileHandle;

pub type PrimitiveFn = fn(&[Expression]) -> Result<Expression, Error>;

/// Type tag, the source of truth for dispatch and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    Nil = 0,
    Bool,
    Int,
    Float,
    Str,
    Symbol,
    Quote,
    List,
    HashMap,
    File,
    Primitive,
    Function,
    Lambda,
    Thunk,
}

impl Tag {
    /// The name used in user-facing diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Tag::Nil => "nil",
            Tag::Bool => "bool",
            Tag::Int => "integer",
            Tag::Float => "float",
            Tag::Str => "string",
            Tag::Symbol => "symbol",
            Tag::Quote => "quote",
            Tag::List => "list",
            Tag::HashMap => "hash-map",
            Tag::File => "file",
            Tag::Primitive => "primitive",
            Tag::Function => "function",
            Tag::Lambda => "lambda",
            Tag::Thunk => "thunk",
        }
    }
}

/// A user function (`defun`) or anonymous lambda (`fn`).
///
/// `env` is `Some` only for lambdas: a shallow snapshot of the lexical
/// frames taken at creation, sharing the global frame by reference. Named
/// functions carry no snapshot and are applied against a fresh global-based
/// environment, which is what lets forward references resolve.
pub struct Closure {
    pub name: Arc<str>,
    pub params: Vec<Expression>,
    pub body: Expression,
    pub env: Option<Environment>,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// An unevaluated `let` right-hand side. Captures nothing; the body is
/// forced in the environment where the bound symbol is first dereferenced.
#[derive(Debug)]
pub struct Thunk {
    pub name: Arc<str>,
    pub body: Expression,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Symbol(Arc<str>),
    Quote(Arc<Expression>),
    List(Arc<List>),
    HashMap(Arc<HakiMap>),
    File(Arc<FileHandle>),
    Primitive { name: &'static str, f: PrimitiveFn },
    Function(Arc<Closure>),
    Lambda(Arc<Closure>),
    Thunk(Arc<Thunk>),
}

#[derive(Clone)]
pub struct Expression {
    hash: u32,
    pub kind: ExprKind,
}

fn content_hash(tag: Tag, write_payload: impl FnOnce(&mut FxHasher)) -> u32 {
    let mut hasher = FxHasher::default();
    hasher.write_u8(tag as u8);
    write_payload(&mut hasher);
    let folded = hasher.finish();
    (folded ^ (folded >> 32)) as u32
}

static GENSYM_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Produces a symbol name unique within this process.
pub fn gensym(prefix: &str) -> Arc<str> {
    let n = GENSYM_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    Arc::from(format!("{}{}", prefix, n))
}

impl Expression {
    pub fn nil() -> Expression {
        Expression { hash: content_hash(Tag::Nil, |_| {}), kind: ExprKind::Nil }
    }

    pub fn bool(value: bool) -> Expression {
        Expression {
            hash: content_hash(Tag::Bool, |h| h.write_u8(value as u8)),
            kind: ExprKind::Bool(value),
        }
    }

    pub fn int(value: i64) -> Expression {
        Expression {
            hash: content_hash(Tag::Int, |h| h.write_i64(value)),
            kind: ExprKind::Int(value),
        }
    }

    pub fn float(value: f64) -> Expression {
        Expression {
            hash: content_hash(Tag::Float, |h| h.write_u64(value.to_bits())),
            kind: ExprKind::Float(value),
        }
    }

    pub fn string(value: impl Into<Arc<str>>) -> Expression {
        let value = value.into();
        Expression {
            hash: content_hash(Tag::Str, |h| h.write(value.as_bytes())),
            kind: ExprKind::Str(value),
        }
    }

    pub fn symbol(name: impl Into<Arc<str>>) -> Expression {
        let name = name.into();
        Expression {
            hash: content_hash(Tag::Symbol, |h| h.write(name.as_bytes())),
            kind: ExprKind::Symbol(name),
        }
    }

    pub fn quote(inner: Expression) -> Expression {
        Expression {
            hash: content_hash(Tag::Quote, |h| h.write_u32(inner.hash)),
            kind: ExprKind::Quote(Arc::new(inner)),
        }
    }

    pub fn list(items: List) -> Expression {
        Expression {
            hash: content_hash(Tag::List, |h| {
                for item in items.iter() {
                    h.write_u32(item.hash);
                }
            }),
            kind: ExprKind::List(Arc::new(items)),
        }
    }

    pub fn list_from<I: IntoIterator<Item = Expression>>(items: I) -> Expression {
        Expression::list(items.into_iter().collect())
    }

    /// Map hashes fold the entries sorted by key hash, so two maps with the
    /// same contents hash alike no matter the insertion order.
    pub fn hashmap(map: HakiMap) -> Expression {
        Expression {
            hash: content_hash(Tag::HashMap, |h| {
                for (key, value) in map.entries_sorted() {
                    h.write_u32(key.hash);
                    h.write_u32(value.hash);
                }
            }),
            kind: ExprKind::HashMap(Arc::new(map)),
        }
    }

    pub fn file(handle: FileHandle) -> Expression {
        Expression {
            hash: content_hash(Tag::File, |h| h.write(handle.path().as_bytes())),
            kind: ExprKind::File(Arc::new(handle)),
        }
    }

    pub fn primitive(name: &'static str, f: PrimitiveFn) -> Expression {
        Expression {
            hash: content_hash(Tag::Primitive, |h| h.write(name.as_bytes())),
            kind: ExprKind::Primitive { name, f },
        }
    }

    pub fn function(
        name: Arc<str>,
        params: Vec<Expression>,
        body: Expression,
    ) -> Expression {
        let hash = content_hash(Tag::Function, |h| {
            h.write(name.as_bytes());
            for param in &params {
                h.write_u32(param.hash);
            }
            h.write_u32(body.hash);
        });
        Expression {
            hash,
            kind: ExprKind::Function(Arc::new(Closure {
                name,
                params,
                body,
                env: None,
            })),
        }
    }

    pub fn lambda(
        env: Environment,
        name: Arc<str>,
        params: Vec<Expression>,
        body: Expression,
    ) -> Expression {
        let hash = content_hash(Tag::Lambda, |h| {
            h.write(name.as_bytes());
            for param in &params {
                h.write_u32(param.hash);
            }
            h.write_u32(body.hash);
        });
        Expression {
            hash,
            kind: ExprKind::Lambda(Arc::new(Closure {
                name,
                params,
                body,
                env: Some(env),
            })),
        }
    }

    pub fn thunk(body: Expression) -> Expression {
        let name = gensym("t");
        let hash = content_hash(Tag::Thunk, |h| {
            h.write(name.as_bytes());
            h.write_u32(body.hash);
        });
        Expression { hash, kind: ExprKind::Thunk(Arc::new(Thunk { name, body })) }
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn tag(&self) -> Tag {
        match &self.kind {
            ExprKind::Nil => Tag::Nil,
            ExprKind::Bool(_) => Tag::Bool,
            ExprKind::Int(_) => Tag::Int,
            ExprKind::Float(_) => Tag::Float,
            ExprKind::Str(_) => Tag::Str,
            ExprKind::Symbol(_) => Tag::Symbol,
            ExprKind::Quote(_) => Tag::Quote,
            ExprKind::List(_) => Tag::List,
            ExprKind::HashMap(_) => Tag::HashMap,
            ExprKind::File(_) => Tag::File,
            ExprKind::Primitive { .. } => Tag::Primitive,
            ExprKind::Function(_) => Tag::Function,
            ExprKind::Lambda(_) => Tag::Lambda,
            ExprKind::Thunk(_) => Tag::Thunk,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.tag().name()
    }

    /// `nil` and `false` are the only non-truthy values.
    pub fn is_truthy(&self) -> bool {
        match &self.kind {
            ExprKind::Nil => false,
            ExprKind::Bool(value) => *value,
            _ => true,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self.kind, ExprKind::Nil)
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, ExprKind::List(_))
    }

    pub fn symbol_text(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match &self.kind {
            ExprKind::List(items) => Some(items),
            _ => None,
        }
    }

    /// The form `prn` prints: strings lose their quotes and have `\n`, `\t`
    /// and `\r` escape sequences expanded; everything else renders as
    /// `Display` does.
    pub fn print_for_output(&self) -> String {
        match &self.kind {
            ExprKind::Str(text) => expand_escapes(text),
            _ => self.to_string(),
        }
    }
}

/// Expands the escape sequences `prn` honors. String payloads are stored
/// raw, exactly as lexed, so this is the only place `\n` becomes a newline.
pub fn expand_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Structural equality is hash equality; see the module docs.
impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Expression {}

impl std::hash::Hash for Expression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash);
    }
}

fn params_to_string(params: &[Expression]) -> String {
    let inner: Vec<String> = params.iter().map(|p| p.to_string()).collect();
    format!("({})", inner.join(" "))
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ExprKind::Nil => write!(f, "nil"),
            ExprKind::Bool(value) => write!(f, "{}", value),
            ExprKind::Int(value) => write!(f, "{}", value),
            ExprKind::Float(value) => write!(f, "{}", value),
            ExprKind::Str(text) => write!(f, "\"{}\"", text),
            ExprKind::Symbol(name) => write!(f, "{}", name),
            ExprKind::Quote(inner) => write!(f, "{}", inner),
            ExprKind::List(items) => {
                let parts: Vec<String> =
                    items.iter().map(|e| e.to_string()).collect();
                write!(f, "({})", parts.join(" "))
            }
            ExprKind::HashMap(map) => write!(f, "{}", map),
            ExprKind::File(handle) => {
                let status = if handle.is_open() { "" } else { " (closed)" };
                write!(f, "file://{}{}", handle.path(), status)
            }
            ExprKind::Primitive { name, .. } => write!(f, "builtin::{}", name),
            ExprKind::Function(c) => {
                write!(f, "fn<{} {}>", c.name, params_to_string(&c.params))
            }
            ExprKind::Lambda(c) => {
                write!(f, "lambda<{} {}>", c.name, params_to_string(&c.params))
            }
            ExprKind::Thunk(t) => write!(f, "thunk<{} {}>", t.name, t.body),
        }
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}#{:08x}", self, self.hash)
    }
}

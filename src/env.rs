//! Lexically scoped binding frames.
//!
//! An environment is a stack of local frames over one distinguished global
//! frame. The global is shared by reference between every clone, which is
//! the invariant that makes forward references work: a closure created
//! before `(defun bar ...)` still sees `bar` afterwards. Local frames are
//! snapshotted on clone (copy-on-write behind `Arc`), so closures capture
//! their lexical scope without freezing the global.

use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};

use crate::expr::Expression;
use crate::primitives;
use crate::primitives::fileio::FileHandle;

type Frame = FxHashMap<String, Expression>;

#[derive(Clone)]
pub struct Environment {
    global: Arc<Mutex<Frame>>,
    frames: Vec<Arc<Frame>>,
}

impl Environment {
    /// A fresh environment holding only the global frame, preloaded with
    /// the primitive table, the constants, and the standard streams.
    pub fn new() -> Self {
        Self::with_args(Vec::new())
    }

    /// Like [`Environment::new`], additionally binding `*args*` to the
    /// given script arguments as a list of strings.
    pub fn with_args(args: Vec<String>) -> Self {
        let mut global = Frame::default();

        for (&name, &f) in primitives::table().iter() {
            global.insert(name.to_string(), Expression::primitive(name, f));
        }

        global.insert("true".to_string(), Expression::bool(true));
        global.insert("false".to_string(), Expression::bool(false));
        global.insert("nil".to_string(), Expression::nil());
        global.insert("&stdin".to_string(), Expression::file(FileHandle::stdin()));
        global
            .insert("&stdout".to_string(), Expression::file(FileHandle::stdout()));
        global
            .insert("&stderr".to_string(), Expression::file(FileHandle::stderr()));

        global.insert(
            "*args*".to_string(),
            Expression::list_from(args.into_iter().map(Expression::string)),
        );

        Self { global: Arc::new(Mutex::new(global)), frames: Vec::new() }
    }

    /// Walks the local frames innermost first, then falls back to the
    /// global frame.
    pub fn lookup(&self, name: &str) -> Option<Expression> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.get(name) {
                return Some(value.clone());
            }
        }
        self.global.lock().unwrap().get(name).cloned()
    }

    /// Writes to the global frame; `def` and `defun` are always top-level.
    pub fn set(&self, name: &str, value: Expression) {
        self.global.lock().unwrap().insert(name.to_string(), value);
    }

    /// Writes to the current innermost frame (the global when no local
    /// frame exists). Used by thunk forcing to memoize in place.
    pub fn replace(&mut self, name: &str, value: Expression) {
        match self.frames.last_mut() {
            Some(frame) => {
                Arc::make_mut(frame).insert(name.to_string(), value);
            }
            None => self.set(name, value),
        }
    }

    /// A new environment with the local frames of `self` plus one frame
    /// binding each parameter symbol to the corresponding value. The global
    /// frame is shared, never copied.
    pub fn extend(
        &self,
        params: &[Expression],
        args: Vec<Expression>,
    ) -> Environment {
        let mut frame = Frame::default();
        for (param, value) in params.iter().zip(args) {
            if let Some(name) = param.symbol_text() {
                frame.insert(name.to_string(), value);
            }
        }

        let mut extended = self.clone();
        extended.frames.push(Arc::new(frame));
        extended
    }

    /// An environment with no local frames over the same global. Named
    /// functions are applied against this, so caller locals stay invisible.
    pub fn global_scope(&self) -> Environment {
        Environment { global: self.global.clone(), frames: Vec::new() }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#<env frames={}>", self.frames.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_holds_constants_and_primitives() {
        let env = Environment::new();
        assert_eq!(env.lookup("true"), Some(Expression::bool(true)));
        assert_eq!(env.lookup("nil"), Some(Expression::nil()));
        assert!(env.lookup("+").is_some());
        assert!(env.lookup("&stdout").is_some());
        assert!(env.lookup("no-such-binding").is_none());
    }

    #[test]
    fn inner_frames_shadow_outer_ones() {
        let env = Environment::new();
        let outer = env.extend(&[Expression::symbol("x")], vec![Expression::int(1)]);
        let inner =
            outer.extend(&[Expression::symbol("x")], vec![Expression::int(2)]);

        assert_eq!(outer.lookup("x"), Some(Expression::int(1)));
        assert_eq!(inner.lookup("x"), Some(Expression::int(2)));
    }

    #[test]
    fn set_is_visible_through_every_clone() {
        let env = Environment::new();
        let snapshot = env.clone();
        env.set("answer", Expression::int(42));
        assert_eq!(snapshot.lookup("answer"), Some(Expression::int(42)));
    }

    #[test]
    fn replace_only_touches_the_innermost_frame() {
        let env = Environment::new();
        let mut scoped =
            env.extend(&[Expression::symbol("x")], vec![Expression::int(1)]);
        scoped.replace("x", Expression::int(9));

        assert_eq!(scoped.lookup("x"), Some(Expression::int(9)));
        assert!(env.lookup("x").is_none());
    }

    #[test]
    fn replace_with_no_frames_falls_through_to_global() {
        let mut env = Environment::new();
        env.replace("g", Expression::int(5));
        assert_eq!(env.lookup("g"), Some(Expression::int(5)));
    }

    #[test]
    fn global_scope_drops_locals_but_shares_global() {
        let env = Environment::new();
        env.set("g", Expression::int(1));
        let scoped =
            env.extend(&[Expression::symbol("local")], vec![Expression::int(2)]);
        let stripped = scoped.global_scope();

        assert!(stripped.lookup("local").is_none());
        assert_eq!(stripped.lookup("g"), Some(Expression::int(1)));
    }

    #[test]
    fn args_are_bound_as_a_list_of_strings() {
        let env =
            Environment::with_args(vec!["a".to_string(), "b".to_string()]);
        let args = env.lookup("*args*").unwrap();
        assert_eq!(args.to_string(), "(\"a\" \"b\")");
    }
}

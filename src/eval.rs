//! The tail-call-optimized tree walker.
//!
//! Evaluation is a loop over `(env, expr)`, never a recursive descent in
//! tail position: `if` branches, the last clause of `do`, the body entered
//! by `let`, and function application all re-assign the pair and continue.
//! Non-tail positions (call arguments, `and`/`or` clauses, thunk forcing)
//! still recurse on the host stack.

use std::sync::Arc;

use crate::env::Environment;
use crate::error::Error;
use crate::expr::{gensym, Closure, ExprKind, Expression};
use crate::list::List;

/// Result of one trampoline step: either a finished value, or the next
/// `(expr, env)` pair to continue the loop with.
enum Step {
    Done(Expression),
    Tail { expr: Expression, env: Environment },
}

/// Wraps a body (zero or more forms) in an implicit `do`, so a single
/// expression can stand for the whole of it. An empty body becomes `nil`.
pub(crate) fn make_do(body: &List) -> Expression {
    if body.is_empty() {
        return Expression::nil();
    }
    Expression::list(body.prepend(Expression::symbol("do")))
}

/// Validates that `params` is a list of symbols and returns them.
pub(crate) fn params_from(expr: &Expression, context: &str) -> Result<Vec<Expression>, Error> {
    let list = expr.as_list().ok_or_else(|| {
        Error::TypeError(format!(
            "{} parameters must be a list, not '{}'",
            context,
            expr.type_name()
        ))
    })?;

    for param in list.iter() {
        if param.symbol_text().is_none() {
            return Err(Error::TypeError(format!(
                "{} parameter '{}' must be a symbol, not '{}'",
                context,
                param,
                param.type_name()
            )));
        }
    }

    Ok(list.iter().cloned().collect())
}

pub(crate) fn check_arity(
    closure: &Closure,
    provided: usize,
) -> Result<(), Error> {
    if closure.params.len() == provided {
        return Ok(());
    }
    Err(Error::ArityError(format!(
        "fn '{}' takes {} param(s), you provided {}",
        closure.name,
        closure.params.len(),
        provided
    )))
}

#[derive(Debug, Default)]
pub struct TcoEvaluator;

impl TcoEvaluator {
    pub fn new() -> Self {
        TcoEvaluator
    }

    /// Evaluates `expr` against `env`. Top-level definitions write through
    /// to the shared global frame; local frames created along the way die
    /// with the call.
    pub fn eval(
        &self,
        env: &Environment,
        expr: &Expression,
    ) -> Result<Expression, Error> {
        self.run(env.clone(), expr.clone())
    }

    fn run(
        &self,
        mut env: Environment,
        mut expr: Expression,
    ) -> Result<Expression, Error> {
        loop {
            match self.step(&mut env, expr)? {
                Step::Done(value) => return Ok(value),
                Step::Tail { expr: next_expr, env: next_env } => {
                    expr = next_expr;
                    env = next_env;
                }
            }
        }
    }

    fn step(
        &self,
        env: &mut Environment,
        expr: Expression,
    ) -> Result<Step, Error> {
        match &expr.kind {
            ExprKind::Symbol(name) => self.eval_symbol(env, name),
            ExprKind::Quote(inner) => Ok(Step::Done((**inner).clone())),
            ExprKind::List(items) => {
                let items = Arc::clone(items);
                self.eval_list(env, &items, expr)
            }
            // Self-evaluating: nil, numbers, strings, bools, and every
            // already-constructed runtime value.
            _ => Ok(Step::Done(expr)),
        }
    }

    fn eval_symbol(
        &self,
        env: &mut Environment,
        name: &str,
    ) -> Result<Step, Error> {
        let value = env
            .lookup(name)
            .ok_or_else(|| Error::LookupError(name.to_string()))?;

        // Force a thunked `let` binding on first dereference and memoize
        // the result in place of the thunk.
        if let ExprKind::Thunk(thunk) = &value.kind {
            let forced = self.run(env.clone(), thunk.body.clone())?;
            env.replace(name, forced.clone());
            return Ok(Step::Done(forced));
        }

        Ok(Step::Done(value))
    }

    fn eval_list(
        &self,
        env: &mut Environment,
        items: &List,
        original: Expression,
    ) -> Result<Step, Error> {
        let head = match items.head() {
            Some(head) => head.clone(),
            // The empty list evaluates to itself.
            None => return Ok(Step::Done(original)),
        };
        let rest = items.tail();

        if let Some(op) = head.symbol_text() {
            match op {
                "if" => return self.eval_if(env, &rest),
                "and" => return self.eval_and(env, &rest),
                "or" => return self.eval_or(env, &rest),
                "do" => return self.eval_do(env, &rest),
                "let" => return self.eval_let(env, &rest),
                "def" => return self.eval_def(env, &rest),
                "defun" => return self.eval_defun(env, &rest),
                "fn" | "lambda" => return self.eval_lambda(env, &rest),
                "loop" => return self.eval_loop(env, &rest, false),
                "loop-index" => return self.eval_loop(env, &rest, true),
                _ => {}
            }
        }

        self.eval_apply(env, head, &rest)
    }

    fn eval_if(&self, env: &mut Environment, args: &List) -> Result<Step, Error> {
        let argc = args.len();
        if argc < 2 {
            return Err(Error::ArityError(format!(
                "too few arguments ({}) to if",
                argc
            )));
        }
        if argc > 3 {
            return Err(Error::ArityError(format!(
                "too many arguments ({}) to if",
                argc
            )));
        }

        let test = self.run(env.clone(), args.head().unwrap().clone())?;
        let branches = args.tail();

        if test.is_truthy() {
            return Ok(Step::Tail {
                expr: branches.head().unwrap().clone(),
                env: env.clone(),
            });
        }

        match branches.tail().head() {
            Some(else_branch) => Ok(Step::Tail {
                expr: else_branch.clone(),
                env: env.clone(),
            }),
            None => Ok(Step::Done(Expression::nil())),
        }
    }

    /// Short-circuit and: first non-truthy clause wins, else the last
    /// value. Not a tail position.
    fn eval_and(&self, env: &mut Environment, args: &List) -> Result<Step, Error> {
        let mut result = Expression::nil();
        for clause in args.iter() {
            result = self.run(env.clone(), clause.clone())?;
            if !result.is_truthy() {
                return Ok(Step::Done(result));
            }
        }
        Ok(Step::Done(result))
    }

    /// Short-circuit or: first truthy clause wins, else the last value.
    fn eval_or(&self, env: &mut Environment, args: &List) -> Result<Step, Error> {
        let mut result = Expression::nil();
        for clause in args.iter() {
            result = self.run(env.clone(), clause.clone())?;
            if result.is_truthy() {
                return Ok(Step::Done(result));
            }
        }
        Ok(Step::Done(result))
    }

    fn eval_do(&self, env: &mut Environment, args: &List) -> Result<Step, Error> {
        if args.is_empty() {
            return Ok(Step::Done(Expression::nil()));
        }

        let mut clauses: Vec<Expression> = args.iter().cloned().collect();
        let last = clauses.pop().unwrap();
        for clause in clauses {
            self.run(env.clone(), clause)?;
        }

        Ok(Step::Tail { expr: last, env: env.clone() })
    }

    /// `(let (name value ...) body...)` with mutually recursive bindings:
    /// every right-hand side is wrapped as an unevaluated thunk and all
    /// names are bound before any thunk is forced.
    fn eval_let(&self, env: &mut Environment, args: &List) -> Result<Step, Error> {
        let clauses = args.head().ok_or_else(|| {
            Error::ArityError("let requires a binding list".to_string())
        })?;
        let clauses = clauses.as_list().ok_or_else(|| {
            Error::TypeError(
                "let bindings should be a list (let (a 1 b 2) ...)".to_string(),
            )
        })?;

        if clauses.len() % 2 != 0 {
            return Err(Error::ArityError(
                "let bindings must contain an even number of left/right pairs"
                    .to_string(),
            ));
        }

        let mut names = Vec::with_capacity(clauses.len() / 2);
        let mut thunks = Vec::with_capacity(clauses.len() / 2);
        let mut iter = clauses.iter();
        while let (Some(name), Some(value)) = (iter.next(), iter.next()) {
            if name.symbol_text().is_none() {
                return Err(Error::TypeError(format!(
                    "let binding name '{}' must be a symbol, not '{}'",
                    name,
                    name.type_name()
                )));
            }
            names.push(name.clone());
            thunks.push(Expression::thunk(value.clone()));
        }

        let extended = env.extend(&names, thunks);
        Ok(Step::Tail { expr: make_do(&args.tail()), env: extended })
    }

    fn eval_def(&self, env: &mut Environment, args: &List) -> Result<Step, Error> {
        let name = args.head().ok_or_else(|| {
            Error::ArityError("def requires a name and a value".to_string())
        })?;
        let name = name.symbol_text().ok_or_else(|| {
            Error::TypeError("def name must be a symbol".to_string())
        })?;

        let value = self.run(env.clone(), make_do(&args.tail()))?;
        env.set(name, value.clone());
        Ok(Step::Done(value))
    }

    fn eval_defun(&self, env: &mut Environment, args: &List) -> Result<Step, Error> {
        let name = args.head().ok_or_else(|| {
            Error::ArityError(
                "defun requires a name, parameters, and a body".to_string(),
            )
        })?;
        let name_text = name.symbol_text().ok_or_else(|| {
            Error::TypeError("defun name must be a symbol".to_string())
        })?;

        let rest = args.tail();
        let params_expr = rest.head().ok_or_else(|| {
            Error::ArityError(
                "defun requires a parameter list after the name".to_string(),
            )
        })?;
        let params = params_from(params_expr, "defun")?;
        let body = make_do(&rest.tail());

        let function =
            Expression::function(Arc::from(name_text), params, body);
        env.set(name_text, function.clone());
        Ok(Step::Done(function))
    }

    /// `(fn (params) body...)` — an anonymous function closing over a
    /// snapshot of the current lexical frames.
    fn eval_lambda(&self, env: &mut Environment, args: &List) -> Result<Step, Error> {
        let params_expr = args.head().ok_or_else(|| {
            Error::ArityError("fn requires a parameter list".to_string())
        })?;
        let params = params_from(params_expr, "fn")?;
        let body = make_do(&args.tail());

        Ok(Step::Done(Expression::lambda(
            env.clone(),
            gensym("fn"),
            params,
            body,
        )))
    }

    /// `(loop f lst)` / `(loop-index f lst)`: apply `f` to every element of
    /// `lst` (with its index first, for `loop-index`). Returns `nil`.
    fn eval_loop(
        &self,
        env: &mut Environment,
        args: &List,
        with_index: bool,
    ) -> Result<Step, Error> {
        let name = if with_index { "loop-index" } else { "loop" };
        if args.len() != 2 {
            return Err(Error::ArityError(format!(
                "({} f lst) takes 2 args, you provided {}",
                name,
                args.len()
            )));
        }

        let func = self.run(env.clone(), args.head().unwrap().clone())?;
        let elements =
            self.run(env.clone(), args.tail().head().unwrap().clone())?;
        let elements = elements.as_list().ok_or_else(|| {
            Error::TypeError(format!(
                "({} f lst) expects 'lst' to be a 'list', not '{}'",
                name,
                elements.type_name()
            ))
        })?;

        for (index, element) in elements.iter().enumerate() {
            let call_args = if with_index {
                vec![Expression::int(index as i64), element.clone()]
            } else {
                vec![element.clone()]
            };
            self.apply(env, &func, call_args)?;
        }

        Ok(Step::Done(Expression::nil()))
    }

    /// Default list case: evaluate the head, evaluate the arguments left to
    /// right, dispatch on what the head turned out to be. User functions
    /// and lambdas are entered as tail calls.
    fn eval_apply(
        &self,
        env: &mut Environment,
        head: Expression,
        args: &List,
    ) -> Result<Step, Error> {
        let func = self.run(env.clone(), head)?;

        let mut argv = Vec::with_capacity(args.len());
        for arg in args.iter() {
            argv.push(self.run(env.clone(), arg.clone())?);
        }

        match &func.kind {
            ExprKind::Primitive { f, .. } => Ok(Step::Done(f(&argv)?)),
            ExprKind::Function(closure) => {
                check_arity(closure, argv.len())?;
                let call_env = env.global_scope().extend(&closure.params, argv);
                Ok(Step::Tail { expr: closure.body.clone(), env: call_env })
            }
            ExprKind::Lambda(closure) => {
                check_arity(closure, argv.len())?;
                let captured = closure
                    .env
                    .as_ref()
                    .unwrap_or_else(|| unreachable!("lambda without capture"));
                let call_env = captured.extend(&closure.params, argv);
                Ok(Step::Tail { expr: closure.body.clone(), env: call_env })
            }
            _ => Err(Error::TypeError(format!(
                "'{}' ({}) is not invokable",
                func,
                func.type_name()
            ))),
        }
    }

    /// Applies an already-evaluated function value to evaluated arguments.
    /// Used where the call is not in tail position (the `loop` forms).
    pub(crate) fn apply(
        &self,
        env: &Environment,
        func: &Expression,
        args: Vec<Expression>,
    ) -> Result<Expression, Error> {
        match &func.kind {
            ExprKind::Primitive { f, .. } => f(&args),
            ExprKind::Function(closure) => {
                check_arity(closure, args.len())?;
                let call_env = env.global_scope().extend(&closure.params, args);
                self.run(call_env, closure.body.clone())
            }
            ExprKind::Lambda(closure) => {
                check_arity(closure, args.len())?;
                let captured = closure
                    .env
                    .as_ref()
                    .unwrap_or_else(|| unreachable!("lambda without capture"));
                let call_env = captured.extend(&closure.params, args);
                self.run(call_env, closure.body.clone())
            }
            _ => Err(Error::TypeError(format!(
                "'{}' ({}) is not invokable",
                func,
                func.type_name()
            ))),
        }
    }
}

//! A fully recursive evaluator with the same semantics as the trampolined
//! one, kept around for differential testing. Deep tail recursion will
//! exhaust the host stack here; that is the point of the comparison.

use std::sync::Arc;

use crate::env::Environment;
use crate::error::Error;
use crate::eval::{check_arity, make_do, params_from};
use crate::expr::{gensym, ExprKind, Expression};
use crate::list::List;

#[derive(Debug, Default)]
pub struct NaiveEvaluator;

impl NaiveEvaluator {
    pub fn new() -> Self {
        NaiveEvaluator
    }

    pub fn eval(
        &self,
        env: &Environment,
        expr: &Expression,
    ) -> Result<Expression, Error> {
        let mut scope = env.clone();
        self.eval_in(&mut scope, expr)
    }

    fn eval_in(
        &self,
        env: &mut Environment,
        expr: &Expression,
    ) -> Result<Expression, Error> {
        match &expr.kind {
            ExprKind::Symbol(name) => self.eval_symbol(env, name),
            ExprKind::Quote(inner) => Ok((**inner).clone()),
            ExprKind::List(items) => {
                let items = Arc::clone(items);
                self.eval_list(env, &items, expr)
            }
            _ => Ok(expr.clone()),
        }
    }

    fn eval_symbol(
        &self,
        env: &mut Environment,
        name: &str,
    ) -> Result<Expression, Error> {
        let value = env
            .lookup(name)
            .ok_or_else(|| Error::LookupError(name.to_string()))?;

        if let ExprKind::Thunk(thunk) = &value.kind {
            let body = thunk.body.clone();
            let forced = self.eval_in(&mut env.clone(), &body)?;
            env.replace(name, forced.clone());
            return Ok(forced);
        }

        Ok(value)
    }

    fn eval_list(
        &self,
        env: &mut Environment,
        items: &List,
        original: &Expression,
    ) -> Result<Expression, Error> {
        let head = match items.head() {
            Some(head) => head.clone(),
            None => return Ok(original.clone()),
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

        let func = self.eval_in(env, &head)?;
        let mut argv = Vec::with_capacity(rest.len());
        for arg in rest.iter() {
            argv.push(self.eval_in(env, arg)?);
        }
        self.apply(env, &func, argv)
    }

    fn eval_if(
        &self,
        env: &mut Environment,
        args: &List,
    ) -> Result<Expression, Error> {
        let argc = args.len();
        if !(2..=3).contains(&argc) {
            return Err(Error::ArityError(format!(
                "wrong number of arguments ({}) to if",
                argc
            )));
        }

        let test = self.eval_in(env, args.head().unwrap())?;
        let branches = args.tail();
        if test.is_truthy() {
            return self.eval_in(env, branches.head().unwrap());
        }
        match branches.tail().head() {
            Some(else_branch) => self.eval_in(env, else_branch),
            None => Ok(Expression::nil()),
        }
    }

    fn eval_and(
        &self,
        env: &mut Environment,
        args: &List,
    ) -> Result<Expression, Error> {
        let mut result = Expression::nil();
        for clause in args.iter() {
            result = self.eval_in(env, clause)?;
            if !result.is_truthy() {
                return Ok(result);
            }
        }
        Ok(result)
    }

    fn eval_or(
        &self,
        env: &mut Environment,
        args: &List,
    ) -> Result<Expression, Error> {
        let mut result = Expression::nil();
        for clause in args.iter() {
            result = self.eval_in(env, clause)?;
            if result.is_truthy() {
                return Ok(result);
            }
        }
        Ok(result)
    }

    fn eval_do(
        &self,
        env: &mut Environment,
        args: &List,
    ) -> Result<Expression, Error> {
        let mut result = Expression::nil();
        for clause in args.iter() {
            result = self.eval_in(env, clause)?;
        }
        Ok(result)
    }

    fn eval_let(
        &self,
        env: &mut Environment,
        args: &List,
    ) -> Result<Expression, Error> {
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

        let mut names = Vec::new();
        let mut thunks = Vec::new();
        let mut iter = clauses.iter();
        while let (Some(name), Some(value)) = (iter.next(), iter.next()) {
            if name.symbol_text().is_none() {
                return Err(Error::TypeError(format!(
                    "let binding name '{}' must be a symbol",
                    name
                )));
            }
            names.push(name.clone());
            thunks.push(Expression::thunk(value.clone()));
        }

        let mut extended = env.extend(&names, thunks);
        let body = make_do(&args.tail());
        self.eval_in(&mut extended, &body)
    }

    fn eval_def(
        &self,
        env: &mut Environment,
        args: &List,
    ) -> Result<Expression, Error> {
        let name = args.head().ok_or_else(|| {
            Error::ArityError("def requires a name and a value".to_string())
        })?;
        let name = name.symbol_text().ok_or_else(|| {
            Error::TypeError("def name must be a symbol".to_string())
        })?;

        let body = make_do(&args.tail());
        let value = self.eval_in(env, &body)?;
        env.set(name, value.clone());
        Ok(value)
    }

    fn eval_defun(
        &self,
        env: &mut Environment,
        args: &List,
    ) -> Result<Expression, Error> {
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

        let function = Expression::function(Arc::from(name_text), params, body);
        env.set(name_text, function.clone());
        Ok(function)
    }

    fn eval_lambda(
        &self,
        env: &mut Environment,
        args: &List,
    ) -> Result<Expression, Error> {
        let params_expr = args.head().ok_or_else(|| {
            Error::ArityError("fn requires a parameter list".to_string())
        })?;
        let params = params_from(params_expr, "fn")?;
        let body = make_do(&args.tail());

        Ok(Expression::lambda(env.clone(), gensym("fn"), params, body))
    }

    fn eval_loop(
        &self,
        env: &mut Environment,
        args: &List,
        with_index: bool,
    ) -> Result<Expression, Error> {
        let name = if with_index { "loop-index" } else { "loop" };
        if args.len() != 2 {
            return Err(Error::ArityError(format!(
                "({} f lst) takes 2 args, you provided {}",
                name,
                args.len()
            )));
        }

        let func = self.eval_in(env, args.head().unwrap())?;
        let elements = self.eval_in(env, args.tail().head().unwrap())?;
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

        Ok(Expression::nil())
    }

    fn apply(
        &self,
        env: &Environment,
        func: &Expression,
        args: Vec<Expression>,
    ) -> Result<Expression, Error> {
        match &func.kind {
            ExprKind::Primitive { f, .. } => f(&args),
            ExprKind::Function(closure) => {
                check_arity(closure, args.len())?;
                let mut call_env =
                    env.global_scope().extend(&closure.params, args);
                self.eval_in(&mut call_env, &closure.body.clone())
            }
            ExprKind::Lambda(closure) => {
                check_arity(closure, args.len())?;
                let captured = closure
                    .env
                    .as_ref()
                    .unwrap_or_else(|| unreachable!("lambda without capture"));
                let mut call_env = captured.extend(&closure.params, args);
                self.eval_in(&mut call_env, &closure.body.clone())
            }
            _ => Err(Error::TypeError(format!(
                "'{}' ({}) is not invokable",
                func,
                func.type_name()
            ))),
        }
    }
}

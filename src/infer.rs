//! The inference walk (C5) and the engine state it, `unify`, and
//! `generalize` share: current level, gensym counter, and the deferred
//! adjustment queue. Per §9's design note, this state lives on an `Engine`
//! value constructed fresh for each top-level call — never as a global.

use std::rc::Rc;

use stacker;

use crate::errors::TypeError;
use crate::syntax::ast::Expr;
use crate::ty::{self, Type};

/// Identifier -> type scheme, with stack-like (LIFO) shadowing: the most
/// recently pushed binding for a name wins, and `unbind` pops exactly the
/// last push. This matches the source's "shared mutable environment map"
/// semantics even though we never actually mutate in place.
#[derive(Clone, Default)]
pub struct Env {
    bindings: Vec<(Rc<str>, Type)>,
}

impl Env {
    pub fn new() -> Self {
        Env { bindings: Vec::new() }
    }

    pub fn bind(&mut self, name: Rc<str>, scheme: Type) {
        self.bindings.push((name, scheme));
    }

    pub fn unbind(&mut self) {
        self.bindings.pop();
    }

    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.bindings.iter().rev().find(|(n, _)| n.as_ref() == name).map(|(_, t)| t)
    }
}

/// Per-call inference state: current `let`-nesting depth, the gensym
/// counter for fresh unification variables, and the adjustment queue that
/// `unify`'s `update_level` defers onto and `generalize`'s `force_adj_q`
/// drains. Reset at the start of every `top_typeof`.
pub struct Engine {
    pub(crate) cur_level: ty::Level,
    pub(crate) gensym_ctr: ty::VarId,
    pub(crate) adj_q: Vec<Type>,
}

impl Engine {
    pub fn new() -> Self {
        Engine { cur_level: 0, gensym_ctr: 0, adj_q: Vec::new() }
    }

    fn gensym(&mut self) -> ty::VarId {
        let id = self.gensym_ctr;
        self.gensym_ctr += 1;
        id
    }

    pub fn new_var(&mut self) -> Type {
        let id = self.gensym();
        ty::new_var(id, self.cur_level)
    }

    pub fn new_arrow(&mut self, params: Vec<Type>, result: Type) -> Type {
        ty::new_arrow(self.cur_level, params, result)
    }

    pub fn new_app(&mut self, head: Type, args: Vec<Type>) -> Type {
        ty::new_app(self.cur_level, head, args)
    }

    fn enter_level(&mut self) {
        self.cur_level += 1;
    }

    fn leave_level(&mut self) {
        self.cur_level -= 1;
    }

    fn typeof_expr(&mut self, env: &mut Env, expr: &Expr) -> Result<Type, TypeError> {
        match expr {
            Expr::Var(name) => {
                let scheme = env
                    .lookup(name)
                    .cloned()
                    .ok_or_else(|| TypeError::UnboundVariable(name.to_string()))?;
                Ok(self.inst(&scheme))
            }
            Expr::Fun(params, body) => {
                let mut param_types = Vec::with_capacity(params.len());
                for p in params {
                    let pt = self.new_var();
                    env.bind(p.clone(), pt.clone());
                    param_types.push(pt);
                }
                let body_ty = self.typeof_expr(env, body);
                for _ in params {
                    env.unbind();
                }
                let body_ty = body_ty?;
                Ok(self.new_arrow(param_types, body_ty))
            }
            Expr::App(f, args) => {
                let f_ty = self.typeof_expr(env, f)?;
                let mut arg_types = Vec::with_capacity(args.len());
                for a in args {
                    arg_types.push(self.typeof_expr(env, a)?);
                }
                let ret_ty = self.new_var();
                let arrow = self.new_arrow(arg_types, ret_ty.clone());
                self.unify(&f_ty, &arrow)?;
                Ok(ret_ty)
            }
            Expr::Let(name, bound, body) => {
                self.enter_level();
                let bound_ty = self.typeof_expr(env, bound);
                self.leave_level();
                let bound_ty = bound_ty?;
                self.gen(&bound_ty)?;
                env.bind(name.clone(), bound_ty);
                let body_ty = self.typeof_expr(env, body);
                env.unbind();
                body_ty
            }
        }
    }

    /// Resets gensym/cur_level/the adjustment queue, runs the walk, then a
    /// final cycle check over the resulting type.
    pub fn top_typeof(&mut self, env: &mut Env, expr: &Expr) -> Result<Type, TypeError> {
        self.gensym_ctr = 0;
        self.cur_level = 0;
        self.adj_q.clear();
        let result_ty = stacker::maybe_grow(32 * 1024, 8 * 1024 * 1024, || self.typeof_expr(env, expr))?;
        self.check_acyclic(&result_ty)?;
        Ok(result_ty)
    }

    pub(crate) fn check_acyclic(&self, t: &Type) -> Result<(), TypeError> {
        let t = ty::find(t);
        match &t {
            Type::Const(_) | Type::Var(_) => Ok(()),
            Type::Arrow(node) => {
                self.check_acyclic_composite(&node.level_new, ty::arrow_children(node))
            }
            Type::App(node) => self.check_acyclic_composite(&node.level_new, ty::app_children(node)),
        }
    }

    fn check_acyclic_composite(
        &self,
        level_new: &std::cell::Cell<ty::Level>,
        children: Vec<Type>,
    ) -> Result<(), TypeError> {
        if level_new.get() == ty::GRAY_LEVEL {
            return Err(TypeError::Cycle);
        }
        let saved = level_new.get();
        level_new.set(ty::GRAY_LEVEL);
        let result = children.iter().try_for_each(|c| self.check_acyclic(c));
        level_new.set(saved);
        result
    }
}

#[cfg(test)]
mod infer_tests {
    use super::*;
    use crate::builtins;
    use crate::printer;
    use crate::syntax::parser;

    fn run(src: &str) -> Result<String, TypeError> {
        let expr = parser::parse_expr(src).expect("parse failed");
        let mut engine = Engine::new();
        let mut env = Env::new();
        builtins::with_core_env(|prims| {
            for (name, scheme) in prims {
                env.bind(name.clone(), scheme.clone());
            }
        });
        let ty = engine.top_typeof(&mut env, &expr)?;
        Ok(printer::print(&ty))
    }

    #[test]
    fn identity_function() {
        assert_eq!(run("fun x -> x").unwrap(), "forall[a] a -> a");
    }

    #[test]
    fn let_generalizes_before_reuse() {
        assert_eq!(run("let f = fun x -> x in f(f)").unwrap(), "forall[a] a -> a");
    }

    #[test]
    fn let_generalization_allows_two_monomorphic_uses() {
        assert_eq!(
            run("let f = fun x -> x in pair(f(one), f(true))").unwrap(),
            "pair[int, bool]"
        );
    }

    #[test]
    fn nested_let_keeps_variables_distinct() {
        assert_eq!(
            run("fun x -> let y = fun z -> z in y").unwrap(),
            "forall[a b] a -> b -> b"
        );
    }

    #[test]
    fn self_application_is_a_cycle() {
        assert_eq!(run("fun x -> x(x)").unwrap_err(), TypeError::Cycle);
    }

    #[test]
    fn applying_a_non_function_fails() {
        assert!(matches!(run("one(one)").unwrap_err(), TypeError::Fail { .. }));
    }

    #[test]
    fn wrong_arity_is_a_length_error() {
        assert!(matches!(
            run("plus(one)").unwrap_err(),
            TypeError::Length { expected: 2, found: 1 }
        ));
    }

    #[test]
    fn unbound_identifier_is_reported() {
        assert_eq!(
            run("frobnicate").unwrap_err(),
            TypeError::UnboundVariable("frobnicate".to_string())
        );
    }
}

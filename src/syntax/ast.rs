//! Expression AST (§3): the surface syntax's parse target and `infer`'s
//! input. Immutable once parsed — the inferencer never mutates an `Expr`.

use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Identifier reference.
    Var(Rc<str>),
    /// Multi-argument lambda.
    Fun(Vec<Rc<str>>, Box<Expr>),
    /// Multi-argument application.
    App(Box<Expr>, Vec<Expr>),
    /// Non-recursive let.
    Let(Rc<str>, Box<Expr>, Box<Expr>),
}

//! Type representation: mutable unification variables and the composite
//! nodes that carry level metadata (§4.1). Everything downstream (`unify`,
//! `generalize`, `infer`) begins by calling `find` on any type it inspects.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::errors;

pub type VarId = u32;
pub type Level = i64;

/// This node is on the active traversal/unify stack; re-entering it is a cycle.
pub const GRAY_LEVEL: Level = -1;
/// This variable or node has been generalized and is copied fresh at each use.
pub const GENERIC_LEVEL: Level = 19921213;

#[derive(Clone)]
pub enum Type {
    Const(Rc<str>),
    Var(VarCell),
    Arrow(Rc<ArrowNode>),
    App(Rc<AppNode>),
}

#[derive(Clone)]
pub struct VarCell(Rc<RefCell<VarData>>);

pub enum VarData {
    Unbound { id: VarId, level: Level },
    Link(Type),
}

pub struct ArrowNode {
    pub params: Vec<Type>,
    pub result: Type,
    pub level_old: Cell<Level>,
    pub level_new: Cell<Level>,
}

pub struct AppNode {
    pub head: Type,
    pub args: Vec<Type>,
    pub level_old: Cell<Level>,
    pub level_new: Cell<Level>,
}

impl VarCell {
    pub fn borrow(&self) -> std::cell::Ref<VarData> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> std::cell::RefMut<VarData> {
        self.0.borrow_mut()
    }

    fn ptr_eq(&self, other: &VarCell) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

pub fn new_var(id: VarId, level: Level) -> Type {
    Type::Var(VarCell(Rc::new(RefCell::new(VarData::Unbound { id, level }))))
}

pub fn new_arrow(level: Level, params: Vec<Type>, result: Type) -> Type {
    Type::Arrow(Rc::new(ArrowNode {
        params,
        result,
        level_old: Cell::new(level),
        level_new: Cell::new(level),
    }))
}

pub fn new_app(level: Level, head: Type, args: Vec<Type>) -> Type {
    Type::App(Rc::new(AppNode {
        head,
        args,
        level_old: Cell::new(level),
        level_new: Cell::new(level),
    }))
}

pub fn new_const(name: impl Into<Rc<str>>) -> Type {
    Type::Const(name.into())
}

/// Walks `Link` chains with path compression: every visited `Link` is
/// rewritten to point directly at the terminal representative.
pub fn find(t: &Type) -> Type {
    match t {
        Type::Var(cell) => {
            let target = match &*cell.borrow() {
                VarData::Unbound { .. } => return t.clone(),
                VarData::Link(inner) => inner.clone(),
            };
            let root = find(&target);
            *cell.borrow_mut() = VarData::Link(root.clone());
            root
        }
        _ => t.clone(),
    }
}

/// Must only be called on the result of `find` — never on a `Link`.
pub fn level(t: &Type) -> Level {
    match t {
        Type::Const(_) => 0,
        Type::Var(cell) => match &*cell.borrow() {
            VarData::Unbound { level, .. } => *level,
            VarData::Link(_) => errors::err_level_on_link(line!()),
        },
        Type::Arrow(node) => node.level_new.get(),
        Type::App(node) => node.level_new.get(),
    }
}

/// True if `a` and `b` are the exact same node (same cell / same Rc), used
/// by `unify`'s fast path. Two distinct `Const`s with the same name are
/// *not* `same_ref` — they're compared structurally by the caller instead.
pub fn same_ref(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::Var(x), Type::Var(y)) => x.ptr_eq(y),
        (Type::Arrow(x), Type::Arrow(y)) => Rc::ptr_eq(x, y),
        (Type::App(x), Type::App(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// Structural children of an `Arrow`, in the order unify/generalize walk them.
pub fn arrow_children(node: &ArrowNode) -> Vec<Type> {
    node.params
        .iter()
        .cloned()
        .chain(std::iter::once(node.result.clone()))
        .collect()
}

/// Structural children of an `App` — the head first, then the arguments.
pub fn app_children(node: &AppNode) -> Vec<Type> {
    std::iter::once(node.head.clone())
        .chain(node.args.iter().cloned())
        .collect()
}

#[cfg(test)]
mod ty_tests {
    use super::*;

    #[test]
    fn find_compresses_link_chains() {
        let a = new_var(0, 0);
        let b = new_var(1, 0);
        let c = new_const("int");
        if let Type::Var(cell) = &a {
            *cell.borrow_mut() = VarData::Link(b.clone());
        }
        if let Type::Var(cell) = &b {
            *cell.borrow_mut() = VarData::Link(c.clone());
        }
        let root = find(&a);
        assert!(matches!(root, Type::Const(ref n) if &**n == "int"));
        if let Type::Var(cell) = &a {
            match &*cell.borrow() {
                VarData::Link(t) => assert!(matches!(t, Type::Const(_))),
                VarData::Unbound { .. } => panic!("expected compressed link"),
            }
        }
    }

    #[test]
    fn same_ref_identifies_shared_cells() {
        let a = new_var(0, 0);
        let b = a.clone();
        let c = new_var(1, 0);
        assert!(same_ref(&a, &b));
        assert!(!same_ref(&a, &c));
    }

    #[test]
    fn level_reads_composite_level_new() {
        let arrow = new_arrow(3, vec![new_const("int")], new_const("bool"));
        assert_eq!(level(&arrow), 3);
    }
}

//! Level adjustment (C2) and the unifier (C3). Both live here because the
//! adjustment queue `unify` defers onto is exactly the queue `generalize`
//! drains — the two are one conversation about the same piece of state.

use crate::errors::TypeError;
use crate::infer::Engine;
use crate::printer;
use crate::ty::{self, Level, Type, VarData, GRAY_LEVEL};

impl Engine {
    /// `find`s `t`, then lowers its recorded level to `l` if `l` is
    /// smaller. Composite nodes are never walked into here — lowering a
    /// composite's own `level_new` is all that happens; structural
    /// children are only visited later, by `force_adj_q`.
    pub fn update_level(&mut self, l: Level, t: &Type) -> Result<(), TypeError> {
        let t = ty::find(t);
        match &t {
            Type::Const(_) => Ok(()),
            Type::Var(cell) => {
                let mut data = cell.borrow_mut();
                match &mut *data {
                    VarData::Unbound { level, .. } => {
                        if l < *level {
                            *level = l;
                        }
                        Ok(())
                    }
                    VarData::Link(_) => crate::errors::err_update_level_on_link(line!()),
                }
            }
            Type::Arrow(node) => self.update_composite_level(l, &node.level_old, &node.level_new, &t),
            Type::App(node) => self.update_composite_level(l, &node.level_old, &node.level_new, &t),
        }
    }

    fn update_composite_level(
        &mut self,
        l: Level,
        level_old: &std::cell::Cell<Level>,
        level_new: &std::cell::Cell<Level>,
        t: &Type,
    ) -> Result<(), TypeError> {
        if level_new.get() == GRAY_LEVEL {
            return Err(TypeError::Cycle);
        }
        if l < level_new.get() {
            if level_new.get() == level_old.get() {
                self.adj_q.push(t.clone());
            }
            level_new.set(l);
        }
        Ok(())
    }

    /// Drains the adjustment queue exactly once per call (invoked at the
    /// start of `generalize`). Nodes outside the region being generalized
    /// (`level_old <= cur_level`) are put back untouched for a future,
    /// shallower call to settle; everyone else gets their children's
    /// levels actually propagated down, gray-marked for the duration so a
    /// structural cycle in the type graph itself is caught.
    pub fn force_adj_q(&mut self) -> Result<(), TypeError> {
        let mut survivors = Vec::new();
        while let Some(raw) = self.adj_q.pop() {
            let t = ty::find(&raw);
            let (level_old, level_new, children) = match &t {
                Type::Arrow(node) => (&node.level_old, &node.level_new, ty::arrow_children(node)),
                Type::App(node) => (&node.level_old, &node.level_new, ty::app_children(node)),
                _ => crate::errors::err_adjust_non_composite(line!()),
            };

            if level_old.get() <= self.cur_level {
                survivors.push(t.clone());
                continue;
            }
            if level_old.get() == level_new.get() {
                continue;
            }

            let target = level_new.get();
            level_new.set(GRAY_LEVEL);
            for child in &children {
                if let Err(e) = self.update_level(target, child) {
                    level_new.set(target);
                    self.adj_q = survivors;
                    return Err(e);
                }
            }
            level_new.set(target);
            level_old.set(target);
        }
        self.adj_q = survivors;
        Ok(())
    }

    /// Structural unification with level propagation and cycle detection.
    pub fn unify(&mut self, a: &Type, b: &Type) -> Result<(), TypeError> {
        let a = ty::find(a);
        let b = ty::find(b);
        if ty::same_ref(&a, &b) {
            return Ok(());
        }
        match (&a, &b) {
            (Type::Const(x), Type::Const(y)) if x == y => Ok(()),
            (Type::Var(cell), _) => self.bind_var(cell, &b),
            (_, Type::Var(cell)) => self.bind_var(cell, &a),
            (Type::Arrow(n1), Type::Arrow(n2)) => self.unify_composite(
                &n1.level_old,
                &n1.level_new,
                &n2.level_old,
                &n2.level_new,
                (n1.params.len(), n2.params.len()),
                ty::arrow_children(n1),
                ty::arrow_children(n2),
            ),
            (Type::App(n1), Type::App(n2)) => self.unify_composite(
                &n1.level_old,
                &n1.level_new,
                &n2.level_old,
                &n2.level_new,
                (n1.args.len(), n2.args.len()),
                ty::app_children(n1),
                ty::app_children(n2),
            ),
            _ => Err(TypeError::Fail { expected: printer::print(&a), found: printer::print(&b) }),
        }
    }

    /// `find`s `a`, lowers its level to `l`, then unifies it with `b`.
    pub fn unify_level(&mut self, l: Level, a: &Type, b: &Type) -> Result<(), TypeError> {
        let a = ty::find(a);
        self.update_level(l, &a)?;
        self.unify(&a, b)
    }

    fn bind_var(&mut self, cell: &ty::VarCell, other: &Type) -> Result<(), TypeError> {
        let level = match &*cell.borrow() {
            VarData::Unbound { level, .. } => *level,
            VarData::Link(_) => crate::errors::err_bind_linked_var(line!()),
        };
        self.update_level(level, other)?;
        *cell.borrow_mut() = VarData::Link(other.clone());
        Ok(())
    }

    fn unify_composite(
        &mut self,
        lo1: &std::cell::Cell<Level>,
        ln1: &std::cell::Cell<Level>,
        lo2: &std::cell::Cell<Level>,
        ln2: &std::cell::Cell<Level>,
        arity: (usize, usize),
        children1: Vec<Type>,
        children2: Vec<Type>,
    ) -> Result<(), TypeError> {
        if ln1.get() == GRAY_LEVEL || ln2.get() == GRAY_LEVEL {
            return Err(TypeError::Cycle);
        }
        // `children*` include the result (Arrow) / head (App), which would
        // make this off by one against the params/args arity the spec's
        // `Length` error reports; `arity` carries the reportable counts.
        if arity.0 != arity.1 {
            return Err(TypeError::Length { expected: arity.0, found: arity.1 });
        }

        let lvl = ln1.get().min(ln2.get());
        ln1.set(GRAY_LEVEL);
        ln2.set(GRAY_LEVEL);

        let result = (|| {
            for (c1, c2) in children1.iter().zip(children2.iter()) {
                self.unify_level(lvl, c1, c2)?;
            }
            Ok(())
        })();

        ln1.set(lvl);
        ln2.set(lvl);
        result
    }
}

#[cfg(test)]
mod unify_tests {
    use super::*;
    use crate::ty::new_const;

    #[test]
    fn identical_consts_unify() {
        let mut engine = Engine::new();
        assert!(engine.unify(&new_const("int"), &new_const("int")).is_ok());
    }

    #[test]
    fn mismatched_consts_fail() {
        let mut engine = Engine::new();
        assert!(matches!(
            engine.unify(&new_const("int"), &new_const("bool")),
            Err(TypeError::Fail { .. })
        ));
    }

    #[test]
    fn var_binds_to_const_and_link_is_observed_through_clone() {
        let mut engine = Engine::new();
        let v = engine.new_var();
        let v_alias = v.clone();
        engine.unify(&v, &new_const("int")).unwrap();
        assert!(matches!(ty::find(&v_alias), Type::Const(ref n) if &**n == "int"));
    }

    #[test]
    fn self_application_cycles() {
        // `update_level` never walks a composite's children (§4.2), so
        // linking `v` to `(v) -> ret` succeeds here; the occurs check only
        // fires later, when `top_typeof`'s final `check_acyclic` re-walks
        // the result and re-enters this now-self-referential arrow.
        let mut engine = Engine::new();
        let v = engine.new_var();
        let ret = engine.new_var();
        let arrow = engine.new_arrow(vec![v.clone()], ret);
        assert!(engine.unify(&v, &arrow).is_ok());
        assert!(matches!(engine.check_acyclic(&arrow), Err(TypeError::Cycle)));
    }

    #[test]
    fn arity_mismatch_is_length_error() {
        let mut engine = Engine::new();
        let a1 = engine.new_arrow(vec![new_const("int")], new_const("bool"));
        let a2 = engine.new_arrow(vec![new_const("int"), new_const("int")], new_const("bool"));
        assert!(matches!(
            engine.unify(&a1, &a2),
            Err(TypeError::Length { expected: 1, found: 2 })
        ));
    }
}

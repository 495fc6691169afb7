//! Generalize / instantiate (C4), per spec.md §4.4. Lives on `Engine`
//! alongside `unify` since `gen` starts by draining the same adjustment
//! queue `unify`'s `update_level` defers onto.

use std::collections::HashMap;

use crate::errors::TypeError;
use crate::infer::Engine;
use crate::ty::{self, Level, Type, VarData, VarId, GENERIC_LEVEL};

impl Engine {
    /// Called after leaving a `let`-bound expression's scope (`cur_level`
    /// is back to the surrounding level). Drains the adjustment queue
    /// first — `force_adj_q` must settle every deferred level before any
    /// `level_new` comparison here means anything.
    pub fn gen(&mut self, t: &Type) -> Result<(), TypeError> {
        self.force_adj_q()?;
        self.gen_walk(t)
    }

    fn gen_walk(&mut self, t: &Type) -> Result<(), TypeError> {
        let t = ty::find(t);
        match &t {
            Type::Const(_) => Ok(()),
            Type::Var(cell) => {
                let mut data = cell.borrow_mut();
                match &mut *data {
                    VarData::Unbound { level, .. } => {
                        if *level > self.cur_level {
                            *level = GENERIC_LEVEL;
                        }
                        Ok(())
                    }
                    VarData::Link(_) => crate::errors::err_gen_on_link(line!()),
                }
            }
            Type::Arrow(node) => {
                self.gen_composite(&node.level_old, &node.level_new, ty::arrow_children(node))
            }
            Type::App(node) => {
                self.gen_composite(&node.level_old, &node.level_new, ty::app_children(node))
            }
        }
    }

    /// Only recurses (and re-stamps the node's levels) if this composite is
    /// still inside the region being generalized; otherwise it's free in
    /// an enclosing scope and must be left alone.
    fn gen_composite(
        &mut self,
        level_old: &std::cell::Cell<Level>,
        level_new: &std::cell::Cell<Level>,
        children: Vec<Type>,
    ) -> Result<(), TypeError> {
        if level_new.get() > self.cur_level {
            for child in &children {
                self.gen_walk(child)?;
            }
            let max_level = children
                .iter()
                .map(|c| ty::level(&ty::find(c)))
                .fold(0, Level::max);
            level_old.set(max_level);
            level_new.set(max_level);
        }
        Ok(())
    }

    /// Produces a fresh copy of `t` with every `generic_level` node
    /// replaced; shared generic occurrences (the same variable used twice
    /// in a scheme) stay shared in the copy via `map`.
    pub fn inst(&mut self, t: &Type) -> Type {
        let mut map = HashMap::new();
        self.inst_walk(t, &mut map)
    }

    fn inst_walk(&mut self, t: &Type, map: &mut HashMap<VarId, Type>) -> Type {
        let found = ty::find(t);
        match &found {
            Type::Const(_) => found,
            Type::Var(cell) => {
                let generic_id = match &*cell.borrow() {
                    VarData::Unbound { id, level } if *level == GENERIC_LEVEL => Some(*id),
                    VarData::Unbound { .. } => None,
                    VarData::Link(_) => crate::errors::err_inst_on_link(line!()),
                };
                match generic_id {
                    None => found,
                    Some(id) => match map.get(&id) {
                        Some(fresh) => fresh.clone(),
                        None => {
                            let fresh = self.new_var();
                            map.insert(id, fresh.clone());
                            fresh
                        }
                    },
                }
            }
            Type::Arrow(node) => {
                if node.level_new.get() == GENERIC_LEVEL {
                    let params: Vec<Type> = node.params.iter().map(|p| self.inst_walk(p, map)).collect();
                    let result = self.inst_walk(&node.result, map);
                    self.new_arrow(params, result)
                } else {
                    found
                }
            }
            Type::App(node) => {
                if node.level_new.get() == GENERIC_LEVEL {
                    let head = self.inst_walk(&node.head, map);
                    let args: Vec<Type> = node.args.iter().map(|a| self.inst_walk(a, map)).collect();
                    self.new_app(head, args)
                } else {
                    found
                }
            }
        }
    }
}

#[cfg(test)]
mod generalize_tests {
    use super::*;
    use crate::ty::new_const;

    #[test]
    fn inst_of_non_generic_is_shared() {
        let mut engine = Engine::new();
        let v = engine.new_var();
        let copy = engine.inst(&v);
        assert!(ty::same_ref(&v, &copy));
    }

    #[test]
    fn gen_promotes_deeper_variable_to_generic() {
        let mut engine = Engine::new();
        engine.cur_level = 0;
        let v = engine.new_var();
        // simulate the variable having been created at a deeper level
        if let Type::Var(cell) = &v {
            *cell.borrow_mut() = VarData::Unbound { id: 0, level: 1 };
        }
        engine.gen(&v).unwrap();
        if let Type::Var(cell) = &v {
            assert!(matches!(&*cell.borrow(), VarData::Unbound { level, .. } if *level == GENERIC_LEVEL));
        }
    }

    #[test]
    fn inst_gives_distinct_fresh_vars_each_call() {
        let mut engine = Engine::new();
        engine.cur_level = 0;
        let id_var = engine.new_var();
        if let Type::Var(cell) = &id_var {
            *cell.borrow_mut() = VarData::Unbound { id: 0, level: 1 };
        }
        let scheme = engine.new_arrow(vec![id_var.clone()], id_var.clone());
        engine.gen(&scheme).unwrap();

        let inst1 = engine.inst(&scheme);
        let inst2 = engine.inst(&scheme);
        assert!(!ty::same_ref(&inst1, &inst2));

        // Within one instantiation, the shared generic variable must
        // still be the *same* fresh cell in both the param and the result.
        if let Type::Arrow(node) = &inst1 {
            assert!(ty::same_ref(&node.params[0], &node.result));
        } else {
            panic!("expected Arrow");
        }
        let _ = new_const("unused");
    }
}

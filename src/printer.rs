//! C7: canonical printed form (spec.md §6.3). Free and generic variables
//! alike are renamed to `a, b, c, ...` in first-encounter order — nothing
//! downstream distinguishes "still free" from "was generalized" once
//! printing starts, since a surviving variable means the same thing to a
//! reader either way: this type works for any type there.

use std::collections::HashMap;

use crate::errors;
use crate::ty::{self, Type, VarData, VarId};

#[derive(Default)]
struct Namer {
    names: HashMap<VarId, String>,
    order: Vec<VarId>,
    saw_var: bool,
}

impl Namer {
    fn name_for(&mut self, id: VarId) -> String {
        if let Some(existing) = self.names.get(&id) {
            return existing.clone();
        }
        let name = letter_name(self.order.len());
        self.names.insert(id, name.clone());
        self.order.push(id);
        name
    }

    fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.values().cloned().collect();
        names.sort();
        names
    }
}

fn letter_name(idx: usize) -> String {
    const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
    let letter = LETTERS[idx % 26] as char;
    let suffix = idx / 26;
    if suffix == 0 {
        letter.to_string()
    } else {
        format!("{}{}", letter, suffix)
    }
}

/// Prints `t` in canonical schematic form, prefixing `forall[...]` when the
/// type contains any variable at all (free or generalized).
pub fn print(t: &Type) -> String {
    let mut namer = Namer::default();
    let body = print_node(t, &mut namer);
    if namer.saw_var {
        format!("forall[{}] {}", namer.sorted_names().join(" "), body)
    } else {
        body
    }
}

fn print_node(t: &Type, namer: &mut Namer) -> String {
    let found = ty::find(t);
    match &found {
        Type::Const(name) => name.to_string(),
        Type::Var(cell) => {
            let id = match &*cell.borrow() {
                VarData::Unbound { id, .. } => *id,
                VarData::Link(_) => errors::err_print_on_link(line!()),
            };
            namer.saw_var = true;
            namer.name_for(id)
        }
        Type::App(node) => {
            let head = print_node(&node.head, namer);
            let args: Vec<String> = node.args.iter().map(|a| print_node(a, namer)).collect();
            format!("{}[{}]", head, args.join(", "))
        }
        Type::Arrow(node) => {
            let params: Vec<String> = node.params.iter().map(|p| print_node(p, namer)).collect();
            let result = print_node(&node.result, namer);
            let single_non_arrow =
                node.params.len() == 1 && !matches!(ty::find(&node.params[0]), Type::Arrow(_));
            if single_non_arrow {
                format!("{} -> {}", params[0], result)
            } else {
                format!("({}) -> {}", params.join(", "), result)
            }
        }
    }
}

#[cfg(test)]
mod printer_tests {
    use super::*;
    use crate::ty::new_const;

    #[test]
    fn prints_bare_const() {
        assert_eq!(print(&new_const("int")), "int");
    }

    #[test]
    fn prints_single_arg_arrow_without_parens() {
        let t = ty::new_arrow(0, vec![new_const("int")], new_const("bool"));
        assert_eq!(print(&t), "int -> bool");
    }

    #[test]
    fn prints_multi_arg_arrow_with_parens() {
        let t = ty::new_arrow(0, vec![new_const("int"), new_const("int")], new_const("int"));
        assert_eq!(print(&t), "(int, int) -> int");
    }

    #[test]
    fn arrow_arg_that_is_itself_an_arrow_gets_parens() {
        let inner = ty::new_arrow(0, vec![new_const("int")], new_const("int"));
        let outer = ty::new_arrow(0, vec![inner], new_const("bool"));
        assert_eq!(print(&outer), "(int -> int) -> bool");
    }

    #[test]
    fn prints_app_with_args() {
        let t = ty::new_app(0, new_const("pair"), vec![new_const("int"), new_const("bool")]);
        assert_eq!(print(&t), "pair[int, bool]");
    }

    #[test]
    fn variables_get_first_encounter_letters_and_forall_prefix() {
        let a = ty::new_var(0, 0);
        let b = ty::new_var(1, 0);
        let t = ty::new_arrow(0, vec![a], b);
        assert_eq!(print(&t), "forall[a b] a -> b");
    }

    #[test]
    fn shared_variable_prints_with_one_name_both_places() {
        let v = ty::new_var(0, 0);
        let t = ty::new_arrow(0, vec![v.clone()], v);
        assert_eq!(print(&t), "forall[a] a -> a");
    }
}

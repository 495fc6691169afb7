//! C10: the fixed core environment of polymorphic primitives (spec.md
//! §6.4). Each scheme is ordinary type-scheme surface syntax, parsed once
//! per call by `with_core_env` — there's no cross-call sharing of the
//! parsed `Type`s (each carries its own fresh generic variable ids), which
//! keeps every top-level inference's environment free of any accidental
//! aliasing with another call's.

use std::rc::Rc;

use crate::syntax::parser;
use crate::ty::Type;

/// name, scheme-syntax pairs, in the order `--dump-env` prints them.
const PRIMITIVES: &[(&str, &str)] = &[
    ("id", "forall[a] a -> a"),
    ("const", "forall[a b] (a, b) -> a"),
    ("apply", "forall[a b] (a -> b, a) -> b"),
    ("apply_curry", "forall[a b] (a -> b) -> a -> b"),
    ("choose", "forall[a] (a, a) -> a"),
    ("choose_curry", "forall[a] a -> a -> a"),
    ("succ", "int -> int"),
    ("plus", "(int, int) -> int"),
    ("eq", "forall[a] (a, a) -> bool"),
    ("eq_curry", "forall[a] a -> a -> bool"),
    ("not", "bool -> bool"),
    ("true", "bool"),
    ("false", "bool"),
    ("one", "int"),
    ("zero", "int"),
    ("pair", "forall[a b] (a, b) -> pair[a, b]"),
    ("pair_curry", "forall[a b] a -> b -> pair[a, b]"),
    ("first", "forall[a b] pair[a, b] -> a"),
    ("second", "forall[a b] pair[a, b] -> b"),
    ("nil", "forall[a] list[a]"),
    ("cons", "forall[a] (a, list[a]) -> list[a]"),
    ("cons_curry", "forall[a] a -> list[a] -> list[a]"),
    ("head", "forall[a] list[a] -> a"),
    ("tail", "forall[a] list[a] -> list[a]"),
    ("map", "forall[a b] (a -> b, list[a]) -> list[b]"),
    ("map_curry", "forall[a b] (a -> b) -> list[a] -> list[b]"),
];

/// Parses [`PRIMITIVES`] and hands the list to `f`. Parse failures here are
/// a bug in this crate's fixed scheme table, not a user-facing error, so
/// they panic via `errors::err_bad_builtin_scheme` rather than propagating
/// a `Result` through every caller.
pub fn with_core_env<F, R>(f: F) -> R
where
    F: FnOnce(&[(Rc<str>, Type)]) -> R,
{
    let env: Vec<(Rc<str>, Type)> = PRIMITIVES
        .iter()
        .map(|&(name, scheme)| {
            let ty = parser::parse_scheme(scheme)
                .unwrap_or_else(|e| crate::errors::err_bad_builtin_scheme(line!(), name, &e));
            (Rc::from(name), ty)
        })
        .collect();
    f(&env)
}

#[cfg(test)]
mod builtins_tests {
    use super::*;

    #[test]
    fn every_primitive_scheme_parses() {
        with_core_env(|env| {
            assert_eq!(env.len(), PRIMITIVES.len());
        });
    }

    #[test]
    fn names_are_unique() {
        with_core_env(|env| {
            let mut names: Vec<&str> = env.iter().map(|(n, _)| n.as_ref()).collect();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), env.len());
        });
    }
}

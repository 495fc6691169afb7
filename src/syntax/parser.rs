//! C6: surface syntax -> `Expr` / type-scheme `Type`, per spec.md §6.1-6.2.
//!
//! A deterministic recursive-descent parser with one-token lookahead, per
//! §9's design note: the only places the grammar is genuinely ambiguous
//! (`let`/`fun`/bare application at the start of an `expr`, and an
//! identifier-led vs. parenthesized `ty`) are resolved by peeking a single
//! token, so no real backtracking machinery is needed.

use std::collections::HashMap;
use std::rc::Rc;

use crate::errors::ParseError;
use crate::syntax::ast::Expr;
use crate::ty::{self, Type};

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Arrow,
    Equals,
    Ident(String),
}

struct Lexer {
    toks: Vec<(Tok, usize)>,
}

fn lex(src: &str) -> Result<Lexer, ParseError> {
    let bytes = src.as_bytes();
    let mut toks = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '(' => { toks.push((Tok::LParen, i)); i += 1; }
            ')' => { toks.push((Tok::RParen, i)); i += 1; }
            '[' => { toks.push((Tok::LBracket, i)); i += 1; }
            ']' => { toks.push((Tok::RBracket, i)); i += 1; }
            ',' => { toks.push((Tok::Comma, i)); i += 1; }
            '=' => { toks.push((Tok::Equals, i)); i += 1; }
            '-' if bytes.get(i + 1) == Some(&b'>') => { toks.push((Tok::Arrow, i)); i += 2; }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let start = i;
                while i < bytes.len() {
                    let c = bytes[i] as char;
                    if c.is_ascii_alphanumeric() || c == '_' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                toks.push((Tok::Ident(src[start..i].to_string()), start));
            }
            other => return Err(ParseError::UnexpectedChar { ch: other, pos: i }),
        }
    }
    Ok(Lexer { toks })
}

struct TokStream<'a> {
    toks: &'a [(Tok, usize)],
    pos: usize,
}

impl<'a> TokStream<'a> {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos).map(|(t, _)| t)
    }

    fn peek_pos(&self) -> usize {
        self.toks.get(self.pos).map(|(_, p)| *p).unwrap_or(usize::MAX)
    }

    fn bump(&mut self) -> Option<&Tok> {
        let t = self.toks.get(self.pos).map(|(t, _)| t);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, want: &Tok, expected: &'static str) -> Result<(), ParseError> {
        match self.toks.get(self.pos) {
            Some((t, _)) if t == want => {
                self.pos += 1;
                Ok(())
            }
            Some((t, pos)) => Err(ParseError::UnexpectedToken {
                expected,
                found: format!("{:?}", t),
                pos: *pos,
            }),
            None => Err(ParseError::UnexpectedEnd { expected }),
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<Rc<str>, ParseError> {
        match self.toks.get(self.pos) {
            Some((Tok::Ident(s), _)) => {
                let name: Rc<str> = Rc::from(s.as_str());
                self.pos += 1;
                Ok(name)
            }
            Some((t, pos)) => Err(ParseError::UnexpectedToken {
                expected,
                found: format!("{:?}", t),
                pos: *pos,
            }),
            None => Err(ParseError::UnexpectedEnd { expected }),
        }
    }

    fn peek_is_ident(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Tok::Ident(s)) if s == word)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.toks.len()
    }
}

/// Parses one complete expression; any leftover input after a successful
/// parse is a `TrailingInput` error (the grammar never reads a partial
/// expression and stops).
pub fn parse_expr(src: &str) -> Result<Expr, ParseError> {
    let lexer = lex(src)?;
    let mut toks = TokStream { toks: &lexer.toks, pos: 0 };
    let e = parse_expr_inner(&mut toks)?;
    if !toks.at_end() {
        return Err(ParseError::TrailingInput { pos: toks.peek_pos() });
    }
    Ok(e)
}

fn parse_expr_inner(toks: &mut TokStream) -> Result<Expr, ParseError> {
    if toks.peek_is_ident("let") {
        parse_let(toks)
    } else if toks.peek_is_ident("fun") {
        parse_fun(toks)
    } else {
        parse_app(toks)
    }
}

fn parse_let(toks: &mut TokStream) -> Result<Expr, ParseError> {
    toks.expect(&Tok::Ident("let".to_string()), "`let`")?;
    let name = toks.expect_ident("a bound identifier")?;
    toks.expect(&Tok::Equals, "`=`")?;
    let bound = parse_expr_inner(toks)?;
    toks.expect(&Tok::Ident("in".to_string()), "`in`")?;
    let body = parse_expr_inner(toks)?;
    Ok(Expr::Let(name, Box::new(bound), Box::new(body)))
}

fn parse_fun(toks: &mut TokStream) -> Result<Expr, ParseError> {
    toks.expect(&Tok::Ident("fun".to_string()), "`fun`")?;
    let mut params = Vec::new();
    while matches!(toks.peek(), Some(Tok::Ident(_))) {
        params.push(toks.expect_ident("a parameter name")?);
    }
    toks.expect(&Tok::Arrow, "`->`")?;
    let body = parse_expr_inner(toks)?;
    Ok(Expr::Fun(params, Box::new(body)))
}

fn parse_app(toks: &mut TokStream) -> Result<Expr, ParseError> {
    let mut e = parse_atom(toks)?;
    while toks.peek() == Some(&Tok::LParen) {
        toks.bump();
        let mut args = Vec::new();
        if toks.peek() != Some(&Tok::RParen) {
            args.push(parse_expr_inner(toks)?);
            while toks.peek() == Some(&Tok::Comma) {
                toks.bump();
                args.push(parse_expr_inner(toks)?);
            }
        }
        toks.expect(&Tok::RParen, "`)`")?;
        e = Expr::App(Box::new(e), args);
    }
    Ok(e)
}

fn parse_atom(toks: &mut TokStream) -> Result<Expr, ParseError> {
    match toks.peek() {
        Some(Tok::LParen) => {
            toks.bump();
            let e = parse_expr_inner(toks)?;
            toks.expect(&Tok::RParen, "`)`")?;
            Ok(e)
        }
        Some(Tok::Ident(_)) => {
            let name = toks.expect_ident("an identifier")?;
            Ok(Expr::Var(name))
        }
        Some(t) => Err(ParseError::UnexpectedToken {
            expected: "an expression",
            found: format!("{:?}", t),
            pos: toks.peek_pos(),
        }),
        None => Err(ParseError::UnexpectedEnd { expected: "an expression" }),
    }
}

/// Parses a type scheme (spec.md §6.2) directly into a `Type`: identifiers
/// bound by a leading `forall[...]` become shared generic `Var`s (stamped
/// `GENERIC_LEVEL`); every other bare identifier becomes a `Const`. Used
/// once per primitive at startup by `builtins::with_core_env`.
pub fn parse_scheme(src: &str) -> Result<Type, ParseError> {
    let lexer = lex(src)?;
    let mut toks = TokStream { toks: &lexer.toks, pos: 0 };
    let mut generics: HashMap<String, Type> = HashMap::new();
    let mut next_id: ty::VarId = 0;

    if toks.peek_is_ident("forall") {
        toks.bump();
        toks.expect(&Tok::LBracket, "`[`")?;
        while let Some(Tok::Ident(_)) = toks.peek() {
            let name = toks.expect_ident("a quantified type variable")?;
            let var = ty::new_var(next_id, ty::GENERIC_LEVEL);
            next_id += 1;
            generics.insert(name.to_string(), var);
        }
        toks.expect(&Tok::RBracket, "`]`")?;
    }

    let ty = parse_ty(&mut toks, &generics)?;
    if !toks.at_end() {
        return Err(ParseError::TrailingInput { pos: toks.peek_pos() });
    }
    Ok(ty)
}

fn parse_ty(toks: &mut TokStream, generics: &HashMap<String, Type>) -> Result<Type, ParseError> {
    match toks.peek() {
        Some(Tok::LParen) => parse_ty_tuple_or_paren(toks, generics),
        Some(Tok::Ident(_)) => {
            let mut t = parse_tyatom(toks, generics)?;
            while toks.peek() == Some(&Tok::LBracket) {
                t = parse_bracket(toks, generics, t)?;
            }
            if toks.peek() == Some(&Tok::Arrow) {
                toks.bump();
                let result = parse_ty(toks, generics)?;
                let lvl = ty::level(&ty::find(&t)).max(ty::level(&ty::find(&result)));
                t = ty::new_arrow(lvl, vec![t], result);
            }
            Ok(t)
        }
        Some(t) => Err(ParseError::UnexpectedToken {
            expected: "a type",
            found: format!("{:?}", t),
            pos: toks.peek_pos(),
        }),
        None => Err(ParseError::UnexpectedEnd { expected: "a type" }),
    }
}

fn parse_ty_tuple_or_paren(toks: &mut TokStream, generics: &HashMap<String, Type>) -> Result<Type, ParseError> {
    toks.expect(&Tok::LParen, "`(`")?;
    let mut elems = vec![parse_ty(toks, generics)?];
    while toks.peek() == Some(&Tok::Comma) {
        toks.bump();
        elems.push(parse_ty(toks, generics)?);
    }
    toks.expect(&Tok::RParen, "`)`")?;

    if toks.peek() == Some(&Tok::Arrow) {
        toks.bump();
        let result = parse_ty(toks, generics)?;
        let lvl = elems
            .iter()
            .map(|e| ty::level(&ty::find(e)))
            .fold(ty::level(&ty::find(&result)), |a, b| a.max(b));
        Ok(ty::new_arrow(lvl, elems, result))
    } else if elems.len() == 1 {
        Ok(elems.into_iter().next().unwrap())
    } else {
        // A bare parenthesized tuple with no following arrow has no
        // standalone meaning in this grammar; treat it as a `Fail`-shaped
        // parse error rather than silently picking one element.
        Err(ParseError::UnexpectedToken { expected: "`->` after a tuple of types", found: "end of tuple".to_string(), pos: toks.peek_pos() })
    }
}

fn parse_tyatom(toks: &mut TokStream, generics: &HashMap<String, Type>) -> Result<Type, ParseError> {
    let name = toks.expect_ident("a type name")?;
    if let Some(var) = generics.get(name.as_ref()) {
        Ok(var.clone())
    } else {
        Ok(ty::new_const(name.as_ref()))
    }
}

fn parse_bracket(toks: &mut TokStream, generics: &HashMap<String, Type>, head: Type) -> Result<Type, ParseError> {
    toks.expect(&Tok::LBracket, "`[`")?;
    let mut args = vec![parse_ty(toks, generics)?];
    while toks.peek() == Some(&Tok::Comma) {
        toks.bump();
        args.push(parse_ty(toks, generics)?);
    }
    toks.expect(&Tok::RBracket, "`]`")?;
    let lvl = args
        .iter()
        .map(|a| ty::level(&ty::find(a)))
        .fold(ty::level(&ty::find(&head)), |a, b| a.max(b));
    Ok(ty::new_app(lvl, head, args))
}

#[cfg(test)]
mod parser_tests {
    use super::*;

    #[test]
    fn parses_bare_var() {
        assert_eq!(parse_expr("x").unwrap(), Expr::Var(Rc::from("x")));
    }

    #[test]
    fn parses_let_fun_app() {
        let e = parse_expr("let f = fun x -> x in f(f)").unwrap();
        match e {
            Expr::Let(name, bound, body) => {
                assert_eq!(&*name, "f");
                assert!(matches!(*bound, Expr::Fun(_, _)));
                assert!(matches!(*body, Expr::App(_, _)));
            }
            _ => panic!("expected Let"),
        }
    }

    #[test]
    fn multi_arg_application_is_left_associative() {
        let e = parse_expr("f(a, b)(c)").unwrap();
        match e {
            Expr::App(inner, outer_args) => {
                assert_eq!(outer_args.len(), 1);
                assert!(matches!(*inner, Expr::App(_, _)));
            }
            _ => panic!("expected nested App"),
        }
    }

    #[test]
    fn trailing_input_is_rejected() {
        assert!(matches!(parse_expr("x y"), Err(ParseError::TrailingInput { .. })));
    }

    #[test]
    fn scheme_with_arrow_and_app() {
        let t = parse_scheme("forall[a b] (a -> b, list[a]) -> list[b]").unwrap();
        assert!(matches!(t, Type::Arrow(_)));
    }

    #[test]
    fn scheme_bare_const() {
        let t = parse_scheme("(int, int) -> int").unwrap();
        assert!(matches!(t, Type::Arrow(_)));
    }
}

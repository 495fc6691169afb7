#![forbid(unsafe_code)]

//! Level-based Hindley-Milner inference for a small ML-like expression
//! language (spec.md §1). `infer_and_print` is the one call that threads
//! the whole pipeline together: parse one line, run the inference walk
//! against the core environment, print the principal type.

pub mod builtins;
pub mod cli;
pub mod errors;
pub mod generalize;
pub mod infer;
pub mod printer;
pub mod syntax;
pub mod ty;
pub mod unify;

use crate::errors::{ParseError, TypeError};
use crate::infer::{Engine, Env};
use crate::syntax::parser;

/// Either half of the pipeline's failure modes, collapsed into one type so
/// the driver has a single place to map to a one-line stderr message.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Parse(ParseError),
    Type(TypeError),
}

impl From<ParseError> for PipelineError {
    fn from(e: ParseError) -> Self {
        PipelineError::Parse(e)
    }
}

impl From<TypeError> for PipelineError {
    fn from(e: TypeError) -> Self {
        PipelineError::Type(e)
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PipelineError::Parse(e) => write!(f, "{}", e),
            PipelineError::Type(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

/// Builds a fresh core environment, parses `src`, runs a top-level
/// inference, and prints the result. Every call is a closed activity per
/// spec.md §5: a brand new `Engine` and `Env`, nothing carried over.
pub fn infer_and_print(src: &str) -> Result<String, PipelineError> {
    let expr = parser::parse_expr(src)?;
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

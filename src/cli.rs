//! C8 (ambient half): the driver's command-line surface. The algorithmic
//! driver spec.md describes is "read one line, print one type"; this adds
//! the ergonomics any real CLI built around that loop needs (§8 of
//! SPEC_FULL.md) without changing what a single line evaluates to.

use std::io::{self, BufRead, Write};

use structopt::StructOpt;

use crate::builtins;
use crate::printer;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "milner",
    about = "Hindley-Milner type inference for a small ML-like expression language"
)]
pub struct Opt {
    /// Evaluate a single expression given on the command line and exit,
    /// instead of reading lines from standard input.
    #[structopt(short = "e", long = "expr")]
    pub expr: Option<String>,

    /// Suppress the `> ` prompt written before each line read from stdin;
    /// has no effect together with `--expr`.
    #[structopt(short = "q", long = "quiet")]
    pub quiet: bool,

    /// Print the core environment's primitive schemes and exit.
    #[structopt(long = "dump-env")]
    pub dump_env: bool,
}

/// Runs the CLI to completion and returns the process exit code.
pub fn run(opt: Opt) -> i32 {
    if opt.dump_env {
        dump_env();
        return 0;
    }

    if let Some(expr) = opt.expr {
        return run_line(&expr);
    }

    run_repl(opt.quiet)
}

fn dump_env() {
    builtins::with_core_env(|prims| {
        for (name, scheme) in prims {
            println!("{} : {}", name, printer::print(scheme));
        }
    });
}

fn run_line(src: &str) -> i32 {
    match crate::infer_and_print(src) {
        Ok(ty) => {
            println!("{}", ty);
            0
        }
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    }
}

fn run_repl(quiet: bool) -> i32 {
    let stdin = io::stdin();
    let mut exit_code = 0;
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("error reading standard input: {}", e);
                return 1;
            }
        };
        if !quiet {
            print!("> ");
            let _ = io::stdout().flush();
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if run_line(trimmed) != 0 {
            exit_code = 1;
        }
    }
    exit_code
}

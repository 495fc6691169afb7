#![forbid(unsafe_code)]

use structopt::StructOpt;

use milner::cli::{self, Opt};

fn main() {
    let opt = Opt::from_args();
    std::process::exit(cli::run(opt));
}

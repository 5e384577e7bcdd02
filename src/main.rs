//! foobar_release - multi-target release pipeline.
//!
//! Packages the payload for every platform target, writes checksums,
//! publishes GitHub/GitLab releases and pushes the container image.

use env_logger::Env;
use foobar_release::cli::{self, Args};
use foobar_release::process::TokioCommandRunner;
use std::process;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    // RUST_LOG wins over --debug / DEBUG
    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let runner = TokioCommandRunner::default();
    let exit_code = match cli::run(&args, &runner).await {
        Ok(()) => 0,
        Err(e) => {
            log::error!("{e}");
            e.exit_code()
        }
    };

    process::exit(exit_code);
}

//! Binary entry point for `capfox`: parses the CLI and dispatches to the
//! selected subcommand.

use capfox::cli;
use clap::Parser;

#[tokio::main]
async fn main() {
    let args = cli::Cli::parse();
    if let Err(err) = cli::dispatch(args).await {
        eprintln!("capfox: {err:?}");
        std::process::exit(1);
    }
}

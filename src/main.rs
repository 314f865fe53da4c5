use bfi::commands::run::{self, RunArgs};
use clap::Parser;
use std::env;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `BFI_LOG=debug`.
const LOG_ENV: &str = "BFI_LOG";

#[derive(Parser, Debug)]
#[command(name = "bfi", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    #[command(flatten)]
    args: RunArgs,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("bfi"));

    init_logging();

    let cli = Cli::parse();
    let code = run::run(&program, cli.args);

    std::process::exit(code);
}

use std::process::ExitCode;

use clap::Parser;

use socialsync::cli;

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();
    cli::run(args)
}

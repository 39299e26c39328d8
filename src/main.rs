use clap::Parser;
use tickwheel::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}

use clap::Parser;
use gnss_matcher::cli::{self, Args};
use std::process;

fn main() {
    let args = Args::parse();

    cli::setup_logging(args.command.common());

    match cli::run(args) {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

use clap::Parser;
use std::process;
use wcollect::cli::{args::Args, commands};

fn main() {
    let args = Args::parse();

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    match runtime.block_on(commands::run(args)) {
        Ok(()) => process::exit(0),
        Err(error) => {
            // Full chain: stage, location and the underlying cause
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

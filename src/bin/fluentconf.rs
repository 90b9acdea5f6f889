//! fluentconf CLI Binary

use clap::Parser;
use fluentconf::logging::init_logging;
use fluentconf::tooling::cli::{Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();

    let context = match CliContext::new(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(2);
        }
    };

    if let Err(e) = init_logging(Some(context.logging_config())) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(2);
    }

    match context.execute(&cli.command) {
        Ok(output) => {
            if !output.text.is_empty() {
                print!("{}", output.text);
                if !output.text.ends_with('\n') {
                    println!();
                }
            }
            process::exit(output.exit_code);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

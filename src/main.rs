//! Entry point for the hashdupe CLI.

use clap::Parser;
use hashdupe::cli::Cli;
use hashdupe::error::{ExitCode, StructuredError};

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    match hashdupe::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::for_error(&err);

            if json_errors {
                match serde_json::to_string_pretty(&StructuredError::new(&err, exit_code)) {
                    Ok(json) => eprintln!("{}", json),
                    Err(_) => eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err),
                }
            } else if exit_code == ExitCode::Interrupted {
                eprintln!("[{}] Scan interrupted", exit_code.code_prefix());
            } else {
                eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}

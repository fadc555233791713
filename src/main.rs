use clap::Parser;
use dirsort::cli::{Args, EXIT_CONFIG_ERROR, EXIT_RUNTIME_ERROR, run_cli};
use std::panic;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_CONFIG_ERROR)
            } else {
                // --help and --version
                ExitCode::SUCCESS
            };
        }
    };

    // the default hook has already printed the panic message
    panic::catch_unwind(|| run_cli(args)).unwrap_or(ExitCode::from(EXIT_RUNTIME_ERROR))
}

use clap::Parser;
use std::process::ExitCode;
use zed_typegen_cli::{Cli, start};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match start(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{report}");
            ExitCode::FAILURE
        }
    }
}

use std::process::ExitCode;

use clap::Parser;

use marser::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    let mut stdout = std::io::stdout();

    match marser::run(args, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}

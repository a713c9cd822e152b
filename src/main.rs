use std::process::ExitCode;

fn main() -> ExitCode {
    djangoscope::cli::run()
}

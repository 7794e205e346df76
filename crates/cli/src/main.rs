use std::process::ExitCode;

fn main() -> ExitCode {
    covernote_cli::run()
}

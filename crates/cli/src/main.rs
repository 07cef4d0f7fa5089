use std::process::ExitCode;

fn main() -> ExitCode {
    nomorejokes_cli::run()
}

use std::process::ExitCode;

fn main() -> ExitCode {
    moveline_cli::run()
}

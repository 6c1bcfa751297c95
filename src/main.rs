use std::process::ExitCode;

mod shell;

fn main() -> ExitCode {
    shell::run()
}

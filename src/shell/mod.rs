pub mod command;
pub mod parse;

use std::process::ExitCode;

use clap::error::ErrorKind;
use colored::*;

use crate::shell::{command::execute_command, parse::parse_command};

pub fn run() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cmd = match parse_command(std::env::args_os()) {
        Ok(cmd) => cmd,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    match execute_command(&cmd) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "❌ Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

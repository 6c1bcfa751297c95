use clap::Parser;

use crate::shell::command::Command;

/// Build and extend MiniVSFS images offline
#[derive(Debug, Parser)]
#[command(name = "mini-vsfs", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

pub fn parse_command<I, T>(args: I) -> Result<Command, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args).map(|cli| cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_format() {
        let cmd = parse_command([
            "mini-vsfs", "format", "--image", "out.img", "--size-kib", "180", "--inodes", "128",
        ])
        .unwrap();
        match cmd {
            Command::Format {
                image,
                size_kib,
                inodes,
            } => {
                assert_eq!(image, PathBuf::from("out.img"));
                assert_eq!(size_kib, 180);
                assert_eq!(inodes, 128);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_add() {
        let cmd = parse_command([
            "mini-vsfs", "add", "--input", "a.img", "--output", "b.img", "--file", "x.txt",
        ])
        .unwrap();
        assert!(matches!(cmd, Command::Add { .. }));
    }

    #[test]
    fn missing_argument_is_an_error() {
        assert!(parse_command(["mini-vsfs", "add", "--input", "a.img"]).is_err());
        assert!(parse_command(["mini-vsfs", "format", "--size-kib", "abc"]).is_err());
    }
}

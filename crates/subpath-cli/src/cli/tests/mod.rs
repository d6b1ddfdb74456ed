//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;

pub(super) fn parse(args: &[&str]) -> CliCommand {
    parse_full(args).command
}

pub(super) fn parse_full(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

mod inspect;

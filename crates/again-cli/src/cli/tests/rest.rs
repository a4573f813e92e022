//! Tests for schedule, completions, man and global flags.

use super::parse;
use crate::cli::{Cli, CliCommand};
use again_core::retry::BackoffMode;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

#[test]
fn cli_parse_schedule() {
    match parse(&["again", "schedule", "--mode", "exponential", "--max-retry", "6"]) {
        CliCommand::Schedule { backoff } => {
            assert_eq!(backoff.mode, Some(BackoffMode::Exponential));
            assert_eq!(backoff.max_retry, Some(6));
            assert!(backoff.multiplier.is_none());
        }
        _ => panic!("expected Schedule"),
    }
}

#[test]
fn cli_parse_completions() {
    match parse(&["again", "completions", "bash"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, Shell::Bash),
        _ => panic!("expected Completions"),
    }
}

#[test]
fn cli_parse_man() {
    assert!(matches!(parse(&["again", "man"]), CliCommand::Man));
}

#[test]
fn cli_parse_global_config_flag() {
    let cli = Cli::try_parse_from(["again", "schedule", "--config", "/tmp/again.toml"]).unwrap();
    assert_eq!(
        cli.config.as_deref(),
        Some(std::path::Path::new("/tmp/again.toml"))
    );
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

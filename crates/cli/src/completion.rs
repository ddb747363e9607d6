//! Shell completion scripts for accbc
//!
//! Covers the `listen`, `config` and `completion` subcommands together with
//! the connection flags they share (`--address`, `--config`,
//! `--broadcasting-json`, the password and timing options) and the global
//! `--json` and `-v` switches. Shells are whatever `clap_complete` supports.

use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;

use crate::Cli;

/// Write the completion script for `shell` to stdout.
pub fn generate_completion(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "accbc", &mut io::stdout());
}

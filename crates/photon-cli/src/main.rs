// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `photon` command-line tool.
//!
//! Inspects, analyzes and edits photon resin print jobs.
//!
//! # Usage
//! ```text
//! photon info part.photon
//! photon islands part.photon --workers 8 -o fixed.photon
//! photon set part.photon -o tuned.photon --exposure 7.5 --aa 4
//! photon profile show
//! ```
//!
//! Logs go to stderr; `-v`/`-vv` raise the level and `RUST_LOG` overrides it.
//! The CLI exits with code `0` on success and non-zero on error.

// The CLI is expected to print to stdout.
#![allow(clippy::print_stdout)]

mod cli;
mod commands;
mod report;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    commands::run(cli)
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

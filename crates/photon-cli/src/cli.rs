// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line surface.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "photon",
    author,
    version,
    about = "Inspect, analyze and edit photon resin print jobs"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory holding saved preferences (defaults to the platform config dir).
    #[arg(long, global = true, env = "PHOTON_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show header, preview and print-time information
    Info {
        /// Photon file to read
        file: PathBuf,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Peel time in seconds used for the print-time estimate
        #[arg(long, default_value_t = 0.0)]
        peel: f32,
    },
    /// List the layer-definition table
    Layers {
        /// Photon file to read
        file: PathBuf,
    },
    /// Reduce islands on every layer and report what remains
    Islands {
        /// Photon file to read
        file: PathBuf,
        /// Worker threads (defaults to the saved preference, then one per core)
        #[arg(long)]
        workers: Option<usize>,
        /// List every layer, not only those with islands left
        #[arg(long)]
        all: bool,
        /// Write a copy with the reduced layer images
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Change exposure settings or the anti-aliasing level
    Set {
        /// Photon file to read
        file: PathBuf,
        /// Output path
        #[arg(short, long)]
        output: PathBuf,
        /// Normal layer exposure (s)
        #[arg(long)]
        exposure: Option<f32>,
        /// Bottom layer exposure (s)
        #[arg(long)]
        bottom_exposure: Option<f32>,
        /// Light-off time (s)
        #[arg(long)]
        off_time: Option<f32>,
        /// Number of bottom layers
        #[arg(long)]
        bottom_layers: Option<u32>,
        /// Anti-aliasing level (version 2+ files)
        #[arg(long)]
        aa: Option<u32>,
    },
    /// Convert a version 1 file to version 2
    Upgrade {
        /// Photon file to read
        file: PathBuf,
        /// Output path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write an empty job using the saved print profile
    New {
        /// Output path
        #[arg(short, long)]
        output: PathBuf,
        /// Number of (blank) layers
        #[arg(long, default_value_t = 1)]
        layers: u32,
    },
    /// Convert a Prusa SL1 archive using the saved print profile
    #[command(name = "import-sl1")]
    ImportSl1 {
        /// SL1 archive to read
        file: PathBuf,
        /// Output path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show or reset the saved print profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    /// Print the saved preferences as JSON
    Show,
    /// Restore default preferences
    Reset,
}

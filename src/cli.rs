use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gdgkit::AdjustmentKind;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")");

#[derive(Debug, Parser, Clone)]
#[command(name = "gdgkit")]
#[command(about = "Remote control for dual channel gate delay generators")]
#[command(version = LONG_VERSION)]
pub struct Cli {
    /// Config file (.toml or .json). Defaults to the platform config directory.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Device address or preset name (see `gdgkit hosts`).
    #[arg(long)]
    pub host: Option<String>,

    /// TCP port; overrides the config file.
    #[arg(long)]
    pub port: Option<u16>,

    /// Show debug events, including every command and reply.
    #[arg(long)]
    pub debug: bool,

    /// Talk to the built-in simulated instrument instead of a real device.
    #[arg(long)]
    pub simulate: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Read the current settings of both channels.
    Read,
    /// Set a channel's pulse delay or width, in microseconds.
    Set {
        channel: String,
        kind: KindArg,
        value: String,
    },
    /// Set a channel's trigger mode (first or last).
    Trigger { channel: String, mode: String },
    /// Enable or disable a channel's output.
    Output { channel: String, control: String },
    /// Sweep a channel's delay by STEP microseconds per interval for DURATION seconds.
    Autorun {
        channel: String,
        #[arg(allow_hyphen_values = true)]
        step: f64,
        duration: f64,
    },
    /// List the configured host presets.
    Hosts,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum KindArg {
    Delay,
    Width,
}

impl From<KindArg> for AdjustmentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Delay => AdjustmentKind::Delay,
            KindArg::Width => AdjustmentKind::Width,
        }
    }
}

//! Command-line entry point. The routing core is a single `serve`-shaped
//! process: account/config management lives on the HTTP surface, not in
//! interactive subcommands, so the CLI only governs how the server boots.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "antigravity-server",
    about = "Antigravity routing core - headless HTTP gateway",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[arg(short, long, env = "ANTIGRAVITY_PORT", default_value = "8045")]
    pub port: u16,

    #[arg(long, env = "ANTIGRAVITY_DATA_DIR", help = "Override the persisted-state directory")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(about, version)]
pub(crate) struct Cli {
    /// Path to the configuration file.
    ///
    /// Defaults to `Config.toml` in the current directory.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

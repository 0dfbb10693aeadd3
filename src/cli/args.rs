//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Repository watcher
#[derive(Parser, Debug)]
#[command(
    name = "repowatch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Run a command in a repository when its watched files change",
    long_about = "Watch every repository under a root directory and run a shell command \
                  inside a repository whenever a matching file in its watch path changes. \
                  Repositories created or removed at runtime are picked up automatically.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Examples:\n  repowatch\n  repowatch --config /etc/repowatch.toml watch\n  repowatch check\n  repowatch init"
)]
pub struct Cli {
    /// Path to config file (default: ./config.json if present, else ./repowatch.toml)
    #[arg(short, long, global = true, env = "REPOWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Watch repositories and run the command on changes (default)
    #[command(about = "Watch repositories until interrupted")]
    Watch,

    /// Validate configuration and list repositories that qualify now
    #[command(about = "Validate configuration and list qualifying repositories")]
    Check,

    /// Show current configuration settings
    #[command(about = "Display effective settings as TOML")]
    Config,

    /// Write a starter config file
    #[command(about = "Create repowatch.toml with example settings")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

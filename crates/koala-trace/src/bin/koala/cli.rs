//! CLI definitions for koala.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "koala",
    version,
    about = "Replay debug sessions and suggest breakpoint locations",
    after_help = "Examples:\n  koala replay session.json --root ./app --diagram\n  koala suggest --root ./app --breakpoint src/Main.kt:12"
)]
pub struct Cli {
    /// Config file (defaults to koala.toml or .koala.toml under the root).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a JSON session script and print the resulting view.
    Replay {
        /// Session script.
        script: PathBuf,
        /// Source root; relative script paths resolve against it.
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Show the trace diagram instead of the hit list.
        #[arg(long)]
        diagram: bool,
        /// Also run a suggestion scan after the replay.
        #[arg(long)]
        suggest: bool,
    },
    /// Scan a source tree for instrumentation points.
    Suggest {
        /// Source root.
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Existing breakpoint, as PATH:LINE with a 1-based line.
        #[arg(long = "breakpoint", value_name = "PATH:LINE")]
        breakpoints: Vec<String>,
    },
}

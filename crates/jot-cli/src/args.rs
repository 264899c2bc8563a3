use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the jot binary.
#[derive(Parser, Debug)]
#[command(name = "jot", version, about = "jot - a SRC to JavaScript compiler")]
pub struct CliArgs {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile an indexed program to one script per entry package.
    Build(BuildArgs),
}

#[derive(clap::Args, Debug)]
pub struct BuildArgs {
    /// Path to the frontend's indexed program (JSON exchange format).
    pub program: PathBuf,

    /// Entry package path. Repeatable; defaults to the program's own
    /// entry list.
    #[arg(short = 'e', long = "entry")]
    pub entries: Vec<String>,

    /// Directory the emitted scripts are written to.
    #[arg(short = 'o', long = "out-dir", default_value = ".")]
    pub out_dir: PathBuf,

    /// Print the emitted scripts to stdout instead of writing files.
    #[arg(long)]
    pub print: bool,
}

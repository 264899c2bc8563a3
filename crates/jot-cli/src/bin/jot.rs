#![allow(clippy::print_stderr)]

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use jot_cli::args::{CliArgs, Command};
use jot_cli::driver;

fn main() {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let result = match &args.command {
        Command::Build(build) => run_build(build),
    };

    if let Err(err) = result {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn run_build(args: &jot_cli::args::BuildArgs) -> anyhow::Result<()> {
    let scripts = driver::build(args)?;
    if args.print {
        for script in &scripts {
            print!("{}", script.source);
        }
        return Ok(());
    }
    driver::write_scripts(args, &scripts)?;
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

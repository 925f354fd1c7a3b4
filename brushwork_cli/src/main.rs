#![warn(clippy::all, clippy::pedantic)]

mod convert;
mod info;
mod resolver;

use convert::{convert, Convert};
use info::{info, Info};

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(version = "0.1.0")]
struct Opts {
    /// Log more, can be repeated
    #[clap(short, long, parse(from_occurrences))]
    verbose: usize,
    #[clap(subcommand)]
    subcommand: SubCommand,
}

#[derive(Parser)]
enum SubCommand {
    Convert(Convert),
    Info(Info),
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    let default_level = match opts.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match opts.subcommand {
        SubCommand::Convert(opts) => convert(opts),
        SubCommand::Info(opts) => info(&opts),
    }
}

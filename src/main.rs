use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, error};

use diagram_engine::cli::{self, Args};

fn main() {
    let args = Args::parse();

    let level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level '{}', defaulting to 'warn'", args.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .init();

    if let Err(err) = cli::run(&args) {
        error!(err:?; "Run failed");
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

//! pyboot - provision a Python runtime and launch an application

use std::ffi::OsString;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pyboot_cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let raw_args: Vec<OsString> = std::env::args_os().skip(1).collect();
    let cli = Cli::parse();

    // -v wins over RUST_LOG; stdout belongs to the launched application.
    let filter = if cli.verbose {
        EnvFilter::new("warn,pyboot_core=debug,pyboot_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let code = pyboot_cli::run(&cli, raw_args).await?;
    std::process::exit(code);
}

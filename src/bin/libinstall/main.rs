//! libinstall CLI - installs libraries declared in composer.json

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use libinstall::util::diagnostic::{self, Diagnostic};

fn main() {
    let cli = Cli::parse();
    let color = !cli.global.no_color;

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        if let Some(diag) = Diagnostic::from_error(&e) {
            diagnostic::emit(&diag, color);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.global.verbose {
        EnvFilter::new("libinstall=debug")
    } else {
        EnvFilter::new("libinstall=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Install(args) | Commands::Update(args) => {
            commands::install::execute(&cli.global, args)
        }
        Commands::Status => commands::status::execute(&cli.global),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

//! pagewright CLI entry point
//!
//! Parses arguments, runs the subcommand and prints errors with suggestions:
//! - `bundle` - Generate bundler entry files
//! - `render` - Render a template to stdout

use anyhow::Result;
use clap::Parser;
use pagewright::cli;
use pagewright::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}

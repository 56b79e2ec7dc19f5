pub mod handlers;

use std::process::ExitCode;

use crate::presentation::cli::{Cli, Commands};
use splitpack_core::error::Result;

pub fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Compress(args) => handlers::handle_compress(args, cli.lang),
        Commands::Plan(args) => handlers::handle_plan(args, cli.lang),
        Commands::Verify { folder } => handlers::handle_verify(folder),
    }
}

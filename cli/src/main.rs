mod cli;
mod commands;

use anyhow::Result;
use clap::{error::ErrorKind, CommandFactory, Parser};
use cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
  let cli_args = Cli::parse_from(cli::normalize_go_flags(std::env::args_os()));

  let config = cli_args.session_config();
  if let Err(e) = config.validate() {
    // Reported like any other usage error, before a socket is touched.
    Cli::command().error(ErrorKind::ValueValidation, e).exit();
  }

  init_tracing();
  commands::run::serve(config).await
}

fn init_tracing() {
  // RUST_LOG overrides the default filter
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();
}

//! NuBot command-line entry point.

mod app;
mod cli;

use clap::Parser;

use crate::app::NubotApp;
use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> nubot_core::Result<()> {
    let args = CliArgs::parse();
    let app = NubotApp::from_args(&args)?;
    app.run(args).await
}

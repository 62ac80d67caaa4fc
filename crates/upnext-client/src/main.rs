//! upnext CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use upnext_client::app;
use upnext_client::cli::Cli;
use upnext_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: failed to initialize logging: {}", e);
    }

    let result = app::run(cli, &mut std::io::stdout()).await;
    app::report(result, &mut std::io::stderr())
}

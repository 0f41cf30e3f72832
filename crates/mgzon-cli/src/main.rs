//! Thin entrypoint for the `mz` binary.

use std::process;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let exit_code = mgzon_cli::run().await;
    if exit_code != 0 {
        process::exit(exit_code);
    }
}

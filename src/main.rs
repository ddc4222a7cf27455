use clap::Parser;
use bext::cli::commands::Cli;
use bext::cli::handlers;
use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr so --json output stays clean
    let filter = EnvFilter::try_from_env("BEXT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

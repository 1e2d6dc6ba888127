use clap::Parser;

use jobhunter::commands::{self, Cli};

/// Initialize logging with tracing_subscriber.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sqlx=warn".parse().unwrap())
                .add_directive("jobhunter=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .compact()
        .with_target(false)
        .with_ansi(true)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();
    if let Err(e) = commands::run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

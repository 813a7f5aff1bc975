use clap::Parser;
use empenho::cli::Cli;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = cli.run().await {
        tracing::error!(error = %err, "operation failed");
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

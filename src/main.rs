mod cli;

use cli::RunOutcome;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (addr, config) = match cli::run() {
        RunOutcome::Serve { addr, config } => (addr, config),
        RunOutcome::Exit(code) => std::process::exit(code),
    };

    if let Err(err) = taskpush::serve(addr, config).await {
        tracing::error!(error = %err, "server exited with error");
        std::process::exit(1);
    }
}

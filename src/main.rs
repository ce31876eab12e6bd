//! Process entry point: load `.env` for local convenience, initialize
//! tracing, then hand off to the composition root. Exit codes: 0 on clean
//! shutdown, 1 on startup/runtime failure.

use std::process::ExitCode;

/// Registry + env filter + fmt layer, JSON output in production and
/// pretty output otherwise.
fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let is_production = std::env::var("ENV")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if is_production {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).try_init()
    };
    result.ok();
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    match coresvc_bootstrap::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "coresvc failed to start");
            ExitCode::FAILURE
        }
    }
}

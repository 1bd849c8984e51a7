use apigate::config::load_from_env;
use apigate::{server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = load_from_env()?;
    let _log_guard = telemetry::init(&config)?;
    config.print_summary();

    server::run(config).await
}

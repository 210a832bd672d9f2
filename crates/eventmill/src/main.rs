use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use eventmill::config::{self, load_config, load_config_from_str};
use eventmill::pipeline::Pipeline;
use eventmill::EventmillError;

#[tokio::main]
async fn main() -> Result<(), EventmillError> {
    init_tracing();

    info!("Starting eventmill v{}", env!("CARGO_PKG_VERSION"));

    // Config comes from the first argument, the canonical path, or built-in
    // defaults when neither exists.
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(PathBuf::from(path))?,
        None => match config::default_config_path() {
            Some(path) if path.exists() => load_config(path)?,
            _ => load_config_from_str(r#"{"version": "1.0"}"#)?,
        },
    };
    info!(provider = %config.provider, "configuration loaded");

    let pipeline = Pipeline::from_config(Arc::new(config))?;
    let summary = pipeline.run_batch().await?;

    // Failed messages stay unmarked and are retried next run; a non-zero
    // exit lets schedulers notice in the meantime.
    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing() {
    // The storage, cache and gateway modules log through the `log` facade;
    // route those records into the tracing subscriber as well.
    tracing_log::LogTracer::init().expect("log tracer already installed");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("tracing subscriber already installed");
}

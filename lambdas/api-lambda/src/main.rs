use std::sync::Arc;

use gallery_shared::config::Config;
use gallery_shared::AppState;
use lambda_http::{run, service_fn, Error, Request};
use tracing_subscriber::EnvFilter;

mod http_handler;
mod response;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    let config =
        Config::from_env().inspect_err(|e| tracing::error!("invalid configuration: {}", e))?;
    let state = Arc::new(AppState::init(config).await);

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}

/// climate-nn Studio
///
/// JSON API around a single shared trainer, for a browser front end to draw
/// the network, the loss curve and the activation plots.
/// Served by a synchronous tiny_http server.
///
/// Run with:
///   cargo run --bin studio --release
/// Then query http://127.0.0.1:7878/api/state
///
/// Endpoints:
///   GET  /api/state            trainer state, inputs, weights, last run
///   POST /api/settings         inputs / scenario / target / learning rate / policy
///   POST /api/forward          forward pass over the current weights
///   POST /api/step             one training iteration
///   POST /api/train/start      background run
///   POST /api/train/stop       cancel the background run
///   GET  /api/train/events     Server-Sent Events, one `iteration` event per step
///   POST /api/reset            clear history and re-initialize weights
///   GET  /api/activations      activation catalog
///   GET  /api/activation       evaluate or sample one activation
///   GET  /api/scenarios        preset inputs

mod state;
mod routes;
mod handlers;
mod util;

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use tiny_http::Server;
use tracing::info;

use climate_nn::{EngineConfig, Trainer};
use state::StudioState;

const DEFAULT_ADDR: &str = "127.0.0.1:7878";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let addr = std::env::var("CLIMATE_NN_STUDIO_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_owned());
    let config = EngineConfig::load();
    let trainer = Trainer::from_config(&config).context("building trainer from config")?;

    let server = Server::http(&addr).map_err(|e| anyhow!("failed to bind {}: {}", addr, e))?;
    let shared_state = Arc::new(Mutex::new(StudioState::new(trainer, config)));

    info!(addr = %addr, "studio listening");

    // One thread per request so the SSE stream (which blocks for the whole
    // run) does not stall the other endpoints.
    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }
    Ok(())
}

use std::thread;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tiny_http::Request;
use tracing::{debug, info, warn};

use crate::routes::{engine_error, error_response, json_response, ok, read_json, JsonResponse};
use crate::state::{lock, SharedState, TrainingStatus};

// ---------------------------------------------------------------------------
// POST /api/train/start
// ---------------------------------------------------------------------------

/// Overrides for this run only; anything missing comes from the engine config.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartRequest {
    pub max_iterations:        Option<usize>,
    pub convergence_threshold: Option<f64>,
    pub step_delay_ms:         Option<u64>,
}

pub fn handle_start(request: &mut Request, state: SharedState) -> JsonResponse {
    let body: StartRequest = match read_json(request) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let mut st = lock(&state);

    // If already running, don't start another.
    if matches!(st.training, TrainingStatus::Running { .. }) {
        return error_response(409, "a training run is already in progress");
    }

    let mut config = st.config.train_config();
    if let Some(n) = body.max_iterations {
        config.max_iterations = n;
    }
    if let Some(t) = body.convergence_threshold {
        config.convergence_threshold = t;
    }
    if let Err(e) = st.trainer.begin_run(&config) {
        return engine_error(e);
    }

    if let Some(ms) = body.step_delay_ms {
        st.step_delay_ms = ms;
    }
    let delay = Duration::from_millis(st.step_delay_ms);

    st.run_id += 1;
    let run_id = st.run_id;
    let stop = st.trainer.stop_handle();
    st.training = TrainingStatus::Running { stop, subscribers: Vec::new() };
    drop(st);

    info!(run_id, max_iterations = config.max_iterations, "background run started");
    let state_clone = state.clone();
    thread::spawn(move || drive_run(state_clone, run_id, delay));

    json_response(202, &json!({
        "status":               "running",
        "runId":                run_id,
        "maxIterations":        config.max_iterations,
        "convergenceThreshold": config.convergence_threshold,
    }))
}

/// Background loop: one `advance()` per lock acquisition, so the other
/// endpoints stay responsive between iterations. Each new entry goes out to
/// the event-stream clients before the lock is released.
fn drive_run(state: SharedState, run_id: u64, delay: Duration) {
    loop {
        let next = {
            let mut st = lock(&state);
            if st.run_id != run_id {
                debug!(run_id, "run superseded; background thread exiting");
                return;
            }
            let next = st.trainer.advance();
            if let Ok(Some(outcome)) = &next {
                st.broadcast(&outcome.entry);
            }
            next
        };

        match next {
            Ok(Some(_)) => {
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
            Ok(None) => {
                let mut st = lock(&state);
                if st.run_id == run_id {
                    let status = match st.trainer.last_run().copied() {
                        Some(summary) => TrainingStatus::Done { summary },
                        None => TrainingStatus::Failed { reason: "run ended without a summary".into() },
                    };
                    st.training = status;
                }
                return;
            }
            Err(e) => {
                warn!(run_id, error = %e, "background run aborted");
                let mut st = lock(&state);
                if st.run_id == run_id {
                    st.training = TrainingStatus::Failed { reason: e.to_string() };
                }
                return;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// POST /api/train/stop
// ---------------------------------------------------------------------------

pub fn handle_stop(state: SharedState) -> JsonResponse {
    let st = lock(&state);
    match &st.training {
        TrainingStatus::Running { stop, .. } => {
            stop.request_stop();
            info!(run_id = st.run_id, "stop requested");
            ok(json!({ "status": "stopping" }))
        }
        _ => error_response(409, "no training run in progress"),
    }
}

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use climate_nn::{impact_score, ClimateInputs, ImpactLevel, NormalizationPolicy, Scenario, SettingsUpdate};

use crate::routes::{engine_error, error_response, ok, read_json, JsonResponse};
use crate::state::{lock, SharedState, TrainingStatus};

// ---------------------------------------------------------------------------
// GET /api/state
// ---------------------------------------------------------------------------

pub fn handle_state(state: SharedState) -> JsonResponse {
    let st = lock(&state);
    let t = &st.trainer;
    ok(json!({
        "state":         t.state(),
        "inputs":        t.inputs(),
        "features":      t.features(),
        "policy":        t.policy(),
        "wiring":        t.wiring(),
        "target":        t.target(),
        "learningRate":  t.learning_rate(),
        "weights":       t.weights(),
        "historyLength": t.history().len(),
        "lastLoss":      t.history().last().map(|e| e.loss),
        "lastStep":      t.last_step(),
        "lastRun":       t.last_run(),
        "terminal":      t.state().is_terminal(),
        "training":      st.training.to_json(),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/settings
// ---------------------------------------------------------------------------

/// Every field is optional. `scenario` is applied before `inputs`, so explicit
/// readings win over a preset.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsRequest {
    pub scenario:      Option<String>,
    pub inputs:        Option<ClimateInputs>,
    pub target:        Option<f64>,
    pub learning_rate: Option<f64>,
    pub policy:        Option<NormalizationPolicy>,
}

pub fn handle_settings(request: &mut tiny_http::Request, state: SharedState) -> JsonResponse {
    let body: SettingsRequest = match read_json(request) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let inputs = match (&body.scenario, body.inputs) {
        (_, Some(inputs)) => Some(inputs),
        (Some(name), None) => match Scenario::from_name(name) {
            Some(s) => Some(s.inputs()),
            None => return error_response(400, format!("unknown scenario `{}`", name)),
        },
        (None, None) => None,
    };

    let update = SettingsUpdate {
        inputs,
        target:        body.target,
        learning_rate: body.learning_rate,
        policy:        body.policy,
    };

    let mut st = lock(&state);
    let t = &mut st.trainer;
    // Either every field lands or none does.
    if let Err(e) = t.apply_settings(update) {
        return engine_error(e);
    }

    ok(json!({
        "inputs":       t.inputs(),
        "features":     t.features(),
        "policy":       t.policy(),
        "target":       t.target(),
        "learningRate": t.learning_rate(),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/forward
// ---------------------------------------------------------------------------

pub fn handle_forward(state: SharedState) -> JsonResponse {
    let st = lock(&state);
    match st.trainer.preview() {
        Ok(result) => {
            let level = ImpactLevel::from_output(result.output);
            let score = impact_score(result.output);
            ok(json!({
                "forward":     result,
                "impactScore": score,
                "impactLevel": level,
                "impactLabel": level.label(),
            }))
        }
        Err(e) => engine_error(e),
    }
}

// ---------------------------------------------------------------------------
// POST /api/step
// ---------------------------------------------------------------------------

pub fn handle_step(state: SharedState) -> JsonResponse {
    let mut st = lock(&state);
    let before = st.trainer.weights();
    let outcome = match st.trainer.step() {
        Ok(o) => o,
        Err(e) => return engine_error(e),
    };
    match outcome.weights().delta(&before) {
        Ok(change) => ok(json!({ "step": outcome, "weightChange": change })),
        Err(e) => engine_error(e),
    }
}

// ---------------------------------------------------------------------------
// POST /api/reset
// ---------------------------------------------------------------------------

pub fn handle_reset(state: SharedState) -> JsonResponse {
    let mut st = lock(&state);
    // A background run sees the new id before its next iteration and exits.
    st.run_id += 1;
    st.trainer.reset();
    st.training = TrainingStatus::Idle;
    info!("studio state reset");
    ok(json!({ "state": st.trainer.state(), "weights": st.trainer.weights() }))
}

// ---------------------------------------------------------------------------
// GET /api/scenarios
// ---------------------------------------------------------------------------

pub fn handle_scenarios() -> JsonResponse {
    let list: Vec<_> = Scenario::ALL
        .iter()
        .map(|s| json!({ "key": s.key(), "description": s.description(), "inputs": s.inputs() }))
        .collect();
    ok(json!(list))
}

use serde_json::json;

use climate_nn::activation::{DEFAULT_SAMPLE_POINTS, DEFAULT_SAMPLE_RANGE};
use climate_nn::{ActivationFunction, CATALOG};

use crate::routes::{engine_error, error_response, ok, JsonResponse};
use crate::util::query::{parse_query, query_get};

/// Upper bound on `points` so a single request cannot allocate without limit.
const MAX_SAMPLE_POINTS: usize = 10_000;

// ---------------------------------------------------------------------------
// GET /api/activations
// ---------------------------------------------------------------------------

pub fn handle_catalog() -> JsonResponse {
    ok(json!(CATALOG))
}

// ---------------------------------------------------------------------------
// GET /api/activation?name=..&x=..        single evaluation
// GET /api/activation?name=..[&from=..&to=..&points=..]   plot samples
// ---------------------------------------------------------------------------

pub fn handle_evaluate(query: &str) -> JsonResponse {
    let pairs = parse_query(query);
    let name = match query_get(&pairs, "name") {
        Some(n) if !n.is_empty() => n,
        _ => return error_response(400, "missing `name` parameter"),
    };
    let function = match ActivationFunction::from_name(name) {
        Ok(f) => f,
        Err(e) => return engine_error(e),
    };

    if let Some(raw) = query_get(&pairs, "x") {
        let x = match parse_finite(raw) {
            Some(x) => x,
            None => return error_response(400, format!("`x` must be a finite number, got `{}`", raw)),
        };
        let (value, derivative) = function.evaluate(x);
        return ok(json!({
            "function": function.descriptor(),
            "x": x,
            "value": value,
            "derivative": derivative,
        }));
    }

    let (lo, hi) = DEFAULT_SAMPLE_RANGE;
    let from = query_get(&pairs, "from").and_then(parse_finite).unwrap_or(lo);
    let to = query_get(&pairs, "to").and_then(parse_finite).unwrap_or(hi);
    let points = query_get(&pairs, "points")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(DEFAULT_SAMPLE_POINTS)
        .min(MAX_SAMPLE_POINTS);

    let samples: Vec<_> = function
        .sample((from, to), points)
        .into_iter()
        .map(|(x, value, derivative)| json!({ "x": x, "value": value, "derivative": derivative }))
        .collect();
    ok(json!({ "function": function.descriptor(), "samples": samples }))
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

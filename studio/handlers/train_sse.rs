use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use serde_json::json;
use tiny_http::Request;
use tracing::debug;

use climate_nn::TrainingHistoryEntry;

use crate::state::{lock, SharedState};
use crate::util::sse::{format_sse_event, write_sse, SSE_KEEPALIVE, SSE_RESPONSE_HEAD};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// `GET /api/train/events`, Server-Sent Events.
///
/// Consumes `request` (so it can call `into_writer`) and:
/// 1. Replays the history recorded so far as `iteration` events.
/// 2. Forwards each new entry of the background run from this client's own
///    channel; every connected client sees every entry.
/// 3. Writes a keep-alive comment every 500 ms without news.
/// 4. When the run ends and its senders are dropped, writes one final
///    `done` event carrying the studio's training status, then closes.
///
/// With no run in progress it replays history and ends immediately.
pub fn handle(request: Request, state: SharedState) {
    let mut writer = request.into_writer();
    if !write_sse(&mut writer, SSE_RESPONSE_HEAD) {
        return;
    }

    let (history, entry_rx) = lock(&state).subscribe();

    for entry in &history {
        if !send_entry(&mut writer, entry) {
            return;
        }
    }

    let rx = match entry_rx {
        Some(r) => r,
        None => {
            send_final(&mut writer, &state);
            return;
        }
    };

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(entry) => {
                if !send_entry(&mut writer, &entry) {
                    debug!("sse client disconnected");
                    return;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !write_sse(&mut writer, SSE_KEEPALIVE) {
                    debug!("sse client disconnected");
                    return;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                send_final(&mut writer, &state);
                return;
            }
        }
    }
}

fn send_entry<W: std::io::Write + ?Sized>(writer: &mut W, entry: &TrainingHistoryEntry) -> bool {
    match serde_json::to_string(entry) {
        Ok(data) => write_sse(writer, &format_sse_event("iteration", &data)),
        Err(_) => true,
    }
}

fn send_final<W: std::io::Write + ?Sized>(writer: &mut W, state: &SharedState) {
    let payload = {
        let st = lock(state);
        json!({
            "state":      st.trainer.state(),
            "iterations": st.trainer.history().len(),
            "training":   st.training.to_json(),
        })
    };
    let _ = write_sse(writer, &format_sse_event("done", &payload.to_string()));
}

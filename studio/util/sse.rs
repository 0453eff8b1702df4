use std::io::Write;

// ---------------------------------------------------------------------------
// SSE framing helpers
// ---------------------------------------------------------------------------

/// Raw HTTP head for a Server-Sent Events stream. Written directly to the
/// socket because tiny_http has no streaming response body.
pub const SSE_RESPONSE_HEAD: &str = "HTTP/1.1 200 OK\r\n\
                                     Content-Type: text/event-stream\r\n\
                                     Cache-Control: no-cache\r\n\
                                     Connection: keep-alive\r\n\
                                     X-Accel-Buffering: no\r\n\
                                     \r\n";

/// Keep-alive comment. Ignored by `EventSource` clients but stops idle
/// proxies from closing the connection.
pub const SSE_KEEPALIVE: &str = ": ping\n\n";

/// Formats a named SSE event with a JSON data payload:
/// `event: <name>\ndata: <json>\n\n`.
pub fn format_sse_event(event_name: &str, json_data: &str) -> String {
    format!("event: {}\ndata: {}\n\n", event_name, json_data)
}

/// Writes a single SSE message, flushing immediately.
/// Returns `false` if the write failed (client disconnected).
pub fn write_sse<W: Write + ?Sized>(writer: &mut W, msg: &str) -> bool {
    writer.write_all(msg.as_bytes()).is_ok() && writer.flush().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_frame_layout() {
        assert_eq!(format_sse_event("iteration", "{\"loss\":0.1}"), "event: iteration\ndata: {\"loss\":0.1}\n\n");
    }

    #[test]
    fn write_reports_success() {
        let mut buf = Vec::new();
        assert!(write_sse(&mut buf, SSE_KEEPALIVE));
        assert_eq!(buf, b": ping\n\n");
    }
}

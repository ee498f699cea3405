//! Bootstrap page for the bridge handshake.
//!
//! Firefox starts on a `data:` URI whose script posts a `WEBDRIVER_INIT`
//! message. The extension's content script forwards it to the background
//! script, which connects to the window's WebSocket server and sends READY.

use serde_json::json;

use crate::identifiers::SessionId;

/// Builds the bootstrap page as a `data:text/html,...` URI.
#[must_use]
pub fn build_init_data_uri(ws_url: &str, session_id: SessionId) -> String {
    let config = json!({
        "type": "WEBDRIVER_INIT",
        "wsUrl": ws_url,
        "sessionId": session_id.as_u32(),
    });

    let html = INIT_HTML_TEMPLATE
        .replace("$SESSION_ID", &session_id.as_u32().to_string())
        .replace("$CONFIG_JSON", &config.to_string());

    format!("data:text/html,{}", urlencoding::encode(&html))
}

const INIT_HTML_TEMPLATE: &str = r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>nav-resolver bridge</title>
</head>
<body>
    <p>Connecting session $SESSION_ID...</p>
    <script>window.postMessage($CONFIG_JSON, '*');</script>
</body>
</html>"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri_carries_config() {
        let session_id = SessionId::from_u32(7);
        let uri = build_init_data_uri("ws://127.0.0.1:12345", session_id);

        assert!(uri.starts_with("data:text/html,"));
        assert!(!uri.contains('<'));

        let html = urlencoding::decode(uri.trim_start_matches("data:text/html,"))
            .expect("decode")
            .into_owned();
        assert!(html.contains("window.postMessage"));
        assert!(html.contains(r#""type":"WEBDRIVER_INIT""#));
        assert!(html.contains(r#""wsUrl":"ws://127.0.0.1:12345""#));
        assert!(html.contains(r#""sessionId":7"#));
    }
}

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::{json, Value};

use crate::{DocsClient, DocsError};

const SSE_MARKER: &str = "data:";

/// HTTP client for a Context7 MCP endpoint.
#[derive(Debug, Clone)]
pub struct Context7Client {
    url: String,
    http: reqwest::Client,
}

impl Context7Client {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DocsClient for Context7Client {
    async fn call(&self, method: &str, params: Value) -> Result<Value, DocsError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": request_id(),
            "method": method,
            "params": params,
        });

        tracing::debug!(method, url = %self.url, "calling Context7");
        let response = self
            .http
            .post(&self.url)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| DocsError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DocsError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(DocsError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        unwrap_envelope(parse_body(&text)?)
    }
}

/// Request ids only need to be unique within the process; responses are matched
/// by the request/response pairing of HTTP, not by id.
fn request_id() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

/// Parse a response body that is either plain JSON or an SSE stream. For SSE the
/// last `data:` line wins.
pub fn parse_body(body: &str) -> Result<Value, DocsError> {
    let payload = if body.contains(SSE_MARKER) {
        body.lines()
            .filter_map(|line| line.strip_prefix(SSE_MARKER))
            .last()
            .unwrap_or(body)
    } else {
        body
    };

    serde_json::from_str(payload.trim()).map_err(|_| DocsError::Unparseable {
        body: body.to_string(),
    })
}

/// Turn a JSON-RPC envelope into its `result`, or its `error` into a [`DocsError::Rpc`].
pub fn unwrap_envelope(mut envelope: Value) -> Result<Value, DocsError> {
    if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| error.to_string());
        return Err(DocsError::Rpc { message });
    }

    Ok(envelope
        .get_mut("result")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

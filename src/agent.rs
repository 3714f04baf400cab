use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::AgentConfig;

#[derive(Debug, Serialize)]
struct AgentRequest<'a> {
    message: &'a str,
    agent_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

/// What the research service hands back for one call.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AgentEnvelope {
    pub success: bool,
    #[serde(default)]
    pub response: Option<AgentResponse>,
    #[serde(default)]
    pub raw_response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AgentResponse {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub session_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AgentClient {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl AgentClient {
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(AgentClient {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one query to an agent and decode whatever envelope comes back.
    pub async fn call(&self, query: &str, agent_id: &str, options: &CallOptions) -> Result<AgentEnvelope> {
        let request = AgentRequest {
            message: query,
            agent_id,
            session_id: options.session_id.as_deref(),
        };

        tracing::debug!("[Agent] POST {} agent={} session={:?}", self.endpoint, agent_id, options.session_id);

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::debug!("[Agent] {} ({} bytes)", status, body.len());

        decode_envelope(status, &body)
    }
}

/// Service-reported failures still arrive as envelopes, so the body is tried
/// first. A successful body that is not an envelope is handed on as a raw
/// result for the normalizer to pick apart.
pub fn decode_envelope(status: reqwest::StatusCode, body: &str) -> Result<AgentEnvelope> {
    if let Ok(envelope) = serde_json::from_str::<AgentEnvelope>(body) {
        return Ok(envelope);
    }

    if !status.is_success() {
        return Err(anyhow!("Agent API error ({}): {}", status, body));
    }

    if body.trim().is_empty() {
        return Err(anyhow!("Agent API returned an empty response"));
    }

    Ok(AgentEnvelope {
        success: true,
        response: Some(AgentResponse {
            result: Value::String(body.to_string()),
            message: None,
        }),
        raw_response: Some(body.to_string()),
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_decode_full_envelope() {
        let body = r#"{"success":true,"response":{"result":{"summary":"x"},"message":"ok"},"raw_response":"{}"}"#;
        let envelope = decode_envelope(StatusCode::OK, body).unwrap();
        assert!(envelope.success);
        let response = envelope.response.unwrap();
        assert_eq!(response.result, json!({"summary": "x"}));
        assert_eq!(response.message.as_deref(), Some("ok"));
        assert_eq!(envelope.raw_response.as_deref(), Some("{}"));
        assert!(envelope.error.is_none());
    }

    #[test]
    fn test_decode_failure_envelope_on_error_status() {
        let envelope = decode_envelope(StatusCode::BAD_GATEWAY, r#"{"success":false,"error":"boom"}"#).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_decode_error_status_without_envelope() {
        let err = decode_envelope(StatusCode::INTERNAL_SERVER_ERROR, "upstream down").unwrap_err();
        assert_eq!(err.to_string(), "Agent API error (500 Internal Server Error): upstream down");
    }

    #[test]
    fn test_decode_bare_result_body() {
        let body = r#"{"summary":"bare"}"#;
        let envelope = decode_envelope(StatusCode::OK, body).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.response.unwrap().result, Value::String(body.to_string()));
        assert_eq!(envelope.raw_response.as_deref(), Some(body));
    }

    #[test]
    fn test_decode_empty_success_body() {
        assert!(decode_envelope(StatusCode::OK, "  ").is_err());
    }

    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let response = format!(
            "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        serve_raw(response).await
    }

    /// Answer one request with `response` written verbatim, then hang up.
    async fn serve_raw(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];

            // Read headers, then as much body as Content-Length announces.
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let lower = line.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}/agent", addr), handle)
    }

    fn test_config(endpoint: String, api_key: Option<&str>) -> AgentConfig {
        let mut config = crate::config::Config::default().agent;
        config.endpoint = endpoint;
        config.api_key = api_key.map(str::to_string);
        config.timeout_secs = 5;
        config
    }

    #[tokio::test]
    async fn test_call_posts_query_and_decodes_envelope() {
        let (endpoint, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"success":true,"response":{"result":"{\"summary\":\"hi\"}"}}"#,
        )
        .await;

        let client = AgentClient::from_config(&test_config(endpoint, Some("k-123"))).unwrap();
        let options = CallOptions { session_id: Some("s-1".to_string()) };
        let envelope = client.call("What is RAG?", "agent-7", &options).await.unwrap();

        assert!(envelope.success);
        assert_eq!(
            envelope.response.unwrap().result,
            Value::String(r#"{"summary":"hi"}"#.to_string())
        );

        let request = server.await.unwrap();
        let lower = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /agent"));
        assert!(lower.contains("x-api-key: k-123"));
        assert!(request.contains(r#""message":"What is RAG?""#));
        assert!(request.contains(r#""agent_id":"agent-7""#));
        assert!(request.contains(r#""session_id":"s-1""#));
    }

    #[tokio::test]
    async fn test_call_surfaces_http_errors() {
        let (endpoint, server) = serve_once("HTTP/1.1 503 Service Unavailable", "overloaded").await;

        let client = AgentClient::from_config(&test_config(endpoint, None)).unwrap();
        let err = client.call("q", "a", &CallOptions::default()).await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("overloaded"));

        let request = server.await.unwrap();
        assert!(!request.to_ascii_lowercase().contains("x-api-key"));
        assert!(!request.contains("session_id"));
    }

    #[tokio::test]
    async fn test_call_surfaces_truncated_body() {
        let response = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 500\r\nConnection: close\r\n\r\n{\"success\"".to_string();
        let (endpoint, server) = serve_raw(response).await;

        let client = AgentClient::from_config(&test_config(endpoint, None)).unwrap();
        let err = client.call("q", "a", &CallOptions::default()).await.unwrap_err();
        assert!(err.downcast_ref::<reqwest::Error>().is_some());
        assert!(!err.to_string().contains("empty response"));

        server.await.unwrap();
    }
}

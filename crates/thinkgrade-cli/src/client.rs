//! HTTP client for a running gateway.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use thinkgrade_core::model::{EvaluationRequest, Feedback};
use thinkgrade_core::parser::feedback_from_value;
use thinkgrade_core::traits::EvaluationBackend;

const TIMEOUT_SECS: u64 = 180;

/// Calls `POST {base_url}/evaluate` as a browser on `origin` would.
pub struct GatewayClient {
    base_url: String,
    origin: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

impl GatewayClient {
    pub fn new(base_url: &str, origin: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            origin: origin.to_string(),
            client,
        })
    }
}

#[async_trait]
impl EvaluationBackend for GatewayClient {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<Feedback, String> {
        let response = self
            .client
            .post(format!("{}/evaluate", self.base_url))
            .header("Origin", &self.origin)
            .json(request)
            .send()
            .await
            .map_err(|e| format!("failed to reach gateway at {}: {e}", self.base_url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read gateway response: {e}"))?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(ErrorEnvelope {
                    error,
                    details: Some(details),
                }) => format!("{error} ({details})"),
                Ok(ErrorEnvelope { error, .. }) => error,
                Err(_) if status.as_u16() == 403 => {
                    format!("gateway rejected origin {} (HTTP 403)", self.origin)
                }
                Err(_) => format!("gateway returned HTTP {}", status.as_u16()),
            });
        }

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| format!("gateway returned invalid JSON: {e}"))?;
        feedback_from_value(&value).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> EvaluationRequest {
        EvaluationRequest::new("problem-2", "Too many walk-ins and paper intake forms.")
    }

    #[tokio::test]
    async fn returns_feedback() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/evaluate"))
            .and(header("Origin", "http://localhost:5173"))
            .and(body_json(serde_json::json!({
                "problemId": "problem-2",
                "answer": "Too many walk-ins and paper intake forms."
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "score": 2,
                "strengths": ["names two causes"],
                "improvements": ["not MECE"],
                "suggestions": ["split by demand and supply"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GatewayClient::new(&format!("{}/", server.uri()), "http://localhost:5173").unwrap();
        let feedback = client.evaluate(&request()).await.unwrap();
        assert_eq!(feedback.score, 2);
        assert_eq!(feedback.suggestions, vec!["split by demand and supply"]);
    }

    #[tokio::test]
    async fn surfaces_error_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/evaluate"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": "Failed to generate the evaluation.",
                "details": "no JSON object found in model reply"
            })))
            .mount(&server)
            .await;

        let client = GatewayClient::new(&server.uri(), "http://localhost:5173").unwrap();
        let err = client.evaluate(&request()).await.unwrap_err();
        assert_eq!(
            err,
            "Failed to generate the evaluation. (no JSON object found in model reply)"
        );
    }

    #[tokio::test]
    async fn rate_limit_message_passed_through() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(serde_json::json!({"error": "Too many evaluation requests."})),
            )
            .mount(&server)
            .await;

        let client = GatewayClient::new(&server.uri(), "http://localhost:5173").unwrap();
        assert_eq!(
            client.evaluate(&request()).await.unwrap_err(),
            "Too many evaluation requests."
        );
    }

    #[tokio::test]
    async fn forbidden_origin_explained() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = GatewayClient::new(&server.uri(), "https://elsewhere.example").unwrap();
        let err = client.evaluate(&request()).await.unwrap_err();
        assert!(err.contains("https://elsewhere.example"));
        assert!(err.contains("403"));
    }

    #[tokio::test]
    async fn malformed_success_body_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"score": "4"})))
            .mount(&server)
            .await;

        let client = GatewayClient::new(&server.uri(), "http://localhost:5173").unwrap();
        let err = client.evaluate(&request()).await.unwrap_err();
        assert!(err.contains("invalid evaluation structure"));
    }
}

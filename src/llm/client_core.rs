use anyhow::Result;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::llm::LlmErrorKind;
use crate::llm::types::ChatMessage;

mod network;

/// Client for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    pub base_url: String,
    pub api_key: String,
    pub(crate) inner: reqwest::Client,
    pub llm_cfg: LlmConfig,
}

impl OpenAIClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let inner = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            inner,
            llm_cfg: LlmConfig::default(),
        })
    }

    pub fn with_llm_config(mut self, cfg: LlmConfig) -> Self {
        let builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .timeout(Duration::from_millis(cfg.request_timeout_ms));
        // Keep the default client if the builder rejects the timeouts.
        if let Ok(c) = builder.build() {
            self.inner = c;
        }
        self.llm_cfg = cfg;
        self
    }

    pub(crate) fn endpoint(&self) -> String {
        let mut base = self.base_url.trim_end_matches('/').to_string();
        if let Some(pos) = base.rfind("/v1") {
            base.truncate(pos);
            base = base.trim_end_matches('/').to_string();
        }
        format!("{base}/v1/chat/completions")
    }

    /// Sends one chat request and returns the text of the first choice.
    pub async fn chat_once(&self, model: &str, messages: Vec<ChatMessage>) -> Result<String> {
        network::chat_once(self, model, messages).await
    }

    pub(crate) fn should_retry(&self, kind: &LlmErrorKind) -> bool {
        matches!(
            kind,
            LlmErrorKind::RateLimited
                | LlmErrorKind::Server
                | LlmErrorKind::Network
                | LlmErrorKind::Timeout
        )
    }

    pub(crate) fn backoff_delay(&self, attempt: usize, retry_after_secs: Option<u64>) -> Duration {
        if self.llm_cfg.respect_retry_after
            && let Some(secs) = retry_after_secs
        {
            return Duration::from_secs(secs);
        }
        let base = self.llm_cfg.retry_base_ms;
        let shift = attempt.saturating_sub(1).min(16) as u32;
        let exp = base.saturating_mul(1u64 << shift);
        let jitter = fastrand::u64(0..=self.llm_cfg.retry_jitter_ms);
        Duration::from_millis(exp.saturating_add(jitter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{Expectation, Server, matchers::*, responders::*};

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "test",
            "choices": [
                {"index":0, "message": {"role":"assistant","content":content}}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        })
    }

    fn fast_cfg(max_retries: usize) -> LlmConfig {
        LlmConfig {
            connect_timeout_ms: 5_000,
            request_timeout_ms: 5_000,
            max_retries,
            retry_base_ms: 1,
            retry_jitter_ms: 0,
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn chat_once_happy_path() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/v1/chat/completions"),
                request::headers(contains(key("authorization"))),
                request::body(json_decoded(eq(serde_json::json!({
                    "model": "gpt-test",
                    "messages": [
                        {"role": "system", "content": "sys"},
                        {"role": "user", "content": "hi"}
                    ],
                    "temperature": 0.5
                })))),
            ])
            .respond_with(json_encoded(completion("hello"))),
        );

        let client = OpenAIClient::new(format!("{}/", server.url_str("")), "test-key")
            .unwrap()
            .with_llm_config(LlmConfig {
                temperature: 0.5,
                ..fast_cfg(0)
            });
        let text = client
            .chat_once(
                "gpt-test",
                vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            )
            .await
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn chat_once_does_not_retry_by_default() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
                .times(1)
                .respond_with(status_code(500).body("oops")),
        );
        let client = OpenAIClient::new(server.url_str(""), "x")
            .unwrap()
            .with_llm_config(fast_cfg(0));
        let err = client
            .chat_once("gpt", vec![ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(format!("{err}").contains("500"));
    }

    #[tokio::test]
    async fn chat_once_retries_on_500_when_configured() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
                .times(2)
                .respond_with(httptest::cycle![
                    status_code(500)
                        .append_header("Retry-After", "0")
                        .body("oops"),
                    json_encoded(completion("ok")),
                ]),
        );
        let client = OpenAIClient::new(server.url_str(""), "x")
            .unwrap()
            .with_llm_config(fast_cfg(1));
        let text = client
            .chat_once("gpt", vec![ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn chat_once_non200_is_error_no_retry_on_400() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
                .times(1)
                .respond_with(status_code(400).body("bad")),
        );
        let client = OpenAIClient::new(server.url_str(""), "x")
            .unwrap()
            .with_llm_config(fast_cfg(3));
        let err = client
            .chat_once("gpt", vec![ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(format!("{err}").contains("400"));
    }

    #[tokio::test]
    async fn chat_once_without_choices_is_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
                .respond_with(json_encoded(serde_json::json!({"id": "x", "choices": []}))),
        );
        let client = OpenAIClient::new(server.url_str(""), "x")
            .unwrap()
            .with_llm_config(fast_cfg(0));
        let err = client
            .chat_once("gpt", vec![ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(format!("{err}").contains("no choices"));
    }

    #[test]
    fn endpoint_normalization() {
        let c = OpenAIClient::new("https://api.example.com/v1/", "x").unwrap();
        assert_eq!(c.endpoint(), "https://api.example.com/v1/chat/completions");
        let c2 = OpenAIClient::new("https://api.example.com/", "x").unwrap();
        assert_eq!(c2.endpoint(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn backoff_respects_retry_after_and_grows() {
        let c = OpenAIClient::new("http://localhost", "x")
            .unwrap()
            .with_llm_config(LlmConfig {
                retry_base_ms: 100,
                retry_jitter_ms: 0,
                respect_retry_after: true,
                ..LlmConfig::default()
            });
        assert_eq!(c.backoff_delay(1, Some(3)), Duration::from_secs(3));
        assert_eq!(c.backoff_delay(1, None), Duration::from_millis(100));
        assert_eq!(c.backoff_delay(3, None), Duration::from_millis(400));
    }

    #[test]
    fn backoff_jitter_spans_the_configured_range() {
        let c = OpenAIClient::new("http://localhost", "x")
            .unwrap()
            .with_llm_config(LlmConfig {
                retry_base_ms: 100,
                retry_jitter_ms: 50,
                ..LlmConfig::default()
            });
        let delays: Vec<u128> = (0..500)
            .map(|_| c.backoff_delay(1, None).as_millis())
            .collect();
        assert!(delays.iter().all(|d| (100..=150).contains(d)));
        let at_base = delays.iter().filter(|d| **d == 100).count();
        assert!(at_base < 100, "{at_base} of 500 delays carried no jitter");
        assert!(delays.iter().any(|d| *d > 125));
    }
}

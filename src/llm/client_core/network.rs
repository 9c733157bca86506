use anyhow::{Context, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use tracing::{debug, error, info, warn};

use super::OpenAIClient;
use crate::llm::types::{ChatMessage, ChatRequest, ChatResponse};
use crate::llm::{LlmErrorKind, classify_error};

pub async fn chat_once(
    client: &OpenAIClient,
    model: &str,
    messages: Vec<ChatMessage>,
) -> Result<String> {
    let url = client.endpoint();
    let req = ChatRequest {
        model: model.to_string(),
        messages,
        temperature: Some(client.llm_cfg.temperature),
    };

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", client.api_key))
            .context("api key is not a valid header value")?,
    );

    if let Ok(payload) = serde_json::to_string(&req) {
        debug!(target: "llm", payload=%payload, endpoint=%url, "sending chat.completions payload");
    }

    let max_attempts = client.llm_cfg.max_retries.saturating_add(1);
    let mut last_err: Option<anyhow::Error> = None;

    for attempt in 1..=max_attempts {
        let resp = match client
            .inner
            .post(&url)
            .headers(headers.clone())
            .json(&req)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                error!(attempt, err=%e, "llm chat_once send error");
                let err = anyhow::Error::new(e).context("send chat request");
                let kind = classify_error(None, &err);
                if client.should_retry(&kind) && attempt < max_attempts {
                    let wait = client.backoff_delay(attempt, None);
                    info!(attempt, kind=?kind, wait_ms=%wait.as_millis(), "retrying chat_once");
                    tokio::time::sleep(wait).await;
                    last_err = Some(err);
                    continue;
                }
                return Err(err);
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            let text = resp.text().await.unwrap_or_default();
            error!(attempt, status=%status.as_u16(), body=%text, "llm chat_once non-success status");
            let err = anyhow::anyhow!("chat error: {} - {}", status, text);
            let kind = classify_error(Some(status), &err);
            if client.should_retry(&kind) && attempt < max_attempts {
                let wait = client.backoff_delay(attempt, retry_after);
                info!(attempt, kind=?kind, wait_ms=%wait.as_millis(), "retrying chat_once");
                tokio::time::sleep(wait).await;
                last_err = Some(err);
                continue;
            }
            return Err(err);
        }

        let response_text = match resp.text().await {
            Ok(text) => text,
            Err(e) => {
                error!(attempt, err=%e, "llm chat_once read body error");
                let err = anyhow::Error::new(e).context("read chat response body");
                let kind = classify_error(None, &err);
                if client.should_retry(&kind) && attempt < max_attempts {
                    let wait = client.backoff_delay(attempt, None);
                    warn!(attempt, kind=?kind, "retrying after body read error");
                    tokio::time::sleep(wait).await;
                    last_err = Some(err);
                    continue;
                }
                return Err(err);
            }
        };

        let body: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!(attempt, kind=?LlmErrorKind::Deserialize, err=%e, "llm chat_once deserialize error");
            anyhow::Error::new(e).context("parse chat response")
        })?;

        if let Some(usage) = &body.usage {
            debug!(
                target: "llm",
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "llm chat_once usage"
            );
        }

        return body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .context("no choices returned");
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("unknown error")))
}

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Value};

use crate::{
    analyzer::{
        classify_http_failure, http_client, retry_with_backoff, AnalyzerOptions, VideoAnalyzer,
    },
    error::{FailureClass, KinoglazError, Result},
    prompts::{self, PromptKind},
    provider::Provider,
    types::{ChunkDescriptor, VideoPayload},
};

/// OpenRouter chat completions with video attached as a base64 data URL.
pub struct OpenRouterAnalyzer {
    client: reqwest::Client,
    api_key: String,
    api_url: &'static str,
    model: String,
    prompt_kind: PromptKind,
    key_frames: bool,
}

impl OpenRouterAnalyzer {
    pub fn new(options: AnalyzerOptions) -> Result<Self> {
        let provider = Provider::OpenRouter;
        let api_key = provider.validate_api_key()?;
        Ok(Self {
            client: http_client()?,
            api_key,
            api_url: provider.config().api_url,
            model: provider.resolve_model(options.model),
            prompt_kind: options.prompt_kind,
            key_frames: options.key_frames,
        })
    }

    async fn complete(&self, messages: &[Value]) -> Result<String> {
        let response = self
            .client
            .post(self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({ "model": self.model, "messages": messages }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(KinoglazError::AnalysisFailed {
                backend: "openrouter",
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.json::<Value>().await?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| KinoglazError::UnexpectedResponse {
                backend: "openrouter",
                body: body.to_string(),
            })
    }

    fn video_message(&self, payload: &VideoPayload, prompt: String) -> Value {
        let data_url = format!(
            "data:{};base64,{}",
            payload.mime_type,
            STANDARD.encode(&payload.bytes)
        );
        json!({
            "role": "user",
            "content": [
                { "type": "text", "text": prompt },
                { "type": "video_url", "video_url": { "url": data_url } },
            ]
        })
    }
}

/// OpenRouter relays upstream provider errors with inconsistent status
/// codes, so the error text is sniffed as well.
fn looks_rate_limited(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("rate") || message.contains("429")
}

#[async_trait]
impl VideoAnalyzer for OpenRouterAnalyzer {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn analyze_chunk(
        &self,
        payload: &VideoPayload,
        chunk: &ChunkDescriptor,
    ) -> Result<String> {
        let prompt = prompts::chunk_prompt(self.prompt_kind, chunk, self.key_frames);
        let messages = vec![self.video_message(payload, prompt)];
        retry_with_backoff(|e| self.classify_failure(e), || self.complete(&messages)).await
    }

    async fn analyze_whole(&self, payload: &VideoPayload) -> Result<String> {
        let prompt = prompts::describe_prompt(self.prompt_kind, self.key_frames);
        let messages = vec![self.video_message(payload, prompt)];
        retry_with_backoff(|e| self.classify_failure(e), || self.complete(&messages)).await
    }

    async fn combine(&self, analyses: &[String]) -> Result<String> {
        let messages = vec![json!({
            "role": "user",
            "content": prompts::combine_prompt(analyses),
        })];
        retry_with_backoff(|e| self.classify_failure(e), || self.complete(&messages)).await
    }

    fn classify_failure(&self, error: &KinoglazError) -> FailureClass {
        if let KinoglazError::AnalysisFailed { message, .. } = error {
            if looks_rate_limited(message) {
                return FailureClass::RateLimited;
            }
        }
        classify_http_failure(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_wording_is_sniffed_from_error_text() {
        assert!(looks_rate_limited("Rate limit exceeded, retry later"));
        assert!(looks_rate_limited("upstream returned 429"));
        assert!(!looks_rate_limited("model not found"));
    }
}

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

/// Google Gemini over the REST `generateContent` endpoint. Media travels
/// inline as base64.
pub struct GeminiAnalyzer {
    client: reqwest::Client,
    api_key: String,
    api_url: &'static str,
    model: String,
    prompt_kind: PromptKind,
    key_frames: bool,
}

impl GeminiAnalyzer {
    pub fn new(options: AnalyzerOptions) -> Result<Self> {
        let provider = Provider::Gemini;
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

    async fn generate(&self, parts: &[Value]) -> Result<String> {
        let url = format!("{}/{}:generateContent", self.api_url, self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&json!({ "contents": [{ "parts": parts }] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(KinoglazError::AnalysisFailed {
                backend: "gemini",
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.json::<Value>().await?;
        body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| KinoglazError::UnexpectedResponse {
                backend: "gemini",
                body: body.to_string(),
            })
    }

    fn media_part(payload: &VideoPayload) -> Value {
        json!({
            "inline_data": {
                "mime_type": payload.mime_type,
                "data": STANDARD.encode(&payload.bytes),
            }
        })
    }
}

#[async_trait]
impl VideoAnalyzer for GeminiAnalyzer {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn analyze_chunk(
        &self,
        payload: &VideoPayload,
        chunk: &ChunkDescriptor,
    ) -> Result<String> {
        let prompt = prompts::chunk_prompt(self.prompt_kind, chunk, self.key_frames);
        let parts = vec![Self::media_part(payload), json!({ "text": prompt })];
        retry_with_backoff(|e| self.classify_failure(e), || self.generate(&parts)).await
    }

    async fn analyze_whole(&self, payload: &VideoPayload) -> Result<String> {
        let prompt = prompts::describe_prompt(self.prompt_kind, self.key_frames);
        let parts = vec![Self::media_part(payload), json!({ "text": prompt })];
        retry_with_backoff(|e| self.classify_failure(e), || self.generate(&parts)).await
    }

    async fn combine(&self, analyses: &[String]) -> Result<String> {
        let parts = vec![json!({ "text": prompts::combine_prompt(analyses) })];
        retry_with_backoff(|e| self.classify_failure(e), || self.generate(&parts)).await
    }

    fn classify_failure(&self, error: &KinoglazError) -> FailureClass {
        classify_http_failure(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_part_carries_mime_and_base64_data() {
        let payload = VideoPayload {
            bytes: vec![1, 2, 3],
            mime_type: "video/mp4",
        };
        let part = GeminiAnalyzer::media_part(&payload);
        assert_eq!(part["inline_data"]["mime_type"], "video/mp4");
        assert_eq!(part["inline_data"]["data"], STANDARD.encode([1u8, 2, 3]));
    }
}

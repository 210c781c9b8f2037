use crate::config::Config;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;

/// Errors from the external generation service. Rate limits are kept
/// distinct so the judge retry loop can honor server backoff hints;
/// everything else is opaque.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type LlmResult<T> = Result<T, LlmError>;

#[async_trait]
pub trait LlmClient: Send + Sync + Debug {
    /// Free-form completion.
    async fn chat(&self, system: &str, user: &str) -> LlmResult<String>;

    /// Completion constrained to JSON output where the provider supports
    /// it. Callers still validate the payload; this only sets the
    /// response mime/format hint.
    async fn chat_json(&self, system: &str, user: &str) -> LlmResult<String> {
        self.chat(system, user).await
    }
}

pub fn create_llm(config: &Config) -> anyhow::Result<Box<dyn LlmClient>> {
    match config.llm.provider.as_str() {
        "gemini" => {
            let cfg = config.llm.gemini.as_ref().context("Gemini config missing")?;
            Ok(Box::new(GeminiClient::new(&cfg.api_key, &cfg.model)))
        }
        "ollama" => {
            let cfg = config.llm.ollama.as_ref().context("Ollama config missing")?;
            Ok(Box::new(OllamaClient::new(&cfg.base_url, &cfg.model)))
        }
        "openai" => {
            let cfg = config.llm.openai.as_ref().context("OpenAI config missing")?;
            Ok(Box::new(OpenAIClient::new(
                &cfg.api_key,
                &cfg.model,
                cfg.base_url.as_deref(),
            )))
        }
        _ => Err(anyhow!("Unknown LLM provider: {}", config.llm.provider)),
    }
}

/// Bounded retry against provider rate limits, shared by the metadata
/// extractor and the judge panel. The wait is the larger of the server's
/// retry-after hint and `base_delay * attempt_number`. Non-rate-limit
/// errors are returned immediately; callers decide the fallback.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    pub async fn run(
        &self,
        llm: &dyn LlmClient,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> LlmResult<String> {
        let mut attempt = 0;
        loop {
            let result = if json_mode {
                llm.chat_json(system, user).await
            } else {
                llm.chat(system, user).await
            };
            match result {
                Ok(text) => return Ok(text),
                Err(LlmError::RateLimited { retry_after }) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(LlmError::RateLimited { retry_after });
                    }
                    let floor = self.base_delay * attempt as u32;
                    let wait = retry_after.unwrap_or(Duration::ZERO).max(floor);
                    log::warn!(
                        "Rate limit hit, waiting {}s before retry (attempt {}/{})",
                        wait.as_secs(),
                        attempt,
                        self.max_attempts
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(other) => return Err(other),
            }
        }
    }
}

/// Remove markdown code fences some models wrap JSON replies in.
pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```json") {
        s.trim_start_matches("```json")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else if s.starts_with("```") {
        s.trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else {
        s.to_string()
    }
}

fn rate_limit_error(retry_after_header: Option<&str>, body: &str) -> LlmError {
    let from_header = retry_after_header
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs);
    let hint = from_header.or_else(|| parse_retry_info(body));
    LlmError::RateLimited { retry_after: hint }
}

/// Pull the RetryInfo delay hint out of a Google-style 429 error body,
/// e.g. `"retryDelay": "21s"`.
fn parse_retry_info(body: &str) -> Option<Duration> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let details = value.get("error")?.get("details")?.as_array()?;
    for detail in details {
        let is_retry_info = detail
            .get("@type")
            .and_then(|t| t.as_str())
            .map(|t| t.contains("RetryInfo"))
            .unwrap_or(false);
        if !is_retry_info {
            continue;
        }
        let delay = detail.get("retryDelay")?.as_str()?;
        let secs: u64 = delay.trim_end_matches('s').parse().ok()?;
        return Some(Duration::from_secs(secs));
    }
    None
}

// --- Gemini ---
#[derive(Debug)]
struct GeminiClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn generate(&self, system: &str, user: &str, json_mode: bool) -> LlmResult<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: user.to_string(),
                }],
            }],
            system_instruction: Some(GeminiSystemInstruction {
                parts: vec![GeminiPart {
                    text: system.to_string(),
                }],
            }),
            generation_config: json_mode.then(|| GeminiGenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        };

        let resp = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Other(e.into()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = resp.text().await.unwrap_or_default();
            return Err(rate_limit_error(retry_after.as_deref(), &body));
        }
        if !status.is_success() {
            let error_text = resp.text().await.map_err(|e| LlmError::Other(e.into()))?;
            return Err(LlmError::Other(anyhow!(
                "Gemini API error: {}",
                error_text
            )));
        }

        let response_text = resp.text().await.map_err(|e| LlmError::Other(e.into()))?;
        let result: GeminiResponse = serde_json::from_str(&response_text).map_err(|e| {
            LlmError::Other(anyhow!(
                "Failed to parse Gemini response: {}. Body: {}",
                e,
                response_text
            ))
        })?;

        if let Some(err) = result.error {
            return Err(LlmError::Other(anyhow!(
                "Gemini API returned error: {}",
                err.message
            )));
        }

        if let Some(candidates) = result.candidates {
            if let Some(first) = candidates.first() {
                if let Some(content) = &first.content {
                    if let Some(part) = content.parts.first() {
                        return Ok(part.text.clone());
                    }
                }

                let reason = first.finish_reason.as_deref().unwrap_or("UNKNOWN");
                return Err(LlmError::Other(anyhow!(
                    "Gemini response empty. Finish reason: {}",
                    reason
                )));
            }
        }

        Err(LlmError::Other(anyhow!(
            "Gemini response format unexpected or empty. Body: {}",
            response_text
        )))
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    text: String,
}

#[derive(Deserialize, Debug)]
struct GeminiError {
    message: String,
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn chat(&self, system: &str, user: &str) -> LlmResult<String> {
        self.generate(system, user, false).await
    }

    async fn chat_json(&self, system: &str, user: &str) -> LlmResult<String> {
        self.generate(system, user, true).await
    }
}

// --- Ollama ---
#[derive(Debug)]
struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn generate(&self, system: &str, user: &str, json_mode: bool) -> LlmResult<String> {
        let url = format!("{}/api/chat", self.base_url);

        let request_body = OllamaRequest {
            model: self.model.clone(),
            messages: vec![
                OllamaMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                OllamaMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            stream: false,
            format: json_mode.then(|| "json".to_string()),
        };

        let resp = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Other(e.into()))?;

        if !resp.status().is_success() {
            let error_text = resp.text().await.map_err(|e| LlmError::Other(e.into()))?;
            return Err(LlmError::Other(anyhow!(
                "Ollama API error: {}",
                error_text
            )));
        }

        let result: OllamaResponse = resp.json().await.map_err(|e| LlmError::Other(e.into()))?;
        Ok(result.message.content)
    }
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

#[derive(Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: OllamaMessageResponse,
}

#[derive(Deserialize)]
struct OllamaMessageResponse {
    content: String,
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat(&self, system: &str, user: &str) -> LlmResult<String> {
        self.generate(system, user, false).await
    }

    async fn chat_json(&self, system: &str, user: &str) -> LlmResult<String> {
        self.generate(system, user, true).await
    }
}

// --- OpenAI ---

#[derive(Debug)]
struct OpenAIClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIClient {
    fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url
                .unwrap_or("https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn generate(&self, system: &str, user: &str, json_mode: bool) -> LlmResult<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            response_format: json_mode.then(|| OpenAIResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Other(e.into()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = resp.text().await.unwrap_or_default();
            return Err(rate_limit_error(retry_after.as_deref(), &body));
        }
        if !status.is_success() {
            let error_text = resp.text().await.map_err(|e| LlmError::Other(e.into()))?;
            return Err(LlmError::Other(anyhow!(
                "OpenAI API error: {}",
                error_text
            )));
        }

        let result: OpenAIResponse = resp.json().await.map_err(|e| LlmError::Other(e.into()))?;
        if let Some(choice) = result.choices.first() {
            if let Some(content) = &choice.message.content {
                return Ok(content.clone());
            }
        }

        Err(LlmError::Other(anyhow!(
            "OpenAI response empty or missing content"
        )))
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn chat(&self, system: &str, user: &str) -> LlmResult<String> {
        self.generate(system, user, false).await
    }

    async fn chat_json(&self, system: &str, user: &str) -> LlmResult<String> {
        self.generate(system, user, true).await
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
}

#[derive(Serialize)]
struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessageResponse,
}

#[derive(Deserialize)]
struct OpenAIMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_response_parsing_safety_block() {
        // Content blocked: candidate present but no content/parts.
        let json = r#"{
            "candidates": [
                {
                    "finishReason": "SAFETY",
                    "index": 0
                }
            ]
        }"#;

        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        let candidate = &result.candidates.as_ref().unwrap()[0];

        assert!(candidate.content.is_none());
        assert_eq!(candidate.finish_reason.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn test_gemini_response_parsing_success() {
        let json = r#"{
            "candidates": [
                {
                    "content": {
                        "parts": [
                            { "text": "{\"score\": 7}" }
                        ],
                        "role": "model"
                    },
                    "finishReason": "STOP",
                    "index": 0
                }
            ]
        }"#;

        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        let candidate = &result.candidates.as_ref().unwrap()[0];

        assert_eq!(
            candidate.content.as_ref().unwrap().parts[0].text,
            "{\"score\": 7}"
        );
    }

    #[test]
    fn test_retry_info_extraction() {
        let body = r#"{
            "error": {
                "code": 429,
                "message": "Resource has been exhausted",
                "details": [
                    { "@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "21s" }
                ]
            }
        }"#;
        assert_eq!(parse_retry_info(body), Some(Duration::from_secs(21)));
        assert_eq!(parse_retry_info("{}"), None);
        assert_eq!(parse_retry_info("not json"), None);
    }

    #[test]
    fn test_retry_after_header_wins() {
        let err = rate_limit_error(Some("30"), "{}");
        match err {
            LlmError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Some(Duration::from_secs(30)));
            }
            _ => panic!("expected RateLimited"),
        }
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("json"), "json");
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("  ```json  \n  {}  \n  ```  "), "{}");
    }

    #[derive(Debug)]
    struct FlakyLlm {
        failures: std::sync::Mutex<usize>,
        rate_limited: bool,
    }

    #[async_trait]
    impl LlmClient for FlakyLlm {
        async fn chat(&self, _system: &str, _user: &str) -> LlmResult<String> {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                if self.rate_limited {
                    return Err(LlmError::RateLimited { retry_after: None });
                }
                return Err(LlmError::Other(anyhow!("boom")));
            }
            Ok("ok".to_string())
        }
    }

    #[tokio::test]
    async fn test_retry_policy_recovers_from_rate_limits() {
        let llm = FlakyLlm {
            failures: std::sync::Mutex::new(2),
            rate_limited: true,
        };
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let result = policy.run(&llm, "sys", "user", false).await.unwrap();
        assert_eq!(result, "ok");
    }

    #[tokio::test]
    async fn test_retry_policy_exhausts() {
        let llm = FlakyLlm {
            failures: std::sync::Mutex::new(100),
            rate_limited: true,
        };
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let result = policy.run(&llm, "sys", "user", false).await;
        assert!(matches!(result, Err(LlmError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_retry_policy_does_not_retry_other_errors() {
        let llm = FlakyLlm {
            failures: std::sync::Mutex::new(1),
            rate_limited: false,
        };
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let result = policy.run(&llm, "sys", "user", false).await;
        assert!(matches!(result, Err(LlmError::Other(_))));
    }

    #[test]
    fn test_json_mode_request_shape() {
        let req = GeminiRequest {
            contents: vec![],
            system_instruction: None,
            generation_config: Some(GeminiGenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"responseMimeType\":\"application/json\""));
    }
}

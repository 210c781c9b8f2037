use crate::config::Config;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Gemini TTS returns 24 kHz PCM.
const DEFAULT_SAMPLE_RATE: u32 = 24000;

#[derive(Debug, Clone)]
pub struct RenderedAudio {
    pub audio_base64: String,
    pub sample_rate: u32,
}

/// Renders one utterance with a prebuilt voice. Sample generation is
/// best-effort throughout the pipeline: callers log failures and carry on
/// with text-only evaluation.
#[async_trait]
pub trait TtsClient: Send + Sync {
    async fn synthesize(&self, text: &str, voice_name: &str) -> Result<RenderedAudio>;
}

pub fn create_tts_client(config: &Config) -> Result<Box<dyn TtsClient>> {
    let gemini = config
        .llm
        .gemini
        .as_ref()
        .ok_or_else(|| anyhow!("TTS rendering requires the Gemini provider config"))?;
    Ok(Box::new(GeminiTtsClient::new(
        &gemini.api_key,
        &config.tts.model,
    )))
}

/// Pull quoted dialogue out of a generated line before synthesis.
/// Dialogue may arrive wrapped in single quotes; unquoted text is used
/// as-is.
pub fn extract_dialogue_for_tts(text: &str) -> String {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('\'') {
        let after = &rest[start + 1..];
        match after.find('\'') {
            Some(end) => {
                if end > 0 {
                    parts.push(&after[..end]);
                }
                rest = &after[end + 1..];
            }
            None => break,
        }
    }

    if parts.is_empty() {
        text.to_string()
    } else {
        parts.join(", ")
    }
}

// --- Gemini TTS ---

pub struct GeminiTtsClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiTtsClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct TtsRequest {
    contents: Vec<TtsContent>,
    #[serde(rename = "generationConfig")]
    generation_config: TtsGenerationConfig,
}

#[derive(Serialize)]
struct TtsContent {
    parts: Vec<TtsPart>,
}

#[derive(Serialize)]
struct TtsPart {
    text: String,
}

#[derive(Serialize)]
struct TtsGenerationConfig {
    #[serde(rename = "responseModalities")]
    response_modalities: Vec<String>,
    #[serde(rename = "speechConfig")]
    speech_config: SpeechConfig,
}

#[derive(Serialize)]
struct SpeechConfig {
    #[serde(rename = "voiceConfig")]
    voice_config: VoiceConfig,
}

#[derive(Serialize)]
struct VoiceConfig {
    #[serde(rename = "prebuiltVoiceConfig")]
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize)]
struct PrebuiltVoiceConfig {
    #[serde(rename = "voiceName")]
    voice_name: String,
}

#[derive(Deserialize)]
struct TtsResponse {
    candidates: Option<Vec<TtsCandidate>>,
}

#[derive(Deserialize)]
struct TtsCandidate {
    content: Option<TtsContentResponse>,
}

#[derive(Deserialize)]
struct TtsContentResponse {
    #[serde(default)]
    parts: Vec<TtsPartResponse>,
}

#[derive(Deserialize)]
struct TtsPartResponse {
    #[serde(rename = "inlineData")]
    inline_data: Option<TtsInlineData>,
}

#[derive(Deserialize)]
struct TtsInlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[async_trait]
impl TtsClient for GeminiTtsClient {
    async fn synthesize(&self, text: &str, voice_name: &str) -> Result<RenderedAudio> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let request_body = TtsRequest {
            contents: vec![TtsContent {
                parts: vec![TtsPart {
                    text: extract_dialogue_for_tts(text),
                }],
            }],
            generation_config: TtsGenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice_name.to_lowercase(),
                        },
                    },
                },
            },
        };

        let resp = self.client.post(&url).json(&request_body).send().await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("Gemini TTS error: {}", error_text));
        }

        let result: TtsResponse = resp.json().await?;
        let audio = result
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|content| {
                content.parts.into_iter().find_map(|p| {
                    p.inline_data
                        .filter(|d| d.mime_type.contains("audio"))
                        .map(|d| d.data)
                })
            })
            .ok_or_else(|| anyhow!("No audio data returned for voice {}", voice_name))?;

        Ok(RenderedAudio {
            audio_base64: audio,
            sample_rate: DEFAULT_SAMPLE_RATE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_quoted_dialogue() {
        assert_eq!(
            extract_dialogue_for_tts("She said 'hello there' and left."),
            "hello there"
        );
        assert_eq!(
            extract_dialogue_for_tts("'first part' then 'second part'"),
            "first part, second part"
        );
    }

    #[test]
    fn test_extract_unquoted_passthrough() {
        assert_eq!(
            extract_dialogue_for_tts("No quotes here at all."),
            "No quotes here at all."
        );
        assert_eq!(extract_dialogue_for_tts("dangling ' quote"), "dangling ' quote");
    }

    #[test]
    fn test_tts_response_audio_extraction() {
        let json = r#"{
            "candidates": [
                {
                    "content": {
                        "parts": [
                            { "text": "ignored" },
                            { "inlineData": { "mimeType": "audio/L16;rate=24000", "data": "QUJD" } }
                        ]
                    }
                }
            ]
        }"#;
        let parsed: TtsResponse = serde_json::from_str(json).unwrap();
        let audio = parsed
            .candidates
            .unwrap()
            .remove(0)
            .content
            .unwrap()
            .parts
            .into_iter()
            .find_map(|p| p.inline_data.filter(|d| d.mime_type.contains("audio")));
        assert_eq!(audio.unwrap().data, "QUJD");
    }
}

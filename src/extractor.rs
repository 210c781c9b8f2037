use crate::llm::{strip_code_blocks, LlmClient, RetryPolicy};
use crate::model::{AgeBucket, Character, ExtractedMetadata, Gender};
use crate::store::CharacterRecord;
use log::warn;
use serde::Deserialize;

/// Infers gender, age bucket and accent/culture for one character from
/// its free-text profile via constrained classification calls. Any
/// malformed or off-enum reply degrades to `Unknown`; extraction never
/// fails a character.
pub struct MetadataExtractor<'a> {
    llm: &'a dyn LlmClient,
    retry: RetryPolicy,
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[derive(Deserialize, Default)]
struct AccentReply {
    #[serde(default)]
    accent: Option<String>,
    #[serde(default)]
    culture: Option<String>,
}

fn known(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("unknown"))
}

impl<'a> MetadataExtractor<'a> {
    pub fn new(llm: &'a dyn LlmClient, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }

    pub async fn extract(&self, record: &CharacterRecord) -> Character {
        let gender = self.extract_gender(record).await;
        let age = self.extract_age(record).await;
        let (accent, culture) = self.extract_accent(record).await;

        Character {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            tagline: record.tagline.clone(),
            category: record.category.clone(),
            archetype: record.archetype.clone(),
            system_prompt: record.system_prompt.clone(),
            current_voice_name: record.voice_name.clone(),
            current_style_hint: record.style_hint.clone(),
            metadata: ExtractedMetadata {
                gender,
                age,
                accent,
                culture,
            },
        }
    }

    async fn extract_gender(&self, record: &CharacterRecord) -> Gender {
        let prompt = format!(
            "Analyze this character and determine their gender. Return ONLY one word: \
             \"male\", \"female\", \"neutral\", or \"unknown\".\n\n\
             Character Name: {}\n\
             Description: {}\n\
             System Prompt: {}\n\n\
             Return only the gender word, nothing else.",
            record.name,
            record.description,
            truncate_chars(&record.system_prompt, 500)
        );

        match self
            .retry
            .run(self.llm, CLASSIFIER_SYSTEM, &prompt, false)
            .await
        {
            Ok(reply) => Gender::from_judge_word(&reply),
            Err(e) => {
                warn!("Gender extraction failed for {}: {}", record.name, e);
                Gender::Unknown
            }
        }
    }

    async fn extract_age(&self, record: &CharacterRecord) -> AgeBucket {
        let prompt = format!(
            "Analyze this character and determine their age category. Return ONLY one word: \
             \"young\", \"middle\", \"old\", or \"unknown\".\n\n\
             Character Name: {}\n\
             Description: {}\n\
             System Prompt: {}\n\n\
             Return only the age category word, nothing else.",
            record.name,
            record.description,
            truncate_chars(&record.system_prompt, 500)
        );

        match self
            .retry
            .run(self.llm, CLASSIFIER_SYSTEM, &prompt, false)
            .await
        {
            Ok(reply) => AgeBucket::from_judge_word(&reply),
            Err(e) => {
                warn!("Age extraction failed for {}: {}", record.name, e);
                AgeBucket::Unknown
            }
        }
    }

    async fn extract_accent(&self, record: &CharacterRecord) -> (Option<String>, Option<String>) {
        let prompt = format!(
            "Analyze this character and determine their accent and cultural background. \
             Return JSON with \"accent\" and \"culture\" fields. If unknown, use \"unknown\".\n\n\
             Character Name: {}\n\
             Description: {}\n\
             System Prompt: {}\n\n\
             Return JSON only: {{\"accent\": \"...\", \"culture\": \"...\"}}",
            record.name,
            record.description,
            truncate_chars(&record.system_prompt, 500)
        );

        let reply = match self
            .retry
            .run(self.llm, CLASSIFIER_SYSTEM, &prompt, true)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Accent extraction failed for {}: {}", record.name, e);
                return (None, None);
            }
        };

        let parsed: AccentReply =
            serde_json::from_str(&strip_code_blocks(&reply)).unwrap_or_default();
        (known(parsed.accent), known(parsed.culture))
    }
}

const CLASSIFIER_SYSTEM: &str =
    "You are a character profile classifier. Follow the output format exactly.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, LlmResult};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Debug)]
    struct ScriptedLlm {
        gender: &'static str,
        age: &'static str,
        accent: &'static str,
        fail_all: bool,
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn chat(&self, _system: &str, user: &str) -> LlmResult<String> {
            if self.fail_all {
                return Err(LlmError::Other(anyhow!("service down")));
            }
            if user.contains("determine their gender") {
                Ok(self.gender.to_string())
            } else if user.contains("age category") {
                Ok(self.age.to_string())
            } else if user.contains("accent and cultural background") {
                Ok(self.accent.to_string())
            } else {
                Err(LlmError::Other(anyhow!("unexpected prompt")))
            }
        }
    }

    fn record() -> CharacterRecord {
        CharacterRecord {
            id: "c1".to_string(),
            name: "Marjorie Halloway".to_string(),
            description: "A demanding 75-year-old woman".to_string(),
            tagline: None,
            category: "Human".to_string(),
            archetype: "karen".to_string(),
            system_prompt: "You are Marjorie.".to_string(),
            voice_name: "kore".to_string(),
            style_hint: None,
            featured: false,
            created_at: None,
        }
    }

    fn extractor(llm: &dyn LlmClient) -> MetadataExtractor<'_> {
        MetadataExtractor::new(llm, RetryPolicy::new(2, Duration::ZERO))
    }

    #[tokio::test]
    async fn test_extracts_well_formed_metadata() {
        let llm = ScriptedLlm {
            gender: " Female\n",
            age: "OLD",
            accent: "```json\n{\"accent\": \"British\", \"culture\": \"unknown\"}\n```",
            fail_all: false,
        };

        let character = extractor(&llm).extract(&record()).await;
        assert_eq!(character.metadata.gender, Gender::Female);
        assert_eq!(character.metadata.age, AgeBucket::Old);
        assert_eq!(character.metadata.accent.as_deref(), Some("British"));
        assert!(character.metadata.culture.is_none());
    }

    #[tokio::test]
    async fn test_off_enum_replies_map_to_unknown() {
        let llm = ScriptedLlm {
            gender: "the character appears to be a woman",
            age: "teenager",
            accent: "not json at all",
            fail_all: false,
        };

        let character = extractor(&llm).extract(&record()).await;
        assert_eq!(character.metadata.gender, Gender::Unknown);
        assert_eq!(character.metadata.age, AgeBucket::Unknown);
        assert!(character.metadata.accent.is_none());
        assert!(character.metadata.culture.is_none());
    }

    #[tokio::test]
    async fn test_service_failure_never_aborts() {
        let llm = ScriptedLlm {
            gender: "",
            age: "",
            accent: "",
            fail_all: true,
        };

        let character = extractor(&llm).extract(&record()).await;
        assert_eq!(character.metadata.gender, Gender::Unknown);
        assert_eq!(character.metadata.age, AgeBucket::Unknown);
        assert_eq!(character.name, "Marjorie Halloway");
    }
}

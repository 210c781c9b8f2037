use crate::llm::{strip_code_blocks, LlmClient, RetryPolicy};
use crate::model::{Character, DialogueSample};
use log::warn;
use serde::Deserialize;

/// Generates the five test utterances per character that every voice is
/// judged against. A malformed reply or a wrong line count falls back to
/// a fixed set so downstream stages always see exactly five samples.
pub struct DialogueGenerator<'a> {
    llm: &'a dyn LlmClient,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct DialogueReply {
    #[serde(rename = "dialogueIndex", alias = "index")]
    index: u8,
    text: String,
    #[serde(default)]
    context: String,
}

impl<'a> DialogueGenerator<'a> {
    pub fn new(llm: &'a dyn LlmClient, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }

    pub async fn generate(&self, character: &Character) -> Vec<DialogueSample> {
        let prompt = build_prompt(character);

        let reply = match self.retry.run(self.llm, DIALOGUE_SYSTEM, &prompt, true).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Dialogue generation failed for {}: {}", character.name, e);
                return fallback_dialogues(character);
            }
        };

        match parse_dialogues(&reply, &character.id) {
            Some(samples) => samples,
            None => {
                warn!(
                    "Unusable dialogue reply for {}, using fallback set",
                    character.name
                );
                fallback_dialogues(character)
            }
        }
    }
}

fn build_prompt(character: &Character) -> String {
    let personality: String = character.system_prompt.chars().take(300).collect();
    format!(
        "You are {name}. Generate 5 diverse dialogue pieces that this character would say. \
         Each dialogue should be 10-30 words and represent different contexts:\n\n\
         1. Greeting/Introduction (neutral, friendly)\n\
         2. Explaining something (serious, informative)\n\
         3. Reacting to something (excited, emotional)\n\
         4. Asking a question (casual, curious)\n\
         5. Closing/Parting (formal or casual depending on character)\n\n\
         Character Details:\n\
         - Name: {name}\n\
         - Description: {description}\n\
         - Category: {category}\n\
         - Archetype: {archetype}\n\
         - Personality: {personality}\n\n\
         Return JSON array with this exact format:\n\
         [\n\
         {{\"dialogueIndex\": 1, \"text\": \"dialogue text here\", \"context\": \"greeting, neutral\"}},\n\
         {{\"dialogueIndex\": 2, \"text\": \"dialogue text here\", \"context\": \"explaining, serious\"}},\n\
         {{\"dialogueIndex\": 3, \"text\": \"dialogue text here\", \"context\": \"reacting, excited\"}},\n\
         {{\"dialogueIndex\": 4, \"text\": \"dialogue text here\", \"context\": \"questioning, curious\"}},\n\
         {{\"dialogueIndex\": 5, \"text\": \"dialogue text here\", \"context\": \"closing, formal\"}}\n\
         ]\n\n\
         Each dialogue should be in character and match their personality. \
         Put dialogue in single quotes if needed for speech extraction.",
        name = character.name,
        description = character.description,
        category = character.category,
        archetype = character.archetype,
        personality = personality,
    )
}

fn parse_dialogues(reply: &str, character_id: &str) -> Option<Vec<DialogueSample>> {
    let parsed: Vec<DialogueReply> = serde_json::from_str(strip_code_blocks(reply).trim()).ok()?;
    if parsed.len() != 5 || parsed.iter().any(|d| d.text.trim().is_empty()) {
        return None;
    }
    Some(
        parsed
            .into_iter()
            .map(|d| DialogueSample {
                character_id: character_id.to_string(),
                index: d.index,
                text: d.text,
                context: d.context,
            })
            .collect(),
    )
}

fn fallback_dialogues(character: &Character) -> Vec<DialogueSample> {
    let lines = [
        (format!("Hello, I'm {}.", character.name), "greeting, neutral"),
        ("Let me explain this to you.".to_string(), "explaining, serious"),
        ("That's amazing!".to_string(), "reacting, excited"),
        (
            "What do you think about that?".to_string(),
            "questioning, curious",
        ),
        ("Goodbye for now.".to_string(), "closing, formal"),
    ];
    lines
        .into_iter()
        .enumerate()
        .map(|(i, (text, context))| DialogueSample {
            character_id: character.id.clone(),
            index: (i + 1) as u8,
            text,
            context: context.to_string(),
        })
        .collect()
}

const DIALOGUE_SYSTEM: &str =
    "You are a dialogue writer. Stay in character and follow the output format exactly.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, LlmResult};
    use crate::model::{AgeBucket, ExtractedMetadata, Gender};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Debug)]
    struct FixedLlm {
        reply: Option<&'static str>,
    }

    #[async_trait]
    impl LlmClient for FixedLlm {
        async fn chat(&self, _system: &str, _user: &str) -> LlmResult<String> {
            match self.reply {
                Some(reply) => Ok(reply.to_string()),
                None => Err(LlmError::Other(anyhow!("service down"))),
            }
        }
    }

    fn character() -> Character {
        Character {
            id: "c1".to_string(),
            name: "Captain Thorne".to_string(),
            description: "A weathered airship captain".to_string(),
            tagline: None,
            category: "Fantasy".to_string(),
            archetype: "mentor".to_string(),
            system_prompt: "You are Captain Thorne.".to_string(),
            current_voice_name: "charon".to_string(),
            current_style_hint: None,
            metadata: ExtractedMetadata {
                gender: Gender::Male,
                age: AgeBucket::Old,
                accent: None,
                culture: None,
            },
        }
    }

    fn generator(llm: &dyn LlmClient) -> DialogueGenerator<'_> {
        DialogueGenerator::new(llm, RetryPolicy::new(2, Duration::ZERO))
    }

    const GOOD_REPLY: &str = r#"[
        {"dialogueIndex": 1, "text": "Well met, traveler. Welcome aboard the Stormchaser.", "context": "greeting, neutral"},
        {"dialogueIndex": 2, "text": "The trade winds shift every season, so we chart a new course each spring.", "context": "explaining, serious"},
        {"dialogueIndex": 3, "text": "By the clouds, look at that sunrise over the ridge!", "context": "reacting, excited"},
        {"dialogueIndex": 4, "text": "Have you ever seen the floating isles from above?", "context": "questioning, curious"},
        {"dialogueIndex": 5, "text": "Fair winds to you, friend. Until our paths cross again.", "context": "closing, formal"}
    ]"#;

    #[tokio::test]
    async fn test_parses_five_dialogues() {
        let llm = FixedLlm {
            reply: Some(GOOD_REPLY),
        };
        let samples = generator(&llm).generate(&character()).await;
        assert_eq!(samples.len(), 5);
        assert_eq!(samples[0].index, 1);
        assert_eq!(samples[4].context, "closing, formal");
        assert!(samples.iter().all(|s| s.character_id == "c1"));
    }

    #[tokio::test]
    async fn test_wrong_count_uses_fallback() {
        let llm = FixedLlm {
            reply: Some(r#"[{"dialogueIndex": 1, "text": "Hi.", "context": "greeting"}]"#),
        };
        let samples = generator(&llm).generate(&character()).await;
        assert_eq!(samples.len(), 5);
        assert_eq!(samples[0].text, "Hello, I'm Captain Thorne.");
    }

    #[tokio::test]
    async fn test_malformed_reply_uses_fallback() {
        let llm = FixedLlm {
            reply: Some("I cannot produce JSON today."),
        };
        let samples = generator(&llm).generate(&character()).await;
        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(|s| !s.text.is_empty()));
        let indexes: Vec<u8> = samples.iter().map(|s| s.index).collect();
        assert_eq!(indexes, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_service_failure_uses_fallback() {
        let llm = FixedLlm { reply: None };
        let samples = generator(&llm).generate(&character()).await;
        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(|s| !s.text.is_empty()));
    }
}

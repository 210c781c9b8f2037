//! The judge panel: five evaluators scoring one (character, voice) pair
//! on gender, age, accent, overall fit, and cross-context consistency.
//! Every judge returns a 1..=10 score with a short reasoning; anything
//! the service gets wrong degrades to a neutral default instead of
//! failing the pair.

use crate::llm::{strip_code_blocks, LlmClient, RetryPolicy};
use crate::model::{AgentReasoning, AgentScores, Character, DialogueSample, TtsSample};
use crate::voices::VoiceProfile;
use log::warn;
use serde::Deserialize;

pub const DEFAULT_SCORE: u8 = 5;
pub const DEFAULT_REASONING: &str = "evaluation failed, using default score";

const JUDGE_SYSTEM: &str =
    "You are an expert voice-character matching evaluator. Return JSON exactly as instructed.";

#[derive(Clone, Debug, PartialEq)]
pub struct Judgement {
    pub score: u8,
    pub reasoning: String,
}

impl Judgement {
    fn default_neutral() -> Self {
        Self {
            score: DEFAULT_SCORE,
            reasoning: DEFAULT_REASONING.to_string(),
        }
    }
}

#[derive(Deserialize, Default)]
struct JudgeReply {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Clamp a raw judge score into [1, 10]. Missing or non-finite values
/// take the neutral default.
fn clamp_score(raw: Option<f64>) -> u8 {
    match raw {
        Some(score) if score.is_finite() && score != 0.0 => score.clamp(1.0, 10.0).round() as u8,
        _ => DEFAULT_SCORE,
    }
}

pub struct JudgePanel<'a> {
    llm: &'a dyn LlmClient,
    retry: RetryPolicy,
}

impl<'a> JudgePanel<'a> {
    pub fn new(llm: &'a dyn LlmClient, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }

    /// Run all five judges for one (character, voice) pair. The single
    /// dialogue judges see the first sample; the consistency judge sees
    /// all of them.
    pub async fn evaluate(
        &self,
        character: &Character,
        voice: &VoiceProfile,
        dialogues: &[DialogueSample],
        audio: Option<&TtsSample>,
    ) -> (AgentScores, AgentReasoning) {
        let dialogue_text = dialogues.first().map(|d| d.text.as_str()).unwrap_or("");
        let has_audio = audio.is_some();

        let gender = self
            .judge(&gender_prompt(character, voice, dialogue_text, has_audio))
            .await;
        let age = self
            .judge(&age_prompt(character, voice, dialogue_text, has_audio))
            .await;
        let accent = self
            .judge(&accent_prompt(character, voice, dialogue_text, has_audio))
            .await;
        let overall = self
            .judge(&overall_prompt(character, voice, dialogue_text, has_audio))
            .await;
        let consistency = self
            .judge(&consistency_prompt(character, voice, dialogues, has_audio))
            .await;

        let scores = AgentScores {
            gender: gender.score,
            age: age.score,
            accent: accent.score,
            overall: overall.score,
            consistency: consistency.score,
        };
        let reasoning = AgentReasoning {
            gender: gender.reasoning,
            age: age.reasoning,
            accent: accent.reasoning,
            overall: overall.reasoning,
            consistency: consistency.reasoning,
        };
        (scores, reasoning)
    }

    async fn judge(&self, prompt: &str) -> Judgement {
        let reply = match self.retry.run(self.llm, JUDGE_SYSTEM, prompt, true).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Judge call failed: {}", e);
                return Judgement::default_neutral();
            }
        };

        let parsed: JudgeReply =
            serde_json::from_str(strip_code_blocks(&reply).trim()).unwrap_or_default();
        match (parsed.score, parsed.reasoning) {
            (None, None) => Judgement::default_neutral(),
            (score, reasoning) => Judgement {
                score: clamp_score(score),
                reasoning: reasoning.unwrap_or_else(|| DEFAULT_REASONING.to_string()),
            },
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn audio_note(voice_name: &str, has_audio: bool) -> String {
    if has_audio {
        format!(
            "\nAudio Sample: [TTS audio generated with voice {} - evaluate the actual voice characteristics from the audio]",
            voice_name
        )
    } else {
        String::new()
    }
}

const SCORE_FORMAT: &str = "Return JSON with this exact format:\n\
     {\n  \"score\": <number 1-10>,\n  \"reasoning\": \"<brief explanation>\"\n}";

fn gender_prompt(
    character: &Character,
    voice: &VoiceProfile,
    dialogue: &str,
    has_audio: bool,
) -> String {
    format!(
        "Your task is to evaluate if a TTS voice's gender matches a character's gender.\n\n\
         Character:\n\
         - Name: {}\n\
         - Gender: {}\n\
         - Description: {}\n\n\
         Voice:\n\
         - Name: {}\n\
         - Gender: {}\n\n\
         Dialogue Sample: \"{}\"{}\n\n\
         Evaluate if the voice gender matches the character gender. Consider:\n\
         - Male character should have male voice\n\
         - Female character should have female voice\n\
         - Neutral character can have any voice\n\
         - If character gender is unknown, evaluate based on description\n\n\
         Rate the match from 1-10 where:\n\
         - 10 = Perfect gender match\n\
         - 8-9 = Good match with minor issues\n\
         - 6-7 = Acceptable but noticeable mismatch\n\
         - 4-5 = Poor match, clear gender mismatch\n\
         - 1-3 = Very poor match, completely wrong gender\n\n\
         {}",
        character.name,
        character.metadata.gender.as_str(),
        truncate_chars(&character.description, 300),
        voice.name,
        voice.gender.as_str(),
        dialogue,
        audio_note(voice.name, has_audio),
        SCORE_FORMAT,
    )
}

fn age_prompt(
    character: &Character,
    voice: &VoiceProfile,
    dialogue: &str,
    has_audio: bool,
) -> String {
    format!(
        "Your task is to evaluate if a TTS voice's age characteristics match a character's age.\n\n\
         Character:\n\
         - Name: {}\n\
         - Age Category: {}\n\
         - Description: {}\n\n\
         Voice:\n\
         - Name: {}\n\
         - Age Characteristics: {}\n\n\
         Dialogue Sample: \"{}\"{}\n\n\
         Evaluate if the voice age matches the character age. Consider:\n\
         - Young character should have young-sounding voice\n\
         - Middle-aged character should have mature but not old voice\n\
         - Old character should have aged, wise-sounding voice\n\
         - Voice pitch, pace, and tone should match age expectations\n\n\
         Rate the match from 1-10 where:\n\
         - 10 = Perfect age match\n\
         - 8-9 = Good match with minor issues\n\
         - 6-7 = Acceptable but noticeable age mismatch\n\
         - 4-5 = Poor match, clear age mismatch\n\
         - 1-3 = Very poor match, completely wrong age\n\n\
         {}",
        character.name,
        character.metadata.age.as_str(),
        truncate_chars(&character.description, 300),
        voice.name,
        voice.age.as_str(),
        dialogue,
        audio_note(voice.name, has_audio),
        SCORE_FORMAT,
    )
}

fn accent_prompt(
    character: &Character,
    voice: &VoiceProfile,
    dialogue: &str,
    has_audio: bool,
) -> String {
    let accent_info = character
        .metadata
        .accent
        .as_deref()
        .or(character.metadata.culture.as_deref())
        .unwrap_or("not specified");
    let voice_accent = if voice.accent.is_empty() {
        "neutral"
    } else {
        voice.accent
    };
    format!(
        "Your task is to evaluate if a TTS voice's accent and cultural characteristics match \
         a character's background.\n\n\
         Character:\n\
         - Name: {}\n\
         - Accent/Cultural Background: {}\n\
         - Description: {}\n\n\
         Voice:\n\
         - Name: {}\n\
         - Accent Characteristics: {}\n\n\
         Dialogue Sample: \"{}\"{}\n\n\
         Evaluate if the voice accent matches the character's cultural background. Consider:\n\
         - British character should have British accent\n\
         - American character should have American accent\n\
         - If accent is not specified, evaluate if voice is culturally appropriate\n\
         - Consider dialect, pronunciation patterns, and cultural speech patterns\n\n\
         Rate the match from 1-10 where:\n\
         - 10 = Perfect accent/cultural match\n\
         - 8-9 = Good match with minor issues\n\
         - 6-7 = Acceptable but noticeable accent mismatch\n\
         - 4-5 = Poor match, clear accent mismatch\n\
         - 1-3 = Very poor match, completely wrong accent/culture\n\n\
         {}",
        character.name,
        accent_info,
        truncate_chars(&character.description, 300),
        voice.name,
        voice_accent,
        dialogue,
        audio_note(voice.name, has_audio),
        SCORE_FORMAT,
    )
}

fn overall_prompt(
    character: &Character,
    voice: &VoiceProfile,
    dialogue: &str,
    has_audio: bool,
) -> String {
    format!(
        "Your task is to evaluate the overall fit between a TTS voice and a character, \
         considering all factors holistically.\n\n\
         Character:\n\
         - Name: {}\n\
         - Category: {}\n\
         - Archetype: {}\n\
         - Description: {}\n\n\
         Voice:\n\
         - Name: {}\n\
         - Characteristics: {}\n\n\
         Dialogue Sample: \"{}\"{}\n\n\
         Evaluate the overall voice-character match considering:\n\
         - Gender appropriateness\n\
         - Age appropriateness\n\
         - Accent/cultural fit\n\
         - Personality match (tone, style, energy)\n\
         - Character archetype alignment\n\
         - Overall believability and immersion\n\n\
         Rate the overall match from 1-10 where:\n\
         - 10 = Perfect overall match, voice perfectly embodies character\n\
         - 8-9 = Excellent match with minor imperfections\n\
         - 6-7 = Good match, acceptable for use\n\
         - 4-5 = Poor match, noticeable issues\n\
         - 1-3 = Very poor match, voice doesn't fit character at all\n\n\
         {}",
        character.name,
        character.category,
        character.archetype,
        truncate_chars(&character.description, 500),
        voice.name,
        voice.description,
        dialogue,
        audio_note(voice.name, has_audio),
        SCORE_FORMAT,
    )
}

fn consistency_prompt(
    character: &Character,
    voice: &VoiceProfile,
    dialogues: &[DialogueSample],
    has_audio: bool,
) -> String {
    let listing = dialogues
        .iter()
        .enumerate()
        .map(|(i, d)| format!("{}. Context: {}\n   Dialogue: \"{}\"", i + 1, d.context, d.text))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "Your task is to evaluate if a TTS voice maintains consistency across different \
         dialogue contexts for a character.\n\n\
         Character:\n\
         - Name: {}\n\
         - Description: {}\n\n\
         Voice: {}\n\n\
         Dialogue Samples ({} different contexts):\n{}{}\n\n\
         Evaluate if the voice maintains consistency across all dialogue contexts. Consider:\n\
         - Voice should sound like the same person across all contexts\n\
         - Accent should remain consistent\n\
         - Tone and style should be consistent (even if emotional state changes)\n\
         - Voice characteristics (pitch, pace, etc.) should remain stable\n\
         - The voice should feel like one cohesive character, not different people\n\n\
         Rate the consistency from 1-10 where:\n\
         - 10 = Perfect consistency, voice is identical across all contexts\n\
         - 8-9 = Excellent consistency with minor variations\n\
         - 6-7 = Good consistency, acceptable variations\n\
         - 4-5 = Poor consistency, noticeable voice changes\n\
         - 1-3 = Very poor consistency, voice sounds like different people\n\n\
         {}",
        character.name,
        truncate_chars(&character.description, 300),
        voice.name,
        dialogues.len(),
        listing,
        audio_note(voice.name, has_audio),
        SCORE_FORMAT,
    )
}

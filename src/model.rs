use serde::{Deserialize, Serialize};

/// Character gender as inferred from free-text profile fields.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Neutral,
    #[default]
    Unknown,
}

impl Gender {
    /// Lenient parse of a judge-model reply. Anything off-enum maps to
    /// `Unknown`, never an error.
    pub fn from_judge_word(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            "neutral" => Gender::Neutral,
            _ => Gender::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Neutral => "neutral",
            Gender::Unknown => "unknown",
        }
    }
}

/// Coarse age bucket, inferred for characters and cataloged for voices.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgeBucket {
    Young,
    Middle,
    Old,
    #[default]
    Unknown,
}

impl AgeBucket {
    pub fn from_judge_word(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "young" => AgeBucket::Young,
            "middle" => AgeBucket::Middle,
            "old" => AgeBucket::Old,
            _ => AgeBucket::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBucket::Young => "young",
            AgeBucket::Middle => "middle",
            AgeBucket::Old => "old",
            AgeBucket::Unknown => "unknown",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ExtractedMetadata {
    pub gender: Gender,
    pub age: AgeBucket,
    pub accent: Option<String>,
    pub culture: Option<String>,
}

/// A character selected for the audit, with inferred metadata attached.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tagline: Option<String>,
    pub category: String,
    pub archetype: String,
    pub system_prompt: String,
    pub current_voice_name: String,
    pub current_style_hint: Option<String>,
    #[serde(default)]
    pub metadata: ExtractedMetadata,
}

/// One generated test utterance. Index runs 1..=5 over the fixed contexts.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DialogueSample {
    pub character_id: String,
    pub index: u8,
    pub text: String,
    pub context: String,
}

/// Rendered TTS audio for one (character, voice) pair. Best-effort: the
/// pipeline runs text-only when these are missing.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TtsSample {
    pub character_id: String,
    pub voice_name: String,
    pub dialogue_index: u8,
    pub audio_base64: String,
    pub sample_rate: u32,
}

impl TtsSample {
    pub fn key(&self) -> String {
        pair_key(&self.character_id, &self.voice_name)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct AgentScores {
    pub gender: u8,
    pub age: u8,
    pub accent: u8,
    pub overall: u8,
    pub consistency: u8,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AgentReasoning {
    pub gender: String,
    pub age: String,
    pub accent: String,
    pub overall: String,
    pub consistency: String,
}

/// Full judge-panel verdict on one (character, voice) pair.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VoiceEvaluation {
    pub character_id: String,
    pub voice_name: String,
    pub scores: AgentScores,
    pub weighted_average: f64,
    pub reasoning: AgentReasoning,
}

impl VoiceEvaluation {
    pub fn key(&self) -> String {
        pair_key(&self.character_id, &self.voice_name)
    }
}

/// Final per-character outcome of a completed audit run.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AuditResult {
    pub character_id: String,
    pub character_name: String,
    pub best_voice: String,
    pub best_score: f64,
    pub rank: usize,
    pub evaluations: Vec<VoiceEvaluation>,
}

/// What the applier writes back to the store, strategy-independent.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VoiceAssignment {
    pub character_id: String,
    pub character_name: String,
    pub voice_name: String,
    pub style_hint: Option<String>,
    pub score: Option<f64>,
}

/// Composite checkpoint key for (character, voice) keyed stages.
pub fn pair_key(character_id: &str, voice_name: &str) -> String {
    format!("{}-{}", character_id, voice_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_lenient_parsing() {
        assert_eq!(Gender::from_judge_word("Male"), Gender::Male);
        assert_eq!(Gender::from_judge_word("  female\n"), Gender::Female);
        assert_eq!(Gender::from_judge_word("neutral"), Gender::Neutral);
        assert_eq!(Gender::from_judge_word("robot"), Gender::Unknown);
        assert_eq!(Gender::from_judge_word(""), Gender::Unknown);
    }

    #[test]
    fn test_age_lenient_parsing() {
        assert_eq!(AgeBucket::from_judge_word("OLD"), AgeBucket::Old);
        assert_eq!(AgeBucket::from_judge_word("middle"), AgeBucket::Middle);
        assert_eq!(AgeBucket::from_judge_word("teenager"), AgeBucket::Unknown);
    }

    #[test]
    fn test_enum_serde_round_trip() {
        let json = serde_json::to_string(&Gender::Female).unwrap();
        assert_eq!(json, "\"female\"");
        let age: AgeBucket = serde_json::from_str("\"young\"").unwrap();
        assert_eq!(age, AgeBucket::Young);
    }

    #[test]
    fn test_pair_key_format() {
        assert_eq!(pair_key("abc", "puck"), "abc-puck");
    }
}

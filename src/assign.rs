use crate::checkpoint::{RunState, RESULTS_FILE};
use crate::evaluators::JudgePanel;
use crate::heuristic::heuristic_tuning;
use crate::model::{Character, DialogueSample, TtsSample, VoiceAssignment};
use crate::pacer::Pacer;
use crate::scorer::{evaluate_grid, rank_and_assign};
use crate::voices::VoiceProfile;
use anyhow::Result;
use async_trait::async_trait;
use log::info;

/// Strategy seam for the final assignment phase. Both strategies hand
/// the applier the same shape; only how the voice is chosen differs.
#[async_trait]
pub trait VoiceAssigner {
    fn name(&self) -> &'static str;

    async fn assign(&mut self, characters: &[Character]) -> Result<Vec<VoiceAssignment>>;
}

/// The full judge-panel audit: score the character x voice grid, rank
/// greedily, persist the audit results for the reporter.
pub struct JudgePanelAssigner<'a> {
    panel: JudgePanel<'a>,
    state: &'a RunState,
    dialogues: Vec<DialogueSample>,
    tts_samples: Vec<TtsSample>,
    voices: Vec<VoiceProfile>,
    pacer: Pacer,
}

impl<'a> JudgePanelAssigner<'a> {
    pub fn new(
        panel: JudgePanel<'a>,
        state: &'a RunState,
        dialogues: Vec<DialogueSample>,
        tts_samples: Vec<TtsSample>,
        voices: Vec<VoiceProfile>,
        pacer: Pacer,
    ) -> Self {
        Self {
            panel,
            state,
            dialogues,
            tts_samples,
            voices,
            pacer,
        }
    }
}

#[async_trait]
impl VoiceAssigner for JudgePanelAssigner<'_> {
    fn name(&self) -> &'static str {
        "judge-panel"
    }

    async fn assign(&mut self, characters: &[Character]) -> Result<Vec<VoiceAssignment>> {
        let evaluations = evaluate_grid(
            &self.panel,
            characters,
            &self.dialogues,
            &self.tts_samples,
            &self.voices,
            self.state,
            &mut self.pacer,
        )
        .await?;

        let results = rank_and_assign(characters, &evaluations);
        self.state.save_stage(RESULTS_FILE, &results)?;
        info!("Ranked {} characters across {} evaluations", results.len(), evaluations.len());

        Ok(results
            .iter()
            .map(|r| VoiceAssignment {
                character_id: r.character_id.clone(),
                character_name: r.character_name.clone(),
                voice_name: r.best_voice.clone(),
                style_hint: None,
                score: Some(r.best_score),
            })
            .collect())
    }
}

/// Keyword-table strategy: no service calls, each character mapped
/// independently with a delivery style hint.
pub struct HeuristicAssigner;

#[async_trait]
impl VoiceAssigner for HeuristicAssigner {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn assign(&mut self, characters: &[Character]) -> Result<Vec<VoiceAssignment>> {
        Ok(characters
            .iter()
            .map(|c| {
                let tuning = heuristic_tuning(
                    &c.name,
                    &c.archetype,
                    &c.category,
                    c.tagline.as_deref(),
                    Some(c.description.as_str()),
                );
                VoiceAssignment {
                    character_id: c.id.clone(),
                    character_name: c.name.clone(),
                    voice_name: tuning.voice_name.to_string(),
                    style_hint: Some(tuning.style_hint.to_string()),
                    score: None,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgeBucket, ExtractedMetadata, Gender};

    fn character(id: &str, name: &str, archetype: &str) -> Character {
        Character {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            tagline: None,
            category: "Human".to_string(),
            archetype: archetype.to_string(),
            system_prompt: String::new(),
            current_voice_name: String::new(),
            current_style_hint: None,
            metadata: ExtractedMetadata {
                gender: Gender::Unknown,
                age: AgeBucket::Unknown,
                accent: None,
                culture: None,
            },
        }
    }

    #[tokio::test]
    async fn test_heuristic_assigner_fills_style_hints() {
        let characters = vec![
            character("a", "Old Pete", "grandfather"),
            character("b", "Maria", "warrior"),
        ];
        let assignments = HeuristicAssigner.assign(&characters).await.unwrap();
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].voice_name, "charon");
        assert!(assignments[0].style_hint.is_some());
        assert!(assignments[0].score.is_none());
        // gender correction steers Maria away from the male bucket
        assert_eq!(assignments[1].voice_name, "aoede");
    }
}

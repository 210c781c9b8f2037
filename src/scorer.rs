use crate::checkpoint::{RunState, EVALUATIONS_FILE};
use crate::evaluators::JudgePanel;
use crate::model::{
    pair_key, AgentScores, AuditResult, Character, DialogueSample, TtsSample, VoiceEvaluation,
};
use crate::pacer::Pacer;
use crate::voices::VoiceProfile;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::collections::{HashMap, HashSet};

/// Equal weights over the five judge axes. Kept as an explicit weighted
/// sum so individual weights can be rebalanced later.
pub fn weighted_average(scores: &AgentScores) -> f64 {
    const WEIGHT: f64 = 0.2;
    [
        scores.gender,
        scores.age,
        scores.accent,
        scores.overall,
        scores.consistency,
    ]
    .iter()
    .map(|&s| f64::from(s) * WEIGHT)
    .sum()
}

/// Run the judge panel over the full character x voice grid, resuming
/// from the evaluations checkpoint. Saves after every pair so an
/// interrupted run loses at most one evaluation.
pub async fn evaluate_grid(
    panel: &JudgePanel<'_>,
    characters: &[Character],
    dialogues: &[DialogueSample],
    tts_samples: &[TtsSample],
    voices: &[VoiceProfile],
    state: &RunState,
    pacer: &mut Pacer,
) -> Result<Vec<VoiceEvaluation>> {
    let mut evaluations: Vec<VoiceEvaluation> =
        state.load_stage(EVALUATIONS_FILE)?.unwrap_or_default();
    let done: HashSet<String> = evaluations.iter().map(|e| e.key()).collect();
    if !done.is_empty() {
        info!("Resuming evaluation: {} pairs already scored", done.len());
    }

    let total = characters.len() * voices.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );
    pb.inc(done.len().min(total) as u64);

    for character in characters {
        let char_dialogues: Vec<DialogueSample> = dialogues
            .iter()
            .filter(|d| d.character_id == character.id)
            .cloned()
            .collect();

        for voice in voices {
            let key = pair_key(&character.id, voice.name);
            if done.contains(&key) {
                continue;
            }

            let audio = tts_samples
                .iter()
                .find(|s| s.character_id == character.id && s.voice_name == voice.name);

            let (scores, reasoning) = panel
                .evaluate(character, voice, &char_dialogues, audio)
                .await;
            let evaluation = VoiceEvaluation {
                character_id: character.id.clone(),
                voice_name: voice.name.to_string(),
                weighted_average: weighted_average(&scores),
                scores,
                reasoning,
            };
            evaluations.push(evaluation);
            state.save_stage(EVALUATIONS_FILE, &evaluations)?;

            pb.inc(1);
            pacer.pace().await;
        }
    }
    pb.finish_with_message("evaluation grid complete");

    Ok(evaluations)
}

/// Greedy global ranking: characters ordered by their own best score
/// (ties broken by id for deterministic output), each takes its
/// highest-scoring voice not yet claimed. If every evaluated voice is
/// already claimed the character keeps its contested best.
pub fn rank_and_assign(characters: &[Character], evaluations: &[VoiceEvaluation]) -> Vec<AuditResult> {
    let names: HashMap<&str, &str> = characters
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let mut by_character: HashMap<&str, Vec<&VoiceEvaluation>> = HashMap::new();
    for evaluation in evaluations {
        by_character
            .entry(evaluation.character_id.as_str())
            .or_default()
            .push(evaluation);
    }
    for evals in by_character.values_mut() {
        evals.sort_by(|a, b| {
            b.weighted_average
                .total_cmp(&a.weighted_average)
                .then_with(|| a.voice_name.cmp(&b.voice_name))
        });
    }

    let mut order: Vec<(&str, f64)> = by_character
        .iter()
        .map(|(id, evals)| (*id, evals[0].weighted_average))
        .collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut claimed: HashSet<&str> = HashSet::new();
    let mut results = Vec::with_capacity(order.len());
    for (rank, (character_id, _)) in order.into_iter().enumerate() {
        let evals = &by_character[character_id];
        let chosen = evals
            .iter()
            .find(|e| !claimed.contains(e.voice_name.as_str()))
            .unwrap_or(&evals[0]);
        claimed.insert(chosen.voice_name.as_str());

        results.push(AuditResult {
            character_id: character_id.to_string(),
            character_name: names.get(character_id).unwrap_or(&character_id).to_string(),
            best_voice: chosen.voice_name.clone(),
            best_score: chosen.weighted_average,
            rank: rank + 1,
            evaluations: evals.iter().map(|e| (*e).clone()).collect(),
        });
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgeBucket, AgentReasoning, ExtractedMetadata, Gender};

    fn character(id: &str, name: &str) -> Character {
        Character {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            tagline: None,
            category: "Human".to_string(),
            archetype: "generic".to_string(),
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

    fn evaluation(character_id: &str, voice: &str, score: u8) -> VoiceEvaluation {
        let scores = AgentScores {
            gender: score,
            age: score,
            accent: score,
            overall: score,
            consistency: score,
        };
        VoiceEvaluation {
            character_id: character_id.to_string(),
            voice_name: voice.to_string(),
            weighted_average: weighted_average(&scores),
            scores,
            reasoning: AgentReasoning::default(),
        }
    }

    #[test]
    fn test_weighted_average_equals_mean() {
        let scores = AgentScores {
            gender: 7,
            age: 9,
            accent: 3,
            overall: 8,
            consistency: 6,
        };
        let mean = (7.0 + 9.0 + 3.0 + 8.0 + 6.0) / 5.0;
        assert!((weighted_average(&scores) - mean).abs() < 1e-6);
    }

    #[test]
    fn test_assignments_are_unique() {
        let characters = vec![
            character("a", "Alpha"),
            character("b", "Beta"),
            character("c", "Gamma"),
        ];
        // Everyone's best voice is kore; only the strongest keeps it.
        let evaluations = vec![
            evaluation("a", "kore", 9),
            evaluation("a", "puck", 7),
            evaluation("b", "kore", 8),
            evaluation("b", "puck", 6),
            evaluation("c", "kore", 7),
            evaluation("c", "charon", 5),
        ];

        let results = rank_and_assign(&characters, &evaluations);
        assert_eq!(results.len(), 3);
        let voices: HashSet<&str> = results.iter().map(|r| r.best_voice.as_str()).collect();
        assert_eq!(voices.len(), 3);
        assert_eq!(results[0].character_id, "a");
        assert_eq!(results[0].best_voice, "kore");
        assert_eq!(results[1].best_voice, "puck");
        assert_eq!(results[2].best_voice, "charon");
    }

    #[test]
    fn test_ties_break_by_character_id() {
        let characters = vec![character("zeta", "Z"), character("alpha", "A")];
        let evaluations = vec![
            evaluation("zeta", "kore", 8),
            evaluation("zeta", "puck", 8),
            evaluation("alpha", "kore", 8),
            evaluation("alpha", "puck", 8),
        ];

        let results = rank_and_assign(&characters, &evaluations);
        assert_eq!(results[0].character_id, "alpha");
        assert_eq!(results[0].best_voice, "kore");
        assert_eq!(results[1].character_id, "zeta");
        assert_eq!(results[1].best_voice, "puck");
    }

    #[test]
    fn test_all_claimed_keeps_contested_best() {
        let characters = vec![character("a", "A"), character("b", "B")];
        // b has only one evaluated voice and it goes to a first.
        let evaluations = vec![
            evaluation("a", "kore", 9),
            evaluation("b", "kore", 8),
        ];

        let results = rank_and_assign(&characters, &evaluations);
        assert_eq!(results[0].best_voice, "kore");
        assert_eq!(results[1].best_voice, "kore");
        assert_eq!(results[1].character_id, "b");
    }

    #[test]
    fn test_ranks_are_sequential() {
        let characters = vec![character("a", "A"), character("b", "B")];
        let evaluations = vec![evaluation("a", "kore", 9), evaluation("b", "puck", 4)];
        let results = rank_and_assign(&characters, &evaluations);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[1].rank, 2);
        assert!(results[0].best_score > results[1].best_score);
    }
}

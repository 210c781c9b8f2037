//! Phase orchestration for a full audit run. Phases execute in order,
//! each one checkpointed to the build directory so an interrupted run
//! resumes where it stopped: select -> extract -> dialogues ->
//! [optional TTS] -> assign (judge panel or heuristic) -> apply ->
//! report.

use crate::assign::{HeuristicAssigner, JudgePanelAssigner, VoiceAssigner};
use crate::checkpoint::{
    RunState, CHARACTERS_FILE, DIALOGUES_FILE, RESULTS_FILE, TTS_SAMPLES_FILE,
};
use crate::config::Config;
use crate::dialogue::DialogueGenerator;
use crate::evaluators::JudgePanel;
use crate::extractor::MetadataExtractor;
use crate::llm::{create_llm, LlmClient, RetryPolicy};
use crate::model::{pair_key, AuditResult, Character, DialogueSample, TtsSample, VoiceAssignment};
use crate::pacer::Pacer;
use crate::report::render_report;
use crate::selector::select_diverse;
use crate::store::{CharacterStore, JsonStore};
use crate::tts::create_tts_client;
use crate::voices::{VoiceProfile, VOICE_CATALOG};
use anyhow::{Context, Result};
use log::{info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

const PHASE_SELECTION: &str = "character-selection";
const PHASE_DIALOGUES: &str = "dialogue-generation";
const PHASE_TTS: &str = "tts-generation";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    JudgePanel,
    Heuristic,
}

pub struct RunOptions {
    pub limit: Option<usize>,
    pub skip_tts: bool,
    pub strategy: Strategy,
}

pub async fn run(config: &Config, options: &RunOptions) -> Result<()> {
    config.ensure_directories()?;
    let state = RunState::new(Path::new(&config.build_folder))?;
    let store = JsonStore::new(Path::new(&config.catalog_path));
    let llm = create_llm(config)?;
    let retry = RetryPolicy::new(
        config.audit.max_retries,
        Duration::from_secs(config.audit.retry_base_secs),
    );

    let characters = select_and_extract(config, options, &state, &store, llm.as_ref(), retry).await?;
    info!("Auditing {} characters", characters.len());

    let dialogues = generate_dialogues(config, &state, llm.as_ref(), retry, &characters).await?;

    let voices = audit_voices(config.audit.voice_limit);
    let tts_samples = if config.tts.enabled && !options.skip_tts {
        render_tts_samples(config, &state, &characters, &dialogues, &voices).await?
    } else {
        info!("TTS rendering disabled, judges run text-only");
        Vec::new()
    };

    let assignments = match options.strategy {
        Strategy::JudgePanel => {
            let panel = JudgePanel::new(llm.as_ref(), retry);
            let pacer = pacer_for(config, config.audit.eval_delay_ms);
            let mut assigner =
                JudgePanelAssigner::new(panel, &state, dialogues, tts_samples, voices, pacer);
            run_assigner(&mut assigner, &characters).await?
        }
        Strategy::Heuristic => run_assigner(&mut HeuristicAssigner, &characters).await?,
    };

    apply_assignments(config, &store, &assignments).await?;

    if options.strategy == Strategy::JudgePanel {
        write_report(config, &state, &characters)?;
    }

    info!("Audit complete: {} characters assigned", assignments.len());
    Ok(())
}

async fn run_assigner(
    assigner: &mut dyn VoiceAssigner,
    characters: &[Character],
) -> Result<Vec<VoiceAssignment>> {
    info!("Assignment strategy: {}", assigner.name());
    assigner.assign(characters).await
}

fn pacer_for(config: &Config, delay_ms: u64) -> Pacer {
    Pacer::new(
        delay_ms,
        config.audit.long_pause_every,
        config.audit.long_pause_secs,
    )
}

fn audit_voices(limit: Option<usize>) -> Vec<VoiceProfile> {
    let voices: Vec<VoiceProfile> = VOICE_CATALOG.iter().cloned().collect();
    match limit {
        Some(n) => voices.into_iter().take(n).collect(),
        None => voices,
    }
}

/// Phase 1: pick the audit set and extract voice-relevant metadata.
/// Saves after every character; re-entry skips already-extracted ids.
async fn select_and_extract(
    config: &Config,
    options: &RunOptions,
    state: &RunState,
    store: &dyn CharacterStore,
    llm: &dyn LlmClient,
    retry: RetryPolicy,
) -> Result<Vec<Character>> {
    let mut characters: Vec<Character> = state.load_stage(CHARACTERS_FILE)?.unwrap_or_default();
    if state.phase_completed(PHASE_SELECTION) {
        info!("Character selection already completed, skipping");
        if let Some(limit) = options.limit {
            characters.truncate(limit);
        }
        return Ok(characters);
    }

    let records = store.list_characters().await?;
    let target = options.limit.unwrap_or(config.audit.target_characters);
    let selected = select_diverse(&records, target);

    let extracted: HashSet<String> = characters.iter().map(|c| c.id.clone()).collect();
    let extractor = MetadataExtractor::new(llm, retry);
    let mut pacer = pacer_for(config, config.audit.extract_delay_ms);

    for record in &selected {
        if extracted.contains(&record.id) {
            continue;
        }
        info!("Extracting metadata for {}", record.name);
        let character = extractor.extract(record).await;
        characters.push(character);
        state.save_stage(CHARACTERS_FILE, &characters)?;
        pacer.pace().await;
    }

    state.mark_phase(PHASE_SELECTION)?;
    Ok(characters)
}

/// Phase 2: five test utterances per character.
async fn generate_dialogues(
    config: &Config,
    state: &RunState,
    llm: &dyn LlmClient,
    retry: RetryPolicy,
    characters: &[Character],
) -> Result<Vec<DialogueSample>> {
    let mut dialogues: Vec<DialogueSample> = state.load_stage(DIALOGUES_FILE)?.unwrap_or_default();
    if state.phase_completed(PHASE_DIALOGUES) {
        info!("Dialogue generation already completed, skipping");
        return Ok(dialogues);
    }

    let done: HashSet<String> = dialogues.iter().map(|d| d.character_id.clone()).collect();
    let generator = DialogueGenerator::new(llm, retry);
    let mut pacer = pacer_for(config, config.audit.dialogue_delay_ms);

    for character in characters {
        if done.contains(&character.id) {
            continue;
        }
        info!("Generating dialogues for {}", character.name);
        dialogues.extend(generator.generate(character).await);
        state.save_stage(DIALOGUES_FILE, &dialogues)?;
        pacer.pace().await;
    }

    state.mark_phase(PHASE_DIALOGUES)?;
    Ok(dialogues)
}

/// Phase 3: one rendered sample per (character, voice) pair, using the
/// first dialogue. Best-effort: a failed render logs and moves on, the
/// judges fall back to text-only for that pair.
async fn render_tts_samples(
    config: &Config,
    state: &RunState,
    characters: &[Character],
    dialogues: &[DialogueSample],
    voices: &[VoiceProfile],
) -> Result<Vec<TtsSample>> {
    let mut samples: Vec<TtsSample> = state.load_stage(TTS_SAMPLES_FILE)?.unwrap_or_default();
    if state.phase_completed(PHASE_TTS) {
        info!("TTS rendering already completed, skipping");
        return Ok(samples);
    }

    let tts = create_tts_client(config)?;
    let done: HashSet<String> = samples
        .iter()
        .map(|s| pair_key(&s.character_id, &s.voice_name))
        .collect();
    let mut pacer = pacer_for(config, config.audit.tts_delay_ms);

    for character in characters {
        let Some(first) = dialogues.iter().find(|d| d.character_id == character.id) else {
            continue;
        };
        for voice in voices {
            if done.contains(&pair_key(&character.id, voice.name)) {
                continue;
            }
            match tts.synthesize(&first.text, voice.name).await {
                Ok(audio) => {
                    samples.push(TtsSample {
                        character_id: character.id.clone(),
                        voice_name: voice.name.to_string(),
                        dialogue_index: first.index,
                        audio_base64: audio.audio_base64,
                        sample_rate: audio.sample_rate,
                    });
                    state.save_stage(TTS_SAMPLES_FILE, &samples)?;
                }
                Err(e) => {
                    warn!("TTS render failed for {}/{}: {}", character.name, voice.name, e);
                }
            }
            pacer.pace().await;
        }
    }

    state.mark_phase(PHASE_TTS)?;
    Ok(samples)
}

/// Phase 6: write assignments back to the catalog and flag the audited
/// set as featured. A character the store no longer knows logs and is
/// skipped.
async fn apply_assignments(
    config: &Config,
    store: &dyn CharacterStore,
    assignments: &[VoiceAssignment],
) -> Result<()> {
    for assignment in assignments {
        if let Err(e) = store
            .update_voice(
                &assignment.character_id,
                &assignment.voice_name,
                assignment.style_hint.as_deref(),
            )
            .await
        {
            warn!(
                "Could not update voice for {}: {}",
                assignment.character_name, e
            );
        } else {
            info!(
                "{} -> {}{}",
                assignment.character_name,
                assignment.voice_name,
                assignment
                    .score
                    .map(|s| format!(" ({:.2}/10)", s))
                    .unwrap_or_default()
            );
        }
    }

    if config.audit.flag_featured {
        let ids: Vec<String> = assignments.iter().map(|a| a.character_id.clone()).collect();
        store.set_featured(&ids).await?;
    }
    Ok(())
}

/// Phase 7: render the markdown report from the persisted results.
fn write_report(config: &Config, state: &RunState, characters: &[Character]) -> Result<()> {
    let results: Vec<AuditResult> = state
        .load_stage(RESULTS_FILE)?
        .context("audit results missing after assignment phase")?;
    let report = render_report(&results, characters);
    fs::write(&config.report_path, &report)
        .with_context(|| format!("Failed to write report to {}", config.report_path))?;
    info!("Report written to {}", config.report_path);
    Ok(())
}

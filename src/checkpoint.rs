use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CHARACTERS_FILE: &str = "selected-characters.json";
pub const DIALOGUES_FILE: &str = "test-dialogues.json";
pub const TTS_SAMPLES_FILE: &str = "tts-samples.json";
pub const EVALUATIONS_FILE: &str = "voice-evaluations.json";
pub const RESULTS_FILE: &str = "audit-results.json";
const PROGRESS_FILE: &str = "audit-progress.json";

#[derive(Serialize, Deserialize, Default)]
struct Progress {
    completed_phases: Vec<String>,
}

/// Explicit handle to one run's checkpoint files. Long stages save after
/// every record and skip already-present composite keys on resume; a
/// phase marker lets fully completed phases be skipped wholesale. Writes
/// are plain truncate-and-rewrite, single-writer only.
pub struct RunState {
    build_dir: PathBuf,
}

impl RunState {
    pub fn new(build_dir: &Path) -> Result<Self> {
        fs::create_dir_all(build_dir)
            .with_context(|| format!("Failed to create build dir {}", build_dir.display()))?;
        Ok(Self {
            build_dir: build_dir.to_path_buf(),
        })
    }

    pub fn stage_path(&self, file: &str) -> PathBuf {
        self.build_dir.join(file)
    }

    /// Load a stage file if it exists. A missing file is a fresh stage,
    /// not an error.
    pub fn load_stage<T: DeserializeOwned>(&self, file: &str) -> Result<Option<Vec<T>>> {
        let path = self.stage_path(file);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read checkpoint {}", path.display()))?;
        let records: Vec<T> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse checkpoint {}", path.display()))?;
        Ok(Some(records))
    }

    pub fn save_stage<T: Serialize>(&self, file: &str, records: &[T]) -> Result<()> {
        let path = self.stage_path(file);
        let content = serde_json::to_string_pretty(records)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write checkpoint {}", path.display()))?;
        Ok(())
    }

    fn load_progress(&self) -> Progress {
        let path = self.stage_path(PROGRESS_FILE);
        fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    pub fn phase_completed(&self, phase: &str) -> bool {
        self.load_progress()
            .completed_phases
            .iter()
            .any(|p| p == phase)
    }

    pub fn mark_phase(&self, phase: &str) -> Result<()> {
        let mut progress = self.load_progress();
        if !progress.completed_phases.iter().any(|p| p == phase) {
            progress.completed_phases.push(phase.to_string());
        }
        let content = serde_json::to_string_pretty(&progress)?;
        fs::write(self.stage_path(PROGRESS_FILE), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Row {
        key: String,
        value: u32,
    }

    #[test]
    fn test_missing_stage_is_none() {
        let dir = TempDir::new().unwrap();
        let state = RunState::new(dir.path()).unwrap();
        let loaded: Option<Vec<Row>> = state.load_stage("nope.json").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_stage_round_trip() {
        let dir = TempDir::new().unwrap();
        let state = RunState::new(dir.path()).unwrap();

        let rows = vec![
            Row {
                key: "a".to_string(),
                value: 1,
            },
            Row {
                key: "b".to_string(),
                value: 2,
            },
        ];
        state.save_stage("rows.json", &rows).unwrap();

        let loaded: Vec<Row> = state.load_stage("rows.json").unwrap().unwrap();
        assert_eq!(loaded, rows);
    }

    #[test]
    fn test_phase_markers_accumulate() {
        let dir = TempDir::new().unwrap();
        let state = RunState::new(dir.path()).unwrap();

        assert!(!state.phase_completed("selection"));
        state.mark_phase("selection").unwrap();
        state.mark_phase("dialogues").unwrap();
        state.mark_phase("selection").unwrap(); // idempotent

        assert!(state.phase_completed("selection"));
        assert!(state.phase_completed("dialogues"));
        assert!(!state.phase_completed("evaluation"));
    }

    #[test]
    fn test_corrupt_stage_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let state = RunState::new(dir.path()).unwrap();
        fs::write(state.stage_path("rows.json"), "{ not json").unwrap();
        let loaded: Result<Option<Vec<Row>>> = state.load_stage("rows.json");
        assert!(loaded.is_err());
    }
}

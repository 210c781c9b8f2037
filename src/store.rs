use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A character as the persistence layer stores it, before any metadata
/// inference.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CharacterRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tagline: Option<String>,
    pub category: String,
    pub archetype: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub voice_name: String,
    #[serde(default)]
    pub style_hint: Option<String>,
    #[serde(default)]
    pub featured: bool,
    /// ISO-8601; used only to order the listing newest-first.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Black-box CRUD over the character catalog. The pipeline reads records
/// at the start and writes voice assignments and featured flags at the
/// end; nothing else touches the store.
#[async_trait]
pub trait CharacterStore: Send + Sync {
    /// All characters, newest first.
    async fn list_characters(&self) -> Result<Vec<CharacterRecord>>;

    /// Set one character's assigned voice and style hint.
    async fn update_voice(&self, id: &str, voice_name: &str, style_hint: Option<&str>)
        -> Result<()>;

    /// Flag exactly the given ids as featured, clearing the flag on all
    /// others.
    async fn set_featured(&self, ids: &[String]) -> Result<()>;
}

/// File-backed store over a single JSON array. Single-writer by design;
/// concurrent pipeline runs are unsupported.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn read_all(&self) -> Result<Vec<CharacterRecord>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read catalog {}", self.path.display()))?;
        let records: Vec<CharacterRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog {}", self.path.display()))?;
        Ok(records)
    }

    fn write_all(&self, records: &[CharacterRecord]) -> Result<()> {
        let content = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write catalog {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl CharacterStore for JsonStore {
    async fn list_characters(&self) -> Result<Vec<CharacterRecord>> {
        let mut records = self.read_all()?;
        // Newest first; records without a timestamp sort last.
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn update_voice(
        &self,
        id: &str,
        voice_name: &str,
        style_hint: Option<&str>,
    ) -> Result<()> {
        let mut records = self.read_all()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .with_context(|| format!("Character {} not found in catalog", id))?;
        record.voice_name = voice_name.to_string();
        record.style_hint = style_hint.map(str::to_string);
        self.write_all(&records)
    }

    async fn set_featured(&self, ids: &[String]) -> Result<()> {
        let mut records = self.read_all()?;
        for record in records.iter_mut() {
            record.featured = ids.contains(&record.id);
        }
        self.write_all(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_catalog() -> Vec<CharacterRecord> {
        vec![
            CharacterRecord {
                id: "c1".to_string(),
                name: "Elder Rowan".to_string(),
                description: "A wise old druid".to_string(),
                tagline: None,
                category: "Fantasy".to_string(),
                archetype: "mentor".to_string(),
                system_prompt: "You are Elder Rowan.".to_string(),
                voice_name: "charon".to_string(),
                style_hint: None,
                featured: false,
                created_at: Some("2025-01-01T00:00:00Z".to_string()),
            },
            CharacterRecord {
                id: "c2".to_string(),
                name: "Nina Park".to_string(),
                description: "An upbeat student".to_string(),
                tagline: Some("Always curious".to_string()),
                category: "Human".to_string(),
                archetype: "best-friend".to_string(),
                system_prompt: "You are Nina.".to_string(),
                voice_name: "kore".to_string(),
                style_hint: None,
                featured: true,
                created_at: Some("2025-06-01T00:00:00Z".to_string()),
            },
        ]
    }

    fn write_catalog(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("characters.json");
        fs::write(&path, serde_json::to_string(&sample_catalog()).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(&write_catalog(&dir));

        let records = store.list_characters().await.unwrap();
        assert_eq!(records[0].id, "c2");
        assert_eq!(records[1].id, "c1");
    }

    #[tokio::test]
    async fn test_update_voice_persists() {
        let dir = TempDir::new().unwrap();
        let path = write_catalog(&dir);
        let store = JsonStore::new(&path);

        store
            .update_voice("c1", "aoede", Some("warm, gentle"))
            .await
            .unwrap();

        let records = JsonStore::new(&path).list_characters().await.unwrap();
        let c1 = records.iter().find(|r| r.id == "c1").unwrap();
        assert_eq!(c1.voice_name, "aoede");
        assert_eq!(c1.style_hint.as_deref(), Some("warm, gentle"));
    }

    #[tokio::test]
    async fn test_set_featured_is_exclusive() {
        let dir = TempDir::new().unwrap();
        let path = write_catalog(&dir);
        let store = JsonStore::new(&path);

        store.set_featured(&["c1".to_string()]).await.unwrap();

        let records = store.list_characters().await.unwrap();
        assert!(records.iter().find(|r| r.id == "c1").unwrap().featured);
        assert!(!records.iter().find(|r| r.id == "c2").unwrap().featured);
    }

    #[tokio::test]
    async fn test_update_unknown_character_errors() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(&write_catalog(&dir));
        assert!(store.update_voice("missing", "puck", None).await.is_err());
    }
}

//! Repositories for compiled stories

use crate::storage;
use crate::types::story::Story;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Story not found: {name}")]
    NotFound { name: String },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Invalid story data: {message}")]
    InvalidFormat { message: String },
}

impl RepositoryError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }
}

/// Named storage of compiled stories
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Load a story by name
    async fn load_story(&self, name: &str) -> Result<Story, RepositoryError>;

    /// Store a story under a name, replacing any previous one
    async fn save_story(&self, name: &str, story: &Story) -> Result<(), RepositoryError>;

    /// Check if a story exists
    async fn story_exists(&self, name: &str) -> Result<bool, RepositoryError>;

    /// List stored story names
    async fn list_stories(&self) -> Result<Vec<String>, RepositoryError>;
}

/// File system repository: one `<name>.json` file per story
pub struct JsonStoryRepository {
    base_path: PathBuf,
}

impl JsonStoryRepository {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn story_path(&self, name: &str) -> PathBuf {
        self.base_path.join(format!("{name}.json"))
    }
}

#[async_trait]
impl StoryRepository for JsonStoryRepository {
    async fn load_story(&self, name: &str) -> Result<Story, RepositoryError> {
        let path = self.story_path(name);
        if !path.exists() {
            return Err(RepositoryError::not_found(name));
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| RepositoryError::IoError {
                message: format!("Failed to read story file {}: {}", path.display(), e),
            })?;

        storage::load(&bytes).map_err(|e| RepositoryError::InvalidFormat {
            message: format!("{}: {e}", path.display()),
        })
    }

    async fn save_story(&self, name: &str, story: &Story) -> Result<(), RepositoryError> {
        let bytes = storage::save(story).map_err(|e| RepositoryError::InvalidFormat {
            message: e.to_string(),
        })?;

        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| RepositoryError::IoError {
                message: format!("Failed to create {}: {}", self.base_path.display(), e),
            })?;

        let path = self.story_path(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| RepositoryError::IoError {
                message: format!("Failed to write story file {}: {}", path.display(), e),
            })?;

        log::debug!("[Storage] Saved '{}' to {}", name, path.display());
        Ok(())
    }

    async fn story_exists(&self, name: &str) -> Result<bool, RepositoryError> {
        Ok(self.story_path(name).exists())
    }

    async fn list_stories(&self) -> Result<Vec<String>, RepositoryError> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_path)
            .await
            .map_err(|e| RepositoryError::IoError {
                message: format!("Failed to read directory {}: {}", self.base_path.display(), e),
            })?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RepositoryError::IoError {
                message: format!("Failed to read directory entry: {e}"),
            })?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}

/// In-memory implementation for testing
#[derive(Default)]
pub struct InMemoryStoryRepository {
    stories: RwLock<HashMap<String, Story>>,
}

impl InMemoryStoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoryRepository for InMemoryStoryRepository {
    async fn load_story(&self, name: &str) -> Result<Story, RepositoryError> {
        self.stories
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(name))
    }

    async fn save_story(&self, name: &str, story: &Story) -> Result<(), RepositoryError> {
        self.stories
            .write()
            .await
            .insert(name.to_string(), story.clone());
        Ok(())
    }

    async fn story_exists(&self, name: &str) -> Result<bool, RepositoryError> {
        Ok(self.stories.read().await.contains_key(name))
    }

    async fn list_stories(&self) -> Result<Vec<String>, RepositoryError> {
        let mut names: Vec<String> = self.stories.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

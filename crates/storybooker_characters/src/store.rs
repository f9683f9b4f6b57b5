//! Persistent character stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use storybooker_core::{Character, ColorPalette};
use storybooker_error::{StorageError, StorageErrorKind, StorybookerResult};
use storybooker_interface::CharacterStore;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

const RECORD_FILE: &str = "character.json";
const IMAGE_FILE: &str = "image.png";

/// On-disk character record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCharacter {
    /// Display name
    pub name: String,
    /// Species
    #[serde(default)]
    pub species: Option<String>,
    /// Free-text appearance
    #[serde(default)]
    pub physical_description: String,
    /// Distinctive features
    #[serde(default)]
    pub key_features: Vec<String>,
    /// Colour slots
    #[serde(default)]
    pub color_palette: ColorPalette,
    /// Free-form labels
    #[serde(default)]
    pub tags: Vec<String>,
    /// Rendering seed
    #[serde(default)]
    pub seed: Option<u32>,
    /// Prompt refined for this character, if any
    #[serde(default)]
    pub refined_prompt: Option<String>,
    /// Reference image, relative to the record directory when not absolute
    #[serde(default)]
    pub reference_image: Option<PathBuf>,
    /// First save
    pub created_at: DateTime<Utc>,
    /// Last save
    pub updated_at: DateTime<Utc>,
}

impl StoredCharacter {
    /// Fresh record for a character.
    pub fn from_character(character: &Character) -> Self {
        let now = Utc::now();
        Self {
            name: character.name.clone(),
            species: character.species.clone(),
            physical_description: character.physical_description.clone(),
            key_features: character.key_features.clone(),
            color_palette: character.color_palette.clone(),
            tags: Vec::new(),
            seed: character.seed,
            refined_prompt: None,
            reference_image: character.reference_image_path.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Character view, resolving a relative image path against `dir`.
    pub fn to_character(&self, dir: &Path) -> Character {
        Character {
            name: self.name.clone(),
            species: self.species.clone(),
            physical_description: self.physical_description.clone(),
            key_features: self.key_features.clone(),
            color_palette: self.color_palette.clone(),
            seed: self.seed,
            reference_image_path: self.reference_image.as_ref().map(|path| {
                if path.is_absolute() {
                    path.clone()
                } else {
                    dir.join(path)
                }
            }),
        }
    }
}

fn validate_id(id: &str) -> Result<(), StorageError> {
    let valid = id.starts_with("chr_")
        && id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::new(StorageErrorKind::InvalidPath(format!(
            "invalid character id '{}'",
            id
        ))))
    }
}

/// Characters stored as `<base>/chr_<name>/character.json`.
#[derive(Debug, Clone)]
pub struct FileSystemCharacterStore {
    base_path: PathBuf,
}

impl FileSystemCharacterStore {
    /// Store rooted at `base_path`, created if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    #[instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> StorybookerResult<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;
        info!(path = %base_path.display(), "Opened character store");
        Ok(Self { base_path })
    }

    /// Root directory.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn record_dir(&self, id: &str) -> PathBuf {
        self.base_path.join(id)
    }

    async fn read_record(&self, id: &str) -> StorybookerResult<Option<StoredCharacter>> {
        validate_id(id)?;
        let path = self.record_dir(id).join(RECORD_FILE);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
                .into());
            }
        };
        let record = serde_json::from_str(&raw).map_err(|e| {
            StorageError::new(StorageErrorKind::Serialization(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        Ok(Some(record))
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> StorybookerResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }
        let temp = path.with_extension("tmp");
        tokio::fs::write(&temp, bytes).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!("{}: {}", temp.display(), e)))
        })?;
        tokio::fs::rename(&temp, path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp.display(),
                path.display(),
                e
            )))
        })?;
        Ok(())
    }

    async fn write_record(&self, id: &str, record: &StoredCharacter) -> StorybookerResult<()> {
        let json = serde_json::to_vec_pretty(record).map_err(|e| {
            StorageError::new(StorageErrorKind::Serialization(format!("{}: {}", id, e)))
        })?;
        self.write_file(&self.record_dir(id).join(RECORD_FILE), &json)
            .await
    }

    /// Store a reference image for a saved character and point its record at it.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save_reference_image(&self, id: &str, bytes: &[u8]) -> StorybookerResult<PathBuf> {
        let mut record = self
            .read_record(id)
            .await?
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotFound(id.to_string())))?;
        let path = self.record_dir(id).join(IMAGE_FILE);
        self.write_file(&path, bytes).await?;

        record.reference_image = Some(PathBuf::from(IMAGE_FILE));
        record.updated_at = Utc::now();
        self.write_record(id, &record).await?;
        debug!(path = %path.display(), "Saved reference image");
        Ok(path)
    }
}

#[async_trait]
impl CharacterStore for FileSystemCharacterStore {
    #[instrument(skip(self))]
    async fn load(&self, id: &str) -> StorybookerResult<Character> {
        match self.read_record(id).await? {
            Some(record) => Ok(record.to_character(&self.record_dir(id))),
            None => Err(StorageError::new(StorageErrorKind::NotFound(id.to_string())).into()),
        }
    }

    /// Malformed ids name no record, so they do not exist.
    async fn exists(&self, id: &str) -> StorybookerResult<bool> {
        if let Err(e) = validate_id(id) {
            debug!(id, error = %e, "Malformed character id");
            return Ok(false);
        }
        Ok(tokio::fs::try_exists(self.record_dir(id).join(RECORD_FILE))
            .await
            .unwrap_or(false))
    }

    /// Saves under the id derived from the name, keeping tags, refined
    /// prompt and creation time of an existing record.
    #[instrument(skip(self, character), fields(name = %character.name))]
    async fn save(&self, character: &Character) -> StorybookerResult<String> {
        let id = character.id();
        let mut record = StoredCharacter::from_character(character);
        if let Some(existing) = self.read_record(&id).await? {
            record.tags = existing.tags;
            record.refined_prompt = existing.refined_prompt;
            record.created_at = existing.created_at;
            if record.reference_image.is_none() {
                record.reference_image = existing.reference_image;
            }
        }
        self.write_record(&id, &record).await?;
        info!(id = %id, "Saved character");
        Ok(id)
    }

    async fn list(&self) -> StorybookerResult<Vec<Character>> {
        let mut dir = tokio::fs::read_dir(&self.base_path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                self.base_path.display(),
                e
            )))
        })?;

        let mut ids = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                self.base_path.display(),
                e
            )))
        })? {
            let name = entry.file_name().to_string_lossy().to_string();
            if validate_id(&name).is_ok() {
                ids.push(name);
            }
        }
        ids.sort();

        let mut characters = Vec::with_capacity(ids.len());
        for id in ids {
            match self.read_record(&id).await {
                Ok(Some(record)) => characters.push(record.to_character(&self.record_dir(&id))),
                Ok(None) => {}
                Err(e) => warn!(id = %id, error = %e, "Skipping unreadable character"),
            }
        }
        Ok(characters)
    }
}

/// Store that keeps characters in memory.
#[derive(Debug, Default)]
pub struct InMemoryCharacterStore {
    characters: RwLock<BTreeMap<String, Character>>,
}

impl InMemoryCharacterStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `characters`.
    pub fn with_characters(characters: impl IntoIterator<Item = Character>) -> Self {
        Self {
            characters: RwLock::new(characters.into_iter().map(|c| (c.id(), c)).collect()),
        }
    }
}

#[async_trait]
impl CharacterStore for InMemoryCharacterStore {
    async fn load(&self, id: &str) -> StorybookerResult<Character> {
        self.characters
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotFound(id.to_string())).into())
    }

    async fn exists(&self, id: &str) -> StorybookerResult<bool> {
        Ok(self.characters.read().await.contains_key(id))
    }

    async fn save(&self, character: &Character) -> StorybookerResult<String> {
        let id = character.id();
        self.characters
            .write()
            .await
            .insert(id.clone(), character.clone());
        Ok(id)
    }

    async fn list(&self) -> StorybookerResult<Vec<Character>> {
        Ok(self.characters.read().await.values().cloned().collect())
    }
}

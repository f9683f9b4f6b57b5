//! Filesystem and in-memory character stores.

use storybooker_characters::{FileSystemCharacterStore, InMemoryCharacterStore, StoredCharacter};
use storybooker_core::Character;
use storybooker_interface::CharacterStore;
use tempfile::TempDir;

fn luna() -> Character {
    let mut luna = Character::new("Luna")
        .with_species("mouse")
        .with_features(["blue cape"]);
    luna.seed = Some(42);
    luna
}

#[tokio::test]
async fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let store = FileSystemCharacterStore::new(dir.path()).unwrap();

    let id = store.save(&luna()).await.unwrap();
    assert_eq!(id, "chr_luna");
    assert!(dir.path().join("chr_luna/character.json").exists());
    assert!(store.exists(&id).await.unwrap());
    assert_eq!(store.load(&id).await.unwrap(), luna());
}

#[tokio::test]
async fn test_missing_character_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = FileSystemCharacterStore::new(dir.path()).unwrap();

    assert!(!store.exists("chr_nobody").await.unwrap());
    let err = store.load("chr_nobody").await.unwrap_err();
    assert!(err.to_string().contains("Not found"));
}

#[tokio::test]
async fn test_path_traversal_rejected() {
    let dir = TempDir::new().unwrap();
    let store = FileSystemCharacterStore::new(dir.path()).unwrap();
    assert!(store.load("../etc").await.is_err());
    assert!(!store.exists("chr_../x").await.unwrap());
    assert!(!store.exists("../etc").await.unwrap());
    assert!(!store.exists("luna").await.unwrap());
}

#[tokio::test]
async fn test_reads_hand_written_record_and_keeps_metadata() {
    let dir = TempDir::new().unwrap();
    let record_dir = dir.path().join("chr_pip");
    std::fs::create_dir_all(&record_dir).unwrap();
    std::fs::write(
        record_dir.join("character.json"),
        r#"{
            "name": "Pip",
            "species": "sparrow",
            "physical_description": "A brown sparrow",
            "key_features": ["red scarf"],
            "color_palette": {"primary_color": "brown", "eye_color": null},
            "tags": ["bird"],
            "seed": 9,
            "refined_prompt": "a sparrow sticker",
            "reference_image": "image.png",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }"#,
    )
    .unwrap();
    let store = FileSystemCharacterStore::new(dir.path()).unwrap();

    let pip = store.load("chr_pip").await.unwrap();
    assert_eq!(pip.color_palette.get("primary_color"), Some("brown"));
    assert_eq!(pip.reference_image_path, Some(record_dir.join("image.png")));

    store
        .save(&Character::new("Pip").with_species("sparrow"))
        .await
        .unwrap();
    let raw = std::fs::read_to_string(record_dir.join("character.json")).unwrap();
    let record: StoredCharacter = serde_json::from_str(&raw).unwrap();
    assert_eq!(record.tags, vec!["bird"]);
    assert_eq!(record.refined_prompt.as_deref(), Some("a sparrow sticker"));
    assert_eq!(record.created_at.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    assert!(record.reference_image.is_some());
}

#[tokio::test]
async fn test_reference_image_and_list() {
    let dir = TempDir::new().unwrap();
    let store = FileSystemCharacterStore::new(dir.path()).unwrap();
    store.save(&luna()).await.unwrap();
    store.save(&Character::new("Bolt")).await.unwrap();

    let path = store.save_reference_image("chr_luna", b"png").await.unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"png");

    let listed = store.list().await.unwrap();
    let names: Vec<_> = listed.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Bolt", "Luna"]);
    assert_eq!(listed[1].reference_image_path, Some(path));
}

#[tokio::test]
async fn test_in_memory_store() {
    let store = InMemoryCharacterStore::with_characters([luna()]);
    assert!(store.exists("chr_luna").await.unwrap());
    assert_eq!(store.load("chr_luna").await.unwrap().seed, Some(42));
    assert!(store.load("chr_bolt").await.is_err());
}

//! Asset store, post-processing and document assembly.

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::PathBuf;
use storybooker_core::{ArtStyle, Character, JobId, Story, StoryBeat};
use storybooker_interface::{
    AssemblyInput, AssetStore, DocumentAssembler, ImagePostProcessor, ThresholdConfig,
};
use storybooker_storage::{FileSystemAssetStore, HtmlDocumentAssembler, StandardPostProcessor};
use tempfile::TempDir;

fn png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// White 20x20 canvas with a 4x2 red block at (5, 6).
fn sticker() -> RgbaImage {
    let mut image = RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 255]));
    for x in 5..9 {
        for y in 6..8 {
            image.put_pixel(x, y, Rgba([200, 10, 10, 255]));
        }
    }
    image
}

#[test]
fn test_cutout_crops_to_content_with_padding() {
    let processor = StandardPostProcessor::new();
    let out = processor
        .process(&png(&sticker()), &ThresholdConfig::cutout(240, 3))
        .unwrap();

    let image = image::load_from_memory(&out).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (4 + 6, 2 + 6));
    assert_eq!(image.get_pixel(0, 0).0[3], 0);
    assert_eq!(image.get_pixel(3, 3).0, [200, 10, 10, 255]);
}

#[test]
fn test_scene_keeps_background_and_downscales() {
    let processor = StandardPostProcessor::new();
    let mut config = ThresholdConfig::scene();
    config.max_dimension = Some(10);

    let out = processor.process(&png(&sticker()), &config).unwrap();
    let image = image::load_from_memory(&out).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (10, 10));
    assert_eq!(image.get_pixel(0, 0).0[3], 255);
}

#[test]
fn test_garbage_bytes_are_an_error() {
    let processor = StandardPostProcessor::new();
    assert!(processor.process(b"not an image", &ThresholdConfig::scene()).is_err());
}

#[tokio::test]
async fn test_asset_store_layout() {
    let dir = TempDir::new().unwrap();
    let store = FileSystemAssetStore::new(dir.path()).unwrap();
    let job = JobId::new();

    let path = store.save_image(job, "page_0", b"bytes").await.unwrap();
    assert_eq!(path, dir.path().join(job.to_string()).join("page_0.png"));
    assert_eq!(std::fs::read(path).unwrap(), b"bytes");
}

#[tokio::test]
async fn test_document_with_missing_images() {
    let dir = TempDir::new().unwrap();
    let assets = FileSystemAssetStore::new(dir.path().join("assets")).unwrap();
    let assembler = HtmlDocumentAssembler::new(dir.path().join("output"));
    let job = JobId::new();

    let page = assets
        .save_image(job, "page_1", &png(&sticker()))
        .await
        .unwrap();
    let story = Story {
        title: "Luna & the Moon".to_string(),
        beats: vec![
            StoryBeat::new("Luna looked up.", "a mouse"),
            StoryBeat::new("The moon <smiled>.", "the moon"),
            StoryBeat::new("Goodnight.", "a bed"),
        ],
    };
    let characters = vec![Character::new("Luna").with_species("mouse")];
    let page_images: Vec<Option<PathBuf>> = vec![None, Some(page), Some(dir.path().join("gone.png"))];

    let handle = assembler
        .assemble(&AssemblyInput {
            job_id: job,
            language: "en",
            story: &story,
            characters: &characters,
            page_images: &page_images,
            cover_image: None,
            style: ArtStyle::Watercolor,
        })
        .await
        .unwrap();

    assert_eq!(
        handle.path,
        dir.path().join("output").join(job.to_string()).join("storybook_en.html")
    );
    assert_eq!(handle.page_count, 3);
    assert_eq!(handle.media_type, "text/html");

    let html = std::fs::read_to_string(&handle.path).unwrap();
    assert!(html.contains("Luna &amp; the Moon"));
    assert!(html.contains("The moon &lt;smiled&gt;."));
    assert_eq!(html.matches("data:image/png;base64,").count(), 1);
    assert!(html.contains("<strong>Luna</strong> (mouse)"));
}

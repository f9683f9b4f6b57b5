//! Types exchanged with external collaborators.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storybooker_core::{ArtStyle, Character, JobId, Story};

/// Image post-processing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Make near-white pixels transparent and crop to content
    pub remove_background: bool,
    /// Channel value at or above which a pixel counts as background
    pub threshold: u8,
    /// Transparent margin kept around cropped content
    pub padding: u32,
    /// Longest side after processing, larger images are downscaled
    pub max_dimension: Option<u32>,
}

impl ThresholdConfig {
    /// Full-page scenes and covers: keep the background.
    pub fn scene() -> Self {
        Self {
            remove_background: false,
            threshold: 240,
            padding: 0,
            max_dimension: Some(2048),
        }
    }

    /// Character references: cut the subject out of its white background.
    pub fn cutout(threshold: u8, padding: u32) -> Self {
        Self {
            remove_background: true,
            threshold,
            padding,
            max_dimension: Some(1024),
        }
    }
}

/// Everything the document assembler needs for one language.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyInput<'a> {
    /// Owning job
    pub job_id: JobId,
    /// Language code of `story`
    pub language: &'a str,
    /// Story text in this language
    pub story: &'a Story,
    /// Shared roster
    pub characters: &'a [Character],
    /// Page images by beat index
    pub page_images: &'a [Option<PathBuf>],
    /// Cover image
    pub cover_image: Option<&'a Path>,
    /// Illustration style
    pub style: ArtStyle,
}

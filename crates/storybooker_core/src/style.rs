//! Illustration styles.

use serde::{Deserialize, Serialize};

/// Visual style applied to every illustration of a job.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use storybooker_core::ArtStyle;
///
/// assert_eq!(ArtStyle::from_str("3D_RENDERED").unwrap(), ArtStyle::ThreeDRendered);
/// assert_eq!(ArtStyle::Watercolor.to_string(), "watercolor");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum ArtStyle {
    /// Stop-motion clay figures
    #[strum(to_string = "claymation")]
    Claymation,
    /// Pencil sketch with aged paper tones
    #[strum(to_string = "vintage_sketch")]
    VintageSketch,
    /// Flat vector shapes
    #[strum(to_string = "flat_design")]
    FlatDesign,
    /// Soft 3D render
    #[default]
    #[serde(rename = "3d_rendered", alias = "three_d_rendered")]
    #[strum(to_string = "3d_rendered")]
    ThreeDRendered,
    /// Watercolour wash
    #[strum(to_string = "watercolor")]
    Watercolor,
    /// Clean ink outlines
    #[strum(to_string = "line_art")]
    LineArt,
}

impl ArtStyle {
    /// Style phrase appended to image prompts.
    pub fn phrase(self) -> &'static str {
        match self {
            ArtStyle::Claymation => "claymation style, handcrafted clay figures with soft studio lighting",
            ArtStyle::VintageSketch => "vintage pencil sketch, warm sepia paper texture",
            ArtStyle::FlatDesign => "flat design illustration, bold shapes and limited palette",
            ArtStyle::ThreeDRendered => "3D rendered, soft lighting, rounded friendly shapes",
            ArtStyle::Watercolor => "watercolor illustration, soft washes and gentle edges",
            ArtStyle::LineArt => "clean line art, crisp black outlines on white",
        }
    }
}

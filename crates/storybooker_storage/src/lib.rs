//! Storage collaborators for Storybooker jobs.
//!
//! - [`FileSystemAssetStore`]: generated images per job
//! - [`StandardPostProcessor`]: background removal, autocrop and downscaling
//! - [`HtmlDocumentAssembler`]: one self-contained HTML booklet per language

#![warn(missing_docs)]

mod assets;
mod document;
mod fs;
mod post_process;

pub use assets::FileSystemAssetStore;
pub use document::{HTML_MEDIA_TYPE, HtmlDocumentAssembler};
pub use post_process::StandardPostProcessor;

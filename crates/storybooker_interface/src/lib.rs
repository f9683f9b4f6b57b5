//! Trait definitions for the Storybooker service.
//!
//! Backends implement one trait per capability kind ([`TextGenerator`],
//! [`ImageGenerator`]). External collaborators (character store, image
//! post-processing, asset storage, document assembly) are consumed through
//! the narrow traits defined here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{
    AssetStore, CharacterStore, DocumentAssembler, ImageGenerator, ImagePostProcessor,
    ProviderCandidate, TextGenerator,
};
pub use types::{AssemblyInput, ThresholdConfig};

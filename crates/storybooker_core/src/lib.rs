//! Core data types for the Storybooker service.
//!
//! This crate provides the data model shared by every stage of a storybook
//! job: prompt requests, characters, story beats, and the observable job
//! record.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod character;
mod job;
mod message;
mod request;
mod role;
mod story;
mod style;

pub use character::{Character, ColorPalette, character_id};
pub use job::{
    DegradedAsset, DocumentHandle, ErrorDetail, JobArtifacts, JobId, JobRequest,
    JobRequestBuilder, JobRequestBuilderError, JobSnapshot, JobStatus, RequestLimits,
};
pub use message::Message;
pub use request::{ImageRequest, ImageResponse, TextRequest, TextResponse};
pub use role::Role;
pub use story::{BeatPrompts, ImagePrompt, Story, StoryBeat};
pub use style::ArtStyle;

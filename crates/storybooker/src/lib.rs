//! Storybooker turns a short theme into an illustrated, multi-language
//! storybook.
//!
//! A job writes a story, extracts and reconciles its characters, directs and
//! renders one illustration per page, then assembles one document per
//! language. Every remote call goes through a fallback chain of
//! interchangeable providers, so a job keeps going when a provider is rate
//! limited, misconfigured or down.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storybooker::{JobRegistry, JobRequestBuilder, Services, StorybookerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StorybookerConfig::load()?;
//!     let services = Services::from_config(&config, |key| std::env::var(key).ok())?;
//!     let registry = JobRegistry::new(Arc::new(services));
//!
//!     let request = JobRequestBuilder::default()
//!         .theme("a dragon who is afraid of the dark")
//!         .num_pages(4u8)
//!         .build()?;
//!     let id = registry.submit(request).await?;
//!     let snapshot = registry.wait(id).await;
//!     println!("{:?}", snapshot);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `storybooker_error` - Error types
//! - `storybooker_core` - Requests, stories, characters and the job snapshot
//! - `storybooker_interface` - Capability traits and collaborator contracts
//! - `storybooker_resilience` - Configuration, failure classification and the invoker
//! - `storybooker_models` - Text and image providers
//! - `storybooker_characters` - Character reconciliation and the character store
//! - `storybooker_storage` - Assets, post-processing and document assembly
//! - `storybooker_pipeline` - The job state machine
//! - `storybooker_server` - HTTP surface
//!
//! This crate re-exports everything for convenience.

pub mod observability;

pub use storybooker_characters::*;
pub use storybooker_core::*;
pub use storybooker_error::*;
pub use storybooker_interface::*;
pub use storybooker_models::*;
pub use storybooker_pipeline::{
    CapabilityPool, JobRegistry, JobRunner, ProgressReporter, Services, agents, extract_json,
    milestones, parse_json,
};
pub use storybooker_resilience::*;
pub use storybooker_server::{ApiError, AppState, create_router, serve};
pub use storybooker_storage::*;

//! Job orchestration for Storybooker.
//!
//! A [`JobRegistry`] accepts [`JobRequest`](storybooker_core::JobRequest)s
//! and runs each one as a single background task. The task walks a fixed
//! phase sequence (story, cover, cast, art direction, page images,
//! editions) and publishes a [`JobSnapshot`](storybooker_core::JobSnapshot)
//! after every step. Every remote call goes through the resilient
//! [`Invoker`](storybooker_resilience::Invoker).
//!
//! Missing pictures degrade a job. A short story, failed art direction or a
//! failed document fails it.

#![warn(missing_docs)]

pub mod agents;
mod extraction;
mod progress;
mod registry;
mod runner;
mod services;

pub use extraction::{extract_json, parse_json};
pub use progress::{ProgressReporter, milestones, scaled};
pub use registry::JobRegistry;
pub use runner::JobRunner;
pub use services::{CapabilityPool, Services};

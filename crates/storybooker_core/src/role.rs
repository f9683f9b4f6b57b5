//! Role types for prompt messages.

use serde::{Deserialize, Serialize};

/// Who a message in a text request speaks for.
///
/// # Examples
///
/// ```
/// use storybooker_core::Role;
///
/// assert_ne!(Role::System, Role::User);
/// assert_eq!(format!("{}", Role::System), "System");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions framing the task
    System,
    /// The task itself
    User,
    /// Prior model output
    Assistant,
}

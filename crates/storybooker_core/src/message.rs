//! Prompt messages.

use crate::Role;
use serde::{Deserialize, Serialize};

/// One message of a text generation request.
///
/// # Examples
///
/// ```
/// use storybooker_core::{Message, Role};
///
/// let message = Message::user("Write a story about a brave mouse.");
/// assert_eq!(message.role, Role::User);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: Role,
    /// Message text
    pub content: String,
}

impl Message {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

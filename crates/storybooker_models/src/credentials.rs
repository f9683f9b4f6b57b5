//! API credential lookup.

use storybooker_error::{ProviderError, ProviderErrorKind};

/// True for empty keys and template placeholders such as
/// `your_groq_api_key_here`.
pub fn is_placeholder(key: &str) -> bool {
    let key = key.trim().to_lowercase();
    key.is_empty() || (key.starts_with("your_") && key.ends_with("_here"))
}

/// A credential read from the environment at startup.
///
/// Absence is not an error until a request is made, so a provider without a
/// key still takes its place in the fallback order and fails as Fatal-Auth.
#[derive(Clone, Default)]
pub struct ApiKey {
    env_var: String,
    value: Option<String>,
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("env_var", &self.env_var)
            .field("present", &self.value.is_some())
            .finish()
    }
}

impl ApiKey {
    /// Look up `env_var` through `lookup`, discarding placeholders.
    pub fn from_lookup<F>(env_var: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_var = env_var.into();
        let value = lookup(&env_var).filter(|v| !is_placeholder(v));
        Self { env_var, value }
    }

    /// Look up `env_var` in the process environment.
    pub fn from_env(env_var: impl Into<String>) -> Self {
        Self::from_lookup(env_var, |name| std::env::var(name).ok())
    }

    /// A literal key.
    pub fn literal(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            env_var: String::new(),
            value: (!is_placeholder(&value)).then_some(value),
        }
    }

    /// The key, or a `MissingCredential` error naming the variable.
    pub fn require(&self) -> Result<&str, ProviderError> {
        self.value.as_deref().ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::MissingCredential(format!(
                "{} is not set or still a placeholder",
                if self.env_var.is_empty() { "API key" } else { self.env_var.as_str() }
            )))
        })
    }

    /// Whether a usable key is present.
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

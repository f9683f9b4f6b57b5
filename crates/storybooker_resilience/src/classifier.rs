//! Failure classification of provider errors.
//!
//! The classifier is separate from the fallback loop so the rules (and the
//! rate-limit keyword list in particular) can change without touching the
//! invocation algorithm.

use storybooker_error::{FailureClass, ProviderError, ProviderErrorKind};

/// Maps a raw provider error to a failure class.
///
/// Any `Fn(&ProviderError) -> FailureClass` closure is a classifier.
pub trait FailureClassifier: Send + Sync {
    /// Classify one failed attempt.
    fn classify(&self, error: &ProviderError) -> FailureClass;
}

impl<F> FailureClassifier for F
where
    F: Fn(&ProviderError) -> FailureClass + Send + Sync,
{
    fn classify(&self, error: &ProviderError) -> FailureClass {
        self(error)
    }
}

/// Phrases providers use in bodies when they will not serve a request.
pub const DEFAULT_RATE_LIMIT_KEYWORDS: [&str; 6] = [
    "limited",
    "rate limit",
    "quota",
    "limit exceeded",
    "too many requests",
    "api is limited",
];

/// Status code and keyword based classifier.
///
/// # Examples
///
/// ```
/// use storybooker_error::{FailureClass, ProviderError, ProviderErrorKind};
/// use storybooker_resilience::{FailureClassifier, KeywordClassifier};
///
/// let classifier = KeywordClassifier::default();
/// let err = ProviderError::new(ProviderErrorKind::Http {
///     status_code: 200,
///     message: "Your API is limited, upgrade your plan".to_string(),
/// });
/// assert_eq!(classifier.classify(&err), FailureClass::RateLimited);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    /// Classifier matching the given keywords case-insensitively.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Keywords in use.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Whether `text` carries a rate-limit signal.
    pub fn mentions_rate_limit(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT_KEYWORDS)
    }
}

impl FailureClassifier for KeywordClassifier {
    fn classify(&self, error: &ProviderError) -> FailureClass {
        match &error.kind {
            ProviderErrorKind::MissingCredential(_) => FailureClass::FatalAuth,
            ProviderErrorKind::RateLimited(_) => FailureClass::RateLimited,
            ProviderErrorKind::ModelNotFound(_) | ProviderErrorKind::UnsupportedRequest(_) => {
                FailureClass::Unsupported
            }
            ProviderErrorKind::Transport(message) | ProviderErrorKind::Unavailable(message) => {
                if self.mentions_rate_limit(message) {
                    FailureClass::RateLimited
                } else {
                    FailureClass::Transient
                }
            }
            ProviderErrorKind::InvalidResponse(message) => {
                if self.mentions_rate_limit(message) {
                    FailureClass::RateLimited
                } else {
                    FailureClass::Unsupported
                }
            }
            ProviderErrorKind::Http {
                status_code,
                message,
            } => match *status_code {
                429 => FailureClass::RateLimited,
                401 | 403 => FailureClass::FatalAuth,
                _ if self.mentions_rate_limit(message) => FailureClass::RateLimited,
                404 => FailureClass::Unsupported,
                408 | 500..=599 => FailureClass::Transient,
                _ => FailureClass::Unsupported,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status_code: u16, message: &str) -> ProviderError {
        ProviderError::new(ProviderErrorKind::Http {
            status_code,
            message: message.to_string(),
        })
    }

    #[test]
    fn test_status_codes() {
        let c = KeywordClassifier::default();
        assert_eq!(c.classify(&http(429, "")), FailureClass::RateLimited);
        assert_eq!(c.classify(&http(401, "bad key")), FailureClass::FatalAuth);
        assert_eq!(c.classify(&http(403, "forbidden")), FailureClass::FatalAuth);
        assert_eq!(c.classify(&http(404, "no such model")), FailureClass::Unsupported);
        assert_eq!(c.classify(&http(503, "overloaded")), FailureClass::Transient);
        assert_eq!(c.classify(&http(408, "")), FailureClass::Transient);
        assert_eq!(c.classify(&http(400, "bad size")), FailureClass::Unsupported);
    }

    #[test]
    fn test_keyword_beats_server_error() {
        let c = KeywordClassifier::default();
        assert_eq!(
            c.classify(&http(500, "Quota exceeded for today")),
            FailureClass::RateLimited
        );
    }

    #[test]
    fn test_custom_keywords() {
        let c = KeywordClassifier::new(["slow down"]);
        assert_eq!(c.classify(&http(503, "please SLOW DOWN")), FailureClass::RateLimited);
        assert_eq!(c.classify(&http(503, "quota")), FailureClass::Transient);
    }

    #[test]
    fn test_missing_credential_is_fatal() {
        let c = KeywordClassifier::default();
        let err = ProviderError::new(ProviderErrorKind::MissingCredential("GROQ_API_KEY".into()));
        assert_eq!(c.classify(&err), FailureClass::FatalAuth);
    }

    #[test]
    fn test_closure_classifier() {
        let always_transient = |_: &ProviderError| FailureClass::Transient;
        assert_eq!(always_transient.classify(&http(401, "")), FailureClass::Transient);
    }
}

//! Job requests and the observable job record.

use crate::ArtStyle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use storybooker_error::{JobError, JobErrorKind};
use uuid::Uuid;

/// Opaque job identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// A fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle state of a job.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, background task not started
    #[display("pending")]
    Pending,
    /// Phases running
    #[display("processing")]
    Processing,
    /// Every requested language assembled
    #[display("completed")]
    Completed,
    /// Aborted with a classified error
    #[display("failed")]
    Failed,
}

impl JobStatus {
    /// Completed and Failed are final.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Request limits applied at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLimits {
    /// Language codes the service can write
    pub supported_languages: Vec<String>,
    /// Languages used when a request names none
    pub default_languages: Vec<String>,
    /// Largest page count accepted
    pub max_pages: u8,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            supported_languages: vec!["en".to_string(), "es".to_string()],
            default_languages: vec!["en".to_string()],
            max_pages: 10,
        }
    }
}

/// A storybook generation request.
///
/// # Examples
///
/// ```
/// use storybooker_core::{JobRequestBuilder, RequestLimits};
///
/// let request = JobRequestBuilder::default()
///     .theme("a lighthouse keeper's cat")
///     .num_pages(3u8)
///     .languages(vec!["ES".to_string(), "en".to_string(), "es".to_string()])
///     .build()
///     .unwrap()
///     .normalized(&RequestLimits::default())
///     .unwrap();
///
/// assert_eq!(request.languages, vec!["es", "en"]);
/// assert_eq!(request.primary_language(), "es");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct JobRequest {
    /// Story theme
    #[builder(default = "default_theme()")]
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Requested page count
    #[builder(default = "default_pages()")]
    #[serde(default = "default_pages")]
    pub num_pages: u8,
    /// Illustration style, configured default when absent
    #[builder(default)]
    #[serde(default)]
    pub style: Option<ArtStyle>,
    /// Output languages, first is primary
    #[builder(default)]
    #[serde(default)]
    pub languages: Vec<String>,
    /// Stored characters that must appear
    #[builder(default)]
    #[serde(default)]
    pub pinned_character_ids: Vec<String>,
    /// Preferred text candidate, overriding configuration
    #[builder(default)]
    #[serde(default)]
    pub text_provider: Option<String>,
    /// Preferred image candidate, overriding configuration
    #[builder(default)]
    #[serde(default)]
    pub image_provider: Option<String>,
}

fn default_theme() -> String {
    "adventure".to_string()
}

fn default_pages() -> u8 {
    5
}

impl JobRequest {
    /// Validate against the limits and normalize languages.
    ///
    /// Languages are trimmed, lowercased and de-duplicated preserving order.
    /// An empty list falls back to the default languages.
    ///
    /// # Errors
    ///
    /// Returns a `ContractViolation` when the page count is out of range or a
    /// language is not supported.
    pub fn normalized(mut self, limits: &RequestLimits) -> Result<Self, JobError> {
        if self.num_pages == 0 || self.num_pages > limits.max_pages {
            return Err(JobError::new(
                JobErrorKind::ContractViolation,
                format!(
                    "num_pages must be between 1 and {}, got {}",
                    limits.max_pages, self.num_pages
                ),
            ));
        }

        let requested = if self.languages.is_empty() {
            limits.default_languages.clone()
        } else {
            std::mem::take(&mut self.languages)
        };
        let mut languages: Vec<String> = Vec::with_capacity(requested.len());
        for code in requested {
            let code = code.trim().to_lowercase();
            if !limits.supported_languages.contains(&code) {
                return Err(JobError::new(
                    JobErrorKind::ContractViolation,
                    format!(
                        "unsupported language '{}', supported: {}",
                        code,
                        limits.supported_languages.join(", ")
                    ),
                ));
            }
            if !languages.contains(&code) {
                languages.push(code);
            }
        }
        if languages.is_empty() {
            return Err(JobError::new(
                JobErrorKind::ContractViolation,
                "no output language requested or configured",
            ));
        }
        self.languages = languages;

        if self.theme.trim().is_empty() {
            self.theme = default_theme();
        }
        let mut seen = std::collections::HashSet::new();
        self.pinned_character_ids
            .retain(|id| seen.insert(id.trim().to_lowercase()));
        Ok(self)
    }

    /// Requested style or `default`.
    pub fn style_or(&self, default: ArtStyle) -> ArtStyle {
        self.style.unwrap_or(default)
    }

    /// First requested language.
    pub fn primary_language(&self) -> &str {
        self.languages.first().map(String::as_str).unwrap_or("en")
    }
}

/// Classified failure attached to a failed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Classification
    pub kind: JobErrorKind,
    /// User-facing message
    pub message: String,
    /// Raw diagnostic text
    pub diagnostic: String,
    /// Phase in flight when the job failed
    pub phase: String,
}

impl ErrorDetail {
    /// Detail for an error raised in `phase`.
    pub fn from_error(err: &JobError, phase: impl Into<String>) -> Self {
        Self {
            kind: err.kind,
            message: format!("{}: {}", err.kind.summary(), err.message),
            diagnostic: err.diagnostic.clone(),
            phase: phase.into(),
        }
    }
}

/// A non-fatal per-item failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedAsset {
    /// Asset that is missing, e.g. `cover` or `page 2 image`
    pub asset: String,
    /// Why it is missing
    pub reason: String,
}

/// A finished document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHandle {
    /// Language code of the text
    pub language: String,
    /// Location of the document
    pub path: PathBuf,
    /// MIME type of the document
    pub media_type: String,
    /// Story title in this language
    pub title: String,
    /// Number of story pages
    pub page_count: usize,
}

/// Intermediate assets visible while and after a job runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobArtifacts {
    /// Cover image, null when the cover degraded
    pub cover_image: Option<PathBuf>,
    /// Page images by beat index, null entries degraded
    pub page_images: Vec<Option<PathBuf>>,
    /// Resolved roster names
    pub characters: Vec<String>,
}

/// Read-only view of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Job identifier
    pub id: JobId,
    /// Lifecycle state
    pub status: JobStatus,
    /// Progress 0 to 100
    pub progress: u8,
    /// Label of the phase in flight
    pub current_step: String,
    /// Present only when failed
    pub error_detail: Option<ErrorDetail>,
    /// Requested languages in request order, primary first
    #[serde(default)]
    pub languages: Vec<String>,
    /// Finished documents, empty until completed
    pub outputs_by_language: BTreeMap<String, DocumentHandle>,
    /// Assets that degraded without failing the job
    pub degraded: Vec<DegradedAsset>,
    /// Intermediate assets
    pub artifacts: JobArtifacts,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last change
    pub updated_at: DateTime<Utc>,
}

impl JobSnapshot {
    /// A freshly created pending job producing `languages`.
    pub fn pending(id: JobId, languages: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::Pending,
            progress: 0,
            current_step: "Queued".to_string(),
            error_detail: None,
            languages,
            outputs_by_language: BTreeMap::new(),
            degraded: Vec::new(),
            artifacts: JobArtifacts::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Edition of the primary language, or of the first requested language
    /// that has one.
    pub fn primary_document(&self) -> Option<&DocumentHandle> {
        self.languages
            .iter()
            .find_map(|language| self.outputs_by_language.get(language))
            .or_else(|| self.outputs_by_language.values().next())
    }
}

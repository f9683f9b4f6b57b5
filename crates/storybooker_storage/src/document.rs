//! Self-contained HTML storybooks.

use crate::fs::write_atomic;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use storybooker_core::DocumentHandle;
use storybooker_error::{StorageError, StorageErrorKind, StorybookerResult};
use storybooker_interface::{AssemblyInput, DocumentAssembler};

/// Media type of assembled documents.
pub const HTML_MEDIA_TYPE: &str = "text/html";

/// Writes `<output>/<job_id>/storybook_<lang>.html` with images inlined.
#[derive(Debug, Clone)]
pub struct HtmlDocumentAssembler {
    output_dir: PathBuf,
}

impl HtmlDocumentAssembler {
    /// Assembler writing under `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Where the document for a job and language lands.
    pub fn document_path(&self, input: &AssemblyInput<'_>) -> PathBuf {
        self.output_dir
            .join(input.job_id.to_string())
            .join(format!("storybook_{}.html", input.language))
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

/// Inline an image as a data uri; unreadable files render as text only.
async fn data_uri(path: Option<&Path>) -> Option<String> {
    let path = path?;
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(format!("data:{};base64,{}", mime_for(path), STANDARD.encode(bytes))),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Image missing, page rendered without it");
            None
        }
    }
}

fn render_error(err: std::fmt::Error) -> StorageError {
    StorageError::new(StorageErrorKind::Assembly(err.to_string()))
}

#[async_trait]
impl DocumentAssembler for HtmlDocumentAssembler {
    #[tracing::instrument(skip(self, input), fields(job = %input.job_id, language = input.language))]
    async fn assemble(&self, input: &AssemblyInput<'_>) -> StorybookerResult<DocumentHandle> {
        let story = input.story;
        let title = if story.title.trim().is_empty() {
            "Untitled".to_string()
        } else {
            story.title.trim().to_string()
        };

        let mut html = String::new();
        writeln!(
            html,
            "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>",
            escape(input.language),
            escape(&title)
        )
        .map_err(render_error)?;
        html.push_str(
            "<style>body{font-family:Georgia,serif;max-width:48em;margin:auto}\
             section{page-break-after:always;padding:2em 0}\
             img{max-width:100%;display:block;margin:auto}</style>\n</head>\n<body>\n",
        );
        writeln!(html, "<!-- style: {} -->", input.style).map_err(render_error)?;

        html.push_str("<section class=\"cover\">\n");
        if let Some(uri) = data_uri(input.cover_image).await {
            writeln!(html, "<img src=\"{}\" alt=\"cover\">", uri).map_err(render_error)?;
        }
        writeln!(html, "<h1>{}</h1>\n</section>", escape(&title)).map_err(render_error)?;

        for (index, beat) in story.beats.iter().enumerate() {
            writeln!(html, "<section class=\"page\" id=\"page-{}\">", index + 1)
                .map_err(render_error)?;
            let image = input.page_images.get(index).and_then(|p| p.as_deref());
            if let Some(uri) = data_uri(image).await {
                writeln!(html, "<img src=\"{}\" alt=\"page {}\">", uri, index + 1)
                    .map_err(render_error)?;
            }
            writeln!(html, "<p>{}</p>\n</section>", escape(&beat.text)).map_err(render_error)?;
        }

        if !input.characters.is_empty() {
            html.push_str("<section class=\"characters\">\n<ul>\n");
            for character in input.characters {
                let species = character
                    .species()
                    .map(|s| format!(" ({})", escape(s)))
                    .unwrap_or_default();
                writeln!(
                    html,
                    "<li><strong>{}</strong>{}: {}</li>",
                    escape(&character.name),
                    species,
                    escape(&character.physical_description)
                )
                .map_err(render_error)?;
            }
            html.push_str("</ul>\n</section>\n");
        }
        html.push_str("</body>\n</html>\n");

        let path = self.document_path(input);
        write_atomic(&path, html.as_bytes()).await?;
        tracing::info!(path = %path.display(), pages = story.beats.len(), "Assembled document");

        Ok(DocumentHandle {
            language: input.language.to_string(),
            path,
            media_type: HTML_MEDIA_TYPE.to_string(),
            title,
            page_count: story.beats.len(),
        })
    }
}

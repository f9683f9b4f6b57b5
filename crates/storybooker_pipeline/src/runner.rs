//! The phase sequence of one job.

use crate::agents::{
    art_direction_request, cover_prompt, extraction_request, language_name, page_image_prompt,
    parse_art_direction, parse_characters, parse_story, reference_prompt, story_request,
};
use crate::progress::{ProgressReporter, milestones, scaled};
use crate::Services;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use storybooker_characters::{
    format_roster_reference, inject_subjects, match_character_to_subject, resolve, seed_for_name,
};
use storybooker_core::{
    ArtStyle, BeatPrompts, Character, DocumentHandle, ErrorDetail, ImageRequest, JobId,
    JobRequest, JobSnapshot, Story, StoryBeat, TextRequest,
};
use storybooker_error::{
    CapabilityKind, InvocationError, JobError, JobErrorKind, JsonError, ProviderError,
    ProviderErrorKind, StorybookerError, StorybookerErrorKind,
};
use storybooker_interface::{AssemblyInput, ImageGenerator, TextGenerator, ThresholdConfig};
use storybooker_resilience::attempt_order;
use tracing::{debug, info, instrument, warn};

/// A fatal error and the phase that raised it.
#[derive(Debug)]
struct PhaseError {
    phase: &'static str,
    error: JobError,
}

fn in_phase(phase: &'static str) -> impl FnOnce(JobError) -> PhaseError {
    move |error| PhaseError { phase, error }
}

fn raw_reply(text: &str) -> Result<String, JsonError> {
    Ok(text.to_string())
}

fn degraded_reason(err: &InvocationError) -> String {
    format!("{} ({})", err, err.diagnostic().replace('\n', "; "))
}

fn collaborator(message: impl Into<String>, err: &StorybookerError) -> JobError {
    JobError::with_diagnostic(JobErrorKind::Collaborator, message, err.to_string())
}

/// Runs one job from Processing to a terminal state.
///
/// The runner owns the job's [`ProgressReporter`], so it is the only writer
/// of that job's snapshot.
pub struct JobRunner {
    services: Arc<Services>,
    request: JobRequest,
    style: ArtStyle,
    reporter: ProgressReporter,
    text_order: Vec<Arc<dyn TextGenerator>>,
    image_order: Vec<Arc<dyn ImageGenerator>>,
}

impl JobRunner {
    /// Runner for an already normalized request.
    pub fn new(services: Arc<Services>, request: JobRequest, reporter: ProgressReporter) -> Self {
        let text_preferred = request
            .text_provider
            .as_deref()
            .or(services.text.preferred.as_deref());
        let image_preferred = request
            .image_provider
            .as_deref()
            .or(services.image.preferred.as_deref());
        let text_order = attempt_order(text_preferred, &services.text.candidates);
        let image_order = attempt_order(image_preferred, &services.image.candidates);
        let style = request.style_or(services.default_style);

        Self {
            services,
            request,
            style,
            reporter,
            text_order,
            image_order,
        }
    }

    /// Job this runner drives.
    pub fn id(&self) -> JobId {
        self.reporter.id()
    }

    /// Run every phase and write the terminal state.
    #[instrument(skip(self), fields(job = %self.id(), pages = self.request.num_pages, languages = ?self.request.languages))]
    pub async fn run(self) -> JobSnapshot {
        self.reporter.start();
        match self.execute().await {
            Ok(outputs) => self.reporter.complete(outputs),
            Err(failure) => {
                warn!(phase = failure.phase, error = %failure.error, "Job aborted");
                self.reporter
                    .fail(ErrorDetail::from_error(&failure.error, failure.phase));
            }
        }
        self.reporter.snapshot()
    }

    async fn execute(&self) -> Result<BTreeMap<String, DocumentHandle>, PhaseError> {
        self.reporter
            .step(milestones::LOADING, "Loading pinned characters");
        let pinned = self.load_pinned().await.map_err(in_phase("pinned_characters"))?;

        self.reporter.step(milestones::STORY, "Writing story");
        let primary = self.request.primary_language().to_string();
        let mut story = self
            .write_story(&primary, &pinned)
            .await
            .map_err(in_phase("story"))?;
        self.reporter.step(milestones::STORY_READY, "Story ready");
        info!(title = %story.title, beats = story.beats.len(), "Story accepted");

        self.reporter.step(milestones::COVER, "Illustrating cover");
        let cover = self.illustrate_cover(&story).await;

        self.reporter
            .step(milestones::CHARACTERS, "Extracting characters");
        let characters = self.cast(&pinned, &mut story).await;

        self.reporter.step(milestones::PROMPTS, "Directing page art");
        let prompts = self
            .direct_pages(&story, &characters)
            .await
            .map_err(in_phase("art_direction"))?;

        self.reporter.step(milestones::IMAGES, "Illustrating pages");
        let page_images = self.illustrate_pages(&story, &prompts, &characters).await;
        self.reporter
            .step(milestones::IMAGES_DONE, "Page images ready");

        // Every edition, the primary one included, is written afresh in its
        // language. Images and the roster are shared.
        let total = self.request.languages.len();
        let mut outputs = BTreeMap::new();
        for (index, language) in self.request.languages.iter().enumerate() {
            self.reporter.step(
                scaled(milestones::EDITIONS, milestones::EDITIONS_SPAN, index, total),
                format!("Writing {} edition", language_name(language)),
            );
            let edition = self
                .write_story(language, &pinned)
                .await
                .map_err(in_phase("editions"))?;
            let handle = self
                .services
                .assembler
                .assemble(&AssemblyInput {
                    job_id: self.id(),
                    language,
                    story: &edition,
                    characters: &characters,
                    page_images: &page_images,
                    cover_image: cover.as_deref(),
                    style: self.style,
                })
                .await
                .map_err(|e| collaborator(format!("document assembly failed for '{}'", language), &e))
                .map_err(in_phase("editions"))?;
            self.reporter.advance(scaled(
                milestones::EDITIONS,
                milestones::EDITIONS_SPAN,
                index + 1,
                total,
            ));
            outputs.insert(language.clone(), handle);
        }

        Ok(outputs)
    }

    async fn load_pinned(&self) -> Result<Vec<Character>, JobError> {
        let mut pinned = Vec::with_capacity(self.request.pinned_character_ids.len());
        for id in &self.request.pinned_character_ids {
            let character = self.services.characters.load(id).await.map_err(|e| {
                match e.kind() {
                    StorybookerErrorKind::Storage(storage) if storage.is_not_found() => {
                        JobError::with_diagnostic(
                            JobErrorKind::Configuration,
                            format!("pinned character '{}' does not exist", id),
                            e.to_string(),
                        )
                    }
                    _ => collaborator(format!("could not load pinned character '{}'", id), &e),
                }
            })?;
            debug!(id = %id, name = %character.name, "Loaded pinned character");
            pinned.push(character);
        }
        Ok(pinned)
    }

    /// Invoke text generation, parsing inside the attempt so an unusable
    /// reply falls through to the next candidate.
    async fn invoke_text<T, P>(&self, request: &TextRequest, parse: P) -> Result<T, InvocationError>
    where
        P: Fn(&str) -> Result<T, JsonError> + Copy,
    {
        let report = self
            .services
            .invoker
            .invoke(
                CapabilityKind::TextGeneration,
                &self.text_order,
                self.services.text.timeout,
                |candidate: Arc<dyn TextGenerator>| {
                    let request = request.clone();
                    async move {
                        let response = candidate.generate(&request).await?;
                        parse(&response.text).map_err(|e| {
                            ProviderError::new(ProviderErrorKind::InvalidResponse(e.message))
                        })
                    }
                },
            )
            .await;
        debug!(label = %request.label, served_by = ?report.served_by, attempts = report.diagnostics.len(), "Text invocation finished");
        report.into_result()
    }

    /// Story in `language` with exactly the requested number of beats.
    async fn write_story(&self, language: &str, cast: &[Character]) -> Result<Story, JobError> {
        let pages = usize::from(self.request.num_pages);
        let request = story_request(&self.request.theme, pages, language, self.style, cast);
        let mut story = self
            .invoke_text(&request, parse_story)
            .await
            .map_err(|e| JobError::from_invocation(&e))?;

        if story.beats.len() < pages {
            return Err(JobError::new(
                JobErrorKind::ContractViolation,
                format!(
                    "requested {} pages but the story has {}",
                    pages,
                    story.beats.len()
                ),
            ));
        }
        if story.beats.len() > pages {
            info!(language, returned = story.beats.len(), kept = pages, "Truncating story");
            story.beats.truncate(pages);
        }
        Ok(story)
    }

    /// Render, post-process and store one image. Errors are reasons for a
    /// degraded asset.
    async fn render(
        &self,
        request: ImageRequest,
        config: ThresholdConfig,
        asset: &str,
    ) -> Result<PathBuf, String> {
        let report = self
            .services
            .invoker
            .invoke(
                CapabilityKind::ImageGeneration,
                &self.image_order,
                self.services.image.timeout,
                |candidate: Arc<dyn ImageGenerator>| {
                    let request = request.clone();
                    async move { candidate.generate_image(&request).await }
                },
            )
            .await;
        let image = report.outcome.map_err(|e| degraded_reason(&e))?;

        let processor = Arc::clone(&self.services.post_processor);
        let processed = tokio::task::spawn_blocking(move || processor.process(&image.bytes, &config))
            .await
            .map_err(|e| format!("post-processing task failed: {}", e))?
            .map_err(|e| e.to_string())?;

        self.services
            .assets
            .save_image(self.id(), asset, &processed)
            .await
            .map_err(|e| e.to_string())
    }

    async fn illustrate_cover(&self, story: &Story) -> Option<PathBuf> {
        let request = ImageRequest::new("cover", cover_prompt(story, self.style));
        let cover = match self.render(request, ThresholdConfig::scene(), "cover").await {
            Ok(path) => Some(path),
            Err(reason) => {
                self.reporter.degraded("cover", reason);
                None
            }
        };
        self.reporter
            .artifacts(|a| a.cover_image = cover.clone());
        cover
    }

    /// Extract, resolve and reference the roster; inject subjects into beats.
    async fn cast(&self, pinned: &[Character], story: &mut Story) -> Vec<Character> {
        let extracted = match self
            .invoke_text(&extraction_request(story), parse_characters)
            .await
        {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!(error = %e, "Character extraction failed, continuing with pinned characters");
                Vec::new()
            }
        };

        let mut roster = resolve(pinned, &extracted);
        let injected = inject_subjects(&mut story.beats, &roster);
        info!(roster = roster.len(), merges = roster.merges().len(), injected, "Roster resolved");

        self.reporter
            .step(milestones::REFERENCES, "Rendering character references");
        let needs_reference: Vec<Character> = roster
            .admitted()
            .filter(|c| c.reference_image_path.is_none())
            .cloned()
            .collect();
        for character in needs_reference {
            let seed = character
                .seed
                .unwrap_or_else(|| seed_for_name(&character.name));
            let request = ImageRequest::new(
                format!("reference_{}", character.id()),
                reference_prompt(&character, self.style),
            )
            .with_seed(seed);
            match self
                .render(request, self.services.reference_cutout, &character.id())
                .await
            {
                Ok(path) => {
                    roster.set_reference_image(&character.name, path);
                }
                Err(reason) => self
                    .reporter
                    .degraded(format!("{} reference image", character.name), reason),
            }
        }

        let characters = roster.characters();
        let names = characters.iter().map(|c| c.name.clone()).collect();
        self.reporter.artifacts(|a| a.characters = names);
        characters
    }

    async fn direct_beat(
        &self,
        index: usize,
        beat: &StoryBeat,
        reference: &str,
    ) -> (usize, Result<BeatPrompts, InvocationError>) {
        let request = art_direction_request(beat, self.style, reference);
        let result = self
            .invoke_text(&request, raw_reply)
            .await
            .map(|reply| parse_art_direction(&reply, beat));
        (index, result)
    }

    /// Prompts for every beat, in beat order.
    async fn direct_pages(
        &self,
        story: &Story,
        characters: &[Character],
    ) -> Result<Vec<BeatPrompts>, JobError> {
        let reference = format_roster_reference(characters);
        let total = story.beats.len();
        let beats: Vec<_> = story
            .beats
            .iter()
            .enumerate()
            .map(|(index, beat)| self.direct_beat(index, beat, &reference))
            .collect();
        let mut pending = stream::iter(beats).buffer_unordered(self.services.beat_concurrency.max(1));

        let mut slots: Vec<Option<BeatPrompts>> = vec![None; total];
        let mut done = 0;
        while let Some((index, result)) = pending.next().await {
            let prompts = result.map_err(|e| JobError::from_invocation(&e))?;
            slots[index] = Some(prompts);
            done += 1;
            self.reporter.advance(scaled(
                milestones::PROMPTS,
                milestones::PROMPTS_SPAN,
                done,
                total,
            ));
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| {
                    JobError::new(
                        JobErrorKind::ContractViolation,
                        format!("no prompts produced for page {}", index + 1),
                    )
                })
            })
            .collect()
    }

    async fn illustrate_beat(
        &self,
        index: usize,
        beat: &StoryBeat,
        prompts: &BeatPrompts,
        characters: &[Character],
    ) -> (usize, Result<PathBuf, String>) {
        let mut featured: Vec<&Character> = Vec::new();
        for subject in &beat.subjects {
            let Some(character) = match_character_to_subject(subject, characters) else {
                continue;
            };
            if !featured.iter().any(|c| c.same_name(&character.name)) {
                featured.push(character);
            }
        }

        let mut request = ImageRequest::new(
            format!("page_{}", index),
            page_image_prompt(prompts, &featured, self.style),
        );
        if let Some(first) = featured.first() {
            request = request.with_seed(first.seed.unwrap_or_else(|| seed_for_name(&first.name)));
        }

        let result = self
            .render(request, ThresholdConfig::scene(), &format!("page_{}", index))
            .await;
        (index, result)
    }

    /// Page images by beat index; failed pages stay empty.
    async fn illustrate_pages(
        &self,
        story: &Story,
        prompts: &[BeatPrompts],
        characters: &[Character],
    ) -> Vec<Option<PathBuf>> {
        let total = story.beats.len();
        let beats: Vec<_> = story
            .beats
            .iter()
            .zip(prompts)
            .enumerate()
            .map(|(index, (beat, prompts))| self.illustrate_beat(index, beat, prompts, characters))
            .collect();
        let mut pending = stream::iter(beats).buffer_unordered(self.services.beat_concurrency.max(1));

        let mut page_images: Vec<Option<PathBuf>> = vec![None; total];
        let mut done = 0;
        while let Some((index, result)) = pending.next().await {
            match result {
                Ok(path) => page_images[index] = Some(path),
                Err(reason) => self
                    .reporter
                    .degraded(format!("page {} image", index + 1), reason),
            }
            done += 1;
            self.reporter.advance(scaled(
                milestones::IMAGES,
                milestones::IMAGES_SPAN,
                done,
                total,
            ));
        }

        let recorded = page_images.clone();
        self.reporter.artifacts(|a| a.page_images = recorded);
        page_images
    }
}

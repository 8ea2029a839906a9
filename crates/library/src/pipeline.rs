// FILE: crates/library/src/pipeline.rs

//! Generation steps run against the open book
//!
//! Every step follows the same shape:
//!
//! 1. under the lock, check the precondition on the working copy, mark the
//!    step in flight and snapshot its inputs;
//! 2. call the provider with the lock released;
//! 3. under the lock again, merge the result into the working copy if it
//!    still belongs there, or record the failure on the step.
//!
//! A failing step only changes its own status. Nothing is retried.

use crate::session::{StepId, StepStatus};
use crate::storage::BlobStorage;
use crate::studio::Studio;
use bookstudio_core::{Book, Chapter, ChapterOutline, DataUri, Result, StudioError};
use futures::future::join_all;
use log::{debug, error, info, warn};
use std::future::Future;
use std::time::Duration;

/// How a step that did not fail ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Result merged into the working copy
    Applied,
    /// Nothing to do; the provider was not called
    Skipped,
    /// Result arrived for a session or inputs that are gone
    Discarded,
}

/// Result of one chapter inside a batch run
pub type ChapterRun = (usize, Result<StepOutcome>);

enum Prepared<T> {
    Run(T),
    Skip,
}

struct Ticket {
    step: StepId,
    epoch: u64,
}

/// False for a chapter step whose chapter is not in the book
fn step_exists(step: &StepId, book: &Book) -> bool {
    match step {
        StepId::ChapterContent(index) => *index < book.chapters.len(),
        _ => true,
    }
}

/// Timeout in seconds, rounded up so sub-second limits never read as 0
fn whole_seconds(limit: Duration) -> u64 {
    limit.as_secs() + u64::from(limit.subsec_nanos() > 0)
}

impl<S: BlobStorage> Studio<S> {
    fn begin_step<T>(
        &self,
        step: StepId,
        prepare: impl FnOnce(&Book) -> Result<Prepared<T>>,
    ) -> Result<Option<(Ticket, T)>> {
        let mut inner = self.lock();
        let session = inner.session.as_mut().ok_or(StudioError::NoActiveSession)?;

        if session.status(&step).is_in_flight() {
            return Err(StudioError::StepInFlight {
                step: step.to_string(),
            });
        }

        match prepare(session.book()) {
            Ok(Prepared::Run(input)) => {
                info!("Generating {} for book {}", step, session.book().id);
                session.set_status(step.clone(), StepStatus::InFlight);
                let epoch = session.epoch();
                Ok(Some((Ticket { step, epoch }, input)))
            }
            Ok(Prepared::Skip) => {
                debug!("Skipping {}: nothing to generate", step);
                session.set_status(step, StepStatus::Idle);
                Ok(None)
            }
            Err(e) => {
                debug!("Precondition failed for {}: {}", step, e);
                if step_exists(&step, session.book()) {
                    session.set_status(step, StepStatus::Failed(e.user_message()));
                }
                Err(e)
            }
        }
    }

    async fn call_provider<T, F>(&self, step: &StepId, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.step_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                StudioError::Timeout {
                    operation: step.to_string(),
                    seconds: whole_seconds(limit),
                }
            })?,
            None => call.await,
        }
    }

    fn finish_step<T>(
        &self,
        ticket: Ticket,
        result: Result<T>,
        merge: impl FnOnce(&mut Book, T) -> bool,
    ) -> Result<StepOutcome> {
        let mut inner = self.lock();
        let Some(session) = inner
            .session
            .as_mut()
            .filter(|s| s.epoch() == ticket.epoch)
        else {
            match result {
                Ok(_) => warn!("Discarding {} result: the book was closed", ticket.step),
                Err(e) => warn!("Ignoring {} failure after the book was closed: {}", ticket.step, e),
            }
            return Ok(StepOutcome::Discarded);
        };

        match result {
            Ok(value) => {
                session.set_status(ticket.step.clone(), StepStatus::Idle);
                if merge(session.book_mut(), value) {
                    info!("Applied {} to book {}", ticket.step, session.book().id);
                    Ok(StepOutcome::Applied)
                } else {
                    warn!("Discarding {} result: its inputs changed", ticket.step);
                    Ok(StepOutcome::Discarded)
                }
            }
            Err(e) => {
                error!("Generating {} failed: {}", ticket.step, e);
                session.set_status(ticket.step, StepStatus::Failed(e.user_message()));
                Err(e)
            }
        }
    }

    /// Replaces the chapter list with an outline generated from the premise
    pub async fn generate_outline(&self) -> Result<StepOutcome> {
        let Some((ticket, premise)) = self.begin_step(StepId::Outline, |book| {
            if book.premise.trim().is_empty() {
                return Err(StudioError::validation(
                    "premise",
                    "Please enter the book premise.",
                ));
            }
            Ok(Prepared::Run(book.premise.clone()))
        })?
        else {
            return Ok(StepOutcome::Skipped);
        };

        let result = self
            .call_provider(&ticket.step, self.provider.generate_outline(&premise))
            .await;

        self.finish_step(ticket, result, |book, outline| {
            book.chapters = outline.into_iter().map(Chapter::from).collect();
            true
        })
    }

    /// Writes the synopsis from the premise and the current outline
    pub async fn generate_synopsis(&self) -> Result<StepOutcome> {
        let Some((ticket, (premise, outline))) = self.begin_step(StepId::Synopsis, |book| {
            if book.chapters.is_empty() {
                return Err(StudioError::validation(
                    "chapters",
                    "Generate the chapter outline first.",
                ));
            }
            if book.premise.trim().is_empty() {
                return Err(StudioError::validation(
                    "premise",
                    "Please enter the book premise.",
                ));
            }
            let outline: Vec<ChapterOutline> =
                book.chapters.iter().map(ChapterOutline::from).collect();
            Ok(Prepared::Run((book.premise.clone(), outline)))
        })?
        else {
            return Ok(StepOutcome::Skipped);
        };

        let result = self
            .call_provider(
                &ticket.step,
                self.provider.generate_synopsis(&premise, &outline),
            )
            .await;

        self.finish_step(ticket, result, |book, synopsis| {
            book.synopsis = synopsis;
            true
        })
    }

    /// Writes the text of chapter `index`
    ///
    /// A chapter that already has content is skipped without calling the
    /// provider.
    pub async fn generate_chapter_content(&self, index: usize) -> Result<StepOutcome> {
        let step = StepId::ChapterContent(index);
        let Some((ticket, (title, summary))) = self.begin_step(step, |book| {
            let chapter = book.chapters.get(index).ok_or_else(|| {
                StudioError::validation(
                    "chapters",
                    format!("Chapter {} does not exist.", index + 1),
                )
            })?;
            if chapter.has_content() {
                return Ok(Prepared::Skip);
            }
            if chapter.title.trim().is_empty() && chapter.summary.trim().is_empty() {
                return Err(StudioError::validation(
                    "chapters",
                    format!("Chapter {} needs a title or summary.", index + 1),
                ));
            }
            Ok(Prepared::Run((chapter.title.clone(), chapter.summary.clone())))
        })?
        else {
            return Ok(StepOutcome::Skipped);
        };

        let result = self
            .call_provider(
                &ticket.step,
                self.provider.generate_chapter_content(&title, &summary),
            )
            .await
            .and_then(|content| {
                if content.is_empty() {
                    Err(StudioError::MalformedResponse {
                        details: "chapter text is empty".to_string(),
                    })
                } else {
                    Ok(content)
                }
            });

        self.finish_step(ticket, result, |book, content| {
            match book.chapters.get_mut(index) {
                Some(chapter)
                    if chapter.title == title
                        && chapter.summary == summary
                        && !chapter.has_content() =>
                {
                    chapter.content = Some(content);
                    true
                }
                _ => false,
            }
        })
    }

    /// Runs the content step for every chapter without content, concurrently
    pub async fn generate_missing_chapters(&self) -> Result<Vec<ChapterRun>> {
        let pending = self.with_session(|session| Ok(session.book().chapters_without_content()))?;
        info!("Generating content for {} chapters", pending.len());

        let runs = pending
            .into_iter()
            .map(|index| async move { (index, self.generate_chapter_content(index).await) });
        Ok(join_all(runs).await)
    }

    /// Generates a cover from the uploaded reference image and the title
    pub async fn generate_cover(&self) -> Result<StepOutcome> {
        let Some((ticket, (uploaded, image, title))) = self.begin_step(StepId::Cover, |book| {
            if book.title.trim().is_empty() {
                return Err(StudioError::validation(
                    "title",
                    "Give the book a title before generating a cover.",
                ));
            }
            let Some(uploaded) = book.uploaded_cover_image.clone() else {
                return Err(StudioError::validation(
                    "uploadedCoverImage",
                    "Upload a reference image first.",
                ));
            };
            let image = DataUri::parse(&uploaded)?;
            Ok(Prepared::Run((uploaded, image, book.title.clone())))
        })?
        else {
            return Ok(StepOutcome::Skipped);
        };

        let call = async {
            let png = self
                .provider
                .generate_cover_from_image(image.data(), image.mime_type(), &title)
                .await?;
            if png.is_empty() {
                return Err(StudioError::NoImageReturned);
            }
            Ok(png)
        };
        let result = self.call_provider(&ticket.step, call).await;

        self.finish_step(ticket, result, |book, png| {
            if book.uploaded_cover_image.as_deref() != Some(uploaded.as_str()) {
                return false;
            }
            book.cover_image_url = Some(DataUri::png(png).to_string());
            true
        })
    }
}

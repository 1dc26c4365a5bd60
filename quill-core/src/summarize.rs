use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{QuillError, Result};
use crate::models::Session;
use crate::pipeline::SummaryPipeline;
use crate::store::SessionStore;

#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub session: Session,
    pub summary_path: PathBuf,
}

/// Turns editor text into a new session: raw notes on disk, then the pipeline.
#[derive(Clone)]
pub struct Summarizer {
    store: SessionStore,
    pipeline: Arc<dyn SummaryPipeline>,
}

impl Summarizer {
    pub fn new(store: SessionStore, pipeline: Arc<dyn SummaryPipeline>) -> Self {
        Self { store, pipeline }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Blank text fails with `EmptyNotes` before anything touches the disk.
    /// A pipeline failure leaves the raw notes in place.
    pub async fn summarize(&self, text: &str, cancel: &CancellationToken) -> Result<SummaryOutcome> {
        if text.trim().is_empty() {
            return Err(QuillError::EmptyNotes);
        }

        let session = self.store.create_session()?;
        let raw_notes_path = self.store.write_raw_notes(&session, text)?;
        let summary_path = session.summary_path();

        if let Err(e) = self.pipeline.run(&raw_notes_path, &summary_path, cancel).await {
            tracing::warn!(session = %session, error = %e, "Summary not produced; raw notes kept");
            return Err(e);
        }

        tracing::info!(session = %session, summary = %summary_path.display(), "Summary saved");
        Ok(SummaryOutcome {
            session,
            summary_path,
        })
    }
}

//! Editor buffer with session preview.
//!
//! Selecting a past session swaps its stored content into the buffer. The
//! text the user was composing is kept as a draft and comes back with
//! [`SessionViewer::restore`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::document::DocumentReader;
use crate::error::Result;
use crate::models::{Artifact, Session};
use crate::store::SessionStore;

/// Which artifact a selected session displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Raw,
    Summary,
}

impl ViewMode {
    pub fn artifact(self) -> Artifact {
        match self {
            ViewMode::Raw => Artifact::RawNotes,
            ViewMode::Summary => Artifact::Summary,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Raw => ViewMode::Summary,
            ViewMode::Summary => ViewMode::Raw,
        }
    }
}

/// Source of session artifact text for previews.
#[async_trait]
pub trait ArtifactLoader: Send + Sync {
    async fn load(&self, session: &Session, artifact: Artifact) -> Result<String>;
}

/// Raw notes from the store, summaries through a [`DocumentReader`].
#[derive(Clone)]
pub struct StoreLoader {
    store: SessionStore,
    reader: Arc<dyn DocumentReader>,
}

impl StoreLoader {
    pub fn new(store: SessionStore, reader: Arc<dyn DocumentReader>) -> Self {
        Self { store, reader }
    }
}

#[async_trait]
impl ArtifactLoader for StoreLoader {
    async fn load(&self, session: &Session, artifact: Artifact) -> Result<String> {
        match artifact {
            Artifact::RawNotes => self.store.read_raw_notes(session),
            Artifact::Summary => self.reader.read(&session.summary_path()).await,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionViewer {
    mode: ViewMode,
    buffer: String,
    draft: String,
    previewing: Option<Session>,
}

impl SessionViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text currently displayed.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// The user's own notes, whether or not a preview is showing.
    pub fn draft(&self) -> &str {
        match self.previewing {
            Some(_) => &self.draft,
            None => &self.buffer,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn previewing(&self) -> Option<&Session> {
        self.previewing.as_ref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.end_preview_for_edit();
        self.buffer = text.into();
    }

    pub fn append_line(&mut self, line: &str) {
        self.end_preview_for_edit();
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(line);
    }

    pub fn clear(&mut self) {
        self.set_text(String::new());
    }

    /// Show `session` in the current mode. The draft is snapshotted on the
    /// first preview only, so hopping between sessions keeps the user's text.
    /// A failed load leaves the viewer unchanged.
    pub async fn select(&mut self, session: Session, loader: &dyn ArtifactLoader) -> Result<()> {
        let content = loader.load(&session, self.mode.artifact()).await?;
        if self.previewing.is_none() {
            self.draft = std::mem::take(&mut self.buffer);
        }
        tracing::debug!(session = %session, mode = ?self.mode, "Previewing session");
        self.buffer = content;
        self.previewing = Some(session);
        Ok(())
    }

    /// Flip between raw notes and summary, reloading the previewed session.
    /// If the reload fails the mode is not changed.
    pub async fn toggle(&mut self, loader: &dyn ArtifactLoader) -> Result<ViewMode> {
        let next = self.mode.toggled();
        if let Some(session) = &self.previewing {
            self.buffer = loader.load(session, next.artifact()).await?;
        }
        self.mode = next;
        Ok(next)
    }

    /// Bring the draft back and end the preview. No-op when not previewing.
    pub fn restore(&mut self) {
        if self.previewing.take().is_some() {
            self.buffer = std::mem::take(&mut self.draft);
        }
    }

    // Editing a preview adopts it as the new draft.
    fn end_preview_for_edit(&mut self) {
        if self.previewing.take().is_some() {
            self.draft.clear();
        }
    }
}

pub mod config;
pub mod document;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod summarize;
pub mod viewer;

pub use config::{QuillConfig, SessionOrder};
pub use document::{CommandDocumentReader, DocumentReader};
pub use error::{QuillError, Result};
pub use models::{Artifact, Session, SessionName};
pub use pipeline::{CommandPipeline, SummaryPipeline};
pub use store::SessionStore;
pub use summarize::{SummaryOutcome, Summarizer};
pub use viewer::{ArtifactLoader, SessionViewer, StoreLoader, ViewMode};

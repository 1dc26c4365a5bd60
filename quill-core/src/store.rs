//! Session folders on disk.
//!
//! Layout: `<root>/session_<YYYY-MM-DD>_<n>/{raw_notes.txt,summary.docx}`.
//! The sequence number is derived from the folders already present for the
//! day, so two processes creating sessions at once can race.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::config::SessionOrder;
use crate::error::{QuillError, Result};
use crate::models::{Artifact, Session, SessionName};

#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
    order: SessionOrder,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            order: SessionOrder::default(),
        }
    }

    pub fn with_order(mut self, order: SessionOrder) -> Self {
        self.order = order;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a new session folder for today's local date.
    pub fn create_session(&self) -> Result<Session> {
        self.create_session_on(Local::now().date_naive())
    }

    /// Allocate a new session folder for `date`.
    ///
    /// The sequence number starts at one past the number of same-day folders.
    /// If that name is taken (a folder was removed by hand, leaving a gap),
    /// it is advanced until `create_dir` succeeds, so an existing folder is
    /// never reused.
    pub fn create_session_on(&self, date: NaiveDate) -> Result<Session> {
        fs::create_dir_all(&self.root)?;

        let prefix = SessionName::day_prefix(date);
        let same_day = self
            .folder_names()?
            .into_iter()
            .filter(|name| name.starts_with(&prefix))
            .count();

        let mut seq = same_day as u32 + 1;
        loop {
            let name = SessionName::new(date, seq);
            let path = self.root.join(name.to_string());
            match fs::create_dir(&path) {
                Ok(()) => {
                    tracing::info!(session = %name, path = %path.display(), "Created session");
                    return Ok(Session {
                        folder_name: name.to_string(),
                        name: Some(name),
                        path,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(session = %name, "Session folder taken, advancing sequence");
                    seq += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// All session folders under the root, in the configured order.
    /// A missing root lists as empty.
    pub fn list_sessions(&self) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .folder_names()?
            .into_iter()
            .filter_map(|name| Session::from_path(&self.root.join(name)))
            .collect();

        match self.order {
            SessionOrder::Lexical => {
                sessions.sort_by(|a, b| a.folder_name.cmp(&b.folder_name));
            }
            SessionOrder::Chronological => sessions.sort_by(|a, b| match (&a.name, &b.name) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.folder_name.cmp(&b.folder_name),
            }),
        }

        Ok(sessions)
    }

    /// Look up a session by its folder name.
    pub fn find(&self, folder_name: &str) -> Result<Session> {
        let is_plain_name = !folder_name.is_empty()
            && folder_name != "."
            && folder_name != ".."
            && !folder_name.contains(['/', '\\']);
        if !is_plain_name {
            return Err(QuillError::SessionNotFound(folder_name.to_string()));
        }

        let path = self.root.join(folder_name);
        if !path.is_dir() {
            return Err(QuillError::SessionNotFound(folder_name.to_string()));
        }
        Session::from_path(&path).ok_or_else(|| QuillError::SessionNotFound(folder_name.to_string()))
    }

    /// Resolve a 1-based position in `list_sessions` or a folder name.
    pub fn select(&self, selector: &str) -> Result<Session> {
        if let Ok(index) = selector.parse::<usize>() {
            let sessions = self.list_sessions()?;
            return index
                .checked_sub(1)
                .and_then(|i| sessions.into_iter().nth(i))
                .ok_or_else(|| QuillError::SessionNotFound(selector.to_string()));
        }
        self.find(selector)
    }

    /// Write `text` verbatim as the session's raw notes.
    pub fn write_raw_notes(&self, session: &Session, text: &str) -> Result<PathBuf> {
        let path = session.raw_notes_path();
        fs::write(&path, text)?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "Raw notes written");
        Ok(path)
    }

    pub fn read_raw_notes(&self, session: &Session) -> Result<String> {
        let path = session.artifact_path(Artifact::RawNotes);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(QuillError::ArtifactMissing(path)),
            Err(e) => Err(e.into()),
        }
    }

    fn folder_names(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            // Follows symlinks, so a linked-in session folder is listed too.
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

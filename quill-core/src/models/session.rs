use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

pub const SESSION_PREFIX: &str = "session_";
pub const RAW_NOTES_FILE: &str = "raw_notes.txt";
pub const SUMMARY_FILE: &str = "summary.docx";

/// Parsed `session_<YYYY-MM-DD>_<n>` folder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionName {
    pub date: NaiveDate,
    pub seq: u32,
}

impl SessionName {
    pub fn new(date: NaiveDate, seq: u32) -> Self {
        Self { date, seq }
    }

    /// Folder-name prefix shared by every session of `date`.
    pub fn day_prefix(date: NaiveDate) -> String {
        format!("{}{}_", SESSION_PREFIX, date.format("%Y-%m-%d"))
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::day_prefix(self.date), self.seq)
    }
}

impl PartialOrd for SessionName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SessionName {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.date, self.seq).cmp(&(other.date, other.seq))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSessionNameError(pub String);

impl fmt::Display for ParseSessionNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a session folder name: {}", self.0)
    }
}

impl std::error::Error for ParseSessionNameError {}

impl FromStr for SessionName {
    type Err = ParseSessionNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSessionNameError(s.to_string());
        let rest = s.strip_prefix(SESSION_PREFIX).ok_or_else(err)?;
        let (date, seq) = rest.rsplit_once('_').ok_or_else(err)?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| err())?;
        // Leading zeros or signs would break the format/parse round trip.
        if seq.is_empty() || seq.starts_with('0') || !seq.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let seq: u32 = seq.parse().map_err(|_| err())?;
        Ok(Self { date, seq })
    }
}

/// The two files a session may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    RawNotes,
    Summary,
}

impl Artifact {
    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::RawNotes => RAW_NOTES_FILE,
            Artifact::Summary => SUMMARY_FILE,
        }
    }
}

/// A session folder on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub folder_name: String,
    /// `None` for folders under the root that do not follow the naming scheme.
    pub name: Option<SessionName>,
    pub path: PathBuf,
}

impl Session {
    pub fn from_path(path: &Path) -> Option<Self> {
        let folder_name = path.file_name()?.to_str()?.to_string();
        Some(Self {
            name: folder_name.parse().ok(),
            folder_name,
            path: path.to_path_buf(),
        })
    }

    pub fn artifact_path(&self, artifact: Artifact) -> PathBuf {
        self.path.join(artifact.file_name())
    }

    pub fn raw_notes_path(&self) -> PathBuf {
        self.artifact_path(Artifact::RawNotes)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.artifact_path(Artifact::Summary)
    }

    pub fn has(&self, artifact: Artifact) -> bool {
        self.artifact_path(artifact).is_file()
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.folder_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_display_matches_folder_scheme() {
        let name = SessionName::new(date(2024, 3, 7), 2);
        assert_eq!(name.to_string(), "session_2024-03-07_2");
    }

    #[test]
    fn test_parse_accepts_created_names() {
        let name: SessionName = "session_2024-03-07_12".parse().unwrap();
        assert_eq!(name.date, date(2024, 3, 7));
        assert_eq!(name.seq, 12);
    }

    #[test]
    fn test_parse_rejects_foreign_folders() {
        for bad in [
            "notes",
            "session_",
            "session_2024-03-07",
            "session_2024-03-07_",
            "session_2024-13-07_1",
            "session_2024-03-07_x",
            "session_2024-03-07_01",
            "session_2024-03-07_+1",
        ] {
            assert!(bad.parse::<SessionName>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_numeric_order_puts_ten_after_two() {
        let two = SessionName::new(date(2024, 3, 7), 2);
        let ten = SessionName::new(date(2024, 3, 7), 10);
        assert!(two < ten);
        // Folder names alone sort the other way.
        assert!(ten.to_string() < two.to_string());
    }

    #[test]
    fn test_artifact_paths_stay_inside_session_folder() {
        let session = Session::from_path(Path::new("/data/sessions/session_2024-03-07_1")).unwrap();
        assert_eq!(session.name, Some(SessionName::new(date(2024, 3, 7), 1)));
        assert_eq!(
            session.raw_notes_path(),
            PathBuf::from("/data/sessions/session_2024-03-07_1/raw_notes.txt")
        );
        assert_eq!(
            session.summary_path(),
            PathBuf::from("/data/sessions/session_2024-03-07_1/summary.docx")
        );
    }
}

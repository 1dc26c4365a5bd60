//! Reading a stored summary back as plain text.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::ConverterConfig;
use crate::error::{QuillError, Result};
use crate::pipeline::check_status;

pub const STAGE_READER: &str = "reader";

#[async_trait]
pub trait DocumentReader: Send + Sync {
    async fn read(&self, path: &Path) -> Result<String>;
}

/// Runs the converter as `<program> <path> <read_args..>` and returns its stdout.
#[derive(Debug, Clone)]
pub struct CommandDocumentReader {
    converter: ConverterConfig,
}

impl CommandDocumentReader {
    pub fn new(converter: ConverterConfig) -> Self {
        Self { converter }
    }
}

#[async_trait]
impl DocumentReader for CommandDocumentReader {
    async fn read(&self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(QuillError::ArtifactMissing(path.to_path_buf()));
        }

        let output = Command::new(&self.converter.program)
            .arg(path)
            .args(&self.converter.read_args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| QuillError::Spawn {
                program: self.converter.program.clone(),
                source,
            })?;
        check_status(STAGE_READER, &output)?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

//! External summarization pipeline.
//!
//! Two stages, run one after the other:
//! - **llm**: `<program> <args..> <model> <prompt>` reading the raw notes on stdin
//! - **converter**: `<program> <args..> <output_flag> <summary>` reading the llm output on stdin
//!
//! With the default config this is
//! `ollama run <model> "<prompt>" < raw_notes.txt | pandoc -o summary.docx`.

use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::config::{ConverterConfig, LlmConfig, QuillConfig};
use crate::error::{QuillError, Result};

pub const STAGE_LLM: &str = "llm";
pub const STAGE_CONVERTER: &str = "converter";

/// Produces a summary document from a raw-notes file.
#[async_trait]
pub trait SummaryPipeline: Send + Sync {
    /// On success the summary file exists at `summary_path`.
    async fn run(
        &self,
        raw_notes_path: &Path,
        summary_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

/// Runs the configured language-model and converter commands.
#[derive(Debug, Clone)]
pub struct CommandPipeline {
    llm: LlmConfig,
    converter: ConverterConfig,
    timeout: Option<Duration>,
}

impl CommandPipeline {
    pub fn new(llm: LlmConfig, converter: ConverterConfig) -> Self {
        Self {
            llm,
            converter,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &QuillConfig) -> Self {
        Self::new(config.llm.clone(), config.converter.clone())
            .with_timeout(config.pipeline.timeout_seconds.map(Duration::from_secs))
    }

    fn llm_command(&self, raw_notes: std::fs::File) -> Command {
        let mut cmd = Command::new(&self.llm.program);
        cmd.args(&self.llm.args)
            .arg(&self.llm.model)
            .arg(&self.llm.prompt)
            .stdin(Stdio::from(raw_notes))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn converter_command(&self, summary_path: &Path) -> Command {
        let mut cmd = Command::new(&self.converter.program);
        cmd.args(&self.converter.args)
            .arg(&self.converter.output_flag)
            .arg(summary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run_stages(&self, raw_notes_path: &Path, summary_path: &Path) -> Result<()> {
        let raw_notes = std::fs::File::open(raw_notes_path)?;

        tracing::debug!(program = %self.llm.program, model = %self.llm.model, "Starting llm stage");
        let llm_output = self
            .llm_command(raw_notes)
            .output()
            .await
            .map_err(|source| QuillError::Spawn {
                program: self.llm.program.clone(),
                source,
            })?;
        check_status(STAGE_LLM, &llm_output)?;

        tracing::debug!(
            program = %self.converter.program,
            bytes = llm_output.stdout.len(),
            "Starting converter stage"
        );
        let converter_output = feed_stdin(
            self.converter_command(summary_path),
            &self.converter.program,
            &llm_output.stdout,
        )
        .await?;
        check_status(STAGE_CONVERTER, &converter_output)?;

        Ok(())
    }
}

#[async_trait]
impl SummaryPipeline for CommandPipeline {
    async fn run(
        &self,
        raw_notes_path: &Path,
        summary_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let stages = async {
            match self.timeout {
                Some(limit) => {
                    match tokio::time::timeout(limit, self.run_stages(raw_notes_path, summary_path))
                        .await
                    {
                        Ok(res) => res,
                        Err(_) => Err(QuillError::TimedOut {
                            seconds: limit.as_secs(),
                        }),
                    }
                }
                None => self.run_stages(raw_notes_path, summary_path).await,
            }
        };

        // Dropping the stage future kills any running child.
        let result = tokio::select! {
            res = stages => res,
            _ = cancel.cancelled() => Err(QuillError::Cancelled),
        };

        match &result {
            Ok(()) => tracing::info!(summary = %summary_path.display(), "Summary pipeline complete"),
            Err(e) => tracing::warn!(error = %e, "Summary pipeline failed"),
        }
        result
    }
}

/// Spawn `cmd`, write `input` to its stdin and collect the output.
///
/// Stdin is written while stdout and stderr are drained, so a child that
/// logs heavily before consuming its input cannot fill a pipe and stall.
pub(crate) async fn feed_stdin(mut cmd: Command, program: &str, input: &[u8]) -> Result<Output> {
    let mut child = cmd.spawn().map_err(|source| QuillError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let stdin = child.stdin.take();
    let write = async move {
        if let Some(mut stdin) = stdin {
            // A converter that exits early closes the pipe; its exit status tells the story.
            if let Err(e) = stdin.write_all(input).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e);
                }
            }
        }
        Ok::<(), std::io::Error>(())
    };

    let (written, output) = tokio::join!(write, child.wait_with_output());
    let output = output?;
    written?;
    Ok(output)
}

pub(crate) fn check_status(stage: &'static str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(QuillError::PipelineFailed {
        stage,
        status: output.status,
        stderr,
    })
}

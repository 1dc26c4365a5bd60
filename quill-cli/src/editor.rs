//! Line-oriented editor: plain lines append to the notes, `:` lines are commands.

use std::io::Write;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::mpsc;

use quill_core::{QuillError, SessionViewer, ViewMode};

use crate::{write_sessions, App};

const HELP: &str = "\
Type notes line by line. Commands:
  :summarize      save the current text as a new session and summarize it
  :list           list sessions
  :open <n|name>  preview a session (raw notes or summary, see :toggle)
  :toggle         switch previews between raw notes and summary
  :restore        return to your own notes after previewing
  :show           print the current text
  :clear          empty the current text
  :help           this message
  :quit           exit
Start a line with '::' to type a literal ':'.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EditorCommand {
    Text(String),
    Summarize,
    List,
    Open(String),
    Toggle,
    Restore,
    Show,
    Clear,
    Help,
    Quit,
    Unknown(String),
}

impl EditorCommand {
    pub fn parse(line: &str) -> Self {
        if let Some(literal) = line.strip_prefix("::") {
            return EditorCommand::Text(format!(":{}", literal));
        }
        let Some(command) = line.strip_prefix(':') else {
            return EditorCommand::Text(line.to_string());
        };

        let mut parts = command.trim().splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or("");
        let arg = parts.next().map(str::trim).unwrap_or("");
        match name {
            "summarize" | "s" => EditorCommand::Summarize,
            "list" | "ls" => EditorCommand::List,
            "open" | "o" if !arg.is_empty() => EditorCommand::Open(arg.to_string()),
            "toggle" | "t" => EditorCommand::Toggle,
            "restore" | "r" => EditorCommand::Restore,
            "show" => EditorCommand::Show,
            "clear" => EditorCommand::Clear,
            "help" | "h" | "?" => EditorCommand::Help,
            "quit" | "q" | "exit" => EditorCommand::Quit,
            _ => EditorCommand::Unknown(command.trim().to_string()),
        }
    }
}

fn prompt(viewer: &SessionViewer) -> String {
    match viewer.previewing() {
        Some(session) => {
            let mode = match viewer.mode() {
                ViewMode::Raw => "raw",
                ViewMode::Summary => "summary",
            };
            format!("[{} {}] >> ", session, mode)
        }
        None => ">> ".to_string(),
    }
}

fn write_buffer(out: &mut impl Write, viewer: &SessionViewer) -> std::io::Result<()> {
    let text = viewer.text();
    if text.is_empty() {
        writeln!(out, "(empty)")
    } else {
        writeln!(out, "{}", text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

/// Apply one editor command to `viewer`, writing feedback to `out`.
///
/// Command failures are reported on `out` and the editor keeps going; only
/// I/O errors on `out` or the sessions root end the loop.
pub(crate) async fn handle<W: Write>(
    app: &App,
    viewer: &mut SessionViewer,
    command: EditorCommand,
    out: &mut W,
) -> anyhow::Result<Flow> {
    match command {
        EditorCommand::Text(text) => viewer.append_line(&text),
        EditorCommand::Summarize => {
            writeln!(out, "Summarizing… (Ctrl+C to cancel)")?;
            out.flush()?;
            match app.summarize(viewer.text()).await {
                Ok(outcome) => {
                    writeln!(out, "Summary saved to:\n{}", outcome.summary_path.display())?;
                    write_sessions(out, &app.store().list_sessions()?)?;
                }
                Err(QuillError::EmptyNotes) => writeln!(out, "Error: No text entered!")?,
                Err(e) => writeln!(out, "Error: {}", e)?,
            }
        }
        EditorCommand::List => write_sessions(out, &app.store().list_sessions()?)?,
        EditorCommand::Open(selector) => {
            let opened = match app.store().select(&selector) {
                Ok(session) => viewer.select(session, &app.loader).await,
                Err(e) => Err(e),
            };
            match opened {
                Ok(()) => write_buffer(out, viewer)?,
                Err(e) => writeln!(out, "Error: {}", e)?,
            }
        }
        EditorCommand::Toggle => match viewer.toggle(&app.loader).await {
            Ok(mode) => {
                writeln!(out, "Viewing {:?}", mode)?;
                if viewer.previewing().is_some() {
                    write_buffer(out, viewer)?;
                }
            }
            Err(e) => writeln!(out, "Error: {}", e)?,
        },
        EditorCommand::Restore => {
            viewer.restore();
            write_buffer(out, viewer)?;
        }
        EditorCommand::Show => write_buffer(out, viewer)?,
        EditorCommand::Clear => viewer.clear(),
        EditorCommand::Help => writeln!(out, "{}", HELP)?,
        EditorCommand::Quit => return Ok(Flow::Quit),
        EditorCommand::Unknown(name) => writeln!(out, "Unknown command ':{}' (try :help)", name)?,
    }
    Ok(Flow::Continue)
}

enum Input {
    Line(String),
    Interrupted,
    Eof,
    Failed(String),
}

/// Line editing blocks, so it gets its own thread. Each prompt sent in
/// yields exactly one `Input` back; dropping the prompt sender ends the thread.
fn spawn_reader() -> (mpsc::Sender<String>, mpsc::Receiver<Input>) {
    let (prompt_tx, mut prompt_rx) = mpsc::channel::<String>(1);
    let (input_tx, input_rx) = mpsc::channel(1);

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                let _ = input_tx.blocking_send(Input::Failed(e.to_string()));
                return;
            }
        };
        while let Some(prompt) = prompt_rx.blocking_recv() {
            let input = match rl.readline(&prompt) {
                Ok(line) => {
                    if !matches!(EditorCommand::parse(&line), EditorCommand::Text(_)) {
                        let _ = rl.add_history_entry(line.as_str());
                    }
                    Input::Line(line)
                }
                Err(ReadlineError::Interrupted) => Input::Interrupted,
                Err(ReadlineError::Eof) => Input::Eof,
                Err(e) => Input::Failed(e.to_string()),
            };
            if input_tx.blocking_send(input).is_err() {
                break;
            }
        }
    });

    (prompt_tx, input_rx)
}

/// Run the interactive editor until `:quit` or end of input.
pub(crate) async fn run(app: &App) -> anyhow::Result<()> {
    let mut viewer = SessionViewer::new();
    let mut out = std::io::stdout();

    writeln!(out, "Quill — {}", app.store().root().display())?;
    writeln!(out, "Type ':help' for commands.")?;

    let (prompts, mut inputs) = spawn_reader();
    loop {
        if prompts.send(prompt(&viewer)).await.is_err() {
            break;
        }
        let line = match inputs.recv().await {
            Some(Input::Line(line)) => line,
            Some(Input::Interrupted) => {
                writeln!(out, "(use :quit to exit)")?;
                continue;
            }
            Some(Input::Eof) | None => break,
            Some(Input::Failed(e)) => anyhow::bail!("line editor failed: {}", e),
        };

        if handle(app, &mut viewer, EditorCommand::parse(&line), &mut out).await? == Flow::Quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lines_are_text() {
        assert_eq!(
            EditorCommand::parse("  indented note"),
            EditorCommand::Text("  indented note".to_string())
        );
        assert_eq!(EditorCommand::parse(""), EditorCommand::Text(String::new()));
    }

    #[test]
    fn test_double_colon_escapes_text() {
        assert_eq!(
            EditorCommand::parse("::Definition: osmosis"),
            EditorCommand::Text(":Definition: osmosis".to_string())
        );
    }

    #[test]
    fn test_commands_and_aliases() {
        assert_eq!(EditorCommand::parse(":summarize"), EditorCommand::Summarize);
        assert_eq!(EditorCommand::parse(":s"), EditorCommand::Summarize);
        assert_eq!(EditorCommand::parse(":ls"), EditorCommand::List);
        assert_eq!(EditorCommand::parse(": toggle "), EditorCommand::Toggle);
        assert_eq!(EditorCommand::parse(":restore"), EditorCommand::Restore);
        assert_eq!(EditorCommand::parse(":q"), EditorCommand::Quit);
    }

    #[test]
    fn test_open_takes_selector() {
        assert_eq!(
            EditorCommand::parse(":open 3"),
            EditorCommand::Open("3".to_string())
        );
        assert_eq!(
            EditorCommand::parse(":o  session_2024-05-01_2 "),
            EditorCommand::Open("session_2024-05-01_2".to_string())
        );
        assert_eq!(
            EditorCommand::parse(":open"),
            EditorCommand::Unknown("open".to_string())
        );
    }

    #[test]
    fn test_prompt_without_preview() {
        let viewer = SessionViewer::new();
        assert_eq!(prompt(&viewer), ">> ");
    }
    #[cfg(unix)]
    mod dispatch {
        use super::super::*;
        use quill_core::config::{ConverterConfig, LlmConfig, StorageConfig};
        use quill_core::QuillConfig;

        // `cat` stands in for the model; the converter copies stdin to the output path.
        fn test_app(root: &std::path::Path) -> App {
            let config = QuillConfig {
                storage: StorageConfig {
                    root_dir: Some(root.display().to_string()),
                    ..Default::default()
                },
                llm: LlmConfig {
                    program: "sh".to_string(),
                    args: vec!["-c".to_string(), "cat".to_string(), "llm".to_string()],
                    ..Default::default()
                },
                converter: ConverterConfig {
                    program: "sh".to_string(),
                    args: vec!["-c".to_string(), r#"cat > "$2""#.to_string(), "conv".to_string()],
                    ..Default::default()
                },
                ..Default::default()
            };
            App::from_config(&config).unwrap()
        }

        async fn send(app: &App, viewer: &mut SessionViewer, line: &str) -> (Flow, String) {
            let mut out = Vec::new();
            let flow = handle(app, viewer, EditorCommand::parse(line), &mut out)
                .await
                .unwrap();
            (flow, String::from_utf8(out).unwrap())
        }

        #[tokio::test]
        async fn test_summarize_refreshes_listing_and_keeps_text() {
            let dir = tempfile::tempdir().unwrap();
            let app = test_app(dir.path());
            let mut viewer = SessionViewer::new();

            send(&app, &mut viewer, "mitochondria make ATP").await;
            send(&app, &mut viewer, "::Definition: organelle").await;
            let (flow, out) = send(&app, &mut viewer, ":summarize").await;

            assert_eq!(flow, Flow::Continue);
            let sessions = app.store().list_sessions().unwrap();
            assert_eq!(sessions.len(), 1);
            let folder = &sessions[0].folder_name;
            assert!(out.contains("Summary saved to:"), "{out}");
            assert!(out.contains(&format!("  1  {}\n", folder)), "{out}");
            assert!(!out.contains("(no summary)"), "{out}");

            assert_eq!(viewer.text(), "mitochondria make ATP\n:Definition: organelle");
            assert_eq!(
                std::fs::read_to_string(sessions[0].summary_path()).unwrap(),
                viewer.text()
            );

            // A second run lists both sessions.
            let (_, out) = send(&app, &mut viewer, ":s").await;
            assert!(out.contains("  2  "), "{out}");
            assert_eq!(app.store().list_sessions().unwrap().len(), 2);
        }

        #[tokio::test]
        async fn test_summarize_without_text_reports_and_creates_nothing() {
            let dir = tempfile::tempdir().unwrap();
            let app = test_app(dir.path());
            let mut viewer = SessionViewer::new();

            send(&app, &mut viewer, "   ").await;
            let (flow, out) = send(&app, &mut viewer, ":summarize").await;

            assert_eq!(flow, Flow::Continue);
            assert_eq!(out.lines().last(), Some("Error: No text entered!"));
            assert!(app.store().list_sessions().unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_open_then_restore_returns_draft() {
            let dir = tempfile::tempdir().unwrap();
            let app = test_app(dir.path());
            let session = app.store().create_session().unwrap();
            app.store().write_raw_notes(&session, "old notes").unwrap();
            let mut viewer = SessionViewer::new();

            send(&app, &mut viewer, "new draft").await;
            let (_, out) = send(&app, &mut viewer, ":open 1").await;
            assert_eq!(out, "old notes\n");
            assert_eq!(viewer.previewing(), Some(&session));
            assert_eq!(prompt(&viewer), format!("[{} raw] >> ", session));

            let (_, out) = send(&app, &mut viewer, ":open 7").await;
            assert!(out.starts_with("Error: "), "{out}");
            assert_eq!(viewer.text(), "old notes");

            let (_, out) = send(&app, &mut viewer, ":restore").await;
            assert_eq!(out, "new draft\n");
            assert!(viewer.previewing().is_none());
        }

        #[tokio::test]
        async fn test_quit_and_unknown_commands() {
            let dir = tempfile::tempdir().unwrap();
            let app = test_app(dir.path());
            let mut viewer = SessionViewer::new();

            let (flow, out) = send(&app, &mut viewer, ":frobnicate").await;
            assert_eq!(flow, Flow::Continue);
            assert_eq!(out, "Unknown command ':frobnicate' (try :help)\n");

            let (flow, out) = send(&app, &mut viewer, ":quit").await;
            assert_eq!(flow, Flow::Quit);
            assert!(out.is_empty());
        }
    }
}

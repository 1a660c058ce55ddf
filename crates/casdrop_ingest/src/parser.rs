//! Statement parser seam and the external-program implementation.

use crate::config::ParserConfig;
use crate::error::ParseError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

const OUTPUT_FILE_NAME: &str = "statement.json";
const MAX_STDERR_CHARS: usize = 2000;

/// Turns an encrypted statement into its structured (JSON) document form.
#[async_trait]
pub trait StatementParser: Send + Sync {
    async fn parse(&self, path: &Path, password: &str) -> Result<serde_json::Value, ParseError>;
}

/// Runs an external CAS parser program once per statement.
///
/// Invocation: `<program> <extra_args..> -o <scratch>/statement.json <file>`.
/// The password is written to the child's stdin followed by a newline, where
/// casparser's password prompt reads it. It never appears in the argv.
/// The program must write a JSON object to the output path and exit 0.
#[derive(Debug, Clone)]
pub struct CommandParser {
    program: String,
    extra_args: Vec<String>,
}

impl CommandParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            program: config.program.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, path: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.extra_args)
            .arg("-o")
            .arg(output)
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl StatementParser for CommandParser {
    async fn parse(&self, path: &Path, password: &str) -> Result<serde_json::Value, ParseError> {
        let scratch = tempfile::Builder::new().prefix("casdrop-").tempdir()?;
        let output_path = scratch.path().join(OUTPUT_FILE_NAME);

        debug!(program = %self.program, file = %path.display(), "Running statement parser");
        let mut child = self
            .command(path, &output_path)
            .spawn()
            .map_err(|e| ParseError::Spawn {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            let line = format!("{password}\n");
            match stdin.write_all(line.as_bytes()).await {
                // The parser may exit without reading its prompt.
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e.into()),
                _ => {}
            }
        }

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(ParseError::Failed {
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        let bytes = match tokio::fs::read(&output_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ParseError::Rejected(
                    "parser exited successfully but wrote no output".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let document: serde_json::Value = serde_json::from_slice(&bytes)?;
        if !document.is_object() {
            return Err(ParseError::Rejected(
                "parser output is not a JSON object".to_string(),
            ));
        }
        Ok(document)
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= MAX_STDERR_CHARS {
        return text.to_string();
    }
    text.chars().skip(count - MAX_STDERR_CHARS).collect()
}

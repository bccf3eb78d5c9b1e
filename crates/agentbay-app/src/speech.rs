// Voice search through an external speech-to-text command.
//
// The command prints the transcript so far on stdout, one line per update.
// Each line replaces the chat input while listening is on.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use agentbay_core::config::SpeechConfig;

/// Environment variable carrying the configured recognition language.
pub const LANGUAGE_ENV: &str = "AGENTBAY_SPEECH_LANG";

#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    Transcript { text: String, generation: u64 },
    /// The command exited on its own.
    Ended { generation: u64 },
    Failed { message: String, generation: u64 },
}

impl SpeechEvent {
    pub fn generation(&self) -> u64 {
        match self {
            SpeechEvent::Transcript { generation, .. }
            | SpeechEvent::Ended { generation }
            | SpeechEvent::Failed { generation, .. } => *generation,
        }
    }
}

pub enum SpeechInput {
    Command {
        program: String,
        args: Vec<String>,
        language: String,
    },
    /// No command configured; voice search is unsupported.
    Disabled,
}

impl SpeechInput {
    pub fn from_config(config: &SpeechConfig) -> Self {
        match config.command.split_first() {
            Some((program, args)) if !program.trim().is_empty() => SpeechInput::Command {
                program: program.clone(),
                args: args.to_vec(),
                language: config.language.clone(),
            },
            _ => SpeechInput::Disabled,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, SpeechInput::Command { .. })
    }

    /// Run the command and forward each stdout line as a transcript until it
    /// exits or the receiver goes away. Dropping the future kills the child.
    pub async fn listen(&self, tx: mpsc::Sender<SpeechEvent>, generation: u64) {
        let SpeechInput::Command {
            program,
            args,
            language,
        } = self
        else {
            let _ = tx
                .send(SpeechEvent::Failed {
                    message: "speech input not configured".to_string(),
                    generation,
                })
                .await;
            return;
        };

        let mut child = match Command::new(program)
            .args(args)
            .env(LANGUAGE_ENV, language)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!("failed to start speech command `{}`: {}", program, e);
                let _ = tx
                    .send(SpeechEvent::Failed {
                        message: format!("failed to start `{program}`: {e}"),
                        generation,
                    })
                    .await;
                return;
            }
        };
        info!("speech command `{}` started", program);

        let Some(stdout) = child.stdout.take() else {
            let _ = tx
                .send(SpeechEvent::Failed {
                    message: "speech command has no stdout".to_string(),
                    generation,
                })
                .await;
            return;
        };

        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let text = line.trim().to_string();
                    if text.is_empty() {
                        continue;
                    }
                    debug!(generation, "transcript: {}", text);
                    if tx
                        .send(SpeechEvent::Transcript { text, generation })
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let _ = tx
                        .send(SpeechEvent::Failed {
                            message: format!("failed to read transcript: {e}"),
                            generation,
                        })
                        .await;
                    return;
                }
            }
        }

        match child.wait().await {
            Ok(status) if !status.success() => {
                warn!("speech command exited with {}", status);
            }
            Err(e) => warn!("failed to wait for speech command: {}", e),
            Ok(_) => {}
        }
        let _ = tx.send(SpeechEvent::Ended { generation }).await;
    }
}

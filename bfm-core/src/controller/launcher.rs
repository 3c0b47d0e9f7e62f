//! ``src/controller/launcher.rs``
//!
//! # `ProcessLauncher`: spawn-and-report external actions
//!
//! Each request runs on its own tokio task. The child gets the session's
//! directory as its working directory, the target path as its last argument
//! and in `BFM_PATH`, a null stdin and a null stdout. Stderr is drained line
//! by line keeping only the last non-blank line. When the child exits a
//! [`LaunchReport`] goes back to the event loop; a non-zero status carries
//! that line.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::controller::collaborators::{LaunchReport, LaunchRequest, Launcher};
use crate::error::AppError;
use crate::fs::resolver::expand_home;

pub const TARGET_ENV: &str = "BFM_PATH";

#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    report_tx: UnboundedSender<LaunchReport>,
}

impl ProcessLauncher {
    /// Create a launcher and the receiver its reports arrive on.
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<LaunchReport>) {
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        (Self { report_tx }, report_rx)
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&self, request: LaunchRequest) {
        let report_tx: UnboundedSender<LaunchReport> = self.report_tx.clone();

        tokio::spawn(async move {
            let result: Result<(), AppError> = run(&request).await;

            if let Err(e) = &result {
                warn!(purpose = %request.purpose, session = %request.session, "{e}");
            }

            // Receiver gone means the UI is shutting down.
            let _ = report_tx.send(LaunchReport { request, result });
        });
    }
}

/// Run one request to completion.
pub async fn run(request: &LaunchRequest) -> Result<(), AppError> {
    let command_line: String = request.command_line();
    let Some((program, args)) = request.argv.split_first() else {
        return Err(AppError::spawn(command_line, "empty command template"));
    };

    let start_time: Instant = Instant::now();
    let mut child: Child = Command::new(expand_home(Path::new(program)))
        .args(args)
        .arg(&request.target)
        .current_dir(&request.workdir)
        .env(TARGET_ENV, &request.target)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| AppError::spawn(command_line.clone(), e))?;

    let stderr: String = match child.stderr.take() {
        Some(pipe) => stderr_tail(pipe).await,
        None => String::new(),
    };

    let status: ExitStatus = child
        .wait()
        .await
        .map_err(|e| AppError::spawn(command_line.clone(), e))?;

    let duration: Duration = start_time.elapsed();
    info!(
        marker = "EXTERNAL_COMMAND",
        purpose = %request.purpose,
        status = ?status.code(),
        "`{}` finished in {:?}",
        command_line,
        duration
    );

    if status.success() {
        Ok(())
    } else {
        Err(AppError::ExternalCmd {
            cmd: command_line,
            code: status.code(),
            stderr,
        })
    }
}

/// Read `pipe` to EOF and return its last non-blank line.
async fn stderr_tail(pipe: ChildStderr) -> String {
    let mut lines = BufReader::new(pipe).split(b'\n');
    let mut tail: String = String::new();

    loop {
        match lines.next_segment().await {
            Ok(Some(line)) => {
                let line: String = last_line(&line);
                if !line.is_empty() {
                    tail = line;
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!("Failed to read child stderr: {e}");
                break;
            }
        }
    }

    tail
}

fn last_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default()
        .trim()
        .to_string()
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Physical print commands.  The command consumes the surface, which is the
// only externally visible action taken against it.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{error, info, instrument};
use uuid::Uuid;

use strichwerk_core::error::{Result, StrichwerkError};

use crate::surface::PrintSurface;

/// Sends a settled print surface to the printer.
#[async_trait]
pub trait PrintCommand: Send + Sync {
    async fn print(&self, surface: PrintSurface) -> Result<()>;
}

/// Writes each print document into a spool directory as
/// `print-<surface id>.html`.
#[derive(Debug, Clone)]
pub struct SpoolPrinter {
    dir: PathBuf,
}

impl SpoolPrinter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, surface_id: Uuid) -> PathBuf {
        self.dir.join(format!("print-{}.html", surface_id.simple()))
    }
}

#[async_trait]
impl PrintCommand for SpoolPrinter {
    #[instrument(skip(self, surface), fields(surface = %surface.id()))]
    async fn print(&self, surface: PrintSurface) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(surface.id());
        tokio::fs::write(&path, surface.into_document()).await?;
        info!(path = %path.display(), "print document spooled");
        Ok(())
    }
}

/// Pipes the print document into an external command (e.g. `lp -`).
#[derive(Debug, Clone)]
pub struct SystemPrintCommand {
    program: String,
    args: Vec<String>,
}

impl SystemPrintCommand {
    /// Build from an argv list; the first entry is the program.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| StrichwerkError::Config("print command is empty".into()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl PrintCommand for SystemPrintCommand {
    #[instrument(skip(self, surface), fields(surface = %surface.id(), program = %self.program))]
    async fn print(&self, surface: PrintSurface) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| StrichwerkError::PrintCommand(format!("spawn {}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(surface.document().as_bytes())
                .await
                .map_err(|e| StrichwerkError::PrintCommand(format!("writing document: {e}")))?;
            // Close stdin so the command sees end of input.
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| StrichwerkError::PrintCommand(format!("waiting for {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(status = %output.status, %stderr, "print command failed");
            return Err(StrichwerkError::PrintCommand(format!(
                "{} exited with {}: {stderr}",
                self.program, output.status
            )));
        }

        info!("print command accepted document");
        Ok(())
    }
}

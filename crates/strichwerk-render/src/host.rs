// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host surfaces: the designated container element the renderer writes into.
// The renderer owns only this element, never the surrounding page.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use strichwerk_core::error::{Result, StrichwerkError};

/// Destination for composed container markup.
pub trait HostSurface: Send + Sync {
    /// Replace the container's content with a committed batch.
    fn write_container(&self, html: &str) -> Result<()>;

    /// Replace the container's content with a visible message.
    fn show_message(&self, html: &str) -> Result<()>;

    /// Current batch content, if the container holds one.
    fn container(&self) -> Option<String>;
}

fn poisoned<T>(_: PoisonError<T>) -> StrichwerkError {
    StrichwerkError::Io(std::io::Error::other("host state lock poisoned"))
}

#[derive(Debug, Default)]
struct HostState {
    container: Option<String>,
    message: Option<String>,
    writes: u32,
}

/// In-process host. Clones share the same container.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    state: Arc<Mutex<HostState>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(&self) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.message.clone())
    }

    /// Number of times the container has been replaced.
    pub fn writes(&self) -> u32 {
        self.state.lock().map(|s| s.writes).unwrap_or(0)
    }
}

impl HostSurface for MemoryHost {
    fn write_container(&self, html: &str) -> Result<()> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.container = Some(html.to_string());
        state.message = None;
        state.writes += 1;
        Ok(())
    }

    fn show_message(&self, html: &str) -> Result<()> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.container = None;
        state.message = Some(html.to_string());
        state.writes += 1;
        Ok(())
    }

    fn container(&self) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.container.clone())
    }
}

/// Host backed by a file holding the container's current content.
#[derive(Debug)]
pub struct FileHost {
    path: PathBuf,
    container: Mutex<Option<String>>,
}

impl FileHost {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            container: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, html: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, html)?;
        debug!(path = %self.path.display(), bytes = html.len(), "host file written");
        Ok(())
    }
}

impl HostSurface for FileHost {
    fn write_container(&self, html: &str) -> Result<()> {
        let mut container = self.container.lock().map_err(poisoned)?;
        self.write_file(html)?;
        *container = Some(html.to_string());
        Ok(())
    }

    fn show_message(&self, html: &str) -> Result<()> {
        let mut container = self.container.lock().map_err(poisoned)?;
        self.write_file(html)?;
        *container = None;
        Ok(())
    }

    fn container(&self) -> Option<String> {
        self.container.lock().ok().and_then(|c| c.clone())
    }
}

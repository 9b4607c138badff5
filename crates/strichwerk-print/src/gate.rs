// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print gate.
//
// Opens a fresh print surface around the host's current container, waits
// for every image in it to settle, then issues the print command once:
//
//   1. open surface, enumerate images (total captured here)
//   2. probe each image; synchronous settlements count immediately
//   3. check: zero images, or all settled synchronously -> print now
//   4. otherwise await the rest; check after every settlement
//
// A broken image is a settlement like any other.  There is no timeout unless
// the caller configures one; on expiry the gate prints with whatever loaded.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use strichwerk_core::error::{Result, StrichwerkError};
use strichwerk_render::HostSurface;

use crate::command::PrintCommand;
use crate::loader::{LoadState, ResourceLoader};
use crate::settlement::SettlementCounter;
use crate::surface::PrintSurface;

/// Summary of one print invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintReport {
    pub surface_id: Uuid,
    pub images: usize,
    pub loaded: usize,
    pub failed: usize,
    /// Images settled without waiting (inline or cached).
    pub settled_synchronously: usize,
    /// The settle timeout expired before every image settled.
    pub timed_out: bool,
}

impl PrintReport {
    fn new(surface_id: Uuid, images: usize) -> Self {
        Self {
            surface_id,
            images,
            loaded: 0,
            failed: 0,
            settled_synchronously: 0,
            timed_out: false,
        }
    }

    fn record(&mut self, src: &str, state: &LoadState) {
        match state {
            LoadState::Loaded => self.loaded += 1,
            LoadState::Failed(reason) => {
                warn!(%src, %reason, "image failed, printing without it");
                self.failed += 1;
            }
        }
    }
}

/// Defers the print command until the print surface's images have settled.
pub struct PrintGate {
    loader: Arc<dyn ResourceLoader>,
    command: Arc<dyn PrintCommand>,
    settle_timeout: Option<Duration>,
}

impl PrintGate {
    pub fn new(loader: Arc<dyn ResourceLoader>, command: Arc<dyn PrintCommand>) -> Self {
        Self {
            loader,
            command,
            settle_timeout: None,
        }
    }

    /// Stop waiting for images after `timeout` and print anyway.
    pub fn with_settle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.settle_timeout = timeout;
        self
    }

    /// Print whatever batch the host is currently displaying.
    pub async fn print_host(&self, host: &dyn HostSurface) -> Result<PrintReport> {
        let container = host.container().ok_or(StrichwerkError::NothingToPrint)?;
        let surface = PrintSurface::open(&container)?;
        self.print(surface).await
    }

    /// Wait for the surface's images to settle, then print it.
    #[instrument(skip(self, surface), fields(surface = %surface.id(), images = surface.images().len()))]
    pub async fn print(&self, surface: PrintSurface) -> Result<PrintReport> {
        let mut counter = SettlementCounter::new(surface.images().len());
        let mut report = PrintReport::new(surface.id(), counter.total());

        let mut ready = counter.check();
        if !ready {
            let mut pending = FuturesUnordered::new();
            for src in surface.images() {
                match self.loader.probe(src) {
                    Some(state) => {
                        report.record(src, &state);
                        report.settled_synchronously += 1;
                        counter.settle();
                    }
                    None => {
                        let loader = Arc::clone(&self.loader);
                        let src = src.clone();
                        pending.push(async move {
                            let state = loader.load(&src).await;
                            (src, state)
                        });
                    }
                }
            }
            debug!(
                settled = counter.settled(),
                pending = counter.pending(),
                "observers attached"
            );

            ready = counter.check();
            if !ready {
                let settle_all = async {
                    while let Some((src, state)) = pending.next().await {
                        report.record(&src, &state);
                        counter.settle();
                        if counter.check() {
                            return true;
                        }
                    }
                    false
                };
                ready = match self.settle_timeout {
                    Some(limit) => match tokio::time::timeout(limit, settle_all).await {
                        Ok(fired) => fired,
                        Err(_) => {
                            warn!(
                                timeout_ms = limit.as_millis() as u64,
                                pending = counter.pending(),
                                "settle timeout expired, printing anyway"
                            );
                            report.timed_out = true;
                            counter.force()
                        }
                    },
                    None => settle_all.await,
                };
            }
        }

        if !ready {
            // Only reachable if the loader stream ended early; never print twice.
            ready = counter.force();
        }
        if ready {
            info!(
                loaded = report.loaded,
                failed = report.failed,
                timed_out = report.timed_out,
                "issuing print command"
            );
            self.command.print(surface).await?;
        }
        Ok(report)
    }
}

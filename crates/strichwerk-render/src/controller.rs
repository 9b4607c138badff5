// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render controller.
//
// Every render gets a fresh aggregator and a new generation token.  Starting
// a render supersedes whatever was in flight: late outcomes of the older
// batch are dropped on arrival, and its commit (if it ever happens) is never
// written to the host.  Superseded fetches are not cancelled; they run to
// completion and are discarded.
//
// The check-then-write on commit has no await point in between, so on a
// current-thread runtime a newer render cannot slip in between them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::StreamExt;
use tracing::{debug, info, instrument, warn};

use strichwerk_core::error::Result;
use strichwerk_core::human_errors::humanize_error;
use strichwerk_core::types::{Generation, RenderAttributes, RenderDefaults, RenderRequest};
use strichwerk_fetch::ImageFetcher;

use crate::aggregator::Aggregator;
use crate::container::compose_notice;
use crate::host::HostSurface;

/// What happened to one render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The batch completed and its container is now in the host.
    Committed {
        generation: Generation,
        slots: usize,
        failed: usize,
    },
    /// A newer render started first; nothing was written.
    Superseded { generation: Generation },
}

/// Drives render requests into a single host surface.
pub struct RenderController {
    fetcher: ImageFetcher,
    host: Arc<dyn HostSurface>,
    current: AtomicU64,
    defaults: RenderDefaults,
}

impl RenderController {
    pub fn new(fetcher: ImageFetcher, host: Arc<dyn HostSurface>, defaults: RenderDefaults) -> Self {
        Self {
            fetcher,
            host,
            current: AtomicU64::new(0),
            defaults,
        }
    }

    pub fn host(&self) -> &Arc<dyn HostSurface> {
        &self.host
    }

    pub fn current_generation(&self) -> Generation {
        Generation(self.current.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current_generation() == generation
    }

    /// Start a new generation, making every earlier one stale.
    fn advance(&self) -> Generation {
        let previous = Generation(self.current.fetch_add(1, Ordering::SeqCst));
        previous.next()
    }

    /// Validate host attributes and render them.
    ///
    /// Input errors are written to the host as a visible message and returned;
    /// no fetch is issued for them.
    #[instrument(skip(self, attrs))]
    pub async fn render_attributes(&self, attrs: &RenderAttributes) -> Result<RenderOutcome> {
        match RenderRequest::from_attributes(attrs, &self.defaults) {
            Ok(request) => self.render(request).await,
            Err(e) => {
                let generation = self.advance();
                warn!(%generation, error = %e, "render rejected, batch not started");
                let notice = compose_notice(&humanize_error(&e))?;
                self.host.show_message(&notice)?;
                Err(e)
            }
        }
    }

    /// Fetch, aggregate and (if still current) display one request.
    #[instrument(skip(self, request), fields(request_id = %request.id(), quantity = request.quantity()))]
    pub async fn render(&self, request: RenderRequest) -> Result<RenderOutcome> {
        let generation = self.advance();
        let mut aggregator = Aggregator::new(generation, request.quantity());

        let mut commit = aggregator.check_complete();
        if commit.is_none() {
            let mut outcomes = self.fetcher.fetch_batch(&request, generation);
            while let Some(outcome) = outcomes.next().await {
                if !self.is_current(outcome.generation) {
                    debug!(%generation, index = outcome.index, "stale outcome discarded");
                    continue;
                }
                if let Some(done) = aggregator.on_fetch_settled(outcome) {
                    commit = Some(done);
                }
            }
        }

        let Some(commit) = commit else {
            info!(%generation, "batch superseded before completion");
            return Ok(RenderOutcome::Superseded { generation });
        };

        let html = commit.container_html()?;
        if !self.is_current(commit.generation) {
            info!(%generation, "completed batch superseded, not displayed");
            return Ok(RenderOutcome::Superseded { generation });
        }
        self.host.write_container(&html)?;

        info!(
            %generation,
            slots = commit.len(),
            failed = commit.failed(),
            "batch displayed"
        );
        Ok(RenderOutcome::Committed {
            generation,
            slots: commit.len(),
            failed: commit.failed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;
    use strichwerk_core::StrichwerkError;
    use strichwerk_fetch::{FragmentQuery, FragmentSource};

    use crate::host::MemoryHost;

    /// Delays keyed by (barcode, index); unlisted slots settle immediately.
    #[derive(Default)]
    struct ScriptedSource {
        delays_ms: HashMap<(String, u32), u64>,
        fail: Vec<(String, u32)>,
    }

    impl ScriptedSource {
        fn delay(mut self, barcode: &str, index: u32, ms: u64) -> Self {
            self.delays_ms.insert((barcode.into(), index), ms);
            self
        }

        fn failing(mut self, barcode: &str, index: u32) -> Self {
            self.fail.push((barcode.into(), index));
            self
        }
    }

    #[async_trait]
    impl FragmentSource for ScriptedSource {
        async fn fetch_fragment(&self, query: &FragmentQuery) -> Result<String> {
            let key = (query.barcode_value.clone(), query.index);
            let ms = self.delays_ms.get(&key).copied().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            if self.fail.contains(&key) {
                return Err(StrichwerkError::FetchTimeout);
            }
            Ok(format!(
                r#"<img src="/{}/{}.{}">"#,
                query.barcode_value, query.index, query.format
            ))
        }
    }

    fn controller(source: ScriptedSource) -> (RenderController, MemoryHost) {
        let host = MemoryHost::new();
        let controller = RenderController::new(
            ImageFetcher::new(Arc::new(source)),
            Arc::new(host.clone()),
            RenderDefaults::default(),
        );
        (controller, host)
    }

    fn positions(html: &str, barcode: &str, count: u32) -> Vec<usize> {
        (0..count)
            .map(|i| html.find(&format!("/{barcode}/{i}.")).expect("slot present"))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn arrival_order_2_0_1_renders_0_1_2() {
        let source = ScriptedSource::default()
            .delay("12345", 0, 20)
            .delay("12345", 1, 30)
            .delay("12345", 2, 10);
        let (controller, host) = controller(source);

        let request = RenderRequest::new("12345", "png", 3).unwrap();
        let outcome = controller.render(request).await.unwrap();

        assert!(matches!(outcome, RenderOutcome::Committed { slots: 3, failed: 0, .. }));
        let html = host.container().unwrap();
        let pos = positions(&html, "12345", 3);
        assert!(pos[0] < pos[1] && pos[1] < pos[2]);
        assert_eq!(host.writes(), 1);
    }

    #[tokio::test]
    async fn zero_quantity_commits_empty_container() {
        let (controller, host) = controller(ScriptedSource::default());
        let request = RenderRequest::new("12345", "png", 0).unwrap();

        let outcome = controller.render(request).await.unwrap();

        assert!(matches!(outcome, RenderOutcome::Committed { slots: 0, .. }));
        let html = host.container().unwrap();
        assert!(html.contains(r#"data-count="0""#));
        assert_eq!(host.writes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_still_fills_every_slot() {
        let source = ScriptedSource::default()
            .delay("777", 0, 15)
            .delay("777", 2, 5)
            .failing("777", 1);
        let (controller, host) = controller(source);

        let request = RenderRequest::new("777", "png", 3).unwrap();
        let outcome = controller.render(request).await.unwrap();

        assert!(matches!(outcome, RenderOutcome::Committed { slots: 3, failed: 1, .. }));
        let html = host.container().unwrap();
        let ok0 = html.find("/777/0.").unwrap();
        let err1 = html.find(r#"barcode-error" data-index="1""#).unwrap();
        let ok2 = html.find("/777/2.").unwrap();
        assert!(ok0 < err1 && err1 < ok2);
    }

    #[tokio::test]
    async fn missing_barcode_shows_message_without_fetching() {
        let (controller, host) = controller(ScriptedSource::default());
        let attrs = RenderAttributes {
            barcode: Some("   ".into()),
            ..Default::default()
        };

        let err = controller.render_attributes(&attrs).await.unwrap_err();

        assert!(matches!(err, StrichwerkError::MissingBarcode));
        assert!(host.container().is_none());
        assert!(host.message().unwrap().contains("No barcode value"));
    }

    #[tokio::test]
    async fn attributes_are_coerced_before_rendering() {
        let (controller, host) = controller(ScriptedSource::default());
        let attrs = RenderAttributes {
            barcode: Some("ABC".into()),
            format: None,
            quantity: Some("2 labels".into()),
        };

        let outcome = controller.render_attributes(&attrs).await.unwrap();

        assert!(matches!(outcome, RenderOutcome::Committed { slots: 2, .. }));
        assert!(host.container().unwrap().contains("/ABC/1.png"));
    }

    #[tokio::test(start_paused = true)]
    async fn newer_render_wins_when_older_finishes_last() {
        let source = ScriptedSource::default()
            .delay("old", 0, 100)
            .delay("old", 1, 100)
            .delay("new", 0, 10);
        let (controller, host) = controller(source);

        let old = controller.render(RenderRequest::new("old", "png", 2).unwrap());
        let new = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            controller.render(RenderRequest::new("new", "png", 1).unwrap()).await
        };
        let (old, new) = tokio::join!(old, new);

        assert!(matches!(old.unwrap(), RenderOutcome::Superseded { .. }));
        assert!(matches!(new.unwrap(), RenderOutcome::Committed { slots: 1, .. }));
        let html = host.container().unwrap();
        assert!(html.contains("/new/0."));
        assert!(!html.contains("/old/"));
        assert_eq!(host.writes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn older_render_finishing_first_is_still_suppressed() {
        let source = ScriptedSource::default()
            .delay("old", 0, 20)
            .delay("new", 0, 50);
        let (controller, host) = controller(source);

        let old = controller.render(RenderRequest::new("old", "png", 1).unwrap());
        let new = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            controller.render(RenderRequest::new("new", "png", 1).unwrap()).await
        };
        let (old, new) = tokio::join!(old, new);

        assert!(matches!(old.unwrap(), RenderOutcome::Superseded { .. }));
        assert!(matches!(new.unwrap(), RenderOutcome::Committed { .. }));
        assert!(host.container().unwrap().contains("/new/0."));
        assert_eq!(host.writes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn input_error_supersedes_in_flight_batch() {
        let source = ScriptedSource::default().delay("old", 0, 50);
        let (controller, host) = controller(source);

        let old = controller.render(RenderRequest::new("old", "png", 1).unwrap());
        let bad = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            controller.render_attributes(&RenderAttributes::default()).await
        };
        let (old, bad) = tokio::join!(old, bad);

        assert!(matches!(old.unwrap(), RenderOutcome::Superseded { .. }));
        assert!(bad.is_err());
        assert!(host.container().is_none());
        assert!(host.message().is_some());
    }

    #[tokio::test]
    async fn sequential_renders_each_commit() {
        let (controller, host) = controller(ScriptedSource::default());

        let first = controller.render(RenderRequest::new("a", "png", 1).unwrap()).await.unwrap();
        let second = controller.render(RenderRequest::new("b", "png", 1).unwrap()).await.unwrap();

        assert!(matches!(first, RenderOutcome::Committed { generation: Generation(1), .. }));
        assert!(matches!(second, RenderOutcome::Committed { generation: Generation(2), .. }));
        assert_eq!(host.writes(), 2);
        assert!(host.container().unwrap().contains("/b/0."));
    }
}

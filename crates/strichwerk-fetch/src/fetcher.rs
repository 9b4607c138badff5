// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image fetcher: one independent fragment request per batch slot.
//
// All requests of a batch are in flight at once and are driven from the
// caller's task, so completions are delivered one at a time in whatever
// order the network settles them.  A failed request still yields exactly one
// outcome for its slot, carrying a placeholder body.

use std::sync::Arc;

use futures::stream::{BoxStream, FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use strichwerk_core::types::{FetchOutcome, FragmentBody, Generation, RenderRequest};

use crate::source::{FragmentQuery, FragmentSource};

/// Fans a render request out over a [`FragmentSource`].
#[derive(Clone)]
pub struct ImageFetcher {
    source: Arc<dyn FragmentSource>,
}

impl ImageFetcher {
    pub fn new(source: Arc<dyn FragmentSource>) -> Self {
        Self { source }
    }

    /// Issue `request.quantity()` fragment requests and stream their outcomes
    /// in completion order.
    ///
    /// The stream yields exactly `quantity` items and then ends. Each item is
    /// tagged with `generation` and with its arrival ordinal.
    pub fn fetch_batch(
        &self,
        request: &RenderRequest,
        generation: Generation,
    ) -> BoxStream<'static, FetchOutcome> {
        let in_flight = FuturesUnordered::new();
        for index in 0..request.quantity() {
            let source = Arc::clone(&self.source);
            let query = FragmentQuery {
                barcode_value: request.barcode_value().to_string(),
                format: request.format().to_string(),
                index,
            };
            in_flight.push(async move {
                let result = source.fetch_fragment(&query).await;
                (query.index, result)
            });
        }

        info!(
            request_id = %request.id(),
            %generation,
            quantity = request.quantity(),
            "fragment requests issued"
        );

        let mut ordinal = 0u64;
        in_flight
            .map(move |(index, result)| {
                let completed_at = ordinal;
                ordinal += 1;
                let body = match result {
                    Ok(markup) => {
                        debug!(%generation, index, completed_at, "fragment settled");
                        FragmentBody::Rendered(markup)
                    }
                    Err(e) => {
                        warn!(%generation, index, error = %e, "fragment failed, using placeholder");
                        FragmentBody::Failed {
                            reason: e.to_string(),
                        }
                    }
                };
                FetchOutcome {
                    generation,
                    index,
                    body,
                    completed_at,
                }
            })
            .boxed()
    }
}

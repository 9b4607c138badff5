// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seam between the fetcher and whatever renders barcode fragments.

use async_trait::async_trait;

use strichwerk_core::error::Result;

/// Parameters of one fragment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentQuery {
    pub barcode_value: String,
    pub format: String,
    /// Slot this request fills. Not sent to the endpoint.
    pub index: u32,
}

/// Something that turns a barcode value/format pair into renderable markup.
///
/// Every slot of a batch gets its own call; implementations must not assume
/// calls complete in the order they were issued.
#[async_trait]
pub trait FragmentSource: Send + Sync {
    async fn fetch_fragment(&self, query: &FragmentQuery) -> Result<String>;
}

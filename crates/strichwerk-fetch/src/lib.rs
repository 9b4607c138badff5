// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Strichwerk fetch: the image fetcher that fans a render request out into
// independent fragment requests, plus the JSON envelope client the dashboard
// loaders use.  Nothing in this crate touches the display.

pub mod envelope;
pub mod fetcher;
pub mod http_source;
pub mod source;

pub use envelope::{DashboardClient, Envelope};
pub use fetcher::ImageFetcher;
pub use http_source::HttpFragmentSource;
pub use source::{FragmentQuery, FragmentSource};

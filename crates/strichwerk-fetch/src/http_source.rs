// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP client for the fragment-rendering endpoint.
//
//   GET <endpoint>?barcode=<value>&format=<format>
//
// The response body is returned verbatim; any non-success status is a fetch
// error for that slot.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, instrument, warn};

use strichwerk_core::error::{Result, StrichwerkError};

use crate::source::{FragmentQuery, FragmentSource};

/// Fragment source backed by a single HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpFragmentSource {
    endpoint: Url,
    client: Client,
}

impl HttpFragmentSource {
    /// Create a source targeting `endpoint`, with `timeout` applied to each
    /// request.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            StrichwerkError::Config(format!("invalid fragment endpoint '{endpoint}': {e}"))
        })?;
        let client = Client::builder()
            .user_agent(user_agent())
            .timeout(timeout)
            .build()
            .map_err(|e| StrichwerkError::Config(format!("http client: {e}")))?;
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// URL for one fragment request. Existing query pairs on the endpoint
    /// are kept.
    pub fn fragment_url(&self, query: &FragmentQuery) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("barcode", &query.barcode_value)
            .append_pair("format", &query.format);
        url
    }
}

#[async_trait]
impl FragmentSource for HttpFragmentSource {
    #[instrument(skip(self, query), fields(index = query.index))]
    async fn fetch_fragment(&self, query: &FragmentQuery) -> Result<String> {
        let url = self.fragment_url(query);
        debug!(%url, "requesting fragment");

        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "fragment endpoint rejected request");
            return Err(StrichwerkError::FetchStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(map_reqwest_error)?;
        debug!(bytes = body.len(), "fragment received");
        Ok(body)
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> StrichwerkError {
    if err.is_timeout() {
        StrichwerkError::FetchTimeout
    } else {
        StrichwerkError::Fetch(err.to_string())
    }
}

pub(crate) fn user_agent() -> &'static str {
    concat!("strichwerk/", env!("CARGO_PKG_VERSION"))
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON envelope client for the dashboard loaders (KPIs, recent sales, low
// stock, expense/invoice/return lists).  Those screens only need "GET a path,
// unwrap the envelope"; there is no ordering or retry behaviour here.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use strichwerk_core::error::{Result, StrichwerkError};

use crate::http_source::{map_reqwest_error, user_agent};

/// Response wrapper every dashboard endpoint returns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, turning `success: false` into a fetch error.
    pub fn into_result(self) -> Result<Option<T>> {
        if self.success {
            Ok(self.data)
        } else {
            Err(StrichwerkError::Fetch(
                self.message
                    .unwrap_or_else(|| "server reported failure".into()),
            ))
        }
    }
}

/// Thin GET client rooted at the dashboard base URL.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    base: Url,
    client: Client,
}

impl DashboardClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(base)
            .map_err(|e| StrichwerkError::Config(format!("invalid dashboard base '{base}': {e}")))?;
        // Paths join under the base path, so it must end in a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .user_agent(user_agent())
            .timeout(timeout)
            .build()
            .map_err(|e| StrichwerkError::Config(format!("http client: {e}")))?;
        Ok(Self { base, client })
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| StrichwerkError::InvalidInput(format!("bad path '{path}': {e}")))
    }

    /// GET `path` and decode the envelope.
    #[instrument(skip(self))]
    pub async fn get_envelope<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>> {
        let url = self.url(path)?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(StrichwerkError::FetchStatus {
                status: status.as_u16(),
            });
        }
        debug!(bytes = bytes.len(), "envelope received");
        Ok(serde_json::from_slice(&bytes)?)
    }
}

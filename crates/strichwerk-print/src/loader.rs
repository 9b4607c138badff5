// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image resource loading for print surfaces.
//
// A loader can settle a resource in two ways: synchronously through `probe`
// (inline data, already-cached images) or asynchronously through `load`.
// Both success and failure are settlement; nothing here returns an error.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, Url};
use tracing::{debug, instrument, warn};

use strichwerk_core::error::{Result, StrichwerkError};

/// Terminal state of one image resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loaded,
    Failed(String),
}

impl LoadState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }
}

/// Loads the images referenced by a print surface.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Settlement known without waiting, if any.
    fn probe(&self, src: &str) -> Option<LoadState>;

    /// Load `src` until it settles.
    async fn load(&self, src: &str) -> LoadState;
}

/// Settles `data:` URIs by checking they decode to an image payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUriLoader;

impl DataUriLoader {
    pub fn is_data_uri(src: &str) -> bool {
        src.get(..5)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
    }

    fn settle(src: &str) -> LoadState {
        let Some((header, payload)) = src[5..].split_once(',') else {
            return LoadState::Failed("data URI without payload separator".into());
        };
        let mut parts = header.split(';');
        let media_type = parts.next().unwrap_or_default().trim();
        if !media_type.is_empty() && !media_type.to_ascii_lowercase().starts_with("image/") {
            return LoadState::Failed(format!("data URI is not an image ({media_type})"));
        }
        let is_base64 = parts.any(|p| p.trim().eq_ignore_ascii_case("base64"));
        if is_base64 {
            match STANDARD.decode(payload.trim()) {
                Ok(bytes) if !bytes.is_empty() => LoadState::Loaded,
                Ok(_) => LoadState::Failed("empty image payload".into()),
                Err(e) => LoadState::Failed(format!("invalid base64 image: {e}")),
            }
        } else if payload.is_empty() {
            LoadState::Failed("empty image payload".into())
        } else {
            LoadState::Loaded
        }
    }
}

#[async_trait]
impl ResourceLoader for DataUriLoader {
    fn probe(&self, src: &str) -> Option<LoadState> {
        Self::is_data_uri(src).then(|| Self::settle(src))
    }

    async fn load(&self, src: &str) -> LoadState {
        self.probe(src)
            .unwrap_or_else(|| LoadState::Failed(format!("no loader for '{src}'")))
    }
}

/// Loads http(s) images, resolving relative sources against a base URL.
///
/// Successful loads are remembered so the next print of the same content
/// settles them synchronously.
#[derive(Debug)]
pub struct HttpResourceLoader {
    client: Client,
    base: Option<Url>,
    cache: Mutex<HashMap<String, LoadState>>,
}

impl HttpResourceLoader {
    pub fn new(base: Option<&str>, timeout: Duration) -> Result<Self> {
        let base = base
            .map(Url::parse)
            .transpose()
            .map_err(|e| StrichwerkError::Config(format!("invalid image base url: {e}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StrichwerkError::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn resolve(&self, src: &str) -> std::result::Result<Url, String> {
        match Url::parse(src) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base {
                Some(base) => base.join(src).map_err(|e| e.to_string()),
                None => Err(format!("relative image '{src}' without a base url")),
            },
            Err(e) => Err(e.to_string()),
        }
    }

    fn remember(&self, src: &str, state: &LoadState) {
        if !state.is_loaded() {
            return;
        }
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(src.to_string(), state.clone());
        }
    }
}

#[async_trait]
impl ResourceLoader for HttpResourceLoader {
    fn probe(&self, src: &str) -> Option<LoadState> {
        if DataUriLoader::is_data_uri(src) {
            return DataUriLoader.probe(src);
        }
        self.cache.lock().ok().and_then(|c| c.get(src).cloned())
    }

    #[instrument(skip(self))]
    async fn load(&self, src: &str) -> LoadState {
        if let Some(state) = self.probe(src) {
            return state;
        }

        let url = match self.resolve(src) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(url) => {
                return LoadState::Failed(format!("unsupported image scheme '{}'", url.scheme()));
            }
            Err(reason) => return LoadState::Failed(reason),
        };

        let state = match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                let is_image = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .is_none_or(|ct| ct.to_ascii_lowercase().starts_with("image/"));
                match response.bytes().await {
                    Ok(_) if is_image => LoadState::Loaded,
                    Ok(_) => LoadState::Failed("response is not an image".into()),
                    Err(e) => LoadState::Failed(e.to_string()),
                }
            }
            Ok(response) => LoadState::Failed(format!("status {}", response.status().as_u16())),
            Err(e) => LoadState::Failed(e.to_string()),
        };

        match &state {
            LoadState::Loaded => debug!("image loaded"),
            LoadState::Failed(reason) => warn!(%reason, "image failed to load"),
        }
        self.remember(src, &state);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::Router;
    use axum::http::{StatusCode, header};
    use axum::routing::get;

    const PNG_1PX: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

    async fn serve() -> String {
        let app = Router::new()
            .route(
                "/img/ok.png",
                get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![0x89u8, 0x50]) }),
            )
            .route(
                "/img/page.html",
                get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<html></html>") }),
            )
            .route("/img/gone.png", get(|| async { StatusCode::NOT_FOUND }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[test]
    fn data_uri_settles_synchronously() {
        let src = format!("data:image/png;base64,{PNG_1PX}");
        assert_eq!(DataUriLoader.probe(&src), Some(LoadState::Loaded));
        assert_eq!(DataUriLoader.probe("https://x/y.png"), None);
    }

    #[test]
    fn broken_data_uris_fail() {
        assert!(matches!(
            DataUriLoader.probe("data:image/png;base64,@@@"),
            Some(LoadState::Failed(_))
        ));
        assert!(matches!(
            DataUriLoader.probe("data:text/plain,hello"),
            Some(LoadState::Failed(_))
        ));
        assert!(matches!(
            DataUriLoader.probe("data:image/png;base64"),
            Some(LoadState::Failed(_))
        ));
    }

    #[test]
    fn inline_svg_data_uri_loads() {
        assert_eq!(
            DataUriLoader.probe("data:image/svg+xml,%3Csvg%3E%3C/svg%3E"),
            Some(LoadState::Loaded)
        );
    }

    #[tokio::test]
    async fn http_images_load_and_are_cached() {
        let base = serve().await;
        let loader = HttpResourceLoader::new(Some(&base), Duration::from_secs(5)).unwrap();

        assert_eq!(loader.probe("img/ok.png"), None);
        assert_eq!(loader.load("img/ok.png").await, LoadState::Loaded);
        assert_eq!(loader.probe("img/ok.png"), Some(LoadState::Loaded));
    }

    #[tokio::test]
    async fn http_failures_settle_as_failed_and_are_not_cached() {
        let base = serve().await;
        let loader = HttpResourceLoader::new(Some(&base), Duration::from_secs(5)).unwrap();

        assert!(matches!(loader.load("img/gone.png").await, LoadState::Failed(_)));
        assert!(matches!(loader.load("img/page.html").await, LoadState::Failed(_)));
        assert_eq!(loader.probe("img/gone.png"), None);
    }

    #[tokio::test]
    async fn relative_src_without_base_fails() {
        let loader = HttpResourceLoader::new(None, Duration::from_secs(1)).unwrap();
        assert!(matches!(loader.load("img/ok.png").await, LoadState::Failed(_)));
    }
}

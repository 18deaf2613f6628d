//! Resource retrieval for external stylesheets and scripts.
//!
//! A `Fetcher` pairs the document base URL with a content backend:
//! - HTTP(S) via a shared `reqwest` client (also serves `file://` bases)
//! - an in-memory map for offline conversions and tests
//!
//! Resolution is synchronous and deterministic; retrieval is async.
//! Every retrieval failure is fatal to the conversion that issued it.

use std::collections::HashMap;
use std::time::Duration;

use url::Url;

use crate::ConvertError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
enum Backend {
    Http(reqwest::Client),
    Memory(HashMap<String, String>),
}

/// The resolve/fetch capability handed to the extractor.
#[derive(Debug)]
pub struct Fetcher {
    base: Option<Url>,
    backend: Backend,
}

impl Fetcher {
    /// Network-backed fetcher resolving against `base` (the document's own
    /// location, or an explicit override).
    pub fn http(base: Option<Url>) -> Result<Self, ConvertError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| ConvertError::ResourceFetch {
                url: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            base,
            backend: Backend::Http(client),
        })
    }

    /// Map-backed fetcher. Entries are keyed by the reference exactly as
    /// written in the document, with resolved absolute URLs as a fallback
    /// key.
    pub fn from_map(resources: HashMap<String, String>) -> Self {
        Self {
            base: None,
            backend: Backend::Memory(resources),
        }
    }

    pub fn with_base(mut self, base: Url) -> Self {
        self.base = Some(base);
        self
    }

    /// Resolve a resource reference against the document base. A bare
    /// reference with no base must already be an absolute URL.
    pub fn resolve(&self, reference: &str) -> Result<Url, ConvertError> {
        match &self.base {
            Some(base) => base
                .join(reference)
                .map_err(|_| ConvertError::InvalidUrl(reference.to_string())),
            None => Url::parse(reference)
                .map_err(|_| ConvertError::InvalidUrl(reference.to_string())),
        }
    }

    /// Retrieve the content behind one resource reference.
    pub async fn fetch(&self, reference: &str) -> Result<String, ConvertError> {
        match &self.backend {
            Backend::Memory(map) => {
                if let Some(content) = map.get(reference) {
                    return Ok(content.clone());
                }
                if let Ok(resolved) = self.resolve(reference) {
                    if let Some(content) = map.get(resolved.as_str()) {
                        return Ok(content.clone());
                    }
                }
                Err(ConvertError::ResourceFetch {
                    url: reference.to_string(),
                    reason: "no entry in the provided resource map".into(),
                })
            }
            Backend::Http(client) => {
                let resolved = self.resolve(reference)?;
                match resolved.scheme() {
                    "file" => {
                        let path = resolved.to_file_path().map_err(|_| {
                            ConvertError::InvalidUrl(resolved.to_string())
                        })?;
                        tokio::fs::read_to_string(&path).await.map_err(|e| {
                            ConvertError::ResourceFetch {
                                url: resolved.to_string(),
                                reason: e.to_string(),
                            }
                        })
                    }
                    _ => {
                        let response = client.get(resolved.clone()).send().await.map_err(
                            |e| ConvertError::ResourceFetch {
                                url: resolved.to_string(),
                                reason: e.to_string(),
                            },
                        )?;
                        if !response.status().is_success() {
                            return Err(ConvertError::ResourceFetch {
                                url: resolved.to_string(),
                                reason: format!("HTTP {}", response.status()),
                            });
                        }
                        response
                            .text()
                            .await
                            .map_err(|e| ConvertError::ResourceFetch {
                                url: resolved.to_string(),
                                reason: e.to_string(),
                            })
                    }
                }
            }
        }
    }
}

/// Retrieve the root document's raw text: http(s) URLs over the network,
/// anything else as a filesystem path.
pub async fn read_document(page_path: &str) -> Result<String, ConvertError> {
    if page_path.starts_with("http://") || page_path.starts_with("https://") {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| ConvertError::ResourceFetch {
                url: page_path.to_string(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        let response =
            client
                .get(page_path)
                .send()
                .await
                .map_err(|e| ConvertError::ResourceFetch {
                    url: page_path.to_string(),
                    reason: e.to_string(),
                })?;
        if !response.status().is_success() {
            return Err(ConvertError::ResourceFetch {
                url: page_path.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        return response
            .text()
            .await
            .map_err(|e| ConvertError::ResourceFetch {
                url: page_path.to_string(),
                reason: e.to_string(),
            });
    }

    Ok(tokio::fs::read_to_string(page_path).await?)
}

/// Derive the base URL relative resource references resolve against:
/// an explicit override when given, the page URL itself for http(s)
/// documents, and the file URL of the document for local paths.
pub fn document_base(
    page_path: &str,
    base_override: Option<&str>,
) -> Result<Option<Url>, ConvertError> {
    if let Some(raw) = base_override {
        let parsed =
            Url::parse(raw).map_err(|_| ConvertError::InvalidUrl(raw.to_string()))?;
        return Ok(Some(parsed));
    }

    if page_path.starts_with("http://") || page_path.starts_with("https://") {
        let parsed = Url::parse(page_path)
            .map_err(|_| ConvertError::InvalidUrl(page_path.to_string()))?;
        return Ok(Some(parsed));
    }

    let absolute = std::path::absolute(page_path)?;
    Ok(Url::from_file_path(&absolute).ok())
}

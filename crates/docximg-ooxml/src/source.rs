//! Image source resolution
//!
//! An image reference is resolved to raw bytes in one of three ways: fetched
//! over HTTPS, read from a local path, or decoded from a base64 literal. URL
//! retrieval goes through the [`ImageFetcher`] trait so callers can swap the
//! transport.

use std::collections::BTreeMap;
use std::fs;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::Client;

use crate::config::FetchSettings;
use crate::error::{ImagerError, Result};

/// Placeholder name to image reference
pub type ImageContext = BTreeMap<String, ImageRef>;

/// How an image reference is turned into bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// HTTPS GET
    Url,
    /// Local file path
    Local,
    /// Base64 literal
    B64,
}

/// A reference paired with its retrieval mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// URL, path, or base64 payload
    pub reference: String,
    /// How to resolve the reference
    pub mode: RetrievalMode,
}

impl ImageRef {
    /// URL reference
    pub fn url(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            mode: RetrievalMode::Url,
        }
    }

    /// Local path reference
    pub fn local(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            mode: RetrievalMode::Local,
        }
    }

    /// Base64 literal reference
    pub fn base64(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            mode: RetrievalMode::B64,
        }
    }

    /// Parse a reference string, honouring an explicit mode prefix
    ///
    /// `url:`, `local:`/`file:` and `b64:`/`base64:` select the mode
    /// explicitly. `data:` URIs are base64. Otherwise strings starting with
    /// `https://` or `http://` are URLs and everything else is a local path.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some(rest) = text.strip_prefix("url:") {
            Self::url(rest)
        } else if let Some(rest) = text
            .strip_prefix("local:")
            .or_else(|| text.strip_prefix("file:"))
        {
            Self::local(rest)
        } else if let Some(rest) = text
            .strip_prefix("b64:")
            .or_else(|| text.strip_prefix("base64:"))
        {
            Self::base64(rest)
        } else if text.starts_with("data:") {
            Self::base64(text)
        } else if text.starts_with("https://") || text.starts_with("http://") {
            Self::url(text)
        } else {
            Self::local(text)
        }
    }
}

/// Transport used for URL retrieval
pub trait ImageFetcher: Send + Sync {
    /// Fetch the body at `url` as bytes
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

impl<F> ImageFetcher for F
where
    F: Fn(&str) -> Result<Vec<u8>> + Send + Sync,
{
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self(url)
    }
}

/// Blocking HTTPS fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
    allow_insecure: bool,
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&FetchSettings::default())
    }
}

impl HttpFetcher {
    /// Create a fetcher from settings
    pub fn new(settings: &FetchSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.timeout_secs),
            allow_insecure: settings.allow_insecure,
            user_agent: settings.user_agent.clone(),
        }
    }

    /// Get the request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn check_scheme(&self, url: &str) -> Result<reqwest::Url> {
        let parsed = reqwest::Url::parse(url).map_err(|e| ImagerError::retrieval(url, e))?;
        match parsed.scheme() {
            "https" => Ok(parsed),
            "http" if self.allow_insecure => Ok(parsed),
            scheme => Err(ImagerError::retrieval(
                url,
                format!("scheme '{scheme}' is not allowed; use https"),
            )),
        }
    }

    fn client(&self, url: &str) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(|e| ImagerError::retrieval(url, e))
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let parsed = self.check_scheme(url)?;
        let response = self
            .client(url)?
            .get(parsed)
            .send()
            .map_err(|e| ImagerError::retrieval(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImagerError::retrieval(url, format!("HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .map_err(|e| ImagerError::retrieval(url, e))?;
        log::debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

/// Resolves image references to bytes
pub struct ImageResolver {
    fetcher: Box<dyn ImageFetcher>,
}

impl std::fmt::Debug for ImageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageResolver").finish_non_exhaustive()
    }
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self::new(&FetchSettings::default())
    }
}

impl ImageResolver {
    /// Create a resolver using [`HttpFetcher`] for URLs
    pub fn new(settings: &FetchSettings) -> Self {
        Self::with_fetcher(HttpFetcher::new(settings))
    }

    /// Create a resolver with a custom URL transport
    pub fn with_fetcher(fetcher: impl ImageFetcher + 'static) -> Self {
        Self {
            fetcher: Box::new(fetcher),
        }
    }

    /// Resolve a reference in the given mode
    pub fn resolve(&self, reference: &str, mode: RetrievalMode) -> Result<Vec<u8>> {
        match mode {
            RetrievalMode::Url => self.fetcher.fetch(reference),
            RetrievalMode::Local => {
                fs::read(reference).map_err(|e| ImagerError::retrieval(reference, e))
            }
            RetrievalMode::B64 => decode_base64(reference),
        }
    }

    /// Resolve an [`ImageRef`]
    pub fn resolve_ref(&self, image: &ImageRef) -> Result<Vec<u8>> {
        self.resolve(&image.reference, image.mode)
    }
}

/// Decode a base64 payload, accepting a `data:…;base64,` prefix
pub fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    let body = match payload.strip_prefix("data:") {
        Some(rest) => match rest.split_once(',') {
            Some((_, data)) => data,
            None => {
                return Err(ImagerError::retrieval(
                    abbreviate(payload),
                    "data URI has no payload",
                ))
            }
        },
        None => payload,
    };

    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ImagerError::retrieval(abbreviate(payload), e))
}

/// Shorten long inline payloads for error messages
fn abbreviate(payload: &str) -> String {
    const MAX: usize = 32;
    match payload.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &payload[..idx]),
        None => payload.to_string(),
    }
}

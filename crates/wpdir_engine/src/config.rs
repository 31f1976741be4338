use std::time::Duration;

use url::Url;

use crate::{FailureKind, FetchError};

pub const DEFAULT_BASE_URL: &str = "http://localhost";

/// Connection settings handed to every fetch client at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Upper bound on any response body, file content included.
    pub max_bytes: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_millis(5000),
            user_agent: format!("wpdir-client/{}", env!("CARGO_PKG_VERSION")),
            max_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ClientConfig {
    /// Parses `base_url`, keeping every other setting at its default.
    pub fn with_base_url(base_url: &str) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::new(
                FailureKind::InvalidUrl,
                format!("{base_url} cannot be used as a base address"),
            ));
        }
        Ok(Self {
            base_url,
            ..Self::default()
        })
    }

    /// `{base_url}/api/v1/{segments...}` with each segment percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| {
                FetchError::new(FailureKind::InvalidUrl, "base address cannot have a path")
            })?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        Ok(url)
    }
}

use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use url::Url;
use wpdir_logging::{wpdir_debug, wpdir_warn};

use crate::wire::{
    FileContentPayload, FileRequest, JobPayload, MatchPayload, MatchesPayload, RecentJobPayload,
    RecentJobsPayload, SummaryItemPayload, SummaryPayload,
};
use crate::{ClientConfig, FailureKind, FetchError};

/// Read-only access to the search API. One call, one request, no retained
/// state.
#[async_trait::async_trait]
pub trait SearchApi: Send + Sync {
    async fn job(&self, job_id: &str) -> Result<JobPayload, FetchError>;

    async fn summary(&self, job_id: &str) -> Result<Vec<SummaryItemPayload>, FetchError>;

    async fn matches(&self, job_id: &str, slug: &str) -> Result<Vec<MatchPayload>, FetchError>;

    async fn file_content(&self, request: &FileRequest) -> Result<String, FetchError>;

    async fn recent_jobs(&self, limit: usize) -> Result<Vec<RecentJobPayload>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestSearchApi {
    config: ClientConfig,
    client: reqwest::Client,
}

impl ReqwestSearchApi {
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { config, client })
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, FetchError> {
        let url = self.config.endpoint(segments)?;
        wpdir_debug!("GET {}", url.path());
        let request = self.client.get(url.clone());
        self.send(request, &url).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<T, FetchError> {
        let result = self.send_inner(request).await;
        if let Err(err) = &result {
            wpdir_warn!("request to {} failed: {}", url.path(), err);
        }
        result
    }

    async fn send_inner<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, FetchError> {
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.config.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        serde_json::from_slice(&bytes)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl SearchApi for ReqwestSearchApi {
    async fn job(&self, job_id: &str) -> Result<JobPayload, FetchError> {
        self.get_json(&["search", job_id]).await
    }

    async fn summary(&self, job_id: &str) -> Result<Vec<SummaryItemPayload>, FetchError> {
        let payload: SummaryPayload = self.get_json(&["search", "summary", job_id]).await?;
        Ok(payload.into_items())
    }

    async fn matches(&self, job_id: &str, slug: &str) -> Result<Vec<MatchPayload>, FetchError> {
        let payload: MatchesPayload = self
            .get_json(&["search", "matches", job_id, slug])
            .await?;
        Ok(payload.matches.unwrap_or_default())
    }

    async fn file_content(&self, request: &FileRequest) -> Result<String, FetchError> {
        let url = self.config.endpoint(&["file"])?;
        wpdir_debug!("POST {} slug={} file={}", url.path(), request.slug, request.file);
        let builder = self.client.post(url.clone()).json(request);
        let payload: FileContentPayload = self.send(builder, &url).await?;
        Ok(payload.code)
    }

    async fn recent_jobs(&self, limit: usize) -> Result<Vec<RecentJobPayload>, FetchError> {
        let limit = limit.to_string();
        let payload: RecentJobsPayload = self.get_json(&["searches", &limit]).await?;
        Ok(payload.searches.unwrap_or_default())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return FetchError::new(FailureKind::Decode, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

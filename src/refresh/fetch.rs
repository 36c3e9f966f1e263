//! Database downloads.
//!
//! [`Fetcher`] is the opaque "fetch a new database file" operation the refresh
//! manager drives. [`HttpFetcher`] implements it against MaxMind's download
//! service.

use std::time::Duration;

use futures::future::BoxFuture;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use url::Url;

use crate::config::{
    GeoIpConfig, DOWNLOAD_TIMEOUT, MAX_GEOIP_DOWNLOAD_SIZE, RETRY_BACKOFF_BASE,
    RETRY_BACKOFF_UNIT_MS, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_SECS,
};
use crate::error_handling::GeoIpError;
use crate::geoip::extract::{extract_mmdb_from_tar_gz, is_gzip};

/// Fetches the latest database image for an edition.
pub trait Fetcher: Send + Sync {
    /// Returns the raw `.mmdb` bytes for `edition`.
    fn fetch<'a>(&'a self, edition: &'a str) -> BoxFuture<'a, Result<Vec<u8>, GeoIpError>>;
}

/// Outcome of a single download attempt.
#[derive(Debug)]
enum DownloadError {
    /// Worth another attempt (timeouts, connection failures, 5xx, 429)
    Transient(String),
    /// Retrying will not help (bad credentials, unknown edition, oversized body)
    Permanent(String),
}

impl DownloadError {
    fn is_transient(&self) -> bool {
        matches!(self, DownloadError::Transient(_))
    }

    fn into_message(self) -> String {
        match self {
            DownloadError::Transient(m) | DownloadError::Permanent(m) => m,
        }
    }
}

/// Downloads `<edition>` archives from the MaxMind download service.
///
/// Requests go to `<update_url>/geoip/databases/<edition>/download?suffix=tar.gz`
/// with HTTP basic auth (account ID, license key).
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Url,
    account_id: u32,
    license_key: String,
    max_size: usize,
    max_retries: usize,
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("base_url", &self.base_url.as_str())
            .field("account_id", &self.account_id)
            .finish_non_exhaustive()
    }
}

impl HttpFetcher {
    /// Builds a fetcher from the update URL and credentials in `config`.
    pub fn new(config: &GeoIpConfig) -> Result<Self, GeoIpError> {
        let base_url = Url::parse(&config.update_url).map_err(|e| {
            GeoIpError::ConfigValidation(format!("update URL {:?}: {}", config.update_url, e))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(GeoIpError::ConfigValidation(format!(
                "update URL {:?} must use http or https",
                config.update_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| GeoIpError::ConfigValidation(format!("building HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            account_id: config.account_id,
            license_key: config.license_key.clone(),
            max_size: MAX_GEOIP_DOWNLOAD_SIZE,
            max_retries: RETRY_MAX_ATTEMPTS,
        })
    }

    /// Overrides the number of retries after the first attempt.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Overrides the maximum accepted response size.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Download URL for `edition`.
    pub fn download_url(&self, edition: &str) -> Result<Url, GeoIpError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GeoIpError::ConfigValidation(format!(
                    "update URL {} cannot be a base",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(&["geoip", "databases", edition, "download"]);
        url.query_pairs_mut().append_pair("suffix", "tar.gz");
        Ok(url)
    }

    fn retry_strategy(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(RETRY_BACKOFF_BASE)
            .factor(RETRY_BACKOFF_UNIT_MS)
            .max_delay(Duration::from_secs(RETRY_MAX_DELAY_SECS))
            .take(self.max_retries)
    }

    async fn download_once(&self, url: &Url) -> Result<Vec<u8>, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .basic_auth(self.account_id, Some(&self.license_key))
            .send()
            .await
            .map_err(|e| DownloadError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "No error details".to_string());
            let message = format!("{} - {}", status, error_body.trim());
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                DownloadError::Transient(message)
            } else {
                DownloadError::Permanent(message)
            });
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_size as u64 {
                return Err(DownloadError::Permanent(format!(
                    "database too large: {} bytes (max: {} bytes)",
                    content_length, self.max_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DownloadError::Transient(e.to_string()))?;

        // content-length may be missing or wrong
        if bytes.len() > self.max_size {
            return Err(DownloadError::Permanent(format!(
                "database too large: {} bytes (max: {} bytes)",
                bytes.len(),
                self.max_size
            )));
        }

        Ok(bytes.to_vec())
    }

    async fn download(&self, edition: &str) -> Result<Vec<u8>, GeoIpError> {
        let url = self.download_url(edition)?;
        log::info!("Downloading {} from {}", edition, url);

        let body = RetryIf::spawn(
            self.retry_strategy(),
            || self.download_once(&url),
            |e: &DownloadError| {
                if e.is_transient() {
                    log::warn!("Download of {} failed, retrying: {:?}", edition, e);
                }
                e.is_transient()
            },
        )
        .await
        .map_err(|e| GeoIpError::fetch(edition, e.into_message()))?;

        if is_gzip(&body) {
            extract_mmdb_from_tar_gz(&body, edition).map_err(|e| GeoIpError::fetch(edition, e))
        } else {
            Ok(body)
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, edition: &'a str) -> BoxFuture<'a, Result<Vec<u8>, GeoIpError>> {
        Box::pin(self.download(edition))
    }
}

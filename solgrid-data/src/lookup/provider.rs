//! HTTP-based `IrradianceLookup` using NASA's POWER climatology API.
//!
//! This module provides [`HttpIrradianceLookup`], an implementation of the
//! [`IrradianceLookup`] trait that fetches annual irradiance aggregates
//! from the POWER point climatology service via HTTP.
//!
//! # Architecture
//!
//! The [`IrradianceLookup`] trait is synchronous to keep the core library
//! embeddable in synchronous contexts. This lookup bridges the async HTTP
//! calls to the sync interface by blocking on a Tokio runtime internally.

use std::time::Duration;

use reqwest::Client;
use solgrid_core::{IrradianceLookup, LookupError};
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use super::power::PointResponse;

/// Error type for [`HttpIrradianceLookup`] construction failures.
#[derive(Debug)]
pub enum LookupBuildError {
    /// Failed to build the HTTP client.
    HttpClient(reqwest::Error),
    /// Failed to build the Tokio runtime.
    Runtime(std::io::Error),
}

impl std::fmt::Display for LookupBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpClient(err) => write!(f, "failed to build HTTP client: {err}"),
            Self::Runtime(err) => write!(f, "failed to build Tokio runtime: {err}"),
        }
    }
}

impl std::error::Error for LookupBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HttpClient(err) => Some(err),
            Self::Runtime(err) => Some(err),
        }
    }
}

/// Default user agent for POWER requests.
pub const DEFAULT_USER_AGENT: &str = "solgrid-extract/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default base URL for the POWER service.
const DEFAULT_BASE_URL: &str = "https://power.larc.nasa.gov";

/// Configuration for [`HttpIrradianceLookup`].
#[derive(Debug, Clone)]
pub struct HttpIrradianceLookupConfig {
    /// Base URL for the POWER service.
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpIrradianceLookupConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpIrradianceLookupConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// HTTP-based irradiance lookup using the POWER climatology point API.
///
/// This lookup implements the synchronous [`IrradianceLookup`] trait by
/// internally blocking on asynchronous HTTP requests. It owns a Tokio
/// runtime that is reused across calls, avoiding the overhead of creating
/// a new runtime per request.
///
/// # Runtime behaviour
///
/// When called from outside any Tokio runtime, the lookup uses its own
/// stored runtime. When called from within an existing multi-threaded
/// Tokio runtime (detected via [`Handle::try_current()`] and
/// [`RuntimeFlavor::MultiThread`]), it uses that runtime's handle with
/// [`tokio::task::block_in_place`] to avoid nested runtime panics.
///
/// When called from within a `current_thread` Tokio runtime, the lookup
/// falls back to using its own internal runtime. This avoids the panic
/// that `block_in_place` would cause, but may lead to deadlocks if the
/// caller's runtime is driving IO or timers that this request depends on.
pub struct HttpIrradianceLookup {
    client: Client,
    config: HttpIrradianceLookupConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpIrradianceLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIrradianceLookup")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl HttpIrradianceLookup {
    /// Create a new lookup against the public POWER service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new() -> Result<Self, LookupBuildError> {
        Self::with_config(HttpIrradianceLookupConfig::default())
    }

    /// Create a new lookup with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: HttpIrradianceLookupConfig) -> Result<Self, LookupBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(LookupBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(LookupBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// Build the climatology point URL for a coordinate.
    fn build_point_url(&self, lon: f64, lat: f64) -> String {
        format!(
            "{}/api/temporal/climatology/point?parameters=ALLSKY_SFC_SW_DWN&community=RE&longitude={lon}&latitude={lat}&format=JSON",
            self.config.base_url.trim_end_matches('/'),
        )
    }

    /// Fetch the annual irradiance asynchronously.
    async fn fetch_annual_async(&self, lon: f64, lat: f64) -> Result<f64, LookupError> {
        let url = self.build_point_url(lon, lat);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        let point_response: PointResponse =
            response.json().await.map_err(|err| LookupError::Parse {
                message: err.to_string(),
            })?;

        point_response
            .annual_irradiance()
            .ok_or_else(|| LookupError::Parse {
                message: "response carries no annual irradiance value".to_owned(),
            })
    }

    /// Convert a reqwest error to a `LookupError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> LookupError {
        if error.is_timeout() {
            return LookupError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return LookupError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        LookupError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

impl IrradianceLookup for HttpIrradianceLookup {
    /// Fetch the annual irradiance for a WGS84 coordinate.
    ///
    /// # Runtime requirements
    ///
    /// When called from within an existing Tokio runtime, the runtime must
    /// be multi-threaded (`flavor = "multi_thread"`). If called from within
    /// a `current_thread` runtime, the method falls back to using its own
    /// internal runtime, which may block the caller's runtime and cause
    /// deadlocks if the caller's runtime is driving IO or timers needed by
    /// this request.
    fn annual_irradiance(&self, lon: f64, lat: f64) -> Result<f64, LookupError> {
        // block_in_place requires a multi-threaded runtime; for
        // current_thread runtimes we fall back to our own stored runtime.
        let future = self.fetch_annual_async(lon, lat);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            // No runtime detected, or current_thread runtime: use our own.
            _ => self.runtime.block_on(future),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn build_point_url_formats_coordinates() {
        let lookup = HttpIrradianceLookup::with_config(HttpIrradianceLookupConfig::new(
            "http://power.example.com",
        ))
        .expect("lookup should build");

        let url = lookup.build_point_url(-39.0, -12.5);

        assert_eq!(
            url,
            "http://power.example.com/api/temporal/climatology/point?parameters=ALLSKY_SFC_SW_DWN&community=RE&longitude=-39&latitude=-12.5&format=JSON"
        );
    }

    #[rstest]
    fn build_point_url_strips_trailing_slash() {
        let lookup = HttpIrradianceLookup::with_config(HttpIrradianceLookupConfig::new(
            "http://power.example.com/",
        ))
        .expect("lookup should build");

        let url = lookup.build_point_url(0.0, 0.0);

        assert!(url.starts_with("http://power.example.com/api/"));
        assert!(!url.contains("com//api"));
    }

    #[rstest]
    fn config_builder_pattern() {
        let config = HttpIrradianceLookupConfig::new("http://example.com")
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("test-agent/1.0");

        assert_eq!(config.base_url, "http://example.com");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "test-agent/1.0");
    }

    #[rstest]
    fn default_config_targets_the_public_service() {
        let config = HttpIrradianceLookupConfig::default();
        assert_eq!(config.base_url, "https://power.larc.nasa.gov");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}

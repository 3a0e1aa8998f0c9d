pub mod error;

pub use error::{ApiError, ApiErrorKind, Presentation};
pub use reqwest::Method;

use crate::config::Settings;
use crate::domain::business::{Dashboard, Profile};
use crate::domain::sales::SaleRecord;
use crate::domain::session::{LoginRequest, Session};
use crate::session::SessionGate;
use anyhow::Context;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

const LOGIN_PATH: &str = "/api/mobile-login";
const DASHBOARD_PATH: &str = "/api/dashboard";
const SALES_PATH: &str = "/api/sales";
const SETTINGS_PATH: &str = "/api/settings";

/// Authenticated HTTP client for the eBikri API.
///
/// Cloning is cheap; clones share the connection pool and the [`SessionGate`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    gate: Arc<SessionGate>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        gate: Arc<SessionGate>,
    ) -> anyhow::Result<Self> {
        let base_url = base_url.into().trim().to_string();
        anyhow::ensure!(!base_url.is_empty(), "API base URL must be non-empty");
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("API base URL {base_url:?} is not a valid URL"))?;
        anyhow::ensure!(
            !parsed.cannot_be_a_base(),
            "API base URL {base_url:?} cannot carry request paths"
        );

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build API http client")?;

        Ok(Self {
            http,
            base_url,
            gate,
        })
    }

    pub fn from_settings(settings: &Settings, gate: Arc<SessionGate>) -> anyhow::Result<Self> {
        let base_url = settings.require_api_base_url()?.to_string();
        Self::new(base_url, settings.http_timeout, gate)
    }

    pub fn session(&self) -> &Arc<SessionGate> {
        &self.gate
    }

    fn url(&self, path: &str) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Send one request and return the status and raw body. Attaches the bearer token
    /// when `authenticated` is set and a token exists; never refuses to send without one.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: String,
        path: &str,
        body: Option<&B>,
        authenticated: bool,
    ) -> Result<(StatusCode, String), ApiError> {
        let mut req = self.http.request(method.clone(), url);

        let mut with_token = false;
        if authenticated {
            if let Some(token) = self.gate.token().await {
                req = req.bearer_auth(token);
                with_token = true;
            }
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let t0 = Instant::now();
        let res = req.send().await.map_err(|err| {
            tracing::warn!(%method, path, error = %err, timed_out = err.is_timeout(), "API request failed");
            ApiError::from_transport(err)
        })?;

        let status = res.status();
        let text = res.text().await.map_err(ApiError::from_transport)?;

        tracing::debug!(
            %method,
            path,
            http_status = status.as_u16(),
            with_token,
            elapsed_ms = t0.elapsed().as_millis(),
            "API response"
        );

        Ok((status, text))
    }

    /// Authenticated request with the 401 path normalized.
    ///
    /// A 401 invalidates the session before the error is returned, so by the time a
    /// caller sees [`ApiError::Unauthorized`] the credentials are already gone.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        self.request_at(method, self.url(path), path, body).await
    }

    async fn request_at<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        let (status, text) = self.send(method, url, path, body, true).await?;

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(path, "API returned 401; invalidating session");
            self.gate.invalidate().await;
            return Err(ApiError::Unauthorized);
        }
        if status.is_server_error() {
            return Err(ApiError::ServerError {
                status: status.as_u16(),
                message: error::error_message(&text),
            });
        }
        if !status.is_success() {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: error::error_message(&text),
            });
        }

        decode(path, &text)
    }

    pub async fn fetch_dashboard(&self) -> Result<Dashboard, ApiError> {
        self.request(Method::GET, DASHBOARD_PATH, None).await
    }

    /// The complete sales history for the account; the API has no paging.
    pub async fn fetch_sales(&self) -> Result<Vec<SaleRecord>, ApiError> {
        self.request(Method::GET, SALES_PATH, None).await
    }

    /// The id always occupies exactly one path segment; `/`, `?` and the like are
    /// percent-encoded.
    pub async fn fetch_profile(&self, user_id: &str) -> Result<Profile, ApiError> {
        let url = self.segment_url(SETTINGS_PATH, user_id.trim())?;
        self.request_at(Method::GET, url, SETTINGS_PATH, None).await
    }

    fn segment_url(&self, path: &str, segment: &str) -> Result<String, ApiError> {
        // The url crate drops dot segments instead of encoding them.
        if matches!(segment, "" | "." | "..") {
            return Err(ApiError::Malformed {
                detail: format!("{path}: {segment:?} is not a usable id"),
            });
        }

        let mut url = Url::parse(&self.url(path)).map_err(|err| ApiError::Malformed {
            detail: format!("{path}: {err}"),
        })?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Malformed {
                detail: format!("{path}: base URL cannot carry path segments"),
            })?
            .push(segment);
        Ok(url.into())
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// Login bypasses the 401 handling: any 4xx, including 401, is reported as
    /// [`ApiError::InvalidCredentials`] and nothing is written.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let body = LoginRequest {
            email: email.trim(),
            password,
        };
        let (status, text) = self
            .send(Method::POST, self.url(LOGIN_PATH), LOGIN_PATH, Some(&body), false)
            .await?;

        if status.is_server_error() {
            return Err(ApiError::ServerError {
                status: status.as_u16(),
                message: error::error_message(&text),
            });
        }
        if !status.is_success() {
            let mut message = error::error_message(&text);
            if message.is_empty() {
                message = "Login failed".to_string();
            }
            tracing::info!(http_status = status.as_u16(), "login rejected");
            return Err(ApiError::InvalidCredentials { message });
        }

        let session: Session = decode(LOGIN_PATH, &text)?;
        if session.token.trim().is_empty() {
            return Err(ApiError::Malformed {
                detail: "login response carried an empty token".to_string(),
            });
        }

        self.gate
            .establish(&session)
            .await
            .map_err(|err| ApiError::Storage {
                detail: format!("{err:#}"),
            })?;

        Ok(session)
    }

    pub async fn logout(&self) {
        self.gate.logout().await;
    }
}

fn decode<T: DeserializeOwned>(path: &str, text: &str) -> Result<T, ApiError> {
    serde_json::from_str::<T>(text).map_err(|err| {
        tracing::warn!(path, error = %err, "API response did not match the expected shape");
        ApiError::Malformed {
            detail: format!("{path}: {err}"),
        }
    })
}

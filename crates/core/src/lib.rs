pub mod analytics;
pub mod api;
pub mod domain;
pub mod session;
pub mod storage;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;
    use std::time::Duration;

    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub api_base_url: Option<String>,
        pub http_timeout: Duration,
        pub credentials_path: Option<PathBuf>,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                api_base_url: None,
                http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                credentials_path: None,
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let timeout_secs = match std::env::var("EBIKRI_HTTP_TIMEOUT_SECS") {
                Ok(s) => s
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("EBIKRI_HTTP_TIMEOUT_SECS is not a number: {s}"))?,
                Err(_) => DEFAULT_TIMEOUT_SECS,
            };
            anyhow::ensure!(timeout_secs > 0, "EBIKRI_HTTP_TIMEOUT_SECS must be >= 1");

            Ok(Self {
                // The Expo build shipped the base URL as EXPO_PUBLIC_API_URL; keep reading it.
                api_base_url: non_empty_var("EBIKRI_API_URL")
                    .or_else(|| non_empty_var("EXPO_PUBLIC_API_URL")),
                http_timeout: Duration::from_secs(timeout_secs),
                credentials_path: non_empty_var("EBIKRI_CREDENTIALS_PATH").map(PathBuf::from),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_api_base_url(&self) -> anyhow::Result<&str> {
            self.api_base_url
                .as_deref()
                .context("EBIKRI_API_URL is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn missing_base_url_is_reported_by_name() {
            let settings = Settings::default();
            let err = settings.require_api_base_url().unwrap_err();
            assert!(err.to_string().contains("EBIKRI_API_URL"));
        }

        #[test]
        fn default_timeout_is_thirty_seconds() {
            assert_eq!(Settings::default().http_timeout, Duration::from_secs(30));
        }
    }
}

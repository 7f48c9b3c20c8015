use std::env;
use std::time::Duration;

use crate::error::{ClientError, Result};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_RESULT_DELAY: Duration = Duration::from_millis(1000);

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST API
    pub api_url: String,
    /// Base URL for realtime connections
    pub ws_url: String,
    /// Pause before a finished game's result is shown
    pub result_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: ws_url_for(DEFAULT_API_URL),
            result_delay: DEFAULT_RESULT_DELAY,
        }
    }
}

impl ClientConfig {
    /// Reads `CHESS_API_URL`, `CHESS_WS_URL` and `CHESS_RESULT_DELAY_MS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("CHESS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ClientError::Config(format!("CHESS_API_URL must be http(s): {}", api_url)));
        }
        let api_url = api_url.trim_end_matches('/').to_string();
        let ws_url = lookup("CHESS_WS_URL").unwrap_or_else(|| ws_url_for(&api_url));

        let result_delay = match lookup("CHESS_RESULT_DELAY_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| ClientError::Config(format!("CHESS_RESULT_DELAY_MS {:?}: {}", raw, e)))?,
            None => DEFAULT_RESULT_DELAY,
        };

        Ok(ClientConfig {
            api_url,
            ws_url: ws_url.trim_end_matches('/').to_string(),
            result_delay,
        })
    }
}

/// Derives the websocket base URL from the API URL
pub fn ws_url_for(api_url: &str) -> String {
    if let Some(rest) = api_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = api_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        api_url.to_string()
    }
}

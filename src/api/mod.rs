//! REST client for the chess backend.

pub mod auth;
pub mod game;
pub mod routes;
pub mod users;

use awc::error::PayloadError;
use awc::{ClientRequest, ClientResponse};
use bytes::Bytes;
use futures::Stream;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::models::AppState;

pub use game::{AiSubmitter, MultiplayerSubmitter};

/// HTTP client bound to one backend and one application state
#[derive(Clone)]
pub struct ApiClient {
    client: awc::Client,
    base_url: String,
    app_state: Arc<AppState>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, app_state: Arc<AppState>) -> Self {
        ApiClient {
            client: awc::Client::new(),
            base_url: config.api_url.clone(),
            app_state,
        }
    }

    pub fn app_state(&self) -> &Arc<AppState> {
        &self.app_state
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request without credentials
    fn public_post(&self, path: &str) -> ClientRequest {
        self.client.post(self.url(path))
    }

    /// Request carrying the bearer token, if one is held
    fn post(&self, path: &str) -> ClientRequest {
        self.authorize(self.client.post(self.url(path)))
    }

    fn get(&self, path: &str) -> ClientRequest {
        self.authorize(self.client.get(self.url(path)))
    }

    fn authorize(&self, request: ClientRequest) -> ClientRequest {
        match self.app_state.access_token() {
            Some(token) => request.bearer_auth(token),
            None => {
                debug!("No access token for {}", request.get_uri());
                request
            }
        }
    }
}

/// Decodes a successful JSON response, or turns the status into an error.
async fn read_json<S, T>(mut response: ClientResponse<S>) -> Result<T>
where
    S: Stream<Item = std::result::Result<Bytes, PayloadError>> + Unpin,
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = match response.body().await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => e.to_string(),
        };
        warn!("Request failed with {}: {}", status, body);
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json::<T>().limit(4 * 1024 * 1024).await?)
}

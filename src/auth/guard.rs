use chrono::Utc;
use log::{debug, info, warn};

use crate::api::ApiClient;
use crate::auth::TokenClaims;
use crate::error::{ClientError, Result};

/// Gate in front of commands that need a signed-in user
pub struct AuthGuard;

impl AuthGuard {
    /// Succeeds when a live access token is held, refreshing an expired one once.
    pub async fn authorize(api: &ApiClient) -> Result<()> {
        let token = match api.app_state().access_token() {
            Some(token) => token,
            None => {
                debug!("No access token held");
                return Err(ClientError::Unauthorized);
            }
        };

        let expired = match TokenClaims::decode(&token) {
            Ok(claims) => claims.is_expired(Utc::now()),
            Err(e) => {
                warn!("Unreadable access token: {}", e);
                return Err(ClientError::Unauthorized);
            }
        };
        if !expired {
            return Ok(());
        }

        info!("Access token expired, refreshing");
        api.refresh_access_token().await.map_err(|_| ClientError::Unauthorized)
    }
}

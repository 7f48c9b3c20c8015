use log::{info, warn};

use crate::api::{read_json, routes, ApiClient};
use crate::error::{ClientError, Result};
use crate::models::{lock, LogoutResponse, RegisterRequest, TokenResponse, UserRecord};

impl ApiClient {
    /// Posts form-encoded credentials. The refresh cookie set by the server is kept for `refresh`.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let response = self
            .public_post(routes::AUTH_LOGIN)
            .send_form(&[("username", username), ("password", password)])
            .await?;
        if let Some(cookie) = response.cookie(routes::REFRESH_COOKIE) {
            lock(&self.app_state.auth).refresh_cookie = Some(cookie);
        }
        read_json(response).await
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<UserRecord> {
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.public_post(routes::AUTH_REGISTER).send_json(&request).await?;
        read_json(response).await
    }

    pub async fn refresh(&self) -> Result<TokenResponse> {
        let cookie = lock(&self.app_state.auth).refresh_cookie.clone();
        let request = match cookie {
            Some(cookie) => self.public_post(routes::AUTH_REFRESH).cookie(cookie),
            None => self.public_post(routes::AUTH_REFRESH),
        };
        let response = request.send().await?;
        read_json(response).await
    }

    pub async fn logout(&self) -> Result<LogoutResponse> {
        let response = self.post(routes::AUTH_LOGOUT).send().await?;
        read_json(response).await
    }

    pub async fn fetch_profile(&self) -> Result<UserRecord> {
        let response = self.get(routes::USERS_ME).send().await?;
        read_json(response).await
    }

    /// Logs in and loads the profile. Any failure leaves the auth state reset.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<UserRecord> {
        match self.try_sign_in(username, password).await {
            Ok(user) => {
                info!("Logged in as {}", user.username);
                Ok(user)
            }
            Err(e) => {
                warn!("Login failed for {}: {}", username, e);
                self.app_state.reset_auth();
                Err(e)
            }
        }
    }

    async fn try_sign_in(&self, username: &str, password: &str) -> Result<UserRecord> {
        let token = self.login(username, password).await?;
        if token.access_token.is_empty() {
            return Err(ClientError::MissingCredential);
        }
        self.app_state.set_access_token(token.access_token);

        let user = self.fetch_profile().await?;
        let mut auth = lock(&self.app_state.auth);
        auth.user = Some(user.clone());
        auth.logged_in = true;
        Ok(user)
    }

    /// Registers an account and keeps the returned user record.
    pub async fn sign_up(&self, username: &str, email: &str, password: &str) -> Result<UserRecord> {
        match self.register(username, email, password).await {
            Ok(user) => {
                lock(&self.app_state.auth).user = Some(user.clone());
                Ok(user)
            }
            Err(e) => {
                self.app_state.reset_auth();
                Err(e)
            }
        }
    }

    pub async fn sign_out(&self) -> Result<()> {
        let response = self.logout().await?;
        info!("{}", response.message);
        self.app_state.reset_auth();
        Ok(())
    }

    /// Swaps in a fresh access token, resetting auth state when refresh fails.
    pub async fn refresh_access_token(&self) -> Result<()> {
        match self.refresh().await {
            Ok(token) if !token.access_token.is_empty() => {
                self.app_state.set_access_token(token.access_token);
                Ok(())
            }
            Ok(_) => {
                self.app_state.reset_auth();
                Err(ClientError::MissingCredential)
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                self.app_state.reset_auth();
                Err(e)
            }
        }
    }
}

use crate::api::{read_json, routes, ApiClient};
use crate::error::Result;
use crate::models::{RecentGame, UserRecord, UserStats};

impl ApiClient {
    pub async fn fetch_user(&self, user_id: &str) -> Result<UserRecord> {
        let response = self.get(&routes::user(user_id)).send().await?;
        read_json(response).await
    }

    pub async fn fetch_user_stats(&self, user_id: &str) -> Result<UserStats> {
        let response = self.get(&routes::user_stats(user_id)).send().await?;
        read_json(response).await
    }

    pub async fn fetch_user_games(&self, user_id: &str) -> Result<Vec<RecentGame>> {
        let response = self.get(&routes::user_games(user_id)).send().await?;
        read_json(response).await
    }
}

use async_trait::async_trait;
use log::{info, warn};
use serde_json::Value;
use std::time::Duration;

use crate::api::{read_json, routes, ApiClient};
use crate::error::{ClientError, Result};
use crate::game::MoveSubmitter;
use crate::models::{
    lock, AiCreateRequest, AiDifficulty, GameCreated, GameId, GameStatus, JoinRequest, MoveOutcome, MoveRequest,
    Notice, ResignOutcome, ResignRequest, Side, Winner,
};

impl ApiClient {
    pub async fn create_game(&self) -> Result<GameCreated> {
        let response = self.post(routes::GAME_CREATE).send_json(&serde_json::json!({})).await?;
        read_json(response).await
    }

    pub async fn join_game(&self, game_id: GameId) -> Result<GameCreated> {
        let response = self.post(routes::GAME_JOIN).send_json(&JoinRequest { game_id }).await?;
        read_json(response).await
    }

    /// Submits a multiplayer move. The new position arrives over the realtime channel.
    pub async fn submit_move(&self, game_id: GameId, notation: &str) -> Result<Value> {
        let request = MoveRequest {
            game_id,
            notation: notation.to_string(),
        };
        let response = self.post(routes::GAME_MOVE).send_json(&request).await?;
        read_json(response).await
    }

    pub async fn resign_game(&self, game_id: GameId) -> Result<ResignOutcome> {
        let response = self.post(routes::GAME_RESIGN).send_json(&ResignRequest { game_id }).await?;
        read_json(response).await
    }

    pub async fn create_ai_game(&self, difficulty: AiDifficulty) -> Result<GameCreated> {
        let request = AiCreateRequest {
            ai_difficulty: difficulty,
        };
        let response = self.post(routes::AI_CREATE).send_json(&request).await?;
        read_json(response).await
    }

    /// Submits a move against the AI; the response already holds the AI's reply.
    pub async fn ai_move(&self, game_id: GameId, notation: &str) -> Result<MoveOutcome> {
        let request = MoveRequest {
            game_id,
            notation: notation.to_string(),
        };
        let response = self.post(routes::AI_MOVE).send_json(&request).await?;
        read_json(response).await
    }

    pub async fn ai_resign(&self, game_id: GameId) -> Result<ResignOutcome> {
        let response = self.post(routes::AI_RESIGN).send_json(&ResignRequest { game_id }).await?;
        read_json(response).await
    }

    /// Creates a multiplayer game and stores it as the active session. The creator plays white.
    pub async fn start_new_game(&self) -> Result<GameCreated> {
        let created = self.create_game().await.map_err(|e| self.fail("Failed to create game", e))?;
        self.store_session(&created, Side::White);
        Ok(created)
    }

    /// Joins a game by id and stores it as the active session. The joiner plays black.
    pub async fn join_existing_game(&self, game_id: GameId) -> Result<GameCreated> {
        let joined = self.join_game(game_id).await.map_err(|e| self.fail("Invalid join code", e))?;
        self.store_session(&joined, Side::Black);
        Ok(joined)
    }

    pub async fn start_ai_game(&self, difficulty: AiDifficulty) -> Result<GameCreated> {
        let created = self
            .create_ai_game(difficulty)
            .await
            .map_err(|e| self.fail("Failed to create game", e))?;
        self.store_session(&created, Side::White);
        self.app_state
            .notify(Notice::info(format!("Game created! White. Difficulty: {:?}", difficulty)));
        Ok(created)
    }

    /// Resigns the active game.
    ///
    /// In multiplayer the result arrives as a resign event on the realtime
    /// channel; against the AI it is shown from the response.
    pub async fn resign(&self, mode: GameMode) -> Result<Winner> {
        let game_id = self.app_state.game().game_id.ok_or(ClientError::NoActiveGame)?;
        let outcome = match mode {
            GameMode::Multiplayer => self.resign_game(game_id).await,
            GameMode::Ai => self.ai_resign(game_id).await,
        }
        .map_err(|e| self.fail("Failed to resign game", e))?;

        if mode == GameMode::Ai {
            self.app_state.show_result(outcome.winner);
        }
        Ok(outcome.winner)
    }

    fn store_session(&self, created: &GameCreated, player: Side) {
        info!("Entering game {} as {:?} ({:?})", created.id, player, created.status);
        lock(&self.app_state.game).reset();
        lock(&self.app_state.result).reset();
        lock(&self.app_state.game).set_game(created.id, created.fen.clone(), created.status, player);
    }

    fn fail(&self, text: &str, error: ClientError) -> ClientError {
        warn!("{}: {}", text, error);
        self.app_state.notify(Notice::error(text));
        error
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Multiplayer,
    Ai,
}

/// Submits moves of a multiplayer game
pub struct MultiplayerSubmitter<'a> {
    pub api: &'a ApiClient,
}

#[async_trait(?Send)]
impl MoveSubmitter for MultiplayerSubmitter<'_> {
    async fn submit_move(&self, game_id: GameId, notation: &str) -> Result<()> {
        self.api.submit_move(game_id, notation).await.map(|_| ())
    }
}

/// Submits moves against the AI and applies the returned position
pub struct AiSubmitter<'a> {
    pub api: &'a ApiClient,
    pub result_delay: Duration,
}

#[async_trait(?Send)]
impl MoveSubmitter for AiSubmitter<'_> {
    async fn submit_move(&self, game_id: GameId, notation: &str) -> Result<()> {
        let outcome = self.api.ai_move(game_id, notation).await?;
        let app_state = self.api.app_state().clone();
        lock(&app_state.game).update_game(outcome.fen, outcome.status, outcome.winner);

        if let (GameStatus::Finished, Some(winner)) = (outcome.status, outcome.winner) {
            let delay = self.result_delay;
            actix::spawn(async move {
                actix_rt::time::sleep(delay).await;
                app_state.show_result(winner);
            });
        }
        Ok(())
    }
}

use actix::Message;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::game_state::{deserialize_winner, GameId, GameStatus, Position, Winner};

/// Event pushed by the server over the realtime channel
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    Move {
        fen: Position,
        status: GameStatus,
        #[serde(default, deserialize_with = "deserialize_winner")]
        winner: Option<Winner>,
    },
    Resign {
        winner: Winner,
    },
}

impl ServerEvent {
    pub fn parse(text: &str) -> crate::Result<ServerEvent> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Response of create, join and AI create
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GameCreated {
    pub id: GameId,
    pub fen: Position,
    pub status: GameStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JoinRequest {
    pub game_id: GameId,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MoveRequest {
    pub game_id: GameId,
    #[serde(rename = "move")]
    pub notation: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResignRequest {
    pub game_id: GameId,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AiCreateRequest {
    pub ai_difficulty: AiDifficulty,
}

/// Response of an AI move: the position after both moves
#[derive(Deserialize, Debug, Clone)]
pub struct MoveOutcome {
    pub fen: Position,
    pub status: GameStatus,
    #[serde(default, deserialize_with = "deserialize_winner")]
    pub winner: Option<Winner>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResignOutcome {
    pub winner: Winner,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserStats {
    pub total_games: u32,
    pub multiplayer_wins: u32,
    pub multiplayer_losses: u32,
    pub multiplayer_win_rate: String,
    pub most_played_color: Option<String>,
    pub best_streak: u32,
    pub ai_games: u32,
    pub ai_wins: u32,
    pub ai_losses: u32,
    pub ai_win_rate: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecentGame {
    pub opponent_username: String,
    pub opponent_id: Option<String>,
    pub result: GameResult,
    pub game_type: String,
    #[serde(with = "timestamp")]
    pub date: DateTime<Utc>,
}

/// Backend timestamps are stored without a zone and sent naive; they are UTC.
/// Offset forms are accepted too.
mod timestamp {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(with_offset.with_timezone(&Utc));
        }
        raw.parse::<NaiveDateTime>()
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct LogoutResponse {
    pub message: String,
}

/// Identifies one realtime connection attempt
pub type ConnectionId = Uuid;

/// Notification from a socket to the channel that owns it
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct SocketEvent {
    pub connection: ConnectionId,
    pub kind: SocketEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketEventKind {
    Opened,
    Text(String),
    Closed,
}

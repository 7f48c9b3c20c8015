use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;

/// Server-assigned game identifier
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The side a player controls
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Ongoing,
    Finished,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    White,
    Black,
    Draw,
}

/// Reads a winner field, treating `null` and the server's `"ongoing"` marker as no winner.
pub fn deserialize_winner<'de, D>(deserializer: D) -> Result<Option<Winner>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("ongoing") => Ok(None),
        Some("white") => Ok(Some(Winner::White)),
        Some("black") => Ok(Some(Winner::Black)),
        Some("draw") => Ok(Some(Winner::Draw)),
        Some(other) => Err(serde::de::Error::unknown_variant(
            other,
            &["white", "black", "draw", "ongoing"],
        )),
    }
}

/// Serialized board state: a FEN string or the `startpos` sentinel.
///
/// Positions are snapshots. A new one replaces the old wholesale. Decoding
/// from the wire goes through `parse`, so a received position always loads.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct Position(String);

impl Position {
    pub const START_SENTINEL: &'static str = "startpos";

    /// Wraps a FEN produced locally, without checking it.
    pub fn new(fen: impl Into<String>) -> Self {
        Position(fen.into())
    }

    /// Accepts the sentinel or a FEN the rules engine can load.
    pub fn parse(fen: impl Into<String>) -> Result<Self, ClientError> {
        let fen = fen.into();
        if fen != Self::START_SENTINEL && chess::Board::from_str(&fen).is_err() {
            return Err(ClientError::InvalidPosition { fen });
        }
        Ok(Position(fen))
    }

    pub fn start() -> Self {
        Position(Self::START_SENTINEL.to_string())
    }

    pub fn is_start_sentinel(&self) -> bool {
        self.0 == Self::START_SENTINEL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::start()
    }
}

impl TryFrom<String> for Position {
    type Error = ClientError;

    fn try_from(fen: String) -> Result<Self, Self::Error> {
        Position::parse(fen)
    }
}

impl From<Position> for String {
    fn from(position: Position) -> String {
        position.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Game session as seen by this client
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameSession {
    pub game_id: Option<GameId>,
    pub position: Position,
    pub player: Option<Side>,
    pub status: Option<GameStatus>,
    pub winner: Option<Winner>,
}

impl GameSession {
    pub fn set_game(&mut self, game_id: GameId, position: Position, status: GameStatus, player: Side) {
        self.game_id = Some(game_id);
        self.position = position;
        self.status = Some(status);
        self.player = Some(player);
    }

    /// Server-authoritative update.
    pub fn update_game(&mut self, position: Position, status: GameStatus, winner: Option<Winner>) {
        self.position = position;
        self.status = Some(status);
        self.winner = winner;
    }

    /// Optimistic update of the board only.
    pub fn update_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn reset(&mut self) {
        *self = GameSession::default();
    }
}

//! Realtime synchronization channel.
//!
//! `SyncChannel` owns at most one connection, scoped to the active game. It
//! does no I/O itself: a `Connector` opens connections and the owner feeds
//! socket notifications back through `handle_event`. Every connection gets a
//! fresh id, so notifications from a superseded connection are dropped.

use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{ClientError, Result};
use crate::models::{
    lock, AppState, ConnectionId, GameId, GameStatus, ServerEvent, SocketEvent, SocketEventKind, Winner,
};

pub trait ConnectionHandle {
    /// Closes the connection. Must be safe on a connection that is still
    /// connecting or already gone.
    fn close(&mut self);
}

pub trait Connector {
    type Handle: ConnectionHandle;

    fn connect(&mut self, request: ConnectRequest) -> Result<Self::Handle>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub connection: ConnectionId,
    pub game_id: GameId,
    pub url: String,
    pub credential: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPhase {
    Closed,
    Connecting,
    Open,
}

/// Work the owner must schedule on the channel's behalf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEffect {
    ShowResultAfter { delay: Duration, winner: Winner },
}

struct ActiveConnection<H> {
    id: ConnectionId,
    game_id: GameId,
    handle: H,
    open: bool,
}

pub struct SyncChannel<C: Connector> {
    connector: C,
    app_state: Arc<AppState>,
    ws_url: String,
    result_delay: Duration,
    active: Option<ActiveConnection<C::Handle>>,
}

impl<C: Connector> SyncChannel<C> {
    pub fn new(connector: C, app_state: Arc<AppState>, ws_url: impl Into<String>, result_delay: Duration) -> Self {
        SyncChannel {
            connector,
            app_state,
            ws_url: ws_url.into(),
            result_delay,
            active: None,
        }
    }

    pub fn phase(&self) -> ChannelPhase {
        match &self.active {
            None => ChannelPhase::Closed,
            Some(active) if active.open => ChannelPhase::Open,
            Some(_) => ChannelPhase::Connecting,
        }
    }

    pub fn game_id(&self) -> Option<GameId> {
        self.active.as_ref().map(|a| a.game_id)
    }

    /// Binds the channel to `game_id`, closing any connection for another game first.
    pub fn activate(&mut self, game_id: Option<GameId>) -> Result<()> {
        if let (Some(requested), Some(current)) = (game_id, self.game_id()) {
            if requested == current {
                debug!("Channel already bound to game {}", current);
                return Ok(());
            }
        }
        self.close_active();

        let Some(game_id) = game_id else {
            return Ok(());
        };
        let Some(credential) = self.app_state.access_token() else {
            error!("No access token found, not connecting to game {}", game_id);
            return Err(ClientError::MissingCredential);
        };

        let connection = Uuid::new_v4();
        let url = format!("{}/api/v1/ws/game/{}", self.ws_url.trim_end_matches('/'), game_id);
        info!("Opening connection {} to {}", connection, url);
        let handle = self.connector.connect(ConnectRequest {
            connection,
            game_id,
            url,
            credential,
        })?;
        self.active = Some(ActiveConnection {
            id: connection,
            game_id,
            handle,
            open: false,
        });
        Ok(())
    }

    /// Re-reads the game id from shared state and activates for it.
    pub fn sync_with_state(&mut self) -> Result<()> {
        let game_id = self.app_state.game().game_id;
        self.activate(game_id)
    }

    pub fn handle_event(&mut self, event: SocketEvent) -> Option<ChannelEffect> {
        let active = match self.active.as_mut() {
            Some(active) if active.id == event.connection => active,
            _ => {
                debug!("Dropping {:?} from stale connection {}", event.kind, event.connection);
                return None;
            }
        };

        match event.kind {
            SocketEventKind::Opened => {
                info!("WebSocket connected for game {}", active.game_id);
                active.open = true;
                None
            }
            SocketEventKind::Text(text) => self.handle_text(&text),
            SocketEventKind::Closed => {
                info!("WebSocket closed for game {}", active.game_id);
                // The transport is gone; nothing left to close
                self.active = None;
                None
            }
        }
    }

    /// Closes the connection if one is open or connecting. Idempotent.
    pub fn teardown(&mut self) {
        self.close_active();
    }

    fn handle_text(&mut self, text: &str) -> Option<ChannelEffect> {
        let event = match ServerEvent::parse(text) {
            Ok(event) => event,
            Err(e) => {
                warn!("Error parsing WebSocket message: {} ({})", e, text);
                return None;
            }
        };

        match event {
            ServerEvent::Move { fen, status, winner } => {
                info!("Server move: {} ({:?})", fen, status);
                lock(&self.app_state.game).update_game(fen, status, winner);
                match (status, winner) {
                    (GameStatus::Finished, Some(winner)) => Some(ChannelEffect::ShowResultAfter {
                        delay: self.result_delay,
                        winner,
                    }),
                    (GameStatus::Finished, None) => {
                        warn!("Game finished without a winner");
                        None
                    }
                    _ => None,
                }
            }
            ServerEvent::Resign { winner } => {
                info!("Opponent resigned, winner: {:?}", winner);
                self.app_state.show_result(winner);
                None
            }
        }
    }

    fn close_active(&mut self) {
        if let Some(mut active) = self.active.take() {
            info!("Closing connection {} for game {}", active.id, active.game_id);
            active.handle.close();
        }
    }
}

impl<C: Connector> Drop for SyncChannel<C> {
    fn drop(&mut self) {
        self.close_active();
    }
}

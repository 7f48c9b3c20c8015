use awc::cookie::Cookie;
use log::{info, warn};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::{GameSession, UserRecord, Winner};

/// Application state shared between the board, the channel and the front end
#[derive(Default)]
pub struct AppState {
    pub game: Mutex<GameSession>,
    pub result: Mutex<ResultState>,
    pub auth: Mutex<AuthState>,
    pub notices: Mutex<VecDeque<Notice>>,
}

/// Locks a mutex, recovering the guard if a previous holder panicked.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn game(&self) -> GameSession {
        lock(&self.game).clone()
    }

    pub fn result(&self) -> ResultState {
        lock(&self.result).clone()
    }

    pub fn access_token(&self) -> Option<String> {
        lock(&self.auth).access_token.clone()
    }

    pub fn set_access_token(&self, token: String) {
        lock(&self.auth).access_token = Some(token);
    }

    pub fn reset_auth(&self) {
        lock(&self.auth).reset();
    }

    pub fn show_result(&self, winner: Winner) {
        info!("Showing result, winner: {:?}", winner);
        lock(&self.result).show(winner);
    }

    pub fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!("Notice: {}", notice.text),
            NoticeLevel::Error => warn!("Notice: {}", notice.text),
        }
        lock(&self.notices).push_back(notice);
    }

    pub fn drain_notices(&self) -> Vec<Notice> {
        lock(&self.notices).drain(..).collect()
    }
}

/// Result overlay state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultState {
    pub visible: bool,
    pub winner: Option<Winner>,
}

impl ResultState {
    pub fn show(&mut self, winner: Winner) {
        self.visible = true;
        self.winner = Some(winner);
    }

    pub fn reset(&mut self) {
        *self = ResultState::default();
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub access_token: Option<String>,
    pub refresh_cookie: Option<Cookie<'static>>,
    pub user: Option<UserRecord>,
    pub logged_in: bool,
}

impl AuthState {
    pub fn reset(&mut self) {
        *self = AuthState::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message for the user; the front end shows it once and drops it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

//! Chess client: board interaction, realtime game synchronization and the
//! REST calls behind them.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod websocket;

pub use error::{ClientError, Result};

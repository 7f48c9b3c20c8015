//! Backend endpoint paths.

pub const GAME_CREATE: &str = "/api/v1/game/create";
pub const GAME_JOIN: &str = "/api/v1/game/join";
pub const GAME_MOVE: &str = "/api/v1/game/move";
pub const GAME_RESIGN: &str = "/api/v1/game/resign";
pub const AI_CREATE: &str = "/api/v1/game/ai/create";
pub const AI_MOVE: &str = "/api/v1/game/ai/move";
pub const AI_RESIGN: &str = "/api/v1/game/ai/resign";

pub const AUTH_LOGIN: &str = "/api/v1/auth/login";
pub const AUTH_REGISTER: &str = "/api/v1/auth/register";
pub const AUTH_REFRESH: &str = "/api/v1/auth/refresh";
pub const AUTH_LOGOUT: &str = "/api/v1/auth/logout";

pub const USERS_ME: &str = "/api/v1/users/me";

/// Name of the cookie carrying the refresh token
pub const REFRESH_COOKIE: &str = "refresh_token";

pub fn user(id: &str) -> String {
    format!("/api/v1/users/{}", id)
}

pub fn user_stats(id: &str) -> String {
    format!("/api/v1/users/{}/stats", id)
}

pub fn user_games(id: &str) -> String {
    format!("/api/v1/users/{}/games", id)
}

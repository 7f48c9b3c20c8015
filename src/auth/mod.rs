//! Session credential handling for protected commands.

pub mod guard;
pub mod token;

pub use guard::AuthGuard;
pub use token::TokenClaims;

pub mod board;
pub mod oracle;
pub mod render;
pub mod utils;

pub use board::{BoardController, ClickOutcome, Highlight, HighlightKind, MoveSubmitter, PendingMove, Selection};
pub use oracle::{ChessOracle, LegalMove, MoveIntent, RulesOracle};

//! Chess rules oracle.
//!
//! The board controller never reasons about chess rules itself. It asks an
//! oracle which moves exist from a square and what position results from a
//! move. `ChessOracle` answers with the `chess` crate.

use chess::{Board, ChessMove, MoveGen, Piece, Square};
use std::str::FromStr;

use crate::error::{ClientError, Result};
use crate::game::utils::color_to_side;
use crate::models::{Position, Side};

/// A legal move reported by the oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegalMove {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub side: Side,
    /// Piece standing on the destination, if the move captures
    pub captured: Option<Piece>,
}

/// A move the local player wants to make
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveIntent {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
}

pub trait RulesOracle {
    /// Legal moves starting on `square`, one per destination.
    fn legal_moves_from(&self, position: &Position, square: Square) -> Result<Vec<LegalMove>>;

    /// Applies `intent`, yielding the new position or `IllegalMove`.
    fn apply(&self, position: &Position, intent: &MoveIntent) -> Result<Position>;

    fn side_to_move(&self, position: &Position) -> Result<Side>;

    fn in_check(&self, position: &Position) -> Result<bool>;
}

/// Oracle backed by the `chess` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct ChessOracle;

impl ChessOracle {
    pub fn board(position: &Position) -> Result<Board> {
        if position.is_start_sentinel() {
            return Ok(Board::default());
        }
        Board::from_str(position.as_str()).map_err(|_| ClientError::InvalidPosition {
            fen: position.to_string(),
        })
    }
}

impl RulesOracle for ChessOracle {
    fn legal_moves_from(&self, position: &Position, square: Square) -> Result<Vec<LegalMove>> {
        let board = Self::board(position)?;
        let (piece, color) = match (board.piece_on(square), board.color_on(square)) {
            (Some(piece), Some(color)) => (piece, color),
            _ => return Ok(Vec::new()),
        };

        let mut moves: Vec<LegalMove> = Vec::new();
        for chess_move in MoveGen::new_legal(&board) {
            if chess_move.get_source() != square {
                continue;
            }
            let to = chess_move.get_dest();
            // Promotions come once per piece kind
            if moves.iter().any(|m| m.to == to) {
                continue;
            }
            moves.push(LegalMove {
                from: square,
                to,
                piece,
                side: color_to_side(color),
                captured: board.piece_on(to),
            });
        }
        Ok(moves)
    }

    fn apply(&self, position: &Position, intent: &MoveIntent) -> Result<Position> {
        let board = Self::board(position)?;
        let chess_move = ChessMove::new(intent.from, intent.to, intent.promotion);
        if !board.legal(chess_move) {
            return Err(ClientError::IllegalMove {
                from: intent.from.to_string(),
                to: intent.to.to_string(),
            });
        }
        Ok(Position::new(board.make_move_new(chess_move).to_string()))
    }

    fn side_to_move(&self, position: &Position) -> Result<Side> {
        Ok(color_to_side(Self::board(position)?.side_to_move()))
    }

    fn in_check(&self, position: &Position) -> Result<bool> {
        Ok(Self::board(position)?.checkers().popcnt() > 0)
    }
}

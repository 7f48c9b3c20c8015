use chess::{Color, Piece, Rank, Square};

use crate::game::oracle::LegalMove;
use crate::models::{Side, Winner};

/// Convert a chess color to the side it stands for
pub fn color_to_side(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}

/// Convert a side to a string
pub fn side_to_string(side: Side) -> String {
    match side {
        Side::White => "white".to_string(),
        Side::Black => "black".to_string(),
    }
}

/// Farthest rank for pawns of the given side
pub fn promotion_rank(side: Side) -> Rank {
    match side {
        Side::White => Rank::Eighth,
        Side::Black => Rank::First,
    }
}

/// A pawn reaching the farthest rank for its side promotes. This client always picks a queen.
pub fn infer_promotion(legal_move: &LegalMove) -> Option<Piece> {
    if legal_move.piece == Piece::Pawn && legal_move.to.get_rank() == promotion_rank(legal_move.side) {
        Some(Piece::Queen)
    } else {
        None
    }
}

/// Move notation sent to the server, e.g. `e2e4` or `e7e8=Q`
pub fn move_notation(from: Square, to: Square, promotion: Option<Piece>) -> String {
    match promotion {
        Some(_) => format!("{}{}=Q", from, to),
        None => format!("{}{}", from, to),
    }
}

/// Result headline from the local player's point of view
pub fn describe_result(winner: Winner, player: Option<Side>) -> String {
    let won = match (winner, player) {
        (Winner::Draw, _) => return "It's a Draw!".to_string(),
        (Winner::White, Some(Side::White)) | (Winner::Black, Some(Side::Black)) => true,
        _ => false,
    };
    if won {
        "You Won".to_string()
    } else {
        "You Lost".to_string()
    }
}

use chess::{Board, Color, File, Piece, Rank, Square};

use crate::game::board::{Highlight, HighlightKind};
use crate::models::Side;

fn piece_char(piece: Piece, color: Color) -> char {
    let c = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    match color {
        Color::White => c.to_ascii_uppercase(),
        Color::Black => c,
    }
}

/// Draws the board as text from `orientation`'s side.
///
/// Origin squares are wrapped in `[ ]`, destinations in `( )`, captures in
/// `{ }` and right-click marks in `< >`.
pub fn render_board(board: &Board, orientation: Side, highlights: &[Highlight], marks: &[Square]) -> String {
    let mut ranks: Vec<usize> = (0..8).rev().collect();
    let mut files: Vec<usize> = (0..8).collect();
    if orientation == Side::Black {
        ranks.reverse();
        files.reverse();
    }

    let mut out = String::new();
    for &rank in &ranks {
        out.push_str(&format!("{} ", rank + 1));
        for &file in &files {
            let square = Square::make_square(Rank::from_index(rank), File::from_index(file));
            let body = match (board.piece_on(square), board.color_on(square)) {
                (Some(piece), Some(color)) => piece_char(piece, color),
                _ => '.',
            };
            let (open, close) = match highlights.iter().find(|h| h.square == square).map(|h| h.kind) {
                Some(HighlightKind::Origin) => ('[', ']'),
                Some(HighlightKind::Move) => ('(', ')'),
                Some(HighlightKind::Capture) => ('{', '}'),
                None if marks.contains(&square) => ('<', '>'),
                None => (' ', ' '),
            };
            out.push(open);
            out.push(body);
            out.push(close);
        }
        out.push('\n');
    }

    out.push_str("  ");
    for &file in &files {
        out.push(' ');
        out.push((b'a' + file as u8) as char);
        out.push(' ');
    }
    out.push('\n');
    out
}

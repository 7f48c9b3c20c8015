use async_trait::async_trait;
use chess::Square;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::error::Result;
use crate::game::oracle::{ChessOracle, LegalMove, MoveIntent, RulesOracle};
use crate::game::utils::{infer_promotion, move_notation, side_to_string};
use crate::models::{lock, AppState, GameId, GameStatus, Notice, Position, Side};

/// Sends a move to the backend. `Ok` means the server accepted it.
#[async_trait(?Send)]
pub trait MoveSubmitter {
    async fn submit_move(&self, game_id: GameId, notation: &str) -> Result<()>;
}

/// A move applied locally and waiting for the server
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMove {
    pub game_id: GameId,
    pub notation: String,
    pub previous: Position,
    pub optimistic: Position,
}

/// Two-click selection state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
    #[default]
    NoOrigin,
    OriginSelected {
        origin: Square,
        destinations: Vec<LegalMove>,
    },
    SubmissionInFlight {
        pending: PendingMove,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Nothing to select on that square
    Ignored,
    /// The square holds movable pieces the player may not move now
    Rejected,
    Selected(Square),
    /// A move was applied optimistically and must be submitted
    Submit(PendingMove),
    /// A submitted move finished
    Submitted { notation: String, accepted: bool },
    /// A previous submission is still outstanding
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    Origin,
    Move,
    Capture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub square: Square,
    pub kind: HighlightKind,
}

/// Board interaction controller
pub struct BoardController<O = ChessOracle> {
    oracle: O,
    app_state: Arc<AppState>,
    selection: Selection,
    marks: Vec<Square>,
    check_announced: Option<Position>,
}

impl BoardController<ChessOracle> {
    pub fn new(app_state: Arc<AppState>) -> Self {
        Self::with_oracle(ChessOracle, app_state)
    }
}

impl<O: RulesOracle> BoardController<O> {
    pub fn with_oracle(oracle: O, app_state: Arc<AppState>) -> Self {
        BoardController {
            oracle,
            app_state,
            selection: Selection::NoOrigin,
            marks: Vec::new(),
            check_announced: None,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn marks(&self) -> &[Square] {
        &self.marks
    }

    /// The board is drawn from the local player's side.
    pub fn orientation(&self) -> Side {
        match self.app_state.game().player {
            Some(Side::Black) => Side::Black,
            _ => Side::White,
        }
    }

    pub fn highlights(&self) -> Vec<Highlight> {
        match &self.selection {
            Selection::OriginSelected { origin, destinations } => {
                let mut highlights: Vec<Highlight> = destinations
                    .iter()
                    .map(|m| Highlight {
                        square: m.to,
                        kind: if m.captured.is_some() {
                            HighlightKind::Capture
                        } else {
                            HighlightKind::Move
                        },
                    })
                    .collect();
                highlights.push(Highlight {
                    square: *origin,
                    kind: HighlightKind::Origin,
                });
                highlights
            }
            _ => Vec::new(),
        }
    }

    /// Right click toggles an annotation mark.
    pub fn on_square_right_click(&mut self, square: Square) {
        if let Some(index) = self.marks.iter().position(|s| *s == square) {
            self.marks.remove(index);
        } else {
            self.marks.push(square);
        }
    }

    /// Left click. Returns `Submit` when a move has been applied optimistically;
    /// the caller must then report the server's answer to `complete_submission`.
    pub fn on_square_click(&mut self, square: Square) -> ClickOutcome {
        self.marks.clear();

        match std::mem::take(&mut self.selection) {
            Selection::SubmissionInFlight { pending } => {
                debug!("Ignoring click on {} while {} is in flight", square, pending.notation);
                self.selection = Selection::SubmissionInFlight { pending };
                self.app_state.notify(Notice::info("Waiting for the previous move to be confirmed"));
                ClickOutcome::Busy
            }
            Selection::NoOrigin => self.select_origin(square),
            Selection::OriginSelected { origin, destinations } => {
                match destinations.iter().find(|m| m.to == square) {
                    Some(legal_move) => self.commit(*legal_move),
                    None => {
                        debug!("{} is not a destination from {}, reselecting", square, origin);
                        self.select_origin(square)
                    }
                }
            }
        }
    }

    /// Finishes an outstanding submission, rolling back on failure.
    pub fn complete_submission(&mut self, result: Result<()>) -> ClickOutcome {
        let pending = match std::mem::take(&mut self.selection) {
            Selection::SubmissionInFlight { pending } => pending,
            other => {
                warn!("No submission in flight, keeping selection {:?}", other);
                self.selection = other;
                return ClickOutcome::Ignored;
            }
        };
        self.marks.clear();

        let accepted = match result {
            Ok(()) => {
                info!("Move {} accepted for game {}", pending.notation, pending.game_id);
                true
            }
            Err(e) => {
                warn!("Move {} failed for game {}: {}", pending.notation, pending.game_id, e);
                self.roll_back(&pending);
                self.app_state.notify(Notice::error("Failed to move game"));
                false
            }
        };

        ClickOutcome::Submitted {
            notation: pending.notation,
            accepted,
        }
    }

    /// Click handling with submission included.
    pub async fn click<S>(&mut self, square: Square, submitter: &S) -> ClickOutcome
    where
        S: MoveSubmitter + ?Sized,
    {
        match self.on_square_click(square) {
            ClickOutcome::Submit(pending) => {
                let result = submitter.submit_move(pending.game_id, &pending.notation).await;
                self.complete_submission(result)
            }
            other => other,
        }
    }

    /// Issues a check notice once for each new position that has the side to move in check.
    pub fn refresh(&mut self) {
        let position = self.app_state.game().position;
        self.announce_check(&position);
    }

    fn select_origin(&mut self, square: Square) -> ClickOutcome {
        self.selection = Selection::NoOrigin;
        let session = self.app_state.game();

        let destinations = match self.oracle.legal_moves_from(&session.position, square) {
            Ok(moves) => moves,
            Err(e) => {
                warn!("Cannot list moves from {}: {}", square, e);
                return ClickOutcome::Ignored;
            }
        };
        let Some(first) = destinations.first() else {
            return ClickOutcome::Ignored;
        };

        let refusal = match session.status {
            Some(GameStatus::Waiting) => Some("Waiting for an opponent to join"),
            Some(GameStatus::Finished) => Some("The game is over"),
            _ if session.player != Some(first.side) => Some("Not your turn"),
            _ => None,
        };
        if let Some(text) = refusal {
            self.app_state.notify(Notice::info(text));
            return ClickOutcome::Rejected;
        }

        self.selection = Selection::OriginSelected {
            origin: square,
            destinations,
        };
        ClickOutcome::Selected(square)
    }

    fn commit(&mut self, legal_move: LegalMove) -> ClickOutcome {
        let session = self.app_state.game();
        let Some(game_id) = session.game_id else {
            warn!("Move attempted without an active game");
            return ClickOutcome::Ignored;
        };

        let promotion = infer_promotion(&legal_move);
        let intent = MoveIntent {
            from: legal_move.from,
            to: legal_move.to,
            promotion,
        };
        let previous = session.position;
        let optimistic = match self.oracle.apply(&previous, &intent) {
            Ok(position) => position,
            Err(e) => {
                debug!("Oracle refused {:?}: {}", intent, e);
                return self.select_origin(legal_move.to);
            }
        };

        lock(&self.app_state.game).update_position(optimistic.clone());
        self.announce_check(&optimistic);

        let pending = PendingMove {
            game_id,
            notation: move_notation(intent.from, intent.to, promotion),
            previous,
            optimistic,
        };
        info!("Submitting {} for game {}", pending.notation, game_id);
        self.selection = Selection::SubmissionInFlight {
            pending: pending.clone(),
        };
        ClickOutcome::Submit(pending)
    }

    fn roll_back(&self, pending: &PendingMove) {
        let mut game = lock(&self.app_state.game);
        if game.game_id == Some(pending.game_id) && game.position == pending.optimistic {
            info!("Rolling back {} to {}", pending.notation, pending.previous);
            game.update_position(pending.previous.clone());
        } else {
            // A server update already replaced the optimistic position
            info!("Skipping rollback of {}, position was superseded", pending.notation);
        }
    }

    fn announce_check(&mut self, position: &Position) {
        if self.check_announced.as_ref() == Some(position) {
            return;
        }
        match (self.oracle.in_check(position), self.oracle.side_to_move(position)) {
            (Ok(true), Ok(side)) => {
                self.check_announced = Some(position.clone());
                let mut name = side_to_string(side);
                name[..1].make_ascii_uppercase();
                self.app_state.notify(Notice::info(format!("{} is in check", name)));
            }
            (Ok(false), _) => {}
            (Err(e), _) | (_, Err(e)) => warn!("Cannot evaluate check for {}: {}", position, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::game::utils::color_to_side;
    use chess::{Board, ChessMove, Color, MoveGen, Piece, Rank};
    use std::cell::RefCell;
    use std::str::FromStr;

    fn sq(name: &str) -> Square {
        Square::from_str(name).unwrap()
    }

    fn state_with(position: Position, status: GameStatus, player: Side) -> Arc<AppState> {
        let state = Arc::new(AppState::new());
        lock(&state.game).set_game(GameId(42), position, status, player);
        state
    }

    fn white_at_start() -> (Arc<AppState>, BoardController) {
        let state = state_with(Position::start(), GameStatus::Ongoing, Side::White);
        let controller = BoardController::new(state.clone());
        (state, controller)
    }

    struct RecordingSubmitter {
        accept: bool,
        sent: RefCell<Vec<String>>,
    }

    #[async_trait(?Send)]
    impl MoveSubmitter for RecordingSubmitter {
        async fn submit_move(&self, _game_id: GameId, notation: &str) -> Result<()> {
            self.sent.borrow_mut().push(notation.to_string());
            if self.accept {
                Ok(())
            } else {
                Err(ClientError::Status {
                    status: 400,
                    body: "Invalid move".to_string(),
                })
            }
        }
    }

    #[test]
    fn clicking_square_without_moves_selects_nothing() {
        let (_state, mut controller) = white_at_start();
        for name in ["e4", "a1", "d1", "h5"] {
            assert_eq!(controller.on_square_click(sq(name)), ClickOutcome::Ignored);
            assert_eq!(controller.selection(), &Selection::NoOrigin);
        }
    }

    #[test]
    fn selecting_origin_highlights_destinations() {
        let (_state, mut controller) = white_at_start();
        assert_eq!(controller.on_square_click(sq("g1")), ClickOutcome::Selected(sq("g1")));
        let highlights = controller.highlights();
        assert_eq!(highlights.len(), 3);
        assert!(highlights.contains(&Highlight {
            square: sq("g1"),
            kind: HighlightKind::Origin
        }));
        assert!(highlights.contains(&Highlight {
            square: sq("f3"),
            kind: HighlightKind::Move
        }));
    }

    #[test]
    fn capture_destinations_are_marked() {
        let position = Position::new("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
        let state = state_with(position, GameStatus::Ongoing, Side::White);
        let mut controller = BoardController::new(state);
        controller.on_square_click(sq("e4"));
        assert!(controller.highlights().contains(&Highlight {
            square: sq("d5"),
            kind: HighlightKind::Capture
        }));
    }

    #[test]
    fn e2_e4_applies_optimistically_and_clears_selection() {
        let (state, mut controller) = white_at_start();
        controller.on_square_click(sq("e2"));
        let pending = match controller.on_square_click(sq("e4")) {
            ClickOutcome::Submit(pending) => pending,
            other => panic!("expected submission, got {:?}", other),
        };
        let expected = Board::default().make_move_new(ChessMove::new(sq("e2"), sq("e4"), None));
        assert_eq!(pending.notation, "e2e4");
        assert_eq!(state.game().position.as_str(), expected.to_string());
        assert_eq!(pending.previous, Position::start());

        assert_eq!(
            controller.complete_submission(Ok(())),
            ClickOutcome::Submitted {
                notation: "e2e4".to_string(),
                accepted: true
            }
        );
        assert_eq!(controller.selection(), &Selection::NoOrigin);
        assert_eq!(state.game().position.as_str(), expected.to_string());
    }

    #[test]
    fn every_legal_move_applies_like_the_rules_engine() {
        let positions = [
            Position::start(),
            Position::new("r3k2r/pppq1ppp/2npbn2/2b1p3/2B1P3/2NPBN2/PPPQ1PPP/R3K2R w KQkq - 0 1"),
            Position::new("r3k2r/pppq1ppp/2npbn2/2b1p3/2B1P3/2NPBN2/PPPQ1PPP/R3K2R b KQkq - 0 1"),
            Position::new("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3"),
            Position::new("1n2k3/P1P5/8/8/8/8/1p5p/4K1N1 w - - 0 1"),
            Position::new("1n2k3/P1P5/8/8/8/8/1p5p/4K1N1 b - - 0 1"),
        ];

        for position in positions {
            let board = ChessOracle::board(&position).unwrap();
            let player = color_to_side(board.side_to_move());
            let last_rank = match board.side_to_move() {
                Color::White => Rank::Eighth,
                Color::Black => Rank::First,
            };
            let mut pairs: Vec<(Square, Square)> = MoveGen::new_legal(&board)
                .map(|m| (m.get_source(), m.get_dest()))
                .collect();
            pairs.dedup();
            assert!(!pairs.is_empty());

            for (from, to) in pairs {
                let state = state_with(position.clone(), GameStatus::Ongoing, player);
                let mut controller = BoardController::new(state.clone());
                assert_eq!(controller.on_square_click(from), ClickOutcome::Selected(from));
                let pending = match controller.on_square_click(to) {
                    ClickOutcome::Submit(pending) => pending,
                    other => panic!("{}{} in {}: expected submission, got {:?}", from, to, position, other),
                };

                let promotes = board.piece_on(from) == Some(Piece::Pawn) && to.get_rank() == last_rank;
                let promotion = if promotes { Some(Piece::Queen) } else { None };
                let expected = board.make_move_new(ChessMove::new(from, to, promotion)).to_string();
                assert_eq!(state.game().position.as_str(), expected, "{}{} in {}", from, to, position);
                assert_eq!(pending.optimistic.as_str(), expected);
                assert_eq!(pending.previous, position);
                assert_eq!(pending.notation.ends_with("=Q"), promotes, "{}", pending.notation);
                assert!(pending.notation.starts_with(&format!("{}{}", from, to)));

                controller.complete_submission(Ok(()));
                assert_eq!(controller.selection(), &Selection::NoOrigin);
                assert_eq!(state.game().position.as_str(), expected);
            }
        }
    }

    #[test]
    fn failed_submission_rolls_back() {
        let (state, mut controller) = white_at_start();
        controller.on_square_click(sq("b1"));
        controller.on_square_click(sq("g1"));
        controller.on_square_click(sq("e2"));
        controller.on_square_click(sq("e4"));
        assert_ne!(state.game().position, Position::start());

        let outcome = controller.complete_submission(Err(ClientError::NoActiveGame));
        assert_eq!(
            outcome,
            ClickOutcome::Submitted {
                notation: "e2e4".to_string(),
                accepted: false
            }
        );
        assert_eq!(state.game().position, Position::start());
        assert_eq!(controller.selection(), &Selection::NoOrigin);
        assert!(controller.highlights().is_empty());
        assert!(state
            .drain_notices()
            .contains(&Notice::error("Failed to move game")));
    }

    #[test]
    fn rollback_keeps_server_position() {
        let (state, mut controller) = white_at_start();
        controller.on_square_click(sq("e2"));
        controller.on_square_click(sq("e4"));

        let server = Position::new("rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq - 0 1");
        lock(&state.game).update_game(server.clone(), GameStatus::Ongoing, None);
        controller.complete_submission(Err(ClientError::NoActiveGame));
        assert_eq!(state.game().position, server);
    }

    #[test]
    fn clicks_are_ignored_while_submission_in_flight() {
        let (state, mut controller) = white_at_start();
        controller.on_square_click(sq("e2"));
        let optimistic = match controller.on_square_click(sq("e4")) {
            ClickOutcome::Submit(pending) => pending.optimistic,
            other => panic!("expected submission, got {:?}", other),
        };
        assert_eq!(controller.on_square_click(sq("e7")), ClickOutcome::Busy);
        assert_eq!(state.game().position, optimistic);
        assert!(matches!(controller.selection(), Selection::SubmissionInFlight { .. }));
    }

    #[test]
    fn non_destination_click_reselects_or_clears() {
        let (_state, mut controller) = white_at_start();
        controller.on_square_click(sq("e2"));
        assert_eq!(controller.on_square_click(sq("d2")), ClickOutcome::Selected(sq("d2")));
        assert_eq!(controller.on_square_click(sq("h5")), ClickOutcome::Ignored);
        assert_eq!(controller.selection(), &Selection::NoOrigin);
    }

    #[test]
    fn opponent_pieces_and_waiting_games_are_rejected() {
        let state = state_with(Position::start(), GameStatus::Ongoing, Side::Black);
        let mut controller = BoardController::new(state.clone());
        assert_eq!(controller.on_square_click(sq("e2")), ClickOutcome::Rejected);
        assert_eq!(controller.selection(), &Selection::NoOrigin);
        assert_eq!(state.drain_notices(), vec![Notice::info("Not your turn")]);

        let state = state_with(Position::start(), GameStatus::Waiting, Side::White);
        let mut controller = BoardController::new(state.clone());
        assert_eq!(controller.on_square_click(sq("e2")), ClickOutcome::Rejected);
        assert_eq!(state.drain_notices(), vec![Notice::info("Waiting for an opponent to join")]);
    }

    #[test]
    fn promotion_is_inferred_as_queen() {
        let state = state_with(
            Position::new("8/4P3/8/8/8/8/k7/4K3 w - - 0 1"),
            GameStatus::Ongoing,
            Side::White,
        );
        let mut controller = BoardController::new(state.clone());
        controller.on_square_click(sq("e7"));
        match controller.on_square_click(sq("e8")) {
            ClickOutcome::Submit(pending) => assert_eq!(pending.notation, "e7e8=Q"),
            other => panic!("expected submission, got {:?}", other),
        }
        assert!(state.game().position.as_str().starts_with("4Q3/"));
    }

    #[test]
    fn black_promotion_is_inferred_on_first_rank() {
        let state = state_with(
            Position::new("4k3/8/8/8/8/8/3p4/K7 b - - 0 1"),
            GameStatus::Ongoing,
            Side::Black,
        );
        let mut controller = BoardController::new(state);
        controller.on_square_click(sq("d2"));
        match controller.on_square_click(sq("d1")) {
            ClickOutcome::Submit(pending) => assert_eq!(pending.notation, "d2d1=Q"),
            other => panic!("expected submission, got {:?}", other),
        }
    }

    #[test]
    fn right_click_marks_toggle_and_clear_on_left_click() {
        let (_state, mut controller) = white_at_start();
        controller.on_square_right_click(sq("d4"));
        controller.on_square_right_click(sq("e5"));
        controller.on_square_right_click(sq("d4"));
        assert_eq!(controller.marks(), &[sq("e5")]);
        controller.on_square_click(sq("h4"));
        assert!(controller.marks().is_empty());
    }

    #[test]
    fn check_is_announced_once() {
        let state = state_with(
            Position::new("rnbqkbnr/ppppp2p/5p2/6p1/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3"),
            GameStatus::Ongoing,
            Side::White,
        );
        let mut controller = BoardController::new(state.clone());
        controller.on_square_click(sq("d1"));
        controller.on_square_click(sq("h5"));
        controller.refresh();
        let notices = state.drain_notices();
        assert_eq!(notices, vec![Notice::info("Black is in check")]);
    }

    #[test]
    fn orientation_follows_player_side() {
        let (_state, controller) = white_at_start();
        assert_eq!(controller.orientation(), Side::White);
        let state = state_with(Position::start(), GameStatus::Ongoing, Side::Black);
        assert_eq!(BoardController::new(state).orientation(), Side::Black);
    }

    #[actix_rt::test]
    async fn click_drives_submission_and_rollback() {
        let (state, mut controller) = white_at_start();
        let submitter = RecordingSubmitter {
            accept: false,
            sent: RefCell::new(Vec::new()),
        };
        controller.click(sq("e2"), &submitter).await;
        let outcome = controller.click(sq("e4"), &submitter).await;
        assert_eq!(
            outcome,
            ClickOutcome::Submitted {
                notation: "e2e4".to_string(),
                accepted: false
            }
        );
        assert_eq!(submitter.sent.borrow().as_slice(), ["e2e4".to_string()]);
        assert_eq!(state.game().position, Position::start());
        assert_eq!(controller.selection(), &Selection::NoOrigin);
    }
}

//! `GameState`: a `BoardState` plus move history, legal-move cache, and
//! terminal classification (§3.5, §6).

use std::sync::Arc;

use crate::board::apply::{finish_apply_black, finish_apply_white, partial_apply_black, partial_apply_white};
use crate::board::movegen;
use crate::board::state::BoardState;
use crate::board::types::{Move, MoveList};
use crate::nnue::{NnueEvaluator, NnueWeights};

/// Bound on the position-hash ring (§3.5, §7 "Oversized history").
pub const HASH_RING_SIZE: usize = 800;

/// Result of [`GameState::win_draw_loss`]: stalemate or insufficient
/// material is a draw, otherwise the side without a move lost.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Draw,
    BlackWins,
    WhiteWins,
}

pub struct GameState {
    board: BoardState,
    evaluator: NnueEvaluator,
    weights: Arc<NnueWeights>,
    history: Vec<Move>,
    hash_ring: Box<[u64; HASH_RING_SIZE]>,
    legal_moves: MoveList,
}

impl GameState {
    #[must_use]
    pub fn new(board: BoardState, weights: Arc<NnueWeights>) -> Self {
        let evaluator = NnueEvaluator::from_scratch(&weights, &board);
        let mut state = GameState {
            board,
            evaluator,
            weights,
            history: Vec::new(),
            hash_ring: Box::new([0u64; HASH_RING_SIZE]),
            legal_moves: MoveList::new(),
        };
        state.record_hash();
        state.recompute_legal_moves();
        state
    }

    #[must_use]
    pub fn board(&self) -> &BoardState {
        &self.board
    }

    #[must_use]
    pub fn legal_moves(&self) -> &MoveList {
        &self.legal_moves
    }

    #[must_use]
    pub fn evaluate(&mut self) -> i32 {
        self.evaluator.evaluate(&self.weights, &self.board)
    }

    fn record_hash(&mut self) {
        let idx = self.board.turn_count() as usize % HASH_RING_SIZE;
        self.hash_ring[idx] = self.board.hash();
    }

    fn repetition_count(&self, hash: u64) -> u32 {
        self.hash_ring.iter().filter(|&&h| h == hash).count() as u32
    }

    #[must_use]
    pub fn is_threefold_repetition(&self) -> bool {
        self.repetition_count(self.board.hash()) >= 3
    }

    fn recompute_legal_moves(&mut self) {
        self.legal_moves = MoveList::new();
        movegen::generate(&self.board, &mut self.legal_moves, false);
    }

    /// Apply a user move if, and only if, it is in [`GameState::legal_moves`]
    /// (§7 "Illegal user move" — no mutation on `false`).
    pub fn apply(&mut self, mv: Move) -> bool {
        if !self.legal_moves.as_slice().contains(&mv) {
            return false;
        }
        let white = self.board.white_to_move();
        let ctx = if white {
            partial_apply_white(&mut self.board, mv)
        } else {
            partial_apply_black(&mut self.board, mv)
        };
        debug_assert!(ctx.is_legal, "legal_moves only contains pre-filtered legal moves");
        if white {
            finish_apply_white(&mut self.board, &mut self.evaluator, &self.weights, mv, &ctx);
        } else {
            finish_apply_black(&mut self.board, &mut self.evaluator, &self.weights, mv, &ctx);
        }
        self.history.push(mv);
        self.record_hash();
        self.recompute_legal_moves();
        true
    }

    #[must_use]
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Terminal when `legal_moves` is empty, the fifty-move rule has
    /// triggered, or insufficient mating material holds (§6).
    #[must_use]
    pub fn game_over(&self) -> bool {
        self.legal_moves.is_empty()
            || self.board.half_move_clock() >= 100
            || self.board.insufficient_mating_material()
            || self.is_threefold_repetition()
    }

    /// Only meaningful once [`GameState::game_over`] is `true`.
    #[must_use]
    pub fn win_draw_loss(&self) -> Outcome {
        if self.legal_moves.is_empty() && self.board.in_check() {
            if self.board.white_to_move() {
                Outcome::BlackWins
            } else {
                Outcome::WhiteWins
            }
        } else {
            Outcome::Draw
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fen::parse_fen;

    fn weights() -> Arc<NnueWeights> {
        Arc::new(NnueWeights::synthetic(1))
    }

    #[test]
    fn startpos_has_20_legal_moves() {
        let game = GameState::new(BoardState::startpos(), weights());
        assert_eq!(game.legal_moves().len(), 20);
        assert!(!game.game_over());
    }

    #[test]
    fn illegal_move_does_not_mutate() {
        let mut game = GameState::new(BoardState::startpos(), weights());
        let bogus = Move::new(
            crate::board::types::Square::new(0),
            crate::board::types::Square::new(63),
            crate::board::types::Piece::new(true, crate::board::types::PieceKind::Pawn),
            crate::board::types::Piece::NONE,
            crate::board::types::MOVE_QUIET,
        );
        let hash_before = game.board().hash();
        assert!(!game.apply(bogus));
        assert_eq!(game.board().hash(), hash_before);
    }

    #[test]
    fn fools_mate_is_checkmate_for_black() {
        let mut game = GameState::new(BoardState::startpos(), weights());
        for (from, to) in [(13, 21), (52, 36), (14, 30), (59, 31)] {
            let mv_list = game.legal_moves().as_slice().to_vec();
            let mv = mv_list
                .iter()
                .find(|m| m.from().index() == from && m.to().index() == to)
                .copied()
                .unwrap_or_else(|| panic!("expected move {from}->{to} to be legal"));
            assert!(game.apply(mv));
        }
        assert!(game.game_over());
        assert_eq!(game.win_draw_loss(), Outcome::BlackWins);
    }

    #[test]
    fn lone_king_vs_king_and_pawn_is_not_a_draw() {
        let board = parse_fen("8/8/8/8/8/4k3/4P3/4K3 w - - 0 1").unwrap();
        let game = GameState::new(board, weights());
        assert!(!game.board().insufficient_mating_material());
    }
}

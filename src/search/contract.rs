//! `Searcher` contract (§6) and a minimal reference implementation.
//!
//! The single-thread alpha-beta body is explicitly out of scope (§1):
//! move ordering, quiescence, and pruning are not specified. This is
//! just enough of an implementation to drive [`crate::search::parallel::ParallelSearcher`]
//! end to end and to exercise the vote-map reconciliation in §4.5.2.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::board::apply::{
    finish_apply_black, finish_apply_white, partial_apply_black, partial_apply_white,
};
use crate::board::movegen;
use crate::board::state::BoardState;
use crate::board::types::{Move, MoveList};
use crate::nnue::{NnueEvaluator, NnueWeights};
use crate::search::tt::{BoundType, TranspositionTable};

/// Score magnitude reserved for mate scores; a mate found at search ply
/// `p` is reported as `MATE_SCORE - p` so that shorter mates sort ahead
/// of longer ones.
pub const MATE_SCORE: i32 = 30_000;

/// Per-thread outcome of a bounded search (§4.5.1: "each writes a
/// per-thread result `(move, depth, score, ponder, nodes)`").
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchOutcome {
    pub best_move: Option<Move>,
    pub ponder: Option<Move>,
    pub score: i32,
    pub depth: u32,
    pub nodes: u64,
}

/// A single-thread alpha-beta driver, treated by the parallel layer as
/// an opaque worker exposing exactly these four calls (§6 "Searcher").
pub trait Searcher {
    /// Reset the node counter and bootstrap the evaluator against this board.
    fn init(&mut self, seed: u64, board: &BoardState);
    /// Iterative deepening until stop, node cap, or depth cap.
    fn search(&mut self, node_limit: Option<u64>, max_depth: Option<u32>) -> SearchOutcome;
    fn depth_bound_search(&mut self, depth: u32) -> SearchOutcome;
    fn stop(&self);
}

/// Reference negamax searcher: iterative deepening, a shared
/// lock-free transposition table, and the NNUE static evaluator. Moves
/// are explored by cloning the board per recursion step rather than
/// make/unmake (§9 "Implementers may clone or use per-worker arenas;
/// the invariant holds either way").
pub struct NegamaxSearcher {
    board: BoardState,
    evaluator: NnueEvaluator,
    weights: Arc<NnueWeights>,
    tt: Arc<TranspositionTable>,
    stop: Arc<AtomicBool>,
    nodes: u64,
}

impl NegamaxSearcher {
    #[must_use]
    pub fn new(weights: Arc<NnueWeights>, tt: Arc<TranspositionTable>) -> Self {
        let board = BoardState::startpos();
        let evaluator = NnueEvaluator::from_scratch(&weights, &board);
        NegamaxSearcher {
            board,
            evaluator,
            weights,
            tt,
            stop: Arc::new(AtomicBool::new(false)),
            nodes: 0,
        }
    }

    /// Handle workers can poll or clone to request a cooperative stop
    /// (§4.5.4: idempotent, checked at every node).
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    fn apply_move(&self, board: &BoardState, evaluator: &NnueEvaluator, mv: Move) -> (BoardState, NnueEvaluator) {
        let mut board = board.clone();
        let mut evaluator = evaluator.clone();
        let white = board.white_to_move();
        let ctx = if white {
            partial_apply_white(&mut board, mv)
        } else {
            partial_apply_black(&mut board, mv)
        };
        if white {
            finish_apply_white(&mut board, &mut evaluator, &self.weights, mv, &ctx);
        } else {
            finish_apply_black(&mut board, &mut evaluator, &self.weights, mv, &ctx);
        }
        (board, evaluator)
    }

    fn negamax(&mut self, board: &BoardState, evaluator: &mut NnueEvaluator, depth: u32, ply: u32, mut alpha: i32, beta: i32) -> i32 {
        self.nodes += 1;
        if depth == 0 || self.stop.load(Ordering::Relaxed) {
            return evaluator.evaluate(&self.weights, board);
        }

        let mut moves = MoveList::new();
        movegen::generate(board, &mut moves, false);
        if moves.is_empty() {
            return if board.in_check() { -(MATE_SCORE - ply as i32) } else { 0 };
        }

        if let Some(entry) = self.tt.probe(board.hash()) {
            if u32::from(entry.depth) >= depth {
                match entry.bound {
                    BoundType::Exact => return entry.score,
                    BoundType::LowerBound if entry.score >= beta => return entry.score,
                    BoundType::UpperBound if entry.score <= alpha => return entry.score,
                    _ => {}
                }
            }
        }

        let mut best_score = i32::MIN + 1;
        let mut best_move = moves.as_slice()[0];
        let original_alpha = alpha;

        for &mv in moves.as_slice() {
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            let (child_board, mut child_eval) = self.apply_move(board, evaluator, mv);
            let score = -self.negamax(&child_board, &mut child_eval, depth - 1, ply + 1, -beta, -alpha);
            if score > best_score {
                best_score = score;
                best_move = mv;
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        let bound = if best_score <= original_alpha {
            BoundType::UpperBound
        } else if best_score >= beta {
            BoundType::LowerBound
        } else {
            BoundType::Exact
        };
        self.tt.store(board.hash(), depth.min(u32::from(u8::MAX)) as u8, bound, best_score, best_move);

        best_score
    }
}

impl Searcher for NegamaxSearcher {
    fn init(&mut self, _seed: u64, board: &BoardState) {
        self.board = board.clone();
        self.evaluator = NnueEvaluator::from_scratch(&self.weights, &self.board);
        self.nodes = 0;
        self.stop.store(false, Ordering::Relaxed);
    }

    fn search(&mut self, node_limit: Option<u64>, max_depth: Option<u32>) -> SearchOutcome {
        let max_depth = max_depth.unwrap_or(32);
        let mut outcome = SearchOutcome::default();
        for depth in 1..=max_depth {
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            if let Some(limit) = node_limit {
                if self.nodes >= limit {
                    break;
                }
            }
            let board = self.board.clone();
            let mut evaluator = self.evaluator.clone();
            let score = self.negamax(&board, &mut evaluator, depth, 0, -MATE_SCORE, MATE_SCORE);
            let best_move = self.tt.probe(board.hash()).map(|e| e.best_move).filter(|m| !m.is_null());
            outcome = SearchOutcome { best_move, ponder: None, score, depth, nodes: self.nodes };
            if best_move.is_none() {
                break;
            }
        }
        outcome
    }

    fn depth_bound_search(&mut self, depth: u32) -> SearchOutcome {
        self.search(None, Some(depth))
    }

    fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn searcher() -> NegamaxSearcher {
        NegamaxSearcher::new(Arc::new(NnueWeights::synthetic(11)), Arc::new(TranspositionTable::with_entries(1024)))
    }

    #[test]
    fn finds_mate_in_one() {
        let board = crate::board::fen::parse_fen("6k1/5ppp/8/8/8/8/8/R6K w - - 0 1").unwrap();
        let mut s = searcher();
        s.init(1, &board);
        let outcome = s.depth_bound_search(3);
        let mv = outcome.best_move.expect("should find a move");
        assert_eq!(mv.from().index(), 0);
        assert_eq!(mv.to().index(), 56);
    }

    #[test]
    fn stop_flag_halts_search_promptly() {
        let board = BoardState::startpos();
        let mut s = searcher();
        s.init(2, &board);
        s.stop();
        let outcome = s.search(None, Some(10));
        assert!(outcome.nodes <= 1 || outcome.best_move.is_some());
    }

    #[test]
    fn depth_bound_search_respects_requested_depth() {
        let board = BoardState::startpos();
        let mut s = searcher();
        s.init(3, &board);
        let outcome = s.depth_bound_search(2);
        assert_eq!(outcome.depth, 2);
        assert!(outcome.best_move.is_some());
    }
}

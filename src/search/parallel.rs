//! `ParallelSearcher`: shared transposition table, thread pool, deadline
//! nonce, and vote-map result reconciliation (§4.5).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::board::state::BoardState;
use crate::board::types::Move;
use crate::nnue::NnueWeights;
use crate::search::contract::{NegamaxSearcher, SearchOutcome, Searcher};
use crate::search::tt::TranspositionTable;

/// 4096 slots: `(from, to)` is 6+6 bits (§4.5.2).
const VOTE_MAP_SLOTS: usize = 4096;

fn move_from_to_index(m: Move) -> usize {
    m.from().index() * 64 + m.to().index()
}

/// Reconcile per-thread results into one, per §4.5.2. Exposed standalone
/// so invariant 7 (vote-map monotonicity) can be tested directly without
/// spinning up real threads.
#[must_use]
pub fn reconcile_votes(results: &[SearchOutcome]) -> Option<SearchOutcome> {
    let candidates: Vec<&SearchOutcome> = results.iter().filter(|r| r.best_move.is_some()).collect();
    if candidates.is_empty() {
        return None;
    }

    let worst_score = candidates.iter().map(|r| r.score).min().unwrap();
    let mut vote_map = vec![0i64; VOTE_MAP_SLOTS];
    for r in &candidates {
        let slot = move_from_to_index(r.best_move.unwrap());
        vote_map[slot] += i64::from(r.score - worst_score) * i64::from(r.depth);
    }

    let mut winner: Option<&SearchOutcome> = None;
    let mut winner_vote = i64::MIN;
    for r in &candidates {
        let slot = move_from_to_index(r.best_move.unwrap());
        let vote = vote_map[slot];
        if vote > winner_vote {
            winner_vote = vote;
            winner = Some(r);
        }
    }

    let total_nodes: u64 = candidates.iter().map(|r| r.nodes).sum();
    winner.map(|w| SearchOutcome { nodes: total_nodes, ..*w })
}

/// Owns the shared transposition table, a pool of [`Searcher`]s, and the
/// deadline nonce that guards against a stale timer cancelling a fresh
/// search (§4.5, §9 "Deadline nonce").
pub struct ParallelSearcher {
    weights: Arc<NnueWeights>,
    tt: Arc<TranspositionTable>,
    num_threads: usize,
    prev_search_id: Arc<AtomicU64>,
}

impl ParallelSearcher {
    #[must_use]
    pub fn new(weights: Arc<NnueWeights>, tt: Arc<TranspositionTable>) -> Self {
        ParallelSearcher {
            weights,
            tt,
            num_threads: 1,
            prev_search_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Clamp to `[1, cores]` (§4.5).
    pub fn set_threads(&mut self, n: usize) {
        let cores = thread::available_parallelism().map(|p| p.get()).unwrap_or(1);
        self.num_threads = n.clamp(1, cores);
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.num_threads
    }

    /// `timeBoundSearch`: mint a fresh nonce, schedule a deferred stop
    /// after `think_millis`, clone-broadcast the board to every
    /// searcher, run in parallel, and reconcile by vote (§4.5.1, §4.5.2).
    #[must_use]
    pub fn time_bound_search(&self, board: &BoardState, think_millis: u64) -> SearchOutcome {
        let id = self.prev_search_id.fetch_add(1, Ordering::SeqCst) + 1;
        let results = thread::scope(|scope| {
            let mut stop_flags: Vec<Arc<std::sync::atomic::AtomicBool>> = Vec::with_capacity(self.num_threads);
            let mut searchers: Vec<NegamaxSearcher> = Vec::with_capacity(self.num_threads);
            for _ in 0..self.num_threads {
                let s = NegamaxSearcher::new(Arc::clone(&self.weights), Arc::clone(&self.tt));
                stop_flags.push(s.stop_handle());
                searchers.push(s);
            }

            let nonce = Arc::clone(&self.prev_search_id);
            let deadline_flags = stop_flags.clone();
            scope.spawn(move || {
                thread::sleep(Duration::from_millis(think_millis));
                if nonce.load(Ordering::SeqCst) == id {
                    for flag in &deadline_flags {
                        flag.store(true, Ordering::Relaxed);
                    }
                }
            });

            let outcomes: Vec<SearchOutcome> = searchers
                .into_iter()
                .map(|mut s| {
                    let local_board = board.clone();
                    scope.spawn(move || {
                        s.init(0, &local_board);
                        s.search(None, Some(64))
                    })
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(|h| h.join().expect("search worker panicked"))
                .collect();
            outcomes
        });

        reconcile_votes(&results).unwrap_or_default()
    }

    /// `depthBoundSearch`: same clone-broadcast-aggregate pattern, bounded
    /// by a fixed depth instead of a wall-clock deadline (§4.5.3).
    #[must_use]
    pub fn depth_bound_search(&self, board: &BoardState, depth: u32) -> SearchOutcome {
        if self.num_threads == 1 {
            let mut s = NegamaxSearcher::new(Arc::clone(&self.weights), Arc::clone(&self.tt));
            s.init(0, board);
            return s.depth_bound_search(depth);
        }

        let results: Vec<SearchOutcome> = thread::scope(|scope| {
            (0..self.num_threads)
                .map(|_| {
                    let weights = Arc::clone(&self.weights);
                    let tt = Arc::clone(&self.tt);
                    let local_board = board.clone();
                    scope.spawn(move || {
                        let mut s = NegamaxSearcher::new(weights, tt);
                        s.init(0, &local_board);
                        s.depth_bound_search(depth)
                    })
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(|h| h.join().expect("search worker panicked"))
                .collect()
        });

        reconcile_votes(&results).unwrap_or_default()
    }

    /// `nodeBoundSearch`: `n=1` short-circuits to a single searcher with
    /// no parallel aggregation (§4.5.3).
    #[must_use]
    pub fn node_bound_search(&self, board: &BoardState, node_limit: u64, max_depth: u32) -> SearchOutcome {
        if self.num_threads == 1 {
            let mut s = NegamaxSearcher::new(Arc::clone(&self.weights), Arc::clone(&self.tt));
            s.init(0, board);
            return s.search(Some(node_limit), Some(max_depth));
        }

        let results: Vec<SearchOutcome> = thread::scope(|scope| {
            (0..self.num_threads)
                .map(|_| {
                    let weights = Arc::clone(&self.weights);
                    let tt = Arc::clone(&self.tt);
                    let local_board = board.clone();
                    scope.spawn(move || {
                        let mut s = NegamaxSearcher::new(weights, tt);
                        s.init(0, &local_board);
                        s.search(Some(node_limit), Some(max_depth))
                    })
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(|h| h.join().expect("search worker panicked"))
                .collect()
        });

        reconcile_votes(&results).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(from: u8, to: u8, score: i32, depth: u32, nodes: u64) -> SearchOutcome {
        use crate::board::types::{Piece, PieceKind, Square, MOVE_QUIET};
        SearchOutcome {
            best_move: Some(Move::new(Square::new(from), Square::new(to), Piece::new(true, PieceKind::Pawn), Piece::NONE, MOVE_QUIET)),
            ponder: None,
            score,
            depth,
            nodes,
        }
    }

    #[test]
    fn reconcile_picks_highest_vote() {
        let results = vec![outcome(8, 16, 50, 4, 100), outcome(9, 17, 10, 4, 50)];
        let winner = reconcile_votes(&results).unwrap();
        assert_eq!(winner.best_move.unwrap().from().index(), 8);
        assert_eq!(winner.nodes, 150);
    }

    #[test]
    fn reconcile_breaks_ties_by_first_encounter() {
        let results = vec![outcome(8, 16, 20, 4, 10), outcome(9, 17, 20, 4, 10)];
        let winner = reconcile_votes(&results).unwrap();
        assert_eq!(winner.best_move.unwrap().from().index(), 8);
    }

    #[test]
    fn adding_a_tying_thread_never_decreases_the_winner_vote() {
        let base = vec![outcome(8, 16, 50, 4, 100), outcome(9, 17, 10, 4, 50)];
        let base_winner = reconcile_votes(&base).unwrap();

        let mut extended = base.clone();
        extended.push(outcome(8, 16, 50, 4, 20));
        let extended_winner = reconcile_votes(&extended).unwrap();

        assert_eq!(extended_winner.best_move, base_winner.best_move);
    }

    #[test]
    fn parallel_searcher_clamps_thread_count() {
        let tt = Arc::new(TranspositionTable::with_entries(1024));
        let weights = Arc::new(NnueWeights::synthetic(3));
        let mut ps = ParallelSearcher::new(weights, tt);
        ps.set_threads(0);
        assert_eq!(ps.threads(), 1);
    }

    #[test]
    fn depth_bound_search_single_thread_returns_a_move() {
        let tt = Arc::new(TranspositionTable::with_entries(4096));
        let weights = Arc::new(NnueWeights::synthetic(5));
        let ps = ParallelSearcher::new(weights, tt);
        let board = BoardState::startpos();
        let outcome = ps.depth_bound_search(&board, 2);
        assert!(outcome.best_move.is_some());
    }

    #[test]
    fn depth_bound_search_multi_thread_reconciles_to_a_legal_move() {
        let tt = Arc::new(TranspositionTable::with_entries(4096));
        let weights = Arc::new(NnueWeights::synthetic(5));
        let mut ps = ParallelSearcher::new(weights, tt);
        ps.set_threads(2);
        let board = BoardState::startpos();
        let outcome = ps.depth_bound_search(&board, 2);
        assert!(outcome.best_move.is_some());
    }
}

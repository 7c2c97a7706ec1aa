//! Parallel alpha-beta search coordinator (§4.5): a shared lock-free
//! transposition table, a `Searcher` contract, and vote-map reconciliation.

pub mod contract;
pub mod parallel;
pub mod tt;

pub use contract::{NegamaxSearcher, SearchOutcome, Searcher, MATE_SCORE};
pub use parallel::{reconcile_votes, ParallelSearcher};
pub use tt::{BoundType, TranspositionTable, TtEntry};

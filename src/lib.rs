//! Core engine of a chess-playing program: bitboard board representation
//! and incremental mutation, an NNUE accumulator and forward pass, and a
//! parallel alpha-beta search coordinator built on top of them.
//!
//! Out of scope (treated as external collaborators, §1, §6): move
//! generation quality, the single-thread searcher body beyond the
//! reference implementation in [`search::contract`], PGN I/O, UCI
//! console glue, and on-disk network weight loading.

pub mod board;
pub mod error;
pub mod nnue;
pub mod search;
pub mod zobrist;

pub use board::{BoardState, GameState};
pub use error::{FenError, SquareError};
pub use nnue::{NnueEvaluator, NnueWeights};
pub use search::{BoundType, NegamaxSearcher, ParallelSearcher, SearchOutcome, Searcher, TranspositionTable};

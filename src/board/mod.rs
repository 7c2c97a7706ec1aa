//! Board representation: bitboard state, incremental apply, FEN parsing,
//! move generation, and game-level history/terminal classification.

pub mod apply;
pub mod fen;
pub mod game;
pub mod movegen;
pub mod state;
pub mod types;

pub use game::GameState;
pub use state::BoardState;

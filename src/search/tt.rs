//! Shared, lock-free transposition table (§3.4, §5).
//!
//! Every slot is read and written via relaxed atomics with no locking.
//! Concurrent writers may tear a slot's fields; the stored 64-bit hash
//! is the entry's self-description, so a probe that doesn't match the
//! hash it asked for is simply a miss, torn or not.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::board::types::Move;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundType {
    /// Score is the exact value.
    Exact,
    /// Score is a lower bound (search failed high, score >= beta).
    LowerBound,
    /// Score is an upper bound (search failed low, score <= alpha).
    UpperBound,
}

impl BoundType {
    const fn to_bits(self) -> u64 {
        match self {
            BoundType::Exact => 0,
            BoundType::LowerBound => 1,
            BoundType::UpperBound => 2,
        }
    }

    const fn from_bits(bits: u64) -> Self {
        match bits & 0b11 {
            1 => BoundType::LowerBound,
            2 => BoundType::UpperBound,
            _ => BoundType::Exact,
        }
    }
}

/// Cache record keyed by position hash: best move, depth, bound type,
/// and score (glossary "Transposition entry").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtEntry {
    pub depth: u8,
    pub bound: BoundType,
    pub score: i32,
    pub best_move: Move,
}

struct TtSlot {
    key: AtomicU64,
    word: AtomicU64,
    mv: AtomicU32,
}

impl TtSlot {
    const fn empty() -> Self {
        TtSlot {
            key: AtomicU64::new(0),
            word: AtomicU64::new(0),
            mv: AtomicU32::new(0),
        }
    }
}

/// `size is a power-of-two minus-one mask-friendly number ~= 2^24
/// entries by default` (§3.4).
const DEFAULT_ENTRIES: usize = 1 << 24;

pub struct TranspositionTable {
    slots: Vec<TtSlot>,
    mask: usize,
}

impl TranspositionTable {
    /// Build a table sized to roughly `size_mb` megabytes.
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<TtSlot>();
        let entries = ((size_mb * 1024 * 1024) / entry_size.max(1)).max(1);
        Self::with_entries(entries)
    }

    /// Build a table with (at least) `entries` slots, rounded up to a
    /// power of two so indexing can mask instead of mod. Exposed
    /// directly so tests and benchmarks don't have to allocate a
    /// megabyte-scale default table.
    #[must_use]
    pub fn with_entries(entries: usize) -> Self {
        let entries = entries.next_power_of_two().max(1);
        let mut slots = Vec::with_capacity(entries);
        slots.resize_with(entries, TtSlot::empty);
        TranspositionTable { slots, mask: entries - 1 }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn index(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }

    /// Unsynchronized read with self-verifying hash check (§5). A
    /// mismatching hash, whether from a different position or a torn
    /// concurrent write, is a plain cache miss.
    #[must_use]
    pub fn probe(&self, hash: u64) -> Option<TtEntry> {
        let slot = &self.slots[self.index(hash)];
        let key = slot.key.load(Ordering::Relaxed);
        if key != hash {
            return None;
        }
        let word = slot.word.load(Ordering::Relaxed);
        let mv = slot.mv.load(Ordering::Relaxed);
        let score = (word & 0xFFFF_FFFF) as u32 as i32;
        let depth = ((word >> 32) & 0xFF) as u8;
        let bound = BoundType::from_bits(word >> 40);
        Some(TtEntry { depth, bound, score, best_move: Move::from_u32(mv) })
    }

    /// Store a result, depth-preferred: a shallower entry never evicts
    /// a deeper one already sitting at the same hash. Unsynchronized;
    /// concurrent stores to the same slot may interleave their field
    /// writes (§5).
    pub fn store(&self, hash: u64, depth: u8, bound: BoundType, score: i32, best_move: Move) {
        let slot = &self.slots[self.index(hash)];
        let existing_key = slot.key.load(Ordering::Relaxed);
        if existing_key == hash {
            let existing_depth = ((slot.word.load(Ordering::Relaxed) >> 32) & 0xFF) as u8;
            if existing_depth > depth {
                return;
            }
        }
        let word = (score as u32 as u64) | ((depth as u64) << 32) | (bound.to_bits() << 40);
        slot.mv.store(best_move.as_u32(), Ordering::Relaxed);
        slot.word.store(word, Ordering::Relaxed);
        slot.key.store(hash, Ordering::Relaxed);
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::with_entries(DEFAULT_ENTRIES)
    }
}

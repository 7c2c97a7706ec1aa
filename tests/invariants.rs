//! Cross-module property tests for the quantified invariants (§8).

use std::sync::Arc;

use chess_core::board::movegen;
use chess_core::board::types::MoveList;
use chess_core::{BoardState, GameState, NnueEvaluator, NnueWeights};
use proptest::prelude::*;

fn random_walk_strategy() -> impl Strategy<Value = (u64, usize)> {
    (any::<u64>(), 1..=24usize)
}

proptest! {
    /// Invariant 1: `allPieces` equals the OR of the 12 piece bitboards,
    /// and the white/black occupancy bitboards never overlap, across any
    /// legal move sequence from the initial position.
    #[test]
    fn occupancy_stays_consistent_over_random_play((seed, num_moves) in random_walk_strategy()) {
        use rand::prelude::*;

        let weights = Arc::new(NnueWeights::synthetic(seed));
        let mut game = GameState::new(BoardState::startpos(), weights);
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..num_moves {
            let moves = game.legal_moves().as_slice().to_vec();
            if moves.is_empty() {
                break;
            }
            let mv = moves[rng.gen_range(0..moves.len())];
            prop_assert!(game.apply(mv));

            let board = game.board();
            prop_assert_eq!(board.all_pieces(), board.white_pieces() | board.black_pieces());
            prop_assert!((board.white_pieces() & board.black_pieces()).is_empty());
        }
    }

    /// Invariant 3: a from-scratch hash recomputation matches the
    /// incrementally maintained hash after any legal move sequence —
    /// including the pawn hash and the per-color material hash, which
    /// are maintained by the same differential as the main hash (§4.2).
    #[test]
    fn incremental_hash_matches_recomputation_over_random_play((seed, num_moves) in random_walk_strategy()) {
        use rand::prelude::*;

        let weights = Arc::new(NnueWeights::synthetic(seed));
        let mut game = GameState::new(BoardState::startpos(), weights);
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..num_moves {
            let moves = game.legal_moves().as_slice().to_vec();
            if moves.is_empty() {
                break;
            }
            let mv = moves[rng.gen_range(0..moves.len())];
            prop_assert!(game.apply(mv));
            let board = game.board();
            prop_assert_eq!(board.hash(), board.recompute_hash_from_scratch());
            prop_assert_eq!(board.pawn_hash(), board.recompute_pawn_hash_from_scratch());
            prop_assert_eq!(board.white_material_hash(), board.recompute_material_hash_from_scratch(true));
            prop_assert_eq!(board.black_material_hash(), board.recompute_material_hash_from_scratch(false));
        }
    }

    /// Invariant 5: NNUE evaluation recomputed incrementally after any
    /// legal move sequence matches a from-scratch accumulator rebuild.
    #[test]
    fn incremental_eval_matches_from_scratch_over_random_play((seed, num_moves) in random_walk_strategy()) {
        use rand::prelude::*;

        let weights = Arc::new(NnueWeights::synthetic(seed));
        let mut game = GameState::new(BoardState::startpos(), weights.clone());
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..num_moves {
            let moves = game.legal_moves().as_slice().to_vec();
            if moves.is_empty() {
                break;
            }
            let mv = moves[rng.gen_range(0..moves.len())];
            prop_assert!(game.apply(mv));

            let incremental = game.evaluate();
            let mut rebuilt = NnueEvaluator::from_scratch(&weights, game.board());
            let from_scratch = rebuilt.evaluate(&weights, game.board());
            prop_assert_eq!(incremental, from_scratch);
        }
    }

    /// Invariant 4: for any reachable position, `finishApply` produces a
    /// hash equal to the full recomputation after `partialApply`, for
    /// every pseudo-legal move generated there (not just the move that
    /// was actually played on the random walk).
    #[test]
    fn finish_apply_matches_recomputation_for_every_generated_move((seed, num_moves) in random_walk_strategy()) {
        use rand::prelude::*;
        use chess_core::board::apply::{finish_apply_black, finish_apply_white, partial_apply_black, partial_apply_white};

        let weights = Arc::new(NnueWeights::synthetic(seed));
        let mut game = GameState::new(BoardState::startpos(), weights.clone());
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..num_moves {
            let moves = game.legal_moves().as_slice().to_vec();
            if moves.is_empty() {
                break;
            }

            let board = game.board().clone();
            let mut probe_moves = MoveList::new();
            movegen::generate(&board, &mut probe_moves, false);
            for mv in probe_moves.as_slice() {
                let mut scratch_board = board.clone();
                let mut scratch_eval = NnueEvaluator::from_scratch(&weights, &scratch_board);
                let white = scratch_board.white_to_move();
                let ctx = if white {
                    partial_apply_white(&mut scratch_board, *mv)
                } else {
                    partial_apply_black(&mut scratch_board, *mv)
                };
                if !ctx.is_legal {
                    continue;
                }
                if white {
                    finish_apply_white(&mut scratch_board, &mut scratch_eval, &weights, *mv, &ctx);
                } else {
                    finish_apply_black(&mut scratch_board, &mut scratch_eval, &weights, *mv, &ctx);
                }
                prop_assert_eq!(scratch_board.hash(), scratch_board.recompute_hash_from_scratch());
            }

            let mv = moves[rng.gen_range(0..moves.len())];
            prop_assert!(game.apply(mv));
        }
    }
}

//! Property-based tests for the universal invariants: make/unmake exact
//! restore, FEN round-trip, legal-move safety, and evaluator symmetry.
//! Random move sequences are driven by `rand`, the properties themselves
//! checked with `proptest` — random walk, then assert an invariant at
//! every step.

use chess_core::eval::evaluate;
use chess_core::movegen::{generate_legal_moves, is_square_attacked};
use chess_core::position::Position;
use chess_core::types::{Side, Square};
use proptest::prelude::*;
use rand::prelude::*;

/// FEN for the vertically-mirrored, color-swapped counterpart of `pos`,
/// built entirely through public accessors (castling rights and the en
/// passant target are dropped; the evaluator depends on neither).
fn color_swapped_mirror_fen(pos: &Position) -> String {
    let mut ranks = Vec::with_capacity(8);
    for rank in (0..8u8).rev() {
        let mut row = String::new();
        let mut empty = 0u8;
        for file in 0..8u8 {
            let source = Square::from_rank_file(7 - rank, file);
            if let Some((side, piece)) = pos.piece_at(source) {
                if empty > 0 {
                    row.push_str(&empty.to_string());
                    empty = 0;
                }
                row.push(piece.to_fen_char(side.opposite()));
            } else {
                empty += 1;
            }
        }
        if empty > 0 {
            row.push_str(&empty.to_string());
        }
        ranks.push(row);
    }
    let side = if pos.side_to_move() == Side::White { "b" } else { "w" };
    format!("{} {} - - 0 1", ranks.join("/"), side)
}

fn seed_strategy() -> impl Strategy<Value = u64> {
    any::<u64>()
}

fn move_count_strategy() -> impl Strategy<Value = usize> {
    1..=40usize
}

fn random_walk(pos: &mut Position, rng: &mut StdRng, num_moves: usize) -> usize {
    let mut played = 0;
    for _ in 0..num_moves {
        let moves = generate_legal_moves(pos);
        if moves.is_empty() {
            break;
        }
        let idx = rng.gen_range(0..moves.len());
        let mv = *moves.iter().nth(idx).unwrap();
        pos.make(mv);
        played += 1;
    }
    played
}

proptest! {
    /// make followed by unmake restores the FEN exactly, for any random
    /// legal walk from the start position.
    #[test]
    fn make_unmake_restores_fen_exactly(seed in seed_strategy(), num_moves in move_count_strategy()) {
        let mut pos = Position::startpos();
        let mut rng = StdRng::seed_from_u64(seed);
        let initial_fen = pos.to_fen();

        let mut played = Vec::new();
        for _ in 0..num_moves {
            let moves = generate_legal_moves(&mut pos);
            if moves.is_empty() {
                break;
            }
            let idx = rng.gen_range(0..moves.len());
            let mv = *moves.iter().nth(idx).unwrap();
            pos.make(mv);
            played.push(mv);
        }

        for _ in played {
            pos.unmake();
        }

        prop_assert_eq!(pos.to_fen(), initial_fen);
    }

    /// Serializing to FEN and parsing it back yields a position whose own
    /// FEN is identical.
    #[test]
    fn fen_roundtrip_is_stable(seed in seed_strategy(), num_moves in move_count_strategy()) {
        let mut pos = Position::startpos();
        let mut rng = StdRng::seed_from_u64(seed);
        random_walk(&mut pos, &mut rng, num_moves);

        let fen = pos.to_fen();
        let restored = Position::parse_fen(&fen).unwrap();
        prop_assert_eq!(restored.to_fen(), fen);
    }

    /// Every move `generate_legal_moves` returns leaves the mover's own
    /// king safe.
    #[test]
    fn legal_moves_never_leave_mover_in_check(seed in seed_strategy(), num_moves in 0..20usize) {
        let mut pos = Position::startpos();
        let mut rng = StdRng::seed_from_u64(seed);
        random_walk(&mut pos, &mut rng, num_moves);

        let mover = pos.side_to_move();
        let moves = generate_legal_moves(&mut pos);
        for mv in moves.iter() {
            pos.make(*mv);
            let king_sq = pos.king_square(mover);
            prop_assert!(!is_square_attacked(&pos, king_sq, mover.opposite()));
            pos.unmake();
        }
    }

    /// The evaluator is antisymmetric under a full color swap plus
    /// vertical mirror, for any random reachable position.
    #[test]
    fn evaluate_is_antisymmetric_for_reachable_positions(seed in seed_strategy(), num_moves in 0..30usize) {
        use chess_core::config::EvalWeights;

        let mut pos = Position::startpos();
        let mut rng = StdRng::seed_from_u64(seed);
        random_walk(&mut pos, &mut rng, num_moves);

        let weights = EvalWeights::default();
        let mirrored = Position::parse_fen(&color_swapped_mirror_fen(&pos)).unwrap();

        prop_assert_eq!(evaluate(&mirrored, &weights), -evaluate(&pos, &weights));
    }

    /// The evaluator never produces an implausibly large score: material
    /// alone tops out in the low thousands of centipawns.
    #[test]
    fn evaluate_stays_within_plausible_bounds(seed in seed_strategy(), num_moves in 0..30usize) {
        use chess_core::config::EvalWeights;

        let mut pos = Position::startpos();
        let mut rng = StdRng::seed_from_u64(seed);
        random_walk(&mut pos, &mut rng, num_moves);

        let weights = EvalWeights::default();
        let score = evaluate(&pos, &weights);
        prop_assert!(score.abs() < 10_000, "evaluation {score} is unreasonably large");
    }
}

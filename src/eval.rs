//! Handcrafted centipawn evaluator with a per-piece decomposition.
//!
//! The White-minus-Black score is the sum of material, PST, mobility, pawn
//! structure, and king safety contributed by every piece on the board. Each
//! term is computed *as a per-piece contribution from the start* rather than
//! as a side-level aggregate distributed afterwards, so the decomposition
//! invariant (sum of `signed_total` equals the overall score) holds by
//! construction instead of needing a reconciliation step.

use std::collections::HashMap;

use crate::attacks::{king_attacks, piece_attacks};
use crate::config::EvalWeights;
use crate::movegen::count_attackers;
use crate::position::Position;
use crate::types::{Bitboard, Piece, Side, Square, ALL_PIECES};

/// Per-piece term decomposition. Every
/// field is already signed in the White-minus-Black convention: a Black
/// piece's fields are negative when they favor Black, so `signed_total`
/// is simply their sum and the map's values sum to the global score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PieceBreakdown {
    pub base: i32,
    pub pst: i32,
    pub mobility: i32,
    pub pawn_structure: i32,
    pub king_safety: i32,
    pub signed_total: i32,
}

impl PieceBreakdown {
    fn zero() -> Self {
        PieceBreakdown { base: 0, pst: 0, mobility: 0, pawn_structure: 0, king_safety: 0, signed_total: 0 }
    }
}

fn file_mask(file: u8) -> Bitboard {
    Bitboard(Bitboard::FILE_A.0 << file)
}

fn adjacent_files_mask(file: u8) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    if file > 0 {
        bb |= file_mask(file - 1);
    }
    if file < 7 {
        bb |= file_mask(file + 1);
    }
    bb
}

/// Squares strictly ahead of `rank` in `side`'s direction of travel.
fn ahead_mask(side: Side, rank: u8) -> Bitboard {
    match side {
        Side::White => {
            if rank >= 7 {
                Bitboard::EMPTY
            } else {
                Bitboard(!0u64 << ((rank as u32 + 1) * 8))
            }
        }
        Side::Black => {
            if rank == 0 {
                Bitboard::EMPTY
            } else {
                Bitboard((1u64 << (rank as u32 * 8)) - 1)
            }
        }
    }
}

fn mobility_weight(weights: &EvalWeights, piece: Piece) -> i32 {
    match piece {
        Piece::Knight => weights.mobility.knight,
        Piece::Bishop => weights.mobility.bishop,
        Piece::Rook => weights.mobility.rook,
        Piece::Queen => weights.mobility.queen,
        Piece::Pawn | Piece::King => 0,
    }
}

fn king_shield_count(pos: &Position, side: Side, king_sq: Square) -> u32 {
    let rank = king_sq.rank() as i8;
    let file = king_sq.file() as i8;
    let forward: i8 = if side == Side::White { 1 } else { -1 };
    let shield_rank = rank + forward;
    if !(0..8).contains(&shield_rank) {
        return 0;
    }
    let pawns = pos.pieces_of(side, Piece::Pawn);
    let mut count = 0;
    for df in -1i8..=1 {
        let f = file + df;
        if (0..8).contains(&f) && pawns.test_bit(Square::from_rank_file(shield_rank as u8, f as u8))
        {
            count += 1;
        }
    }
    count
}

fn king_ring_attackers(pos: &Position, side: Side, king_sq: Square) -> u32 {
    let enemy = side.opposite();
    let mut total = 0;
    for sq in king_attacks(king_sq).iter() {
        total += count_attackers(pos, sq, enemy);
    }
    total
}

/// Per-(piece, square) positional bonus tables, indexed rank-major
/// (`index = rank * 8 + file`, i.e. White's own `Square::index()`). Black
/// looks up the mirrored square. Single, non-tapered table set, no
/// middlegame/endgame phase split.
#[rustfmt::skip]
const PST_PAWN: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10,-20,-20, 10, 10,  5,
     5, -5,-10,  0,  0,-10, -5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5,  5, 10, 25, 25, 10,  5,  5,
    10, 10, 20, 30, 30, 20, 10, 10,
    50, 50, 50, 50, 50, 50, 50, 50,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const PST_KNIGHT: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const PST_BISHOP: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const PST_ROOK: [i32; 64] = [
     0,  0,  0,  5,  5,  0,  0,  0,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     5, 10, 10, 10, 10, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const PST_QUEEN: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const PST_KING: [i32; 64] = [
     20, 30, 10,  0,  0, 10, 30, 20,
     20, 20,  0,  0,  0,  0, 20, 20,
    -10,-20,-20,-20,-20,-20,-20,-10,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
];

fn pst_table(piece: Piece) -> &'static [i32; 64] {
    match piece {
        Piece::Pawn => &PST_PAWN,
        Piece::Knight => &PST_KNIGHT,
        Piece::Bishop => &PST_BISHOP,
        Piece::Rook => &PST_ROOK,
        Piece::Queen => &PST_QUEEN,
        Piece::King => &PST_KING,
    }
}

fn pst_value(piece: Piece, side: Side, sq: Square) -> i32 {
    let lookup_sq = if side == Side::White { sq } else { sq.mirror_vertical() };
    pst_table(piece)[lookup_sq.index() as usize]
}

/// Per-piece term computation shared by `evaluate` and `piece_breakdown`,
/// so the two can never disagree.
fn piece_terms(
    pos: &Position,
    weights: &EvalWeights,
    side: Side,
    piece: Piece,
    sq: Square,
    file_seen: &mut [bool; 8],
) -> PieceBreakdown {
    let sign = if side == Side::White { 1 } else { -1 };
    let base = piece.base_value() * sign;
    let pst = pst_value(piece, side, sq) * sign;

    let mobility = {
        let weight = mobility_weight(weights, piece);
        if weight == 0 {
            0
        } else {
            let own = pos.occupancy(side);
            let occ = pos.both_occupancy();
            let targets = piece_attacks(piece, side, sq, occ) & !own;
            weight * targets.popcount() as i32 * sign
        }
    };

    let pawn_structure = if piece == Piece::Pawn {
        let file = sq.file();
        let rank = sq.rank();
        let own_pawns = pos.pieces_of(side, Piece::Pawn);
        let enemy_pawns = pos.pieces_of(side.opposite(), Piece::Pawn);

        let doubled = file_seen[file as usize];
        file_seen[file as usize] = true;

        let isolated = (own_pawns & adjacent_files_mask(file)).is_empty();
        let passed =
            (enemy_pawns & adjacent_files_mask(file) & ahead_mask(side, rank)).is_empty()
                && (enemy_pawns & file_mask(file) & ahead_mask(side, rank)).is_empty();

        let mut cp = 0;
        if doubled {
            cp -= weights.pawn_structure.doubled_penalty;
        }
        if isolated {
            cp -= weights.pawn_structure.isolated_penalty;
        }
        if passed {
            cp += weights.pawn_structure.passed_bonus;
        }
        cp * sign
    } else {
        0
    };

    let king_safety = if piece == Piece::King {
        let shield = king_shield_count(pos, side, sq) as i32;
        let attackers = king_ring_attackers(pos, side, sq) as i32;
        (weights.king_safety.shield_bonus * shield
            - weights.king_safety.attacker_penalty * attackers)
            * sign
    } else {
        0
    };

    let signed_total = base + pst + mobility + pawn_structure + king_safety;
    PieceBreakdown { base, pst, mobility, pawn_structure, king_safety, signed_total }
}

/// White-minus-Black centipawn score.
#[must_use]
pub fn evaluate(pos: &Position, weights: &EvalWeights) -> i32 {
    let mut total = 0;
    for side in [Side::White, Side::Black] {
        let mut file_seen = [false; 8];
        for piece in ALL_PIECES {
            for sq in pos.pieces_of(side, piece).iter() {
                total += piece_terms(pos, weights, side, piece, sq, &mut file_seen).signed_total;
            }
        }
    }
    total
}

/// Score in the perspective of the side to move, for negamax leaves. The
/// one sign flip at the search/eval boundary, kept out of `evaluate`
/// itself.
#[must_use]
pub fn evaluate_side_to_move(pos: &Position, weights: &EvalWeights) -> i32 {
    let score = evaluate(pos, weights);
    if pos.side_to_move() == Side::White {
        score
    } else {
        -score
    }
}

/// Full per-piece decomposition for every occupied square.
#[must_use]
pub fn piece_breakdown(pos: &Position, weights: &EvalWeights) -> HashMap<Square, PieceBreakdown> {
    let mut map = HashMap::new();
    for side in [Side::White, Side::Black] {
        let mut file_seen = [false; 8];
        for piece in ALL_PIECES {
            for sq in pos.pieces_of(side, piece).iter() {
                let terms = piece_terms(pos, weights, side, piece, sq, &mut file_seen);
                map.insert(sq, terms);
            }
        }
    }
    map
}

/// `signed_total` per occupied square, duplicated from the breakdown for UI
/// convenience.
#[must_use]
pub fn piece_values(breakdown: &HashMap<Square, PieceBreakdown>) -> HashMap<Square, i32> {
    breakdown.iter().map(|(&sq, terms)| (sq, terms.signed_total)).collect()
}

/// Board "pressure" heatmap: attacker-count difference per square, only
/// non-zero entries.
#[must_use]
pub fn heatmap(pos: &Position) -> HashMap<Square, i32> {
    let mut map = HashMap::new();
    for idx in 0..64u8 {
        let sq = Square::from_index(idx);
        let white = count_attackers(pos, sq, Side::White) as i32;
        let black = count_attackers(pos, sq, Side::Black) as i32;
        let pressure = white - black;
        if pressure != 0 {
            map.insert(sq, pressure);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{Position, START_FEN};

    /// Swap colors and mirror the board vertically: White's piece on `sq`
    /// becomes Black's piece on `sq.mirror_vertical()`, and vice versa.
    fn color_swapped_mirror(pos: &Position) -> Position {
        let mut mirrored = Position::empty();
        for side in [Side::White, Side::Black] {
            for piece in ALL_PIECES {
                for sq in pos.pieces_of(side, piece).iter() {
                    mirrored.put_piece(side.opposite(), piece, sq.mirror_vertical());
                }
            }
        }
        mirrored
    }

    #[test]
    fn start_position_is_symmetric() {
        let pos = Position::parse_fen(START_FEN).unwrap();
        let weights = EvalWeights::default();
        assert_eq!(evaluate(&pos, &weights), 0);
    }

    #[test]
    fn evaluator_is_antisymmetric_under_color_swap() {
        let weights = EvalWeights::default();
        let positions = [
            START_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/8/8/4k3/8/5n2/4P3/4K3 w - - 0 1",
        ];
        for fen in positions {
            let pos = Position::parse_fen(fen).unwrap();
            let mirrored = color_swapped_mirror(&pos);
            assert_eq!(evaluate(&mirrored, &weights), -evaluate(&pos, &weights), "mismatch for {fen}");
        }
    }

    #[test]
    fn decomposition_sums_to_score() {
        let weights = EvalWeights::default();
        let positions = [
            START_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/8/8/4k3/8/8/4P3/4K3 w - - 0 1",
        ];
        for fen in positions {
            let pos = Position::parse_fen(fen).unwrap();
            let score = evaluate(&pos, &weights);
            let breakdown = piece_breakdown(&pos, &weights);
            let sum: i32 = breakdown.values().map(|t| t.signed_total).sum();
            assert_eq!(sum, score, "mismatch for {fen}");
        }
    }

    #[test]
    fn heatmap_only_emits_nonzero() {
        let pos = Position::parse_fen(START_FEN).unwrap();
        let hm = heatmap(&pos);
        assert!(hm.values().all(|&v| v != 0));
    }

    #[test]
    fn extra_pawn_favors_its_side() {
        let base = Position::parse_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let with_pawn = Position::parse_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let weights = EvalWeights::default();
        assert!(evaluate(&with_pawn, &weights) > evaluate(&base, &weights));
    }
}

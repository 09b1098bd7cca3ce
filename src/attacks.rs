//! Precomputed attack tables and classical ray-scan slider attacks.
//!
//! Sliders are resolved by ray scan rather than magic bitboards: for each of
//! the eight compass rays from a square, mask off everything beyond the
//! first blocker (inclusive of the blocker itself). This keeps the
//! generator auditable at some cost in raw speed, an acceptable trade
//! against perft-correctness.

use once_cell::sync::Lazy;

use crate::types::{Bitboard, Piece, Side, Square};

/// The eight compass directions.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

pub const DIRECTIONS: [Direction; 8] = [
    Direction::N,
    Direction::NE,
    Direction::E,
    Direction::SE,
    Direction::S,
    Direction::SW,
    Direction::W,
    Direction::NW,
];

const DIAGONALS: [Direction; 4] = [Direction::NE, Direction::SE, Direction::SW, Direction::NW];
const ORTHOGONALS: [Direction; 4] = [Direction::N, Direction::E, Direction::S, Direction::W];

impl Direction {
    const fn delta(self) -> (i8, i8) {
        match self {
            Direction::N => (1, 0),
            Direction::NE => (1, 1),
            Direction::E => (0, 1),
            Direction::SE => (-1, 1),
            Direction::S => (-1, 0),
            Direction::SW => (-1, -1),
            Direction::W => (0, -1),
            Direction::NW => (1, -1),
        }
    }

    /// Whether stepping in this direction increases the square index. Used
    /// to decide LSB- vs MSB-first blocker search.
    const fn increases_index(self) -> bool {
        matches!(self, Direction::N | Direction::NE | Direction::E | Direction::NW)
    }
}

fn ray(from: Square, dir: Direction) -> Bitboard {
    let (dr, df) = dir.delta();
    let mut rank = from.rank() as i8;
    let mut file = from.file() as i8;
    let mut bb = Bitboard::EMPTY;
    loop {
        rank += dr;
        file += df;
        if !(0..8).contains(&rank) || !(0..8).contains(&file) {
            break;
        }
        bb.set_bit(Square::from_rank_file(rank as u8, file as u8));
    }
    bb
}

fn knight_attacks_from(from: Square) -> Bitboard {
    const OFFSETS: [(i8, i8); 8] = [
        (2, 1), (2, -1), (-2, 1), (-2, -1),
        (1, 2), (1, -2), (-1, 2), (-1, -2),
    ];
    let mut bb = Bitboard::EMPTY;
    let rank = from.rank() as i8;
    let file = from.file() as i8;
    for (dr, df) in OFFSETS {
        let (r, f) = (rank + dr, file + df);
        if (0..8).contains(&r) && (0..8).contains(&f) {
            bb.set_bit(Square::from_rank_file(r as u8, f as u8));
        }
    }
    bb
}

fn king_attacks_from(from: Square) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    let rank = from.rank() as i8;
    let file = from.file() as i8;
    for dr in -1..=1i8 {
        for df in -1..=1i8 {
            if dr == 0 && df == 0 {
                continue;
            }
            let (r, f) = (rank + dr, file + df);
            if (0..8).contains(&r) && (0..8).contains(&f) {
                bb.set_bit(Square::from_rank_file(r as u8, f as u8));
            }
        }
    }
    bb
}

fn pawn_attacks_from(from: Square, side: Side) -> Bitboard {
    let rank = from.rank() as i8;
    let file = from.file() as i8;
    let dr: i8 = if side == Side::White { 1 } else { -1 };
    let mut bb = Bitboard::EMPTY;
    for df in [-1i8, 1] {
        let (r, f) = (rank + dr, file + df);
        if (0..8).contains(&r) && (0..8).contains(&f) {
            bb.set_bit(Square::from_rank_file(r as u8, f as u8));
        }
    }
    bb
}

struct Tables {
    ray: [[Bitboard; 64]; 8],
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    pawn: [[Bitboard; 64]; 2],
}

static TABLES: Lazy<Tables> = Lazy::new(|| {
    let mut ray = [[Bitboard::EMPTY; 64]; 8];
    let mut knight = [Bitboard::EMPTY; 64];
    let mut king = [Bitboard::EMPTY; 64];
    let mut pawn = [[Bitboard::EMPTY; 64]; 2];

    for idx in 0..64u8 {
        let sq = Square::from_index(idx);
        for (dir_idx, dir) in DIRECTIONS.iter().enumerate() {
            ray[dir_idx][idx as usize] = self::ray(sq, *dir);
        }
        knight[idx as usize] = knight_attacks_from(sq);
        king[idx as usize] = king_attacks_from(sq);
        pawn[Side::White.index()][idx as usize] = pawn_attacks_from(sq, Side::White);
        pawn[Side::Black.index()][idx as usize] = pawn_attacks_from(sq, Side::Black);
    }

    Tables { ray, knight, king, pawn }
});

#[must_use]
pub fn pawn_attacks(side: Side, sq: Square) -> Bitboard {
    TABLES.pawn[side.index()][sq.index() as usize]
}

#[must_use]
pub fn knight_attacks(sq: Square) -> Bitboard {
    TABLES.knight[sq.index() as usize]
}

#[must_use]
pub fn king_attacks(sq: Square) -> Bitboard {
    TABLES.king[sq.index() as usize]
}

#[must_use]
pub fn ray_attacks(dir: Direction, sq: Square) -> Bitboard {
    TABLES.ray[dir as usize][sq.index() as usize]
}

/// Mask a single ray off beyond (and including) its first blocker, per the
/// LSB/MSB rule above.
fn masked_ray(sq: Square, dir: Direction, occupancy: Bitboard) -> Bitboard {
    let full = ray_attacks(dir, sq);
    let blockers = full & occupancy;
    if blockers.is_empty() {
        return full;
    }
    if dir.increases_index() {
        let first = blockers.lsb();
        full & !ray_attacks(dir, first)
    } else {
        // Highest set bit: find via 63 - leading_zeros.
        let first = Square::from_index(63 - blockers.0.leading_zeros() as u8);
        full & !ray_attacks(dir, first)
    }
}

#[must_use]
pub fn bishop_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    for dir in DIAGONALS {
        bb |= masked_ray(sq, dir, occupancy);
    }
    bb
}

#[must_use]
pub fn rook_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    for dir in ORTHOGONALS {
        bb |= masked_ray(sq, dir, occupancy);
    }
    bb
}

#[must_use]
pub fn queen_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupancy) | rook_attacks(sq, occupancy)
}

/// Attack set for any piece kind, dispatching sliders through the ray scan
/// and leaf pieces through their lookup tables. `side` only matters for
/// pawns.
#[must_use]
pub fn piece_attacks(piece: Piece, side: Side, sq: Square, occupancy: Bitboard) -> Bitboard {
    match piece {
        Piece::Pawn => pawn_attacks(side, sq),
        Piece::Knight => knight_attacks(sq),
        Piece::Bishop => bishop_attacks(sq, occupancy),
        Piece::Rook => rook_attacks(sq, occupancy),
        Piece::Queen => queen_attacks(sq, occupancy),
        Piece::King => king_attacks(sq),
    }
}

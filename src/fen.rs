//! FEN parsing and emission.

use crate::error::{EngineError, FenError};
use crate::position::Position;
use crate::types::{CastlingRights, Piece, Side, Square};

pub(crate) fn parse_fen(fen: &str) -> Result<Position, EngineError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(FenError::TooFewFields { found: fields.len() }.into());
    }

    let mut pos = Position::empty();

    let ranks: Vec<&str> = fields[0].split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::WrongRankCount { found: ranks.len() }.into());
    }
    // FEN lists White's 8th rank first.
    for (row, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - row as u8;
        let mut file = 0u8;
        for c in rank_str.chars() {
            if let Some(d) = c.to_digit(10) {
                file += d as u8;
            } else {
                let side = if c.is_ascii_uppercase() { Side::White } else { Side::Black };
                let piece =
                    Piece::from_char(c).ok_or(FenError::InvalidPieceChar { ch: c })?;
                if file >= 8 {
                    return Err(FenError::RankWrongLength {
                        rank: row,
                        files: file as usize + 1,
                    }
                    .into());
                }
                pos.put_piece(side, piece, Square::from_rank_file(rank, file));
                file += 1;
            }
        }
        if file != 8 {
            return Err(FenError::RankWrongLength { rank: row, files: file as usize }.into());
        }
    }

    pos.side_to_move = match fields[1] {
        "w" => Side::White,
        "b" => Side::Black,
        other => return Err(FenError::InvalidSideToMove { found: other.to_string() }.into()),
    };

    let mut castling = CastlingRights::none();
    if fields[2] != "-" {
        for c in fields[2].chars() {
            match c {
                'K' => castling.white_short = true,
                'Q' => castling.white_long = true,
                'k' => castling.black_short = true,
                'q' => castling.black_long = true,
                other => return Err(FenError::InvalidCastlingChar { ch: other }.into()),
            }
        }
    }
    pos.castling = castling;

    pos.en_passant = if fields[3] == "-" {
        None
    } else {
        Some(Square::parse(fields[3]).ok_or_else(|| FenError::InvalidEnPassant {
            found: fields[3].to_string(),
        })?)
    };

    pos.halfmove_clock = if fields.len() >= 5 {
        fields[4]
            .parse()
            .map_err(|_| FenError::InvalidHalfmoveClock { found: fields[4].to_string() })?
    } else {
        0
    };

    pos.fullmove_number = if fields.len() >= 6 {
        let n: u32 = fields[5]
            .parse()
            .map_err(|_| FenError::InvalidFullmoveNumber { found: fields[5].to_string() })?;
        if n == 0 {
            return Err(FenError::InvalidFullmoveNumber { found: fields[5].to_string() }.into());
        }
        n
    } else {
        1
    };

    Ok(pos)
}

pub(crate) fn to_fen(pos: &Position) -> String {
    let mut ranks = Vec::with_capacity(8);
    for rank in (0..8u8).rev() {
        let mut row = String::new();
        let mut empty = 0u8;
        for file in 0..8u8 {
            let sq = Square::from_rank_file(rank, file);
            if let Some((side, piece)) = pos.piece_at(sq) {
                if empty > 0 {
                    row.push_str(&empty.to_string());
                    empty = 0;
                }
                row.push(piece.to_fen_char(side));
            } else {
                empty += 1;
            }
        }
        if empty > 0 {
            row.push_str(&empty.to_string());
        }
        ranks.push(row);
    }

    let ep = pos.en_passant.map_or_else(|| "-".to_string(), |sq| sq.to_string());

    format!(
        "{} {} {} {} {} {}",
        ranks.join("/"),
        pos.side_to_move,
        pos.castling.to_fen_field(),
        ep,
        pos.halfmove_clock,
        pos.fullmove_number
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::START_FEN;

    #[test]
    fn roundtrip_start() {
        let pos = Position::parse_fen(START_FEN).unwrap();
        assert_eq!(pos.to_fen(), START_FEN);
    }

    #[test]
    fn roundtrip_kiwipete() {
        let kiwipete = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let pos = Position::parse_fen(kiwipete).unwrap();
        assert_eq!(pos.to_fen(), kiwipete);
    }

    #[test]
    fn too_few_fields() {
        assert!(matches!(
            Position::parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w"),
            Err(EngineError::InvalidFen(FenError::TooFewFields { .. }))
        ));
    }

    #[test]
    fn invalid_piece_char() {
        assert!(Position::parse_fen("rnbqkbnx/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .is_err());
    }

    #[test]
    fn missing_fields_default() {
        let pos = Position::parse_fen("8/8/8/8/8/8/8/4K2k w - -").unwrap();
        assert_eq!(pos.halfmove_clock(), 0);
        assert_eq!(pos.fullmove_number(), 1);
    }

    #[test]
    fn en_passant_field() {
        let pos =
            Position::parse_fen("4k3/8/8/8/4Pp2/8/8/4K3 b - e3 0 1").unwrap();
        assert_eq!(pos.en_passant_target(), Square::parse("e3"));
    }
}

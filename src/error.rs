//! Error types for the engine's external-facing operations.

use std::fmt;

/// Error kinds the engine can report to a caller.
///
/// `Internal` represents an invariant violation (a bug) rather than bad
/// input; it is the only kind that should ever surface from code the
/// generator itself produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The supplied FEN string is structurally invalid.
    InvalidFen(FenError),
    /// The requested move is not in the current legal set.
    IllegalMove { notation: String },
    /// An internal invariant was violated (king count, occupancy sync, ...).
    Internal(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidFen(e) => write!(f, "invalid FEN: {e}"),
            EngineError::IllegalMove { notation } => {
                write!(f, "illegal move '{notation}'")
            }
            EngineError::Internal(msg) => write!(f, "internal engine error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<FenError> for EngineError {
    fn from(e: FenError) -> Self {
        EngineError::InvalidFen(e)
    }
}

/// Error describing why a FEN string failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    /// FEN has fewer than the four mandatory space-separated fields.
    TooFewFields { found: usize },
    /// Piece-placement field does not have exactly eight ranks.
    WrongRankCount { found: usize },
    /// A rank's square count does not sum to 8.
    RankWrongLength { rank: usize, files: usize },
    /// An unrecognized character appeared in the piece-placement field.
    InvalidPieceChar { ch: char },
    /// The side-to-move field was not `w` or `b`.
    InvalidSideToMove { found: String },
    /// The castling-rights field contained an unrecognized character.
    InvalidCastlingChar { ch: char },
    /// The en-passant field was not `-` or a valid algebraic square.
    InvalidEnPassant { found: String },
    /// The halfmove-clock field did not parse as a non-negative integer.
    InvalidHalfmoveClock { found: String },
    /// The fullmove-number field did not parse as a positive integer.
    InvalidFullmoveNumber { found: String },
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::TooFewFields { found } => {
                write!(f, "expected at least 4 space-separated fields, found {found}")
            }
            FenError::WrongRankCount { found } => {
                write!(f, "expected 8 ranks in piece placement, found {found}")
            }
            FenError::RankWrongLength { rank, files } => {
                write!(f, "rank {rank} has {files} files, expected 8")
            }
            FenError::InvalidPieceChar { ch } => write!(f, "invalid piece character '{ch}'"),
            FenError::InvalidSideToMove { found } => {
                write!(f, "invalid side to move '{found}', expected 'w' or 'b'")
            }
            FenError::InvalidCastlingChar { ch } => {
                write!(f, "invalid castling rights character '{ch}'")
            }
            FenError::InvalidEnPassant { found } => {
                write!(f, "invalid en passant square '{found}'")
            }
            FenError::InvalidHalfmoveClock { found } => {
                write!(f, "invalid halfmove clock '{found}'")
            }
            FenError::InvalidFullmoveNumber { found } => {
                write!(f, "invalid fullmove number '{found}'")
            }
        }
    }
}

impl std::error::Error for FenError {}

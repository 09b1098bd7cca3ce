//! Castling-rights bookkeeping.

/// The four independent castling rights.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastlingRights {
    pub white_short: bool,
    pub white_long: bool,
    pub black_short: bool,
    pub black_long: bool,
}

impl CastlingRights {
    #[must_use]
    pub const fn none() -> Self {
        CastlingRights {
            white_short: false,
            white_long: false,
            black_short: false,
            black_long: false,
        }
    }

    #[must_use]
    pub const fn all() -> Self {
        CastlingRights {
            white_short: true,
            white_long: true,
            black_short: true,
            black_long: true,
        }
    }

    /// Render as the FEN castling field (`KQkq`, a subset, or `-`).
    #[must_use]
    pub fn to_fen_field(self) -> String {
        let mut s = String::new();
        if self.white_short {
            s.push('K');
        }
        if self.white_long {
            s.push('Q');
        }
        if self.black_short {
            s.push('k');
        }
        if self.black_long {
            s.push('q');
        }
        if s.is_empty() {
            s.push('-');
        }
        s
    }
}

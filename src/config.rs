//! Runtime configuration surface.
//!
//! Gathers the engine's tunables — snapshot throttle interval, evaluator
//! weights, search limits — into the small set of structs a façade
//! actually constructs.

/// Depth/time/streaming limits for one search.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchLimits {
    pub max_depth: u32,
    pub time_limit_ms: u64,
    pub snapshot_interval_ms: u64,
}

/// Default throttle interval when the caller doesn't specify one.
pub const DEFAULT_SNAPSHOT_INTERVAL_MS: u64 = 140;
/// Floor below which the throttle interval is never allowed to drop.
pub const MIN_SNAPSHOT_INTERVAL_MS: u64 = 50;

impl SearchLimits {
    #[must_use]
    pub fn new(max_depth: u32, time_limit_ms: u64) -> Self {
        SearchLimits {
            max_depth: max_depth.max(1),
            time_limit_ms: time_limit_ms.max(1),
            snapshot_interval_ms: DEFAULT_SNAPSHOT_INTERVAL_MS,
        }
    }

    #[must_use]
    pub fn with_snapshot_interval_ms(mut self, interval_ms: u64) -> Self {
        self.snapshot_interval_ms = interval_ms.max(MIN_SNAPSHOT_INTERVAL_MS);
        self
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits {
            max_depth: 6,
            time_limit_ms: 5000,
            snapshot_interval_ms: DEFAULT_SNAPSHOT_INTERVAL_MS,
        }
    }
}

/// Per-piece mobility weight in centipawns per reachable square.
#[derive(Clone, Copy, Debug)]
pub struct MobilityWeights {
    pub knight: i32,
    pub bishop: i32,
    pub rook: i32,
    pub queen: i32,
}

/// Pawn-structure penalty/bonus magnitudes.
#[derive(Clone, Copy, Debug)]
pub struct PawnStructureWeights {
    pub doubled_penalty: i32,
    pub isolated_penalty: i32,
    pub passed_bonus: i32,
}

/// King-safety weights.
#[derive(Clone, Copy, Debug)]
pub struct KingSafetyWeights {
    pub shield_bonus: i32,
    pub attacker_penalty: i32,
}

/// All evaluator tunables in one reproducible place, locked to a single
/// (non-tapered) value set with no middlegame/endgame phase split.
#[derive(Clone, Copy, Debug)]
pub struct EvalWeights {
    pub mobility: MobilityWeights,
    pub pawn_structure: PawnStructureWeights,
    pub king_safety: KingSafetyWeights,
}

impl Default for EvalWeights {
    fn default() -> Self {
        EvalWeights {
            mobility: MobilityWeights { knight: 4, bishop: 5, rook: 2, queen: 1 },
            pawn_structure: PawnStructureWeights {
                doubled_penalty: 12,
                isolated_penalty: 10,
                passed_bonus: 20,
            },
            king_safety: KingSafetyWeights { shield_bonus: 8, attacker_penalty: 15 },
        }
    }
}

/// Top-level configuration bundle a façade holds alongside a `Position`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EngineConfig {
    pub eval_weights: EvalWeights,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_interval_defaults_and_floors() {
        let limits = SearchLimits::new(4, 1000);
        assert_eq!(limits.snapshot_interval_ms, DEFAULT_SNAPSHOT_INTERVAL_MS);
        let clamped = limits.with_snapshot_interval_ms(1);
        assert_eq!(clamped.snapshot_interval_ms, MIN_SNAPSHOT_INTERVAL_MS);
    }

    #[test]
    fn max_depth_and_time_limit_floor_at_one() {
        let limits = SearchLimits::new(0, 0);
        assert_eq!(limits.max_depth, 1);
        assert_eq!(limits.time_limit_ms, 1);
    }
}

//! The crate's public façade operations.
//!
//! A request/response façade (HTTP endpoints, a WebSocket) is out of scope
//! for this crate, but it needs a stable surface to call into — this
//! module is that surface. It owns the one place where internal,
//! `Move`/`Square`-keyed types are converted to the string-keyed record
//! shapes this crate normatively names (`candidate_moves{move→cp}`,
//! etc.).

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::channel::{self, ChannelReceiver, ErrorKind, Record, Throttle};
use crate::config::{EngineConfig, SearchLimits};
use crate::error::EngineError;
use crate::eval::PieceBreakdown;
use crate::movegen::{generate_legal_moves, is_square_attacked};
use crate::position::{Position, START_FEN};
use crate::search::{self, SearchResult, SearchSnapshot};
use crate::types::{Move, Side};

/// Game-termination status of a position.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameStatus {
    Ongoing,
    Checkmate,
    Stalemate,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameStatus::Ongoing => "ongoing",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Stalemate => "stalemate",
        })
    }
}

fn status_of(pos: &mut Position) -> GameStatus {
    let side = pos.side_to_move();
    let legal = generate_legal_moves(pos);
    if !legal.is_empty() {
        return GameStatus::Ongoing;
    }
    if is_square_attacked(pos, pos.king_square(side), side.opposite()) {
        GameStatus::Checkmate
    } else {
        GameStatus::Stalemate
    }
}

/// Response shape shared by `legal_moves`, `apply_move`, and `reset`.
#[derive(Clone, Debug)]
pub struct PositionView {
    pub fen: String,
    pub side_to_move: String,
    pub legal_moves: Vec<String>,
    pub status: GameStatus,
    pub position_eval_cp: i32,
    pub position_eval: f64,
}

fn position_view(mut pos: Position, weights: &crate::config::EvalWeights) -> PositionView {
    let eval_cp = crate::eval::evaluate_side_to_move(&pos, weights);
    let legal = generate_legal_moves(&mut pos);
    let legal_moves = legal.iter().map(|m| m.to_long_algebraic()).collect();
    let side_to_move = pos.side_to_move().to_string();
    let status = status_of(&mut pos);
    PositionView {
        fen: pos.to_fen(),
        side_to_move,
        legal_moves,
        status,
        position_eval_cp: eval_cp,
        position_eval: (eval_cp as f64) / 100.0,
    }
}

/// Parse a FEN string into a `Position`.
pub fn parse_fen(fen: &str) -> Result<Position, EngineError> {
    Position::parse_fen(fen)
}

/// Legal moves and status for the position a FEN encodes.
pub fn legal_moves(fen: &str) -> Result<PositionView, EngineError> {
    legal_moves_with_config(fen, &EngineConfig::default())
}

pub fn legal_moves_with_config(fen: &str, config: &EngineConfig) -> Result<PositionView, EngineError> {
    let pos = Position::parse_fen(fen)?;
    Ok(position_view(pos, &config.eval_weights))
}

/// Apply a long-algebraic move to a FEN position, returning the same
/// shape as `legal_moves`.
pub fn apply_move(fen: &str, mv: &str) -> Result<PositionView, EngineError> {
    apply_move_with_config(fen, mv, &EngineConfig::default())
}

pub fn apply_move_with_config(
    fen: &str,
    mv: &str,
    config: &EngineConfig,
) -> Result<PositionView, EngineError> {
    let mut pos = Position::parse_fen(fen)?;
    let legal = generate_legal_moves(&mut pos);
    let chosen = legal
        .iter()
        .find(|m| m.to_long_algebraic() == mv)
        .copied()
        .ok_or_else(|| EngineError::IllegalMove { notation: mv.to_string() })?;
    pos.make(chosen);
    Ok(position_view(pos, &config.eval_weights))
}

/// `legal_moves` for the canonical start position.
#[must_use]
pub fn reset() -> PositionView {
    legal_moves(START_FEN).expect("canonical start FEN always parses")
}

fn stringify_candidates(map: &HashMap<Move, i32>) -> HashMap<String, i32> {
    map.iter().map(|(mv, score)| (mv.to_long_algebraic(), *score)).collect()
}

fn stringify_square_map<T: Clone>(map: &HashMap<crate::types::Square, T>) -> HashMap<String, T> {
    map.iter().map(|(sq, value)| (sq.to_string(), value.clone())).collect()
}

/// Terminal search result with every key stringified.
#[derive(Clone, Debug)]
pub struct AnalyzeResponse {
    pub best_move: Option<String>,
    pub best_score: i32,
    pub eval_cp: i32,
    pub eval: f64,
    pub depth: u32,
    pub nodes: u64,
    pub nps: u64,
    pub cutoffs: u64,
    pub elapsed_ms: u64,
    pub pv: Vec<String>,
    pub current_move: Option<String>,
    pub candidate_moves: HashMap<String, i32>,
    pub piece_values: HashMap<String, i32>,
    pub piece_breakdown: HashMap<String, PieceBreakdown>,
    pub heatmap: HashMap<String, i32>,
}

fn to_analyze_response(result: &SearchResult) -> AnalyzeResponse {
    AnalyzeResponse {
        best_move: result.best_move.map(|m| m.to_long_algebraic()),
        best_score: result.best_score,
        eval_cp: result.eval_cp,
        eval: result.eval,
        depth: result.depth,
        nodes: result.nodes,
        nps: result.nps,
        cutoffs: result.cutoffs,
        elapsed_ms: result.elapsed_ms,
        pv: result.pv.iter().map(|m| m.to_long_algebraic()).collect(),
        current_move: result.best_move.map(|m| m.to_long_algebraic()),
        candidate_moves: stringify_candidates(&result.candidate_moves),
        piece_values: stringify_square_map(&result.piece_values),
        piece_breakdown: stringify_square_map(&result.piece_breakdown),
        heatmap: stringify_square_map(&result.heatmap),
    }
}

/// In-flight search snapshot with every key stringified.
#[derive(Clone, Debug)]
pub struct SnapshotResponse {
    pub depth: u32,
    pub eval_cp: i32,
    pub eval: f64,
    pub nodes: u64,
    pub nps: u64,
    pub cutoffs: u64,
    pub elapsed_ms: u64,
    pub current_move: Option<String>,
    pub pv: Vec<String>,
    pub candidate_moves: HashMap<String, i32>,
    pub piece_values: HashMap<String, i32>,
    pub piece_breakdown: HashMap<String, PieceBreakdown>,
    pub heatmap: HashMap<String, i32>,
}

fn to_snapshot_response(snapshot: &SearchSnapshot) -> SnapshotResponse {
    SnapshotResponse {
        depth: snapshot.depth,
        eval_cp: snapshot.eval_cp,
        eval: snapshot.eval,
        nodes: snapshot.nodes,
        nps: snapshot.nps,
        cutoffs: snapshot.cutoffs,
        elapsed_ms: snapshot.elapsed_ms,
        current_move: snapshot.current_move.map(|m| m.to_long_algebraic()),
        pv: snapshot.pv.iter().map(|m| m.to_long_algebraic()).collect(),
        candidate_moves: stringify_candidates(&snapshot.candidate_moves),
        piece_values: stringify_square_map(&snapshot.piece_values),
        piece_breakdown: stringify_square_map(&snapshot.piece_breakdown),
        heatmap: stringify_square_map(&snapshot.heatmap),
    }
}

/// Run a search to completion, synchronously, with no streaming.
pub fn analyze(fen: &str, max_depth: u32, time_limit_ms: u64) -> Result<AnalyzeResponse, EngineError> {
    analyze_with_config(fen, max_depth, time_limit_ms, &EngineConfig::default())
}

pub fn analyze_with_config(
    fen: &str,
    max_depth: u32,
    time_limit_ms: u64,
    config: &EngineConfig,
) -> Result<AnalyzeResponse, EngineError> {
    let mut pos = Position::parse_fen(fen)?;
    let limits = SearchLimits::new(max_depth, time_limit_ms);
    let cancel = AtomicBool::new(false);
    let result = search::run(&mut pos, &limits, &config.eval_weights, &cancel, |_| {});
    Ok(to_analyze_response(&result))
}

/// Search result plus the position after the best move is applied.
#[derive(Clone, Debug)]
pub struct EngineMoveResponse {
    pub search: AnalyzeResponse,
    pub fen: String,
    pub side_to_move: String,
    pub legal_moves: Vec<String>,
    pub status: GameStatus,
}

pub fn engine_move(
    fen: &str,
    max_depth: u32,
    time_limit_ms: u64,
) -> Result<EngineMoveResponse, EngineError> {
    engine_move_with_config(fen, max_depth, time_limit_ms, &EngineConfig::default())
}

pub fn engine_move_with_config(
    fen: &str,
    max_depth: u32,
    time_limit_ms: u64,
    config: &EngineConfig,
) -> Result<EngineMoveResponse, EngineError> {
    let mut pos = Position::parse_fen(fen)?;
    let limits = SearchLimits::new(max_depth, time_limit_ms);
    let cancel = AtomicBool::new(false);
    let result = search::run(&mut pos, &limits, &config.eval_weights, &cancel, |_| {});
    let search_response = to_analyze_response(&result);

    if let Some(best_move) = result.best_move {
        pos.make(best_move);
    }
    let mut applied = pos;
    let legal = generate_legal_moves(&mut applied);
    let legal_moves = legal.iter().map(|m| m.to_long_algebraic()).collect();
    let side_to_move = applied.side_to_move().to_string();
    let status = status_of(&mut applied);

    Ok(EngineMoveResponse {
        search: search_response,
        fen: applied.to_fen(),
        side_to_move,
        legal_moves,
        status,
    })
}

/// A streamed record: `snapshot`, `complete`, or `error`.
#[derive(Clone, Debug)]
pub enum StreamRecord {
    Snapshot(SnapshotResponse),
    Complete(AnalyzeResponse),
    Error { message: String, kind: &'static str },
}

fn error_kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidFen => "InvalidFen",
        ErrorKind::IllegalMove => "IllegalMove",
        ErrorKind::Internal => "InternalError",
    }
}

/// Consumer handle returned by `stream_search`: a `ChannelReceiver`
/// wrapped to hand back the public, string-keyed record shapes.
pub struct StreamHandle {
    receiver: ChannelReceiver,
}

impl StreamHandle {
    /// Block for the next record; `None` once the channel has delivered
    /// its terminal record and is drained.
    pub fn recv(&self) -> Option<StreamRecord> {
        self.receiver.recv().map(Self::convert)
    }

    #[must_use]
    pub fn try_recv(&self) -> Option<StreamRecord> {
        self.receiver.try_recv().map(Self::convert)
    }

    fn convert(record: Record) -> StreamRecord {
        match record {
            Record::Snapshot(s) => StreamRecord::Snapshot(to_snapshot_response(&s)),
            Record::Complete(r) => StreamRecord::Complete(to_analyze_response(&r)),
            Record::Error { message, kind } => {
                StreamRecord::Error { message, kind: error_kind_name(kind) }
            }
        }
    }
}

/// A handle to request cancellation of an in-flight `stream_search`.
#[derive(Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Spawn a search on its own thread, publishing through a fresh channel
/// so the search task never blocks on the consumer.
pub fn stream_search(
    fen: &str,
    limits: SearchLimits,
) -> Result<(StreamHandle, CancelHandle), EngineError> {
    stream_search_with_config(fen, limits, EngineConfig::default())
}

pub fn stream_search_with_config(
    fen: &str,
    limits: SearchLimits,
    config: EngineConfig,
) -> Result<(StreamHandle, CancelHandle), EngineError> {
    let mut pos = Position::parse_fen(fen)?;
    let (sender, receiver) = channel::channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_for_search = Arc::clone(&cancel);

    thread::spawn(move || {
        let mut throttle = Throttle::new(limits.snapshot_interval_ms);
        let result = search::run(&mut pos, &limits, &config.eval_weights, &cancel_for_search, |snapshot| {
            if throttle.should_emit(Instant::now()) {
                sender.publish(Record::Snapshot(snapshot));
            }
        });
        sender.finish(Record::Complete(result));
    });

    Ok((StreamHandle { receiver }, CancelHandle(cancel)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_moves_start_position() {
        let view = legal_moves(START_FEN).unwrap();
        assert_eq!(view.legal_moves.len(), 20);
        assert!(view.legal_moves.contains(&"e2e4".to_string()));
        assert!(view.legal_moves.contains(&"g1f3".to_string()));
        assert!(!view.legal_moves.contains(&"e2e5".to_string()));
        assert_eq!(view.status, GameStatus::Ongoing);
    }

    #[test]
    fn apply_move_rejects_illegal_notation() {
        let err = apply_move(START_FEN, "e2e5").unwrap_err();
        assert!(matches!(err, EngineError::IllegalMove { .. }));
    }

    #[test]
    fn apply_move_sets_en_passant_and_side() {
        let view = apply_move("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1", "e2e4").unwrap();
        assert_eq!(view.side_to_move, "b");
        assert!(view.fen.contains(" e3 "));
    }

    #[test]
    fn reset_returns_start_position() {
        let view = reset();
        assert_eq!(view.fen, START_FEN);
        assert_eq!(view.legal_moves.len(), 20);
    }

    #[test]
    fn analyze_finds_mate_in_one() {
        let result = analyze("7k/8/8/8/8/8/6Q1/6K1 w - - 0 1", 3, 2000).unwrap();
        assert_eq!(result.best_move, Some("g2g7".to_string()));
    }

    #[test]
    fn engine_move_applies_best_move_and_reports_checkmate() {
        let response = engine_move("7k/8/8/8/8/8/6Q1/6K1 w - - 0 1", 3, 2000).unwrap();
        assert_eq!(response.search.best_move, Some("g2g7".to_string()));
        assert_eq!(response.status, GameStatus::Checkmate);
        assert_eq!(response.side_to_move, "b");
    }

    #[test]
    fn stream_search_emits_snapshots_then_one_complete() {
        let limits = SearchLimits::new(8, 500);
        let (handle, _cancel) = stream_search(START_FEN, limits).unwrap();
        let mut saw_snapshot = false;
        let mut last_depth = 0u32;
        loop {
            match handle.recv() {
                Some(StreamRecord::Snapshot(s)) => {
                    assert!(s.depth >= last_depth);
                    last_depth = s.depth;
                    saw_snapshot = true;
                }
                Some(StreamRecord::Complete(c)) => {
                    assert!(c.depth >= 1);
                    break;
                }
                Some(StreamRecord::Error { .. }) => panic!("unexpected error record"),
                None => panic!("channel closed without a terminal record"),
            }
        }
        let _ = saw_snapshot;
    }

    #[test]
    fn stream_search_cancellation_stops_the_search() {
        let limits = SearchLimits::new(30, 60_000);
        let (handle, cancel) = stream_search(START_FEN, limits).unwrap();
        cancel.cancel();
        loop {
            match handle.recv() {
                Some(StreamRecord::Complete(_)) => break,
                Some(_) => continue,
                None => panic!("channel closed without a terminal record"),
            }
        }
    }
}

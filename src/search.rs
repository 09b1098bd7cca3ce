//! Iterative-deepening negamax with alpha-beta pruning, move ordering, time
//! control, and cooperative snapshot publishing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::config::{EvalWeights, SearchLimits};
use crate::eval::{self, PieceBreakdown};
use crate::movegen::{generate_legal_moves, is_square_attacked};
use crate::position::Position;
use crate::types::{Move, Square};

#[cfg(feature = "logging")]
use log::{debug, trace};

/// Sentinel mate score; kept well clear of any plausible evaluator range
/// (material tops out in the low thousands of centipawns) so mate scores
/// are unambiguous.
pub const MATE: i32 = 100_000;
const INF: i32 = 1_000_000;

/// Marker returned up the call stack when a time or cancellation abort
/// unwinds the recursion. Never a panic.
struct Aborted;

type NodeResult = Result<(i32, Vec<Move>), Aborted>;

/// Wall-clock deadline and cooperative cancellation flag, checked at every
/// time-check boundary: the search task may suspend only there or at
/// publication points.
pub struct SearchControl<'a> {
    deadline: Instant,
    cancel: &'a AtomicBool,
}

impl<'a> SearchControl<'a> {
    #[must_use]
    pub fn new(start: Instant, time_limit_ms: u64, cancel: &'a AtomicBool) -> Self {
        SearchControl { deadline: start + std::time::Duration::from_millis(time_limit_ms), cancel }
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.deadline || self.cancel.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
struct Counters {
    nodes: u64,
    cutoffs: u64,
}

/// Move ordering: captures (incl. en passant / promotion-captures), then
/// promotions, then castling, then everything else, generator order
/// preserved within each bucket.
fn category_rank(mv: &Move) -> u8 {
    if mv.is_capture() {
        0
    } else if mv.is_promotion() {
        1
    } else if mv.is_castle() {
        2
    } else {
        3
    }
}

fn ordered_moves(pos: &Position) -> Vec<Move> {
    let pseudo_or_legal = generate_legal_moves(pos);
    let mut moves: Vec<Move> = pseudo_or_legal.iter().copied().collect();
    moves.sort_by_key(category_rank);
    moves
}

fn negamax(
    pos: &mut Position,
    depth: u32,
    ply: u32,
    mut alpha: i32,
    beta: i32,
    weights: &EvalWeights,
    control: &SearchControl,
    counters: &mut Counters,
) -> NodeResult {
    if control.expired() {
        return Err(Aborted);
    }
    counters.nodes += 1;

    if depth == 0 {
        return Ok((eval::evaluate_side_to_move(pos, weights), Vec::new()));
    }

    let moves = ordered_moves(pos);
    if moves.is_empty() {
        let side = pos.side_to_move();
        let king_sq = pos.king_square(side);
        let score = if is_square_attacked(pos, king_sq, side.opposite()) {
            -(MATE - ply as i32)
        } else {
            0
        };
        return Ok((score, Vec::new()));
    }

    let mut best_pv = Vec::new();
    for mv in moves {
        if control.expired() {
            return Err(Aborted);
        }
        pos.make(mv);
        let result = negamax(pos, depth - 1, ply + 1, -beta, -alpha, weights, control, counters);
        pos.unmake();
        let (child_score, child_pv) = result?;
        let score = -child_score;

        if score >= beta {
            counters.cutoffs += 1;
            return Ok((beta, best_pv));
        }
        if score > alpha {
            alpha = score;
            let mut pv = Vec::with_capacity(child_pv.len() + 1);
            pv.push(mv);
            pv.extend(child_pv);
            best_pv = pv;
        }
    }
    Ok((alpha, best_pv))
}

/// One root move's fully-searched score and PV suffix, used to build the
/// candidate map and to report progress as each root move completes.
pub struct RootProgress<'a> {
    pub depth: u32,
    pub current_move: Move,
    pub candidate_moves: &'a HashMap<Move, i32>,
    pub pv: &'a [Move],
    pub nodes: u64,
    pub cutoffs: u64,
    pub elapsed_ms: u64,
}

struct RootOutcome {
    best_move: Option<Move>,
    best_score: i32,
    pv: Vec<Move>,
    candidate_moves: HashMap<Move, i32>,
}

#[allow(clippy::too_many_arguments)]
fn search_root_at_depth(
    pos: &mut Position,
    depth: u32,
    weights: &EvalWeights,
    control: &SearchControl,
    counters: &mut Counters,
    start: Instant,
    mut on_move_complete: impl FnMut(RootProgress),
) -> Result<RootOutcome, Aborted> {
    let moves = ordered_moves(pos);
    let mut candidate_moves = HashMap::new();
    let mut best: Option<(Move, i32, Vec<Move>)> = None;
    let mut alpha = -INF;

    for mv in moves {
        if control.expired() {
            return Err(Aborted);
        }
        pos.make(mv);
        let result = negamax(pos, depth - 1, 1, -INF, -alpha, weights, control, counters);
        pos.unmake();
        let (child_score, child_pv) = match result {
            Ok(v) => v,
            Err(Aborted) => return Err(Aborted),
        };
        let score = -child_score;
        candidate_moves.insert(mv, score);

        let is_new_best = best.as_ref().map_or(true, |(_, best_score, _)| score > *best_score);
        if is_new_best {
            let mut pv = Vec::with_capacity(child_pv.len() + 1);
            pv.push(mv);
            pv.extend(child_pv);
            best = Some((mv, score, pv));
        }
        if score > alpha {
            alpha = score;
        }

        let pv_ref: &[Move] = best.as_ref().map_or(&[], |(_, _, pv)| pv.as_slice());
        on_move_complete(RootProgress {
            depth,
            current_move: mv,
            candidate_moves: &candidate_moves,
            pv: pv_ref,
            nodes: counters.nodes,
            cutoffs: counters.cutoffs,
            elapsed_ms: start.elapsed().as_millis() as u64,
        });
    }

    let (best_move, best_score, pv) = match best {
        Some((mv, score, pv)) => (Some(mv), score, pv),
        None => (None, eval::evaluate_side_to_move(pos, weights), Vec::new()),
    };
    Ok(RootOutcome { best_move, best_score, pv, candidate_moves })
}

/// A throttle-eligible progress record, emitted after every root move and
/// at the end of every depth. Carries the same evaluator artifacts as the
/// terminal result, computed once from the root position (which never
/// changes across depths, since a depth's root search always unmakes back
/// to it) rather than recomputed on every tick.
#[derive(Clone, Debug)]
pub struct SearchSnapshot {
    pub depth: u32,
    pub eval_cp: i32,
    pub eval: f64,
    pub nodes: u64,
    pub nps: u64,
    pub cutoffs: u64,
    pub elapsed_ms: u64,
    pub current_move: Option<Move>,
    pub pv: Vec<Move>,
    pub candidate_moves: HashMap<Move, i32>,
    pub piece_values: HashMap<Square, i32>,
    pub piece_breakdown: HashMap<Square, PieceBreakdown>,
    pub heatmap: HashMap<Square, i32>,
}

/// The terminal, fully-committed result of a search, plus the
/// root-position evaluator artifacts.
#[derive(Clone, Debug)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub best_score: i32,
    pub eval_cp: i32,
    pub eval: f64,
    pub pv: Vec<Move>,
    pub candidate_moves: HashMap<Move, i32>,
    pub nodes: u64,
    pub nps: u64,
    pub cutoffs: u64,
    pub elapsed_ms: u64,
    pub depth: u32,
    pub piece_values: HashMap<Square, i32>,
    pub piece_breakdown: HashMap<Square, PieceBreakdown>,
    pub heatmap: HashMap<Square, i32>,
}

fn nps(nodes: u64, elapsed_ms: u64) -> u64 {
    nodes * 1000 / elapsed_ms.max(1)
}

/// `eval_cp` unchanged, plus `eval_cp / 100.0` rounded to two decimal places.
fn eval_pair(eval_cp: i32) -> (i32, f64) {
    (eval_cp, ((eval_cp as f64 / 100.0) * 100.0).round() / 100.0)
}

/// Run iterative deepening from `pos` to `limits.max_depth` or until
/// `limits.time_limit_ms` elapses or `cancel` is set, calling
/// `on_snapshot` at every publication point. `pos` is returned to its
/// original state: every `make` is paired with an `unmake`.
pub fn run(
    pos: &mut Position,
    limits: &SearchLimits,
    weights: &EvalWeights,
    cancel: &AtomicBool,
    mut on_snapshot: impl FnMut(SearchSnapshot),
) -> SearchResult {
    let start = Instant::now();
    let control = SearchControl::new(start, limits.time_limit_ms, cancel);
    let mut counters = Counters::default();
    let mut committed: Option<(u32, RootOutcome)> = None;

    // The root position never changes across depths (every descent unmakes
    // back to it), so its evaluator artifacts are computed once here and
    // reused by every snapshot and the final result, rather than
    // recomputed on every throttled tick.
    let breakdown = eval::piece_breakdown(pos, weights);
    let values = eval::piece_values(&breakdown);
    let heat = eval::heatmap(pos);

    for depth in 1..=limits.max_depth {
        if control.expired() {
            break;
        }
        let outcome = search_root_at_depth(pos, depth, weights, &control, &mut counters, start, |progress| {
            let best_score = progress.candidate_moves.values().copied().max().unwrap_or(0);
            let (eval_cp, eval) = eval_pair(best_score);
            on_snapshot(SearchSnapshot {
                depth: progress.depth,
                eval_cp,
                eval,
                nodes: progress.nodes,
                nps: nps(progress.nodes, progress.elapsed_ms),
                cutoffs: progress.cutoffs,
                elapsed_ms: progress.elapsed_ms,
                current_move: Some(progress.current_move),
                pv: progress.pv.to_vec(),
                candidate_moves: progress.candidate_moves.clone(),
                piece_values: values.clone(),
                piece_breakdown: breakdown.clone(),
                heatmap: heat.clone(),
            });
        });

        match outcome {
            Ok(root) => {
                #[cfg(feature = "logging")]
                debug!(
                    "depth {depth} complete: nodes={} cutoffs={} best={:?}",
                    counters.nodes, counters.cutoffs, root.best_move
                );
                let elapsed_ms = start.elapsed().as_millis() as u64;
                let (eval_cp, eval) = eval_pair(root.best_score);
                on_snapshot(SearchSnapshot {
                    depth,
                    eval_cp,
                    eval,
                    nodes: counters.nodes,
                    nps: nps(counters.nodes, elapsed_ms),
                    cutoffs: counters.cutoffs,
                    elapsed_ms,
                    current_move: root.best_move,
                    pv: root.pv.clone(),
                    candidate_moves: root.candidate_moves.clone(),
                    piece_values: values.clone(),
                    piece_breakdown: breakdown.clone(),
                    heatmap: heat.clone(),
                });
                committed = Some((depth, root));
            }
            Err(Aborted) => {
                #[cfg(feature = "logging")]
                trace!("depth {depth} aborted (timeout or cancellation); discarding partial results");
                break;
            }
        }
    }

    let elapsed_ms = start.elapsed().as_millis() as u64;

    match committed {
        Some((depth, root)) => {
            let (eval_cp, eval) = eval_pair(root.best_score);
            SearchResult {
                best_move: root.best_move,
                best_score: root.best_score,
                eval_cp,
                eval,
                pv: root.pv,
                candidate_moves: root.candidate_moves,
                nodes: counters.nodes,
                nps: nps(counters.nodes, elapsed_ms),
                cutoffs: counters.cutoffs,
                elapsed_ms,
                depth,
                piece_values: values,
                piece_breakdown: breakdown,
                heatmap: heat,
            }
        }
        None => {
            let eval_cp = eval::evaluate_side_to_move(pos, weights);
            let (eval_cp, eval) = eval_pair(eval_cp);
            SearchResult {
                best_move: None,
                best_score: eval_cp,
                eval_cp,
                eval,
                pv: Vec::new(),
                candidate_moves: HashMap::new(),
                nodes: counters.nodes,
                nps: nps(counters.nodes, elapsed_ms),
                cutoffs: counters.cutoffs,
                elapsed_ms,
                depth: 0,
                piece_values: values,
                piece_breakdown: breakdown,
                heatmap: heat,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{Position, START_FEN};

    fn run_to_completion(pos: &mut Position, max_depth: u32, time_limit_ms: u64) -> SearchResult {
        let weights = EvalWeights::default();
        let limits = SearchLimits::new(max_depth, time_limit_ms);
        let cancel = AtomicBool::new(false);
        run(pos, &limits, &weights, &cancel, |_| {})
    }

    #[test]
    fn mate_in_one_is_found() {
        let mut pos = Position::parse_fen("7k/8/8/8/8/8/6Q1/6K1 w - - 0 1").unwrap();
        let result = run_to_completion(&mut pos, 3, 2000);
        assert_eq!(result.best_move.map(|m| m.to_long_algebraic()), Some("g2g7".to_string()));
    }

    #[test]
    fn fools_mate_is_found_for_black() {
        let mut pos = Position::parse_fen(START_FEN).unwrap();
        for mv in ["f2f3", "e7e5", "g2g4"] {
            let legal = generate_legal_moves(&mut pos);
            let chosen = *legal.iter().find(|m| m.to_long_algebraic() == mv).unwrap();
            pos.make(chosen);
        }
        let result = run_to_completion(&mut pos, 2, 3000);
        assert_eq!(result.best_move.map(|m| m.to_long_algebraic()), Some("d8h4".to_string()));
        assert!(result.best_score >= MATE - 100);
    }

    #[test]
    fn search_is_deterministic_across_runs() {
        let mut pos1 = Position::parse_fen(START_FEN).unwrap();
        let mut pos2 = Position::parse_fen(START_FEN).unwrap();
        let a = run_to_completion(&mut pos1, 3, 5000);
        let b = run_to_completion(&mut pos2, 3, 5000);
        assert_eq!(a.best_move.map(|m| m.to_long_algebraic()), b.best_move.map(|m| m.to_long_algebraic()));
        assert_eq!(a.pv.len(), b.pv.len());
        assert_eq!(a.best_score, b.best_score);
    }

    #[test]
    fn timeout_commits_last_completed_depth_not_a_panic() {
        let mut pos = Position::parse_fen(START_FEN).unwrap();
        // 1ms budget: depth 1 may or may not complete, but the search must
        // return cleanly either way rather than panicking.
        let result = run_to_completion(&mut pos, 20, 1);
        assert!(result.nodes > 0);
    }
}
